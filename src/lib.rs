//! pathwarden: request-time authorization decisions for path-scoped
//! storage access control.
//!
//! Given an identity record and a target path + operation, the engine
//! aggregates (grant, deny) privilege masks across every populated policy
//! category, applies deny-overrides-grant with longest-prefix path
//! matching, and optionally audits the outcome. The whole policy dataset
//! is hot-swappable under concurrent read load.
//!
//! Policy loading, membership resolution and authentication are external;
//! they plug in through the traits in [`resolve`] and [`audit`].

pub mod audit;
pub mod capability;
pub mod engine;
pub mod error;
pub mod identity;
pub mod privs;
pub mod resolve;
pub mod tables;

pub use audit::{AuditMode, Auditor, LogAuditor, NoAudit};
pub use capability::{path_hash, Capability, FungibleCap};
pub use engine::AccessEngine;
pub use error::RuleError;
pub use identity::{bounded_tokens, Identity, MAX_TOKEN};
pub use privs::{AccessOp, PrivCaps, PrivilegeSet};
pub use resolve::{
    GroupResolver, HostResolver, LiteralHost, MarkerResolver, NoGroups, TemplateResolver,
};
pub use tables::{CapTable, IdType, SuffixList, TableSet};
