//! Decision engine: aggregates privileges across every populated policy
//! category under one shared table-set guard, applies deny-overrides-grant
//! and the per-operation privilege test, then audits outside the lock.
//!
//! The table set is the only shared mutable state. Many decisions read it
//! concurrently; `swap_tabs` is the sole writer and replaces the whole
//! bundle at once, so a decision can never observe a mix of old and new
//! tables.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::audit::{Auditor, NoAudit};
use crate::capability::path_hash;
use crate::identity::{bounded_tokens, Identity, MAX_TOKEN};
use crate::privs::{op_name, required_priv, test, AccessOp, PrivCaps, PrivilegeSet};
use crate::resolve::{
    GroupResolver, HostResolver, LiteralHost, MarkerResolver, NoGroups, TemplateResolver,
};
use crate::tables::{IdType, TableSet};

pub struct AccessEngine {
    tables: RwLock<TableSet>,
    groups: Arc<dyn GroupResolver>,
    hosts: Arc<dyn HostResolver>,
    templates: Arc<dyn TemplateResolver>,
    auditor: Arc<dyn Auditor>,
}

impl AccessEngine {
    /// Engine with default collaborators: no group resolution, literal
    /// hosts, `@=` template expansion, auditing off.
    pub fn new(tables: TableSet) -> Self {
        Self {
            tables: RwLock::new(tables),
            groups: Arc::new(NoGroups),
            hosts: Arc::new(LiteralHost),
            templates: Arc::new(MarkerResolver),
            auditor: Arc::new(NoAudit),
        }
    }

    pub fn with_groups(mut self, groups: Arc<dyn GroupResolver>) -> Self {
        self.groups = groups;
        self
    }

    pub fn with_hosts(mut self, hosts: Arc<dyn HostResolver>) -> Self {
        self.hosts = hosts;
        self
    }

    pub fn with_templates(mut self, templates: Arc<dyn TemplateResolver>) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_auditor(mut self, auditor: Arc<dyn Auditor>) -> Self {
        self.auditor = auditor;
        self
    }

    /// Full access decision for one identity, path and operation.
    ///
    /// For `AccessOp::Any` the raw effective privilege mask is returned.
    /// For any other operation the result is the operation's required bits
    /// when access is granted and empty when it is not.
    pub fn decide(&self, ident: &Identity, path: &str, op: AccessOp) -> PrivilegeSet {
        let phash = path_hash(path);
        let id = ident.user_id();
        let is_user = ident.is_user();
        let mode = self.auditor.mode();
        let mut caps = PrivCaps::default();

        {
            let tabs = self.tables.read();

            // Reverse lookup is the one potentially blocking step; do it
            // only when a host-keyed category could use the result.
            let host: String = if tabs.wants_host() {
                self.hosts
                    .resolve(ident)
                    .unwrap_or_else(|| ident.host_or_unknown().to_string())
            } else {
                ident.host_or_unknown().to_string()
            };

            if let Some(z) = &tabs.default {
                z.privs(&mut caps, path, phash);
            }

            if let Some(dl) = &tabs.domain {
                if let Some(cap) = dl.find(&host) {
                    cap.privs(&mut caps, path, phash);
                }
            }

            if let Some(h) = &tabs.host {
                if let Some(cap) = h.get(host.as_str()) {
                    cap.privs(&mut caps, path, phash);
                }
            }

            if is_user {
                if let Some(x) = &tabs.fungible {
                    x.privs(&mut caps, path, self.templates.as_ref(), id);
                }
                if let Some(u) = &tabs.user {
                    if let Some(cap) = u.get(id) {
                        cap.privs(&mut caps, path, phash);
                    }
                }
            }

            // Credential-supplied groups take precedence; the OS mapping
            // is consulted only when the credential carries none.
            if let Some(g) = &tabs.group {
                if let Some(cred) = &ident.groups {
                    for name in bounded_tokens(cred, MAX_TOKEN) {
                        if let Some(cap) = g.get(name) {
                            cap.privs(&mut caps, path, phash);
                        }
                    }
                } else if is_user {
                    for name in self.groups.groups(id) {
                        if let Some(cap) = g.get(name.as_str()) {
                            cap.privs(&mut caps, path, phash);
                        }
                    }
                }
            }

            // Netgroup lookup is independent of the group source.
            if let Some(n) = &tabs.netgroup {
                for name in self.groups.netgroups(id, &host) {
                    if let Some(cap) = n.get(name.as_str()) {
                        cap.privs(&mut caps, path, phash);
                    }
                }
            }

            if let (Some(o), Some(orgs)) = (&tabs.org, &ident.org) {
                for token in bounded_tokens(orgs, MAX_TOKEN) {
                    if let Some(cap) = o.get(token) {
                        cap.privs(&mut caps, path, phash);
                    }
                }
            }

            if let (Some(r), Some(roles)) = (&tabs.role, &ident.role) {
                for token in bounded_tokens(roles, MAX_TOKEN) {
                    if let Some(cap) = r.get(token) {
                        cap.privs(&mut caps, path, phash);
                    }
                }
            }
        } // read guard drops; auditing happens outside the lock

        let effective = caps.effective();
        if op == AccessOp::Any {
            return effective;
        }

        let granted = test(effective, op.index());
        debug!(
            target: "pathwarden::engine",
            user = id, path, op = op.name(), granted, "decide"
        );
        let result = if granted { required_priv(op.index()) } else { PrivilegeSet::NONE };

        if !mode.is_on() {
            return result;
        }
        if granted && !mode.logs_grant() {
            return result;
        }
        self.audit(granted, ident, path, op.index());
        result
    }

    /// Raw effective privileges, the `AccessOp::Any` shortcut.
    pub fn effective_privs(&self, ident: &Identity, path: &str) -> PrivilegeSet {
        self.decide(ident, path, AccessOp::Any)
    }

    /// Boolean convenience over `decide` for a concrete operation.
    pub fn allows(&self, ident: &Identity, path: &str, op: AccessOp) -> bool {
        !self.decide(ident, path, op).is_empty()
    }

    /// Direct single-category query for callers that already know the key
    /// type. Aggregates only default, (for users) the fungible templates,
    /// (for hosts) the domain suffixes, and the selected category's exact
    /// match. Introspection, not a logged access decision: never audits.
    pub fn decide_raw(
        &self,
        id: &str,
        id_type: IdType,
        path: &str,
        op: AccessOp,
    ) -> PrivilegeSet {
        let phash = path_hash(path);
        let mut caps = PrivCaps::default();

        {
            let tabs = self.tables.read();

            if let Some(z) = &tabs.default {
                z.privs(&mut caps, path, phash);
            }

            if id_type == IdType::User {
                if let Some(x) = &tabs.fungible {
                    x.privs(&mut caps, path, self.templates.as_ref(), id);
                }
            }

            if id_type == IdType::Host {
                if let Some(dl) = &tabs.domain {
                    if let Some(cap) = dl.find(id) {
                        cap.privs(&mut caps, path, phash);
                    }
                }
            }

            if let Some(table) = tabs.by_id_type(id_type) {
                if let Some(cap) = table.get(id) {
                    cap.privs(&mut caps, path, phash);
                }
            }
        }

        let effective = caps.effective();
        if op == AccessOp::Any {
            return effective;
        }
        if test(effective, op.index()) {
            required_priv(op.index())
        } else {
            PrivilegeSet::NONE
        }
    }

    /// Install a freshly built table set. The caller's value receives the
    /// displaced tables; disposal ownership transfers with it. Waits for
    /// in-flight readers to drain, so no decision mixes old and new rules.
    pub fn swap_tabs(&self, new: &mut TableSet) {
        let mut guard = self.tables.write();
        std::mem::swap(&mut *guard, new);
        // Stale memberships against fresh rules could mis-decide; purge
        // resolver caches before readers are released.
        self.groups.purge();
        drop(guard);
        debug!(target: "pathwarden::engine", "policy tables swapped");
    }

    fn audit(&self, granted: bool, ident: &Identity, path: &str, op_index: usize) {
        let opname = op_name(op_index);
        let id = ident.user_id();
        let host = ident.host_or_unknown();
        if granted {
            self.auditor.grant(opname, &ident.tident, &ident.prot, id, host, path);
        } else {
            self.auditor.deny(opname, &ident.tident, &ident.prot, id, host, path);
        }
    }
}
