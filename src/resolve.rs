//! Outbound resolution seams: group/netgroup membership, reverse host
//! lookup and template expansion. All are narrow traits so hosts can wire
//! in OS, LDAP or test doubles; the defaults here resolve nothing.

use crate::identity::Identity;

/// External membership resolution. Empty results mean "no additional
/// groups", never a hard failure.
pub trait GroupResolver: Send + Sync {
    /// OS-style group membership for a user.
    fn groups(&self, id: &str) -> Vec<String>;

    /// Netgroup membership for a (user, host) pair.
    fn netgroups(&self, id: &str, host: &str) -> Vec<String>;

    /// Invalidate any resolver-side membership cache. Called while new
    /// policy tables are installed so stale memberships never pair with
    /// fresh rules.
    fn purge(&self) {}
}

/// Default resolver: no memberships, nothing cached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGroups;

impl GroupResolver for NoGroups {
    fn groups(&self, _id: &str) -> Vec<String> {
        Vec::new()
    }
    fn netgroups(&self, _id: &str, _host: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Reverse host-name resolution. Only consulted when a host-keyed policy
/// category is populated; this is the one potentially blocking call on the
/// decision path.
pub trait HostResolver: Send + Sync {
    /// `None` falls back to the literal identity host (or `"?"`).
    fn resolve(&self, ident: &Identity) -> Option<String>;
}

/// Default host resolver: always fall back to the literal host field.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralHost;

impl HostResolver for LiteralHost {
    fn resolve(&self, _ident: &Identity) -> Option<String> {
        None
    }
}

/// Expansion strategy for user-wildcard template rules.
pub trait TemplateResolver: Send + Sync {
    /// Expand one template prefix for an identity; `None` skips the rule.
    fn expand(&self, template: &str, id: &str) -> Option<String>;
}

/// Shipped default: replaces the `@=` marker with the identity string.
/// Templates without the marker pass through unchanged. The marker syntax
/// is an assumption of this implementation; hosts with a different
/// template language inject their own resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerResolver;

pub const TEMPLATE_MARKER: &str = "@=";

impl TemplateResolver for MarkerResolver {
    fn expand(&self, template: &str, id: &str) -> Option<String> {
        if template.contains(TEMPLATE_MARKER) {
            Some(template.replace(TEMPLATE_MARKER, id))
        } else {
            Some(template.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_resolver_substitutes_identity() {
        let r = MarkerResolver;
        assert_eq!(r.expand("/home/@=", "alice").as_deref(), Some("/home/alice"));
        assert_eq!(r.expand("/scratch/@=/tmp", "u1").as_deref(), Some("/scratch/u1/tmp"));
        assert_eq!(r.expand("/public", "alice").as_deref(), Some("/public"));
    }

    #[test]
    fn defaults_resolve_nothing() {
        assert!(NoGroups.groups("alice").is_empty());
        assert!(NoGroups.netgroups("alice", "h").is_empty());
        assert!(LiteralHost.resolve(&Identity::default()).is_none());
    }
}
