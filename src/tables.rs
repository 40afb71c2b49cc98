//! The published policy bundle: twelve category tables replaced as one
//! immutable unit. `None` marks an unpopulated category; decisions treat
//! it as "contributes nothing".

use std::collections::HashMap;

use crate::capability::{Capability, FungibleCap};
use crate::error::RuleError;

/// Exact-key capability lookup (users, hosts, groups, netgroups, orgs,
/// roles, named sets, named templates).
pub type CapTable = HashMap<String, Capability>;

/// Category selector for direct administrative queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdType {
    User,
    Group,
    Host,
    NetGroup,
    Set,
    Template,
}

/// Host-domain rules: `.example.org` style suffixes, longest suffix wins.
#[derive(Debug, Clone, Default)]
pub struct SuffixList {
    rules: Vec<(String, Capability)>,
}

impl SuffixList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, suffix: &str, cap: Capability) -> Result<(), RuleError> {
        if suffix.is_empty() {
            return Err(RuleError::EmptySuffix);
        }
        let at = self
            .rules
            .iter()
            .position(|(s, _)| s.len() < suffix.len())
            .unwrap_or(self.rules.len());
        self.rules.insert(at, (suffix.to_string(), cap));
        Ok(())
    }

    pub fn find(&self, host: &str) -> Option<&Capability> {
        self.rules
            .iter()
            .find(|(s, _)| host.ends_with(s.as_str()))
            .map(|(_, c)| c)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// The twelve category tables. Built by an external loader, installed via
/// `AccessEngine::swap_tabs`, and never mutated in place afterwards.
#[derive(Debug, Default)]
pub struct TableSet {
    /// Default/global rules consulted for every request.
    pub default: Option<Capability>,
    /// Host-domain suffix rules.
    pub domain: Option<SuffixList>,
    /// Reserved second suffix list; swapped with the bundle but consulted
    /// by no current decision path.
    pub net_domain: Option<SuffixList>,
    /// Exact host names.
    pub host: Option<CapTable>,
    /// User-wildcard templates keyed by the literal identity string.
    pub fungible: Option<FungibleCap>,
    /// Exact user names.
    pub user: Option<CapTable>,
    pub group: Option<CapTable>,
    pub netgroup: Option<CapTable>,
    pub org: Option<CapTable>,
    pub role: Option<CapTable>,
    /// Named rule sets, reachable only through direct queries.
    pub set: Option<CapTable>,
    /// Named templates, reachable only through direct queries.
    pub template: Option<CapTable>,
}

impl TableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.populated() == 0
    }

    /// Number of populated categories.
    pub fn populated(&self) -> usize {
        let mut n = 0usize;
        n += self.default.is_some() as usize;
        n += self.domain.is_some() as usize;
        n += self.net_domain.is_some() as usize;
        n += self.host.is_some() as usize;
        n += self.fungible.is_some() as usize;
        n += self.user.is_some() as usize;
        n += self.group.is_some() as usize;
        n += self.netgroup.is_some() as usize;
        n += self.org.is_some() as usize;
        n += self.role.is_some() as usize;
        n += self.set.is_some() as usize;
        n += self.template.is_some() as usize;
        n
    }

    /// True when some host-keyed category would need the resolved peer
    /// name; gates the reverse lookup on the decision path.
    pub(crate) fn wants_host(&self) -> bool {
        self.domain.is_some() || self.host.is_some() || self.netgroup.is_some()
    }

    pub(crate) fn by_id_type(&self, id_type: IdType) -> Option<&CapTable> {
        match id_type {
            IdType::User => self.user.as_ref(),
            IdType::Group => self.group.as_ref(),
            IdType::Host => self.host.as_ref(),
            IdType::NetGroup => self.netgroup.as_ref(),
            IdType::Set => self.set.as_ref(),
            IdType::Template => self.template.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::path_hash;
    use crate::privs::{PrivCaps, PrivilegeSet};

    fn cap(prefix: &str, grant: PrivilegeSet) -> Capability {
        let mut c = Capability::new();
        c.add(prefix, grant, PrivilegeSet::NONE).unwrap();
        c
    }

    #[test]
    fn suffix_list_longest_suffix_wins() {
        let mut dl = SuffixList::new();
        dl.add(".org", cap("/", PrivilegeSet::READ)).unwrap();
        dl.add(".cern.org", cap("/", PrivilegeSet::UPDATE)).unwrap();

        let hit = dl.find("node1.cern.org").expect("suffix match");
        let mut caps = PrivCaps::default();
        hit.privs(&mut caps, "/x", path_hash("/x"));
        assert_eq!(caps.grant, PrivilegeSet::UPDATE);

        assert!(dl.find("node1.example.com").is_none());
        assert_eq!(dl.add("", Capability::new()), Err(RuleError::EmptySuffix));
    }

    #[test]
    fn population_introspection() {
        let mut tabs = TableSet::new();
        assert!(tabs.is_empty());
        assert!(!tabs.wants_host());

        tabs.default = Some(cap("/", PrivilegeSet::READ));
        tabs.user = Some(CapTable::new());
        assert_eq!(tabs.populated(), 2);
        assert!(!tabs.wants_host());

        tabs.netgroup = Some(CapTable::new());
        assert!(tabs.wants_host());
    }
}
