//! Path-prefix capability rules with longest-prefix matching.
//! A `Capability` holds the ordered rules for one policy key; lookups are
//! read-only and deterministic so published capabilities need no locking.

use std::collections::HashMap;

use xxhash_rust::xxh3::xxh3_64;

use crate::error::RuleError;
use crate::privs::{PrivCaps, PrivilegeSet};
use crate::resolve::TemplateResolver;

/// Fast path hash, computed once per decision and reused by every
/// capability lookup in that call.
pub fn path_hash(path: &str) -> u64 {
    xxh3_64(path.as_bytes())
}

#[derive(Debug, Clone)]
struct CapRule {
    prefix: String,
    grant: PrivilegeSet,
    deny: PrivilegeSet,
}

/// Ordered rule set mapping path prefixes to (grant, deny) masks for one
/// policy key. Rules are kept longest-prefix-first; an exact-match hash
/// index short-circuits full-path hits.
#[derive(Debug, Clone, Default)]
pub struct Capability {
    rules: Vec<CapRule>,
    exact: HashMap<u64, usize>,
}

impl Capability {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one rule. Prefixes must be absolute; a repeated prefix merges
    /// its masks into the existing rule.
    pub fn add(
        &mut self,
        prefix: &str,
        grant: PrivilegeSet,
        deny: PrivilegeSet,
    ) -> Result<(), RuleError> {
        if prefix.is_empty() {
            return Err(RuleError::EmptyPrefix);
        }
        if !prefix.starts_with('/') {
            return Err(RuleError::RelativePrefix(prefix.to_string()));
        }
        if let Some(r) = self.rules.iter_mut().find(|r| r.prefix == prefix) {
            r.grant |= grant;
            r.deny |= deny;
            return Ok(());
        }
        let at = self
            .rules
            .iter()
            .position(|r| r.prefix.len() < prefix.len())
            .unwrap_or(self.rules.len());
        self.rules.insert(
            at,
            CapRule { prefix: prefix.to_string(), grant, deny },
        );
        // Positions shift on insert; rebuild the exact-match index.
        self.exact = self
            .rules
            .iter()
            .enumerate()
            .map(|(i, r)| (path_hash(&r.prefix), i))
            .collect();
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// OR the masks of the longest rule prefix of `path` into `caps`;
    /// no-op when nothing matches.
    pub fn privs(&self, caps: &mut PrivCaps, path: &str, phash: u64) {
        if let Some(&i) = self.exact.get(&phash) {
            let r = &self.rules[i];
            if r.prefix == path {
                caps.grant |= r.grant;
                caps.deny |= r.deny;
                return;
            }
            // hash collision; fall through to the prefix scan
        }
        for r in &self.rules {
            if path.starts_with(r.prefix.as_str()) {
                caps.grant |= r.grant;
                caps.deny |= r.deny;
                return;
            }
        }
    }
}

/// Template capability for user-wildcard ("fungible") rules: each rule
/// prefix is expanded with the caller's identity string before matching.
/// The substitution strategy is pluggable; see `resolve::MarkerResolver`.
#[derive(Debug, Clone, Default)]
pub struct FungibleCap {
    rules: Vec<CapRule>,
}

impl FungibleCap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        template: &str,
        grant: PrivilegeSet,
        deny: PrivilegeSet,
    ) -> Result<(), RuleError> {
        if template.is_empty() {
            return Err(RuleError::EmptyTemplate);
        }
        self.rules.push(CapRule { prefix: template.to_string(), grant, deny });
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Expand each template for `id` and OR in the masks of the longest
    /// expanded prefix of `path`. Expansion lengths vary per identity, so
    /// the longest match is established per call rather than by rule order.
    pub fn privs(
        &self,
        caps: &mut PrivCaps,
        path: &str,
        resolver: &dyn TemplateResolver,
        id: &str,
    ) {
        let mut best: Option<(usize, &CapRule)> = None;
        for r in &self.rules {
            if let Some(expanded) = resolver.expand(&r.prefix, id) {
                if path.starts_with(expanded.as_str()) {
                    match best {
                        Some((len, _)) if len >= expanded.len() => {}
                        _ => best = Some((expanded.len(), r)),
                    }
                }
            }
        }
        if let Some((_, r)) = best {
            caps.grant |= r.grant;
            caps.deny |= r.deny;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::MarkerResolver;

    fn caps_for(cap: &Capability, path: &str) -> PrivCaps {
        let mut caps = PrivCaps::default();
        cap.privs(&mut caps, path, path_hash(path));
        caps
    }

    #[test]
    fn longest_prefix_wins() {
        let mut cap = Capability::new();
        cap.add("/a", PrivilegeSet::READ, PrivilegeSet::NONE).unwrap();
        cap.add("/a/b", PrivilegeSet::NONE, PrivilegeSet::READ).unwrap();

        let under = caps_for(&cap, "/a/b/c");
        assert_eq!(under.effective(), PrivilegeSet::NONE);

        let beside = caps_for(&cap, "/a/x");
        assert_eq!(beside.effective(), PrivilegeSet::READ);
    }

    #[test]
    fn exact_match_short_circuit() {
        let mut cap = Capability::new();
        cap.add("/data", PrivilegeSet::READ, PrivilegeSet::NONE).unwrap();
        cap.add("/data/hot", PrivilegeSet::UPDATE, PrivilegeSet::NONE).unwrap();

        let exact = caps_for(&cap, "/data/hot");
        assert_eq!(exact.grant, PrivilegeSet::UPDATE);

        // A non-rule path with no matching prefix contributes nothing.
        let miss = caps_for(&cap, "/other");
        assert_eq!(miss, PrivCaps::default());
    }

    #[test]
    fn repeated_prefix_merges_masks() {
        let mut cap = Capability::new();
        cap.add("/p", PrivilegeSet::READ, PrivilegeSet::NONE).unwrap();
        cap.add("/p", PrivilegeSet::UPDATE, PrivilegeSet::DELETE).unwrap();
        assert_eq!(cap.len(), 1);

        let got = caps_for(&cap, "/p/file");
        assert_eq!(got.grant, PrivilegeSet::READ | PrivilegeSet::UPDATE);
        assert_eq!(got.deny, PrivilegeSet::DELETE);
    }

    #[test]
    fn rule_validation() {
        let mut cap = Capability::new();
        assert_eq!(
            cap.add("", PrivilegeSet::READ, PrivilegeSet::NONE),
            Err(RuleError::EmptyPrefix)
        );
        assert_eq!(
            cap.add("data", PrivilegeSet::READ, PrivilegeSet::NONE),
            Err(RuleError::RelativePrefix("data".into()))
        );
        assert!(cap.is_empty());
    }

    #[test]
    fn fungible_expands_per_identity() {
        let mut cap = FungibleCap::new();
        cap.add("/home/@=", PrivilegeSet::ALL, PrivilegeSet::NONE).unwrap();
        let resolver = MarkerResolver;

        let mut caps = PrivCaps::default();
        cap.privs(&mut caps, "/home/alice/notes", &resolver, "alice");
        assert_eq!(caps.grant, PrivilegeSet::ALL);

        let mut caps = PrivCaps::default();
        cap.privs(&mut caps, "/home/alice/notes", &resolver, "bob");
        assert_eq!(caps, PrivCaps::default());
    }

    #[test]
    fn fungible_longest_expanded_prefix_wins() {
        let mut cap = FungibleCap::new();
        cap.add("/u/@=", PrivilegeSet::READ, PrivilegeSet::NONE).unwrap();
        cap.add("/u/@=/private", PrivilegeSet::NONE, PrivilegeSet::READ).unwrap();
        let resolver = MarkerResolver;

        let mut caps = PrivCaps::default();
        cap.privs(&mut caps, "/u/eve/private/x", &resolver, "eve");
        assert_eq!(caps.effective(), PrivilegeSet::NONE);
    }
}
