//! Request identity record and multi-valued field tokenization.
//! Identity strings arrive already validated by the security-protocol
//! layer; this module only normalizes and tokenizes them.

use serde::{Deserialize, Serialize};

/// Per-token byte bound for role/org/group strings. Overlong tokens are
/// skipped silently, never an error.
pub const MAX_TOKEN: usize = 63;

/// Immutable per-request identity as supplied by the protocol layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    /// User name; empty or `"*"` means anonymous.
    #[serde(default)]
    pub name: String,
    /// Peer host name; empty means unknown (`"?"`).
    #[serde(default)]
    pub host: String,
    /// Credential-supplied group names, whitespace-delimited. When present
    /// the OS group mapping is skipped for this request.
    #[serde(default)]
    pub groups: Option<String>,
    /// Whitespace-delimited role tokens.
    #[serde(default)]
    pub role: Option<String>,
    /// Whitespace-delimited organization tokens.
    #[serde(default)]
    pub org: Option<String>,
    /// Security protocol identifier.
    #[serde(default)]
    pub prot: String,
    /// Trace identifier threaded into audit records.
    #[serde(default)]
    pub tident: String,
}

impl Identity {
    /// Policy key for user-keyed categories; anonymous normalizes to `"*"`.
    pub fn user_id(&self) -> &str {
        if self.name.is_empty() {
            "*"
        } else {
            &self.name
        }
    }

    /// Anonymous identities skip user-specific and user-wildcard categories.
    pub fn is_user(&self) -> bool {
        !self.name.is_empty() && self.name != "*"
    }

    pub fn host_or_unknown(&self) -> &str {
        if self.host.is_empty() {
            "?"
        } else {
            &self.host
        }
    }
}

/// Whitespace tokenizer with a per-token length bound. Tokens longer than
/// `max` bytes are dropped, preserving the rest of the field.
pub fn bounded_tokens(s: &str, max: usize) -> impl Iterator<Item = &str> {
    s.split_whitespace().filter(move |t| t.len() <= max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymity() {
        let anon = Identity::default();
        assert!(!anon.is_user());
        assert_eq!(anon.user_id(), "*");

        let star = Identity { name: "*".into(), ..Default::default() };
        assert!(!star.is_user());

        // A name that merely starts with '*' is still a user.
        let odd = Identity { name: "*bob".into(), ..Default::default() };
        assert!(odd.is_user());
        assert_eq!(odd.user_id(), "*bob");
    }

    #[test]
    fn unknown_host_placeholder() {
        let id = Identity::default();
        assert_eq!(id.host_or_unknown(), "?");
        let id = Identity { host: "node1.example.org".into(), ..Default::default() };
        assert_eq!(id.host_or_unknown(), "node1.example.org");
    }

    #[test]
    fn tokenizer_skips_overlong_tokens() {
        let long = "x".repeat(MAX_TOKEN + 1);
        let field = format!("ops {} physics", long);
        let toks: Vec<&str> = bounded_tokens(&field, MAX_TOKEN).collect();
        assert_eq!(toks, vec!["ops", "physics"]);
    }

    #[test]
    fn tokenizer_handles_empty_and_whitespace() {
        assert_eq!(bounded_tokens("", MAX_TOKEN).count(), 0);
        assert_eq!(bounded_tokens("  \t ", MAX_TOKEN).count(), 0);
        let toks: Vec<&str> = bounded_tokens("  a\t b  c ", MAX_TOKEN).collect();
        assert_eq!(toks, vec!["a", "b", "c"]);
    }
}
