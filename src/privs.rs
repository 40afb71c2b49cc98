//! Privilege bitmasks and the fixed operation-to-privilege mapping.
//! `AccessOp` discriminants index both `REQUIRED_PRIV` and `OP_NAMES`;
//! the three must stay in lockstep and all raw indexing is bounds-checked.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// Filesystem-style access operations, in wire order. `Any` (index 0)
/// means "return the raw effective privileges, skip the test".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessOp {
    Any = 0,
    Chmod,
    Chown,
    Create,
    Delete,
    Insert,
    Lock,
    Mkdir,
    Read,
    Readdir,
    Rename,
    Lookup,
    Update,
}

impl AccessOp {
    pub const COUNT: usize = 13;

    pub fn index(self) -> usize {
        self as usize
    }

    /// Decode a raw operation code. Out-of-range codes yield `None` and
    /// must be treated as "not granted" by callers.
    pub fn from_index(i: usize) -> Option<AccessOp> {
        use AccessOp::*;
        const ALL: [AccessOp; AccessOp::COUNT] = [
            Any, Chmod, Chown, Create, Delete, Insert, Lock, Mkdir, Read, Readdir, Rename,
            Lookup, Update,
        ];
        ALL.get(i).copied()
    }

    /// Audit label for this operation.
    pub fn name(self) -> &'static str {
        op_name(self as usize)
    }
}

/// Bitmask over the non-`Any` operation kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrivilegeSet(pub u16);

impl PrivilegeSet {
    pub const NONE: PrivilegeSet = PrivilegeSet(0);
    pub const CHMOD: PrivilegeSet = PrivilegeSet(1 << 0);
    pub const CHOWN: PrivilegeSet = PrivilegeSet(1 << 1);
    pub const CREATE: PrivilegeSet = PrivilegeSet(1 << 2);
    pub const DELETE: PrivilegeSet = PrivilegeSet(1 << 3);
    pub const INSERT: PrivilegeSet = PrivilegeSet(1 << 4);
    pub const LOCK: PrivilegeSet = PrivilegeSet(1 << 5);
    pub const MKDIR: PrivilegeSet = PrivilegeSet(1 << 6);
    pub const READ: PrivilegeSet = PrivilegeSet(1 << 7);
    pub const READDIR: PrivilegeSet = PrivilegeSet(1 << 8);
    // Rename and Lookup share one bit in the source privilege table.
    // Carried over as-is; verify against the full system before changing.
    pub const RENAME: PrivilegeSet = PrivilegeSet(1 << 9);
    pub const LOOKUP: PrivilegeSet = PrivilegeSet(1 << 9);
    pub const UPDATE: PrivilegeSet = PrivilegeSet(1 << 10);
    pub const ALL: PrivilegeSet = PrivilegeSet(0x7ff);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True iff every bit of `need` is present.
    pub fn contains(self, need: PrivilegeSet) -> bool {
        self.0 & need.0 == need.0
    }
}

impl BitOr for PrivilegeSet {
    type Output = PrivilegeSet;
    fn bitor(self, rhs: PrivilegeSet) -> PrivilegeSet {
        PrivilegeSet(self.0 | rhs.0)
    }
}

impl BitOrAssign for PrivilegeSet {
    fn bitor_assign(&mut self, rhs: PrivilegeSet) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for PrivilegeSet {
    type Output = PrivilegeSet;
    fn bitand(self, rhs: PrivilegeSet) -> PrivilegeSet {
        PrivilegeSet(self.0 & rhs.0)
    }
}

impl Not for PrivilegeSet {
    type Output = PrivilegeSet;
    fn not(self) -> PrivilegeSet {
        PrivilegeSet(!self.0 & PrivilegeSet::ALL.0)
    }
}

impl Display for PrivilegeSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for i in 1..AccessOp::COUNT {
            if self.contains(REQUIRED_PRIV[i]) {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(OP_NAMES[i])?;
                first = false;
            }
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}

/// Running (grant, deny) pair built during one decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrivCaps {
    pub grant: PrivilegeSet,
    pub deny: PrivilegeSet,
}

impl PrivCaps {
    /// Deny overrides grant.
    pub fn effective(self) -> PrivilegeSet {
        self.grant & !self.deny
    }
}

// Positional: REQUIRED_PRIV[op] is the minimal privilege for that op.
const REQUIRED_PRIV: [PrivilegeSet; AccessOp::COUNT] = [
    PrivilegeSet::NONE,    // any
    PrivilegeSet::CHMOD,   // chmod
    PrivilegeSet::CHOWN,   // chown
    PrivilegeSet::CREATE,  // create
    PrivilegeSet::DELETE,  // delete
    PrivilegeSet::INSERT,  // insert
    PrivilegeSet::LOCK,    // lock
    PrivilegeSet::MKDIR,   // mkdir
    PrivilegeSet::READ,    // read
    PrivilegeSet::READDIR, // readdir
    PrivilegeSet::RENAME,  // rename
    PrivilegeSet::LOOKUP,  // lookup (same bit as rename, see above)
    PrivilegeSet::UPDATE,  // update
];

// Positional audit labels. Index 11 keeps the source system's wire label
// "stat" for the lookup operation.
const OP_NAMES: [&str; AccessOp::COUNT] = [
    "any", "chmod", "chown", "create", "delete", "insert", "lock", "mkdir", "read", "readdir",
    "rename", "stat", "update",
];

/// True iff `privs` covers the requirement for the operation at `op_index`.
/// Out-of-range indices fail closed.
pub fn test(privs: PrivilegeSet, op_index: usize) -> bool {
    match REQUIRED_PRIV.get(op_index) {
        Some(need) => privs.contains(*need),
        None => false,
    }
}

/// Requirement for the operation at `op_index`; empty when out of range.
pub fn required_priv(op_index: usize) -> PrivilegeSet {
    REQUIRED_PRIV.get(op_index).copied().unwrap_or(PrivilegeSet::NONE)
}

/// Audit label for a raw operation index; unknown indices render as "???".
pub fn op_name(op_index: usize) -> &'static str {
    OP_NAMES.get(op_index).copied().unwrap_or("???")
}
