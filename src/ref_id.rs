//! Identifiers: a numeric index or a string name.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The sentinel value, reserved and never produced by the numeric
/// constructor.
const SENTINEL: u64 = u64::MAX;

/// An identifier: either a numeric index or a string name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ref {
    Num(u64),
    Name(String),
}

impl Ref {
    /// Builds a numeric ref. Panics if `n` is the reserved sentinel; callers
    /// that mint fresh numeric refs during renaming must never reach it
    /// (renaming allocates sequentially from zero).
    pub fn num(n: u64) -> Self {
        assert_ne!(n, SENTINEL, "Ref::num: sentinel value is reserved");
        Ref::Num(n)
    }

    pub fn name(s: impl Into<String>) -> Self {
        Ref::Name(s.into())
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Ref::Num(_))
    }

    pub fn as_num(&self) -> Option<u64> {
        match self {
            Ref::Num(n) => Some(*n),
            Ref::Name(_) => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Ref::Name(s) => Some(s.as_str()),
            Ref::Num(_) => None,
        }
    }
}

/// Total order: numerics sort before strings; within a variant, natural
/// order.
impl PartialOrd for Ref {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ref {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Ref::Num(a), Ref::Num(b)) => a.cmp(b),
            (Ref::Name(a), Ref::Name(b)) => a.cmp(b),
            (Ref::Num(_), Ref::Name(_)) => Ordering::Less,
            (Ref::Name(_), Ref::Num(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ref::Num(n) => write!(f, "{n}"),
            Ref::Name(s) => write!(f, "{s}"),
        }
    }
}

impl From<u64> for Ref {
    fn from(n: u64) -> Self {
        Ref::num(n)
    }
}

impl From<&str> for Ref {
    fn from(s: &str) -> Self {
        Ref::name(s)
    }
}

impl From<String> for Ref {
    fn from(s: String) -> Self {
        Ref::name(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_string_refs_compare_by_variant_first() {
        assert!(Ref::num(5) < Ref::name("a"));
        assert!(Ref::num(1) < Ref::num(2));
        assert!(Ref::name("a") < Ref::name("b"));
    }

    #[test]
    #[should_panic]
    fn sentinel_is_rejected() {
        Ref::num(u64::MAX);
    }

    #[test]
    fn display_matches_variant() {
        assert_eq!(Ref::num(3).to_string(), "3");
        assert_eq!(Ref::name("x").to_string(), "x");
    }
}
