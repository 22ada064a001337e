use crate::error::ValueError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Three-valued state of a boolean-kind symbol.
///
/// Ordered `No < Mod < Yes`, matching the way kconfig compares tristates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tristate {
    No,
    Mod,
    Yes,
}

impl Tristate {
    /// Parse one of the kconfig tokens `y`, `m`, `n`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "y" => Some(Tristate::Yes),
            "m" => Some(Tristate::Mod),
            "n" => Some(Tristate::No),
            _ => None,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Tristate::Yes => "y",
            Tristate::Mod => "m",
            Tristate::No => "n",
        }
    }

    pub fn is_enabled(self) -> bool {
        !matches!(self, Tristate::No)
    }
}

impl fmt::Display for Tristate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

impl FromStr for Tristate {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tristate::from_token(s).ok_or_else(|| ValueError::InvalidValue {
            symbol: None,
            value: s.to_string(),
            expected: "one of y, m, n",
        })
    }
}

/// Which variant of [`SymbolValue`] a symbol accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Boolean,
    NonBoolean,
}

/// A value tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SymbolValue {
    Boolean(Tristate),
    NonBoolean(String),
}

impl SymbolValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            SymbolValue::Boolean(_) => ValueKind::Boolean,
            SymbolValue::NonBoolean(_) => ValueKind::NonBoolean,
        }
    }

    pub fn as_tristate(&self) -> Option<Tristate> {
        match self {
            SymbolValue::Boolean(t) => Some(*t),
            SymbolValue::NonBoolean(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SymbolValue::Boolean(t) => t.as_token(),
            SymbolValue::NonBoolean(s) => s.as_str(),
        }
    }
}

impl fmt::Display for SymbolValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Tristate> for SymbolValue {
    fn from(t: Tristate) -> Self {
        SymbolValue::Boolean(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tristate_tokens_round_trip() {
        for t in [Tristate::No, Tristate::Mod, Tristate::Yes] {
            assert_eq!(Tristate::from_token(t.as_token()), Some(t));
        }
    }

    #[test]
    fn tristate_rejects_long_forms() {
        assert!(Tristate::from_token("yes").is_none());
        assert!(Tristate::from_token("Y").is_none());
        assert!(Tristate::from_token("").is_none());
        assert!("maybe".parse::<Tristate>().is_err());
    }

    #[test]
    fn tristate_ordering_matches_kconfig() {
        assert!(Tristate::No < Tristate::Mod);
        assert!(Tristate::Mod < Tristate::Yes);
        assert!(!Tristate::No.is_enabled());
        assert!(Tristate::Mod.is_enabled());
    }

    #[test]
    fn value_display_uses_tokens() {
        assert_eq!(SymbolValue::Boolean(Tristate::Mod).to_string(), "m");
        assert_eq!(SymbolValue::NonBoolean("0x10".into()).to_string(), "0x10");
    }
}
