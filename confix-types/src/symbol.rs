use crate::error::ValueError;
use crate::value::{SymbolValue, Tristate, ValueKind};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Symbol type as reported by the configuration model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolType {
    Bool,
    Tristate,
    Int,
    Hex,
    String,
}

impl SymbolType {
    pub fn value_kind(self) -> ValueKind {
        match self {
            SymbolType::Bool | SymbolType::Tristate => ValueKind::Boolean,
            SymbolType::Int | SymbolType::Hex | SymbolType::String => ValueKind::NonBoolean,
        }
    }

    pub fn is_boolean(self) -> bool {
        self.value_kind() == ValueKind::Boolean
    }
}

/// Handle to a symbol in the external configuration model.
///
/// Identity is the symbol name: two handles naming the same symbol are equal even when
/// they were resolved separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRef {
    name: String,
    #[serde(rename = "type")]
    ty: SymbolType,
}

impl SymbolRef {
    pub fn new(name: impl Into<String>, ty: SymbolType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol_type(&self) -> SymbolType {
        self.ty
    }

    pub fn value_kind(&self) -> ValueKind {
        self.ty.value_kind()
    }

    /// Parse raw user input against this symbol's type.
    ///
    /// `m` on a plain `bool` symbol is normalized to `y`.
    pub fn parse_value(&self, input: &str) -> Result<SymbolValue, ValueError> {
        let value = match self.ty.value_kind() {
            ValueKind::Boolean => {
                let t = input
                    .parse::<Tristate>()
                    .map_err(|e| e.with_symbol(&self.name))?;
                SymbolValue::Boolean(t)
            }
            ValueKind::NonBoolean => SymbolValue::NonBoolean(input.to_string()),
        };
        self.normalize(value)
    }

    /// Check a typed value against this symbol's type and sanitize it.
    pub fn normalize(&self, value: SymbolValue) -> Result<SymbolValue, ValueError> {
        if value.kind() != self.value_kind() {
            return Err(ValueError::KindMismatch {
                symbol: self.name.clone(),
                expected: self.value_kind(),
                actual: value.kind(),
            });
        }

        match (self.ty, value) {
            (SymbolType::Bool, SymbolValue::Boolean(Tristate::Mod)) => {
                Ok(SymbolValue::Boolean(Tristate::Yes))
            }
            (SymbolType::Int, SymbolValue::NonBoolean(s)) => {
                let trimmed = s.trim();
                if trimmed.parse::<i64>().is_ok() {
                    Ok(SymbolValue::NonBoolean(trimmed.to_string()))
                } else {
                    Err(self.invalid(s, "a decimal integer"))
                }
            }
            (SymbolType::Hex, SymbolValue::NonBoolean(s)) => {
                if is_hex_literal(&s) {
                    Ok(SymbolValue::NonBoolean(s))
                } else {
                    Err(self.invalid(s, "a hexadecimal number"))
                }
            }
            (_, value) => Ok(value),
        }
    }

    fn invalid(&self, value: String, expected: &'static str) -> ValueError {
        ValueError::InvalidValue {
            symbol: Some(self.name.clone()),
            value,
            expected,
        }
    }
}

fn is_hex_literal(s: &str) -> bool {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit())
}

impl PartialEq for SymbolRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for SymbolRef {}

impl Hash for SymbolRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for SymbolRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SymbolRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl fmt::Display for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
