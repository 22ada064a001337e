//! Diagnoses and diagnosis sets.
//!
//! A [`Diagnosis`] is a set of [`SymbolFix`]es: equality ignores insertion order and
//! repeated fixes. A [`DiagnosisSet`] keeps the solver's preference order.

use crate::change::SymbolFix;
use crate::error::ValueError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An internally consistent set of fixes that together resolve one conflict.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<SymbolFix>", into = "Vec<SymbolFix>")]
pub struct Diagnosis {
    fixes: Vec<SymbolFix>,
}

impl Diagnosis {
    /// Build a diagnosis, collapsing repeated fixes.
    ///
    /// Fails if two fixes name the same symbol with different values.
    pub fn new(fixes: impl IntoIterator<Item = SymbolFix>) -> Result<Self, ValueError> {
        let mut out: Vec<SymbolFix> = Vec::new();
        for fix in fixes {
            match out.iter().find(|f| f.symbol() == fix.symbol()) {
                Some(existing) if existing.desired() == fix.desired() => {}
                Some(_) => {
                    return Err(ValueError::InconsistentDiagnosis {
                        symbol: fix.symbol().name().to_string(),
                    });
                }
                None => out.push(fix),
            }
        }
        Ok(Self { fixes: out })
    }

    pub fn fixes(&self) -> &[SymbolFix] {
        &self.fixes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SymbolFix> {
        self.fixes.iter()
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    pub fn contains(&self, fix: &SymbolFix) -> bool {
        self.fixes.contains(fix)
    }

    /// The fix this diagnosis proposes for `name`, if any.
    pub fn fix_for(&self, name: &str) -> Option<&SymbolFix> {
        self.fixes.iter().find(|f| f.symbol().name() == name)
    }

    /// Deterministic identifier; set-equal diagnoses share it.
    pub fn stable_id(&self) -> Uuid {
        // v5(namespace, sorted "NAME=value" lines)
        const NAMESPACE: Uuid = Uuid::from_bytes([
            0x9a, 0x4e, 0x1c, 0x57, 0x3b, 0x02, 0x4f, 0x61, 0xa7, 0x35, 0x6d, 0x80, 0x2e, 0x11,
            0xc4, 0x9b,
        ]);

        let mut keys: Vec<String> = self.fixes.iter().map(|f| f.to_string()).collect();
        keys.sort();
        Uuid::new_v5(&NAMESPACE, keys.join("\n").as_bytes())
    }
}

impl PartialEq for Diagnosis {
    fn eq(&self, other: &Self) -> bool {
        // Elements are unique per symbol, so equal length plus containment is set equality.
        self.fixes.len() == other.fixes.len() && self.fixes.iter().all(|f| other.contains(f))
    }
}

impl Eq for Diagnosis {}

impl TryFrom<Vec<SymbolFix>> for Diagnosis {
    type Error = ValueError;

    fn try_from(fixes: Vec<SymbolFix>) -> Result<Self, Self::Error> {
        Diagnosis::new(fixes)
    }
}

impl From<Diagnosis> for Vec<SymbolFix> {
    fn from(d: Diagnosis) -> Self {
        d.fixes
    }
}

impl<'a> IntoIterator for &'a Diagnosis {
    type Item = &'a SymbolFix;
    type IntoIter = std::slice::Iter<'a, SymbolFix>;

    fn into_iter(self) -> Self::IntoIter {
        self.fixes.iter()
    }
}

/// Ordered candidate diagnoses for one solve, in solver preference order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagnosisSet {
    diagnoses: Vec<Diagnosis>,
}

impl DiagnosisSet {
    pub fn new(diagnoses: Vec<Diagnosis>) -> Self {
        Self { diagnoses }
    }

    pub fn diagnoses(&self) -> &[Diagnosis] {
        &self.diagnoses
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnosis> {
        self.diagnoses.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Diagnosis> {
        self.diagnoses.get(index)
    }

    pub fn len(&self) -> usize {
        self.diagnoses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnoses.is_empty()
    }

    pub fn push(&mut self, diagnosis: Diagnosis) {
        self.diagnoses.push(diagnosis);
    }

    /// Drop set-equal duplicates, keeping the first occurrence of each.
    pub fn deduplicated(&self) -> DiagnosisSet {
        DiagnosisSet {
            diagnoses: remove_duplicates(&self.diagnoses),
        }
    }

    pub fn into_vec(self) -> Vec<Diagnosis> {
        self.diagnoses
    }
}

impl From<Vec<Diagnosis>> for DiagnosisSet {
    fn from(diagnoses: Vec<Diagnosis>) -> Self {
        Self::new(diagnoses)
    }
}

impl IntoIterator for DiagnosisSet {
    type Item = Diagnosis;
    type IntoIter = std::vec::IntoIter<Diagnosis>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnoses.into_iter()
    }
}

impl<'a> IntoIterator for &'a DiagnosisSet {
    type Item = &'a Diagnosis;
    type IntoIter = std::slice::Iter<'a, Diagnosis>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnoses.iter()
    }
}

/// Remove set-equal duplicates from `diagnoses`, preserving first-occurrence order.
///
/// Each candidate is compared against every diagnosis accepted so far.
pub fn remove_duplicates(diagnoses: &[Diagnosis]) -> Vec<Diagnosis> {
    let mut accepted: Vec<Diagnosis> = Vec::with_capacity(diagnoses.len());
    for candidate in diagnoses {
        if !accepted.iter().any(|seen| seen == candidate) {
            accepted.push(candidate.clone());
        }
    }
    accepted
}
