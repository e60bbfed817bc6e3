//! Pairwise duplicate detection between personas.
//!
//! Similarity counts matching signals: six scalar fields compared exactly and
//! five list fields compared by Jaccard overlap. Both comparisons are
//! symmetric, so `similarity(a, b) == similarity(b, a)`.

use std::collections::HashSet;

use serde::Serialize;

use super::types::{PersonaField, PersonaView, LIST_FIELDS};

/// Similarity above this percentage marks a likely duplicate.
pub const DUPLICATE_THRESHOLD: f64 = 70.0;

/// List overlap above this Jaccard index counts as a match.
const LIST_OVERLAP: f64 = 0.5;

const EXACT_FIELDS: [PersonaField; 6] = [
    PersonaField::Name,
    PersonaField::Occupation,
    PersonaField::AgeRange,
    PersonaField::IncomeRange,
    PersonaField::Location,
    PersonaField::ProgramCategory,
];

/// A candidate that looks like an existing persona.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateCheck {
    pub candidate_index: usize,
    pub existing_index: usize,
    /// 0-100
    pub similarity: f64,
    pub matching_fields: Vec<&'static str>,
}

/// Similarity as a 0-100 percentage plus the fields that matched.
pub fn compare<A, B>(a: &A, b: &B) -> (f64, Vec<&'static str>)
where
    A: PersonaView + ?Sized,
    B: PersonaView + ?Sized,
{
    let mut matching = Vec::new();

    for field in EXACT_FIELDS {
        if let (Some(x), Some(y)) = (a.text(field), b.text(field)) {
            if !x.is_empty() && x == y {
                matching.push(field.as_str());
            }
        }
    }

    for field in LIST_FIELDS {
        if jaccard(a.items(field), b.items(field)) > LIST_OVERLAP {
            matching.push(field.as_str());
        }
    }

    let signals = (EXACT_FIELDS.len() + LIST_FIELDS.len()) as f64;
    (matching.len() as f64 / signals * 100.0, matching)
}

pub fn similarity<A, B>(a: &A, b: &B) -> f64
where
    A: PersonaView + ?Sized,
    B: PersonaView + ?Sized,
{
    compare(a, b).0
}

/// Every candidate/existing pair scoring above [`DUPLICATE_THRESHOLD`].
pub fn find_duplicates<A, B>(candidates: &[A], existing: &[B]) -> Vec<DuplicateCheck>
where
    A: PersonaView,
    B: PersonaView,
{
    let mut found = Vec::new();
    for (ci, candidate) in candidates.iter().enumerate() {
        for (ei, other) in existing.iter().enumerate() {
            let (similarity, matching_fields) = compare(candidate, other);
            if similarity > DUPLICATE_THRESHOLD {
                found.push(DuplicateCheck {
                    candidate_index: ci,
                    existing_index: ei,
                    similarity,
                    matching_fields,
                });
            }
        }
    }
    found
}

/// Case-insensitive Jaccard index; two empty lists share nothing.
fn jaccard(a: &[String], b: &[String]) -> f64 {
    let a: HashSet<String> = a.iter().map(|s| s.trim().to_lowercase()).collect();
    let b: HashSet<String> = b.iter().map(|s| s.trim().to_lowercase()).collect();

    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}
