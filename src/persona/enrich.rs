//! Fills derived fields that a draft left absent.

use super::types::{PersonaDraft, PersonaField, TextList};

const DEFAULT_INDUSTRY: &str = "Professional Services";

const INDUSTRY_BY_CATEGORY: &[(&str, &str)] = &[
    ("Supply Chain Management", "Manufacturing & Logistics"),
    ("Management and Leadership", "Business & Management"),
    ("Human Capital Management", "Human Resources"),
    ("Healthcare Management", "Healthcare"),
    ("Technology Management", "Technology"),
    ("Finance", "Financial Services"),
    ("Marketing", "Marketing & Advertising"),
    ("Operations", "Operations & Manufacturing"),
];

// Matched as occupation substrings, first hit wins.
const TRAITS_BY_OCCUPATION: &[(&str, [&str; 4])] = &[
    ("manager", ["analytical", "results-oriented", "strategic-thinking", "leadership-focused"]),
    ("coordinator", ["organized", "detail-oriented", "collaborative", "process-focused"]),
    ("specialist", ["analytical", "technical", "problem-solving", "continuous-learning"]),
    ("analyst", ["data-driven", "analytical", "methodical", "insight-oriented"]),
    ("director", ["strategic", "visionary", "decisive", "influential"]),
    ("supervisor", ["supportive", "people-focused", "organized", "results-driven"]),
];
const DEFAULT_TRAITS: [&str; 4] = ["professional", "goal-oriented", "analytical", "growth-minded"];

const VALUES_BY_CATEGORY: &[(&str, [&str; 4])] = &[
    ("Supply Chain Management", ["efficiency", "optimization", "innovation", "sustainability"]),
    ("Management and Leadership", ["leadership", "development", "results", "collaboration"]),
    ("Human Capital Management", ["people-development", "organizational-health", "diversity", "performance"]),
];
const DEFAULT_VALUES: [&str; 4] = ["excellence", "growth", "integrity", "innovation"];

pub fn infer_industry(program_category: &str) -> &'static str {
    lookup(INDUSTRY_BY_CATEGORY, program_category)
        .copied()
        .unwrap_or(DEFAULT_INDUSTRY)
}

pub fn suggest_traits(occupation: &str) -> Vec<String> {
    let occupation = occupation.to_lowercase();
    TRAITS_BY_OCCUPATION
        .iter()
        .find(|(key, _)| occupation.contains(key))
        .map(|(_, traits)| traits)
        .unwrap_or(&DEFAULT_TRAITS)
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn suggest_values(program_category: &str) -> Vec<String> {
    lookup(VALUES_BY_CATEGORY, program_category)
        .unwrap_or(&DEFAULT_VALUES)
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn lookup<T>(table: &'static [(&'static str, T)], key: &str) -> Option<&'static T> {
    let key = key.trim();
    table
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

/// Static-table enrichment. Never overwrites a populated field.
#[derive(Debug, Clone, Copy, Default)]
pub struct Enricher;

impl Enricher {
    pub fn new() -> Self {
        Self
    }

    /// Fill industry, personality traits and values when absent or empty.
    /// Returns the names of the fields it filled.
    pub fn enrich(&self, draft: &mut PersonaDraft) -> Vec<&'static str> {
        let mut filled = Vec::new();
        let category = draft
            .text(PersonaField::ProgramCategory)
            .unwrap_or_default()
            .to_string();

        if is_blank(draft.text(PersonaField::Industry)) {
            draft.set_text(PersonaField::Industry, infer_industry(&category));
            filled.push(PersonaField::Industry.as_str());
        }

        if needs_items(draft, PersonaField::PersonalityTraits) {
            let occupation = draft.text(PersonaField::Occupation).unwrap_or_default();
            let traits = suggest_traits(occupation);
            draft.set_items(PersonaField::PersonalityTraits, traits);
            filled.push(PersonaField::PersonalityTraits.as_str());
        }

        if needs_items(draft, PersonaField::Values) {
            draft.set_items(PersonaField::Values, suggest_values(&category));
            filled.push(PersonaField::Values.as_str());
        }

        filled
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Absent or an empty array. A malformed value is left for the validator.
fn needs_items(draft: &PersonaDraft, field: PersonaField) -> bool {
    match draft.list(field) {
        None => true,
        Some(TextList::Items(items)) => items.is_empty(),
        Some(TextList::Malformed(_)) => false,
    }
}
