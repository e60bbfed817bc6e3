//! Persona validation, sanitization and quality grading.
//!
//! Every rule runs independently and findings accumulate. Errors block
//! persistence; warnings are advisory and only lower the score.

use std::collections::HashSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::types::{PersonaDraft, PersonaField, TextList, LIST_FIELDS, REQUIRED_FIELDS};

// ─────────────────────────────────────────────────────────────────
// Rules
// ─────────────────────────────────────────────────────────────────

const REQUIRED_PENALTY: u32 = 10;
const ERROR_PENALTY: u32 = 5;
const FORMAT_WARNING_PENALTY: u32 = 2;
const CONTENT_WARNING_PENALTY: u32 = 3;
const ARRAY_WARNING_PENALTY: u32 = 2;

const AGE_BOUNDS: (u64, u64) = (18, 80);
/// Thousands of dollars
const INCOME_BOUNDS: (u64, u64) = (20, 500);
const NAME_LENGTH: (usize, usize) = (3, 100);
const DESCRIPTION_LENGTH: (usize, usize) = (20, 500);

/// Field-specific optimal list lengths (inclusive).
fn optimal_len(field: PersonaField) -> (usize, usize) {
    match field {
        PersonaField::Goals | PersonaField::PainPoints => (2, 5),
        PersonaField::PreferredChannels => (2, 4),
        PersonaField::PersonalityTraits => (3, 6),
        PersonaField::Values => (3, 5),
        _ => (0, usize::MAX),
    }
}

fn pattern(re: &str) -> Regex {
    Regex::new(re).unwrap_or_else(|e| panic!("invalid validation pattern {re}: {e}"))
}

static AGE_RANGE: Lazy<Regex> = Lazy::new(|| pattern(r"^(\d{2})-(\d{2})$"));
static INCOME_RANGE: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)^\$(\d+)k-\$(\d+)k$"));
static NAME_WITH_TITLE: Lazy<Regex> = Lazy::new(|| {
    pattern(r"^[A-Za-z][A-Za-z.'\-]*(\s+[A-Za-z][A-Za-z.'\-]*)+\s-\s[A-Za-z][A-Za-z&/,.'\s\-]*$")
});
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| pattern(r"(?i)\b(lorem ipsum|placeholder|example|test|sample)\b"));
static INFORMAL: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)\b(awesome|cool|amazing|fantastic)\b"));
static VAGUE: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)\b(various|multiple|different|many)\b"));

// ─────────────────────────────────────────────────────────────────
// Results
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// 0-100
    pub score: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QualityGrade {
    A,
    B,
    C,
    D,
    F,
}

impl QualityGrade {
    fn from_score(score: f32) -> Self {
        if score >= 0.9 {
            QualityGrade::A
        } else if score >= 0.8 {
            QualityGrade::B
        } else if score >= 0.7 {
            QualityGrade::C
        } else if score >= 0.6 {
            QualityGrade::D
        } else {
            QualityGrade::F
        }
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    /// 0.0-1.0
    pub overall: f32,
    pub grade: QualityGrade,
}

/// Accumulates findings and penalties.
#[derive(Default)]
struct Findings {
    errors: Vec<String>,
    warnings: Vec<String>,
    penalty: u32,
}

impl Findings {
    fn error(&mut self, penalty: u32, message: String) {
        self.errors.push(message);
        self.penalty += penalty;
    }

    fn warning(&mut self, penalty: u32, message: String) {
        self.warnings.push(message);
        self.penalty += penalty;
    }

    fn finish(self) -> ValidationResult {
        let score = 100u32.saturating_sub(self.penalty) as u8;
        ValidationResult {
            is_valid: self.errors.is_empty(),
            errors: self.errors,
            warnings: self.warnings,
            score,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Validator
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, draft: &PersonaDraft) -> ValidationResult {
        let mut findings = Findings::default();

        check_required(draft, &mut findings);
        check_ranges(draft, &mut findings);
        check_name(draft, &mut findings);
        check_content(draft, &mut findings);
        check_lists(draft, &mut findings);

        findings.finish()
    }

    /// Trim strings, drop blank values and repeated list items. Idempotent.
    pub fn sanitize(&self, draft: &PersonaDraft) -> PersonaDraft {
        let mut clean = draft.clone();

        for field in REQUIRED_FIELDS.iter().chain([PersonaField::Industry].iter()) {
            if let Some(slot) = clean.scalar_slot_mut(*field) {
                *slot = slot
                    .take()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty());
            }
        }
        clean.avatar_url = clean
            .avatar_url
            .take()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        for field in LIST_FIELDS {
            if let Some(Some(TextList::Items(items))) = clean.list_slot_mut(field) {
                let mut seen = HashSet::new();
                *items = items
                    .iter()
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty())
                    .filter(|item| seen.insert(item.to_lowercase()))
                    .collect();
            }
        }

        clean
    }

    /// Validation score plus completeness bonuses, graded A-F.
    pub fn quality(&self, draft: &PersonaDraft) -> QualityReport {
        let mut score = self.validate(draft).score as f32 / 100.0;

        if draft.avatar_url.as_deref().is_some_and(|u| !u.trim().is_empty()) {
            score += 0.05;
        }
        if draft
            .text(PersonaField::Description)
            .is_some_and(|d| d.chars().count() > 100)
        {
            score += 0.05;
        }
        for field in LIST_FIELDS {
            if draft.items(field).len() >= 3 {
                score += 0.02;
            }
        }

        let overall = score.clamp(0.0, 1.0);
        QualityReport {
            overall,
            grade: QualityGrade::from_score(overall),
        }
    }
}

fn check_required(draft: &PersonaDraft, findings: &mut Findings) {
    for field in REQUIRED_FIELDS {
        let missing = if field.is_list() {
            draft.list(field).is_none()
        } else {
            draft.text(field).map_or(true, |v| v.trim().is_empty())
        };
        if missing {
            findings.error(REQUIRED_PENALTY, format!("Missing required field: {}", field));
        }
    }
}

/// Parse "lo-hi" numbers from a capture, `None` when the pattern does not match.
/// Numbers too large for `u64` saturate to `u64::MAX`.
fn bounds(re: &Regex, value: &str) -> Option<(u64, u64)> {
    let caps = re.captures(value.trim())?;
    let number = |i: usize| caps.get(i).map(|m| m.as_str().parse().unwrap_or(u64::MAX));
    Some((number(1)?, number(2)?))
}

fn check_ranges(draft: &PersonaDraft, findings: &mut Findings) {
    if let Some(age) = draft.text(PersonaField::AgeRange).filter(|v| !v.trim().is_empty()) {
        match bounds(&AGE_RANGE, age) {
            Some((lo, hi)) if lo < hi => {
                if lo < AGE_BOUNDS.0 || hi > AGE_BOUNDS.1 {
                    findings.warning(
                        FORMAT_WARNING_PENALTY,
                        format!(
                            "age_range {} falls outside typical bounds {}-{}",
                            age, AGE_BOUNDS.0, AGE_BOUNDS.1
                        ),
                    );
                }
            }
            Some(_) => findings.error(
                ERROR_PENALTY,
                format!("age_range {} must have minimum below maximum", age),
            ),
            None => findings.error(
                ERROR_PENALTY,
                format!("age_range {:?} must match the format NN-NN", age),
            ),
        }
    }

    if let Some(income) = draft.text(PersonaField::IncomeRange).filter(|v| !v.trim().is_empty()) {
        match bounds(&INCOME_RANGE, income) {
            // A saturated maximum is out of bounds whatever the order.
            Some((lo, hi)) if lo < hi || hi == u64::MAX => {
                if lo < INCOME_BOUNDS.0 || hi > INCOME_BOUNDS.1 {
                    findings.warning(
                        FORMAT_WARNING_PENALTY,
                        format!(
                            "income_range {} falls outside typical bounds ${}k-${}k",
                            income, INCOME_BOUNDS.0, INCOME_BOUNDS.1
                        ),
                    );
                }
            }
            Some(_) => findings.error(
                ERROR_PENALTY,
                format!("income_range {} must have minimum below maximum", income),
            ),
            None => findings.error(
                ERROR_PENALTY,
                format!("income_range {:?} must match the format $Nk-$Nk", income),
            ),
        }
    }
}

fn check_name(draft: &PersonaDraft, findings: &mut Findings) {
    let Some(name) = draft.text(PersonaField::Name).map(str::trim).filter(|n| !n.is_empty()) else {
        return;
    };

    let len = name.chars().count();
    if len < NAME_LENGTH.0 || len > NAME_LENGTH.1 {
        findings.error(
            ERROR_PENALTY,
            format!(
                "name must be between {} and {} characters (got {})",
                NAME_LENGTH.0, NAME_LENGTH.1, len
            ),
        );
    } else if !NAME_WITH_TITLE.is_match(name) {
        findings.warning(
            FORMAT_WARNING_PENALTY,
            format!("name {:?} does not follow the \"First Last - Title\" shape", name),
        );
    }
}

fn check_content(draft: &PersonaDraft, findings: &mut Findings) {
    for field in [PersonaField::Name, PersonaField::Description, PersonaField::Occupation] {
        if let Some(m) = draft.text(field).and_then(|v| PLACEHOLDER.find(v)) {
            findings.warning(
                CONTENT_WARNING_PENALTY,
                format!("{} contains placeholder text {:?}", field, m.as_str()),
            );
        }
    }

    let Some(description) = draft.text(PersonaField::Description).map(str::trim).filter(|d| !d.is_empty()) else {
        return;
    };

    let len = description.chars().count();
    if len < DESCRIPTION_LENGTH.0 {
        findings.warning(
            CONTENT_WARNING_PENALTY,
            format!("description is very short ({} characters)", len),
        );
    } else if len > DESCRIPTION_LENGTH.1 {
        findings.warning(
            CONTENT_WARNING_PENALTY,
            format!("description is very long ({} characters)", len),
        );
    }
    if let Some(m) = INFORMAL.find(description) {
        findings.warning(
            CONTENT_WARNING_PENALTY,
            format!("description uses informal language {:?}", m.as_str()),
        );
    }
    if let Some(m) = VAGUE.find(description) {
        findings.warning(
            CONTENT_WARNING_PENALTY,
            format!("description uses vague quantifier {:?}", m.as_str()),
        );
    }
}

fn check_lists(draft: &PersonaDraft, findings: &mut Findings) {
    for field in LIST_FIELDS {
        let items = match draft.list(field) {
            None => continue,
            Some(TextList::Malformed(_)) => {
                findings.error(ERROR_PENALTY, format!("{} must be an array of strings", field));
                continue;
            }
            Some(TextList::Items(items)) => items,
        };

        if items.is_empty() {
            findings.warning(ARRAY_WARNING_PENALTY, format!("{} is empty", field));
            continue;
        }

        let mut seen = HashSet::new();
        if !items.iter().all(|item| seen.insert(item.trim().to_lowercase())) {
            findings.warning(ARRAY_WARNING_PENALTY, format!("{} contains duplicate values", field));
        }

        let (min, max) = optimal_len(field);
        if items.len() < min || items.len() > max {
            findings.warning(
                ARRAY_WARNING_PENALTY,
                format!(
                    "{} has {} items; {}-{} is recommended",
                    field,
                    items.len(),
                    min,
                    max
                ),
            );
        }

        if items.iter().any(|item| item.trim().chars().count() < 2) {
            findings.warning(
                ARRAY_WARNING_PENALTY,
                format!("{} contains entries shorter than 2 characters", field),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(items: &[&str]) -> Option<TextList> {
        Some(TextList::Items(items.iter().map(|s| s.to_string()).collect()))
    }

    fn good_draft() -> PersonaDraft {
        PersonaDraft {
            name: Some("Maria Lopez - Procurement Lead".into()),
            age_range: Some("32-40".into()),
            occupation: Some("Procurement Manager".into()),
            industry: Some("Manufacturing & Logistics".into()),
            education_level: Some("Bachelor's degree".into()),
            income_range: Some("$70k-$95k".into()),
            location: Some("Grand Rapids, Michigan".into()),
            description: Some(
                "Procurement manager at a regional parts supplier who wants strategic sourcing skills."
                    .into(),
            ),
            program_category: Some("Supply Chain Management".into()),
            personality_traits: strings(&["analytical", "pragmatic", "collaborative"]),
            values: strings(&["efficiency", "integrity", "growth"]),
            goals: strings(&["Move into a director role", "Lead supplier strategy"]),
            pain_points: strings(&["Supplier disruptions", "Limited training budget"]),
            preferred_channels: strings(&["LinkedIn", "Email"]),
            ..Default::default()
        }
    }

    #[test]
    fn test_good_draft_is_clean() {
        let result = Validator::new().validate(&good_draft());
        assert!(result.is_valid, "errors: {:?}", result.errors);
        assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn test_missing_fields_are_errors() {
        let mut draft = good_draft();
        draft.location = None;
        draft.description = Some("   ".into());
        draft.goals = None;

        let result = Validator::new().validate(&draft);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 3);
        assert_eq!(result.score, 70);
    }

    #[test]
    fn test_range_formats() {
        let validator = Validator::new();

        let mut draft = good_draft();
        draft.age_range = Some("40-32".into());
        draft.income_range = Some("70k to 95k".into());
        let result = validator.validate(&draft);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.score, 90);

        let mut draft = good_draft();
        draft.age_range = Some("16-24".into());
        draft.income_range = Some("$10K-$30K".into());
        let result = validator.validate(&draft);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 2);
        assert_eq!(result.score, 96);
    }

    #[test]
    fn test_reversed_age_range_is_an_error() {
        let mut draft = good_draft();
        draft.age_range = Some("45-30".into());
        let result = Validator::new().validate(&draft);
        assert!(!result.is_valid);
        assert_eq!(
            result.errors,
            vec!["age_range 45-30 must have minimum below maximum".to_string()]
        );
    }

    #[test]
    fn test_huge_income_is_out_of_bounds_not_malformed() {
        let validator = Validator::new();

        let mut draft = good_draft();
        draft.income_range = Some("$5000000000k-$6000000000k".into());
        let result = validator.validate(&draft);
        assert!(result.is_valid, "errors: {:?}", result.errors);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("outside typical bounds"));

        draft.income_range = Some("$50000000000000000000000k-$60000000000000000000000k".into());
        let result = validator.validate(&draft);
        assert!(result.is_valid, "errors: {:?}", result.errors);
        assert!(result.warnings[0].contains("outside typical bounds"));
    }

    #[test]
    fn test_name_rules() {
        let validator = Validator::new();

        let mut draft = good_draft();
        draft.name = Some("Jo".into());
        assert!(!validator.validate(&draft).is_valid);

        draft.name = Some("Maria Lopez".into());
        let result = validator.validate(&draft);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_content_quality_warnings_never_block() {
        let mut draft = good_draft();
        draft.description = Some(
            "An awesome sample persona who juggles many priorities at a regional distributor.".into(),
        );
        let result = Validator::new().validate(&draft);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 3);
        assert_eq!(result.score, 91);
    }

    #[test]
    fn test_placeholder_matches_whole_words_only() {
        let mut draft = good_draft();
        draft.description = Some("Contest winner and latest hire at the greatest regional distributor.".into());
        assert!(Validator::new().validate(&draft).warnings.is_empty());
    }

    #[test]
    fn test_list_rules() {
        let mut draft = good_draft();
        draft.preferred_channels = Some(TextList::Malformed(json!("LinkedIn")));
        draft.values = strings(&[]);
        draft.goals = strings(&["Grow", "grow", "Lead", "x"]);

        let result = Validator::new().validate(&draft);
        assert!(!result.is_valid);
        assert_eq!(result.errors, vec!["preferred_channels must be an array of strings"]);
        // empty values, duplicate goals, short goal entry
        assert_eq!(result.warnings.len(), 3);
    }

    #[test]
    fn test_score_is_floored_at_zero() {
        let result = Validator::new().validate(&PersonaDraft::default());
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 13);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let mut draft = good_draft();
        draft.name = Some("  Maria Lopez - Procurement Lead ".into());
        draft.industry = Some("   ".into());
        draft.goals = strings(&[" Lead ", "lead", "", "Grow  "]);

        let validator = Validator::new();
        let once = validator.sanitize(&draft);
        let twice = validator.sanitize(&once);

        assert_eq!(once, twice);
        assert_eq!(once.text(PersonaField::Name), Some("Maria Lopez - Procurement Lead"));
        assert!(once.industry.is_none());
        assert_eq!(once.items(PersonaField::Goals), ["Lead".to_string(), "Grow".to_string()]);
    }

    #[test]
    fn test_quality_grade() {
        let validator = Validator::new();
        let report = validator.quality(&good_draft());
        assert_eq!(report.grade, QualityGrade::A);
        assert!(report.overall <= 1.0);

        let report = validator.quality(&PersonaDraft::default());
        assert_eq!(report.grade, QualityGrade::F);
        assert_eq!(report.overall, 0.0);
    }
}
