//! Core persona types.
//!
//! A [`PersonaDraft`] is the loosely-typed record that comes back from the
//! model (or the fallback synthesizer) and moves through sanitize, validate
//! and enrich. A [`Persona`] is the fully-populated record handed to
//! persistence.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ─────────────────────────────────────────────────────────────────
// Intelligence Level
// ─────────────────────────────────────────────────────────────────

/// How rich the requested persona fields are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntelligenceLevel {
    #[default]
    Basic,
    Advanced,
    Expert,
}

impl IntelligenceLevel {
    pub fn slug(&self) -> &'static str {
        match self {
            IntelligenceLevel::Basic => "basic",
            IntelligenceLevel::Advanced => "advanced",
            IntelligenceLevel::Expert => "expert",
        }
    }

    pub fn all() -> &'static [IntelligenceLevel] {
        &[
            IntelligenceLevel::Basic,
            IntelligenceLevel::Advanced,
            IntelligenceLevel::Expert,
        ]
    }
}

impl fmt::Display for IntelligenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for IntelligenceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(IntelligenceLevel::Basic),
            "advanced" => Ok(IntelligenceLevel::Advanced),
            "expert" => Ok(IntelligenceLevel::Expert),
            _ => Err(format!(
                "Unknown intelligence level '{}'. Valid: basic, advanced, expert",
                s
            )),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Provenance & Status
// ─────────────────────────────────────────────────────────────────

/// Where a persona's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    #[default]
    AiGenerated,
    Fallback,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::AiGenerated => write!(f, "ai-generated"),
            Provenance::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaStatus {
    #[default]
    Active,
    Inactive,
    Draft,
}

// ─────────────────────────────────────────────────────────────────
// Generation Request
// ─────────────────────────────────────────────────────────────────

/// A batch generation request. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaGenerationRequest {
    /// Free-text marketing brief
    pub brief: String,
    pub institution_id: String,
    pub program_ids: Vec<String>,
    pub count: usize,
    #[serde(default)]
    pub intelligence_level: IntelligenceLevel,
    #[serde(default)]
    pub generate_images: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}

impl PersonaGenerationRequest {
    pub fn new(
        brief: impl Into<String>,
        institution_id: impl Into<String>,
        program_ids: Vec<String>,
        count: usize,
    ) -> Self {
        Self {
            brief: brief.into(),
            institution_id: institution_id.into(),
            program_ids,
            count,
            intelligence_level: IntelligenceLevel::default(),
            generate_images: false,
            template_id: None,
        }
    }

    pub fn with_level(mut self, level: IntelligenceLevel) -> Self {
        self.intelligence_level = level;
        self
    }

    pub fn with_images(mut self, generate_images: bool) -> Self {
        self.generate_images = generate_images;
        self
    }

    pub fn with_template(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }
}

/// Owner stamped onto persisted personas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ownership {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

// ─────────────────────────────────────────────────────────────────
// Persona Fields
// ─────────────────────────────────────────────────────────────────

/// Named persona fields, used by the validator, deduplicator and enricher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonaField {
    Name,
    AgeRange,
    Occupation,
    Industry,
    EducationLevel,
    IncomeRange,
    Location,
    Description,
    ProgramCategory,
    PersonalityTraits,
    Values,
    Goals,
    PainPoints,
    PreferredChannels,
}

impl PersonaField {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaField::Name => "name",
            PersonaField::AgeRange => "age_range",
            PersonaField::Occupation => "occupation",
            PersonaField::Industry => "industry",
            PersonaField::EducationLevel => "education_level",
            PersonaField::IncomeRange => "income_range",
            PersonaField::Location => "location",
            PersonaField::Description => "description",
            PersonaField::ProgramCategory => "program_category",
            PersonaField::PersonalityTraits => "personality_traits",
            PersonaField::Values => "values",
            PersonaField::Goals => "goals",
            PersonaField::PainPoints => "pain_points",
            PersonaField::PreferredChannels => "preferred_channels",
        }
    }

    pub fn is_list(&self) -> bool {
        LIST_FIELDS.contains(self)
    }
}

impl fmt::Display for PersonaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields every persona must carry. Absence at parse time is a parse error.
pub const REQUIRED_FIELDS: [PersonaField; 13] = [
    PersonaField::Name,
    PersonaField::AgeRange,
    PersonaField::Occupation,
    PersonaField::IncomeRange,
    PersonaField::EducationLevel,
    PersonaField::Location,
    PersonaField::Description,
    PersonaField::ProgramCategory,
    PersonaField::Goals,
    PersonaField::PainPoints,
    PersonaField::PreferredChannels,
    PersonaField::PersonalityTraits,
    PersonaField::Values,
];

pub const LIST_FIELDS: [PersonaField; 5] = [
    PersonaField::Goals,
    PersonaField::PainPoints,
    PersonaField::PreferredChannels,
    PersonaField::PersonalityTraits,
    PersonaField::Values,
];

// ─────────────────────────────────────────────────────────────────
// Persona Draft
// ─────────────────────────────────────────────────────────────────

/// A list field as the model sent it. Anything that is not an array of
/// strings is kept verbatim so the validator can report a type error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextList {
    Items(Vec<String>),
    Malformed(Value),
}

impl TextList {
    pub fn items(&self) -> &[String] {
        match self {
            TextList::Items(items) => items,
            TextList::Malformed(_) => &[],
        }
    }
}

impl From<Vec<String>> for TextList {
    fn from(items: Vec<String>) -> Self {
        TextList::Items(items)
    }
}

/// The mutable in-flight persona record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonaDraft {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub age_range: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub education_level: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub income_range: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub program_category: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality_traits: Option<TextList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<TextList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goals: Option<TextList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pain_points: Option<TextList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_channels: Option<TextList>,

    #[serde(default)]
    pub provenance: Provenance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<u8>,

    /// Additional keys requested by richer intelligence levels
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Accept strings, numbers and booleans for scalar fields; null is absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

impl PersonaDraft {
    /// Scalar field value, `None` for list fields
    pub fn text(&self, field: PersonaField) -> Option<&str> {
        self.scalar_slot(field).and_then(|slot| slot.as_deref())
    }

    pub fn set_text(&mut self, field: PersonaField, value: impl Into<String>) {
        if let Some(slot) = self.scalar_slot_mut(field) {
            *slot = Some(value.into());
        }
    }

    /// Raw list field value, `None` for scalar fields or absent lists
    pub fn list(&self, field: PersonaField) -> Option<&TextList> {
        self.list_slot(field).and_then(|slot| slot.as_ref())
    }

    /// List items, empty when absent or malformed
    pub fn items(&self, field: PersonaField) -> &[String] {
        self.list(field).map(TextList::items).unwrap_or(&[])
    }

    pub fn set_items(&mut self, field: PersonaField, items: Vec<String>) {
        if let Some(slot) = self.list_slot_mut(field) {
            *slot = Some(TextList::Items(items));
        }
    }

    pub(crate) fn scalar_slot(&self, field: PersonaField) -> Option<&Option<String>> {
        match field {
            PersonaField::Name => Some(&self.name),
            PersonaField::AgeRange => Some(&self.age_range),
            PersonaField::Occupation => Some(&self.occupation),
            PersonaField::Industry => Some(&self.industry),
            PersonaField::EducationLevel => Some(&self.education_level),
            PersonaField::IncomeRange => Some(&self.income_range),
            PersonaField::Location => Some(&self.location),
            PersonaField::Description => Some(&self.description),
            PersonaField::ProgramCategory => Some(&self.program_category),
            _ => None,
        }
    }

    pub(crate) fn scalar_slot_mut(&mut self, field: PersonaField) -> Option<&mut Option<String>> {
        match field {
            PersonaField::Name => Some(&mut self.name),
            PersonaField::AgeRange => Some(&mut self.age_range),
            PersonaField::Occupation => Some(&mut self.occupation),
            PersonaField::Industry => Some(&mut self.industry),
            PersonaField::EducationLevel => Some(&mut self.education_level),
            PersonaField::IncomeRange => Some(&mut self.income_range),
            PersonaField::Location => Some(&mut self.location),
            PersonaField::Description => Some(&mut self.description),
            PersonaField::ProgramCategory => Some(&mut self.program_category),
            _ => None,
        }
    }

    pub(crate) fn list_slot(&self, field: PersonaField) -> Option<&Option<TextList>> {
        match field {
            PersonaField::PersonalityTraits => Some(&self.personality_traits),
            PersonaField::Values => Some(&self.values),
            PersonaField::Goals => Some(&self.goals),
            PersonaField::PainPoints => Some(&self.pain_points),
            PersonaField::PreferredChannels => Some(&self.preferred_channels),
            _ => None,
        }
    }

    pub(crate) fn list_slot_mut(&mut self, field: PersonaField) -> Option<&mut Option<TextList>> {
        match field {
            PersonaField::PersonalityTraits => Some(&mut self.personality_traits),
            PersonaField::Values => Some(&mut self.values),
            PersonaField::Goals => Some(&mut self.goals),
            PersonaField::PainPoints => Some(&mut self.pain_points),
            PersonaField::PreferredChannels => Some(&mut self.preferred_channels),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Persona
// ─────────────────────────────────────────────────────────────────

/// A persisted persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub name: String,
    pub age_range: String,
    pub occupation: String,
    pub industry: String,
    pub education_level: String,
    pub income_range: String,
    pub location: String,
    pub personality_traits: Vec<String>,
    pub values: Vec<String>,
    pub goals: Vec<String>,
    pub pain_points: Vec<String>,
    pub preferred_channels: Vec<String>,
    pub description: String,
    pub program_category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub status: PersonaStatus,
    pub provenance: Provenance,
    pub quality_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Persona {
    /// Promote a finished draft to a persona with a fresh id.
    pub fn from_draft(draft: &PersonaDraft, ownership: &Ownership, now: DateTime<Utc>) -> Self {
        let text = |field| draft.text(field).unwrap_or_default().to_string();
        let items = |field| draft.items(field).to_vec();

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: text(PersonaField::Name),
            age_range: text(PersonaField::AgeRange),
            occupation: text(PersonaField::Occupation),
            industry: text(PersonaField::Industry),
            education_level: text(PersonaField::EducationLevel),
            income_range: text(PersonaField::IncomeRange),
            location: text(PersonaField::Location),
            personality_traits: items(PersonaField::PersonalityTraits),
            values: items(PersonaField::Values),
            goals: items(PersonaField::Goals),
            pain_points: items(PersonaField::PainPoints),
            preferred_channels: items(PersonaField::PreferredChannels),
            description: text(PersonaField::Description),
            program_category: text(PersonaField::ProgramCategory),
            avatar_url: draft.avatar_url.clone(),
            status: PersonaStatus::Active,
            provenance: draft.provenance,
            quality_score: draft.quality_score.unwrap_or(0),
            organization_id: ownership.organization_id.clone(),
            user_id: ownership.user_id.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// View the persona as a draft, e.g. to re-run validation.
    pub fn to_draft(&self) -> PersonaDraft {
        PersonaDraft {
            name: Some(self.name.clone()),
            age_range: Some(self.age_range.clone()),
            occupation: Some(self.occupation.clone()),
            industry: Some(self.industry.clone()),
            education_level: Some(self.education_level.clone()),
            income_range: Some(self.income_range.clone()),
            location: Some(self.location.clone()),
            description: Some(self.description.clone()),
            program_category: Some(self.program_category.clone()),
            avatar_url: self.avatar_url.clone(),
            personality_traits: Some(self.personality_traits.clone().into()),
            values: Some(self.values.clone().into()),
            goals: Some(self.goals.clone().into()),
            pain_points: Some(self.pain_points.clone().into()),
            preferred_channels: Some(self.preferred_channels.clone().into()),
            provenance: self.provenance,
            quality_score: Some(self.quality_score),
            extra: serde_json::Map::new(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Persona View
// ─────────────────────────────────────────────────────────────────

/// Read access shared by drafts and persisted personas.
pub trait PersonaView {
    fn text(&self, field: PersonaField) -> Option<&str>;
    fn items(&self, field: PersonaField) -> &[String];
}

impl PersonaView for PersonaDraft {
    fn text(&self, field: PersonaField) -> Option<&str> {
        PersonaDraft::text(self, field)
    }

    fn items(&self, field: PersonaField) -> &[String] {
        PersonaDraft::items(self, field)
    }
}

impl PersonaView for Persona {
    fn text(&self, field: PersonaField) -> Option<&str> {
        let value = match field {
            PersonaField::Name => &self.name,
            PersonaField::AgeRange => &self.age_range,
            PersonaField::Occupation => &self.occupation,
            PersonaField::Industry => &self.industry,
            PersonaField::EducationLevel => &self.education_level,
            PersonaField::IncomeRange => &self.income_range,
            PersonaField::Location => &self.location,
            PersonaField::Description => &self.description,
            PersonaField::ProgramCategory => &self.program_category,
            _ => return None,
        };
        Some(value.as_str())
    }

    fn items(&self, field: PersonaField) -> &[String] {
        match field {
            PersonaField::PersonalityTraits => &self.personality_traits,
            PersonaField::Values => &self.values,
            PersonaField::Goals => &self.goals,
            PersonaField::PainPoints => &self.pain_points,
            PersonaField::PreferredChannels => &self.preferred_channels,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intelligence_level_roundtrip() {
        for level in IntelligenceLevel::all() {
            assert_eq!(level.slug().parse::<IntelligenceLevel>().unwrap(), *level);
        }
        assert_eq!("EXPERT".parse::<IntelligenceLevel>().unwrap(), IntelligenceLevel::Expert);
        assert!("genius".parse::<IntelligenceLevel>().is_err());
    }

    #[test]
    fn test_draft_tolerates_loose_json() {
        let json = r#"{
            "name": "Dana Reyes - Logistics Lead",
            "age_range": "30-38",
            "occupation": 42,
            "goals": ["Lead a team", "Earn a certificate"],
            "values": "efficiency",
            "pain_points": null,
            "motivations": ["promotion"]
        }"#;
        let draft: PersonaDraft = serde_json::from_str(json).unwrap();

        assert_eq!(draft.text(PersonaField::Occupation), Some("42"));
        assert_eq!(draft.items(PersonaField::Goals).len(), 2);
        assert!(matches!(draft.list(PersonaField::Values), Some(TextList::Malformed(_))));
        assert!(draft.list(PersonaField::PainPoints).is_none());
        assert!(draft.extra.contains_key("motivations"));
        assert_eq!(draft.provenance, Provenance::AiGenerated);
    }

    #[test]
    fn test_set_text_ignores_list_fields() {
        let mut draft = PersonaDraft::default();
        draft.set_text(PersonaField::Goals, "not a list");
        assert!(draft.goals.is_none());

        draft.set_text(PersonaField::Industry, "Healthcare");
        assert_eq!(draft.text(PersonaField::Industry), Some("Healthcare"));
    }

    #[test]
    fn test_persona_from_draft_and_back() {
        let mut draft = PersonaDraft::default();
        draft.set_text(PersonaField::Name, "Alex Moore - Buyer");
        draft.set_items(PersonaField::Goals, vec!["Grow".into(), "Lead".into()]);
        draft.provenance = Provenance::Fallback;
        draft.quality_score = Some(88);

        let ownership = Ownership {
            organization_id: Some("org-1".into()),
            user_id: None,
        };
        let persona = Persona::from_draft(&draft, &ownership, Utc::now());

        assert!(!persona.id.is_empty());
        assert_eq!(persona.name, "Alex Moore - Buyer");
        assert_eq!(persona.goals, vec!["Grow", "Lead"]);
        assert_eq!(persona.status, PersonaStatus::Active);
        assert_eq!(persona.provenance, Provenance::Fallback);
        assert_eq!(persona.organization_id.as_deref(), Some("org-1"));

        let back = persona.to_draft();
        assert_eq!(back.items(PersonaField::Goals), persona.goals.as_slice());
        assert_eq!(back.quality_score, Some(88));
    }

    #[test]
    fn test_provenance_serialization() {
        assert_eq!(serde_json::to_string(&Provenance::AiGenerated).unwrap(), "\"ai-generated\"");
        assert_eq!(serde_json::to_string(&Provenance::Fallback).unwrap(), "\"fallback\"");
    }
}
