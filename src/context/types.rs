//! Institution reference data used to ground persona prompts.

use serde::{Deserialize, Serialize};

/// One academic program offered by an institution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramData {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub target_audience: String,
    #[serde(default)]
    pub key_benefits: Vec<String>,
}

/// Structured messaging guidance for an institution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagingFramework {
    pub core_message: String,
    pub value_propositions: Vec<String>,
    pub key_differentiators: Vec<String>,
    pub target_audience: String,
    pub tone_of_voice: String,
}

/// Read-only snapshot of an institution, resolved once per batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversityContext {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demographics: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_guidelines: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messaging_framework: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messaging: Option<MessagingFramework>,
    #[serde(default)]
    pub programs: Vec<ProgramData>,
}

impl UniversityContext {
    /// Programs matching `ids`, in request order. Unknown ids are skipped.
    pub fn select_programs(&self, ids: &[String]) -> Vec<&ProgramData> {
        ids.iter()
            .filter_map(|id| self.program(id))
            .collect()
    }

    pub fn program(&self, id: &str) -> Option<&ProgramData> {
        self.programs
            .iter()
            .find(|p| p.id.eq_ignore_ascii_case(id.trim()))
    }
}
