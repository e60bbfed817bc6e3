//! Prompt construction for persona generation.
//!
//! Pure string assembly: the same context, request and index always produce
//! the same prompts.

use std::fmt::Write as _;

use crate::context::{ProgramData, UniversityContext};
use crate::error::Result;

use super::templates;
use super::types::{IntelligenceLevel, PersonaGenerationRequest};

/// System and user prompt for one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

const BASIC_REQUIREMENTS: &[&str] = &[
    "Basic demographic information (name, age, location, background)",
    "Educational background and career goals",
    "Primary motivations for education",
    "Main challenges and pain points",
    "Decision factors and timeline",
    "Communication preferences",
    "Budget considerations",
];

const ADVANCED_REQUIREMENTS: &[&str] = &[
    "Detailed demographic and psychographic profiling",
    "Career trajectory and professional aspirations",
    "Deep motivational analysis and behavioral triggers",
    "Multi-layered decision-making process",
    "Channel preferences with attribution insights",
    "Financial modeling and ROI considerations",
    "Competitive analysis and differentiation factors",
    "University-specific messaging resonance",
];

const EXPERT_REQUIREMENTS: &[&str] = &[
    "Advanced psychographic modeling with predictive psychology",
    "Comprehensive competitive positioning and market analysis",
    "Complex decision influence mapping and stakeholder analysis",
    "Multi-channel attribution and conversion pathway modeling",
    "ROI optimization with scenario planning",
    "University brand affinity and loyalty factor analysis",
    "Market trend adaptation and future-proofing elements",
    "Campaign optimization recommendations and creative direction",
    "Performance prediction metrics and success indicators",
];

const OUTPUT_SCHEMA: &str = r#"Return a single JSON object with these keys:
{
  "name": "First Last - Short Role Title",
  "age_range": "NN-NN (two ages, lower first)",
  "occupation": "job title",
  "industry": "industry sector",
  "education_level": "highest degree",
  "income_range": "$Nk-$Nk (lower first)",
  "location": "city, state or region",
  "description": "two to four sentences about this person",
  "program_category": "category of the best-fit program",
  "personality_traits": ["3-6 traits"],
  "values": ["3-5 values"],
  "goals": ["2-5 goals"],
  "pain_points": ["2-5 pain points"],
  "preferred_channels": ["2-4 channels"]
}"#;

fn requirements(level: IntelligenceLevel) -> (&'static str, &'static [&'static str]) {
    match level {
        IntelligenceLevel::Basic => ("Generate realistic personas with:", BASIC_REQUIREMENTS),
        IntelligenceLevel::Advanced => ("Generate sophisticated personas with:", ADVANCED_REQUIREMENTS),
        IntelligenceLevel::Expert => ("Generate expert-level personas with:", EXPERT_REQUIREMENTS),
    }
}

/// Builds the system prompt once per batch and the user prompt per item.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    system: String,
    brief: String,
    count: usize,
}

impl PromptBuilder {
    /// Fails only when the request names an unknown template.
    pub fn new(context: &UniversityContext, request: &PersonaGenerationRequest) -> Result<Self> {
        let programs = context.select_programs(&request.program_ids);
        let system = system_prompt(context, &programs, &request.program_ids, request.intelligence_level);

        let brief = match request.template_id.as_deref() {
            Some(id) => {
                let template = templates::find(id)?;
                let names: Vec<&str> = if programs.is_empty() {
                    request.program_ids.iter().map(String::as_str).collect()
                } else {
                    programs.iter().map(|p| p.name.as_str()).collect()
                };
                format!("{}\n\n{}", template.render(request.count, &names), request.brief.trim())
            }
            None => request.brief.trim().to_string(),
        };

        Ok(Self {
            system,
            brief,
            count: request.count,
        })
    }

    pub fn system_prompt(&self) -> &str {
        &self.system
    }

    /// Prompts for persona number `index` (1-based).
    pub fn for_item(&self, index: usize) -> PromptPair {
        PromptPair {
            system: self.system.clone(),
            user: user_prompt(&self.brief, index, self.count),
        }
    }
}

/// Institution facts, target programs, level requirements and output shape.
pub fn system_prompt(
    context: &UniversityContext,
    programs: &[&ProgramData],
    requested_ids: &[String],
    level: IntelligenceLevel,
) -> String {
    let mut prompt = String::from(
        "You are an expert marketing persona generator for higher education institutions.\n\nUniversity Context:\n",
    );

    let _ = writeln!(prompt, "- University: {}", context.name);
    let _ = writeln!(
        prompt,
        "- Location: {}",
        context.location.as_deref().unwrap_or("Not specified")
    );
    if let Some(demographics) = &context.demographics {
        let _ = writeln!(prompt, "- Audience Demographics: {}", demographics);
    }
    let _ = writeln!(
        prompt,
        "- Brand Guidelines: {}",
        context
            .brand_guidelines
            .as_deref()
            .unwrap_or("Standard academic branding")
    );
    let _ = writeln!(
        prompt,
        "- Messaging Framework: {}",
        context
            .messaging_framework
            .as_deref()
            .unwrap_or("Professional and aspirational")
    );

    prompt.push_str("\nTarget Programs:\n");
    if programs.is_empty() {
        let _ = writeln!(prompt, "- {}", requested_ids.join(", "));
    }
    for program in programs {
        let _ = writeln!(prompt, "- {} ({})", program.name, program.category);
        let _ = writeln!(prompt, "  Description: {}", program.description);
        let _ = writeln!(prompt, "  Target audience: {}", program.target_audience);
        if !program.key_benefits.is_empty() {
            let _ = writeln!(prompt, "  Key benefits: {}", program.key_benefits.join("; "));
        }
    }

    if level != IntelligenceLevel::Basic {
        if let Some(messaging) = &context.messaging {
            let _ = writeln!(prompt, "\nCore message: {}", messaging.core_message);
            if !messaging.value_propositions.is_empty() {
                let _ = writeln!(
                    prompt,
                    "Value propositions: {}",
                    messaging.value_propositions.join("; ")
                );
            }
            if !messaging.key_differentiators.is_empty() {
                let _ = writeln!(
                    prompt,
                    "Key differentiators: {}",
                    messaging.key_differentiators.join("; ")
                );
            }
            if !messaging.target_audience.is_empty() {
                let _ = writeln!(prompt, "Institutional audience: {}", messaging.target_audience);
            }
            if !messaging.tone_of_voice.is_empty() {
                let _ = writeln!(prompt, "Tone of voice: {}", messaging.tone_of_voice);
            }
        }
    }

    let (heading, items) = requirements(level);
    let _ = writeln!(prompt, "\n{}", heading);
    for (n, item) in items.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", n + 1, item);
    }

    prompt.push('\n');
    prompt.push_str(OUTPUT_SCHEMA);
    prompt.push_str(
        "\n\nEnsure personas are diverse, realistic, and actionable for marketing campaigns.",
    );
    prompt
}

/// The brief plus the per-item uniqueness and output-format instructions.
pub fn user_prompt(brief: &str, index: usize, count: usize) -> String {
    format!(
        "{brief}\n\nGenerate persona #{index} of {count} that fits this description. \
         Make this persona unique and distinct from the others generated in this batch.\n\n\
         Return only a valid JSON object with the persona data, no additional text or formatting."
    )
}
