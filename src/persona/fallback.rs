//! Network-free persona synthesis used when generation attempts run out.
//!
//! Output is a pure function of the item index and the resolved programs, and
//! every draft passes the validator without errors.

use crate::context::{ProgramData, UniversityContext};

use super::enrich::infer_industry;
use super::types::{PersonaDraft, Provenance, TextList};

const DEFAULT_CATEGORY: &str = "Professional Development";
const DEFAULT_PROGRAM: &str = "professional development";
const DEFAULT_LOCATION: &str = "United States";

const FIRST_NAMES: [&str; 12] = [
    "Avery", "Jordan", "Morgan", "Taylor", "Casey", "Riley", "Quinn", "Reese", "Jamie", "Cameron",
    "Dakota", "Skyler",
];
const LAST_NAMES: [&str; 11] = [
    "Johnson", "Patel", "Nguyen", "Garcia", "Kim", "Okafor", "Larsen", "Rivera", "Chen", "Brooks",
    "Novak",
];

/// Occupation archetype with non-overlapping age and income bands.
struct Archetype {
    title: &'static str,
    age_range: &'static str,
    income_range: &'static str,
    education_level: &'static str,
    goals: [&'static str; 3],
    pain_points: [&'static str; 3],
    channels: [&'static str; 3],
    traits: [&'static str; 4],
    values: [&'static str; 4],
}

const ARCHETYPES: [Archetype; 4] = [
    Archetype {
        title: "Coordinator",
        age_range: "24-31",
        income_range: "$45k-$62k",
        education_level: "Associate degree",
        goals: ["Move into a team lead role", "Earn a recognized credential", "Build planning skills"],
        pain_points: ["Limited training budget", "Unclear promotion path", "Heavy daily workload"],
        channels: ["LinkedIn", "Email", "Instagram"],
        traits: ["organized", "detail-oriented", "collaborative", "eager to learn"],
        values: ["growth", "reliability", "teamwork", "stability"],
    },
    Archetype {
        title: "Specialist",
        age_range: "32-39",
        income_range: "$63k-$85k",
        education_level: "Bachelor's degree",
        goals: ["Deepen technical expertise", "Lead cross-functional projects", "Qualify for a senior role"],
        pain_points: ["Skill gaps in strategy", "Little time for coursework", "Narrow role visibility"],
        channels: ["LinkedIn", "Email", "Industry webinars"],
        traits: ["analytical", "methodical", "problem-solving", "curious"],
        values: ["expertise", "integrity", "continuous learning", "quality"],
    },
    Archetype {
        title: "Manager",
        age_range: "40-47",
        income_range: "$86k-$120k",
        education_level: "Bachelor's degree",
        goals: ["Strengthen leadership skills", "Improve team performance", "Prepare for a director role"],
        pain_points: ["Competing priorities", "Retaining strong staff", "Keeping skills current"],
        channels: ["LinkedIn", "Email", "Professional associations"],
        traits: ["results-oriented", "decisive", "supportive", "strategic"],
        values: ["accountability", "development", "results", "collaboration"],
    },
    Archetype {
        title: "Director",
        age_range: "48-55",
        income_range: "$121k-$175k",
        education_level: "Master's degree",
        goals: ["Shape organizational strategy", "Mentor the next leaders", "Drive measurable growth"],
        pain_points: ["Executive time constraints", "Rapid industry change", "Board-level scrutiny"],
        channels: ["LinkedIn", "Executive events", "Peer referrals"],
        traits: ["visionary", "influential", "composed", "pragmatic"],
        values: ["excellence", "innovation", "stewardship", "impact"],
    },
];

fn domain(category: &str) -> &'static str {
    match category.trim().to_lowercase().as_str() {
        "supply chain management" => "Supply Chain",
        "management and leadership" => "Operations",
        "human capital management" => "Human Resources",
        "healthcare management" => "Healthcare",
        "technology management" => "Technology",
        "finance" => "Finance",
        "marketing" => "Marketing",
        _ => "Program",
    }
}

fn to_list(items: &[&str]) -> Option<TextList> {
    Some(TextList::Items(items.iter().map(|s| s.to_string()).collect()))
}

/// Deterministic template-cycling generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackSynthesizer;

impl FallbackSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Draft for item `index` (0-based). Archetypes rotate by index and
    /// programs rotate through `programs`. Names are distinct for the first
    /// 132 indices.
    pub fn synthesize(
        &self,
        index: usize,
        context: &UniversityContext,
        programs: &[&ProgramData],
    ) -> PersonaDraft {
        let archetype = &ARCHETYPES[index % ARCHETYPES.len()];
        let program = (!programs.is_empty()).then(|| programs[index % programs.len()]);

        let category = program.map_or(DEFAULT_CATEGORY, |p| p.category.as_str());
        let program_name = program.map_or(DEFAULT_PROGRAM, |p| p.name.as_str());
        let occupation = format!("{} {}", domain(category), archetype.title);

        let first = FIRST_NAMES[index % FIRST_NAMES.len()];
        let last = LAST_NAMES[(index / FIRST_NAMES.len() + index) % LAST_NAMES.len()];

        let description = format!(
            "{} {} at {} who is considering the {} to build on current experience and take on broader responsibility.",
            article(&occupation),
            occupation.to_lowercase(),
            employer(archetype.title),
            program_name,
        );

        PersonaDraft {
            name: Some(format!("{} {} - {}", first, last, occupation)),
            age_range: Some(archetype.age_range.to_string()),
            occupation: Some(occupation),
            industry: Some(infer_industry(category).to_string()),
            education_level: Some(archetype.education_level.to_string()),
            income_range: Some(archetype.income_range.to_string()),
            location: Some(
                context
                    .location
                    .clone()
                    .filter(|l| !l.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            ),
            description: Some(description),
            program_category: Some(category.to_string()),
            avatar_url: None,
            personality_traits: to_list(&archetype.traits),
            values: to_list(&archetype.values),
            goals: to_list(&archetype.goals),
            pain_points: to_list(&archetype.pain_points),
            preferred_channels: to_list(&archetype.channels),
            provenance: Provenance::Fallback,
            quality_score: None,
            extra: serde_json::Map::new(),
        }
    }
}

fn article(word: &str) -> &'static str {
    match word.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "An",
        _ => "A",
    }
}

fn employer(title: &str) -> &'static str {
    match title {
        "Coordinator" => "a regional distributor",
        "Specialist" => "a mid-sized manufacturer",
        "Manager" => "a growing services firm",
        _ => "a national enterprise",
    }
}
