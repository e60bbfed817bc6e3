//! Built-in prompt templates: canned audience briefs selectable by id.

use serde::Serialize;

use crate::error::{Error, Result};

use super::types::IntelligenceLevel;

#[derive(Debug, Clone, Serialize)]
pub struct PromptTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    /// Body with `{count}` and `{programs}` placeholders
    pub template: &'static str,
    pub intelligence_level: IntelligenceLevel,
    pub suggested_count: usize,
}

impl PromptTemplate {
    /// Substitute the placeholders.
    pub fn render(&self, count: usize, programs: &[&str]) -> String {
        self.template
            .replace("{count}", &count.to_string())
            .replace("{programs}", &programs.join(", "))
    }
}

const TEMPLATES: &[PromptTemplate] = &[
    PromptTemplate {
        id: "career-changers-basic",
        name: "Career Changers",
        description: "Professionals seeking to transition to new industries",
        category: "Career Transition",
        template: "Generate {count} personas for professionals looking to change careers into {programs}. Focus on ages 28-45 from a range of industry backgrounds, motivated by career growth and stability. Include financial considerations and time constraints.",
        intelligence_level: IntelligenceLevel::Basic,
        suggested_count: 5,
    },
    PromptTemplate {
        id: "working-professionals-basic",
        name: "Working Professionals",
        description: "Current professionals seeking advancement",
        category: "Career Advancement",
        template: "Create {count} personas for working professionals seeking to advance in {programs}. Ages 30-50, currently employed, looking for leadership skills and strategic thinking. Consider work-life balance and employer support.",
        intelligence_level: IntelligenceLevel::Basic,
        suggested_count: 6,
    },
    PromptTemplate {
        id: "recent-graduates-basic",
        name: "Recent Graduates",
        description: "New graduates entering the workforce",
        category: "Early Career",
        template: "Generate {count} personas for recent graduates interested in {programs}. Ages 22-28, limited work experience, seeking skill development and career foundation. Focus on entry-level concerns and growth potential.",
        intelligence_level: IntelligenceLevel::Basic,
        suggested_count: 4,
    },
    PromptTemplate {
        id: "executives-advanced",
        name: "Executive Leaders",
        description: "Senior executives and C-suite professionals",
        category: "Executive Education",
        template: "Create {count} sophisticated personas for senior executives considering {programs}. Focus on strategic leadership challenges, board-level decision making, and organizational transformation. Ages 40-60, $200k+ compensation, managing large teams and budgets.",
        intelligence_level: IntelligenceLevel::Advanced,
        suggested_count: 4,
    },
    PromptTemplate {
        id: "entrepreneurs-advanced",
        name: "Entrepreneurs & Founders",
        description: "Business owners and startup founders",
        category: "Entrepreneurship",
        template: "Generate {count} personas for entrepreneurs and business founders interested in {programs}. Include scaling challenges, funding considerations, and market expansion goals. Vary business stages from startup to established companies.",
        intelligence_level: IntelligenceLevel::Advanced,
        suggested_count: 5,
    },
    PromptTemplate {
        id: "industry-specialists-advanced",
        name: "Industry Specialists",
        description: "Deep domain experts seeking broader skills",
        category: "Specialization",
        template: "Create {count} personas for industry specialists in {programs}. Focus on technical experts seeking business acumen, regulatory professionals needing strategic skills, or specialists wanting to transition to management roles.",
        intelligence_level: IntelligenceLevel::Advanced,
        suggested_count: 6,
    },
    PromptTemplate {
        id: "global-leaders-expert",
        name: "Global Business Leaders",
        description: "International executives with complex challenges",
        category: "Global Leadership",
        template: "Generate {count} expert-level personas for global business leaders considering {programs}. Include cross-cultural management, international market expansion, geopolitical considerations, and complex stakeholder management. Focus on Fortune 500 or equivalent international companies.",
        intelligence_level: IntelligenceLevel::Expert,
        suggested_count: 3,
    },
    PromptTemplate {
        id: "transformation-leaders-expert",
        name: "Transformation Leaders",
        description: "Leaders driving organizational change",
        category: "Transformation",
        template: "Create {count} expert personas for transformation leaders in {programs}. Focus on digital transformation, cultural change, merger integration, or turnaround situations. Include change management complexity, stakeholder resistance, and performance measurement challenges.",
        intelligence_level: IntelligenceLevel::Expert,
        suggested_count: 4,
    },
];

pub fn all() -> &'static [PromptTemplate] {
    TEMPLATES
}

pub fn by_level(level: IntelligenceLevel) -> impl Iterator<Item = &'static PromptTemplate> {
    TEMPLATES.iter().filter(move |t| t.intelligence_level == level)
}

pub fn find(id: &str) -> Result<&'static PromptTemplate> {
    TEMPLATES
        .iter()
        .find(|t| t.id == id.trim())
        .ok_or_else(|| Error::TemplateNotFound {
            template_id: id.to_string(),
        })
}
