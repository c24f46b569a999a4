//! Persona types produced by the synthesizer and consumed by the writer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────
// Trait Category
// ─────────────────────────────────────────────────────────────────

/// Persona trait categories, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitCategory {
    Demographics,
    Interests,
    Personality,
    Values,
    Goals,
    PainPoints,
    Communication,
    Activity,
}

impl TraitCategory {
    pub fn all() -> &'static [TraitCategory] {
        &[
            TraitCategory::Demographics,
            TraitCategory::Interests,
            TraitCategory::Personality,
            TraitCategory::Values,
            TraitCategory::Goals,
            TraitCategory::PainPoints,
            TraitCategory::Communication,
            TraitCategory::Activity,
        ]
    }

    /// Upper-case heading used in the citations block
    pub fn heading(&self) -> &'static str {
        match self {
            TraitCategory::Demographics => "DEMOGRAPHICS",
            TraitCategory::Interests => "INTERESTS",
            TraitCategory::Personality => "PERSONALITY TRAITS",
            TraitCategory::Values => "VALUES",
            TraitCategory::Goals => "GOALS",
            TraitCategory::PainPoints => "PAIN POINTS",
            TraitCategory::Communication => "COMMUNICATION",
            TraitCategory::Activity => "ACTIVITY",
        }
    }
}

impl std::fmt::Display for TraitCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraitCategory::Demographics => write!(f, "demographics"),
            TraitCategory::Interests => write!(f, "interests"),
            TraitCategory::Personality => write!(f, "personality"),
            TraitCategory::Values => write!(f, "values"),
            TraitCategory::Goals => write!(f, "goals"),
            TraitCategory::PainPoints => write!(f, "pain_points"),
            TraitCategory::Communication => write!(f, "communication"),
            TraitCategory::Activity => write!(f, "activity"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Persona Trait
// ─────────────────────────────────────────────────────────────────

/// One labeled characteristic with its supporting permalinks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaTrait {
    pub category: TraitCategory,

    /// Field name for scalar traits ("Age Range", "Occupation", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    pub value: String,

    /// Permalinks of supplied sources, ordered and de-duplicated
    #[serde(default)]
    pub citations: Vec<String>,

    /// Filler standing in for a category with no real content
    #[serde(default)]
    pub placeholder: bool,
}

impl PersonaTrait {
    pub fn new(category: TraitCategory, value: impl Into<String>) -> Self {
        Self {
            category,
            label: None,
            value: value.into(),
            citations: Vec::new(),
            placeholder: false,
        }
    }

    pub fn labelled(category: TraitCategory, label: &str, value: impl Into<String>) -> Self {
        Self {
            label: Some(label.to_string()),
            ..Self::new(category, value)
        }
    }

    pub fn placeholder(category: TraitCategory, value: impl Into<String>) -> Self {
        Self {
            placeholder: true,
            ..Self::new(category, value)
        }
    }

    /// Append citations, skipping ones already present
    pub fn add_citations<I, S>(&mut self, permalinks: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for permalink in permalinks {
            let permalink = permalink.into();
            if !self.citations.contains(&permalink) {
                self.citations.push(permalink);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Data Quality
// ─────────────────────────────────────────────────────────────────

/// How much evidence backs a persona
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum DataQuality {
    Sufficient,
    /// Fewer sources than the configured minimum
    Limited { items: usize },
    /// No sources at all (empty, private or suspended profile)
    Insufficient,
    /// The generation service answered with something unparseable
    Unparsed,
}

impl DataQuality {
    /// Caveat printed under the header, if any
    pub fn caveat(&self) -> Option<String> {
        match self {
            DataQuality::Sufficient => None,
            DataQuality::Limited { items } => Some(format!(
                "NOTE: Limited data - only {} post(s)/comment(s) were available; treat this persona as tentative.",
                items
            )),
            DataQuality::Insufficient => Some(
                "NOTE: Insufficient data - no public posts or comments could be analyzed.".to_string(),
            ),
            DataQuality::Unparsed => Some(
                "NOTE: The generation service response could not be interpreted; placeholder content shown.".to_string(),
            ),
        }
    }

    /// Text for a placeholder trait under this quality state
    pub fn placeholder_text(&self) -> &'static str {
        match self {
            DataQuality::Insufficient => "Insufficient data",
            DataQuality::Unparsed => "Not determined (unreadable generation response)",
            DataQuality::Sufficient | DataQuality::Limited { .. } => {
                "Not enough evidence in the analyzed content"
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// User Persona
// ─────────────────────────────────────────────────────────────────

/// Synthesized persona for one username
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPersona {
    pub username: String,
    pub generated_at: DateTime<Utc>,
    /// Number of sources supplied to the synthesizer
    pub source_count: usize,
    pub data_quality: DataQuality,
    pub traits: Vec<PersonaTrait>,
}

impl UserPersona {
    /// Persona with one placeholder trait per category
    pub fn placeholder(username: &str, source_count: usize, data_quality: DataQuality) -> Self {
        let traits = TraitCategory::all()
            .iter()
            .map(|c| PersonaTrait::placeholder(*c, data_quality.placeholder_text()))
            .collect();

        Self {
            username: username.to_string(),
            generated_at: Utc::now(),
            source_count,
            data_quality,
            traits,
        }
    }

    pub fn traits_in(&self, category: TraitCategory) -> impl Iterator<Item = &PersonaTrait> {
        self.traits.iter().filter(move |t| t.category == category)
    }

    /// Citations of a category, de-duplicated in first-seen order
    pub fn citations_for(&self, category: TraitCategory) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for permalink in self.traits_in(category).flat_map(|t| t.citations.iter()) {
            if !seen.contains(&permalink.as_str()) {
                seen.push(permalink);
            }
        }
        seen
    }

    /// Every citation in the persona
    pub fn all_citations(&self) -> impl Iterator<Item = &str> {
        self.traits
            .iter()
            .flat_map(|t| t.citations.iter().map(String::as_str))
    }
}
