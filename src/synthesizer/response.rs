//! Tolerant parsing of the generation service's persona answer

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::types::TraitCategory;

/// Response keys mapped to category and display label
const FIELDS: &[(&str, TraitCategory, Option<&str>)] = &[
    ("age_range", TraitCategory::Demographics, Some("Age Range")),
    ("occupation", TraitCategory::Demographics, Some("Occupation")),
    ("interests", TraitCategory::Interests, None),
    ("personality_traits", TraitCategory::Personality, None),
    ("values", TraitCategory::Values, None),
    ("goals", TraitCategory::Goals, None),
    ("pain_points", TraitCategory::PainPoints, None),
    ("communication_style", TraitCategory::Communication, Some("Communication Style")),
    ("activity_level", TraitCategory::Activity, Some("Activity Level")),
    ("technical_proficiency", TraitCategory::Activity, Some("Technical Proficiency")),
];

/// A value as the service may write it: `"text"` or `{value, sources}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TraitValue {
    Plain(String),
    Cited {
        value: String,
        #[serde(default)]
        sources: Vec<String>,
    },
}

impl TraitValue {
    pub fn text(&self) -> &str {
        match self {
            TraitValue::Plain(value) | TraitValue::Cited { value, .. } => value.trim(),
        }
    }

    pub fn sources(&self) -> &[String] {
        match self {
            TraitValue::Plain(_) => &[],
            TraitValue::Cited { sources, .. } => sources,
        }
    }
}

/// One parsed characteristic, still uncited
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTrait {
    pub category: TraitCategory,
    pub label: Option<&'static str>,
    pub value: TraitValue,
}

/// Parse the raw completion.
///
/// Code fences and prose around the JSON object are ignored. Returns
/// `None` unless the object yields at least one non-empty trait.
pub fn parse_response(raw: &str) -> Option<Vec<ParsedTrait>> {
    let object = extract_object(raw)?;

    let mut traits = Vec::new();
    for (key, category, label) in FIELDS {
        let Some(value) = object.get(*key) else {
            continue;
        };
        for value in collect_values(value) {
            if value.text().is_empty() {
                continue;
            }
            traits.push(ParsedTrait {
                category: *category,
                label: *label,
                value,
            });
        }
    }

    if traits.is_empty() {
        None
    } else {
        Some(traits)
    }
}

fn extract_object(raw: &str) -> Option<Map<String, Value>> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }

    match serde_json::from_str::<Value>(&raw[start..=end]).ok()? {
        Value::Object(object) => Some(object),
        _ => None,
    }
}

/// Flatten whatever shape a field came in as into trait values
fn collect_values(value: &Value) -> Vec<TraitValue> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![TraitValue::Plain(s.clone())],
        Value::Number(n) => vec![TraitValue::Plain(n.to_string())],
        Value::Bool(b) => vec![TraitValue::Plain(b.to_string())],
        Value::Array(values) => values.iter().flat_map(collect_values).collect(),
        Value::Object(_) => serde_json::from_value::<TraitValue>(value.clone())
            .map(|v| vec![v])
            .unwrap_or_default(),
    }
}
