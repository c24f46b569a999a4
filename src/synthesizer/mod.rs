//! Persona synthesis
//!
//! Turns normalized items into a [`UserPersona`]: bounded prompt, one
//! generation call, tolerant parsing, then citation mapping restricted to
//! the supplied items.

mod citations;
mod generation;
mod prompt;
mod response;

use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::GenerationSettings;
use crate::error::Result;
use crate::types::{DataQuality, PersonaTrait, SourceItem, TraitCategory, UserPersona};

pub use citations::CitationIndex;
pub use generation::{GenerationRequest, GenerationService, OpenAiClient};
pub use prompt::{build_prompt, SYSTEM_PROMPT};
pub use response::{parse_response, ParsedTrait};

#[cfg(test)]
pub(crate) use generation::mock;

/// Builds personas through a [`GenerationService`]
pub struct PersonaSynthesizer<G> {
    service: G,
    max_prompt_chars: usize,
    keyword_citations: bool,
    min_items: usize,
}

impl<G: GenerationService> PersonaSynthesizer<G> {
    pub fn new(service: G, settings: &GenerationSettings) -> Self {
        Self {
            service,
            max_prompt_chars: settings.max_prompt_chars,
            keyword_citations: settings.keyword_citations,
            min_items: settings.min_items,
        }
    }

    #[cfg(test)]
    pub(crate) fn service(&self) -> &G {
        &self.service
    }

    pub async fn synthesize(&self, username: &str, items: &[SourceItem]) -> Result<UserPersona> {
        if items.is_empty() {
            warn!(username, "No content available, writing placeholder persona");
            return Ok(UserPersona::placeholder(
                username,
                0,
                DataQuality::Insufficient,
            ));
        }

        let prompt = build_prompt(username, items, self.max_prompt_chars);
        info!(
            username,
            items = items.len(),
            included = prompt.included,
            content_chars = prompt.content_chars,
            service = self.service.name(),
            "Requesting persona generation"
        );
        if prompt.included < items.len() {
            debug!(
                dropped = items.len() - prompt.included,
                "Oldest items left out of the prompt"
            );
        }

        let started = Instant::now();
        let request = GenerationRequest {
            system: SYSTEM_PROMPT.to_string(),
            prompt: prompt.text,
        };
        let raw = self.service.generate(&request).await?;
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            response_chars = raw.chars().count(),
            "Generation complete"
        );

        let Some(parsed) = parse_response(&raw) else {
            warn!(username, "Generation response could not be parsed, using placeholders");
            return Ok(UserPersona::placeholder(
                username,
                items.len(),
                DataQuality::Unparsed,
            ));
        };

        let data_quality = if items.len() < self.min_items {
            DataQuality::Limited { items: items.len() }
        } else {
            DataQuality::Sufficient
        };

        let traits = self.cite(parsed, items, data_quality);
        Ok(UserPersona {
            username: username.to_string(),
            generated_at: Utc::now(),
            source_count: items.len(),
            data_quality,
            traits,
        })
    }

    fn cite(
        &self,
        parsed: Vec<ParsedTrait>,
        items: &[SourceItem],
        data_quality: DataQuality,
    ) -> Vec<PersonaTrait> {
        let index = CitationIndex::new(items);

        let mut traits: Vec<PersonaTrait> = parsed
            .into_iter()
            .map(|parsed| {
                let value = parsed.value.text().to_string();
                let mut persona_trait = match parsed.label {
                    Some(label) => PersonaTrait::labelled(parsed.category, label, value),
                    None => PersonaTrait::new(parsed.category, value),
                };

                let known = index.known_sources(parsed.value.sources());
                if !known.is_empty() {
                    persona_trait.add_citations(known);
                } else if self.keyword_citations {
                    persona_trait.add_citations(index.keyword_matches(&persona_trait.value));
                }
                persona_trait
            })
            .collect();

        for category in TraitCategory::all() {
            if !traits.iter().any(|t| t.category == *category) {
                traits.push(PersonaTrait::placeholder(
                    *category,
                    data_quality.placeholder_text(),
                ));
            }
        }
        traits.sort_by_key(|t| t.category);

        let cited = traits.iter().filter(|t| !t.citations.is_empty()).count();
        debug!(traits = traits.len(), cited, "Citations mapped");
        traits
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockGenerationService;
    use super::*;
    use crate::error::Error;
    use crate::types::SourceKind;
    use chrono::TimeZone;

    fn item(id: &str, secs: i64, text: &str) -> SourceItem {
        SourceItem {
            kind: SourceKind::Comment,
            text: text.to_string(),
            title: None,
            permalink: format!("https://www.reddit.com/r/t/comments/{}/", id),
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
            subreddit: "t".to_string(),
            score: 1,
        }
    }

    fn items(n: usize) -> Vec<SourceItem> {
        (0..n)
            .map(|i| item(&i.to_string(), i as i64 * 10, &format!("comment about sourdough number {}", i)))
            .collect()
    }

    fn synthesizer(reply: &str) -> PersonaSynthesizer<MockGenerationService> {
        PersonaSynthesizer::new(
            MockGenerationService::replying(reply),
            &GenerationSettings::default(),
        )
    }

    const FULL_REPLY: &str = r#"{
        "age_range": {"value": "26-35", "sources": ["https://www.reddit.com/r/t/comments/1/"]},
        "occupation": "Baker",
        "interests": [
            {"value": "Sourdough", "sources": ["https://www.reddit.com/r/t/comments/999/"]},
            "Gardening"
        ],
        "personality_traits": ["Patient"],
        "values": ["Craft"],
        "goals": ["Open a bakery"],
        "pain_points": ["Early mornings"],
        "communication_style": "Friendly",
        "activity_level": "Moderate",
        "technical_proficiency": "Basic"
    }"#;

    #[tokio::test]
    async fn test_zero_items_skips_generation() {
        let synth = synthesizer(FULL_REPLY);
        let persona = synth.synthesize("ghost", &[]).await.unwrap();

        assert_eq!(synth.service.call_count(), 0);
        assert_eq!(persona.data_quality, DataQuality::Insufficient);
        assert_eq!(persona.source_count, 0);
        assert!(persona.traits.iter().all(|t| t.placeholder));
        assert_eq!(persona.all_citations().count(), 0);
    }

    #[tokio::test]
    async fn test_full_reply_maps_categories_and_citations() {
        let synth = synthesizer(FULL_REPLY);
        let supplied = items(6);
        let persona = synth.synthesize("baker", &supplied).await.unwrap();

        assert_eq!(synth.service.call_count(), 1);
        assert_eq!(persona.data_quality, DataQuality::Sufficient);
        assert!(persona.traits.iter().all(|t| !t.placeholder));

        let age = persona.traits_in(TraitCategory::Demographics).next().unwrap();
        assert_eq!(age.label.as_deref(), Some("Age Range"));
        assert_eq!(age.citations, vec!["https://www.reddit.com/r/t/comments/1/"]);

        // Unknown source dropped, keyword fallback picks the newest matches
        let sourdough = persona
            .traits_in(TraitCategory::Interests)
            .find(|t| t.value == "Sourdough")
            .unwrap();
        assert_eq!(
            sourdough.citations,
            vec![
                "https://www.reddit.com/r/t/comments/5/",
                "https://www.reddit.com/r/t/comments/4/",
                "https://www.reddit.com/r/t/comments/3/",
            ]
        );

        let activity: Vec<_> = persona.traits_in(TraitCategory::Activity).collect();
        assert_eq!(activity.len(), 2);
        assert_eq!(activity[1].label.as_deref(), Some("Technical Proficiency"));
    }

    #[tokio::test]
    async fn test_citations_only_reference_supplied_items() {
        let synth = synthesizer(FULL_REPLY);
        let supplied = items(6);
        let persona = synth.synthesize("baker", &supplied).await.unwrap();

        let known: Vec<&str> = supplied.iter().map(|i| i.permalink.as_str()).collect();
        for citation in persona.all_citations() {
            assert!(known.contains(&citation), "unexpected citation {}", citation);
        }
    }

    #[tokio::test]
    async fn test_traits_ordered_by_category() {
        let persona = synthesizer(FULL_REPLY)
            .synthesize("baker", &items(6))
            .await
            .unwrap();
        let categories: Vec<_> = persona.traits.iter().map(|t| t.category).collect();
        let mut sorted = categories.clone();
        sorted.sort();
        assert_eq!(categories, sorted);
    }

    #[tokio::test]
    async fn test_unparseable_reply_gives_placeholders() {
        let synth = synthesizer("Sorry, I can't do that.");
        let persona = synth.synthesize("u", &items(6)).await.unwrap();

        assert_eq!(persona.data_quality, DataQuality::Unparsed);
        assert_eq!(persona.source_count, 6);
        assert_eq!(persona.traits.len(), TraitCategory::all().len());
        assert!(persona.traits.iter().all(|t| t.placeholder && t.citations.is_empty()));
    }

    #[tokio::test]
    async fn test_reply_with_only_empty_values_is_flagged() {
        let synth = synthesizer(r#"{"interests": [], "goals": null}"#);
        let persona = synth.synthesize("u", &items(6)).await.unwrap();

        assert_eq!(persona.data_quality, DataQuality::Unparsed);
        assert!(persona.data_quality.caveat().is_some());
        assert!(persona.traits.iter().all(|t| t.placeholder));
    }

    #[tokio::test]
    async fn test_missing_categories_filled_and_limited() {
        let synth = synthesizer("```json\n{\"interests\": [\"Sourdough\"]}\n```");
        let persona = synth.synthesize("u", &items(2)).await.unwrap();

        assert_eq!(persona.data_quality, DataQuality::Limited { items: 2 });
        for category in TraitCategory::all() {
            assert!(persona.traits_in(*category).next().is_some(), "{} missing", category);
        }
        let goals = persona.traits_in(TraitCategory::Goals).next().unwrap();
        assert!(goals.placeholder);
        assert!(goals.citations.is_empty());
    }

    #[tokio::test]
    async fn test_keyword_citations_can_be_disabled() {
        let settings = GenerationSettings {
            keyword_citations: false,
            ..Default::default()
        };
        let synth = PersonaSynthesizer::new(
            MockGenerationService::replying(r#"{"interests": ["Sourdough"]}"#),
            &settings,
        );
        let persona = synth.synthesize("u", &items(6)).await.unwrap();
        assert_eq!(persona.all_citations().count(), 0);
    }

    #[tokio::test]
    async fn test_service_failure_is_fatal() {
        let synth = PersonaSynthesizer::new(
            MockGenerationService::failing(401),
            &GenerationSettings::default(),
        );
        let err = synth.synthesize("u", &items(3)).await.unwrap_err();
        assert!(matches!(err, Error::SynthesisStatus { status: 401, .. }));
        assert_eq!(err.exit_code(), 40);
    }

    #[tokio::test]
    async fn test_prompt_carries_permalinks() {
        let synth = synthesizer(FULL_REPLY);
        synth.synthesize("u", &items(2)).await.unwrap();

        let requests = synth.service.requests.lock();
        assert_eq!(requests[0].system, SYSTEM_PROMPT);
        assert!(requests[0]
            .prompt
            .contains("Permalink: https://www.reddit.com/r/t/comments/1/"));
    }
}
