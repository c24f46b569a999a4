//! One persona run: validate, fetch, synthesize, write

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::info;

use crate::config::PersonaConfig;
use crate::error::Result;
use crate::fetcher::{parse_profile_url, ContentFetcher, ListingSource, RedditClient};
use crate::synthesizer::{GenerationService, OpenAiClient, PersonaSynthesizer};
use crate::types::DataQuality;
use crate::writer;

/// Per-invocation overrides from the command line
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub max_posts: Option<usize>,
    pub output_dir: Option<String>,
    pub model: Option<String>,
}

impl RunOptions {
    /// Fold the overrides into `config`; CLI values win over everything else
    pub fn apply(&self, config: &mut PersonaConfig) {
        if let Some(max_posts) = self.max_posts {
            config.output.max_posts = max_posts;
        }
        if let Some(ref dir) = self.output_dir {
            config.output.dir = shellexpand::tilde(dir).into_owned();
        }
        if let Some(ref model) = self.model {
            config.generation.model = model.clone();
        }
    }
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub username: String,
    pub output_path: PathBuf,
    pub items: usize,
    pub data_quality: DataQuality,
    pub citations: usize,
}

/// Run the whole pipeline against the live services.
///
/// The URL and the API key are both checked before any request is made.
pub async fn run(config: &PersonaConfig, url: &str) -> Result<RunSummary> {
    let username = parse_profile_url(url)?;
    let api_key = config.generation.api_key()?;

    let fetcher = ContentFetcher::new(RedditClient::new(&config.reddit)?, config.reddit.page_size);
    let synthesizer = PersonaSynthesizer::new(
        OpenAiClient::new(&config.generation, api_key)?,
        &config.generation,
    );

    execute(
        &username,
        config.output.max_posts,
        Path::new(&config.output.dir),
        &fetcher,
        &synthesizer,
    )
    .await
}

/// Fetch, synthesize and write with the given collaborators
pub async fn execute<S, G>(
    username: &str,
    max_items: usize,
    output_dir: &Path,
    fetcher: &ContentFetcher<S>,
    synthesizer: &PersonaSynthesizer<G>,
) -> Result<RunSummary>
where
    S: ListingSource,
    G: GenerationService,
{
    let started = Instant::now();
    info!(username, max_items, "Generating persona");

    let items = fetcher.fetch(username, max_items).await?;
    info!(
        username,
        items = items.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Content fetched"
    );

    let persona = synthesizer.synthesize(username, &items).await?;
    let output_path = writer::write(&persona, output_dir)?;

    let summary = RunSummary {
        username: username.to_string(),
        output_path,
        items: items.len(),
        data_quality: persona.data_quality,
        citations: persona.all_citations().count(),
    };

    info!(
        username,
        items = summary.items,
        citations = summary.citations,
        quality = ?summary.data_quality,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Persona complete"
    );

    Ok(summary)
}
