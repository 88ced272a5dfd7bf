//! Skill extraction from job postings.
//!
//! The engine only needs `SkillMention`s; where they come from is behind the
//! `SkillExtractor` trait. `LlmSkillExtractor` asks a language model, and
//! tests plug in their own implementations.

pub mod parser;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::llm::client::LlmClient;
use crate::llm::prompts::skill_extraction_prompt;
use crate::model::SkillMention;
use crate::util::{truncate_chars, write_json_atomic};

/// One job posting as produced by the scraper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "url", skip_serializing_if = "Option::is_none")]
    pub job_url: Option<String>,
}

impl JobPosting {
    /// Identifier mentions from this posting are attributed to.
    ///
    /// Falls back to the job URL, then to `posting-<n>` for the posting at
    /// 0-based `index` in its batch.
    pub fn posting_id(&self, index: usize) -> String {
        [&self.id, &self.job_url]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("posting-{}", index + 1))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PostingsDocument {
    List(Vec<JobPosting>),
    Wrapped { jobs: Vec<JobPosting> },
}

/// Load postings from a JSON array, or an object with a `jobs` array.
///
/// Every returned posting has its `id` filled in.
pub fn load_postings(path: &Path) -> Result<Vec<JobPosting>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read postings {}", path.display()))?;
    let doc: PostingsDocument = serde_json::from_str(&content)
        .with_context(|| format!("Invalid postings file {}", path.display()))?;
    let mut postings = match doc {
        PostingsDocument::List(p) | PostingsDocument::Wrapped { jobs: p } => p,
    };
    for (index, posting) in postings.iter_mut().enumerate() {
        posting.id = Some(posting.posting_id(index));
    }
    info!("Loaded {} posting(s) from {}", postings.len(), path.display());
    Ok(postings)
}

pub fn load_mentions(path: &Path) -> Result<Vec<SkillMention>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read mentions {}", path.display()))?;
    let mentions: Vec<SkillMention> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid mentions file {}", path.display()))?;
    info!("Loaded {} mention(s) from {}", mentions.len(), path.display());
    Ok(mentions)
}

pub fn save_mentions(path: &Path, mentions: &[SkillMention]) -> Result<()> {
    write_json_atomic(path, mentions)?;
    info!("Wrote {} mention(s) to {}", mentions.len(), path.display());
    Ok(())
}

#[async_trait]
pub trait SkillExtractor: Send + Sync {
    /// Categorized skill mentions found in one posting.
    async fn extract(&self, posting: &JobPosting) -> Result<Vec<SkillMention>>;
}

/// Extracts skills by prompting a language model.
pub struct LlmSkillExtractor {
    client: Box<dyn LlmClient>,
    max_description_chars: usize,
}

impl LlmSkillExtractor {
    pub fn new(client: Box<dyn LlmClient>) -> Self {
        Self {
            client,
            max_description_chars: 4000,
        }
    }

    pub fn with_max_description_chars(mut self, max: usize) -> Self {
        self.max_description_chars = max;
        self
    }
}

#[async_trait]
impl SkillExtractor for LlmSkillExtractor {
    async fn extract(&self, posting: &JobPosting) -> Result<Vec<SkillMention>> {
        let id = posting.posting_id(0);
        let description = truncate_chars(&posting.description, self.max_description_chars);
        let prompt = skill_extraction_prompt(posting, description);
        let answer = self
            .client
            .complete(&prompt)
            .await
            .with_context(|| format!("Skill extraction failed for {}", id))?;
        parser::parse_skill_response(&answer, &id)
    }
}

/// Run `extractor` over every posting, in order.
///
/// Mentions are attributed to each posting's id. A posting whose extraction
/// fails contributes nothing, and the rest of the batch still runs.
pub async fn extract_all<E>(extractor: &E, postings: &[JobPosting]) -> Vec<SkillMention>
where
    E: SkillExtractor + ?Sized,
{
    let mut mentions = Vec::new();
    let mut failed = 0usize;
    for (index, posting) in postings.iter().enumerate() {
        let id = posting.posting_id(index);
        match extractor.extract(posting).await {
            Ok(found) => {
                info!(
                    "[{}/{}] {} ({}): {} skill(s)",
                    index + 1,
                    postings.len(),
                    posting.title,
                    id,
                    found.len()
                );
                mentions.extend(found.into_iter().map(|mut m| {
                    m.source_posting_id = id.clone();
                    m
                }));
            }
            Err(e) => {
                failed += 1;
                warn!("Skipping posting {}: {:#}", id, e);
            }
        }
    }
    info!(
        "Extracted {} mention(s) from {} posting(s), {} failed",
        mentions.len(),
        postings.len(),
        failed
    );
    mentions
}
