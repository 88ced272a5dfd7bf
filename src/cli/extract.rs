use anyhow::{bail, Result};
use std::path::Path;
use tracing::{info, warn};

use crate::config::Config;
use crate::extract::{self, LlmSkillExtractor};
use crate::llm::factory;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    postings_path: String,
    output: String,
    config_path: Option<String>,
    model_override: Option<String>,
    provider_override: Option<String>,
    base_url_override: Option<String>,
    dry_run: bool,
) -> Result<()> {
    info!("Postings: {}", postings_path);
    info!("Output: {}", output);
    if let Some(ref cfg) = config_path {
        info!("Config: {}", cfg);
    }
    info!("Dry run: {}", dry_run);

    let mut config = Config::load_with_path(config_path)?;

    if let Some(ref provider) = provider_override {
        info!("CLI override: provider = {}", provider);
        config.llm.provider = provider.clone();
    }
    if let Some(ref model) = model_override {
        info!("CLI override: model = {}", model);
        config.llm.model = model.clone();
    }
    if let Some(ref base_url) = base_url_override {
        info!("CLI override: base_url = {}", base_url);
        config.llm.base_url = Some(base_url.clone());
    }

    let postings = extract::load_postings(Path::new(&postings_path))?;
    if postings.is_empty() {
        warn!("No postings in {}, writing an empty mention list", postings_path);
    }

    let client = factory::create_client(&config, dry_run)?;
    let extractor = LlmSkillExtractor::new(client)
        .with_max_description_chars(config.extraction.max_description_chars);

    let mentions = extract::extract_all(&extractor, &postings).await;
    if mentions.is_empty() && !postings.is_empty() {
        bail!(
            "No skills could be extracted from {} posting(s); check the LLM configuration",
            postings.len()
        );
    }

    extract::save_mentions(Path::new(&output), &mentions)?;
    println!(
        "Extracted {} skill mention(s) from {} posting(s) into {}",
        mentions.len(),
        postings.len(),
        output
    );
    Ok(())
}
