use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::engine::matcher::DEFAULT_FUZZY_THRESHOLD;
use crate::engine::normalizer::SynonymTable;
use crate::engine::synthesizer::{DEFAULT_MAX_MODULE_TOPICS, DEFAULT_MIN_CATEGORY_MASS};
use crate::model::Category;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub synonyms: SynonymsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>, // For OpenAI-compatible APIs

    /// Optional: Override max_tokens for LLM requests
    /// If not specified, uses provider-specific defaults:
    /// - anthropic: 1024
    /// - openai: 1024
    /// - openai-compatible (ollama): 2048
    /// - gemini: 1024
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Request timeout in seconds (default: 120)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl LlmConfig {
    /// Get max_tokens value, using provider-specific default if not specified
    pub fn get_max_tokens(&self) -> u32 {
        if let Some(tokens) = self.max_tokens {
            return tokens;
        }

        // Skill lists are short; local models tend to ramble before the JSON
        match self.provider.as_str() {
            "openai-compatible" => 2048,
            _ => 1024,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            api_key_env: Some("AI_API_KEY".to_string()),
            base_url: None,
            max_tokens: None,
            timeout_secs: default_timeout(),
        }
    }
}

/// Tunables for the matching and synthesis stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum token-overlap (Jaccard) score for a fuzzy topic match (default: 0.5)
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,

    /// Distinct-posting mass a category needs before a module is proposed (default: 2)
    #[serde(default = "default_min_category_mass")]
    pub min_category_mass: usize,

    /// Most topics listed in one proposed module; 0 disables the cap (default: 20)
    #[serde(default = "default_max_module_topics")]
    pub max_module_topics: usize,

    /// Tie-break order when a skill's mentions disagree on its category
    #[serde(default = "default_category_priority")]
    pub category_priority: Vec<Category>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: default_fuzzy_threshold(),
            min_category_mass: default_min_category_mass(),
            max_module_topics: default_max_module_topics(),
            category_priority: default_category_priority(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Posting descriptions are cut to this many characters before extraction (default: 4000)
    #[serde(default = "default_max_description_chars")]
    pub max_description_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_description_chars: default_max_description_chars(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynonymsConfig {
    /// If true, `aliases` replaces the built-in table instead of extending it
    #[serde(default)]
    pub replace_defaults: bool,

    /// alias = "canonical term"
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl SynonymsConfig {
    /// Build the synonym table handed to the normalizer.
    pub fn build_table(&self) -> SynonymTable {
        let mut table = if self.replace_defaults {
            SynonymTable::new()
        } else {
            SynonymTable::builtin().clone()
        };
        table.extend(self.aliases.iter());
        debug!("Synonym table has {} alias(es)", table.len());
        table
    }
}

fn default_timeout() -> u64 {
    120
}

fn default_fuzzy_threshold() -> f64 {
    DEFAULT_FUZZY_THRESHOLD
}

fn default_min_category_mass() -> usize {
    DEFAULT_MIN_CATEGORY_MASS
}

fn default_max_module_topics() -> usize {
    DEFAULT_MAX_MODULE_TOPICS
}

fn default_category_priority() -> Vec<Category> {
    Category::ALL.to_vec()
}

fn default_max_description_chars() -> usize {
    4000
}

impl Config {
    /// Load config from the working directory or user config directory
    pub fn load() -> Result<Self> {
        Self::load_with_path(None)
    }

    /// Load configuration from a specific path, or use default search paths
    pub fn load_with_path(path: Option<String>) -> Result<Self> {
        // If explicit path provided, use it
        if let Some(config_path) = path {
            debug!("Loading config from explicit path: {}", config_path);
            return Self::load_from_path(&config_path);
        }

        if Path::new("skillgap.toml").exists() {
            debug!("Loading config from ./skillgap.toml");
            return Self::load_from_path("skillgap.toml");
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("skillgap").join("config.toml");
            if config_path.exists() {
                debug!("Loading config from {:?}", config_path);
                return Self::load_from_path(&config_path);
            }
        }

        debug!("Using default config");
        Ok(Self::default())
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Get API key from environment variable specified in config
    pub fn get_api_key(&self) -> Result<String> {
        match &self.llm.api_key_env {
            Some(env_var) => {
                // Special case: "none" means no API key needed (e.g., Ollama)
                if env_var.to_lowercase() == "none" {
                    return Ok(String::new());
                }

                // openai-compatible: try env var but don't error if missing
                // (local models like Ollama don't need keys, but gateways like OpenRouter do)
                if self.llm.provider == "openai-compatible" {
                    return Ok(env::var(env_var).unwrap_or_default());
                }

                env::var(env_var).map_err(|_| {
                    anyhow::anyhow!("API key not found in environment variable: {}", env_var)
                })
            }
            None => Ok(String::new()), // No API key needed
        }
    }
}
