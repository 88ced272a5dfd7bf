use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use skillgap::cli;

#[derive(Parser)]
#[command(name = "skillgap", version)]
#[command(
    about = "Compare job-market skill demand against a curriculum and propose syllabus changes",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract categorized skill mentions from job postings with an LLM
    Extract {
        /// JSON file of job postings (array, or object with a "jobs" array)
        postings: String,

        /// Output file for the skill mentions
        #[arg(short = 'o', long, default_value = "mentions.json")]
        output: String,

        /// Path to config file (defaults to ./skillgap.toml or ~/.config/skillgap/config.toml)
        #[arg(long)]
        config: Option<String>,

        /// Override LLM model (e.g., "gpt-4o", "claude-sonnet-4-20250514")
        #[arg(long)]
        model: Option<String>,

        /// Override LLM provider (anthropic, openai, openai-compatible, gemini)
        #[arg(long)]
        provider: Option<String>,

        /// Override base URL for OpenAI-compatible endpoints
        #[arg(long)]
        base_url: Option<String>,

        /// Use mock LLM client for testing
        #[arg(long)]
        dry_run: bool,
    },

    /// Build the skill inventory, gap report and updated syllabus
    Analyze {
        /// Skill mentions produced by `extract`
        #[arg(short = 'm', long)]
        mentions: String,

        /// Syllabus JSON (built-in default syllabus when omitted or missing)
        #[arg(short = 's', long)]
        syllabus: Option<String>,

        /// Directory for skill_inventory.json, gap_analysis.json and updated_syllabus.json
        #[arg(long, default_value = "output")]
        out_dir: String,

        /// Path to config file (defaults to ./skillgap.toml or ~/.config/skillgap/config.toml)
        #[arg(long)]
        config: Option<String>,

        /// Override the minimum token-overlap score for fuzzy topic matches
        #[arg(long)]
        fuzzy_threshold: Option<f64>,

        /// Override the posting mass a category needs before a module is proposed
        #[arg(long)]
        min_category_mass: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            postings,
            output,
            config,
            model,
            provider,
            base_url,
            dry_run,
        } => {
            cli::extract::run(postings, output, config, model, provider, base_url, dry_run).await?;
        }
        Commands::Analyze {
            mentions,
            syllabus,
            out_dir,
            config,
            fuzzy_threshold,
            min_category_mass,
        } => {
            cli::analyze::run(
                mentions,
                syllabus,
                out_dir,
                config,
                fuzzy_threshold,
                min_category_mass,
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_extract_defaults() {
        let cli = Cli::try_parse_from(["skillgap", "extract", "jobs.json"]).unwrap();
        match cli.command {
            Commands::Extract {
                postings,
                output,
                dry_run,
                model,
                ..
            } => {
                assert_eq!(postings, "jobs.json");
                assert_eq!(output, "mentions.json");
                assert!(model.is_none());
                assert!(!dry_run);
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn test_parse_extract_with_all_args() {
        let cli = Cli::try_parse_from([
            "skillgap",
            "extract",
            "jobs.json",
            "-o",
            "out.json",
            "--config",
            "my.toml",
            "--model",
            "llama3",
            "--provider",
            "openai-compatible",
            "--base-url",
            "http://localhost:11434/v1",
            "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Commands::Extract {
                output,
                config,
                model,
                provider,
                base_url,
                dry_run,
                ..
            } => {
                assert_eq!(output, "out.json");
                assert_eq!(config.unwrap(), "my.toml");
                assert_eq!(model.unwrap(), "llama3");
                assert_eq!(provider.unwrap(), "openai-compatible");
                assert_eq!(base_url.unwrap(), "http://localhost:11434/v1");
                assert!(dry_run);
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from([
            "skillgap",
            "analyze",
            "--mentions",
            "m.json",
            "-s",
            "syllabus.json",
            "--fuzzy-threshold",
            "0.6",
            "--min-category-mass",
            "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze {
                mentions,
                syllabus,
                out_dir,
                fuzzy_threshold,
                min_category_mass,
                ..
            } => {
                assert_eq!(mentions, "m.json");
                assert_eq!(syllabus.unwrap(), "syllabus.json");
                assert_eq!(out_dir, "output");
                assert_eq!(fuzzy_threshold, Some(0.6));
                assert_eq!(min_category_mass, Some(3));
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_analyze_requires_mentions() {
        assert!(Cli::try_parse_from(["skillgap", "analyze"]).is_err());
    }
}
