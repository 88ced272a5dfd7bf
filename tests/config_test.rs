//! Configuration defaults and loading through the public API

use anyhow::Result;
use serial_test::serial;
use skillgap::config::Config;
use skillgap::engine::GapAnalyzer;
use skillgap::model::{Category, SkillMention, SyllabusModule};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_config_has_defaults() -> Result<()> {
    let config = Config::default();

    assert!(!config.llm.provider.is_empty());
    assert!(!config.llm.model.is_empty());
    assert!(config.analysis.fuzzy_threshold > 0.0 && config.analysis.fuzzy_threshold <= 1.0);
    assert_eq!(config.analysis.category_priority, Category::ALL.to_vec());
    assert!(config.extraction.max_description_chars > 0);

    Ok(())
}

#[test]
#[serial]
fn test_config_load_returns_valid_config() -> Result<()> {
    // Should load config or return defaults without crashing
    let config = Config::load()?;
    assert!(!config.llm.provider.is_empty());
    Ok(())
}

#[test]
fn test_config_drives_the_analyzer() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("skillgap.toml");
    fs::write(
        &path,
        r#"
[analysis]
min_category_mass = 1
category_priority = ["soft"]

[synonyms]
replace_defaults = true

[synonyms.aliases]
"people skills" = "communication"
"#,
    )?;
    let config = Config::load_with_path(Some(path.to_string_lossy().to_string()))?;

    let mentions = vec![
        SkillMention::new("People Skills", Category::Soft, "a"),
        SkillMention::new("Communication", Category::Technical, "b"),
        SkillMention::new("JS", Category::Technical, "c"),
    ];
    let analyzer = GapAnalyzer::new(&config.analysis, config.synonyms.build_table());
    let analysis = analyzer.analyze(&mentions, &[SyllabusModule::new("Intro", ["Rust"])]);

    let comm = analysis.inventory.get("communication").expect("aliases merged");
    assert_eq!(comm.frequency, 2);
    assert_eq!(comm.display_name, "Communication");
    // One vote each; "soft" is listed first so it wins the tie
    assert_eq!(comm.category, Category::Soft);
    // Built-in aliases were replaced, so "js" stays as written
    assert!(analysis.inventory.get("js").is_some());
    // Mass threshold of 1 lets every missing category propose a module
    assert_eq!(analysis.report.recommended_modules.len(), 2);

    Ok(())
}

#[test]
fn test_invalid_category_in_config_is_rejected() {
    let result: Result<Config, _> = toml::from_str("[analysis]\ncategory_priority = [\"hardware\"]\n");
    assert!(result.is_err());
}
