use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::Config;
use crate::engine::updater::ChangeSummary;
use crate::engine::{Analysis, GapAnalyzer};
use crate::extract;
use crate::model::{GapReport, MatchResult, Priority};
use crate::syllabus::Syllabus;
use crate::util::write_json_atomic;

pub const INVENTORY_FILE: &str = "skill_inventory.json";
pub const GAP_ANALYSIS_FILE: &str = "gap_analysis.json";
pub const UPDATED_SYLLABUS_FILE: &str = "updated_syllabus.json";

#[derive(Serialize)]
struct GapAnalysisOutput<'a> {
    #[serde(flatten)]
    report: &'a GapReport,
    match_results: &'a [MatchResult],
    changes: &'a ChangeSummary,
}

pub fn run(
    mentions_path: String,
    syllabus_path: Option<String>,
    out_dir: String,
    config_path: Option<String>,
    fuzzy_threshold_override: Option<f64>,
    min_category_mass_override: Option<usize>,
) -> Result<Analysis> {
    info!("Mentions: {}", mentions_path);
    info!("Output directory: {}", out_dir);

    let mut config = Config::load_with_path(config_path)?;

    if let Some(threshold) = fuzzy_threshold_override {
        info!("CLI override: fuzzy_threshold = {}", threshold);
        config.analysis.fuzzy_threshold = threshold;
    }
    if let Some(mass) = min_category_mass_override {
        info!("CLI override: min_category_mass = {}", mass);
        config.analysis.min_category_mass = mass;
    }

    let mentions = extract::load_mentions(Path::new(&mentions_path))?;
    let syllabus = Syllabus::load_or_default(syllabus_path.as_deref().map(Path::new))?;
    if syllabus.modules.is_empty() {
        warn!("Syllabus has no modules; every skill will be reported missing");
    }

    let analyzer = GapAnalyzer::new(&config.analysis, config.synonyms.build_table());
    let analysis = analyzer.analyze(&mentions, &syllabus.modules);

    let out_dir = PathBuf::from(out_dir);
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    write_json_atomic(&out_dir.join(INVENTORY_FILE), &analysis.inventory)?;
    write_json_atomic(
        &out_dir.join(GAP_ANALYSIS_FILE),
        &GapAnalysisOutput {
            report: &analysis.report,
            match_results: &analysis.matches,
            changes: &analysis.update.changes,
        },
    )?;
    syllabus
        .with_modules(analysis.update.modules.clone())
        .save(&out_dir.join(UPDATED_SYLLABUS_FILE))?;
    info!("Results written to {}", out_dir.display());

    print_summary(&analysis);
    Ok(analysis)
}

fn print_summary(analysis: &Analysis) {
    let report = &analysis.report;
    println!();
    println!("{}", report.summary);
    println!(
        "Coverage: {:.0}% of {} skill(s)",
        report.coverage_ratio * 100.0,
        analysis.inventory.len()
    );
    if analysis.stats.dropped > 0 {
        println!("  ! {} mention(s) dropped as empty", analysis.stats.dropped);
    }

    let urgent: Vec<&str> = report
        .missing_skills
        .iter()
        .filter(|m| m.priority == Priority::High)
        .map(|m| m.display_name.as_str())
        .collect();
    if !urgent.is_empty() {
        println!("  High-priority gaps: {}", urgent.join(", "));
    }
    for u in &report.under_emphasized {
        println!("  Raise emphasis: {} ({})", u.module, u.skill);
    }
    for m in &report.recommended_modules {
        println!("  New module: {} ({} topic(s))", m.title, m.topics.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EmphasisLevel;

    fn write(path: &Path, content: &str) {
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_analyze_writes_three_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let mentions = dir.path().join("mentions.json");
        write(
            &mentions,
            r#"[
                {"raw_text": "Python", "category": "technical", "source_posting_id": "1"},
                {"raw_text": "python", "category": "technical", "source_posting_id": "2"},
                {"raw_text": "SQL", "category": "technical", "source_posting_id": "1"}
            ]"#,
        );
        let syllabus = dir.path().join("syllabus.json");
        write(
            &syllabus,
            r#"[{"title": "Intro", "topics": ["Java"]}, {"title": "DB", "topics": ["SQL basics"]}]"#,
        );
        let cfg = dir.path().join("skillgap.toml");
        write(&cfg, "");
        let out = dir.path().join("out");

        let analysis = run(
            mentions.to_string_lossy().to_string(),
            Some(syllabus.to_string_lossy().to_string()),
            out.to_string_lossy().to_string(),
            Some(cfg.to_string_lossy().to_string()),
            None,
            None,
        )
        .unwrap();

        assert_eq!(analysis.inventory.len(), 2);
        for name in [INVENTORY_FILE, GAP_ANALYSIS_FILE, UPDATED_SYLLABUS_FILE] {
            assert!(out.join(name).exists(), "{name} missing");
        }

        let gap: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join(GAP_ANALYSIS_FILE)).unwrap())
                .unwrap();
        assert_eq!(gap["missing_skills"][0]["display_name"], "python");
        assert_eq!(gap["under_emphasized"][0]["module"], "DB");
        assert_eq!(gap["match_results"].as_array().unwrap().len(), 2);

        let updated = Syllabus::load(&out.join(UPDATED_SYLLABUS_FILE)).unwrap();
        assert_eq!(updated.modules.len(), 3);
        assert_eq!(updated.modules[1].emphasis_level, EmphasisLevel::High);
        assert_eq!(updated.modules[2].title, "Technical Skills");
        assert_eq!(updated.modules[2].topics, vec!["python"]);
    }

    #[test]
    fn test_analyze_without_syllabus_uses_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let mentions = dir.path().join("mentions.json");
        write(&mentions, "[]");
        let cfg = dir.path().join("skillgap.toml");
        write(&cfg, "");

        let analysis = run(
            mentions.to_string_lossy().to_string(),
            None,
            dir.path().join("out").to_string_lossy().to_string(),
            Some(cfg.to_string_lossy().to_string()),
            Some(0.9),
            Some(1),
        )
        .unwrap();

        assert!(analysis.inventory.is_empty());
        assert!(analysis.report.is_empty());
        assert_eq!(
            analysis.update.modules,
            Syllabus::default_program().modules
        );
    }
}
