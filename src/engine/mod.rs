//! Skill normalization and gap analysis.
//!
//! Pure, synchronous transformations: mentions → ranked inventory → match
//! results → gap report → updated syllabus. Nothing here performs I/O, and
//! every stage tolerates empty input.

pub mod aggregator;
pub mod matcher;
pub mod normalizer;
pub mod synthesizer;
pub mod updater;

use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::model::{GapReport, MatchResult, RankedInventory, SkillMention, SyllabusModule};
use aggregator::{AggregationStats, Aggregator, CategoryPolicy};
use matcher::TopicMatcher;
use normalizer::SynonymTable;
use synthesizer::GapSynthesizer;
use updater::SyllabusUpdate;

/// Everything one analysis run produces.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub inventory: RankedInventory,
    #[serde(skip)]
    pub stats: AggregationStats,
    pub matches: Vec<MatchResult>,
    pub report: GapReport,
    pub update: SyllabusUpdate,
}

/// Runs the whole pipeline with one configuration.
///
/// Holds no mutable state, so one analyzer can serve several runs at once.
pub struct GapAnalyzer {
    synonyms: SynonymTable,
    policy: CategoryPolicy,
    matcher: TopicMatcher,
    synthesizer: GapSynthesizer,
}

impl Default for GapAnalyzer {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default(), SynonymTable::builtin().clone())
    }
}

impl GapAnalyzer {
    pub fn new(config: &AnalysisConfig, synonyms: SynonymTable) -> Self {
        let policy = CategoryPolicy::new(&config.category_priority);
        let synthesizer = GapSynthesizer::new()
            .with_min_category_mass(config.min_category_mass)
            .with_max_module_topics(config.max_module_topics)
            .with_category_order(policy.order());
        Self {
            synonyms,
            matcher: TopicMatcher::new(config.fuzzy_threshold),
            policy,
            synthesizer,
        }
    }

    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    pub fn inventory(&self, mentions: &[SkillMention]) -> RankedInventory {
        self.aggregator().aggregate(mentions)
    }

    pub fn analyze(&self, mentions: &[SkillMention], modules: &[SyllabusModule]) -> Analysis {
        let (inventory, stats) = self.aggregator().aggregate_with_stats(mentions);
        let matches = self.matcher.match_inventory(&inventory, modules);
        let report = self.synthesizer.synthesize(&matches, &inventory);
        let update = updater::apply_with_changes(&report, modules);
        Analysis {
            inventory,
            stats,
            matches,
            report,
            update,
        }
    }

    fn aggregator(&self) -> Aggregator<'_> {
        Aggregator::new(&self.synonyms).with_policy(self.policy.clone())
    }
}
