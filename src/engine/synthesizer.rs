//! Turns per-skill match results into a gap report.

use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::model::{
    Category, GapReport, MatchResult, MatchStatus, MissingSkill, Priority, RankedInventory,
    RecommendedModule, UnderEmphasized,
};

pub const DEFAULT_MIN_CATEGORY_MASS: usize = 2;
pub const DEFAULT_MAX_MODULE_TOPICS: usize = 20;

pub struct GapSynthesizer {
    min_category_mass: usize,
    max_module_topics: usize,
    category_order: Vec<Category>,
}

impl Default for GapSynthesizer {
    fn default() -> Self {
        Self {
            min_category_mass: DEFAULT_MIN_CATEGORY_MASS,
            max_module_topics: DEFAULT_MAX_MODULE_TOPICS,
            category_order: Category::ALL.to_vec(),
        }
    }
}

impl GapSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum summed posting count before a category earns a proposed module.
    pub fn with_min_category_mass(mut self, mass: usize) -> Self {
        self.min_category_mass = mass;
        self
    }

    /// Cap on topics listed in one proposed module. Zero means no cap.
    pub fn with_max_module_topics(mut self, max: usize) -> Self {
        self.max_module_topics = max;
        self
    }

    /// Order used to break frequency-mass ties between proposed modules.
    pub fn with_category_order(mut self, order: &[Category]) -> Self {
        self.category_order = order.to_vec();
        self
    }

    /// Build the report. Output follows inventory rank, so the order of
    /// `results` does not matter. Inventory skills without a result count as missing.
    pub fn synthesize(&self, results: &[MatchResult], inventory: &RankedInventory) -> GapReport {
        let by_key: HashMap<&str, &MatchResult> = results.iter().map(|r| (r.key(), r)).collect();
        let total = inventory.len();

        let mut missing_skills = Vec::new();
        let mut under_emphasized = Vec::new();
        let mut buckets: BTreeMap<Category, (usize, Vec<String>)> = BTreeMap::new();

        for (rank, entry) in inventory.iter().enumerate() {
            let result = by_key.get(entry.key.as_str());
            let status = result.map_or(MatchStatus::Missing, |r| r.status());

            match status {
                MatchStatus::Missing => {
                    missing_skills.push(MissingSkill {
                        display_name: entry.display_name.clone(),
                        key: entry.key.clone(),
                        category: entry.category,
                        frequency: entry.frequency,
                        rank: rank + 1,
                        priority: priority_for(rank, total),
                    });
                    let bucket = buckets.entry(entry.category).or_default();
                    bucket.0 += entry.frequency;
                    bucket.1.push(entry.display_name.clone());
                }
                MatchStatus::UnderEmphasized => {
                    if let Some(module) = result.and_then(|r| r.matched_module()) {
                        under_emphasized.push(UnderEmphasized {
                            module: module.title.clone(),
                            module_index: module.index,
                            skill: entry.display_name.clone(),
                            frequency: entry.frequency,
                        });
                    }
                }
                MatchStatus::Covered => {}
            }
        }

        let mut recommended_modules: Vec<RecommendedModule> = buckets
            .into_iter()
            .filter(|(category, (mass, _))| {
                let keep = *mass >= self.min_category_mass;
                if !keep {
                    debug!(
                        "No module proposed for {} (mass {} < {})",
                        category, mass, self.min_category_mass
                    );
                }
                keep
            })
            .map(|(category, (mass, mut topics))| {
                if self.max_module_topics > 0 {
                    topics.truncate(self.max_module_topics);
                }
                RecommendedModule {
                    title: category.module_title().to_string(),
                    category,
                    topics,
                    frequency_mass: mass,
                }
            })
            .collect();
        recommended_modules.sort_by(|a, b| {
            b.frequency_mass
                .cmp(&a.frequency_mass)
                .then_with(|| self.position(a.category).cmp(&self.position(b.category)))
        });

        let coverage_ratio = if total == 0 {
            0.0
        } else {
            (total - missing_skills.len()) as f64 / total as f64
        };
        let summary = format!(
            "{} of {} skills missing, {} under-emphasized, {} modules recommended",
            missing_skills.len(),
            total,
            under_emphasized.len(),
            recommended_modules.len()
        );
        info!("Gap report: {}", summary);

        GapReport {
            missing_skills,
            under_emphasized,
            recommended_modules,
            coverage_ratio,
            summary,
        }
    }

    fn position(&self, category: Category) -> usize {
        self.category_order
            .iter()
            .position(|c| *c == category)
            .unwrap_or(self.category_order.len())
    }
}

/// First third of the inventory is high priority, second third medium, rest low.
fn priority_for(rank: usize, total: usize) -> Priority {
    if rank < total.div_ceil(3) {
        Priority::High
    } else if rank < (2 * total).div_ceil(3) {
        Priority::Medium
    } else {
        Priority::Low
    }
}
