//! Folds skill mentions from many postings into a ranked inventory.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use super::normalizer::{normalize, DisplayChoice, SynonymTable};
use crate::model::{Category, InventoryEntry, RankedInventory, SkillMention};

/// Tie-break order for the per-skill category vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPolicy {
    order: Vec<Category>,
}

impl Default for CategoryPolicy {
    fn default() -> Self {
        Self {
            order: Category::ALL.to_vec(),
        }
    }
}

impl CategoryPolicy {
    /// Earlier categories win ties. Categories left out rank after the listed
    /// ones, in their default order.
    pub fn new(order: &[Category]) -> Self {
        let mut full: Vec<Category> = Vec::with_capacity(Category::ALL.len());
        for c in order.iter().chain(Category::ALL.iter()) {
            if !full.contains(c) {
                full.push(*c);
            }
        }
        Self { order: full }
    }

    pub fn order(&self) -> &[Category] {
        &self.order
    }

    fn position(&self, category: Category) -> usize {
        self.order
            .iter()
            .position(|c| *c == category)
            .unwrap_or(self.order.len())
    }

    /// Majority category, ties resolved by policy order.
    pub fn resolve(&self, votes: &BTreeMap<Category, usize>) -> Category {
        votes
            .iter()
            .min_by(|(ca, na), (cb, nb)| {
                nb.cmp(na)
                    .then_with(|| self.position(**ca).cmp(&self.position(**cb)))
            })
            .map(|(c, _)| *c)
            .unwrap_or(self.order[0])
    }
}

/// Counters describing one aggregation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationStats {
    pub accepted: usize,
    pub dropped: usize,
}

struct SkillGroup<'m> {
    display: DisplayChoice,
    postings: BTreeSet<&'m str>,
    votes: BTreeMap<Category, usize>,
}

pub struct Aggregator<'a> {
    synonyms: &'a SynonymTable,
    policy: CategoryPolicy,
}

impl<'a> Aggregator<'a> {
    pub fn new(synonyms: &'a SynonymTable) -> Self {
        Self {
            synonyms,
            policy: CategoryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CategoryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn aggregate(&self, mentions: &[SkillMention]) -> RankedInventory {
        self.aggregate_with_stats(mentions).0
    }

    /// Build the ranked inventory. Frequency is the number of distinct
    /// postings mentioning a skill; mentions with no usable text are dropped.
    pub fn aggregate_with_stats(
        &self,
        mentions: &[SkillMention],
    ) -> (RankedInventory, AggregationStats) {
        let mut stats = AggregationStats::default();
        let mut groups: BTreeMap<String, SkillGroup<'_>> = BTreeMap::new();

        for mention in mentions {
            let skill = match normalize(&mention.raw_text, mention.category, self.synonyms) {
                Ok(skill) => skill,
                Err(e) => {
                    warn!(
                        "Dropping mention from posting {}: {}",
                        mention.source_posting_id, e
                    );
                    stats.dropped += 1;
                    continue;
                }
            };
            stats.accepted += 1;

            let group = groups
                .entry(skill.key.clone())
                .or_insert_with(|| SkillGroup {
                    display: DisplayChoice::seed(&skill),
                    postings: BTreeSet::new(),
                    votes: BTreeMap::new(),
                });
            group.display.offer(&skill);
            group.postings.insert(mention.source_posting_id.as_str());
            *group.votes.entry(mention.category).or_insert(0) += 1;
        }

        let entries: Vec<InventoryEntry> = groups
            .into_iter()
            .map(|(key, group)| {
                let category = self.policy.resolve(&group.votes);
                debug!(
                    "Skill {:?}: {} posting(s), category {}",
                    key,
                    group.postings.len(),
                    category
                );
                InventoryEntry {
                    display_name: group.display.into_name(),
                    key,
                    category,
                    frequency: group.postings.len(),
                }
            })
            .collect();

        let inventory = RankedInventory::from_entries(entries);
        info!(
            "Aggregated {} mention(s) into {} skill(s) ({} dropped)",
            stats.accepted,
            inventory.len(),
            stats.dropped
        );
        (inventory, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mention(raw: &str, cat: Category, posting: &str) -> SkillMention {
        SkillMention::new(raw, cat, posting)
    }

    #[test]
    fn test_frequency_counts_postings_not_mentions() {
        let mentions = vec![
            mention("Python", Category::Technical, "p1"),
            mention("python", Category::Technical, "p1"),
            mention("PYTHON", Category::Technical, "p2"),
        ];
        let inv = Aggregator::new(SynonymTable::builtin()).aggregate(&mentions);
        assert_eq!(inv.len(), 1);
        assert_eq!(inv.entries()[0].frequency, 2);
    }

    #[test]
    fn test_synonyms_merge_into_one_skill() {
        let mentions = vec![
            mention("JS", Category::Technical, "p1"),
            mention("JavaScript", Category::Technical, "p2"),
            mention("js", Category::Technical, "p3"),
        ];
        let inv = Aggregator::new(SynonymTable::builtin()).aggregate(&mentions);
        assert_eq!(inv.len(), 1);
        let entry = &inv.entries()[0];
        assert_eq!(entry.key, "javascript");
        assert_eq!(entry.display_name, "JavaScript");
        assert_eq!(entry.frequency, 3);
    }

    #[test]
    fn test_empty_mentions_are_dropped() {
        let mentions = vec![
            mention("  ", Category::Soft, "p1"),
            mention("Teamwork", Category::Soft, "p1"),
            mention("!!", Category::Soft, "p2"),
        ];
        let (inv, stats) =
            Aggregator::new(SynonymTable::builtin()).aggregate_with_stats(&mentions);
        assert_eq!(inv.len(), 1);
        assert_eq!(stats, AggregationStats { accepted: 1, dropped: 2 });
    }

    #[test]
    fn test_empty_input_gives_empty_inventory() {
        let inv = Aggregator::new(SynonymTable::builtin()).aggregate(&[]);
        assert!(inv.is_empty());
    }

    #[test]
    fn test_majority_category_wins() {
        let mentions = vec![
            mention("Docker", Category::Tool, "p1"),
            mention("Docker", Category::Tool, "p2"),
            mention("Docker", Category::Technical, "p3"),
        ];
        let inv = Aggregator::new(SynonymTable::builtin()).aggregate(&mentions);
        assert_eq!(inv.entries()[0].category, Category::Tool);
    }

    #[test]
    fn test_category_tie_prefers_technical_then_tool() {
        let mentions = vec![
            mention("Git", Category::Soft, "p1"),
            mention("Git", Category::Tool, "p2"),
            mention("Jira", Category::Domain, "p1"),
            mention("Jira", Category::Tool, "p2"),
            mention("Agile", Category::Technical, "p1"),
            mention("Agile", Category::Soft, "p2"),
        ];
        let inv = Aggregator::new(SynonymTable::builtin()).aggregate(&mentions);
        assert_eq!(inv.get("git").unwrap().category, Category::Tool);
        assert_eq!(inv.get("jira").unwrap().category, Category::Tool);
        assert_eq!(inv.get("agile").unwrap().category, Category::Technical);
    }

    #[test]
    fn test_custom_policy_changes_tie_break() {
        let mentions = vec![
            mention("Agile", Category::Technical, "p1"),
            mention("Agile", Category::Soft, "p2"),
        ];
        let inv = Aggregator::new(SynonymTable::builtin())
            .with_policy(CategoryPolicy::new(&[Category::Soft]))
            .aggregate(&mentions);
        assert_eq!(inv.entries()[0].category, Category::Soft);
    }

    #[test]
    fn test_policy_fills_in_unlisted_categories() {
        let policy = CategoryPolicy::new(&[Category::Domain, Category::Domain]);
        assert_eq!(
            policy.order(),
            &[
                Category::Domain,
                Category::Technical,
                Category::Tool,
                Category::Soft
            ]
        );
    }

    #[test]
    fn test_ordering_ignores_input_order() {
        let mut mentions = vec![
            mention("SQL", Category::Technical, "p2"),
            mention("python", Category::Technical, "p1"),
            mention("Python", Category::Technical, "p1"),
            mention("Docker", Category::Tool, "p3"),
            mention("docker", Category::Tool, "p1"),
            mention("Communication", Category::Soft, "p2"),
        ];
        let agg = Aggregator::new(SynonymTable::builtin());
        let expected = agg.aggregate(&mentions);
        mentions.reverse();
        assert_eq!(agg.aggregate(&mentions), expected);
        mentions.rotate_left(2);
        assert_eq!(agg.aggregate(&mentions), expected);

        let names: Vec<&str> = expected
            .iter()
            .map(|e| e.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["docker", "Communication", "python", "SQL"]);
    }
}
