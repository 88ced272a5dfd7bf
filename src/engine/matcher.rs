//! Reconciles the ranked inventory against syllabus topics.
//!
//! Two passes per skill:
//! 1. substring containment between the skill key and a cleaned topic, in
//!    either direction (score 1.0)
//! 2. Jaccard overlap of word tokens, accepted at or above the threshold
//!
//! Tokens split on anything that is not alphanumeric, `+`, `#` or `.`, so
//! `python,` and `html/css` break up the same way a key would.
//!
//! Topics are cleaned like skill text but never synonym-folded.

use std::collections::BTreeSet;
use tracing::{debug, info};

use super::normalizer::clean_text;
use crate::model::{MatchResult, ModuleRef, RankedInventory, SyllabusModule};

pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.5;

struct Topic<'s> {
    module_index: usize,
    module_title: &'s str,
    raw: &'s str,
    cleaned: String,
    tokens: Vec<String>,
}

impl Topic<'_> {
    fn module_ref(&self) -> ModuleRef {
        ModuleRef {
            index: self.module_index,
            title: self.module_title.to_string(),
            topic: self.raw.to_string(),
        }
    }
}

pub struct TopicMatcher {
    fuzzy_threshold: f64,
}

impl Default for TopicMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_FUZZY_THRESHOLD)
    }
}

impl TopicMatcher {
    pub fn new(fuzzy_threshold: f64) -> Self {
        Self {
            fuzzy_threshold: fuzzy_threshold.clamp(0.0, 1.0),
        }
    }

    pub fn fuzzy_threshold(&self) -> f64 {
        self.fuzzy_threshold
    }

    /// One result per inventory entry, in inventory order.
    pub fn match_inventory(
        &self,
        inventory: &RankedInventory,
        modules: &[SyllabusModule],
    ) -> Vec<MatchResult> {
        let topics = collect_topics(modules);
        if topics.is_empty() {
            info!(
                "Syllabus has no usable topics ({} module(s)); every skill is missing",
                modules.len()
            );
        }

        let results: Vec<MatchResult> = inventory
            .iter()
            .enumerate()
            .map(|(rank, entry)| {
                match self.best_topic(&entry.key, &topics) {
                    Some((topic, score)) => {
                        let covered = inventory.in_top_half(rank);
                        debug!(
                            "{:?} matched {:?} in {:?} (score {:.2}, rank {})",
                            entry.key, topic.raw, topic.module_title, score, rank + 1
                        );
                        MatchResult::matched(entry, covered, topic.module_ref(), score)
                    }
                    None => {
                        debug!("{:?} not found in syllabus", entry.key);
                        MatchResult::missing(entry)
                    }
                }
            })
            .collect();

        info!(
            "Matched {} skill(s) against {} topic(s)",
            results.len(),
            topics.len()
        );
        results
    }

    fn best_topic<'t, 's>(
        &self,
        key: &str,
        topics: &'t [Topic<'s>],
    ) -> Option<(&'t Topic<'s>, f64)> {
        if key.is_empty() {
            return None;
        }

        if let Some(topic) = topics
            .iter()
            .find(|t| t.cleaned.contains(key) || key.contains(t.cleaned.as_str()))
        {
            return Some((topic, 1.0));
        }

        let key_tokens = tokenize(key);
        let mut best: Option<(&Topic<'s>, f64)> = None;
        for topic in topics {
            let score = jaccard(&key_tokens, &topic.tokens);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((topic, score));
            }
        }
        best.filter(|(_, score)| *score > 0.0 && *score >= self.fuzzy_threshold)
    }
}

fn collect_topics(modules: &[SyllabusModule]) -> Vec<Topic<'_>> {
    let mut topics = Vec::new();
    for (module_index, module) in modules.iter().enumerate() {
        if module.topics.is_empty() {
            debug!("Module {:?} has no topics", module.title);
        }
        for raw in &module.topics {
            let cleaned = clean_text(raw);
            if cleaned.is_empty() {
                continue;
            }
            topics.push(Topic {
                module_index,
                module_title: &module.title,
                raw,
                tokens: tokenize(&cleaned),
                cleaned,
            });
        }
    }
    topics
}

/// Word tokens of cleaned text. A trailing `.` is sentence punctuation, a
/// leading one stays (`.net`).
fn tokenize(cleaned: &str) -> Vec<String> {
    cleaned
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|t| t.trim_end_matches('.'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// |A ∩ B| / |A ∪ B| over distinct tokens.
pub fn jaccard<S: AsRef<str>>(a: &[S], b: &[S]) -> f64 {
    let a: BTreeSet<&str> = a.iter().map(AsRef::as_ref).collect();
    let b: BTreeSet<&str> = b.iter().map(AsRef::as_ref).collect();
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}
