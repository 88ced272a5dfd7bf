//! Shared data model for the skill inventory, syllabus and gap report.

use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Skill category as reported by the extraction step.
///
/// Declaration order is the default tie-break priority used when mentions
/// of one skill disagree about its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[serde(alias = "technical_skills")]
    Technical,
    #[serde(alias = "tools", alias = "tools_platforms")]
    Tool,
    #[serde(alias = "domain_knowledge")]
    Domain,
    #[serde(alias = "soft_skills")]
    Soft,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Technical,
        Category::Tool,
        Category::Domain,
        Category::Soft,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technical => "technical",
            Category::Tool => "tool",
            Category::Domain => "domain",
            Category::Soft => "soft",
        }
    }

    /// Title used for a module proposed to cover missing skills of this category.
    pub fn module_title(&self) -> &'static str {
        match self {
            Category::Technical => "Technical Skills",
            Category::Tool => "Emerging Tools & Platforms",
            Category::Domain => "Domain Knowledge",
            Category::Soft => "Professional & Soft Skills",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "technical" | "technical_skills" => Ok(Category::Technical),
            "tool" | "tools" | "tools_platforms" => Ok(Category::Tool),
            "domain" | "domain_knowledge" => Ok(Category::Domain),
            "soft" | "soft_skills" => Ok(Category::Soft),
            other => bail!("Unknown skill category: {}", other),
        }
    }
}

/// One occurrence of a skill extracted from one posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillMention {
    pub raw_text: String,
    pub category: Category,
    pub source_posting_id: String,
}

impl SkillMention {
    pub fn new(raw_text: impl Into<String>, category: Category, posting: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            category,
            source_posting_id: posting.into(),
        }
    }
}

/// A normalization-equivalence class of skill mentions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalSkill {
    pub key: String,
    pub display_name: String,
    pub category: Category,
}

/// One row of the ranked inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub display_name: String,
    pub key: String,
    pub category: Category,
    /// Number of distinct postings mentioning the skill.
    pub frequency: usize,
}

impl InventoryEntry {
    pub fn skill(&self) -> CanonicalSkill {
        CanonicalSkill {
            key: self.key.clone(),
            display_name: self.display_name.clone(),
            category: self.category,
        }
    }
}

/// Skills sorted by descending frequency, ties broken alphabetically by display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankedInventory {
    entries: Vec<InventoryEntry>,
}

impl RankedInventory {
    /// Build an inventory from entries in any order.
    pub fn from_entries(mut entries: Vec<InventoryEntry>) -> Self {
        entries.sort_by(|a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then_with(|| {
                    a.display_name
                        .to_lowercase()
                        .cmp(&b.display_name.to_lowercase())
                })
                .then_with(|| a.display_name.cmp(&b.display_name))
                .then_with(|| a.key.cmp(&b.key))
        });
        Self { entries }
    }

    pub fn entries(&self) -> &[InventoryEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InventoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&InventoryEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Zero-based rank of a skill key.
    pub fn rank_of(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.key == key)
    }

    /// Whether a zero-based rank falls in the top half of the inventory.
    pub fn in_top_half(&self, rank: usize) -> bool {
        rank < self.entries.len().div_ceil(2)
    }

    /// The top `n` entries of each category, in rank order.
    pub fn top_by_category(&self, n: usize) -> BTreeMap<Category, Vec<&InventoryEntry>> {
        let mut out: BTreeMap<Category, Vec<&InventoryEntry>> = BTreeMap::new();
        for entry in &self.entries {
            let bucket = out.entry(entry.category).or_default();
            if bucket.len() < n {
                bucket.push(entry);
            }
        }
        out
    }
}

impl<'a> IntoIterator for &'a RankedInventory {
    type Item = &'a InventoryEntry;
    type IntoIter = std::slice::Iter<'a, InventoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmphasisLevel {
    #[default]
    Normal,
    High,
}

impl EmphasisLevel {
    /// One step up, capped at `High`.
    pub fn raised(self) -> Self {
        EmphasisLevel::High
    }

    fn is_normal(&self) -> bool {
        *self == EmphasisLevel::Normal
    }
}

/// A unit of the syllabus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyllabusModule {
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default, skip_serializing_if = "EmphasisLevel::is_normal")]
    pub emphasis_level: EmphasisLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SyllabusModule {
    pub fn new<T: Into<String>>(title: impl Into<String>, topics: impl IntoIterator<Item = T>) -> Self {
        Self {
            title: title.into(),
            topics: topics.into_iter().map(Into::into).collect(),
            emphasis_level: EmphasisLevel::Normal,
            duration: None,
            description: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Covered,
    UnderEmphasized,
    Missing,
}

/// Where in the syllabus a skill was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleRef {
    pub index: usize,
    pub title: String,
    pub topic: String,
}

/// Outcome of matching one inventory skill against the syllabus.
///
/// Constructed only through [`MatchResult::matched`] and [`MatchResult::missing`],
/// so `matched_module` is present exactly when the status is not `Missing`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    key: String,
    display_name: String,
    category: Category,
    frequency: usize,
    status: MatchStatus,
    matched_module: Option<ModuleRef>,
    similarity_score: f64,
}

impl MatchResult {
    /// A skill found in the syllabus. `covered` selects between covered and under-emphasized.
    pub fn matched(entry: &InventoryEntry, covered: bool, module: ModuleRef, score: f64) -> Self {
        Self {
            key: entry.key.clone(),
            display_name: entry.display_name.clone(),
            category: entry.category,
            frequency: entry.frequency,
            status: if covered {
                MatchStatus::Covered
            } else {
                MatchStatus::UnderEmphasized
            },
            matched_module: Some(module),
            similarity_score: score.clamp(0.0, 1.0),
        }
    }

    pub fn missing(entry: &InventoryEntry) -> Self {
        Self {
            key: entry.key.clone(),
            display_name: entry.display_name.clone(),
            category: entry.category,
            frequency: entry.frequency,
            status: MatchStatus::Missing,
            matched_module: None,
            similarity_score: 0.0,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn frequency(&self) -> usize {
        self.frequency
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn matched_module(&self) -> Option<&ModuleRef> {
        self.matched_module.as_ref()
    }

    pub fn similarity_score(&self) -> f64 {
        self.similarity_score
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// An inventory skill the syllabus does not teach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingSkill {
    pub display_name: String,
    pub key: String,
    pub category: Category,
    pub frequency: usize,
    /// One-based position in the ranked inventory.
    pub rank: usize,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnderEmphasized {
    pub module: String,
    pub module_index: usize,
    pub skill: String,
    pub frequency: usize,
}

/// A new module proposed to cover the missing skills of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendedModule {
    pub title: String,
    pub category: Category,
    pub topics: Vec<String>,
    /// Sum of the distinct-posting counts of the skills this module addresses.
    pub frequency_mass: usize,
}

impl RecommendedModule {
    pub fn to_module(&self) -> SyllabusModule {
        SyllabusModule::new(self.title.clone(), self.topics.iter().cloned())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapReport {
    pub missing_skills: Vec<MissingSkill>,
    pub under_emphasized: Vec<UnderEmphasized>,
    pub recommended_modules: Vec<RecommendedModule>,
    /// Share of inventory skills the syllabus matched at all.
    pub coverage_ratio: f64,
    pub summary: String,
}

impl GapReport {
    pub fn is_empty(&self) -> bool {
        self.missing_skills.is_empty()
            && self.under_emphasized.is_empty()
            && self.recommended_modules.is_empty()
    }
}
