//! Skill text canonicalization.
//!
//! A raw mention is cleaned (whitespace collapsed, surrounding punctuation
//! removed, lowercased) and then folded through a synonym table to give a
//! stable key. Cleaning alone is also used for syllabus topics, which are
//! never synonym-folded.

use once_cell::sync::Lazy;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::warn;

use crate::error::SkillError;
use crate::model::Category;

const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("js", "javascript"),
    ("ts", "typescript"),
    ("py", "python"),
    ("ml", "machine learning"),
    ("ai", "artificial intelligence"),
    ("dl", "deep learning"),
    ("nlp", "natural language processing"),
    ("cv", "computer vision"),
    ("k8s", "kubernetes"),
    ("postgres", "postgresql"),
    ("mongo", "mongodb"),
    ("golang", "go"),
    ("node", "node.js"),
    ("nodejs", "node.js"),
    ("reactjs", "react"),
    ("react.js", "react"),
    ("vuejs", "vue"),
    ("vue.js", "vue"),
    ("amazon web services", "aws"),
    ("gcp", "google cloud platform"),
    ("google cloud", "google cloud platform"),
    ("ci/cd", "continuous integration"),
    ("cicd", "continuous integration"),
    ("oop", "object-oriented programming"),
    ("dsa", "data structures and algorithms"),
    ("rest api", "rest"),
    ("rest apis", "rest"),
    ("restful apis", "rest"),
    ("restful api", "rest"),
    ("sklearn", "scikit-learn"),
    ("tf", "tensorflow"),
];

static BUILTIN_TABLE: Lazy<SynonymTable> =
    Lazy::new(|| SynonymTable::from_pairs(BUILTIN_ALIASES.iter().copied()));

/// Alias → canonical term lookup, applied after basic cleanup.
///
/// Both sides are stored cleaned. Targets are never themselves aliases, so
/// folding a canonical key again leaves it unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynonymTable {
    aliases: HashMap<String, String>,
}

impl SynonymTable {
    /// An empty table (no folding).
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared built-in table. Read-only.
    pub fn builtin() -> &'static SynonymTable {
        &BUILTIN_TABLE
    }

    pub fn from_pairs<I, A, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, C)>,
        A: AsRef<str>,
        C: AsRef<str>,
    {
        let mut table = Self::new();
        table.extend(pairs);
        table
    }

    pub fn extend<I, A, C>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (A, C)>,
        A: AsRef<str>,
        C: AsRef<str>,
    {
        for (alias, canonical) in pairs {
            self.insert(alias.as_ref(), canonical.as_ref());
        }
    }

    /// Add one alias. A later entry for the same alias replaces the earlier one.
    pub fn insert(&mut self, alias: &str, canonical: &str) {
        let alias = clean_text(alias);
        let canonical = clean_text(canonical);
        if alias.is_empty() || canonical.is_empty() || alias == canonical {
            return;
        }

        let target = self
            .aliases
            .get(&canonical)
            .cloned()
            .unwrap_or(canonical);
        if target == alias {
            warn!("Ignoring synonym {:?} -> {:?}: it would form a cycle", alias, target);
            return;
        }

        for existing in self.aliases.values_mut() {
            if *existing == alias {
                *existing = target.clone();
            }
        }
        self.aliases.insert(alias, target);
    }

    /// Canonical term for an already-cleaned string, if it is an alias.
    pub fn resolve(&self, cleaned: &str) -> Option<&str> {
        self.aliases.get(cleaned).map(String::as_str)
    }

    pub fn is_alias(&self, cleaned: &str) -> bool {
        self.aliases.contains_key(cleaned)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Result of normalizing one raw mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSkill {
    pub key: String,
    /// Case-preserving cleaned form of the raw text.
    pub display_name: String,
    pub category: Category,
    /// The cleaned text was an alias (usually an abbreviation) of `key`.
    pub is_alias: bool,
}

/// Canonicalize a raw skill mention into its key and display form.
pub fn normalize(
    raw_text: &str,
    category: Category,
    synonyms: &SynonymTable,
) -> Result<NormalizedSkill, SkillError> {
    let display_name = display_form(raw_text);
    if display_name.is_empty() {
        return Err(SkillError::InvalidSkillText {
            raw: raw_text.to_string(),
        });
    }

    let cleaned = display_name.to_lowercase();
    let (key, is_alias) = match synonyms.resolve(&cleaned) {
        Some(canonical) => (canonical.to_string(), true),
        None => (cleaned, false),
    };

    Ok(NormalizedSkill {
        key,
        display_name,
        category,
        is_alias,
    })
}

/// Lowercased cleanup without synonym folding. Used for syllabus topics.
pub fn clean_text(raw: &str) -> String {
    display_form(raw).to_lowercase()
}

/// Collapse whitespace and strip surrounding punctuation, keeping case.
///
/// `+` and `#` are never stripped (`C++`, `C#`), and a leading `.` directly
/// before an alphanumeric character is kept (`.NET`).
pub fn display_form(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_end_matches(is_strippable);
    let start = leading_cut(trimmed);
    trimmed[start..].to_string()
}

fn is_strippable(c: char) -> bool {
    !c.is_alphanumeric() && !matches!(c, '+' | '#')
}

fn leading_cut(s: &str) -> usize {
    let mut prev: Option<(usize, char)> = None;
    for (i, c) in s.char_indices() {
        if !is_strippable(c) {
            return match prev {
                Some((j, '.')) if c.is_alphanumeric() => j,
                _ => i,
            };
        }
        prev = Some((i, c));
    }
    s.len()
}

/// Tracks the best human-readable form seen for one canonical key.
///
/// Non-alias forms beat aliases, then longer forms beat shorter ones. Among
/// equally long forms the bytewise largest wins (`python` over `Python`), so
/// the result does not depend on the order mentions arrive in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayChoice {
    name: String,
    is_alias: bool,
}

impl DisplayChoice {
    pub fn seed(skill: &NormalizedSkill) -> Self {
        Self {
            name: skill.display_name.clone(),
            is_alias: skill.is_alias,
        }
    }

    /// Offer another raw form. Returns true when it replaced the current one.
    pub fn offer(&mut self, skill: &NormalizedSkill) -> bool {
        if self.compare(&skill.display_name, skill.is_alias) == Ordering::Greater {
            self.name = skill.display_name.clone();
            self.is_alias = skill.is_alias;
            return true;
        }
        false
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn into_name(self) -> String {
        self.name
    }

    fn compare(&self, candidate: &str, candidate_alias: bool) -> Ordering {
        (!candidate_alias)
            .cmp(&!self.is_alias)
            .then_with(|| candidate.chars().count().cmp(&self.name.chars().count()))
            .then_with(|| candidate.cmp(self.name.as_str()))
    }
}
