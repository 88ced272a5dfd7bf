//! Parsing of model answers into skill mentions.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::model::{Category, SkillMention};

/// Answer keys in the order they are requested in the prompt.
pub const RESPONSE_KEYS: [(&str, Category); 4] = [
    ("technical_skills", Category::Technical),
    ("soft_skills", Category::Soft),
    ("domain_knowledge", Category::Domain),
    ("tools_platforms", Category::Tool),
];

/// Extract the JSON object from a model answer that may include markdown
/// fences or surrounding prose.
pub fn extract_json_block(text: &str) -> &str {
    let trimmed = text.trim();

    // Try: markdown json fence
    if let Some(start) = trimmed.find("```json") {
        let body = &trimmed[start + 7..];
        if let Some(end) = body.find("```") {
            return body[..end].trim();
        }
    }

    // Try: markdown plain fence
    if let Some(start) = trimmed.find("```") {
        let body = &trimmed[start + 3..];
        if let Some(end) = body.find("```") {
            let inner = body[..end].trim();
            if inner.starts_with('{') {
                return inner;
            }
        }
    }

    // Try: first { through last }
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if end > start {
            return &trimmed[start..=end];
        }
    }

    trimmed
}

/// Turn one model answer into mentions attributed to `posting_id`.
///
/// Missing category arrays count as empty and non-string entries are
/// skipped. An answer with no JSON object at all is an error.
pub fn parse_skill_response(answer: &str, posting_id: &str) -> Result<Vec<SkillMention>> {
    let block = extract_json_block(answer);
    let value: Value = serde_json::from_str(block)
        .with_context(|| format!("Model answer for {} is not valid JSON", posting_id))?;
    let Value::Object(map) = value else {
        bail!("Model answer for {} is not a JSON object", posting_id);
    };

    let mut mentions = Vec::new();
    for (key, category) in RESPONSE_KEYS {
        let Some(items) = map.get(key).and_then(Value::as_array) else {
            debug!("{}: no {} in answer", posting_id, key);
            continue;
        };
        for item in items {
            match item.as_str() {
                Some(text) if !text.trim().is_empty() => {
                    mentions.push(SkillMention::new(text, category, posting_id));
                }
                Some(_) => {}
                None => debug!("{}: skipping non-string entry {} in {}", posting_id, item, key),
            }
        }
    }
    Ok(mentions)
}
