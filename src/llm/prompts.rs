//! Prompt templates for skill extraction.

use crate::extract::JobPosting;

pub const EXTRACTION_SYSTEM_PROMPT: &str = "You are an expert HR analyst specializing in \
extracting skills from job descriptions. Always return valid JSON.";

/// Build the user prompt asking for the four skill categories of one posting.
///
/// `description` is passed separately so callers can truncate it first.
pub fn skill_extraction_prompt(posting: &JobPosting, description: &str) -> String {
    format!(
        r#"Analyze the following job posting and extract all skills mentioned.
Categorize them into:
1. Technical Skills (programming languages, frameworks, tools, technologies)
2. Soft Skills (communication, leadership, teamwork, etc.)
3. Domain Knowledge (industry-specific knowledge, certifications)
4. Tools & Platforms (software, cloud platforms, databases)

Job Posting:
Job Title: {title}
Company: {company}
Description: {description}

Return the result as a JSON object with the following structure:
{{
  "technical_skills": ["skill1", "skill2", ...],
  "soft_skills": ["skill1", "skill2", ...],
  "domain_knowledge": ["knowledge1", "knowledge2", ...],
  "tools_platforms": ["tool1", "tool2", ...]
}}

List each skill once, as a short name (e.g. "Python", not "strong Python experience").
Only return the JSON object, no additional text.
"#,
        title = posting.title,
        company = posting.company,
        description = description,
    )
}
