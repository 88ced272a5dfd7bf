use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Deterministic stand-in used by `--dry-run` and tests.
pub struct MockLlmClient;

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if prompt.contains("extract all skills mentioned") {
            // Fenced, like many real models answer
            Ok(r#"```json
{
  "technical_skills": ["Python", "SQL", "REST APIs"],
  "soft_skills": ["Communication", "Teamwork"],
  "domain_knowledge": ["Agile"],
  "tools_platforms": ["Docker", "Git", "AWS"]
}
```"#
                .to_string())
        } else {
            Ok(r#"{"status": "mock"}"#.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_answers_extraction_prompt() {
        let client = MockLlmClient::new();
        let answer = client
            .complete("Analyze the following job posting and extract all skills mentioned.")
            .await
            .unwrap();
        assert!(answer.contains("technical_skills"));
    }

    #[tokio::test]
    async fn test_mock_fallback() {
        let answer = MockLlmClient::new().complete("hello").await.unwrap();
        assert_eq!(answer, r#"{"status": "mock"}"#);
    }
}
