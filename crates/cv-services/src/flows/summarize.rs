//! Turns a raw description into a short title and a polished rewrite.
//! The word limit on the title is only requested in the prompt, never checked.

use cv_core::{AppError, Result, StructuredPrompt, TextGenerator};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizeIssueInput {
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeIssueOutput {
    pub title: String,
    pub summarized_description: String,
}

pub async fn summarize_issue(
    model: &dyn TextGenerator,
    input: &SummarizeIssueInput,
) -> Result<SummarizeIssueOutput> {
    let request = StructuredPrompt {
        prompt: build_prompt(&input.description),
        schema: output_schema(),
    };

    let output = model
        .generate_json(&request)
        .await
        .map_err(|e| AppError::Backend(e.to_string()))?
        .ok_or_else(|| AppError::Generation("AI did not return an output.".to_string()))?;

    serde_json::from_value(output)
        .map_err(|e| AppError::Generation(format!("unexpected summary shape: {e}")))
}

fn build_prompt(description: &str) -> String {
    format!(
        "You are an expert at summarizing civic issue reports. Your task is to take a user's raw \
         description of a problem and transform it into a clear and concise report.\n\n\
         Based on the following description, please generate:\n\
         1. A short, descriptive title (less than 10 words).\n\
         2. A polished and summarized version of the description.\n\n\
         User's Description:\n\"{description}\"\n"
    )
}

fn output_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "title": {
                "type": "string",
                "description": "A short, concise title (under 10 words) that summarizes the issue.",
            },
            "summarizedDescription": {
                "type": "string",
                "description": "A polished, well-written, and clear summary of the original issue description.",
            }
        },
        "required": ["title", "summarizedDescription"],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_core::MockTextGenerator;

    fn input() -> SummarizeIssueInput {
        SummarizeIssueInput {
            description: "there is like a huge hole in the road near my house its been there forever"
                .to_string(),
        }
    }

    #[tokio::test]
    async fn test_summary_is_passed_through() {
        let mut model = MockTextGenerator::new();
        model
            .expect_generate_json()
            .withf(|req| req.prompt.contains("huge hole") && req.schema["required"][1] == "summarizedDescription")
            .returning(|_| {
                Ok(Some(json!({
                    "title": "Large pothole near residence",
                    "summarizedDescription": "A large, long-standing pothole is present on the road.",
                })))
            });

        let out = summarize_issue(&model, &input()).await.unwrap();
        assert_eq!(out.title, "Large pothole near residence");
        assert!(out.summarized_description.starts_with("A large"));
    }

    #[tokio::test]
    async fn test_missing_output_has_no_fallback() {
        let mut model = MockTextGenerator::new();
        model.expect_generate_json().returning(|_| Ok(None));

        let err = summarize_issue(&model, &input()).await.unwrap_err();
        assert!(matches!(err, AppError::Generation(_)));
    }

    #[tokio::test]
    async fn test_incomplete_output_is_rejected() {
        let mut model = MockTextGenerator::new();
        model
            .expect_generate_json()
            .returning(|_| Ok(Some(json!({ "title": "Pothole" }))));

        let err = summarize_issue(&model, &input()).await.unwrap_err();
        assert!(matches!(err, AppError::Generation(_)));
    }
}
