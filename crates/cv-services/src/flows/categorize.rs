//! Picks one category for a free-text description.
//!
//! The model's answer is untrusted text. It is matched back onto the
//! category enumeration, and anything unrecognisable falls back to the first
//! category. The fallback is intentional.

use cv_core::{AppError, Category, Result, StructuredPrompt, TextGenerator};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizeIssueInput {
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizeIssueOutput {
    pub category: Category,
}

/// The loose shape asked of the model.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryGuess {
    category_guess: String,
}

pub async fn categorize_issue(
    model: &dyn TextGenerator,
    input: &CategorizeIssueInput,
) -> Result<CategorizeIssueOutput> {
    let request = StructuredPrompt {
        prompt: build_prompt(&input.description),
        schema: guess_schema(),
    };

    let output = model
        .generate_json(&request)
        .await
        .map_err(|e| AppError::Backend(e.to_string()))?
        .ok_or_else(|| AppError::Generation("AI did not return an output.".to_string()))?;

    let guess: CategoryGuess = serde_json::from_value(output)
        .map_err(|e| AppError::Generation(format!("unexpected categorization shape: {e}")))?;

    let category = closest_category(&guess.category_guess);
    debug!(guess = %guess.category_guess, %category, "categorized issue");
    Ok(CategorizeIssueOutput { category })
}

/// First category, in enumeration order, whose name appears anywhere in
/// `guess` (ignoring case). Falls back to the first category.
pub fn closest_category(guess: &str) -> Category {
    let lowered = guess.to_lowercase();
    Category::ALL
        .into_iter()
        .find(|c| lowered.contains(&c.as_str().to_lowercase()))
        .unwrap_or(Category::ALL[0])
}

fn category_list() -> String {
    Category::ALL
        .iter()
        .map(|c| format!("- {c}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_prompt(description: &str) -> String {
    format!(
        "You are an expert at categorizing civic issue reports. Your task is to analyze the \
         user's description and determine the most appropriate category from the provided list.\n\n\
         Available Categories:\n{categories}\n\n\
         Based on the following description, please select the single best category.\n\n\
         User's Description:\n\"{description}\"\n",
        categories = category_list(),
    )
}

fn guess_schema() -> serde_json::Value {
    let names: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
    json!({
        "type": "object",
        "properties": {
            "categoryGuess": {
                "type": "string",
                "description": format!(
                    "The best guess for the issue category. Should be one of: {}",
                    names.join(", ")
                ),
            }
        },
        "required": ["categoryGuess"],
    })
}
