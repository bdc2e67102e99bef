//! # AI-assisted helpers
//!
//! Stateless request/response flows over the model ports. None of them touch
//! the [`DataStore`](crate::store::DataStore); callers decide what to do with
//! the results. There is no retry and no timeout at this level.

pub mod categorize;
pub mod medals;
pub mod summarize;

pub use categorize::{categorize_issue, closest_category, CategorizeIssueInput, CategorizeIssueOutput};
pub use medals::{generate_medals, GenerateMedalsInput, GenerateMedalsOutput};
pub use summarize::{summarize_issue, SummarizeIssueInput, SummarizeIssueOutput};
