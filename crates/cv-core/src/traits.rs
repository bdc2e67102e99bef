//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use serde::Serialize;

use crate::models::GeneratedMedia;

/// Durable string slots addressed by key, in the manner of a browser's
/// local storage. Writes are last-writer-wins with no locking.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when the slot has never been written.
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// A prompt paired with the JSON schema the answer must follow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredPrompt {
    pub prompt: String,
    pub schema: serde_json::Value,
}

/// Text model contract used by the categorize and summarize flows.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the model's structured answer, or `None` if it produced nothing.
    async fn generate_json(
        &self,
        request: &StructuredPrompt,
    ) -> anyhow::Result<Option<serde_json::Value>>;
}

/// Image model contract used by the medal flow.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Returns `None` when the model answered without any media.
    async fn generate_image(&self, prompt: &str) -> anyhow::Result<Option<GeneratedMedia>>;
}

/// User-visible transient notifications (the "toast").
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, description: &str);
}

/// Notifier that drops everything. Handy for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _title: &str, _description: &str) {}
}
