//! civitas/crates/cv-core/src/lib.rs
//!
//! The domain models and interface definitions for Civitas.

pub mod error;
pub mod memory;
pub mod models;
pub mod seed;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use memory::MemoryStore;
pub use models::*;
pub use traits::*;
