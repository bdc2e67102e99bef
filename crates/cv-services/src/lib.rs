//! civitas/crates/cv-services/src/lib.rs
//!
//! Application services for Civitas: the persistent bindings, the state
//! store and identity context built on them, and the AI-assisted flows.
//!
//! Everything here is constructed explicitly and passed by reference; there
//! is no global store.

pub mod binding;
pub mod flows;
pub mod identity;
pub mod stats;
pub mod store;

pub use binding::{Binding, SlotOrigin, Subscription};
pub use identity::{IdentityContext, Landing};
pub use stats::{DashboardStats, StatusCount};
pub use store::DataStore;
