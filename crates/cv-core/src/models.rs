//! # Domain Models
//!
//! These structs represent the core entities of Civitas.
//! The serialized form is the durable storage format, so field names and
//! enum spellings are part of the on-disk contract.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A participant on the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    /// Unique in practice; issues reference users by this value.
    pub name: String,
    /// Incremented once per successfully reported issue.
    pub points: u32,
}

/// The closed set of issue categories, in enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Pothole,
    Garbage,
    Streetlight,
    Water,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Pothole,
        Category::Garbage,
        Category::Streetlight,
        Category::Water,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Pothole => "Pothole",
            Category::Garbage => "Garbage",
            Category::Streetlight => "Streetlight",
            Category::Water => "Water",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AppError::Validation(format!("unknown category '{wanted}'")))
    }
}

/// Lifecycle tag of an issue. Any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Pending,
    #[serde(rename = "In-Progress")]
    InProgress,
    Resolved,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Pending, Status::InProgress, Status::Resolved];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::InProgress => "In-Progress",
            Status::Resolved => "Resolved",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = AppError;

    /// Accepts the canonical spelling as well as `in_progress` / `inprogress`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();
        Status::ALL
            .into_iter()
            .find(|st| st.as_str().replace('-', "").eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| AppError::Validation(format!("unknown status '{}'", s.trim())))
    }
}

/// A single reported civic problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: Category,
    pub status: Status,
    /// Matches a `User::name` by value; no referential check is made.
    pub reporter_name: String,
    /// Set once at creation and never rewritten.
    pub created_at: DateTime<Utc>,
}

/// The caller-supplied part of a new issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIssue {
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Admin => f.write_str("admin"),
        }
    }
}

/// The logged-in actor of the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub role: Role,
}

/// Raw media returned by an image generation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMedia {
    pub content_type: mime::Mime,
    pub data: Bytes,
}

impl GeneratedMedia {
    /// Encodes the media as a `data:` URI suitable for an `<img src>`.
    pub fn to_data_uri(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.data);
        format!("data:{};base64,{}", self.content_type.essence_str(), encoded)
    }
}
