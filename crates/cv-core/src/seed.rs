//! Fixed default dataset loaded when durable storage is empty.

use chrono::{DateTime, Duration, Utc};

use crate::models::{Category, Issue, Status, User};

pub fn initial_users() -> Vec<User> {
    [
        (1, "Krrish Shaw", 5),
        (2, "Rishu Singh", 4),
        (3, "Ankan Ghosh", 3),
        (4, "Rahul Verma", 2),
        (5, "Aman Yadav", 1),
    ]
    .into_iter()
    .map(|(id, name, points)| User {
        id,
        name: name.to_string(),
        points,
    })
    .collect()
}

/// Seed issues, timestamped relative to `now` (three, two and one days back).
pub fn initial_issues(now: DateTime<Utc>) -> Vec<Issue> {
    vec![
        Issue {
            id: "issue-1".to_string(),
            title: "Pothole on MG Road, Kolkata".to_string(),
            description: "A large pothole near the main intersection is causing traffic issues."
                .to_string(),
            location: "MG Road, Kolkata".to_string(),
            category: Category::Pothole,
            status: Status::Pending,
            reporter_name: "Rahul Verma".to_string(),
            created_at: now - Duration::days(3),
        },
        Issue {
            id: "issue-2".to_string(),
            title: "Streetlight not working in Sector 15, Noida".to_string(),
            description: "The streetlight on the corner of the park has been out for a week."
                .to_string(),
            location: "Sector 15, Noida".to_string(),
            category: Category::Streetlight,
            status: Status::Pending,
            reporter_name: "Rishu Singh".to_string(),
            created_at: now - Duration::days(2),
        },
        Issue {
            id: "issue-3".to_string(),
            title: "Garbage dump overflowing near Howrah Station".to_string(),
            description: "The public garbage bin is overflowing, creating a health hazard."
                .to_string(),
            location: "Howrah Station Area".to_string(),
            category: Category::Garbage,
            status: Status::InProgress,
            reporter_name: "Krrish Shaw".to_string(),
            created_at: now - Duration::days(1),
        },
    ]
}
