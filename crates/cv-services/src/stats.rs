//! Read-side reports over the issue and user collections: the admin
//! dashboard counters, the analytics breakdown, and leaderboard slices.

use cv_core::{Issue, Status, User};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub resolved: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: Status,
    pub count: usize,
}

pub fn dashboard(issues: &[Issue]) -> DashboardStats {
    issues.iter().fold(
        DashboardStats {
            total: issues.len(),
            ..DashboardStats::default()
        },
        |mut acc, issue| {
            match issue.status {
                Status::Pending => acc.pending += 1,
                Status::InProgress => acc.in_progress += 1,
                Status::Resolved => acc.resolved += 1,
            }
            acc
        },
    )
}

/// One entry per status in enumeration order; statuses with no issues are left out.
pub fn status_breakdown(issues: &[Issue]) -> Vec<StatusCount> {
    Status::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: issues.iter().filter(|i| i.status == status).count(),
        })
        .filter(|entry| entry.count > 0)
        .collect()
}

/// The first `n` users by points, ties kept in their existing order.
pub fn top_users(users: &[User], n: usize) -> Vec<User> {
    let mut ranked = users.to_vec();
    ranked.sort_by(|a, b| b.points.cmp(&a.points));
    ranked.truncate(n);
    ranked
}

pub fn reports_by(issues: &[Issue], reporter: &str) -> Vec<Issue> {
    issues
        .iter()
        .filter(|i| i.reporter_name == reporter)
        .cloned()
        .collect()
}
