//! # Application State Store
//!
//! Owns the `users` and `issues` collections, each persisted through its own
//! [`Binding`]. Issues are kept most-recent-first by insertion; users are kept
//! sorted by points, descending, with ties in their prior order.
//!
//! The two collections are written independently. A crash between the issue
//! write and the points write leaves them out of step; nothing reconciles that.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use cv_core::{seed, Issue, KeyValueStore, NewIssue, Notifier, Status, User};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::binding::{Binding, SlotOrigin, Subscription};
use crate::identity::IdentityContext;
use crate::stats::{self, DashboardStats, StatusCount};

pub const USERS_KEY: &str = "civitas-users";
pub const ISSUES_KEY: &str = "civitas-issues";

pub struct DataStore {
    users: Binding<Vec<User>>,
    issues: Binding<Vec<Issue>>,
    identity: Arc<IdentityContext>,
    notifier: Arc<dyn Notifier>,
}

impl DataStore {
    /// Opens both collections and seeds any that are empty, so the first read
    /// already sees populated data.
    pub fn open(
        backend: Arc<dyn KeyValueStore>,
        identity: Arc<IdentityContext>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let store = Self {
            users: Binding::new(backend.clone(), USERS_KEY, Vec::new()),
            issues: Binding::new(backend, ISSUES_KEY, Vec::new()),
            identity,
            notifier,
        };
        store.seed_if_empty(Utc::now());
        store
    }

    fn seed_if_empty(&self, now: DateTime<Utc>) {
        seed_slot(&self.users, USERS_KEY, seed::initial_users());
        seed_slot(&self.issues, ISSUES_KEY, seed::initial_issues(now));
    }

    /// Users ordered by points, highest first.
    pub fn users(&self) -> Arc<Vec<User>> {
        self.users.get()
    }

    /// Issues ordered most recent first.
    pub fn issues(&self) -> Arc<Vec<Issue>> {
        self.issues.get()
    }

    pub fn identity(&self) -> &IdentityContext {
        &self.identity
    }

    /// Files a new issue under the current actor and credits them one point.
    ///
    /// Returns `None` without touching either collection when nobody is
    /// logged in.
    pub fn add_issue(&self, data: NewIssue) -> Option<Issue> {
        let Some(actor) = self.identity.current() else {
            debug!("add_issue ignored: no actor");
            return None;
        };

        let issue = Issue {
            id: format!("issue-{}", Uuid::now_v7()),
            title: data.title,
            description: data.description,
            location: data.location,
            category: data.category,
            status: Status::Pending,
            reporter_name: actor.name.clone(),
            created_at: Utc::now(),
        };

        self.issues.update(|prev| {
            let mut next = Vec::with_capacity(prev.len() + 1);
            next.push(issue.clone());
            next.extend(prev.iter().cloned());
            next
        });

        self.users.update(|prev| credit_reporter(prev, &actor.name));

        debug!(id = %issue.id, reporter = %issue.reporter_name, "issue added");
        self.notifier.notify("Success!", "Issue reported successfully.");
        Some(issue)
    }

    /// Sets the status of the issue with `issue_id`. Any transition is allowed.
    ///
    /// Returns `false`, leaving storage untouched, when no issue matches.
    pub fn update_issue_status(&self, issue_id: &str, status: Status) -> bool {
        let updated = self.issues.try_update(|prev| {
            let pos = prev.iter().position(|i| i.id == issue_id)?;
            let mut next = prev.clone();
            next[pos].status = status;
            Some(next)
        });
        if updated {
            debug!(id = issue_id, status = %status, "issue status updated");
        } else {
            debug!(id = issue_id, "update_issue_status ignored: unknown id");
        }
        updated
    }

    pub fn issue(&self, issue_id: &str) -> Option<Issue> {
        self.issues.get().iter().find(|i| i.id == issue_id).cloned()
    }

    pub fn reports_by(&self, reporter: &str) -> Vec<Issue> {
        stats::reports_by(&self.issues.get(), reporter)
    }

    /// Issues filed by the current actor; empty when logged out.
    pub fn my_reports(&self) -> Vec<Issue> {
        match self.identity.current() {
            Some(actor) => self.reports_by(&actor.name),
            None => Vec::new(),
        }
    }

    pub fn dashboard_stats(&self) -> DashboardStats {
        stats::dashboard(&self.issues.get())
    }

    pub fn status_breakdown(&self) -> Vec<StatusCount> {
        stats::status_breakdown(&self.issues.get())
    }

    pub fn top_users(&self, n: usize) -> Vec<User> {
        stats::top_users(&self.users.get(), n)
    }

    pub fn subscribe_users(&self, listener: impl Fn(&Vec<User>) + Send + Sync + 'static) -> Subscription {
        self.users.subscribe(listener)
    }

    pub fn subscribe_issues(
        &self,
        listener: impl Fn(&Vec<Issue>) + Send + Sync + 'static,
    ) -> Subscription {
        self.issues.subscribe(listener)
    }
}

/// Adds a point to `name` (creating the user at one point if absent) and
/// re-sorts by points. `sort_by` is stable, so ties keep their order.
fn credit_reporter(users: &[User], name: &str) -> Vec<User> {
    let mut next = users.to_vec();
    match next.iter_mut().find(|u| u.name == name) {
        Some(user) => user.points += 1,
        None => {
            let id = next.iter().map(|u| u.id).max().unwrap_or(0) + 1;
            next.push(User {
                id,
                name: name.to_string(),
                points: 1,
            });
        }
    }
    next.sort_by(|a, b| b.points.cmp(&a.points));
    next
}

/// Writes `seed` when the slot is absent or holds an empty collection. An
/// unreadable slot only gets the seed in memory; its stored text stays put
/// until the next real write.
fn seed_slot<T>(binding: &Binding<Vec<T>>, key: &str, seed: Vec<T>)
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    match binding.origin() {
        SlotOrigin::Stored if !binding.get().is_empty() => {}
        SlotOrigin::Unreadable => {
            warn!(key, "slot unreadable, serving seed data without persisting it");
            binding.serve(seed);
        }
        _ => {
            info!(key, "seeding");
            binding.set(seed);
        }
    }
}
