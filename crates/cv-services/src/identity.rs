//! # Identity Context
//!
//! Tracks the single logged-in actor of the session. There is no credential
//! check: the name is accepted as given and the role is taken at face value.

use std::sync::Arc;

use cv_core::{Actor, KeyValueStore, Role};
use tracing::info;

use crate::binding::{Binding, Subscription};

pub const SESSION_KEY: &str = "civitas-user";

/// Where the presentation layer should go after a login or logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    Home,
    Dashboard,
    AdminDashboard,
}

impl Landing {
    pub fn path(&self) -> &'static str {
        match self {
            Landing::Home => "/",
            Landing::Dashboard => "/dashboard",
            Landing::AdminDashboard => "/admin/dashboard",
        }
    }
}

pub struct IdentityContext {
    session: Binding<Option<Actor>>,
}

impl IdentityContext {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            session: Binding::new(backend, SESSION_KEY, None),
        }
    }

    pub fn current(&self) -> Option<Actor> {
        self.session.get().as_ref().clone()
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.session.get().as_ref(), Some(Actor { role: Role::Admin, .. }))
    }

    pub fn login(&self, name: impl Into<String>, role: Role) -> Landing {
        let actor = Actor {
            name: name.into(),
            role,
        };
        info!(name = %actor.name, role = %actor.role, "actor logged in");
        self.session.set(Some(actor));
        match role {
            Role::Admin => Landing::AdminDashboard,
            Role::User => Landing::Dashboard,
        }
    }

    pub fn logout(&self) -> Landing {
        self.session.set(None);
        Landing::Home
    }

    pub fn subscribe(&self, listener: impl Fn(&Option<Actor>) + Send + Sync + 'static) -> Subscription {
        self.session.subscribe(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_core::MemoryStore;

    #[test]
    fn test_login_routes_by_role() {
        let identity = IdentityContext::new(Arc::new(MemoryStore::new()));
        assert_eq!(identity.login("Ravi", Role::User), Landing::Dashboard);
        assert!(!identity.is_admin());
        assert_eq!(identity.login("Meera", Role::Admin).path(), "/admin/dashboard");
        assert!(identity.is_admin());
        assert_eq!(identity.current().map(|a| a.name).as_deref(), Some("Meera"));
    }

    #[test]
    fn test_logout_clears_session() {
        let backend = Arc::new(MemoryStore::new());
        let identity = IdentityContext::new(backend.clone());
        identity.login("Ravi", Role::User);
        assert_eq!(identity.logout(), Landing::Home);
        assert_eq!(identity.current(), None);
        assert_eq!(backend.get_item(SESSION_KEY).unwrap().as_deref(), Some("null"));
    }

    #[test]
    fn test_session_survives_reopen() {
        let backend = Arc::new(MemoryStore::new());
        IdentityContext::new(backend.clone()).login("Ravi", Role::User);

        let reopened = IdentityContext::new(backend);
        assert_eq!(
            reopened.current(),
            Some(Actor {
                name: "Ravi".into(),
                role: Role::User
            })
        );
    }
}
