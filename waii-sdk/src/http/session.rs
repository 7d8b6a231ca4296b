//! # Session State
//!
//! A [`SessionContext`] carries the identity fields injected into every
//! request body or header: the active connection scope, organization and
//! user ids, and an optional impersonation id. The context is shared by all
//! feature modules built from one client; a setter called through any of
//! them is visible to the rest immediately.
//!
//! Impersonation is scoped: [`SessionContext::impersonate`] returns a guard
//! that restores the previous (empty) id when dropped, so the id cannot leak
//! past a panic or an early return.
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A point-in-time copy of the session identity, taken under one lock
/// acquisition so a single request sees a consistent view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub scope: String,
    pub org_id: String,
    pub user_id: String,
    pub impersonate_user_id: String,
}

/// Mutable identity shared across every module holding the same client.
#[derive(Debug, Default)]
pub struct SessionContext {
    state: RwLock<SessionSnapshot>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(&self) -> String {
        self.read().scope.clone()
    }

    pub fn set_scope(&self, scope: impl Into<String>) {
        self.write().scope = scope.into();
    }

    pub fn org_id(&self) -> String {
        self.read().org_id.clone()
    }

    pub fn set_org_id(&self, org_id: impl Into<String>) {
        self.write().org_id = org_id.into();
    }

    pub fn user_id(&self) -> String {
        self.read().user_id.clone()
    }

    pub fn set_user_id(&self, user_id: impl Into<String>) {
        self.write().user_id = user_id.into();
    }

    pub fn impersonate_user_id(&self) -> String {
        self.read().impersonate_user_id.clone()
    }

    pub fn set_impersonate_user_id(&self, user_id: impl Into<String>) {
        self.write().impersonate_user_id = user_id.into();
    }

    pub fn clear_impersonation(&self) {
        self.write().impersonate_user_id.clear();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.read().clone()
    }

    /// Sets the impersonation id for the lifetime of the returned guard.
    pub fn impersonate(&self, user_id: impl Into<String>) -> ImpersonationGuard<'_> {
        self.set_impersonate_user_id(user_id);
        ImpersonationGuard { session: self }
    }

    /// Runs `body` with the impersonation id set, clearing it on every exit
    /// path: normal return, early return and unwind alike.
    pub fn with_impersonation<T>(&self, user_id: impl Into<String>, body: impl FnOnce() -> T) -> T {
        let _guard = self.impersonate(user_id);
        body()
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionSnapshot> {
        // The lock only guards plain strings; recover from poisoning so the
        // impersonation guard can still clear the id mid-unwind.
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionSnapshot> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the session's impersonation id when dropped.
#[must_use = "dropping the guard immediately ends the impersonation"]
pub struct ImpersonationGuard<'a> {
    session: &'a SessionContext,
}

impl Drop for ImpersonationGuard<'_> {
    fn drop(&mut self) {
        self.session.clear_impersonation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_overwrite_and_getters_clone() {
        let session = SessionContext::new();
        assert_eq!(session.scope(), "");

        session.set_scope("snowflake://u@a/db");
        session.set_org_id("org-1");
        session.set_user_id("user-1");

        let snapshot = session.snapshot();
        assert_eq!(snapshot.scope, "snowflake://u@a/db");
        assert_eq!(snapshot.org_id, "org-1");
        assert_eq!(snapshot.user_id, "user-1");
        assert_eq!(snapshot.impersonate_user_id, "");
    }

    #[test]
    fn impersonation_cleared_on_normal_exit() {
        let session = SessionContext::new();
        let seen = session.with_impersonation("alice", || session.impersonate_user_id());
        assert_eq!(seen, "alice");
        assert_eq!(session.impersonate_user_id(), "");
    }

    #[test]
    fn impersonation_cleared_on_early_return() {
        fn body(session: &SessionContext, bail: bool) -> Option<String> {
            session.with_impersonation("bob", || {
                if bail {
                    return None;
                }
                Some(session.impersonate_user_id())
            })
        }

        let session = SessionContext::new();
        assert_eq!(body(&session, true), None);
        assert_eq!(session.impersonate_user_id(), "");
    }

    #[test]
    fn impersonation_cleared_on_panic() {
        let session = SessionContext::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            session.with_impersonation("carol", || panic!("boom"))
        }));
        assert!(result.is_err());
        assert_eq!(session.impersonate_user_id(), "");
    }

    #[test]
    fn guard_scopes_nest_back_to_empty() {
        let session = SessionContext::new();
        {
            let _guard = session.impersonate("dave");
            assert_eq!(session.impersonate_user_id(), "dave");
        }
        assert_eq!(session.impersonate_user_id(), "");
    }
}
