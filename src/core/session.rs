//! Session tokens
//!
//! A session maps an opaque token to a user id. The user record itself is
//! always re-read from the store, so a session can never serve a stale
//! balance.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use super::traits::LedgerStore;
use crate::types::{User, UserId};

/// Opaque session token
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generate a fresh random token
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Token as presented to clients
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// In-memory session registry
#[derive(Debug)]
pub struct SessionManager<S: LedgerStore> {
    store: Arc<S>,
    sessions: DashMap<SessionToken, UserId>,
}

impl<S: LedgerStore> SessionManager<S> {
    /// Create an empty session registry
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            sessions: DashMap::new(),
        }
    }

    /// Open a session for a user
    pub fn create_session(&self, user: &User) -> SessionToken {
        let token = SessionToken::generate();
        self.sessions.insert(token.clone(), user.id);
        debug!(user = user.id, "Session opened");
        token
    }

    /// Current state of the session's user, read fresh from the store
    ///
    /// Returns `None` for unknown or ended sessions.
    pub fn resolve_current_user(&self, token: &SessionToken) -> Option<User> {
        let user_id = self.sessions.get(token).map(|entry| *entry.value())?;
        self.store.get_user(user_id)
    }

    /// End a session; returns whether it existed
    pub fn end_session(&self, token: &SessionToken) -> bool {
        self.sessions.remove(token).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::Collection;
    use crate::core::InMemoryLedgerStore;
    use crate::types::UserRole;
    use rust_decimal::Decimal;

    fn setup() -> (Arc<InMemoryLedgerStore>, SessionManager<InMemoryLedgerStore>, User) {
        let store = Arc::new(InMemoryLedgerStore::new());
        let id = store.next_id(Collection::Users);
        let user = store
            .insert_user(User::new(id, "Alice", "alice@example.com", "1", UserRole::User))
            .unwrap();
        let sessions = SessionManager::new(Arc::clone(&store));
        (store, sessions, user)
    }

    #[test]
    fn test_create_and_resolve_session() {
        let (_store, sessions, user) = setup();

        let token = sessions.create_session(&user);

        assert_eq!(sessions.resolve_current_user(&token), Some(user));
    }

    #[test]
    fn test_resolve_reflects_latest_balance() {
        let (store, sessions, user) = setup();
        let token = sessions.create_session(&user);

        store
            .update_user(user.id, |u| {
                u.gold_balance = Decimal::new(25, 2);
                Ok(())
            })
            .unwrap();

        let current = sessions.resolve_current_user(&token).unwrap();
        assert_eq!(current.gold_balance, Decimal::new(25, 2));
    }

    #[test]
    fn test_unknown_token_resolves_to_none() {
        let (_store, sessions, _user) = setup();

        let token = SessionToken::from("not-a-session".to_string());
        assert!(sessions.resolve_current_user(&token).is_none());
    }

    #[test]
    fn test_end_session() {
        let (_store, sessions, user) = setup();
        let token = sessions.create_session(&user);

        assert!(sessions.end_session(&token));
        assert!(!sessions.end_session(&token));
        assert!(sessions.resolve_current_user(&token).is_none());
    }

    #[test]
    fn test_tokens_are_unique() {
        let (_store, sessions, user) = setup();

        let a = sessions.create_session(&user);
        let b = sessions.create_session(&user);
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }
}
