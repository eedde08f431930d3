//! User account management
//!
//! This module provides `AccountManager`, which owns the identity side of the
//! ledger: registration, login by email and profile edits. It never touches
//! gold balances; those belong to the settlement engine.

use std::sync::Arc;

use tracing::info;

use super::traits::{Collection, LedgerStore};
use crate::types::{LedgerError, ProfileUpdate, User, UserId, UserRole};

/// Registration, login and profile updates
#[derive(Debug)]
pub struct AccountManager<S: LedgerStore> {
    store: Arc<S>,
}

impl<S: LedgerStore> Clone for AccountManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> AccountManager<S> {
    /// Create an account manager over a shared store
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Register a new user with role USER and an empty balance
    ///
    /// # Returns
    ///
    /// * `Ok(User)` - The registered user
    /// * `Err(LedgerError::Validation)` - Blank name or malformed email
    /// * `Err(LedgerError::AlreadyExists)` - Email already registered
    pub fn register(&self, name: &str, email: &str, phone: &str) -> Result<User, LedgerError> {
        self.create_user(name, email, phone, UserRole::User)
    }

    /// Register a user with an explicit role
    ///
    /// Used at bootstrap to seed the admin account.
    pub fn create_user(
        &self,
        name: &str,
        email: &str,
        phone: &str,
        role: UserRole,
    ) -> Result<User, LedgerError> {
        validate_name(name)?;
        if email.trim().is_empty() || !email.contains('@') {
            return Err(LedgerError::validation("email", "must be a valid email address"));
        }

        let id = self.store.next_id(Collection::Users);
        let user = self
            .store
            .insert_user(User::new(id, name, email, phone, role))?;

        info!(user = user.id, email = %user.email, role = %user.role, "User registered");
        Ok(user)
    }

    /// Find a user by email
    ///
    /// # Returns
    ///
    /// * `Ok(User)` - The matching user (case-insensitive match)
    /// * `Err(LedgerError::NotFound)` - No user with this email
    pub fn login(&self, email: &str) -> Result<User, LedgerError> {
        self.store
            .find_user_by_email(email)
            .ok_or_else(|| LedgerError::not_found("user", email.trim()))
    }

    /// Update name and/or phone
    ///
    /// # Returns
    ///
    /// * `Ok(User)` - The updated user
    /// * `Err(LedgerError::NotFound)` - Unknown user
    /// * `Err(LedgerError::Validation)` - Blank name
    pub fn update_profile(&self, user_id: UserId, update: ProfileUpdate) -> Result<User, LedgerError> {
        if let Some(name) = &update.name {
            validate_name(name)?;
        }

        let user = self.store.update_user(user_id, |user| {
            if let Some(name) = update.name {
                user.name = name.trim().to_string();
            }
            if let Some(phone) = update.phone {
                user.phone = phone.trim().to_string();
            }
            Ok(user.clone())
        })?;

        info!(user = user_id, "Profile updated");
        Ok(user)
    }

    /// Get a user by id
    pub fn get_user(&self, user_id: UserId) -> Result<User, LedgerError> {
        self.store
            .get_user(user_id)
            .ok_or_else(|| LedgerError::not_found("user", user_id))
    }

    /// All users, ordered by id
    pub fn list_users(&self) -> Vec<User> {
        self.store.list_users()
    }
}

fn validate_name(name: &str) -> Result<(), LedgerError> {
    if name.trim().is_empty() {
        return Err(LedgerError::validation("name", "must not be blank"));
    }
    Ok(())
}
