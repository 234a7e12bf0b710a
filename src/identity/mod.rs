//! User identity.
//!
//! `CurrentUser` is all the recorder needs. `LocalIdentity` is an owned,
//! in-process account registry with sign-in, sign-up, sign-out and an
//! auth-state subscription.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::observer::{Subscribers, Subscription};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub email: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
}

impl User {
    /// Builds a user whose display name is the local part of `email`.
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        let email = email.into();
        let display_name = email.split('@').next().unwrap_or_default().to_string();
        Self {
            id: id.into(),
            display_name,
            email,
            photo_url: None,
        }
    }

    /// A local profile known only by its id.
    pub fn local(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            email: String::new(),
            photo_url: None,
            id,
        }
    }
}

/// Errors surfaced by sign-in and sign-up forms.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("an account already exists for {0}")]
    UserExists(String),

    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),

    #[error("password must be at least 6 characters")]
    WeakPassword,
}

impl AuthError {
    /// Returns true if the user can fix the error by editing the form.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidEmail(_) | Self::WeakPassword)
    }
}

/// Source of the signed-in user.
pub trait CurrentUser: Send + Sync {
    fn current_user(&self) -> Option<User>;
}

struct Account {
    user: User,
    password: String,
}

/// In-process identity provider.
pub struct LocalIdentity {
    accounts: Mutex<HashMap<String, Account>>,
    current: Mutex<Option<User>>,
    // held across a state change and its delivery so subscribers see changes in order
    delivery: Mutex<()>,
    observers: Subscribers<Option<User>>,
}

impl LocalIdentity {
    /// Creates a provider with no accounts and nobody signed in.
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            delivery: Mutex::new(()),
            observers: Subscribers::new(),
        }
    }

    /// Creates a provider with `user` already signed in.
    pub fn with_signed_in(user: User) -> Self {
        let identity = Self::new();
        *lock(&identity.current) = Some(user);
        identity
    }

    /// Creates an account and signs it in.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let user = {
            let mut accounts = lock(&self.accounts);
            if accounts.contains_key(&email) {
                return Err(AuthError::UserExists(email));
            }
            let user = User::new(format!("user-{}", Uuid::new_v4()), email.clone());
            accounts.insert(
                email,
                Account {
                    user: user.clone(),
                    password: password.to_string(),
                },
            );
            user
        };

        info!(user_id = %user.id, "account created");
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    /// Signs in an existing account.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = normalize_email(email)?;
        let user = {
            let accounts = lock(&self.accounts);
            match accounts.get(&email) {
                Some(account) if account.password == password => account.user.clone(),
                _ => return Err(AuthError::InvalidCredentials),
            }
        };

        debug!(user_id = %user.id, "signed in");
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    /// Signs out. Signing out while signed out is a no-op.
    pub async fn sign_out(&self) {
        if lock(&self.current).is_some() {
            debug!("signed out");
            self.set_current(None);
        }
    }

    /// Observes auth state; `callback` receives the current user at once.
    ///
    /// Callbacks may read `current_user` but must not sign in or out.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Option<User>) + Send + Sync + 'static,
    {
        let _delivery = lock(&self.delivery);
        let current = lock(&self.current).clone();
        self.observers.subscribe(&current, callback)
    }

    fn set_current(&self, user: Option<User>) {
        let _delivery = lock(&self.delivery);
        *lock(&self.current) = user.clone();
        self.observers.notify(&user);
    }
}

impl Default for LocalIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl CurrentUser for LocalIdentity {
    fn current_user(&self) -> Option<User> {
        lock(&self.current).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|p| p.into_inner())
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(AuthError::InvalidEmail(email))
    }
}
