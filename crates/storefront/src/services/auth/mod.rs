//! Authentication service.
//!
//! Mock sign-in against the registry kept in browser storage. Accounts live
//! under `users` with plaintext passwords and the signed-in identity under
//! `currentUser`; nothing is verified server-side beyond comparing against
//! that registry.

mod error;
pub mod validation;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub use error::AuthError;
pub use validation::{Field, FieldErrors, LoginForm, PasswordStrength, SignupForm};

use tracing::info;

use pebble_core::{Email, UserId};

use crate::clock::Clock;
use crate::models::{CurrentUser, UserRecord};
use crate::storage::{KeyValueStore, StorageExt, keys};

/// Delay between hiding one auth form and showing the other.
pub const TRANSITION_DELAY: Duration = Duration::from_millis(150);

/// Which auth form is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthView {
    #[default]
    Login,
    Signup,
}

impl AuthView {
    /// The other form.
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Login => Self::Signup,
            Self::Signup => Self::Login,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Signup => "signup",
        }
    }
}

impl fmt::Display for AuthView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unknown auth view name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown auth view: {0}")]
pub struct UnknownView(pub String);

impl FromStr for AuthView {
    type Err = UnknownView;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(Self::Login),
            "signup" => Ok(Self::Signup),
            other => Err(UnknownView(other.to_string())),
        }
    }
}

/// A completed sign-in or sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSuccess {
    /// The identity now stored under `currentUser`.
    pub user: CurrentUser,
    /// Greeting to show before leaving the auth page.
    pub message: String,
}

/// Authentication operations over a browser's storage.
pub struct AuthService<'a> {
    store: &'a dyn KeyValueStore,
    clock: &'a dyn Clock,
}

impl<'a> AuthService<'a> {
    /// Create an authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn KeyValueStore, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Register a new account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if any field is invalid and
    /// `AuthError::EmailTaken` if the email is already registered (exact,
    /// case-sensitive match).
    pub fn signup(&self, form: &SignupForm) -> Result<AuthSuccess, AuthError> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }
        let email = parse_email(&form.email)?;

        let mut users = self.users();
        if users.iter().any(|u| u.email == email) {
            return Err(AuthError::EmailTaken);
        }

        let record = UserRecord {
            id: self.next_user_id(&users),
            name: form.name.trim().to_string(),
            email,
            password: form.password.clone(),
        };
        let user = record.session();
        users.push(record);

        self.store.set(keys::USERS, &users);
        self.store.set(keys::CURRENT_USER, &user);
        info!(user_id = %user.id, "account created");

        Ok(AuthSuccess {
            message: format!("Account created successfully, {}!", user.name),
            user,
        })
    }

    /// Sign in an existing account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if a field is missing or malformed,
    /// `AuthError::UnknownEmail` if no account has this email and
    /// `AuthError::WrongPassword` if the password does not match.
    pub fn login(&self, form: &LoginForm) -> Result<AuthSuccess, AuthError> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }
        let email = parse_email(&form.email)?;

        let users = self.users();
        let record = users
            .iter()
            .find(|u| u.email == email)
            .ok_or(AuthError::UnknownEmail)?;
        if record.password != form.password {
            return Err(AuthError::WrongPassword);
        }

        let user = record.session();
        self.store.set(keys::CURRENT_USER, &user);
        info!(user_id = %user.id, "signed in");

        Ok(AuthSuccess {
            message: format!("Welcome back, {}!", user.name),
            user,
        })
    }

    /// Forget the signed-in identity. The account stays registered.
    pub fn logout(&self) {
        self.store.delete(keys::CURRENT_USER);
    }

    /// The signed-in identity, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<CurrentUser> {
        self.store.get(keys::CURRENT_USER)
    }

    /// Every registered account.
    #[must_use]
    pub fn users(&self) -> Vec<UserRecord> {
        self.store.get_or_default(keys::USERS)
    }

    /// Creation time in epoch milliseconds, nudged past any existing id.
    fn next_user_id(&self, users: &[UserRecord]) -> UserId {
        let now = self.clock.now_ms();
        let newest = users.iter().map(|u| u.id.as_i64()).max().unwrap_or(i64::MIN);
        UserId::new(now.max(newest.saturating_add(1)))
    }
}

fn parse_email(raw: &str) -> Result<Email, AuthError> {
    Email::parse(raw.trim()).map_err(|_| {
        AuthError::Validation(FieldErrors::single(Field::Email, validation::EMAIL_INVALID))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::MemoryStore;

    const T: i64 = 1_700_000_000_000;

    fn signup_form(email: &str) -> SignupForm {
        SignupForm {
            name: "Ada Lovelace".to_string(),
            email: email.to_string(),
            password: "Abcdefg1".to_string(),
            confirm: "Abcdefg1".to_string(),
        }
    }

    fn login_form(email: &str, password: &str) -> LoginForm {
        LoginForm {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_signup_registers_and_signs_in() {
        let store = MemoryStore::new();
        let clock = FixedClock::new(T);
        let auth = AuthService::new(&store, &clock);

        let success = auth.signup(&signup_form(" ada@example.com ")).unwrap();

        assert_eq!(success.message, "Account created successfully, Ada Lovelace!");
        assert_eq!(success.user.id, UserId::new(T));
        assert_eq!(success.user.email.as_str(), "ada@example.com");
        assert_eq!(auth.current_user(), Some(success.user));
        assert_eq!(auth.users()[0].password, "Abcdefg1");
    }

    #[test]
    fn test_signup_existing_email_rejected() {
        let store = MemoryStore::new();
        let clock = FixedClock::new(T);
        let auth = AuthService::new(&store, &clock);
        auth.signup(&signup_form("ada@example.com")).unwrap();

        let err = auth.signup(&signup_form("ada@example.com")).unwrap_err();

        assert_eq!(err, AuthError::EmailTaken);
        assert_eq!(
            err.field_errors().get(Field::Email),
            Some("An account with this email already exists")
        );
        assert_eq!(auth.users().len(), 1);
    }

    #[test]
    fn test_email_match_is_case_sensitive() {
        let store = MemoryStore::new();
        let clock = FixedClock::new(T);
        let auth = AuthService::new(&store, &clock);
        auth.signup(&signup_form("ada@example.com")).unwrap();

        assert!(auth.signup(&signup_form("Ada@example.com")).is_ok());
        assert_eq!(auth.users().len(), 2);
        assert_ne!(auth.users()[0].id, auth.users()[1].id);
    }

    #[test]
    fn test_login_failures() {
        let store = MemoryStore::new();
        let clock = FixedClock::new(T);
        let auth = AuthService::new(&store, &clock);
        auth.signup(&signup_form("ada@example.com")).unwrap();
        auth.logout();

        let unknown = auth.login(&login_form("bob@example.com", "Abcdefg1")).unwrap_err();
        assert_eq!(
            unknown.field_errors().get(Field::Email),
            Some("No account found with this email")
        );

        let wrong = auth.login(&login_form("ada@example.com", "Abcdefg2")).unwrap_err();
        assert_eq!(
            wrong.field_errors().get(Field::Password),
            Some("Incorrect password")
        );
        assert!(auth.current_user().is_none());
    }

    #[test]
    fn test_login_success_overwrites_session() {
        let store = MemoryStore::new();
        let clock = FixedClock::new(T);
        let auth = AuthService::new(&store, &clock);
        auth.signup(&signup_form("ada@example.com")).unwrap();
        clock.advance(1);
        let mut grace = signup_form("grace@example.com");
        grace.name = "Grace".to_string();
        auth.signup(&grace).unwrap();

        let success = auth.login(&login_form("ada@example.com", "Abcdefg1")).unwrap();

        assert_eq!(success.message, "Welcome back, Ada Lovelace!");
        assert_eq!(auth.current_user().unwrap().name, "Ada Lovelace");
    }

    #[test]
    fn test_invalid_forms_do_not_touch_storage() {
        let store = MemoryStore::new();
        let clock = FixedClock::new(T);
        let auth = AuthService::new(&store, &clock);

        let mut form = signup_form("ada@example.com");
        form.password = "abcdefg1".to_string();
        form.confirm = "abcdefg1".to_string();
        let err = auth.signup(&form).unwrap_err();

        assert!(matches!(err, AuthError::Validation(_)));
        assert!(auth.users().is_empty());
        assert!(auth.current_user().is_none());
    }

    #[test]
    fn test_view_toggle() {
        assert_eq!(AuthView::Login.toggle(), AuthView::Signup);
        assert_eq!(AuthView::Signup.toggle(), AuthView::Login);
        assert_eq!("signup".parse::<AuthView>().unwrap(), AuthView::Signup);
        assert!("register".parse::<AuthView>().is_err());
    }
}
