//! Authentication error types.

use thiserror::Error;

use super::validation::{Field, FieldErrors};

/// Errors that can occur during sign-in and sign-up.
///
/// Every variant is shown next to a form field; none of them is fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// One or more fields failed validation.
    #[error("invalid form input")]
    Validation(FieldErrors),

    /// Sign-up email is already in the registry.
    #[error("An account with this email already exists")]
    EmailTaken,

    /// Sign-in email is not in the registry.
    #[error("No account found with this email")]
    UnknownEmail,

    /// Sign-in password does not match the registry.
    #[error("Incorrect password")]
    WrongPassword,
}

impl AuthError {
    /// The field messages to show for this error.
    #[must_use]
    pub fn field_errors(&self) -> FieldErrors {
        match self {
            Self::Validation(errors) => errors.clone(),
            Self::EmailTaken | Self::UnknownEmail => {
                FieldErrors::single(Field::Email, self.to_string())
            }
            Self::WrongPassword => FieldErrors::single(Field::Password, self.to_string()),
        }
    }
}
