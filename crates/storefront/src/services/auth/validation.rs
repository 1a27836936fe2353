//! Sign-in and sign-up form validation.
//!
//! Fields are checked in two modes. On blur only what the visitor has typed
//! is judged, so an untouched email or password stays quiet; on submit every
//! field is required.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use pebble_core::Email;

/// Minimum password length for new accounts.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum trimmed length of a display name.
pub const MIN_NAME_LENGTH: usize = 2;

/// Symbols allowed in a password besides ASCII letters and digits.
const PASSWORD_SYMBOLS: &str = "@$!%*?&";

pub const EMAIL_REQUIRED: &str = "Email is required";
pub const EMAIL_INVALID: &str = "Please enter a valid email address";
pub const PASSWORD_REQUIRED: &str = "Password is required";
pub const PASSWORD_POLICY: &str =
    "Password must be at least 8 characters with uppercase, lowercase, and a number";
pub const NAME_TOO_SHORT: &str = "Name must be at least 2 characters";
pub const CONFIRM_REQUIRED: &str = "Please confirm your password";
pub const CONFIRM_MISMATCH: &str = "Passwords do not match";

/// When a field is being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The visitor left the field.
    Blur,
    /// The form was submitted.
    Submit,
}

/// A form field that can carry an error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Email,
    Password,
    Confirm,
}

impl Field {
    /// Form field name, also used in element ids.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Password => "password",
            Self::Confirm => "confirm",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unknown field name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown form field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "password" => Ok(Self::Password),
            "confirm" => Ok(Self::Confirm),
            other => Err(UnknownField(other.to_string())),
        }
    }
}

/// Field-level error messages for one form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A single error on `field`.
    #[must_use]
    pub fn single(field: Field, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.insert(field, message);
        errors
    }

    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    /// Record `message` on `field` if present.
    fn check(&mut self, field: Field, message: Option<&str>) {
        if let Some(message) = message {
            self.insert(field, message);
        }
    }

    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

/// Submitted sign-in form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Submitted sign-up form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm: String,
}

/// Check an email field.
#[must_use]
pub fn email_error(raw: &str, mode: Mode) -> Option<&'static str> {
    let email = raw.trim();
    if email.is_empty() {
        return (mode == Mode::Submit).then_some(EMAIL_REQUIRED);
    }
    Email::parse(email).err().map(|_| EMAIL_INVALID)
}

/// Check a sign-in password, which only has to be present.
#[must_use]
pub fn login_password_error(raw: &str, mode: Mode) -> Option<&'static str> {
    (raw.is_empty() && mode == Mode::Submit).then_some(PASSWORD_REQUIRED)
}

/// Check a new-account password against the password policy.
#[must_use]
pub fn signup_password_error(raw: &str, mode: Mode) -> Option<&'static str> {
    if raw.is_empty() {
        return (mode == Mode::Submit).then_some(PASSWORD_REQUIRED);
    }
    (!meets_password_policy(raw)).then_some(PASSWORD_POLICY)
}

/// Check a display name. Blank names are reported on blur too.
#[must_use]
pub fn name_error(raw: &str) -> Option<&'static str> {
    (raw.trim().chars().count() < MIN_NAME_LENGTH).then_some(NAME_TOO_SHORT)
}

/// Check the confirmation field. An empty confirmation is reported on blur too.
#[must_use]
pub fn confirm_error(password: &str, confirm: &str) -> Option<&'static str> {
    if confirm.is_empty() {
        Some(CONFIRM_REQUIRED)
    } else if confirm != password {
        Some(CONFIRM_MISMATCH)
    } else {
        None
    }
}

/// Whether `password` satisfies the account password policy.
///
/// At least [`MIN_PASSWORD_LENGTH`] characters drawn from ASCII letters,
/// digits and `@$!%*?&`, with at least one lowercase letter, one uppercase
/// letter and one digit.
#[must_use]
pub fn meets_password_policy(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
        && password
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c))
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

impl LoginForm {
    /// Validate every field for submission.
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.check(Field::Email, email_error(&self.email, Mode::Submit));
        errors.check(
            Field::Password,
            login_password_error(&self.password, Mode::Submit),
        );
        errors
    }

    /// Validate the field the visitor just left.
    #[must_use]
    pub fn validate_field(&self, field: Field) -> Option<&'static str> {
        match field {
            Field::Email => email_error(&self.email, Mode::Blur),
            Field::Password => login_password_error(&self.password, Mode::Blur),
            Field::Name | Field::Confirm => None,
        }
    }
}

impl SignupForm {
    /// Validate every field for submission.
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.check(Field::Name, name_error(&self.name));
        errors.check(Field::Email, email_error(&self.email, Mode::Submit));
        errors.check(
            Field::Password,
            signup_password_error(&self.password, Mode::Submit),
        );
        errors.check(Field::Confirm, confirm_error(&self.password, &self.confirm));
        errors
    }

    /// Validate the field the visitor just left.
    #[must_use]
    pub fn validate_field(&self, field: Field) -> Option<&'static str> {
        match field {
            Field::Name => name_error(&self.name),
            Field::Email => email_error(&self.email, Mode::Blur),
            Field::Password => signup_password_error(&self.password, Mode::Blur),
            Field::Confirm => confirm_error(&self.password, &self.confirm),
        }
    }
}

/// Strength shown under the sign-up password field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordStrength {
    Weak,
    Fair,
    Strong,
}

impl PasswordStrength {
    /// Rate `password`; `None` hides the indicator.
    ///
    /// Under 8 characters is weak and 12 or more is strong. In between a
    /// password is fair unless it already satisfies the policy.
    #[must_use]
    pub fn rate(password: &str) -> Option<Self> {
        let length = password.chars().count();
        if length == 0 {
            None
        } else if length < MIN_PASSWORD_LENGTH {
            Some(Self::Weak)
        } else if length < 12 && !meets_password_policy(password) {
            Some(Self::Fair)
        } else {
            Some(Self::Strong)
        }
    }

    /// CSS modifier for the strength bar.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Weak => "weak",
            Self::Fair => "fair",
            Self::Strong => "strong",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Weak => "Password strength: Weak",
            Self::Fair => "Password strength: Fair",
            Self::Strong => "Password strength: Strong",
        }
    }
}
