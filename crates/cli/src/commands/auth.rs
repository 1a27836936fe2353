//! Account commands.

use pebble_storefront::clock::SystemClock;
use pebble_storefront::services::auth::{AuthError, AuthService, LoginForm, SignupForm};
use pebble_storefront::storage::KeyValueStore;

use super::{CommandError, emit};

/// Create an account and sign it in.
pub fn signup(
    store: &dyn KeyValueStore,
    name: String,
    email: String,
    password: String,
    confirm: String,
) -> Result<(), CommandError> {
    let form = SignupForm {
        name,
        email,
        password,
        confirm,
    };
    let success = AuthService::new(store, &SystemClock)
        .signup(&form)
        .map_err(rejected)?;
    emit(success.message);
    Ok(())
}

/// Sign in an existing account.
pub fn login(store: &dyn KeyValueStore, email: String, password: String) -> Result<(), CommandError> {
    let form = LoginForm { email, password };
    let success = AuthService::new(store, &SystemClock)
        .login(&form)
        .map_err(rejected)?;
    emit(success.message);
    Ok(())
}

/// Sign out.
pub fn logout(store: &dyn KeyValueStore) {
    AuthService::new(store, &SystemClock).logout();
    emit("Signed out");
}

/// Show the signed-in account.
pub fn whoami(store: &dyn KeyValueStore) {
    match AuthService::new(store, &SystemClock).current_user() {
        Some(user) => emit(format!("{} <{}>", user.name, user.email)),
        None => emit("Not signed in"),
    }
}

/// Flatten the per-field messages into one error.
fn rejected(error: AuthError) -> CommandError {
    let messages: Vec<String> = error
        .field_errors()
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect();
    CommandError::Auth(messages.join("; "))
}
