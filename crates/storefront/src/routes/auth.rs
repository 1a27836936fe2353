//! Authentication route handlers.
//!
//! Serves the two-view auth page (sign in and sign up), blur validation and
//! the password strength meter. Accounts live in the visitor's browser
//! storage; see [`AuthService`].

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::instrument;

use crate::error::{AppError, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::routes::{PageChrome, events, is_htmx};
use crate::services::auth::{
    AuthError, AuthService, AuthSuccess, AuthView, Field, FieldErrors, LoginForm,
    PasswordStrength, SignupForm, TRANSITION_DELAY, validation::UnknownField,
};
use crate::state::AppState;
use crate::storage::BrowserStorage;

/// Where a completed sign-in goes.
pub const AFTER_AUTH_PATH: &str = "/";

/// Delay between the greeting and leaving the auth page.
pub const REDIRECT_DELAY_MS: u64 = 1000;

// =============================================================================
// View Types
// =============================================================================

/// Auth form display data for templates.
#[derive(Clone, Default)]
pub struct AuthFormView {
    pub view: AuthView,
    pub name: String,
    pub email: String,
    pub name_error: Option<String>,
    pub email_error: Option<String>,
    pub password_error: Option<String>,
    pub confirm_error: Option<String>,
    pub transition_ms: u128,
}

impl AuthFormView {
    /// An empty form for `view`.
    #[must_use]
    pub fn new(view: AuthView) -> Self {
        Self {
            view,
            transition_ms: TRANSITION_DELAY.as_millis(),
            ..Self::default()
        }
    }

    fn with_errors(mut self, errors: &FieldErrors) -> Self {
        let message = |field| errors.get(field).map(String::from);
        self.name_error = message(Field::Name);
        self.email_error = message(Field::Email);
        self.password_error = message(Field::Password);
        self.confirm_error = message(Field::Confirm);
        self
    }

    /// Whether this is the sign-up form.
    #[must_use]
    pub fn is_signup(&self) -> bool {
        self.view == AuthView::Signup
    }

    /// The view the toggle link switches to.
    #[must_use]
    pub const fn other(&self) -> AuthView {
        self.view.toggle()
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Auth page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/page.html")]
pub struct AuthPageTemplate {
    pub chrome: PageChrome,
    pub form: AuthFormView,
}

/// Auth form fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/auth_form.html")]
pub struct AuthFormTemplate {
    pub form: AuthFormView,
}

/// Field error fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/field_error.html")]
pub struct FieldErrorTemplate {
    pub field: Field,
    pub message: Option<&'static str>,
}

/// Password strength fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/strength.html")]
pub struct StrengthTemplate {
    pub strength: Option<PasswordStrength>,
}

// =============================================================================
// Form Types
// =============================================================================

/// Query parameters for the auth page.
#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    pub view: Option<String>,
}

/// Query parameters for the form toggle.
#[derive(Debug, Deserialize)]
pub struct ToggleQuery {
    pub to: Option<String>,
}

/// Every field of either form, for blur validation.
#[derive(Debug, Default, Deserialize)]
pub struct ValidateForm {
    #[serde(default)]
    pub view: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm: String,
}

/// Password strength form data.
#[derive(Debug, Deserialize)]
pub struct StrengthForm {
    #[serde(default)]
    pub password: String,
}

fn parse_view(raw: Option<&str>) -> AuthView {
    raw.and_then(|v| v.parse().ok()).unwrap_or_default()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the auth page.
#[instrument(skip(state, storage))]
pub async fn page(
    State(state): State<AppState>,
    storage: BrowserStorage,
    Query(query): Query<ViewQuery>,
) -> impl IntoResponse {
    AuthPageTemplate {
        chrome: PageChrome::load(&state, &storage),
        form: AuthFormView::new(parse_view(query.view.as_deref())),
    }
}

/// Swap to the other form (HTMX).
#[instrument]
pub async fn toggle(Query(query): Query<ToggleQuery>) -> impl IntoResponse {
    AuthFormTemplate {
        form: AuthFormView::new(parse_view(query.to.as_deref())),
    }
}

/// Sign in.
#[instrument(skip(state, storage, headers, form))]
pub async fn login(
    State(state): State<AppState>,
    storage: BrowserStorage,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let result = AuthService::new(&storage, state.clock()).login(&form);
    let view = AuthFormView {
        email: form.email.trim().to_string(),
        ..AuthFormView::new(AuthView::Login)
    };
    finish(&state, &storage, &headers, result, view).await
}

/// Create an account.
#[instrument(skip(state, storage, headers, form))]
pub async fn signup(
    State(state): State<AppState>,
    storage: BrowserStorage,
    headers: HeaderMap,
    Form(form): Form<SignupForm>,
) -> Response {
    let result = AuthService::new(&storage, state.clock()).signup(&form);
    let view = AuthFormView {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        ..AuthFormView::new(AuthView::Signup)
    };
    finish(&state, &storage, &headers, result, view).await
}

/// Complete a sign-in or sign-up attempt.
///
/// Success commits storage and either triggers the greeting and delayed
/// redirect (HTMX) or redirects at once. Failure re-renders the form with the
/// entered name and email and the field messages.
async fn finish(
    state: &AppState,
    storage: &BrowserStorage,
    headers: &HeaderMap,
    result: Result<AuthSuccess, AuthError>,
    view: AuthFormView,
) -> Response {
    match result {
        Ok(success) => {
            storage.commit().await;
            set_sentry_user(&success.user.id, Some(success.user.email.as_str()));
            add_breadcrumb("auth", &format!("{} complete", view.view), None);

            if !is_htmx(headers) {
                return Redirect::to(AFTER_AUTH_PATH).into_response();
            }
            let mut trigger = Map::new();
            trigger.insert(events::SHOW_TOAST.to_string(), json!(success.message));
            trigger.insert(
                events::AUTH_COMPLETE.to_string(),
                json!({ "redirect": AFTER_AUTH_PATH, "delayMs": REDIRECT_DELAY_MS }),
            );
            let trigger = Value::Object(trigger).to_string();
            (AppendHeaders([("HX-Trigger", trigger)]), "").into_response()
        }
        Err(e) => {
            tracing::info!(error = %e, view = %view.view, "auth attempt rejected");
            let form = view.with_errors(&e.field_errors());
            if is_htmx(headers) {
                AuthFormTemplate { form }.into_response()
            } else {
                AuthPageTemplate {
                    chrome: PageChrome::load(state, storage),
                    form,
                }
                .into_response()
            }
        }
    }
}

/// Validate the field the visitor just left (HTMX).
#[instrument(skip(form))]
pub async fn validate(
    Path(field): Path<String>,
    Form(form): Form<ValidateForm>,
) -> Result<FieldErrorTemplate, AppError> {
    let field: Field = field
        .parse()
        .map_err(|e: UnknownField| AppError::NotFound(e.to_string()))?;

    let message = match parse_view(form.view.as_deref()) {
        AuthView::Login => LoginForm {
            email: form.email,
            password: form.password,
        }
        .validate_field(field),
        AuthView::Signup => SignupForm {
            name: form.name,
            email: form.email,
            password: form.password,
            confirm: form.confirm,
        }
        .validate_field(field),
    };

    Ok(FieldErrorTemplate { field, message })
}

/// Rate the sign-up password (HTMX).
#[instrument(skip(form))]
pub async fn strength(Form(form): Form<StrengthForm>) -> impl IntoResponse {
    StrengthTemplate {
        strength: PasswordStrength::rate(&form.password),
    }
}

/// Sign out.
#[instrument(skip(state, storage, headers))]
pub async fn logout(
    State(state): State<AppState>,
    storage: BrowserStorage,
    headers: HeaderMap,
) -> Response {
    AuthService::new(&storage, state.clock()).logout();
    storage.commit().await;
    clear_sentry_user();

    if is_htmx(&headers) {
        (AppendHeaders([("HX-Redirect", AFTER_AUTH_PATH)]), "").into_response()
    } else {
        Redirect::to(AFTER_AUTH_PATH).into_response()
    }
}
