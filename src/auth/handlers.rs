use axum::{
    extract::{FromRef, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginForm, NewUser, RegisterForm},
        extractors::LOGIN_PATH,
        repo_types::User,
        services,
        session::SessionKeys,
    },
    error::{found, AppError},
    state::AppState,
};

const AFTER_LOGIN: &str = "/dashboard";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_page).post(register))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout_page).post(logout))
}

/// 302 to `redirect_to` carrying a fresh session cookie for `user_id`.
pub fn establish_session(
    keys: &SessionKeys,
    user_id: Uuid,
    redirect_to: &str,
) -> Result<Response, AppError> {
    let cookie = keys.issue_cookie(user_id)?;
    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, redirect_to.to_string()),
            (header::SET_COOKIE, cookie),
        ],
    )
        .into_response())
}

/// Sign the user in, or re-render `template` with the error inline.
fn finish_form(
    state: &AppState,
    template: &str,
    outcome: Result<User, AppError>,
) -> Result<Response, AppError> {
    match outcome {
        Ok(user) => establish_session(&SessionKeys::from_ref(state), user.id, AFTER_LOGIN),
        Err(e) if e.is_form_error() => {
            state
                .views
                .form_page(template, Some(&e.to_string()), e.status())
        }
        Err(e) => Err(e),
    }
}

pub async fn register_page(State(state): State<AppState>) -> Result<Response, AppError> {
    state.views.form_page("register.html", None, StatusCode::OK)
}

#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let outcome = match NewUser::try_from(form) {
        Ok(input) => services::register(state.users.as_ref(), input).await,
        Err(e) => Err(e),
    };
    finish_form(&state, "register.html", outcome)
}

pub async fn login_page(State(state): State<AppState>) -> Result<Response, AppError> {
    state.views.form_page("login.html", None, StatusCode::OK)
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let outcome = services::authenticate(state.users.as_ref(), form).await;
    finish_form(&state, "login.html", outcome)
}

#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Response {
    let keys = SessionKeys::from_ref(&state);
    info!("session cleared");
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, LOGIN_PATH.to_string()),
            (header::SET_COOKIE, keys.removal_cookie()),
        ],
    )
        .into_response()
}

pub async fn logout_page() -> Response {
    found("/")
}
