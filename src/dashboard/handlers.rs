use axum::{
    extract::{rejection::QueryRejection, FromRef, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Router,
};
use rand::seq::SliceRandom;
use tera::Context;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::dto::{DashboardQuery, ProfileForm, ProfileView, Stat, Tab, TabLink};
use crate::{
    auth::{
        extractors::{require_user_id, CurrentUser},
        session::SessionKeys,
    },
    error::{found, AppError},
    state::AppState,
};

pub const DASHBOARD_PATH: &str = "/dashboard";

const QUOTES: [&str; 5] = [
    "The only way to do great work is to love what you do.",
    "Innovation distinguishes between a leader and a follower.",
    "Stay hungry, stay foolish.",
    "Code is like humor. When you have to explain it, it's bad.",
    "First, solve the problem. Then, write the code.",
];

const STATS: [Stat; 3] = [
    Stat {
        label: "Login Streak",
        value: "1 day",
    },
    Stat {
        label: "Profile Views",
        value: "0",
    },
    Stat {
        label: "Achievement Points",
        value: "100",
    },
];

enum Notice {
    None,
    Success,
    Failure(&'static str),
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route(DASHBOARD_PATH, get(dashboard).post(update_profile))
}

pub async fn index() -> Response {
    found(DASHBOARD_PATH)
}

/// Profile of `user_id`; a missing row is `NotFound`.
async fn find_profile(state: &AppState, user_id: Uuid) -> Result<ProfileView, AppError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| {
            warn!(%user_id, "session user missing");
            AppError::NotFound
        })?;
    Ok(user.into())
}

/// Loads the signed-in user's profile. Redirects to login without a session.
pub(crate) async fn load_profile(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<ProfileView, AppError> {
    let keys = SessionKeys::from_ref(state);
    let user_id = require_user_id(&keys, headers)?;
    find_profile(state, user_id).await
}

fn render_dashboard(
    state: &AppState,
    profile: Option<ProfileView>,
    tab: Tab,
    notice: Notice,
    status: StatusCode,
) -> Result<Response, AppError> {
    let mut ctx = Context::new();
    if let Some(profile) = &profile {
        ctx.insert("user", profile);
    }
    ctx.insert("tab", tab.slug());
    ctx.insert(
        "tabs",
        &Tab::ALL.into_iter().map(TabLink::from).collect::<Vec<_>>(),
    );
    match tab {
        Tab::Activities => {
            let quote = QUOTES.choose(&mut rand::thread_rng()).copied();
            ctx.insert("quote", &quote.unwrap_or(QUOTES[0]));
        }
        Tab::Stats => ctx.insert("stats", &STATS),
        Tab::Profile => {}
    }
    match notice {
        Notice::Success => ctx.insert("success", &true),
        Notice::Failure(msg) => ctx.insert("error", msg),
        Notice::None => {}
    }

    let html = state.views.render("dashboard.html", &ctx)?;
    Ok((status, Html(html)).into_response())
}

#[instrument(skip(state, headers))]
pub async fn dashboard(
    State(state): State<AppState>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    // A malformed query string must not take precedence over the login redirect.
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let profile = load_profile(&state, &headers)
        .await
        .map_err(AppError::into_loader_error)?;
    render_dashboard(
        &state,
        Some(profile),
        Tab::from_query(query.tab.as_deref()),
        Notice::None,
        StatusCode::OK,
    )
}

fn update_failed(state: &AppState, profile: Option<ProfileView>) -> Result<Response, AppError> {
    render_dashboard(
        state,
        profile,
        Tab::Profile,
        Notice::Failure("Failed to update profile"),
        StatusCode::BAD_REQUEST,
    )
}

#[instrument(skip(state, form))]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    // Loaded before the write so a failure can still be answered with the page.
    let current = match find_profile(&state, user_id).await {
        Ok(profile) => profile,
        Err(e) => {
            error!(error = %e, %user_id, "profile update failed to load user");
            return update_failed(&state, None);
        }
    };

    let updated = match form.name.as_deref().map(str::trim) {
        // no field submitted: nothing to change
        None => {
            return render_dashboard(
                &state,
                Some(current),
                Tab::Profile,
                Notice::Success,
                StatusCode::OK,
            )
        }
        Some("") => state.users.update_name(user_id, None).await,
        Some(name) => state.users.update_name(user_id, Some(name)).await,
    };

    match updated {
        Ok(Some(user)) => {
            info!(%user_id, "profile updated");
            render_dashboard(
                &state,
                Some(user.into()),
                Tab::Profile,
                Notice::Success,
                StatusCode::OK,
            )
        }
        Ok(None) => {
            warn!(%user_id, "profile update matched no row");
            update_failed(&state, Some(current))
        }
        Err(e) => {
            error!(error = %e, %user_id, "profile update failed");
            update_failed(&state, Some(current))
        }
    }
}
