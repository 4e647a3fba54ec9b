use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use tracing::debug;
use uuid::Uuid;

use super::session::SessionKeys;
use crate::error::AppError;

pub const LOGIN_PATH: &str = "/login";

/// Resolves the session user or short-circuits with a redirect to the login page.
pub fn require_user_id(keys: &SessionKeys, headers: &HeaderMap) -> Result<Uuid, AppError> {
    match keys.read_session(headers) {
        Some(user_id) => Ok(user_id),
        None => {
            debug!("no valid session; redirecting to login");
            Err(AppError::redirect(LOGIN_PATH))
        }
    }
}

/// Guarded handler argument: the id of the signed-in user.
pub struct CurrentUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        require_user_id(&keys, &parts.headers).map(CurrentUser)
    }
}
