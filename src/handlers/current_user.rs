//! Extractor resolving the authenticated user id for a request.

use crate::{errors::AppError, services::auth::resolve_user_id, state::AppState};
use axum::{extract::FromRequestParts, http::request::Parts};

/// The user id of the authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let attributes = state.auth.authenticate(&parts.headers)?;
        let user_id = resolve_user_id(&attributes, &state.settings.userid_attr)?;
        Ok(CurrentUser(user_id))
    }
}
