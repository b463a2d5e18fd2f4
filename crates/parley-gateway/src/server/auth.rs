//! Handshake authentication
//!
//! The token comes from the `token` query parameter or an
//! `Authorization: Bearer` header and is verified before the upgrade.

use super::GatewayState;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use parley_common::{AppError, ErrorResponse};
use parley_core::User;
use serde::Deserialize;

/// Query string of `GET /gateway`
#[derive(Debug, Default, Deserialize)]
pub struct GatewayQuery {
    pub token: Option<String>,
}

/// Pick the handshake token, query parameter first
pub fn extract_token<'a>(query: &'a GatewayQuery, headers: &'a HeaderMap) -> Option<&'a str> {
    if let Some(token) = query.token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        return Some(token);
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Verify the token and load the identity it names
pub async fn authenticate(state: &GatewayState, token: Option<&str>) -> Result<User, AppError> {
    let token = token.ok_or(AppError::MissingAuth)?;

    let claims = state.jwt_service().validate_access_token(token)?;
    let user_id = claims.user_id()?;

    state
        .service_context()
        .user_repo()
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::UnknownIdentity)
}

/// A handshake refused before the upgrade
#[derive(Debug)]
pub struct HandshakeRejection(pub AppError);

impl IntoResponse for HandshakeRejection {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if self.0.is_server_error() {
            tracing::error!(error = %self.0, "Handshake failed");
        } else {
            tracing::debug!(error = %self.0, "Handshake rejected");
        }
        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}
