use super::common::{ApiResult, JsonBody, SuccessResponse};
use crate::{
    auth::{AuthError, AuthUser},
    errors::ServiceError,
    AppState,
};
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignInRequest {
    #[schema(example = "admin@example.com")]
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub user: AuthUser,
    pub expires_at: DateTime<Utc>,
    /// Same value as the session cookie, for clients that send a bearer header
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/signin",
    summary = "Sign in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Session issued and cookie set", body = SignInResponse),
        (status = 400, description = "Email or password missing", body = crate::errors::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn sign_in(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SignInRequest>,
) -> ApiResult<impl IntoResponse> {
    let (Some(email), Some(password)) = (request.email, request.password) else {
        return Err(ServiceError::ValidationError(
            "Email and password are required".to_string(),
        ));
    };

    let user = state
        .auth
        .authenticate(&email, &password)
        .await
        .map_err(|err| {
            warn!("sign-in rejected");
            ServiceError::from(err)
        })?;
    let session = state.auth.issue_session(&user)?;
    info!(user_id = %user.id, "session issued");

    let cookie = state.auth.session_cookie(&session).to_string();
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(SignInResponse {
            user: AuthUser::from(&user),
            expires_at: session.expires_at,
            token: session.token,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/signout",
    summary = "Sign out",
    responses((status = 200, description = "Session cookie cleared", body = SuccessResponse)),
    tag = "auth"
)]
pub async fn sign_out(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = state.auth.cleared_session_cookie().to_string();
    ([(header::SET_COOKIE, cookie)], SuccessResponse::ok())
}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    summary = "Current session",
    responses(
        (status = 200, description = "Signed-in user", body = AuthUser),
        (status = 401, description = "No valid session", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn current_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AuthUser>, AuthError> {
    Ok(Json(state.auth.user_from_headers(&headers)?))
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signin", post(sign_in))
        .route("/signout", post(sign_out))
        .route("/session", get(current_session))
}
