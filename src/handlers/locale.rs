use super::common::{ApiResult, JsonBody, QueryParams};
use crate::{errors::ServiceError, i18n::Locale, AppState};
use axum::{
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct MessagesParams {
    /// `en` (default) or `fr`
    pub locale: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LocaleRequest {
    #[schema(example = "fr")]
    pub locale: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LocaleResponse {
    pub locale: Locale,
}

#[utoipa::path(
    get,
    path = "/api/messages",
    summary = "UI message catalog",
    params(MessagesParams),
    responses(
        (status = 200, description = "Nested message catalog", body = Object),
        (status = 404, description = "Messages not found for locale", body = crate::errors::ErrorResponse),
    ),
    tag = "i18n"
)]
pub async fn get_messages(
    QueryParams(params): QueryParams<MessagesParams>,
) -> ApiResult<Json<Value>> {
    let locale = match params.locale.as_deref() {
        None => Locale::default(),
        Some(raw) => Locale::parse(raw).ok_or_else(|| {
            ServiceError::NotFound("Messages not found for locale".to_string())
        })?,
    };
    Ok(Json(locale.messages()?.clone()))
}

#[utoipa::path(
    post,
    path = "/api/locale",
    summary = "Remember the visitor's locale",
    request_body = LocaleRequest,
    responses(
        (status = 200, description = "Locale cookie set", body = LocaleResponse),
        (status = 400, description = "Unsupported locale", body = crate::errors::ErrorResponse),
    ),
    tag = "i18n"
)]
pub async fn set_locale(JsonBody(request): JsonBody<LocaleRequest>) -> ApiResult<impl IntoResponse> {
    let locale = request
        .locale
        .as_deref()
        .and_then(Locale::parse)
        .ok_or_else(|| ServiceError::BadRequest("Unsupported locale".to_string()))?;

    Ok((
        [(header::SET_COOKIE, locale.cookie().to_string())],
        Json(LocaleResponse { locale }),
    ))
}

pub fn locale_routes() -> Router<AppState> {
    Router::new()
        .route("/messages", get(get_messages))
        .route("/locale", post(set_locale))
}
