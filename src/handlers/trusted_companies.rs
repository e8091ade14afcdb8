use super::common::{ApiResult, JsonBody, SuccessResponse};
use crate::{
    auth::{AuthRouterExt, AuthService, MaybeAuthUser},
    entities::trusted_company,
    services, AppState,
};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;
use utoipa::ToSchema;

const NOT_FOUND: &str = "Trusted company not found";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrustedCompanyRequest {
    pub name: Option<String>,
    pub logo_url: Option<String>,
}

/// One listing for admins and visitors. Admin sessions see storage errors;
/// anonymous callers get an empty list instead so the homepage still renders.
#[utoipa::path(
    get,
    path = "/api/trusted-companies",
    summary = "List trusted companies",
    responses(
        (status = 200, description = "Companies, newest first", body = [trusted_company::Model]),
        (status = 500, description = "Internal server error (admin sessions only)", body = crate::errors::ErrorResponse),
    ),
    tag = "trusted-companies"
)]
pub async fn list_trusted_companies(
    State(state): State<AppState>,
    caller: MaybeAuthUser,
) -> ApiResult<Json<Vec<trusted_company::Model>>> {
    let privileged = caller.is_admin();
    match state.services.trusted_companies.list().await {
        Ok(companies) => Ok(Json(companies)),
        Err(err) if !privileged => {
            warn!(error = %err, "trusted companies unavailable, serving empty list");
            Ok(Json(Vec::new()))
        }
        Err(err) => Err(err),
    }
}

#[utoipa::path(
    get,
    path = "/api/trusted-companies/{id}",
    summary = "Get trusted company",
    params(("id" = String, Path, description = "Company id")),
    responses(
        (status = 200, description = "Company", body = trusted_company::Model),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Company not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "trusted-companies"
)]
pub async fn get_trusted_company(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<trusted_company::Model>> {
    let id = services::parse_id(&id, NOT_FOUND)?;
    Ok(Json(state.services.trusted_companies.get(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/trusted-companies",
    summary = "Add trusted company",
    request_body = TrustedCompanyRequest,
    responses(
        (status = 200, description = "Company created", body = trusted_company::Model),
        (status = 400, description = "Missing name or logo", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "trusted-companies"
)]
pub async fn create_trusted_company(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<TrustedCompanyRequest>,
) -> ApiResult<Json<trusted_company::Model>> {
    Ok(Json(
        state
            .services
            .trusted_companies
            .create(request.name, request.logo_url)
            .await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/trusted-companies/{id}",
    summary = "Update trusted company",
    params(("id" = String, Path, description = "Company id")),
    request_body = TrustedCompanyRequest,
    responses(
        (status = 200, description = "Company updated", body = trusted_company::Model),
        (status = 400, description = "Missing name or logo", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Company not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "trusted-companies"
)]
pub async fn update_trusted_company(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<TrustedCompanyRequest>,
) -> ApiResult<Json<trusted_company::Model>> {
    let id = services::parse_id(&id, NOT_FOUND)?;
    Ok(Json(
        state
            .services
            .trusted_companies
            .update(id, request.name, request.logo_url)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/trusted-companies/{id}",
    summary = "Remove trusted company",
    params(("id" = String, Path, description = "Company id")),
    responses(
        (status = 200, description = "Company deleted", body = SuccessResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Company not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "trusted-companies"
)]
pub async fn delete_trusted_company(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    let id = services::parse_id(&id, NOT_FOUND)?;
    state.services.trusted_companies.delete(id).await?;
    Ok(SuccessResponse::ok())
}

pub fn trusted_company_routes(auth: Arc<AuthService>) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_trusted_companies).merge(post(create_trusted_company).with_admin(auth.clone())),
        )
        .route(
            "/:id",
            get(get_trusted_company)
                .put(update_trusted_company)
                .delete(delete_trusted_company)
                .with_admin(auth),
        )
}

/// The anonymous mount of the same listing handler.
pub fn public_trusted_company_routes() -> Router<AppState> {
    Router::new().route("/", get(list_trusted_companies))
}
