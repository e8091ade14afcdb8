use super::common::{ApiResult, IdQuery, JsonBody, QueryParams, SuccessResponse};
use crate::{
    auth::{AuthRouterExt, AuthService},
    entities::category,
    AppState,
};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

const NOT_FOUND: &str = "Category not found";

#[derive(Debug, Deserialize, ToSchema)]
pub struct CategoryRequest {
    /// Display name, unique
    #[schema(example = "Laptops")]
    pub name: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/categories",
    summary = "List categories",
    responses(
        (status = 200, description = "All categories sorted by name", body = [category::Model]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "categories"
)]
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<category::Model>>> {
    Ok(Json(state.services.categories.list().await?))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    summary = "Create category",
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category created", body = category::Model),
        (status = 400, description = "Name missing", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already taken", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CategoryRequest>,
) -> ApiResult<Json<category::Model>> {
    Ok(Json(state.services.categories.create(request.name).await?))
}

#[utoipa::path(
    put,
    path = "/api/categories",
    summary = "Rename category",
    params(IdQuery),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = category::Model),
        (status = 400, description = "Name or id missing", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already taken", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<IdQuery>,
    JsonBody(request): JsonBody<CategoryRequest>,
) -> ApiResult<Json<category::Model>> {
    let id = query.require(NOT_FOUND)?;
    Ok(Json(state.services.categories.update(id, request.name).await?))
}

#[utoipa::path(
    delete,
    path = "/api/categories",
    summary = "Delete category",
    params(IdQuery),
    responses(
        (status = 200, description = "Category deleted", body = SuccessResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Category still has products", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<IdQuery>,
) -> ApiResult<Json<SuccessResponse>> {
    let id = query.require(NOT_FOUND)?;
    state.services.categories.delete(id).await?;
    Ok(SuccessResponse::ok())
}

pub fn category_routes(auth: Arc<AuthService>) -> Router<AppState> {
    Router::new().route(
        "/",
        get(list_categories).merge(
            post(create_category)
                .put(update_category)
                .delete(delete_category)
                .with_admin(auth),
        ),
    )
}
