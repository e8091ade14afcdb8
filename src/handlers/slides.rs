use super::common::{created_response, ApiResult, JsonBody, QueryParams, SuccessResponse};
use crate::{
    auth::{AuthRouterExt, AuthService},
    entities::slide,
    services::{
        self,
        slides::{MoveDirection, SlideInput},
    },
    AppState,
};
use axum::{
    extract::{Path, State},
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

const NOT_FOUND: &str = "Slide not found";

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SlideListParams {
    /// Only slides marked active
    pub active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlideRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub button_text: Option<String>,
    pub button_link: Option<String>,
    /// Position; appended after the last slide when omitted on create
    pub order: Option<i32>,
    pub active: Option<bool>,
}

impl From<SlideRequest> for SlideInput {
    fn from(request: SlideRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            image_url: request.image_url,
            button_text: request.button_text,
            button_link: request.button_link,
            order: request.order,
            active: request.active,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MoveSlideRequest {
    pub direction: MoveDirection,
}

#[utoipa::path(
    get,
    path = "/api/slides",
    summary = "List slides",
    params(SlideListParams),
    responses((status = 200, description = "Slides in display order", body = [slide::Model])),
    tag = "slides"
)]
pub async fn list_slides(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<SlideListParams>,
) -> ApiResult<Json<Vec<slide::Model>>> {
    let active_only = params.active.unwrap_or(false);
    Ok(Json(state.services.slides.list(active_only).await?))
}

#[utoipa::path(
    get,
    path = "/api/slides/{id}",
    summary = "Get slide",
    params(("id" = String, Path, description = "Slide id")),
    responses(
        (status = 200, description = "Slide", body = slide::Model),
        (status = 404, description = "Slide not found", body = crate::errors::ErrorResponse),
    ),
    tag = "slides"
)]
pub async fn get_slide(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<slide::Model>> {
    let id = services::parse_id(&id, NOT_FOUND)?;
    Ok(Json(state.services.slides.get(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/slides",
    summary = "Create slide",
    request_body = SlideRequest,
    responses(
        (status = 201, description = "Slide created", body = slide::Model),
        (status = 400, description = "Missing fields", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "slides"
)]
pub async fn create_slide(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SlideRequest>,
) -> ApiResult<Response> {
    let created = state.services.slides.create(request.into()).await?;
    Ok(created_response(created))
}

#[utoipa::path(
    put,
    path = "/api/slides/{id}",
    summary = "Update slide",
    params(("id" = String, Path, description = "Slide id")),
    request_body = SlideRequest,
    responses(
        (status = 200, description = "Slide updated", body = slide::Model),
        (status = 400, description = "Blank required field", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Slide not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "slides"
)]
pub async fn update_slide(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<SlideRequest>,
) -> ApiResult<Json<slide::Model>> {
    let id = services::parse_id(&id, NOT_FOUND)?;
    Ok(Json(state.services.slides.update(id, request.into()).await?))
}

#[utoipa::path(
    delete,
    path = "/api/slides/{id}",
    summary = "Delete slide",
    params(("id" = String, Path, description = "Slide id")),
    responses(
        (status = 200, description = "Slide deleted", body = SuccessResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Slide not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "slides"
)]
pub async fn delete_slide(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    let id = services::parse_id(&id, NOT_FOUND)?;
    state.services.slides.delete(id).await?;
    Ok(SuccessResponse::ok())
}

#[utoipa::path(
    post,
    path = "/api/slides/{id}/move",
    summary = "Move slide up or down",
    params(("id" = String, Path, description = "Slide id")),
    request_body = MoveSlideRequest,
    responses(
        (status = 200, description = "All slides in their new order", body = [slide::Model]),
        (status = 400, description = "Unknown direction", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Slide not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "slides"
)]
pub async fn move_slide(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<MoveSlideRequest>,
) -> ApiResult<Json<Vec<slide::Model>>> {
    let id = services::parse_id(&id, NOT_FOUND)?;
    Ok(Json(
        state.services.slides.move_slide(id, request.direction).await?,
    ))
}

pub fn slide_routes(auth: Arc<AuthService>) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_slides).merge(post(create_slide).with_admin(auth.clone())),
        )
        .route(
            "/:id",
            get(get_slide).merge(
                put(update_slide)
                    .delete(delete_slide)
                    .with_admin(auth.clone()),
            ),
        )
        .route("/:id/move", post(move_slide).with_admin(auth))
}
