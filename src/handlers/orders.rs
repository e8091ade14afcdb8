use super::common::{ApiResult, IdQuery, JsonBody, QueryParams, SuccessResponse};
use crate::{
    auth::{AuthRouterExt, AuthService},
    errors::ServiceError,
    services::{
        self,
        orders::{orders_to_csv, parse_status, OrderDraft, OrderView},
    },
    AppState,
};
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

const NOT_FOUND: &str = "Order not found";

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub name: Option<String>,
    pub company_name: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    pub product_id: Option<String>,
}

impl CreateOrderRequest {
    fn into_draft(self) -> Result<OrderDraft, ServiceError> {
        let product_id = services::required(self.product_id, "Product is required")?;
        let product_id = Uuid::parse_str(&product_id)
            .map_err(|_| ServiceError::BadRequest("Product does not exist".to_string()))?;

        Ok(OrderDraft {
            name: services::required(self.name, "Name is required")?,
            company_name: services::non_blank(self.company_name),
            city: services::required(self.city, "City is required")?,
            phone: services::required(self.phone, "Phone is required")?,
            email: services::required(self.email, "Email is required")?,
            product_id,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    /// One of PENDING, CONFIRMED, SHIPPED, DELIVERED, CANCELLED
    #[schema(example = "CONFIRMED")]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct OrderListParams {
    /// `csv` for a spreadsheet export
    pub format: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/orders",
    summary = "Place order",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order placed", body = OrderView),
        (status = 400, description = "Missing fields or unknown product", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateOrderRequest>,
) -> ApiResult<Json<OrderView>> {
    request.validate()?;
    let draft = request.into_draft()?;
    Ok(Json(state.services.orders.create(draft).await?))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    summary = "List or export orders",
    params(OrderListParams),
    responses(
        (status = 200, description = "Orders, newest first, as JSON or CSV", body = [OrderView]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<OrderListParams>,
) -> ApiResult<Response> {
    let orders = state.services.orders.list().await?;

    let wants_csv = params
        .format
        .as_deref()
        .is_some_and(|f| f.eq_ignore_ascii_case("csv"));
    if !wants_csv {
        return Ok(Json(orders).into_response());
    }

    let csv = orders_to_csv(&orders)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, "attachment; filename=orders.csv"),
        ],
        csv,
    )
        .into_response())
}

#[utoipa::path(
    patch,
    path = "/api/orders",
    summary = "Change order status",
    params(IdQuery),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order updated", body = OrderView),
        (status = 400, description = "Unknown status or illegal transition", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<IdQuery>,
    JsonBody(request): JsonBody<UpdateOrderStatusRequest>,
) -> ApiResult<Json<OrderView>> {
    let id = query.require(NOT_FOUND)?;
    let status = parse_status(request.status.as_deref())?;
    Ok(Json(state.services.orders.update_status(id, status).await?))
}

#[utoipa::path(
    delete,
    path = "/api/orders",
    summary = "Delete order",
    params(IdQuery),
    responses(
        (status = 200, description = "Order deleted", body = SuccessResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<IdQuery>,
) -> ApiResult<Json<SuccessResponse>> {
    let id = query.require(NOT_FOUND)?;
    state.services.orders.delete(id).await?;
    Ok(SuccessResponse::ok())
}

pub fn order_routes(auth: Arc<AuthService>) -> Router<AppState> {
    Router::new().route(
        "/",
        post(create_order).merge(
            get(list_orders)
                .patch(update_order_status)
                .delete(delete_order)
                .with_admin(auth),
        ),
    )
}
