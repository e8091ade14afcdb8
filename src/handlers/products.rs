use super::common::{
    created_response, no_content_response, present, ApiResult, JsonBody, QueryParams,
};
use crate::{
    auth::{AuthRouterExt, AuthService},
    errors::ServiceError,
    services::{
        self,
        products::{
            parse_price, parse_specs, ProductDraft, ProductFilter, ProductPatch, ProductSort,
            ProductView,
        },
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
use serde_json::Value;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const NOT_FOUND: &str = "Product not found";
const UNKNOWN_CATEGORY: &str = "Category does not exist";

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ProductListParams {
    /// Category name
    pub category: Option<String>,
    /// Case-insensitive match on name and description
    pub search: Option<String>,
    /// `price` or `name` (default)
    pub sort_by: Option<String>,
}

/// Create payload. `price` may be a number or numeric text; `specs` must be
/// an object of strings.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Object, example = "12.50")]
    pub price: Option<Value>,
    pub image_url: Option<String>,
    pub category_id: Option<String>,
    #[schema(value_type = Option<HashMap<String, String>>)]
    pub specs: Option<Value>,
    pub features: Option<Vec<String>>,
    pub rating: Option<f64>,
}

/// Partial update. Omitted fields keep their value; `imageUrl` and `rating`
/// may be cleared with `null`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Object)]
    pub price: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,
    pub category_id: Option<String>,
    #[schema(value_type = Option<HashMap<String, String>>)]
    pub specs: Option<Value>,
    pub features: Option<Vec<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<f64>)]
    pub rating: Option<Option<f64>>,
}

fn category_id(raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ServiceError::BadRequest(UNKNOWN_CATEGORY.to_string()))
}

fn features(list: Vec<String>) -> Vec<String> {
    list.into_iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect()
}

impl CreateProductRequest {
    fn into_draft(self) -> Result<ProductDraft, ServiceError> {
        let name = services::required(self.name, "Name is required")?;
        let description = services::required(self.description, "Description is required")?;
        let price = match self.price {
            Some(raw) => parse_price(&raw)?,
            None => return Err(ServiceError::ValidationError("Price is required".to_string())),
        };
        let category_id = match services::non_blank(self.category_id) {
            Some(raw) => category_id(&raw)?,
            None => {
                return Err(ServiceError::ValidationError(
                    "Category is required".to_string(),
                ))
            }
        };

        Ok(ProductDraft {
            name,
            description,
            price,
            image_url: services::non_blank(self.image_url),
            category_id,
            specs: parse_specs(self.specs)?,
            features: features(self.features.unwrap_or_default()).into(),
            rating: self.rating,
        })
    }
}

impl UpdateProductRequest {
    fn into_patch(self) -> Result<ProductPatch, ServiceError> {
        let name = self
            .name
            .map(|n| services::required(Some(n), "Name is required"))
            .transpose()?;
        let description = self
            .description
            .map(|d| services::required(Some(d), "Description is required"))
            .transpose()?;

        Ok(ProductPatch {
            name,
            description,
            price: self.price.as_ref().map(parse_price).transpose()?,
            image_url: self.image_url.map(services::non_blank),
            category_id: self.category_id.as_deref().map(category_id).transpose()?,
            specs: match self.specs {
                Some(raw) => Some(parse_specs(Some(raw))?),
                None => None,
            },
            features: self.features.map(|list| features(list).into()),
            rating: self.rating,
        })
    }
}

#[utoipa::path(
    get,
    path = "/api/products",
    summary = "List products",
    params(ProductListParams),
    responses(
        (status = 200, description = "Products with their category", body = [ProductView]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ProductListParams>,
) -> ApiResult<Json<Vec<ProductView>>> {
    let filter = ProductFilter {
        category: params.category,
        search: params.search,
        sort: ProductSort::from_param(params.sort_by.as_deref()),
    };
    Ok(Json(state.services.products.list(filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    summary = "Get product",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product with its category", body = ProductView),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProductView>> {
    let id = services::parse_id(&id, NOT_FOUND)?;
    Ok(Json(state.services.products.get(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/products",
    summary = "Create product",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductView),
        (status = 400, description = "Invalid price, specs, or missing fields", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateProductRequest>,
) -> ApiResult<Response> {
    let draft = request.into_draft()?;
    let created = state.services.products.create(draft).await?;
    Ok(created_response(created))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    summary = "Update product",
    params(("id" = String, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductView),
        (status = 400, description = "Invalid field", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdateProductRequest>,
) -> ApiResult<Json<ProductView>> {
    let id = services::parse_id(&id, NOT_FOUND)?;
    let patch = request.into_patch()?;
    Ok(Json(state.services.products.update(id, patch).await?))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    summary = "Delete product",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Product has orders", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = services::parse_id(&id, NOT_FOUND)?;
    state.services.products.delete(id).await?;
    Ok(no_content_response())
}

pub fn product_routes(auth: Arc<AuthService>) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_products).merge(post(create_product).with_admin(auth.clone())),
        )
        .route(
            "/:id",
            get(get_product).merge(
                put(update_product)
                    .delete(delete_product)
                    .with_admin(auth),
            ),
        )
}
