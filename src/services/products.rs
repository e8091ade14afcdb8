//! Product catalog: listing with filters, CRUD, and the coercion rules for
//! loosely typed client input (`price` as text, `specs` as an object).

use crate::{
    db::DbPool,
    entities::{category, order, product, ProductSpecs, StringList},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr},
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

const NOT_FOUND: &str = "Product not found";
const INVALID_PRICE: &str = "Invalid price format";
const MAX_RATING: f64 = 5.0;

/// Product with its category embedded.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: product::Model,
    pub category: Option<category::Model>,
}

impl From<(product::Model, Option<category::Model>)> for ProductView {
    fn from((product, category): (product::Model, Option<category::Model>)) -> Self {
        Self { product, category }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSort {
    #[default]
    Name,
    Price,
}

impl ProductSort {
    /// `price` selects price order; anything else falls back to name.
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("price") => ProductSort::Price,
            _ => ProductSort::Name,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Category *name*
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: ProductSort,
}

/// Validated input for a new product
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image_url: Option<String>,
    pub category_id: Uuid,
    pub specs: ProductSpecs,
    pub features: StringList,
    pub rating: Option<f64>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<Option<String>>,
    pub category_id: Option<Uuid>,
    pub specs: Option<ProductSpecs>,
    pub features: Option<StringList>,
    pub rating: Option<Option<f64>>,
}

/// Accepts a JSON number or a numeric string. The result must be finite and
/// not negative.
pub fn parse_price(value: &Value) -> Result<f64, ServiceError> {
    let price = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match price {
        Some(p) if p.is_finite() && p >= 0.0 => Ok(p),
        _ => Err(ServiceError::ValidationError(INVALID_PRICE.to_string())),
    }
}

/// `specs` must be an object of string values. Null means empty. Strings are
/// refused outright, including JSON text that would decode to an object.
pub fn parse_specs(value: Option<Value>) -> Result<ProductSpecs, ServiceError> {
    match value {
        None | Some(Value::Null) => Ok(ProductSpecs::default()),
        Some(Value::Object(map)) => {
            let mut specs = BTreeMap::new();
            for (key, value) in map {
                match value {
                    Value::String(text) => {
                        specs.insert(key, text);
                    }
                    _ => {
                        return Err(ServiceError::ValidationError(format!(
                            "Specification '{}' must be a string",
                            key
                        )))
                    }
                }
            }
            Ok(ProductSpecs(specs))
        }
        Some(Value::String(_)) => Err(ServiceError::ValidationError(
            "specs must be a JSON object, not a string".to_string(),
        )),
        Some(_) => Err(ServiceError::ValidationError(
            "specs must be a JSON object".to_string(),
        )),
    }
}

pub fn validate_rating(rating: Option<f64>) -> Result<Option<f64>, ServiceError> {
    match rating {
        Some(r) if !(r.is_finite() && (0.0..=MAX_RATING).contains(&r)) => Err(
            ServiceError::ValidationError("Rating must be between 0 and 5".to_string()),
        ),
        other => Ok(other),
    }
}

/// Service for the product catalog
#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: ProductFilter) -> Result<Vec<ProductView>, ServiceError> {
        let db = self.db_pool.as_ref();
        let mut query = product::Entity::find().find_also_related(category::Entity);

        if let Some(name) = super::non_blank(filter.category) {
            match category::Entity::find()
                .filter(category::Column::Name.eq(name.as_str()))
                .one(db)
                .await?
            {
                Some(found) => {
                    query = query.filter(product::Column::CategoryId.eq(found.id));
                }
                None => warn!(category = %name, "unknown category filter ignored"),
            }
        }

        if let Some(search) = super::non_blank(filter.search) {
            let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
            let lowered = |column: product::Column| {
                Expr::expr(Func::lower(Expr::col((product::Entity, column))))
                    .like(LikeExpr::new(pattern.clone()).escape('\\'))
            };
            query = query.filter(
                Condition::any()
                    .add(lowered(product::Column::Name))
                    .add(lowered(product::Column::Description)),
            );
        }

        query = match filter.sort {
            ProductSort::Price => query
                .order_by_asc(product::Column::Price)
                .order_by_asc(product::Column::Name),
            ProductSort::Name => query.order_by_asc(product::Column::Name),
        };

        Ok(query.all(db).await?.into_iter().map(ProductView::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<ProductView, ServiceError> {
        product::Entity::find_by_id(id)
            .find_also_related(category::Entity)
            .one(self.db_pool.as_ref())
            .await?
            .map(ProductView::from)
            .ok_or_else(|| ServiceError::NotFound(NOT_FOUND.to_string()))
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create(&self, draft: ProductDraft) -> Result<ProductView, ServiceError> {
        let category = self.require_category(draft.category_id).await?;
        let rating = validate_rating(draft.rating)?;

        let now = Utc::now();
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(draft.name),
            description: Set(draft.description),
            price: Set(draft.price),
            image_url: Set(draft.image_url),
            category_id: Set(category.id),
            specs: Set(draft.specs),
            features: Set(draft.features),
            rating: Set(rating),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(self.db_pool.as_ref()).await?;
        info!(product_id = %created.id, "product created");
        Ok(ProductView::from((created, Some(category))))
    }

    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: Uuid, patch: ProductPatch) -> Result<ProductView, ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = product::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(NOT_FOUND.to_string()))?;

        let category = match patch.category_id {
            Some(category_id) => self.require_category(category_id).await?,
            None => self.require_category(existing.category_id).await?,
        };

        let mut active: product::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(price) = patch.price {
            active.price = Set(price);
        }
        if let Some(image_url) = patch.image_url {
            active.image_url = Set(image_url);
        }
        if let Some(specs) = patch.specs {
            active.specs = Set(specs);
        }
        if let Some(features) = patch.features {
            active.features = Set(features);
        }
        if let Some(rating) = patch.rating {
            active.rating = Set(validate_rating(rating)?);
        }
        active.category_id = Set(category.id);
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await?;
        Ok(ProductView::from((updated, Some(category))))
    }

    /// Products referenced by orders are kept.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = product::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(NOT_FOUND.to_string()))?;

        let orders = order::Entity::find()
            .filter(order::Column::ProductId.eq(id))
            .count(db)
            .await?;
        if orders > 0 {
            warn!(product_id = %id, orders, "refusing to delete ordered product");
            return Err(ServiceError::Conflict(
                "Cannot delete product that has orders".to_string(),
            ));
        }

        product::Entity::delete_by_id(existing.id).exec(db).await?;
        info!(product_id = %id, "product deleted");
        Ok(())
    }

    async fn require_category(&self, category_id: Uuid) -> Result<category::Model, ServiceError> {
        category::Entity::find_by_id(category_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| ServiceError::BadRequest("Category does not exist".to_string()))
    }
}

fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
