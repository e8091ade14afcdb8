use crate::{
    db::DbPool,
    entities::{category, product},
    errors::{is_unique_violation, ServiceError},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

const NOT_FOUND: &str = "Category not found";
const NAME_REQUIRED: &str = "Category name is required";
const NAME_TAKEN: &str = "A category with this name already exists";

/// Service for managing product categories
#[derive(Clone)]
pub struct CategoryService {
    db_pool: Arc<DbPool>,
}

impl CategoryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// All categories, alphabetically.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<category::Model>, ServiceError> {
        let db = self.db_pool.as_ref();
        Ok(category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<category::Model, ServiceError> {
        category::Entity::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(NOT_FOUND.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn create(&self, name: Option<String>) -> Result<category::Model, ServiceError> {
        let name = super::required(name, NAME_REQUIRED)?;
        self.ensure_name_free(&name, None).await?;

        let now = Utc::now();
        let model = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model
            .insert(self.db_pool.as_ref())
            .await
            .map_err(map_write_error)?;
        info!(category_id = %created.id, "category created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<String>,
    ) -> Result<category::Model, ServiceError> {
        let name = super::required(name, NAME_REQUIRED)?;
        let existing = self.get(id).await?;
        self.ensure_name_free(&name, Some(id)).await?;

        let mut active: category::ActiveModel = existing.into();
        active.name = Set(name);
        active.updated_at = Set(Utc::now());

        Ok(active
            .update(self.db_pool.as_ref())
            .await
            .map_err(map_write_error)?)
    }

    /// Refuses while any product still points at the category.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = self.get(id).await?;

        let products = product::Entity::find()
            .filter(product::Column::CategoryId.eq(id))
            .count(db)
            .await?;
        if products > 0 {
            warn!(category_id = %id, products, "refusing to delete category in use");
            return Err(ServiceError::Conflict(
                "Cannot delete category that has products".to_string(),
            ));
        }

        category::Entity::delete_by_id(existing.id).exec(db).await?;
        info!(category_id = %id, "category deleted");
        Ok(())
    }

    async fn ensure_name_free(&self, name: &str, except: Option<Uuid>) -> Result<(), ServiceError> {
        let mut query = category::Entity::find().filter(category::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(category::Column::Id.ne(id));
        }
        if query.count(self.db_pool.as_ref()).await? > 0 {
            return Err(ServiceError::Conflict(NAME_TAKEN.to_string()));
        }
        Ok(())
    }
}

fn map_write_error(err: sea_orm::DbErr) -> ServiceError {
    if is_unique_violation(&err) {
        ServiceError::Conflict(NAME_TAKEN.to_string())
    } else {
        ServiceError::DatabaseError(err)
    }
}
