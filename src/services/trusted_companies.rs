use crate::{db::DbPool, entities::trusted_company, errors::ServiceError};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

const NOT_FOUND: &str = "Trusted company not found";
const NAME_REQUIRED: &str = "Name is required";
const LOGO_REQUIRED: &str = "Logo URL is required";

/// Service for the "trusted by" logo strip
#[derive(Clone)]
pub struct TrustedCompanyService {
    db_pool: Arc<DbPool>,
}

impl TrustedCompanyService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Newest first.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<trusted_company::Model>, ServiceError> {
        Ok(trusted_company::Entity::find()
            .order_by_desc(trusted_company::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<trusted_company::Model, ServiceError> {
        trusted_company::Entity::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(NOT_FOUND.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        name: Option<String>,
        logo_url: Option<String>,
    ) -> Result<trusted_company::Model, ServiceError> {
        let name = super::required(name, NAME_REQUIRED)?;
        let logo_url = super::required(logo_url, LOGO_REQUIRED)?;

        let now = Utc::now();
        let created = trusted_company::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            logo_url: Set(logo_url),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db_pool.as_ref())
        .await?;

        info!(company_id = %created.id, "trusted company created");
        Ok(created)
    }

    /// Both fields are required on update as well.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<String>,
        logo_url: Option<String>,
    ) -> Result<trusted_company::Model, ServiceError> {
        let name = super::required(name, NAME_REQUIRED)?;
        let logo_url = super::required(logo_url, LOGO_REQUIRED)?;
        let existing = self.get(id).await?;

        let mut active: trusted_company::ActiveModel = existing.into();
        active.name = Set(name);
        active.logo_url = Set(logo_url);
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.db_pool.as_ref()).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = trusted_company::Entity::delete_by_id(id)
            .exec(self.db_pool.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(NOT_FOUND.to_string()));
        }
        info!(company_id = %id, "trusted company deleted");
        Ok(())
    }
}
