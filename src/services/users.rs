//! Account administration used by the CLI. Sign-in lives in `auth`.

use crate::{
    auth::password::{hash_password, validate_password_strength},
    db::DbPool,
    entities::user::{self, UserRole},
    errors::{is_unique_violation, ServiceError},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::validate_email;

#[derive(Clone)]
pub struct UserService {
    db_pool: Arc<DbPool>,
}

impl UserService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Emails are stored lowercased; lookups normalise the same way.
    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, ServiceError> {
        Ok(user::Entity::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .one(self.db_pool.as_ref())
            .await?)
    }

    /// Creates an admin, or promotes the existing account and resets its
    /// password. The flag is `true` when a new row was inserted.
    #[instrument(skip(self, password))]
    pub async fn upsert_admin(
        &self,
        email: &str,
        name: Option<String>,
        password: &str,
    ) -> Result<(user::Model, bool), ServiceError> {
        let email = normalize_email(email);
        if !validate_email(email.as_str()) {
            return Err(ServiceError::ValidationError(
                "A valid email is required".to_string(),
            ));
        }
        validate_password_strength(password)?;
        let password_hash = hash_password(password)?;
        let name = super::non_blank(name);
        let now = Utc::now();

        if let Some(existing) = self.find_by_email(&email).await? {
            let mut active: user::ActiveModel = existing.into();
            active.role = Set(UserRole::Admin);
            active.password_hash = Set(password_hash);
            if name.is_some() {
                active.name = Set(name);
            }
            active.updated_at = Set(now);
            let updated = active.update(self.db_pool.as_ref()).await?;
            info!(user_id = %updated.id, "existing user promoted to admin");
            return Ok((updated, false));
        }

        let created = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            email: Set(email),
            password_hash: Set(password_hash),
            role: Set(UserRole::Admin),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db_pool.as_ref())
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                ServiceError::Conflict("A user with this email already exists".to_string())
            } else {
                ServiceError::DatabaseError(err)
            }
        })?;
        info!(user_id = %created.id, "admin user created");
        Ok((created, true))
    }

    #[instrument(skip(self))]
    pub async fn list_admins(&self) -> Result<Vec<user::Model>, ServiceError> {
        Ok(user::Entity::find()
            .filter(user::Column::Role.eq(UserRole::Admin))
            .order_by_asc(user::Column::Email)
            .all(self.db_pool.as_ref())
            .await?)
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
