//! Homepage carousel. Slides are kept in display order by `order`; moves run
//! in a single transaction that swaps neighbours and renumbers every slide.

use crate::{
    db::{transaction::with_transaction, DbPool},
    entities::slide,
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr,
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

const NOT_FOUND: &str = "Slide not found";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Default)]
pub struct SlideInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub button_text: Option<String>,
    pub button_link: Option<String>,
    pub order: Option<i32>,
    pub active: Option<bool>,
}

/// Position of `id` after moving it one step, or `None` when it cannot move.
fn swap_target(ids: &[Uuid], id: Uuid, direction: MoveDirection) -> Option<(usize, usize)> {
    let from = ids.iter().position(|candidate| *candidate == id)?;
    let to = match direction {
        MoveDirection::Up => from.checked_sub(1)?,
        MoveDirection::Down => Some(from + 1).filter(|to| *to < ids.len())?,
    };
    Some((from, to))
}

async fn ordered<C: ConnectionTrait>(
    db: &C,
    active_only: bool,
) -> Result<Vec<slide::Model>, ServiceError> {
    let mut query = slide::Entity::find()
        .order_by_asc(slide::Column::Order)
        .order_by_asc(slide::Column::CreatedAt);
    if active_only {
        query = query.filter(slide::Column::Active.eq(true));
    }
    Ok(query.all(db).await?)
}

/// Service for homepage slides
#[derive(Clone)]
pub struct SlideService {
    db_pool: Arc<DbPool>,
}

impl SlideService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, active_only: bool) -> Result<Vec<slide::Model>, ServiceError> {
        ordered(self.db_pool.as_ref(), active_only).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<slide::Model, ServiceError> {
        slide::Entity::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(NOT_FOUND.to_string()))
    }

    /// Without an explicit `order` the slide goes after the last one.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: SlideInput) -> Result<slide::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        let title = super::required(input.title, "Title is required")?;
        let description = super::required(input.description, "Description is required")?;
        let image_url = super::required(input.image_url, "Image URL is required")?;

        let order = match input.order {
            Some(order) => order,
            None => self.next_position().await?,
        };

        let now = Utc::now();
        let model = slide::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title),
            description: Set(description),
            image_url: Set(image_url),
            button_text: Set(super::non_blank(input.button_text)),
            button_link: Set(super::non_blank(input.button_link)),
            order: Set(order),
            active: Set(input.active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(db).await?;
        info!(slide_id = %created.id, order = created.order, "slide created");
        Ok(created)
    }

    /// Partial update. Required fields may be omitted but not blanked.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: SlideInput) -> Result<slide::Model, ServiceError> {
        let existing = self.get(id).await?;
        let mut active: slide::ActiveModel = existing.into();

        if let Some(title) = input.title {
            active.title = Set(super::required(Some(title), "Title is required")?);
        }
        if let Some(description) = input.description {
            active.description = Set(super::required(
                Some(description),
                "Description is required",
            )?);
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(super::required(Some(image_url), "Image URL is required")?);
        }
        if let Some(button_text) = input.button_text {
            active.button_text = Set(super::non_blank(Some(button_text)));
        }
        if let Some(button_link) = input.button_link {
            active.button_link = Set(super::non_blank(Some(button_link)));
        }
        if let Some(order) = input.order {
            active.order = Set(order);
        }
        if let Some(is_active) = input.active {
            active.active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(self.db_pool.as_ref()).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = slide::Entity::delete_by_id(id)
            .exec(self.db_pool.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(NOT_FOUND.to_string()));
        }
        info!(slide_id = %id, "slide deleted");
        Ok(())
    }

    /// Moves a slide one step and returns the full list in its new order.
    /// Moving the first slide up or the last slide down changes nothing.
    #[instrument(skip(self))]
    pub async fn move_slide(
        &self,
        id: Uuid,
        direction: MoveDirection,
    ) -> Result<Vec<slide::Model>, ServiceError> {
        with_transaction(self.db_pool.as_ref(), move |txn| {
            Box::pin(async move { reorder(txn, id, direction).await })
        })
        .await
    }

    async fn next_position(&self) -> Result<i32, ServiceError> {
        let last: Option<Option<i32>> = slide::Entity::find()
            .select_only()
            .column_as(Expr::col(slide::Column::Order).max(), "max_order")
            .into_tuple()
            .one(self.db_pool.as_ref())
            .await?;
        Ok(last.flatten().map_or(0, |max| max + 1))
    }
}

async fn reorder(
    txn: &DatabaseTransaction,
    id: Uuid,
    direction: MoveDirection,
) -> Result<Vec<slide::Model>, ServiceError> {
    let mut slides = ordered(txn, false).await?;
    let ids: Vec<Uuid> = slides.iter().map(|s| s.id).collect();
    if !ids.contains(&id) {
        return Err(ServiceError::NotFound(NOT_FOUND.to_string()));
    }

    match swap_target(&ids, id, direction) {
        Some((from, to)) => slides.swap(from, to),
        None => debug!(slide_id = %id, %direction, "slide already at the edge"),
    }

    let now = Utc::now();
    let mut renumbered = Vec::with_capacity(slides.len());
    for (position, current) in slides.into_iter().enumerate() {
        let position = i32::try_from(position)
            .map_err(|_| ServiceError::InternalError("too many slides".to_string()))?;
        if current.order == position {
            renumbered.push(current);
            continue;
        }
        let mut active: slide::ActiveModel = current.into();
        active.order = Set(position);
        active.updated_at = Set(now);
        renumbered.push(active.update(txn).await?);
    }

    info!(slide_id = %id, %direction, "slide moved");
    Ok(renumbered)
}
