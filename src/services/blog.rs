use crate::{
    auth::AuthUser,
    db::DbPool,
    entities::{blog_post, user, StringList},
    errors::{is_unique_violation, ServiceError},
};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

const NOT_FOUND: &str = "Blog post not found";
const SLUG_TAKEN: &str = "A post with this slug already exists";
const TITLE_AND_CONTENT_REQUIRED: &str = "Title and content are required";

static DISALLOWED_SLUG_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_\s-]").expect("static regex"));
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// `"  Hello, World! 2024 "` becomes `"hello-world-2024"`.
pub fn slugify(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    let stripped = DISALLOWED_SLUG_CHARS.replace_all(&lowered, "");
    WHITESPACE_RUN
        .replace_all(stripped.trim(), "-")
        .into_owned()
}

/// Author as shown next to a post. Email only appears in admin listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostAuthor {
    pub id: Uuid,
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = BlogPost)]
pub struct BlogPostView {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub published: bool,
    pub tags: Vec<String>,
    pub author_id: Uuid,
    pub author: Option<PostAuthor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPostView {
    fn build(post: blog_post::Model, author: Option<user::Model>, with_email: bool) -> Self {
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            content: post.content,
            excerpt: post.excerpt,
            cover_image: post.cover_image,
            published: post.published,
            tags: post.tags.0,
            author_id: post.author_id,
            author: author.map(|u| PostAuthor {
                id: u.id,
                name: u.name,
                email: with_email.then_some(u.email),
            }),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlogFilter {
    pub published: Option<bool>,
    pub tag: Option<String>,
    pub limit: Option<u64>,
}

/// Client fields for create and update
#[derive(Debug, Clone, Default)]
pub struct PostInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub published: Option<bool>,
    pub tags: Option<Vec<String>>,
}

impl PostInput {
    fn title_and_content(&self) -> Result<(String, String), ServiceError> {
        match (
            super::non_blank(self.title.clone()),
            super::non_blank(self.content.clone()),
        ) {
            (Some(title), Some(content)) => Ok((title, content)),
            _ => Err(ServiceError::ValidationError(
                TITLE_AND_CONTENT_REQUIRED.to_string(),
            )),
        }
    }
}

fn clean_tags(tags: Vec<String>) -> StringList {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !cleaned.contains(&tag) {
            cleaned.push(tag);
        }
    }
    StringList(cleaned)
}

fn usable_slug(candidate: &str) -> Result<String, ServiceError> {
    let slug = slugify(candidate);
    if slug.is_empty() {
        return Err(ServiceError::ValidationError(
            "Slug cannot be empty".to_string(),
        ));
    }
    Ok(slug)
}

/// Service for blog posts
#[derive(Clone)]
pub struct BlogService {
    db_pool: Arc<DbPool>,
}

impl BlogService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Admin listing: drafts included unless `published` says otherwise.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: BlogFilter) -> Result<Vec<BlogPostView>, ServiceError> {
        self.query(filter, true).await
    }

    /// Public listing: published posts only.
    #[instrument(skip(self))]
    pub async fn list_published(
        &self,
        tag: Option<String>,
        limit: Option<u64>,
    ) -> Result<Vec<BlogPostView>, ServiceError> {
        self.query(
            BlogFilter {
                published: Some(true),
                tag,
                limit,
            },
            false,
        )
        .await
    }

    async fn query(
        &self,
        filter: BlogFilter,
        with_email: bool,
    ) -> Result<Vec<BlogPostView>, ServiceError> {
        let mut query = blog_post::Entity::find()
            .find_also_related(user::Entity)
            .order_by_desc(blog_post::Column::CreatedAt);
        if let Some(published) = filter.published {
            query = query.filter(blog_post::Column::Published.eq(published));
        }

        let tag = super::non_blank(filter.tag);
        let limit = filter.limit.map(|l| l as usize).unwrap_or(usize::MAX);

        // Tags live in a JSON column, so the tag match happens here.
        Ok(query
            .all(self.db_pool.as_ref())
            .await?
            .into_iter()
            .filter(|(post, _)| tag.as_deref().map_or(true, |t| post.tags.contains(t)))
            .take(limit)
            .map(|(post, author)| BlogPostView::build(post, author, with_email))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<BlogPostView, ServiceError> {
        blog_post::Entity::find_by_id(id)
            .find_also_related(user::Entity)
            .one(self.db_pool.as_ref())
            .await?
            .map(|(post, author)| BlogPostView::build(post, author, true))
            .ok_or_else(|| ServiceError::NotFound(NOT_FOUND.to_string()))
    }

    /// A published post by slug. Drafts are invisible here.
    #[instrument(skip(self))]
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<BlogPostView, ServiceError> {
        blog_post::Entity::find()
            .filter(blog_post::Column::Slug.eq(slug))
            .filter(blog_post::Column::Published.eq(true))
            .find_also_related(user::Entity)
            .one(self.db_pool.as_ref())
            .await?
            .map(|(post, author)| BlogPostView::build(post, author, false))
            .ok_or_else(|| ServiceError::NotFound(NOT_FOUND.to_string()))
    }

    /// The author is always the signed-in admin; a session whose user no
    /// longer exists is refused.
    #[instrument(skip(self, input), fields(author_id = %author.id))]
    pub async fn create(
        &self,
        author: &AuthUser,
        input: PostInput,
    ) -> Result<BlogPostView, ServiceError> {
        let db = self.db_pool.as_ref();
        let (title, content) = input.title_and_content()?;

        let author = user::Entity::find_by_id(author.id)
            .one(db)
            .await?
            .ok_or_else(|| {
                warn!(author_id = %author.id, "session user no longer exists");
                ServiceError::Unauthorized("Unauthorized".to_string())
            })?;

        let slug = match super::non_blank(input.slug.clone()) {
            Some(explicit) => usable_slug(&explicit)?,
            None => usable_slug(&title)?,
        };
        self.ensure_slug_free(&slug, None).await?;

        let now = Utc::now();
        let model = blog_post::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title),
            slug: Set(slug),
            content: Set(content),
            excerpt: Set(super::non_blank(input.excerpt)),
            cover_image: Set(super::non_blank(input.cover_image)),
            published: Set(input.published.unwrap_or(false)),
            tags: Set(clean_tags(input.tags.unwrap_or_default())),
            author_id: Set(author.id),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(db).await.map_err(map_write_error)?;
        info!(post_id = %created.id, slug = %created.slug, "blog post created");
        Ok(BlogPostView::build(created, Some(author), true))
    }

    /// Title and content are required. The slug changes when a new one is
    /// given, or follows the title when the title changes.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: PostInput) -> Result<BlogPostView, ServiceError> {
        let db = self.db_pool.as_ref();
        let (title, content) = input.title_and_content()?;

        let existing = blog_post::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(NOT_FOUND.to_string()))?;

        let slug = match super::non_blank(input.slug.clone()) {
            Some(explicit) => usable_slug(&explicit)?,
            None if title != existing.title => usable_slug(&title)?,
            None => existing.slug.clone(),
        };
        if slug != existing.slug {
            self.ensure_slug_free(&slug, Some(id)).await?;
        }

        let mut active: blog_post::ActiveModel = existing.into();
        active.title = Set(title);
        active.content = Set(content);
        active.slug = Set(slug);
        if let Some(excerpt) = input.excerpt {
            active.excerpt = Set(super::non_blank(Some(excerpt)));
        }
        if let Some(cover_image) = input.cover_image {
            active.cover_image = Set(super::non_blank(Some(cover_image)));
        }
        if let Some(published) = input.published {
            active.published = Set(published);
        }
        if let Some(tags) = input.tags {
            active.tags = Set(clean_tags(tags));
        }
        active.updated_at = Set(Utc::now());

        active.update(db).await.map_err(map_write_error)?;
        self.get(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = blog_post::Entity::delete_by_id(id)
            .exec(self.db_pool.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(NOT_FOUND.to_string()));
        }
        info!(post_id = %id, "blog post deleted");
        Ok(())
    }

    async fn ensure_slug_free(&self, slug: &str, except: Option<Uuid>) -> Result<(), ServiceError> {
        let mut query = blog_post::Entity::find().filter(blog_post::Column::Slug.eq(slug));
        if let Some(id) = except {
            query = query.filter(blog_post::Column::Id.ne(id));
        }
        if query.count(self.db_pool.as_ref()).await? > 0 {
            return Err(ServiceError::BadRequest(SLUG_TAKEN.to_string()));
        }
        Ok(())
    }
}

fn map_write_error(err: sea_orm::DbErr) -> ServiceError {
    if is_unique_violation(&err) {
        ServiceError::BadRequest(SLUG_TAKEN.to_string())
    } else {
        ServiceError::DatabaseError(err)
    }
}
