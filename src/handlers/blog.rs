use super::common::{ApiResult, JsonBody, QueryParams, SuccessResponse};
use crate::{
    auth::{AuthRouterExt, AuthService, AuthUser},
    services::{
        self,
        blog::{BlogFilter, BlogPostView, PostInput},
    },
    AppState,
};
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

const NOT_FOUND: &str = "Blog post not found";

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct BlogListParams {
    /// Only published (`true`) or only drafts (`false`)
    pub published: Option<bool>,
    /// Exact tag match
    pub tag: Option<String>,
    /// Maximum number of posts
    pub limit: Option<u64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PublicBlogParams {
    pub tag: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Derived from the title when omitted
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub published: Option<bool>,
    pub tags: Option<Vec<String>>,
}

impl From<BlogPostRequest> for PostInput {
    fn from(request: BlogPostRequest) -> Self {
        Self {
            title: request.title,
            content: request.content,
            slug: request.slug,
            excerpt: request.excerpt,
            cover_image: request.cover_image,
            published: request.published,
            tags: request.tags,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/blog",
    summary = "List posts (admin)",
    params(BlogListParams),
    responses(
        (status = 200, description = "Posts newest first, drafts included", body = [BlogPostView]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "blog"
)]
pub async fn list_posts(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<BlogListParams>,
) -> ApiResult<Json<Vec<BlogPostView>>> {
    let filter = BlogFilter {
        published: params.published,
        tag: params.tag,
        limit: params.limit,
    };
    Ok(Json(state.services.blog.list(filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/blog/{id}",
    summary = "Get post (admin)",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post", body = BlogPostView),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Post not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "blog"
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<BlogPostView>> {
    let id = services::parse_id(&id, NOT_FOUND)?;
    Ok(Json(state.services.blog.get(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/blog",
    summary = "Create post",
    request_body = BlogPostRequest,
    responses(
        (status = 200, description = "Post created; author is the caller", body = BlogPostView),
        (status = 400, description = "Missing fields or slug already used", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "blog"
)]
pub async fn create_post(
    State(state): State<AppState>,
    author: AuthUser,
    JsonBody(request): JsonBody<BlogPostRequest>,
) -> ApiResult<Json<BlogPostView>> {
    Ok(Json(state.services.blog.create(&author, request.into()).await?))
}

#[utoipa::path(
    put,
    path = "/api/blog/{id}",
    summary = "Update post",
    params(("id" = String, Path, description = "Post id")),
    request_body = BlogPostRequest,
    responses(
        (status = 200, description = "Post updated", body = BlogPostView),
        (status = 400, description = "Missing fields or slug already used", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Post not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "blog"
)]
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<BlogPostRequest>,
) -> ApiResult<Json<BlogPostView>> {
    let id = services::parse_id(&id, NOT_FOUND)?;
    Ok(Json(state.services.blog.update(id, request.into()).await?))
}

#[utoipa::path(
    delete,
    path = "/api/blog/{id}",
    summary = "Delete post",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post deleted", body = SuccessResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Post not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "blog"
)]
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    let id = services::parse_id(&id, NOT_FOUND)?;
    state.services.blog.delete(id).await?;
    Ok(SuccessResponse::ok())
}

#[utoipa::path(
    get,
    path = "/api/public/blog",
    summary = "List published posts",
    params(PublicBlogParams),
    responses(
        (status = 200, description = "Published posts newest first", body = [BlogPostView]),
    ),
    tag = "blog"
)]
pub async fn list_published_posts(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<PublicBlogParams>,
) -> ApiResult<Json<Vec<BlogPostView>>> {
    Ok(Json(
        state
            .services
            .blog
            .list_published(params.tag, params.limit)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/public/blog/{slug}",
    summary = "Read a published post",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Post", body = BlogPostView),
        (status = 404, description = "No published post with this slug", body = crate::errors::ErrorResponse),
    ),
    tag = "blog"
)]
pub async fn get_published_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<BlogPostView>> {
    Ok(Json(
        state.services.blog.get_published_by_slug(&slug).await?,
    ))
}

/// Every `/api/blog` route is admin-only.
pub fn blog_routes(auth: Arc<AuthService>) -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/:id", get(get_post).put(update_post).delete(delete_post))
        .with_admin(auth)
}

pub fn public_blog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_published_posts))
        .route("/:slug", get(get_published_post))
}
