pub mod auth;
pub mod blog;
pub mod categories;
pub mod common;
pub mod locale;
pub mod orders;
pub mod products;
pub mod slides;
pub mod trusted_companies;

use crate::{
    auth::AuthService,
    db::DbPool,
    errors::ServiceError,
    services::{
        blog::BlogService, categories::CategoryService, orders::OrderService,
        products::ProductService, slides::SlideService,
        trusted_companies::TrustedCompanyService,
    },
    AppState,
};
use axum::Router;
use std::sync::Arc;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub categories: Arc<CategoryService>,
    pub products: Arc<ProductService>,
    pub orders: Arc<OrderService>,
    pub blog: Arc<BlogService>,
    pub slides: Arc<SlideService>,
    pub trusted_companies: Arc<TrustedCompanyService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            categories: Arc::new(CategoryService::new(db_pool.clone())),
            products: Arc::new(ProductService::new(db_pool.clone())),
            orders: Arc::new(OrderService::new(db_pool.clone())),
            blog: Arc::new(BlogService::new(db_pool.clone())),
            slides: Arc::new(SlideService::new(db_pool.clone())),
            trusted_companies: Arc::new(TrustedCompanyService::new(db_pool)),
        }
    }
}

/// Everything under `/api`.
pub fn api_routes(auth: Arc<AuthService>) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::auth_routes())
        .nest("/categories", categories::category_routes(auth.clone()))
        .nest("/products", products::product_routes(auth.clone()))
        .nest("/orders", orders::order_routes(auth.clone()))
        .nest("/blog", blog::blog_routes(auth.clone()))
        .nest("/slides", slides::slide_routes(auth.clone()))
        .nest(
            "/trusted-companies",
            trusted_companies::trusted_company_routes(auth),
        )
        .nest("/public/blog", blog::public_blog_routes())
        .nest(
            "/public/trusted-companies",
            trusted_companies::public_trusted_company_routes(),
        )
        .merge(locale::locale_routes())
        .fallback(api_not_found)
}

async fn api_not_found() -> ServiceError {
    ServiceError::NotFound("Not found".to_string())
}
