//! BestOf API Library
//!
//! Storefront and blog backend for the bilingual BestOf site: catalog,
//! customer orders, blog, homepage slides and trusted-company logos, with an
//! ADMIN-only back office.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod i18n;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod site;
pub mod tracing;

use crate::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    errors::ServiceError,
    handlers::AppServices,
    i18n::Locale,
};
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    http::HeaderValue,
    Router,
};
use sea_orm::DatabaseConnection;
use std::{sync::Arc, time::Duration};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    timeout::TimeoutLayer,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: AppConfig) -> Self {
        let auth = Arc::new(AuthService::new(AuthConfig::from(&config), db.clone()));
        Self {
            services: AppServices::new(db.clone()),
            db,
            config: Arc::new(config),
            auth,
        }
    }

    pub fn default_locale(&self) -> Locale {
        Locale::parse(&self.config.default_locale).unwrap_or_default()
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

fn cors_layer(cfg: &AppConfig) -> Result<CorsLayer, ServiceError> {
    let origins: Vec<HeaderValue> = cfg
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(cfg.cors_allow_credentials));
    }

    if cfg.should_allow_permissive_cors() {
        ::tracing::info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        return Ok(CorsLayer::permissive());
    }

    Err(ServiceError::InternalError(
        "Missing CORS configuration: set BESTOF__CORS_ALLOWED_ORIGINS or BESTOF__CORS_ALLOW_ANY_ORIGIN=true"
            .to_string(),
    ))
}

/// The complete application: API, health, docs, and the locale-gated site.
pub fn build_app(state: AppState) -> Result<Router, ServiceError> {
    let cfg = state.config.clone();
    let site = site::site_router(
        &cfg.static_dir,
        site::SiteState {
            auth: state.auth.clone(),
            default_locale: state.default_locale(),
        },
    );

    let app = Router::new()
        .nest("/api", handlers::api_routes(state.auth.clone()))
        .with_state(state.clone())
        .nest("/health", health::health_routes(state.db.clone()))
        .merge(openapi::swagger_ui())
        .fallback_service(site)
        .layer(DefaultBodyLimit::max(cfg.max_body_size))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .layer(cors_layer(&cfg)?)
        .layer(crate::tracing::configure_http_tracing())
        .layer(axum::middleware::from_fn(
            middleware_helpers::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ));

    Ok(app)
}
