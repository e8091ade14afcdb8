#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use bestof_api::{
    config::AppConfig,
    db,
    entities::user::{self, UserRole},
    services::users::UserService,
    AppState,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@bestof.test";
pub const ADMIN_PASSWORD: &str = "admin-password-123";

/// Full application over a private in-memory SQLite database, with one
/// ADMIN and one plain USER already signed in.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub admin_user: user::Model,
    admin_token: String,
    user_token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "k3J9xQ2mV8pL5wR7tY1uN4bC6dF0gH2s".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // One connection: every query sees the same in-memory database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.cors_allow_any_origin = true;
        cfg.static_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/public").to_string();

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let pool = Arc::new(pool);

        let (admin_user, _) = UserService::new(pool.clone())
            .upsert_admin(ADMIN_EMAIL, Some("Site Admin".to_string()), ADMIN_PASSWORD)
            .await
            .expect("seed admin");

        let now = Utc::now();
        let plain_user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(Some("Visitor".to_string())),
            email: Set("visitor@bestof.test".to_string()),
            password_hash: Set(String::new()),
            role: Set(UserRole::User),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(pool.as_ref())
        .await
        .expect("seed user");

        let state = AppState::new(pool, cfg);
        let admin_token = state.auth.issue_session(&admin_user).expect("admin token").token;
        let user_token = state
            .auth
            .issue_session(&plain_user)
            .expect("user token")
            .token;
        let router = bestof_api::build_app(state.clone()).expect("build app");

        Self {
            router,
            state,
            admin_user,
            admin_token,
            user_token,
        }
    }

    pub fn admin_token(&self) -> &str {
        &self.admin_token
    }

    pub fn user_token(&self) -> &str {
        &self.user_token
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut headers = Vec::new();
        let bearer = token.map(|tok| format!("Bearer {tok}"));
        if let Some(bearer) = bearer.as_deref() {
            headers.push(("authorization", bearer));
        }
        self.request_with_headers(method, uri, body, &headers).await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Admin-authenticated JSON request.
    pub async fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.request(method, uri, body, Some(self.admin_token()))
            .await
    }

    pub async fn create_category(&self, name: &str) -> Value {
        let response = self
            .admin(Method::POST, "/api/categories", Some(json!({ "name": name })))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        read_json(response).await
    }

    pub async fn create_product(&self, category_id: &str, name: &str, price: Value) -> Value {
        let response = self
            .admin(
                Method::POST,
                "/api/products",
                Some(json!({
                    "name": name,
                    "description": format!("{name} description"),
                    "price": price,
                    "categoryId": category_id,
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        read_json(response).await
    }

    pub async fn place_order(&self, product_id: &str) -> Value {
        let response = self
            .request(
                Method::POST,
                "/api/orders",
                Some(json!({
                    "name": "Jane Doe",
                    "companyName": "Acme",
                    "city": "Lyon",
                    "phone": "+33 1 23 45 67 89",
                    "email": "jane@example.com",
                    "productId": product_id,
                })),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        read_json(response).await
    }
}

pub async fn read_body(response: Response) -> String {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub async fn read_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("parse response body")
}

pub fn id_of(value: &Value) -> String {
    value["id"].as_str().expect("id field").to_string()
}
