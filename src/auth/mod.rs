/*!
 * # Authentication and Authorization Module
 *
 * Session tokens are HS256 JWTs issued at sign-in. They travel either as an
 * `Authorization: Bearer` header or in the session cookie (header wins).
 *
 * Authorization has one level: ADMIN. Admin routes are wrapped with
 * [`AuthRouterExt::with_admin`], which runs [`require_admin`] and leaves an
 * [`AuthUser`] in the request extensions for handlers to extract.
 */

pub mod password;

use crate::config::AppConfig;
use crate::entities::user::{self, UserRole};
use crate::errors::ServiceError;
use crate::middleware_helpers::cookies::{read_cookie, SetCookie};
use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::MethodRouter,
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Claim structure for session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,          // Subject (user ID)
    pub email: String,        // User's email
    pub name: Option<String>, // User's display name
    pub role: UserRole,       // ADMIN or USER
    pub jti: String,          // Token ID
    pub iat: i64,             // Issued at
    pub exp: i64,             // Expiration time
    pub iss: String,          // Issuer
}

/// Authenticated user data extracted from the session token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<&user::Model> for AuthUser {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

impl TryFrom<Claims> for AuthUser {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?,
            name: claims.name,
            email: claims.email,
            role: claims.role,
        })
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub session_secret: String,
    pub issuer: String,
    pub session_ttl: Duration,
    pub cookie_name: String,
    pub cookie_secure: bool,
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            session_secret: cfg.session_secret.clone(),
            issuer: cfg.auth_issuer.clone(),
            session_ttl: Duration::from_secs(cfg.session_ttl_secs),
            cookie_name: cfg.session_cookie_name.clone(),
            cookie_secure: cfg.session_cookie_secure,
        }
    }
}

/// A freshly signed session
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Authentication service that handles credential checks and session tokens
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    pub db: Arc<DatabaseConnection>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Checks an email/password pair. Every failure looks the same to the caller.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<user::Model, AuthError> {
        let email = email.trim().to_lowercase();
        let user = user::Entity::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .one(&*self.db)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let matches = password::verify_password(password, &user.password_hash)
            .map_err(|e| AuthError::InternalError(e.to_string()))?;
        if !matches {
            debug!(user_id = %user.id, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Signs a session token for `user`.
    pub fn issue_session(&self, user: &user::Model) -> Result<IssuedSession, AuthError> {
        let now = Utc::now();
        let expires_at = now
            + ChronoDuration::from_std(self.config.session_ttl)
                .map_err(|_| AuthError::InternalError("Invalid session duration".to_string()))?;

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.config.issuer.clone(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.session_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(IssuedSession { token, expires_at })
    }

    /// Validate a session token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.issuer.as_str()]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.session_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }

    /// Bearer header first, then the session cookie.
    pub fn token_from_headers<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty());

        bearer.or_else(|| read_cookie(headers, &self.config.cookie_name))
    }

    pub fn user_from_headers(&self, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
        let token = self.token_from_headers(headers).ok_or(AuthError::MissingAuth)?;
        AuthUser::try_from(self.validate_token(token)?)
    }

    pub fn session_cookie(&self, session: &IssuedSession) -> SetCookie {
        SetCookie::new(&self.config.cookie_name, &session.token)
            .max_age(self.config.session_ttl.as_secs() as i64)
            .http_only(true)
            .secure(self.config.cookie_secure)
    }

    pub fn cleared_session_cookie(&self) -> SetCookie {
        SetCookie::removal(&self.config.cookie_name)
            .http_only(true)
            .secure(self.config.cookie_secure)
    }
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                ServiceError::Unauthorized("Invalid credentials".to_string())
            }
            AuthError::MissingAuth | AuthError::InsufficientPermissions => {
                ServiceError::Unauthorized("Unauthorized".to_string())
            }
            AuthError::InvalidToken | AuthError::TokenExpired => {
                ServiceError::JwtError(err.to_string())
            }
            AuthError::TokenCreation(msg) => ServiceError::InternalError(msg),
            AuthError::DatabaseError(db) => ServiceError::DatabaseError(db),
            AuthError::InternalError(msg) => ServiceError::InternalError(msg),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ServiceError::from(self).into_response()
    }
}

/// Rejects anything but a valid ADMIN session with 401 and exposes the
/// caller as an [`AuthUser`] extension.
pub async fn require_admin(
    State(auth_service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = auth_service.user_from_headers(request.headers())?;

    if !user.is_admin() {
        warn!(user_id = %user.id, path = %request.uri().path(), "non-admin session rejected");
        return Err(AuthError::InsufficientPermissions);
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// The admin guard's output. Fails closed when the guard did not run.
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// Caller's session if one is present and valid, never a rejection.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl MaybeAuthUser {
    pub fn is_admin(&self) -> bool {
        self.0.as_ref().map_or(false, AuthUser::is_admin)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    Arc<AuthService>: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(Self(Some(user.clone())));
        }

        let auth_service = Arc::<AuthService>::from_ref(state);
        Ok(Self(auth_service.user_from_headers(&parts.headers).ok()))
    }
}

/// Attaches [`require_admin`] to matched routes only, so unknown paths and
/// methods still answer 404/405.
pub trait AuthRouterExt {
    fn with_admin(self, auth_service: Arc<AuthService>) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_admin(self, auth_service: Arc<AuthService>) -> Self {
        self.route_layer(axum::middleware::from_fn_with_state(
            auth_service,
            require_admin,
        ))
    }
}

impl<S> AuthRouterExt for MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_admin(self, auth_service: Arc<AuthService>) -> Self {
        self.route_layer(axum::middleware::from_fn_with_state(
            auth_service,
            require_admin,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    fn service(ttl: Duration) -> AuthService {
        AuthService::new(
            AuthConfig {
                session_secret: "k3J9xQ2mV8pL5wR7tY1uN4bC6dF0gH2s".into(),
                issuer: "bestof-api".into(),
                session_ttl: ttl,
                cookie_name: "bestof_session".into(),
                cookie_secure: false,
            },
            Arc::new(DatabaseConnection::Disconnected),
        )
    }

    fn admin() -> user::Model {
        let now = Utc::now();
        user::Model {
            id: Uuid::new_v4(),
            name: Some("Ada".into()),
            email: "ada@bestof.example".into(),
            password_hash: String::new(),
            role: UserRole::Admin,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn issued_tokens_validate() {
        let svc = service(Duration::from_secs(3600));
        let user = admin();
        let session = svc.issue_session(&user).unwrap();

        let claims = svc.validate_token(&session.token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.exp, session.expires_at.timestamp());
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let svc = service(Duration::from_secs(3600));
        let mut other = service(Duration::from_secs(3600));
        other.config.session_secret = "another_secret_value_with_enough_chars".into();

        let token = other.issue_session(&admin()).unwrap().token;
        assert_matches!(svc.validate_token(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let svc = service(Duration::from_secs(3600));
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "old@bestof.example".into(),
            name: None,
            role: UserRole::Admin,
            jti: "old".into(),
            iat: (now - ChronoDuration::hours(3)).timestamp(),
            exp: (now - ChronoDuration::hours(2)).timestamp(),
            iss: "bestof-api".into(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(svc.config.session_secret.as_bytes()),
        )
        .unwrap();

        assert_matches!(svc.validate_token(&token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let svc = service(Duration::from_secs(3600));
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("bestof_session=from-cookie"),
        );
        assert_eq!(svc.token_from_headers(&headers), Some("from-cookie"));

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );
        assert_eq!(svc.token_from_headers(&headers), Some("from-header"));
    }

    #[test]
    fn session_cookie_is_http_only() {
        let svc = service(Duration::from_secs(60));
        let session = svc.issue_session(&admin()).unwrap();
        let cookie = svc.session_cookie(&session).to_string();
        assert!(cookie.starts_with("bestof_session="));
        assert!(cookie.contains("Max-Age=60"));
        assert!(cookie.contains("HttpOnly"));
        assert!(svc
            .cleared_session_cookie()
            .to_string()
            .contains("Max-Age=0"));
    }

    #[test]
    fn auth_errors_render_as_unauthorized() {
        for err in [
            AuthError::MissingAuth,
            AuthError::InsufficientPermissions,
            AuthError::InvalidToken,
            AuthError::InvalidCredentials,
        ] {
            assert_eq!(
                ServiceError::from(err).status_code(),
                axum::http::StatusCode::UNAUTHORIZED
            );
        }
    }

    #[test]
    fn signing_failures_are_server_errors() {
        let err = ServiceError::from(AuthError::TokenCreation("bad key".into()));
        assert_eq!(
            err.status_code(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(err.response_message(), "Internal server error");
    }
}
