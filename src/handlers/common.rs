use crate::errors::ServiceError;
use async_trait::async_trait;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, Request,
    },
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

pub type ApiResult<T> = Result<T, ServiceError>;

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Body of deletes that answer 200.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// `?id=` selector used by the query-string addressed resources.
#[derive(Debug, Deserialize, IntoParams)]
pub struct IdQuery {
    /// Resource id
    pub id: Option<String>,
}

impl IdQuery {
    /// A missing or malformed id cannot name a row.
    pub fn require(&self, not_found: &str) -> Result<uuid::Uuid, ServiceError> {
        match self.id.as_deref() {
            Some(raw) => crate::services::parse_id(raw, not_found),
            None => Err(ServiceError::ValidationError("id is required".to_string())),
        }
    }
}

/// `axum::Json` with rejections reported as 400 in the common error shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(malformed(rejection)),
        }
    }
}

fn malformed(rejection: JsonRejection) -> ServiceError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ServiceError::PayloadTooLarge(rejection.body_text());
    }
    ServiceError::MalformedBody(rejection.body_text())
}

/// `axum::extract::Query` with rejections reported in the common error shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| QueryParams(value))
            .map_err(|rejection: QueryRejection| {
                ServiceError::MalformedQuery(rejection.body_text())
            })
    }
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field
/// (`None`, via `#[serde(default)]`).
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header;

    #[derive(Debug, Deserialize)]
    struct SampleBody {
        name: String,
        #[serde(default, deserialize_with = "present")]
        image_url: Option<Option<String>>,
    }

    async fn extract(body: &str) -> Result<JsonBody<SampleBody>, ServiceError> {
        let request = Request::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        JsonBody::<SampleBody>::from_request(request, &()).await
    }

    #[tokio::test]
    async fn syntax_errors_are_bad_requests() {
        let err = extract("{not json").await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn wrong_types_are_bad_requests_too() {
        let err = extract(r#"{"name": 3}"#).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[derive(Debug, Deserialize)]
    struct Paging {
        limit: Option<u64>,
    }

    async fn query(uri: &str) -> Result<QueryParams<Paging>, ServiceError> {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (mut parts, _) = request.into_parts();
        QueryParams::<Paging>::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn malformed_query_is_a_bad_request_with_details() {
        let err = query("/api/public/blog?limit=abc").await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.response_message(), "Invalid query string");

        let QueryParams(ok) = query("/api/public/blog?limit=3").await.unwrap();
        assert_eq!(ok.limit, Some(3));
    }

    #[tokio::test]
    async fn oversized_body_keeps_payload_too_large() {
        use axum::extract::DefaultBodyLimit;
        use axum::{routing::post, Router};
        use tower::ServiceExt;

        async fn accept(JsonBody(_): JsonBody<serde_json::Value>) -> StatusCode {
            StatusCode::OK
        }

        let app = Router::new()
            .route("/", post(accept))
            .layer(DefaultBodyLimit::max(16));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(format!("\"{}\"", "x".repeat(64))))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn null_and_absent_differ() {
        let JsonBody(absent) = extract(r#"{"name":"x"}"#).await.unwrap();
        assert_eq!(absent.image_url, None);
        let JsonBody(null) = extract(r#"{"name":"x","image_url":null}"#).await.unwrap();
        assert_eq!(null.image_url, Some(None));
        assert_eq!(null.name, "x");
    }
}
