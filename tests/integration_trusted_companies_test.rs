mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{id_of, read_json, TestApp};

#[tokio::test]
async fn trusted_company_lifecycle() {
    let app = TestApp::new().await;

    let created = app
        .admin(
            Method::POST,
            "/api/trusted-companies",
            Some(json!({ "name": "Acme", "logoUrl": "https://cdn.example.com/acme.png" })),
        )
        .await;
    assert_eq!(created.status(), StatusCode::OK);
    let created = read_json(created).await;
    let id = id_of(&created);

    let public = read_json(
        app.request(Method::GET, "/api/public/trusted-companies", None, None)
            .await,
    )
    .await;
    assert_eq!(public[0]["name"], "Acme");

    let privileged = read_json(app.admin(Method::GET, "/api/trusted-companies", None).await).await;
    assert_eq!(public, privileged);

    let updated = app
        .admin(
            Method::PUT,
            &format!("/api/trusted-companies/{id}"),
            Some(json!({ "name": "Acme Corp", "logoUrl": "https://cdn.example.com/acme2.png" })),
        )
        .await;
    assert_eq!(updated.status(), StatusCode::OK);
    assert_eq!(read_json(updated).await["name"], "Acme Corp");

    let deleted = app
        .admin(Method::DELETE, &format!("/api/trusted-companies/{id}"), None)
        .await;
    assert_eq!(deleted.status(), StatusCode::OK);

    let empty = read_json(
        app.request(Method::GET, "/api/trusted-companies", None, None)
            .await,
    )
    .await;
    assert_eq!(empty, json!([]));
}

#[tokio::test]
async fn trusted_company_requires_name_and_logo() {
    let app = TestApp::new().await;
    let response = app
        .admin(
            Method::POST,
            "/api/trusted-companies",
            Some(json!({ "name": "Acme" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "Logo URL is required");

    let anonymous = app
        .request(
            Method::POST,
            "/api/trusted-companies",
            Some(json!({ "name": "Acme", "logoUrl": "x" })),
            None,
        )
        .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn storage_failure_is_hidden_from_visitors_only() {
    use sea_orm::ConnectionTrait;

    let app = TestApp::new().await;
    app.state
        .db
        .execute_unprepared("DROP TABLE trusted_companies")
        .await
        .expect("drop table");

    for uri in ["/api/trusted-companies", "/api/public/trusted-companies"] {
        let anonymous = app.request(Method::GET, uri, None, None).await;
        assert_eq!(anonymous.status(), StatusCode::OK, "{uri}");
        assert_eq!(read_json(anonymous).await, json!([]));
    }

    let admin = app.admin(Method::GET, "/api/trusted-companies", None).await;
    assert_eq!(admin.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(read_json(admin).await["error"], "Internal server error");
}
