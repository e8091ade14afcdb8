mod common;

use axum::http::{header, Method, StatusCode};
use rstest::rstest;
use serde_json::json;

use common::{read_json, TestApp, ADMIN_EMAIL, ADMIN_PASSWORD};

#[tokio::test]
async fn sign_in_sets_session_cookie() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/auth/signin",
            Some(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("bestof_session="));
    assert!(cookie.contains("HttpOnly"));

    let body = read_json(response).await;
    assert_eq!(body["user"]["email"], ADMIN_EMAIL);
    assert_eq!(body["user"]["role"], "ADMIN");
    let token = body["token"].as_str().unwrap().to_string();

    let session_cookie = format!("bestof_session={token}");
    let session = app
        .request_with_headers(
            Method::GET,
            "/api/auth/session",
            None,
            &[("cookie", session_cookie.as_str())],
        )
        .await;
    assert_eq!(session.status(), StatusCode::OK);
    assert_eq!(read_json(session).await["email"], ADMIN_EMAIL);

    // Cookie sessions are accepted on admin routes too.
    let orders = app
        .request_with_headers(
            Method::GET,
            "/api/orders",
            None,
            &[("cookie", session_cookie.as_str())],
        )
        .await;
    assert_eq!(orders.status(), StatusCode::OK);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::POST,
            "/api/auth/signin",
            Some(json!({ "email": ADMIN_EMAIL, "password": "not-the-password" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let missing = app
        .request(
            Method::POST,
            "/api/auth/signin",
            Some(json!({ "email": ADMIN_EMAIL })),
            None,
        )
        .await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sign_out_clears_cookie() {
    let app = TestApp::new().await;
    let response = app
        .request(Method::POST, "/api/auth/signout", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("bestof_session=;"));
    assert!(cookie.contains("Max-Age=0"));
    assert_eq!(read_json(response).await, json!({ "success": true }));
}

#[tokio::test]
async fn session_without_token_is_unauthorized() {
    let app = TestApp::new().await;
    let response = app
        .request(Method::GET, "/api/auth/session", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let forged = app
        .request(Method::GET, "/api/auth/session", None, Some("not-a-jwt"))
        .await;
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[case(Method::POST, "/api/categories")]
#[case(Method::PUT, "/api/categories?id=00000000-0000-0000-0000-000000000000")]
#[case(Method::DELETE, "/api/categories?id=00000000-0000-0000-0000-000000000000")]
#[case(Method::POST, "/api/products")]
#[case(Method::PUT, "/api/products/00000000-0000-0000-0000-000000000000")]
#[case(Method::DELETE, "/api/products/00000000-0000-0000-0000-000000000000")]
#[case(Method::GET, "/api/orders")]
#[case(Method::PATCH, "/api/orders?id=00000000-0000-0000-0000-000000000000")]
#[case(Method::DELETE, "/api/orders?id=00000000-0000-0000-0000-000000000000")]
#[case(Method::GET, "/api/blog")]
#[case(Method::POST, "/api/blog")]
#[case(Method::PUT, "/api/blog/00000000-0000-0000-0000-000000000000")]
#[case(Method::DELETE, "/api/blog/00000000-0000-0000-0000-000000000000")]
#[case(Method::POST, "/api/slides")]
#[case(Method::PUT, "/api/slides/00000000-0000-0000-0000-000000000000")]
#[case(Method::DELETE, "/api/slides/00000000-0000-0000-0000-000000000000")]
#[case(Method::POST, "/api/slides/00000000-0000-0000-0000-000000000000/move")]
#[case(Method::POST, "/api/trusted-companies")]
#[case(Method::GET, "/api/trusted-companies/00000000-0000-0000-0000-000000000000")]
#[case(Method::PUT, "/api/trusted-companies/00000000-0000-0000-0000-000000000000")]
#[case(Method::DELETE, "/api/trusted-companies/00000000-0000-0000-0000-000000000000")]
#[tokio::test]
async fn admin_routes_reject_missing_and_non_admin_sessions(
    #[case] method: Method,
    #[case] uri: &str,
) {
    let app = TestApp::new().await;
    let body = Some(json!({}));

    let anonymous = app.request(method.clone(), uri, body.clone(), None).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");

    let plain_user = app
        .request(method.clone(), uri, body, Some(app.user_token()))
        .await;
    assert_eq!(plain_user.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
}

#[rstest]
#[case("/api/categories")]
#[case("/api/products")]
#[case("/api/slides")]
#[case("/api/public/blog")]
#[case("/api/public/trusted-companies")]
#[case("/api/trusted-companies")]
#[tokio::test]
async fn public_reads_need_no_session(#[case] uri: &str) {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, uri, None, None).await;
    assert_eq!(response.status(), StatusCode::OK, "{uri}");
}
