mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{id_of, read_json, TestApp, ADMIN_EMAIL};

async fn create_post(app: &TestApp, body: Value) -> Value {
    let response = app.admin(Method::POST, "/api/blog", Some(body)).await;
    assert_eq!(response.status(), StatusCode::OK);
    read_json(response).await
}

#[tokio::test]
async fn author_comes_from_the_session() {
    let app = TestApp::new().await;
    let post = create_post(
        &app,
        json!({
            "title": "Hello, World!",
            "content": "First post",
            "authorId": uuid::Uuid::new_v4(),
        }),
    )
    .await;

    assert_eq!(post["slug"], "hello-world");
    assert_eq!(post["published"], false);
    assert_eq!(post["authorId"], app.admin_user.id.to_string());
    assert_eq!(post["author"]["email"], ADMIN_EMAIL);
}

#[tokio::test]
async fn duplicate_slug_is_rejected() {
    let app = TestApp::new().await;
    create_post(&app, json!({ "title": "Best Laptops 2024", "content": "..." })).await;

    let clash = app
        .admin(
            Method::POST,
            "/api/blog",
            Some(json!({ "title": "Another", "content": "...", "slug": "Best Laptops 2024" })),
        )
        .await;
    assert_eq!(clash.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json(clash).await["error"],
        "A post with this slug already exists"
    );
}

#[tokio::test]
async fn title_and_content_are_required() {
    let app = TestApp::new().await;
    let response = app
        .admin(Method::POST, "/api/blog", Some(json!({ "title": "Only a title" })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json(response).await["error"],
        "Title and content are required"
    );
}

#[tokio::test]
async fn public_listing_hides_drafts_and_emails() {
    let app = TestApp::new().await;
    create_post(
        &app,
        json!({ "title": "Draft", "content": "wip", "tags": ["news"] }),
    )
    .await;
    create_post(
        &app,
        json!({
            "title": "Launch",
            "content": "We are live",
            "published": true,
            "tags": ["news", " news ", "launch"],
        }),
    )
    .await;

    let public = read_json(app.request(Method::GET, "/api/public/blog", None, None).await).await;
    let posts = public.as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["slug"], "launch");
    assert_eq!(posts[0]["tags"], json!(["news", "launch"]));
    assert!(posts[0]["author"].get("email").is_none());

    let by_slug = app
        .request(Method::GET, "/api/public/blog/launch", None, None)
        .await;
    assert_eq!(by_slug.status(), StatusCode::OK);

    let draft = app
        .request(Method::GET, "/api/public/blog/draft", None, None)
        .await;
    assert_eq!(draft.status(), StatusCode::NOT_FOUND);

    let admin = read_json(app.admin(Method::GET, "/api/blog", None).await).await;
    assert_eq!(admin.as_array().map(Vec::len), Some(2));

    let drafts_only = read_json(app.admin(Method::GET, "/api/blog?published=false", None).await).await;
    assert_eq!(drafts_only.as_array().map(Vec::len), Some(1));

    let tagged = read_json(
        app.request(Method::GET, "/api/public/blog?tag=launch", None, None)
            .await,
    )
    .await;
    assert_eq!(tagged.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn admin_blog_routes_need_an_admin_session() {
    let app = TestApp::new().await;

    let anonymous = app.request(Method::GET, "/api/blog", None, None).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let plain_user = app
        .request(
            Method::POST,
            "/api/blog",
            Some(json!({ "title": "Nope", "content": "Nope" })),
            Some(app.user_token()),
        )
        .await;
    assert_eq!(plain_user.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn update_rederives_slug_and_delete_removes() {
    let app = TestApp::new().await;
    let post = create_post(&app, json!({ "title": "Old title", "content": "body" })).await;
    let id = id_of(&post);

    let updated = app
        .admin(
            Method::PUT,
            &format!("/api/blog/{id}"),
            Some(json!({ "title": "New title", "content": "body", "published": true })),
        )
        .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let updated = read_json(updated).await;
    assert_eq!(updated["slug"], "new-title");
    assert_eq!(updated["published"], true);

    let deleted = app
        .admin(Method::DELETE, &format!("/api/blog/{id}"), None)
        .await;
    assert_eq!(deleted.status(), StatusCode::OK);

    let gone = app.admin(Method::GET, &format!("/api/blog/{id}"), None).await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}
