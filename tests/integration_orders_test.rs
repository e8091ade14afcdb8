mod common;

use axum::http::{header, Method, StatusCode};
use serde_json::json;

use common::{id_of, read_body, read_json, TestApp};

async fn seeded_product(app: &TestApp) -> String {
    let category_id = id_of(&app.create_category("Laptops").await);
    id_of(
        &app.create_product(&category_id, "Laptop 14\", 16GB", json!(1299.5))
            .await,
    )
}

#[tokio::test]
async fn anonymous_visitor_can_place_an_order() {
    let app = TestApp::new().await;
    let product_id = seeded_product(&app).await;

    let order = app.place_order(&product_id).await;
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["companyName"], "Acme");
    assert_eq!(order["product"]["id"], product_id.as_str());
}

#[tokio::test]
async fn order_requires_contact_fields_and_valid_email() {
    let app = TestApp::new().await;
    let product_id = seeded_product(&app).await;

    let missing_city = app
        .request(
            Method::POST,
            "/api/orders",
            Some(json!({
                "name": "Jane",
                "phone": "0102030405",
                "email": "jane@example.com",
                "productId": product_id,
            })),
            None,
        )
        .await;
    assert_eq!(missing_city.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(missing_city).await["error"], "City is required");

    let bad_email = app
        .request(
            Method::POST,
            "/api/orders",
            Some(json!({
                "name": "Jane",
                "city": "Lyon",
                "phone": "0102030405",
                "email": "not-an-email",
                "productId": product_id,
            })),
            None,
        )
        .await;
    assert_eq!(bad_email.status(), StatusCode::BAD_REQUEST);

    let unknown_product = app
        .request(
            Method::POST,
            "/api/orders",
            Some(json!({
                "name": "Jane",
                "city": "Lyon",
                "phone": "0102030405",
                "email": "jane@example.com",
                "productId": uuid::Uuid::new_v4(),
            })),
            None,
        )
        .await;
    assert_eq!(unknown_product.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(unknown_product).await["error"], "Product does not exist");
}

#[tokio::test]
async fn listing_orders_is_admin_only() {
    let app = TestApp::new().await;

    let anonymous = app.request(Method::GET, "/api/orders", None, None).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let plain_user = app
        .request(Method::GET, "/api/orders", None, Some(app.user_token()))
        .await;
    assert_eq!(plain_user.status(), StatusCode::UNAUTHORIZED);

    let admin = app.admin(Method::GET, "/api/orders", None).await;
    assert_eq!(admin.status(), StatusCode::OK);
    assert_eq!(read_json(admin).await, json!([]));
}

#[tokio::test]
async fn status_follows_the_lifecycle() {
    let app = TestApp::new().await;
    let product_id = seeded_product(&app).await;
    let order_id = id_of(&app.place_order(&product_id).await);
    let uri = format!("/api/orders?id={order_id}");

    let skip_ahead = app
        .admin(Method::PATCH, &uri, Some(json!({ "status": "DELIVERED" })))
        .await;
    assert_eq!(skip_ahead.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json(skip_ahead).await["error"],
        "Cannot change order status from PENDING to DELIVERED"
    );

    for next in ["CONFIRMED", "CONFIRMED", "SHIPPED", "DELIVERED"] {
        let response = app
            .admin(Method::PATCH, &uri, Some(json!({ "status": next })))
            .await;
        assert_eq!(response.status(), StatusCode::OK, "moving to {next}");
        assert_eq!(read_json(response).await["status"], next);
    }

    let reopen = app
        .admin(Method::PATCH, &uri, Some(json!({ "status": "CANCELLED" })))
        .await;
    assert_eq!(reopen.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_status_is_rejected() {
    let app = TestApp::new().await;
    let product_id = seeded_product(&app).await;
    let order_id = id_of(&app.place_order(&product_id).await);

    let response = app
        .admin(
            Method::PATCH,
            &format!("/api/orders?id={order_id}"),
            Some(json!({ "status": "LOST" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "Valid status is required");
}

#[tokio::test]
async fn csv_export_has_one_row_per_order() {
    let app = TestApp::new().await;
    let product_id = seeded_product(&app).await;
    app.place_order(&product_id).await;
    app.place_order(&product_id).await;

    let response = app.admin(Method::GET, "/api/orders?format=csv", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=orders.csv"
    );

    let body = read_body(response).await;
    let mut reader = csv::Reader::from_reader(body.as_bytes());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "Order ID");
    assert_eq!(&headers[9], "Date");

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][6], "Laptop 14\", 16GB");
    assert_eq!(&rows[0][8], "PENDING");
}

#[tokio::test]
async fn delete_order() {
    let app = TestApp::new().await;
    let product_id = seeded_product(&app).await;
    let order_id = id_of(&app.place_order(&product_id).await);

    let deleted = app
        .admin(Method::DELETE, &format!("/api/orders?id={order_id}"), None)
        .await;
    assert_eq!(deleted.status(), StatusCode::OK);

    let again = app
        .admin(Method::DELETE, &format!("/api/orders?id={order_id}"), None)
        .await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}
