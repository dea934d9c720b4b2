mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tower::ServiceExt;

use perfume_storefront::routes::build_app;

use common::{create_category, create_product, setup_state};

async fn send(app: &Router, request: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> anyhow::Result<Request<Body>> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    Ok(builder.body(Body::from(body.to_string()))?)
}

fn get(uri: &str, token: Option<&str>) -> anyhow::Result<Request<Body>> {
    let mut builder = Request::get(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    Ok(builder.body(Body::empty())?)
}

#[tokio::test]
async fn health_reports_database_up() -> anyhow::Result<()> {
    let app = build_app(setup_state().await?);

    let (status, body) = send(&app, get("/health", None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Health check");
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], "up");
    Ok(())
}

#[tokio::test]
async fn unknown_paths_fall_back_to_json_404() -> anyhow::Result<()> {
    let app = build_app(setup_state().await?);

    let (status, body) = send(&app, get("/nowhere", None)?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not Found");
    assert_eq!(body["data"]["success"], false);
    assert_eq!(body["data"]["error"], "Not Found");
    Ok(())
}

#[tokio::test]
async fn cart_requires_a_bearer_token() -> anyhow::Result<()> {
    let app = build_app(setup_state().await?);

    let (status, body) = send(&app, get("/api/cart/count", None)?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["data"]["success"], false);

    let (status, _) = send(&app, get("/api/cart/count", Some("Bearer not-a-jwt"))?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn register_login_and_fill_cart_over_http() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let category = create_category(&state, "Floral").await?;
    let product = create_product(&state, &category, "Midnight Rose", dec!(10), 5).await?;
    let app = build_app(state);

    let (status, body) = send(
        &app,
        post_json(
            "/api/auth/register",
            None,
            json!({
                "email": "Shopper@Example.com",
                "password": "password123",
                "password_confirm": "password123",
                "first_name": "Grace",
                "last_name": "Hopper"
            }),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["email"], "shopper@example.com");

    let (status, body) = send(
        &app,
        post_json(
            "/api/auth/register",
            None,
            json!({
                "email": "other@example.com",
                "password": "password123",
                "password_confirm": "password321",
                "first_name": "Grace",
                "last_name": "Hopper"
            }),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["data"]["fields"]["password_confirm"].is_array());

    let (status, body) = send(
        &app,
        post_json(
            "/api/auth/login",
            None,
            json!({ "email": "shopper@example.com", "password": "password123" }),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().unwrap_or_default().to_string();
    assert!(token.starts_with("Bearer "));

    let (status, body) = send(
        &app,
        post_json(
            "/api/cart/add",
            Some(&token),
            json!({ "product_id": product.id, "quantity": 2 }),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product added to cart");
    assert_eq!(body["cart_count"], 2);

    let (status, body) = send(&app, get("/api/cart/count", Some(&token))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    Ok(())
}

#[tokio::test]
async fn catalog_lists_active_products() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let category = create_category(&state, "Woody").await?;
    create_product(&state, &category, "Cedar Trail", dec!(40), 5).await?;
    create_product(&state, &category, "Sandal Dusk", dec!(55), 0).await?;
    let app = build_app(state);

    let (status, body) = send(&app, get("/api/products?q=cedar", None)?).await?;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Cedar Trail");

    let (status, body) = send(&app, get("/api/products/sandal-dusk", None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["product"]["is_in_stock"], false);

    let (status, _) = send(&app, get("/api/products/missing-scent", None)?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, get("/api/products?page=9223372036854775807", None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn malformed_bodies_keep_the_error_envelope() -> anyhow::Result<()> {
    let state = setup_state().await?;
    common::register(&state, "buyer@example.com").await?;
    let app = build_app(state);

    let (_, body) = send(
        &app,
        post_json(
            "/api/auth/login",
            None,
            json!({ "email": "buyer@example.com", "password": "password123" }),
        )?,
    )
    .await?;
    let token = body["data"]["token"].as_str().unwrap_or_default().to_string();

    let (status, body) = send(
        &app,
        post_json(
            "/api/checkout",
            Some(&token),
            json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": "ada@example.com",
                "address": "12 Analytical Row",
                "city": "London",
                "zip_code": "N1 9GU",
                "country": "United Kingdom",
                "payment_method": "bitcoin"
            }),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Invalid request body");
    assert_eq!(body["data"]["success"], false);
    assert!(body["data"]["fields"]["payment_method"].is_array());

    let (status, body) = send(
        &app,
        post_json("/api/cart/add", Some(&token), json!({ "quantity": 2 }))?,
    )
    .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["data"]["success"], false);
    assert!(body["data"]["fields"]["product_id"].is_array());

    let request = Request::post("/api/contact")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let (status, body) = send(&app, request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["success"], false);
    Ok(())
}
