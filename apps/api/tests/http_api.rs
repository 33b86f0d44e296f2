//! Router-level tests driven with `tower::ServiceExt::oneshot`.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use stockroom_api::routes;

async fn app() -> Router {
    routes::router(common::test_state().await)
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value, Option<String>) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body, cookie)
}

/// Registers and logs in, returning the session token.
async fn login(app: &Router) -> String {
    let credentials = json!({ "email": "owner@acme.com", "password": "password123" });

    let (status, _, _) = send(
        app,
        request(Method::POST, "/user-auth/register", None, Some(credentials.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body, _) = send(
        app,
        request(Method::POST, "/user-auth/login", None, Some(credentials)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_register_and_login_sets_cookie() {
    let app = app().await;
    let credentials = json!({ "email": "owner@acme.com", "password": "password123" });

    let (status, body, _) = send(
        &app,
        request(Method::POST, "/user-auth/register", None, Some(credentials.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user_id"], 1);

    let (status, body, _) = send(
        &app,
        request(Method::POST, "/user-auth/register", None, Some(credentials.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["kind"], "conflict");

    let (status, body, cookie) = send(
        &app,
        request(Method::POST, "/user-auth/login", None, Some(credentials)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();
    let cookie = cookie.unwrap();
    assert!(cookie.starts_with(&format!("Authorization={};", token)));
    assert!(cookie.contains("Max-Age=2592000"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(!cookie.contains("Domain"));
}

#[tokio::test]
async fn test_login_failure_is_uniform() {
    let app = app().await;
    login(&app).await;

    let (status_a, body_a, _) = send(
        &app,
        request(
            Method::POST,
            "/user-auth/login",
            None,
            Some(json!({ "email": "owner@acme.com", "password": "wrong-password" })),
        ),
    )
    .await;
    let (status_b, body_b, _) = send(
        &app,
        request(
            Method::POST,
            "/user-auth/login",
            None,
            Some(json!({ "email": "ghost@acme.com", "password": "password123" })),
        ),
    )
    .await;

    assert_eq!(status_a, StatusCode::UNAUTHORIZED);
    assert_eq!(status_b, StatusCode::UNAUTHORIZED);
    assert_eq!(body_a, body_b);
}

#[tokio::test]
async fn test_inventory_requires_session() {
    let app = app().await;

    let (status, body, _) = send(&app, request(Method::GET, "/products/", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["kind"], "unauthorized");

    let (status, _, _) = send(
        &app,
        request(Method::GET, "/suppliers", Some("forged.token.here"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_cookie_authenticates() {
    let app = app().await;
    let token = login(&app).await;

    let req = Request::builder()
        .uri("/user-auth/me")
        .header(header::COOKIE, format!("theme=dark; Authorization={}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body, _) = send(&app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], 1);
    assert_eq!(body["email"], "owner@acme.com");
}

#[tokio::test]
async fn test_product_routes() {
    let app = app().await;
    let token = login(&app).await;
    let token = Some(token.as_str());

    let (status, supplier, _) = send(
        &app,
        request(
            Method::POST,
            "/suppliers/insert",
            token,
            Some(json!({ "name": "Acme", "contact_email": "a@acme.com", "phone": "555-0100" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(supplier["id"], 1);

    let (status, product, _) = send(
        &app,
        request(
            Method::POST,
            "/products/insert",
            token,
            Some(json!({
                "name": "Widget",
                "description": "",
                "supplier_id": 1,
                "price": "19.99",
                "stock": 10,
                "minimum_stock": 2
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(product["id"], 1);
    assert_eq!(product["price"], "19.99");

    let (status, product, _) = send(
        &app,
        request(
            Method::PUT,
            "/products/change-stock",
            token,
            Some(json!({ "id": 1, "stock": 7 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["stock"], 7);

    let (status, body, _) = send(
        &app,
        request(
            Method::PUT,
            "/products/change-stock",
            token,
            Some(json!({ "id": 1, "stock": -1 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "validation_error");

    let (status, product, _) = send(&app, request(Method::GET, "/products/1", token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["stock"], 7);

    let (status, _, _) = send(&app, request(Method::DELETE, "/products/remove/1", token, None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body, _) =
        send(&app, request(Method::DELETE, "/products/remove/1", token, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["kind"], "not_found");
}

#[tokio::test]
async fn test_supplier_and_stock_routes() {
    let app = app().await;
    let token = login(&app).await;
    let token = Some(token.as_str());

    send(
        &app,
        request(
            Method::POST,
            "/suppliers/insert",
            token,
            Some(json!({ "name": "Acme", "contact_email": "a@acme.com", "phone": "555-0100" })),
        ),
    )
    .await;
    send(
        &app,
        request(
            Method::POST,
            "/products/insert",
            token,
            Some(json!({ "name": "Widget", "supplier_id": 1, "price": "19.99", "stock": 10, "minimum_stock": 2 })),
        ),
    )
    .await;

    let (status, supplier, _) = send(
        &app,
        request(
            Method::PUT,
            "/suppliers/change-email",
            token,
            Some(json!({ "id": 1, "contact_email": "orders@acme.com" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(supplier["contact_email"], "orders@acme.com");

    let (status, body, _) = send(
        &app,
        request(
            Method::PUT,
            "/suppliers/change-email",
            token,
            Some(json!({ "id": 1, "contact_email": "not-an-email" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "validation_error");

    let (status, supplier, _) = send(
        &app,
        request(
            Method::PUT,
            "/suppliers/change-phone",
            token,
            Some(json!({ "id": 1, "phone": "555-0199" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(supplier["phone"], "555-0199");
    assert_eq!(supplier["contact_email"], "orders@acme.com");

    let (status, body, _) = send(
        &app,
        request(
            Method::PUT,
            "/suppliers/change-phone",
            token,
            Some(json!({ "id": 9, "phone": "555-0199" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["kind"], "not_found");

    let (status, low, _) = send(&app, request(Method::GET, "/products/low-stock", token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(low, json!([]));

    let (status, product, _) = send(
        &app,
        request(
            Method::POST,
            "/products/adjust-stock",
            token,
            Some(json!({ "id": 1, "delta": -8 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["stock"], 2);

    let (status, body, _) = send(
        &app,
        request(
            Method::POST,
            "/products/adjust-stock",
            token,
            Some(json!({ "id": 1, "delta": -3 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "validation_error");

    // At the minimum counts as low
    let (status, low, _) = send(&app, request(Method::GET, "/products/low-stock", token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(low.as_array().unwrap().len(), 1);
    assert_eq!(low[0]["id"], 1);
    assert_eq!(low[0]["stock"], 2);

    let (status, body, _) =
        send(&app, request(Method::DELETE, "/suppliers/remove/1", token, None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["kind"], "conflict");

    let (status, _, _) = send(&app, request(Method::DELETE, "/products/remove/1", token, None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body, _) =
        send(&app, request(Method::DELETE, "/suppliers/remove/1", token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 1);

    let (status, _, _) = send(&app, request(Method::GET, "/suppliers/1", token, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_float_price_is_rejected() {
    let app = app().await;
    let token = login(&app).await;

    let (status, body, _) = send(
        &app,
        request(
            Method::POST,
            "/products/insert",
            Some(&token),
            Some(json!({ "name": "Widget", "supplier_id": 1, "price": 19.99, "stock": 1 })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "validation_error");
}

#[tokio::test]
async fn test_unknown_supplier_is_conflict() {
    let app = app().await;
    let token = login(&app).await;

    let (status, body, _) = send(
        &app,
        request(
            Method::POST,
            "/products/insert",
            Some(&token),
            Some(json!({ "name": "Widget", "supplier_id": 99, "price": "1.00", "stock": 1 })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["kind"], "conflict");
}

#[tokio::test]
async fn test_bad_path_id_is_validation_error() {
    let app = app().await;
    let token = login(&app).await;

    let (status, body, _) =
        send(&app, request(Method::GET, "/suppliers/abc", Some(&token), None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "validation_error");
}

#[tokio::test]
async fn test_health() {
    let app = app().await;

    let (status, body, _) = send(&app, request(Method::GET, "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["migrations"]["current"], true);
}
