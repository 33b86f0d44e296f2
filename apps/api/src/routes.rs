//! # HTTP Routes
//!
//! Thin axum handlers over [`AuthService`](crate::services::AuthService) and
//! [`InventoryService`](crate::services::InventoryService).
//!
//! ## Endpoints
//! ```text
//! ┌────────┬───────────────────────────────┬──────────────────────────────┐
//! │ Method │ Path                          │ Body / result                │
//! ├────────┼───────────────────────────────┼──────────────────────────────┤
//! │ POST   │ /user-auth/register           │ {email, password} → user_id  │
//! │ POST   │ /user-auth/login              │ {email, password} → token    │
//! │ GET    │ /user-auth/me                 │ 🔒 → user_id, email          │
//! ├────────┼───────────────────────────────┼──────────────────────────────┤
//! │ GET    │ /products, /products/         │ 🔒 → [Product]               │
//! │ GET    │ /products/{id}                │ 🔒 → Product                 │
//! │ POST   │ /products/insert              │ 🔒 NewProduct → Product      │
//! │ PUT    │ /products/change-price        │ 🔒 {id, price} → Product     │
//! │ PUT    │ /products/change-stock        │ 🔒 {id, stock} → Product     │
//! │ POST   │ /products/adjust-stock        │ 🔒 {id, delta} → Product     │
//! │ GET    │ /products/low-stock           │ 🔒 → [Product]               │
//! │ DELETE │ /products/remove/{id}         │ 🔒 → {deleted: id}           │
//! ├────────┼───────────────────────────────┼──────────────────────────────┤
//! │ GET    │ /suppliers, /suppliers/       │ 🔒 → [Supplier]              │
//! │ GET    │ /suppliers/{id}               │ 🔒 → Supplier                │
//! │ GET    │ /suppliers/{id}/products      │ 🔒 → [Product]               │
//! │ POST   │ /suppliers/insert             │ 🔒 NewSupplier → Supplier    │
//! │ PUT    │ /suppliers/change-email       │ 🔒 {id, contact_email}       │
//! │ PUT    │ /suppliers/change-phone       │ 🔒 {id, phone}               │
//! │ DELETE │ /suppliers/remove/{id}        │ 🔒 → {deleted: id}           │
//! ├────────┼───────────────────────────────┼──────────────────────────────┤
//! │ GET    │ /health                       │ storage + migration status   │
//! └────────┴───────────────────────────────┴──────────────────────────────┘
//! 🔒 = bearer token or `Authorization` cookie required
//! ```
//!
//! Prices travel as decimal strings (`"19.99"`); a JSON number is rejected.

use axum::{
    extract::{FromRequest, FromRequestParts, State},
    http::{header, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use stockroom_core::{Money, NewProduct, NewSupplier, Product, ProductId, Supplier, SupplierId, UserId};

use crate::auth::{extract_bearer_token, extract_cookie_token};
use crate::error::{ServiceError, ServiceResult};
use crate::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health))
        // Auth
        .route("/user-auth/register", post(register))
        .route("/user-auth/login", post(login))
        .route("/user-auth/me", get(me))
        // Products
        .route("/products", get(list_products))
        .route("/products/", get(list_products))
        .route("/products/insert", post(create_product))
        .route("/products/change-price", put(change_price))
        .route("/products/change-stock", put(change_stock))
        .route("/products/adjust-stock", post(adjust_stock))
        .route("/products/low-stock", get(low_stock))
        .route("/products/remove/{id}", delete(delete_product))
        .route("/products/{id}", get(get_product))
        // Suppliers
        .route("/suppliers", get(list_suppliers))
        .route("/suppliers/", get(list_suppliers))
        .route("/suppliers/insert", post(create_supplier))
        .route("/suppliers/change-email", put(change_email))
        .route("/suppliers/change-phone", put(change_phone))
        .route("/suppliers/remove/{id}", delete(delete_supplier))
        .route("/suppliers/{id}", get(get_supplier))
        .route("/suppliers/{id}/products", get(supplier_products))
        .with_state(state)
}

// =============================================================================
// Extractors
// =============================================================================

/// JSON body whose rejections render as `validation_error`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ServiceError))]
pub struct JsonBody<T>(pub T);

/// Path parameters whose rejections render as `validation_error`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ServiceError))]
pub struct IdPath<T>(pub T);

/// The authenticated caller, from `Authorization: Bearer <token>` or the
/// `Authorization` session cookie (header wins).
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let from_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer_token);

        let from_cookie = || {
            parts
                .headers
                .get_all(header::COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .find_map(extract_cookie_token)
        };

        let token = from_header
            .or_else(from_cookie)
            .ok_or_else(|| ServiceError::Unauthorized("Authentication required".to_string()))?;

        state.auth.authenticate(token).map(AuthUser)
    }
}

// =============================================================================
// Request / Response Bodies
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: UserId,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePriceRequest {
    pub id: ProductId,
    pub price: Money,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStockRequest {
    pub id: ProductId,
    pub stock: i64,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub id: ProductId,
    pub delta: i64,
}

#[derive(Debug, Deserialize)]
pub struct ChangeEmailRequest {
    pub id: SupplierId,
    pub contact_email: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePhoneRequest {
    pub id: SupplierId,
    pub phone: String,
}

// =============================================================================
// Handlers: General
// =============================================================================

async fn welcome() -> Json<serde_json::Value> {
    Json(json!({ "message": "Welcome to the Stockroom inventory API" }))
}

async fn health(State(state): State<AppState>) -> Response {
    let healthy = state.db.health_check().await;
    let migrations = state.db.migration_status().await.ok();

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = Json(json!({
        "status": if healthy { "ok" } else { "unavailable" },
        "migrations": migrations.map(|m| json!({
            "applied": m.applied,
            "total": m.total,
            "current": m.is_current(),
        })),
    }));

    (status, body).into_response()
}

// =============================================================================
// Handlers: Auth
// =============================================================================

async fn register(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CredentialsRequest>,
) -> ServiceResult<(StatusCode, Json<RegisterResponse>)> {
    let user_id = state.auth.register(&input.email, &input.password).await?;
    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id })))
}

async fn login(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CredentialsRequest>,
) -> ServiceResult<Response> {
    let outcome = state.auth.login(&input.email, &input.password).await?;

    let cookie = HeaderValue::from_str(&outcome.cookie.to_string()).map_err(|e| {
        tracing::error!(error = %e, "Session cookie is not a valid header value");
        ServiceError::Internal
    })?;

    let body = Json(LoginResponse {
        token: outcome.token,
        expires_at: outcome.expires_at,
    });

    Ok(([(header::SET_COOKIE, cookie)], body).into_response())
}

async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ServiceResult<Json<serde_json::Value>> {
    let user = state.auth.current_user(user_id).await?;
    Ok(Json(json!({ "user_id": user.id, "email": user.email })))
}

// =============================================================================
// Handlers: Products
// =============================================================================

async fn list_products(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ServiceResult<Json<Vec<Product>>> {
    Ok(Json(state.inventory.list_products().await?))
}

async fn get_product(
    State(state): State<AppState>,
    _user: AuthUser,
    IdPath(id): IdPath<ProductId>,
) -> ServiceResult<Json<Product>> {
    Ok(Json(state.inventory.get_product(id).await?))
}

async fn create_product(
    State(state): State<AppState>,
    _user: AuthUser,
    JsonBody(input): JsonBody<NewProduct>,
) -> ServiceResult<(StatusCode, Json<Product>)> {
    let product = state.inventory.create_product(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn change_price(
    State(state): State<AppState>,
    _user: AuthUser,
    JsonBody(input): JsonBody<ChangePriceRequest>,
) -> ServiceResult<Json<Product>> {
    Ok(Json(
        state.inventory.update_product_price(input.id, input.price).await?,
    ))
}

async fn change_stock(
    State(state): State<AppState>,
    _user: AuthUser,
    JsonBody(input): JsonBody<ChangeStockRequest>,
) -> ServiceResult<Json<Product>> {
    Ok(Json(
        state.inventory.update_product_stock(input.id, input.stock).await?,
    ))
}

async fn adjust_stock(
    State(state): State<AppState>,
    _user: AuthUser,
    JsonBody(input): JsonBody<AdjustStockRequest>,
) -> ServiceResult<Json<Product>> {
    Ok(Json(state.inventory.adjust_stock(input.id, input.delta).await?))
}

async fn low_stock(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ServiceResult<Json<Vec<Product>>> {
    Ok(Json(state.inventory.low_stock().await?))
}

async fn delete_product(
    State(state): State<AppState>,
    _user: AuthUser,
    IdPath(id): IdPath<ProductId>,
) -> ServiceResult<Json<serde_json::Value>> {
    state.inventory.delete_product(id).await?;
    Ok(Json(json!({ "deleted": id })))
}

// =============================================================================
// Handlers: Suppliers
// =============================================================================

async fn list_suppliers(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ServiceResult<Json<Vec<Supplier>>> {
    Ok(Json(state.inventory.list_suppliers().await?))
}

async fn get_supplier(
    State(state): State<AppState>,
    _user: AuthUser,
    IdPath(id): IdPath<SupplierId>,
) -> ServiceResult<Json<Supplier>> {
    Ok(Json(state.inventory.get_supplier(id).await?))
}

async fn supplier_products(
    State(state): State<AppState>,
    _user: AuthUser,
    IdPath(id): IdPath<SupplierId>,
) -> ServiceResult<Json<Vec<Product>>> {
    Ok(Json(state.inventory.supplier_products(id).await?))
}

async fn create_supplier(
    State(state): State<AppState>,
    _user: AuthUser,
    JsonBody(input): JsonBody<NewSupplier>,
) -> ServiceResult<(StatusCode, Json<Supplier>)> {
    let supplier = state.inventory.create_supplier(input).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

async fn change_email(
    State(state): State<AppState>,
    _user: AuthUser,
    JsonBody(input): JsonBody<ChangeEmailRequest>,
) -> ServiceResult<Json<Supplier>> {
    Ok(Json(
        state
            .inventory
            .update_supplier_email(input.id, &input.contact_email)
            .await?,
    ))
}

async fn change_phone(
    State(state): State<AppState>,
    _user: AuthUser,
    JsonBody(input): JsonBody<ChangePhoneRequest>,
) -> ServiceResult<Json<Supplier>> {
    Ok(Json(
        state
            .inventory
            .update_supplier_phone(input.id, &input.phone)
            .await?,
    ))
}

async fn delete_supplier(
    State(state): State<AppState>,
    _user: AuthUser,
    IdPath(id): IdPath<SupplierId>,
) -> ServiceResult<Json<serde_json::Value>> {
    state.inventory.delete_supplier(id).await?;
    Ok(Json(json!({ "deleted": id })))
}
