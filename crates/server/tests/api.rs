//! End-to-end API tests driving the full router in memory.
//!
//! Each test gets its own in-memory `SQLite` database with migrations
//! applied, a session layer backed by the same database, and no SMTP
//! (the dispatcher logs and skips sends).

use std::str::FromStr;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tower::ServiceExt;

use cafe_lagune_core::Price;
use cafe_lagune_server::config::ServerConfig;
use cafe_lagune_server::db::{MIGRATOR, ProductRepository, UserRepository};
use cafe_lagune_server::models::NewProduct;
use cafe_lagune_server::services::auth::hash_password;
use cafe_lagune_server::state::AppState;
use cafe_lagune_server::build_app;

async fn spawn_app() -> (Router, SqlitePool) {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("options")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("pool");
    MIGRATOR.run(&pool).await.expect("migrations");

    let config = ServerConfig {
        database_url: "sqlite::memory:".to_owned(),
        host: "127.0.0.1".parse().expect("host"),
        port: 0,
        base_url: "http://localhost:3000".to_owned(),
        session_secret: Some(SecretString::from("0123456789abcdef0123456789abcdef")),
        admin_emails: vec!["admin@cafelagune.ci".to_owned()],
        email: None,
        sentry_dsn: None,
    };

    let state = AppState::new(config, pool.clone()).expect("state");
    let app = build_app(state).await.expect("app");
    (app, pool)
}

async fn seed_product(pool: &SqlitePool, name: &str, price: i64, available: bool) -> i64 {
    ProductRepository::new(pool)
        .create(&NewProduct {
            name: name.to_owned(),
            description: None,
            image_url: None,
            price: Price::new(price),
            category: Some("café".to_owned()),
            available,
            stock: 25,
        })
        .await
        .expect("seed product")
        .id
        .as_i64()
}

async fn send(
    app: &Router,
    method: &str,
    path: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Response<axum::body::Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };
    app.clone().oneshot(request).await.expect("response")
}

async fn body_json(response: Response<axum::body::Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

fn session_cookie(response: &Response<axum::body::Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("set-cookie header")
        .to_str()
        .expect("cookie str")
        .split(';')
        .next()
        .expect("cookie value")
        .to_owned()
}

/// Sign up through the API and return (cookie, user id).
async fn sign_up(app: &Router, name: &str, email: &str) -> (String, i64) {
    let response = send(
        app,
        "POST",
        "/api/auth/sign-up",
        None,
        Some(json!({ "name": name, "email": email, "password": "motdepasse" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = session_cookie(&response);
    let body = body_json(response).await;
    (cookie, body["user"]["id"].as_i64().expect("user id"))
}

/// Create an ADMIN account directly, then sign in through the API.
async fn sign_in_as_admin(app: &Router, pool: &SqlitePool) -> String {
    let email = cafe_lagune_core::Email::parse("chef@cafelagune.ci").expect("email");
    let hash = hash_password("motdepasse").expect("hash");
    UserRepository::new(pool)
        .create_with_password("Chef", &email, cafe_lagune_core::UserRole::Admin, &hash)
        .await
        .expect("admin user");

    let response = send(
        app,
        "POST",
        "/api/auth/sign-in",
        None,
        Some(json!({ "email": "chef@cafelagune.ci", "password": "motdepasse" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    session_cookie(&response)
}

fn guest_order_body(items: Value) -> Value {
    json!({
        "customerName": "Jean Kouassi",
        "customerPhone": "+225 07 12 34 56 78",
        "items": items,
    })
}

#[tokio::test]
async fn test_health() {
    let (app, _pool) = spawn_app().await;
    let response = send(&app, "GET", "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/health/ready", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_guest_order_end_to_end() {
    let (app, pool) = spawn_app().await;
    let moka = seed_product(&pool, "Moka d'Abidjan", 2000, true).await;
    let robusta = seed_product(&pool, "Robusta de Man", 1500, true).await;

    let response = send(
        &app,
        "POST",
        "/api/orders",
        None,
        Some(guest_order_body(json!([
            { "productId": moka, "quantity": 2 },
            { "productId": robusta, "quantity": 1 },
        ]))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["totalPrice"], json!(5500));
    assert_eq!(body["status"], json!("PENDING"));
    assert_eq!(body["identityKind"], json!("GUEST"));
    assert_eq!(body["userId"], Value::Null);
    assert_eq!(body["items"].as_array().expect("items").len(), 2);

    // Contact normalized: whitespace and +225 prefix stripped.
    assert_eq!(body["customer"]["phone"], json!("0712345678"));
    assert_eq!(body["customer"]["name"], json!("Jean Kouassi"));

    let metadata = &body["_metadata"];
    assert_eq!(metadata["estimatedPrepTime"], json!("15-20 minutes"));
    assert_eq!(metadata["unavailableProducts"], json!([]));
    // No customer email on file, so only the admin channel is planned.
    assert_eq!(metadata["notificationChannels"], json!(["adminEmail"]));
}

#[tokio::test]
async fn test_order_validation_failures() {
    let (app, pool) = spawn_app().await;
    let moka = seed_product(&pool, "Moka d'Abidjan", 2000, true).await;

    // Empty cart.
    let response = send(
        &app,
        "POST",
        "/api/orders",
        None,
        Some(guest_order_body(json!([]))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], json!("Le panier est vide"));

    // Guest without a phone number.
    let response = send(
        &app,
        "POST",
        "/api/orders",
        None,
        Some(json!({
            "customerName": "Jean",
            "items": [{ "productId": moka, "quantity": 1 }],
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Malformed phone number.
    let response = send(
        &app,
        "POST",
        "/api/orders",
        None,
        Some(json!({
            "customerName": "Jean",
            "customerPhone": "pas un numéro",
            "items": [{ "productId": moka, "quantity": 1 }],
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown product.
    let response = send(
        &app,
        "POST",
        "/api/orders",
        None,
        Some(guest_order_body(json!([
            { "productId": 424_242, "quantity": 1 },
        ]))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("Produit introuvable : 424242"));
}

#[tokio::test]
async fn test_all_items_unavailable_is_rejected_with_names() {
    let (app, pool) = spawn_app().await;
    let gone = seed_product(&pool, "Épuisé", 9000, false).await;

    let response = send(
        &app,
        "POST",
        "/api/orders",
        None,
        Some(guest_order_body(json!([
            { "productId": gone, "quantity": 1 },
        ]))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["unavailableProducts"], json!(["Épuisé"]));
}

#[tokio::test]
async fn test_partial_unavailability_drops_the_line() {
    let (app, pool) = spawn_app().await;
    let moka = seed_product(&pool, "Moka d'Abidjan", 2000, true).await;
    let gone = seed_product(&pool, "Épuisé", 9000, false).await;

    let response = send(
        &app,
        "POST",
        "/api/orders",
        None,
        Some(guest_order_body(json!([
            { "productId": moka, "quantity": 1 },
            { "productId": gone, "quantity": 1 },
        ]))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["totalPrice"], json!(2000));
    assert_eq!(body["items"].as_array().expect("items").len(), 1);
    assert_eq!(body["_metadata"]["unavailableProducts"], json!(["Épuisé"]));
}

#[tokio::test]
async fn test_ad_hoc_item_round_trip() {
    let (app, pool) = spawn_app().await;

    let response = send(
        &app,
        "POST",
        "/api/orders",
        None,
        Some(guest_order_body(json!([
            { "productName": "Mélange du jour", "price": 3000, "quantity": 2 },
        ]))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["totalPrice"], json!(6000));
    assert_eq!(body["items"][0]["productName"], json!("Mélange du jour"));

    // The backing product exists but is hidden from the public catalog.
    let response = send(&app, "GET", "/api/products", None, None).await;
    let catalog = body_json(response).await;
    assert_eq!(catalog.as_array().expect("catalog").len(), 0);
}

#[tokio::test]
async fn test_signed_in_order_links_the_account() {
    let (app, pool) = spawn_app().await;
    let moka = seed_product(&pool, "Moka d'Abidjan", 2000, true).await;
    let (cookie, user_id) = sign_up(&app, "Aya", "aya@example.ci").await;

    // No contact block at all: the account alone carries the identity.
    let response = send(
        &app,
        "POST",
        "/api/orders",
        Some(&cookie),
        Some(json!({
            "items": [{ "productId": moka, "quantity": 1 }],
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["userId"], json!(user_id));
    assert_eq!(body["customerId"], Value::Null);
    assert_eq!(body["identityKind"], json!("CONNECTED"));
    // Account holders with an email on file get the customer email channel.
    assert_eq!(
        body["_metadata"]["notificationChannels"],
        json!(["customerEmail", "adminEmail"])
    );
}

#[tokio::test]
async fn test_patch_without_session_is_401() {
    let (app, pool) = spawn_app().await;
    let moka = seed_product(&pool, "Moka d'Abidjan", 2000, true).await;

    let response = send(
        &app,
        "POST",
        "/api/orders",
        None,
        Some(guest_order_body(json!([
            { "productId": moka, "quantity": 1 },
        ]))),
    )
    .await;
    let order_id = body_json(response).await["id"].as_i64().expect("order id");

    let response = send(
        &app,
        "PATCH",
        &format!("/api/orders/{order_id}"),
        None,
        Some(json!({ "status": "CONFIRMED" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Authentification requise" })
    );
}

#[tokio::test]
async fn test_patch_as_customer_is_403() {
    let (app, pool) = spawn_app().await;
    let moka = seed_product(&pool, "Moka d'Abidjan", 2000, true).await;
    let (cookie, _) = sign_up(&app, "Aya", "aya@example.ci").await;

    let response = send(
        &app,
        "POST",
        "/api/orders",
        None,
        Some(guest_order_body(json!([
            { "productId": moka, "quantity": 1 },
        ]))),
    )
    .await;
    let order_id = body_json(response).await["id"].as_i64().expect("order id");

    let response = send(
        &app,
        "PATCH",
        &format!("/api/orders/{order_id}"),
        Some(&cookie),
        Some(json!({ "status": "CONFIRMED" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_updates_order_status() {
    let (app, pool) = spawn_app().await;
    let moka = seed_product(&pool, "Moka d'Abidjan", 2000, true).await;
    let admin_cookie = sign_in_as_admin(&app, &pool).await;

    let response = send(
        &app,
        "POST",
        "/api/orders",
        None,
        Some(guest_order_body(json!([
            { "productId": moka, "quantity": 1 },
        ]))),
    )
    .await;
    let order_id = body_json(response).await["id"].as_i64().expect("order id");

    let response = send(
        &app,
        "PATCH",
        &format!("/api/orders/{order_id}"),
        Some(&admin_cookie),
        Some(json!({ "status": "CONFIRMED" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], json!("CONFIRMED"));

    // Unknown order id is a 404, not a 500.
    let response = send(
        &app,
        "PATCH",
        "/api/orders/424242",
        Some(&admin_cookie),
        Some(json!({ "status": "READY" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_status_value_is_400() {
    let (app, pool) = spawn_app().await;
    let moka = seed_product(&pool, "Moka d'Abidjan", 2000, true).await;
    let admin_cookie = sign_in_as_admin(&app, &pool).await;

    let response = send(
        &app,
        "POST",
        "/api/orders",
        None,
        Some(guest_order_body(json!([
            { "productId": moka, "quantity": 1 },
        ]))),
    )
    .await;
    let order_id = body_json(response).await["id"].as_i64().expect("order id");

    let response = send(
        &app,
        "PATCH",
        &format!("/api/orders/{order_id}"),
        Some(&admin_cookie),
        Some(json!({ "status": "SHIPPED" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        json!("Statut invalide : SHIPPED")
    );

    // The list filter rejects the same way.
    let response = send(
        &app,
        "GET",
        "/api/admin/orders?status=SHIPPED",
        Some(&admin_cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The order stayed untouched.
    let response = send(
        &app,
        "GET",
        &format!("/api/orders/{order_id}"),
        Some(&admin_cookie),
        None,
    )
    .await;
    assert_eq!(body_json(response).await["status"], json!("PENDING"));
}

#[tokio::test]
async fn test_unknown_notification_preference_is_400() {
    let (app, pool) = spawn_app().await;
    let moka = seed_product(&pool, "Moka d'Abidjan", 2000, true).await;

    let mut body = guest_order_body(json!([{ "productId": moka, "quantity": 1 }]));
    body["notificationPreference"] = json!("pigeon");

    let response = send(&app, "POST", "/api/orders", None, Some(body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        json!("Préférence de notification invalide : pigeon")
    );
}

#[tokio::test]
async fn test_tampered_session_cookie_is_anonymous() {
    let (app, _pool) = spawn_app().await;
    let (cookie, _user_id) = sign_up(&app, "Aya Koné", "aya@example.ci").await;

    // The untouched cookie authenticates: unknown order reads as 404.
    let response = send(&app, "GET", "/api/orders/999", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Flipping one character breaks the signature and the caller is
    // anonymous again.
    let mut tampered = cookie.clone();
    let last = tampered.pop().expect("cookie char");
    tampered.push(if last == 'A' { 'B' } else { 'A' });

    let response = send(&app, "GET", "/api/orders/999", Some(&tampered), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Authentification requise" })
    );
}

#[tokio::test]
async fn test_admin_page_redirects() {
    let (app, pool) = spawn_app().await;
    let (customer_cookie, _) = sign_up(&app, "Aya", "aya@example.ci").await;
    let admin_cookie = sign_in_as_admin(&app, &pool).await;

    // Customer on the admin page is sent to their dashboard.
    let response = send(&app, "GET", "/admin", Some(&customer_cookie), None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION].to_str().expect("location"),
        "/dashboard"
    );

    // Anonymous visitor is sent to sign-in, destination remembered.
    let response = send(&app, "GET", "/admin/orders", None, None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION].to_str().expect("location"),
        "/sign-in?callbackUrl=/admin/orders"
    );

    // A signed-in admin on the sign-in page is sent home.
    let response = send(&app, "GET", "/sign-in", Some(&admin_cookie), None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION].to_str().expect("location"),
        "/admin"
    );
}

#[tokio::test]
async fn test_order_detail_ownership() {
    let (app, pool) = spawn_app().await;
    let moka = seed_product(&pool, "Moka d'Abidjan", 2000, true).await;
    let (owner_cookie, _) = sign_up(&app, "Aya", "aya@example.ci").await;
    let (other_cookie, _) = sign_up(&app, "Binta", "binta@example.ci").await;

    let response = send(
        &app,
        "POST",
        "/api/orders",
        Some(&owner_cookie),
        Some(json!({ "items": [{ "productId": moka, "quantity": 1 }] })),
    )
    .await;
    let order_id = body_json(response).await["id"].as_i64().expect("order id");
    let path = format!("/api/orders/{order_id}");

    let response = send(&app, "GET", &path, None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Someone else's order looks like a missing one.
    let response = send(&app, "GET", &path, Some(&other_cookie), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "GET", &path, Some(&owner_cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["id"], json!(order_id));
}

#[tokio::test]
async fn test_tracking_by_phone() {
    let (app, pool) = spawn_app().await;
    let moka = seed_product(&pool, "Moka d'Abidjan", 2000, true).await;

    let response = send(
        &app,
        "POST",
        "/api/orders",
        None,
        Some(guest_order_body(json!([
            { "productId": moka, "quantity": 1 },
        ]))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // The caller typed the prefix; the stored number has none.
    let response = send(
        &app,
        "POST",
        "/api/orders/track",
        None,
        Some(json!({ "phone": "+225 07 12 34 56 78" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["orders"].as_array().expect("orders").len(), 1);

    // Unknown number: empty list, not an error.
    let response = send(
        &app,
        "POST",
        "/api/orders/track",
        None,
        Some(json!({ "phone": "0199887766" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["orders"].as_array().expect("orders").len(), 0);

    // No digits at all.
    let response = send(
        &app,
        "POST",
        "/api/orders/track",
        None,
        Some(json!({ "phone": "allô?" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_product_crud() {
    let (app, pool) = spawn_app().await;
    let admin_cookie = sign_in_as_admin(&app, &pool).await;

    // Anonymous callers can't reach the admin surface.
    let response = send(&app, "GET", "/api/admin/products", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(
        &app,
        "POST",
        "/api/admin/products",
        Some(&admin_cookie),
        Some(json!({ "name": "Espresso Lagune", "price": 1200, "category": "café" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let product = body_json(response).await;
    let id = product["id"].as_i64().expect("product id");
    assert_eq!(product["available"], json!(true));

    let response = send(
        &app,
        "PATCH",
        &format!("/api/admin/products/{id}"),
        Some(&admin_cookie),
        Some(json!({ "price": 1500 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["price"], json!(1500));

    // Public catalog sees it until it is retired.
    let response = send(&app, "GET", "/api/products", None, None).await;
    assert_eq!(body_json(response).await.as_array().expect("catalog").len(), 1);

    let response = send(
        &app,
        "DELETE",
        &format!("/api/admin/products/{id}"),
        Some(&admin_cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, "GET", "/api/products", None, None).await;
    assert_eq!(body_json(response).await.as_array().expect("catalog").len(), 0);
}

#[tokio::test]
async fn test_sign_in_failures_are_opaque() {
    let (app, _pool) = spawn_app().await;
    let _ = sign_up(&app, "Aya", "aya@example.ci").await;

    let response = send(
        &app,
        "POST",
        "/api/auth/sign-in",
        None,
        Some(json!({ "email": "aya@example.ci", "password": "mauvais" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(
        &app,
        "POST",
        "/api/auth/sign-in",
        None,
        Some(json!({ "email": "inconnue@example.ci", "password": "motdepasse" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Same message either way.
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Identifiants invalides" })
    );
}

#[tokio::test]
async fn test_duplicate_sign_up_conflicts() {
    let (app, _pool) = spawn_app().await;
    let _ = sign_up(&app, "Aya", "aya@example.ci").await;

    let response = send(
        &app,
        "POST",
        "/api/auth/sign-up",
        None,
        Some(json!({ "name": "Aya bis", "email": "aya@example.ci", "password": "motdepasse" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
