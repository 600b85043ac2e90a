mod common;

use common::{TestApp, ADMIN_EMAIL, ADMIN_PASSWORD};
use serde_json::{json, Value};

#[tokio::test]
async fn login_with_valid_credentials_returns_token() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap();

    let claims = app.jwt.validate_token(token).unwrap();
    assert_eq!(claims.email, ADMIN_EMAIL);
    assert_eq!(body["expires_in"], 24 * 3600);
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = TestApp::spawn().await;

    for (email, password) in [(ADMIN_EMAIL, "salah"), ("nobody@warung.id", ADMIN_PASSWORD)] {
        let response = app
            .client
            .post(app.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status().as_u16(), 401);
    }
}

#[tokio::test]
async fn login_requires_a_valid_email() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": "not-an-email", "password": "x" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn admin_routes_require_a_bearer_token() {
    let app = TestApp::spawn().await;

    let missing = app
        .client
        .get(app.url("/api/admin/orders"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 401);

    let garbage = app
        .client
        .get(app.url("/api/admin/orders"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(garbage.status().as_u16(), 401);

    let ok = app
        .client
        .get(app.url("/api/admin/dashboard"))
        .bearer_auth(app.admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status().as_u16(), 200);
    let body: Value = ok.json().await.unwrap();
    assert_eq!(body["user"]["email"], ADMIN_EMAIL);
}
