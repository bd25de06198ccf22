#[macro_use]
mod common;

use actix_web::{http::header, http::StatusCode, test};
use around_service::models::Post;
use chrono::Utc;
use error_types::ErrorResponse;
use std::sync::Arc;

use common::{context, context_with, issuer, test_config, FixedScorer, InMemoryPosts, InMemoryUsers};

fn user_body(username: &str, password: &str) -> String {
    format!(
        r#"{{"username":"{}","password":"{}","age":30,"gender":"female"}}"#,
        username, password
    )
}

#[actix_web::test]
async fn test_signup_once_then_duplicate() {
    let ctx = context();
    let app = test_app!(ctx.state);

    let req = test::TestRequest::post()
        .uri("/signup")
        .set_payload(user_body("abc_1", "pw"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert_eq!(&body[..], b"User created successfully");

    let stored = ctx.users.get("abc_1").unwrap();
    assert_ne!(stored.password, "pw");
    assert!(stored.password.starts_with("$argon2"));
    assert_eq!(stored.age, 30);

    let req = test::TestRequest::post()
        .uri("/signup")
        .set_payload(user_body("abc_1", "other"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(error.message, "User already exists");
    assert_eq!(ctx.users.writes(), 1);
}

#[actix_web::test]
async fn test_signup_with_invalid_username_never_touches_store() {
    let ctx = context();
    let app = test_app!(ctx.state);

    for body in [user_body("ABC!", "pw"), user_body("", "pw"), user_body("abc_1", "")] {
        let req = test::TestRequest::post()
            .uri("/signup")
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let error: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(error.message, "Invalid username or password");
    }

    assert_eq!(ctx.users.lookups(), 0);
    assert_eq!(ctx.users.writes(), 0);
}

#[actix_web::test]
async fn test_concurrent_signup_conflict_reports_duplicate() {
    let ctx = context_with(
        test_config(),
        InMemoryPosts::default(),
        InMemoryUsers::with_stale_reads(),
        Arc::new(FixedScorer(0.0)),
    );
    let app = test_app!(ctx.state);

    for expected in [StatusCode::OK, StatusCode::BAD_REQUEST] {
        let req = test::TestRequest::post()
            .uri("/signup")
            .set_payload(user_body("racer", "pw"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected);
    }
    assert_eq!(ctx.users.writes(), 2);
}

#[actix_web::test]
async fn test_login_returns_token_for_username_expiring_in_a_day() {
    let ctx = context();
    let app = test_app!(ctx.state);

    let req = test::TestRequest::post()
        .uri("/signup")
        .set_payload(user_body("abc_1", "s3cret"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/login")
        .set_payload(r#"{"username":"abc_1","password":"s3cret"}"#)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let token = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();

    let claims = issuer().validate(&token).unwrap();
    assert_eq!(claims.username, "abc_1");
    let remaining = claims.exp - Utc::now().timestamp();
    assert!((24 * 3600 - 60..=24 * 3600).contains(&remaining));
}

#[actix_web::test]
async fn test_login_rejects_wrong_password_and_unknown_user() {
    let ctx = context();
    let app = test_app!(ctx.state);

    let req = test::TestRequest::post()
        .uri("/signup")
        .set_payload(user_body("abc_1", "s3cret"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    for body in [
        r#"{"username":"abc_1","password":"wrong"}"#,
        r#"{"username":"nobody","password":"s3cret"}"#,
    ] {
        let req = test::TestRequest::post()
            .uri("/login")
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let error: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(error.message, "Incorrect username or password");
    }
}

#[actix_web::test]
async fn test_login_with_malformed_body() {
    let ctx = context();
    let app = test_app!(ctx.state);

    let req = test::TestRequest::post()
        .uri("/login")
        .set_payload("{")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_token_guard_when_required() {
    let mut config = test_config();
    config.auth.required = true;
    let ctx = context_with(
        config,
        InMemoryPosts::default(),
        InMemoryUsers::default(),
        Arc::new(FixedScorer(0.0)),
    );
    let app = test_app!(ctx.state);

    let req = test::TestRequest::get().uri("/search?lat=1&lon=1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let error: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(error.code, "TOKEN_MISSING");

    let req = test::TestRequest::get()
        .uri("/search?lat=1&lon=1")
        .insert_header((header::AUTHORIZATION, "Bearer not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let token = issuer().issue("abc_1").unwrap();
    let req = test::TestRequest::post()
        .uri("/post")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
        .set_payload(r#"{"user":"someone_else","message":"hi","location":{"lat":1,"lon":1}}"#)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let saved: Vec<Post> = ctx.posts.all();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].user, "abc_1");

    // Login and signup stay open
    let req = test::TestRequest::post()
        .uri("/signup")
        .set_payload(user_body("abc_2", "pw"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}
