/// Signup and login
///
/// Users live in their own index keyed by username. Stored passwords are
/// Argon2 hashes; login answers with a signed token as plain text.
use actix_web::{web, HttpResponse};
use crypto_core::{hash_password, verify_password};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{error, info, warn};

use super::decode_json;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::repository::StoreError;
use crate::AppState;

static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9_]+$").expect("valid username regex"));

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

pub fn is_valid_username(username: &str) -> bool {
    USERNAME_REGEX.is_match(username)
}

pub async fn signup(state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse> {
    info!("Received one signup request");

    let user: User = decode_json(&body, "Cannot decode user data from client")?;
    if !is_valid_username(&user.username) || user.password.is_empty() {
        warn!(username = %user.username, "Rejected signup with invalid username or password");
        return Err(AppError::InvalidUsername);
    }

    let existing = state
        .users
        .find_by_username(&user.username)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to read from Elasticsearch");
            AppError::store("Failed to read from Elasticsearch", e)
        })?;
    if !existing.is_empty() {
        info!(username = %user.username, "User already exists");
        return Err(AppError::UserAlreadyExists);
    }

    let password_hash = hash_password(&user.password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        AppError::Internal(e.to_string())
    })?;
    let stored = User {
        password: password_hash,
        ..user
    };

    match state.users.create_user(&stored).await {
        Ok(()) => {}
        Err(StoreError::Conflict(_)) => {
            info!(username = %stored.username, "User already exists");
            return Err(AppError::UserAlreadyExists);
        }
        Err(e) => {
            error!(error = %e, "Failed to save to Elasticsearch");
            return Err(AppError::store("Failed to save to Elasticsearch", e));
        }
    }

    info!(username = %stored.username, "User added");
    Ok(HttpResponse::Ok()
        .content_type(TEXT_PLAIN)
        .body("User created successfully"))
}

pub async fn login(state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse> {
    info!("Received one login request");

    let credentials: User = decode_json(&body, "Cannot decode user data from client")?;

    let candidates = state
        .users
        .find_by_username(&credentials.username)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to read from Elasticsearch");
            AppError::store("Failed to read from Elasticsearch", e)
        })?;

    let matched = candidates.iter().any(|stored| {
        stored.username == credentials.username
            && password_matches(&credentials.password, &stored.password)
    });
    if !matched {
        info!(username = %credentials.username, "Login rejected");
        return Err(AppError::InvalidCredentials);
    }

    let token = state.tokens.issue(&credentials.username).map_err(|e| {
        error!(error = %e, "Failed to generate token");
        AppError::TokenGeneration(e)
    })?;

    info!(username = %credentials.username, "Login succeeded");
    Ok(HttpResponse::Ok().content_type(TEXT_PLAIN).body(token))
}

/// Unreadable stored hashes never match.
fn password_matches(password: &str, stored_hash: &str) -> bool {
    match verify_password(password, stored_hash) {
        Ok(matched) => matched,
        Err(e) => {
            warn!(error = %e, "Stored password hash could not be verified");
            false
        }
    }
}
