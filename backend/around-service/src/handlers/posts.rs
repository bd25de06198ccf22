use actix_web::{web, HttpResponse};
use tracing::{error, info};
use uuid::Uuid;

use super::decode_json;
use crate::error::{AppError, Result};
use crate::middleware::Caller;
use crate::models::Post;
use crate::AppState;

/// Accept a post and index it under a fresh id.
///
/// The response has an empty body; by the time it is sent the post is
/// visible to `/search`.
pub async fn create_post(
    state: web::Data<AppState>,
    caller: Caller,
    body: web::Bytes,
) -> Result<HttpResponse> {
    info!("Received one post request");

    let mut post: Post = decode_json(&body, "Cannot decode post data from client")?;
    if let Some(username) = caller.username() {
        post.user = username.to_string();
    }

    let id = Uuid::new_v4().to_string();
    state.posts.save_post(&id, &post).await.map_err(|e| {
        error!(post_id = %id, error = %e, "Failed to save post to Elasticsearch");
        AppError::store("Failed to save post to Elasticsearch", e)
    })?;

    info!(post_id = %id, user = %post.user, "Post saved");
    Ok(HttpResponse::Ok().finish())
}
