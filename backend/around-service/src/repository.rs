//! Storage seams used by the HTTP handlers.
//!
//! Production wiring uses [`crate::elasticsearch::ElasticsearchClient`] for
//! both traits; tests plug in in-memory doubles.
use async_trait::async_trait;
use thiserror::Error;

use crate::models::{GeoQuery, Post, User};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A create found an existing document with the same id
    #[error("document already exists: {0}")]
    Conflict(String),

    #[error("search backend rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("search backend unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Index a post under `id`; returns once the post is visible to searches.
    async fn save_post(&self, id: &str, post: &Post) -> Result<(), StoreError>;

    /// Every post whose location lies within the query radius, in backend order.
    async fn search_nearby(&self, query: &GeoQuery) -> Result<Vec<Post>, StoreError>;

    /// Reachability of the backing store
    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All user documents whose username matches exactly
    async fn find_by_username(&self, username: &str) -> Result<Vec<User>, StoreError>;

    /// Insert keyed by username. Fails with [`StoreError::Conflict`] when the
    /// username is already taken.
    async fn create_user(&self, user: &User) -> Result<(), StoreError>;
}
