use async_trait::async_trait;
use elasticsearch::{
    http::{
        response::Response,
        transport::{BuildError, SingleNodeConnectionPool, TransportBuilder},
    },
    indices::{IndicesCreateParts, IndicesExistsParts},
    params::Refresh,
    ClearScrollParts, CreateParts, Elasticsearch, IndexParts, ScrollParts, SearchParts,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{ElasticsearchConfig, SearchConfig};
use crate::models::{GeoQuery, Post, User};
use crate::repository::{PostRepository, StoreError, UserRepository};

/// Upper bound on documents returned by a username lookup
const USER_LOOKUP_LIMIT: i64 = 100;

#[derive(Debug, Error)]
pub enum ElasticsearchError {
    #[error("invalid Elasticsearch URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to build transport: {0}")]
    TransportBuild(#[from] BuildError),
    #[error("transport error: {0}")]
    Transport(#[from] elasticsearch::Error),
    #[error("failed to create index {index} ({status}): {body}")]
    IndexCreation {
        index: String,
        status: u16,
        body: String,
    },
}

impl From<elasticsearch::Error> for StoreError {
    fn from(err: elasticsearch::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Shared Elasticsearch client backing both the post and user indices.
///
/// The underlying transport pools connections; clone freely.
#[derive(Clone)]
pub struct ElasticsearchClient {
    client: Elasticsearch,
    post_index: String,
    user_index: String,
    location_field: String,
    scroll_page_size: i64,
    scroll_keep_alive: String,
}

impl ElasticsearchClient {
    /// Connect and make sure both indices exist with the mappings we rely on.
    pub async fn new(
        config: &ElasticsearchConfig,
        search: &SearchConfig,
    ) -> Result<Self, ElasticsearchError> {
        let parsed = Url::parse(&config.url)?;
        let pool = SingleNodeConnectionPool::new(parsed);
        let transport = TransportBuilder::new(pool).build()?;
        let client = Elasticsearch::new(transport);

        let instance = Self {
            client,
            post_index: config.post_index.clone(),
            user_index: config.user_index.clone(),
            location_field: config.location_field.clone(),
            scroll_page_size: search.scroll_page_size,
            scroll_keep_alive: search.scroll_keep_alive.clone(),
        };

        instance.ensure_post_index().await?;
        instance.ensure_user_index().await?;

        Ok(instance)
    }

    async fn ensure_post_index(&self) -> Result<(), ElasticsearchError> {
        let body = post_index_mapping(&self.location_field);
        self.ensure_index(&self.post_index, body).await
    }

    async fn ensure_user_index(&self) -> Result<(), ElasticsearchError> {
        let body = json!({
            "mappings": {
                "properties": {
                    "username": { "type": "keyword" }
                }
            }
        });
        self.ensure_index(&self.user_index, body).await
    }

    async fn ensure_index(&self, index: &str, body: Value) -> Result<(), ElasticsearchError> {
        let exists_response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await?;

        if exists_response.status_code().is_success() {
            debug!(index, "index already exists");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(body)
            .send()
            .await?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ElasticsearchError::IndexCreation {
                index: index.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        info!(index, "created index");
        Ok(())
    }

    /// Drain every hit of `body` through the scroll API.
    ///
    /// The scroll context is cleared whether or not draining succeeded.
    async fn scroll_all<T: DeserializeOwned>(
        &self,
        index: &str,
        body: Value,
    ) -> Result<Vec<T>, StoreError> {
        let mut scroll_id = None;
        let result = self.drain_scroll(index, body, &mut scroll_id).await;

        if let Some(id) = scroll_id {
            self.clear_scroll(&id).await;
        }

        result
    }

    /// Page through a scroll, recording the latest scroll id in `scroll_id`.
    async fn drain_scroll<T: DeserializeOwned>(
        &self,
        index: &str,
        body: Value,
        scroll_id: &mut Option<String>,
    ) -> Result<Vec<T>, StoreError> {
        let response = self
            .client
            .search(SearchParts::Index(&[index]))
            .scroll(&self.scroll_keep_alive)
            .size(self.scroll_page_size)
            .body(body)
            .send()
            .await?;

        let mut page: SearchResponse = read_json(response).await?;
        if let Some(took) = page.took {
            debug!(index, took_ms = took, "search executed");
        }

        let mut documents = Vec::new();

        loop {
            if let Some(next) = page.scroll_id.take() {
                *scroll_id = Some(next);
            }

            let fetched = page.hits.hits.len();
            documents.extend(decode_hits::<T>(page.hits.hits));

            let Some(id) = scroll_id.as_deref() else {
                break;
            };
            if fetched == 0 || (fetched as i64) < self.scroll_page_size {
                break;
            }

            let response = self
                .client
                .scroll(ScrollParts::None)
                .body(json!({
                    "scroll": self.scroll_keep_alive,
                    "scroll_id": id,
                }))
                .send()
                .await?;

            page = read_json(response).await?;
        }

        Ok(documents)
    }

    async fn clear_scroll(&self, scroll_id: &str) {
        let result = self
            .client
            .clear_scroll(ClearScrollParts::None)
            .body(json!({ "scroll_id": [scroll_id] }))
            .send()
            .await;

        if let Err(err) = result {
            debug!("failed to clear scroll context: {}", err);
        }
    }
}

#[async_trait]
impl PostRepository for ElasticsearchClient {
    async fn save_post(&self, id: &str, post: &Post) -> Result<(), StoreError> {
        let response = self
            .client
            .index(IndexParts::IndexId(&self.post_index, id))
            .refresh(Refresh::WaitFor)
            .body(post)
            .send()
            .await?;

        ensure_success(response).await?;
        debug!(post_id = id, index = %self.post_index, "post indexed");
        Ok(())
    }

    async fn search_nearby(&self, query: &GeoQuery) -> Result<Vec<Post>, StoreError> {
        let body = geo_distance_query(&self.location_field, query);
        self.scroll_all(&self.post_index, body).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let response = self.client.ping().send().await?;
        ensure_success(response).await.map(|_| ())
    }
}

#[async_trait]
impl UserRepository for ElasticsearchClient {
    async fn find_by_username(&self, username: &str) -> Result<Vec<User>, StoreError> {
        let response = self
            .client
            .search(SearchParts::Index(&[self.user_index.as_str()]))
            .size(USER_LOOKUP_LIMIT)
            .body(username_term_query(username))
            .send()
            .await?;

        let page: SearchResponse = read_json(response).await?;
        Ok(decode_hits(page.hits.hits))
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        let response = self
            .client
            .create(CreateParts::IndexId(&self.user_index, &user.username))
            .refresh(Refresh::WaitFor)
            .body(user)
            .send()
            .await?;

        ensure_success(response).await?;
        debug!(username = %user.username, "user indexed");
        Ok(())
    }
}

// ============================================
// Query builders
// ============================================

pub fn post_index_mapping(location_field: &str) -> Value {
    json!({
        "mappings": {
            "properties": {
                location_field: { "type": "geo_point" }
            }
        }
    })
}

/// Non-scoring radius filter around `query.lat`/`query.lon`.
pub fn geo_distance_query(location_field: &str, query: &GeoQuery) -> Value {
    json!({
        "query": {
            "bool": {
                "filter": {
                    "geo_distance": {
                        "distance": query.distance,
                        location_field: {
                            "lat": query.lat,
                            "lon": query.lon
                        }
                    }
                }
            }
        }
    })
}

pub fn username_term_query(username: &str) -> Value {
    json!({
        "query": {
            "term": { "username": username }
        }
    })
}

// ============================================
// Response handling
// ============================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "_scroll_id")]
    scroll_id: Option<String>,
    took: Option<u64>,
    hits: InnerHits,
}

#[derive(Debug, Deserialize)]
struct InnerHits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: Option<String>,
    #[serde(rename = "_source")]
    source: Option<Value>,
}

/// Documents whose `_source` does not fit `T` are skipped.
fn decode_hits<T: DeserializeOwned>(hits: Vec<Hit>) -> Vec<T> {
    hits.into_iter()
        .filter_map(|hit| {
            let source = hit.source?;
            match serde_json::from_value(source) {
                Ok(doc) => Some(doc),
                Err(err) => {
                    debug!(doc_id = ?hit.id, "skipping undecodable document: {}", err);
                    None
                }
            }
        })
        .collect()
}

async fn ensure_success(response: Response) -> Result<Response, StoreError> {
    let status = response.status_code();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status.as_u16() == 409 {
        return Err(StoreError::Conflict(body));
    }

    warn!(status = status.as_u16(), "search backend returned an error");
    Err(StoreError::Rejected {
        status: status.as_u16(),
        body,
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let response = ensure_success(response).await?;
    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}
