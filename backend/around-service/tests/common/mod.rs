#![allow(dead_code)]

use actix_web::web;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use around_service::models::{GeoQuery, Post, User};
use around_service::providers::{ImageScorer, PredictionError};
use around_service::repository::{PostRepository, StoreError, UserRepository};
use around_service::{AppState, Config};
use crypto_core::TokenIssuer;

pub const TEST_SECRET: &str = "test-signing-secret";

/// Build the full app (CORS headers + routes) around `$state`.
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.clone())
                .wrap(around_service::middleware::cors_headers())
                .configure(around_service::configure),
        )
        .await
    };
}

// ============================================
// Post store double
// ============================================

#[derive(Default)]
pub struct InMemoryPosts {
    posts: Mutex<Vec<(String, Post)>>,
    pub fail: bool,
}

impl InMemoryPosts {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn insert(&self, post: Post) {
        let id = format!("seed-{}", self.len());
        self.posts.lock().unwrap().push((id, post));
    }

    pub fn len(&self) -> usize {
        self.posts.lock().unwrap().len()
    }

    pub fn all(&self) -> Vec<Post> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, p)| p.clone())
            .collect()
    }
}

#[async_trait]
impl PostRepository for InMemoryPosts {
    async fn save_post(&self, id: &str, post: &Post) -> Result<(), StoreError> {
        if self.fail {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        self.posts
            .lock()
            .unwrap()
            .push((id.to_string(), post.clone()));
        Ok(())
    }

    async fn search_nearby(&self, query: &GeoQuery) -> Result<Vec<Post>, StoreError> {
        if self.fail {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        let radius_km = distance_km(&query.distance).ok_or_else(|| StoreError::Rejected {
            status: 400,
            body: format!("failed to parse distance [{}]", query.distance),
        })?;

        Ok(self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, p)| {
                haversine_km(query.lat, query.lon, p.location.lat, p.location.lon) <= radius_km
            })
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        if self.fail {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

/// "200km" -> 200.0, "500m" -> 0.5; bare numbers are metres.
pub fn distance_km(distance: &str) -> Option<f64> {
    let d = distance.trim();
    if let Some(km) = d.strip_suffix("km") {
        return km.trim().parse().ok();
    }
    if let Some(m) = d.strip_suffix('m') {
        return m.trim().parse::<f64>().ok().map(|m| m / 1000.0);
    }
    d.parse::<f64>().ok().map(|m| m / 1000.0)
}

pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

// ============================================
// User store double
// ============================================

#[derive(Default)]
pub struct InMemoryUsers {
    users: Mutex<HashMap<String, User>>,
    pub lookups: AtomicUsize,
    pub writes: AtomicUsize,
    /// Lookups see nothing, as if a concurrent signup had not been indexed yet
    pub stale_reads: bool,
}

impl InMemoryUsers {
    pub fn with_stale_reads() -> Self {
        Self {
            stale_reads: true,
            ..Default::default()
        }
    }

    pub fn insert(&self, user: User) {
        self.users
            .lock()
            .unwrap()
            .insert(user.username.clone(), user);
    }

    pub fn get(&self, username: &str) -> Option<User> {
        self.users.lock().unwrap().get(username).cloned()
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_username(&self, username: &str) -> Result<Vec<User>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.stale_reads {
            return Ok(Vec::new());
        }
        Ok(self
            .users
            .lock()
            .unwrap()
            .get(username)
            .cloned()
            .into_iter()
            .collect())
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user.username) {
            return Err(StoreError::Conflict(format!(
                "[{}]: version conflict, document already exists",
                user.username
            )));
        }
        users.insert(user.username.clone(), user.clone());
        Ok(())
    }
}

// ============================================
// Scorer double
// ============================================

pub struct FixedScorer(pub f64);

#[async_trait]
impl ImageScorer for FixedScorer {
    async fn score(&self, _image: &[u8]) -> Result<f64, PredictionError> {
        Ok(self.0)
    }
}

// ============================================
// State
// ============================================

pub struct TestContext {
    pub posts: Arc<InMemoryPosts>,
    pub users: Arc<InMemoryUsers>,
    pub state: web::Data<AppState>,
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.auth.jwt_secret = TEST_SECRET.to_string();
    config
}

pub fn issuer() -> TokenIssuer {
    TokenIssuer::new(TEST_SECRET.as_bytes(), 24).expect("token issuer")
}

pub fn context_with(
    config: Config,
    posts: InMemoryPosts,
    users: InMemoryUsers,
    scorer: Arc<dyn ImageScorer>,
) -> TestContext {
    let posts = Arc::new(posts);
    let users = Arc::new(users);
    let tokens = TokenIssuer::new(config.auth.jwt_secret.as_bytes(), config.auth.token_ttl_hours)
        .expect("token issuer");

    let state = web::Data::new(AppState {
        posts: posts.clone(),
        users: users.clone(),
        scorer,
        tokens,
        config,
    });

    TestContext {
        posts,
        users,
        state,
    }
}

pub fn context() -> TestContext {
    context_with(
        test_config(),
        InMemoryPosts::default(),
        InMemoryUsers::default(),
        Arc::new(FixedScorer(0.5)),
    )
}
