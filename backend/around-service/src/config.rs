/// Configuration management for around-service
///
/// Every external endpoint and secret is read from the environment (with
/// `.env` support in `main`) and passed explicitly to the components that
/// need it.
use std::str::FromStr;
use thiserror::Error;

const DEV_JWT_SECRET: &str = "around-dev-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppConfig,
    pub elasticsearch: ElasticsearchConfig,
    pub search: SearchConfig,
    pub ml: MlConfig,
    pub auth: AuthConfig,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub env: String,
}

#[derive(Clone, Debug)]
pub struct ElasticsearchConfig {
    pub url: String,
    pub post_index: String,
    pub user_index: String,
    /// Geo-point field queried by radius search
    pub location_field: String,
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Radius used when the request carries no `range`, e.g. "200km"
    pub default_distance: String,
    /// Hits fetched per scroll round trip
    pub scroll_page_size: i64,
    pub scroll_keep_alive: String,
}

#[derive(Clone, Debug)]
pub struct MlConfig {
    pub base_url: String,
    pub project: String,
    pub model: String,
    pub scope: String,
    /// Static bearer token; when unset, Application Default Credentials are used
    pub access_token: Option<String>,
    /// No timeout is applied when unset
    pub timeout_secs: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    /// Require a bearer token on /post, /search and /predict
    pub required: bool,
}

impl MlConfig {
    pub fn predict_url(&self) -> String {
        format!(
            "{}/projects/{}/models/{}:predict",
            self.base_url.trim_end_matches('/'),
            self.project,
            self.model
        )
    }
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app: AppConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                env: "development".to_string(),
            },
            elasticsearch: ElasticsearchConfig {
                url: "http://localhost:9200".to_string(),
                post_index: "post".to_string(),
                user_index: "user".to_string(),
                location_field: "location".to_string(),
            },
            search: SearchConfig {
                default_distance: "200km".to_string(),
                scroll_page_size: 500,
                scroll_keep_alive: "1m".to_string(),
            },
            ml: MlConfig {
                base_url: "https://ml.googleapis.com/v1".to_string(),
                project: "wearound".to_string(),
                model: "Pretrained_Model".to_string(),
                scope: "https://www.googleapis.com/auth/cloud-platform".to_string(),
                access_token: None,
                timeout_secs: None,
            },
            auth: AuthConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                token_ttl_hours: crypto_core::jwt::DEFAULT_TOKEN_TTL_HOURS,
                required: false,
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let app = AppConfig {
            host: get("AROUND_SERVICE_HOST").unwrap_or(defaults.app.host),
            port: parse_or("AROUND_SERVICE_PORT", get("AROUND_SERVICE_PORT"), defaults.app.port)?,
            env: get("APP_ENV").unwrap_or(defaults.app.env),
        };

        let elasticsearch = ElasticsearchConfig {
            url: get("ELASTICSEARCH_URL").unwrap_or(defaults.elasticsearch.url),
            post_index: get("ELASTICSEARCH_POST_INDEX").unwrap_or(defaults.elasticsearch.post_index),
            user_index: get("ELASTICSEARCH_USER_INDEX").unwrap_or(defaults.elasticsearch.user_index),
            location_field: get("ELASTICSEARCH_LOCATION_FIELD")
                .unwrap_or(defaults.elasticsearch.location_field),
        };

        let scroll_page_size = parse_or(
            "SEARCH_SCROLL_PAGE_SIZE",
            get("SEARCH_SCROLL_PAGE_SIZE"),
            defaults.search.scroll_page_size,
        )?;
        if scroll_page_size <= 0 {
            return Err(ConfigError::Invalid {
                var: "SEARCH_SCROLL_PAGE_SIZE",
                value: scroll_page_size.to_string(),
            });
        }
        let search = SearchConfig {
            default_distance: get("SEARCH_DEFAULT_DISTANCE")
                .unwrap_or(defaults.search.default_distance),
            scroll_page_size,
            scroll_keep_alive: get("SEARCH_SCROLL_KEEP_ALIVE")
                .unwrap_or(defaults.search.scroll_keep_alive),
        };

        let ml = MlConfig {
            base_url: get("ML_API_BASE_URL").unwrap_or(defaults.ml.base_url),
            project: get("ML_PROJECT").unwrap_or(defaults.ml.project),
            model: get("ML_MODEL").unwrap_or(defaults.ml.model),
            scope: get("ML_AUTH_SCOPE").unwrap_or(defaults.ml.scope),
            access_token: get("ML_ACCESS_TOKEN"),
            timeout_secs: get("ML_REQUEST_TIMEOUT_SECS")
                .map(|v| parse_value("ML_REQUEST_TIMEOUT_SECS", v))
                .transpose()?,
        };

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None if app.is_production() => return Err(ConfigError::Missing("JWT_SECRET")),
            None => {
                tracing::warn!("JWT_SECRET not set; using the development signing secret");
                defaults.auth.jwt_secret
            }
        };
        let auth = AuthConfig {
            jwt_secret,
            token_ttl_hours: parse_or(
                "JWT_TOKEN_TTL_HOURS",
                get("JWT_TOKEN_TTL_HOURS"),
                defaults.auth.token_ttl_hours,
            )?,
            required: parse_or("AUTH_REQUIRED", get("AUTH_REQUIRED"), defaults.auth.required)?,
        };

        Ok(Config {
            app,
            elasticsearch,
            search,
            ml,
            auth,
        })
    }
}

fn parse_value<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { var, value })
}

fn parse_or<T: FromStr>(
    var: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(v) => parse_value(var, v),
        None => Ok(default),
    }
}
