/// Signed session tokens for Around services
///
/// Tokens are compact JWTs signed with HS256 using a shared secret that is
/// injected at startup. Claims carry the username and an expiry; there is no
/// refresh flow and no revocation list.
///
/// ## Usage
///
/// ```rust
/// use crypto_core::jwt::TokenIssuer;
///
/// let issuer = TokenIssuer::new(b"change-me", 24).expect("valid secret");
/// let token = issuer.issue("abc_1").expect("token");
/// let claims = issuer.validate(&token).expect("claims");
/// assert_eq!(claims.username, "abc_1");
/// ```
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Default token lifetime
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

// ============================================================================
// Data Structures
// ============================================================================

/// Claims embedded in every token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Username of the authenticated user
    pub username: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("signing secret must not be empty")]
    EmptySecret,

    #[error("token lifetime must be positive, got {0} hours")]
    InvalidTtl(i64),

    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

// ============================================================================
// Issuer
// ============================================================================

/// Issues and validates tokens with one shared secret.
///
/// Cheap to clone; keys are immutable after construction.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// Build an issuer from a raw secret and a lifetime in hours.
    ///
    /// ## Errors
    ///
    /// - `EmptySecret` if `secret` is empty
    /// - `InvalidTtl` if `ttl_hours` is not positive
    pub fn new(secret: &[u8], ttl_hours: i64) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::EmptySecret);
        }
        if ttl_hours <= 0 {
            return Err(JwtError::InvalidTtl(ttl_hours));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl: Duration::hours(ttl_hours),
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `username` expiring `ttl` from now
    pub fn issue(&self, username: &str) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding_key)
            .map_err(JwtError::Signing)
    }

    /// Verify signature and expiry, returning the embedded claims.
    ///
    /// Only HS256 is accepted; tokens signed with any other algorithm fail
    /// validation.
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => {
                    tracing::debug!("token validation failed: {}", e);
                    JwtError::Invalid(e)
                }
            })
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl_hours", &self.ttl.num_hours())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
