/// Optional bearer-token identity for the post, search and predict routes.
///
/// When `auth.required` is off the extractor always succeeds with no
/// identity, so the open contract of those routes is unchanged.
use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use tracing::debug;

use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Caller(pub Option<String>);

impl Caller {
    pub fn username(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl FromRequest for Caller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<Caller, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("application state not configured".into()))?;

    if !state.config.auth.required {
        return Ok(Caller(None));
    }

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::MissingToken)?;

    let claims = state.tokens.validate(token).map_err(|e| {
        debug!("rejected bearer token: {}", e);
        AppError::InvalidToken(e)
    })?;

    Ok(Caller(Some(claims.username)))
}
