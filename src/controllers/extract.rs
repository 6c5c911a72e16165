use alloc::sync::Arc;
use core::str::FromStr;

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;

use super::AppState;
use crate::entities::User;
use crate::error::{AppError, Result};
use crate::repositories::RepositoryError;

/// JSON body whose rejection surfaces as a 400 in the usual envelope.
pub type Body<T> = ::core::result::Result<Json<T>, JsonRejection>;

/// The caller, who must present a valid bearer token for an active account.
#[derive(Debug)]
pub struct Authenticated(pub User);

/// The caller if a valid token was presented; anonymous otherwise.
#[derive(Debug)]
pub struct Viewer(pub Option<User>);

fn bearer(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self> {
        let token = bearer(parts)
            .ok_or_else(|| AppError::Unauthorized("Access denied. No token provided.".into()))?;

        let id = state
            .tokens
            .verify(token)
            .ok_or_else(|| AppError::Unauthorized("Invalid token".into()))?;

        let user = match state.user_repository.find(id).await {
            Ok(u) => u,
            Err(RepositoryError::NotFound) => {
                return Err(AppError::Unauthorized(
                    "Token is valid but user no longer exists".into(),
                ))
            },
            Err(e) => return Err(AppError::Internal(e.into())),
        };

        if !user.is_active {
            return Err(AppError::Unauthorized("Account is deactivated".into()));
        }

        Ok(Authenticated(user))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self> {
        let Some(id) = bearer(parts).and_then(|t| state.tokens.verify(t)) else {
            return Ok(Viewer(None));
        };

        let viewer = match state.user_repository.find(id).await {
            Ok(u) if u.is_active => Some(u),
            Ok(_) | Err(RepositoryError::NotFound) => None,
            Err(e) => return Err(AppError::Internal(e.into())),
        };

        Ok(Viewer(viewer))
    }
}

/// Parses a path segment. Anything malformed is reported as a missing resource.
pub fn path_id<T: FromStr>(raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| AppError::NotFound("Resource not found".into()))
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;
    use crate::entities::IdeaId;

    fn parts(header: Option<&str>) -> Parts {
        let mut req = Request::builder().uri("/");
        if let Some(h) = header {
            req = req.header(AUTHORIZATION, h);
        }
        req.body(()).unwrap().into_parts().0
    }

    #[test]
    fn reads_bearer_tokens() {
        assert_eq!(bearer(&parts(Some("Bearer abc"))), Some("abc"));
        assert_eq!(bearer(&parts(Some("Basic abc"))), None);
        assert_eq!(bearer(&parts(Some("Bearer "))), None);
        assert_eq!(bearer(&parts(None)), None);
    }

    #[test]
    fn malformed_ids_are_not_found() {
        assert!(matches!(
            path_id::<IdeaId>("not-an-id"),
            Err(AppError::NotFound(m)) if m == "Resource not found"
        ));
        assert!(path_id::<IdeaId>(&IdeaId::generate().to_string()).is_ok());
    }
}
