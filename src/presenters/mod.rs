use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::entities::UserId;
use crate::usecases::UserCard;

pub mod comment;
pub mod idea;
pub mod user;

/// Someone an idea or comment refers to: their card, or the bare id once the account is gone.
#[derive(Serialize)]
#[serde(untagged)]
enum Person<'a> {
    Card(&'a UserCard),
    Id(UserId),
}

impl<'a> Person<'a> {
    fn new(card: Option<&'a UserCard>, id: UserId) -> Self {
        match card {
            Some(c) => Person::Card(c),
            None => Person::Id(id),
        }
    }
}

/// Body of every response: `{success, message?, data?, errors?}`.
#[derive(Debug, Serialize)]
pub struct Envelope {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<String>>,
}

impl Envelope {
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
            data: None,
            errors: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            errors: None,
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn data(mut self, data: impl Serialize) -> Self {
        self.data = match serde_json::to_value(data) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::error!("cannot serialize response data: {}", e);
                None
            },
        };
        self
    }

    pub fn errors(mut self, errors: Vec<String>) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn created(self) -> Response { (StatusCode::CREATED, self).into_response() }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response { Json(self).into_response() }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn omits_what_is_absent() {
        let body = serde_json::to_value(Envelope::success().message("ok")).unwrap();
        assert_eq!(body, json!({ "success": true, "message": "ok" }));

        let body = serde_json::to_value(
            Envelope::failure("Validation error").errors(vec!["Title is required".to_string()]),
        )
        .unwrap();
        assert_eq!(
            body,
            json!({
                "success": false,
                "message": "Validation error",
                "errors": ["Title is required"],
            })
        );
    }

    #[test]
    fn carries_data() {
        let body =
            serde_json::to_value(Envelope::success().data(json!({ "upvoted": true }))).unwrap();

        assert_eq!(body["data"]["upvoted"], true);
        assert!(body.get("message").is_none());
    }
}
