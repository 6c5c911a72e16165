use axum::response::{IntoResponse, Response};
use serde::Serialize;

use super::Envelope;
use crate::entities::User;
use crate::usecases::user::{change_password, edit, get, login, register};

#[derive(Serialize)]
struct Session<'a> {
    user: &'a User,
    token: &'a str,
}

#[derive(Serialize)]
struct Profile<'a> {
    user: &'a User,
}

impl IntoResponse for register::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .message("User registered successfully")
            .data(Session {
                user: &self.user,
                token: &self.token,
            })
            .created()
    }
}

impl IntoResponse for login::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .message("Login successful")
            .data(Session {
                user: &self.user,
                token: &self.token,
            })
            .into_response()
    }
}

impl IntoResponse for get::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .data(Profile { user: &self.user })
            .into_response()
    }
}

impl IntoResponse for edit::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .message("Profile updated successfully")
            .data(Profile { user: &self.user })
            .into_response()
    }
}

impl IntoResponse for change_password::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .message("Password changed successfully")
            .into_response()
    }
}
