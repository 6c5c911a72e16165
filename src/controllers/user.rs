use alloc::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::extract::Body;
use super::{AppState, Authenticated};
use crate::error::Result;
use crate::usecases::user::{change_password, edit, get, login, register, ProfileEdit};
use crate::usecases::Secret;

pub struct UserController {
    pub register: Arc<dyn register::Usecase + Sync + Send>,
    pub login: Arc<dyn login::Usecase + Sync + Send>,
    pub get: Arc<dyn get::Usecase + Sync + Send>,
    pub edit: Arc<dyn edit::Usecase + Sync + Send>,
    pub change_password: Arc<dyn change_password::Usecase + Sync + Send>,
}

#[derive(Deserialize)]
pub struct RegisterBody {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    role: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginBody {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileBody {
    name: Option<String>,
    student_id: Option<String>,
    university: Option<String>,
    department: Option<String>,
    year: Option<i64>,
    expertise: Option<Vec<String>>,
    bio: Option<String>,
    avatar: Option<String>,
    phone: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordBody {
    current_password: Option<String>,
    new_password: Option<String>,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Body<RegisterBody>,
) -> Result<register::Output> {
    let Json(RegisterBody {
        name,
        email,
        password,
        role,
    }) = body?;

    state
        .users
        .register
        .handle(register::Input {
            name,
            email,
            password: password.map(Secret),
            role,
        })
        .await
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Body<LoginBody>,
) -> Result<login::Output> {
    let Json(LoginBody { email, password }) = body?;

    state
        .users
        .login
        .handle(login::Input {
            email,
            password: password.map(Secret),
        })
        .await
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
) -> Result<get::Output> {
    state.users.get.handle(get::Input { user_id: user.id }).await
}

pub async fn edit(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
    body: Body<ProfileBody>,
) -> Result<edit::Output> {
    let Json(b) = body?;

    let profile = ProfileEdit {
        name: b.name,
        student_id: b.student_id,
        university: b.university,
        department: b.department,
        year: b.year,
        expertise: b.expertise,
        bio: b.bio,
        avatar: b.avatar,
        phone: b.phone,
    };

    state
        .users
        .edit
        .handle(edit::Input {
            user_id: user.id,
            profile,
        })
        .await
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
    body: Body<PasswordBody>,
) -> Result<change_password::Output> {
    let Json(PasswordBody {
        current_password,
        new_password,
    }) = body?;

    state
        .users
        .change_password
        .handle(change_password::Input {
            user_id: user.id,
            current_password: current_password.map(Secret),
            new_password: new_password.map(Secret),
        })
        .await
}
