use alloc::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use super::extract::{path_id, Body};
use super::{AppState, Authenticated, Viewer};
use crate::error::Result;
use crate::usecases::comment::{add, edit, flag, get_replies, gets, like, moderate, withdraw};
use crate::usecases::PageRequest;

type Params<T> = ::core::result::Result<Query<T>, QueryRejection>;

pub struct CommentController {
    pub add: Arc<dyn add::Usecase + Sync + Send>,
    pub gets: Arc<dyn gets::Usecase + Sync + Send>,
    pub get_replies: Arc<dyn get_replies::Usecase + Sync + Send>,
    pub edit: Arc<dyn edit::Usecase + Sync + Send>,
    pub withdraw: Arc<dyn withdraw::Usecase + Sync + Send>,
    pub like: Arc<dyn like::Usecase + Sync + Send>,
    pub flag: Arc<dyn flag::Usecase + Sync + Send>,
    pub moderate: Arc<dyn moderate::Usecase + Sync + Send>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentBody {
    content: Option<String>,
    parent_comment: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    page: Option<u64>,
    limit: Option<u64>,
    sort_by: Option<String>,
    sort_order: Option<String>,
    include_replies: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepliesQuery {
    page: Option<u64>,
    limit: Option<u64>,
    sort_order: Option<String>,
}

#[derive(Deserialize)]
pub struct FlagBody {
    reason: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize)]
pub struct ModerateBody {
    action: Option<String>,
    note: Option<String>,
}

pub async fn add(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
    body: Body<CommentBody>,
) -> Result<add::Output> {
    let idea_id = path_id(&id)?;
    let Json(CommentBody {
        content,
        parent_comment,
    }) = body?;

    state
        .comments
        .add
        .handle(add::Input {
            user,
            idea_id,
            content,
            parent_comment,
        })
        .await
}

pub async fn gets(
    State(state): State<Arc<AppState>>,
    Viewer(viewer): Viewer,
    Path(id): Path<String>,
    query: Params<ListQuery>,
) -> Result<gets::Output> {
    let idea_id = path_id(&id)?;
    let Query(q) = query?;

    state
        .comments
        .gets
        .handle(gets::Input {
            viewer,
            idea_id,
            page: PageRequest {
                page: q.page,
                limit: q.limit,
            },
            sort_by: q.sort_by,
            sort_order: q.sort_order,
            include_replies: q.include_replies.unwrap_or(true),
        })
        .await
}

pub async fn get_replies(
    State(state): State<Arc<AppState>>,
    Viewer(viewer): Viewer,
    Path(id): Path<String>,
    query: Params<RepliesQuery>,
) -> Result<get_replies::Output> {
    let comment_id = path_id(&id)?;
    let Query(q) = query?;

    state
        .comments
        .get_replies
        .handle(get_replies::Input {
            viewer,
            comment_id,
            page: PageRequest {
                page: q.page,
                limit: q.limit,
            },
            sort_order: q.sort_order,
        })
        .await
}

pub async fn edit(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
    body: Body<CommentBody>,
) -> Result<edit::Output> {
    let comment_id = path_id(&id)?;
    let Json(CommentBody { content, .. }) = body?;

    state
        .comments
        .edit
        .handle(edit::Input {
            user,
            comment_id,
            content,
        })
        .await
}

pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
) -> Result<withdraw::Output> {
    state
        .comments
        .withdraw
        .handle(withdraw::Input {
            user,
            comment_id: path_id(&id)?,
        })
        .await
}

pub async fn like(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
) -> Result<like::Output> {
    state
        .comments
        .like
        .handle(like::Input {
            user,
            comment_id: path_id(&id)?,
        })
        .await
}

pub async fn flag(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
    body: Body<FlagBody>,
) -> Result<flag::Output> {
    let comment_id = path_id(&id)?;
    let Json(FlagBody {
        reason,
        description,
    }) = body?;

    state
        .comments
        .flag
        .handle(flag::Input {
            user,
            comment_id,
            reason,
            description,
        })
        .await
}

pub async fn moderate(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
    body: Body<ModerateBody>,
) -> Result<moderate::Output> {
    let comment_id = path_id(&id)?;
    let Json(ModerateBody { action, note }) = body?;

    state
        .comments
        .moderate
        .handle(moderate::Input {
            user,
            comment_id,
            action,
            note,
        })
        .await
}
