use alloc::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use super::extract::{path_id, Body};
use super::{AppState, Authenticated, Viewer};
use crate::entities::Date;
use crate::error::Result;
use crate::usecases::idea::{
    add_milestone, add_update, assign_mentor, complete_milestone, edit, feature, get, gets,
    review, submit, upvote, withdraw, IdeaDraft, IdeaFilter,
};
use crate::usecases::PageRequest;

pub struct IdeaController {
    pub submit: Arc<dyn submit::Usecase + Sync + Send>,
    pub gets: Arc<dyn gets::Usecase + Sync + Send>,
    pub get: Arc<dyn get::Usecase + Sync + Send>,
    pub edit: Arc<dyn edit::Usecase + Sync + Send>,
    pub withdraw: Arc<dyn withdraw::Usecase + Sync + Send>,
    pub upvote: Arc<dyn upvote::Usecase + Sync + Send>,
    pub assign_mentor: Arc<dyn assign_mentor::Usecase + Sync + Send>,
    pub review: Arc<dyn review::Usecase + Sync + Send>,
    pub feature: Arc<dyn feature::Usecase + Sync + Send>,
    pub add_milestone: Arc<dyn add_milestone::Usecase + Sync + Send>,
    pub complete_milestone: Arc<dyn complete_milestone::Usecase + Sync + Send>,
    pub add_update: Arc<dyn add_update::Usecase + Sync + Send>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftBody {
    title: Option<String>,
    problem: Option<String>,
    solution: Option<String>,
    secret_sauce: Option<String>,
    target_audience: Option<String>,
    required_help: Option<Vec<String>>,
    privacy_level: Option<String>,
    category: Option<String>,
    tags: Option<Vec<String>>,
}

impl From<DraftBody> for IdeaDraft {
    fn from(b: DraftBody) -> Self {
        Self {
            title: b.title,
            problem: b.problem,
            solution: b.solution,
            secret_sauce: b.secret_sauce,
            target_audience: b.target_audience,
            required_help: b.required_help,
            privacy_level: b.privacy_level,
            category: b.category,
            tags: b.tags,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    page: Option<u64>,
    limit: Option<u64>,
    category: Option<String>,
    status: Option<String>,
    privacy: Option<String>,
    search: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
    featured: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorBody {
    mentor_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBody {
    status: Option<String>,
    review_notes: Option<String>,
}

#[derive(Deserialize)]
pub struct FeatureBody {
    #[serde(default = "featured_by_default", alias = "isFeatured")]
    featured: bool,
}

fn featured_by_default() -> bool { true }

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneBody {
    title: Option<String>,
    description: Option<String>,
    #[serde(default, deserialize_with = "date_or_day")]
    due_date: Option<Date>,
}

/// An RFC 3339 timestamp, or a bare `YYYY-MM-DD` taken as midnight UTC.
fn date_or_day<'de, D>(d: D) -> ::core::result::Result<Option<Date>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Due {
        At(Date),
        Day(NaiveDate),
    }

    Ok(match Option::<Due>::deserialize(d)? {
        None => None,
        Some(Due::At(at)) => Some(at),
        Some(Due::Day(day)) => Some(day.and_time(NaiveTime::MIN).and_utc()),
    })
}

#[derive(Deserialize)]
pub struct UpdateBody {
    title: Option<String>,
    content: Option<String>,
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
    body: Body<DraftBody>,
) -> Result<submit::Output> {
    let Json(draft) = body?;

    state
        .ideas
        .submit
        .handle(submit::Input {
            user,
            draft: draft.into(),
        })
        .await
}

pub async fn gets(
    State(state): State<Arc<AppState>>,
    Viewer(viewer): Viewer,
    query: ::core::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<gets::Output> {
    let Query(q) = query?;

    let filter = IdeaFilter {
        category: q.category,
        status: q.status,
        privacy: q.privacy,
        search: q.search,
        sort_by: q.sort_by,
        sort_order: q.sort_order,
        featured: q.featured,
    };

    state
        .ideas
        .gets
        .handle(gets::Input {
            viewer,
            filter,
            page: PageRequest {
                page: q.page,
                limit: q.limit,
            },
        })
        .await
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Viewer(viewer): Viewer,
    Path(id): Path<String>,
) -> Result<get::Output> {
    state
        .ideas
        .get
        .handle(get::Input {
            viewer,
            idea_id: path_id(&id)?,
        })
        .await
}

pub async fn edit(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
    body: Body<DraftBody>,
) -> Result<edit::Output> {
    let idea_id = path_id(&id)?;
    let Json(draft) = body?;

    state
        .ideas
        .edit
        .handle(edit::Input {
            user,
            idea_id,
            draft: draft.into(),
        })
        .await
}

pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
) -> Result<withdraw::Output> {
    state
        .ideas
        .withdraw
        .handle(withdraw::Input {
            user,
            idea_id: path_id(&id)?,
        })
        .await
}

pub async fn upvote(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
) -> Result<upvote::Output> {
    state
        .ideas
        .upvote
        .handle(upvote::Input {
            user,
            idea_id: path_id(&id)?,
        })
        .await
}

pub async fn assign_mentor(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
    body: Body<MentorBody>,
) -> Result<assign_mentor::Output> {
    let idea_id = path_id(&id)?;
    let Json(MentorBody { mentor_id }) = body?;

    state
        .ideas
        .assign_mentor
        .handle(assign_mentor::Input {
            user,
            idea_id,
            mentor_id,
        })
        .await
}

pub async fn review(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
    body: Body<ReviewBody>,
) -> Result<review::Output> {
    let idea_id = path_id(&id)?;
    let Json(ReviewBody {
        status,
        review_notes,
    }) = body?;

    state
        .ideas
        .review
        .handle(review::Input {
            user,
            idea_id,
            status,
            review_notes,
        })
        .await
}

pub async fn feature(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
    body: Body<FeatureBody>,
) -> Result<feature::Output> {
    let idea_id = path_id(&id)?;
    let Json(FeatureBody { featured }) = body?;

    state
        .ideas
        .feature
        .handle(feature::Input {
            user,
            idea_id,
            featured,
        })
        .await
}

pub async fn add_milestone(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
    body: Body<MilestoneBody>,
) -> Result<add_milestone::Output> {
    let idea_id = path_id(&id)?;
    let Json(MilestoneBody {
        title,
        description,
        due_date,
    }) = body?;

    state
        .ideas
        .add_milestone
        .handle(add_milestone::Input {
            user,
            idea_id,
            title,
            description,
            due_date,
        })
        .await
}

pub async fn complete_milestone(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
    Path((id, milestone_id)): Path<(String, String)>,
) -> Result<complete_milestone::Output> {
    state
        .ideas
        .complete_milestone
        .handle(complete_milestone::Input {
            user,
            idea_id: path_id(&id)?,
            milestone_id: path_id::<Uuid>(&milestone_id)?,
        })
        .await
}

pub async fn add_update(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
    body: Body<UpdateBody>,
) -> Result<add_update::Output> {
    let idea_id = path_id(&id)?;
    let Json(UpdateBody { title, content }) = body?;

    state
        .ideas
        .add_update
        .handle(add_update::Input {
            user,
            idea_id,
            title,
            content,
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn due(body: &str) -> Option<Date> {
        serde_json::from_str::<MilestoneBody>(body).unwrap().due_date
    }

    #[test]
    fn due_date_takes_days_and_timestamps() {
        assert_eq!(due(r#"{"title":"MVP"}"#), None);
        assert_eq!(due(r#"{"dueDate":null}"#), None);
        assert_eq!(
            due(r#"{"dueDate":"2025-03-01"}"#).map(|d| d.to_rfc3339()),
            Some("2025-03-01T00:00:00+00:00".to_string())
        );
        assert_eq!(
            due(r#"{"dueDate":"2025-03-01T12:30:00Z"}"#).map(|d| d.to_rfc3339()),
            Some("2025-03-01T12:30:00+00:00".to_string())
        );
        assert!(serde_json::from_str::<MilestoneBody>(r#"{"dueDate":"soon"}"#).is_err());
    }
}
