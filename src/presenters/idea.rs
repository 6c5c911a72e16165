use axum::response::{IntoResponse, Response};
use serde::Serialize;

use super::{Envelope, Person};
use crate::entities::Idea;
use crate::usecases::idea::{
    add_milestone, add_update, assign_mentor, complete_milestone, edit, feature, get, gets,
    review, submit, upvote, withdraw, Related,
};
use crate::usecases::Pagination;

/// An idea on the wire, with its people and derived counts.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdeaView<'a> {
    #[serde(flatten)]
    idea: &'a Idea,
    creator: Person<'a>,
    assigned_mentor: Option<Person<'a>>,
    upvote_count: u32,
    comment_count: u64,
}

impl<'a> IdeaView<'a> {
    fn new(idea: &'a Idea, related: &'a Related) -> Self {
        Self {
            creator: Person::new(related.creator.as_ref(), idea.creator),
            assigned_mentor: idea
                .assigned_mentor
                .map(|id| Person::new(related.mentor.as_ref(), id)),
            upvote_count: idea.upvote_count(),
            comment_count: related.comment_count,
            idea,
        }
    }
}

#[derive(Serialize)]
struct Single<'a> {
    idea: IdeaView<'a>,
}

fn single<'a>(idea: &'a Idea, related: &'a Related) -> Single<'a> {
    Single {
        idea: IdeaView::new(idea, related),
    }
}

#[derive(Serialize)]
struct Listing<'a> {
    ideas: Vec<IdeaView<'a>>,
    pagination: Pagination,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Viewed<'a> {
    idea: IdeaView<'a>,
    user_specific_data: ViewerData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewerData {
    #[serde(skip_serializing_if = "Option::is_none")]
    has_upvoted: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Upvoted {
    upvoted: bool,
    upvote_count: u32,
}

impl IntoResponse for submit::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .message("Idea submitted successfully")
            .data(single(&self.idea, &self.related))
            .created()
    }
}

impl IntoResponse for gets::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .data(Listing {
                ideas: self
                    .ideas
                    .iter()
                    .map(|(idea, related)| IdeaView::new(idea, related))
                    .collect(),
                pagination: self.pagination,
            })
            .into_response()
    }
}

impl IntoResponse for get::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .data(Viewed {
                idea: IdeaView::new(&self.idea, &self.related),
                user_specific_data: ViewerData {
                    has_upvoted: self.has_upvoted,
                },
            })
            .into_response()
    }
}

impl IntoResponse for edit::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .message("Idea updated successfully")
            .data(single(&self.idea, &self.related))
            .into_response()
    }
}

impl IntoResponse for withdraw::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .message("Idea deleted successfully")
            .into_response()
    }
}

impl IntoResponse for upvote::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .message(match self.upvoted {
                true => "Idea upvoted",
                false => "Upvote removed",
            })
            .data(Upvoted {
                upvoted: self.upvoted,
                upvote_count: self.upvote_count,
            })
            .into_response()
    }
}

impl IntoResponse for assign_mentor::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .message("Mentor assigned successfully")
            .data(single(&self.idea, &self.related))
            .into_response()
    }
}

impl IntoResponse for review::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .message("Idea reviewed successfully")
            .data(single(&self.idea, &self.related))
            .into_response()
    }
}

impl IntoResponse for feature::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .message(match self.idea.is_featured {
                true => "Idea featured",
                false => "Idea unfeatured",
            })
            .data(single(&self.idea, &self.related))
            .into_response()
    }
}

impl IntoResponse for add_milestone::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .message("Milestone added successfully")
            .data(single(&self.idea, &self.related))
            .created()
    }
}

impl IntoResponse for complete_milestone::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .message("Milestone completed")
            .data(single(&self.idea, &self.related))
            .into_response()
    }
}

impl IntoResponse for add_update::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .message("Update posted successfully")
            .data(single(&self.idea, &self.related))
            .created()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::fixtures::{idea, user};
    use crate::entities::{PrivacyLevel, Role, UserId};
    use crate::usecases::UserCard;

    #[test]
    fn idea_view_is_flat_camel_case() {
        let mut i = idea(UserId::generate(), PrivacyLevel::Public);
        i.toggle_upvote(UserId::generate(), chrono::Utc::now());
        let related = Related {
            comment_count: 3,
            ..Default::default()
        };

        let json = serde_json::to_value(IdeaView::new(&i, &related)).unwrap();

        assert_eq!(json["upvoteCount"], 1);
        assert_eq!(json["commentCount"], 3);
        assert_eq!(json["privacyLevel"], "public");
        assert_eq!(json["secretSauce"], "Gamification.");
        assert_eq!(json["id"], i.id.to_string());
        assert_eq!(json["creator"], i.creator.to_string());
        assert_eq!(json["assignedMentor"], serde_json::Value::Null);
    }

    #[test]
    fn people_are_populated() {
        let creator = user(Role::Student);
        let mentor = user(Role::Teacher);
        let mut i = idea(creator.id, PrivacyLevel::Public);
        i.assigned_mentor = Some(mentor.id);
        let related = Related {
            creator: Some(UserCard::from(&creator)),
            mentor: Some(UserCard::from(&mentor)),
            comment_count: 0,
        };

        let json = serde_json::to_value(IdeaView::new(&i, &related)).unwrap();

        assert_eq!(json["creator"]["id"], creator.id.to_string());
        assert_eq!(json["creator"]["name"], "Test User");
        assert!(json["creator"].get("email").is_none());
        assert_eq!(json["assignedMentor"]["role"], "teacher");
    }

    #[test]
    fn anonymous_viewer_data_is_empty() {
        let data = serde_json::to_value(ViewerData { has_upvoted: None }).unwrap();

        assert_eq!(data, serde_json::json!({}));
    }
}
