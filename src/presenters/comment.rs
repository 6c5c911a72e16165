use axum::response::{IntoResponse, Response};
use serde::Serialize;

use super::{Envelope, Person};
use crate::entities::Comment;
use crate::usecases::comment::{
    add, edit, flag, get_replies, gets, like, moderate, withdraw, Listed, ViewerFlags,
};
use crate::usecases::{Pagination, UserCard};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentView<'a> {
    #[serde(flatten)]
    comment: &'a Comment,
    author: Person<'a>,
    like_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_specific_data: Option<ViewerFlags>,
}

impl<'a> CommentView<'a> {
    fn plain(comment: &'a Comment, author: Option<&'a UserCard>) -> Self {
        Self {
            author: Person::new(author, comment.author),
            like_count: comment.like_count(),
            comment,
            reply_count: None,
            user_specific_data: None,
        }
    }

    fn listed(listed: &'a Listed) -> Self {
        Self {
            reply_count: Some(listed.reply_count),
            user_specific_data: listed.viewer,
            ..Self::plain(&listed.comment, listed.author.as_ref())
        }
    }
}

#[derive(Serialize)]
struct Single<'a> {
    comment: CommentView<'a>,
}

#[derive(Serialize)]
struct Comments<'a> {
    comments: Vec<CommentView<'a>>,
    pagination: Pagination,
}

#[derive(Serialize)]
struct Replies<'a> {
    replies: Vec<CommentView<'a>>,
    pagination: Pagination,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Liked {
    liked: bool,
    like_count: u32,
}

impl IntoResponse for add::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .message("Comment added successfully")
            .data(Single {
                comment: CommentView::plain(&self.comment, self.author.as_ref()),
            })
            .created()
    }
}

impl IntoResponse for gets::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .data(Comments {
                comments: self.comments.iter().map(CommentView::listed).collect(),
                pagination: self.pagination,
            })
            .into_response()
    }
}

impl IntoResponse for get_replies::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .data(Replies {
                replies: self.replies.iter().map(CommentView::listed).collect(),
                pagination: self.pagination,
            })
            .into_response()
    }
}

impl IntoResponse for edit::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .message("Comment updated successfully")
            .data(Single {
                comment: CommentView::plain(&self.comment, self.author.as_ref()),
            })
            .into_response()
    }
}

impl IntoResponse for withdraw::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .message("Comment deleted successfully")
            .into_response()
    }
}

impl IntoResponse for like::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .message(match self.liked {
                true => "Comment liked",
                false => "Like removed",
            })
            .data(Liked {
                liked: self.liked,
                like_count: self.like_count,
            })
            .into_response()
    }
}

impl IntoResponse for flag::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .message("Comment flagged for review")
            .into_response()
    }
}

impl IntoResponse for moderate::Output {
    fn into_response(self) -> Response {
        Envelope::success()
            .message("Comment moderated successfully")
            .data(Single {
                comment: CommentView::plain(&self.comment, self.author.as_ref()),
            })
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::fixtures::{comment, user};
    use crate::entities::{Flag, FlagReason, IdeaId, Role, UserId};

    #[test]
    fn flags_stay_private() {
        let mut c = comment(UserId::generate(), IdeaId::generate(), None);
        c.add_flag(Flag {
            reporter: UserId::generate(),
            reason: FlagReason::Spam,
            description: String::new(),
            created_at: chrono::Utc::now(),
        });

        let json = serde_json::to_value(CommentView::plain(&c, None)).unwrap();

        assert!(json.get("flags").is_none());
        assert!(json.get("userSpecificData").is_none());
        assert!(json.get("replyCount").is_none());
        assert_eq!(json["author"], c.author.to_string());
        assert_eq!(json["likeCount"], 0);
        assert_eq!(json["moderationAction"], "approved");
    }

    #[test]
    fn listed_carries_viewer_flags() {
        let writer = user(Role::Student);
        let listed = Listed {
            comment: comment(writer.id, IdeaId::generate(), None),
            author: Some(UserCard::from(&writer)),
            reply_count: 2,
            viewer: Some(ViewerFlags {
                has_liked: true,
                can_edit: false,
                can_delete: true,
            }),
        };

        let json = serde_json::to_value(CommentView::listed(&listed)).unwrap();

        assert_eq!(json["userSpecificData"]["hasLiked"], true);
        assert_eq!(json["userSpecificData"]["canDelete"], true);
        assert_eq!(json["replyCount"], 2);
        assert_eq!(json["author"]["name"], "Test User");
        assert_eq!(json["author"]["role"], "student");
    }
}
