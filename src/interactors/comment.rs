use alloc::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;

use super::validation::{Violations, COMMENT_MAX};
use super::*;
use crate::entities::{
    Comment, CommentId, Flag, FlagReason, Idea, IdeaId, ModerationAction, User,
};
use crate::error::{AppError, Result};
use crate::repositories::{
    CommentQuery, CommentRepository, CommentSort, CommentSortKey, IdeaRepository, Moderation,
    ParentQuery, RepositoryError,
};
use crate::usecases::comment::{
    add, edit, flag, get_replies, gets, like, moderate, withdraw, Listed, ViewerFlags,
};
use crate::usecases::UserCard;
use crate::utils::{Chain, NonBlank};

const FLAG_DESCRIPTION_MAX: usize = 500;
const MODERATION_NOTE_MAX: usize = 500;

fn check_content(content: Option<&str>) -> Result<String> {
    let mut v = Violations::new();
    let content = v.required(
        content,
        COMMENT_MAX,
        "Comment content is required",
        "Comment cannot be more than 1000 characters",
    );
    v.finish()?;

    Ok(content.unwrap_or_default())
}

fn listed(
    comment: Comment,
    (author, reply_count): (Option<UserCard>, u64),
    viewer: Option<&User>,
) -> Listed {
    let viewer = viewer.map(|u| ViewerFlags {
        has_liked: comment.has_liked(u.id),
        can_edit: comment.can_edit(u),
        can_delete: comment.can_delete(u),
    });

    Listed {
        comment,
        author,
        reply_count,
        viewer,
    }
}

fn sort_key(sort_by: Option<&str>) -> CommentSortKey {
    match sort_by {
        Some("likes" | "likeCount") => CommentSortKey::Likes,
        _ => CommentSortKey::CreatedAt,
    }
}

async fn find_comment(
    repo: &(dyn CommentRepository + Sync + Send),
    id: CommentId,
) -> Result<Comment> {
    repo.find(id).await.map_err(comment_err_fmt)
}

async fn find_idea(repo: &(dyn IdeaRepository + Sync + Send), id: IdeaId) -> Result<Idea> {
    repo.find(id).await.map_err(idea_err_fmt)
}

pub struct CommentAddInteractor {
    pub comment_repository: Arc<dyn CommentRepository + Sync + Send>,
    pub idea_repository: Arc<dyn IdeaRepository + Sync + Send>,
    pub lookup: Lookup,
}
#[async_trait]
impl add::Usecase for CommentAddInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: add::Input) -> Result<add::Output> {
        tracing::trace!("input - {:?}", data);

        let add::Input {
            user,
            idea_id,
            content,
            parent_comment,
        } = data;

        let idea = find_idea(self.idea_repository.as_ref(), idea_id).await?;

        if !idea.can_access(Some(&user)) {
            return Err(AppError::Forbidden(
                "You cannot comment on this private idea".to_string(),
            ));
        }

        let content = check_content(content.as_deref())?;

        let parent_comment = match parent_comment.non_blank() {
            None => None,
            Some(raw) => {
                let parent_not_found = || AppError::NotFound("Parent comment not found".to_string());
                let parent_id: CommentId = raw.parse().map_err(|_| parent_not_found())?;

                let parent = match self.comment_repository.find(parent_id).await {
                    Ok(p) => p,
                    Err(RepositoryError::NotFound) => return Err(parent_not_found()),
                    Err(e) => return Err(comment_err_fmt(e)),
                };

                if parent.idea != idea.id {
                    return Err(AppError::BadRequest(
                        "Parent comment does not belong to this idea".to_string(),
                    ));
                }

                // threads stay one level deep
                Some(parent.parent_comment.unwrap_or(parent.id))
            },
        };

        let now = Utc::now();
        let comment = Comment {
            id: CommentId::generate(),
            content,
            author: user.id,
            idea: idea.id,
            parent_comment,
            likes: vec![],
            is_edited: false,
            edited_at: None,
            is_deleted: false,
            deleted_at: None,
            flags: vec![],
            moderated_by: None,
            moderation_action: ModerationAction::default(),
            moderation_note: None,
            moderated_at: None,
            created_at: now,
            updated_at: now,
        };

        let can_insert = self
            .comment_repository
            .insert(comment.clone())
            .await
            .map_err(comment_err_fmt)?;

        if !can_insert {
            return Err(AppError::Internal(anyhow!(
                "comment id collided: {}",
                comment.id
            )));
        }

        let author = self.lookup.author(&comment).await?;

        add::Output { comment, author }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct CommentGetsInteractor {
    pub comment_repository: Arc<dyn CommentRepository + Sync + Send>,
    pub idea_repository: Arc<dyn IdeaRepository + Sync + Send>,
    pub lookup: Lookup,
}
#[async_trait]
impl gets::Usecase for CommentGetsInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: gets::Input) -> Result<gets::Output> {
        tracing::trace!("input - {:?}", data);

        let gets::Input {
            viewer,
            idea_id,
            page,
            sort_by,
            sort_order,
            include_replies,
        } = data;

        let idea = find_idea(self.idea_repository.as_ref(), idea_id).await?;

        if !idea.can_access(viewer.as_ref()) {
            return Err(AppError::denied(
                viewer.is_some(),
                "Authentication required to view comments on private ideas",
                "Access denied to comments on this private idea",
            ));
        }

        let query = CommentQuery {
            idea: Some(idea.id),
            parent: match include_replies {
                true => None,
                false => Some(ParentQuery::TopLevel),
            },
            listed_only: true,
        };
        let sort = CommentSort {
            key: sort_key(sort_by.as_deref()),
            ascending: is_ascending(sort_order.as_deref(), false),
        };
        let (window, current, limit) = calc_paging(page, 20);

        let found = self
            .comment_repository
            .finds(query.clone(), sort, window)
            .await
            .map_err(comment_err_fmt)?;
        let threads = self.lookup.threads(&found).await?;
        let comments = found
            .into_iter()
            .zip(threads)
            .map(|(c, t)| listed(c, t, viewer.as_ref()))
            .collect();
        let total = self
            .comment_repository
            .count(query)
            .await
            .map_err(comment_err_fmt)?;

        gets::Output {
            comments,
            pagination: pagination(current, limit, total),
        }
        .also_(|o| tracing::trace!("output - {:?}", o))
        .let_(Ok)
    }
}

pub struct CommentGetRepliesInteractor {
    pub comment_repository: Arc<dyn CommentRepository + Sync + Send>,
    pub idea_repository: Arc<dyn IdeaRepository + Sync + Send>,
    pub lookup: Lookup,
}
#[async_trait]
impl get_replies::Usecase for CommentGetRepliesInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: get_replies::Input) -> Result<get_replies::Output> {
        tracing::trace!("input - {:?}", data);

        let get_replies::Input {
            viewer,
            comment_id,
            page,
            sort_order,
        } = data;

        let parent = match self.comment_repository.find(comment_id).await {
            Ok(p) => p,
            Err(RepositoryError::NotFound) =>
                return Err(AppError::NotFound("Parent comment not found".to_string())),
            Err(e) => return Err(comment_err_fmt(e)),
        };
        let idea = find_idea(self.idea_repository.as_ref(), parent.idea).await?;

        if !idea.can_access(viewer.as_ref()) {
            return Err(AppError::denied(
                viewer.is_some(),
                "Authentication required to view replies on private ideas",
                "Access denied to replies on this private idea",
            ));
        }

        let query = CommentQuery {
            idea: None,
            parent: Some(ParentQuery::Of(parent.id)),
            listed_only: true,
        };
        let sort = CommentSort {
            key: CommentSortKey::CreatedAt,
            ascending: is_ascending(sort_order.as_deref(), true),
        };
        let (window, current, limit) = calc_paging(page, 10);

        let found = self
            .comment_repository
            .finds(query.clone(), sort, window)
            .await
            .map_err(comment_err_fmt)?;
        let threads = self.lookup.threads(&found).await?;
        let replies = found
            .into_iter()
            .zip(threads)
            .map(|(c, t)| listed(c, t, viewer.as_ref()))
            .collect();
        let total = self
            .comment_repository
            .count(query)
            .await
            .map_err(comment_err_fmt)?;

        get_replies::Output {
            replies,
            pagination: pagination(current, limit, total),
        }
        .also_(|o| tracing::trace!("output - {:?}", o))
        .let_(Ok)
    }
}

pub struct CommentEditInteractor {
    pub comment_repository: Arc<dyn CommentRepository + Sync + Send>,
    pub lookup: Lookup,
}
#[async_trait]
impl edit::Usecase for CommentEditInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: edit::Input) -> Result<edit::Output> {
        tracing::trace!("input - {:?}", data);

        let edit::Input {
            user,
            comment_id,
            content,
        } = data;

        let comment = find_comment(self.comment_repository.as_ref(), comment_id).await?;

        if !comment.can_edit(&user) {
            return Err(AppError::Forbidden(
                "You can only edit your own comments".to_string(),
            ));
        }

        if comment.is_deleted {
            return Err(AppError::BadRequest(
                "Cannot edit deleted comment".to_string(),
            ));
        }

        let content = check_content(content.as_deref())?;

        let comment = self
            .comment_repository
            .update_content(comment.id, content, Utc::now())
            .await
            .map_err(comment_err_fmt)?;
        let author = self.lookup.author(&comment).await?;

        edit::Output { comment, author }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct CommentWithdrawInteractor {
    pub comment_repository: Arc<dyn CommentRepository + Sync + Send>,
}
#[async_trait]
impl withdraw::Usecase for CommentWithdrawInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: withdraw::Input) -> Result<withdraw::Output> {
        tracing::trace!("input - {:?}", data);

        let withdraw::Input { user, comment_id } = data;

        let comment = find_comment(self.comment_repository.as_ref(), comment_id).await?;

        if !comment.can_delete(&user) {
            return Err(AppError::Forbidden(
                "You can only delete your own comments".to_string(),
            ));
        }

        self.comment_repository
            .soft_delete(comment.id, Utc::now())
            .await
            .map_err(comment_err_fmt)?
            .let_(|comment| withdraw::Output { comment })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct CommentLikeInteractor {
    pub comment_repository: Arc<dyn CommentRepository + Sync + Send>,
    pub idea_repository: Arc<dyn IdeaRepository + Sync + Send>,
}
#[async_trait]
impl like::Usecase for CommentLikeInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: like::Input) -> Result<like::Output> {
        tracing::trace!("input - {:?}", data);

        let like::Input { user, comment_id } = data;

        let comment = find_comment(self.comment_repository.as_ref(), comment_id).await?;

        if comment.is_deleted {
            return Err(AppError::BadRequest(
                "Cannot like deleted comment".to_string(),
            ));
        }

        let idea = find_idea(self.idea_repository.as_ref(), comment.idea).await?;

        if !idea.can_access(Some(&user)) {
            return Err(AppError::Forbidden(
                "Cannot like comments on private ideas you don't have access to".to_string(),
            ));
        }

        let (liked, like_count) = self
            .comment_repository
            .toggle_like(comment.id, user.id, Utc::now())
            .await
            .map_err(comment_err_fmt)?;

        like::Output { liked, like_count }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct CommentFlagInteractor {
    pub comment_repository: Arc<dyn CommentRepository + Sync + Send>,
    pub idea_repository: Arc<dyn IdeaRepository + Sync + Send>,
}
#[async_trait]
impl flag::Usecase for CommentFlagInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: flag::Input) -> Result<flag::Output> {
        tracing::trace!("input - {:?}", data);

        let flag::Input {
            user,
            comment_id,
            reason,
            description,
        } = data;

        let comment = find_comment(self.comment_repository.as_ref(), comment_id).await?;
        let idea = find_idea(self.idea_repository.as_ref(), comment.idea).await?;

        if !idea.can_access(Some(&user)) {
            return Err(AppError::Forbidden(
                "Cannot flag comments on private ideas you don't have access to".to_string(),
            ));
        }

        let mut v = Violations::new();
        let reason = match reason.non_blank() {
            None => {
                v.push("Flag reason is required");
                None
            },
            reason => v.label::<FlagReason>(reason),
        };
        let description = v.optional(
            description.as_deref(),
            FLAG_DESCRIPTION_MAX,
            "Flag description cannot be more than 500 characters",
        );
        v.finish()?;

        let reason = validated(reason)?;

        let flagged = self
            .comment_repository
            .insert_flag(comment.id, Flag {
                reporter: user.id,
                reason,
                description: description.unwrap_or_default(),
                created_at: Utc::now(),
            })
            .await
            .map_err(comment_err_fmt)?;

        if !flagged {
            return Err(AppError::BadRequest(
                "You have already flagged this comment".to_string(),
            ));
        }

        tracing::info!("comment {} flagged by {} as {}", comment.id, user.id, reason);

        Ok(flag::Output {})
    }
}

pub struct CommentModerateInteractor {
    pub comment_repository: Arc<dyn CommentRepository + Sync + Send>,
    pub lookup: Lookup,
}
#[async_trait]
impl moderate::Usecase for CommentModerateInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: moderate::Input) -> Result<moderate::Output> {
        tracing::trace!("input - {:?}", data);

        let moderate::Input {
            user,
            comment_id,
            action,
            note,
        } = data;

        if !user.is_admin() {
            return Err(AppError::Forbidden(
                "Only admins can moderate comments".to_string(),
            ));
        }

        let mut v = Violations::new();
        let action = match action.non_blank() {
            None => {
                v.push("Moderation action is required");
                None
            },
            action => v.label::<ModerationAction>(action),
        };
        let note = v.optional(
            note.as_deref(),
            MODERATION_NOTE_MAX,
            "Moderation note cannot be more than 500 characters",
        );
        v.finish()?;

        let action = validated(action)?;

        let comment = find_comment(self.comment_repository.as_ref(), comment_id).await?;

        let comment = self
            .comment_repository
            .moderate(comment.id, Moderation {
                by: user.id,
                action,
                note,
                at: Utc::now(),
            })
            .await
            .map_err(comment_err_fmt)?;

        tracing::info!("comment {} moderated by {}: {}", comment.id, user.id, action);

        let author = self.lookup.author(&comment).await?;

        moderate::Output { comment, author }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}
