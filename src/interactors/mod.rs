pub mod comment;
pub mod idea;
pub mod user;

mod validation;

use alloc::sync::Arc;
use std::collections::HashMap;

use anyhow::anyhow;

use crate::entities::{Comment, Idea, UserId};
use crate::error::AppError;
use crate::repositories::{
    CommentQuery, CommentRepository, Page, ParentQuery, RepositoryError, UserRepository,
};
use crate::usecases::idea::Related;
use crate::usecases::{PageRequest, Pagination, UserCard};

fn user_err_fmt(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound("User not found".to_string()),
        e => AppError::Internal(anyhow!("repository error: {}", e)),
    }
}

fn idea_err_fmt(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound("Idea not found".to_string()),
        e => AppError::Internal(anyhow!("repository error: {}", e)),
    }
}

fn comment_err_fmt(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound("Comment not found".to_string()),
        e => AppError::Internal(anyhow!("repository error: {}", e)),
    }
}

/// Unwraps a value a finished `Violations` has already vouched for.
fn validated<T>(value: Option<T>) -> crate::error::Result<T> {
    value.ok_or_else(|| AppError::Internal(anyhow!("value missing after validation")))
}

/// Fills in the people and counts that responses show next to ideas and comments.
#[derive(Clone)]
pub struct Lookup {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub comment_repository: Arc<dyn CommentRepository + Sync + Send>,
}

/// User cards already fetched while presenting one response.
type Cards = HashMap<UserId, Option<UserCard>>;

impl Lookup {
    async fn card(&self, id: UserId, seen: &mut Cards) -> crate::error::Result<Option<UserCard>> {
        if let Some(card) = seen.get(&id) {
            return Ok(card.clone());
        }

        let card = match self.user_repository.find(id).await {
            Ok(u) => Some(UserCard::from(&u)),
            Err(RepositoryError::NotFound) => None,
            Err(e) => return Err(user_err_fmt(e)),
        };

        seen.insert(id, card.clone());
        Ok(card)
    }

    async fn related_with(&self, idea: &Idea, seen: &mut Cards) -> crate::error::Result<Related> {
        let creator = self.card(idea.creator, seen).await?;
        let mentor = match idea.assigned_mentor {
            Some(id) => self.card(id, seen).await?,
            None => None,
        };
        let comment_count = self
            .comment_repository
            .count(CommentQuery {
                idea: Some(idea.id),
                parent: None,
                listed_only: true,
            })
            .await
            .map_err(comment_err_fmt)?;

        Ok(Related {
            creator,
            mentor,
            comment_count,
        })
    }

    pub async fn related(&self, idea: &Idea) -> crate::error::Result<Related> {
        self.related_with(idea, &mut Cards::new()).await
    }

    pub async fn related_all(
        &self,
        ideas: Vec<Idea>,
    ) -> crate::error::Result<Vec<(Idea, Related)>> {
        let mut seen = Cards::new();
        let mut out = Vec::with_capacity(ideas.len());

        for idea in ideas {
            let related = self.related_with(&idea, &mut seen).await?;
            out.push((idea, related));
        }

        Ok(out)
    }

    pub async fn author(&self, comment: &Comment) -> crate::error::Result<Option<UserCard>> {
        self.card(comment.author, &mut Cards::new()).await
    }

    /// Author and listed reply count of every comment, in order.
    pub async fn threads(
        &self,
        comments: &[Comment],
    ) -> crate::error::Result<Vec<(Option<UserCard>, u64)>> {
        let mut seen = Cards::new();
        let mut out = Vec::with_capacity(comments.len());

        for comment in comments {
            let author = self.card(comment.author, &mut seen).await?;
            let replies = self
                .comment_repository
                .count(CommentQuery {
                    idea: None,
                    parent: Some(ParentQuery::Of(comment.id)),
                    listed_only: true,
                })
                .await
                .map_err(comment_err_fmt)?;

            out.push((author, replies));
        }

        Ok(out)
    }
}

const MAX_PAGE_LIMIT: u64 = 100;

/// Resolves `page` (from 1) and `limit` (1 to 100) into a repository window.
fn calc_paging(req: PageRequest, default_limit: u64) -> (Page, u64, u64) {
    let current = req.page.unwrap_or(1).max(1);
    let limit = req.limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_LIMIT);

    let page = Page {
        skip: (current - 1).saturating_mul(limit),
        limit,
    };

    (page, current, limit)
}

fn pagination(current: u64, limit: u64, total: u64) -> Pagination {
    Pagination {
        current,
        pages: (total + limit - 1) / limit,
        total,
        limit,
    }
}

/// `asc` sorts ascending, anything else keeps the default order.
fn is_ascending(sort_order: Option<&str>, default: bool) -> bool {
    match sort_order {
        Some("asc") => true,
        Some("desc") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_defaults_and_bounds() {
        let (page, current, limit) = calc_paging(PageRequest::default(), 10);
        assert_eq!((page.skip, page.limit, current, limit), (0, 10, 1, 10));

        let (page, current, limit) = calc_paging(
            PageRequest {
                page: Some(3),
                limit: Some(500),
            },
            10,
        );
        assert_eq!((page.skip, current, limit), (200, 3, 100));

        let (page, current, _) = calc_paging(
            PageRequest {
                page: Some(0),
                limit: Some(0),
            },
            10,
        );
        assert_eq!((page.skip, page.limit, current), (0, 1, 1));
    }

    #[test]
    fn pages_round_up() {
        assert_eq!(pagination(1, 10, 0).pages, 0);
        assert_eq!(pagination(1, 10, 10).pages, 1);
        assert_eq!(pagination(1, 10, 11).pages, 2);
    }

    #[test]
    fn sort_order() {
        assert!(is_ascending(Some("asc"), false));
        assert!(!is_ascending(Some("desc"), true));
        assert!(is_ascending(Some("sideways"), true));
        assert!(!is_ascending(None, false));
    }
}
