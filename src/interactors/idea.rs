use alloc::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::validation::{
    Violations, PROBLEM_MAX, REVIEW_NOTES_MAX, SECRET_SAUCE_MAX, SOLUTION_MAX,
    TARGET_AUDIENCE_MAX, TITLE_MAX,
};
use super::*;
use crate::entities::{
    Category, Idea, IdeaId, Milestone, ProgressUpdate, Role, Status, User, UserId,
};
use crate::error::{AppError, Result};
use crate::repositories::{
    CommentRepository, IdeaMutation, IdeaQuery, IdeaRepository, IdeaSort, IdeaSortKey,
    UserRepository, Visibility,
};
use crate::usecases::idea::{
    add_milestone, add_update, assign_mentor, complete_milestone, edit, feature, get, gets,
    review, submit, upvote, withdraw, IdeaDraft,
};
use crate::utils::{Chain, NonBlank};

const MILESTONE_DESCRIPTION_MAX: usize = 500;
const UPDATE_CONTENT_MAX: usize = 1000;

/// Checks a draft. With `complete`, every required field must be present; otherwise only the
/// provided ones are checked.
fn check_draft(draft: IdeaDraft, complete: bool) -> Result<IdeaMutation> {
    let IdeaDraft {
        title,
        problem,
        solution,
        secret_sauce,
        target_audience,
        required_help,
        privacy_level,
        category,
        tags,
    } = draft;

    let mut v = Violations::new();
    let mut text = |value: Option<String>, max: usize, missing: &str, too_long: &str| {
        match (complete, value) {
            (false, None) => None,
            (_, value) => v.required(value.as_deref(), max, missing, too_long),
        }
    };

    let mut mutation = IdeaMutation {
        title: text(
            title,
            TITLE_MAX,
            "Title is required",
            "Title cannot be more than 100 characters",
        ),
        problem: text(
            problem,
            PROBLEM_MAX,
            "Problem description is required",
            "Problem description cannot be more than 1000 characters",
        ),
        solution: text(
            solution,
            SOLUTION_MAX,
            "Solution description is required",
            "Solution must be like a tweet - max 280 characters",
        ),
        secret_sauce: text(
            secret_sauce,
            SECRET_SAUCE_MAX,
            "Secret sauce is required",
            "Secret sauce cannot be more than 500 characters",
        ),
        target_audience: text(
            target_audience,
            TARGET_AUDIENCE_MAX,
            "Target audience is required",
            "Target audience cannot be more than 300 characters",
        ),
        ..Default::default()
    };

    mutation.category = match (complete, category.as_deref().map(str::trim)) {
        (true, None | Some("")) => {
            v.push("Category is required");
            None
        },
        (_, category) => v.label(category),
    };
    mutation.privacy_level = v.label(privacy_level.as_deref());
    mutation.required_help = v.labels(required_help.as_deref());
    mutation.tags = v.tags(tags.as_deref());

    v.finish()?;
    Ok(mutation)
}

fn sort_key(sort_by: Option<&str>) -> IdeaSortKey {
    match sort_by {
        Some("updatedAt") => IdeaSortKey::UpdatedAt,
        Some("title") => IdeaSortKey::Title,
        Some("views") => IdeaSortKey::Views,
        Some("upvotes" | "upvoteCount") => IdeaSortKey::Upvotes,
        _ => IdeaSortKey::CreatedAt,
    }
}

async fn find_idea(repo: &(dyn IdeaRepository + Sync + Send), id: IdeaId) -> Result<Idea> {
    repo.find(id).await.map_err(idea_err_fmt)
}

fn ensure_tracker(idea: &Idea, user: &User, what: &str) -> Result<()> {
    match idea.can_track(user) {
        true => Ok(()),
        false => Err(AppError::Forbidden(format!(
            "Only the creator or assigned mentor can {}",
            what
        ))),
    }
}

pub struct IdeaSubmitInteractor {
    pub idea_repository: Arc<dyn IdeaRepository + Sync + Send>,
    pub lookup: Lookup,
}
#[async_trait]
impl submit::Usecase for IdeaSubmitInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: submit::Input) -> Result<submit::Output> {
        tracing::trace!("input - {:?}", data);

        let submit::Input { user, draft } = data;

        if user.role != Role::Student {
            return Err(AppError::Forbidden(
                "Only students can submit ideas".to_string(),
            ));
        }

        let m = check_draft(draft, true)?;
        let now = Utc::now();

        let idea = Idea {
            id: IdeaId::generate(),
            creator: user.id,
            title: m.title.unwrap_or_default(),
            problem: m.problem.unwrap_or_default(),
            solution: m.solution.unwrap_or_default(),
            secret_sauce: m.secret_sauce.unwrap_or_default(),
            target_audience: m.target_audience.unwrap_or_default(),
            required_help: m.required_help.unwrap_or_default(),
            privacy_level: m.privacy_level.unwrap_or_default(),
            category: m.category.unwrap_or(Category::Other),
            tags: m.tags.unwrap_or_default(),
            status: Status::default(),
            assigned_mentor: None,
            mentor_assigned_at: None,
            upvotes: vec![],
            views: 0,
            milestones: vec![],
            updates: vec![],
            reviewed_by: None,
            reviewed_at: None,
            review_notes: None,
            is_featured: false,
            featured_at: None,
            created_at: now,
            updated_at: now,
        };

        let can_insert = self
            .idea_repository
            .insert(idea.clone())
            .await
            .map_err(idea_err_fmt)?;

        if !can_insert {
            return Err(AppError::Internal(anyhow!("idea id collided: {}", idea.id)));
        }

        tracing::info!("idea {} submitted by {}", idea.id, user.id);

        let related = self.lookup.related(&idea).await?;

        submit::Output { idea, related }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct IdeaGetsInteractor {
    pub idea_repository: Arc<dyn IdeaRepository + Sync + Send>,
    pub lookup: Lookup,
}
#[async_trait]
impl gets::Usecase for IdeaGetsInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: gets::Input) -> Result<gets::Output> {
        tracing::trace!("input - {:?}", data);

        let gets::Input {
            viewer,
            filter,
            page,
        } = data;

        let mut v = Violations::new();
        let category = v.label::<Category>(filter.category.non_blank());
        let status = v.label::<Status>(filter.status.non_blank());
        v.finish()?;

        let mut query = IdeaQuery {
            category,
            featured: filter.featured.filter(|f| *f),
            search: filter.search.non_blank().map(str::to_string),
            ..Default::default()
        };

        match &viewer {
            None => query.visibility = Visibility::Public,
            Some(u) => match filter.privacy.as_deref() {
                Some("private") => query.creator = Some(u.id),
                Some("public") => query.visibility = Visibility::Public,
                _ => query.visibility = Visibility::PublicOr(u.id),
            },
        }

        if let (Some(status), Some(u)) = (status, &viewer) {
            query.status = Some(status);

            // students only narrow their own ideas by status
            if !u.is_staff() {
                query.creator = Some(u.id);
            }
        }

        let sort = IdeaSort {
            key: sort_key(filter.sort_by.as_deref()),
            ascending: is_ascending(filter.sort_order.as_deref(), false),
        };
        let (window, current, limit) = calc_paging(page, 10);

        let ideas = self
            .idea_repository
            .finds(query.clone(), sort, window)
            .await
            .map_err(idea_err_fmt)?;
        let total = self
            .idea_repository
            .count(query)
            .await
            .map_err(idea_err_fmt)?;

        gets::Output {
            ideas: self.lookup.related_all(ideas).await?,
            pagination: pagination(current, limit, total),
        }
        .also_(|o| tracing::trace!("output - {:?}", o))
        .let_(Ok)
    }
}

pub struct IdeaGetInteractor {
    pub idea_repository: Arc<dyn IdeaRepository + Sync + Send>,
    pub lookup: Lookup,
}
#[async_trait]
impl get::Usecase for IdeaGetInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: get::Input) -> Result<get::Output> {
        tracing::trace!("input - {:?}", data);

        let get::Input { viewer, idea_id } = data;

        let mut idea = find_idea(self.idea_repository.as_ref(), idea_id).await?;

        if !idea.can_access(viewer.as_ref()) {
            return Err(AppError::denied(
                viewer.is_some(),
                "Authentication required to view private ideas",
                "Access denied to this private idea",
            ));
        }

        let by_creator = viewer.as_ref().map_or(false, |u| u.id == idea.creator);
        if idea.is_public() && !by_creator {
            idea.views = self
                .idea_repository
                .increment_views(idea.id)
                .await
                .map_err(idea_err_fmt)?;
        }

        let related = self.lookup.related(&idea).await?;

        get::Output {
            has_upvoted: viewer.map(|u| idea.has_upvoted(u.id)),
            idea,
            related,
        }
        .also_(|o| tracing::trace!("output - {:?}", o))
        .let_(Ok)
    }
}

pub struct IdeaEditInteractor {
    pub idea_repository: Arc<dyn IdeaRepository + Sync + Send>,
    pub lookup: Lookup,
}
#[async_trait]
impl edit::Usecase for IdeaEditInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: edit::Input) -> Result<edit::Output> {
        tracing::trace!("input - {:?}", data);

        let edit::Input {
            user,
            idea_id,
            draft,
        } = data;

        let idea = find_idea(self.idea_repository.as_ref(), idea_id).await?;

        if idea.creator != user.id {
            return Err(AppError::Forbidden(
                "You can only update your own ideas".to_string(),
            ));
        }

        let mutation = check_draft(draft, false)?.also_(|m| m.updated_at = Some(Utc::now()));

        let idea = self
            .idea_repository
            .update(idea.id, mutation)
            .await
            .map_err(idea_err_fmt)?;
        let related = self.lookup.related(&idea).await?;

        edit::Output { idea, related }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct IdeaWithdrawInteractor {
    pub idea_repository: Arc<dyn IdeaRepository + Sync + Send>,
    pub comment_repository: Arc<dyn CommentRepository + Sync + Send>,
}
#[async_trait]
impl withdraw::Usecase for IdeaWithdrawInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: withdraw::Input) -> Result<withdraw::Output> {
        tracing::trace!("input - {:?}", data);

        let withdraw::Input { user, idea_id } = data;

        let idea = find_idea(self.idea_repository.as_ref(), idea_id).await?;

        if idea.creator != user.id {
            return Err(AppError::Forbidden(
                "You can only delete your own ideas".to_string(),
            ));
        }

        let idea = self
            .idea_repository
            .delete(idea.id)
            .await
            .map_err(idea_err_fmt)?;
        let comments_removed = self
            .comment_repository
            .delete_by_idea(idea.id)
            .await
            .map_err(comment_err_fmt)?;

        tracing::info!("idea {} deleted with {} comments", idea.id, comments_removed);

        withdraw::Output {
            idea,
            comments_removed,
        }
        .also_(|o| tracing::trace!("output - {:?}", o))
        .let_(Ok)
    }
}

pub struct IdeaUpvoteInteractor {
    pub idea_repository: Arc<dyn IdeaRepository + Sync + Send>,
}
#[async_trait]
impl upvote::Usecase for IdeaUpvoteInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: upvote::Input) -> Result<upvote::Output> {
        tracing::trace!("input - {:?}", data);

        let upvote::Input { user, idea_id } = data;

        let idea = find_idea(self.idea_repository.as_ref(), idea_id).await?;

        if !idea.can_access(Some(&user)) {
            return Err(AppError::Forbidden(
                "Cannot upvote private ideas you don't have access to".to_string(),
            ));
        }

        if idea.creator == user.id {
            return Err(AppError::BadRequest(
                "You cannot upvote your own idea".to_string(),
            ));
        }

        let (upvoted, upvote_count) = self
            .idea_repository
            .toggle_upvote(idea.id, user.id, Utc::now())
            .await
            .map_err(idea_err_fmt)?;

        upvote::Output {
            upvoted,
            upvote_count,
        }
        .also_(|o| tracing::trace!("output - {:?}", o))
        .let_(Ok)
    }
}

pub struct IdeaAssignMentorInteractor {
    pub idea_repository: Arc<dyn IdeaRepository + Sync + Send>,
    pub lookup: Lookup,
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
}
#[async_trait]
impl assign_mentor::Usecase for IdeaAssignMentorInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: assign_mentor::Input) -> Result<assign_mentor::Output> {
        tracing::trace!("input - {:?}", data);

        let assign_mentor::Input {
            user,
            idea_id,
            mentor_id,
        } = data;

        if !user.is_staff() {
            return Err(AppError::Forbidden(
                "Only teachers and admins can assign mentors".to_string(),
            ));
        }

        let mentor_id = match mentor_id.non_blank() {
            Some(id) => id,
            None => return Err(AppError::Validation(vec!["Mentor is required".to_string()])),
        };
        let mentor_not_found = || AppError::NotFound("Mentor not found".to_string());
        let mentor_id: UserId = mentor_id.parse().map_err(|_| mentor_not_found())?;

        let mentor = match self.user_repository.find(mentor_id).await {
            Ok(m) => m,
            Err(crate::repositories::RepositoryError::NotFound) => return Err(mentor_not_found()),
            Err(e) => return Err(user_err_fmt(e)),
        };

        if !mentor.is_staff() || !mentor.is_active {
            return Err(AppError::BadRequest(
                "Mentor must be an active teacher or admin".to_string(),
            ));
        }

        let idea = find_idea(self.idea_repository.as_ref(), idea_id).await?;
        let now = Utc::now();

        let idea = self
            .idea_repository
            .update(idea.id, IdeaMutation {
                assigned_mentor: Some(mentor.id),
                mentor_assigned_at: Some(now),
                status: Some(Status::MentorAssigned),
                updated_at: Some(now),
                ..Default::default()
            })
            .await
            .map_err(idea_err_fmt)?;
        let related = self.lookup.related(&idea).await?;

        assign_mentor::Output { idea, related }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct IdeaReviewInteractor {
    pub idea_repository: Arc<dyn IdeaRepository + Sync + Send>,
    pub lookup: Lookup,
}
#[async_trait]
impl review::Usecase for IdeaReviewInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: review::Input) -> Result<review::Output> {
        tracing::trace!("input - {:?}", data);

        let review::Input {
            user,
            idea_id,
            status,
            review_notes,
        } = data;

        if !user.is_staff() {
            return Err(AppError::Forbidden(
                "Only teachers and admins can review ideas".to_string(),
            ));
        }

        let mut v = Violations::new();
        let status = match status.non_blank() {
            Some(s) => v.label::<Status>(Some(s)),
            None => {
                v.push("Status is required");
                None
            },
        };
        let review_notes = v.optional(
            review_notes.as_deref(),
            REVIEW_NOTES_MAX,
            "Review notes cannot be more than 1000 characters",
        );
        v.finish()?;

        let idea = find_idea(self.idea_repository.as_ref(), idea_id).await?;
        let now = Utc::now();

        let idea = self
            .idea_repository
            .update(idea.id, IdeaMutation {
                status,
                review_notes,
                reviewed_by: Some(user.id),
                reviewed_at: Some(now),
                updated_at: Some(now),
                ..Default::default()
            })
            .await
            .map_err(idea_err_fmt)?;
        let related = self.lookup.related(&idea).await?;

        review::Output { idea, related }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct IdeaFeatureInteractor {
    pub idea_repository: Arc<dyn IdeaRepository + Sync + Send>,
    pub lookup: Lookup,
}
#[async_trait]
impl feature::Usecase for IdeaFeatureInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: feature::Input) -> Result<feature::Output> {
        tracing::trace!("input - {:?}", data);

        let feature::Input {
            user,
            idea_id,
            featured,
        } = data;

        if !user.is_admin() {
            return Err(AppError::Forbidden(
                "Only admins can feature ideas".to_string(),
            ));
        }

        let idea = find_idea(self.idea_repository.as_ref(), idea_id).await?;
        let now = Utc::now();

        let idea = self
            .idea_repository
            .update(idea.id, IdeaMutation {
                is_featured: Some(featured),
                featured_at: Some(featured.then_some(now)),
                updated_at: Some(now),
                ..Default::default()
            })
            .await
            .map_err(idea_err_fmt)?;
        let related = self.lookup.related(&idea).await?;

        feature::Output { idea, related }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct IdeaAddMilestoneInteractor {
    pub idea_repository: Arc<dyn IdeaRepository + Sync + Send>,
    pub lookup: Lookup,
}
#[async_trait]
impl add_milestone::Usecase for IdeaAddMilestoneInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: add_milestone::Input) -> Result<add_milestone::Output> {
        tracing::trace!("input - {:?}", data);

        let add_milestone::Input {
            user,
            idea_id,
            title,
            description,
            due_date,
        } = data;

        let idea = find_idea(self.idea_repository.as_ref(), idea_id).await?;
        ensure_tracker(&idea, &user, "manage milestones")?;

        let mut v = Violations::new();
        let title = v.required(
            title.as_deref(),
            TITLE_MAX,
            "Milestone title is required",
            "Milestone title cannot be more than 100 characters",
        );
        let description = v.optional(
            description.as_deref(),
            MILESTONE_DESCRIPTION_MAX,
            "Milestone description cannot be more than 500 characters",
        );
        v.finish()?;

        let milestone = Milestone {
            id: Uuid::new_v4(),
            title: title.unwrap_or_default(),
            description,
            due_date,
            completed: false,
            completed_at: None,
            created_by: user.id,
            created_at: Utc::now(),
        };

        let idea = self
            .idea_repository
            .insert_milestone(idea.id, milestone)
            .await
            .map_err(idea_err_fmt)?;
        let related = self.lookup.related(&idea).await?;

        add_milestone::Output { idea, related }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct IdeaCompleteMilestoneInteractor {
    pub idea_repository: Arc<dyn IdeaRepository + Sync + Send>,
    pub lookup: Lookup,
}
#[async_trait]
impl complete_milestone::Usecase for IdeaCompleteMilestoneInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(
        &self,
        data: complete_milestone::Input,
    ) -> Result<complete_milestone::Output> {
        tracing::trace!("input - {:?}", data);

        let complete_milestone::Input {
            user,
            idea_id,
            milestone_id,
        } = data;

        let idea = find_idea(self.idea_repository.as_ref(), idea_id).await?;
        ensure_tracker(&idea, &user, "manage milestones")?;

        let milestone_not_found = || AppError::NotFound("Milestone not found".to_string());
        if !idea.milestones.iter().any(|m| m.id == milestone_id) {
            return Err(milestone_not_found());
        }

        let idea = match self
            .idea_repository
            .complete_milestone(idea.id, milestone_id, Utc::now())
            .await
        {
            Ok(i) => i,
            Err(crate::repositories::RepositoryError::NotFound) =>
                return Err(milestone_not_found()),
            Err(e) => return Err(idea_err_fmt(e)),
        };

        let related = self.lookup.related(&idea).await?;

        complete_milestone::Output { idea, related }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct IdeaAddUpdateInteractor {
    pub idea_repository: Arc<dyn IdeaRepository + Sync + Send>,
    pub lookup: Lookup,
}
#[async_trait]
impl add_update::Usecase for IdeaAddUpdateInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: add_update::Input) -> Result<add_update::Output> {
        tracing::trace!("input - {:?}", data);

        let add_update::Input {
            user,
            idea_id,
            title,
            content,
        } = data;

        let idea = find_idea(self.idea_repository.as_ref(), idea_id).await?;
        ensure_tracker(&idea, &user, "post updates")?;

        let mut v = Violations::new();
        let title = v.required(
            title.as_deref(),
            TITLE_MAX,
            "Update title is required",
            "Update title cannot be more than 100 characters",
        );
        let content = v.required(
            content.as_deref(),
            UPDATE_CONTENT_MAX,
            "Update content is required",
            "Update content cannot be more than 1000 characters",
        );
        v.finish()?;

        let update = ProgressUpdate {
            id: Uuid::new_v4(),
            title: title.unwrap_or_default(),
            content: content.unwrap_or_default(),
            author: user.id,
            created_at: Utc::now(),
        };

        let idea = self
            .idea_repository
            .insert_update(idea.id, update)
            .await
            .map_err(idea_err_fmt)?;
        let related = self.lookup.related(&idea).await?;

        add_update::Output { idea, related }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}
