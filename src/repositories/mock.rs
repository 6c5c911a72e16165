use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use tokio::sync::Mutex;
use uuid::Uuid;

use self::helpers::{find_mut, find_ref, remove_one, sort_and_page};
use super::{
    CommentQuery, CommentRepository, CommentSort, CommentSortKey, IdeaMutation, IdeaQuery,
    IdeaRepository, IdeaSort, IdeaSortKey, Moderation, Page, ParentQuery, RepositoryError, Result,
    UserMutation, UserRepository, Visibility,
};
use crate::entities::{
    Comment, CommentId, Date, Flag, Idea, IdeaId, Milestone, ModerationAction, ProgressUpdate,
    User, UserId,
};

mod helpers;

pub struct InMemoryRepository<T>(Mutex<Vec<T>>);

impl<T> InMemoryRepository<T> {
    pub fn new() -> Self { Self(Mutex::new(vec![])) }
}
impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self { Self::new() }
}

#[async_trait]
impl UserRepository for InMemoryRepository<User> {
    async fn insert(&self, item: User) -> Result<bool> {
        let mut guard = self.0.lock().await;

        if guard.iter().any(|u| u.id == item.id || u.email == item.email) {
            return Ok(false);
        }

        guard.push(item);
        Ok(true)
    }

    async fn find(&self, id: UserId) -> Result<User> {
        let guard = self.0.lock().await;

        Ok(find_ref(&guard, |u| u.id == id)?.clone())
    }

    async fn find_by_email(&self, email: &str) -> Result<User> {
        let guard = self.0.lock().await;

        Ok(find_ref(&guard, |u| u.email == email)?.clone())
    }

    async fn update(&self, id: UserId, mutation: UserMutation) -> Result<User> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |u| u.id == id)?;

        let UserMutation {
            name,
            password_hash,
            student_id,
            university,
            department,
            year,
            expertise,
            bio,
            avatar,
            phone,
            last_login,
            updated_at,
        } = mutation;

        if let Some(val) = name {
            item.name = val;
        }
        if let Some(val) = password_hash {
            item.password_hash = val;
        }
        if let Some(val) = student_id {
            item.student_id = Some(val);
        }
        if let Some(val) = university {
            item.university = Some(val);
        }
        if let Some(val) = department {
            item.department = Some(val);
        }
        if let Some(val) = year {
            item.year = Some(val);
        }
        if let Some(val) = expertise {
            item.expertise = val;
        }
        if let Some(val) = bio {
            item.bio = Some(val);
        }
        if let Some(val) = avatar {
            item.avatar = Some(val);
        }
        if let Some(val) = phone {
            item.phone = Some(val);
        }
        if let Some(val) = last_login {
            item.last_login = Some(val);
        }
        if let Some(val) = updated_at {
            item.updated_at = val;
        }

        Ok(item.clone())
    }

    async fn clear(&self) -> Result<()> {
        self.0.lock().await.clear();
        Ok(())
    }
}

fn search_regex(search: &Option<String>) -> Result<Option<Regex>> {
    search
        .as_ref()
        .map(|s| {
            RegexBuilder::new(&regex::escape(s))
                .case_insensitive(true)
                .build()
                .map_err(|e| RepositoryError::Internal(e.into()))
        })
        .transpose()
}

fn idea_matches(query: &IdeaQuery, search: &Option<Regex>, idea: &Idea) -> bool {
    let visible = match query.visibility {
        Visibility::Any => true,
        Visibility::Public => idea.is_public(),
        Visibility::PublicOr(user) => idea.is_public() || idea.creator == user,
    };

    let searched = match search {
        Some(r) =>
            r.is_match(&idea.title)
                || r.is_match(&idea.problem)
                || r.is_match(&idea.solution)
                || idea.tags.iter().any(|t| r.is_match(t)),
        None => true,
    };

    visible
        && searched
        && query.creator.map(|c| idea.creator == c).unwrap_or(true)
        && query.category.map(|c| idea.category == c).unwrap_or(true)
        && query.status.map(|s| idea.status == s).unwrap_or(true)
        && query.featured.map(|f| idea.is_featured == f).unwrap_or(true)
}

#[async_trait]
impl IdeaRepository for InMemoryRepository<Idea> {
    async fn insert(&self, item: Idea) -> Result<bool> {
        let mut guard = self.0.lock().await;

        if guard.iter().any(|i| i.id == item.id) {
            return Ok(false);
        }

        guard.push(item);
        Ok(true)
    }

    async fn find(&self, id: IdeaId) -> Result<Idea> {
        let guard = self.0.lock().await;

        Ok(find_ref(&guard, |i| i.id == id)?.clone())
    }

    async fn finds(&self, query: IdeaQuery, sort: IdeaSort, page: Page) -> Result<Vec<Idea>> {
        let search = search_regex(&query.search)?;
        let matched = self
            .0
            .lock()
            .await
            .iter()
            .filter(|i| idea_matches(&query, &search, i))
            .cloned()
            .collect::<Vec<_>>();

        let compare = |a: &Idea, b: &Idea| match sort.key {
            IdeaSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            IdeaSortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            IdeaSortKey::Title => a.title.cmp(&b.title),
            IdeaSortKey::Views => a.views.cmp(&b.views),
            IdeaSortKey::Upvotes => a.upvotes.len().cmp(&b.upvotes.len()),
        };

        Ok(sort_and_page(matched, compare, sort.ascending, page))
    }

    async fn count(&self, query: IdeaQuery) -> Result<u64> {
        let search = search_regex(&query.search)?;

        Ok(self
            .0
            .lock()
            .await
            .iter()
            .filter(|i| idea_matches(&query, &search, i))
            .count() as u64)
    }

    async fn update(&self, id: IdeaId, mutation: IdeaMutation) -> Result<Idea> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |i| i.id == id)?;

        let IdeaMutation {
            title,
            problem,
            solution,
            secret_sauce,
            target_audience,
            required_help,
            privacy_level,
            category,
            tags,
            status,
            assigned_mentor,
            mentor_assigned_at,
            reviewed_by,
            reviewed_at,
            review_notes,
            is_featured,
            featured_at,
            updated_at,
        } = mutation;

        if let Some(val) = title {
            item.title = val;
        }
        if let Some(val) = problem {
            item.problem = val;
        }
        if let Some(val) = solution {
            item.solution = val;
        }
        if let Some(val) = secret_sauce {
            item.secret_sauce = val;
        }
        if let Some(val) = target_audience {
            item.target_audience = val;
        }
        if let Some(val) = required_help {
            item.required_help = val;
        }
        if let Some(val) = privacy_level {
            item.privacy_level = val;
        }
        if let Some(val) = category {
            item.category = val;
        }
        if let Some(val) = tags {
            item.tags = val;
        }
        if let Some(val) = status {
            item.status = val;
        }
        if let Some(val) = assigned_mentor {
            item.assigned_mentor = Some(val);
        }
        if let Some(val) = mentor_assigned_at {
            item.mentor_assigned_at = Some(val);
        }
        if let Some(val) = reviewed_by {
            item.reviewed_by = Some(val);
        }
        if let Some(val) = reviewed_at {
            item.reviewed_at = Some(val);
        }
        if let Some(val) = review_notes {
            item.review_notes = Some(val);
        }
        if let Some(val) = is_featured {
            item.is_featured = val;
        }
        if let Some(val) = featured_at {
            item.featured_at = val;
        }
        if let Some(val) = updated_at {
            item.updated_at = val;
        }

        Ok(item.clone())
    }

    async fn increment_views(&self, id: IdeaId) -> Result<u64> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |i| i.id == id)?;

        item.views += 1;
        Ok(item.views)
    }

    async fn toggle_upvote(&self, id: IdeaId, user: UserId, at: Date) -> Result<(bool, u32)> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |i| i.id == id)?;

        let added = item.toggle_upvote(user, at);
        Ok((added, item.upvote_count()))
    }

    async fn insert_milestone(&self, id: IdeaId, milestone: Milestone) -> Result<Idea> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |i| i.id == id)?;

        item.updated_at = milestone.created_at;
        item.milestones.push(milestone);
        Ok(item.clone())
    }

    async fn complete_milestone(&self, id: IdeaId, milestone_id: Uuid, at: Date) -> Result<Idea> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |i| i.id == id)?;
        let milestone = find_mut(&mut item.milestones, |m| m.id == milestone_id)?;

        milestone.completed = true;
        milestone.completed_at = Some(at);
        item.updated_at = at;
        Ok(item.clone())
    }

    async fn insert_update(&self, id: IdeaId, update: ProgressUpdate) -> Result<Idea> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |i| i.id == id)?;

        item.updated_at = update.created_at;
        item.updates.push(update);
        Ok(item.clone())
    }

    async fn delete(&self, id: IdeaId) -> Result<Idea> {
        let mut guard = self.0.lock().await;

        remove_one(&mut guard, |i| i.id == id)
    }

    async fn clear(&self) -> Result<()> {
        self.0.lock().await.clear();
        Ok(())
    }
}

fn comment_matches(query: &CommentQuery, comment: &Comment) -> bool {
    let parent = match query.parent {
        Some(ParentQuery::TopLevel) => comment.parent_comment.is_none(),
        Some(ParentQuery::Of(id)) => comment.parent_comment == Some(id),
        None => true,
    };

    parent
        && query.idea.map(|i| comment.idea == i).unwrap_or(true)
        && (!query.listed_only || comment.is_listed())
}

#[async_trait]
impl CommentRepository for InMemoryRepository<Comment> {
    async fn insert(&self, item: Comment) -> Result<bool> {
        let mut guard = self.0.lock().await;

        if guard.iter().any(|c| c.id == item.id) {
            return Ok(false);
        }

        guard.push(item);
        Ok(true)
    }

    async fn find(&self, id: CommentId) -> Result<Comment> {
        let guard = self.0.lock().await;

        Ok(find_ref(&guard, |c| c.id == id)?.clone())
    }

    async fn finds(
        &self,
        query: CommentQuery,
        sort: CommentSort,
        page: Page,
    ) -> Result<Vec<Comment>> {
        let matched = self
            .0
            .lock()
            .await
            .iter()
            .filter(|c| comment_matches(&query, c))
            .cloned()
            .collect::<Vec<_>>();

        let compare = |a: &Comment, b: &Comment| match sort.key {
            CommentSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            CommentSortKey::Likes => a.likes.len().cmp(&b.likes.len()),
        };

        Ok(sort_and_page(matched, compare, sort.ascending, page))
    }

    async fn count(&self, query: CommentQuery) -> Result<u64> {
        Ok(self
            .0
            .lock()
            .await
            .iter()
            .filter(|c| comment_matches(&query, c))
            .count() as u64)
    }

    async fn update_content(&self, id: CommentId, content: String, at: Date) -> Result<Comment> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |c| c.id == id)?;

        item.edit(content, at);
        Ok(item.clone())
    }

    async fn soft_delete(&self, id: CommentId, at: Date) -> Result<Comment> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |c| c.id == id)?;

        item.soft_delete(at);
        Ok(item.clone())
    }

    async fn toggle_like(&self, id: CommentId, user: UserId, at: Date) -> Result<(bool, u32)> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |c| c.id == id)?;

        let added = item.toggle_like(user, at);
        Ok((added, item.like_count()))
    }

    async fn insert_flag(&self, id: CommentId, flag: Flag) -> Result<bool> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |c| c.id == id)?;

        Ok(item.add_flag(flag))
    }

    async fn moderate(
        &self,
        id: CommentId,
        Moderation {
            by,
            action,
            note,
            at,
        }: Moderation,
    ) -> Result<Comment> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |c| c.id == id)?;

        item.moderated_by = Some(by);
        item.moderation_action = action;
        item.moderation_note = note;
        item.moderated_at = Some(at);
        item.updated_at = at;

        if action == ModerationAction::Deleted {
            item.soft_delete(at);
        }

        Ok(item.clone())
    }

    async fn delete_by_idea(&self, idea: IdeaId) -> Result<u64> {
        let mut guard = self.0.lock().await;
        let before = guard.len();

        guard.retain(|c| c.idea != idea);
        Ok((before - guard.len()) as u64)
    }

    async fn clear(&self) -> Result<()> {
        self.0.lock().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::entities::fixtures::{comment, idea, user};
    use crate::entities::{PrivacyLevel, Role};

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let repo = InMemoryRepository::<User>::new();
        let first = user(Role::Student);
        let mut second = user(Role::Teacher);
        second.email = first.email.clone();

        assert!(repo.insert(first).await.unwrap());
        assert!(!repo.insert(second).await.unwrap());
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let repo = InMemoryRepository::<User>::new();

        assert!(matches!(
            repo.find(UserId::generate()).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn visibility_and_search() {
        let repo = InMemoryRepository::<Idea>::new();
        let me = UserId::generate();
        let someone = UserId::generate();

        let mut public = idea(someone, PrivacyLevel::Public);
        public.title = "StudyBuddy AI".to_string();
        let mine = idea(me, PrivacyLevel::Private);
        let hidden = idea(someone, PrivacyLevel::Private);

        for i in [public.clone(), mine.clone(), hidden] {
            assert!(repo.insert(i).await.unwrap());
        }

        let count = |visibility| IdeaQuery {
            visibility,
            ..Default::default()
        };
        assert_eq!(repo.count(count(Visibility::Public)).await.unwrap(), 1);
        assert_eq!(repo.count(count(Visibility::PublicOr(me))).await.unwrap(), 2);
        assert_eq!(repo.count(count(Visibility::Any)).await.unwrap(), 3);

        let found = repo
            .finds(
                IdeaQuery {
                    visibility: Visibility::PublicOr(me),
                    search: Some("studybuddy".to_string()),
                    ..Default::default()
                },
                IdeaSort::default(),
                Page::all(),
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, public.id);
    }

    #[tokio::test]
    async fn search_is_literal() {
        let repo = InMemoryRepository::<Idea>::new();
        repo.insert(idea(UserId::generate(), PrivacyLevel::Public))
            .await
            .unwrap();

        let query = IdeaQuery {
            search: Some(".*".to_string()),
            ..Default::default()
        };

        assert_eq!(repo.count(query).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn sorted_and_paged() {
        let repo = InMemoryRepository::<Idea>::new();
        let creator = UserId::generate();
        let base = Utc::now();

        for n in 0..5 {
            let mut i = idea(creator, PrivacyLevel::Public);
            i.created_at = base + Duration::seconds(n);
            i.title = format!("idea {}", n);
            repo.insert(i).await.unwrap();
        }

        let page = repo
            .finds(IdeaQuery::default(), IdeaSort::default(), Page {
                skip: 1,
                limit: 2,
            })
            .await
            .unwrap();

        let titles = page.iter().map(|i| i.title.as_str()).collect::<Vec<_>>();
        assert_eq!(titles, vec!["idea 3", "idea 2"]);
    }

    #[tokio::test]
    async fn listed_comments_skip_deleted_and_hidden() {
        let repo = InMemoryRepository::<Comment>::new();
        let idea_id = IdeaId::generate();
        let author = UserId::generate();

        let kept = comment(author, idea_id, None);
        let deleted = comment(author, idea_id, None);
        let hidden = comment(author, idea_id, None);
        let reply = comment(author, idea_id, Some(kept.id));

        for c in [kept.clone(), deleted.clone(), hidden.clone(), reply] {
            repo.insert(c).await.unwrap();
        }

        repo.soft_delete(deleted.id, Utc::now()).await.unwrap();
        repo.moderate(hidden.id, Moderation {
            by: UserId::generate(),
            action: ModerationAction::Hidden,
            note: None,
            at: Utc::now(),
        })
        .await
        .unwrap();

        let listed = CommentQuery {
            idea: Some(idea_id),
            parent: None,
            listed_only: true,
        };
        assert_eq!(repo.count(listed.clone()).await.unwrap(), 2);

        let top_level = CommentQuery {
            parent: Some(ParentQuery::TopLevel),
            ..listed.clone()
        };
        assert_eq!(repo.count(top_level).await.unwrap(), 1);

        let replies = CommentQuery {
            parent: Some(ParentQuery::Of(kept.id)),
            ..listed
        };
        assert_eq!(repo.count(replies).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn deleting_idea_comments() {
        let repo = InMemoryRepository::<Comment>::new();
        let idea_id = IdeaId::generate();

        repo.insert(comment(UserId::generate(), idea_id, None))
            .await
            .unwrap();
        repo.insert(comment(UserId::generate(), idea_id, None))
            .await
            .unwrap();
        repo.insert(comment(UserId::generate(), IdeaId::generate(), None))
            .await
            .unwrap();

        assert_eq!(repo.delete_by_idea(idea_id).await.unwrap(), 2);
        assert_eq!(repo.count(CommentQuery::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn completing_unknown_milestone() {
        let repo = InMemoryRepository::<Idea>::new();
        let i = idea(UserId::generate(), PrivacyLevel::Public);
        repo.insert(i.clone()).await.unwrap();

        assert!(matches!(
            repo.complete_milestone(i.id, Uuid::new_v4(), Utc::now()).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn progress_touches_the_idea() {
        let repo = InMemoryRepository::<Idea>::new();
        let mut i = idea(UserId::generate(), PrivacyLevel::Public);
        i.updated_at = Utc::now() - Duration::days(1);
        repo.insert(i.clone()).await.unwrap();

        let planned = Utc::now() - Duration::hours(3);
        let with_milestone = repo
            .insert_milestone(i.id, Milestone {
                id: Uuid::new_v4(),
                title: "Prototype".to_string(),
                description: None,
                due_date: None,
                completed: false,
                completed_at: None,
                created_by: i.creator,
                created_at: planned,
            })
            .await
            .unwrap();
        assert_eq!(with_milestone.updated_at, planned);

        let done = Utc::now() - Duration::hours(2);
        let completed = repo
            .complete_milestone(i.id, with_milestone.milestones[0].id, done)
            .await
            .unwrap();
        assert_eq!(completed.updated_at, done);

        let posted = Utc::now() - Duration::hours(1);
        let updated = repo
            .insert_update(i.id, ProgressUpdate {
                id: Uuid::new_v4(),
                title: "Week 1".to_string(),
                content: "Shipped the prototype.".to_string(),
                author: i.creator,
                created_at: posted,
            })
            .await
            .unwrap();
        assert_eq!(updated.updated_at, posted);
    }
}
