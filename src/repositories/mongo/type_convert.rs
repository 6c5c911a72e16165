use anyhow::Context;
use chrono::SecondsFormat;
use mongodb::bson::{doc, Bson, Document};
use uuid::Uuid;

use super::models::{
    MongoCommentModel, MongoFlagModel, MongoIdeaModel, MongoMilestoneModel, MongoUpdateModel,
    MongoUserModel, MongoVoteModel,
};
use crate::repositories::{
    CommentQuery, CommentSort, CommentSortKey, IdeaMutation, IdeaQuery, IdeaSort, IdeaSortKey,
    ParentQuery, RepositoryError, UserMutation, Visibility,
};
use crate::entities::{
    Comment, Date, Flag, Idea, Milestone, ModerationAction, ProgressUpdate, User, Vote,
};

type ConvertResult<T> = ::core::result::Result<T, RepositoryError>;

pub fn date_str(date: &Date) -> String { date.to_rfc3339_opts(SecondsFormat::Micros, true) }

fn parse_date(s: &str) -> ConvertResult<Date> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&chrono::Utc))
        .with_context(|| format!("stored date is malformed: {}", s))
        .map_err(RepositoryError::Internal)
}

fn parse_opt_date(s: Option<String>) -> ConvertResult<Option<Date>> {
    s.as_deref().map(parse_date).transpose()
}

fn parse_id<T: From<Uuid>>(s: &str) -> ConvertResult<T> {
    s.parse::<Uuid>()
        .map(T::from)
        .with_context(|| format!("stored id is malformed: {}", s))
        .map_err(RepositoryError::Internal)
}

fn parse_opt_id<T: From<Uuid>>(s: Option<String>) -> ConvertResult<Option<T>> {
    s.as_deref().map(parse_id).transpose()
}

impl From<&Vote> for MongoVoteModel {
    fn from(Vote { user, created_at }: &Vote) -> Self {
        MongoVoteModel {
            user: user.to_string(),
            created_at: date_str(created_at),
        }
    }
}

impl TryFrom<MongoVoteModel> for Vote {
    type Error = RepositoryError;

    fn try_from(MongoVoteModel { user, created_at }: MongoVoteModel) -> ConvertResult<Self> {
        Ok(Vote {
            user: parse_id(&user)?,
            created_at: parse_date(&created_at)?,
        })
    }
}

impl From<User> for MongoUserModel {
    fn from(
        User {
            id,
            name,
            email,
            password_hash,
            role,
            student_id,
            university,
            department,
            year,
            expertise,
            bio,
            avatar,
            phone,
            is_active,
            is_verified,
            email_verified,
            last_login,
            created_at,
            updated_at,
        }: User,
    ) -> Self {
        MongoUserModel {
            id: id.to_string(),
            name,
            email,
            password_hash,
            role,
            student_id,
            university,
            department,
            year: year.map(i32::from),
            expertise,
            bio,
            avatar,
            phone,
            is_active,
            is_verified,
            email_verified,
            last_login: last_login.as_ref().map(date_str),
            created_at: date_str(&created_at),
            updated_at: date_str(&updated_at),
        }
    }
}

impl TryFrom<MongoUserModel> for User {
    type Error = RepositoryError;

    fn try_from(m: MongoUserModel) -> ConvertResult<Self> {
        Ok(User {
            id: parse_id(&m.id)?,
            name: m.name,
            email: m.email,
            password_hash: m.password_hash,
            role: m.role,
            student_id: m.student_id,
            university: m.university,
            department: m.department,
            year: m.year.and_then(|y| u8::try_from(y).ok()),
            expertise: m.expertise,
            bio: m.bio,
            avatar: m.avatar,
            phone: m.phone,
            is_active: m.is_active,
            is_verified: m.is_verified,
            email_verified: m.email_verified,
            last_login: parse_opt_date(m.last_login)?,
            created_at: parse_date(&m.created_at)?,
            updated_at: parse_date(&m.updated_at)?,
        })
    }
}

impl From<&Milestone> for MongoMilestoneModel {
    fn from(m: &Milestone) -> Self {
        MongoMilestoneModel {
            id: m.id.to_string(),
            title: m.title.clone(),
            description: m.description.clone(),
            due_date: m.due_date.as_ref().map(date_str),
            completed: m.completed,
            completed_at: m.completed_at.as_ref().map(date_str),
            created_by: m.created_by.to_string(),
            created_at: date_str(&m.created_at),
        }
    }
}

impl TryFrom<MongoMilestoneModel> for Milestone {
    type Error = RepositoryError;

    fn try_from(m: MongoMilestoneModel) -> ConvertResult<Self> {
        Ok(Milestone {
            id: parse_id(&m.id)?,
            title: m.title,
            description: m.description,
            due_date: parse_opt_date(m.due_date)?,
            completed: m.completed,
            completed_at: parse_opt_date(m.completed_at)?,
            created_by: parse_id(&m.created_by)?,
            created_at: parse_date(&m.created_at)?,
        })
    }
}

impl From<&ProgressUpdate> for MongoUpdateModel {
    fn from(u: &ProgressUpdate) -> Self {
        MongoUpdateModel {
            id: u.id.to_string(),
            title: u.title.clone(),
            content: u.content.clone(),
            author: u.author.to_string(),
            created_at: date_str(&u.created_at),
        }
    }
}

impl TryFrom<MongoUpdateModel> for ProgressUpdate {
    type Error = RepositoryError;

    fn try_from(u: MongoUpdateModel) -> ConvertResult<Self> {
        Ok(ProgressUpdate {
            id: parse_id(&u.id)?,
            title: u.title,
            content: u.content,
            author: parse_id(&u.author)?,
            created_at: parse_date(&u.created_at)?,
        })
    }
}

impl From<Idea> for MongoIdeaModel {
    fn from(i: Idea) -> Self {
        MongoIdeaModel {
            id: i.id.to_string(),
            creator: i.creator.to_string(),
            title: i.title,
            problem: i.problem,
            solution: i.solution,
            secret_sauce: i.secret_sauce,
            target_audience: i.target_audience,
            required_help: i.required_help,
            privacy_level: i.privacy_level,
            category: i.category,
            tags: i.tags,
            status: i.status,
            assigned_mentor: i.assigned_mentor.map(|m| m.to_string()),
            mentor_assigned_at: i.mentor_assigned_at.as_ref().map(date_str),
            upvotes_size: i.upvotes.len() as i64,
            upvotes: i.upvotes.iter().map(Into::into).collect(),
            views: i.views as i64,
            milestones: i.milestones.iter().map(Into::into).collect(),
            updates: i.updates.iter().map(Into::into).collect(),
            reviewed_by: i.reviewed_by.map(|r| r.to_string()),
            reviewed_at: i.reviewed_at.as_ref().map(date_str),
            review_notes: i.review_notes,
            is_featured: i.is_featured,
            featured_at: i.featured_at.as_ref().map(date_str),
            created_at: date_str(&i.created_at),
            updated_at: date_str(&i.updated_at),
        }
    }
}

impl TryFrom<MongoIdeaModel> for Idea {
    type Error = RepositoryError;

    fn try_from(m: MongoIdeaModel) -> ConvertResult<Self> {
        Ok(Idea {
            id: parse_id(&m.id)?,
            creator: parse_id(&m.creator)?,
            title: m.title,
            problem: m.problem,
            solution: m.solution,
            secret_sauce: m.secret_sauce,
            target_audience: m.target_audience,
            required_help: m.required_help,
            privacy_level: m.privacy_level,
            category: m.category,
            tags: m.tags,
            status: m.status,
            assigned_mentor: parse_opt_id(m.assigned_mentor)?,
            mentor_assigned_at: parse_opt_date(m.mentor_assigned_at)?,
            upvotes: m
                .upvotes
                .into_iter()
                .map(TryInto::try_into)
                .collect::<ConvertResult<_>>()?,
            views: m.views.max(0) as u64,
            milestones: m
                .milestones
                .into_iter()
                .map(TryInto::try_into)
                .collect::<ConvertResult<_>>()?,
            updates: m
                .updates
                .into_iter()
                .map(TryInto::try_into)
                .collect::<ConvertResult<_>>()?,
            reviewed_by: parse_opt_id(m.reviewed_by)?,
            reviewed_at: parse_opt_date(m.reviewed_at)?,
            review_notes: m.review_notes,
            is_featured: m.is_featured,
            featured_at: parse_opt_date(m.featured_at)?,
            created_at: parse_date(&m.created_at)?,
            updated_at: parse_date(&m.updated_at)?,
        })
    }
}

impl From<&Flag> for MongoFlagModel {
    fn from(f: &Flag) -> Self {
        MongoFlagModel {
            reporter: f.reporter.to_string(),
            reason: f.reason,
            description: f.description.clone(),
            created_at: date_str(&f.created_at),
        }
    }
}

impl TryFrom<MongoFlagModel> for Flag {
    type Error = RepositoryError;

    fn try_from(f: MongoFlagModel) -> ConvertResult<Self> {
        Ok(Flag {
            reporter: parse_id(&f.reporter)?,
            reason: f.reason,
            description: f.description,
            created_at: parse_date(&f.created_at)?,
        })
    }
}

impl From<Comment> for MongoCommentModel {
    fn from(c: Comment) -> Self {
        MongoCommentModel {
            id: c.id.to_string(),
            content: c.content,
            author: c.author.to_string(),
            idea: c.idea.to_string(),
            parent_comment: c.parent_comment.map(|p| p.to_string()),
            likes_size: c.likes.len() as i64,
            likes: c.likes.iter().map(Into::into).collect(),
            is_edited: c.is_edited,
            edited_at: c.edited_at.as_ref().map(date_str),
            is_deleted: c.is_deleted,
            deleted_at: c.deleted_at.as_ref().map(date_str),
            flags: c.flags.iter().map(Into::into).collect(),
            moderated_by: c.moderated_by.map(|m| m.to_string()),
            moderation_action: c.moderation_action,
            moderation_note: c.moderation_note,
            moderated_at: c.moderated_at.as_ref().map(date_str),
            created_at: date_str(&c.created_at),
            updated_at: date_str(&c.updated_at),
        }
    }
}

impl TryFrom<MongoCommentModel> for Comment {
    type Error = RepositoryError;

    fn try_from(m: MongoCommentModel) -> ConvertResult<Self> {
        Ok(Comment {
            id: parse_id(&m.id)?,
            content: m.content,
            author: parse_id(&m.author)?,
            idea: parse_id(&m.idea)?,
            parent_comment: parse_opt_id(m.parent_comment)?,
            likes: m
                .likes
                .into_iter()
                .map(TryInto::try_into)
                .collect::<ConvertResult<_>>()?,
            is_edited: m.is_edited,
            edited_at: parse_opt_date(m.edited_at)?,
            is_deleted: m.is_deleted,
            deleted_at: parse_opt_date(m.deleted_at)?,
            flags: m
                .flags
                .into_iter()
                .map(TryInto::try_into)
                .collect::<ConvertResult<_>>()?,
            moderated_by: parse_opt_id(m.moderated_by)?,
            moderation_action: m.moderation_action,
            moderation_note: m.moderation_note,
            moderated_at: parse_opt_date(m.moderated_at)?,
            created_at: parse_date(&m.created_at)?,
            updated_at: parse_date(&m.updated_at)?,
        })
    }
}

impl From<UserMutation> for Document {
    fn from(
        UserMutation {
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
        }: UserMutation,
    ) -> Self {
        let mut mutation = doc! {};

        if let Some(val) = name {
            mutation.insert("name", val);
        }
        if let Some(val) = password_hash {
            mutation.insert("password_hash", val);
        }
        if let Some(val) = student_id {
            mutation.insert("student_id", val);
        }
        if let Some(val) = university {
            mutation.insert("university", val);
        }
        if let Some(val) = department {
            mutation.insert("department", val);
        }
        if let Some(val) = year {
            mutation.insert("year", i32::from(val));
        }
        if let Some(val) = expertise {
            mutation.insert("expertise", val);
        }
        if let Some(val) = bio {
            mutation.insert("bio", val);
        }
        if let Some(val) = avatar {
            mutation.insert("avatar", val);
        }
        if let Some(val) = phone {
            mutation.insert("phone", val);
        }
        if let Some(val) = last_login {
            mutation.insert("last_login", date_str(&val));
        }
        if let Some(val) = updated_at {
            mutation.insert("updated_at", date_str(&val));
        }

        mutation
    }
}

fn labels<T: ToString>(items: &[T]) -> Vec<String> { items.iter().map(T::to_string).collect() }

impl From<IdeaMutation> for Document {
    fn from(m: IdeaMutation) -> Self {
        let mut mutation = doc! {};

        if let Some(val) = m.title {
            mutation.insert("title", val);
        }
        if let Some(val) = m.problem {
            mutation.insert("problem", val);
        }
        if let Some(val) = m.solution {
            mutation.insert("solution", val);
        }
        if let Some(val) = m.secret_sauce {
            mutation.insert("secret_sauce", val);
        }
        if let Some(val) = m.target_audience {
            mutation.insert("target_audience", val);
        }
        if let Some(val) = m.required_help {
            mutation.insert("required_help", labels(&val));
        }
        if let Some(val) = m.privacy_level {
            mutation.insert("privacy_level", val.as_str());
        }
        if let Some(val) = m.category {
            mutation.insert("category", val.as_str());
        }
        if let Some(val) = m.tags {
            mutation.insert("tags", val);
        }
        if let Some(val) = m.status {
            mutation.insert("status", val.as_str());
        }
        if let Some(val) = m.assigned_mentor {
            mutation.insert("assigned_mentor", val.to_string());
        }
        if let Some(val) = m.mentor_assigned_at {
            mutation.insert("mentor_assigned_at", date_str(&val));
        }
        if let Some(val) = m.reviewed_by {
            mutation.insert("reviewed_by", val.to_string());
        }
        if let Some(val) = m.reviewed_at {
            mutation.insert("reviewed_at", date_str(&val));
        }
        if let Some(val) = m.review_notes {
            mutation.insert("review_notes", val);
        }
        if let Some(val) = m.is_featured {
            mutation.insert("is_featured", val);
        }
        if let Some(val) = m.featured_at {
            mutation.insert(
                "featured_at",
                val.as_ref().map(date_str).map(Bson::from).unwrap_or(Bson::Null),
            );
        }
        if let Some(val) = m.updated_at {
            mutation.insert("updated_at", date_str(&val));
        }

        mutation
    }
}

impl From<IdeaQuery> for Document {
    fn from(
        IdeaQuery {
            visibility,
            creator,
            category,
            status,
            featured,
            search,
        }: IdeaQuery,
    ) -> Self {
        let mut clauses: Vec<Document> = vec![];

        match visibility {
            Visibility::Any => (),
            Visibility::Public => clauses.push(doc! { "privacy_level": "public" }),
            Visibility::PublicOr(user) => clauses.push(doc! {
                "$or": [
                    { "privacy_level": "public" },
                    { "creator": user.to_string() },
                ]
            }),
        }

        if let Some(val) = creator {
            clauses.push(doc! { "creator": val.to_string() });
        }
        if let Some(val) = category {
            clauses.push(doc! { "category": val.as_str() });
        }
        if let Some(val) = status {
            clauses.push(doc! { "status": val.as_str() });
        }
        if let Some(val) = featured {
            clauses.push(doc! { "is_featured": val });
        }
        if let Some(val) = search {
            let pattern = regex::escape(&val);
            let matcher = doc! { "$regex": pattern, "$options": "i" };

            clauses.push(doc! {
                "$or": [
                    { "title": matcher.clone() },
                    { "problem": matcher.clone() },
                    { "solution": matcher.clone() },
                    { "tags": matcher },
                ]
            });
        }

        match clauses.len() {
            0 => doc! {},
            _ => doc! { "$and": clauses },
        }
    }
}

impl From<IdeaSort> for Document {
    fn from(IdeaSort { key, ascending }: IdeaSort) -> Self {
        let field = match key {
            IdeaSortKey::CreatedAt => "created_at",
            IdeaSortKey::UpdatedAt => "updated_at",
            IdeaSortKey::Title => "title",
            IdeaSortKey::Views => "views",
            IdeaSortKey::Upvotes => "upvotes_size",
        };

        let order = if ascending { 1 } else { -1 };

        doc! { field: order }
    }
}

impl From<CommentQuery> for Document {
    fn from(
        CommentQuery {
            idea,
            parent,
            listed_only,
        }: CommentQuery,
    ) -> Self {
        let mut query = doc! {};

        if let Some(val) = idea {
            query.insert("idea", val.to_string());
        }

        match parent {
            Some(ParentQuery::TopLevel) => {
                query.insert("parent_comment", Bson::Null);
            },
            Some(ParentQuery::Of(id)) => {
                query.insert("parent_comment", id.to_string());
            },
            None => (),
        }

        if listed_only {
            query.insert("is_deleted", false);
            query.insert(
                "moderation_action",
                doc! { "$ne": ModerationAction::Hidden.as_str() },
            );
        }

        query
    }
}

impl From<CommentSort> for Document {
    fn from(CommentSort { key, ascending }: CommentSort) -> Self {
        let field = match key {
            CommentSortKey::CreatedAt => "created_at",
            CommentSortKey::Likes => "likes_size",
        };

        let order = if ascending { 1 } else { -1 };

        doc! { field: order }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::entities::fixtures::{comment, idea};
    use crate::entities::{PrivacyLevel, Status, UserId};

    #[test]
    fn dates_keep_order_as_strings() {
        let earlier = Utc::now();
        let later = earlier + chrono::Duration::milliseconds(1500);

        assert!(date_str(&earlier) < date_str(&later));
        assert_eq!(
            parse_date(&date_str(&earlier)).unwrap().timestamp_micros(),
            earlier.timestamp_micros()
        );
    }

    #[test]
    fn idea_survives_the_model() {
        let mut i = idea(UserId::generate(), PrivacyLevel::Private);
        i.toggle_upvote(UserId::generate(), Utc::now());
        i.assigned_mentor = Some(UserId::generate());

        let model = MongoIdeaModel::from(i.clone());
        assert_eq!(model.upvotes_size, 1);

        let back = Idea::try_from(model).unwrap();
        assert_eq!(back.id, i.id);
        assert_eq!(back.upvotes[0].user, i.upvotes[0].user);
        assert_eq!(back.assigned_mentor, i.assigned_mentor);
    }

    #[test]
    fn malformed_stored_id_is_an_error() {
        let mut model = MongoCommentModel::from(comment(
            UserId::generate(),
            crate::entities::IdeaId::generate(),
            None,
        ));
        model.author = "not-a-uuid".to_string();

        assert!(matches!(
            Comment::try_from(model),
            Err(RepositoryError::Internal(_))
        ));
    }

    #[test]
    fn idea_query_combines_visibility_and_search() {
        let me = UserId::generate();
        let query: Document = IdeaQuery {
            visibility: Visibility::PublicOr(me),
            status: Some(Status::Submitted),
            search: Some("a.b".to_string()),
            ..Default::default()
        }
        .into();

        let clauses = query.get_array("$and").unwrap();
        assert_eq!(clauses.len(), 3);

        let search = clauses[2].as_document().unwrap().get_array("$or").unwrap();
        let title = search[0].as_document().unwrap().get_document("title").unwrap();
        assert_eq!(title.get_str("$regex").unwrap(), r"a\.b");
    }

    #[test]
    fn listed_comment_query() {
        let query: Document = CommentQuery {
            idea: None,
            parent: Some(ParentQuery::TopLevel),
            listed_only: true,
        }
        .into();

        assert_eq!(query.get("parent_comment"), Some(&Bson::Null));
        assert_eq!(query.get_bool("is_deleted").unwrap(), false);
    }
}
