use async_trait::async_trait;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::FindOptions;
use mongodb::{Collection, Database};
use tracing::Instrument;
use uuid::Uuid;

use self::converters::{convert_404_or, convert_repo_err, to_bool, try_unique_check};
use self::helpers::{
    count, get_many, get_one, index, initialize_coll, toggle_vote, unique_index, update_and_get,
};
use self::models::{MongoCommentModel, MongoFlagModel, MongoIdeaModel, MongoUserModel};
use self::type_convert::date_str;
use super::{
    CommentQuery, CommentRepository, CommentSort, IdeaMutation, IdeaQuery, IdeaRepository,
    IdeaSort, Moderation, Page, RepositoryError, Result, UserMutation, UserRepository,
};
use crate::entities::{
    Comment, CommentId, Date, Flag, Idea, IdeaId, Milestone, ModerationAction, ProgressUpdate,
    User, UserId, DELETED_COMMENT_CONTENT,
};
use crate::utils::Chain;

mod converters;
mod helpers;
mod models;
mod type_convert;

pub struct MongoUserRepository {
    coll: Collection<MongoUserModel>,
}

impl MongoUserRepository {
    pub async fn new_with(db: &Database) -> ::anyhow::Result<Self> {
        initialize_coll("user", vec![unique_index("id"), unique_index("email")], db).await?;

        Ok(Self {
            coll: db.collection("user"),
        })
    }
}

pub struct MongoIdeaRepository {
    coll: Collection<MongoIdeaModel>,
}

impl MongoIdeaRepository {
    pub async fn new_with(db: &Database) -> ::anyhow::Result<Self> {
        initialize_coll(
            "idea",
            vec![unique_index("id"), index("creator"), index("created_at")],
            db,
        )
        .await?;

        Ok(Self {
            coll: db.collection("idea"),
        })
    }
}

pub struct MongoCommentRepository {
    coll: Collection<MongoCommentModel>,
}

impl MongoCommentRepository {
    pub async fn new_with(db: &Database) -> ::anyhow::Result<Self> {
        initialize_coll(
            "comment",
            vec![unique_index("id"), index("idea"), index("parent_comment")],
            db,
        )
        .await?;

        Ok(Self {
            coll: db.collection("comment"),
        })
    }
}

fn find_options(sort: Document, Page { skip, limit }: Page) -> FindOptions {
    FindOptions::builder()
        .sort(sort)
        .skip(skip)
        .limit(i64::try_from(limit).ok())
        .build()
}

fn by_id(id: impl ToString) -> Document { doc! { "id": id.to_string() } }

fn into_entities<M, E>(models: Vec<M>) -> Result<Vec<E>>
where E: TryFrom<M, Error = RepositoryError> {
    models.into_iter().map(E::try_from).collect()
}

async fn clear_coll<T>(coll: &Collection<T>) -> Result<()> {
    coll.delete_many(doc! {}, None)
        .instrument(tracing::trace_span!("delete_many"))
        .await
        .let_(convert_repo_err)?;

    Ok(())
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn insert(&self, item: User) -> Result<bool> {
        let model: MongoUserModel = item.into();

        self.coll
            .insert_one(model, None)
            .instrument(tracing::trace_span!("insert_one"))
            .await
            .let_(try_unique_check)
    }

    async fn find(&self, id: UserId) -> Result<User> {
        get_one(&self.coll, by_id(id)).await?.try_into()
    }

    async fn find_by_email(&self, email: &str) -> Result<User> {
        get_one(&self.coll, doc! { "email": email }).await?.try_into()
    }

    async fn update(&self, id: UserId, mutation: UserMutation) -> Result<User> {
        let mutation: Document = mutation.into();

        match mutation.is_empty() {
            true => get_one(&self.coll, by_id(id)).await?,
            false => update_and_get(&self.coll, by_id(id), doc! { "$set": mutation }).await?,
        }
        .try_into()
    }

    async fn clear(&self) -> Result<()> { clear_coll(&self.coll).await }
}

#[async_trait]
impl IdeaRepository for MongoIdeaRepository {
    async fn insert(&self, item: Idea) -> Result<bool> {
        let model: MongoIdeaModel = item.into();

        self.coll
            .insert_one(model, None)
            .instrument(tracing::trace_span!("insert_one"))
            .await
            .let_(try_unique_check)
    }

    async fn find(&self, id: IdeaId) -> Result<Idea> {
        get_one(&self.coll, by_id(id)).await?.try_into()
    }

    async fn finds(&self, query: IdeaQuery, sort: IdeaSort, page: Page) -> Result<Vec<Idea>> {
        get_many(&self.coll, query.into(), find_options(sort.into(), page))
            .await?
            .let_(into_entities)
    }

    async fn count(&self, query: IdeaQuery) -> Result<u64> { count(&self.coll, query.into()).await }

    async fn update(&self, id: IdeaId, mutation: IdeaMutation) -> Result<Idea> {
        let mutation: Document = mutation.into();

        match mutation.is_empty() {
            true => get_one(&self.coll, by_id(id)).await?,
            false => update_and_get(&self.coll, by_id(id), doc! { "$set": mutation }).await?,
        }
        .try_into()
    }

    async fn increment_views(&self, id: IdeaId) -> Result<u64> {
        let model = update_and_get(&self.coll, by_id(id), doc! { "$inc": { "views": 1_i64 } })
            .await?;

        Ok(model.views.max(0) as u64)
    }

    async fn toggle_upvote(&self, id: IdeaId, user: UserId, at: Date) -> Result<(bool, u32)> {
        let id = id.to_string();
        let added = toggle_vote(
            "upvotes",
            &self.coll,
            &id,
            &user.to_string(),
            &date_str(&at),
        )
        .await?;

        let model = get_one(&self.coll, by_id(id)).await?;
        Ok((added, model.upvotes.len() as u32))
    }

    async fn insert_milestone(&self, id: IdeaId, milestone: Milestone) -> Result<Idea> {
        let at = date_str(&milestone.created_at);
        let milestone = mongodb::bson::to_bson(&models::MongoMilestoneModel::from(&milestone))
            .map_err(|e| RepositoryError::Internal(e.into()))?;

        update_and_get(
            &self.coll,
            by_id(id),
            doc! {
                "$push": { "milestones": milestone },
                "$set": { "updated_at": at },
            },
        )
        .await?
        .try_into()
    }

    async fn complete_milestone(&self, id: IdeaId, milestone_id: Uuid, at: Date) -> Result<Idea> {
        update_and_get(
            &self.coll,
            doc! { "id": id.to_string(), "milestones.id": milestone_id.to_string() },
            doc! {
                "$set": {
                    "milestones.$.completed": true,
                    "milestones.$.completed_at": date_str(&at),
                    "updated_at": date_str(&at),
                }
            },
        )
        .await?
        .try_into()
    }

    async fn insert_update(&self, id: IdeaId, update: ProgressUpdate) -> Result<Idea> {
        let at = date_str(&update.created_at);
        let update = mongodb::bson::to_bson(&models::MongoUpdateModel::from(&update))
            .map_err(|e| RepositoryError::Internal(e.into()))?;

        update_and_get(
            &self.coll,
            by_id(id),
            doc! {
                "$push": { "updates": update },
                "$set": { "updated_at": at },
            },
        )
        .await?
            .try_into()
    }

    async fn delete(&self, id: IdeaId) -> Result<Idea> {
        self.coll
            .find_one_and_delete(by_id(id), None)
            .instrument(tracing::trace_span!("find_one_and_delete"))
            .await
            .let_(convert_repo_err)?
            .let_(convert_404_or)?
            .try_into()
    }

    async fn clear(&self) -> Result<()> { clear_coll(&self.coll).await }
}

#[async_trait]
impl CommentRepository for MongoCommentRepository {
    async fn insert(&self, item: Comment) -> Result<bool> {
        let model: MongoCommentModel = item.into();

        self.coll
            .insert_one(model, None)
            .instrument(tracing::trace_span!("insert_one"))
            .await
            .let_(try_unique_check)
    }

    async fn find(&self, id: CommentId) -> Result<Comment> {
        get_one(&self.coll, by_id(id)).await?.try_into()
    }

    async fn finds(
        &self,
        query: CommentQuery,
        sort: CommentSort,
        page: Page,
    ) -> Result<Vec<Comment>> {
        get_many(&self.coll, query.into(), find_options(sort.into(), page))
            .await?
            .let_(into_entities)
    }

    async fn count(&self, query: CommentQuery) -> Result<u64> {
        count(&self.coll, query.into()).await
    }

    async fn update_content(&self, id: CommentId, content: String, at: Date) -> Result<Comment> {
        let at = date_str(&at);

        update_and_get(
            &self.coll,
            by_id(id),
            doc! {
                "$set": {
                    "content": content,
                    "is_edited": true,
                    "edited_at": at.as_str(),
                    "updated_at": at.as_str(),
                }
            },
        )
        .await?
        .try_into()
    }

    async fn soft_delete(&self, id: CommentId, at: Date) -> Result<Comment> {
        update_and_get(&self.coll, by_id(id), doc! { "$set": soft_deletion(&at) })
            .await?
            .try_into()
    }

    async fn toggle_like(&self, id: CommentId, user: UserId, at: Date) -> Result<(bool, u32)> {
        let id = id.to_string();
        let added =
            toggle_vote("likes", &self.coll, &id, &user.to_string(), &date_str(&at)).await?;

        let model = get_one(&self.coll, by_id(id)).await?;
        Ok((added, model.likes.len() as u32))
    }

    async fn insert_flag(&self, id: CommentId, flag: Flag) -> Result<bool> {
        let reporter = flag.reporter.to_string();
        let flag = mongodb::bson::to_bson(&MongoFlagModel::from(&flag))
            .map_err(|e| RepositoryError::Internal(e.into()))?;

        let res = self
            .coll
            .update_one(
                doc! { "id": id.to_string(), "flags.reporter": { "$ne": reporter.as_str() } },
                doc! { "$push": { "flags": flag } },
                None,
            )
            .instrument(tracing::trace_span!("update_one"))
            .await
            .let_(convert_repo_err)?;

        if res.matched_count.let_(to_bool) {
            return Ok(true);
        }

        match count(&self.coll, by_id(id)).await?.let_(to_bool) {
            true => Ok(false),
            false => Err(RepositoryError::NotFound),
        }
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
        let mut set = match action {
            ModerationAction::Deleted => soft_deletion(&at),
            _ => doc! { "updated_at": date_str(&at) },
        };
        set.insert("moderated_by", by.to_string());
        set.insert("moderation_action", action.as_str());
        set.insert("moderation_note", note.map(Bson::from).unwrap_or(Bson::Null));
        set.insert("moderated_at", date_str(&at));

        update_and_get(&self.coll, by_id(id), doc! { "$set": set })
            .await?
            .try_into()
    }

    async fn delete_by_idea(&self, idea: IdeaId) -> Result<u64> {
        let res = self
            .coll
            .delete_many(doc! { "idea": idea.to_string() }, None)
            .instrument(tracing::trace_span!("delete_many"))
            .await
            .let_(convert_repo_err)?;

        Ok(res.deleted_count)
    }

    async fn clear(&self) -> Result<()> { clear_coll(&self.coll).await }
}

fn soft_deletion(at: &Date) -> Document {
    let at = date_str(at);

    doc! {
        "content": DELETED_COMMENT_CONTENT,
        "is_deleted": true,
        "deleted_at": at.as_str(),
        "updated_at": at.as_str(),
    }
}

