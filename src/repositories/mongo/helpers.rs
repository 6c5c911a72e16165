use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::error::Result as MongoResult;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Collection, Database};
use serde::de::DeserializeOwned;
use tracing::Instrument;

use super::converters::{convert_404_or, convert_repo_err, to_bool};
use super::{RepositoryError, Result as RepoResult};
use crate::utils::Chain;

pub fn unique_index(key: &str) -> Document {
    doc! {
        "name": format!("unique_{}", key),
        "key": { key: 1 },
        "unique": true
    }
}

pub fn index(key: &str) -> Document {
    doc! {
        "name": format!("by_{}", key),
        "key": { key: 1 }
    }
}

pub async fn initialize_coll(
    coll_name: &str,
    indexes: Vec<Document>,
    db: &Database,
) -> MongoResult<()> {
    db.run_command(
        doc! {
            "createIndexes": coll_name,
            "indexes": indexes,
        },
        None,
    )
    .instrument(tracing::trace_span!("run_command"))
    .await?;

    Ok(())
}

pub async fn get_one<T>(coll: &Collection<T>, filter: Document) -> RepoResult<T>
where T: Sync + Send + Unpin + DeserializeOwned {
    coll.find_one(filter, None)
        .instrument(tracing::trace_span!("find_one"))
        .await
        .let_(convert_repo_err)?
        .let_(convert_404_or)
}

pub async fn get_many<T>(
    coll: &Collection<T>,
    filter: Document,
    options: impl Into<Option<FindOptions>>,
) -> RepoResult<Vec<T>>
where
    T: Sync + Send + Unpin + DeserializeOwned,
{
    coll.find(filter, options)
        .instrument(tracing::trace_span!("find"))
        .await
        .let_(convert_repo_err)?
        .try_collect::<Vec<_>>()
        .await
        .let_(convert_repo_err)
}

pub async fn count<T>(coll: &Collection<T>, filter: Document) -> RepoResult<u64> {
    coll.count_documents(filter, None)
        .instrument(tracing::trace_span!("count_documents"))
        .await
        .let_(convert_repo_err)
}

/// Applies `update` to the document matching `filter` and returns the document afterwards.
pub async fn update_and_get<T>(
    coll: &Collection<T>,
    filter: Document,
    update: Document,
) -> RepoResult<T>
where
    T: Sync + Send + Unpin + DeserializeOwned,
{
    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();

    coll.find_one_and_update(filter, update, options)
        .instrument(tracing::trace_span!("find_one_and_update"))
        .await
        .let_(convert_repo_err)?
        .let_(convert_404_or)
}

/// Toggles `user` in the vote array `name`, keeping `{name}_size` in step.
/// Returns `true` when the vote was added.
pub async fn toggle_vote<T>(
    name: &str,
    coll: &Collection<T>,
    id: &str,
    user: &str,
    at: &str,
) -> RepoResult<bool> {
    let member = format!("{}.user", name);
    let size = format!("{}_size", name);

    let pulled = coll
        .update_one(
            doc! { "id": id, member.as_str(): user },
            doc! {
                "$pull": { name: { "user": user } },
                "$inc": { size.as_str(): -1 }
            },
            None,
        )
        .instrument(tracing::trace_span!("update_one"))
        .await
        .let_(convert_repo_err)?;

    if pulled.modified_count.let_(to_bool) {
        return Ok(false);
    }

    let pushed = coll
        .update_one(
            doc! { "id": id, member.as_str(): { "$ne": user } },
            doc! {
                "$push": { name: { "user": user, "created_at": at } },
                "$inc": { size.as_str(): 1 }
            },
            None,
        )
        .instrument(tracing::trace_span!("update_one"))
        .await
        .let_(convert_repo_err)?;

    if pushed.matched_count.let_(to_bool) {
        return Ok(true);
    }

    // someone else added the same vote in between, or the document is gone
    match count(coll, doc! { "id": id }).await?.let_(to_bool) {
        true => Ok(false),
        false => Err(RepositoryError::NotFound),
    }
}
