use anyhow::anyhow;
use mongodb::error::Result as MongoResult;

use super::super::StdResult;
use super::{RepositoryError, Result as RepoResult};

pub fn convert_repo_err<T, E>(result: StdResult<T, E>) -> RepoResult<T>
where E: Sync + Send + ::std::error::Error + 'static {
    result.map_err(|e| RepositoryError::Internal(anyhow!(e)))
}

/// `Ok(false)` on a duplicate key write error, which is how unique indexes report clashes.
pub fn try_unique_check<T>(result: MongoResult<T>) -> RepoResult<bool> {
    let e = match result {
        Ok(_) => return Ok(true),
        Err(e) => e,
    };

    let duplicated = matches!(
        *e.kind,
        ::mongodb::error::ErrorKind::Write(::mongodb::error::WriteFailure::WriteError(ref w))
            if w.code == 11000
    );

    match duplicated {
        true => Ok(false),
        false => Err(RepositoryError::Internal(anyhow!(e))),
    }
}

pub fn convert_404_or<T>(option: Option<T>) -> RepoResult<T> {
    match option {
        Some(t) => Ok(t),
        None => Err(RepositoryError::NotFound),
    }
}

/// Reads a count taken on a unique key. Anything above one means the index is missing.
pub fn to_bool<N>(number: N) -> bool
where N: ::core::convert::TryInto<i8> + ::core::fmt::Debug + Clone {
    match ::core::convert::TryInto::<i8>::try_into(number.clone()) {
        Ok(0) => false,
        Ok(1) => true,
        _ => {
            tracing::warn!("expected 0 or 1, found: {:?}", number);
            true
        },
    }
}
