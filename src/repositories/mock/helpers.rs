use core::cmp::Ordering;

use super::super::{Page, RepositoryError, Result as RepoResult};

pub fn find_mut<T, P>(v: &mut [T], predicate: P) -> RepoResult<&mut T>
where
    T: ::core::fmt::Debug,
    P: FnMut(&&mut T) -> bool,
{
    let mut res = v.iter_mut().filter(predicate).collect::<Vec<_>>();

    tracing::trace!("found - {:?}", res);

    match res.len() {
        0 => Err(RepositoryError::NotFound),
        1 => Ok(res.remove(0)),
        i => Err(RepositoryError::NoUnique { matched: i as u32 }),
    }
}

pub fn find_ref<T, P>(v: &[T], predicate: P) -> RepoResult<&T>
where
    T: ::core::fmt::Debug,
    P: FnMut(&&T) -> bool,
{
    let mut res = v.iter().filter(predicate).collect::<Vec<_>>();

    tracing::trace!("found - {:?}", res);

    match res.len() {
        0 => Err(RepositoryError::NotFound),
        1 => Ok(res.remove(0)),
        i => Err(RepositoryError::NoUnique { matched: i as u32 }),
    }
}

pub fn remove_one<T, P>(v: &mut Vec<T>, predicate: P) -> RepoResult<T>
where P: Fn(&T) -> bool {
    let mut indexes = v
        .iter()
        .enumerate()
        .filter_map(|(i, t)| match predicate(t) {
            true => Some(i),
            false => None,
        })
        .collect::<Vec<_>>();

    match indexes.len() {
        0 => Err(RepositoryError::NotFound),
        1 => Ok(v.remove(indexes.remove(0))),
        i => Err(RepositoryError::NoUnique { matched: i as u32 }),
    }
}

pub fn sort_and_page<T, F>(mut items: Vec<T>, compare: F, ascending: bool, page: Page) -> Vec<T>
where F: Fn(&T, &T) -> Ordering {
    items.sort_by(|a, b| match ascending {
        true => compare(a, b),
        false => compare(b, a),
    });

    items
        .into_iter()
        .skip(page.skip.min(usize::MAX as u64) as usize)
        .take(page.limit.min(usize::MAX as u64) as usize)
        .collect()
}
