use std::collections::HashMap;
use std::hash::Hash;

pub mod artwork;
pub mod comment;
pub mod user;

/// Validates that a retrieval designed to fetch one element actually does contain only one element.
fn single<T>(mut batch: Vec<T>) -> diesel::QueryResult<T> {
    match (batch.pop(), batch.is_empty()) {
        (Some(value), true) => Ok(value),
        _ => Err(diesel::result::Error::NotFound),
    }
}

/// Maps each resource to the value paired with its key in `pairs`.
/// Resources without an entry in `pairs` get `V::default()`.
///
/// Several resources may share a key, like artworks made by the same creator.
fn collect_like<R, K, V, F>(resources: &[R], pairs: Vec<(K, V)>, get_key: F) -> Vec<V>
where
    K: Eq + Hash,
    V: Clone + Default,
    F: Fn(&R) -> K,
{
    let table: HashMap<K, V> = pairs.into_iter().collect();
    resources
        .iter()
        .map(|resource| table.get(&get_key(resource)).cloned().unwrap_or_default())
        .collect()
}
