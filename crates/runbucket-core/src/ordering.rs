//! Deterministic ordering of listed artifacts.

use crate::artifacts::RunConfiguration;
use crate::error::{RetrievalError, RetrievalResult};
use runbucket_abstraction::ObjectRef;
use std::collections::HashMap;

/// Stable ascending sort by `lesion_start_epoch`.
pub fn sort_configs_by_lesion_onset(mut configs: Vec<RunConfiguration>) -> Vec<RunConfiguration> {
    configs.sort_by_key(|c| c.lesion_start_epoch);
    configs
}

/// Parses the epoch index out of an object name.
///
/// The base name's extension separator is treated as a field separator and the
/// second `_`-separated field must be an unsigned integer, so
/// `run/id/states/test/production/epoch_0012.pkl` yields `12`.
pub fn epoch_index(object_name: &str) -> RetrievalResult<u32> {
    let base = object_name.rsplit('/').next().unwrap_or(object_name);
    let fields = base.replace('.', "_");
    let field = fields
        .split('_')
        .nth(1)
        .ok_or_else(|| RetrievalError::malformed(object_name, "no epoch field"))?;
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RetrievalError::malformed(
            object_name,
            format!("epoch field '{field}' is not an integer"),
        ));
    }
    field
        .parse()
        .map_err(|e| RetrievalError::malformed(object_name, format!("epoch field '{field}': {e}")))
}

/// Pairs each object with its epoch index, in input order.
///
/// Fails on the first unparseable name, and when two objects under the same
/// instance prefix carry the same index.
pub fn index_epochs(objects: Vec<ObjectRef>) -> RetrievalResult<Vec<(u32, ObjectRef)>> {
    let mut seen: HashMap<(String, u32), String> = HashMap::with_capacity(objects.len());
    let mut indexed = Vec::with_capacity(objects.len());

    for object in objects {
        let index = epoch_index(&object.name)?;
        let key = (format!("{}/{}", object.bucket_name, object.prefix()), index);
        if let Some(first) = seen.insert(key, object.name.clone()) {
            return Err(RetrievalError::DuplicateEpoch { index, first, second: object.name });
        }
        indexed.push((index, object));
    }

    Ok(indexed)
}

/// Stable ascending sort of epoch snapshot objects by parsed epoch index.
pub fn sort_epochs(objects: Vec<ObjectRef>) -> RetrievalResult<Vec<ObjectRef>> {
    let mut indexed = index_epochs(objects)?;
    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, object)| object).collect())
}
