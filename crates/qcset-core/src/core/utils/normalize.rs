use indexmap::IndexMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Duplicate key '{key}' (keywords are case-insensitive)")]
pub struct DuplicateKeyError {
    pub key: String,
}

/// Normalizes a single keyword: surrounding whitespace is dropped and the
/// result is lower-cased.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Lower-cases every key of a caller-supplied mapping, preserving entry order.
///
/// Fails if two input keys normalize to the same string (e.g. `"METHOD"` and
/// `"method"`); values are passed through untouched.
pub fn lower_and_check_unique<K, V, I>(entries: I) -> Result<IndexMap<String, V>, DuplicateKeyError>
where
    K: AsRef<str>,
    I: IntoIterator<Item = (K, V)>,
{
    let mut normalized = IndexMap::new();
    for (key, value) in entries {
        let key = normalize_key(key.as_ref());
        if normalized.contains_key(&key) {
            return Err(DuplicateKeyError { key });
        }
        normalized.insert(key, value);
    }
    Ok(normalized)
}
