//! Common-prefix ("folder") extraction

/// Common prefix that groups `key` under `delimiter`, if any.
///
/// The part of `key` after `prefix` is searched for the first occurrence of
/// `delimiter`; the result is `prefix` plus everything up to and including
/// that occurrence. `key` must start with `prefix`.
pub fn common_prefix<'k>(key: &'k str, prefix: &str, delimiter: &str) -> Option<&'k str> {
    if delimiter.is_empty() {
        return None;
    }

    let rest = key.strip_prefix(prefix)?;
    rest.find(delimiter)
        .map(|pos| &key[..prefix.len() + pos + delimiter.len()])
}
