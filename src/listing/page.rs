//! Page assembly shared by both listing protocols

use super::prefix::common_prefix;
use crate::catalog::{CatalogSnapshot, ObjectRecord};

/// Where a page starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resume<'c> {
    /// From the first matching key
    Start,
    /// Strictly after a client-supplied key. Keys past it still group, so a
    /// common prefix whose members straddle the key is reported.
    AfterKey(&'c str),
    /// Strictly after an entry (key or common prefix) a previous page
    /// emitted; that common prefix is not reported again.
    AfterEntry(&'c str),
}

impl<'c> Resume<'c> {
    fn cursor(&self) -> Option<&'c str> {
        match *self {
            Resume::Start => None,
            Resume::AfterKey(key) => Some(key),
            Resume::AfterEntry(entry) => Some(entry),
        }
    }

    fn already_emitted(&self, group: &str) -> bool {
        matches!(*self, Resume::AfterEntry(entry) if entry == group)
    }
}

/// One window over the entry stream of a snapshot.
///
/// Entries are direct objects and common prefixes merged in ascending order;
/// a key that falls under a common prefix is only represented by it.
#[derive(Debug, Default)]
pub(crate) struct Page<'a> {
    pub contents: Vec<&'a ObjectRecord>,
    pub common_prefixes: Vec<String>,
    pub is_truncated: bool,
    /// Last entry emitted, the resume point for the next page
    pub last_entry: Option<String>,
}

/// Walk the entries of `snapshot` from `resume` and collect at most
/// `max_entries` of them (`None` is unbounded).
pub(crate) fn collect_page<'a>(
    snapshot: &'a CatalogSnapshot,
    prefix: &str,
    delimiter: Option<&str>,
    resume: Resume<'_>,
    max_entries: Option<usize>,
) -> Page<'a> {
    let mut page = Page::default();
    if max_entries == Some(0) {
        return page;
    }

    let full = |page: &Page<'_>| {
        max_entries.is_some_and(|max| page.contents.len() + page.common_prefixes.len() >= max)
    };

    for record in snapshot.scan(prefix, resume.cursor()) {
        let grouped = delimiter.and_then(|d| common_prefix(record.key(), prefix, d));

        match grouped {
            Some(group) => {
                // Keys sharing a common prefix are contiguous in key order
                if page.common_prefixes.last().map(String::as_str) == Some(group) {
                    continue;
                }
                if resume.already_emitted(group) {
                    continue;
                }
                if full(&page) {
                    page.is_truncated = true;
                    break;
                }
                page.common_prefixes.push(group.to_string());
                page.last_entry = Some(group.to_string());
            }
            None => {
                if full(&page) {
                    page.is_truncated = true;
                    break;
                }
                page.contents.push(record);
                page.last_entry = Some(record.key().to_string());
            }
        }
    }

    page
}
