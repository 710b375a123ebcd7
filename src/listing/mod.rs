//! Listing Engine
//!
//! Stateless query logic over a catalog snapshot. Two result shapes are
//! produced:
//!
//! - [`SimpleListing`]: OCI-style list, prefix filtered, optionally grouped
//!   and paged with `limit`/`startAfter`
//! - [`BucketListing`]: S3 ListObjectsV2, with delimiter grouping and
//!   continuation-token pagination
//!
//! Every call reads exactly one snapshot, so concurrent catalog writes never
//! show up half way through a page.

mod page;
pub mod prefix;
mod query;
mod result;
pub mod token;

pub use query::{
    GroupedListParams, ListingLimits, ListingQuery, SimpleListParams, DEFAULT_MAX_KEYS,
    LIST_TYPE_V2,
};
pub use result::{BucketListing, SimpleListing};

use std::sync::Arc;

use tracing::debug;

use crate::catalog::{Catalog, CatalogSnapshot};
use crate::error::Result;
use page::{collect_page, Resume};

/// Runs listing queries against a catalog
#[derive(Clone)]
pub struct ListingEngine {
    catalog: Arc<dyn Catalog>,
    limits: ListingLimits,
}

impl ListingEngine {
    /// Create an engine over `catalog`
    pub fn new(catalog: Arc<dyn Catalog>, limits: ListingLimits) -> Self {
        Self { catalog, limits }
    }

    /// The catalog this engine reads
    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// Simple (OCI-style) list
    pub fn list_simple(&self, params: &SimpleListParams) -> Result<SimpleListing> {
        let query = ListingQuery::from_simple(params, &self.limits)?;
        Ok(simple_list(&self.catalog.snapshot(), &query))
    }

    /// Grouped (S3 ListObjectsV2) list of `bucket`
    pub fn list_grouped(&self, bucket: &str, params: &GroupedListParams) -> Result<BucketListing> {
        let query = ListingQuery::from_grouped(params, &self.limits)?;
        grouped_list(&self.catalog.snapshot(), bucket, &query)
    }
}

/// Simple list over a snapshot.
///
/// Without `limit` every match after `start_after` is returned and the
/// result is not truncated. `start_after` is treated as the `nextStartWith`
/// of an earlier page, so a common prefix equal to it is not repeated.
pub fn simple_list(snapshot: &CatalogSnapshot, query: &ListingQuery) -> SimpleListing {
    let resume = match query.start_after() {
        Some(entry) => Resume::AfterEntry(entry),
        None => Resume::Start,
    };
    let page = collect_page(
        snapshot,
        query.prefix(),
        query.delimiter(),
        resume,
        query.limit,
    );

    debug!(
        "Simple list prefix={:?}: {} objects, {} prefixes, truncated={}",
        query.prefix(),
        page.contents.len(),
        page.common_prefixes.len(),
        page.is_truncated
    );

    let prefixes = query.delimiter().map(|_| page.common_prefixes);
    let next_start_with = if page.is_truncated { page.last_entry } else { None };

    SimpleListing::new(
        page.contents.into_iter().cloned().collect(),
        prefixes,
        next_start_with,
    )
}

/// Grouped list over a snapshot.
///
/// A continuation token takes precedence over `start_after`; either way the
/// page starts strictly after the cursor. Keys after `start_after` still
/// group, while a token resumes past the common prefix it ended on. Fails
/// with `InvalidArgument` when the token cannot be decoded.
pub fn grouped_list(
    snapshot: &CatalogSnapshot,
    bucket: &str,
    query: &ListingQuery,
) -> Result<BucketListing> {
    let last_entry = match query.continuation_token.as_deref() {
        Some(token) => Some(token::decode(token)?),
        None => None,
    };
    let resume = match (last_entry.as_deref(), query.start_after()) {
        (Some(entry), _) => Resume::AfterEntry(entry),
        (None, Some(key)) => Resume::AfterKey(key),
        (None, None) => Resume::Start,
    };

    let page = collect_page(
        snapshot,
        query.prefix(),
        query.delimiter(),
        resume,
        Some(query.max_keys),
    );

    debug!(
        "ListObjectsV2 bucket={} prefix={:?} delimiter={:?}: {} contents, {} prefixes, truncated={}",
        bucket,
        query.prefix(),
        query.delimiter(),
        page.contents.len(),
        page.common_prefixes.len(),
        page.is_truncated
    );

    let next_continuation_token = match (&page.last_entry, page.is_truncated) {
        (Some(last), true) => Some(token::encode(last)),
        _ => None,
    };

    Ok(BucketListing {
        name: bucket.to_string(),
        prefix: query.prefix().to_string(),
        delimiter: query.delimiter.clone(),
        max_keys: query.max_keys,
        is_truncated: page.is_truncated,
        continuation_token: query.continuation_token.clone(),
        next_continuation_token,
        start_after: query.start_after.clone(),
        contents: page.contents.into_iter().cloned().collect(),
        common_prefixes: page.common_prefixes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{demo_records, MemoryCatalog, ObjectRecord};
    use crate::error::Error;

    fn snapshot(keys: &[&str]) -> CatalogSnapshot {
        CatalogSnapshot::from_records(
            keys.iter().map(|k| ObjectRecord::sized(*k, k.len() as u64).unwrap()),
        )
        .unwrap()
    }

    fn demo_snapshot() -> CatalogSnapshot {
        CatalogSnapshot::from_records(demo_records().unwrap()).unwrap()
    }

    fn keys(records: &[ObjectRecord]) -> Vec<&str> {
        records.iter().map(|r| r.key()).collect()
    }

    fn v2(prefix: Option<&str>, delimiter: Option<&str>, max_keys: usize) -> ListingQuery {
        ListingQuery {
            prefix: prefix.map(str::to_string),
            delimiter: delimiter.map(str::to_string),
            max_keys,
            ..Default::default()
        }
    }

    #[test]
    fn test_simple_list_prefix_subset() {
        let snap = demo_snapshot();
        let all_keys: Vec<&str> = snap.iter().map(|r| r.key()).collect();

        for prefix in ["", "logs/", "logs/a", "data/", "images/logo.png", "zzz", "l"] {
            let query = ListingQuery {
                prefix: Some(prefix.to_string()),
                ..Default::default()
            };
            let listing = simple_list(&snap, &query);
            let expected: Vec<&str> = all_keys
                .iter()
                .copied()
                .filter(|k| k.starts_with(prefix))
                .collect();
            assert_eq!(keys(listing.objects()), expected, "prefix {prefix:?}");
            assert!(!listing.is_truncated());
            assert!(listing.prefixes().is_none());
        }

        let full = simple_list(&snap, &ListingQuery::default());
        assert_eq!(
            keys(full.objects()),
            vec!["data/config.json", "images/logo.png", "logs/app.log", "logs/error.log"]
        );
    }

    #[test]
    fn test_simple_list_seed_data_prefix() {
        let query = ListingQuery {
            prefix: Some("data/".into()),
            ..Default::default()
        };
        let listing = simple_list(&demo_snapshot(), &query);
        assert_eq!(listing.objects().len(), 1);
        assert_eq!(listing.objects()[0].key(), "data/config.json");
        assert_eq!(listing.objects()[0].size(), Some(256));
    }

    #[test]
    fn test_simple_list_paging() {
        let snap = snapshot(&["a", "b", "c", "d", "e"]);
        let mut seen = Vec::new();
        let mut start_after = None;

        loop {
            let query = ListingQuery {
                limit: Some(2),
                start_after: start_after.clone(),
                ..Default::default()
            };
            let listing = simple_list(&snap, &query);
            seen.extend(listing.objects().iter().map(|r| r.key().to_string()));
            match listing.next_start_with() {
                Some(next) => start_after = Some(next.to_string()),
                None => break,
            }
        }

        assert_eq!(seen, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_simple_list_delimiter() {
        let query = ListingQuery {
            delimiter: Some("/".into()),
            ..Default::default()
        };
        let listing = simple_list(&snapshot(&["top.txt", "a/1", "a/2", "b/1"]), &query);
        assert_eq!(keys(listing.objects()), vec!["top.txt"]);
        assert_eq!(listing.prefixes().unwrap(), ["a/", "b/"]);
    }

    #[test]
    fn test_grouped_without_delimiter() {
        let listing = grouped_list(&demo_snapshot(), "bucket", &v2(Some("logs/"), None, 1000)).unwrap();
        assert_eq!(keys(listing.contents()), vec!["logs/app.log", "logs/error.log"]);
        assert!(listing.common_prefixes().is_empty());
        assert_eq!(listing.key_count(), 2);
        assert!(!listing.is_truncated());
        assert!(listing.next_continuation_token().is_none());
    }

    #[test]
    fn test_grouped_logs_folder() {
        let snap = snapshot(&["logs/app.log", "logs/error.log", "logs/sub/x.txt", "data/config.json"]);
        let listing = grouped_list(&snap, "bucket", &v2(Some("logs/"), Some("/"), 1000)).unwrap();

        assert_eq!(keys(listing.contents()), vec!["logs/app.log", "logs/error.log"]);
        assert_eq!(listing.common_prefixes(), ["logs/sub/"]);
        assert_eq!(listing.key_count(), 3);
        assert_eq!(listing.prefix(), "logs/");
        assert_eq!(listing.delimiter(), Some("/"));
        assert_eq!(listing.name(), "bucket");
    }

    #[test]
    fn test_grouped_root_folders() {
        let listing = grouped_list(&demo_snapshot(), "b", &v2(None, Some("/"), 1000)).unwrap();
        assert!(listing.contents().is_empty());
        assert_eq!(listing.common_prefixes(), ["data/", "images/", "logs/"]);
        assert_eq!(listing.key_count(), 3);
        assert_eq!(listing.prefix(), "");
    }

    #[test]
    fn test_continuation_roundtrip_no_gaps() {
        let all = [
            "a/1", "a/2", "a/3", "b", "c/x/1", "c/y", "d", "e/", "e/f", "f", "g/h/i",
        ];
        let snap = snapshot(&all);

        for delimiter in [None, Some("/")] {
            let unpaged = grouped_list(&snap, "b", &v2(None, delimiter, 1000)).unwrap();
            let mut expected: Vec<String> = keys(unpaged.contents())
                .into_iter()
                .map(str::to_string)
                .chain(unpaged.common_prefixes().iter().cloned())
                .collect();
            expected.sort();

            for page_size in 1..=4 {
                let mut seen = Vec::new();
                let mut token: Option<String> = None;
                let mut pages = 0;

                loop {
                    let mut query = v2(None, delimiter, page_size);
                    query.continuation_token = token.clone();
                    let listing = grouped_list(&snap, "b", &query).unwrap();
                    assert!(listing.key_count() <= page_size);
                    assert_eq!(listing.continuation_token(), token.as_deref());

                    let mut page: Vec<String> = keys(listing.contents())
                        .into_iter()
                        .map(str::to_string)
                        .chain(listing.common_prefixes().iter().cloned())
                        .collect();
                    page.sort();
                    seen.extend(page);
                    pages += 1;

                    if listing.is_truncated() {
                        token = listing.next_continuation_token().map(str::to_string);
                        assert!(token.is_some());
                    } else {
                        assert!(listing.next_continuation_token().is_none());
                        break;
                    }
                    assert!(pages <= all.len());
                }

                assert_eq!(seen, expected, "delimiter {delimiter:?} page size {page_size}");
            }
        }
    }

    #[test]
    fn test_start_after_skips_keys() {
        let mut query = v2(Some("logs/"), None, 1000);
        query.start_after = Some("logs/app.log".into());
        let listing = grouped_list(&demo_snapshot(), "b", &query).unwrap();
        assert_eq!(keys(listing.contents()), vec!["logs/error.log"]);
        assert_eq!(listing.start_after(), Some("logs/app.log"));
    }

    #[test]
    fn test_start_after_inside_group() {
        let snap = snapshot(&["a/1", "a/2", "b"]);
        let mut query = v2(None, Some("/"), 1000);
        query.start_after = Some("a/1".into());

        let listing = grouped_list(&snap, "b", &query).unwrap();
        assert_eq!(keys(listing.contents()), vec!["b"]);
        assert_eq!(listing.common_prefixes(), ["a/"]);
        assert_eq!(listing.key_count(), 2);
    }

    #[test]
    fn test_start_after_missing_key_with_delimiter() {
        let snap = snapshot(&["a/1", "a/3", "b/1", "c"]);
        let mut query = v2(None, Some("/"), 1000);

        // between two members of a/
        query.start_after = Some("a/2".into());
        let listing = grouped_list(&snap, "b", &query).unwrap();
        assert_eq!(listing.common_prefixes(), ["a/", "b/"]);
        assert_eq!(keys(listing.contents()), vec!["c"]);

        // past every member of a/
        query.start_after = Some("a/9".into());
        let listing = grouped_list(&snap, "b", &query).unwrap();
        assert_eq!(listing.common_prefixes(), ["b/"]);
        assert_eq!(keys(listing.contents()), vec!["c"]);

        // equal to the group name, whose members all sort after it
        query.start_after = Some("b/".into());
        let listing = grouped_list(&snap, "b", &query).unwrap();
        assert_eq!(listing.common_prefixes(), ["b/"]);
        assert_eq!(keys(listing.contents()), vec!["c"]);
    }

    #[test]
    fn test_start_after_inside_group_then_paged() {
        let snap = snapshot(&["a/1", "a/2", "b", "c/1", "c/2"]);
        let mut query = v2(None, Some("/"), 1);
        query.start_after = Some("a/1".into());

        let first = grouped_list(&snap, "b", &query).unwrap();
        assert_eq!(first.common_prefixes(), ["a/"]);
        assert!(first.is_truncated());

        let mut seen = vec!["a/".to_string()];
        let mut token = first.next_continuation_token().map(str::to_string);
        while let Some(t) = token {
            let mut next = v2(None, Some("/"), 1);
            next.start_after = Some("a/1".into());
            next.continuation_token = Some(t);
            let listing = grouped_list(&snap, "b", &next).unwrap();
            seen.extend(keys(listing.contents()).into_iter().map(str::to_string));
            seen.extend(listing.common_prefixes().iter().cloned());
            token = listing.next_continuation_token().map(str::to_string);
        }
        assert_eq!(seen, vec!["a/", "b", "c/"]);
    }

    #[test]
    fn test_common_prefixes_independent_of_insert_order() {
        let keys_in_order = ["b/2", "a/1", "c", "b/1", "a/2/x", "d/", "a/2/y"];
        let mut reversed = keys_in_order;
        reversed.reverse();
        let mut rotated = keys_in_order;
        rotated.rotate_left(3);

        let query = v2(None, Some("/"), 1000);
        let expected = grouped_list(&snapshot(&keys_in_order), "b", &query).unwrap();
        assert_eq!(expected.common_prefixes(), ["a/", "b/", "d/"]);

        for order in [reversed, rotated] {
            let snap = snapshot(&order);
            let first = grouped_list(&snap, "b", &query).unwrap();
            let second = grouped_list(&snap, "b", &query).unwrap();
            assert_eq!(first.common_prefixes(), expected.common_prefixes());
            assert_eq!(first, second);

            let simple = ListingQuery {
                delimiter: Some("/".into()),
                ..Default::default()
            };
            let listing = simple_list(&snap, &simple);
            assert_eq!(listing.prefixes().unwrap(), expected.common_prefixes());
        }
    }

    #[test]
    fn test_grouping_a_common_prefix_yields_itself() {
        // listing under an emitted group reports the next level, never the group again
        let snap = snapshot(&["a/b/1", "a/b/2", "a/c"]);
        let top = grouped_list(&snap, "b", &v2(None, Some("/"), 1000)).unwrap();
        assert_eq!(top.common_prefixes(), ["a/"]);

        let nested = grouped_list(&snap, "b", &v2(Some("a/"), Some("/"), 1000)).unwrap();
        assert_eq!(nested.common_prefixes(), ["a/b/"]);
        assert_eq!(keys(nested.contents()), vec!["a/c"]);

        for group in top.common_prefixes() {
            assert_eq!(prefix::common_prefix(group, "", "/"), Some(group.as_str()));
        }
    }

    #[test]
    fn test_empty_echo_fields_are_verbatim() {
        let params = GroupedListParams {
            list_type: Some("2".into()),
            delimiter: Some(String::new()),
            start_after: Some(String::new()),
            ..Default::default()
        };
        let query = ListingQuery::from_grouped(&params, &ListingLimits::default()).unwrap();
        let listing = grouped_list(&demo_snapshot(), "b", &query).unwrap();

        assert_eq!(listing.delimiter(), Some(""));
        assert_eq!(listing.start_after(), Some(""));
        assert_eq!(listing.contents().len(), 4);
        assert!(listing.common_prefixes().is_empty());
    }

    #[test]
    fn test_token_wins_over_start_after() {
        let mut query = v2(None, None, 1000);
        query.start_after = Some("zzz".into());
        query.continuation_token = Some(token::encode("data/config.json"));
        let listing = grouped_list(&demo_snapshot(), "b", &query).unwrap();
        assert_eq!(listing.contents().len(), 3);
        assert_eq!(listing.start_after(), Some("zzz"));
    }

    #[test]
    fn test_bad_token() {
        let mut query = v2(None, None, 1000);
        query.continuation_token = Some("not a token".into());
        let err = grouped_list(&demo_snapshot(), "b", &query).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_engine_reads_live_catalog() {
        let catalog = Arc::new(MemoryCatalog::with_records(demo_records().unwrap()).unwrap());
        let engine = ListingEngine::new(catalog.clone(), ListingLimits::default());

        let params = GroupedListParams {
            list_type: Some("2".into()),
            prefix: Some("logs/".into()),
            ..Default::default()
        };
        assert_eq!(engine.list_grouped("b", &params).unwrap().key_count(), 2);

        catalog.put(ObjectRecord::sized("logs/new.log", 1).unwrap()).unwrap();
        assert_eq!(engine.list_grouped("b", &params).unwrap().key_count(), 3);

        let err = engine
            .list_grouped("b", &GroupedListParams::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn test_engine_clamps_max_keys() {
        let catalog = Arc::new(MemoryCatalog::with_records(demo_records().unwrap()).unwrap());
        let limits = ListingLimits {
            default_max_keys: 2,
            max_keys_limit: 3,
        };
        let engine = ListingEngine::new(catalog, limits);

        let mut params = GroupedListParams {
            list_type: Some("2".into()),
            ..Default::default()
        };
        let listing = engine.list_grouped("b", &params).unwrap();
        assert_eq!(listing.max_keys(), 2);
        assert!(listing.is_truncated());

        params.max_keys = Some("100".into());
        let listing = engine.list_grouped("b", &params).unwrap();
        assert_eq!(listing.max_keys(), 3);
        assert_eq!(listing.key_count(), 3);
    }
}
