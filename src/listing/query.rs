//! Listing request parameters
//!
//! Wire parameters for both protocols and their validation into a
//! [`ListingQuery`].

use serde::Deserialize;

use crate::config::ListingConfig;
use crate::error::{Error, Result};

/// Default page size when a request carries no `max-keys`
pub const DEFAULT_MAX_KEYS: usize = 1000;

/// The only accepted `list-type` for the grouped list
pub const LIST_TYPE_V2: &str = "2";

/// Page size bounds applied to incoming requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingLimits {
    pub default_max_keys: usize,
    pub max_keys_limit: usize,
}

impl Default for ListingLimits {
    fn default() -> Self {
        Self {
            default_max_keys: DEFAULT_MAX_KEYS,
            max_keys_limit: DEFAULT_MAX_KEYS,
        }
    }
}

impl From<&ListingConfig> for ListingLimits {
    fn from(config: &ListingConfig) -> Self {
        Self {
            default_max_keys: config.default_max_keys,
            max_keys_limit: config.max_keys_limit,
        }
    }
}

/// Query string of the simple (OCI-style) list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimpleListParams {
    pub prefix: Option<String>,
    pub delimiter: Option<String>,
    pub limit: Option<String>,
    #[serde(rename = "startAfter")]
    pub start_after: Option<String>,
}

/// Query string of the grouped (S3 ListObjectsV2) list
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GroupedListParams {
    pub list_type: Option<String>,
    pub prefix: Option<String>,
    pub delimiter: Option<String>,
    pub max_keys: Option<String>,
    pub continuation_token: Option<String>,
    pub start_after: Option<String>,
}

/// Validated listing parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    /// Literal byte prefix; `None` matches everything
    pub prefix: Option<String>,
    /// Grouping separator as sent; empty means no grouping
    pub delimiter: Option<String>,
    /// Entries per page for the grouped list
    pub max_keys: usize,
    /// Opaque cursor from a previous grouped page
    pub continuation_token: Option<String>,
    /// Resume strictly after this key, as sent; empty means from the start
    pub start_after: Option<String>,
    /// Entries per page for the simple list; `None` is unbounded
    pub limit: Option<usize>,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            prefix: None,
            delimiter: None,
            max_keys: DEFAULT_MAX_KEYS,
            continuation_token: None,
            start_after: None,
            limit: None,
        }
    }
}

impl ListingQuery {
    /// Validate simple-list parameters
    pub fn from_simple(params: &SimpleListParams, limits: &ListingLimits) -> Result<Self> {
        let limit = match params.limit.as_deref() {
            None => None,
            Some(raw) => match parse_count("limit", raw)? {
                0 => return Err(Error::InvalidArgument("limit must be at least 1".into())),
                n => Some(n.min(limits.max_keys_limit)),
            },
        };

        Ok(Self {
            prefix: params.prefix.clone(),
            delimiter: params.delimiter.clone(),
            max_keys: limits.default_max_keys,
            continuation_token: None,
            start_after: params.start_after.clone(),
            limit,
        })
    }

    /// Validate grouped-list parameters.
    ///
    /// `list-type` is checked before anything else so a request without it is
    /// always rejected as `InvalidRequest`.
    pub fn from_grouped(params: &GroupedListParams, limits: &ListingLimits) -> Result<Self> {
        if params.list_type.as_deref() != Some(LIST_TYPE_V2) {
            return Err(Error::InvalidRequest(
                "ListObjectsV2 requires the list-type=2 query parameter".into(),
            ));
        }

        let max_keys = match params.max_keys.as_deref() {
            None => limits.default_max_keys,
            Some(raw) => parse_count("max-keys", raw)?.min(limits.max_keys_limit),
        };

        Ok(Self {
            prefix: params.prefix.clone(),
            delimiter: params.delimiter.clone(),
            max_keys,
            continuation_token: params.continuation_token.clone(),
            start_after: params.start_after.clone(),
            limit: None,
        })
    }

    /// Prefix to filter on, empty when unset
    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or("")
    }

    /// Delimiter to group on, `None` when unset or empty
    pub fn delimiter(&self) -> Option<&str> {
        self.delimiter.as_deref().filter(|d| !d.is_empty())
    }

    /// Key to start after, `None` when unset or empty
    pub fn start_after(&self) -> Option<&str> {
        self.start_after.as_deref().filter(|s| !s.is_empty())
    }
}

/// Parse a non-negative base-10 count
fn parse_count(name: &str, raw: &str) -> Result<usize> {
    let value: i64 = raw.parse().map_err(|_| {
        Error::InvalidArgument(format!(
            "Provided {} not an integer or within integer range: {:?}",
            name, raw
        ))
    })?;

    if value < 0 {
        return Err(Error::InvalidArgument(format!(
            "{} must be a non-negative integer, got {}",
            name, value
        )));
    }

    Ok(usize::try_from(value).unwrap_or(usize::MAX))
}
