//! Search configuration.

use serde::{Deserialize, Serialize};

use crate::errors::SearchError;

/// Page size used when a request omits it and [`SearchConfig::require_page_size`] is off
pub const DEFAULT_PAGE_SIZE: u64 = 25;

/// Limits applied to every search request.
///
/// # Example
///
/// ```json
/// {
///   "max_page_size": 500,
///   "default_page_size": 50,
///   "require_page_size": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Largest page a client may request. `None` means unbounded.
    #[serde(default)]
    pub max_page_size: Option<u64>,

    /// Default: `25`
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,

    /// Reject requests without a page size instead of using `default_page_size`.
    ///
    /// Default: `true`
    #[serde(default = "default_require_page_size")]
    pub require_page_size: bool,
}

const fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

const fn default_require_page_size() -> bool {
    true
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_page_size: None,
            default_page_size: default_page_size(),
            require_page_size: default_require_page_size(),
        }
    }
}

impl SearchConfig {
    /// Parse a configuration document; absent keys take their defaults.
    ///
    /// # Errors
    ///
    /// `ArgumentInvalid` when the document is not valid JSON or a value has the wrong type.
    pub fn from_json_str(json: &str) -> Result<Self, SearchError> {
        serde_json::from_str(json).map_err(|err| {
            SearchError::argument_invalid("config", "Invalid search configuration")
                .with_internal("error", err)
        })
    }

    #[must_use]
    pub const fn with_max_page_size(mut self, max_page_size: u64) -> Self {
        self.max_page_size = Some(max_page_size);
        self
    }

    /// Lenient variant: requests without a page size get `default_page_size`.
    #[must_use]
    pub const fn lenient(mut self) -> Self {
        self.require_page_size = false;
        self
    }

    /// Effective page size for a request.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the size is missing (and required), zero, or above
    /// `max_page_size`.
    pub fn page_size(&self, requested: Option<u64>) -> Result<u64, SearchError> {
        let size = match requested {
            Some(size) => size,
            None if self.require_page_size => {
                return Err(SearchError::invalid_argument(
                    "page_size",
                    "Page size is required",
                ));
            }
            None => self.default_page_size,
        };

        if size == 0 {
            return Err(
                SearchError::invalid_argument("page_size", "Page size must be at least 1")
                    .with_detail("page_size", size),
            );
        }
        if let Some(max) = self.max_page_size
            && size > max
        {
            return Err(SearchError::invalid_argument(
                "page_size",
                format!("Page size must not exceed {max}"),
            )
            .with_detail("page_size", size)
            .with_detail("max_page_size", max));
        }
        Ok(size)
    }
}
