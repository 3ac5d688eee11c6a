//! # searchcrate
//!
//! Filtering, dynamic sorting and pagination for Sea-ORM queries.
//!
//! A search request carries typed filters, an ordered list of sort keys and
//! page coordinates. Filters are validated and translated into `AND`-combined
//! predicates, sort keys are resolved through a per-entity [`SortRegistry`],
//! and the result is sliced into a [`PagedResult`] envelope. All validation
//! happens before any database access.

pub mod conditions;
pub mod config;
pub mod errors;
pub mod filter;
pub mod pagination;
pub mod search;
pub mod sort;

pub use conditions::{FilterBinding, FilterSet, apply_filters, build_condition, translate};
pub use config::SearchConfig;
pub use errors::{ErrorKind, SearchError};
pub use filter::{
    BooleanFilter, BooleanOperator, DateFilter, DateTimeFilter, Filter, FilterKind, IdListFilter,
    IdRangeFilter, MAX_FILTER_VALUE_LENGTH, NumberFilter, RangeOperator, TextFilter, TextOperator,
    end_of_day, start_of_day,
};
pub use pagination::{PageRequest, PagedResult, content_range, paginate, total_pages};
pub use search::{SearchRequest, Searchable, search_with};
pub use sort::{SortDirection, SortRegistry, SortRequest, parse_sort_param};

// Re-exported so implementors of `Searchable` don't need a direct dependency
pub use async_trait::async_trait;
