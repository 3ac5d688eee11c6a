//! # Dynamic Sorting
//!
//! A [`SortRegistry`] maps the sort-key names API clients may use to the columns of
//! one entity. It is built once at startup and only read afterwards, so it can live
//! in a `static`:
//!
//! ```rust,ignore
//! static AIRPORT_SORTS: LazyLock<SortRegistry<airport::Entity>> = LazyLock::new(|| {
//!     SortRegistry::new("Airport")
//!         .add("name", airport::Column::Name)
//!         .add("code", airport::Column::Code)
//!         .add("elevation", airport::Column::Elevation)
//!         .with_tiebreaker(airport::Column::Id)
//! });
//!
//! let requests = parse_sort_param("elevation_desc,name")?;
//! let query = AIRPORT_SORTS.resolve(query, &requests, |q| q.order_by_asc(airport::Column::Name))?;
//! ```
//!
//! The first request is the primary key, every following one breaks ties among
//! rows equal on all earlier keys.

use sea_orm::{EntityTrait, QueryOrder, sea_query::Order};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use utoipa::ToSchema;

use crate::errors::SearchError;

/// Longest sort parameter accepted by [`parse_sort_param`]
const MAX_SORT_PARAM_LENGTH: usize = 1_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Parse a direction, case-insensitively. Anything but `asc`/`desc` is `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if value.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl From<SortDirection> for Order {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SortDirection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid sort direction '{value}', expected ASC or DESC"))
        })
    }
}

/// One `(field, direction)` entry of a sort request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SortRequest {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortRequest {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }
}

/// Parse a sort query parameter into ordered requests.
///
/// Accepted forms:
/// - React Admin JSON array: `["name","DESC"]`
/// - JSON array of pairs: `[["name","DESC"],["code","ASC"]]`
/// - Comma list: `name,-elevation,code_desc,city.asc` (a leading `-` or a
///   `_desc`/`.desc` suffix means descending)
///
/// An empty parameter yields no requests, which makes the registry apply its
/// default ordering.
///
/// # Errors
///
/// `ArgumentInvalid` for malformed JSON or an oversized parameter.
pub fn parse_sort_param(param: &str) -> Result<Vec<SortRequest>, SearchError> {
    let param = param.trim();
    if param.len() > MAX_SORT_PARAM_LENGTH {
        return Err(SearchError::argument_invalid(
            "sort",
            format!("Sort parameter exceeds {MAX_SORT_PARAM_LENGTH} characters"),
        ));
    }
    if param.is_empty() {
        return Ok(Vec::new());
    }
    if param.starts_with('[') {
        return parse_json_sort(param);
    }

    Ok(param
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_sort_token)
        .collect())
}

fn parse_json_sort(param: &str) -> Result<Vec<SortRequest>, SearchError> {
    let invalid = |err: serde_json::Error| {
        SearchError::argument_invalid("sort", "Sort parameter is not a valid JSON sort array")
            .with_internal("error", err)
    };

    if let Ok(pairs) = serde_json::from_str::<Vec<Vec<String>>>(param) {
        return pairs.iter().map(Vec::as_slice).map(json_pair).collect();
    }
    let pair: Vec<String> = serde_json::from_str(param).map_err(invalid)?;
    if pair.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![json_pair(&pair)?])
}

fn json_pair(pair: &[String]) -> Result<SortRequest, SearchError> {
    let Some(field) = pair.first() else {
        return Err(SearchError::argument_invalid("sort", "Sort entry is missing a field name"));
    };
    let direction = match pair.get(1) {
        Some(direction) => SortDirection::parse(direction).ok_or_else(|| {
            SearchError::argument_invalid("sort", format!("Invalid sort direction '{direction}'"))
        })?,
        None => SortDirection::Asc,
    };
    Ok(SortRequest::new(field.trim(), direction))
}

fn parse_sort_token(token: &str) -> SortRequest {
    if let Some(field) = token.strip_prefix('-') {
        return SortRequest::desc(field);
    }
    if let Some(field) = token.strip_prefix('+') {
        return SortRequest::asc(field);
    }
    let lower = token.to_ascii_lowercase();
    for suffix in ["_desc", ".desc"] {
        if lower.ends_with(suffix) {
            return SortRequest::desc(&token[..token.len() - suffix.len()]);
        }
    }
    for suffix in ["_asc", ".asc"] {
        if lower.ends_with(suffix) {
            return SortRequest::asc(&token[..token.len() - suffix.len()]);
        }
    }
    SortRequest::asc(token)
}

/// A registered sort key.
#[derive(Clone, Copy)]
struct SortKey<C> {
    name: &'static str,
    column: C,
}

/// Per-entity registry of sortable fields.
pub struct SortRegistry<E: EntityTrait> {
    resource: &'static str,
    /// Keyed by lower-cased field name
    keys: BTreeMap<String, SortKey<E::Column>>,
    tiebreaker: Option<E::Column>,
}

impl<E: EntityTrait> SortRegistry<E> {
    #[must_use]
    pub fn new(resource: &'static str) -> Self {
        Self {
            resource,
            keys: BTreeMap::new(),
            tiebreaker: None,
        }
    }

    /// Register `field` as sortable by `column`.
    ///
    /// # Panics
    ///
    /// Panics when `field` is already registered. Registries are built at
    /// startup, and a duplicate key is a configuration error that must abort
    /// initialization. Use [`SortRegistry::try_add`] to handle it instead.
    #[must_use]
    pub fn add(self, field: &'static str, column: E::Column) -> Self {
        match self.try_add(field, column) {
            Ok(registry) => registry,
            Err(err) => panic!("{err}: {:?}", err.internal()),
        }
    }

    /// Register `field` as sortable by `column`.
    ///
    /// # Errors
    ///
    /// `DuplicateSortField` when `field` (compared case-insensitively) is already registered.
    pub fn try_add(mut self, field: &'static str, column: E::Column) -> Result<Self, SearchError> {
        let key = field.to_lowercase();
        if self.keys.contains_key(&key) {
            return Err(SearchError::duplicate_sort_field(self.resource, field));
        }
        self.keys.insert(key, SortKey { name: field, column });
        Ok(self)
    }

    /// Column appended as the last ordering key of every explicit sort request,
    /// unless a request already orders by it. Keeps pagination repeatable when
    /// the requested keys are not unique.
    #[must_use]
    pub fn with_tiebreaker(mut self, column: E::Column) -> Self {
        self.tiebreaker = Some(column);
        self
    }

    #[must_use]
    pub const fn resource(&self) -> &'static str {
        self.resource
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.keys.contains_key(&field.to_lowercase())
    }

    /// Registered field names, sorted.
    #[must_use]
    pub fn available_fields(&self) -> Vec<&'static str> {
        let mut fields: Vec<&'static str> = self.keys.values().map(|key| key.name).collect();
        fields.sort_unstable();
        fields
    }

    /// Order `query` by `requests`, or by `default` when there are none.
    ///
    /// Every request is checked against the registry before the query is
    /// touched.
    ///
    /// # Errors
    ///
    /// `UnsupportedSortField` naming the resource and the available fields when
    /// a request references an unregistered field.
    pub fn resolve<Q, D>(
        &self,
        query: Q,
        requests: &[SortRequest],
        default: D,
    ) -> Result<Q, SearchError>
    where
        Q: QueryOrder,
        D: FnOnce(Q) -> Q,
    {
        if requests.is_empty() {
            tracing::debug!(resource = self.resource, "Applying default ordering");
            return Ok(default(query));
        }

        let columns = self.columns_for(requests)?;
        let needs_tiebreaker = self.tiebreaker.is_some_and(|tiebreaker| {
            !columns
                .iter()
                .any(|(column, _)| same_column::<E>(*column, tiebreaker))
        });

        tracing::debug!(
            resource = self.resource,
            keys = requests.len(),
            tiebreaker = needs_tiebreaker,
            "Resolving sort requests"
        );

        let mut query = query;
        for (column, direction) in columns {
            query = query.order_by(column, Order::from(direction));
        }
        if needs_tiebreaker && let Some(tiebreaker) = self.tiebreaker {
            query = query.order_by(tiebreaker, Order::Asc);
        }
        Ok(query)
    }

    fn columns_for(
        &self,
        requests: &[SortRequest],
    ) -> Result<Vec<(E::Column, SortDirection)>, SearchError> {
        requests
            .iter()
            .map(|request| {
                self.keys
                    .get(&request.field.to_lowercase())
                    .map(|key| (key.column, request.direction))
                    .ok_or_else(|| {
                        tracing::warn!(
                            resource = self.resource,
                            field = %request.field,
                            "Unsupported sort field requested"
                        );
                        SearchError::unsupported_sort_field(
                            self.resource,
                            &request.field,
                            &self.available_fields(),
                        )
                    })
            })
            .collect()
    }
}

impl<E: EntityTrait> fmt::Debug for SortRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortRegistry")
            .field("resource", &self.resource)
            .field("fields", &self.available_fields())
            .finish_non_exhaustive()
    }
}

fn same_column<E: EntityTrait>(left: E::Column, right: E::Column) -> bool {
    use sea_orm::IdenStatic;
    left.as_str() == right.as_str()
}
