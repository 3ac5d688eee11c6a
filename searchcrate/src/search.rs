//! # Search Orchestration
//!
//! Composes the filter, sort and pagination stages into one search:
//!
//! 1. resolve the page size against [`SearchConfig`]
//! 2. narrow the query with the request's filters
//! 3. order it through the entity's [`SortRegistry`]
//! 4. count the narrowed query
//! 5. apply offset/limit and load the page
//!
//! Every validation step runs before the first database round trip, so a bad
//! request never reaches the database. The count is taken before step 5,
//! otherwise it would only reflect the rows of one page.

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Select};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::conditions::{FilterSet, apply_filters};
use crate::config::SearchConfig;
use crate::errors::SearchError;
use crate::pagination::{PageRequest, PagedResult, paginate};
use crate::sort::{SortRegistry, SortRequest, parse_sort_param};

/// A complete search request: filters, ordered sort keys and page coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchRequest<F> {
    #[serde(default)]
    pub filters: F,
    #[serde(default)]
    pub sortings: Vec<SortRequest>,
    #[serde(default)]
    pub page_index: Option<u64>,
    #[serde(default)]
    pub page_size: Option<u64>,
}

impl<F> SearchRequest<F> {
    pub fn new(filters: F) -> Self {
        Self {
            filters,
            sortings: Vec::new(),
            page_index: None,
            page_size: None,
        }
    }

    #[must_use]
    pub fn sort_by(mut self, sort: SortRequest) -> Self {
        self.sortings.push(sort);
        self
    }

    /// Append the sort keys of a query-string style sort parameter.
    ///
    /// # Errors
    ///
    /// See [`parse_sort_param`].
    pub fn with_sort_param(mut self, param: &str) -> Result<Self, SearchError> {
        self.sortings.extend(parse_sort_param(param)?);
        Ok(self)
    }

    #[must_use]
    pub const fn page(mut self, page_index: u64, page_size: u64) -> Self {
        self.page_index = Some(page_index);
        self.page_size = Some(page_size);
        self
    }

    #[must_use]
    pub const fn page_request(&self) -> PageRequest {
        PageRequest {
            page_index: self.page_index,
            page_size: self.page_size,
        }
    }
}

/// Run `request` against `query`.
///
/// `default` orders the query when the request carries no sort keys.
///
/// # Errors
///
/// Validation errors from the page, filter and sort stages (before any database
/// access), or `Database` when a query fails.
pub async fn search_with<E, F, C, D>(
    db: &C,
    query: Select<E>,
    registry: &SortRegistry<E>,
    request: &SearchRequest<F>,
    config: &SearchConfig,
    default: D,
) -> Result<PagedResult<E::Model>, SearchError>
where
    E: EntityTrait,
    E::Model: Send + Sync,
    F: FilterSet,
    C: ConnectionTrait,
    D: FnOnce(Select<E>) -> Select<E>,
{
    let page = request.page_request();
    let page_size = config.page_size(page.page_size)?;
    let page_index = page.index();

    let query = apply_filters(query, &request.filters)?;
    let query = registry.resolve(query, &request.sortings, default)?;
    let paged = paginate(query.clone(), Some(page_index), Some(page_size))?;

    let total = PaginatorTrait::count(query, db).await?;
    let items = paged.all(db).await?;

    tracing::debug!(
        resource = registry.resource(),
        page_index,
        page_size,
        total,
        returned = items.len(),
        "Search completed"
    );

    Ok(PagedResult::new(
        items,
        request.sortings.clone(),
        page_index,
        page_size,
        Some(total),
    )
    .with_resource(registry.resource()))
}

/// A searchable resource.
///
/// Implementors name their entity, filter object and sort registry; the
/// provided [`Searchable::search`] composes them.
///
/// ```rust,ignore
/// pub struct AirportSearch;
///
/// #[async_trait]
/// impl Searchable for AirportSearch {
///     type Entity = airport::Entity;
///     type Filters = AirportFilters;
///     type Output = AirportResponse;
///
///     const RESOURCE_NAME: &'static str = "airports";
///
///     fn sort_registry() -> &'static SortRegistry<airport::Entity> {
///         &AIRPORT_SORTS
///     }
///
///     fn default_ordering(query: Select<airport::Entity>) -> Select<airport::Entity> {
///         query.order_by_asc(airport::Column::Name)
///     }
/// }
/// ```
#[async_trait]
pub trait Searchable: Send + Sync
where
    <Self::Entity as EntityTrait>::Model: Send + Sync,
{
    type Entity: EntityTrait + Sync;
    type Filters: FilterSet + Send + Sync;
    /// Item type of the returned page
    type Output: From<<Self::Entity as EntityTrait>::Model> + Send;

    /// Resource name used in error details and the `Content-Range` header
    const RESOURCE_NAME: &'static str;

    fn sort_registry() -> &'static SortRegistry<Self::Entity>;

    /// Ordering used when a request has no sort keys.
    fn default_ordering(query: Select<Self::Entity>) -> Select<Self::Entity>;

    /// Query every search starts from. Override to add joins or scope rows.
    #[must_use]
    fn base_query() -> Select<Self::Entity> {
        Self::Entity::find()
    }

    async fn search(
        db: &DatabaseConnection,
        request: &SearchRequest<Self::Filters>,
        config: &SearchConfig,
    ) -> Result<PagedResult<Self::Output>, SearchError> {
        let page = search_with(
            db,
            Self::base_query(),
            Self::sort_registry(),
            request,
            config,
            Self::default_ordering,
        )
        .await?;

        Ok(page
            .map(Self::Output::from)
            .with_resource(Self::RESOURCE_NAME))
    }

    /// Number of rows matching `filters`, without sorting or pagination.
    async fn count(db: &DatabaseConnection, filters: &Self::Filters) -> Result<u64, SearchError> {
        let query = apply_filters(Self::base_query(), filters)?;
        Ok(PaginatorTrait::count(query, db).await?)
    }
}
