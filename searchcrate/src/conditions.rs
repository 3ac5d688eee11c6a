//! # Predicate Translation
//!
//! Turns validated [`Filter`] values into Sea-ORM expressions over a column and
//! combines them with `AND`. Each filtered field is an independent narrowing
//! condition; the engine never emits `OR` across fields.
//!
//! Per-entity filter objects implement [`FilterSet`] to describe which filter
//! targets which column:
//!
//! ```rust,ignore
//! #[derive(Default, Deserialize)]
//! pub struct AirportFilters {
//!     pub name: Option<TextFilter>,
//!     pub code: Option<TextFilter>,
//!     pub city_ids: Option<IdListFilter>,
//! }
//!
//! impl FilterSet for AirportFilters {
//!     type Column = airport::Column;
//!
//!     fn bindings(&self) -> Vec<FilterBinding<Self::Column>> {
//!         [
//!             FilterBinding::optional("name", airport::Column::Name, self.name.as_ref()),
//!             FilterBinding::optional("code", airport::Column::Code, self.code.as_ref()),
//!             FilterBinding::optional("city_ids", airport::Column::CityId, self.city_ids.as_ref()),
//!         ]
//!         .into_iter()
//!         .flatten()
//!         .collect()
//!     }
//!
//!     fn multi_value_fields() -> &'static [&'static str] {
//!         &["code"]
//!     }
//! }
//!
//! let query = apply_filters(airport::Entity::find(), &filters)?;
//! ```

use sea_orm::{
    ColumnTrait, Condition, QueryFilter, Value,
    sea_query::{BinOper, Expr, Func, SimpleExpr},
};

use crate::errors::SearchError;
use crate::filter::{
    BooleanFilter, BooleanOperator, DateFilter, Filter, FilterKind, IdListFilter, IdRangeFilter,
    RangeOperator, TextFilter, TextOperator,
};

/// Escape character used in generated `LIKE` patterns
const LIKE_ESCAPE: char = '\\';

/// One filter bound to the column it narrows.
#[derive(Debug, Clone)]
pub struct FilterBinding<C> {
    /// Logical field name, as used by API clients and the multi-value allow-list
    pub field: &'static str,
    pub column: C,
    pub filter: Filter,
}

impl<C: ColumnTrait> FilterBinding<C> {
    pub fn new(field: &'static str, column: C, filter: impl Into<Filter>) -> Self {
        Self {
            field,
            column,
            filter: filter.into(),
        }
    }

    /// Binding for an optional field of a filter object; `None` when the client sent nothing.
    pub fn optional<F>(field: &'static str, column: C, filter: Option<&F>) -> Option<Self>
    where
        F: Clone + Into<Filter>,
    {
        filter.map(|filter| Self::new(field, column, filter.clone()))
    }
}

/// A per-entity filter object.
pub trait FilterSet {
    type Column: ColumnTrait;

    /// Filters present in this request, each bound to its column.
    fn bindings(&self) -> Vec<FilterBinding<Self::Column>>;

    /// Fields accepting the text `in_values` / `not_in_values` operators.
    /// Default is empty - no field supports multi-value matching.
    #[must_use]
    fn multi_value_fields() -> &'static [&'static str] {
        &[]
    }
}

/// Validate every filter of `filters`, then compose the conjunction of their fragments.
///
/// Validation of all bindings happens before any fragment is built, so a
/// malformed request never yields a partially filtered condition.
///
/// # Errors
///
/// The first validation failure among the bindings.
pub fn build_condition<F: FilterSet>(filters: &F) -> Result<Condition, SearchError> {
    let bindings = filters.bindings();
    let multi_value_fields = F::multi_value_fields();

    for binding in &bindings {
        binding
            .filter
            .validate(Some(binding.field), multi_value_fields)
            .map_err(|err| err.with_detail("field", binding.field))?;
    }

    let mut condition = Condition::all();
    let mut applied = 0_usize;
    for binding in &bindings {
        if let Some(expr) = translate(
            &binding.filter,
            binding.column,
            Some(binding.field),
            multi_value_fields,
        )? {
            condition = condition.add(expr);
            applied += 1;
        }
    }

    tracing::debug!(
        requested = bindings.len(),
        applied,
        "Composed search filter condition"
    );

    Ok(condition)
}

/// Narrow `query` with every filter of `filters`.
///
/// # Errors
///
/// See [`build_condition`].
pub fn apply_filters<Q, F>(query: Q, filters: &F) -> Result<Q, SearchError>
where
    Q: QueryFilter,
    F: FilterSet,
{
    let condition = build_condition(filters)?;
    if condition.is_empty() {
        return Ok(query);
    }
    Ok(query.filter(condition))
}

/// Translate one filter into a predicate over `column`.
///
/// Returns `Ok(None)` when the filter is not applied (an empty id list or an
/// absent id range).
///
/// # Errors
///
/// Any validation failure of the filter, see [`Filter::validate`].
pub fn translate<C: ColumnTrait>(
    filter: &Filter,
    column: C,
    field: Option<&str>,
    multi_value_fields: &[&str],
) -> Result<Option<SimpleExpr>, SearchError> {
    filter.validate(field, multi_value_fields)?;

    let expr = match filter {
        Filter::Boolean(filter) => Some(boolean_expr(filter, column)),
        Filter::Number(filter) => Some(range_expr(
            FilterKind::Number,
            column,
            filter.operator,
            filter.value,
            filter.value2,
        )?),
        Filter::DateTime(filter) => Some(range_expr(
            FilterKind::DateTime,
            column,
            filter.operator,
            filter.value,
            filter.value2,
        )?),
        Filter::Date(filter) => Some(date_expr(filter, column)?),
        Filter::Text(filter) => Some(text_expr(filter, column)),
        Filter::IdList(filter) => id_list_expr(filter, column),
        Filter::IdRange(filter) => id_range_expr(filter, column),
    };

    Ok(expr)
}

impl Filter {
    /// Method form of [`translate`].
    ///
    /// # Errors
    ///
    /// See [`translate`].
    pub fn to_expr<C: ColumnTrait>(
        &self,
        column: C,
        field: Option<&str>,
        multi_value_fields: &[&str],
    ) -> Result<Option<SimpleExpr>, SearchError> {
        translate(self, column, field, multi_value_fields)
    }
}

fn boolean_expr<C: ColumnTrait>(filter: &BooleanFilter, column: C) -> SimpleExpr {
    match filter.operator {
        BooleanOperator::EqualTo => column.eq(filter.value),
        BooleanOperator::NotEqualTo => column.ne(filter.value),
        BooleanOperator::IsNull => column.is_null(),
        BooleanOperator::IsNotNull => column.is_not_null(),
    }
}

/// Ordinal comparison shared by number and date-time filters.
fn range_expr<C, V>(
    kind: FilterKind,
    column: C,
    operator: RangeOperator,
    value: Option<V>,
    value2: Option<V>,
) -> Result<SimpleExpr, SearchError>
where
    C: ColumnTrait,
    V: Into<Value>,
{
    let require = |value: Option<V>| {
        value.ok_or_else(|| SearchError::missing_value(kind.as_str(), operator.as_str(), None))
    };

    Ok(match operator {
        RangeOperator::IsNull => column.is_null(),
        RangeOperator::IsNotNull => column.is_not_null(),
        RangeOperator::EqualTo => column.eq(require(value)?),
        RangeOperator::NotEqualTo => column.ne(require(value)?),
        RangeOperator::LessThan => column.lt(require(value)?),
        RangeOperator::GreaterThan => column.gt(require(value)?),
        RangeOperator::Between => column.between(require(value)?, require(value2)?),
    })
}

/// Whole-day comparison over a timestamp column.
fn date_expr<C: ColumnTrait>(filter: &DateFilter, column: C) -> Result<SimpleExpr, SearchError> {
    let missing = || {
        SearchError::missing_value(FilterKind::Date.as_str(), filter.operator.as_str(), None)
    };
    let bound = || filter.normalized_bounds().map(|(from, _)| from).ok_or_else(missing);
    let whole_days = || match filter.normalized_bounds() {
        Some((from, Some(to))) => Ok((from, to)),
        _ => Err(missing()),
    };

    Ok(match filter.operator {
        RangeOperator::IsNull => column.is_null(),
        RangeOperator::IsNotNull => column.is_not_null(),
        RangeOperator::LessThan => column.lt(bound()?),
        RangeOperator::GreaterThan => column.gt(bound()?),
        RangeOperator::Between | RangeOperator::EqualTo => {
            let (from, to) = whole_days()?;
            column.between(from, to)
        }
        RangeOperator::NotEqualTo => {
            let (from, to) = whole_days()?;
            column.not_between(from, to)
        }
    })
}

/// Case-insensitive comparison. The column and the value go through the same
/// database `UPPER`, so both sides are folded by one function whatever the
/// backend's notion of case is.
fn text_expr<C: ColumnTrait>(filter: &TextFilter, column: C) -> SimpleExpr {
    let folded = || Expr::expr(Func::upper(Expr::col((column.entity_name(), column))));
    let value = filter.sanitized();
    let upper = |value: String| SimpleExpr::from(Func::upper(Expr::val(value)));
    let pattern = |prefix: &str, suffix: &str| {
        SimpleExpr::Binary(
            Box::new(upper(format!("{prefix}{}{suffix}", escape_like(&value)))),
            BinOper::Escape,
            Box::new(SimpleExpr::Constant(Value::Char(Some(LIKE_ESCAPE)))),
        )
    };
    let like = |prefix: &str, suffix: &str| folded().binary(BinOper::Like, pattern(prefix, suffix));
    let not_like =
        |prefix: &str, suffix: &str| folded().binary(BinOper::NotLike, pattern(prefix, suffix));
    let values = || filter.value_set().into_iter().map(upper);

    match filter.operator {
        TextOperator::Contains => like("%", "%"),
        TextOperator::NotContains => not_like("%", "%"),
        TextOperator::StartsWith => like("", "%"),
        TextOperator::NotStartsWith => not_like("", "%"),
        TextOperator::EndsWith => like("%", ""),
        TextOperator::NotEndsWith => not_like("%", ""),
        TextOperator::EqualTo => folded().eq(upper(value.clone())),
        TextOperator::NotEqualTo => folded().ne(upper(value.clone())),
        TextOperator::LessThan => folded().lt(upper(value.clone())),
        TextOperator::GreaterThan => folded().gt(upper(value.clone())),
        TextOperator::LessOrEqual => folded().lte(upper(value.clone())),
        TextOperator::GreaterOrEqual => folded().gte(upper(value.clone())),
        TextOperator::InValues => folded().is_in(values()),
        TextOperator::NotInValues => folded().is_not_in(values()),
        TextOperator::IsNull => column.is_null(),
        TextOperator::IsNotNull => column.is_not_null(),
    }
}

fn id_list_expr<C: ColumnTrait>(filter: &IdListFilter, column: C) -> Option<SimpleExpr> {
    if filter.is_empty() {
        tracing::trace!("Empty id list filter not applied");
        return None;
    }
    Some(column.is_in(filter.ids().iter().copied()))
}

fn id_range_expr<C: ColumnTrait>(filter: &IdRangeFilter, column: C) -> Option<SimpleExpr> {
    match (filter.min_id, filter.max_id) {
        (Some(min), Some(max)) if filter.is_valid() => Some(column.between(min, max)),
        _ => {
            tracing::trace!("Absent id range filter not applied");
            None
        }
    }
}

/// Escape LIKE wildcards so the value always matches literally
fn escape_like(input: &str) -> String {
    input
        .replace(LIKE_ESCAPE, "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
