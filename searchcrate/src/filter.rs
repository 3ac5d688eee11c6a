//! # Filter Value Model
//!
//! Typed filter variants, one per [`FilterKind`], each carrying an operator that is
//! valid for that kind plus the value(s) it compares against. Filters are plain
//! immutable values deserialized from the request body:
//!
//! ```json
//! {
//!   "name":       { "operator": "contains", "value": "mil" },
//!   "elevation":  { "operator": "between", "value": 0, "value2": 500 },
//!   "departs_at": { "operator": "less_than", "value": "2024-03-15T14:30:00" },
//!   "city_ids":   { "ids": [1, 4, 9] }
//! }
//! ```
//!
//! Validation never mutates a filter. Sanitizing a text value (trim, wildcard
//! stripping, case folding) returns a derived copy.

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::errors::SearchError;

/// Longest text value accepted by a text filter
pub const MAX_FILTER_VALUE_LENGTH: usize = 10_000;

/// Characters a client may use as "match anything" that are stripped from text values
const WILDCARD_LITERALS: [char; 2] = ['%', '*'];

/// The data type a filter targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Boolean,
    Number,
    Date,
    DateTime,
    Text,
    IdList,
    IdRange,
}

impl FilterKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Date => "date",
            Self::DateTime => "date_time",
            Self::Text => "text",
            Self::IdList => "id_list",
            Self::IdRange => "id_range",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Operators
// ============================================================================

/// Operators valid on a boolean filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BooleanOperator {
    #[default]
    EqualTo,
    NotEqualTo,
    IsNull,
    IsNotNull,
}

impl BooleanOperator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EqualTo => "equal_to",
            Self::NotEqualTo => "not_equal_to",
            Self::IsNull => "is_null",
            Self::IsNotNull => "is_not_null",
        }
    }
}

/// Operators shared by number, date and date-time filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RangeOperator {
    #[default]
    EqualTo,
    NotEqualTo,
    Between,
    LessThan,
    GreaterThan,
    IsNull,
    IsNotNull,
}

impl RangeOperator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EqualTo => "equal_to",
            Self::NotEqualTo => "not_equal_to",
            Self::Between => "between",
            Self::LessThan => "less_than",
            Self::GreaterThan => "greater_than",
            Self::IsNull => "is_null",
            Self::IsNotNull => "is_not_null",
        }
    }

    /// Null checks compare against nothing.
    #[must_use]
    pub const fn requires_value(self) -> bool {
        !matches!(self, Self::IsNull | Self::IsNotNull)
    }
}

/// Operators valid on a text filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TextOperator {
    #[default]
    Contains,
    NotContains,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
    EqualTo,
    NotEqualTo,
    LessThan,
    GreaterThan,
    LessOrEqual,
    GreaterOrEqual,
    InValues,
    NotInValues,
    IsNull,
    IsNotNull,
}

impl TextOperator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::StartsWith => "starts_with",
            Self::NotStartsWith => "not_starts_with",
            Self::EndsWith => "ends_with",
            Self::NotEndsWith => "not_ends_with",
            Self::EqualTo => "equal_to",
            Self::NotEqualTo => "not_equal_to",
            Self::LessThan => "less_than",
            Self::GreaterThan => "greater_than",
            Self::LessOrEqual => "less_or_equal",
            Self::GreaterOrEqual => "greater_or_equal",
            Self::InValues => "in_values",
            Self::NotInValues => "not_in_values",
            Self::IsNull => "is_null",
            Self::IsNotNull => "is_not_null",
        }
    }

    /// `in_values` / `not_in_values` match against a set of line-separated values.
    #[must_use]
    pub const fn is_multi_value(self) -> bool {
        matches!(self, Self::InValues | Self::NotInValues)
    }

    #[must_use]
    pub const fn is_null_check(self) -> bool {
        matches!(self, Self::IsNull | Self::IsNotNull)
    }
}

// ============================================================================
// Filter variants
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BooleanFilter {
    #[serde(default)]
    pub operator: BooleanOperator,
    #[serde(default)]
    pub value: bool,
}

impl BooleanFilter {
    #[must_use]
    pub const fn new(operator: BooleanOperator, value: bool) -> Self {
        Self { operator, value }
    }

    /// Boolean filters never require a value.
    ///
    /// # Errors
    ///
    /// Never fails; the signature matches the other filter kinds.
    #[allow(clippy::unnecessary_wraps)]
    pub fn validate(&self) -> Result<(), SearchError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NumberFilter {
    #[serde(default)]
    pub operator: RangeOperator,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub value2: Option<f64>,
}

impl NumberFilter {
    #[must_use]
    pub const fn new(operator: RangeOperator, value: Option<f64>, value2: Option<f64>) -> Self {
        Self {
            operator,
            value,
            value2,
        }
    }

    #[must_use]
    pub const fn between(value: f64, value2: f64) -> Self {
        Self::new(RangeOperator::Between, Some(value), Some(value2))
    }

    /// # Errors
    ///
    /// `MissingValue` when the operator needs a value (or both, for `between`)
    /// and `IncoherentValues` when `value2 < value`.
    pub fn validate(&self) -> Result<(), SearchError> {
        validate_range(FilterKind::Number, self.operator, self.value, self.value2)
    }
}

/// Filter over a timestamp column that compares whole days.
///
/// `less_than` excludes the given day and everything after it, `greater_than`
/// excludes the given day and everything before it, `between` includes both
/// boundary days entirely, `equal_to` matches any instant of the day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DateFilter {
    #[serde(default)]
    pub operator: RangeOperator,
    #[serde(default)]
    pub value: Option<NaiveDateTime>,
    #[serde(default)]
    pub value2: Option<NaiveDateTime>,
}

impl DateFilter {
    #[must_use]
    pub const fn new(
        operator: RangeOperator,
        value: Option<NaiveDateTime>,
        value2: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            operator,
            value,
            value2,
        }
    }

    /// # Errors
    ///
    /// Same rules as [`NumberFilter::validate`], compared on whole days.
    pub fn validate(&self) -> Result<(), SearchError> {
        validate_range(
            FilterKind::Date,
            self.operator,
            self.value.map(start_of_day),
            self.value2.map(start_of_day),
        )
    }

    /// Comparison bounds after day normalization.
    ///
    /// `less_than` floors to 00:00:00.000, `greater_than` ceils to 23:59:59.999,
    /// `between` floors the first bound and ceils the second. `equal_to` and
    /// `not_equal_to` yield the whole day as `(start, Some(end))`.
    #[must_use]
    pub fn normalized_bounds(&self) -> Option<(NaiveDateTime, Option<NaiveDateTime>)> {
        let value = self.value?;
        match self.operator {
            RangeOperator::LessThan => Some((start_of_day(value), None)),
            RangeOperator::GreaterThan => Some((end_of_day(value), None)),
            RangeOperator::Between => {
                Some((start_of_day(value), self.value2.map(end_of_day)))
            }
            RangeOperator::EqualTo | RangeOperator::NotEqualTo => {
                Some((start_of_day(value), Some(end_of_day(value))))
            }
            RangeOperator::IsNull | RangeOperator::IsNotNull => None,
        }
    }
}

/// Filter over a timestamp column that compares exact instants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DateTimeFilter {
    #[serde(default)]
    pub operator: RangeOperator,
    #[serde(default)]
    pub value: Option<NaiveDateTime>,
    #[serde(default)]
    pub value2: Option<NaiveDateTime>,
}

impl DateTimeFilter {
    #[must_use]
    pub const fn new(
        operator: RangeOperator,
        value: Option<NaiveDateTime>,
        value2: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            operator,
            value,
            value2,
        }
    }

    /// # Errors
    ///
    /// Same rules as [`NumberFilter::validate`].
    pub fn validate(&self) -> Result<(), SearchError> {
        validate_range(FilterKind::DateTime, self.operator, self.value, self.value2)
    }
}

/// Free-text filter. Matching is always case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TextFilter {
    #[serde(default)]
    pub operator: TextOperator,
    #[serde(default)]
    pub value: Option<String>,
    /// Trim surrounding whitespace from the value
    #[serde(default = "enabled")]
    pub trim: bool,
    /// Remove literal `%` and `*` wildcard characters from the value
    #[serde(default = "enabled")]
    pub strip_wildcards: bool,
}

const fn enabled() -> bool {
    true
}

impl Default for TextFilter {
    fn default() -> Self {
        Self {
            operator: TextOperator::default(),
            value: None,
            trim: true,
            strip_wildcards: true,
        }
    }
}

impl TextFilter {
    pub fn new(operator: TextOperator, value: impl Into<String>) -> Self {
        Self {
            operator,
            value: Some(value.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn null_check(operator: TextOperator) -> Self {
        Self {
            operator,
            ..Self::default()
        }
    }

    /// Copy of the value with the sanitize flags applied. The filter itself is untouched.
    #[must_use]
    pub fn sanitized(&self) -> String {
        let raw = self.value.as_deref().unwrap_or_default();
        let stripped: String = if self.strip_wildcards {
            raw.chars().filter(|c| !WILDCARD_LITERALS.contains(c)).collect()
        } else {
            raw.to_string()
        };
        if self.trim {
            stripped.trim().to_string()
        } else {
            stripped
        }
    }

    /// Values of a multi-value filter: the raw value split on `\n`, `\r` or
    /// `\r\n`, trimmed, with empty entries dropped.
    ///
    /// Case is left alone. The database folds both sides of the comparison.
    #[must_use]
    pub fn value_set(&self) -> Vec<String> {
        self.value
            .as_deref()
            .unwrap_or_default()
            .split(['\r', '\n'])
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Validate the filter for the logical field `field`.
    ///
    /// # Errors
    ///
    /// - `ArgumentInvalid` when the value exceeds [`MAX_FILTER_VALUE_LENGTH`], or
    ///   when a multi-value operator is used without a field name
    /// - `OperatorNotSupported` when a multi-value operator targets a field that
    ///   is not in `multi_value_fields`
    /// - `MissingValue` when a value-requiring operator has an empty value
    pub fn validate(
        &self,
        field: Option<&str>,
        multi_value_fields: &[&str],
    ) -> Result<(), SearchError> {
        let operator = self.operator.as_str();

        if self.operator.is_null_check() {
            return Ok(());
        }

        if let Some(value) = &self.value
            && value.chars().count() > MAX_FILTER_VALUE_LENGTH
        {
            return Err(SearchError::argument_invalid(
                "value",
                format!("Text filter value exceeds {MAX_FILTER_VALUE_LENGTH} characters"),
            )
            .with_detail("operator", operator));
        }

        if self.operator.is_multi_value() {
            let Some(field) = field else {
                return Err(SearchError::argument_invalid(
                    "field",
                    format!("Operator '{operator}' requires the name of the filtered field"),
                )
                .with_detail("operator", operator));
            };
            if !multi_value_fields.contains(&field) {
                return Err(SearchError::operator_not_supported(operator, field));
            }
            if self.value_set().is_empty() {
                return Err(SearchError::missing_value(
                    FilterKind::Text.as_str(),
                    operator,
                    self.value.as_deref(),
                ));
            }
            return Ok(());
        }

        if self.sanitized().is_empty() {
            return Err(SearchError::missing_value(
                FilterKind::Text.as_str(),
                operator,
                self.value.as_deref(),
            ));
        }

        Ok(())
    }
}

/// Explicit list of integer identifiers; an empty list means "not applied".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IdListFilter {
    #[serde(default)]
    pub ids: Option<Vec<i64>>,
}

impl IdListFilter {
    #[must_use]
    pub fn new(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            ids: Some(ids.into_iter().collect()),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.as_ref().is_none_or(Vec::is_empty)
    }

    #[must_use]
    pub fn ids(&self) -> &[i64] {
        self.ids.as_deref().unwrap_or_default()
    }
}

/// Inclusive identifier range; both bounds absent means "not applied".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IdRangeFilter {
    #[serde(default)]
    pub min_id: Option<i64>,
    #[serde(default)]
    pub max_id: Option<i64>,
}

impl IdRangeFilter {
    #[must_use]
    pub const fn new(min_id: i64, max_id: i64) -> Self {
        Self {
            min_id: Some(min_id),
            max_id: Some(max_id),
        }
    }

    #[must_use]
    pub const fn is_absent(&self) -> bool {
        self.min_id.is_none() && self.max_id.is_none()
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!((self.min_id, self.max_id), (Some(min), Some(max)) if max >= min)
    }

    /// Half-specified and inverted ranges are rejected the same way `between` is.
    ///
    /// # Errors
    ///
    /// `MissingValue` when only one bound is set, `IncoherentValues` when
    /// `max_id < min_id`.
    pub fn validate(&self) -> Result<(), SearchError> {
        match (self.min_id, self.max_id) {
            (None, None) => Ok(()),
            (Some(min), Some(max)) if max < min => Err(SearchError::incoherent_values(
                FilterKind::IdRange.as_str(),
                RangeOperator::Between.as_str(),
                &min.to_string(),
                &max.to_string(),
            )),
            (Some(_), Some(_)) => Ok(()),
            (min, max) => Err(SearchError::missing_value(
                FilterKind::IdRange.as_str(),
                RangeOperator::Between.as_str(),
                min.or(max).map(|id| id.to_string()).as_deref(),
            )),
        }
    }
}

// ============================================================================
// Tagged union
// ============================================================================

/// One filter of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Filter {
    Boolean(BooleanFilter),
    Number(NumberFilter),
    Date(DateFilter),
    DateTime(DateTimeFilter),
    Text(TextFilter),
    IdList(IdListFilter),
    IdRange(IdRangeFilter),
}

impl Filter {
    #[must_use]
    pub const fn kind(&self) -> FilterKind {
        match self {
            Self::Boolean(_) => FilterKind::Boolean,
            Self::Number(_) => FilterKind::Number,
            Self::Date(_) => FilterKind::Date,
            Self::DateTime(_) => FilterKind::DateTime,
            Self::Text(_) => FilterKind::Text,
            Self::IdList(_) => FilterKind::IdList,
            Self::IdRange(_) => FilterKind::IdRange,
        }
    }

    /// Validate this filter for the logical field `field`.
    ///
    /// `multi_value_fields` is the allow-list of fields that accept the text
    /// `in_values` / `not_in_values` operators.
    ///
    /// # Errors
    ///
    /// See the `validate` method of each filter kind.
    pub fn validate(
        &self,
        field: Option<&str>,
        multi_value_fields: &[&str],
    ) -> Result<(), SearchError> {
        match self {
            Self::Boolean(filter) => filter.validate(),
            Self::Number(filter) => filter.validate(),
            Self::Date(filter) => filter.validate(),
            Self::DateTime(filter) => filter.validate(),
            Self::Text(filter) => filter.validate(field, multi_value_fields),
            Self::IdList(_) => Ok(()),
            Self::IdRange(filter) => filter.validate(),
        }
    }
}

macro_rules! impl_from_filter {
    ($($variant:ident => $ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Filter {
                fn from(filter: $ty) -> Self {
                    Self::$variant(filter)
                }
            }
        )+
    };
}

impl_from_filter! {
    Boolean => BooleanFilter,
    Number => NumberFilter,
    Date => DateFilter,
    DateTime => DateTimeFilter,
    Text => TextFilter,
    IdList => IdListFilter,
    IdRange => IdRangeFilter,
}

// ============================================================================
// Helpers
// ============================================================================

/// Shared `between` / value-presence rules of number, date and date-time filters.
fn validate_range<T>(
    kind: FilterKind,
    operator: RangeOperator,
    value: Option<T>,
    value2: Option<T>,
) -> Result<(), SearchError>
where
    T: PartialOrd + fmt::Display,
{
    if !operator.requires_value() {
        return Ok(());
    }

    let Some(value) = value else {
        return Err(SearchError::missing_value(kind.as_str(), operator.as_str(), None));
    };

    if operator == RangeOperator::Between {
        let Some(value2) = value2 else {
            return Err(SearchError::missing_value(
                kind.as_str(),
                operator.as_str(),
                Some(&value.to_string()),
            ));
        };
        // Written as a negation so NaN bounds are rejected too
        if !(value2 >= value) {
            return Err(SearchError::incoherent_values(
                kind.as_str(),
                operator.as_str(),
                &value.to_string(),
                &value2.to_string(),
            ));
        }
    }

    Ok(())
}

/// Midnight at the start of the day of `value`.
#[must_use]
pub fn start_of_day(value: NaiveDateTime) -> NaiveDateTime {
    value.date().and_time(NaiveTime::MIN)
}

/// Last millisecond of the day of `value` (23:59:59.999).
#[must_use]
pub fn end_of_day(value: NaiveDateTime) -> NaiveDateTime {
    start_of_day(value) + TimeDelta::days(1) - TimeDelta::milliseconds(1)
}
