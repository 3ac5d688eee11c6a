//! # Search Errors
//!
//! Every failure raised while composing a search is one immutable [`SearchError`]
//! value: a [`ErrorKind`], a human readable message, and two maps of diagnostic
//! fields. `details` is safe to return to API clients; `internal` is only ever
//! written to the server log.
//!
//! Validation errors terminate query building before any database access and are
//! surfaced as `400 Bad Request`. Configuration and database errors become
//! `500 Internal Server Error` with a generic message.
//!
//! ```rust,ignore
//! use searchcrate::{SearchError, ErrorKind};
//!
//! let err = SearchError::incoherent_values("number", "between", "10", "5");
//! assert_eq!(err.kind(), ErrorKind::IncoherentValues);
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Category of a [`SearchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// An operator was used without the value(s) it requires
    MissingValue,
    /// `value2 < value` on a range operator
    IncoherentValues,
    /// A multi-value operator on a field outside the allow-list
    OperatorNotSupported,
    /// A required contextual argument was not supplied or is malformed
    ArgumentInvalid,
    /// A sort request names a field absent from the registry
    UnsupportedSortField,
    /// Non-positive, missing or oversized page size
    InvalidArgument,
    /// The same sort field was registered twice
    DuplicateSortField,
    /// The data store failed while executing a composed query
    Database,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingValue => "missing_value",
            Self::IncoherentValues => "incoherent_values",
            Self::OperatorNotSupported => "operator_not_supported",
            Self::ArgumentInvalid => "argument_invalid",
            Self::UnsupportedSortField => "unsupported_sort_field",
            Self::InvalidArgument => "invalid_argument",
            Self::DuplicateSortField => "duplicate_sort_field",
            Self::Database => "database",
        }
    }

    /// Whether the error describes a malformed request rather than a server fault.
    #[must_use]
    pub const fn is_client_error(self) -> bool {
        !matches!(self, Self::DuplicateSortField | Self::Database)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured, immutable search failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchError {
    kind: ErrorKind,
    message: String,
    details: BTreeMap<String, String>,
    internal: BTreeMap<String, String>,
}

impl SearchError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: BTreeMap::new(),
            internal: BTreeMap::new(),
        }
    }

    /// Attach a diagnostic field that may be returned to the caller.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.details.insert(key.into(), value.to_string());
        self
    }

    /// Attach a diagnostic field that is logged but never serialized.
    #[must_use]
    pub fn with_internal(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.internal.insert(key.into(), value.to_string());
        self
    }

    // ============================================================================
    // Constructors
    // ============================================================================

    pub fn missing_value(filter_kind: &str, operator: &str, value: Option<&str>) -> Self {
        Self::new(
            ErrorKind::MissingValue,
            format!("Operator '{operator}' on a {filter_kind} filter requires a value"),
        )
        .with_detail("filter_kind", filter_kind)
        .with_detail("operator", operator)
        .with_detail("value", value.unwrap_or("null"))
    }

    pub fn incoherent_values(filter_kind: &str, operator: &str, value: &str, value2: &str) -> Self {
        Self::new(
            ErrorKind::IncoherentValues,
            format!("The second value ({value2}) must not be lower than the first value ({value})"),
        )
        .with_detail("filter_kind", filter_kind)
        .with_detail("operator", operator)
        .with_detail("value", value)
        .with_detail("value2", value2)
    }

    pub fn operator_not_supported(operator: &str, field: &str) -> Self {
        Self::new(
            ErrorKind::OperatorNotSupported,
            format!("Operator '{operator}' is not supported on field '{field}'"),
        )
        .with_detail("operator", operator)
        .with_detail("field", field)
    }

    pub fn argument_invalid(argument: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::ArgumentInvalid, reason).with_detail("argument", argument)
    }

    pub fn unsupported_sort_field(resource: &str, field: &str, available: &[&str]) -> Self {
        Self::new(
            ErrorKind::UnsupportedSortField,
            format!("{resource} cannot be sorted by '{field}'"),
        )
        .with_detail("resource", resource)
        .with_detail("field", field)
        .with_detail("available", available.join(", "))
    }

    pub fn invalid_argument(argument: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, reason).with_detail("argument", argument)
    }

    pub fn duplicate_sort_field(resource: &str, field: &str) -> Self {
        Self::new(
            ErrorKind::DuplicateSortField,
            "Search configuration error",
        )
        .with_internal("resource", resource)
        .with_internal("field", field)
        .with_internal("reason", "sort field registered twice")
    }

    pub fn database(err: &DbErr) -> Self {
        Self::new(ErrorKind::Database, "A database error occurred")
            .with_internal("error", err)
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn details(&self) -> &BTreeMap<String, String> {
        &self.details
    }

    #[must_use]
    pub const fn internal(&self) -> &BTreeMap<String, String> {
        &self.internal
    }

    #[must_use]
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details.get(key).map(String::as_str)
    }

    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.kind.is_client_error()
    }

    fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn log(&self) {
        if self.is_client_error() {
            tracing::debug!(
                kind = %self.kind,
                error = %self.message,
                details = ?self.details,
                "Search request rejected"
            );
        } else {
            tracing::error!(
                kind = %self.kind,
                internal = ?self.internal,
                "Search failed"
            );
        }
    }
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SearchError {}

impl From<DbErr> for SearchError {
    fn from(err: DbErr) -> Self {
        Self::database(&err)
    }
}

/// Error body sent to users (internal fields are never included)
#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
    kind: ErrorKind,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    details: &'a BTreeMap<String, String>,
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.status_code();
        let body = ErrorResponse {
            error: &self.message,
            kind: self.kind,
            details: &self.details,
        };

        (status, Json(body)).into_response()
    }
}
