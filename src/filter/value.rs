use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised when a filter edit is validated at the store boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The wire name does not belong to this screen's field set
    #[error("Unknown filter field: {0}")]
    UnknownField(String),

    /// The value's shape does not fit the field (e.g. text into an id field)
    #[error("Filter field '{field}' expects {expected}, got {got}")]
    KindMismatch {
        field: &'static str,
        expected: FieldKind,
        got: &'static str,
    },

    /// The raw string could not be parsed for the field's kind
    #[error("Invalid value '{value}' for filter field '{field}': {reason}")]
    InvalidValue {
        field: &'static str,
        value: String,
        reason: String,
    },
}

// ============================================================================
// Values
// ============================================================================

/// A single filter value.
///
/// `Any` is the "no constraint" value. Empty text and id `0` are folded into
/// `Any` by [`FilterValue::normalized`], which every store edit goes through.
/// `Flag(false)` stays a constraint: for boolean fields only null is open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    #[default]
    Any,
    Flag(bool),
    Id(i64),
    Date(NaiveDate),
    Text(String),
}

impl FilterValue {
    pub fn text(value: impl Into<String>) -> Self {
        FilterValue::Text(value.into()).normalized()
    }

    pub fn id(value: i64) -> Self {
        FilterValue::Id(value).normalized()
    }

    /// Fold zero-like values into `Any`.
    pub fn normalized(self) -> Self {
        match self {
            FilterValue::Text(s) if s.trim().is_empty() => FilterValue::Any,
            FilterValue::Id(0) => FilterValue::Any,
            other => other,
        }
    }

    /// True when this value places no constraint on its field.
    pub fn is_unconstrained(&self) -> bool {
        matches!(self.clone().normalized(), FilterValue::Any)
    }

    fn shape(&self) -> &'static str {
        match self {
            FilterValue::Any => "null",
            FilterValue::Flag(_) => "boolean",
            FilterValue::Id(_) => "integer",
            FilterValue::Date(_) => "date",
            FilterValue::Text(_) => "text",
        }
    }

    /// Render for a query string. `None` for unconstrained values.
    pub fn to_query_value(&self) -> Option<String> {
        match self {
            FilterValue::Any => None,
            FilterValue::Flag(b) => Some(b.to_string()),
            FilterValue::Id(0) => None,
            FilterValue::Id(id) => Some(id.to_string()),
            FilterValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            FilterValue::Text(s) if s.trim().is_empty() => None,
            FilterValue::Text(s) => Some(s.clone()),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_query_value() {
            Some(v) => f.write_str(&v),
            None => f.write_str("any"),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::text(value)
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::id(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Flag(value)
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(value: NaiveDate) -> Self {
        FilterValue::Date(value)
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

// ============================================================================
// Fields
// ============================================================================

/// The value shape a filter field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free string (category name, entry type, action)
    Text,
    /// Foreign-key id; 0 means unconstrained
    Id,
    /// Tri-state boolean: null, true, false
    Flag,
    /// Calendar date, sent as YYYY-MM-DD
    Date,
    /// Small positive integer such as "last N days"; 0 means unconstrained
    Count,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Text => "text",
            FieldKind::Id => "an id",
            FieldKind::Flag => "a boolean",
            FieldKind::Date => "a date",
            FieldKind::Count => "a count",
        };
        f.write_str(name)
    }
}

impl FieldKind {
    /// Check that `value` fits this kind. `Any` always fits.
    pub fn accepts(&self, value: &FilterValue) -> bool {
        matches!(
            (self, value),
            (_, FilterValue::Any)
                | (FieldKind::Text, FilterValue::Text(_))
                | (FieldKind::Id, FilterValue::Id(_))
                | (FieldKind::Count, FilterValue::Id(_))
                | (FieldKind::Flag, FilterValue::Flag(_))
                | (FieldKind::Date, FilterValue::Date(_))
        )
    }

    /// Parse a raw `name=value` right-hand side for this kind.
    ///
    /// Empty strings and `any`/`null` parse to `Any`.
    pub fn parse(&self, raw: &str) -> Result<FilterValue, String> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("any") || raw.eq_ignore_ascii_case("null") {
            return Ok(FilterValue::Any);
        }
        match self {
            FieldKind::Text => Ok(FilterValue::Text(raw.to_string())),
            FieldKind::Id | FieldKind::Count => raw
                .parse::<i64>()
                .map_err(|e| e.to_string())
                .and_then(|n| {
                    if n < 0 {
                        Err("must not be negative".to_string())
                    } else {
                        Ok(FilterValue::id(n))
                    }
                }),
            FieldKind::Flag => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(FilterValue::Flag(true)),
                "false" | "0" | "no" => Ok(FilterValue::Flag(false)),
                _ => Err("expected true or false".to_string()),
            },
            FieldKind::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(FilterValue::Date)
                .map_err(|e| e.to_string()),
        }
    }
}

/// A closed, per-screen set of filter fields.
///
/// Implementors are plain enums; `Ord` follows declaration order and is the
/// order fields appear in a [`FilterSpec`](super::FilterSpec) and on the wire.
pub trait FilterField: Copy + Eq + Ord + Hash + fmt::Debug + Send + Sync + 'static {
    /// Every field of the screen, in declaration order.
    const ALL: &'static [Self];

    /// Query-parameter name.
    fn name(&self) -> &'static str;

    fn kind(&self) -> FieldKind;

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }

    /// Validate and normalise a value for this field.
    fn check(&self, value: FilterValue) -> Result<FilterValue, FilterError> {
        let value = value.normalized();
        if self.kind().accepts(&value) {
            Ok(value)
        } else {
            Err(FilterError::KindMismatch {
                field: self.name(),
                expected: self.kind(),
                got: value.shape(),
            })
        }
    }
}
