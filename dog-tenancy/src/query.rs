//! Structured query/predicate representation.
//!
//! Backends translate a [`Query`] into whatever their storage speaks; the
//! enforcement layer only inspects and augments it. `Raw` exists because
//! some call sites build filters as literal fragments rather than structured
//! predicates; backends may reject fragments they cannot interpret.

use serde_json::Value;

/// A compiled predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value` equality.
    Eq { column: String, value: Value },
    /// Conjunction of sub-filters.
    And(Vec<Filter>),
    /// Disjunction of sub-filters.
    Or(Vec<Filter>),
    /// A literal predicate fragment, e.g. `tenant_id = 'acme'`.
    Raw(String),
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    pub fn raw(fragment: impl Into<String>) -> Self {
        Filter::Raw(fragment.into())
    }
}

/// A query as issued by calling code and augmented by the interceptor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Filter>,
}

impl Query {
    /// Match everything.
    pub fn all() -> Self {
        Self { filter: None }
    }

    pub fn filtered(filter: Filter) -> Self {
        Self {
            filter: Some(filter),
        }
    }

    /// Conjoin `predicate` with whatever filter is already present.
    ///
    /// Flattens into an existing top-level `And` instead of nesting.
    pub fn and_with(&mut self, predicate: Filter) {
        self.filter = Some(match self.filter.take() {
            None => predicate,
            Some(Filter::And(mut parts)) => {
                parts.push(predicate);
                Filter::And(parts)
            }
            Some(existing) => Filter::And(vec![existing, predicate]),
        });
    }
}

/// Parse a raw fragment of the simple form `col = 'v'` (single or double
/// quoted value, optionally quoted/backticked column). Returns `None` for
/// anything more complex.
pub(crate) fn parse_raw_eq(fragment: &str) -> Option<(String, String)> {
    let (lhs, rhs) = fragment.split_once('=')?;
    let rhs = rhs.strip_prefix('=').unwrap_or(rhs); // tolerate `==`
    if rhs.contains('=') {
        return None;
    }

    let column = lhs
        .trim()
        .trim_matches(|c| c == '"' || c == '`' || c == '\'')
        .trim();
    let value = rhs.trim();
    let value = value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))?;

    if column.is_empty() || !column.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }

    Some((column.to_string(), value.to_string()))
}
