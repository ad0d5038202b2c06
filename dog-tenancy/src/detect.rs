//! Existing-filter detector.
//!
//! Before the read/update/delete hooks inject a tenant predicate they check
//! whether the calling code already scoped the query, so an explicit filter
//! is never doubled. The check is deliberately conservative: a tenant
//! equality nested under `Or` counts as present. A false positive means the
//! caller already scoped the query (safe); a false negative means one
//! redundant conjunct (also safe).

use crate::query::{Filter, Query};

/// Does `query` already contain an equality filter on `column`?
pub fn has_tenant_filter(query: &Query, column: &str) -> bool {
    query
        .filter
        .as_ref()
        .is_some_and(|f| filter_has_column_eq(f, column))
}

fn filter_has_column_eq(filter: &Filter, column: &str) -> bool {
    match filter {
        Filter::Eq { column: c, .. } => c == column,
        Filter::And(parts) | Filter::Or(parts) => {
            parts.iter().any(|f| filter_has_column_eq(f, column))
        }
        Filter::Raw(fragment) => raw_has_column_eq(fragment, column),
    }
}

/// Textual scan of a raw fragment for `column = ...` / `column == ...`.
///
/// Recognizes quoted, backticked, and unquoted identifiers with or without
/// whitespace around the operator. This is a heuristic over fragments the
/// layer cannot parse, not a proof; it intentionally errs toward "present".
fn raw_has_column_eq(fragment: &str, column: &str) -> bool {
    let bytes = fragment.as_bytes();
    let mut start = 0;

    while let Some(pos) = fragment[start..].find(column) {
        let at = start + pos;
        let end = at + column.len();
        start = at + 1;

        // Reject matches inside a longer identifier (`other_tenant_id`,
        // `tenant_id_old`).
        if at > 0 && is_ident_byte(bytes[at - 1]) {
            continue;
        }
        if end < bytes.len() && is_ident_byte(bytes[end]) {
            continue;
        }

        // Skip a closing quote/backtick, then whitespace, then require `=`
        // not followed by another comparison character and not part of
        // `!=`/`>=`/`<=`.
        let mut rest = fragment[end..].chars().peekable();
        if matches!(rest.peek(), Some('"') | Some('`') | Some('\'')) {
            rest.next();
        }
        while matches!(rest.peek(), Some(c) if c.is_whitespace()) {
            rest.next();
        }
        if rest.next() == Some('=') {
            return true;
        }
    }

    false
}

fn is_ident_byte(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}
