//! Human-readable SQL with parameters inlined.
//!
//! The output is for logs and error messages only; never execute it.

use crate::value::Value;

/// Literal quoting rules of a backend.
pub trait Quote {
    /// Render `value` as a SQL literal.
    fn quote(&self, value: &Value) -> String {
        value.to_sql_literal()
    }
}

/// SQL-standard quoting: `'` doubled inside single quotes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardQuote;

impl Quote for StandardQuote {}

/// Substitute positional `?` placeholders with literals.
///
/// With `quoted`, values go through `quoter` (or [`StandardQuote`]); otherwise
/// numbers stay bare and text is wrapped in quotes without escaping.
pub fn debug_query(
    sql: &str,
    params: &[Value],
    quoted: bool,
    quoter: Option<&dyn Quote>,
) -> String {
    substitute(sql, params.iter().map(|v| (None, v)), quoted, quoter)
}

/// Substitute `:name` placeholders with literals, one per entry, in order.
pub fn debug_query_named(
    sql: &str,
    params: &[(&str, Value)],
    quoted: bool,
    quoter: Option<&dyn Quote>,
) -> String {
    substitute(
        sql,
        params.iter().map(|(name, v)| (Some(*name), v)),
        quoted,
        quoter,
    )
}

fn substitute<'a>(
    sql: &str,
    params: impl Iterator<Item = (Option<&'a str>, &'a Value)>,
    quoted: bool,
    quoter: Option<&dyn Quote>,
) -> String {
    let quoter = quoter.unwrap_or(&StandardQuote);
    let mut out = sql.to_string();
    // Positional search resumes after the last inserted literal, so a `?`
    // inside a substituted string is never mistaken for a placeholder.
    let mut cursor = 0;

    for (name, value) in params {
        let literal = if quoted {
            quoter.quote(value)
        } else {
            value.to_plain_literal()
        };

        match name {
            None => {
                if let Some(pos) = out[cursor..].find('?').map(|p| p + cursor) {
                    out.replace_range(pos..pos + 1, &literal);
                    cursor = pos + literal.len();
                }
            }
            Some(name) => {
                let name = name.trim_start_matches(':');
                if let Some((start, end)) = find_named(&out, name) {
                    out.replace_range(start..end, &literal);
                    if end <= cursor {
                        cursor = cursor - (end - start) + literal.len();
                    } else if start < cursor {
                        cursor = start + literal.len();
                    }
                }
            }
        }
    }

    out
}

/// Locate `:name` not followed by another identifier character.
fn find_named(sql: &str, name: &str) -> Option<(usize, usize)> {
    let needle = format!(":{name}");
    let mut from = 0;
    while let Some(found) = sql[from..].find(&needle) {
        let start = from + found;
        let end = start + needle.len();
        let boundary = sql[end..]
            .chars()
            .next()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_'));
        if boundary {
            return Some((start, end));
        }
        from = end;
    }
    None
}
