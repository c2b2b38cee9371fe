//! tokio-postgres backend.
//!
//! Builders emit `?` placeholders; PostgreSQL expects `$1, $2, ...`. The
//! [`Connection`] impls here renumber placeholders before sending, skipping
//! quoted literals and identifiers, `--` and `/* */` comments, and
//! dollar-quoted bodies. `?`-based operators such as jsonb `?|` cannot be
//! used through this adapter.

use crate::client::Connection;
use crate::error::{QbError, QbResult};
use crate::qb::debug::Quote;
use crate::value::Value;
use tokio_postgres::Row;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;

/// Rewrite `?` placeholders to `$n`, leaving quoted text and comments
/// untouched.
pub fn number_placeholders(sql: &str) -> String {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0usize;
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        i = match bytes[i] {
            b'\'' => skip_past(sql, i + 1, "'"),
            b'"' => skip_past(sql, i + 1, "\""),
            b'-' if bytes.get(i + 1) == Some(&b'-') => skip_past(sql, i + 2, "\n"),
            b'/' if bytes.get(i + 1) == Some(&b'*') => skip_past(sql, i + 2, "*/"),
            b'$' => match dollar_tag(&sql[i..]) {
                Some(tag) => skip_past(sql, i + tag.len(), tag),
                None => i + 1,
            },
            b'?' => {
                n += 1;
                out.push_str(&sql[copied..i]);
                out.push('$');
                out.push_str(&n.to_string());
                copied = i + 1;
                i + 1
            }
            _ => i + 1,
        };
    }

    out.push_str(&sql[copied..]);
    out
}

/// Index just past the next `end` at or after `from`, or the end of `sql`.
fn skip_past(sql: &str, from: usize, end: &str) -> usize {
    sql[from..].find(end).map_or(sql.len(), |p| from + p + end.len())
}

/// The `$tag$` opening `s`, if any. `$1`-style parameters are not tags.
fn dollar_tag(s: &str) -> Option<&str> {
    let rest = &s[1..];
    let len = rest.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))?;
    if rest.as_bytes()[len] != b'$' || rest.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some(&s[..len + 2])
}

fn as_refs(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

macro_rules! impl_pg_connection {
    ($($client:ty),*) => {
        $(
            impl Quote for $client {}

            impl Connection for $client {
                type Row = Row;

                async fn fetch_all(&self, sql: &str, params: &[Value]) -> QbResult<Vec<Row>> {
                    let sql = number_placeholders(sql);
                    Ok(self.query(sql.as_str(), &as_refs(params)).await?)
                }

                async fn execute(&self, sql: &str, params: &[Value]) -> QbResult<u64> {
                    let sql = number_placeholders(sql);
                    Ok(self.execute(sql.as_str(), &as_refs(params)).await?)
                }

                async fn fetch_count(&self, sql: &str, params: &[Value]) -> QbResult<i64> {
                    let sql = number_placeholders(sql);
                    // Grouped counts return one row per group; the first wins.
                    let rows = self.query(sql.as_str(), &as_refs(params)).await?;
                    let row = rows
                        .first()
                        .ok_or_else(|| QbError::not_found("count query returned no row"))?;
                    Ok(row.try_get::<_, i64>(0)?)
                }

                async fn last_insert_id(&self) -> QbResult<Option<i64>> {
                    match self.query_one("SELECT lastval()", &[]).await {
                        Ok(row) => Ok(row.try_get::<_, i64>(0).ok()),
                        // No sequence was touched in this session.
                        Err(e) if e.code() == Some(&SqlState::OBJECT_NOT_IN_PREREQUISITE_STATE) => {
                            Ok(None)
                        }
                        Err(e) => Err(e.into()),
                    }
                }
            }
        )*
    };
}

impl_pg_connection!(tokio_postgres::Client, tokio_postgres::Transaction<'_>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_placeholders() {
        assert_eq!(
            number_placeholders("SELECT * FROM book WHERE id = ? AND score BETWEEN ? AND ? "),
            "SELECT * FROM book WHERE id = $1 AND score BETWEEN $2 AND $3 "
        );
    }

    #[test]
    fn test_number_placeholders_skips_literals() {
        let sql = "SELECT '?', \"a?b\" FROM t WHERE x = ? AND y = 'it''s ?' AND z = ?";
        assert_eq!(
            number_placeholders(sql),
            "SELECT '?', \"a?b\" FROM t WHERE x = $1 AND y = 'it''s ?' AND z = $2"
        );
    }

    #[test]
    fn test_number_placeholders_skips_comments() {
        let sql = "SELECT * FROM t -- why?\nWHERE x = ? /* a ? b */ AND y = ?";
        assert_eq!(
            number_placeholders(sql),
            "SELECT * FROM t -- why?\nWHERE x = $1 /* a ? b */ AND y = $2"
        );
        assert_eq!(number_placeholders("x = ? -- trailing ?"), "x = $1 -- trailing ?");
        assert_eq!(number_placeholders("a - ? - b"), "a - $1 - b");
    }

    #[test]
    fn test_number_placeholders_skips_dollar_quotes() {
        assert_eq!(
            number_placeholders("x = $$ a ? b $$ AND y = $fn$ ? $fn$ AND z = ?"),
            "x = $$ a ? b $$ AND y = $fn$ ? $fn$ AND z = $1"
        );
        assert_eq!(number_placeholders("x = $1 AND y = ?"), "x = $1 AND y = $1");
        assert_eq!(number_placeholders("é = ? AND ü = ?"), "é = $1 AND ü = $2");
    }
}
