//! Connection trait used to execute built statements.

use crate::error::QbResult;
use crate::qb::debug::Quote;
use crate::value::Value;

/// A database handle able to run `?`-placeholder SQL.
///
/// Builders never own a connection; one is passed to each execution call.
/// Implementations translate placeholders to the backend's syntax, bind the
/// values in order and surface backend errors unchanged.
///
/// `Quote` supplies the literal escaping used by debug rendering.
pub trait Connection: Quote + Send + Sync {
    /// Row type returned by SELECT statements.
    type Row: Send;

    /// Execute a query and return all rows.
    fn fetch_all(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = QbResult<Vec<Self::Row>>> + Send;

    /// Execute a statement and return the affected row count.
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = QbResult<u64>> + Send;

    /// Execute a `SELECT COUNT(*) ...` and return the scalar.
    ///
    /// A grouped count yields one row per group; the first row is read.
    fn fetch_count(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = QbResult<i64>> + Send;

    /// Id generated by the last INSERT on this connection, if the backend
    /// can tell.
    ///
    /// The default implementation returns `Ok(None)`.
    fn last_insert_id(&self) -> impl std::future::Future<Output = QbResult<Option<i64>>> + Send {
        async move { Ok(None) }
    }
}

/// What `query()` should return for INSERT statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Rows for SELECT, affected row count otherwise.
    #[default]
    Default,
    /// The generated id of the inserted row (INSERT only).
    LastInsertId,
}

/// Outcome of `query()`.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput<R> {
    /// The builder rendered no SQL; nothing was executed.
    Empty,
    /// No connection was supplied: the quoted, formatted debug SQL.
    Sql(String),
    Rows(Vec<R>),
    RowCount(u64),
    LastInsertId(i64),
}

impl<R> QueryOutput<R> {
    pub fn is_empty(&self) -> bool {
        matches!(self, QueryOutput::Empty)
    }

    pub fn into_rows(self) -> Option<Vec<R>> {
        match self {
            QueryOutput::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn row_count(&self) -> Option<u64> {
        match self {
            QueryOutput::RowCount(n) => Some(*n),
            _ => None,
        }
    }

    pub fn sql(&self) -> Option<&str> {
        match self {
            QueryOutput::Sql(sql) => Some(sql),
            _ => None,
        }
    }
}
