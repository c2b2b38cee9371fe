//! Fluent query builders.
//!
//! Every builder renders SQL with positional `?` placeholders and an ordered
//! parameter list. Rendering is pure: a builder can be rendered any number of
//! times, formatted or not, and always yields the same placeholders in the
//! same order as [`Rendered::params`].
//!
//! # Usage
//!
//! ```ignore
//! use fluentsql::prelude::*;
//!
//! let books = qb::select()
//!     .select("id")
//!     .select("title")
//!     .from("book")
//!     .ne("title", "Dune")
//!     .or_open()
//!     .gte("score", 5)
//!     .lte("score", 10)
//!     .close_where()
//!     .order_by("title", "ASC")
//!     .paginate(2, 20);
//!
//! assert_eq!(
//!     books.to_sql(),
//!     "SELECT id, title FROM book WHERE title != ? OR ( score >= ? AND score <= ? ) \
//!      ORDER BY title ASC LIMIT 20 OFFSET 20 "
//! );
//!
//! // Optional filters without breaking the chain
//! let author: Option<i64> = None;
//! let qb = qb::select()
//!     .from("book")
//!     .if_(author.is_some())
//!     .eq("author_id", author)
//!     .end_if()?;
//!
//! // INSERT
//! qb::insert_into("book", ["id", "title"])
//!     .values(row![1, "Dune"])
//!     .query(Some(&client), FetchMode::LastInsertId)
//!     .await?;
//!
//! // UPDATE
//! qb::update("book")
//!     .set_value("score", 9)
//!     .eq("id", 1)
//!     .query(Some(&client), FetchMode::Default)
//!     .await?;
//!
//! // DELETE
//! qb::delete_from("book")
//!     .eq("id", 1)
//!     .query(Some(&client), FetchMode::Default)
//!     .await?;
//! ```

pub mod conditional;
pub mod criteria;
pub mod debug;
mod delete;
mod insert;
mod param;
mod select;
mod traits;
mod update;

#[cfg(test)]
mod tests;

pub use conditional::{Branch, BranchStack, Branching};
pub use criteria::{
    Connector, CriteriaItem, CriteriaList, Criterion, CriterionValue, Operator, SubQuery,
};
pub use debug::{Quote, StandardQuote, debug_query, debug_query_named};
pub use delete::DeleteQb;
pub use insert::InsertQb;
pub use param::ParamList;
pub use select::{
    FromSource, GroupBy, Join, JoinType, LimitSpec, MergeOptions, OrderBy, OrderDirection,
    SelectQb,
};
pub use traits::{BoundParams, BuiltQuery, QueryType, Rendered, Section, SqlQb, WhereQb};
pub use update::{Assignment, SetExpr, UpdateQb};

/// Create an empty SELECT query builder.
///
/// # Example
/// ```ignore
/// let qb = fluentsql::qb::select().select("id").from("book").eq("id", 1);
/// ```
pub fn select() -> SelectQb {
    SelectQb::new()
}

/// Create an INSERT query builder for `table`.
///
/// # Example
/// ```ignore
/// let qb = fluentsql::qb::insert_into("book", ["id", "title"]).values(row![1, "Dune"]);
/// ```
pub fn insert_into<S: Into<String>>(
    table: impl Into<String>,
    columns: impl IntoIterator<Item = S>,
) -> InsertQb {
    InsertQb::new().into(table, columns)
}

/// Create a REPLACE query builder for `table`.
pub fn replace_into<S: Into<String>>(
    table: impl Into<String>,
    columns: impl IntoIterator<Item = S>,
) -> InsertQb {
    insert_into(table, columns).replace()
}

/// Create an UPDATE query builder for `table`.
pub fn update(table: impl Into<String>) -> UpdateQb {
    UpdateQb::new().table(table)
}

/// Create a DELETE query builder for `table`.
pub fn delete_from(table: impl Into<String>) -> DeleteQb {
    DeleteQb::new().from(table)
}

/// Line terminator appended after each clause.
pub(crate) fn eol(formatted: bool) -> &'static str {
    if formatted { "\n" } else { "" }
}
