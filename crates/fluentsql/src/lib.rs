//! # fluentsql
//!
//! A fluent SQL statement builder for Rust.
//!
//! ## Features
//!
//! - **Placeholders only**: values never enter the SQL text; every builder
//!   renders `?` placeholders plus an ordered parameter list
//! - **Criteria engine**: AND/OR conditions with nested brackets for WHERE
//!   and HAVING, rendered flat or pretty-printed
//! - **Conditional chains**: `if_` / `else_if` / `else_` / `end_if` keep
//!   optional filters inside one method chain
//! - **Debug rendering**: inline the parameters as quoted literals for logs
//! - **Driver-agnostic**: execution goes through the [`Connection`] trait; a
//!   tokio-postgres implementation ships behind the `postgres` feature
//!
//! ## Query Builder (qb)
//!
//! ```ignore
//! use fluentsql::prelude::*;
//!
//! // SELECT
//! let rows = qb::select()
//!     .select("id")
//!     .from("book")
//!     .like("title", "%dune%")
//!     .order_by("id", "DESC")
//!     .limit(10)
//!     .query(Some(&client), FetchMode::Default)
//!     .await?;
//!
//! // Row count of the same filter
//! let total = qb::select().from("book").like("title", "%dune%").count(&client).await?;
//!
//! // Debug output, no connection needed
//! let sql = qb::delete_from("book").eq("title", "l'île au trésor").debug(true, false);
//! assert_eq!(sql, "DELETE FROM book WHERE title = 'l''île au trésor' ");
//! ```

pub mod client;
pub mod config;
pub mod error;
#[cfg(feature = "postgres")]
pub mod pg;
pub mod prelude;
pub mod qb;
pub mod value;

pub use client::{Connection, FetchMode, QueryOutput};
pub use config::FormatConfig;
pub use error::{QbError, QbResult};
pub use value::Value;

// Re-export qb module for easy access
pub use qb::{
    DeleteQb, InsertQb, SelectQb, SqlQb, UpdateQb, WhereQb, delete_from, insert_into,
    replace_into, select, update,
};
