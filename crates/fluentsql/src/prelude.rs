//! Convenient imports for typical `fluentsql` usage.
//!
//! Builder methods live on traits, so most code starts with:
//!
//! ```ignore
//! use fluentsql::prelude::*;
//! ```

pub use crate::qb::{self, Branching, Connector, Criterion, Operator, SqlQb, WhereQb};
pub use crate::{
    Connection, DeleteQb, FetchMode, FormatConfig, InsertQb, QbError, QbResult, QueryOutput,
    SelectQb, UpdateQb, Value, row,
};
