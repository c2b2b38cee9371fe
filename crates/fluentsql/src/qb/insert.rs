//! INSERT / REPLACE query builder.

use crate::config::FormatConfig;
use crate::qb::conditional::{BranchStack, Branching};
use crate::qb::eol;
use crate::qb::param::ParamList;
use crate::qb::select::SelectQb;
use crate::qb::traits::{BoundParams, QueryType, Rendered, Section, SqlQb, render_subquery};
use crate::value::Value;
use std::fmt;

/// INSERT query builder.
///
/// Rows are either literal VALUES tuples or the result of a nested SELECT;
/// once a SELECT is attached, VALUES are not rendered.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InsertQb {
    /// Target table
    table: String,
    /// Target columns, possibly empty
    columns: Vec<String>,
    /// Execution options such as `IGNORE`
    options: Vec<String>,
    /// `REPLACE` instead of `INSERT`
    replace: bool,
    /// VALUES tuples, in insertion order
    rows: Vec<Vec<Value>>,
    /// `INSERT ... SELECT` source
    select: Option<Box<SelectQb>>,
    branches: BranchStack,
    config: FormatConfig,
}

impl InsertQb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: FormatConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the target table and columns. Replaces any previous target.
    pub fn into<S: Into<String>>(
        mut self,
        table: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        if self.is_active() {
            self.table = table.into();
            self.columns = columns.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Emit `INSERT` (the default).
    pub fn insert(mut self) -> Self {
        if self.is_active() {
            self.replace = false;
        }
        self
    }

    /// Emit `REPLACE` instead of `INSERT`.
    pub fn replace(mut self) -> Self {
        if self.is_active() {
            self.replace = true;
        }
        self
    }

    pub fn is_replace(&self) -> bool {
        self.replace
    }

    /// Add an execution option, emitted between the keyword and `INTO`.
    pub fn option(mut self, option: impl Into<String>) -> Self {
        let option = option.into();
        if self.is_active() && !option.is_empty() && !self.options.contains(&option) {
            self.options.push(option);
        }
        self
    }

    /// Append one row of values.
    pub fn values<T: Into<Value>>(mut self, row: impl IntoIterator<Item = T>) -> Self {
        if self.is_active() {
            self.rows.push(row.into_iter().map(Into::into).collect());
        }
        self
    }

    /// Append several rows.
    pub fn values_rows<T, R>(mut self, rows: impl IntoIterator<Item = R>) -> Self
    where
        T: Into<Value>,
        R: IntoIterator<Item = T>,
    {
        if self.is_active() {
            for row in rows {
                self.rows.push(row.into_iter().map(Into::into).collect());
            }
        }
        self
    }

    /// Insert the rows produced by `qb` instead of VALUES.
    pub fn select(mut self, qb: SelectQb) -> Self {
        if self.is_active() {
            self.select = Some(Box::new(qb));
        }
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn select_part(&self) -> Option<&SelectQb> {
        self.select.as_deref()
    }

    fn into_string(&self, formatted: bool) -> String {
        let keyword = if self.replace { "REPLACE" } else { "INSERT" };
        let mut sql = format!("{keyword} ");
        for option in &self.options {
            sql.push_str(option);
            sql.push(' ');
        }
        sql.push_str("INTO ");
        sql.push_str(self.table.trim());
        sql.push(' ');
        if !self.columns.is_empty() {
            sql.push('(');
            sql.push_str(&self.columns.join(", "));
            sql.push_str(") ");
        }
        sql.push_str(eol(formatted));
        sql
    }

    fn values_string(&self, formatted: bool) -> (String, ParamList) {
        let mut params = ParamList::new();
        if self.rows.is_empty() {
            return (String::new(), params);
        }

        let separator = if formatted { ", \n" } else { ", " };
        let tuples = self
            .rows
            .iter()
            .map(|row| {
                params.extend_values(row.iter().cloned());
                format!("({})", vec!["?"; row.len()].join(", "))
            })
            .collect::<Vec<_>>()
            .join(separator);

        let sql = if formatted {
            format!("VALUES \n{tuples} \n")
        } else {
            format!("VALUES {tuples} ")
        };
        (sql, params)
    }
}

impl Branching for InsertQb {
    fn branches(&self) -> &BranchStack {
        &self.branches
    }

    fn branches_mut(&mut self) -> &mut BranchStack {
        &mut self.branches
    }
}

impl SqlQb for InsertQb {
    fn query_type(&self) -> QueryType {
        QueryType::Insert
    }

    fn render(&self, formatted: bool) -> Rendered {
        if self.table.trim().is_empty() {
            return Rendered::empty();
        }

        let mut sql = self.into_string(formatted);
        let mut params = BoundParams::new();

        match &self.select {
            Some(qb) => {
                let (select_sql, select_params) = render_subquery(qb, formatted);
                sql.push_str(&select_sql);
                params.insert(Section::Select, select_params);
            }
            None => {
                let (values_sql, values_params) = self.values_string(formatted);
                sql.push_str(&values_sql);
                params.insert(Section::Values, values_params);
            }
        }

        Rendered { sql, params }
    }
}

impl fmt::Display for InsertQb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
