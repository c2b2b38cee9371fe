//! DELETE query builder.

use crate::config::FormatConfig;
use crate::error::QbResult;
use crate::qb::conditional::{BranchStack, Branching};
use crate::qb::criteria::CriteriaList;
use crate::qb::eol;
use crate::qb::traits::{BoundParams, QueryType, Rendered, Section, SqlQb, WhereQb, check_balanced};
use std::fmt;

/// DELETE query builder.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeleteQb {
    /// Target table
    table: String,
    /// Execution options such as `QUICK`
    options: Vec<String>,
    /// WHERE conditions
    where_list: CriteriaList,
    branches: BranchStack,
    config: FormatConfig,
}

impl DeleteQb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: FormatConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the table rows are deleted from.
    pub fn from(mut self, table: impl Into<String>) -> Self {
        if self.is_active() {
            self.table = table.into();
        }
        self
    }

    pub fn option(mut self, option: impl Into<String>) -> Self {
        let option = option.into();
        if self.is_active() && !option.is_empty() && !self.options.contains(&option) {
            self.options.push(option);
        }
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl Branching for DeleteQb {
    fn branches(&self) -> &BranchStack {
        &self.branches
    }

    fn branches_mut(&mut self) -> &mut BranchStack {
        &mut self.branches
    }
}

impl WhereQb for DeleteQb {
    fn where_list(&self) -> &CriteriaList {
        &self.where_list
    }

    fn where_list_mut(&mut self) -> &mut CriteriaList {
        &mut self.where_list
    }

    fn format_config(&self) -> &FormatConfig {
        &self.config
    }
}

impl SqlQb for DeleteQb {
    fn query_type(&self) -> QueryType {
        QueryType::Delete
    }

    fn render(&self, formatted: bool) -> Rendered {
        let table = self.table.trim();
        if table.is_empty() {
            return Rendered::empty();
        }

        let mut sql = String::from("DELETE ");
        for option in &self.options {
            sql.push_str(option);
            sql.push(' ');
        }
        sql.push_str("FROM ");
        sql.push_str(table);
        sql.push(' ');
        sql.push_str(eol(formatted));

        let (where_sql, where_params) = self.where_list.render_with(formatted, &self.config);
        if !where_sql.is_empty() {
            sql.push_str("WHERE ");
            sql.push_str(&where_sql);
        }

        let mut params = BoundParams::new();
        params.insert(Section::Where, where_params);
        Rendered { sql, params }
    }

    fn validate(&self) -> QbResult<()> {
        check_balanced("where", &self.where_list)
    }
}

impl fmt::Display for DeleteQb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
