//! UPDATE query builder.

use crate::config::FormatConfig;
use crate::qb::conditional::{BranchStack, Branching};
use crate::qb::criteria::CriteriaList;
use crate::qb::eol;
use crate::qb::param::ParamList;
use crate::qb::select::SelectQb;
use crate::qb::traits::{
    BoundParams, QueryType, Rendered, Section, SqlQb, WhereQb, check_balanced, render_subquery,
};
use crate::value::Value;
use std::fmt;

/// Right-hand side of a SET assignment.
#[derive(Clone, Debug, PartialEq)]
pub enum SetExpr {
    /// `col = ?`, bound to the first value (or NULL).
    Placeholder,
    /// Verbatim SQL; values are bound only if it contains `?`.
    Expression(String),
    /// `col = (<subquery>)`; values are ignored.
    SubQuery(Box<SelectQb>),
}

impl From<&str> for SetExpr {
    fn from(expr: &str) -> Self {
        SetExpr::from(expr.to_string())
    }
}

/// An empty string means a plain placeholder.
impl From<String> for SetExpr {
    fn from(expr: String) -> Self {
        if expr.trim().is_empty() {
            SetExpr::Placeholder
        } else {
            SetExpr::Expression(expr)
        }
    }
}

impl From<SelectQb> for SetExpr {
    fn from(qb: SelectQb) -> Self {
        SetExpr::SubQuery(Box::new(qb))
    }
}

/// One `column = ...` assignment.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub expr: SetExpr,
    pub values: Vec<Value>,
}

impl Assignment {
    fn render_into(&self, sql: &mut String, params: &mut ParamList, formatted: bool) {
        match &self.expr {
            SetExpr::Placeholder => {
                sql.push_str(&format!("{} = ?", self.column));
                params.push(self.values.first().cloned().unwrap_or(Value::Null));
            }
            SetExpr::Expression(expr) => {
                sql.push_str(&format!("{} = {}", self.column, expr.trim()));
                if expr.contains('?') {
                    params.extend_values(self.values.iter().cloned());
                }
            }
            SetExpr::SubQuery(qb) => {
                let (sub_sql, sub_params) = render_subquery(qb, formatted);
                sql.push_str(&format!("{} = ({}{})", self.column, eol(formatted), sub_sql));
                params.extend(&sub_params);
            }
        }
    }
}

/// UPDATE query builder.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateQb {
    /// Target table
    table: String,
    /// Execution options such as `LOW_PRIORITY`
    options: Vec<String>,
    /// SET assignments in order
    assignments: Vec<Assignment>,
    /// WHERE conditions
    where_list: CriteriaList,
    branches: BranchStack,
    config: FormatConfig,
}

impl UpdateQb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: FormatConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the target table.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        if self.is_active() {
            self.table = table.into();
        }
        self
    }

    /// Add an execution option, emitted before the table name.
    pub fn option(mut self, option: impl Into<String>) -> Self {
        let option = option.into();
        if self.is_active() && !option.is_empty() && !self.options.contains(&option) {
            self.options.push(option);
        }
        self
    }

    /// Add an assignment.
    pub fn set<T: Into<Value>>(
        mut self,
        column: impl Into<String>,
        expr: impl Into<SetExpr>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        if self.is_active() {
            self.assignments.push(Assignment {
                column: column.into(),
                expr: expr.into(),
                values: values.into_iter().map(Into::into).collect(),
            });
        }
        self
    }

    /// `column = ?`
    pub fn set_value(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, SetExpr::Placeholder, [value.into()])
    }

    /// `column = <expr>`, e.g. `set_expr("hits", "hits + ?", [1])`.
    pub fn set_expr<T: Into<Value>>(
        self,
        column: impl Into<String>,
        expr: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        self.set(column, SetExpr::from(expr.into()), values)
    }

    /// `column = (<subquery>)`
    pub fn set_subquery(self, column: impl Into<String>, qb: SelectQb) -> Self {
        self.set(column, SetExpr::from(qb), Vec::<Value>::new())
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    fn set_string(&self, formatted: bool) -> (String, ParamList) {
        let mut params = ParamList::new();
        if self.assignments.is_empty() {
            return (String::new(), params);
        }

        let nl = eol(formatted);
        let mut sql = format!("SET {nl}");
        for (i, assignment) in self.assignments.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
                sql.push_str(nl);
            }
            assignment.render_into(&mut sql, &mut params, formatted);
        }
        sql.push(' ');
        sql.push_str(nl);
        (sql, params)
    }
}

impl Branching for UpdateQb {
    fn branches(&self) -> &BranchStack {
        &self.branches
    }

    fn branches_mut(&mut self) -> &mut BranchStack {
        &mut self.branches
    }
}

impl WhereQb for UpdateQb {
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

impl SqlQb for UpdateQb {
    fn query_type(&self) -> QueryType {
        QueryType::Update
    }

    fn render(&self, formatted: bool) -> Rendered {
        let table = self.table.trim();
        if table.is_empty() {
            return Rendered::empty();
        }

        let mut sql = String::from("UPDATE ");
        for option in &self.options {
            sql.push_str(option);
            sql.push(' ');
        }
        sql.push_str(table);
        sql.push(' ');
        sql.push_str(eol(formatted));

        let mut params = BoundParams::new();
        let (set_sql, set_params) = self.set_string(formatted);
        sql.push_str(&set_sql);
        params.insert(Section::Set, set_params);

        let (where_sql, where_params) = self.where_list.render_with(formatted, &self.config);
        if !where_sql.is_empty() {
            sql.push_str("WHERE ");
            sql.push_str(&where_sql);
        }
        params.insert(Section::Where, where_params);

        Rendered { sql, params }
    }

    fn validate(&self) -> crate::error::QbResult<()> {
        check_balanced("where", &self.where_list)
    }
}

impl fmt::Display for UpdateQb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
