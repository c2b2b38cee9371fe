//! SELECT query builder.

use crate::client::Connection;
use crate::config::FormatConfig;
use crate::error::QbResult;
use crate::qb::conditional::{BranchStack, Branching};
use crate::qb::criteria::{Connector, CriteriaList, Criterion, CriterionValue, Operator};
use crate::qb::eol;
use crate::qb::param::ParamList;
use crate::qb::traits::{
    BoundParams, QueryType, Rendered, Section, SqlQb, WhereQb, check_balanced, render_subquery,
};
use std::fmt;

/// JOIN flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
}

impl JoinType {
    pub fn sql(self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
        }
    }

    /// Parse `INNER JOIN`/`LEFT JOIN`/`RIGHT JOIN`. Anything else is `Inner`.
    pub fn parse(token: &str) -> Self {
        match token {
            "LEFT JOIN" => JoinType::Left,
            "RIGHT JOIN" => JoinType::Right,
            _ => JoinType::Inner,
        }
    }
}

impl From<&str> for JoinType {
    fn from(token: &str) -> Self {
        JoinType::parse(token)
    }
}

/// Sort direction for ORDER BY / GROUP BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn sql(self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }

    /// Strict parse: `ASC`/`DESC` only.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "ASC" => Some(OrderDirection::Asc),
            "DESC" => Some(OrderDirection::Desc),
            _ => None,
        }
    }
}

/// Lenient conversion: anything but `DESC` sorts ascending.
impl From<&str> for OrderDirection {
    fn from(token: &str) -> Self {
        OrderDirection::parse(token).unwrap_or_default()
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql())
    }
}

/// FROM source: a table name or a derived table.
#[derive(Debug, Clone, PartialEq)]
pub enum FromSource {
    Table(String),
    SubQuery(Box<SelectQb>),
}

impl From<&str> for FromSource {
    fn from(table: &str) -> Self {
        FromSource::Table(table.to_string())
    }
}

impl From<String> for FromSource {
    fn from(table: String) -> Self {
        FromSource::Table(table)
    }
}

impl From<SelectQb> for FromSource {
    fn from(qb: SelectQb) -> Self {
        FromSource::SubQuery(Box::new(qb))
    }
}

/// One JOIN clause.
///
/// An ON criterion without `=` is a bare column name, joined against the
/// same column of the preceding table (previous JOIN, or FROM for the first).
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: String,
    pub alias: Option<String>,
    pub criteria: Vec<String>,
    pub join_type: JoinType,
}

impl Join {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: None,
            criteria: Vec::new(),
            join_type: JoinType::Inner,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        self.alias = (!alias.is_empty()).then_some(alias);
        self
    }

    /// Add an ON criterion (raw condition, or bare column name).
    pub fn on(mut self, criterion: impl Into<String>) -> Self {
        self.criteria.push(criterion.into());
        self
    }

    pub fn with_type(mut self, join_type: impl Into<JoinType>) -> Self {
        self.join_type = join_type.into();
        self
    }

    /// Alias if set, table otherwise.
    fn reference(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

/// GROUP BY entry; the direction is only rendered when given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBy {
    pub column: String,
    pub order: Option<OrderDirection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub order: OrderDirection,
}

/// LIMIT with either an explicit offset or a 1-based page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LimitSpec {
    /// Rows per result; `0` disables LIMIT/OFFSET.
    pub limit: u64,
    pub offset: Option<u64>,
    pub page: Option<u64>,
}

/// Which parts `merge_with` carries over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Replace this builder's LIMIT/OFFSET with the other's.
    pub overwrite_limit: bool,
    /// Append the other builder's ORDER BY.
    pub merge_order_by: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            overwrite_limit: true,
            merge_order_by: true,
        }
    }
}

/// SELECT query builder.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectQb {
    /// Execution options such as `DISTINCT`, emitted before the column list
    options: Vec<String>,
    /// Selected columns with optional aliases, in insertion order
    columns: Vec<(String, Option<String>)>,
    /// FROM source
    from: Option<FromSource>,
    /// FROM alias
    from_alias: Option<String>,
    /// JOIN clauses
    joins: Vec<Join>,
    /// WHERE conditions
    where_list: CriteriaList,
    /// GROUP BY entries
    group_by: Vec<GroupBy>,
    /// HAVING conditions
    having: CriteriaList,
    /// ORDER BY entries
    order_by: Vec<OrderBy>,
    /// LIMIT / OFFSET / page
    limit: LimitSpec,
    /// Open `if_` levels
    branches: BranchStack,
    /// Formatted-output indentation
    config: FormatConfig,
}

impl SelectQb {
    /// Create an empty SELECT builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom indentation for formatted output.
    pub fn with_config(mut self, config: FormatConfig) -> Self {
        self.config = config;
        self
    }

    // ==================== SELECT ====================

    fn add_column(&mut self, column: String, alias: Option<String>) {
        if column.is_empty() {
            return;
        }
        match self.columns.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = alias,
            None => self.columns.push((column, alias)),
        }
    }

    /// Add a column (or expression) to the select list.
    ///
    /// Selecting a column again keeps its position and replaces its alias.
    pub fn select(mut self, column: impl Into<String>) -> Self {
        if self.is_active() {
            self.add_column(column.into(), None);
        }
        self
    }

    /// Add `column AS alias`.
    pub fn select_as(mut self, column: impl Into<String>, alias: impl Into<String>) -> Self {
        if self.is_active() {
            let alias = alias.into();
            self.add_column(column.into(), (!alias.is_empty()).then_some(alias));
        }
        self
    }

    /// Add several unaliased columns.
    pub fn columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        if self.is_active() {
            for column in columns {
                self.add_column(column.into(), None);
            }
        }
        self
    }

    /// Add an execution option (emitted only when columns are listed).
    pub fn option(mut self, option: impl Into<String>) -> Self {
        let option = option.into();
        if self.is_active() && !option.is_empty() && !self.options.contains(&option) {
            self.options.push(option);
        }
        self
    }

    /// Add several execution options at once.
    pub fn select_options<S: Into<String>>(self, options: impl IntoIterator<Item = S>) -> Self {
        options.into_iter().fold(self, |qb, option| qb.option(option))
    }

    /// `SELECT DISTINCT ...`
    pub fn distinct(self) -> Self {
        self.option("DISTINCT")
    }

    /// `SELECT SQL_CALC_FOUND_ROWS ...` (MySQL)
    pub fn calc_found_rows(self) -> Self {
        self.option("SQL_CALC_FOUND_ROWS")
    }

    pub fn select_parts(&self) -> &[(String, Option<String>)] {
        &self.columns
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    // ==================== FROM / JOIN ====================

    /// Set the FROM table or derived-table subquery.
    pub fn from(mut self, source: impl Into<FromSource>) -> Self {
        if self.is_active() {
            self.from = match source.into() {
                FromSource::Table(t) if t.is_empty() => None,
                source => Some(source),
            };
            self.from_alias = None;
        }
        self
    }

    /// Set the FROM source with an alias.
    pub fn from_as(self, source: impl Into<FromSource>, alias: impl Into<String>) -> Self {
        let mut qb = self.from(source);
        if qb.is_active() {
            let alias = alias.into();
            qb.from_alias = (!alias.is_empty()).then_some(alias);
        }
        qb
    }

    pub fn from_table(&self) -> Option<&FromSource> {
        self.from.as_ref()
    }

    pub fn from_alias(&self) -> Option<&str> {
        self.from_alias.as_deref()
    }

    /// Add a JOIN.
    pub fn join(mut self, join: Join) -> Self {
        if self.is_active() {
            self.joins.push(join);
        }
        self
    }

    fn join_kind<S: Into<String>>(
        self,
        join_type: JoinType,
        table: impl Into<String>,
        alias: Option<&str>,
        on: impl IntoIterator<Item = S>,
    ) -> Self {
        let mut join = Join::new(table).with_type(join_type);
        if let Some(alias) = alias {
            join = join.alias(alias);
        }
        join.criteria = on.into_iter().map(Into::into).collect();
        self.join(join)
    }

    /// `INNER JOIN table [AS alias] ON ...`
    pub fn inner_join<S: Into<String>>(
        self,
        table: impl Into<String>,
        alias: Option<&str>,
        on: impl IntoIterator<Item = S>,
    ) -> Self {
        self.join_kind(JoinType::Inner, table, alias, on)
    }

    /// `LEFT JOIN table [AS alias] ON ...`
    pub fn left_join<S: Into<String>>(
        self,
        table: impl Into<String>,
        alias: Option<&str>,
        on: impl IntoIterator<Item = S>,
    ) -> Self {
        self.join_kind(JoinType::Left, table, alias, on)
    }

    /// `RIGHT JOIN table [AS alias] ON ...`
    pub fn right_join<S: Into<String>>(
        self,
        table: impl Into<String>,
        alias: Option<&str>,
        on: impl IntoIterator<Item = S>,
    ) -> Self {
        self.join_kind(JoinType::Right, table, alias, on)
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    // ==================== GROUP BY / HAVING ====================

    /// Add a GROUP BY column.
    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        let column = column.into();
        if self.is_active() && !column.is_empty() {
            self.group_by.push(GroupBy { column, order: None });
        }
        self
    }

    /// Add a GROUP BY column with `ASC`/`DESC`; other values add no direction.
    pub fn group_by_ordered(mut self, column: impl Into<String>, order: &str) -> Self {
        let column = column.into();
        if self.is_active() && !column.is_empty() {
            self.group_by.push(GroupBy {
                column,
                order: OrderDirection::parse(order),
            });
        }
        self
    }

    pub fn group_by_parts(&self) -> &[GroupBy] {
        &self.group_by
    }

    /// Append a prepared HAVING criterion.
    pub fn having_criterion(mut self, criterion: Criterion) -> Self {
        if self.is_active() {
            self.having.push(criterion);
        }
        self
    }

    /// Add a HAVING condition with an explicit connector.
    pub fn having_with(
        self,
        column: impl Into<String>,
        value: impl Into<CriterionValue>,
        operator: impl Into<Operator>,
        connector: impl Into<Connector>,
    ) -> QbResult<Self> {
        if !self.is_active() {
            return Ok(self);
        }
        let criterion = Criterion::new(column, value, operator, connector)?;
        Ok(self.having_criterion(criterion))
    }

    /// `AND column op value` in HAVING.
    pub fn having(
        self,
        column: impl Into<String>,
        value: impl Into<CriterionValue>,
        operator: impl Into<Operator>,
    ) -> QbResult<Self> {
        self.having_with(column, value, operator, Connector::And)
    }

    /// `OR column op value` in HAVING.
    pub fn or_having(
        self,
        column: impl Into<String>,
        value: impl Into<CriterionValue>,
        operator: impl Into<Operator>,
    ) -> QbResult<Self> {
        self.having_with(column, value, operator, Connector::Or)
    }

    /// Open a HAVING bracket.
    pub fn open_having(mut self, connector: impl Into<Connector>) -> Self {
        if self.is_active() {
            self.having.open(connector);
        }
        self
    }

    /// Close the innermost HAVING bracket.
    pub fn close_having(mut self) -> Self {
        if self.is_active() {
            self.having.close();
        }
        self
    }

    pub fn having_list(&self) -> &CriteriaList {
        &self.having
    }

    /// `HAVING ...` clause, or an empty string without conditions.
    pub fn having_string(&self, formatted: bool) -> String {
        let (sql, _) = self.having.render_with(formatted, &self.config);
        if sql.is_empty() {
            sql
        } else {
            format!("HAVING {sql}")
        }
    }

    pub fn having_params(&self) -> ParamList {
        self.having.render(false).1
    }

    // ==================== ORDER BY / LIMIT ====================

    /// Add an ORDER BY column. Unknown directions sort ascending.
    pub fn order_by(mut self, column: impl Into<String>, order: impl Into<OrderDirection>) -> Self {
        let column = column.into();
        if self.is_active() && !column.is_empty() {
            self.order_by.push(OrderBy {
                column,
                order: order.into(),
            });
        }
        self
    }

    pub fn order_by_parts(&self) -> &[OrderBy] {
        &self.order_by
    }

    /// Maximum rows to return; `0` removes the limit.
    pub fn limit(mut self, limit: u64) -> Self {
        if self.is_active() {
            self.limit.limit = limit;
        }
        self
    }

    /// Rows to skip. Clears any page.
    pub fn offset(mut self, offset: u64) -> Self {
        if self.is_active() {
            self.limit.offset = Some(offset);
            self.limit.page = None;
        }
        self
    }

    /// 1-based page (`0` means the first). Clears any explicit offset.
    pub fn page(mut self, page: u64) -> Self {
        if self.is_active() {
            self.limit.page = Some(page.max(1));
            self.limit.offset = None;
        }
        self
    }

    /// `limit(per_page)` then `page(page)`.
    pub fn paginate(self, page: u64, per_page: u64) -> Self {
        self.limit(per_page).page(page)
    }

    pub fn get_limit(&self) -> u64 {
        self.limit.limit
    }

    /// Effective offset, derived from the page when one is set.
    pub fn get_offset(&self) -> u64 {
        match self.limit.page {
            Some(page) if self.limit.limit > 0 => {
                self.limit.limit.saturating_mul(page.saturating_sub(1))
            }
            _ => self.limit.offset.unwrap_or(0),
        }
    }

    /// Effective page, derived from the offset when one is set.
    pub fn get_page(&self) -> Option<u64> {
        match self.limit.offset {
            Some(offset) if offset > 0 && self.limit.limit > 0 => {
                Some(offset / self.limit.limit + 1)
            }
            _ => self.limit.page,
        }
    }

    pub fn limit_spec(&self) -> LimitSpec {
        self.limit
    }

    // ==================== Merge ====================

    /// Append another builder's options and columns.
    pub fn merge_select(mut self, other: &SelectQb) -> Self {
        if self.is_active() {
            for option in &other.options {
                if !self.options.contains(option) {
                    self.options.push(option.clone());
                }
            }
            for (column, alias) in &other.columns {
                self.add_column(column.clone(), alias.clone());
            }
        }
        self
    }

    /// Append another builder's joins.
    pub fn merge_join(mut self, other: &SelectQb) -> Self {
        if self.is_active() {
            self.joins.extend(other.joins.iter().cloned());
        }
        self
    }

    /// Append another builder's GROUP BY entries.
    pub fn merge_group_by(mut self, other: &SelectQb) -> Self {
        if self.is_active() {
            self.group_by.extend(other.group_by.iter().cloned());
        }
        self
    }

    /// Append another builder's HAVING items verbatim.
    pub fn merge_having(mut self, other: &SelectQb) -> Self {
        if self.is_active() {
            self.having.extend_from(&other.having);
        }
        self
    }

    /// Append another builder's ORDER BY entries.
    pub fn merge_order_by(mut self, other: &SelectQb) -> Self {
        if self.is_active() {
            self.order_by.extend(other.order_by.iter().cloned());
        }
        self
    }

    /// Take another builder's limit and effective offset.
    pub fn merge_limit(self, other: &SelectQb) -> Self {
        self.limit(other.get_limit()).offset(other.get_offset())
    }

    /// Merge every part of `other`, including ORDER BY and LIMIT.
    pub fn merge(self, other: &SelectQb) -> Self {
        self.merge_with(other, MergeOptions::default())
    }

    /// Merge `other`, optionally keeping this builder's ORDER BY or LIMIT.
    pub fn merge_with(self, other: &SelectQb, options: MergeOptions) -> Self {
        let mut qb = self
            .merge_select(other)
            .merge_join(other)
            .merge_where(other)
            .merge_group_by(other)
            .merge_having(other);
        if options.merge_order_by {
            qb = qb.merge_order_by(other);
        }
        if options.overwrite_limit {
            qb = qb.merge_limit(other);
        }
        qb
    }

    // ==================== COUNT ====================

    /// This query with `COUNT(*)` as its only column and no ORDER BY/LIMIT.
    pub fn count_query(&self) -> SelectQb {
        let mut qb = self.clone();
        qb.columns = vec![("COUNT(*)".to_string(), None)];
        qb.order_by.clear();
        qb.limit = LimitSpec::default();
        qb.branches = BranchStack::new();
        qb
    }

    /// Count the rows this query matches.
    ///
    /// Runs [`SelectQb::count_query`]; the builder itself is not modified.
    pub async fn count<C: Connection>(&self, conn: &C) -> QbResult<i64> {
        self.validate()?;
        let built = self.count_query().build();
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "fluentsql.sql",
            params = built.params.len(),
            sql = %built.sql,
            "counting rows"
        );
        conn.fetch_count(&built.sql, built.params.values()).await
    }

    // ==================== Build ====================

    fn select_string(&self, formatted: bool) -> String {
        let mut select = self
            .columns
            .iter()
            .map(|(column, alias)| match alias {
                Some(alias) => format!("{column} AS {alias}"),
                None => column.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");

        if select.is_empty() {
            select.push('*');
        } else if !self.options.is_empty() {
            select = format!("{} {}", self.options.join(" "), select);
        }

        format!("SELECT {select} {}", eol(formatted))
    }

    /// `FROM ... ` including joins, plus the derived table's parameters.
    fn from_string(&self, formatted: bool) -> (String, ParamList) {
        let Some(source) = &self.from else {
            return (String::new(), ParamList::new());
        };

        let (mut from, params) = match source {
            FromSource::Table(table) => (table.clone(), ParamList::new()),
            FromSource::SubQuery(qb) => {
                let (sql, params) = render_subquery(qb, formatted);
                let lead = if formatted { " \n" } else { "" };
                (format!("({lead}{sql})"), params)
            }
        };
        if let Some(alias) = &self.from_alias {
            from.push_str(" AS ");
            from.push_str(alias);
        }

        let mut out = format!("FROM {} {}", from.trim(), eol(formatted));
        out.push_str(&self.join_string(formatted));
        (out, params)
    }

    /// Name the table at `index - 1` is referred to by (previous JOIN or FROM).
    fn previous_reference(&self, index: usize) -> &str {
        if let Some(prev) = index.checked_sub(1).and_then(|i| self.joins.get(i)) {
            return prev.reference();
        }
        match (&self.from_alias, &self.from) {
            (Some(alias), _) => alias.as_str(),
            (None, Some(FromSource::Table(table))) => table.as_str(),
            _ => "",
        }
    }

    fn join_string(&self, formatted: bool) -> String {
        let mut out = String::new();
        for (i, join) in self.joins.iter().enumerate() {
            out.push_str(join.join_type.sql());
            out.push(' ');
            out.push_str(&join.table);
            if let Some(alias) = &join.alias {
                out.push_str(" AS ");
                out.push_str(alias);
            }
            out.push(' ');
            out.push_str(eol(formatted));

            for (x, criterion) in join.criteria.iter().enumerate() {
                out.push_str(if x == 0 { "ON " } else { "AND " });
                if criterion.contains('=') {
                    out.push_str(criterion.trim());
                } else {
                    let column = criterion.trim();
                    out.push_str(&format!(
                        "{}.{column} = {}.{column}",
                        self.previous_reference(i),
                        join.reference()
                    ));
                }
                out.push(' ');
                out.push_str(eol(formatted));
            }
        }
        out
    }

    fn group_by_string(&self, formatted: bool) -> String {
        if self.group_by.is_empty() {
            return String::new();
        }
        let parts = self
            .group_by
            .iter()
            .map(|g| match g.order {
                Some(order) => format!("{} {order}", g.column),
                None => g.column.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("GROUP BY {parts} {}", eol(formatted))
    }

    fn order_by_string(&self, formatted: bool) -> String {
        if self.order_by.is_empty() {
            return String::new();
        }
        let parts = self
            .order_by
            .iter()
            .map(|o| format!("{} {}", o.column, o.order))
            .collect::<Vec<_>>()
            .join(", ");
        format!("ORDER BY {parts} {}", eol(formatted))
    }

    fn limit_string(&self, formatted: bool) -> String {
        if self.limit.limit == 0 {
            return String::new();
        }
        let nl = eol(formatted);
        format!(
            "LIMIT {} {nl}OFFSET {} {nl}",
            self.limit.limit,
            self.get_offset()
        )
    }
}

impl Branching for SelectQb {
    fn branches(&self) -> &BranchStack {
        &self.branches
    }

    fn branches_mut(&mut self) -> &mut BranchStack {
        &mut self.branches
    }
}

impl WhereQb for SelectQb {
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

impl SqlQb for SelectQb {
    fn query_type(&self) -> QueryType {
        QueryType::Select
    }

    fn render(&self, formatted: bool) -> Rendered {
        if self.from.is_none() && self.columns.is_empty() {
            return Rendered::empty();
        }

        let mut params = BoundParams::new();
        let mut sql = self.select_string(formatted);

        let (from_sql, from_params) = self.from_string(formatted);
        sql.push_str(&from_sql);
        params.insert(Section::From, from_params);

        let (where_sql, where_params) = self.where_list.render_with(formatted, &self.config);
        if !where_sql.is_empty() {
            sql.push_str("WHERE ");
            sql.push_str(&where_sql);
        }
        params.insert(Section::Where, where_params);

        sql.push_str(&self.group_by_string(formatted));

        let (having_sql, having_params) = self.having.render_with(formatted, &self.config);
        if !having_sql.is_empty() {
            sql.push_str("HAVING ");
            sql.push_str(&having_sql);
        }
        params.insert(Section::Having, having_params);

        sql.push_str(&self.order_by_string(formatted));
        sql.push_str(&self.limit_string(formatted));

        Rendered { sql, params }
    }

    fn validate(&self) -> QbResult<()> {
        check_balanced("where", &self.where_list)?;
        check_balanced("having", &self.having)
    }
}

impl fmt::Display for SelectQb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
