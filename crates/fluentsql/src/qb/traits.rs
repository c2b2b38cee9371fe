//! Trait definitions for query builders.

use crate::client::{Connection, FetchMode, QueryOutput};
use crate::config::FormatConfig;
use crate::error::QbResult;
use crate::qb::conditional::Branching;
use crate::qb::criteria::{
    Connector, CriteriaList, Criterion, CriterionValue, Operator, SubQuery,
};
use crate::qb::debug::{Quote, StandardQuote, debug_query};
use crate::qb::param::ParamList;
use crate::qb::select::SelectQb;
use crate::value::Value;

/// Statement kind, used to pick how `query()` executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
}

/// Named partition of bound parameters, one per clause that binds values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Derived-table subquery in FROM.
    From,
    Where,
    Having,
    Set,
    Values,
    /// `INSERT ... SELECT` source query.
    Select,
}

impl Section {
    pub fn name(self) -> &'static str {
        match self {
            Section::From => "from",
            Section::Where => "where",
            Section::Having => "having",
            Section::Set => "set",
            Section::Values => "values",
            Section::Select => "select",
        }
    }
}

/// Per-section parameters in the order their clauses appear in the SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundParams {
    sections: Vec<(Section, ParamList)>,
}

impl BoundParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a section's parameters. A repeated section is extended in place.
    pub fn insert(&mut self, section: Section, params: ParamList) {
        match self.sections.iter_mut().find(|(s, _)| *s == section) {
            Some((_, existing)) => existing.extend(&params),
            None => self.sections.push((section, params)),
        }
    }

    pub fn get(&self, section: Section) -> Option<&ParamList> {
        self.sections
            .iter()
            .find(|(s, _)| *s == section)
            .map(|(_, p)| p)
    }

    /// Parameters of one section, empty if the section did not render.
    pub fn section(&self, section: Section) -> ParamList {
        self.get(section).cloned().unwrap_or_default()
    }

    /// All parameters, flattened in section order.
    pub fn merged(&self) -> ParamList {
        let mut all = ParamList::new();
        for (_, params) in &self.sections {
            all.extend(params);
        }
        all
    }

    pub fn iter(&self) -> impl Iterator<Item = (Section, &ParamList)> {
        self.sections.iter().map(|(s, p)| (*s, p))
    }

    /// Total parameter count over all sections.
    pub fn len(&self) -> usize {
        self.sections.iter().map(|(_, p)| p.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of one render: SQL text plus its sectioned parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rendered {
    pub sql: String,
    pub params: BoundParams,
}

impl Rendered {
    /// A degenerate statement: no SQL, no parameters.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// The result of building a query.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: ParamList,
}

impl BuiltQuery {
    /// Create a new built query.
    pub fn new(sql: String, params: ParamList) -> Self {
        Self { sql, params }
    }
}

/// Base trait for all query builders.
///
/// Rendering is pure: every call recomputes SQL and parameters from the
/// builder's parts, so the placeholder order always matches [`Rendered::params`].
pub trait SqlQb: Sync {
    fn query_type(&self) -> QueryType;

    /// Render SQL and per-section parameters.
    ///
    /// Returns [`Rendered::empty`] when a required part (table, columns) is
    /// missing.
    fn render(&self, formatted: bool) -> Rendered;

    /// SQL text, optionally spread over multiple lines.
    fn query_string(&self, formatted: bool) -> String {
        self.render(formatted).sql
    }

    /// Debug helper to get the single-line SQL string.
    fn to_sql(&self) -> String {
        self.query_string(false)
    }

    /// All bound parameters in placeholder order.
    fn bound_parameters(&self) -> ParamList {
        self.render(false).params.merged()
    }

    /// Bound parameters rendered as literals by `quoter`.
    fn bound_parameters_quoted(&self, quoter: &dyn Quote) -> Vec<String> {
        self.bound_parameters()
            .values()
            .iter()
            .map(|v| quoter.quote(v))
            .collect()
    }

    /// Bound parameters of one section.
    fn section_params(&self, section: Section) -> ParamList {
        self.render(false).params.section(section)
    }

    /// Single-line SQL with its flattened parameters.
    fn build(&self) -> BuiltQuery {
        let rendered = self.render(false);
        BuiltQuery::new(rendered.sql, rendered.params.merged())
    }

    /// Validate builder state before execution.
    fn validate(&self) -> QbResult<()> {
        Ok(())
    }

    /// SQL with placeholders replaced by literals, for logs only.
    ///
    /// Without a connection, strings use SQL-standard quote doubling.
    fn debug(&self, quoted: bool, formatted: bool) -> String {
        self.debug_with(&StandardQuote, quoted, formatted)
    }

    /// Like [`SqlQb::debug`], quoting with a connection's rules.
    fn debug_with(&self, quoter: &dyn Quote, quoted: bool, formatted: bool) -> String {
        let rendered = self.render(formatted);
        debug_query(
            &rendered.sql,
            rendered.params.merged().values(),
            quoted,
            Some(quoter),
        )
    }

    /// Execute against `conn`.
    ///
    /// - empty SQL: [`QueryOutput::Empty`], nothing is sent
    /// - no connection: [`QueryOutput::Sql`] with the quoted, formatted debug SQL
    /// - SELECT: all rows
    /// - INSERT: affected rows, or the last insert id when `fetch` asks for it
    ///   and a row was written
    /// - UPDATE/DELETE: affected rows
    fn query<C: Connection>(
        &self,
        conn: Option<&C>,
        fetch: FetchMode,
    ) -> impl std::future::Future<Output = QbResult<QueryOutput<C::Row>>> + Send {
        async move {
            let built = self.build();
            if built.sql.is_empty() {
                #[cfg(feature = "tracing")]
                tracing::trace!(target: "fluentsql.sql", "skipping empty statement");
                return Ok(QueryOutput::Empty);
            }

            let Some(conn) = conn else {
                return Ok(QueryOutput::Sql(self.debug(true, true)));
            };

            self.validate()?;

            let query_type = self.query_type();
            #[cfg(feature = "tracing")]
            tracing::debug!(
                target: "fluentsql.sql",
                query_type = ?query_type,
                params = built.params.len(),
                sql = %built.sql,
                "executing statement"
            );

            match query_type {
                QueryType::Select => conn
                    .fetch_all(&built.sql, built.params.values())
                    .await
                    .map(QueryOutput::Rows),
                QueryType::Insert => {
                    let affected = conn.execute(&built.sql, built.params.values()).await?;
                    if fetch == FetchMode::LastInsertId && affected > 0 {
                        if let Some(id) = conn.last_insert_id().await? {
                            return Ok(QueryOutput::LastInsertId(id));
                        }
                    }
                    Ok(QueryOutput::RowCount(affected))
                }
                QueryType::Update | QueryType::Delete => conn
                    .execute(&built.sql, built.params.values())
                    .await
                    .map(QueryOutput::RowCount),
            }
        }
    }
}

/// WHERE clause surface shared by SELECT, UPDATE and DELETE.
///
/// Every method honours the builder's conditional state: on an inactive
/// branch the builder is returned unchanged.
pub trait WhereQb: Branching {
    fn where_list(&self) -> &CriteriaList;

    fn where_list_mut(&mut self) -> &mut CriteriaList;

    fn format_config(&self) -> &FormatConfig;

    /// Append a prepared criterion.
    fn where_criterion(mut self, criterion: Criterion) -> Self {
        if self.is_active() {
            self.where_list_mut().push(criterion);
        }
        self
    }

    /// Add a condition with an explicit connector.
    ///
    /// Unknown operators fall back to `=`; unknown connectors to `AND`.
    /// Fails only for a BETWEEN without exactly two values, or a list given
    /// to a single-value comparison.
    fn where_with(
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
        Ok(self.where_criterion(criterion))
    }

    /// `AND column op value`
    fn where_(
        self,
        column: impl Into<String>,
        value: impl Into<CriterionValue>,
        operator: impl Into<Operator>,
    ) -> QbResult<Self> {
        self.where_with(column, value, operator, Connector::And)
    }

    /// `OR column op value`
    fn or_where(
        self,
        column: impl Into<String>,
        value: impl Into<CriterionValue>,
        operator: impl Into<Operator>,
    ) -> QbResult<Self> {
        self.where_with(column, value, operator, Connector::Or)
    }

    // ==================== Shortcuts ====================

    /// Add WHERE: column = value
    fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_criterion(Criterion::eq(column, value))
    }

    /// Add WHERE: column != value
    fn ne(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_criterion(Criterion::ne(column, value))
    }

    /// Add WHERE: column < value
    fn lt(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_criterion(Criterion::lt(column, value))
    }

    /// Add WHERE: column <= value
    fn lte(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_criterion(Criterion::lte(column, value))
    }

    /// Add WHERE: column > value
    fn gt(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_criterion(Criterion::gt(column, value))
    }

    /// Add WHERE: column >= value
    fn gte(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_criterion(Criterion::gte(column, value))
    }

    /// Add WHERE: column LIKE pattern
    fn like(self, column: impl Into<String>, pattern: impl Into<Value>) -> Self {
        self.where_criterion(Criterion::like(column, pattern))
    }

    /// Add WHERE: column NOT LIKE pattern
    fn not_like(self, column: impl Into<String>, pattern: impl Into<Value>) -> Self {
        self.where_criterion(Criterion::not_like(column, pattern))
    }

    /// Add WHERE: column IN (values...)
    fn in_list<T: Into<Value>>(
        self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        self.where_criterion(Criterion::in_list(column, values))
    }

    /// Add WHERE: column NOT IN (values...)
    fn not_in<T: Into<Value>>(
        self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        self.where_criterion(Criterion::not_in(column, values))
    }

    /// Add WHERE: column BETWEEN low AND high (bounds may come in any order)
    fn between(
        self,
        column: impl Into<String>,
        a: impl Into<Value>,
        b: impl Into<Value>,
    ) -> Self {
        self.where_criterion(Criterion::between(column, a, b))
    }

    /// Add WHERE: column NOT BETWEEN low AND high
    fn not_between(
        self,
        column: impl Into<String>,
        a: impl Into<Value>,
        b: impl Into<Value>,
    ) -> Self {
        self.where_criterion(Criterion::not_between(column, a, b))
    }

    /// Add WHERE: column IS NULL
    fn is_null(self, column: impl Into<String>) -> Self {
        self.where_criterion(Criterion::is_null(column))
    }

    /// Add WHERE: column IS NOT NULL
    fn is_not_null(self, column: impl Into<String>) -> Self {
        self.where_criterion(Criterion::is_not_null(column))
    }

    /// Add a raw WHERE condition; `values` bind its `?` placeholders.
    fn where_raw<T: Into<Value>>(
        self,
        sql: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        self.where_criterion(Criterion::raw(sql, values))
    }

    /// Add WHERE: column IN ( subquery )
    fn where_in_subquery(self, column: impl Into<String>, subquery: impl Into<SubQuery>) -> Self {
        self.where_criterion(Criterion::in_subquery(column, subquery))
    }

    /// Add WHERE: column NOT IN ( subquery )
    fn where_not_in_subquery(
        self,
        column: impl Into<String>,
        subquery: impl Into<SubQuery>,
    ) -> Self {
        self.where_criterion(Criterion::not_in_subquery(column, subquery))
    }

    /// Add WHERE: EXISTS ( subquery )
    fn where_exists(self, subquery: impl Into<SubQuery>) -> Self {
        self.where_criterion(Criterion::exists(subquery))
    }

    /// Add WHERE: NOT EXISTS ( subquery )
    fn where_not_exists(self, subquery: impl Into<SubQuery>) -> Self {
        self.where_criterion(Criterion::not_exists(subquery))
    }

    // ==================== Brackets ====================

    /// Open a WHERE bracket joined to the previous condition by `connector`.
    fn open_where(mut self, connector: impl Into<Connector>) -> Self {
        if self.is_active() {
            self.where_list_mut().open(connector);
        }
        self
    }

    /// Close the innermost WHERE bracket.
    fn close_where(mut self) -> Self {
        if self.is_active() {
            self.where_list_mut().close();
        }
        self
    }

    /// `AND (`
    fn and_open(self) -> Self {
        self.open_where(Connector::And)
    }

    /// `OR (`
    fn or_open(self) -> Self {
        self.open_where(Connector::Or)
    }

    // ==================== Merge / render ====================

    /// Append another builder's WHERE items verbatim.
    fn merge_where(mut self, other: &impl WhereQb) -> Self {
        if self.is_active() {
            self.where_list_mut().extend_from(other.where_list());
        }
        self
    }

    /// `WHERE ...` clause, or an empty string without conditions.
    fn where_string(&self, formatted: bool) -> String {
        let (sql, _) = self.where_list().render_with(formatted, self.format_config());
        if sql.is_empty() {
            sql
        } else {
            format!("WHERE {sql}")
        }
    }

    /// Parameters bound by the WHERE clause.
    fn where_params(&self) -> ParamList {
        self.where_list().render(false).1
    }
}

/// Check a criteria list before execution.
pub(crate) fn check_balanced(section: &'static str, list: &CriteriaList) -> QbResult<()> {
    if list.is_balanced() {
        return Ok(());
    }
    let (open, close) = list.bracket_counts();
    Err(crate::error::QbError::UnbalancedBrackets {
        section,
        open,
        close,
    })
}

/// Render a nested SELECT for embedding, returning its SQL and parameters.
pub(crate) fn render_subquery(qb: &SelectQb, formatted: bool) -> (String, ParamList) {
    let rendered = qb.render(formatted);
    (rendered.sql, rendered.params.merged())
}
