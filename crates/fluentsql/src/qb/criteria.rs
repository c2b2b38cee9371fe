//! Criteria lists for WHERE/HAVING clauses.
//!
//! A [`CriteriaList`] is a flat, ordered sequence of conditions and bracket
//! markers. Grouping is expressed by `Open`/`Close` markers instead of a tree,
//! so a list can be appended to incrementally (including from conditional
//! branches) and merged verbatim into another builder.
//!
//! Rendering walks the list once, emitting `?` placeholders and collecting the
//! bound values in the same order:
//!
//! ```ignore
//! let mut list = CriteriaList::new();
//! list.push(Criterion::ne("title", "Dune"));
//! list.open(Connector::Or);
//! list.push(Criterion::gte("score", 5));
//! list.push(Criterion::lte("score", 10));
//! list.close();
//!
//! let (sql, params) = list.render(false);
//! assert_eq!(sql, "title != ? OR ( score >= ? AND score <= ? ) ");
//! ```

use crate::config::FormatConfig;
use crate::error::{QbError, QbResult};
use crate::qb::param::ParamList;
use crate::qb::select::SelectQb;
use crate::qb::traits::SqlQb;
use crate::value::Value;
use std::fmt;

/// Comparison operator of a criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operator {
    #[default]
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    In,
    NotIn,
    Exists,
    NotExists,
    Like,
    NotLike,
    Regexp,
    NotRegexp,
    Between,
    NotBetween,
    IsNull,
    IsNotNull,
    /// Caller-supplied SQL used verbatim as the whole condition.
    RawCriteria,
    SubQueryIn,
    SubQueryNotIn,
    SubQueryExists,
    SubQueryNotExists,
}

impl Operator {
    /// Every operator, in declaration order.
    pub const ALL: [Operator; 23] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::LessThan,
        Operator::LessThanOrEqual,
        Operator::GreaterThan,
        Operator::GreaterThanOrEqual,
        Operator::In,
        Operator::NotIn,
        Operator::Exists,
        Operator::NotExists,
        Operator::Like,
        Operator::NotLike,
        Operator::Regexp,
        Operator::NotRegexp,
        Operator::Between,
        Operator::NotBetween,
        Operator::IsNull,
        Operator::IsNotNull,
        Operator::RawCriteria,
        Operator::SubQueryIn,
        Operator::SubQueryNotIn,
        Operator::SubQueryExists,
        Operator::SubQueryNotExists,
    ];

    /// Token accepted by [`Operator::parse`].
    pub fn token(self) -> &'static str {
        match self {
            Operator::Equals => "=",
            Operator::NotEquals => "!=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Exists => "EXISTS",
            Operator::NotExists => "NOT EXISTS",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::Regexp => "REGEXP",
            Operator::NotRegexp => "NOT REGEXP",
            Operator::Between => "BETWEEN",
            Operator::NotBetween => "NOT BETWEEN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
            Operator::RawCriteria => "raw",
            Operator::SubQueryIn => "subquery_in",
            Operator::SubQueryNotIn => "subquery_not_in",
            Operator::SubQueryExists => "subquery_exists",
            Operator::SubQueryNotExists => "subquery_not_exists",
        }
    }

    /// SQL keyword emitted between column and value. Empty for raw criteria.
    pub fn sql(self) -> &'static str {
        match self {
            Operator::RawCriteria => "",
            Operator::SubQueryIn => "IN",
            Operator::SubQueryNotIn => "NOT IN",
            Operator::SubQueryExists => "EXISTS",
            Operator::SubQueryNotExists => "NOT EXISTS",
            other => other.token(),
        }
    }

    /// Tag name, e.g. `GREATER_THAN_OR_EQUAL`.
    pub fn tag(self) -> &'static str {
        match self {
            Operator::Equals => "EQUALS",
            Operator::NotEquals => "NOT_EQUALS",
            Operator::LessThan => "LESS_THAN",
            Operator::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
            Operator::GreaterThan => "GREATER_THAN",
            Operator::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
            Operator::In => "IN",
            Operator::NotIn => "NOT_IN",
            Operator::Exists => "EXISTS",
            Operator::NotExists => "NOT_EXISTS",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT_LIKE",
            Operator::Regexp => "REGEXP",
            Operator::NotRegexp => "NOT_REGEXP",
            Operator::Between => "BETWEEN",
            Operator::NotBetween => "NOT_BETWEEN",
            Operator::IsNull => "IS_NULL",
            Operator::IsNotNull => "IS_NOT_NULL",
            Operator::RawCriteria => "RAW_CRITERIA",
            Operator::SubQueryIn => "SUB_QUERY_IN",
            Operator::SubQueryNotIn => "SUB_QUERY_NOT_IN",
            Operator::SubQueryExists => "SUB_QUERY_EXISTS",
            Operator::SubQueryNotExists => "SUB_QUERY_NOT_EXISTS",
        }
    }

    /// Parse a token (`">="`, `"not in"`) or tag name (`"GREATER_THAN"`).
    ///
    /// Case and surrounding or repeated whitespace are ignored. Unknown
    /// tokens fall back to `Equals`.
    pub fn parse(token: &str) -> Self {
        let normalized = token
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|op| op.token().eq_ignore_ascii_case(&normalized) || op.tag() == normalized)
            .unwrap_or(Operator::Equals)
    }

    /// Whether the value is a nested query rather than bound data.
    pub fn is_subquery(self) -> bool {
        matches!(
            self,
            Operator::SubQueryIn
                | Operator::SubQueryNotIn
                | Operator::SubQueryExists
                | Operator::SubQueryNotExists
        )
    }

    fn takes_list(self) -> bool {
        matches!(
            self,
            Operator::In
                | Operator::NotIn
                | Operator::Between
                | Operator::NotBetween
                | Operator::RawCriteria
        )
    }
}

impl From<&str> for Operator {
    fn from(token: &str) -> Self {
        Operator::parse(token)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Logical connector joining an element to its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Connector {
    #[default]
    And,
    Or,
}

impl Connector {
    pub fn sql(self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }

    /// Parse `AND`/`OR`, ignoring case and whitespace. Anything else falls
    /// back to `And`.
    pub fn parse(token: &str) -> Self {
        if token.trim().eq_ignore_ascii_case("OR") {
            Connector::Or
        } else {
            Connector::And
        }
    }
}

impl From<&str> for Connector {
    fn from(token: &str) -> Self {
        Connector::parse(token)
    }
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql())
    }
}

/// Right-hand side of a criterion.
#[derive(Debug, Clone, PartialEq)]
pub enum CriterionValue {
    Null,
    Scalar(Value),
    List(Vec<Value>),
    /// Nested SELECT rendered in place. Raw SQL subqueries are `Scalar(Text)`.
    SubQuery(Box<SelectQb>),
}

impl CriterionValue {
    /// Raw SQL text used as a subquery.
    pub fn raw_sql(sql: impl Into<String>) -> Self {
        CriterionValue::Scalar(Value::Text(sql.into()))
    }
}

macro_rules! impl_scalar_criterion_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for CriterionValue {
                fn from(v: $t) -> Self {
                    CriterionValue::Scalar(Value::from(v))
                }
            }
        )*
    };
}

impl_scalar_criterion_value!(
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    bool,
    &str,
    String,
    &String,
    chrono::NaiveDateTime,
    uuid::Uuid
);

impl From<Value> for CriterionValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => CriterionValue::Null,
            v => CriterionValue::Scalar(v),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for CriterionValue {
    fn from(v: Option<T>) -> Self {
        CriterionValue::from(Value::from(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for CriterionValue {
    fn from(v: Vec<T>) -> Self {
        CriterionValue::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for CriterionValue {
    fn from(v: [T; N]) -> Self {
        CriterionValue::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<SelectQb> for CriterionValue {
    fn from(qb: SelectQb) -> Self {
        CriterionValue::SubQuery(Box::new(qb))
    }
}

/// Operand of `IN ( ... )` and `EXISTS ( ... )`: a nested builder or raw SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum SubQuery {
    Select(Box<SelectQb>),
    Raw(String),
}

impl From<SelectQb> for SubQuery {
    fn from(qb: SelectQb) -> Self {
        SubQuery::Select(Box::new(qb))
    }
}

impl From<&str> for SubQuery {
    fn from(sql: &str) -> Self {
        SubQuery::Raw(sql.to_string())
    }
}

impl From<String> for SubQuery {
    fn from(sql: String) -> Self {
        SubQuery::Raw(sql)
    }
}

impl From<SubQuery> for CriterionValue {
    fn from(subquery: SubQuery) -> Self {
        match subquery {
            SubQuery::Select(qb) => CriterionValue::SubQuery(qb),
            SubQuery::Raw(sql) => CriterionValue::raw_sql(sql),
        }
    }
}

/// One condition: `column operator value`, joined by `connector`.
///
/// Construction normalizes the value for the operator, so every stored
/// criterion renders with exactly as many placeholders as it binds values.
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    column: String,
    value: CriterionValue,
    operator: Operator,
    connector: Connector,
}

impl Criterion {
    /// Build a criterion from loosely typed parts.
    ///
    /// - `BETWEEN`/`NOT BETWEEN` need exactly two values; they are sorted.
    /// - `IN`/`NOT IN` wrap a scalar into a one-element list, and turn a nested
    ///   builder into the matching subquery operator.
    /// - `SUBQUERY [NOT] IN` given plain values fall back to `IN`/`NOT IN`.
    /// - `SUBQUERY [NOT] EXISTS` need a nested builder or raw SQL text.
    /// - `IS [NOT] NULL` drop the value.
    /// - Other comparisons accept a single value only.
    pub fn new(
        column: impl Into<String>,
        value: impl Into<CriterionValue>,
        operator: impl Into<Operator>,
        connector: impl Into<Connector>,
    ) -> QbResult<Self> {
        let mut operator = operator.into();
        let value = match (operator, value.into()) {
            (Operator::Between | Operator::NotBetween, CriterionValue::List(mut pair))
                if pair.len() == 2 =>
            {
                pair.sort_by(Value::cmp_sort);
                CriterionValue::List(pair)
            }
            (Operator::Between | Operator::NotBetween, _) => {
                return Err(QbError::invalid_argument(format!(
                    "the operator {} needs a list of exactly 2 values: minimum and maximum",
                    operator.sql()
                )));
            }
            (Operator::In | Operator::NotIn, CriterionValue::SubQuery(qb)) => {
                operator = if operator == Operator::In {
                    Operator::SubQueryIn
                } else {
                    Operator::SubQueryNotIn
                };
                CriterionValue::SubQuery(qb)
            }
            (Operator::In | Operator::NotIn, CriterionValue::Scalar(v)) => {
                CriterionValue::List(vec![v])
            }
            (Operator::In | Operator::NotIn, CriterionValue::Null) => {
                CriterionValue::List(vec![Value::Null])
            }
            (
                Operator::SubQueryIn | Operator::SubQueryNotIn,
                value @ (CriterionValue::List(_) | CriterionValue::Null),
            ) => {
                operator = if operator == Operator::SubQueryIn {
                    Operator::In
                } else {
                    Operator::NotIn
                };
                match value {
                    CriterionValue::Null => CriterionValue::List(vec![Value::Null]),
                    value => value,
                }
            }
            (
                Operator::SubQueryExists | Operator::SubQueryNotExists,
                value @ (CriterionValue::SubQuery(_) | CriterionValue::Scalar(Value::Text(_))),
            ) => value,
            (Operator::SubQueryExists | Operator::SubQueryNotExists, _) => {
                return Err(QbError::invalid_argument(format!(
                    "the operator {} needs a subquery",
                    operator.sql()
                )));
            }
            (Operator::IsNull | Operator::IsNotNull, _) => CriterionValue::Null,
            (op, CriterionValue::List(mut values)) if !op.takes_list() && !op.is_subquery() => {
                if values.len() > 1 {
                    return Err(QbError::invalid_argument(format!(
                        "the operator {} binds a single value, got {}",
                        op.sql(),
                        values.len()
                    )));
                }
                values.pop().map_or(CriterionValue::Null, CriterionValue::from)
            }
            (_, value) => value,
        };

        Ok(Self {
            column: column.into(),
            value,
            operator,
            connector: connector.into(),
        })
    }

    fn from_parts(column: impl Into<String>, operator: Operator, value: CriterionValue) -> Self {
        Self {
            column: column.into(),
            value,
            operator,
            connector: Connector::And,
        }
    }

    fn compare(column: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self::from_parts(column, operator, CriterionValue::from(value.into()))
    }

    /// `column = value`
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Operator::Equals, value)
    }

    /// `column != value`
    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Operator::NotEquals, value)
    }

    /// `column < value`
    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Operator::LessThan, value)
    }

    /// `column <= value`
    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Operator::LessThanOrEqual, value)
    }

    /// `column > value`
    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Operator::GreaterThan, value)
    }

    /// `column >= value`
    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Operator::GreaterThanOrEqual, value)
    }

    /// `column LIKE pattern`
    pub fn like(column: impl Into<String>, pattern: impl Into<Value>) -> Self {
        Self::compare(column, Operator::Like, pattern)
    }

    /// `column NOT LIKE pattern`
    pub fn not_like(column: impl Into<String>, pattern: impl Into<Value>) -> Self {
        Self::compare(column, Operator::NotLike, pattern)
    }

    /// `column REGEXP pattern`
    pub fn regexp(column: impl Into<String>, pattern: impl Into<Value>) -> Self {
        Self::compare(column, Operator::Regexp, pattern)
    }

    /// `column NOT REGEXP pattern`
    pub fn not_regexp(column: impl Into<String>, pattern: impl Into<Value>) -> Self {
        Self::compare(column, Operator::NotRegexp, pattern)
    }

    /// `column IN (?, ?, ...)`
    pub fn in_list<T: Into<Value>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        Self::from_parts(column, Operator::In, CriterionValue::List(values))
    }

    /// `column NOT IN (?, ?, ...)`
    pub fn not_in<T: Into<Value>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        Self::from_parts(column, Operator::NotIn, CriterionValue::List(values))
    }

    fn range(
        column: impl Into<String>,
        operator: Operator,
        a: impl Into<Value>,
        b: impl Into<Value>,
    ) -> Self {
        let mut pair = vec![a.into(), b.into()];
        pair.sort_by(Value::cmp_sort);
        Self::from_parts(column, operator, CriterionValue::List(pair))
    }

    /// `column BETWEEN ? AND ?`, bounds sorted ascending.
    pub fn between(column: impl Into<String>, a: impl Into<Value>, b: impl Into<Value>) -> Self {
        Self::range(column, Operator::Between, a, b)
    }

    /// `column NOT BETWEEN ? AND ?`, bounds sorted ascending.
    pub fn not_between(
        column: impl Into<String>,
        a: impl Into<Value>,
        b: impl Into<Value>,
    ) -> Self {
        Self::range(column, Operator::NotBetween, a, b)
    }

    /// `column IS NULL`
    pub fn is_null(column: impl Into<String>) -> Self {
        Self::from_parts(column, Operator::IsNull, CriterionValue::Null)
    }

    /// `column IS NOT NULL`
    pub fn is_not_null(column: impl Into<String>) -> Self {
        Self::from_parts(column, Operator::IsNotNull, CriterionValue::Null)
    }

    /// Raw SQL condition. `values` bind its own `?` placeholders in order.
    pub fn raw<T: Into<Value>>(
        sql: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        Self::from_parts(sql, Operator::RawCriteria, CriterionValue::List(values))
    }

    fn subquery(column: impl Into<String>, operator: Operator, subquery: SubQuery) -> Self {
        Self::from_parts(column, operator, subquery.into())
    }

    /// `column IN ( subquery )`
    pub fn in_subquery(column: impl Into<String>, subquery: impl Into<SubQuery>) -> Self {
        Self::subquery(column, Operator::SubQueryIn, subquery.into())
    }

    /// `column NOT IN ( subquery )`
    pub fn not_in_subquery(column: impl Into<String>, subquery: impl Into<SubQuery>) -> Self {
        Self::subquery(column, Operator::SubQueryNotIn, subquery.into())
    }

    /// `EXISTS ( subquery )`
    pub fn exists(subquery: impl Into<SubQuery>) -> Self {
        Self::subquery("", Operator::SubQueryExists, subquery.into())
    }

    /// `NOT EXISTS ( subquery )`
    pub fn not_exists(subquery: impl Into<SubQuery>) -> Self {
        Self::subquery("", Operator::SubQueryNotExists, subquery.into())
    }

    /// Replace the connector.
    pub fn with_connector(mut self, connector: impl Into<Connector>) -> Self {
        self.connector = connector.into();
        self
    }

    /// Join with `OR` instead of `AND`.
    pub fn or(self) -> Self {
        self.with_connector(Connector::Or)
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn value(&self) -> &CriterionValue {
        &self.value
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn connector(&self) -> Connector {
        self.connector
    }

    /// Append `column operator value ` to `sql`, collecting bound values.
    ///
    /// `layout` carries the current depth when rendering formatted output.
    fn render_into(
        &self,
        sql: &mut String,
        params: &mut ParamList,
        layout: Option<(usize, &FormatConfig)>,
    ) {
        let mut column = self.column.as_str();
        let mut operator = self.operator.sql();
        let value = match self.operator {
            Operator::Between | Operator::NotBetween => {
                self.push_values(params);
                "? AND ?".to_string()
            }
            Operator::In | Operator::NotIn => match self.push_values(params) {
                // `IN ()` is not valid SQL: nothing is in an empty list.
                0 => {
                    column = if self.operator == Operator::In { "1 = 0" } else { "1 = 1" };
                    operator = "";
                    String::new()
                }
                n => format!("({})", placeholders(n)),
            },
            Operator::IsNull | Operator::IsNotNull => String::new(),
            Operator::RawCriteria => {
                column = column.trim();
                if !matches!(self.value, CriterionValue::SubQuery(_)) {
                    self.push_values(params);
                }
                String::new()
            }
            Operator::SubQueryExists | Operator::SubQueryNotExists => {
                column = "";
                subquery_block(&self.value, params, layout)
            }
            Operator::SubQueryIn | Operator::SubQueryNotIn => {
                subquery_block(&self.value, params, layout)
            }
            _ => match &self.value {
                CriterionValue::SubQuery(_) => subquery_block(&self.value, params, layout),
                CriterionValue::List(values) => {
                    params.extend_values(values.iter().cloned());
                    format!("({})", placeholders(values.len()))
                }
                CriterionValue::Scalar(v) => {
                    params.push(v.clone());
                    "?".to_string()
                }
                CriterionValue::Null => {
                    params.push(Value::Null);
                    "?".to_string()
                }
            },
        };

        for part in [column, operator, value.as_str()] {
            if !part.is_empty() {
                sql.push_str(part);
                sql.push(' ');
            }
        }
    }

    /// Bind list or scalar values as-is, returning how many were bound.
    fn push_values(&self, params: &mut ParamList) -> usize {
        match &self.value {
            CriterionValue::List(values) => {
                params.extend_values(values.iter().cloned());
                values.len()
            }
            CriterionValue::Scalar(v) => {
                params.push(v.clone());
                1
            }
            CriterionValue::Null | CriterionValue::SubQuery(_) => 0,
        }
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Render a nested query as `( subquery )`, one level deeper when formatted.
///
/// The nested query itself is always rendered on a single line.
fn subquery_block(
    value: &CriterionValue,
    params: &mut ParamList,
    layout: Option<(usize, &FormatConfig)>,
) -> String {
    let inner = match value {
        CriterionValue::SubQuery(qb) => {
            let rendered = qb.render(false);
            params.extend(&rendered.params.merged());
            rendered.sql
        }
        CriterionValue::Scalar(Value::Text(raw)) => format!("{} ", raw.trim()),
        CriterionValue::Scalar(other) => format!("{} ", other.to_sql_literal()),
        CriterionValue::Null | CriterionValue::List(_) => String::new(),
    };
    if inner.is_empty() {
        return String::new();
    }

    match layout {
        Some((depth, cfg)) => format!(
            "\n{outer}( \n{nested}{inner}\n{outer})",
            outer = cfg.indent(depth),
            nested = cfg.indent(depth + 1),
        ),
        None => format!("( {inner})"),
    }
}

/// Element of a criteria list.
#[derive(Debug, Clone, PartialEq)]
pub enum CriteriaItem {
    Criterion(Criterion),
    /// Opening bracket joined to its predecessor by the connector.
    Open(Connector),
    Close,
}

/// Ordered WHERE or HAVING clause content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CriteriaList {
    items: Vec<CriteriaItem>,
}

impl CriteriaList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a condition.
    pub fn push(&mut self, criterion: Criterion) {
        self.items.push(CriteriaItem::Criterion(criterion));
    }

    /// Open a bracket joined to the previous element by `connector`.
    pub fn open(&mut self, connector: impl Into<Connector>) {
        self.items.push(CriteriaItem::Open(connector.into()));
    }

    /// Close the innermost bracket.
    pub fn close(&mut self) {
        self.items.push(CriteriaItem::Close);
    }

    /// Append every item of `other` verbatim, brackets included.
    pub fn extend_from(&mut self, other: &CriteriaList) {
        self.items.extend(other.items.iter().cloned());
    }

    pub fn items(&self) -> &[CriteriaItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of `(open, close)` markers.
    pub fn bracket_counts(&self) -> (usize, usize) {
        self.items.iter().fold((0, 0), |(open, close), item| match item {
            CriteriaItem::Open(_) => (open + 1, close),
            CriteriaItem::Close => (open, close + 1),
            CriteriaItem::Criterion(_) => (open, close),
        })
    }

    /// Every close has a matching earlier open and nothing is left open.
    pub fn is_balanced(&self) -> bool {
        let mut depth: usize = 0;
        for item in &self.items {
            match item {
                CriteriaItem::Open(_) => depth += 1,
                CriteriaItem::Close => match depth.checked_sub(1) {
                    Some(d) => depth = d,
                    None => return false,
                },
                CriteriaItem::Criterion(_) => {}
            }
        }
        depth == 0
    }

    /// Render with the default indentation.
    pub fn render(&self, formatted: bool) -> (String, ParamList) {
        self.render_with(formatted, &FormatConfig::default())
    }

    /// Render to a SQL fragment and its bound values.
    ///
    /// Every emitted unit is followed by a space, and by a newline when
    /// `formatted`. Depth never drops below zero, even for a stray close.
    pub fn render_with(&self, formatted: bool, cfg: &FormatConfig) -> (String, ParamList) {
        let mut sql = String::new();
        let mut params = ParamList::new();
        let mut use_connector = false;
        let mut depth: usize = 0;

        for item in &self.items {
            match item {
                CriteriaItem::Open(connector) => {
                    if use_connector {
                        if formatted {
                            sql.push_str(&cfg.indent(depth));
                        }
                        sql.push_str(connector.sql());
                        sql.push(' ');
                        if formatted {
                            sql.push('\n');
                        }
                    }
                    use_connector = false;

                    if formatted {
                        sql.push_str(&cfg.indent(depth));
                    }
                    sql.push_str("( ");
                    if formatted {
                        depth += 1;
                        sql.push('\n');
                    }
                }
                CriteriaItem::Close => {
                    use_connector = true;
                    if formatted {
                        depth = depth.saturating_sub(1);
                        sql.push_str(&cfg.indent(depth));
                    }
                    sql.push_str(") ");
                    if formatted {
                        sql.push('\n');
                    }
                }
                CriteriaItem::Criterion(criterion) => {
                    if formatted {
                        sql.push_str(&cfg.indent(depth));
                    }
                    if use_connector {
                        sql.push_str(criterion.connector.sql());
                        sql.push(' ');
                    }
                    use_connector = true;

                    criterion.render_into(&mut sql, &mut params, formatted.then_some((depth, cfg)));
                    if formatted {
                        sql.push('\n');
                    }
                }
            }
        }

        (sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qb::select;
    use crate::qb::traits::WhereQb;

    fn placeholder_count(sql: &str) -> usize {
        sql.matches('?').count()
    }

    fn dune_or_score_range() -> CriteriaList {
        let mut list = CriteriaList::new();
        list.push(Criterion::ne("title", "Dune"));
        list.open(Connector::Or);
        list.push(Criterion::gte("score", 5));
        list.push(Criterion::lte("score", 10));
        list.close();
        list
    }

    #[test]
    fn test_operator_parse_is_lenient() {
        assert_eq!(Operator::parse(">="), Operator::GreaterThanOrEqual);
        assert_eq!(Operator::parse("NOT IN"), Operator::NotIn);
        assert_eq!(Operator::parse("subquery_exists"), Operator::SubQueryExists);
        assert_eq!(Operator::parse("raw"), Operator::RawCriteria);
        assert_eq!(Operator::parse("  not   like "), Operator::NotLike);
        assert_eq!(Operator::parse("GREATER_THAN"), Operator::GreaterThan);
        assert_eq!(Operator::parse("sub_query_not_in"), Operator::SubQueryNotIn);
        assert_eq!(Operator::parse("<>"), Operator::Equals);
        assert_eq!(Operator::parse("bogus"), Operator::Equals);
        for op in Operator::ALL {
            assert_eq!(Operator::parse(op.token()), op);
            assert_eq!(Operator::parse(op.tag()), op);
        }
    }

    #[test]
    fn test_connector_parse_is_lenient() {
        assert_eq!(Connector::parse("OR"), Connector::Or);
        assert_eq!(Connector::parse("AND"), Connector::And);
        assert_eq!(Connector::parse(" or "), Connector::Or);
        assert_eq!(Connector::parse("XOR"), Connector::And);
        assert_eq!(Connector::default(), Connector::And);
    }

    #[test]
    fn test_new_sorts_between() {
        let c = Criterion::new("score", vec![15, 8], "BETWEEN", "AND").unwrap();
        assert_eq!(
            c.value(),
            &CriterionValue::List(vec![Value::Int(8), Value::Int(15)])
        );
        assert_eq!(c, Criterion::between("score", 8, 15));
    }

    #[test]
    fn test_new_between_requires_pair() {
        let err = Criterion::new("score", 8, Operator::Between, Connector::And).unwrap_err();
        assert!(err.is_invalid_argument());

        let err = Criterion::new("score", vec![1, 2, 3], Operator::NotBetween, Connector::And)
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_new_wraps_in_scalar() {
        let scalar = Criterion::new("id", 3, Operator::In, Connector::And).unwrap();
        let list = Criterion::new("id", vec![3], Operator::In, Connector::And).unwrap();
        assert_eq!(scalar, list);

        let mut a = CriteriaList::new();
        a.push(scalar);
        let mut b = CriteriaList::new();
        b.push(list);
        assert_eq!(a.render(false), b.render(false));
        assert_eq!(a.render(false).0, "id IN (?) ");
    }

    #[test]
    fn test_new_null_operators_drop_value() {
        let c = Criterion::new("deleted_at", 5, Operator::IsNull, Connector::And).unwrap();
        assert_eq!(c.value(), &CriterionValue::Null);
    }

    #[test]
    fn test_new_scalar_operator_rejects_long_list() {
        let one = Criterion::new("id", vec![4], Operator::Equals, Connector::And).unwrap();
        assert_eq!(one.value(), &CriterionValue::Scalar(Value::Int(4)));

        let err = Criterion::new("id", vec![4, 5], Operator::Equals, Connector::And).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_new_in_with_builder_becomes_subquery() {
        let sub = select().select("id").from("author");
        let c = Criterion::new("author_id", sub, Operator::NotIn, Connector::And).unwrap();
        assert_eq!(c.operator(), Operator::SubQueryNotIn);
    }

    #[test]
    fn test_new_subquery_in_with_values_becomes_in() {
        let c = Criterion::new("id", vec![1, 2], "subquery_in", "AND").unwrap();
        assert_eq!(c.operator(), Operator::In);
        assert_eq!(c, Criterion::in_list("id", [1, 2]));

        let c = Criterion::new("id", Value::Null, Operator::SubQueryNotIn, "OR").unwrap();
        assert_eq!(c.operator(), Operator::NotIn);

        let mut list = CriteriaList::new();
        list.push(Criterion::new("id", vec![1, 2], "subquery_in", "AND").unwrap());
        list.push(c);
        let (sql, params) = list.render(false);
        assert_eq!(sql, "id IN (?, ?) OR id NOT IN (?) ");
        assert_eq!(params, crate::row![1, 2, Value::Null]);
    }

    #[test]
    fn test_new_subquery_in_keeps_raw_sql() {
        let c = Criterion::new("id", "SELECT book_id FROM prize", "subquery_in", "AND").unwrap();
        assert_eq!(c.operator(), Operator::SubQueryIn);
        assert_eq!(c, Criterion::in_subquery("id", "SELECT book_id FROM prize"));
    }

    #[test]
    fn test_new_exists_requires_subquery() {
        for value in [
            CriterionValue::from(vec![1, 2]),
            CriterionValue::Null,
            CriterionValue::from(7),
        ] {
            let err = Criterion::new("", value, Operator::SubQueryExists, Connector::And)
                .unwrap_err();
            assert!(err.is_invalid_argument());
        }
        let err = Criterion::new("", vec![1], "subquery_not_exists", "AND").unwrap_err();
        assert!(err.is_invalid_argument());

        let sub = select().select("1").from("review");
        let c = Criterion::new("", sub.clone(), Operator::SubQueryExists, Connector::And).unwrap();
        assert_eq!(c, Criterion::exists(sub));
        assert!(Criterion::new("", "SELECT 1", Operator::SubQueryNotExists, "AND").is_ok());
    }

    #[test]
    fn test_render_empty_in_list() {
        let mut list = CriteriaList::new();
        list.push(Criterion::eq("lang", "fr"));
        list.push(Criterion::in_list("id", Vec::<i64>::new()));
        list.push(Criterion::not_in("author_id", Vec::<i64>::new()).or());
        let (sql, params) = list.render(false);
        assert_eq!(sql, "lang = ? AND 1 = 0 OR 1 = 1 ");
        assert_eq!(params, vec![Value::from("fr")]);
        assert_eq!(placeholder_count(&sql), params.len());
    }

    #[test]
    fn test_render_simple() {
        let mut list = CriteriaList::new();
        list.push(Criterion::eq("id", 2));
        let (sql, params) = list.render(false);
        assert_eq!(sql, "id = ? ");
        assert_eq!(params, vec![Value::Int(2)]);
    }

    #[test]
    fn test_render_brackets() {
        let (sql, params) = dune_or_score_range().render(false);
        assert_eq!(sql, "title != ? OR ( score >= ? AND score <= ? ) ");
        assert_eq!(params, crate::row!["Dune", 5, 10]);
    }

    #[test]
    fn test_render_brackets_formatted() {
        let (sql, params) = dune_or_score_range().render(true);
        assert_eq!(
            sql,
            "title != ? \nOR \n( \n    score >= ? \n    AND score <= ? \n) \n"
        );
        assert_eq!(params, crate::row!["Dune", 5, 10]);
    }

    #[test]
    fn test_render_nested_brackets_formatted() {
        let mut list = CriteriaList::new();
        list.push(Criterion::ne("title", "Dune"));
        list.open(Connector::Or);
        list.push(Criterion::gte("score", 5));
        list.open(Connector::Or);
        list.push(Criterion::eq("published_at", "2020-01-01"));
        list.close();
        list.close();

        let (sql, _) = list.render(true);
        assert_eq!(
            sql,
            "title != ? \nOR \n( \n    score >= ? \n    OR \n    ( \n        published_at = ? \n    ) \n) \n"
        );
        let (flat, _) = list.render(false);
        assert_eq!(flat, "title != ? OR ( score >= ? OR ( published_at = ? ) ) ");
    }

    #[test]
    fn test_render_leading_bracket_has_no_connector() {
        let mut list = CriteriaList::new();
        list.open(Connector::Or);
        list.push(Criterion::eq("a", 1));
        list.push(Criterion::eq("b", 2).or());
        list.close();
        list.push(Criterion::eq("c", 3));
        assert_eq!(list.render(false).0, "( a = ? OR b = ? ) AND c = ? ");
    }

    #[test]
    fn test_render_operator_table() {
        let mut list = CriteriaList::new();
        list.push(Criterion::between("score", 10, 2));
        list.push(Criterion::not_in("id", [1, 2, 3]));
        list.push(Criterion::is_not_null("deleted_at"));
        list.push(Criterion::like("title", "%dune%"));
        list.push(Criterion::raw("  price > ? OR price < ?  ", [100, 5]));
        list.push(Criterion::not_regexp("title", "^x"));

        let (sql, params) = list.render(false);
        assert_eq!(
            sql,
            "score BETWEEN ? AND ? AND id NOT IN (?, ?, ?) AND deleted_at IS NOT NULL \
             AND title LIKE ? AND price > ? OR price < ? AND title NOT REGEXP ? "
        );
        assert_eq!(params, crate::row![2, 10, 1, 2, 3, "%dune%", 100, 5, "^x"]);
        assert_eq!(placeholder_count(&sql), params.len());
    }

    #[test]
    fn test_render_raw_scalar_and_null() {
        let mut list = CriteriaList::new();
        list.push(Criterion::new("YEAR(published_at) = ?", 1965, "raw", "AND").unwrap());
        list.push(Criterion::new("score IS NOT NULL", Value::Null, "raw", "OR").unwrap());
        let (sql, params) = list.render(false);
        assert_eq!(sql, "YEAR(published_at) = ? OR score IS NOT NULL ");
        assert_eq!(params, vec![Value::Int(1965)]);
    }

    #[test]
    fn test_render_subquery() {
        let sub = select()
            .select("id")
            .from("author")
            .like("last_name", "%Herbert%");

        let mut list = CriteriaList::new();
        list.push(Criterion::gte("score", 5));
        list.push(Criterion::in_subquery("author_id", sub));

        let (sql, params) = list.render(false);
        assert_eq!(
            sql,
            "score >= ? AND author_id IN ( SELECT id FROM author WHERE last_name LIKE ? ) "
        );
        assert_eq!(params, crate::row![5, "%Herbert%"]);

        let (formatted, formatted_params) = list.render(true);
        assert_eq!(
            formatted,
            "score >= ? \nAND author_id IN \n( \n    SELECT id FROM author WHERE last_name LIKE ? \n) \n"
        );
        assert_eq!(formatted_params, params);
    }

    #[test]
    fn test_render_subquery_inside_bracket_formatted() {
        let sub = select().select("id").from("author").eq("alive", true);

        let mut list = CriteriaList::new();
        list.push(Criterion::gte("score", 5));
        list.open(Connector::Or);
        list.push(Criterion::not_in_subquery("author_id", sub));
        list.close();

        let (sql, _) = list.render(true);
        assert_eq!(
            sql,
            "score >= ? \nOR \n( \n    author_id NOT IN \n    ( \n        SELECT id FROM author WHERE alive = ? \n    ) \n) \n"
        );
    }

    #[test]
    fn test_render_exists_drops_column_and_raw_subquery() {
        let mut list = CriteriaList::new();
        list.push(Criterion::exists(
            "  SELECT 1 FROM author WHERE author.id = book.author_id  ",
        ));
        list.push(Criterion::not_exists(
            select().select("1").from("ban").eq("ban.book_id", 9),
        ));

        let (sql, params) = list.render(false);
        assert_eq!(
            sql,
            "EXISTS ( SELECT 1 FROM author WHERE author.id = book.author_id ) \
             AND NOT EXISTS ( SELECT 1 FROM ban WHERE ban.book_id = ? ) "
        );
        assert_eq!(params, vec![Value::Int(9)]);
    }

    #[test]
    fn test_render_stray_close_keeps_depth_at_zero() {
        let mut list = CriteriaList::new();
        list.close();
        list.push(Criterion::eq("a", 1));
        assert!(!list.is_balanced());
        assert_eq!(list.render(true).0, ") \nAND a = ? \n");
    }

    #[test]
    fn test_formatted_and_flat_share_tokens() {
        let list = dune_or_score_range();
        let (flat, flat_params) = list.render(false);
        let (formatted, formatted_params) = list.render(true);
        let tokens = |s: &str| s.split_whitespace().map(str::to_string).collect::<Vec<_>>();
        assert_eq!(tokens(&flat), tokens(&formatted));
        assert_eq!(flat_params, formatted_params);
    }

    #[test]
    fn test_bracket_counts_match_rendered_parens() {
        let list = dune_or_score_range();
        assert!(list.is_balanced());
        assert_eq!(list.bracket_counts(), (1, 1));
        let (sql, _) = list.render(false);
        assert_eq!(sql.matches('(').count(), 1);
        assert_eq!(sql.matches(')').count(), 1);
    }

    #[test]
    fn test_custom_indent() {
        let cfg = FormatConfig::new().with_indent_char('\t').with_indent_width(1);
        let (sql, _) = dune_or_score_range().render_with(true, &cfg);
        assert_eq!(
            sql,
            "title != ? \nOR \n( \n\tscore >= ? \n\tAND score <= ? \n) \n"
        );
    }
}
