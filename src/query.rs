//! Query builder for filtered list queries
//!
//! Column names are `&'static str` (schema constants or fixed SQL
//! expressions) so user input can only ever reach a query as a bound
//! parameter.

use chrono::NaiveDate;
use rusqlite::types::{ToSql, ToSqlOutput, Value};

/// Query builder for constructing filtered SELECT statements
#[derive(Debug)]
pub struct QueryBuilder {
    /// SELECT ... FROM ... JOIN ... without a WHERE clause
    base: String,
    conditions: Vec<Condition>,
    order_by: Vec<&'static str>,
    limit: Option<u32>,
    offset: Option<u32>,
}

/// A filter condition for database queries
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Column or expression to filter on
    pub column: &'static str,
    /// Comparison operator
    pub operator: Operator,
    /// Value to compare against
    pub value: FilterValue,
}

impl Filter {
    /// Build a filter.
    pub fn new(column: &'static str, operator: Operator, value: impl Into<FilterValue>) -> Self {
        Self {
            column,
            operator,
            value: value.into(),
        }
    }
}

/// Comparison operators for filters
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operator {
    /// Equality (=), IS NULL for a null value
    Equal,
    /// Inequality (!=), IS NOT NULL for a null value
    NotEqual,
    /// Greater than (>)
    GreaterThan,
    /// Less than (<)
    LessThan,
    /// Pattern matching (LIKE) with `\` as the escape character
    Like,
    /// Set membership (IN), value must be a list
    In,
}

impl Operator {
    const fn as_sql(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::Like => "LIKE",
            Self::In => "IN",
        }
    }
}

/// Value types for filter conditions
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Text value
    Text(String),
    /// Integer value
    Integer(i64),
    /// Calendar date
    Date(NaiveDate),
    /// NULL value
    Null,
    /// Values for IN
    List(Vec<FilterValue>),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for FilterValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl ToSql for FilterValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Self::Text(text) => Ok(ToSqlOutput::from(text.as_str())),
            Self::Integer(value) => Ok(ToSqlOutput::from(*value)),
            Self::Date(date) => date.to_sql(),
            Self::Null => Ok(ToSqlOutput::Owned(Value::Null)),
            Self::List(_) => Err(rusqlite::Error::ToSqlConversionFailure(
                "a list can only be bound through the IN operator".into(),
            )),
        }
    }
}

#[derive(Debug)]
enum Condition {
    Filter(Filter),
    AnyLike {
        columns: Vec<&'static str>,
        pattern: String,
    },
    Fixed(&'static str),
    Between {
        column: &'static str,
        low: FilterValue,
        high: FilterValue,
    },
    Bound {
        sql: &'static str,
        values: Vec<FilterValue>,
    },
}

/// Escape `%`, `_` and `\` so the text matches literally inside LIKE.
#[must_use]
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `%text%` with LIKE metacharacters escaped.
#[must_use]
pub fn contains_pattern(text: &str) -> String {
    format!("%{}%", escape_like(text))
}

impl QueryBuilder {
    /// Create a builder over a SELECT statement that has no WHERE clause
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            conditions: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Add a filter condition to the query
    pub fn add_filter(&mut self, filter: Filter) {
        self.conditions.push(Condition::Filter(filter));
    }

    /// Add a filter only when a value is present
    pub fn add_optional<T: Into<FilterValue>>(
        &mut self,
        column: &'static str,
        operator: Operator,
        value: Option<T>,
    ) {
        if let Some(value) = value {
            self.add_filter(Filter::new(column, operator, value));
        }
    }

    /// Match `text` as a substring of any of `columns`
    pub fn add_search(&mut self, columns: &[&'static str], text: &str) {
        self.conditions.push(Condition::AnyLike {
            columns: columns.to_vec(),
            pattern: contains_pattern(text),
        });
    }

    /// Add a fixed SQL condition that takes no parameters
    pub fn add_condition(&mut self, condition: &'static str) {
        self.conditions.push(Condition::Fixed(condition));
    }

    /// Inclusive range condition
    pub fn add_between(
        &mut self,
        column: &'static str,
        low: impl Into<FilterValue>,
        high: impl Into<FilterValue>,
    ) {
        self.conditions.push(Condition::Between {
            column,
            low: low.into(),
            high: high.into(),
        });
    }

    /// Add a fixed SQL condition whose `?` placeholders take `values` in order
    pub fn add_bound_condition(&mut self, condition: &'static str, values: Vec<FilterValue>) {
        self.conditions.push(Condition::Bound {
            sql: condition,
            values,
        });
    }

    /// Append an ORDER BY term
    pub fn add_order_by(&mut self, order_by: &'static str) {
        self.order_by.push(order_by);
    }

    /// Set the maximum number of results to return
    pub const fn set_limit(&mut self, limit: u32) {
        self.limit = Some(limit);
    }

    /// Set the number of results to skip
    pub const fn set_offset(&mut self, offset: u32) {
        self.offset = Some(offset);
    }

    /// Render the statement and the parameters in binding order.
    #[must_use]
    pub fn build(&self) -> (String, Vec<FilterValue>) {
        let (mut sql, mut params) = self.build_filtered();

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            params.push(FilterValue::Integer(i64::from(limit)));
            if let Some(offset) = self.offset {
                sql.push_str(" OFFSET ?");
                params.push(FilterValue::Integer(i64::from(offset)));
            }
        }

        (sql, params)
    }

    /// Render `SELECT COUNT(*)` over the filtered rows, ignoring order and paging.
    #[must_use]
    pub fn build_count(&self) -> (String, Vec<FilterValue>) {
        let (sql, params) = self.build_filtered();
        (format!("SELECT COUNT(*) FROM ({sql})"), params)
    }

    fn build_filtered(&self) -> (String, Vec<FilterValue>) {
        let mut sql = self.base.clone();
        let mut params = Vec::new();
        let mut clauses = Vec::with_capacity(self.conditions.len());

        for condition in &self.conditions {
            clauses.push(render_condition(condition, &mut params));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        (sql, params)
    }
}

fn render_condition(condition: &Condition, params: &mut Vec<FilterValue>) -> String {
    match condition {
        Condition::Fixed(sql) => format!("({sql})"),
        Condition::Bound { sql, values } => {
            params.extend(values.iter().cloned());
            format!("({sql})")
        }
        Condition::Between { column, low, high } => {
            params.push(low.clone());
            params.push(high.clone());
            format!("{column} BETWEEN ? AND ?")
        }
        Condition::AnyLike { columns, pattern } => {
            let parts: Vec<String> = columns
                .iter()
                .map(|column| {
                    params.push(FilterValue::Text(pattern.clone()));
                    format!("{column} LIKE ? ESCAPE '\\'")
                })
                .collect();
            format!("({})", parts.join(" OR "))
        }
        Condition::Filter(filter) => match (&filter.operator, &filter.value) {
            (Operator::Equal, FilterValue::Null) => format!("{} IS NULL", filter.column),
            (Operator::NotEqual, FilterValue::Null) => format!("{} IS NOT NULL", filter.column),
            (Operator::In, FilterValue::List(values)) if values.is_empty() => "0".to_string(),
            (Operator::In, FilterValue::List(values)) => {
                params.extend(values.iter().cloned());
                let marks = vec!["?"; values.len()].join(", ");
                format!("{} IN ({marks})", filter.column)
            }
            (Operator::In, value) => {
                params.push(value.clone());
                format!("{} IN (?)", filter.column)
            }
            (Operator::Like, value) => {
                params.push(value.clone());
                format!("{} LIKE ? ESCAPE '\\'", filter.column)
            }
            (operator, value) => {
                params.push(value.clone());
                format!("{} {} ?", filter.column, operator.as_sql())
            }
        },
    }
}
