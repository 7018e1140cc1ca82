//! Query specification: projection, filters, sorting and relation inclusions for one call.

use serde_json::Value;
use std::fmt;

/// Comparison operator of a filter expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    /// ANSI spelling of not-equal (`<>`).
    NotEqualAnsi,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
    Is,
    IsNot,
    Like,
    NotLike,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::NotEqualAnsi => "<>",
            Operator::Greater => ">",
            Operator::Less => "<",
            Operator::GreaterOrEqual => ">=",
            Operator::LessOrEqual => "<=",
            Operator::Is => "IS",
            Operator::IsNot => "IS NOT",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Joins an expression to the one after it. Ignored on the last expression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

impl Conjunction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}

/// One WHERE predicate: `<column> <operator> ?` with its bound value.
#[derive(Clone, Debug, PartialEq)]
pub struct Expression {
    pub column: String,
    pub operator: Operator,
    pub value: Value,
    pub conjunction: Conjunction,
}

impl Expression {
    pub fn new(column: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Expression {
            column: column.into(),
            operator,
            value: value.into(),
            conjunction: Conjunction::And,
        }
    }

    /// Equality predicate, the most common case.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, Operator::Equal, value)
    }

    /// Join this expression to the next one with OR instead of AND.
    pub fn or(mut self) -> Self {
        self.conjunction = Conjunction::Or;
        self
    }

    pub fn and(mut self) -> Self {
        self.conjunction = Conjunction::And;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sort {
    pub column: String,
    pub direction: Direction,
}

impl Sort {
    pub fn asc(column: impl Into<String>) -> Self {
        Sort {
            column: column.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Sort {
            column: column.into(),
            direction: Direction::Desc,
        }
    }
}

/// Aggregate functions accepted by the aggregate clause. There are no custom functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Function {
    Count,
    Sum,
    Avg,
    Max,
    Min,
}

impl Function {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Function::Count => "COUNT",
            Function::Sum => "SUM",
            Function::Avg => "AVG",
            Function::Max => "MAX",
            Function::Min => "MIN",
        }
    }
}

/// Opt-in request to populate a declared relation. `target` optionally pins the related record name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Inclusion {
    pub name: String,
    pub target: Option<String>,
    pub query: Query,
}

impl Inclusion {
    pub fn new(name: impl Into<String>) -> Self {
        Inclusion {
            name: name.into(),
            target: None,
            query: Query::new(),
        }
    }

    pub fn target(mut self, record: impl Into<String>) -> Self {
        self.target = Some(record.into());
        self
    }

    /// Shape the related fetch: projection, extra filters, sorting, nested inclusions.
    pub fn query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }
}

/// Caller-built description of one call. Each mutator replaces the corresponding sequence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    columns: Vec<String>,
    expressions: Vec<Expression>,
    sorts: Vec<Sort>,
    inclusions: Vec<Inclusion>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Columns to read or write. Empty means every column (every non-auto column for writes).
    pub fn project<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter<I>(mut self, expressions: I) -> Self
    where
        I: IntoIterator<Item = Expression>,
    {
        self.expressions = expressions.into_iter().collect();
        self
    }

    pub fn sort_by<I>(mut self, sorts: I) -> Self
    where
        I: IntoIterator<Item = Sort>,
    {
        self.sorts = sorts.into_iter().collect();
        self
    }

    pub fn include<I>(mut self, inclusions: I) -> Self
    where
        I: IntoIterator<Item = Inclusion>,
    {
        self.inclusions = inclusions.into_iter().collect();
        self
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }

    pub fn sorts(&self) -> &[Sort] {
        &self.sorts
    }

    pub fn inclusions(&self) -> &[Inclusion] {
        &self.inclusions
    }

    /// Put `expression` ahead of the existing filters, keeping their order.
    pub(crate) fn prepend_expression(&mut self, expression: Expression) {
        self.expressions.insert(0, expression);
    }

    pub(crate) fn expressions_mut(&mut self) -> &mut [Expression] {
        &mut self.expressions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mutators_replace_sequences() {
        let query = Query::new()
            .project(["id"])
            .project(["email", "name"])
            .filter([Expression::eq("email", "a@x.com").or(), Expression::eq("name", "A")])
            .sort_by([Sort::desc("id")]);
        assert_eq!(query.columns(), ["email", "name"]);
        assert_eq!(query.expressions().len(), 2);
        assert_eq!(query.expressions()[0].conjunction, Conjunction::Or);
        assert_eq!(query.expressions()[1].value, json!("A"));
        assert_eq!(query.sorts()[0].direction, Direction::Desc);
    }

    #[test]
    fn reset_clears_everything() {
        let mut query = Query::new()
            .project(["id"])
            .include([Inclusion::new("user")]);
        query.reset();
        assert_eq!(query, Query::new());
    }

    #[test]
    fn operators_render() {
        assert_eq!(Operator::NotEqualAnsi.to_string(), "<>");
        assert_eq!(Operator::IsNot.as_sql(), "IS NOT");
        assert_eq!(Operator::NotLike.as_sql(), "NOT LIKE");
        assert_eq!(Function::Avg.as_sql(), "AVG");
    }
}
