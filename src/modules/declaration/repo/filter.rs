//! Dynamic predicate builder for search/list queries.
//!
//! Constraints accumulate as `(column, operator, value)` tuples joined with
//! a configurable combinator, always bound as parameters.

/// A bindable value.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Int(i64),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    fn sql(&self) -> &'static str {
        match self {
            Combinator::And => " AND ",
            Combinator::Or => " OR ",
        }
    }
}

/// Accumulates parameterized predicates and renders a WHERE fragment with
/// `$n` placeholders starting after `offset` existing binds.
#[derive(Debug)]
pub struct FilterBuilder {
    combinator: Combinator,
    offset: usize,
    clauses: Vec<String>,
    values: Vec<BindValue>,
}

impl FilterBuilder {
    pub fn new(combinator: Combinator) -> Self {
        Self::with_offset(combinator, 0)
    }

    pub fn with_offset(combinator: Combinator, offset: usize) -> Self {
        Self {
            combinator,
            offset,
            clauses: Vec::new(),
            values: Vec::new(),
        }
    }

    fn next_placeholder(&self) -> usize {
        self.offset + self.values.len() + 1
    }

    pub fn eq_text(&mut self, column: &str, value: &str) -> &mut Self {
        let n = self.next_placeholder();
        self.clauses.push(format!("{} = ${}", column, n));
        self.values.push(BindValue::Text(value.to_string()));
        self
    }

    pub fn eq_int(&mut self, column: &str, value: i64) -> &mut Self {
        let n = self.next_placeholder();
        self.clauses.push(format!("{} = ${}", column, n));
        self.values.push(BindValue::Int(value));
        self
    }

    /// Case-insensitive substring match.
    pub fn contains(&mut self, column: &str, value: &str) -> &mut Self {
        let n = self.next_placeholder();
        self.clauses
            .push(format!("{} ILIKE '%' || ${} || '%'", column, n));
        self.values.push(BindValue::Text(value.to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Render the combined predicate, parenthesized. Empty builder renders
    /// `TRUE` so callers can splice it unconditionally.
    pub fn predicate(&self) -> String {
        if self.clauses.is_empty() {
            "TRUE".to_string()
        } else {
            format!("({})", self.clauses.join(self.combinator.sql()))
        }
    }

    pub fn values(&self) -> &[BindValue] {
        &self.values
    }
}

/// Bind all accumulated values onto a `query_as` in order.
macro_rules! bind_filter_values {
    ($query:expr, $builder:expr) => {{
        let mut q = $query;
        for value in $builder.values() {
            q = match value {
                $crate::modules::declaration::repo::filter::BindValue::Int(v) => q.bind(*v),
                $crate::modules::declaration::repo::filter::BindValue::Text(v) => {
                    q.bind(v.clone())
                }
            };
        }
        q
    }};
}
pub(crate) use bind_filter_values;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_combination_with_offset() {
        let mut builder = FilterBuilder::with_offset(Combinator::And, 2);
        builder.eq_int("month", 1).eq_text("department_code", "D1");
        assert_eq!(builder.predicate(), "(month = $3 AND department_code = $4)");
        assert_eq!(
            builder.values(),
            &[BindValue::Int(1), BindValue::Text("D1".to_string())]
        );
    }

    #[test]
    fn test_or_combination_for_multi_field_search() {
        let mut builder = FilterBuilder::new(Combinator::Or);
        builder
            .eq_text("bhxh_code", "1234567890")
            .contains("full_name", "Nguyễn");
        assert_eq!(
            builder.predicate(),
            "(bhxh_code = $1 OR full_name ILIKE '%' || $2 || '%')"
        );
    }

    #[test]
    fn test_empty_builder_renders_true() {
        let builder = FilterBuilder::new(Combinator::And);
        assert!(builder.is_empty());
        assert_eq!(builder.predicate(), "TRUE");
    }
}
