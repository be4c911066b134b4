//! Equality conditions and the WHERE clause they render to.

use rowmap_core::{Dialect, Value};

/// Ordered `field = value` pairs, ANDed together.
///
/// Keys are model field names; the query engine translates them to storage
/// columns before rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    pairs: Vec<(String, Value)>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `field = value` condition.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(field, value);
        self
    }

    pub fn push(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.pairs.push((field.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Rewrite every key, keeping order and values.
    pub fn map_keys<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&str) -> String,
    {
        Self {
            pairs: self
                .pairs
                .iter()
                .map(|(k, v)| (f(k), v.clone()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Conditions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut conditions = Conditions::new();
        for (k, v) in iter {
            conditions.push(k, v);
        }
        conditions
    }
}

/// WHERE clause made of `column = value` terms joined with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Where {
    terms: Vec<(String, Value)>,
}

impl Where {
    /// Create a WHERE clause with a single equality term.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            terms: vec![(column.into(), value.into())],
        }
    }

    /// Add an AND equality term.
    pub fn and_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.terms.push((column.into(), value.into()));
        self
    }

    /// Build a clause from conditions whose keys are already column names.
    pub fn from_conditions(conditions: &Conditions) -> Option<Self> {
        if conditions.is_empty() {
            return None;
        }
        Some(Self {
            terms: conditions
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Build the WHERE clause SQL and parameters.
    pub fn build(&self, dialect: Dialect) -> (String, Vec<Value>) {
        self.build_with_offset(dialect, 0)
    }

    /// Build the WHERE clause with a parameter offset.
    ///
    /// A `NULL` value renders as `IS NULL` and takes no parameter.
    pub fn build_with_offset(&self, dialect: Dialect, offset: usize) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let parts: Vec<String> = self
            .terms
            .iter()
            .map(|(column, value)| {
                if value.is_null() {
                    format!("{} IS NULL", column)
                } else {
                    params.push(value.clone());
                    format!("{} = {}", column, dialect.placeholder(offset + params.len()))
                }
            })
            .collect();
        (parts.join(" AND "), params)
    }
}
