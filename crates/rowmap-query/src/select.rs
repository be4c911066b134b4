//! SELECT rendering.

use crate::clause::Where;
use rowmap_core::{Dialect, Value};

/// A SELECT over one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    table: String,
    where_clause: Option<Where>,
}

impl Select {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            where_clause: None,
        }
    }

    /// Add an ANDed `column = value` condition.
    pub fn where_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.and_eq(column, value),
            None => Where::eq(column, value),
        });
        self
    }

    /// Replace the WHERE clause.
    pub fn filter(mut self, clause: Option<Where>) -> Self {
        self.where_clause = clause.filter(|w| !w.is_empty());
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Build the SQL query and parameters.
    pub fn build(&self, dialect: Dialect) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT * FROM {}", self.table);
        let params = match &self.where_clause {
            Some(where_clause) => {
                let (where_sql, params) = where_clause.build(dialect);
                sql.push_str(" WHERE ");
                sql.push_str(&where_sql);
                params
            }
            None => Vec::new(),
        };
        (sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scan() {
        let (sql, params) = Select::from("users").build(Dialect::Postgres);
        assert_eq!(sql, "SELECT * FROM users");
        assert!(params.is_empty());
    }

    #[test]
    fn equality_conjunction() {
        let (sql, params) = Select::from("users")
            .where_eq("name", "Ann")
            .where_eq("age", 30_i64)
            .build(Dialect::Sqlite);
        assert_eq!(sql, "SELECT * FROM users WHERE name = ?1 AND age = ?2");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn empty_filter_is_dropped() {
        let (sql, _) = Select::from("users")
            .where_eq("id", 3_i64)
            .filter(None)
            .build(Dialect::Mysql);
        assert_eq!(sql, "SELECT * FROM users");

        let (sql, params) = Select::from("users")
            .filter(Some(Where::eq("id", 3_i64)))
            .build(Dialect::Mysql);
        assert_eq!(sql, "SELECT * FROM users WHERE id = ?");
        assert_eq!(params, vec![Value::BigInt(3)]);
    }
}
