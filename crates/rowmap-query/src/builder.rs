//! Query builders for INSERT, UPDATE, DELETE operations.

use rowmap_core::{Dialect, Value};

/// Is this primary key value "not assigned yet"?
fn is_unassigned_key(value: &Value) -> bool {
    value.is_null() || value.as_i64() == Some(0)
}

/// INSERT query builder.
#[derive(Debug)]
pub struct InsertBuilder<'a> {
    table: &'a str,
    primary_key: &'a str,
    row: &'a [(String, Value)],
}

impl<'a> InsertBuilder<'a> {
    pub fn new(table: &'a str, primary_key: &'a str, row: &'a [(String, Value)]) -> Self {
        Self {
            table,
            primary_key,
            row,
        }
    }

    /// Build the INSERT SQL and parameters.
    ///
    /// An unassigned primary key column is left out so the database assigns it.
    pub fn build(&self, dialect: Dialect) -> (String, Vec<Value>) {
        let insert_fields: Vec<_> = self
            .row
            .iter()
            .filter(|(name, value)| !(name == self.primary_key && is_unassigned_key(value)))
            .collect();

        let columns: Vec<_> = insert_fields.iter().map(|(name, _)| name.as_str()).collect();
        let values: Vec<_> = insert_fields.iter().map(|(_, v)| v.clone()).collect();
        let placeholders: Vec<_> = (1..=values.len()).map(|i| dialect.placeholder(i)).collect();

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            placeholders.join(", ")
        );

        (sql, values)
    }
}

/// UPDATE query builder: every non-key column, matched by primary key.
#[derive(Debug)]
pub struct UpdateBuilder<'a> {
    table: &'a str,
    primary_key: &'a str,
    row: &'a [(String, Value)],
    id: i64,
}

impl<'a> UpdateBuilder<'a> {
    pub fn new(table: &'a str, primary_key: &'a str, row: &'a [(String, Value)], id: i64) -> Self {
        Self {
            table,
            primary_key,
            row,
            id,
        }
    }

    /// Build the UPDATE SQL and parameters.
    pub fn build(&self, dialect: Dialect) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let set_parts: Vec<String> = self
            .row
            .iter()
            .filter(|(name, _)| name != self.primary_key)
            .map(|(name, value)| {
                params.push(value.clone());
                format!("{} = {}", name, dialect.placeholder(params.len()))
            })
            .collect();

        params.push(Value::BigInt(self.id));
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            self.table,
            set_parts.join(", "),
            self.primary_key,
            dialect.placeholder(params.len())
        );

        (sql, params)
    }
}

/// DELETE by primary key.
#[derive(Debug)]
pub struct DeleteBuilder<'a> {
    table: &'a str,
    primary_key: &'a str,
    id: i64,
}

impl<'a> DeleteBuilder<'a> {
    pub fn new(table: &'a str, primary_key: &'a str, id: i64) -> Self {
        Self {
            table,
            primary_key,
            id,
        }
    }

    pub fn build(&self, dialect: Dialect) -> (String, Vec<Value>) {
        (
            format!(
                "DELETE FROM {} WHERE {} = {}",
                self.table,
                self.primary_key,
                dialect.placeholder(1)
            ),
            vec![Value::BigInt(self.id)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Vec<(String, Value)> {
        vec![
            ("id".to_string(), Value::Null),
            ("name".to_string(), Value::from("Ann")),
            ("age".to_string(), Value::BigInt(30)),
        ]
    }

    #[test]
    fn insert_skips_unassigned_key() {
        let row = row();
        let (sql, params) = InsertBuilder::new("users", "id", &row).build(Dialect::Postgres);
        assert_eq!(sql, "INSERT INTO users (name, age) VALUES ($1, $2)");
        assert_eq!(params, vec![Value::from("Ann"), Value::BigInt(30)]);

        let mut zero = row.clone();
        zero[0].1 = Value::BigInt(0);
        let (sql, _) = InsertBuilder::new("users", "id", &zero).build(Dialect::Mysql);
        assert_eq!(sql, "INSERT INTO users (name, age) VALUES (?, ?)");
    }

    #[test]
    fn insert_keeps_explicit_key() {
        let mut row = row();
        row[0].1 = Value::BigInt(12);
        let (sql, params) = InsertBuilder::new("users", "id", &row).build(Dialect::Sqlite);
        assert_eq!(sql, "INSERT INTO users (id, name, age) VALUES (?1, ?2, ?3)");
        assert_eq!(params[0], Value::BigInt(12));
    }

    #[test]
    fn update_sets_non_key_columns() {
        let row = row();
        let (sql, params) = UpdateBuilder::new("users", "id", &row, 7).build(Dialect::Postgres);
        assert_eq!(sql, "UPDATE users SET name = $1, age = $2 WHERE id = $3");
        assert_eq!(params.last(), Some(&Value::BigInt(7)));
    }

    #[test]
    fn delete_by_key() {
        let (sql, params) = DeleteBuilder::new("users", "id", 7).build(Dialect::Postgres);
        assert_eq!(sql, "DELETE FROM users WHERE id = $1");
        assert_eq!(params, vec![Value::BigInt(7)]);
    }
}
