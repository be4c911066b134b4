//! Table gateway.
//!
//! [`Table`] is the table-access capability the session layer works through:
//! equality selects, scans, primary-key lookups and keyed writes, rendered
//! for the connection's dialect and executed on it.

use crate::builder::{DeleteBuilder, InsertBuilder, UpdateBuilder};
use crate::clause::Where;
use crate::select::Select;
use rowmap_core::{Connection, Result, Row, Value};

/// Access to one table over an injected connection.
#[derive(Clone, Copy)]
pub struct Table<'c> {
    conn: &'c dyn Connection,
    name: &'c str,
    primary_key: &'c str,
}

impl std::fmt::Debug for Table<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("primary_key", &self.primary_key)
            .finish_non_exhaustive()
    }
}

impl<'c> Table<'c> {
    pub fn new(conn: &'c dyn Connection, name: &'c str, primary_key: &'c str) -> Self {
        Self {
            conn,
            name,
            primary_key,
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn primary_key(&self) -> &str {
        self.primary_key
    }

    /// A SELECT over this table.
    pub fn select(&self) -> Select {
        Select::from(self.name)
    }

    /// Rows matching the clause; every row when there is none.
    pub fn fetch_all(&self, clause: Option<Where>) -> Result<Vec<Row>> {
        self.run(&self.select().filter(clause))
    }

    /// Rows whose primary key equals `id`.
    pub fn find(&self, id: i64) -> Result<Vec<Row>> {
        self.run(&self.select().where_eq(self.primary_key, id))
    }

    /// Execute a SELECT built from [`Table::select`].
    pub fn run(&self, select: &Select) -> Result<Vec<Row>> {
        let (sql, params) = select.build(self.conn.dialect());
        tracing::trace!(sql = %sql, params = params.len(), table = self.name, "select");
        self.conn.query(&sql, &params)
    }

    /// Insert a row and return the identifier the database assigned.
    pub fn insert(&self, row: &[(String, Value)]) -> Result<i64> {
        let (sql, params) =
            InsertBuilder::new(self.name, self.primary_key, row).build(self.conn.dialect());
        tracing::trace!(sql = %sql, params = params.len(), "insert");
        self.conn.insert(&sql, &params)
    }

    /// Update every non-key column of the row identified by `id`.
    pub fn update(&self, row: &[(String, Value)], id: i64) -> Result<u64> {
        let (sql, params) =
            UpdateBuilder::new(self.name, self.primary_key, row, id).build(self.conn.dialect());
        tracing::trace!(sql = %sql, params = params.len(), "update");
        self.conn.execute(&sql, &params)
    }

    /// Delete the row identified by `id`.
    pub fn delete(&self, id: i64) -> Result<u64> {
        let (sql, params) =
            DeleteBuilder::new(self.name, self.primary_key, id).build(self.conn.dialect());
        tracing::trace!(sql = %sql, "delete");
        self.conn.execute(&sql, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmap_core::Dialect;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorded {
        statements: Vec<(String, Vec<Value>)>,
        rows: Vec<Row>,
    }

    #[derive(Default)]
    struct MockConnection {
        state: Arc<Mutex<Recorded>>,
    }

    impl Connection for MockConnection {
        fn dialect(&self) -> Dialect {
            Dialect::Sqlite
        }

        fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
            let mut state = self.state.lock().expect("lock poisoned");
            state.statements.push((sql.to_string(), params.to_vec()));
            Ok(state.rows.clone())
        }

        fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
            let mut state = self.state.lock().expect("lock poisoned");
            state.statements.push((sql.to_string(), params.to_vec()));
            Ok(1)
        }

        fn insert(&self, sql: &str, params: &[Value]) -> Result<i64> {
            let mut state = self.state.lock().expect("lock poisoned");
            state.statements.push((sql.to_string(), params.to_vec()));
            Ok(41)
        }
    }

    #[test]
    fn find_renders_key_lookup() {
        let conn = MockConnection::default();
        conn.state.lock().unwrap().rows = vec![Row::from_pairs([("id", Value::BigInt(3))])];
        let table = Table::new(&conn, "users", "id");

        let rows = table.find(3).unwrap();
        assert_eq!(rows.len(), 1);

        let state = conn.state.lock().unwrap();
        assert_eq!(state.statements[0].0, "SELECT * FROM users WHERE id = ?1");
        assert_eq!(state.statements[0].1, vec![Value::BigInt(3)]);
    }

    #[test]
    fn fetch_all_without_clause_scans() {
        let conn = MockConnection::default();
        let table = Table::new(&conn, "users", "id");
        assert!(table.fetch_all(None).unwrap().is_empty());
        assert_eq!(conn.state.lock().unwrap().statements[0].0, "SELECT * FROM users");
    }

    #[test]
    fn writes_go_through_connection() {
        let conn = MockConnection::default();
        let table = Table::new(&conn, "users", "id");
        let row = vec![
            ("id".to_string(), Value::Null),
            ("name".to_string(), Value::from("Ann")),
        ];

        assert_eq!(table.insert(&row).unwrap(), 41);
        table.update(&row, 41).unwrap();
        table.delete(41).unwrap();

        let state = conn.state.lock().unwrap();
        let sql: Vec<_> = state.statements.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(
            sql,
            vec![
                "INSERT INTO users (name) VALUES (?1)",
                "UPDATE users SET name = ?1 WHERE id = ?2",
                "DELETE FROM users WHERE id = ?1",
            ]
        );
    }
}
