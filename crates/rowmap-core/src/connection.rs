//! Database connection trait.
//!
//! The database adapter is injected by the application. rowmap renders SQL
//! for table access and raw queries and hands it to a [`Connection`]; the
//! connection owns sockets, statement execution and literal quoting.
//!
//! All calls are synchronous and run to completion. Adapters that are shared
//! across threads must be `Send + Sync`; rowmap adds no locking of its own.

use crate::error::Result;
use crate::row::Row;
use crate::value::Value;
use std::fmt::Write as _;

/// Placeholder style of the underlying database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// PostgreSQL dialect (uses $1, $2 placeholders)
    #[default]
    Postgres,
    /// SQLite dialect (uses ?1, ?2 placeholders)
    Sqlite,
    /// MySQL dialect (uses ? placeholders)
    Mysql,
}

impl Dialect {
    /// Generate a placeholder for the given parameter index (1-based).
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Sqlite => format!("?{index}"),
            Dialect::Mysql => "?".to_string(),
        }
    }
}

/// A database connection capable of executing queries.
///
/// # Example
///
/// ```rust,ignore
/// let rows = conn.query("SELECT * FROM users WHERE id = $1", &[Value::BigInt(1)])?;
/// let id = conn.insert("INSERT INTO users (name) VALUES ($1)", &[Value::from("Ann")])?;
/// ```
pub trait Connection: Send + Sync {
    /// Placeholder style used when rendering table-access SQL.
    fn dialect(&self) -> Dialect {
        Dialect::default()
    }

    /// Execute a query and return all rows.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Execute a statement (UPDATE, DELETE) and return rows affected.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Execute an INSERT and return the identifier assigned by the database.
    fn insert(&self, sql: &str, params: &[Value]) -> Result<i64>;

    /// Render a value as an inline SQL literal.
    fn quote(&self, value: &Value) -> String {
        quote_literal(value)
    }

    /// Open a transaction. Adapters without transactions keep the no-op.
    fn begin(&self) -> Result<()> {
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        Ok(())
    }
}

/// Standard SQL literal quoting.
///
/// Text is wrapped in single quotes with embedded quotes doubled; bytes are
/// rendered as a hex literal.
pub fn quote_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Int(v) => v.to_string(),
        Value::BigInt(v) => v.to_string(),
        Value::Double(v) => {
            if v.is_finite() {
                v.to_string()
            } else {
                "NULL".to_string()
            }
        }
        Value::Text(s) => quote_text(s),
        Value::Bytes(bytes) => {
            let mut out = String::with_capacity(bytes.len() * 2 + 3);
            out.push_str("X'");
            for b in bytes {
                let _ = write!(out, "{b:02X}");
            }
            out.push('\'');
            out
        }
        Value::Json(json) => quote_text(&json.to_string()),
    }
}

fn quote_text(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
