//! SQL rendering and table access for rowmap.
//!
//! `rowmap-query` is the **query construction layer**. It turns model
//! metadata and caller input into SQL plus parameters:
//!
//! - **Parameter binding**: `Params` substitutes `:name` and `?` markers in raw SQL.
//! - **Conditions**: `Conditions` / `Where` render equality conjunctions.
//! - **Table gateway**: `Table` runs selects, key lookups and keyed writes.
//!
//! Everything executes through the `Connection` trait from `rowmap-core`.

pub mod builder;
pub mod clause;
pub mod mode;
pub mod params;
pub mod select;
pub mod table;

pub use builder::{DeleteBuilder, InsertBuilder, UpdateBuilder};
pub use clause::{Conditions, Where};
pub use mode::ReturnMode;
pub use params::{ParamKey, Params};
pub use select::Select;
pub use table::Table;

use rowmap_core::{Connection, Result, Row};

/// Bind `params` into `sql` with the connection's quoting and run it.
///
/// # Example
///
/// ```ignore
/// let rows = raw_query(&conn, "SELECT * FROM users WHERE name = :name", &Params::new().named("name", "Ann"))?;
/// ```
#[tracing::instrument(level = "debug", skip(conn, params), fields(params = params.len()))]
pub fn raw_query(conn: &dyn Connection, sql: &str, params: &Params) -> Result<Vec<Row>> {
    let bound = params.bind(sql, |value| conn.quote(value));
    tracing::trace!(sql = %bound, "raw query");
    conn.query(&bound, &[])
}
