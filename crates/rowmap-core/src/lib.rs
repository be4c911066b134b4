//! Core types and traits for rowmap.
//!
//! This crate provides the foundational abstractions shared by the query and
//! session layers:
//!
//! - `Model` trait for struct ↔ table mapping, and its object-safe `Entity` view
//! - `FieldInfo` / `AssociationInfo` static metadata
//! - `Connection` trait for the injected database adapter
//! - `FieldConverter` trait and the library converters
//! - `Value`, `Row` and the `Error` taxonomy

pub mod association;
pub mod component;
pub mod connection;
pub mod convert;
pub mod entity;
pub mod error;
pub mod field;
pub mod model;
pub mod row;
pub mod value;

pub use association::{AssociationInfo, AssociationKind, Related, RelatedMut, lower_first};
pub use component::ComponentKind;
pub use connection::{Connection, Dialect, quote_literal};
pub use convert::{FieldConverter, LIBRARY_CONVERTERS, library_converter};
pub use entity::{Entity, downcast, downcast_all, downcast_first, downcast_ref};
pub use error::{
    CardinalityError, CardinalityKind, Error, QueryError, Result, TypeError, TypeMismatchError,
    UnresolvedError, UnresolvedKind,
};
pub use field::FieldInfo;
pub use model::Model;
pub use row::{ColumnInfo, FromValue, Row};
pub use value::Value;
