//! rowmap - a small object-relational mapping core.
//!
//! rowmap maps database rows to Rust models and back, and cascades
//! persistence across the associations each model declares:
//!
//! - Per-model components (mapper, persistor, query engine, builder) resolved
//!   through three tiers: model-specific override, generic override, library
//!   default
//! - Raw SQL with `:name` and `?` parameters
//! - Exactly-one fetches that tell "none" apart from "too many"
//! - Cascading save and clear over `One` / `Many` associations
//!
//! The database itself stays outside: callers inject a [`Connection`].
//!
//! # Quick Start
//!
//! ```ignore
//! use rowmap::prelude::*;
//!
//! let session = SessionBuilder::new()
//!     .model::<User>()
//!     .model::<Post>()
//!     .connection(conn)
//!     .build()?;
//!
//! let mut user = User::named("Ann");
//! user.posts.push(Post::titled("Hello"));
//! session.persistor::<User>()?.save(&mut user)?;
//!
//! let users = session.query::<User>()?;
//! let ann = users.fetch_one(&Conditions::new().eq("name", "Ann"))?;
//! assert!(users.exists(ann.id.unwrap())?);
//! ```

pub use rowmap_core::{
    AssociationInfo, AssociationKind, CardinalityError, CardinalityKind, ColumnInfo,
    ComponentKind, Connection, Dialect, Entity, Error, FieldConverter, FieldInfo, FromValue,
    Model, QueryError, Related, RelatedMut, Result, Row, TypeError, TypeMismatchError,
    UnresolvedError, UnresolvedKind, Value, downcast, downcast_all, downcast_first,
    downcast_ref, library_converter, quote_literal,
};

pub use rowmap_query::{Conditions, ParamKey, Params, ReturnMode, Select, Table, Where, raw_query};

pub use rowmap_session::{
    AssociationGraph, BaseBuilder, BaseMapper, BasePersistor, BaseQuery, BuildScope, Builder,
    Cx, Edge, Mapper, ModelMeta, ModelPersistor, ModelQuery, Persistor, Query, QueryOutput,
    QueryResult, Registry, RegistryBuilder, RegistryConfig, Session, Tier,
};

/// Library component implementations as free functions, for overrides that
/// extend rather than replace the default behavior.
pub mod defaults {
    pub use rowmap_session::builder::build;
    pub use rowmap_session::engine::{exists, fetch_all, fetch_one, get, query};
    pub use rowmap_session::mapper::{
        db_name_to_field_name, field_name_to_db_name, model_to_row, row_to_model, unescape_text,
    };
    pub use rowmap_session::persistor::{clear, delete, insert, save, update};
}

pub mod session;
pub use session::SessionBuilder;

/// Commonly used items.
pub mod prelude {
    pub use crate::{
        AssociationInfo, BuildScope, Conditions, Connection, Cx, Entity, Error, FieldInfo,
        Mapper, Model, ModelMeta, Params, Persistor, Query, RegistryBuilder, RegistryConfig,
        Related, RelatedMut, Result, ReturnMode, Row, Session, SessionBuilder, Value,
    };
}
