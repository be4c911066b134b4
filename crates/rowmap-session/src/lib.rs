//! Component registry and unit of work for rowmap.
//!
//! `rowmap-session` wires models to the components that act on them:
//!
//! - [`Registry`] resolves a [`Mapper`], [`Persistor`], [`Query`] and
//!   [`Builder`] per model name through three tiers (model-specific override,
//!   generic override, library default) and caches the result.
//! - [`Session`] pairs a registry with the injected connection and hands out
//!   typed handles ([`ModelPersistor`], [`ModelQuery`]).
//! - [`Cx`] is the call context threaded through every component method; it
//!   carries the session and the current cascade depth.
//!
//! # Example
//!
//! ```ignore
//! let registry = Arc::new(RegistryBuilder::new().model::<User>().model::<Post>().build()?);
//! let session = Session::new(registry, Arc::new(conn));
//!
//! let mut user = User::new("Ann");
//! user.posts.push(Post::new("Hello"));
//! session.persistor::<User>()?.save(&mut user)?;
//!
//! let again = session.query::<User>()?.get_build_all(user.id.unwrap())?;
//! ```

pub mod builder;
pub mod config;
pub mod engine;
pub mod graph;
pub mod handle;
pub mod mapper;
pub mod meta;
pub mod persistor;
pub mod registry;
pub mod session;

pub use builder::{BaseBuilder, BuildScope, Builder};
pub use config::RegistryConfig;
pub use engine::{BaseQuery, Query, QueryOutput};
pub use graph::{AssociationGraph, Edge};
pub use handle::{ModelPersistor, ModelQuery, QueryResult};
pub use mapper::{BaseMapper, Mapper, unescape_text};
pub use meta::ModelMeta;
pub use persistor::{BasePersistor, Persistor};
pub use registry::{Factory, Registry, RegistryBuilder, Tier};
pub use session::{Cx, Session};
