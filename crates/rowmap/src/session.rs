//! Session construction.
//!
//! # Example
//!
//! ```rust,ignore
//! use rowmap::prelude::*;
//!
//! let session = SessionBuilder::new()
//!     .model::<User>()
//!     .model::<Post>()
//!     .connection(conn)
//!     .build()?;
//! ```

use rowmap_core::{Connection, Error, Model, Result};
use rowmap_session::{Registry, RegistryBuilder, RegistryConfig, Session};
use std::sync::Arc;

/// Builder for a [`Session`] and the registry behind it.
#[derive(Default)]
pub struct SessionBuilder {
    registry: RegistryBuilder,
    connection: Option<Arc<dyn Connection>>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model type.
    pub fn model<M: Model>(mut self) -> Self {
        self.registry = self.registry.model::<M>();
        self
    }

    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.registry = self.registry.config(config);
        self
    }

    /// Configure overrides and converters on the underlying registry builder.
    pub fn registry(mut self, f: impl FnOnce(RegistryBuilder) -> RegistryBuilder) -> Self {
        self.registry = f(self.registry);
        self
    }

    pub fn connection(mut self, connection: impl Connection + 'static) -> Self {
        self.connection = Some(Arc::new(connection));
        self
    }

    /// Use a connection that is already shared.
    pub fn shared_connection(mut self, connection: Arc<dyn Connection>) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Build the registry and open the session.
    pub fn build(self) -> Result<Session> {
        let connection = self
            .connection
            .ok_or_else(|| Error::MissingParameter("connection".to_string()))?;
        let registry: Registry = self.registry.build()?;
        tracing::debug!(dialect = ?connection.dialect(), "Session opened");
        Ok(Session::new(Arc::new(registry), connection))
    }
}
