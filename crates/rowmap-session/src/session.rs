//! Sessions and the call context threaded through component calls.

use crate::builder::Builder;
use crate::engine::Query;
use crate::handle::{ModelPersistor, ModelQuery};
use crate::mapper::Mapper;
use crate::meta::ModelMeta;
use crate::persistor::Persistor;
use crate::registry::Registry;
use rowmap_core::{Connection, Entity, Error, Model, Result};
use rowmap_query::Table;
use std::fmt;
use std::sync::Arc;

/// A registry paired with the connection its components run against.
///
/// Cloning is cheap; clones share the registry (and its resolved-instance
/// cache) and the connection.
#[derive(Clone)]
pub struct Session {
    registry: Arc<Registry>,
    connection: Arc<dyn Connection>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(registry: Arc<Registry>, connection: Arc<dyn Connection>) -> Self {
        Self {
            registry,
            connection,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn connection(&self) -> &dyn Connection {
        self.connection.as_ref()
    }

    /// A top-level call context.
    pub fn cx(&self) -> Cx<'_> {
        Cx {
            session: self,
            depth: 0,
        }
    }

    /// Typed persistor for `M`.
    pub fn persistor<M: Model>(&self) -> Result<ModelPersistor<'_, M>> {
        self.registry.meta_of::<M>()?;
        Ok(ModelPersistor::new(self, self.registry.persistor(M::MODEL_NAME)?))
    }

    /// Typed query engine for `M`.
    pub fn query<M: Model>(&self) -> Result<ModelQuery<'_, M>> {
        self.registry.meta_of::<M>()?;
        Ok(ModelQuery::new(self, self.registry.query(M::MODEL_NAME)?))
    }

    /// Save any registered model, dispatching on its model name.
    pub fn save(&self, model: &mut dyn Entity) -> Result<()> {
        let persistor = self.registry.persistor(model.model_name())?;
        self.cascade_scope(persistor.meta(), |cx| persistor.save(cx, model))
    }

    /// Clear any registered model, dispatching on its model name.
    pub fn clear(&self, model: &dyn Entity) -> Result<()> {
        let persistor = self.registry.persistor(model.model_name())?;
        self.cascade_scope(persistor.meta(), |cx| persistor.clear(cx, model))
    }

    /// Run `f` inside `begin`/`commit`, rolling back when it fails.
    pub fn transaction<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        self.connection.begin()?;
        match f() {
            Ok(value) => {
                self.connection.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = self.connection.rollback() {
                    tracing::warn!(error = %rollback, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Run a top-level save/clear on `meta`, wrapped in a transaction when
    /// configured and the model cascades.
    pub(crate) fn cascade_scope<T>(
        &self,
        meta: &ModelMeta,
        f: impl FnOnce(&Cx<'_>) -> Result<T>,
    ) -> Result<T> {
        let cx = self.cx();
        if self.registry.config().cascade_transaction && self.registry.graph().has_cascade(meta.name)
        {
            tracing::debug!(model = meta.name, "Wrapping cascade in a transaction");
            self.transaction(|| f(&cx))
        } else {
            f(&cx)
        }
    }
}

/// Call context passed to every component method.
///
/// Carries the session and how deep inside a cascade the call is.
#[derive(Clone, Copy)]
pub struct Cx<'s> {
    session: &'s Session,
    depth: usize,
}

impl fmt::Debug for Cx<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cx").field("depth", &self.depth).finish()
    }
}

impl<'s> Cx<'s> {
    pub fn session(&self) -> &'s Session {
        self.session
    }

    pub fn registry(&self) -> &'s Registry {
        &self.session.registry
    }

    pub fn connection(&self) -> &'s dyn Connection {
        self.session.connection.as_ref()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Context for a cascade into `model`, one level deeper.
    pub fn descend(&self, model: &str) -> Result<Cx<'s>> {
        let limit = self.registry().config().max_cascade_depth;
        let depth = self.depth + 1;
        if depth > limit {
            tracing::warn!(model, limit, "Cascade depth limit reached");
            return Err(Error::CascadeDepthExceeded {
                model: model.to_string(),
                limit,
            });
        }
        Ok(Cx {
            session: self.session,
            depth,
        })
    }

    /// Table gateway for `meta`'s table.
    pub fn table(&self, meta: &ModelMeta) -> Table<'s> {
        Table::new(self.connection(), meta.table, meta.primary_key)
    }

    pub fn mapper(&self, model: &str) -> Result<Arc<dyn Mapper>> {
        self.registry().mapper(model)
    }

    pub fn persistor(&self, model: &str) -> Result<Arc<dyn Persistor>> {
        self.registry().persistor(model)
    }

    pub fn query(&self, model: &str) -> Result<Arc<dyn Query>> {
        self.registry().query(model)
    }

    pub fn builder(&self, model: &str) -> Result<Arc<dyn Builder>> {
        self.registry().builder_for(model)
    }
}
