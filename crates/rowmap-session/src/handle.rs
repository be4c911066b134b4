//! Typed handles over the erased components.
//!
//! The registry stores one persistor and one query engine per model name,
//! behind `dyn` traits. The handles bind them back to a concrete [`Model`]
//! type so callers pass and receive `M` directly; results are recovered with
//! a checked downcast.

use crate::builder::BuildScope;
use crate::engine::{Query, QueryOutput};
use crate::persistor::Persistor;
use crate::session::Session;
use rowmap_core::{Model, Result, Row, downcast, downcast_all};
use rowmap_query::{Conditions, Params, ReturnMode};
use std::marker::PhantomData;
use std::sync::Arc;

/// Result of a typed raw query.
#[derive(Debug)]
pub enum QueryResult<M> {
    Rows(Vec<Row>),
    Models(Vec<M>),
}

impl<M> QueryResult<M> {
    /// The rows, when the query ran in [`ReturnMode::Neither`].
    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            QueryResult::Rows(rows) => Some(rows),
            QueryResult::Models(_) => None,
        }
    }

    /// The models, when the query ran in [`ReturnMode::Id`] or [`ReturnMode::Model`].
    pub fn into_models(self) -> Option<Vec<M>> {
        match self {
            QueryResult::Rows(_) => None,
            QueryResult::Models(models) => Some(models),
        }
    }
}

/// Persistor bound to `M`.
pub struct ModelPersistor<'s, M: Model> {
    session: &'s Session,
    inner: Arc<dyn Persistor>,
    _marker: PhantomData<fn() -> M>,
}

impl<'s, M: Model> ModelPersistor<'s, M> {
    pub(crate) fn new(session: &'s Session, inner: Arc<dyn Persistor>) -> Self {
        Self {
            session,
            inner,
            _marker: PhantomData,
        }
    }

    /// The erased persistor this handle wraps.
    pub fn inner(&self) -> &Arc<dyn Persistor> {
        &self.inner
    }

    /// Insert or update `model` and cascade into its associations.
    pub fn save(&self, model: &mut M) -> Result<()> {
        self.session
            .cascade_scope(self.inner.meta(), |cx| self.inner.save(cx, model))
    }

    /// Delete `model` after its cascade-eligible children.
    pub fn clear(&self, model: &M) -> Result<()> {
        self.session
            .cascade_scope(self.inner.meta(), |cx| self.inner.clear(cx, model))
    }

    pub fn insert(&self, model: &mut M) -> Result<i64> {
        self.inner.insert(&self.session.cx(), model)
    }

    pub fn update(&self, model: &M) -> Result<()> {
        self.inner.update(&self.session.cx(), model)
    }

    /// Delete `model` alone.
    pub fn delete(&self, model: &M) -> Result<()> {
        self.inner.delete(&self.session.cx(), model)
    }
}

/// Query engine bound to `M`.
pub struct ModelQuery<'s, M: Model> {
    session: &'s Session,
    inner: Arc<dyn Query>,
    _marker: PhantomData<fn() -> M>,
}

impl<'s, M: Model> ModelQuery<'s, M> {
    pub(crate) fn new(session: &'s Session, inner: Arc<dyn Query>) -> Self {
        Self {
            session,
            inner,
            _marker: PhantomData,
        }
    }

    pub fn inner(&self) -> &Arc<dyn Query> {
        &self.inner
    }

    /// Raw SQL with `:name` / `?` parameters.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let params = Params::new().named("min", 18_i64);
    /// let adults = users
    ///     .query("SELECT * FROM users WHERE age >= :min", &params, ReturnMode::Model)?
    ///     .into_models();
    /// ```
    pub fn query(&self, sql: &str, params: &Params, mode: ReturnMode) -> Result<QueryResult<M>> {
        match self.inner.query(&self.session.cx(), sql, params, mode)? {
            QueryOutput::Rows(rows) => Ok(QueryResult::Rows(rows)),
            QueryOutput::Models(models) => Ok(QueryResult::Models(downcast_all(models)?)),
        }
    }

    /// Every model matching `conditions`, or all of them with `None`.
    pub fn fetch_all(&self, conditions: Option<&Conditions>) -> Result<Vec<M>> {
        downcast_all(self.inner.fetch_all(&self.session.cx(), conditions)?)
    }

    pub fn fetch_all_build_all(&self, conditions: Option<&Conditions>) -> Result<Vec<M>> {
        downcast_all(
            self.inner
                .fetch_all_build_all(&self.session.cx(), conditions)?,
        )
    }

    /// The single model matching `conditions`.
    pub fn fetch_one(&self, conditions: &Conditions) -> Result<M> {
        downcast(self.inner.fetch_one(&self.session.cx(), conditions)?)
    }

    pub fn fetch_one_build_all(&self, conditions: &Conditions) -> Result<M> {
        downcast(
            self.inner
                .fetch_one_build_all(&self.session.cx(), conditions)?,
        )
    }

    pub fn get(&self, id: i64) -> Result<M> {
        downcast(self.inner.get(&self.session.cx(), id)?)
    }

    pub fn get_build_all(&self, id: i64) -> Result<M> {
        downcast(self.inner.get_build_all(&self.session.cx(), id)?)
    }

    pub fn exists(&self, id: i64) -> Result<bool> {
        self.inner.exists(&self.session.cx(), id)
    }

    /// A fresh, empty `M`.
    pub fn get_model(&self) -> Result<M> {
        downcast(self.inner.get_model())
    }

    /// Populate `model`'s associations through its builder.
    pub fn build(&self, scope: BuildScope<'_>, model: &mut M) -> Result<()> {
        let cx = self.session.cx();
        cx.builder(M::MODEL_NAME)?.build(&cx, scope, model)
    }
}
