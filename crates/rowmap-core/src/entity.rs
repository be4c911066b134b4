//! Type-erased models.
//!
//! Cascades and association builders handle models of several types at once.
//! [`Entity`] is the object-safe view of a [`Model`] they work with; every
//! model gets it through a blanket impl, and the helpers here recover the
//! concrete type again.

use crate::Result;
use crate::association::{Related, RelatedMut};
use crate::error::Error;
use crate::model::Model;
use crate::value::Value;
use std::any::Any;

/// Object-safe view of a [`Model`].
pub trait Entity: Send + Sync + 'static {
    fn model_name(&self) -> &'static str;

    fn entity_id(&self) -> Option<i64>;

    fn set_entity_id(&mut self, id: i64);

    fn is_transient(&self) -> bool;

    fn snapshot(&self) -> Vec<(&'static str, Value)>;

    fn assign(&mut self, field: &str, value: Value) -> Result<()>;

    fn related(&self, name: &str) -> Option<Related<'_>>;

    fn related_mut(&mut self, name: &str) -> Option<RelatedMut<'_>>;

    fn attach_related(&mut self, name: &str, members: Vec<Box<dyn Entity>>) -> Result<()>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<M: Model> Entity for M {
    fn model_name(&self) -> &'static str {
        M::MODEL_NAME
    }

    fn entity_id(&self) -> Option<i64> {
        self.id()
    }

    fn set_entity_id(&mut self, id: i64) {
        self.set_id(id);
    }

    fn is_transient(&self) -> bool {
        self.is_new()
    }

    fn snapshot(&self) -> Vec<(&'static str, Value)> {
        self.to_row()
    }

    fn assign(&mut self, field: &str, value: Value) -> Result<()> {
        self.set_field(field, value)
    }

    fn related(&self, name: &str) -> Option<Related<'_>> {
        self.association(name)
    }

    fn related_mut(&mut self, name: &str) -> Option<RelatedMut<'_>> {
        self.association_mut(name)
    }

    fn attach_related(&mut self, name: &str, members: Vec<Box<dyn Entity>>) -> Result<()> {
        self.attach(name, members)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Recover a concrete model from an erased one.
pub fn downcast<M: Model>(entity: Box<dyn Entity>) -> Result<M> {
    let actual = entity.model_name();
    entity
        .into_any()
        .downcast::<M>()
        .map(|boxed| *boxed)
        .map_err(|_| Error::type_mismatch("downcast", M::MODEL_NAME, actual))
}

/// Recover a concrete model reference, checking it is bound to `M`.
pub fn downcast_ref<'a, M: Model>(entity: &'a dyn Entity, operation: &'static str) -> Result<&'a M> {
    entity
        .as_any()
        .downcast_ref::<M>()
        .ok_or_else(|| Error::type_mismatch(operation, M::MODEL_NAME, entity.model_name()))
}

/// Recover every member of an erased collection, keeping order.
pub fn downcast_all<M: Model>(entities: Vec<Box<dyn Entity>>) -> Result<Vec<M>> {
    entities.into_iter().map(downcast::<M>).collect()
}

/// Recover the first member of an erased collection, if any.
pub fn downcast_first<M: Model>(entities: Vec<Box<dyn Entity>>) -> Result<Option<M>> {
    entities.into_iter().next().map(downcast::<M>).transpose()
}
