//! Registered model metadata.

use rowmap_core::{AssociationInfo, Entity, Error, FieldInfo, Model, Result};
use std::any::{Any, TypeId};

/// Everything the registry knows about one model, captured from its [`Model`]
/// impl at registration.
///
/// Components are constructed with a `ModelMeta`; it carries the model name
/// they are bound to.
#[derive(Debug, Clone)]
pub struct ModelMeta {
    pub name: &'static str,
    pub table: &'static str,
    pub primary_key: &'static str,
    pub fields: &'static [FieldInfo],
    pub associations: &'static [AssociationInfo],
    factory: fn() -> Box<dyn Entity>,
    type_id: TypeId,
}

fn new_boxed<M: Model>() -> Box<dyn Entity> {
    Box::new(M::new_empty())
}

impl ModelMeta {
    pub fn of<M: Model>() -> Self {
        Self {
            name: M::MODEL_NAME,
            table: M::TABLE_NAME,
            primary_key: M::PRIMARY_KEY,
            fields: M::fields(),
            associations: M::ASSOCIATIONS,
            factory: new_boxed::<M>,
            type_id: TypeId::of::<M>(),
        }
    }

    /// A fresh, empty instance of the model.
    pub fn new_entity(&self) -> Box<dyn Entity> {
        (self.factory)()
    }

    /// Is this the metadata of `M`?
    pub fn is<M: Model>(&self) -> bool {
        self.type_id == TypeId::of::<M>()
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn association(&self, name: &str) -> Option<&'static AssociationInfo> {
        self.associations.iter().find(|a| a.name == name)
    }

    /// Associations that save and clear cascade into, in declaration order.
    pub fn cascades(&self) -> impl Iterator<Item = &'static AssociationInfo> {
        self.associations.iter().filter(|a| a.save)
    }

    /// Fail with `TypeMismatch` unless `entity` is an instance of this model.
    pub fn check(&self, entity: &dyn Entity, operation: &'static str) -> Result<()> {
        if entity.model_name() == self.name && Any::type_id(entity.as_any()) == self.type_id {
            Ok(())
        } else {
            Err(Error::type_mismatch(operation, self.name, entity.model_name()))
        }
    }
}
