//! Persistence with association cascading.
//!
//! `save` inserts or updates a model and then walks its cascade-eligible
//! associations depth-first: each child gets the owner's id written into its
//! foreign-key field and is saved through its own model's persistor. `clear`
//! walks the same associations, removing children before the owner; a child
//! that was never saved has no row and is skipped.
//!
//! Each step into a child goes through [`Cx::descend`], which fails once the
//! configured maximum depth is passed.

use crate::meta::ModelMeta;
use crate::session::Cx;
use rowmap_core::{AssociationInfo, Entity, Error, Result, UnresolvedKind, Value};

/// Writes one model's rows.
pub trait Persistor: Send + Sync {
    fn meta(&self) -> &ModelMeta;

    /// Associations this persistor cascades through, fixed at construction.
    ///
    /// Entries with `save = false` are ignored.
    fn associations(&self) -> &[AssociationInfo];

    /// Insert or update, then cascade into `save = true` associations.
    fn save(&self, cx: &Cx<'_>, model: &mut dyn Entity) -> Result<()> {
        save(self, cx, model)
    }

    /// Remove cascade-eligible children, then the model itself.
    fn clear(&self, cx: &Cx<'_>, model: &dyn Entity) -> Result<()> {
        clear(self, cx, model)
    }

    /// Insert and assign the returned id.
    fn insert(&self, cx: &Cx<'_>, model: &mut dyn Entity) -> Result<i64> {
        insert(self, cx, model)
    }

    fn update(&self, cx: &Cx<'_>, model: &dyn Entity) -> Result<()> {
        update(self, cx, model)
    }

    fn delete(&self, cx: &Cx<'_>, model: &dyn Entity) -> Result<()> {
        delete(self, cx, model)
    }
}

/// The library persistor.
#[derive(Debug, Clone)]
pub struct BasePersistor {
    meta: ModelMeta,
    associations: Vec<AssociationInfo>,
}

impl BasePersistor {
    pub fn new(meta: ModelMeta) -> Self {
        let associations = meta.cascades().cloned().collect();
        Self { meta, associations }
    }
}

impl Persistor for BasePersistor {
    fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    fn associations(&self) -> &[AssociationInfo] {
        &self.associations
    }
}

#[tracing::instrument(
    level = "debug",
    skip(persistor, cx, model),
    fields(model = persistor.meta().name, depth = cx.depth())
)]
pub fn save<P: Persistor + ?Sized>(persistor: &P, cx: &Cx<'_>, model: &mut dyn Entity) -> Result<()> {
    let meta = persistor.meta();
    meta.check(model, "save")?;

    let owner_id = match model.entity_id() {
        Some(id) if id != 0 => {
            persistor.update(cx, model)?;
            id
        }
        _ => persistor.insert(cx, model)?,
    };

    for assoc in persistor.associations().iter().filter(|a| a.save) {
        let Some(related) = model.related_mut(assoc.name) else {
            return Err(Error::unresolved_for(
                UnresolvedKind::Association,
                assoc.name,
                meta.name,
            ));
        };
        let members = related.into_members();
        if members.is_empty() {
            tracing::trace!(association = assoc.name, "Nothing to cascade");
            continue;
        }

        let child_cx = cx.descend(assoc.model)?;
        let child_persistor = cx.persistor(assoc.model)?;
        let foreign_key = assoc.foreign_key_for(meta.name);
        tracing::debug!(
            association = assoc.name,
            members = members.len(),
            foreign_key = %foreign_key,
            "Cascading save"
        );
        for child in members {
            child.assign(&foreign_key, Value::BigInt(owner_id))?;
            child_persistor.save(&child_cx, child)?;
        }
    }

    Ok(())
}

#[tracing::instrument(
    level = "debug",
    skip(persistor, cx, model),
    fields(model = persistor.meta().name, depth = cx.depth())
)]
pub fn clear<P: Persistor + ?Sized>(persistor: &P, cx: &Cx<'_>, model: &dyn Entity) -> Result<()> {
    let meta = persistor.meta();
    meta.check(model, "clear")?;

    for assoc in persistor.associations().iter().filter(|a| a.save) {
        let Some(related) = model.related(assoc.name) else {
            return Err(Error::unresolved_for(
                UnresolvedKind::Association,
                assoc.name,
                meta.name,
            ));
        };
        let members = related.into_members();
        if members.is_empty() {
            continue;
        }

        let child_cx = cx.descend(assoc.model)?;
        let child_persistor = cx.persistor(assoc.model)?;
        tracing::debug!(
            association = assoc.name,
            members = members.len(),
            "Cascading clear"
        );
        for child in members {
            if !matches!(child.entity_id(), Some(id) if id != 0) {
                tracing::debug!(association = assoc.name, "Skipping transient child");
                continue;
            }
            child_persistor.clear(&child_cx, child)?;
        }
    }

    persistor.delete(cx, model)
}

pub fn insert<P: Persistor + ?Sized>(persistor: &P, cx: &Cx<'_>, model: &mut dyn Entity) -> Result<i64> {
    let meta = persistor.meta();
    meta.check(model, "insert")?;
    let row = cx.mapper(meta.name)?.model_to_row(model);
    let id = cx.table(meta).insert(&row)?;
    model.set_entity_id(id);
    tracing::debug!(model = meta.name, id, "Inserted");
    Ok(id)
}

pub fn update<P: Persistor + ?Sized>(persistor: &P, cx: &Cx<'_>, model: &dyn Entity) -> Result<()> {
    let meta = persistor.meta();
    meta.check(model, "update")?;
    let id = persisted_id(meta, model, "update")?;
    let row = cx.mapper(meta.name)?.model_to_row(model);
    let affected = cx.table(meta).update(&row, id)?;
    tracing::debug!(model = meta.name, id, affected, "Updated");
    Ok(())
}

pub fn delete<P: Persistor + ?Sized>(persistor: &P, cx: &Cx<'_>, model: &dyn Entity) -> Result<()> {
    let meta = persistor.meta();
    meta.check(model, "delete")?;
    let id = persisted_id(meta, model, "delete")?;
    let affected = cx.table(meta).delete(id)?;
    tracing::debug!(model = meta.name, id, affected, "Deleted");
    Ok(())
}

fn persisted_id(meta: &ModelMeta, model: &dyn Entity, operation: &'static str) -> Result<i64> {
    match model.entity_id() {
        Some(id) if id != 0 => Ok(id),
        _ => Err(Error::Custom(format!(
            "{}() on {} requires a persisted model",
            operation, meta.name
        ))),
    }
}
