//! Association population.

use crate::meta::ModelMeta;
use crate::session::Cx;
use rowmap_core::{AssociationInfo, AssociationKind, Entity, Error, Result, UnresolvedKind};
use rowmap_query::Conditions;

/// Which associations a build populates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildScope<'a> {
    All,
    Association(&'a str),
}

/// Populates a model's associations in place.
pub trait Builder: Send + Sync {
    fn meta(&self) -> &ModelMeta;

    fn build(&self, cx: &Cx<'_>, scope: BuildScope<'_>, model: &mut dyn Entity) -> Result<()> {
        build(self, cx, scope, model)
    }
}

/// The library builder: loads children through the foreign-key convention.
#[derive(Debug, Clone)]
pub struct BaseBuilder {
    meta: ModelMeta,
}

impl BaseBuilder {
    pub fn new(meta: ModelMeta) -> Self {
        Self { meta }
    }
}

impl Builder for BaseBuilder {
    fn meta(&self) -> &ModelMeta {
        &self.meta
    }
}

/// Load and attach each selected association, one level deep.
///
/// Children are the target model's rows whose foreign-key field equals the
/// owner's id. A transient owner has no children and is left untouched.
#[tracing::instrument(level = "debug", skip(builder, cx, model), fields(model = builder.meta().name))]
pub fn build<B: Builder + ?Sized>(
    builder: &B,
    cx: &Cx<'_>,
    scope: BuildScope<'_>,
    model: &mut dyn Entity,
) -> Result<()> {
    let meta = builder.meta();
    meta.check(model, "build")?;

    let selected: Vec<&AssociationInfo> = match scope {
        BuildScope::All => meta.associations.iter().collect(),
        BuildScope::Association(name) => vec![meta.association(name).ok_or_else(|| {
            Error::unresolved_for(UnresolvedKind::Association, name, meta.name)
        })?],
    };

    let owner_id = match model.entity_id() {
        Some(id) if id != 0 => id,
        _ => {
            tracing::debug!("Owner not persisted; nothing to load");
            return Ok(());
        }
    };

    for assoc in selected {
        let foreign_key = assoc.foreign_key_for(meta.name);
        let conditions = Conditions::new().eq(foreign_key, owner_id);
        let members = cx.query(assoc.model)?.fetch_all(cx, Some(&conditions))?;

        if assoc.kind == AssociationKind::One && members.len() > 1 {
            if let Some(err) = Error::expect_one(assoc.model, "build", members.len()) {
                return Err(err);
            }
        }

        tracing::debug!(
            association = assoc.name,
            members = members.len(),
            "Attaching association"
        );
        model.attach_related(assoc.name, members)?;
    }

    Ok(())
}
