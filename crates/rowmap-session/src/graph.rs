//! Association graph over the registered models.
//!
//! Built once by [`RegistryBuilder::build`](crate::RegistryBuilder::build).
//! Every declared association becomes a typed edge from the owning model to
//! the target model.

use crate::meta::ModelMeta;
use rowmap_core::{AssociationKind, Error, Result, UnresolvedKind};
use std::collections::{HashMap, HashSet};

/// One declared association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub owner: &'static str,
    pub name: &'static str,
    pub target: &'static str,
    pub kind: AssociationKind,
    pub save: bool,
    /// Foreign-key field on the target that points back at the owner.
    pub foreign_key: String,
}

/// Adjacency list of association edges, keyed by owner model name.
#[derive(Debug, Clone, Default)]
pub struct AssociationGraph {
    edges: HashMap<&'static str, Vec<Edge>>,
}

impl AssociationGraph {
    /// Build the graph and check every cascade target is registered.
    pub fn build<'a>(models: impl IntoIterator<Item = &'a ModelMeta>) -> Result<Self> {
        let models: Vec<&ModelMeta> = models.into_iter().collect();
        let registered: HashMap<&str, &ModelMeta> = models.iter().map(|m| (m.name, *m)).collect();

        let mut edges: HashMap<&'static str, Vec<Edge>> = HashMap::new();
        for meta in &models {
            let owner_edges = edges.entry(meta.name).or_default();
            for assoc in meta.associations {
                let foreign_key = assoc.foreign_key_for(meta.name);
                match registered.get(assoc.model) {
                    Some(target) => {
                        if target.field(&foreign_key).is_none() {
                            tracing::warn!(
                                owner = meta.name,
                                association = assoc.name,
                                target = assoc.model,
                                foreign_key = %foreign_key,
                                "Foreign key is not a declared field of the target model"
                            );
                        }
                    }
                    None if assoc.save => {
                        return Err(Error::unresolved_for(
                            UnresolvedKind::Model,
                            assoc.model,
                            meta.name,
                        ));
                    }
                    None => {
                        tracing::debug!(
                            owner = meta.name,
                            target = assoc.model,
                            "Association target not registered; loading it will fail"
                        );
                    }
                }
                owner_edges.push(Edge {
                    owner: meta.name,
                    name: assoc.name,
                    target: assoc.model,
                    kind: assoc.kind,
                    save: assoc.save,
                    foreign_key,
                });
            }
        }

        let graph = Self { edges };
        for meta in &models {
            if graph.cascade_cycle(meta.name) {
                tracing::debug!(
                    model = meta.name,
                    "Cascade edges form a cycle; recursion is bounded by the depth limit"
                );
            }
        }
        Ok(graph)
    }

    /// All edges leaving `owner`, in declaration order.
    pub fn edges(&self, owner: &str) -> &[Edge] {
        self.edges.get(owner).map_or(&[], Vec::as_slice)
    }

    /// Cascade-eligible edges leaving `owner`.
    pub fn cascades<'g>(&'g self, owner: &str) -> impl Iterator<Item = &'g Edge> + 'g {
        self.edges(owner).iter().filter(|e| e.save)
    }

    /// Does save/clear on `owner` reach any other model?
    pub fn has_cascade(&self, owner: &str) -> bool {
        self.cascades(owner).next().is_some()
    }

    /// Models reachable from `owner` through cascade edges, excluding `owner`
    /// unless a cycle leads back to it.
    pub fn cascade_targets(&self, owner: &str) -> Vec<&'static str> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut stack: Vec<&'static str> = self.cascades(owner).map(|e| e.target).collect();
        stack.reverse();
        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            order.push(next);
            let mut children: Vec<_> = self.cascades(next).map(|e| e.target).collect();
            children.reverse();
            stack.extend(children);
        }
        order
    }

    fn cascade_cycle(&self, owner: &str) -> bool {
        self.cascade_targets(owner).contains(&owner)
    }
}
