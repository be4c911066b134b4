//! Component registry.
//!
//! The registry owns every piece of per-model wiring: the registered models,
//! the implementation chosen for each component kind, the field converters and
//! the association graph. For a `(component kind, model name)` pair the first
//! match wins:
//!
//! 1. an override registered for that model name,
//! 2. a generic ("base") override registered once for all models,
//! 3. the library default.
//!
//! Tiers 2 and 3 are constructed with the model's [`ModelMeta`], which carries
//! the model name. The instance resolved for a pair is cached for the life of
//! the registry.
//!
//! # Example
//!
//! ```ignore
//! let registry = RegistryBuilder::new()
//!     .model::<User>()
//!     .model::<Post>()
//!     .override_persistor("User", |meta| Arc::new(AuditedPersistor::new(meta.clone())))
//!     .converter("Money", MoneyConverter)
//!     .build()?;
//! ```

use crate::builder::{BaseBuilder, Builder};
use crate::config::RegistryConfig;
use crate::engine::{BaseQuery, Query};
use crate::graph::AssociationGraph;
use crate::mapper::{BaseMapper, Mapper};
use crate::meta::ModelMeta;
use crate::persistor::{BasePersistor, Persistor};
use rowmap_core::{
    ComponentKind, Error, FieldConverter, Model, Result, UnresolvedKind, library_converter,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Which tier produced a resolved component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Override registered for the model name.
    Specific,
    /// Generic application override.
    Base,
    /// Library default.
    Library,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Specific => "specific",
            Tier::Base => "base",
            Tier::Library => "library",
        })
    }
}

/// Constructs a component for one model.
pub type Factory<T> = Arc<dyn Fn(&ModelMeta) -> Arc<T> + Send + Sync>;

/// The three tiers of one component kind plus its resolved-instance cache.
struct Tiers<T: ?Sized> {
    kind: ComponentKind,
    specific: HashMap<String, Factory<T>>,
    base: Option<Factory<T>>,
    library: Factory<T>,
    cache: RwLock<HashMap<String, (Tier, Arc<T>)>>,
}

impl<T: ?Sized> Tiers<T> {
    fn new(
        kind: ComponentKind,
        specific: HashMap<String, Factory<T>>,
        base: Option<Factory<T>>,
        library: Factory<T>,
    ) -> Self {
        Self {
            kind,
            specific,
            base,
            library,
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn resolve(&self, meta: &ModelMeta) -> Arc<T> {
        if let Some((_, hit)) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(meta.name)
        {
            return Arc::clone(hit);
        }

        let (tier, factory) = if let Some(factory) = self.specific.get(meta.name) {
            (Tier::Specific, factory)
        } else if let Some(factory) = &self.base {
            (Tier::Base, factory)
        } else {
            (Tier::Library, &self.library)
        };
        let instance = factory(meta);

        tracing::debug!(kind = %self.kind, model = meta.name, tier = %tier, "Resolved component");

        // A racing resolution may have won; keep whichever was inserted first.
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let (_, resolved) = cache
            .entry(meta.name.to_string())
            .or_insert((tier, instance));
        Arc::clone(resolved)
    }

    fn resolved_tier(&self, model: &str) -> Option<Tier> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(model)
            .map(|(tier, _)| *tier)
    }
}

/// Collects models, overrides, converters and configuration at startup.
pub struct RegistryBuilder {
    models: Vec<ModelMeta>,
    mappers: (HashMap<String, Factory<dyn Mapper>>, Option<Factory<dyn Mapper>>),
    persistors: (
        HashMap<String, Factory<dyn Persistor>>,
        Option<Factory<dyn Persistor>>,
    ),
    queries: (HashMap<String, Factory<dyn Query>>, Option<Factory<dyn Query>>),
    builders: (HashMap<String, Factory<dyn Builder>>, Option<Factory<dyn Builder>>),
    converters: HashMap<String, Arc<dyn FieldConverter>>,
    model_converters: HashMap<(String, String), Arc<dyn FieldConverter>>,
    config: RegistryConfig,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            models: Vec::new(),
            mappers: (HashMap::new(), None),
            persistors: (HashMap::new(), None),
            queries: (HashMap::new(), None),
            builders: (HashMap::new(), None),
            converters: HashMap::new(),
            model_converters: HashMap::new(),
            config: RegistryConfig::default(),
        }
    }

    /// Register a model type.
    pub fn model<M: Model>(mut self) -> Self {
        self.models.push(ModelMeta::of::<M>());
        self
    }

    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `factory` for the mapper of `model`.
    pub fn override_mapper<F>(mut self, model: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ModelMeta) -> Arc<dyn Mapper> + Send + Sync + 'static,
    {
        self.mappers.0.insert(model.into(), Arc::new(factory));
        self
    }

    /// Use `factory` for the persistor of `model`.
    pub fn override_persistor<F>(mut self, model: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ModelMeta) -> Arc<dyn Persistor> + Send + Sync + 'static,
    {
        self.persistors.0.insert(model.into(), Arc::new(factory));
        self
    }

    /// Use `factory` for the query engine of `model`.
    pub fn override_query<F>(mut self, model: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ModelMeta) -> Arc<dyn Query> + Send + Sync + 'static,
    {
        self.queries.0.insert(model.into(), Arc::new(factory));
        self
    }

    /// Use `factory` for the association builder of `model`.
    pub fn override_builder<F>(mut self, model: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ModelMeta) -> Arc<dyn Builder> + Send + Sync + 'static,
    {
        self.builders.0.insert(model.into(), Arc::new(factory));
        self
    }

    /// Use `factory` for the mapper of every model without a specific override.
    pub fn base_mapper<F>(mut self, factory: F) -> Self
    where
        F: Fn(&ModelMeta) -> Arc<dyn Mapper> + Send + Sync + 'static,
    {
        self.mappers.1 = Some(Arc::new(factory));
        self
    }

    pub fn base_persistor<F>(mut self, factory: F) -> Self
    where
        F: Fn(&ModelMeta) -> Arc<dyn Persistor> + Send + Sync + 'static,
    {
        self.persistors.1 = Some(Arc::new(factory));
        self
    }

    pub fn base_query<F>(mut self, factory: F) -> Self
    where
        F: Fn(&ModelMeta) -> Arc<dyn Query> + Send + Sync + 'static,
    {
        self.queries.1 = Some(Arc::new(factory));
        self
    }

    pub fn base_builder<F>(mut self, factory: F) -> Self
    where
        F: Fn(&ModelMeta) -> Arc<dyn Builder> + Send + Sync + 'static,
    {
        self.builders.1 = Some(Arc::new(factory));
        self
    }

    /// Register an application-wide field converter.
    pub fn converter(
        mut self,
        name: impl Into<String>,
        converter: impl FieldConverter + 'static,
    ) -> Self {
        self.converters.insert(name.into(), Arc::new(converter));
        self
    }

    /// Register a field converter used only by `model`.
    pub fn model_converter(
        mut self,
        model: impl Into<String>,
        name: impl Into<String>,
        converter: impl FieldConverter + 'static,
    ) -> Self {
        self.model_converters
            .insert((model.into(), name.into()), Arc::new(converter));
        self
    }

    /// Validate the registrations and freeze them into a [`Registry`].
    #[tracing::instrument(level = "debug", skip(self), fields(models = self.models.len()))]
    pub fn build(self) -> Result<Registry> {
        let mut models: HashMap<String, ModelMeta> = HashMap::with_capacity(self.models.len());
        for meta in self.models {
            if meta.name.is_empty() {
                return Err(Error::MissingParameter("model name".to_string()));
            }
            if models.contains_key(meta.name) {
                return Err(Error::Custom(format!(
                    "model \"{}\" registered twice",
                    meta.name
                )));
            }
            models.insert(meta.name.to_string(), meta);
        }

        let overridden = self
            .mappers
            .0
            .keys()
            .chain(self.persistors.0.keys())
            .chain(self.queries.0.keys())
            .chain(self.builders.0.keys())
            .chain(self.model_converters.keys().map(|(model, _)| model));
        for name in overridden {
            if !models.contains_key(name) {
                return Err(Error::unresolved(UnresolvedKind::Model, name.clone()));
            }
        }

        let graph = AssociationGraph::build(models.values())?;

        tracing::info!(
            models = models.len(),
            converters = self.converters.len(),
            "Registry built"
        );

        Ok(Registry {
            models,
            mappers: Tiers::new(
                ComponentKind::Mapper,
                self.mappers.0,
                self.mappers.1,
                Arc::new(|meta: &ModelMeta| Arc::new(BaseMapper::new(meta.clone())) as Arc<dyn Mapper>),
            ),
            persistors: Tiers::new(
                ComponentKind::Persistor,
                self.persistors.0,
                self.persistors.1,
                Arc::new(|meta: &ModelMeta| {
                    Arc::new(BasePersistor::new(meta.clone())) as Arc<dyn Persistor>
                }),
            ),
            queries: Tiers::new(
                ComponentKind::Query,
                self.queries.0,
                self.queries.1,
                Arc::new(|meta: &ModelMeta| Arc::new(BaseQuery::new(meta.clone())) as Arc<dyn Query>),
            ),
            builders: Tiers::new(
                ComponentKind::Builder,
                self.builders.0,
                self.builders.1,
                Arc::new(|meta: &ModelMeta| {
                    Arc::new(BaseBuilder::new(meta.clone())) as Arc<dyn Builder>
                }),
            ),
            converters: self.converters,
            model_converters: self.model_converters,
            graph,
            config: self.config,
        })
    }
}

/// Immutable per-model wiring with lazily resolved, cached components.
pub struct Registry {
    models: HashMap<String, ModelMeta>,
    mappers: Tiers<dyn Mapper>,
    persistors: Tiers<dyn Persistor>,
    queries: Tiers<dyn Query>,
    builders: Tiers<dyn Builder>,
    converters: HashMap<String, Arc<dyn FieldConverter>>,
    model_converters: HashMap<(String, String), Arc<dyn FieldConverter>>,
    graph: AssociationGraph,
    config: RegistryConfig,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut models: Vec<_> = self.models.keys().collect();
        models.sort();
        f.debug_struct("Registry")
            .field("models", &models)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn graph(&self) -> &AssociationGraph {
        &self.graph
    }

    /// Metadata of a registered model.
    pub fn meta(&self, model: &str) -> Result<&ModelMeta> {
        if model.is_empty() {
            return Err(Error::MissingParameter("model name".to_string()));
        }
        self.models
            .get(model)
            .ok_or_else(|| Error::unresolved(UnresolvedKind::Model, model))
    }

    /// Metadata of `M`, checking the registered model of that name is `M`.
    pub fn meta_of<M: Model>(&self) -> Result<&ModelMeta> {
        let meta = self.meta(M::MODEL_NAME)?;
        if meta.is::<M>() {
            Ok(meta)
        } else {
            Err(Error::type_mismatch(
                "resolve",
                M::MODEL_NAME,
                std::any::type_name::<M>(),
            ))
        }
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelMeta> {
        self.models.values()
    }

    pub fn mapper(&self, model: &str) -> Result<Arc<dyn Mapper>> {
        Ok(self.mappers.resolve(self.meta(model)?))
    }

    pub fn persistor(&self, model: &str) -> Result<Arc<dyn Persistor>> {
        Ok(self.persistors.resolve(self.meta(model)?))
    }

    pub fn query(&self, model: &str) -> Result<Arc<dyn Query>> {
        Ok(self.queries.resolve(self.meta(model)?))
    }

    pub fn builder_for(&self, model: &str) -> Result<Arc<dyn Builder>> {
        Ok(self.builders.resolve(self.meta(model)?))
    }

    /// Tier that produced the cached `kind` component of `model`, if it has
    /// been resolved yet.
    pub fn resolved_tier(&self, kind: ComponentKind, model: &str) -> Option<Tier> {
        match kind {
            ComponentKind::Mapper => self.mappers.resolved_tier(model),
            ComponentKind::Persistor => self.persistors.resolved_tier(model),
            ComponentKind::Query => self.queries.resolved_tier(model),
            ComponentKind::Builder => self.builders.resolved_tier(model),
        }
    }

    /// Field converter `name` as seen by `model`: a converter registered for
    /// that model, then an application-wide one, then the library's.
    pub fn converter(&self, model: &str, name: &str) -> Result<Arc<dyn FieldConverter>> {
        if let Some(found) = self
            .model_converters
            .get(&(model.to_string(), name.to_string()))
        {
            return Ok(Arc::clone(found));
        }
        if let Some(found) = self.converters.get(name) {
            return Ok(Arc::clone(found));
        }
        library_converter(name)
            .ok_or_else(|| Error::unresolved_for(UnresolvedKind::Converter, name, model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmap_core::{AssociationInfo, FieldInfo, Value};

    #[derive(Debug, Default)]
    struct Ticket {
        id: Option<i64>,
    }

    impl Model for Ticket {
        const MODEL_NAME: &'static str = "Ticket";
        const TABLE_NAME: &'static str = "tickets";

        fn fields() -> &'static [FieldInfo] {
            &[]
        }

        fn new_empty() -> Self {
            Self::default()
        }

        fn id(&self) -> Option<i64> {
            self.id
        }

        fn set_id(&mut self, id: i64) {
            self.id = Some(id);
        }

        fn to_row(&self) -> Vec<(&'static str, Value)> {
            vec![("id", self.id.into())]
        }

        fn set_field(&mut self, _field: &str, _value: Value) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct Orphan {
        id: Option<i64>,
    }

    impl Model for Orphan {
        const MODEL_NAME: &'static str = "Orphan";
        const TABLE_NAME: &'static str = "orphans";
        const ASSOCIATIONS: &'static [AssociationInfo] =
            &[AssociationInfo::many("ghosts", "Ghost")];

        fn fields() -> &'static [FieldInfo] {
            &[]
        }

        fn new_empty() -> Self {
            Self::default()
        }

        fn id(&self) -> Option<i64> {
            self.id
        }

        fn set_id(&mut self, id: i64) {
            self.id = Some(id);
        }

        fn to_row(&self) -> Vec<(&'static str, Value)> {
            Vec::new()
        }

        fn set_field(&mut self, _field: &str, _value: Value) -> Result<()> {
            Ok(())
        }
    }

    struct Marked(ModelMeta);

    impl Mapper for Marked {
        fn meta(&self) -> &ModelMeta {
            &self.0
        }

        fn field_name_to_db_name(&self, field: &str) -> String {
            format!("marked_{field}")
        }
    }

    #[test]
    fn library_tier_by_default() {
        let registry = RegistryBuilder::new().model::<Ticket>().build().unwrap();
        assert_eq!(registry.resolved_tier(ComponentKind::Mapper, "Ticket"), None);

        let mapper = registry.mapper("Ticket").unwrap();
        assert_eq!(mapper.meta().name, "Ticket");
        assert_eq!(mapper.field_name_to_db_name("title"), "title");
        assert_eq!(
            registry.resolved_tier(ComponentKind::Mapper, "Ticket"),
            Some(Tier::Library)
        );
    }

    #[test]
    fn base_tier_beats_library() {
        let registry = RegistryBuilder::new()
            .model::<Ticket>()
            .base_mapper(|meta| Arc::new(Marked(meta.clone())))
            .build()
            .unwrap();

        let mapper = registry.mapper("Ticket").unwrap();
        assert_eq!(mapper.field_name_to_db_name("title"), "marked_title");
        assert_eq!(
            registry.resolved_tier(ComponentKind::Mapper, "Ticket"),
            Some(Tier::Base)
        );
    }

    #[test]
    fn specific_tier_beats_base() {
        let registry = RegistryBuilder::new()
            .model::<Ticket>()
            .base_mapper(|meta| Arc::new(BaseMapper::new(meta.clone())))
            .override_mapper("Ticket", |meta| Arc::new(Marked(meta.clone())))
            .build()
            .unwrap();

        registry.mapper("Ticket").unwrap();
        assert_eq!(
            registry.resolved_tier(ComponentKind::Mapper, "Ticket"),
            Some(Tier::Specific)
        );
    }

    #[test]
    fn resolution_is_cached() {
        let registry = RegistryBuilder::new().model::<Ticket>().build().unwrap();
        let first = registry.persistor("Ticket").unwrap();
        let second = registry.persistor("Ticket").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn empty_and_unknown_names() {
        let registry = RegistryBuilder::new().model::<Ticket>().build().unwrap();
        assert!(matches!(
            registry.query("").err(),
            Some(Error::MissingParameter(_))
        ));
        match registry.query("Nope").err() {
            Some(Error::Unresolved(e)) => assert_eq!(e.kind, UnresolvedKind::Model),
            other => panic!("expected unresolved model, got {other:?}"),
        }
    }

    #[test]
    fn override_for_unregistered_model_fails_build() {
        let result = RegistryBuilder::new()
            .model::<Ticket>()
            .override_mapper("Ghost", |meta| Arc::new(Marked(meta.clone())))
            .build();
        assert!(matches!(result, Err(Error::Unresolved(_))));
    }

    #[test]
    fn cascade_to_unregistered_model_fails_build() {
        let result = RegistryBuilder::new().model::<Orphan>().build();
        assert!(matches!(result, Err(Error::Unresolved(_))));
    }

    #[test]
    fn duplicate_registration_fails_build() {
        let result = RegistryBuilder::new()
            .model::<Ticket>()
            .model::<Ticket>()
            .build();
        assert!(matches!(result, Err(Error::Custom(_))));
    }

    #[test]
    fn converter_tiers() {
        let registry = RegistryBuilder::new()
            .model::<Ticket>()
            .converter("Integer", |_: &Value| -> Result<Value> { Ok(Value::BigInt(1)) })
            .model_converter("Ticket", "Integer", |_: &Value| -> Result<Value> {
                Ok(Value::BigInt(2))
            })
            .build()
            .unwrap();

        let raw = Value::Text("9".into());
        let scoped = registry.converter("Ticket", "Integer").unwrap();
        assert_eq!(scoped.from_db(&raw).unwrap(), Value::BigInt(2));

        let shared = registry.converter("Other", "Integer").unwrap();
        assert_eq!(shared.from_db(&raw).unwrap(), Value::BigInt(1));

        let library = registry.converter("Ticket", "Boolean").unwrap();
        assert_eq!(library.from_db(&Value::Int(1)).unwrap(), Value::Bool(true));

        match registry.converter("Ticket", "Money").err() {
            Some(Error::Unresolved(e)) => {
                assert_eq!(e.kind, UnresolvedKind::Converter);
                assert_eq!(e.model.as_deref(), Some("Ticket"));
            }
            other => panic!("expected unresolved converter, got {other:?}"),
        }
    }

    #[test]
    fn meta_of_checks_type() {
        let registry = RegistryBuilder::new().model::<Ticket>().build().unwrap();
        assert_eq!(registry.meta_of::<Ticket>().unwrap().table, "tickets");
    }
}
