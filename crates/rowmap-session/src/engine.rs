//! Query engine: raw queries and condition-based fetches for one model.
//!
//! Rows are mapped through the model's [`Mapper`](crate::Mapper) and, for the
//! `*_build_all` variants, populated through its [`Builder`](crate::Builder);
//! both are resolved from the registry.

use crate::builder::BuildScope;
use crate::meta::ModelMeta;
use crate::session::Cx;
use rowmap_core::{Entity, Error, Result, Row};
use rowmap_query::{Conditions, Params, ReturnMode, Where, raw_query};

/// What [`Query::query`] returns, depending on the [`ReturnMode`].
pub enum QueryOutput {
    Rows(Vec<Row>),
    Models(Vec<Box<dyn Entity>>),
}

impl QueryOutput {
    pub fn len(&self) -> usize {
        match self {
            QueryOutput::Rows(rows) => rows.len(),
            QueryOutput::Models(models) => models.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for QueryOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryOutput::Rows(rows) => f.debug_tuple("Rows").field(rows).finish(),
            QueryOutput::Models(models) => {
                let names: Vec<_> = models.iter().map(|m| m.model_name()).collect();
                f.debug_tuple("Models").field(&names).finish()
            }
        }
    }
}

/// Fetches for one model.
pub trait Query: Send + Sync {
    fn meta(&self) -> &ModelMeta;

    /// Run raw SQL with `:name` / `?` parameters.
    fn query(
        &self,
        cx: &Cx<'_>,
        sql: &str,
        params: &Params,
        mode: ReturnMode,
    ) -> Result<QueryOutput> {
        query(self, cx, sql, params, mode)
    }

    /// Every row matching the conditions, or the whole table without any.
    fn fetch_all(
        &self,
        cx: &Cx<'_>,
        conditions: Option<&Conditions>,
    ) -> Result<Vec<Box<dyn Entity>>> {
        fetch_all(self, cx, conditions)
    }

    fn fetch_all_build_all(
        &self,
        cx: &Cx<'_>,
        conditions: Option<&Conditions>,
    ) -> Result<Vec<Box<dyn Entity>>> {
        let mut models = self.fetch_all(cx, conditions)?;
        build_each(self.meta(), cx, &mut models)?;
        Ok(models)
    }

    /// Exactly one row must match.
    fn fetch_one(&self, cx: &Cx<'_>, conditions: &Conditions) -> Result<Box<dyn Entity>> {
        fetch_one(self, cx, conditions)
    }

    fn fetch_one_build_all(
        &self,
        cx: &Cx<'_>,
        conditions: &Conditions,
    ) -> Result<Box<dyn Entity>> {
        let mut model = self.fetch_one(cx, conditions)?;
        build_one(self.meta(), cx, model.as_mut())?;
        Ok(model)
    }

    /// Primary-key lookup.
    fn get(&self, cx: &Cx<'_>, id: i64) -> Result<Box<dyn Entity>> {
        get(self, cx, id)
    }

    fn get_build_all(&self, cx: &Cx<'_>, id: i64) -> Result<Box<dyn Entity>> {
        let mut model = self.get(cx, id)?;
        build_one(self.meta(), cx, model.as_mut())?;
        Ok(model)
    }

    fn exists(&self, cx: &Cx<'_>, id: i64) -> Result<bool> {
        exists(self, cx, id)
    }

    /// A fresh, empty model instance.
    fn get_model(&self) -> Box<dyn Entity> {
        self.meta().new_entity()
    }
}

/// The library query engine.
#[derive(Debug, Clone)]
pub struct BaseQuery {
    meta: ModelMeta,
}

impl BaseQuery {
    pub fn new(meta: ModelMeta) -> Self {
        Self { meta }
    }
}

impl Query for BaseQuery {
    fn meta(&self) -> &ModelMeta {
        &self.meta
    }
}

#[tracing::instrument(
    level = "debug",
    skip(engine, cx, sql, params),
    fields(model = engine.meta().name, params = params.len())
)]
pub fn query<Q: Query + ?Sized>(
    engine: &Q,
    cx: &Cx<'_>,
    sql: &str,
    params: &Params,
    mode: ReturnMode,
) -> Result<QueryOutput> {
    let rows = raw_query(cx.connection(), sql, params)?;
    tracing::debug!(rows = rows.len(), "Raw query complete");

    match mode {
        ReturnMode::Neither => Ok(QueryOutput::Rows(rows)),
        ReturnMode::Id => {
            let primary_key = engine.meta().primary_key;
            let models = rows
                .iter()
                .map(|row| {
                    let id: i64 = row.get_named(primary_key)?;
                    engine.get(cx, id)
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(QueryOutput::Models(models))
        }
        ReturnMode::Model => Ok(QueryOutput::Models(map_rows(engine.meta(), cx, &rows)?)),
    }
}

#[tracing::instrument(level = "debug", skip(engine, cx, conditions), fields(model = engine.meta().name))]
pub fn fetch_all<Q: Query + ?Sized>(
    engine: &Q,
    cx: &Cx<'_>,
    conditions: Option<&Conditions>,
) -> Result<Vec<Box<dyn Entity>>> {
    let meta = engine.meta();
    let clause = match conditions {
        Some(conditions) => column_clause(meta, cx, conditions)?,
        None => None,
    };
    let rows = cx.table(meta).fetch_all(clause)?;
    tracing::debug!(rows = rows.len(), "Fetched");
    map_rows(meta, cx, &rows)
}

#[tracing::instrument(level = "debug", skip(engine, cx, conditions), fields(model = engine.meta().name))]
pub fn fetch_one<Q: Query + ?Sized>(
    engine: &Q,
    cx: &Cx<'_>,
    conditions: &Conditions,
) -> Result<Box<dyn Entity>> {
    let meta = engine.meta();
    let clause = column_clause(meta, cx, conditions)?;
    let rows = cx.table(meta).fetch_all(clause)?;
    if let Some(err) = Error::expect_one(meta.name, "fetch_one", rows.len()) {
        tracing::debug!(rows = rows.len(), "Expected exactly one row");
        return Err(err);
    }
    let mapper = cx.mapper(meta.name)?;
    mapper.new_model(cx, &rows[0])
}

#[tracing::instrument(level = "debug", skip(engine, cx), fields(model = engine.meta().name))]
pub fn get<Q: Query + ?Sized>(engine: &Q, cx: &Cx<'_>, id: i64) -> Result<Box<dyn Entity>> {
    let meta = engine.meta();
    let rows = cx.table(meta).find(id)?;
    let Some(row) = rows.first() else {
        return Err(Error::not_found(meta.name, "get"));
    };
    if rows.len() > 1 {
        tracing::warn!(rows = rows.len(), "Primary-key lookup matched several rows");
    }
    cx.mapper(meta.name)?.new_model(cx, row)
}

pub fn exists<Q: Query + ?Sized>(engine: &Q, cx: &Cx<'_>, id: i64) -> Result<bool> {
    let meta = engine.meta();
    Ok(!cx.table(meta).find(id)?.is_empty())
}

/// Translate field-name conditions to a column clause through the mapper.
fn column_clause(meta: &ModelMeta, cx: &Cx<'_>, conditions: &Conditions) -> Result<Option<Where>> {
    if conditions.is_empty() {
        return Ok(None);
    }
    let mapper = cx.mapper(meta.name)?;
    let columns = conditions.map_keys(|field| mapper.field_name_to_db_name(field));
    Ok(Where::from_conditions(&columns))
}

fn map_rows(meta: &ModelMeta, cx: &Cx<'_>, rows: &[Row]) -> Result<Vec<Box<dyn Entity>>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let mapper = cx.mapper(meta.name)?;
    rows.iter().map(|row| mapper.new_model(cx, row)).collect()
}

fn build_one(meta: &ModelMeta, cx: &Cx<'_>, model: &mut dyn Entity) -> Result<()> {
    cx.builder(meta.name)?.build(cx, BuildScope::All, model)
}

fn build_each(meta: &ModelMeta, cx: &Cx<'_>, models: &mut [Box<dyn Entity>]) -> Result<()> {
    if models.is_empty() {
        return Ok(());
    }
    let builder = cx.builder(meta.name)?;
    for model in models {
        builder.build(cx, BuildScope::All, model.as_mut())?;
    }
    Ok(())
}
