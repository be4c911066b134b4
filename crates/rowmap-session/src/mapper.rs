//! Row ↔ model mapping.
//!
//! Every default method of [`Mapper`] forwards to the free function of the
//! same name, so an override can replace one step and still call the
//! library behavior for the rest.

use crate::meta::ModelMeta;
use crate::session::Cx;
use rowmap_core::{Entity, Result, Row, Value};

/// Converts between storage rows and model instances for one model.
pub trait Mapper: Send + Sync {
    /// Metadata of the model this mapper is bound to.
    fn meta(&self) -> &ModelMeta;

    /// Populate `model` from `row`.
    fn row_to_model(&self, cx: &Cx<'_>, model: &mut dyn Entity, row: &Row) -> Result<()> {
        row_to_model(self, cx, model, row)
    }

    /// The model's full-field snapshot keyed by storage column.
    fn model_to_row(&self, model: &dyn Entity) -> Vec<(String, Value)> {
        model_to_row(self, model)
    }

    fn field_name_to_db_name(&self, field: &str) -> String {
        field_name_to_db_name(self.meta(), field)
    }

    fn db_name_to_field_name(&self, column: &str) -> String {
        db_name_to_field_name(self.meta(), column)
    }

    /// A fresh model populated from `row`.
    fn new_model(&self, cx: &Cx<'_>, row: &Row) -> Result<Box<dyn Entity>> {
        let mut model = self.meta().new_entity();
        self.row_to_model(cx, model.as_mut(), row)?;
        Ok(model)
    }
}

/// The library mapper.
#[derive(Debug, Clone)]
pub struct BaseMapper {
    meta: ModelMeta,
}

impl BaseMapper {
    pub fn new(meta: ModelMeta) -> Self {
        Self { meta }
    }
}

impl Mapper for BaseMapper {
    fn meta(&self) -> &ModelMeta {
        &self.meta
    }
}

/// Assign the primary key and every declared field present in `row`.
///
/// Text values are unescaped when the registry is configured to, and a field
/// that names a converter has its value passed through it first.
pub fn row_to_model<M: Mapper + ?Sized>(
    mapper: &M,
    cx: &Cx<'_>,
    model: &mut dyn Entity,
    row: &Row,
) -> Result<()> {
    let meta = mapper.meta();
    meta.check(model, "row_to_model")?;

    if let Some(id) = row.get_by_name(meta.primary_key).and_then(Value::as_i64) {
        model.set_entity_id(id);
    }

    let unescape = cx.registry().config().unescape_text;
    for field in meta.fields {
        if field.name == meta.primary_key {
            continue;
        }
        let column = mapper.field_name_to_db_name(field.name);
        let Some(raw) = row.get_by_name(&column) else {
            tracing::trace!(model = meta.name, column = %column, "Column absent from row");
            continue;
        };

        let mut value = match raw {
            Value::Text(text) if unescape => Value::Text(unescape_text(text)),
            other => other.clone(),
        };
        if let Some(name) = field.converter {
            let converter = cx.registry().converter(meta.name, name)?;
            value = converter.from_db(&value)?;
        }
        model.assign(field.name, value)?;
    }

    Ok(())
}

pub fn model_to_row<M: Mapper + ?Sized>(mapper: &M, model: &dyn Entity) -> Vec<(String, Value)> {
    model
        .snapshot()
        .into_iter()
        .map(|(field, value)| (mapper.field_name_to_db_name(field), value))
        .collect()
}

/// Declared column of `field`, or the field name itself.
pub fn field_name_to_db_name(meta: &ModelMeta, field: &str) -> String {
    meta.field(field)
        .map_or(field, |f| f.column_name)
        .to_string()
}

/// Field declaring `column`, or the column name itself.
pub fn db_name_to_field_name(meta: &ModelMeta, column: &str) -> String {
    meta.fields
        .iter()
        .find(|f| f.column_name == column)
        .map_or(column, |f| f.name)
        .to_string()
}

/// Remove escaping backslashes: `\\` becomes `\`, `\0` a NUL character and
/// `\x` becomes `x`. A trailing lone backslash is dropped.
pub fn unescape_text(text: &str) -> String {
    if !text.contains('\\') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('\0'),
            Some(next) => out.push(next),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape_strips_backslashes() {
        assert_eq!(unescape_text(r"O\'Hara"), "O'Hara");
        assert_eq!(unescape_text(r"a\\b"), r"a\b");
        assert_eq!(unescape_text(r"tab\t"), "tabt");
        assert_eq!(unescape_text(r"nul\0"), "nul\0");
        assert_eq!(unescape_text("end\\"), "end");
        assert_eq!(unescape_text("plain"), "plain");
    }
}
