//! Model trait for ORM-style struct mapping.
//!
//! The `Model` trait defines the contract for structs that can be mapped to
//! database tables: static field and association declarations, the
//! identifier, a full-field snapshot and field assignment.

use crate::Result;
use crate::association::{AssociationInfo, Related, RelatedMut};
use crate::entity::Entity;
use crate::error::{Error, UnresolvedKind};
use crate::field::FieldInfo;
use crate::value::Value;

/// Trait for types that can be mapped to database tables.
///
/// # Example
///
/// ```ignore
/// use rowmap_core::{FieldInfo, Model, Result, Value};
///
/// #[derive(Debug, Default)]
/// struct Tag {
///     id: Option<i64>,
///     label: String,
/// }
///
/// impl Model for Tag {
///     const MODEL_NAME: &'static str = "Tag";
///     const TABLE_NAME: &'static str = "tags";
///
///     fn fields() -> &'static [FieldInfo] {
///         const FIELDS: &[FieldInfo] = &[FieldInfo::new("label")];
///         FIELDS
///     }
///
///     fn new_empty() -> Self {
///         Self::default()
///     }
///
///     fn id(&self) -> Option<i64> {
///         self.id
///     }
///
///     fn set_id(&mut self, id: i64) {
///         self.id = Some(id);
///     }
///
///     fn to_row(&self) -> Vec<(&'static str, Value)> {
///         vec![("id", self.id.into()), ("label", self.label.clone().into())]
///     }
///
///     fn set_field(&mut self, field: &str, value: Value) -> Result<()> {
///         match field {
///             "label" => self.label = value.try_into()?,
///             _ => {}
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Model: Sized + Send + Sync + 'static {
    /// The model name used for registration and override lookup.
    const MODEL_NAME: &'static str;

    /// The name of the database table.
    const TABLE_NAME: &'static str;

    /// The primary key column name.
    const PRIMARY_KEY: &'static str = "id";

    /// Association metadata for this model.
    const ASSOCIATIONS: &'static [AssociationInfo] = &[];

    /// Get field metadata for all mapped fields.
    fn fields() -> &'static [FieldInfo];

    /// A fresh, empty (transient) instance.
    fn new_empty() -> Self;

    /// The identifier, `None` (or zero) when not yet persisted.
    fn id(&self) -> Option<i64>;

    /// Assign the identifier.
    fn set_id(&mut self, id: i64);

    /// Snapshot of all field values, keyed by field name.
    fn to_row(&self) -> Vec<(&'static str, Value)>;

    /// Assign one field from a storage value.
    fn set_field(&mut self, field: &str, value: Value) -> Result<()>;

    /// Read access to an association's members.
    #[allow(unused_variables)]
    fn association(&self, name: &str) -> Option<Related<'_>> {
        None
    }

    /// Mutable access to an association's members.
    #[allow(unused_variables)]
    fn association_mut(&mut self, name: &str) -> Option<RelatedMut<'_>> {
        None
    }

    /// Replace an association's members with freshly loaded models.
    ///
    /// Implementations typically call [`downcast_all`](crate::downcast_all) or
    /// [`downcast_first`](crate::downcast_first) to recover the concrete types.
    #[allow(unused_variables)]
    fn attach(&mut self, name: &str, members: Vec<Box<dyn Entity>>) -> Result<()> {
        Err(Error::unresolved_for(
            UnresolvedKind::Association,
            name,
            Self::MODEL_NAME,
        ))
    }

    /// Check if this is a new record (identifier unset or zero).
    fn is_new(&self) -> bool {
        !matches!(self.id(), Some(id) if id != 0)
    }
}
