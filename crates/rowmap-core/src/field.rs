//! Field definitions.

/// Metadata about a model field.
///
/// Declared statically by each model through [`Model::fields`](crate::Model::fields).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    /// In-memory field name
    pub name: &'static str,
    /// Storage column name (same as `name` unless overridden)
    pub column_name: &'static str,
    /// Name of the field converter applied when reading rows, if any
    pub converter: Option<&'static str>,
}

impl FieldInfo {
    /// Create a field whose column has the same name.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            column_name: name,
            converter: None,
        }
    }

    /// Set the storage column name.
    pub const fn column(mut self, name: &'static str) -> Self {
        self.column_name = name;
        self
    }

    /// Convert values of this field with the named converter when reading rows.
    pub const fn converter(mut self, name: &'static str) -> Self {
        self.converter = Some(name);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_defaults_to_name() {
        const F: FieldInfo = FieldInfo::new("title");
        assert_eq!(F.column_name, "title");
        assert_eq!(F.converter, None);
    }

    #[test]
    fn builders_override() {
        let f = FieldInfo::new("createdAt")
            .column("created_at")
            .converter("Integer");
        assert_eq!(f.column_name, "created_at");
        assert_eq!(f.converter, Some("Integer"));
    }
}
