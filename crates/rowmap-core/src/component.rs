//! Component kinds resolved per model.

use std::fmt;

/// The per-model components an application may override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    /// Row ↔ model conversion
    Mapper,
    /// Insert/update/delete and cascading persistence
    Persistor,
    /// Raw and condition-based fetches
    Query,
    /// Association population
    Builder,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 4] = [
        ComponentKind::Mapper,
        ComponentKind::Persistor,
        ComponentKind::Query,
        ComponentKind::Builder,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ComponentKind::Mapper => "Mapper",
            ComponentKind::Persistor => "Persistor",
            ComponentKind::Query => "Query",
            ComponentKind::Builder => "Builder",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
