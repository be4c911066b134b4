//! Registry configuration.

use serde::Deserialize;

/// Behavior switches shared by every component resolved from a registry.
///
/// Missing keys take their default when deserialized, so a partial document
/// (`{"max_cascade_depth": 4}`) is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Deepest nesting a cascading save or clear may reach.
    pub max_cascade_depth: usize,
    /// Wrap a top-level cascading save/clear in begin/commit, rolling back on error.
    pub cascade_transaction: bool,
    /// Strip escaping backslashes from text columns when mapping rows.
    pub unescape_text: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_cascade_depth: 16,
            cascade_transaction: true,
            unescape_text: true,
        }
    }
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_cascade_depth(mut self, depth: usize) -> Self {
        self.max_cascade_depth = depth;
        self
    }

    pub fn cascade_transaction(mut self, enabled: bool) -> Self {
        self.cascade_transaction = enabled;
        self
    }

    pub fn unescape_text(mut self, enabled: bool) -> Self {
        self.unescape_text = enabled;
        self
    }
}
