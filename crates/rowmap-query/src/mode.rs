//! Return modes for raw queries.

use rowmap_core::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a raw query hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReturnMode {
    /// The raw rows.
    #[default]
    Neither,
    /// Each row's `id` re-fetched as a model.
    Id,
    /// Each row mapped directly to a model.
    Model,
}

impl ReturnMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ReturnMode::Neither => "Neither",
            ReturnMode::Id => "Id",
            ReturnMode::Model => "Model",
        }
    }
}

impl fmt::Display for ReturnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReturnMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "neither" => Ok(ReturnMode::Neither),
            "id" => Ok(ReturnMode::Id),
            "model" => Ok(ReturnMode::Model),
            _ => Err(Error::InvalidMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("MODEL".parse::<ReturnMode>().unwrap(), ReturnMode::Model);
        assert_eq!("id".parse::<ReturnMode>().unwrap(), ReturnMode::Id);
        assert_eq!(" Neither ".parse::<ReturnMode>().unwrap(), ReturnMode::Neither);
    }

    #[test]
    fn unknown_mode_is_invalid() {
        match "rows".parse::<ReturnMode>() {
            Err(Error::InvalidMode(mode)) => assert_eq!(mode, "rows"),
            other => panic!("expected InvalidMode, got {other:?}"),
        }
    }

    #[test]
    fn serde_uses_variant_names() {
        let json = serde_json::to_string(&ReturnMode::Id).unwrap();
        assert_eq!(json, "\"Id\"");
        let back: ReturnMode = serde_json::from_str("\"Model\"").unwrap();
        assert_eq!(back, ReturnMode::Model);
    }
}
