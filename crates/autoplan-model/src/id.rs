//! Validated `RequirementId` newtype: construction is fallible so an
//! invalid ID can never enter the hierarchy.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use autoplan_utils::error::ModelError;

static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^REQ_\d{3}(\.\d+)*$").expect("requirement id pattern is valid"));

/// A requirement identifier matching `REQ_NNN(.NNN)*`, e.g. `REQ_001` or
/// `REQ_014.2`. Construction is fallible so invalid IDs can never enter the
/// hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequirementId(String);

impl RequirementId {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        if !ID_PATTERN.is_match(&value) {
            return Err(ModelError::InvalidRequirementId {
                value,
                reason: "must match REQ_NNN with optional dot-separated numeric suffixes"
                    .to_string(),
            });
        }
        Ok(Self(value))
    }

    /// Build a root-level ID from a 1-based index, e.g. `3` -> `REQ_003`.
    pub fn root(index: u32) -> Result<Self, ModelError> {
        Self::new(format!("REQ_{index:03}"))
    }

    /// Build a child ID by appending `.{n}` to a parent ID.
    pub fn child(&self, index: u32) -> Result<Self, ModelError> {
        Self::new(format!("{}.{}", self.0, index))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Depth in the hierarchy: a root ID (`REQ_001`) is depth 0, its
    /// children depth 1, their children depth 2.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.0.matches('.').count() as u32
    }
}

impl fmt::Display for RequirementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RequirementId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RequirementId> for String {
    fn from(id: RequirementId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_root_and_nested_ids() {
        assert!(RequirementId::new("REQ_001").is_ok());
        assert!(RequirementId::new("REQ_014.2").is_ok());
        assert!(RequirementId::new("REQ_014.2.1").is_ok());
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(RequirementId::new("REQ_1").is_err());
        assert!(RequirementId::new("req_001").is_err());
        assert!(RequirementId::new("REQ_001.").is_err());
        assert!(RequirementId::new("").is_err());
    }

    #[test]
    fn depth_counts_dot_segments() {
        assert_eq!(RequirementId::new("REQ_001").unwrap().depth(), 0);
        assert_eq!(RequirementId::new("REQ_001.1").unwrap().depth(), 1);
        assert_eq!(RequirementId::new("REQ_001.1.2").unwrap().depth(), 2);
    }

    #[test]
    fn child_appends_suffix() {
        let parent = RequirementId::new("REQ_001").unwrap();
        let child = parent.child(2).unwrap();
        assert_eq!(child.as_str(), "REQ_001.2");
    }

    #[test]
    fn json_roundtrip() {
        let id = RequirementId::new("REQ_007.3").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        let back: RequirementId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn json_rejects_invalid_string() {
        let result: Result<RequirementId, _> = serde_json::from_str("\"not-an-id\"");
        assert!(result.is_err());
    }
}
