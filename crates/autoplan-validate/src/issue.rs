//! `ValidationIssue` and `ValidationSummary`.

use autoplan_model::RequirementId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Stage 1-2: failing this fails the pipeline unless `--force-all`.
    Blocking,
    /// Stage 3-4: surfaced in the report, never blocks.
    Advisory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub node_id: Option<RequirementId>,
    pub severity: Severity,
    pub message: String,
}

impl ValidationIssue {
    #[must_use]
    pub fn blocking(node_id: Option<RequirementId>, message: impl Into<String>) -> Self {
        Self {
            node_id,
            severity: Severity::Blocking,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn advisory(node_id: Option<RequirementId>, message: impl Into<String>) -> Self {
        Self {
            node_id,
            severity: Severity::Advisory,
            message: message.into(),
        }
    }
}

/// Aggregated validation result attached to a phase's output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub valid_count: u32,
    pub invalid_count: u32,
    pub validity_rate: f64,
}

impl ValidationSummary {
    #[must_use]
    pub fn new(valid_count: u32, invalid_count: u32) -> Self {
        let total = valid_count + invalid_count;
        let validity_rate = if total == 0 {
            1.0
        } else {
            f64::from(valid_count) / f64::from(total)
        };
        Self {
            valid_count,
            invalid_count,
            validity_rate,
        }
    }
}
