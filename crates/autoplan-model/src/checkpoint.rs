//! `Checkpoint`, the durable per-run state record (C7).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::WorkflowContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointPhase {
    Research,
    RequirementDecomposition,
    StructuralValidation,
    ContextGeneration,
    Planning,
    PhaseDecomposition,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: Uuid,
    pub phase: CheckpointPhase,
    pub timestamp: DateTime<Utc>,
    pub state_snapshot: WorkflowContext,
    /// SHA-256 hex digest over the canonicalized context fingerprint (C7).
    pub context_hash: String,
    pub file_path: String,
}

impl Checkpoint {
    #[must_use]
    pub fn new(
        phase: CheckpointPhase,
        state_snapshot: WorkflowContext,
        context_hash: String,
        file_path: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            phase,
            timestamp: Utc::now(),
            state_snapshot,
            context_hash,
            file_path: file_path.into(),
        }
    }
}
