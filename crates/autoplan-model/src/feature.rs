//! `FeatureInfo`, `PlanInfo`, and `PhaseResult` — the types the execution
//! loop (C9) and tracker adapter (C10) exchange.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FeatureStatus {
    NotStarted,
    InProgress,
    Completed,
    Failed,
    Blocked,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureInfo {
    pub name: String,
    pub phase: String,
    pub status: FeatureStatus,
    pub priority: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanInfo {
    pub path: String,
    pub priority: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseResult {
    pub success: bool,
    pub iteration_count: u32,
    pub test_status: Option<String>,
    #[serde(with = "duration_secs_f64")]
    pub duration: Duration,
    pub error: Option<String>,
}

impl PhaseResult {
    #[must_use]
    pub fn success(iteration_count: u32, duration: Duration) -> Self {
        Self {
            success: true,
            iteration_count,
            test_status: None,
            duration,
            error: None,
        }
    }

    #[must_use]
    pub fn failure(iteration_count: u32, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            success: false,
            iteration_count,
            test_status: None,
            duration,
            error: Some(error.into()),
        }
    }
}

mod duration_secs_f64 {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_result_has_no_error() {
        let result = PhaseResult::success(1, Duration::from_secs(5));
        assert!(result.success);
        assert!(result.error.is_none());
    }

    #[test]
    fn failure_result_carries_error_message() {
        let result = PhaseResult::failure(3, Duration::from_secs(2), "timed out");
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("timed out"));
    }

    #[test]
    fn duration_roundtrips_through_json() {
        let result = PhaseResult::success(2, Duration::from_millis(1500));
        let json = serde_json::to_string(&result).unwrap();
        let back: PhaseResult = serde_json::from_str(&json).unwrap();
        assert!((back.duration.as_secs_f64() - 1.5).abs() < 1e-9);
    }
}
