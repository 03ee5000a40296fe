//! `ClassificationResult`, the output of the pre-classifier cascade (C3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMethod {
    Keyword,
    Embedding,
    Llm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingDecision {
    BackendOnly,
    FrontendOnly,
    Middleware,
    FullStack,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: crate::requirement::RequirementCategory,
    pub confidence: f64,
    pub method: ClassificationMethod,
    pub routing_decision: RoutingDecision,
}

impl ClassificationResult {
    /// Confidence is always clamped into `[0, 1]` at construction.
    #[must_use]
    pub fn new(
        category: crate::requirement::RequirementCategory,
        confidence: f64,
        method: ClassificationMethod,
        routing_decision: RoutingDecision,
    ) -> Self {
        Self {
            category,
            confidence: confidence.clamp(0.0, 1.0),
            method,
            routing_decision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::RequirementCategory;

    #[test]
    fn confidence_is_clamped() {
        let result = ClassificationResult::new(
            RequirementCategory::Security,
            1.5,
            ClassificationMethod::Keyword,
            RoutingDecision::BackendOnly,
        );
        assert_eq!(result.confidence, 1.0);

        let result = ClassificationResult::new(
            RequirementCategory::Security,
            -0.5,
            ClassificationMethod::Keyword,
            RoutingDecision::BackendOnly,
        );
        assert_eq!(result.confidence, 0.0);
    }
}
