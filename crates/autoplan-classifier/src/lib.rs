//! Pre-Classifier cascade router (C3): keyword -> embedding -> LLM, each
//! tier only run if the previous one passed through without a confident
//! match.

mod embedding;
pub mod human_review;
mod keyword;
mod llm_tier;
mod routing;

pub use keyword::{classify_keyword, KeywordMatch};
pub use llm_tier::{classify_llm, LlmClassification};
pub use routing::{expansion_function_for, skip_families_for};

use autoplan_config::ThresholdConfig;
use autoplan_llm::StructuredClient;
use autoplan_model::{ClassificationMethod, ClassificationResult, RequirementCategory, RoutingDecision};
use autoplan_utils::error::LlmError;
use std::time::Duration;

/// Outcome of running the full cascade: the classification plus whether it
/// should be flagged for human review (tier 3, confidence in
/// `[llm_human_review, llm_auto_route)`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeOutcome {
    pub result: ClassificationResult,
    pub needs_human_review: bool,
}

/// Drives the three-tier cascade with a frozen [`ThresholdConfig`].
pub struct PreClassifier {
    thresholds: ThresholdConfig,
}

impl PreClassifier {
    #[must_use]
    pub fn new(thresholds: ThresholdConfig) -> Self {
        Self { thresholds }
    }

    /// Tiers 1 and 2 only — no LLM call, so this never fails and never
    /// blocks. Returns `None` if neither tier produced a confident match on
    /// either axis (caller should escalate to `classify` for tier 3).
    #[must_use]
    pub fn classify_without_llm(&self, text: &str) -> Option<CascadeOutcome> {
        let keyword_match = classify_keyword(text);
        if !keyword_match.is_empty() {
            let category = keyword_match.category.unwrap_or_default();
            let routing = keyword_match
                .routing
                .unwrap_or(RoutingDecision::FullStack);
            return Some(CascadeOutcome {
                result: ClassificationResult::new(
                    category,
                    self.thresholds.keyword_confidence,
                    ClassificationMethod::Keyword,
                    routing,
                ),
                needs_human_review: false,
            });
        }

        let routing_match = embedding::best_routing_match(text);
        let category_match = embedding::best_category_match(text);

        let routing_hit = routing_match.filter(|(_, score)| *score >= self.thresholds.embedding_initial);
        let category_hit = category_match.filter(|(_, score)| *score >= self.thresholds.embedding_initial);

        if routing_hit.is_some() || category_hit.is_some() {
            let (routing, routing_score) = routing_hit.unwrap_or((RoutingDecision::FullStack, 0.0));
            let (category, category_score) = category_hit.unwrap_or((RequirementCategory::default(), 0.0));
            let confidence = routing_score.max(category_score);
            return Some(CascadeOutcome {
                result: ClassificationResult::new(
                    category,
                    confidence,
                    ClassificationMethod::Embedding,
                    routing,
                ),
                needs_human_review: false,
            });
        }

        None
    }

    /// Full cascade including tier 3 (LLM). Only reaches the network if
    /// tiers 1 and 2 both passed through.
    ///
    /// # Errors
    /// Propagates the `LlmError` from the tier-3 call if it's reached and
    /// fails.
    pub async fn classify(
        &self,
        client: &StructuredClient,
        model: &str,
        timeout: Duration,
        text: &str,
    ) -> Result<CascadeOutcome, LlmError> {
        if let Some(outcome) = self.classify_without_llm(text) {
            return Ok(outcome);
        }

        let llm_result = classify_llm(client, model, timeout, text).await?;
        let outcome = self.apply_llm_thresholds(llm_result);
        if outcome.needs_human_review {
            human_review::enqueue(text, &outcome.result);
        }
        Ok(outcome)
    }

    fn apply_llm_thresholds(&self, llm: LlmClassification) -> CascadeOutcome {
        if llm.confidence >= self.thresholds.llm_auto_route {
            CascadeOutcome {
                result: ClassificationResult::new(
                    llm.category,
                    llm.confidence,
                    ClassificationMethod::Llm,
                    llm.routing_decision,
                ),
                needs_human_review: false,
            }
        } else if llm.confidence >= self.thresholds.llm_human_review {
            CascadeOutcome {
                result: ClassificationResult::new(
                    llm.category,
                    llm.confidence,
                    ClassificationMethod::Llm,
                    llm.routing_decision,
                ),
                needs_human_review: true,
            }
        } else {
            CascadeOutcome {
                result: ClassificationResult::new(
                    llm.category,
                    llm.confidence,
                    ClassificationMethod::Llm,
                    RoutingDecision::FullStack,
                ),
                needs_human_review: true,
            }
        }
    }
}
