//! Frozen, invariant-checked configuration for the pre-classifier cascade (C3).

use autoplan_utils::error::ConfigError;
use std::env;

/// Immutable threshold configuration for the pre-classifier.
///
/// Constructed once at startup from environment variables and the config
/// file's `[classifier]` section, then injected into `autoplan-classifier` —
/// the only process-wide state this system carries is this value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdConfig {
    /// Confidence Tier 1 (keyword) emits on a match. Always `1.0`.
    pub keyword_confidence: f64,
    /// Tier 2 similarity threshold used in production (calibratable down to 0.20).
    pub embedding_initial: f64,
    /// Lowest similarity threshold the calibration process may settle on.
    pub embedding_min: f64,
    /// Tier 3 confidence at or above which a classification auto-routes.
    pub llm_auto_route: f64,
    /// Tier 3 confidence at or above which a classification is still routed,
    /// but flagged for human review (must be below `llm_auto_route`).
    pub llm_human_review: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            keyword_confidence: 1.0,
            embedding_initial: 0.85,
            embedding_min: 0.20,
            llm_auto_route: 0.85,
            llm_human_review: 0.70,
        }
    }
}

impl ThresholdConfig {
    /// Validate the invariants requires:
    /// `KEYWORD_CONFIDENCE == 1.0`, `EMBEDDING_MIN < EMBEDDING_INITIAL`,
    /// `HUMAN_REVIEW < AUTO_ROUTE`.
    pub fn validated(self) -> Result<Self, ConfigError> {
        if (self.keyword_confidence - 1.0).abs() > f64::EPSILON {
            return Err(ConfigError::InvalidValue {
                key: "keyword_confidence".to_string(),
                value: self.keyword_confidence.to_string(),
            });
        }
        if !(self.embedding_min < self.embedding_initial) {
            return Err(ConfigError::InvalidValue {
                key: "embedding_min/embedding_initial".to_string(),
                value: format!("{} >= {}", self.embedding_min, self.embedding_initial),
            });
        }
        if !(self.llm_human_review < self.llm_auto_route) {
            return Err(ConfigError::InvalidValue {
                key: "llm_human_review/llm_auto_route".to_string(),
                value: format!("{} >= {}", self.llm_human_review, self.llm_auto_route),
            });
        }
        Ok(self)
    }

    /// Build from defaults, overridden by `PRECLASSIFY_*` environment
    /// variables, then validate.
    pub fn from_env(defaults: Self) -> Result<Self, ConfigError> {
        let mut cfg = defaults;
        if let Some(v) = parse_env_f64("PRECLASSIFY_KEYWORD_CONFIDENCE")? {
            cfg.keyword_confidence = v;
        }
        if let Some(v) = parse_env_f64("PRECLASSIFY_EMBED_INITIAL")? {
            cfg.embedding_initial = v;
        }
        if let Some(v) = parse_env_f64("PRECLASSIFY_EMBED_MIN")? {
            cfg.embedding_min = v;
        }
        if let Some(v) = parse_env_f64("PRECLASSIFY_LLM_AUTO")? {
            cfg.llm_auto_route = v;
        }
        if let Some(v) = parse_env_f64("PRECLASSIFY_LLM_REVIEW")? {
            cfg.llm_human_review = v;
        }
        cfg.validated()
    }
}

fn parse_env_f64(key: &str) -> Result<Option<f64>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key: key.to_string(), value: raw }),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: "<non-utf8>".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn defaults_satisfy_invariants() {
        assert!(ThresholdConfig::default().validated().is_ok());
    }

    #[test]
    fn rejects_non_unity_keyword_confidence() {
        let cfg = ThresholdConfig {
            keyword_confidence: 0.9,
            ..ThresholdConfig::default()
        };
        assert!(cfg.validated().is_err());
    }

    #[test]
    fn rejects_embedding_min_above_initial() {
        let cfg = ThresholdConfig {
            embedding_min: 0.9,
            embedding_initial: 0.5,
            ..ThresholdConfig::default()
        };
        assert!(cfg.validated().is_err());
    }

    #[test]
    fn rejects_human_review_above_auto_route() {
        let cfg = ThresholdConfig {
            llm_human_review: 0.95,
            llm_auto_route: 0.85,
            ..ThresholdConfig::default()
        };
        assert!(cfg.validated().is_err());
    }

    #[test]
    #[serial]
    fn env_override_takes_effect() {
        // SAFETY: serialized via #[serial] so no other test observes env state concurrently.
        unsafe {
            env::set_var("PRECLASSIFY_EMBED_INITIAL", "0.75");
        }
        let cfg = ThresholdConfig::from_env(ThresholdConfig::default()).unwrap();
        assert_eq!(cfg.embedding_initial, 0.75);
        unsafe {
            env::remove_var("PRECLASSIFY_EMBED_INITIAL");
        }
    }
}
