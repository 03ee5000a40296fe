//! ADaPT adaptive granularity assessment.

use autoplan_model::RoutingDecision;

const CROSS_CUTTING_KEYWORDS: &[&str] = &["auth", "logging", "caching", "transaction", "security"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
}

impl Complexity {
    /// Context window, in characters, Phase B truncates the surrounding
    /// research text to for this complexity tier.
    #[must_use]
    pub fn context_truncation_chars(self) -> usize {
        match self {
            Self::Simple => 2_000,
            Self::Medium => 4_000,
            Self::Complex => 8_000,
        }
    }

    /// Expected acceptance-criteria count range for prompting guidance.
    #[must_use]
    pub fn criteria_range(self) -> (u32, u32) {
        match self {
            Self::Simple => (2, 3),
            Self::Medium => (4, 6),
            Self::Complex => (8, 12),
        }
    }

    #[must_use]
    pub fn prompt_granularity(self) -> &'static str {
        match self {
            Self::Simple => "function-level",
            Self::Medium => "class-level",
            Self::Complex => "repo-level",
        }
    }
}

/// Counts the distinct architectural layers a routing decision touches.
fn layer_count(routing: RoutingDecision) -> u32 {
    match routing {
        RoutingDecision::BackendOnly | RoutingDecision::FrontendOnly => 1,
        RoutingDecision::Middleware => 2,
        RoutingDecision::FullStack => 3,
    }
}

fn cross_cutting_keyword_count(text: &str) -> u32 {
    let lower = text.to_lowercase();
    CROSS_CUTTING_KEYWORDS.iter().filter(|kw| lower.contains(*kw)).count() as u32
}

/// Assesses complexity from the affected-layer count and cross-cutting
/// keyword density in the subprocess description.
#[must_use]
pub fn assess_complexity(routing: RoutingDecision, subprocess_description: &str) -> Complexity {
    let layers = layer_count(routing);
    let keywords = cross_cutting_keyword_count(subprocess_description);

    if layers >= 3 || keywords >= 2 {
        Complexity::Complex
    } else if layers >= 2 || keywords >= 1 {
        Complexity::Medium
    } else {
        Complexity::Simple
    }
}
