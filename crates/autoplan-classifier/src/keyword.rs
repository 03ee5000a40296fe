//! Tier 1 — keyword scan.
//!
//! O(1)-per-token, case-insensitive, whole-word matching against a fixed
//! category->keyword dictionary. Emits confidence `1.0` on any match; an
//! input that matches nothing passes through to tier 2.

use autoplan_model::{RequirementCategory, RoutingDecision};
use once_cell::sync::Lazy;
use regex::Regex;

/// Architectural-layer keywords, checked in tie-break priority order:
/// middleware beats backend beats frontend when a requirement mentions more
/// than one layer.
const ROUTING_KEYWORDS: &[(RoutingDecision, &[&str])] = &[
    (
        RoutingDecision::Middleware,
        &[
            "middleware",
            "message queue",
            "event bus",
            "pub/sub",
            "orchestration",
            "message broker",
        ],
    ),
    (
        RoutingDecision::BackendOnly,
        &[
            "api",
            "database",
            "server",
            "backend",
            "endpoint",
            "persistence",
            "schema migration",
        ],
    ),
    (
        RoutingDecision::FrontendOnly,
        &[
            "ui",
            "frontend",
            "button",
            "screen",
            "component",
            "css",
            "user interface",
        ],
    ),
];

const CATEGORY_KEYWORDS: &[(RequirementCategory, &[&str])] = &[
    (
        RequirementCategory::Security,
        &[
            "auth",
            "authentication",
            "authorization",
            "security",
            "encryption",
            "threat",
            "vulnerability",
        ],
    ),
    (
        RequirementCategory::Performance,
        &[
            "latency",
            "throughput",
            "performance",
            "benchmark",
            "scalability",
            "p99",
        ],
    ),
    (
        RequirementCategory::Usability,
        &["usability", "accessibility", "ux", "user experience"],
    ),
    (
        RequirementCategory::Integration,
        &[
            "integration",
            "webhook",
            "third-party",
            "external api",
            "interface contract",
        ],
    ),
    (
        RequirementCategory::NonFunctional,
        &[
            "reliability",
            "availability",
            "maintainability",
            "compliance",
            "audit log",
        ],
    ),
];

fn word_boundary_regex(keyword: &str) -> Regex {
    let escaped = regex::escape(keyword);
    Regex::new(&format!(r"(?i)\b{escaped}\b")).expect("keyword regex is well-formed")
}

static ROUTING_PATTERNS: Lazy<Vec<(RoutingDecision, Vec<Regex>)>> = Lazy::new(|| {
    ROUTING_KEYWORDS
        .iter()
        .map(|(decision, words)| (*decision, words.iter().map(|w| word_boundary_regex(w)).collect()))
        .collect()
});

static CATEGORY_PATTERNS: Lazy<Vec<(RequirementCategory, Vec<Regex>)>> = Lazy::new(|| {
    CATEGORY_KEYWORDS
        .iter()
        .map(|(category, words)| (*category, words.iter().map(|w| word_boundary_regex(w)).collect()))
        .collect()
});

/// Result of a tier 1 match: both signals default to their "no match"
/// fallback independently, so a requirement can match a routing keyword but
/// no category keyword (or vice versa).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeywordMatch {
    pub routing: Option<RoutingDecision>,
    pub category: Option<RequirementCategory>,
}

impl KeywordMatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routing.is_none() && self.category.is_none()
    }
}

/// Scan `text` against the keyword dictionary. Returns `None` signals for
/// either axis that found no match, so the caller can fall through to tier 2
/// on a per-axis basis.
#[must_use]
pub fn classify_keyword(text: &str) -> KeywordMatch {
    let routing = ROUTING_PATTERNS
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| p.is_match(text)))
        .map(|(decision, _)| *decision);

    let category = CATEGORY_PATTERNS
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| p.is_match(text)))
        .map(|(category, _)| *category);

    KeywordMatch { routing, category }
}
