//! Category -> expansion-function routing table.
//!
//! A pure function so C4 can skip irrelevant prompt families for a confident
//! routing decision (e.g. `backend_only` skips frontend expansion prompts),
//! cutting tier-3 expansion calls by 50-70% per the stated target.

use autoplan_model::{RequirementCategory, RoutingDecision};

/// Name of the category-specific expansion schema/function for C4 Phase B.
#[must_use]
pub fn expansion_function_for(category: RequirementCategory) -> &'static str {
    match category {
        RequirementCategory::Functional => "expand_functional",
        RequirementCategory::NonFunctional => "expand_non_functional",
        RequirementCategory::Security => "expand_security",
        RequirementCategory::Performance => "expand_performance",
        RequirementCategory::Usability => "expand_usability",
        RequirementCategory::Integration => "expand_integration",
    }
}

/// Architectural prompt families to skip given a confident routing decision.
/// A `full_stack` or low-confidence routing skips nothing.
#[must_use]
pub fn skip_families_for(routing: RoutingDecision) -> &'static [&'static str] {
    match routing {
        RoutingDecision::BackendOnly => &["frontend"],
        RoutingDecision::FrontendOnly => &["backend", "middleware"],
        RoutingDecision::Middleware => &["frontend"],
        RoutingDecision::FullStack => &[],
    }
}
