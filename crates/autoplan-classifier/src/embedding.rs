//! Tier 2 — embedding similarity.
//!
//! "Embeddings" here are deterministic bag-of-words vectors over a fixed
//! vocabulary built from each category's example phrases, compared by
//! cosine similarity. This keeps the tier's contract (precomputed
//! per-category centroid, similarity-gated routing) while staying
//! dependency-free rather than pulling in an ML stack for one tier of a
//! three-tier cascade.

use autoplan_model::{RequirementCategory, RoutingDecision};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// 15-20 example phrases per routing category, used to build that category's
/// reference centroid.
const ROUTING_EXAMPLES: &[(RoutingDecision, &[&str])] = &[
    (
        RoutingDecision::Middleware,
        &[
            "route messages between services through a broker",
            "add a queue consumer that processes async jobs",
            "introduce an event bus for cross service notifications",
            "build a saga orchestrator for the order workflow",
            "add retry and dead letter handling to the message pipeline",
            "implement pub sub fan out for domain events",
            "coordinate a multi step workflow across services",
            "add a scheduled job runner for background tasks",
            "implement request routing and load balancing logic",
            "build an integration adapter between two internal systems",
            "add circuit breaker logic around downstream calls",
            "implement a workflow state machine for order processing",
            "add distributed tracing across the service mesh",
            "build a rate limiter shared across services",
            "implement service discovery for internal microservices",
        ],
    ),
    (
        RoutingDecision::BackendOnly,
        &[
            "add a new rest endpoint for creating orders",
            "persist user records in the relational database",
            "write a database migration for the new column",
            "implement server side validation for the signup form",
            "add an index to speed up the orders query",
            "build a background worker that reconciles payments",
            "implement the repository layer for the accounts table",
            "add authentication middleware to the api server",
            "write integration tests for the billing service",
            "implement pagination for the list users endpoint",
            "add caching for the product catalog query",
            "implement a cron job that archives old records",
            "build the graphql resolver for order history",
            "add request validation and error handling to the api",
            "implement the data access layer for inventory",
        ],
    ),
    (
        RoutingDecision::FrontendOnly,
        &[
            "add a submit button to the checkout form",
            "build a responsive navigation bar component",
            "implement client side form validation messages",
            "add a loading spinner while data fetches",
            "build a dashboard widget showing recent orders",
            "implement dark mode theme switching",
            "add accessibility labels to the settings screen",
            "build a modal dialog for confirming deletion",
            "implement infinite scroll on the feed page",
            "add animations to the onboarding carousel",
            "build the login screen layout and styles",
            "implement drag and drop file upload in the browser",
            "add client side routing between app pages",
            "build a reusable button component library",
            "implement the user profile edit screen",
        ],
    ),
];

const CATEGORY_EXAMPLES: &[(RequirementCategory, &[&str])] = &[
    (
        RequirementCategory::Security,
        &[
            "add multi factor authentication to the login flow",
            "encrypt sensitive fields at rest in the database",
            "implement role based access control for admin pages",
            "add audit logging for privileged actions",
            "perform a threat model review of the payment flow",
            "rotate api keys and secrets on a schedule",
            "add rate limiting to prevent credential stuffing",
            "implement data classification labels for pii",
            "add input sanitization to prevent injection attacks",
            "implement secure session token handling",
            "add a vulnerability scan to the build pipeline",
            "implement certificate pinning for mobile clients",
            "add authorization checks to every api route",
            "implement secrets management for deployment credentials",
            "add security headers to all http responses",
        ],
    ),
    (
        RequirementCategory::Performance,
        &[
            "reduce p99 latency for the checkout endpoint",
            "increase throughput of the ingestion pipeline",
            "add a benchmark suite for the parser",
            "optimize the hot path in the matching engine",
            "reduce memory allocation in the request handler",
            "add load testing for the new service",
            "profile and optimize the slow database query",
            "improve scalability of the websocket gateway",
            "cache expensive computations to cut response time",
            "reduce cold start latency for the serverless function",
            "add connection pooling to reduce overhead",
            "optimize serialization to cut cpu usage",
            "reduce tail latency under high concurrency",
            "add autoscaling based on queue depth",
            "improve batch processing throughput",
        ],
    ),
    (
        RequirementCategory::Usability,
        &[
            "improve accessibility of the settings page",
            "simplify the onboarding flow for new users",
            "add clearer error messages to the signup form",
            "improve keyboard navigation across the app",
            "add tooltips explaining advanced settings",
            "reduce the number of steps in checkout",
            "add a guided tour for first time users",
            "improve color contrast for readability",
            "add undo support for destructive actions",
            "simplify navigation between related screens",
            "improve form field labels and helper text",
            "add empty states with helpful next actions",
            "improve mobile responsiveness of the dashboard",
            "add confirmation dialogs before irreversible actions",
            "improve screen reader support across pages",
        ],
    ),
    (
        RequirementCategory::Integration,
        &[
            "integrate with a third party payment provider",
            "add a webhook receiver for external notifications",
            "build an adapter for the partner shipping api",
            "implement oauth integration with an external idp",
            "add a connector for the crm system",
            "integrate with an external analytics platform",
            "build a sync job against a partner inventory feed",
            "add support for importing data from an external tool",
            "implement an export to a third party accounting system",
            "add a webhook sender for order status changes",
            "integrate with an external geocoding service",
            "build a bridge to a legacy soap api",
            "add support for single sign on with an external provider",
            "implement a client for an external notification service",
            "add a connector for the external ticketing system",
        ],
    ),
    (
        RequirementCategory::NonFunctional,
        &[
            "improve overall system reliability during failover",
            "increase availability of the primary datastore",
            "improve maintainability of the legacy module",
            "add compliance reporting for data retention",
            "improve disaster recovery procedures",
            "add health checks for all critical services",
            "improve observability across the deployment",
            "add backup and restore automation",
            "improve documentation for operational runbooks",
            "add graceful degradation under partial outage",
            "improve configurability of deployment environments",
            "add compliance audit trails for regulated data",
            "improve resilience to network partitions",
            "add capacity planning dashboards",
            "improve the deprecation process for old apis",
        ],
    ),
];

type Vocabulary = BTreeMap<String, usize>;

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn build_vocabulary<'a>(all_examples: impl Iterator<Item = &'a str>) -> Vocabulary {
    let mut vocab = Vocabulary::new();
    for example in all_examples {
        for token in tokenize(example) {
            let next_id = vocab.len();
            vocab.entry(token).or_insert(next_id);
        }
    }
    vocab
}

fn bag_of_words_vector(text: &str, vocab: &Vocabulary) -> Vec<f64> {
    let mut vector = vec![0.0; vocab.len()];
    for token in tokenize(text) {
        if let Some(&idx) = vocab.get(&token) {
            vector[idx] += 1.0;
        }
    }
    vector
}

fn centroid(examples: &[&str], vocab: &Vocabulary) -> Vec<f64> {
    let mut sum = vec![0.0; vocab.len()];
    for example in examples {
        let v = bag_of_words_vector(example, vocab);
        for (s, x) in sum.iter_mut().zip(v.iter()) {
            *s += x;
        }
    }
    let n = examples.len().max(1) as f64;
    sum.iter().map(|x| x / n).collect()
}

fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

struct EmbeddingModel {
    vocab: Vocabulary,
    routing_centroids: Vec<(RoutingDecision, Vec<f64>)>,
    category_centroids: Vec<(RequirementCategory, Vec<f64>)>,
}

static MODEL: Lazy<EmbeddingModel> = Lazy::new(|| {
    let all_examples = ROUTING_EXAMPLES
        .iter()
        .flat_map(|(_, examples)| examples.iter().copied())
        .chain(CATEGORY_EXAMPLES.iter().flat_map(|(_, examples)| examples.iter().copied()));
    let vocab = build_vocabulary(all_examples);

    let routing_centroids = ROUTING_EXAMPLES
        .iter()
        .map(|(decision, examples)| (*decision, centroid(examples, &vocab)))
        .collect();
    let category_centroids = CATEGORY_EXAMPLES
        .iter()
        .map(|(category, examples)| (*category, centroid(examples, &vocab)))
        .collect();

    EmbeddingModel {
        vocab,
        routing_centroids,
        category_centroids,
    }
});

/// Best-matching routing decision and its similarity score, or `None` if the
/// input produced an all-zero vector (no recognized vocabulary at all).
#[must_use]
pub fn best_routing_match(text: &str) -> Option<(RoutingDecision, f64)> {
    let vector = bag_of_words_vector(text, &MODEL.vocab);
    MODEL
        .routing_centroids
        .iter()
        .map(|(decision, centroid)| (*decision, cosine_similarity(&vector, centroid)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

/// Best-matching requirement category and its similarity score.
#[must_use]
pub fn best_category_match(text: &str) -> Option<(RequirementCategory, f64)> {
    let vector = bag_of_words_vector(text, &MODEL.vocab);
    MODEL
        .category_centroids
        .iter()
        .map(|(category, centroid)| (*category, cosine_similarity(&vector, centroid)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
}
