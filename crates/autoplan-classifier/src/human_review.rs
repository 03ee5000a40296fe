//! Append-only queue for tier-3 classifications in the human-review
//! confidence band (`[llm_human_review, llm_auto_route)`).

use autoplan_model::ClassificationResult;
use autoplan_utils::paths::autoplan_home;
use serde::Serialize;
use std::io::Write;

const QUEUE_FILE_NAME: &str = "human_review_queue.jsonl";

#[derive(Serialize)]
struct QueueEntry<'a> {
    text: &'a str,
    category: autoplan_model::RequirementCategory,
    confidence: f64,
    routing_decision: autoplan_model::RoutingDecision,
}

/// Appends one entry to the human-review queue. Best-effort: a write
/// failure is logged and swallowed rather than aborting decomposition.
pub fn enqueue(text: &str, result: &ClassificationResult) {
    if let Err(e) = try_enqueue(text, result) {
        tracing::warn!(error = %e, "failed to append to human review queue");
    }
}

fn try_enqueue(text: &str, result: &ClassificationResult) -> std::io::Result<()> {
    let home = autoplan_home();
    autoplan_utils::paths::ensure_dir_all(&home)?;
    let path = home.join(QUEUE_FILE_NAME);

    let entry = QueueEntry {
        text,
        category: result.category,
        confidence: result.confidence,
        routing_decision: result.routing_decision,
    };
    let line = serde_json::to_string(&entry)?;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_std_path())?;
    writeln!(file, "{line}")
}
