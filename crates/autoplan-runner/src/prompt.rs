//! Prompt construction for the coding agent.

/// Combines plan file contents, a phase identifier, and a fixed
/// instructions template into the prompt handed to the agent subprocess.
/// An empty `plan_contents` is allowed — the identifier alone is still a
/// valid (if thin) prompt.
#[must_use]
pub fn build_prompt(plan_contents: &str, phase_identifier: &str) -> String {
    format!(
        "You are continuing an autonomous implementation run.\n\
         Phase: {phase_identifier}\n\n\
         Plan:\n{plan_contents}\n\n\
         Implement this phase completely. Make the necessary code changes, \
         run any relevant tests, and leave the working tree in a state where \
         the phase's acceptance criteria are met."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_phase_identifier_and_plan_body() {
        let prompt = build_prompt("do the thing", "02-implement-auth");
        assert!(prompt.contains("02-implement-auth"));
        assert!(prompt.contains("do the thing"));
    }

    #[test]
    fn empty_plan_contents_still_produces_a_usable_prompt() {
        let prompt = build_prompt("", "01-setup");
        assert!(prompt.contains("01-setup"));
    }
}
