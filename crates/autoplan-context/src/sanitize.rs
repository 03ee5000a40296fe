//! Project-name sanitization for on-disk paths.

const FALLBACK: &str = "unnamed-project";

/// Lowercase, replace non-alphanumerics with `-`, collapse repeats, strip
/// leading/trailing `-`, falling back to `unnamed-project` if the result
/// would be empty.
#[must_use]
pub fn sanitize_project_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut collapsed = String::with_capacity(lowered.len());
    let mut last_was_dash = false;

    for c in lowered.chars() {
        if c.is_ascii_alphanumeric() {
            collapsed.push(c);
            last_was_dash = false;
        } else if !last_was_dash {
            collapsed.push('-');
            last_was_dash = true;
        }
    }

    let trimmed = collapsed.trim_matches('-');
    if trimmed.is_empty() {
        FALLBACK.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_replaces_non_alphanumerics() {
        assert_eq!(sanitize_project_name("My Cool Project!"), "my-cool-project");
    }

    #[test]
    fn collapses_repeated_separators() {
        assert_eq!(sanitize_project_name("foo___bar   baz"), "foo-bar-baz");
    }

    #[test]
    fn strips_leading_and_trailing_separators() {
        assert_eq!(sanitize_project_name("--hello--"), "hello");
    }

    #[test]
    fn falls_back_when_nothing_survives() {
        assert_eq!(sanitize_project_name("!!!"), FALLBACK);
        assert_eq!(sanitize_project_name(""), FALLBACK);
    }

    #[test]
    fn preserves_already_clean_names() {
        assert_eq!(sanitize_project_name("autoplan"), "autoplan");
    }
}
