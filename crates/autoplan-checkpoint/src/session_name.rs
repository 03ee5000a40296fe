//! Human-readable session naming.

const MAX_LEN: usize = 64;
const ELLIPSIS: &str = "...";

fn sanitize_branch(branch: &str) -> String {
    let mut out = String::with_capacity(branch.len());
    let mut last_was_dash = false;
    for c in branch.chars() {
        let mapped = if c == '/' {
            Some('-')
        } else if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
            Some(c)
        } else {
            None
        };
        match mapped {
            Some('-') => {
                if !last_was_dash {
                    out.push('-');
                }
                last_was_dash = true;
            }
            Some(c) => {
                out.push(c);
                last_was_dash = false;
            }
            None => {}
        }
    }
    out.trim_matches('-').to_string()
}

/// `{sanitized_branch}[-{project_name}]`, truncated to 64 chars with an
/// ellipsis. `project_name` is appended only when non-empty.
#[must_use]
pub fn derive_session_name(branch: &str, project_name: Option<&str>) -> String {
    let sanitized_branch = sanitize_branch(branch);
    let base = match project_name {
        Some(name) if !name.trim().is_empty() => format!("{sanitized_branch}-{name}"),
        _ => sanitized_branch,
    };
    truncate_with_ellipsis(&base, MAX_LEN)
}

fn truncate_with_ellipsis(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let keep = max_len.saturating_sub(ELLIPSIS.len());
    let truncated: String = s.chars().take(keep).collect();
    format!("{truncated}{ELLIPSIS}")
}

/// Display name: session name plus a timestamp and a short activity
/// summary (`N files changed`).
#[must_use]
pub fn display_name(session_name: &str, timestamp: &str, files_changed: usize) -> String {
    format!("{session_name} @ {timestamp} ({files_changed} files changed)")
}
