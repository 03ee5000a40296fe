//! Phase Decomposition step: splits
//! a [`PlanResponse`] into `00-overview.md` and ordered `NN-*.md` phase
//! files under `{output_dir}/{date}-{feature}/`.

use anyhow::Result;
use autoplan_context::sanitize_project_name;
use autoplan_utils::atomic_write::write_file_atomic;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;

use crate::planning::PlanResponse;

/// Directory a plan's files live under: `{output_dir}/{date}-{feature}/`.
#[must_use]
pub fn plan_dir(output_dir: &Utf8Path, date: NaiveDate, feature: &str) -> Utf8PathBuf {
    output_dir.join(format!("{date}-{}", sanitize_project_name(feature)))
}

/// Writes `00-overview.md` plus one `NN-*.md` per phase, returning the
/// overview's path and the ordered list of phase file paths.
pub fn write_plan_files(
    output_dir: &Utf8Path,
    date: NaiveDate,
    feature: &str,
    plan: &PlanResponse,
) -> Result<(Utf8PathBuf, Vec<String>)> {
    let dir = plan_dir(output_dir, date, feature);

    let overview_path = dir.join("00-overview.md");
    write_file_atomic(&overview_path, &render_overview(plan))?;

    let mut phase_files = Vec::with_capacity(plan.phases.len());
    for (index, phase) in plan.phases.iter().enumerate() {
        let number = index + 1;
        let slug = sanitize_project_name(&phase.title);
        let path = dir.join(format!("{number:02}-{slug}.md"));
        write_file_atomic(&path, &render_phase(number, phase))?;
        phase_files.push(path.to_string());
    }

    Ok((overview_path, phase_files))
}

fn render_overview(plan: &PlanResponse) -> String {
    let mut out = format!("# Overview\n\n{}\n", plan.overview);
    if !plan.phases.is_empty() {
        out.push_str("\n## Phases\n\n");
        for (index, phase) in plan.phases.iter().enumerate() {
            out.push_str(&format!("{:02}. {}\n", index + 1, phase.title));
        }
    }
    out
}

fn render_phase(number: usize, phase: &crate::planning::PlanPhase) -> String {
    format!("# Phase {number:02}: {}\n\n{}\n", phase.title, phase.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::PlanPhase;
    use tempfile::TempDir;

    fn sample_plan() -> PlanResponse {
        PlanResponse {
            overview: "ship the login flow".to_string(),
            phases: vec![
                PlanPhase {
                    title: "Set up auth schema".to_string(),
                    body: "create the users table".to_string(),
                },
                PlanPhase {
                    title: "Wire up session tokens".to_string(),
                    body: "issue and validate JWTs".to_string(),
                },
            ],
        }
    }

    #[test]
    fn plan_dir_combines_date_and_sanitized_feature() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        let dir = plan_dir(Utf8Path::new("plans"), date, "Login Flow!");
        assert_eq!(dir, Utf8PathBuf::from("plans/2026-07-27-login-flow"));
    }

    #[test]
    fn write_plan_files_writes_overview_and_numbered_phases() {
        let temp = TempDir::new().unwrap();
        let output_dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        let plan = sample_plan();

        let (overview_path, phase_files) =
            write_plan_files(&output_dir, date, "login flow", &plan).unwrap();

        assert!(overview_path.as_std_path().exists());
        assert_eq!(phase_files.len(), 2);
        assert!(phase_files[0].ends_with("01-set-up-auth-schema.md"));
        assert!(phase_files[1].ends_with("02-wire-up-session-tokens.md"));

        let overview = std::fs::read_to_string(overview_path.as_std_path()).unwrap();
        assert!(overview.contains("ship the login flow"));
    }
}
