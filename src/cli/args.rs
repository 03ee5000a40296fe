//! CLI argument definitions.
//!
//! The CLI surface: an explicit `--plan` to skip
//! discovery, the three validation gates, `--force-all`, autonomy mode, and
//! `--max-iterations`, spread across the `plan` / `execute` / `status` /
//! `checkpoint` subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use autoplan_config::AutonomyMode;

/// CLI-facing mirror of `AutonomyMode`, spelled as `checkpoint` /
/// `batch` / `fully_autonomous`.
#[derive(Clone, Copy, ValueEnum)]
pub enum AutonomyModeArg {
    Checkpoint,
    Batch,
    FullyAutonomous,
}

impl From<AutonomyModeArg> for AutonomyMode {
    fn from(value: AutonomyModeArg) -> Self {
        match value {
            AutonomyModeArg::Checkpoint => AutonomyMode::Checkpoint,
            AutonomyModeArg::Batch => AutonomyMode::Batch,
            AutonomyModeArg::FullyAutonomous => AutonomyMode::FullyAutonomous,
        }
    }
}

#[derive(Parser)]
#[command(name = "autoplan")]
#[command(about = "Autonomous planning pipeline: research-to-plan decomposition with checkpointed, self-driving execution")]
#[command(long_about = r#"
autoplan turns free-text research into a validated requirement hierarchy,
a phase-decomposed implementation plan, and then drives its own execution
by invoking an external coding agent one phase at a time.

EXAMPLES:
  # Decompose research into a checkpointed plan
  autoplan plan "Implement user login with JWT, track sessions, clean up stale ones"

  # Same, but fail the run on any structural validation issue rather than
  # silently pruning invalid subtrees
  autoplan plan --file research.txt --project . -vf -vc

  # Drive the execution loop against an explicit plan (no tracker)
  autoplan execute --plan plans/2026-07-27-login/00-overview.md

  # Drive the execution loop against whatever the tracker reports next
  autoplan execute --use-tracker --max-iterations 50

  # Inspect the most recent resumable checkpoint
  autoplan status

  # Age out old checkpoints
  autoplan checkpoint cleanup --days 30

CONFIGURATION:
  Precedence: CLI flags > environment variables > .autoplan/config.toml > defaults.
  Config file is discovered by searching upward from CWD for .autoplan/config.toml.
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decompose research text into a checkpointed, phase-decomposed plan.
    Plan {
        /// Research text. Omit to read `--file`, or stdin if neither is given.
        requirement: Option<String>,

        /// Read research text from a file instead of the positional argument.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Project root to checkpoint against and scan for context. Defaults to CWD.
        #[arg(long)]
        project: Option<PathBuf>,

        /// Enable stage-3 semantic validation (advisory).
        #[arg(long, visible_alias = "vf")]
        validate_full: bool,

        /// Enable stage-4 category-specific validation (advisory).
        #[arg(long, visible_alias = "vc")]
        validate_category: bool,

        /// Bypass structural validation blocking: prune invalid subtrees and continue.
        #[arg(long)]
        force_all: bool,

        /// Skip the context-generation step (tech-stack / file-group scan).
        #[arg(long)]
        no_context: bool,

        /// Maximum source files to scan for file-group summarization.
        #[arg(long)]
        max_files: Option<usize>,

        /// Directory (relative to `--project`) plans are written under.
        #[arg(long)]
        output_dir: Option<String>,

        /// How autonomously the later execution loop should drive itself.
        #[arg(long, value_enum)]
        autonomy_mode: Option<AutonomyModeArg>,
    },

    /// Drive the execution loop: invoke the coding agent phase by phase.
    Execute {
        /// Explicit plan file path. Required unless `--use-tracker` is set.
        #[arg(long)]
        plan: Option<PathBuf>,

        /// Project root the agent and tracker operate in. Defaults to CWD.
        #[arg(long)]
        project: Option<PathBuf>,

        /// Consult the feature tracker for plan discovery and next-feature
        /// selection instead of running a single explicit plan once.
        #[arg(long)]
        use_tracker: bool,

        /// Upper bound on loop iterations.
        #[arg(long)]
        max_iterations: Option<u32>,

        /// Path to the coding-agent binary (default `claude`).
        #[arg(long)]
        agent_binary: Option<String>,

        /// Per-phase agent timeout in seconds (default 300).
        #[arg(long)]
        agent_timeout_secs: Option<u64>,

        /// Path to the tracker binary (default `bd`).
        #[arg(long)]
        tracker_binary: Option<String>,
    },

    /// Report the most recent resumable checkpoint for a project.
    Status {
        /// Project root to inspect. Defaults to CWD.
        #[arg(long)]
        project: Option<PathBuf>,
    },

    /// Inspect or clean up checkpoint files.
    #[command(subcommand)]
    Checkpoint(CheckpointCommands),
}

#[derive(Subcommand)]
pub enum CheckpointCommands {
    /// List every checkpoint for a project, deduplicated by context hash.
    List {
        #[arg(long)]
        project: Option<PathBuf>,
    },
    /// Delete checkpoint files.
    Cleanup {
        #[arg(long)]
        project: Option<PathBuf>,

        /// Remove checkpoints older than this many days.
        #[arg(long, conflicts_with = "all")]
        days: Option<i64>,

        /// Remove every checkpoint, regardless of age.
        #[arg(long)]
        all: bool,
    },
}
