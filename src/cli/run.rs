//! CLI entry point and dispatch logic.
//!
//! Owns the `run()` function: parses arguments, discovers configuration,
//! creates the tokio runtime, dispatches to a command handler, and maps
//! any resulting error to an exit code. `run()` handles all output;
//! `main.rs` only exits with the returned code.

use clap::Parser;

use autoplan_config::Config;
use autoplan_utils::error::AutoplanError;
use autoplan_utils::exit_codes::ExitCode;
use autoplan_utils::logging::init_tracing;

use super::args::{CheckpointCommands, Cli, Commands};
use super::commands;

pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match discover_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.display_for_user());
            return Err(e.to_exit_code());
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to start async runtime: {e}");
            return Err(ExitCode::GENERAL_FAILURE);
        }
    };

    let result = rt.block_on(dispatch(&config, cli.command));

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("{}", e.display_for_user());
            Err(e.to_exit_code())
        }
    }
}

fn discover_config(cli: &Cli) -> Result<Config, AutoplanError> {
    let start_dir = std::env::current_dir().map_err(AutoplanError::Io)?;
    Config::discover_from(&start_dir, cli.config.as_deref()).map_err(|e| {
        AutoplanError::Config(autoplan_utils::error::ConfigError::InvalidFile {
            path: cli
                .config
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| start_dir.display().to_string()),
            reason: e.to_string(),
        })
    })
}

async fn dispatch(config: &Config, command: Commands) -> Result<(), AutoplanError> {
    match command {
        Commands::Plan {
            requirement,
            file,
            project,
            validate_full,
            validate_category,
            force_all,
            no_context,
            max_files,
            output_dir,
            autonomy_mode,
        } => {
            commands::execute_plan_command(
                config,
                requirement,
                file,
                project,
                validate_full,
                validate_category,
                force_all,
                no_context,
                max_files,
                output_dir,
                autonomy_mode.map(Into::into),
            )
            .await
        }
        Commands::Execute {
            plan,
            project,
            use_tracker,
            max_iterations,
            agent_binary,
            agent_timeout_secs,
            tracker_binary,
        } => {
            commands::execute_run_command(
                config,
                plan,
                project,
                use_tracker,
                max_iterations,
                agent_binary,
                agent_timeout_secs,
                tracker_binary,
            )
            .await
        }
        Commands::Status { project } => commands::execute_status_command(project),
        Commands::Checkpoint(CheckpointCommands::List { project }) => {
            commands::execute_checkpoint_list_command(project)
        }
        Commands::Checkpoint(CheckpointCommands::Cleanup { project, days, all }) => {
            commands::execute_checkpoint_cleanup_command(project, days, all)
        }
    }
}
