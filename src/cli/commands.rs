//! Command handlers: one function per subcommand, each owning its own I/O
//! and error reporting so `run()` stays a thin dispatcher.

use std::io::Read as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use autoplan_checkpoint::{
    age_in_days, cleanup_all, cleanup_by_age, dedup_by_context_hash, detect_resumable_checkpoint,
    list_checkpoints,
};
use autoplan_classifier::PreClassifier;
use autoplan_config::{AutonomyMode, Config};
use autoplan_orchestrator::PipelineOrchestrator;
use autoplan_runner::ExecutionLoopRunner;
use autoplan_tracker::TrackerAdapter;
use autoplan_utils::error::{AutoplanError, ConfigError, PipelineError};
use autoplan_utils::runner::{NativeRunner, ProcessRunner};
use camino::Utf8PathBuf;

fn project_root(project: Option<PathBuf>) -> Result<Utf8PathBuf, AutoplanError> {
    let path = project.unwrap_or(std::env::current_dir().map_err(autoplan_utils::error::AutoplanError::Io)?);
    Utf8PathBuf::from_path_buf(path.clone()).map_err(|_| {
        AutoplanError::Config(ConfigError::InvalidValue {
            key: "project".to_string(),
            value: path.display().to_string(),
        })
    })
}

fn read_requirement(requirement: Option<String>, file: Option<PathBuf>) -> Result<String, AutoplanError> {
    if let Some(text) = requirement {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(&path).map_err(|e| {
            AutoplanError::Pipeline(PipelineError::FileNotFound {
                path: format!("{}: {e}", path.display()),
            })
        });
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .map_err(autoplan_utils::error::AutoplanError::Io)?;
    Ok(buf)
}

#[allow(clippy::too_many_arguments)]
pub async fn execute_plan_command(
    config: &Config,
    requirement: Option<String>,
    file: Option<PathBuf>,
    project: Option<PathBuf>,
    validate_full: bool,
    validate_category: bool,
    force_all: bool,
    no_context: bool,
    max_files: Option<usize>,
    output_dir: Option<String>,
    autonomy_mode: Option<AutonomyMode>,
) -> Result<(), AutoplanError> {
    let research_text = read_requirement(requirement, file)?;
    let project_path = project_root(project)?;

    let mut orchestrator_config = config.orchestrator.clone();
    orchestrator_config.validate_full = validate_full;
    orchestrator_config.validate_category = validate_category;
    orchestrator_config.force_all = force_all;
    if no_context {
        orchestrator_config.enable_context_generation = false;
    }
    if let Some(max_files) = max_files {
        orchestrator_config.max_files = max_files;
    }
    if let Some(output_dir) = output_dir {
        orchestrator_config.output_dir = output_dir;
    }
    if let Some(autonomy_mode) = autonomy_mode {
        orchestrator_config.autonomy_mode = autonomy_mode;
    }

    let client = autoplan_llm::from_config(&config.llm)?;
    let classifier = PreClassifier::new(config.thresholds);
    let process_runner: Arc<dyn ProcessRunner> = Arc::new(NativeRunner::new());

    let orchestrator = PipelineOrchestrator::new(
        client,
        "",
        config.llm.default_timeout(),
        classifier,
        orchestrator_config,
        process_runner,
        project_path,
    );

    let context = orchestrator
        .run(&research_text)
        .await
        .map_err(AutoplanError::Pipeline)?;

    let root_count = context
        .decomposed_requirements
        .as_ref()
        .map(|h| h.roots.len())
        .unwrap_or(0);
    println!("decomposed {root_count} root requirement(s)");
    if let Some(plan_path) = &context.plan_path {
        println!("plan overview: {plan_path}");
    }
    for phase_file in &context.phase_files {
        println!("  phase file: {phase_file}");
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn execute_run_command(
    config: &Config,
    plan: Option<PathBuf>,
    project: Option<PathBuf>,
    use_tracker: bool,
    max_iterations: Option<u32>,
    agent_binary: Option<String>,
    agent_timeout_secs: Option<u64>,
    tracker_binary: Option<String>,
) -> Result<(), AutoplanError> {
    let project_path = project_root(project)?;

    let mut runner_config = config.runner.clone();
    if let Some(n) = max_iterations {
        runner_config.max_iterations = n;
    }
    if let Some(bin) = agent_binary {
        runner_config.agent_binary = bin;
    }
    if let Some(secs) = agent_timeout_secs {
        runner_config.agent_timeout_secs = secs;
    }
    if let Some(bin) = tracker_binary {
        runner_config.tracker_binary = bin;
    }

    if !use_tracker && plan.is_none() {
        return Err(AutoplanError::Pipeline(PipelineError::NoPlansAvailable));
    }

    let process_runner: Arc<dyn ProcessRunner> = Arc::new(NativeRunner::new());

    let tracker = if use_tracker {
        let adapter = TrackerAdapter::new(
            runner_config.tracker_binary.clone(),
            process_runner.clone(),
            Duration::from_secs(runner_config.tracker_timeout_secs),
        );
        Some(adapter)
    } else {
        None
    };

    let mut loop_runner = ExecutionLoopRunner::new(&runner_config, process_runner, project_path, tracker);
    if let Some(plan_path) = plan {
        let plan_path = Utf8PathBuf::from_path_buf(plan_path.clone()).map_err(|_| {
            AutoplanError::Pipeline(PipelineError::FileNotFound {
                path: plan_path.display().to_string(),
            })
        })?;
        loop_runner.set_plan_path(plan_path);
    }

    loop_runner.run().await?;

    println!("loop state: {}", loop_runner.state());
    if let Some(result) = loop_runner.last_result() {
        println!("last phase success: {}", result.success);
    }

    if loop_runner.state() == autoplan_runner::RunnerState::Failed {
        return Err(AutoplanError::Pipeline(PipelineError::StepFailed {
            step: "execute".to_string(),
            reason: "execution loop ended in FAILED state".to_string(),
        }));
    }
    Ok(())
}

pub fn execute_status_command(project: Option<PathBuf>) -> Result<(), AutoplanError> {
    let project_path = project_root(project)?;

    match detect_resumable_checkpoint(&project_path) {
        Some(checkpoint) => {
            println!("resumable checkpoint: {}", checkpoint.id);
            println!("  phase: {:?}", checkpoint.phase);
            println!("  age: {} day(s)", age_in_days(checkpoint.timestamp));
            println!("  context hash: {}", checkpoint.context_hash);
        }
        None => println!("no resumable checkpoint found under {project_path}"),
    }
    Ok(())
}

pub fn execute_checkpoint_list_command(project: Option<PathBuf>) -> Result<(), AutoplanError> {
    let project_path = project_root(project)?;
    let checkpoints = dedup_by_context_hash(list_checkpoints(&project_path));
    if checkpoints.is_empty() {
        println!("no checkpoints found under {project_path}");
        return Ok(());
    }
    for checkpoint in checkpoints {
        println!(
            "{}  {:?}  {}  age={}d",
            checkpoint.id,
            checkpoint.phase,
            checkpoint.context_hash,
            age_in_days(checkpoint.timestamp)
        );
    }
    Ok(())
}

pub fn execute_checkpoint_cleanup_command(
    project: Option<PathBuf>,
    days: Option<i64>,
    all: bool,
) -> Result<(), AutoplanError> {
    let project_path = project_root(project)?;
    let removed = if all {
        cleanup_all(&project_path)
    } else if let Some(days) = days {
        cleanup_by_age(&project_path, days)
    } else {
        return Err(AutoplanError::Config(ConfigError::InvalidValue {
            key: "checkpoint cleanup".to_string(),
            value: "one of --days or --all is required".to_string(),
        }));
    };
    println!("removed {removed} checkpoint file(s)");
    Ok(())
}
