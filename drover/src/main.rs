//! CLI entry points for drover.
//!
//! `build`/`adopt`/`enhance`/`resume` all funnel into the same loop
//! controller with different entry seeding; `status` is a read-only peek at
//! the checklist. Precondition failures (missing agent binary, bad project
//! path, resume without a checklist) are fatal here, before the loop starts.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};

use drover::core::progress;
use drover::exit_codes;
use drover::io::DroverPaths;
use drover::io::checklist_store::{ChecklistStore, FEATURE_LIST_FILE};
use drover::io::config::{SessionConfig, load_config};
use drover::io::interrupt::KeypressPrompt;
use drover::io::invoker::{
    ClaudeInvoker, DEFAULT_MODEL, suggest_project_name, verify_agent_cli,
};
use drover::io::prompt::PromptSet;
use drover::looping::{LoopOptions, StopReason, run_loop};
use drover::{logging, ui};

#[derive(Parser)]
#[command(
    name = "drover",
    version,
    about = "Drive a coding agent through sessions until a feature checklist passes"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a new project from a spec file or a free-text description.
    Build {
        /// App description (text) or path to a spec file (.txt/.md).
        spec: String,
        /// Output directory (default: suggested from the description).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Target number of features to generate.
        #[arg(short, long, default_value_t = 50)]
        features: u32,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Adopt an existing project: the checklist is derived from its code.
    Adopt {
        /// Directory of the pre-existing project.
        project_dir: PathBuf,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Extend a project's checklist with features from an enhancement spec.
    Enhance {
        /// Project directory with an existing checklist.
        project_dir: PathBuf,
        /// Path to the enhancement spec file.
        spec: PathBuf,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Resume a project that already has a checklist.
    Resume {
        /// Project directory to resume.
        project_dir: PathBuf,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Show checklist progress without running any session.
    Status {
        /// Project directory to inspect.
        project_dir: PathBuf,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Claude model to use.
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Maximum sessions before stopping (default: unlimited).
    #[arg(short = 'n', long)]
    max_sessions: Option<u32>,

    /// Per-session timeout in seconds (default: from config).
    #[arg(short, long)]
    timeout: Option<u64>,
}

/// Entry seeding that distinguishes the four loop entry points.
struct EntrySeeds {
    adoption: bool,
    spec_seed: Option<String>,
    enhancement_seed: Option<String>,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Build {
            spec,
            output,
            features,
            run,
        } => cmd_build(&spec, output, features, &run),
        Command::Adopt { project_dir, run } => cmd_adopt(&project_dir, &run),
        Command::Enhance {
            project_dir,
            spec,
            run,
        } => cmd_enhance(&project_dir, &spec, &run),
        Command::Resume { project_dir, run } => cmd_resume(&project_dir, &run),
        Command::Status { project_dir } => cmd_status(&project_dir),
    }
}

fn cmd_build(spec: &str, output: Option<PathBuf>, features: u32, run: &RunArgs) -> Result<i32> {
    verify_agent_cli()?;

    let prompts = PromptSet::new();
    let spec_path = Path::new(spec);
    let (spec_text, description) = if spec_path.is_file() {
        println!("Reading spec from: {}", spec_path.display());
        let text = fs::read_to_string(spec_path)
            .with_context(|| format!("read spec {}", spec_path.display()))?;
        let stem = spec_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| spec.to_string());
        (text, stem)
    } else {
        println!("Generating spec from description...");
        (prompts.render_app_spec(spec, features)?, spec.to_string())
    };

    let project_dir = match output {
        Some(dir) => dir,
        None => {
            println!("Generating project name...");
            // No project dir yet, so no per-project config: use the default
            // spec-generation budget.
            let spec_timeout = Duration::from_secs(SessionConfig::default().spec_timeout_secs);
            let name = suggest_project_name(&description, spec_timeout)?;
            println!("Project name: {name}");
            PathBuf::from(name)
        }
    };
    fs::create_dir_all(&project_dir)
        .with_context(|| format!("create project directory {}", project_dir.display()))?;

    run_project(
        &project_dir,
        run,
        EntrySeeds {
            adoption: false,
            spec_seed: Some(spec_text),
            enhancement_seed: None,
        },
    )
}

fn cmd_adopt(project_dir: &Path, run: &RunArgs) -> Result<i32> {
    verify_agent_cli()?;
    require_project_dir(project_dir)?;
    run_project(
        project_dir,
        run,
        EntrySeeds {
            adoption: true,
            spec_seed: None,
            enhancement_seed: None,
        },
    )
}

fn cmd_enhance(project_dir: &Path, spec: &Path, run: &RunArgs) -> Result<i32> {
    verify_agent_cli()?;
    require_project_dir(project_dir)?;
    require_checklist(project_dir)?;
    let spec_text =
        fs::read_to_string(spec).with_context(|| format!("read enhancement spec {}", spec.display()))?;
    run_project(
        project_dir,
        run,
        EntrySeeds {
            adoption: false,
            spec_seed: None,
            enhancement_seed: Some(spec_text),
        },
    )
}

fn cmd_resume(project_dir: &Path, run: &RunArgs) -> Result<i32> {
    verify_agent_cli()?;
    require_project_dir(project_dir)?;
    require_checklist(project_dir)?;
    run_project(
        project_dir,
        run,
        EntrySeeds {
            adoption: false,
            spec_seed: None,
            enhancement_seed: None,
        },
    )
}

fn cmd_status(project_dir: &Path) -> Result<i32> {
    require_project_dir(project_dir)?;
    let paths = DroverPaths::new(project_dir);
    let cfg = load_config(&paths.config_path)?;
    let snapshot = ChecklistStore::new(project_dir).load()?;
    let report = progress::report(&snapshot.checklist, &snapshot.checklist);
    ui::print_progress(&report, &cfg.ui);
    Ok(exit_codes::OK)
}

fn run_project(project_dir: &Path, run: &RunArgs, seeds: EntrySeeds) -> Result<i32> {
    let project_dir = project_dir
        .canonicalize()
        .with_context(|| format!("resolve project directory {}", project_dir.display()))?;
    let paths = DroverPaths::new(&project_dir);
    let cfg = load_config(&paths.config_path)
        .with_context(|| format!("load config {}", paths.config_path.display()))?;

    let session_timeout = Duration::from_secs(
        run.timeout.unwrap_or(cfg.session.timeout_secs),
    );
    let options = LoopOptions {
        max_sessions: run.max_sessions,
        session_timeout,
        pause: Duration::from_secs(cfg.session.pause_secs),
        adoption: seeds.adoption,
        spec_seed: seeds.spec_seed,
        enhancement_seed: seeds.enhancement_seed,
    };

    let invoker = ClaudeInvoker::new(&cfg, run.model.clone());
    let prompts = PromptSet::new();
    ui::print_header(&project_dir, &run.model, run.max_sessions);

    let ui_cfg = cfg.ui.clone();
    let outcome = run_loop(
        &project_dir,
        &invoker,
        &KeypressPrompt,
        &prompts,
        &options,
        |event| ui::render_event(event, &ui_cfg),
    )?;

    ui::print_outcome(&outcome, &project_dir);
    let snapshot = ChecklistStore::new(&project_dir).load()?;
    let report = progress::report(&snapshot.checklist, &snapshot.checklist);
    ui::print_progress(&report, &cfg.ui);

    Ok(match outcome.stop {
        StopReason::Complete => exit_codes::OK,
        StopReason::MaxSessionsReached => exit_codes::MAX_SESSIONS,
        StopReason::UserStopped => exit_codes::USER_STOPPED,
    })
}

fn require_project_dir(project_dir: &Path) -> Result<()> {
    if !project_dir.is_dir() {
        return Err(anyhow!(
            "project directory not found: {}",
            project_dir.display()
        ));
    }
    Ok(())
}

fn require_checklist(project_dir: &Path) -> Result<()> {
    let snapshot = ChecklistStore::new(project_dir).load()?;
    if !snapshot.checklist.is_present() {
        return Err(anyhow!(
            "no usable {} in {} (use `drover build` to start a new project, or `drover adopt` for an existing one)",
            FEATURE_LIST_FILE,
            project_dir.display()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_build_with_defaults() {
        let cli = Cli::parse_from(["drover", "build", "a todo app"]);
        match cli.command {
            Command::Build {
                spec,
                output,
                features,
                run,
            } => {
                assert_eq!(spec, "a todo app");
                assert_eq!(output, None);
                assert_eq!(features, 50);
                assert_eq!(run.model, DEFAULT_MODEL);
                assert_eq!(run.max_sessions, None);
                assert_eq!(run.timeout, None);
            }
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn parse_resume_with_overrides() {
        let cli = Cli::parse_from([
            "drover", "resume", "./my-app", "-n", "5", "--timeout", "600", "-m", "some-model",
        ]);
        match cli.command {
            Command::Resume { project_dir, run } => {
                assert_eq!(project_dir, PathBuf::from("./my-app"));
                assert_eq!(run.max_sessions, Some(5));
                assert_eq!(run.timeout, Some(600));
                assert_eq!(run.model, "some-model");
            }
            _ => panic!("expected resume"),
        }
    }

    #[test]
    fn parse_enhance_takes_dir_and_spec() {
        let cli = Cli::parse_from(["drover", "enhance", "./my-app", "./more.md"]);
        match cli.command {
            Command::Enhance {
                project_dir, spec, ..
            } => {
                assert_eq!(project_dir, PathBuf::from("./my-app"));
                assert_eq!(spec, PathBuf::from("./more.md"));
            }
            _ => panic!("expected enhance"),
        }
    }

    #[test]
    fn missing_project_dir_is_fatal() {
        let err = require_project_dir(Path::new("/definitely/not/here")).unwrap_err();
        assert!(err.to_string().contains("project directory not found"));
    }

    #[test]
    fn resume_requires_a_checklist() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = require_checklist(temp.path()).unwrap_err();
        assert!(err.to_string().contains("feature_list.json"));
    }
}
