//! Agent invoker abstraction and the Claude Code CLI backend.
//!
//! The [`AgentInvoker`] trait decouples session orchestration from the actual
//! agent binary. Tests use scripted invokers that return predetermined
//! outputs without spawning processes.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::Command;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::io::config::DroverConfig;
use crate::io::process::run_command_with_timeout;
use crate::ui::Spinner;

/// Model used for full coding sessions unless overridden on the CLI.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Small, fast model for the one-line project-name suggestion.
const NAME_SUGGESTION_MODEL: &str = "claude-haiku-4-5-20251001";

const SYSTEM_PROMPT: &str =
    "You are an expert full-stack developer building a production-quality web application.";

/// Parameters for one agent invocation.
#[derive(Debug, Clone)]
pub struct InvokeRequest {
    /// Working directory for the agent process.
    pub project_dir: PathBuf,
    /// Prompt text for this session; opaque to the invoker.
    pub prompt: String,
    /// Hard wall-clock budget; the child is killed when it elapses.
    pub timeout: Duration,
}

/// Captured result of one agent invocation.
#[derive(Debug, Clone)]
pub struct InvokeOutput {
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

/// Abstraction over agent execution backends.
pub trait AgentInvoker {
    /// Run the agent synchronously. A non-zero exit status is not an error:
    /// whatever the agent printed is returned as-is and classification is the
    /// session runner's job. `Err` means the invocation itself failed (for
    /// example the binary could not be spawned).
    fn invoke(&self, request: &InvokeRequest) -> Result<InvokeOutput>;
}

/// Invoker that spawns the Claude Code CLI (`claude -p …`).
pub struct ClaudeInvoker {
    model: String,
    max_turns: u32,
    allowed_tools: String,
    output_limit_bytes: usize,
    /// Render an elapsed-time spinner to stderr while the agent runs.
    progress: bool,
}

impl ClaudeInvoker {
    pub fn new(cfg: &DroverConfig, model: String) -> Self {
        Self {
            model,
            max_turns: cfg.session.max_turns,
            allowed_tools: cfg.tools.allowed.join(","),
            output_limit_bytes: cfg.session.output_limit_bytes,
            progress: std::io::stderr().is_terminal(),
        }
    }
}

impl AgentInvoker for ClaudeInvoker {
    fn invoke(&self, request: &InvokeRequest) -> Result<InvokeOutput> {
        info!(
            project_dir = %request.project_dir.display(),
            model = %self.model,
            timeout_secs = request.timeout.as_secs(),
            "starting agent session"
        );

        let mut cmd = Command::new("claude");
        cmd.arg("--print")
            .arg("--dangerously-skip-permissions")
            .arg("-p")
            .arg(&request.prompt)
            .arg("--model")
            .arg(&self.model)
            .arg("--max-turns")
            .arg(self.max_turns.to_string())
            .arg("--system-prompt")
            .arg(SYSTEM_PROMPT)
            .arg("--allowedTools")
            .arg(&self.allowed_tools)
            .current_dir(&request.project_dir);

        let mut spinner = self.progress.then(Spinner::new);
        let mut on_tick = |elapsed: Duration| {
            if let Some(spinner) = spinner.as_mut() {
                spinner.tick(elapsed);
            }
        };
        let output = run_command_with_timeout(
            cmd,
            request.timeout,
            self.output_limit_bytes,
            &mut on_tick,
        )
        .context("run claude cli")?;
        if let Some(spinner) = spinner {
            spinner.finish();
        }

        if output.timed_out {
            warn!(timeout_secs = request.timeout.as_secs(), "agent session timed out");
        } else if !output.status.success() {
            // The agent often exits non-zero after printing useful output;
            // surface the status but let the caller classify.
            warn!(exit_code = ?output.status.code(), "claude cli exited non-zero");
        }

        let mut stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.stdout_truncated > 0 {
            stdout.push_str(&format!(
                "\n[stdout truncated {} bytes]\n",
                output.stdout_truncated
            ));
        }
        let mut stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if output.stderr_truncated > 0 {
            stderr.push_str(&format!(
                "\n[stderr truncated {} bytes]\n",
                output.stderr_truncated
            ));
        }

        debug!(timed_out = output.timed_out, "agent session finished");
        Ok(InvokeOutput {
            stdout,
            stderr,
            timed_out: output.timed_out,
        })
    }
}

/// Verify the Claude Code CLI is installed and answers `--version`.
///
/// A missing binary is a configuration failure: surfaced before the loop
/// starts, never retried.
pub fn verify_agent_cli() -> Result<()> {
    match Command::new("claude").arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(output) => Err(anyhow!(
            "claude cli is installed but `claude --version` failed with status {:?}",
            output.status.code()
        )),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(anyhow!(
            "Claude Code CLI not found.\n\n\
             Install it with:\n  npm install -g @anthropic-ai/claude-code\n\n\
             Then authenticate with your subscription:\n  claude login"
        )),
        Err(err) => Err(err).context("run claude --version"),
    }
}

/// Ask the agent CLI for a kebab-case project name derived from `description`.
///
/// Falls back to a fixed default when the suggestion is unusable; never fails
/// the run over a cosmetic name.
pub fn suggest_project_name(description: &str, timeout: Duration) -> Result<String> {
    let prompt = format!(
        "Generate a kebab-case project name for: \"{description}\"\n\n\
         Rules:\n\
         - Lowercase and hyphens only\n\
         - 1-2 words, max 15 chars\n\
         - Output ONLY the name\n\n\
         Examples: notes-app, todo, budget-track"
    );

    let mut cmd = Command::new("claude");
    cmd.arg("--print")
        .arg("-p")
        .arg(&prompt)
        .arg("--model")
        .arg(NAME_SUGGESTION_MODEL);

    let output = run_command_with_timeout(cmd, timeout, 10_000, &mut |_| {})
        .context("run claude cli for name suggestion")?;
    let raw = String::from_utf8_lossy(&output.stdout);
    Ok(sanitize_project_name(&raw))
}

static NON_KEBAB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9-]").expect("static pattern"));
static DASH_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("static pattern"));

/// Reduce a model-suggested name to a safe kebab-case directory name.
pub fn sanitize_project_name(raw: &str) -> String {
    let first_line = raw.trim().lines().next().unwrap_or("").trim().to_lowercase();
    let cleaned = NON_KEBAB.replace_all(&first_line, "");
    let collapsed = DASH_RUNS.replace_all(&cleaned, "-");
    let trimmed = collapsed.trim_matches('-');
    if trimmed.is_empty() {
        return "my-app".to_string();
    }
    trimmed.chars().take(15).collect::<String>().trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_clean_names() {
        assert_eq!(sanitize_project_name("notes-app\n"), "notes-app");
    }

    #[test]
    fn sanitize_strips_noise_and_collapses_dashes() {
        assert_eq!(sanitize_project_name("  My Cool--App!  "), "mycool-app");
        assert_eq!(sanitize_project_name("Sure! here\nnotes-app"), "surehere");
    }

    #[test]
    fn sanitize_truncates_and_falls_back() {
        assert_eq!(
            sanitize_project_name("a-very-long-project-name-indeed"),
            "a-very-long-pro"
        );
        assert_eq!(sanitize_project_name("!!!"), "my-app");
        assert_eq!(sanitize_project_name(""), "my-app");
    }
}
