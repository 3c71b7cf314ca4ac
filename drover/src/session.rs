//! Orchestration for a single agent session.
//!
//! One session = one bounded invocation of the external agent with a
//! specific prompt. Whatever happens — clean return, timeout, invocation
//! failure — exactly one session log artifact is written before this module
//! returns, so the audit trail never has gaps.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::core::types::{SessionKind, SessionStatus};
use crate::io::invoker::{AgentInvoker, InvokeRequest};
use crate::io::session_log::{SessionRecord, write_session_log};

/// Parameters for one session.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub project_dir: PathBuf,
    pub kind: SessionKind,
    pub prompt: String,
    pub timeout: Duration,
}

/// Result of one session.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub status: SessionStatus,
    pub output: String,
    pub error: String,
    pub duration: Duration,
}

/// Run one session and persist its log record.
///
/// Timeouts and invocation failures are mapped into the returned status, not
/// propagated: retry policy belongs to the loop controller. An `Err` from
/// this function means the log artifact itself could not be written, which is
/// a local filesystem failure the run must not paper over.
pub fn run_session<I: AgentInvoker>(
    invoker: &I,
    sessions_dir: &Path,
    request: &SessionRequest,
) -> Result<SessionOutcome> {
    let started_at = Utc::now();
    let start = Instant::now();
    let invoked = invoker.invoke(&InvokeRequest {
        project_dir: request.project_dir.clone(),
        prompt: request.prompt.clone(),
        timeout: request.timeout,
    });
    let duration = start.elapsed();

    let (status, output, error) = match invoked {
        Ok(out) if out.timed_out => {
            let mut error = format!(
                "agent invocation timed out after {}s",
                request.timeout.as_secs()
            );
            if !out.stderr.trim().is_empty() {
                error.push('\n');
                error.push_str(&out.stderr);
            }
            (SessionStatus::Timeout, out.stdout, error)
        }
        Ok(out) => (SessionStatus::Continue, out.stdout, out.stderr),
        Err(err) => (SessionStatus::Error, String::new(), format!("{err:#}")),
    };

    match status {
        SessionStatus::Continue => {
            info!(kind = %request.kind, secs = duration.as_secs(), "session returned");
        }
        SessionStatus::Timeout | SessionStatus::Error => {
            warn!(kind = %request.kind, status = %status, "session did not complete cleanly");
        }
    }

    let log_path = write_session_log(
        sessions_dir,
        &SessionRecord {
            kind: request.kind,
            started_at,
            duration,
            status,
            prompt: &request.prompt,
            output: &output,
            error: &error,
        },
    )
    .context("write session log")?;
    info!(log = %log_path.display(), "session log written");

    Ok(SessionOutcome {
        status,
        output,
        error,
        duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ChecklistEffect, ScriptedInvoke, ScriptedInvoker, ScriptedResult};
    use std::fs;

    fn request(temp: &tempfile::TempDir, kind: SessionKind) -> SessionRequest {
        SessionRequest {
            project_dir: temp.path().to_path_buf(),
            kind,
            prompt: "do the work".to_string(),
            timeout: Duration::from_secs(1),
        }
    }

    fn only_log(sessions_dir: &Path) -> PathBuf {
        let mut entries: Vec<_> = fs::read_dir(sessions_dir)
            .expect("read sessions dir")
            .map(|entry| entry.expect("entry").path())
            .collect();
        assert_eq!(entries.len(), 1, "expected exactly one log artifact");
        entries.remove(0)
    }

    #[test]
    fn clean_return_is_continue_and_logged() {
        let temp = tempfile::tempdir().expect("tempdir");
        let sessions_dir = temp.path().join("sessions");
        let invoker = ScriptedInvoker::new(vec![ScriptedInvoke {
            result: ScriptedResult::Output {
                stdout: "built the thing".to_string(),
                stderr: String::new(),
            },
            effect: ChecklistEffect::None,
        }]);

        let outcome = run_session(&invoker, &sessions_dir, &request(&temp, SessionKind::Coding))
            .expect("run");
        assert_eq!(outcome.status, SessionStatus::Continue);
        assert_eq!(outcome.output, "built the thing");

        let contents = fs::read_to_string(only_log(&sessions_dir)).expect("read log");
        assert!(contents.contains("status: continue"));
        assert!(contents.contains("built the thing"));
        invoker.assert_drained().expect("drained");
    }

    #[test]
    fn timeout_is_reported_and_log_names_the_budget() {
        let temp = tempfile::tempdir().expect("tempdir");
        let sessions_dir = temp.path().join("sessions");
        let invoker = ScriptedInvoker::new(vec![ScriptedInvoke {
            result: ScriptedResult::TimedOut,
            effect: ChecklistEffect::None,
        }]);

        let outcome = run_session(&invoker, &sessions_dir, &request(&temp, SessionKind::Coding))
            .expect("run");
        assert_eq!(outcome.status, SessionStatus::Timeout);
        assert!(outcome.error.contains("timed out after 1s"));

        let contents = fs::read_to_string(only_log(&sessions_dir)).expect("read log");
        assert!(contents.contains("status: timeout"));
        assert!(contents.contains("timed out after 1s"));
    }

    #[test]
    fn invocation_failure_is_error_not_err_and_still_logged() {
        let temp = tempfile::tempdir().expect("tempdir");
        let sessions_dir = temp.path().join("sessions");
        let invoker = ScriptedInvoker::new(vec![ScriptedInvoke {
            result: ScriptedResult::Fail("spawn failed".to_string()),
            effect: ChecklistEffect::None,
        }]);

        let outcome = run_session(
            &invoker,
            &sessions_dir,
            &request(&temp, SessionKind::Initializer),
        )
        .expect("run_session itself must not fail");
        assert_eq!(outcome.status, SessionStatus::Error);
        assert!(outcome.error.contains("spawn failed"));

        let contents = fs::read_to_string(only_log(&sessions_dir)).expect("read log");
        assert!(contents.contains("status: error"));
        assert!(contents.contains("spawn failed"));
    }
}
