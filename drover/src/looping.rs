//! The session-loop controller.
//!
//! Drives the external agent through sessions until the checklist is
//! complete, a configured session ceiling is hit, or the operator stops the
//! run. Between the before/after snapshots of every session the checklist
//! file belongs to the agent; the controller validates the mutation after
//! the fact and restores the last known-good snapshot when the agent broke
//! the rules.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::core::checklist::Checklist;
use crate::core::integrity::{self, IntegrityViolation};
use crate::core::progress::{self, ProgressReport};
use crate::core::types::{SessionKind, SessionStatus};
use crate::io::DroverPaths;
use crate::io::checklist_store::ChecklistStore;
use crate::io::interrupt::StopPrompt;
use crate::io::invoker::AgentInvoker;
use crate::io::prompt::PromptSet;
use crate::io::spec_seed::{seed_app_spec, seed_enhancement_spec};
use crate::session::{SessionOutcome, SessionRequest, run_session};

/// Reason why `run_loop` stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every checklist record passes.
    Complete,
    /// The configured session ceiling was reached.
    MaxSessionsReached,
    /// The operator pressed a key during the wait window.
    UserStopped,
}

/// Summary of a loop invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    pub sessions_executed: u32,
    pub stop: StopReason,
    pub elapsed: Duration,
}

/// Inputs that shape one controller invocation.
#[derive(Debug, Clone)]
pub struct LoopOptions {
    /// Stop after this many sessions; `None` runs until completion.
    pub max_sessions: Option<u32>,
    /// Wall-clock budget per session.
    pub session_timeout: Duration,
    /// Interruptible-wait window between sessions; zero skips the wait.
    pub pause: Duration,
    /// The project pre-exists and was not created by this tool.
    pub adoption: bool,
    /// Spec text seeded (once) before the first initializer session.
    pub spec_seed: Option<String>,
    /// Enhancement spec text; presence requests one enhancement-initializer
    /// session even when a checklist already exists.
    pub enhancement_seed: Option<String>,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            max_sessions: None,
            session_timeout: Duration::from_secs(30 * 60),
            pause: Duration::ZERO,
            adoption: false,
            spec_seed: None,
            enhancement_seed: None,
        }
    }
}

/// Structured observations emitted while the loop runs.
///
/// The controller never prints; the caller renders these however it likes.
#[derive(Debug, Clone)]
pub enum LoopEvent {
    SpecSeeded {
        path: PathBuf,
    },
    SessionStarting {
        session: u32,
        kind: SessionKind,
    },
    SessionFinished {
        session: u32,
        kind: SessionKind,
        outcome: SessionOutcome,
    },
    IntegrityViolation {
        kind: SessionKind,
        violations: Vec<IntegrityViolation>,
        restored: bool,
    },
    Progress(ProgressReport),
    WaitingForStop {
        window: Duration,
    },
}

/// Session-kind state machine. Initializer modes fire at most once per
/// process lifetime, then permanently fall through to `Coding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    EnhancementInit,
    Init,
    AdoptionInit,
    Coding,
}

impl Mode {
    fn session_kind(self) -> SessionKind {
        match self {
            Mode::EnhancementInit => SessionKind::EnhancementInitializer,
            Mode::Init => SessionKind::Initializer,
            Mode::AdoptionInit => SessionKind::AdoptionInitializer,
            Mode::Coding => SessionKind::Coding,
        }
    }
}

/// Run sessions until the checklist completes, the ceiling is reached, or
/// the operator stops the run.
///
/// Session timeouts and invocation errors are reported through `on_event`
/// and the loop proceeds to the next iteration; persistent failures surface
/// as repeated error reports rather than termination.
pub fn run_loop<I, S, F>(
    project_dir: &Path,
    invoker: &I,
    stop_prompt: &S,
    prompts: &PromptSet,
    options: &LoopOptions,
    mut on_event: F,
) -> Result<LoopOutcome>
where
    I: AgentInvoker,
    S: StopPrompt,
    F: FnMut(&LoopEvent),
{
    let run_start = Instant::now();
    let paths = DroverPaths::new(project_dir);
    let store = ChecklistStore::new(project_dir);

    let mut mode = initial_mode(project_dir, &store, options, &mut on_event)?;
    let mut sessions_executed = 0u32;

    loop {
        let before = store.load().context("snapshot checklist before session")?;

        // The completion gate only applies once the mode has fallen through
        // to coding: a pending initializer exists to create or extend the
        // checklist, so it always gets its one session first.
        if mode == Mode::Coding && before.checklist.is_complete() {
            return Ok(LoopOutcome {
                sessions_executed,
                stop: StopReason::Complete,
                elapsed: run_start.elapsed(),
            });
        }

        if let Some(max) = options.max_sessions
            && sessions_executed >= max
        {
            info!(max_sessions = max, "session ceiling reached");
            return Ok(LoopOutcome {
                sessions_executed,
                stop: StopReason::MaxSessionsReached,
                elapsed: run_start.elapsed(),
            });
        }

        let kind = mode.session_kind();
        let session = sessions_executed + 1;
        on_event(&LoopEvent::SessionStarting { session, kind });

        let prompt = prompts.prompt_for(kind)?;
        let outcome = run_session(
            invoker,
            &paths.sessions_dir,
            &SessionRequest {
                project_dir: project_dir.to_path_buf(),
                kind,
                prompt,
                timeout: options.session_timeout,
            },
        )?;
        sessions_executed = session;
        mode = Mode::Coding;

        if outcome.status != SessionStatus::Continue {
            warn!(kind = %kind, status = %outcome.status, "session failed, continuing next iteration");
        }
        on_event(&LoopEvent::SessionFinished {
            session,
            kind,
            outcome: outcome.clone(),
        });

        let mut after = store.load().context("snapshot checklist after session")?;
        let violations = integrity::diff(&before.checklist, &after.checklist);
        if !violations.is_empty() {
            let restored = before.checklist.is_present();
            warn!(
                kind = %kind,
                violations = %violations
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
                restored,
                "checklist integrity violation"
            );
            if restored {
                store
                    .restore(&before)
                    .context("restore checklist after integrity violation")?;
                // Downstream reporting sees the restored state, not the
                // agent's invalid mutation.
                after = before.clone();
            }
            on_event(&LoopEvent::IntegrityViolation {
                kind,
                violations,
                restored,
            });
        }

        let report = progress::report(&after.checklist, &before.checklist);
        on_event(&LoopEvent::Progress(report));

        if !options.pause.is_zero() {
            on_event(&LoopEvent::WaitingForStop {
                window: options.pause,
            });
            if stop_prompt
                .wait_for_stop(options.pause)
                .context("wait for operator stop")?
            {
                info!("operator requested stop");
                return Ok(LoopOutcome {
                    sessions_executed,
                    stop: StopReason::UserStopped,
                    elapsed: run_start.elapsed(),
                });
            }
        }
    }
}

/// Pick the entry mode and seed spec artifacts as needed.
fn initial_mode<F: FnMut(&LoopEvent)>(
    project_dir: &Path,
    store: &ChecklistStore,
    options: &LoopOptions,
    on_event: &mut F,
) -> Result<Mode> {
    if let Some(spec) = options.enhancement_seed.as_deref() {
        if let Some(path) = seed_enhancement_spec(project_dir, spec)? {
            on_event(&LoopEvent::SpecSeeded { path });
        }
        return Ok(Mode::EnhancementInit);
    }

    let snapshot = store.load().context("load checklist at entry")?;
    if snapshot.checklist.is_present() {
        return Ok(Mode::Coding);
    }

    // No usable checklist: an initializer will create one. A corrupt file is
    // treated like an absent one here.
    if matches!(snapshot.checklist, Checklist::Corrupt) {
        warn!(path = %store.path().display(), "existing checklist is corrupt, re-initializing");
    }
    if let Some(spec) = options.spec_seed.as_deref()
        && let Some(path) = seed_app_spec(project_dir, spec)?
    {
        on_event(&LoopEvent::SpecSeeded { path });
    }
    if options.adoption {
        Ok(Mode::AdoptionInit)
    } else {
        Ok(Mode::Init)
    }
}
