//! Test-only scripted collaborators and checklist builders.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Result, anyhow};

use crate::core::checklist::Feature;
use crate::io::checklist_store::FEATURE_LIST_FILE;
use crate::io::interrupt::StopPrompt;
use crate::io::invoker::{AgentInvoker, InvokeOutput, InvokeRequest};

/// Create a deterministic feature record.
pub fn feature(name: &str, passes: bool) -> Feature {
    Feature {
        name: name.to_string(),
        description: format!("{name} behaves as specified"),
        passes,
    }
}

/// Serialize features the way the agent would write them.
pub fn checklist_json(features: &[Feature]) -> String {
    let mut buf = serde_json::to_string_pretty(features).expect("serialize checklist");
    buf.push('\n');
    buf
}

/// Write a checklist file into a project directory.
pub fn write_checklist(project_dir: &Path, features: &[Feature]) -> Result<()> {
    fs::write(
        project_dir.join(FEATURE_LIST_FILE),
        checklist_json(features),
    )?;
    Ok(())
}

/// What a scripted invocation does to the checklist file before returning,
/// simulating the external agent's writes.
#[derive(Debug, Clone)]
pub enum ChecklistEffect {
    None,
    Write(String),
    Delete,
}

/// How a scripted invocation resolves.
#[derive(Debug, Clone)]
pub enum ScriptedResult {
    Output { stdout: String, stderr: String },
    TimedOut,
    Fail(String),
}

/// One queued scripted invocation.
#[derive(Debug, Clone)]
pub struct ScriptedInvoke {
    pub result: ScriptedResult,
    pub effect: ChecklistEffect,
}

/// Invoker double that replays a fixed script instead of spawning processes.
pub struct ScriptedInvoker {
    script: RefCell<VecDeque<ScriptedInvoke>>,
}

impl ScriptedInvoker {
    pub fn new(script: Vec<ScriptedInvoke>) -> Self {
        Self {
            script: RefCell::new(script.into()),
        }
    }

    /// Fails if queued invocations were never consumed.
    pub fn assert_drained(&self) -> Result<()> {
        let remaining = self.script.borrow().len();
        if remaining > 0 {
            return Err(anyhow!("{remaining} scripted invocations left unconsumed"));
        }
        Ok(())
    }
}

impl AgentInvoker for ScriptedInvoker {
    fn invoke(&self, request: &InvokeRequest) -> Result<InvokeOutput> {
        let next = self
            .script
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("scripted invoker exhausted"))?;

        let checklist_path = request.project_dir.join(FEATURE_LIST_FILE);
        match next.effect {
            ChecklistEffect::None => {}
            ChecklistEffect::Write(raw) => fs::write(&checklist_path, raw)?,
            ChecklistEffect::Delete => {
                if checklist_path.exists() {
                    fs::remove_file(&checklist_path)?;
                }
            }
        }

        match next.result {
            ScriptedResult::Output { stdout, stderr } => Ok(InvokeOutput {
                stdout,
                stderr,
                timed_out: false,
            }),
            ScriptedResult::TimedOut => Ok(InvokeOutput {
                stdout: String::new(),
                stderr: String::new(),
                timed_out: true,
            }),
            ScriptedResult::Fail(message) => Err(anyhow!(message)),
        }
    }
}

/// Stop-prompt double that replays fixed answers; drained queues answer no.
pub struct ScriptedStopPrompt {
    answers: RefCell<VecDeque<bool>>,
}

impl ScriptedStopPrompt {
    pub fn new(answers: Vec<bool>) -> Self {
        Self {
            answers: RefCell::new(answers.into()),
        }
    }

    /// A prompt that never requests a stop.
    pub fn never() -> Self {
        Self::new(Vec::new())
    }
}

impl StopPrompt for ScriptedStopPrompt {
    fn wait_for_stop(&self, _timeout: Duration) -> Result<bool> {
        Ok(self.answers.borrow_mut().pop_front().unwrap_or(false))
    }
}
