//! Session-loop controller for an external coding agent.
//!
//! This crate drives the Claude Code CLI through repeated bounded sessions
//! until a persisted feature checklist (`feature_list.json`) fully passes.
//! The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (checklist model, integrity
//!   diff, progress math). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (checklist store, process
//!   execution, terminal input). Isolated behind traits to enable scripted
//!   collaborators in tests.
//!
//! Orchestration modules ([`looping`], [`session`]) coordinate core logic
//! with I/O to implement the CLI commands.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod looping;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod ui;
