//! Pure, deterministic logic: checklist model, integrity rules, progress math.
//!
//! Nothing in this module performs I/O. Everything is testable with plain
//! in-memory values, which is what keeps the safety-critical diff rules easy
//! to exercise exhaustively.

pub mod checklist;
pub mod integrity;
pub mod progress;
pub mod types;
