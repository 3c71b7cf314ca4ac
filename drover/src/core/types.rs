//! Shared deterministic types for drover core logic.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which prompt a session carries.
///
/// The three initializer kinds each fire at most once per process lifetime;
/// every later session is `Coding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionKind {
    Initializer,
    AdoptionInitializer,
    EnhancementInitializer,
    Coding,
}

impl SessionKind {
    /// Stable identifier used in session log file names and headers.
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKind::Initializer => "initializer",
            SessionKind::AdoptionInitializer => "adoption-initializer",
            SessionKind::EnhancementInitializer => "enhancement-initializer",
            SessionKind::Coding => "coding",
        }
    }

    pub fn is_initializer(self) -> bool {
        self != SessionKind::Coding
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a single agent invocation ended.
///
/// `Continue` means the invocation returned, regardless of what it printed.
/// Timeouts and errors are not fatal to the loop; the controller reports them
/// and moves on to the next session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Continue,
    Timeout,
    Error,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Continue => "continue",
            SessionStatus::Timeout => "timeout",
            SessionStatus::Error => "error",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&SessionKind::EnhancementInitializer).expect("serialize");
        assert_eq!(json, "\"enhancement-initializer\"");
    }

    #[test]
    fn coding_is_not_an_initializer() {
        assert!(SessionKind::Initializer.is_initializer());
        assert!(SessionKind::AdoptionInitializer.is_initializer());
        assert!(SessionKind::EnhancementInitializer.is_initializer());
        assert!(!SessionKind::Coding.is_initializer());
    }
}
