//! Session log artifacts under `.drover/sessions/`.
//!
//! One plain-text file per invocation, written on every outcome including
//! timeout and error so partial output and the failure reason survive for
//! debugging. The controller never reads these back; they are an audit trail.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::core::types::{SessionKind, SessionStatus};

/// Everything that goes into one session log artifact.
#[derive(Debug, Clone)]
pub struct SessionRecord<'a> {
    pub kind: SessionKind,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub status: SessionStatus,
    pub prompt: &'a str,
    pub output: &'a str,
    pub error: &'a str,
}

/// Write one session log artifact and return its path.
///
/// File names carry the creation timestamp and a session-kind suffix, e.g.
/// `20260807T153000.123Z-coding.log`. If two sessions land on the same
/// millisecond a numeric suffix keeps the artifacts distinct.
pub fn write_session_log(sessions_dir: &Path, record: &SessionRecord<'_>) -> Result<PathBuf> {
    fs::create_dir_all(sessions_dir)
        .with_context(|| format!("create session log dir {}", sessions_dir.display()))?;

    let path = unique_log_path(sessions_dir, record.kind, record.started_at);
    let contents = render_record(record);
    fs::write(&path, contents)
        .with_context(|| format!("write session log {}", path.display()))?;
    Ok(path)
}

fn unique_log_path(sessions_dir: &Path, kind: SessionKind, started_at: DateTime<Utc>) -> PathBuf {
    let stamp = started_at.format("%Y%m%dT%H%M%S%.3fZ");
    let base = format!("{stamp}-{kind}");
    let candidate = sessions_dir.join(format!("{base}.log"));
    if !candidate.exists() {
        return candidate;
    }
    for n in 2.. {
        let candidate = sessions_dir.join(format!("{base}-{n}.log"));
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!("counter space exhausted");
}

fn render_record(record: &SessionRecord<'_>) -> String {
    let mut buf = String::new();
    buf.push_str("=== session ===\n");
    buf.push_str(&format!("kind: {}\n", record.kind));
    buf.push_str(&format!(
        "started_at: {}\n",
        record.started_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    buf.push_str(&format!(
        "duration_secs: {:.1}\n",
        record.duration.as_secs_f64()
    ));
    buf.push_str(&format!("status: {}\n", record.status));
    buf.push_str("\n=== prompt ===\n");
    buf.push_str(record.prompt);
    ensure_trailing_newline(&mut buf);
    buf.push_str("\n=== output ===\n");
    buf.push_str(record.output);
    ensure_trailing_newline(&mut buf);
    if !record.error.is_empty() {
        buf.push_str("\n=== error ===\n");
        buf.push_str(record.error);
        ensure_trailing_newline(&mut buf);
    }
    buf
}

fn ensure_trailing_newline(buf: &mut String) {
    if !buf.ends_with('\n') {
        buf.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(kind: SessionKind, status: SessionStatus, error: &'static str) -> SessionRecord<'static> {
        SessionRecord {
            kind,
            started_at: Utc.with_ymd_and_hms(2026, 8, 7, 15, 30, 0).unwrap(),
            duration: Duration::from_secs_f64(93.4),
            status,
            prompt: "do the work",
            output: "did the work",
            error,
        }
    }

    #[test]
    fn writes_artifact_with_kind_suffix_and_sections_in_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write_session_log(temp.path(), &record(SessionKind::Coding, SessionStatus::Continue, ""))
            .expect("write");

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("-coding.log"), "got {name}");

        let contents = fs::read_to_string(&path).expect("read");
        let header = contents.find("=== session ===").expect("header");
        let prompt = contents.find("=== prompt ===").expect("prompt");
        let output = contents.find("=== output ===").expect("output");
        assert!(header < prompt && prompt < output);
        assert!(contents.contains("kind: coding"));
        assert!(contents.contains("status: continue"));
        assert!(contents.contains("duration_secs: 93.4"));
        assert!(!contents.contains("=== error ==="));
    }

    #[test]
    fn error_section_appears_when_error_text_present() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write_session_log(
            temp.path(),
            &record(SessionKind::Initializer, SessionStatus::Error, "boom"),
        )
        .expect("write");

        let contents = fs::read_to_string(&path).expect("read");
        assert!(contents.contains("=== error ===\nboom\n"));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("-initializer.log"));
    }

    #[test]
    fn same_millisecond_records_get_distinct_paths() {
        let temp = tempfile::tempdir().expect("tempdir");
        let rec = record(SessionKind::Coding, SessionStatus::Continue, "");
        let first = write_session_log(temp.path(), &rec).expect("first");
        let second = write_session_log(temp.path(), &rec).expect("second");
        assert_ne!(first, second);
        assert!(second.to_string_lossy().ends_with("-coding-2.log"));
    }
}
