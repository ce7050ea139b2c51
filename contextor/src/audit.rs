//! Append-only JSONL audit trail of answers.

use std::path::{Path, PathBuf};

use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::Mutex};
use tracing::{debug, warn};

use crate::api_types::AnswerRecord;
use crate::error::ContextorError;

/// One [`AnswerRecord`] per line. Appends are serialized through a mutex.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, record: &AnswerRecord) -> Result<(), ContextorError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        debug!(path = ?self.path, "audit record appended");
        Ok(())
    }

    /// Like [`append`](Self::append) but only logs failures.
    pub async fn record(&self, record: &AnswerRecord) {
        if let Err(e) = self.append(record).await {
            warn!(path = ?self.path, error = %e, "audit append failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(q: &str) -> AnswerRecord {
        AnswerRecord {
            question: q.into(),
            context_keys: vec!["r1#0".into()],
            answer: "ok".into(),
            grounding_note: None,
            advice: None,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("audit.jsonl"));
        log.append(&record("first")).await.unwrap();
        log.append(&record("second")).await.unwrap();

        let body = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        let v: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(v["question"], "second");
        assert_eq!(v["context_keys"][0], "r1#0");
    }

    #[tokio::test]
    async fn record_swallows_failures() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending.
        let log = AuditLog::new(dir.path());
        log.record(&record("q")).await;
        assert!(log.append(&record("q")).await.is_err());
    }
}
