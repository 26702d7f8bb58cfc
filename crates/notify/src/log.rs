use std::{
    fs::OpenOptions,
    io::Write,
    path::PathBuf,
};

use {
    async_trait::async_trait,
    chrono::{DateTime, Local},
    fd_lock::RwLock,
};

use crate::error::{Error, Result};

/// How a single segment send ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendResult {
    /// The API accepted the message.
    Sent { message_id: i64 },
    /// The API answered `ok: false`.
    Rejected { error_code: i64, description: String },
    /// The call never produced a decodable response (network error,
    /// malformed body).
    Transport { description: String },
}

impl SendResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

/// Per-segment dispatch outcome, created right after each remote call returns.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub timestamp: DateTime<Local>,
    pub destination: String,
    /// Segment content length in Unicode code points.
    pub len: usize,
    pub result: SendResult,
}

impl DispatchOutcome {
    /// Render the log line: `<timestamp> <destination> <length>` followed by
    /// the message id on success or `<error_code> <description>` on failure.
    /// Transport failures carry error code 0.
    #[must_use]
    pub fn log_line(&self) -> String {
        let head = format!(
            "{} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.destination,
            self.len
        );
        match &self.result {
            SendResult::Sent { message_id } => format!("{head} {message_id}"),
            SendResult::Rejected {
                error_code,
                description,
            } => format!("{head} {error_code} {description}"),
            SendResult::Transport { description } => format!("{head} 0 {description}"),
        }
    }
}

/// Append-only sink for dispatch outcomes.
#[async_trait]
pub trait DispatchLog: Send + Sync {
    /// Append one outcome; `full_text` carries the segment text when
    /// full-text logging is on.
    async fn record(&self, outcome: &DispatchOutcome, full_text: Option<&str>) -> Result<()>;
}

/// Plain-text log file. Each append takes an exclusive write lock so lines
/// from concurrent dispatches never interleave.
pub struct FileDispatchLog {
    path: PathBuf,
}

impl FileDispatchLog {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl DispatchLog for FileDispatchLog {
    async fn record(&self, outcome: &DispatchOutcome, full_text: Option<&str>) -> Result<()> {
        let path = self.path.clone();
        let mut entry = outcome.log_line();
        entry.push('\n');
        if let Some(text) = full_text {
            entry.push_str(text);
            entry.push('\n');
        }

        tokio::task::spawn_blocking(move || -> Result<()> {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            let mut lock = RwLock::new(file);
            let mut guard = lock.write()?;
            guard.write_all(entry.as_bytes())?;
            Ok(())
        })
        .await
        .map_err(|source| Error::external("dispatch log task panicked", source))?
    }
}
