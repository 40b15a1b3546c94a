//! Per-file processing attempts
//!
//! A [`ProcessingAttempt`] lives for one file within one poll cycle. It counts
//! pipeline runs against the attempt budget, remembers the last error and the
//! most recently observed remote size (for the settle heuristic), and is
//! dropped once the file is delivered or abandoned.

/// Retry bookkeeping for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingAttempt {
    file: String,
    attempt: u32,
    max_attempts: u32,
    last_error: Option<String>,
    observed_size: u64,
    settled: bool,
}

impl ProcessingAttempt {
    /// Starts bookkeeping for `file`, first observed with `observed_size` bytes
    pub fn new(file: impl Into<String>, observed_size: u64, max_attempts: u32) -> Self {
        Self {
            file: file.into(),
            attempt: 0,
            max_attempts,
            last_error: None,
            observed_size,
            settled: false,
        }
    }

    /// File name this attempt is for
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Number of pipeline runs started so far
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Attempt budget
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Runs left after the current one
    pub fn remaining(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempt)
    }

    /// Returns true if another pipeline run may start
    pub fn can_retry(&self) -> bool {
        self.attempt < self.max_attempts
    }

    /// Starts the next pipeline run, returning its 1-based number
    pub fn begin(&mut self) -> u32 {
        self.attempt += 1;
        self.attempt
    }

    /// Records the failure of the current run
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
    }

    /// Error message of the last failed run
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Records a fresh size observation
    ///
    /// Returns true if the size differs from the previous observation and no
    /// settle delay has been taken for this file yet. At most one settle delay
    /// is requested per file.
    pub fn observe_size(&mut self, size: u64) -> bool {
        let changed = size != self.observed_size;
        self.observed_size = size;
        if changed && !self.settled {
            self.settled = true;
            return true;
        }
        false
    }

    /// Most recently observed remote size
    pub fn observed_size(&self) -> u64 {
        self.observed_size
    }
}
