//! User-facing progress reporting.
//!
//! Steps announce what they are doing through [`Ui`] rather than writing to the
//! terminal directly, so tests can capture the messages and the binary can
//! route them to stdout and stderr.

use std::io::{self, Write};

/// Sink for progress and error messages shown to the operator.
pub trait Ui: Send + Sync {
    /// Reports progress.
    fn say(&self, message: &str);

    /// Reports a failure the operator needs to act on.
    fn error(&self, message: &str);
}

/// [`Ui`] that writes progress to stdout and errors to stderr.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleUi;

impl Ui for ConsoleUi {
    fn say(&self, message: &str) {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "==> {message}").ok();
    }

    fn error(&self, message: &str) {
        let mut stderr = io::stderr().lock();
        writeln!(stderr, "error: {message}").ok();
    }
}
