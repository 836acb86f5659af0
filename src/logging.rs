//! Iteration-scoped capture of program output.
//!
//! During an iteration the program under test writes through an
//! [`IterationLog`] threaded into every actor context, so its output never
//! interleaves with engine diagnostics (which go through `tracing`). The
//! log is owned by the iteration's runtime and extracted into the outcome
//! on every exit path (success, bug, timeout, or fault), so nothing global
//! is swapped and nothing needs restoring.
//!
//! Test binaries can call [`init_test_logging`] once to route engine
//! diagnostics through a `tracing` subscriber.

use std::sync::Once;

/// Buffered textual output of one iteration of the program under test.
#[derive(Debug, Default, Clone)]
pub struct IterationLog {
    lines: Vec<String>,
}

impl IterationLog {
    /// Creates an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Appends one line of program output.
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Number of captured lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterates captured lines in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Consumes the log into a newline-joined string.
    #[must_use]
    pub fn into_text(self) -> String {
        self.lines.join("\n")
    }
}

static INIT_LOGGING: Once = Once::new();

/// Initializes a `tracing` subscriber for tests.
///
/// Safe to call multiple times; the first call wins.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .with_target(true)
            .with_ansi(false)
            .try_init();
    });
}
