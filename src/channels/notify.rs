//! Pings the input device after a clipboard write so it reloads the text

use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub trait Notifier {
    fn notify(&self);
}

#[derive(Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self) {}
}

/// Runs a configured command, e.g. a key-press injector
pub struct CommandNotifier {
    argv: Vec<String>,
}

impl CommandNotifier {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }
}

impl Notifier for CommandNotifier {
    fn notify(&self) {
        let Some((program, args)) = self.argv.split_first() else {
            return;
        };
        match Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
        {
            Ok(status) if status.success() => tracing::debug!("Notified input device"),
            Ok(status) => tracing::warn!("Notify command {} exited with {}", program, status),
            Err(e) => tracing::error!("Failed to run notify command {}: {}", program, e),
        }
    }
}

/// Counts pings; clones share the counter
#[derive(Clone, Default)]
pub struct CountingNotifier {
    count: Arc<AtomicUsize>,
}

impl CountingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl Notifier for CountingNotifier {
    fn notify(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Notifier described by the `[notify]` config section
pub fn from_command(argv: &[String]) -> Box<dyn Notifier> {
    if argv.is_empty() {
        Box::new(NoopNotifier)
    } else {
        Box::new(CommandNotifier::new(argv.to_vec()))
    }
}
