//! Marker polling loop
//!
//! Each cycle scans markers in priority order, runs the handler of the first
//! one present, then removes that marker whatever the outcome. One marker per
//! cycle; the rest wait for the following cycles. A handler that fails or
//! panics is reported and the loop keeps going.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::markers::Marker;
use super::MarkerHandler;
use crate::core::errors::DispatchError;

/// Cooperative stop flag, safe to flip from a signal handler
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Removes a marker when dropped, on every exit path of a cycle
struct MarkerGuard<'a> {
    dir: &'a Path,
    marker: Marker,
}

impl Drop for MarkerGuard<'_> {
    fn drop(&mut self) {
        remove_marker(self.dir, self.marker);
    }
}

/// Delete `marker` from `dir`; already absent is fine
fn remove_marker(dir: &Path, marker: Marker) {
    let path = marker.path_in(dir);
    match std::fs::remove_file(&path) {
        Ok(()) => tracing::debug!("Removed marker {}", marker),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::error!("Failed to remove marker {}: {}", path.display(), e),
    }
}

pub struct Dispatcher<H> {
    comm_dir: PathBuf,
    poll_interval: Duration,
    handler: H,
    stop: StopHandle,
}

impl<H: MarkerHandler> Dispatcher<H> {
    /// Create a dispatcher watching `comm_dir`, creating it when missing
    pub fn new(
        comm_dir: impl Into<PathBuf>,
        poll_interval: Duration,
        handler: H,
    ) -> std::io::Result<Self> {
        let comm_dir = comm_dir.into();
        std::fs::create_dir_all(&comm_dir)?;
        Ok(Self {
            comm_dir,
            poll_interval,
            handler,
            stop: StopHandle::default(),
        })
    }

    pub fn comm_dir(&self) -> &Path {
        &self.comm_dir
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Handle that ends [`Dispatcher::run`] at the top of its next cycle
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Highest-priority marker currently present
    pub fn pending(&self) -> Option<Marker> {
        Marker::ALL
            .into_iter()
            .find(|m| m.path_in(&self.comm_dir).exists())
    }

    /// Remove every marker left over from a previous run; returns how many
    pub fn clear_all(&self) -> usize {
        let mut removed = 0;
        for marker in Marker::ALL {
            if marker.path_in(&self.comm_dir).exists() {
                remove_marker(&self.comm_dir, marker);
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::info!("Removed {} stale markers", removed);
        }
        removed
    }

    /// Run one cycle without sleeping; returns the marker handled, if any
    pub async fn poll_once(&mut self) -> Option<Marker> {
        let marker = self.pending()?;
        let _guard = MarkerGuard {
            dir: &self.comm_dir,
            marker,
        };

        tracing::info!("Handling marker {}", marker);
        match AssertUnwindSafe(self.handler.handle(marker))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self.handler.report(marker, &e).await,
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic".to_string()
                };
                tracing::error!("Handler for {} panicked: {}", marker, panic_msg);
                self.handler
                    .report(marker, &DispatchError::HandlerPanic(panic_msg))
                    .await;
            }
        }
        Some(marker)
    }

    /// Poll until stopped, then let the handler shut down
    pub async fn run(&mut self) {
        tracing::info!(
            "Watching {} every {:?}",
            self.comm_dir.display(),
            self.poll_interval
        );

        while !self.stop.is_stopped() {
            self.poll_once().await;
            tokio::time::sleep(self.poll_interval).await;
        }

        self.handler.shutdown();
        tracing::info!("Dispatcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        handled: Vec<Marker>,
        reported: Vec<Marker>,
        fail_on: Option<Marker>,
        panic_on: Option<Marker>,
        shut_down: bool,
    }

    #[async_trait(?Send)]
    impl MarkerHandler for Recorder {
        async fn handle(&mut self, marker: Marker) -> Result<(), DispatchError> {
            self.handled.push(marker);
            if self.fail_on == Some(marker) {
                return Err(DispatchError::Clipboard("unavailable".into()));
            }
            if self.panic_on == Some(marker) {
                panic!("handler blew up");
            }
            Ok(())
        }

        async fn report(&mut self, marker: Marker, _error: &DispatchError) {
            self.reported.push(marker);
        }

        fn shutdown(&mut self) {
            self.shut_down = true;
        }
    }

    fn touch(dir: &Path, marker: Marker) {
        std::fs::write(marker.path_in(dir), b"").unwrap();
    }

    fn dispatcher(temp: &TempDir, handler: Recorder) -> Dispatcher<Recorder> {
        Dispatcher::new(temp.path().join("comm"), Duration::from_millis(1), handler).unwrap()
    }

    #[tokio::test]
    async fn test_one_marker_per_cycle_in_priority_order() {
        let temp = TempDir::new().unwrap();
        let mut d = dispatcher(&temp, Recorder::default());
        touch(d.comm_dir(), Marker::ListChats);
        touch(d.comm_dir(), Marker::ModeChat);
        touch(d.comm_dir(), Marker::CleanHistory);

        assert_eq!(d.poll_once().await, Some(Marker::CleanHistory));
        assert_eq!(d.poll_once().await, Some(Marker::ModeChat));
        assert_eq!(d.poll_once().await, Some(Marker::ListChats));
        assert_eq!(d.poll_once().await, None);
        assert_eq!(
            d.handler().handled,
            vec![Marker::CleanHistory, Marker::ModeChat, Marker::ListChats]
        );
    }

    #[tokio::test]
    async fn test_failed_handler_is_reported_and_marker_removed() {
        let temp = TempDir::new().unwrap();
        let handler = Recorder {
            fail_on: Some(Marker::ReadArtifact),
            ..Default::default()
        };
        let mut d = dispatcher(&temp, handler);
        touch(d.comm_dir(), Marker::ReadArtifact);

        assert_eq!(d.poll_once().await, Some(Marker::ReadArtifact));
        assert!(!Marker::ReadArtifact.path_in(d.comm_dir()).exists());
        assert_eq!(d.handler().reported, vec![Marker::ReadArtifact]);
        assert_eq!(d.poll_once().await, None);
    }

    #[tokio::test]
    async fn test_run_survives_a_panicking_handler() {
        let temp = TempDir::new().unwrap();
        let handler = Recorder {
            panic_on: Some(Marker::Retry),
            ..Default::default()
        };
        let mut d = dispatcher(&temp, handler);
        touch(d.comm_dir(), Marker::Retry);
        touch(d.comm_dir(), Marker::ListChats);
        let stop = d.stop_handle();

        let comm = temp.path().join("comm");
        let stopper = async {
            while Marker::ListChats.path_in(&comm).exists() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            stop.stop();
        };
        tokio::join!(d.run(), stopper);

        let handler = d.into_handler();
        assert_eq!(handler.handled, vec![Marker::Retry, Marker::ListChats]);
        assert_eq!(handler.reported, vec![Marker::Retry]);
        assert!(handler.shut_down);
    }

    #[tokio::test]
    async fn test_clear_all_removes_stale_markers() {
        let temp = TempDir::new().unwrap();
        let d = dispatcher(&temp, Recorder::default());
        touch(d.comm_dir(), Marker::Retry);
        touch(d.comm_dir(), Marker::TtsStop);
        std::fs::write(d.comm_dir().join("unrelated.txt"), "keep").unwrap();

        assert_eq!(d.clear_all(), 2);
        assert_eq!(d.pending(), None);
        assert!(d.comm_dir().join("unrelated.txt").exists());
    }

    #[test]
    fn test_remove_marker_is_idempotent() {
        let temp = TempDir::new().unwrap();
        remove_marker(temp.path(), Marker::Retry);
        touch(temp.path(), Marker::Retry);
        remove_marker(temp.path(), Marker::Retry);
        remove_marker(temp.path(), Marker::Retry);
        assert!(!Marker::Retry.path_in(temp.path()).exists());
    }

    #[tokio::test]
    async fn test_run_exits_when_stopped_and_shuts_down() {
        let temp = TempDir::new().unwrap();
        let mut d = dispatcher(&temp, Recorder::default());
        touch(d.comm_dir(), Marker::SaveChat);
        d.stop();

        d.run().await;
        // Stop is checked before the first cycle
        assert!(d.handler().handled.is_empty());
        assert!(d.handler().shut_down);
    }

    #[tokio::test]
    async fn test_run_processes_until_stopped() {
        let temp = TempDir::new().unwrap();
        let mut d = dispatcher(&temp, Recorder::default());
        touch(d.comm_dir(), Marker::TtsPause);
        let stop = d.stop_handle();

        let stopper = async {
            while Marker::TtsPause.path_in(&temp.path().join("comm")).exists() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            stop.stop();
        };
        tokio::join!(d.run(), stopper);

        assert_eq!(d.into_handler().handled, vec![Marker::TtsPause]);
    }
}
