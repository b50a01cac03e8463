//! Dispatcher guarantees through the public API

use std::time::Duration;

use aacbridge::core::errors::DispatchError;
use aacbridge::dispatch::{Dispatcher, Marker, MarkerHandler};
use async_trait::async_trait;
use tempfile::TempDir;

#[derive(Default)]
struct Counting {
    handled: Vec<Marker>,
    reported: Vec<String>,
    panic_on: Option<Marker>,
}

#[async_trait(?Send)]
impl MarkerHandler for Counting {
    async fn handle(&mut self, marker: Marker) -> Result<(), DispatchError> {
        self.handled.push(marker);
        if self.panic_on == Some(marker) {
            panic!("handler blew up");
        }
        Ok(())
    }

    async fn report(&mut self, marker: Marker, error: &DispatchError) {
        self.reported.push(format!("{marker}: {error}"));
    }
}

fn touch(d: &Dispatcher<Counting>, marker: Marker) {
    std::fs::write(marker.path_in(d.comm_dir()), b"").unwrap();
}

#[tokio::test]
async fn test_each_marker_is_handled_at_most_once() {
    let temp = TempDir::new().unwrap();
    let mut d = Dispatcher::new(temp.path(), Duration::from_millis(1), Counting::default()).unwrap();

    for marker in Marker::ALL.iter().rev() {
        touch(&d, *marker);
    }
    while d.poll_once().await.is_some() {}

    assert_eq!(d.handler().handled, Marker::ALL.to_vec());
}

#[tokio::test]
async fn test_missing_comm_dir_is_created() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("a").join("b");
    let d = Dispatcher::new(&dir, Duration::from_millis(1), Counting::default()).unwrap();
    assert!(dir.is_dir());
    assert_eq!(d.pending(), None);
}

#[tokio::test]
async fn test_panicking_handler_is_reported_and_loop_continues() {
    let temp = TempDir::new().unwrap();
    let handler = Counting {
        panic_on: Some(Marker::SaveChat),
        ..Default::default()
    };
    let mut d = Dispatcher::new(temp.path(), Duration::from_millis(1), handler).unwrap();
    touch(&d, Marker::SaveChat);
    touch(&d, Marker::ListChats);

    assert_eq!(d.poll_once().await, Some(Marker::SaveChat));
    assert!(!Marker::SaveChat.path_in(temp.path()).exists());
    assert_eq!(d.poll_once().await, Some(Marker::ListChats));
    assert_eq!(d.poll_once().await, None);

    assert_eq!(d.handler().handled, vec![Marker::SaveChat, Marker::ListChats]);
    assert_eq!(d.handler().reported.len(), 1);
    assert!(d.handler().reported[0].contains("handler blew up"));
}
