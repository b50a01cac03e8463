//! Signal dispatch: marker files in, handlers out

mod backend;
mod dispatcher;
mod handlers;
pub mod markers;

pub use backend::{Backend, Channels, Services};
pub use dispatcher::{Dispatcher, StopHandle};
pub use markers::Marker;

use async_trait::async_trait;

use crate::core::errors::DispatchError;

/// Whatever the dispatcher invokes for a detected marker
///
/// Runs on the dispatcher's single execution unit, so implementations need
/// not be `Send`.
#[async_trait(?Send)]
pub trait MarkerHandler {
    async fn handle(&mut self, marker: Marker) -> Result<(), DispatchError>;

    /// Tell the user that `marker` failed
    async fn report(&mut self, marker: Marker, error: &DispatchError);

    /// Called once when the loop ends
    fn shutdown(&mut self) {}
}
