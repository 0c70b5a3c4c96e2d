//! calloop glue for [`dropzone_session`].
//!
//! Target connections answer through an [`AckSender`]; the matching
//! [`AckChannel`] is inserted into the event loop and feeds every answer back
//! into the active [`DragSession`]. A [`DropWatchdog`] bounds how long a
//! released drag may wait for its drop target.

#[macro_use]
extern crate log;

mod ack;
mod watchdog;

pub use ack::{ack_channel, insert_ack_source, AckChannel, AckSender};
pub use watchdog::{arm_drop_watchdog, DropWatchdog, WatchdogConfig};

use dropzone_session::{DragHost, DragSession};

/// Implemented by the event loop shared data.
pub trait DragLoopState {
    type Host: DragHost;

    /// The drag in progress, if any, next to the host it talks to.
    fn drag_session(&mut self) -> (Option<&mut DragSession>, &mut Self::Host);
}

#[derive(thiserror::Error, Debug)]
pub enum LoopError {
    #[error("Failed to insert event source")]
    InsertSource(#[from] calloop::Error),
}
