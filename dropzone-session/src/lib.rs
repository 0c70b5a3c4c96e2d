//! Drag-and-drop session coordinator for a display server.
//!
//! A [`DragSession`] mediates one drag between a source window, the target
//! windows the pointer travels over and the pointer driving the gesture. The
//! display server plugs in through the [`DragHost`] traits: it resolves windows,
//! hands out each window's [`TargetConnection`], and hears about cursor changes
//! and the final outcome.
//!
//! Sessions are single threaded and never wait for a window. Acknowledgments
//! are routed back from the host event loop.

pub mod effect;
pub mod error;
pub mod event;
pub mod host;
mod queue;
pub mod session;

pub use effect::{CursorHint, DropEffect};
pub use error::StartError;
pub use event::{
    Acknowledgement, DragUpdate, DropAck, EventKind, KeyState, Payload, PointerEvent,
    PointerEventKind, PointerId, Serial, WindowId,
};
pub use host::{CursorObserver, DragHost, SourceNotifier, TargetConnection, WindowResolver};
pub use session::{DragOutcome, DragParams, DragSession};
