use crate::{
    effect::DropEffect,
    event::{DragUpdate, DropAck, Payload, WindowId},
};

/// Hierarchies deeper than this are treated as broken.
const MAX_ANCESTOR_DEPTH: usize = 64;

/// Protocol endpoint of one target window.
///
/// Every call is fire-and-forget: the connection must not block. Events carrying a
/// [`DropAck`] are answered later by completing the ack.
pub trait TargetConnection {
    /// Payload delivery, at most once per window and session.
    fn deliver_start(&mut self, window: WindowId, payload: &Payload);

    fn deliver_enter(&mut self, window: WindowId, update: DragUpdate, ack: DropAck);

    fn deliver_over(&mut self, window: WindowId, update: DragUpdate, ack: DropAck);

    fn deliver_leave(&mut self, window: WindowId);

    fn deliver_drop(&mut self, window: WindowId, update: DragUpdate, ack: DropAck);

    /// The session is over, the window can release the payload.
    fn deliver_done(&mut self, window: WindowId);
}

pub trait WindowResolver {
    /// The live window for `id`, or `None` if it is unknown or destroyed.
    fn resolve_window(&self, id: WindowId) -> Option<WindowId>;

    fn target_connection(&mut self, window: WindowId) -> Option<&mut dyn TargetConnection>;

    fn accepts_drops(&self, window: WindowId) -> bool;

    fn parent_of(&self, window: WindowId) -> Option<WindowId>;
}

pub trait SourceNotifier {
    /// Called exactly once per session.
    fn on_completed(&mut self, success: bool, action: Option<DropEffect>);
}

pub trait CursorObserver {
    /// The cursor hint changed, query it with [`DragSession::cursor_hint`](crate::DragSession::cursor_hint).
    fn on_cursor_hint_changed(&mut self) {}
}

/// Everything a session needs from the display server.
pub trait DragHost: WindowResolver + SourceNotifier + CursorObserver {}

impl<T> DragHost for T where T: WindowResolver + SourceNotifier + CursorObserver + ?Sized {}

/// Nearest window at or above `window` that accepts drops.
pub(crate) fn drop_target<R>(
    resolver: &R,
    window: Option<WindowId>,
    log: &slog::Logger,
) -> Option<WindowId>
where
    R: WindowResolver + ?Sized,
{
    let mut candidate = resolver.resolve_window(window?)?;

    for _ in 0..MAX_ANCESTOR_DEPTH {
        if resolver.accepts_drops(candidate) {
            return Some(candidate);
        }
        candidate = resolver.parent_of(candidate)?;
    }

    slog::warn!(log, "Window hierarchy too deep, ignoring window"; "window" => %candidate);
    None
}
