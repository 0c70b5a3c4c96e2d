use cgmath::Point2;

use crate::event::{EventKind, KeyState, Serial};

/// Pointer state captured when an event was queued.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Motion {
    pub key_state: KeyState,
    pub offset: Point2<f64>,
}

/// Events that travel through a [`WindowQueue`].
///
/// `Start` and `Done` never wait behind other events, so they are not queued.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum QueuedEvent {
    Enter(Motion),
    Over(Motion),
    Leave,
    Drop(Motion),
}

impl QueuedEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            QueuedEvent::Enter(_) => EventKind::Enter,
            QueuedEvent::Over(_) => EventKind::Over,
            QueuedEvent::Leave => EventKind::Leave,
            QueuedEvent::Drop(_) => EventKind::Drop,
        }
    }

    /// Merge a newly queued event into the one still waiting to be sent.
    fn coalesce(pending: QueuedEvent, incoming: QueuedEvent) -> QueuedEvent {
        use QueuedEvent::*;

        match (pending, incoming) {
            // A queued drop is final.
            (Drop(motion), _) => Drop(motion),
            (_, Leave) => Leave,
            (_, Drop(motion)) => Drop(motion),
            // The window has not been told about the enter yet.
            (Enter(_), Enter(motion)) | (Enter(_), Over(motion)) => Enter(motion),
            // The leave was never sent, from the window's view the pointer never left.
            (Leave, Enter(motion)) | (Leave, Over(motion)) => Over(motion),
            (Over(_), Enter(motion)) => Enter(motion),
            (Over(_), Over(motion)) => Over(motion),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InFlight {
    pub kind: EventKind,
    pub serial: Serial,
}

/// Outbox of one window: at most one event waiting for its ack, at most one waiting to be sent.
#[derive(Debug, Default)]
pub(crate) struct WindowQueue {
    in_flight: Option<InFlight>,
    pending: Option<QueuedEvent>,
}

impl WindowQueue {
    pub fn push(&mut self, event: QueuedEvent) {
        self.pending = Some(match self.pending.take() {
            Some(pending) => QueuedEvent::coalesce(pending, event),
            None => event,
        });
    }

    /// Takes the pending event if the window is free to receive it.
    pub fn next_to_send(&mut self) -> Option<QueuedEvent> {
        if self.in_flight.is_some() {
            None
        } else {
            self.pending.take()
        }
    }

    pub fn mark_in_flight(&mut self, kind: EventKind, serial: Serial) {
        debug_assert!(self.in_flight.is_none());
        debug_assert!(kind.expects_ack());
        self.in_flight = Some(InFlight { kind, serial });
    }

    /// Clears the in-flight event.
    ///
    /// With a `serial`, only an in-flight event carrying that serial is cleared.
    pub fn acknowledge(&mut self, serial: Option<Serial>) -> Option<InFlight> {
        match (self.in_flight, serial) {
            (Some(in_flight), Some(serial)) if in_flight.serial != serial => None,
            _ => self.in_flight.take(),
        }
    }

    pub fn in_flight(&self) -> Option<InFlight> {
        self.in_flight
    }

    pub fn pending(&self) -> Option<&QueuedEvent> {
        self.pending.as_ref()
    }

    /// Whether a `Drop` is waiting to be sent or waiting for its answer.
    pub fn holds_drop(&self) -> bool {
        matches!(self.pending, Some(QueuedEvent::Drop(_)))
            || matches!(self.in_flight, Some(InFlight { kind: EventKind::Drop, .. }))
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.pending.is_none()
    }
}
