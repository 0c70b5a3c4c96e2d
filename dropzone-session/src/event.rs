use std::{
    collections::BTreeMap,
    fmt,
    rc::Rc,
    sync::atomic::{AtomicU32, Ordering},
};

use cgmath::Point2;

use crate::effect::DropEffect;

/// Opaque window handle, looked up through a [`WindowResolver`](crate::WindowResolver).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u32);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// Identifier of a pointer device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(pub u32);

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pointer#{}", self.0)
    }
}

/// Stamp put on every dispatch that expects an acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Serial(u32);

static SERIAL_COUNTER: AtomicU32 = AtomicU32::new(1);

impl Serial {
    pub(crate) fn next() -> Serial {
        Serial(SERIAL_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
impl From<u32> for Serial {
    fn from(value: u32) -> Self {
        Serial(value)
    }
}

impl From<Serial> for u32 {
    fn from(serial: Serial) -> Self {
        serial.0
    }
}

bitflags::bitflags! {
    /// Modifier keys and pointer buttons held when a pointer event was generated.
    pub struct KeyState: u32 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const LOGO = 1 << 3;
        const BUTTON_LEFT = 1 << 8;
        const BUTTON_MIDDLE = 1 << 9;
        const BUTTON_RIGHT = 1 << 10;
    }
}

/// The data being dragged, keyed by type identifier (usually a mime type).
///
/// Fixed when the session starts. Clones share the same storage, so handing the
/// payload to every target never copies the blobs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Payload(Rc<BTreeMap<String, Vec<u8>>>);

impl Payload {
    pub fn new(data: BTreeMap<String, Vec<u8>>) -> Self {
        Self(Rc::new(data))
    }

    pub fn get(&self, type_id: &str) -> Option<&[u8]> {
        self.0.get(type_id).map(Vec::as_slice)
    }

    pub fn type_ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `true` if both handles point at the same storage.
    pub fn ptr_eq(&self, other: &Payload) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<u8>)> for Payload {
    fn from_iter<T: IntoIterator<Item = (K, Vec<u8>)>>(iter: T) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.0
                    .iter()
                    .map(|(type_id, data)| (type_id, format!("{} bytes", data.len()))),
            )
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    Motion,
    Press,
    Release,
}

/// Pointer input fed into a session by the platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pointer_id: PointerId,
    pub kind: PointerEventKind,
    pub key_state: KeyState,
    /// Pointer position in global coordinates.
    pub offset: Point2<f64>,
}

impl PointerEvent {
    pub fn new(pointer_id: PointerId, kind: PointerEventKind, offset: Point2<f64>) -> Self {
        Self {
            pointer_id,
            kind,
            key_state: KeyState::empty(),
            offset,
        }
    }

    pub fn with_key_state(mut self, key_state: KeyState) -> Self {
        self.key_state = key_state;
        self
    }
}

/// Kinds of protocol events a target window can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Start,
    Enter,
    Over,
    Leave,
    Drop,
    Done,
}

impl EventKind {
    /// Whether the target must answer this event.
    pub fn expects_ack(self) -> bool {
        matches!(self, EventKind::Enter | EventKind::Over | EventKind::Drop)
    }
}

/// State carried by `Enter`, `Over` and `Drop`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragUpdate {
    pub key_state: KeyState,
    pub offset: Point2<f64>,
    /// Effects the source allows.
    pub offered: DropEffect,
}

/// Single use acknowledgment handed to a target with every `Enter`, `Over` and `Drop`.
///
/// The target answers by calling [`DropAck::complete`] once and routing the returned
/// [`Acknowledgement`] back to the session, usually through the host event loop.
/// Completing a token whose window or session is gone is harmless, the session
/// ignores it.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "the window receives no further events until the ack is completed"]
pub struct DropAck {
    window: WindowId,
    serial: Serial,
    kind: EventKind,
}

impl DropAck {
    pub(crate) fn new(window: WindowId, serial: Serial, kind: EventKind) -> Self {
        Self {
            window,
            serial,
            kind,
        }
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    pub fn serial(&self) -> Serial {
        self.serial
    }

    /// The event being acknowledged.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn complete(self, effects: DropEffect) -> Acknowledgement {
        Acknowledgement {
            window: self.window,
            serial: self.serial,
            effects,
        }
    }
}

/// Answer of a target window to one of its events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acknowledgement {
    pub window: WindowId,
    pub serial: Serial,
    /// Effects the target would perform, possibly empty.
    pub effects: DropEffect,
}
