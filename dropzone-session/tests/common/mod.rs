#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};

use cgmath::Point2;
use dropzone_session::{
    CursorObserver, DragParams, DragSession, DragUpdate, DropAck, DropEffect, EventKind, Payload,
    PointerEvent, PointerEventKind, PointerId, SourceNotifier, TargetConnection, WindowId,
    WindowResolver,
};

pub const POINTER: PointerId = PointerId(1);
pub const SOURCE: WindowId = WindowId(1);

#[derive(Debug, Clone, PartialEq)]
pub struct Delivered {
    pub kind: EventKind,
    pub update: Option<DragUpdate>,
}

/// Target connection that records everything it is sent.
#[derive(Debug, Default)]
pub struct Recorder {
    pub delivered: Vec<Delivered>,
    pub payloads: Vec<Payload>,
    pub acks: VecDeque<DropAck>,
}

impl Recorder {
    fn record(&mut self, kind: EventKind, update: Option<DragUpdate>) {
        self.delivered.push(Delivered { kind, update });
    }
}

impl TargetConnection for Recorder {
    fn deliver_start(&mut self, _window: WindowId, payload: &Payload) {
        self.payloads.push(payload.clone());
        self.record(EventKind::Start, None);
    }

    fn deliver_enter(&mut self, _window: WindowId, update: DragUpdate, ack: DropAck) {
        self.record(EventKind::Enter, Some(update));
        self.acks.push_back(ack);
    }

    fn deliver_over(&mut self, _window: WindowId, update: DragUpdate, ack: DropAck) {
        self.record(EventKind::Over, Some(update));
        self.acks.push_back(ack);
    }

    fn deliver_leave(&mut self, _window: WindowId) {
        self.record(EventKind::Leave, None);
    }

    fn deliver_drop(&mut self, _window: WindowId, update: DragUpdate, ack: DropAck) {
        self.record(EventKind::Drop, Some(update));
        self.acks.push_back(ack);
    }

    fn deliver_done(&mut self, _window: WindowId) {
        self.record(EventKind::Done, None);
    }
}

#[derive(Debug)]
struct TestWindow {
    parent: Option<WindowId>,
    accepts_drops: bool,
    connected: bool,
    connection: Recorder,
}

/// Window tree plus recording collaborators.
#[derive(Debug, Default)]
pub struct TestHost {
    windows: BTreeMap<WindowId, TestWindow>,
    destroyed: BTreeMap<WindowId, TestWindow>,
    pub completions: Vec<(bool, Option<DropEffect>)>,
    pub cursor_changes: usize,
}

impl TestHost {
    /// A host with the source window and droppable windows 2 and 3.
    pub fn new() -> Self {
        Self::default()
            .with_window(1, None, false)
            .with_window(2, None, true)
            .with_window(3, None, true)
    }

    pub fn with_window(mut self, id: u32, parent: Option<u32>, accepts_drops: bool) -> Self {
        self.windows.insert(
            WindowId(id),
            TestWindow {
                parent: parent.map(WindowId),
                accepts_drops,
                connected: true,
                connection: Recorder::default(),
            },
        );
        self
    }

    /// A droppable window the host cannot reach.
    pub fn with_unreachable_window(mut self, id: u32) -> Self {
        self = self.with_window(id, None, true);
        if let Some(window) = self.windows.get_mut(&WindowId(id)) {
            window.connected = false;
        }
        self
    }

    pub fn destroy(&mut self, id: WindowId) {
        if let Some(window) = self.windows.remove(&id) {
            self.destroyed.insert(id, window);
        }
    }

    /// The window stays in the tree but loses its connection.
    pub fn disconnect(&mut self, id: WindowId) {
        if let Some(window) = self.windows.get_mut(&id) {
            window.connected = false;
        }
    }

    fn recorder(&self, id: WindowId) -> &Recorder {
        self.windows
            .get(&id)
            .or_else(|| self.destroyed.get(&id))
            .map(|w| &w.connection)
            .expect("unknown test window")
    }

    pub fn kinds(&self, id: WindowId) -> Vec<EventKind> {
        self.recorder(id)
            .delivered
            .iter()
            .map(|d| d.kind)
            .collect()
    }

    pub fn delivered(&self, id: WindowId) -> &[Delivered] {
        &self.recorder(id).delivered
    }

    pub fn payloads(&self, id: WindowId) -> &[Payload] {
        &self.recorder(id).payloads
    }

    /// Acks handed to the window and not yet taken.
    pub fn outstanding(&self, id: WindowId) -> usize {
        self.recorder(id).acks.len()
    }

    pub fn take_ack(&mut self, id: WindowId) -> DropAck {
        self.windows
            .get_mut(&id)
            .or_else(|| self.destroyed.get_mut(&id))
            .and_then(|w| w.connection.acks.pop_front())
            .expect("window has no outstanding ack")
    }
}

impl WindowResolver for TestHost {
    fn resolve_window(&self, id: WindowId) -> Option<WindowId> {
        self.windows.contains_key(&id).then(|| id)
    }

    fn target_connection(&mut self, window: WindowId) -> Option<&mut dyn TargetConnection> {
        self.windows
            .get_mut(&window)
            .filter(|w| w.connected)
            .map(|w| &mut w.connection as &mut dyn TargetConnection)
    }

    fn accepts_drops(&self, window: WindowId) -> bool {
        self.windows
            .get(&window)
            .map_or(false, |w| w.accepts_drops)
    }

    fn parent_of(&self, window: WindowId) -> Option<WindowId> {
        self.windows.get(&window).and_then(|w| w.parent)
    }
}

impl SourceNotifier for TestHost {
    fn on_completed(&mut self, success: bool, action: Option<DropEffect>) {
        self.completions.push((success, action));
    }
}

impl CursorObserver for TestHost {
    fn on_cursor_hint_changed(&mut self) {
        self.cursor_changes += 1;
    }
}

pub fn logger() -> slog::Logger {
    slog::Logger::root(slog::Discard, slog::o!())
}

pub fn payload() -> Payload {
    vec![("text/plain", b"dragged".to_vec())]
        .into_iter()
        .collect()
}

pub fn start(host: &TestHost, offered: DropEffect) -> DragSession {
    let params = DragParams {
        pointer_id: POINTER,
        source_window: SOURCE,
        payload: payload(),
        offered,
    };
    DragSession::start(host, params, logger()).expect("session starts")
}

pub fn motion(x: f64) -> PointerEvent {
    PointerEvent::new(POINTER, PointerEventKind::Motion, Point2::new(x, 0.0))
}

pub fn release(x: f64) -> PointerEvent {
    PointerEvent::new(POINTER, PointerEventKind::Release, Point2::new(x, 0.0))
}

pub fn move_over(session: &mut DragSession, host: &mut TestHost, x: f64, window: Option<u32>) {
    session.dispatch_pointer_event(host, &motion(x), window.map(WindowId));
}

/// Complete the oldest outstanding ack of `window`.
pub fn answer(session: &mut DragSession, host: &mut TestHost, window: u32, effects: DropEffect) {
    let ack = host.take_ack(WindowId(window));
    session.on_acknowledgement(host, ack.complete(effects));
}
