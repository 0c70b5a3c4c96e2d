use std::time::Duration;

use calloop::{
    timer::{TimeoutAction, Timer},
    LoopHandle,
};
use dropzone_loop::AckSender;
use dropzone_session::{
    CursorObserver, DragOutcome, DragUpdate, DropAck, DropEffect, Payload, SourceNotifier,
    TargetConnection, WindowId, WindowResolver,
};
use indexmap::IndexMap;
use slog_scope::{debug, info, warn};

use crate::{
    scenario::{Effect, Scenario, WindowSpec},
    CalloopData,
};

/// Scripted stand-in for a client window.
pub struct SimWindow {
    id: WindowId,
    parent: Option<WindowId>,
    accepts_drops: bool,

    enter: DropEffect,
    over: DropEffect,
    drop: DropEffect,
    delay: Duration,
    unresponsive: bool,

    /// Tokens an unresponsive window sits on.
    held: Vec<DropAck>,

    acks: AckSender,
    handle: LoopHandle<'static, CalloopData>,
}

impl SimWindow {
    fn new(spec: &WindowSpec, acks: AckSender, handle: LoopHandle<'static, CalloopData>) -> Self {
        Self {
            id: WindowId(spec.id),
            parent: spec.parent.map(WindowId),
            accepts_drops: spec.accepts_drops,

            enter: Effect::to_flags(&spec.responses.enter),
            over: Effect::to_flags(&spec.responses.over),
            drop: Effect::to_flags(&spec.responses.drop),
            delay: Duration::from_millis(spec.delay_ms),
            unresponsive: spec.unresponsive,

            held: Vec::new(),

            acks,
            handle,
        }
    }

    fn answer(&mut self, ack: DropAck, effects: DropEffect) {
        if self.unresponsive {
            debug!("{} sits on {:?}", self.id, ack.kind());
            self.held.push(ack);
            return;
        }

        let sender = self.acks.clone();
        let mut ack = Some(ack);
        let timer = Timer::from_duration(self.delay);

        let inserted = self.handle.insert_source(timer, move |_, _, _| {
            if let Some(ack) = ack.take() {
                sender.complete(ack, effects);
            }
            TimeoutAction::Drop
        });

        if let Err(err) = inserted {
            warn!("Failed to schedule answer of {}: {}", self.id, err.error);
        }
    }
}

impl TargetConnection for SimWindow {
    fn deliver_start(&mut self, window: WindowId, payload: &Payload) {
        let formats = payload.type_ids().collect::<Vec<_>>();
        info!("{} <- Start", window; "formats" => ?formats);
    }

    fn deliver_enter(&mut self, window: WindowId, update: DragUpdate, ack: DropAck) {
        info!("{} <- Enter", window; "offset" => ?update.offset, "keys" => ?update.key_state);
        self.answer(ack, self.enter);
    }

    fn deliver_over(&mut self, window: WindowId, update: DragUpdate, ack: DropAck) {
        debug!("{} <- Over", window; "offset" => ?update.offset, "keys" => ?update.key_state);
        self.answer(ack, self.over);
    }

    fn deliver_leave(&mut self, window: WindowId) {
        info!("{} <- Leave", window);
    }

    fn deliver_drop(&mut self, window: WindowId, update: DragUpdate, ack: DropAck) {
        info!("{} <- Drop", window; "offset" => ?update.offset, "offered" => ?update.offered);
        self.answer(ack, self.drop);
    }

    fn deliver_done(&mut self, window: WindowId) {
        info!("{} <- Done", window);
    }
}

/// Window tree of a scenario plus the source side of the drag.
pub struct SimHost {
    windows: IndexMap<WindowId, SimWindow>,
    outcome: Option<DragOutcome>,
    cursor_dirty: bool,
}

impl SimHost {
    pub fn new(
        scenario: &Scenario,
        acks: AckSender,
        handle: &LoopHandle<'static, CalloopData>,
    ) -> Self {
        let windows = scenario
            .windows
            .iter()
            .map(|spec| {
                let window = SimWindow::new(spec, acks.clone(), handle.clone());
                (window.id, window)
            })
            .collect();

        Self {
            windows,
            outcome: None,
            cursor_dirty: false,
        }
    }

    pub fn destroy(&mut self, id: WindowId) {
        if let Some(window) = self.windows.shift_remove(&id) {
            info!("{} destroyed", id; "unanswered" => window.held.len());
        }
    }

    pub fn outcome(&self) -> Option<DragOutcome> {
        self.outcome
    }

    /// Whether the cursor hint changed since the last call.
    pub fn take_cursor_change(&mut self) -> bool {
        std::mem::replace(&mut self.cursor_dirty, false)
    }
}

impl WindowResolver for SimHost {
    fn resolve_window(&self, id: WindowId) -> Option<WindowId> {
        self.windows.get(&id).map(|window| window.id)
    }

    fn target_connection(&mut self, window: WindowId) -> Option<&mut dyn TargetConnection> {
        match self.windows.get_mut(&window) {
            Some(window) => Some(window),
            None => None,
        }
    }

    fn accepts_drops(&self, window: WindowId) -> bool {
        self.windows
            .get(&window)
            .map_or(false, |window| window.accepts_drops)
    }

    fn parent_of(&self, window: WindowId) -> Option<WindowId> {
        self.windows.get(&window).and_then(|window| window.parent)
    }
}

impl SourceNotifier for SimHost {
    fn on_completed(&mut self, success: bool, action: Option<DropEffect>) {
        info!("Source notified"; "success" => success, "action" => ?action);
        self.outcome = Some(DragOutcome { success, action });
    }
}

impl CursorObserver for SimHost {
    fn on_cursor_hint_changed(&mut self) {
        self.cursor_dirty = true;
    }
}
