use indexmap::{IndexMap, IndexSet};

use crate::{
    effect::{CursorHint, DropEffect},
    error::StartError,
    event::{
        Acknowledgement, DragUpdate, DropAck, EventKind, Payload, PointerEvent, PointerEventKind,
        PointerId, Serial, WindowId,
    },
    host::{self, DragHost, WindowResolver},
    queue::{Motion, QueuedEvent, WindowQueue},
};

/// What the initiator of a drag hands over when starting a session.
#[derive(Debug, Clone)]
pub struct DragParams {
    pub pointer_id: PointerId,
    pub source_window: WindowId,
    pub payload: Payload,
    pub offered: DropEffect,
}

/// Result reported to the source window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragOutcome {
    pub success: bool,
    pub action: Option<DropEffect>,
}

impl DragOutcome {
    pub fn failed() -> Self {
        Self {
            success: false,
            action: None,
        }
    }

    fn negotiated(offered: DropEffect, response: DropEffect) -> Self {
        let action = offered.negotiate(response);
        Self {
            success: action.is_some(),
            action,
        }
    }
}

/// State of one drag-and-drop interaction, from pointer-down to completion.
///
/// The session never blocks: events are handed to target connections, whose
/// answers come back later through [`DragSession::on_acknowledgement`] or
/// [`DragSession::on_window_acknowledged`]. Every window has at most one
/// unanswered event, later events for it are coalesced until it answers.
///
/// Once finished (dropped, failed or cancelled) every operation is a no-op and
/// [`DragSession::outcome`] holds the result.
#[derive(Debug)]
pub struct DragSession {
    pointer_id: PointerId,
    source_window: WindowId,
    payload: Payload,
    offered: DropEffect,

    current_target: Option<WindowId>,
    delivered_start: IndexSet<WindowId>,
    /// Windows the host had no target connection for.
    unreachable: IndexSet<WindowId>,
    cursor_hint: CursorHint,
    completed: bool,
    queues: IndexMap<WindowId, WindowQueue>,

    outcome: Option<DragOutcome>,
    log: slog::Logger,
}

impl DragSession {
    /// Start a session for `params`.
    ///
    /// Without a `logger` the session logs through the global `slog_scope` logger.
    pub fn start<R, L>(resolver: &R, params: DragParams, logger: L) -> Result<Self, StartError>
    where
        R: WindowResolver + ?Sized,
        L: Into<Option<slog::Logger>>,
    {
        if params.offered.is_empty() {
            return Err(StartError::NoEffectsOffered);
        }

        let source_window = resolver
            .resolve_window(params.source_window)
            .ok_or(StartError::UnknownSourceWindow(params.source_window))?;

        let log = logger.into().unwrap_or_else(slog_scope::logger).new(slog::o!(
            "pointer" => params.pointer_id.0,
            "source" => source_window.0
        ));

        slog::info!(log, "Drag started";
            "offered" => ?params.offered,
            "formats" => params.payload.len()
        );

        Ok(Self {
            pointer_id: params.pointer_id,
            source_window,
            payload: params.payload,
            offered: params.offered,

            current_target: None,
            delivered_start: IndexSet::new(),
            unreachable: IndexSet::new(),
            cursor_hint: CursorHint::Forbidden,
            completed: false,
            queues: IndexMap::new(),

            outcome: None,
            log,
        })
    }

    pub fn pointer_id(&self) -> PointerId {
        self.pointer_id
    }

    pub fn source_window(&self) -> WindowId {
        self.source_window
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn offered(&self) -> DropEffect {
        self.offered
    }

    /// Window currently considered under the pointer.
    pub fn current_target(&self) -> Option<WindowId> {
        self.current_target
    }

    pub fn cursor_hint(&self) -> CursorHint {
        self.cursor_hint
    }

    /// `true` once the pointer was released or the session finished.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// `true` once the source was notified and the session torn down.
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<DragOutcome> {
        self.outcome
    }

    /// Whether `window` has an event waiting for its answer.
    pub fn has_in_flight(&self, window: WindowId) -> bool {
        self.queues
            .get(&window)
            .map_or(false, |queue| queue.in_flight().is_some())
    }

    /// Whether `window` has an event waiting to be sent.
    pub fn has_pending(&self, window: WindowId) -> bool {
        self.queues
            .get(&window)
            .map_or(false, |queue| queue.pending().is_some())
    }

    pub fn has_received_start(&self, window: WindowId) -> bool {
        self.delivered_start.contains(&window)
    }

    /// Feed a pointer event, `window_under_pointer` being the hit-tested window.
    pub fn dispatch_pointer_event<H>(
        &mut self,
        host: &mut H,
        event: &PointerEvent,
        window_under_pointer: Option<WindowId>,
    ) where
        H: DragHost + ?Sized,
    {
        if event.pointer_id != self.pointer_id {
            slog::trace!(self.log, "Ignoring event from another pointer"; "from" => %event.pointer_id);
            return;
        }

        if self.completed {
            slog::trace!(self.log, "Ignoring {:?} after release", event.kind);
            return;
        }

        let target = host::drop_target(&*host, window_under_pointer, &self.log);
        let motion = Motion {
            key_state: event.key_state,
            offset: event.offset,
        };

        if target != self.current_target {
            if let Some(previous) = self.current_target.take() {
                self.enqueue(host, previous, QueuedEvent::Leave);
            }

            self.current_target = target;

            match target {
                Some(window) => {
                    if !self.delivered_start.contains(&window) {
                        self.send_start(host, window);
                    }
                    self.enqueue(host, window, QueuedEvent::Enter(motion));
                }
                None => self.set_cursor_hint(host, CursorHint::Forbidden),
            }
        } else if let Some(window) = target {
            if event.kind != PointerEventKind::Release {
                self.enqueue(host, window, QueuedEvent::Over(motion));
            }
        }

        if event.kind == PointerEventKind::Release {
            self.completed = true;

            match self.current_target {
                Some(window) => {
                    slog::debug!(self.log, "Released, dropping"; "window" => %window);
                    self.enqueue(host, window, QueuedEvent::Drop(motion));
                }
                None => {
                    slog::info!(self.log, "Released over no drop target");
                    self.finish(host, DragOutcome::failed());
                }
            }
        }
    }

    /// Acknowledgment message posted by a target connection.
    ///
    /// Answers whose serial does not match the window's in-flight event are stale
    /// and ignored.
    pub fn on_acknowledgement<H>(&mut self, host: &mut H, ack: Acknowledgement)
    where
        H: DragHost + ?Sized,
    {
        self.acknowledge(host, ack.window, Some(ack.serial), ack.effects);
    }

    /// `window` answered its in-flight event with `response`.
    pub fn on_window_acknowledged<H>(&mut self, host: &mut H, window: WindowId, response: DropEffect)
    where
        H: DragHost + ?Sized,
    {
        self.acknowledge(host, window, None, response);
    }

    pub fn on_window_destroyed<H>(&mut self, host: &mut H, window: WindowId)
    where
        H: DragHost + ?Sized,
    {
        if self.is_finished() {
            return;
        }

        let held_drop = self
            .queues
            .shift_remove(&window)
            .map_or(false, |queue| queue.holds_drop());
        self.delivered_start.shift_remove(&window);
        self.unreachable.shift_remove(&window);

        if window == self.source_window {
            slog::warn!(self.log, "Source window destroyed, aborting drag");
            self.finish(host, DragOutcome::failed());
            return;
        }

        if self.current_target == Some(window) {
            slog::debug!(self.log, "Target window destroyed"; "window" => %window);
            self.current_target = None;
            self.set_cursor_hint(host, CursorHint::Forbidden);
        }

        if self.completed && held_drop {
            slog::info!(self.log, "Drop target destroyed before answering"; "window" => %window);
            self.finish(host, DragOutcome::failed());
        }
    }

    /// Abort the drag, whatever is still in flight.
    pub fn cancel<H>(&mut self, host: &mut H)
    where
        H: DragHost + ?Sized,
    {
        if self.is_finished() {
            return;
        }

        slog::info!(self.log, "Drag cancelled");
        self.finish(host, DragOutcome::failed());
    }

    fn acknowledge<H>(
        &mut self,
        host: &mut H,
        window: WindowId,
        serial: Option<Serial>,
        response: DropEffect,
    ) where
        H: DragHost + ?Sized,
    {
        if self.is_finished() {
            slog::debug!(self.log, "Ignoring ack after teardown"; "window" => %window);
            return;
        }

        let acked = match self.queues.get_mut(&window) {
            Some(queue) => queue.acknowledge(serial),
            None => {
                slog::debug!(self.log, "Ignoring ack from unknown window"; "window" => %window);
                return;
            }
        };

        let acked = match acked {
            Some(acked) => acked,
            None => {
                slog::debug!(self.log, "Ignoring stale ack"; "window" => %window, "serial" => ?serial);
                return;
            }
        };

        slog::trace!(self.log, "{:?} answered", acked.kind;
            "window" => %window,
            "response" => ?response
        );

        self.pump(host, window);

        if self.current_target == Some(window) {
            self.set_cursor_hint(host, CursorHint::for_response(self.offered, response));
        }

        if acked.kind == EventKind::Drop {
            self.finish(host, DragOutcome::negotiated(self.offered, response));
        }
    }

    fn send_start<H>(&mut self, host: &mut H, window: WindowId)
    where
        H: DragHost + ?Sized,
    {
        self.delivered_start.insert(window);

        match host.target_connection(window) {
            Some(connection) => {
                slog::debug!(self.log, "Dispatching Start"; "window" => %window);
                connection.deliver_start(window, &self.payload);
            }
            None => self.report_unreachable(window),
        }
    }

    fn enqueue<H>(&mut self, host: &mut H, window: WindowId, event: QueuedEvent)
    where
        H: DragHost + ?Sized,
    {
        self.queues.entry(window).or_default().push(event);
        self.pump(host, window);
    }

    /// Send the window's pending event if nothing is in flight.
    fn pump<H>(&mut self, host: &mut H, window: WindowId)
    where
        H: DragHost + ?Sized,
    {
        let event = match self
            .queues
            .get_mut(&window)
            .and_then(WindowQueue::next_to_send)
        {
            Some(event) => event,
            None => return,
        };

        let connection = match host.target_connection(window) {
            Some(connection) => connection,
            None => {
                self.report_unreachable(window);
                self.queues.shift_remove(&window);

                // Nobody is left to answer the drop.
                if self.completed && event.kind() == EventKind::Drop {
                    slog::info!(self.log, "Drop target has no connection"; "window" => %window);
                    self.finish(host, DragOutcome::failed());
                }
                return;
            }
        };

        let kind = event.kind();
        slog::debug!(self.log, "Dispatching {:?}", kind; "window" => %window);

        let offered = self.offered;
        let update = |motion: Motion| DragUpdate {
            key_state: motion.key_state,
            offset: motion.offset,
            offered,
        };

        match event {
            QueuedEvent::Enter(motion) => {
                let ack = self.track(window, kind);
                connection.deliver_enter(window, update(motion), ack);
            }
            QueuedEvent::Over(motion) => {
                let ack = self.track(window, kind);
                connection.deliver_over(window, update(motion), ack);
            }
            QueuedEvent::Drop(motion) => {
                let ack = self.track(window, kind);
                connection.deliver_drop(window, update(motion), ack);
            }
            QueuedEvent::Leave => connection.deliver_leave(window),
        }

        // A window that was left and has nothing outstanding is done with.
        let idle = self.queues.get(&window).map_or(false, WindowQueue::is_idle);
        if idle && self.current_target != Some(window) {
            self.queues.shift_remove(&window);
        }
    }

    fn report_unreachable(&mut self, window: WindowId) {
        if self.unreachable.insert(window) {
            slog::warn!(self.log, "Window has no target connection, discarding its events";
                "window" => %window
            );
        } else {
            slog::debug!(self.log, "Discarding event for unreachable window"; "window" => %window);
        }
    }

    fn track(&mut self, window: WindowId, kind: EventKind) -> DropAck {
        let serial = Serial::next();
        if let Some(queue) = self.queues.get_mut(&window) {
            queue.mark_in_flight(kind, serial);
        }
        DropAck::new(window, serial, kind)
    }

    fn set_cursor_hint<H>(&mut self, host: &mut H, hint: CursorHint)
    where
        H: DragHost + ?Sized,
    {
        if self.cursor_hint != hint {
            slog::trace!(self.log, "Cursor hint {:?} -> {:?}", self.cursor_hint, hint);
            self.cursor_hint = hint;
            host.on_cursor_hint_changed();
        }
    }

    fn finish<H>(&mut self, host: &mut H, outcome: DragOutcome)
    where
        H: DragHost + ?Sized,
    {
        if self.outcome.is_some() {
            return;
        }

        slog::info!(self.log, "Drag finished";
            "success" => outcome.success,
            "action" => ?outcome.action
        );

        self.outcome = Some(outcome);
        self.completed = true;
        host.on_completed(outcome.success, outcome.action);

        self.queues.clear();
        self.current_target = None;

        for &window in &self.delivered_start {
            match host.target_connection(window) {
                Some(connection) => connection.deliver_done(window),
                None => slog::debug!(self.log, "No connection for Done"; "window" => %window),
            }
        }

        self.set_cursor_hint(host, CursorHint::Default);
    }
}
