use std::time::Duration;

use anyhow::Context;
use calloop::{
    timer::{TimeoutAction, Timer},
    EventLoop, LoopHandle, LoopSignal,
};
use cgmath::Point2;
use clap::Parser;
use dropzone_loop::{DragLoopState, DropWatchdog, WatchdogConfig};
use dropzone_session::{
    CursorHint, DragOutcome, DragSession, PointerEvent, PointerEventKind, PointerId, WindowId,
};
use slog::Drain;
use slog_scope::{debug, error, info, warn};

mod cli;
mod scenario;
mod sim;

use scenario::{Action, Scenario};
use sim::SimHost;

pub struct CalloopData {
    session: Option<DragSession>,
    host: SimHost,

    pointer: PointerId,
    watchdog_config: Option<WatchdogConfig>,
    watchdog: Option<DropWatchdog>,

    loop_signal: LoopSignal,
    loop_handle: LoopHandle<'static, CalloopData>,
}

impl DragLoopState for CalloopData {
    type Host = SimHost;

    fn drag_session(&mut self) -> (Option<&mut DragSession>, &mut SimHost) {
        (self.session.as_mut(), &mut self.host)
    }
}

impl CalloopData {
    fn perform(&mut self, action: &Action) {
        let session = match self.session.as_mut() {
            Some(session) => session,
            None => return,
        };

        let (kind, step) = match action {
            Action::Motion(step) => (PointerEventKind::Motion, step),
            Action::Press(step) => (PointerEventKind::Press, step),
            Action::Release(step) => (PointerEventKind::Release, step),
            Action::Destroy(id) => {
                let window = WindowId(*id);
                self.host.destroy(window);
                session.on_window_destroyed(&mut self.host, window);
                return;
            }
            Action::Cancel => {
                session.cancel(&mut self.host);
                return;
            }
        };

        let event = PointerEvent::new(self.pointer, kind, Point2::new(step.x, step.y))
            .with_key_state(step.key_state());
        session.dispatch_pointer_event(&mut self.host, &event, step.window.map(WindowId));

        if kind == PointerEventKind::Release && !session.is_finished() {
            self.arm_watchdog();
        }
    }

    fn arm_watchdog(&mut self) {
        let config = match self.watchdog_config {
            Some(config) if self.watchdog.is_none() => config,
            _ => return,
        };

        match dropzone_loop::arm_drop_watchdog(&self.loop_handle, &config) {
            Ok(watchdog) => self.watchdog = Some(watchdog),
            Err(err) => error!("Drop watchdog unavailable: {}", err),
        }
    }

    /// Runs after every loop iteration.
    fn refresh(&mut self) {
        let session = match self.session.as_ref() {
            Some(session) => session,
            None => return,
        };

        if self.host.take_cursor_change() {
            debug!("Cursor hint: {:?}", session.cursor_hint());
        }

        if session.is_finished() {
            if let Some(watchdog) = self.watchdog.take() {
                watchdog.disarm(&self.loop_handle);
            }
            self.loop_signal.stop();
        }
    }
}

/// Plays `scenario` on a fresh event loop.
///
/// Returns `None` if the drag is still unfinished once the scenario settled.
fn run(
    scenario: &Scenario,
    watchdog: Option<WatchdogConfig>,
    log: slog::Logger,
) -> anyhow::Result<Option<DragOutcome>> {
    let mut event_loop =
        EventLoop::<CalloopData>::try_new().context("Failed to create the event loop")?;
    let handle = event_loop.handle();

    let (acks, channel) = dropzone_loop::ack_channel();
    dropzone_loop::insert_ack_source(&handle, channel)?;

    let host = SimHost::new(scenario, acks, &handle);
    let session = DragSession::start(&host, scenario.drag_params(), log)?;

    for step in &scenario.steps {
        let action = step.action.clone();
        let timer = Timer::from_duration(Duration::from_millis(step.at_ms));
        handle
            .insert_source(timer, move |_, _, data| {
                data.perform(&action);
                TimeoutAction::Drop
            })
            .map_err(|e| e.error)
            .context("Failed to schedule scenario step")?;
    }

    let settle = Timer::from_duration(Duration::from_millis(
        scenario.duration_ms() + scenario.settle_ms,
    ));
    handle
        .insert_source(settle, |_, _, data| {
            warn!("Scenario settled with the drag still running");
            data.loop_signal.stop();
            TimeoutAction::Drop
        })
        .map_err(|e| e.error)
        .context("Failed to schedule scenario end")?;

    let mut data = CalloopData {
        session: Some(session),
        host,

        pointer: PointerId(scenario.pointer),
        watchdog_config: watchdog,
        watchdog: None,

        loop_signal: event_loop.get_signal(),
        loop_handle: handle,
    };

    event_loop
        .run(None, &mut data, CalloopData::refresh)
        .context("Event loop failed")?;

    if let Some(session) = &data.session {
        if session.cursor_hint() != CursorHint::Default {
            debug!("Final cursor hint: {:?}", session.cursor_hint());
        }
    }

    Ok(data.host.outcome())
}

fn init_log() -> slog::Logger {
    let terminal_drain = slog_envlogger::LogBuilder::new(
        slog_term::CompactFormat::new(slog_term::TermDecorator::new().stderr().build())
            .build()
            .fuse(),
    )
    .filter(Some("dropzone"), slog::FilterLevel::Trace)
    .filter(None, slog::FilterLevel::Warning)
    .parse(&std::env::var("RUST_LOG").unwrap_or_default())
    .build()
    .fuse();

    let terminal_drain = slog_async::Async::default(terminal_drain).fuse();

    let log = slog::Logger::root(terminal_drain.fuse(), slog::o!());

    slog_stdlog::init().expect("Could not setup log backend");

    log
}

fn main() -> anyhow::Result<()> {
    let log = init_log();
    let _guard = slog_scope::set_global_logger(log);

    let opt = cli::DropzoneCliOptions::parse();

    let scenario = Scenario::load(&opt.scenario)?;
    info!("Playing {}", opt.scenario.display(); "steps" => scenario.steps.len());

    let outcome = run(&scenario, opt.watchdog(), slog_scope::logger())?;

    match (outcome, &scenario.expect) {
        (None, _) => anyhow::bail!("Drag did not finish"),
        (Some(outcome), Some(expect)) if !expect.matches(&outcome) => {
            anyhow::bail!("Expected {:?}, drag ended with {:?}", expect, outcome)
        }
        (Some(outcome), _) => {
            info!("Drag finished"; "success" => outcome.success, "action" => ?outcome.action)
        }
    }

    Ok(())
}
