use std::time::Duration;

use calloop::{
    timer::{TimeoutAction, Timer},
    LoopHandle, RegistrationToken,
};

use crate::{DragLoopState, LoopError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchdogConfig {
    /// How long a released drag may wait for its drop target to answer.
    pub drop_timeout: Duration,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            drop_timeout: Duration::from_secs(5),
        }
    }
}

/// Armed timer cancelling a drag that outlives its drop timeout.
#[derive(Debug)]
#[must_use = "dropping the watchdog leaves it armed, call `disarm` to remove it"]
pub struct DropWatchdog {
    token: RegistrationToken,
}

impl DropWatchdog {
    pub fn disarm<D>(self, handle: &LoopHandle<'_, D>) {
        handle.remove(self.token);
    }
}

/// Arms a timer that cancels the active drag if it is still unfinished once
/// `config.drop_timeout` has elapsed.
pub fn arm_drop_watchdog<'l, D>(
    handle: &LoopHandle<'l, D>,
    config: &WatchdogConfig,
) -> Result<DropWatchdog, LoopError>
where
    D: DragLoopState + 'l,
{
    let timeout = config.drop_timeout;
    let timer = Timer::from_duration(timeout);

    let token = handle
        .insert_source(timer, move |_, _, data: &mut D| {
            if let (Some(session), host) = data.drag_session() {
                if !session.is_finished() {
                    warn!("Drop target did not answer within {:?}, cancelling drag", timeout);
                    session.cancel(host);
                }
            }
            TimeoutAction::Drop
        })
        .map_err(|e| e.error)?;

    Ok(DropWatchdog { token })
}
