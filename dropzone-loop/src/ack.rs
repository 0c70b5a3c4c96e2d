use calloop::{
    channel::{self, Channel, ChannelError, Sender},
    EventSource, LoopHandle, RegistrationToken,
};
use dropzone_session::{Acknowledgement, DropAck, DropEffect};

use crate::{DragLoopState, LoopError};

/// Creates the channel target connections answer through.
pub fn ack_channel() -> (AckSender, AckChannel) {
    let (tx, source) = channel::channel();
    (AckSender { tx }, AckChannel { source })
}

/// Posts acknowledgments to the event loop.
#[derive(Clone)]
pub struct AckSender {
    tx: Sender<Acknowledgement>,
}

impl AckSender {
    /// Sending after the loop dropped the channel does nothing.
    pub fn send(&self, ack: Acknowledgement) {
        if self.tx.send(ack).is_err() {
            trace!("Ack channel closed, dropping answer of {}", ack.window);
        }
    }

    pub fn complete(&self, ack: DropAck, effects: DropEffect) {
        self.send(ack.complete(effects));
    }
}

/// Event source yielding the acknowledgments posted through an [`AckSender`].
pub struct AckChannel {
    source: Channel<Acknowledgement>,
}

impl EventSource for AckChannel {
    type Event = Acknowledgement;
    type Metadata = ();
    type Ret = ();
    type Error = ChannelError;

    fn process_events<F>(
        &mut self,
        readiness: calloop::Readiness,
        token: calloop::Token,
        mut callback: F,
    ) -> Result<calloop::PostAction, Self::Error>
    where
        F: FnMut(Self::Event, &mut Self::Metadata) -> Self::Ret,
    {
        self.source
            .process_events(readiness, token, |event, _| match event {
                channel::Event::Msg(ack) => {
                    callback(ack, &mut ());
                }
                channel::Event::Closed => {}
            })
    }

    fn register(
        &mut self,
        poll: &mut calloop::Poll,
        token_factory: &mut calloop::TokenFactory,
    ) -> calloop::Result<()> {
        self.source.register(poll, token_factory)
    }

    fn reregister(
        &mut self,
        poll: &mut calloop::Poll,
        token_factory: &mut calloop::TokenFactory,
    ) -> calloop::Result<()> {
        self.source.reregister(poll, token_factory)
    }

    fn unregister(&mut self, poll: &mut calloop::Poll) -> calloop::Result<()> {
        self.source.unregister(poll)
    }
}

/// Routes every acknowledgment from `channel` into the active drag session.
pub fn insert_ack_source<'l, D>(
    handle: &LoopHandle<'l, D>,
    channel: AckChannel,
) -> Result<RegistrationToken, LoopError>
where
    D: DragLoopState + 'l,
{
    let token = handle
        .insert_source(channel, |ack, _, data: &mut D| {
            match data.drag_session() {
                (Some(session), host) => session.on_acknowledgement(host, ack),
                (None, _) => debug!("No drag in progress, ignoring answer of {}", ack.window),
            }
        })
        .map_err(|e| e.error)?;

    Ok(token)
}
