use crate::event::WindowId;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartError {
    #[error("Drag offers no drop effect")]
    NoEffectsOffered,
    #[error("Source window {0} is unknown")]
    UnknownSourceWindow(WindowId),
}
