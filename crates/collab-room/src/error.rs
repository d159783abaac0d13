//! Error types for the room facade.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RoomError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RoomError {
    #[error(transparent)]
    Transport(#[from] collab_transport::TransportError),

    #[error(transparent)]
    Crdt(#[from] collab_crdt::CrdtError),

    #[error(transparent)]
    Ot(#[from] collab_ot::OtError),

    #[error("malformed {kind} payload: {source}")]
    MalformedPayload { kind: &'static str, source: serde_json::Error },

    #[error("operation message received but this room runs in {mode} mode")]
    WrongCoordinationModel { mode: &'static str },
}
