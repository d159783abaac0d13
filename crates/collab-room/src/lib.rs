//! collab-room: the composition facade wiring a transport to the CRDT/OT,
//! awareness and presence components, and dispatching inbound envelopes by
//! message type (§4.6).
//!
//! Everything here is plumbing: the hard convergence/transform/GC logic
//! lives in `collab-crdt`, `collab-ot`, `collab-awareness` and
//! `collab-presence` respectively. A [`CollabRoom`] owns one of each plus a
//! transport and reacts to their events.

pub mod cursor;
pub mod error;
pub mod listeners;
pub mod messages;
pub mod room;

pub use cursor::{cursor_to_pixels, CursorDecoration, CursorPosition, PixelPosition};
pub use error::{Result, RoomError};
pub use messages::SyncMessage;
pub use room::{CollabRoom, CoordinationModel, RoomAwarenessEvent, RoomEvent, RoomPresenceEvent};
