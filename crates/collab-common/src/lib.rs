//! Shared identifiers and small primitives used by every collab core crate.
//!
//! Nothing here owns any collaborative state; it exists so that `ClientId`,
//! `Clock`, `ItemId` and wall-clock helpers have exactly one definition
//! shared by the CRDT, OT, awareness, presence and room crates.

pub mod color;
pub mod ids;
pub mod time;

pub use color::hsl_from_client_id;
pub use ids::{ClientId, Clock, ItemId};
pub use time::now_ms;
