//! collab-crdt: a YATA-style convergent document for named Text/Array/Map
//! containers.
//!
//! A [`Doc`] owns one client's replica. Local edits go through the
//! [`Text`], [`Array`] and [`Map`] handles; remote edits arrive as an
//! [`Update`] produced by another replica's [`Doc::get_update`] and are
//! folded in with [`Doc::apply_update`].

pub mod array;
pub mod delete_set;
pub mod doc;
pub mod error;
pub mod events;
pub mod item;
pub mod map;
pub mod state_vector;
pub mod text;
pub mod update;

pub use array::Array;
pub use delete_set::{ClockRange, DeleteSet};
pub use doc::{ContainerKind, Doc};
pub use error::{CrdtError, Result};
pub use events::{ArrayEvent, DeltaOp, DocUpdate, MapEvent, TextEvent, UpdateOrigin};
pub use item::{Content, Item};
pub use map::Map;
pub use state_vector::StateVector;
pub use text::Text;
pub use update::Update;
