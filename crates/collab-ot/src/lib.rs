//! collab-ot: operational transformation for a single shared text buffer,
//! offered as an alternative coordination model to `collab-crdt`.
//!
//! A room picks one model per document; they are not combined. [`OtClient`]
//! holds one replica's pending/sent op queues and undo history; [`OtServer`]
//! rebases incoming batches against its op log and broadcasts the result.

pub mod client;
pub mod error;
pub mod message;
pub mod op;
pub mod server;
pub mod transform;

pub use client::OtClient;
pub use error::{OtError, Result};
pub use message::OperationWithMeta;
pub use op::{apply_operation, apply_operations, Op};
pub use server::OtServer;
pub use transform::{transform, transform_operations, Priority};
