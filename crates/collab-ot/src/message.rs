//! The wire envelope for an OT batch (§3 "OperationWithMeta").

use crate::op::Op;
use collab_common::ClientId;
use serde::{Deserialize, Serialize};

/// A batch of ops plus the metadata needed to rebase and order it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OperationWithMeta {
    pub id: String,
    pub client_id: ClientId,
    pub revision: u64,
    pub ops: Vec<Op>,
    pub timestamp: u64,
}

impl OperationWithMeta {
    #[must_use]
    pub fn new(client_id: ClientId, revision: u64, ops: Vec<Op>, timestamp: u64) -> Self {
        OperationWithMeta {
            id: uuid::Uuid::new_v4().to_string(),
            client_id,
            revision,
            ops,
            timestamp,
        }
    }
}
