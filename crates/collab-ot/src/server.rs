//! OT server protocol: rebase-and-broadcast over an append-only op log (§4.3).
//!
//! Grounded on the same shape Rustpad's server uses for its document state
//! (a text buffer, a revision counter, and an operations log transformed
//! across on every incoming edit), adapted to this crate's `Op`/`transform`
//! types and without the `axum`/`tokio` transport wiring that belongs to
//! `collab-room` instead.

use crate::error::{OtError, Result};
use crate::message::OperationWithMeta;
use crate::op::apply_operations;
use crate::transform::{transform_operations, Priority};

/// Authoritative document state for one OT-backed room.
pub struct OtServer {
    document: String,
    revision: u64,
    operations: Vec<OperationWithMeta>,
}

impl OtServer {
    #[must_use]
    pub fn new(document: impl Into<String>) -> Self {
        OtServer { document: document.into(), revision: 0, operations: Vec::new() }
    }

    #[must_use]
    pub fn document(&self) -> &str {
        &self.document
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Every op applied at revision `>= from`, for a client to catch up on.
    #[must_use]
    pub fn history_since(&self, from: u64) -> &[OperationWithMeta] {
        let from = from.min(self.operations.len() as u64) as usize;
        &self.operations[from..]
    }

    /// Rebase a client's batch across every server op it hasn't seen,
    /// apply it, and return the rebased batch for broadcast (including back
    /// to the sender, as its acknowledgment).
    pub fn handle_client_op(&mut self, op: OperationWithMeta) -> Result<OperationWithMeta> {
        let len = self.operations.len() as u64;
        if op.revision > len {
            tracing::warn!(claimed = op.revision, current = len, client = %op.client_id, "client claimed a revision ahead of the server log");
            return Err(OtError::RevisionAhead { claimed: op.revision, current: len });
        }
        let mut ops = op.ops;
        for history_op in &self.operations[op.revision as usize..] {
            ops = transform_operations(&ops, &history_op.ops, Priority::Right);
        }
        self.document = apply_operations(&self.document, &ops)?;
        self.revision += 1;

        let rebased = OperationWithMeta {
            id: op.id,
            client_id: op.client_id,
            revision: self.revision,
            ops,
            timestamp: op.timestamp,
        };
        self.operations.push(rebased.clone());
        Ok(rebased)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::Op;
    use collab_common::ClientId;

    #[test]
    fn scenario_concurrent_insert_and_delete_converge() {
        // §8 scenario 6.
        let mut server = OtServer::new("abc");
        let x = OperationWithMeta::new(
            ClientId::from("x"),
            0,
            vec![Op::Insert { position: 1, text: "X".into() }],
            0,
        );
        let y = OperationWithMeta::new(
            ClientId::from("y"),
            0,
            vec![Op::Delete { position: 0, length: 1 }],
            0,
        );

        let ack_x = server.handle_client_op(x).unwrap();
        assert_eq!(server.document(), "aXbc");
        assert_eq!(ack_x.revision, 1);

        let ack_y = server.handle_client_op(y).unwrap();
        assert_eq!(server.document(), "Xbc");
        assert_eq!(ack_y.revision, 2);
        assert_eq!(ack_y.ops, vec![Op::Delete { position: 0, length: 1 }]);
    }

    #[test]
    fn client_claiming_a_future_revision_errors() {
        let mut server = OtServer::new("abc");
        let op = OperationWithMeta::new(ClientId::from("x"), 5, vec![], 0);
        assert!(server.handle_client_op(op).is_err());
    }
}
