//! OT client protocol: local edits, pending/sent queues, undo/redo (§4.3).

use crate::error::Result;
use crate::message::OperationWithMeta;
use crate::op::{apply_operations, Op};
use crate::transform::{transform_operations, Priority};
use collab_common::{now_ms, ClientId};
use std::sync::{Arc, Mutex};

type SendHandler = Arc<dyn Fn(OperationWithMeta) + Send + Sync>;

/// One replica's view of a single shared text buffer.
///
/// Single-threaded by contract (§5): all methods are synchronous and take
/// `&mut self`. Invariant: `sent_ops` holds at most one in-flight batch;
/// `pending_ops` is only moved into `sent_ops` once it is empty.
pub struct OtClient {
    client_id: ClientId,
    text: String,
    revision: u64,
    pending_ops: Vec<Op>,
    sent_ops: Vec<Op>,
    undo_stack: Vec<Vec<Op>>,
    redo_stack: Vec<Vec<Op>>,
    send_handler: Mutex<Option<SendHandler>>,
}

impl OtClient {
    #[must_use]
    pub fn new(client_id: ClientId, text: impl Into<String>) -> Self {
        OtClient {
            client_id,
            text: text.into(),
            revision: 0,
            pending_ops: Vec::new(),
            sent_ops: Vec::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            send_handler: Mutex::new(None),
        }
    }

    /// Install the callback invoked whenever a batch is ready to send.
    pub fn on_send<F>(&self, handler: F)
    where
        F: Fn(OperationWithMeta) + Send + Sync + 'static,
    {
        *self.send_handler.lock().unwrap() = Some(Arc::new(handler));
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending_ops.is_empty() || !self.sent_ops.is_empty()
    }

    /// Apply a local edit: save its inverse for undo, mutate the buffer,
    /// enqueue the ops, and try to flush.
    pub fn local_edit(&mut self, ops: Vec<Op>) -> Result<()> {
        let inverse = self.compute_inverse(&ops)?;
        self.apply_local(ops)?;
        self.undo_stack.push(inverse);
        self.redo_stack.clear();
        Ok(())
    }

    pub fn undo(&mut self) -> Result<()> {
        let Some(ops) = self.undo_stack.pop() else {
            return Ok(());
        };
        let redo_ops = self.compute_inverse(&ops)?;
        self.apply_local(ops)?;
        // Pushed straight to the redo stack, not back through `local_edit`,
        // so an undo doesn't also register itself as undoable (§4.3 point 4).
        self.redo_stack.push(redo_ops);
        Ok(())
    }

    pub fn redo(&mut self) -> Result<()> {
        let Some(ops) = self.redo_stack.pop() else {
            return Ok(());
        };
        let undo_ops = self.compute_inverse(&ops)?;
        self.apply_local(ops)?;
        self.undo_stack.push(undo_ops);
        Ok(())
    }

    /// Move `pendingOps` into `sentOps` and hand them to the send callback,
    /// if nothing is already in flight.
    pub fn flush_pending(&mut self) {
        if !self.sent_ops.is_empty() || self.pending_ops.is_empty() {
            return;
        }
        self.sent_ops = std::mem::take(&mut self.pending_ops);
        if let Some(handler) = self.send_handler.lock().unwrap().as_ref() {
            let batch = OperationWithMeta::new(
                self.client_id.clone(),
                self.revision,
                self.sent_ops.clone(),
                now_ms(),
            );
            handler(batch);
        }
    }

    /// Handle an op batch arriving from the room (own ack, or a peer's edit).
    pub fn on_remote(&mut self, remote: OperationWithMeta) -> Result<()> {
        if remote.client_id == self.client_id {
            self.sent_ops.clear();
            self.revision = remote.revision;
            self.flush_pending();
        } else {
            self.pending_ops = transform_operations(&self.pending_ops, &remote.ops, Priority::Right);
            self.sent_ops = transform_operations(&self.sent_ops, &remote.ops, Priority::Right);
            self.text = apply_operations(&self.text, &remote.ops)?;
            self.revision = remote.revision;
        }
        Ok(())
    }

    fn apply_local(&mut self, ops: Vec<Op>) -> Result<()> {
        self.text = apply_operations(&self.text, &ops)?;
        self.pending_ops.extend(ops);
        self.flush_pending();
        Ok(())
    }

    /// Compute the ops that undo `ops`, evaluated against the buffer as it
    /// stands right now (i.e. *before* `ops` is applied).
    fn compute_inverse(&self, ops: &[Op]) -> Result<Vec<Op>> {
        let mut buf: Vec<char> = self.text.chars().collect();
        let mut inverses = Vec::with_capacity(ops.len());
        for op in ops {
            match op {
                Op::Insert { position, text } => {
                    let len = text.chars().count();
                    inverses.push(Op::Delete { position: *position, length: len });
                    buf.splice(*position..*position, text.chars());
                }
                Op::Delete { position, length } => {
                    let end = position + length;
                    let deleted: String = buf[*position..end].iter().collect();
                    inverses.push(Op::Insert { position: *position, text: deleted });
                    buf.drain(*position..end);
                }
                Op::Retain { .. } => {}
            }
        }
        inverses.reverse();
        Ok(inverses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_pending_holds_back_a_second_batch_until_ack() {
        let client = OtClient::new(ClientId::from("alice"), "");
        let sent = Arc::new(Mutex::new(Vec::new()));
        let s = sent.clone();
        client.on_send(move |batch| s.lock().unwrap().push(batch));
        let mut client = client;
        client.local_edit(vec![Op::Insert { position: 0, text: "a".into() }]).unwrap();
        client.local_edit(vec![Op::Insert { position: 1, text: "b".into() }]).unwrap();
        assert_eq!(sent.lock().unwrap().len(), 1, "second batch stays pending until ack");
        assert_eq!(client.text(), "ab");
    }

    #[test]
    fn undo_then_redo_restores_text() {
        let mut client = OtClient::new(ClientId::from("alice"), "abc");
        client.local_edit(vec![Op::Insert { position: 3, text: "d".into() }]).unwrap();
        assert_eq!(client.text(), "abcd");
        client.undo().unwrap();
        assert_eq!(client.text(), "abc");
        client.redo().unwrap();
        assert_eq!(client.text(), "abcd");
    }

    #[test]
    fn remote_ack_clears_sent_and_flushes_next_batch() {
        let client = OtClient::new(ClientId::from("alice"), "");
        let sent = Arc::new(Mutex::new(Vec::new()));
        let s = sent.clone();
        client.on_send(move |batch| s.lock().unwrap().push(batch));
        let mut client = client;
        client.local_edit(vec![Op::Insert { position: 0, text: "a".into() }]).unwrap();
        client.local_edit(vec![Op::Insert { position: 1, text: "b".into() }]).unwrap();
        let first = sent.lock().unwrap()[0].clone();
        client
            .on_remote(OperationWithMeta::new(ClientId::from("alice"), 1, first.ops, now_ms()))
            .unwrap();
        assert_eq!(sent.lock().unwrap().len(), 2, "ack flushed the held-back batch");
    }
}
