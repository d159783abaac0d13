//! The CRDT document (§4.2): owns the item store, state vector and delete
//! set, and implements the YATA-style integration rule.

use crate::delete_set::DeleteSet;
use crate::error::{CrdtError, Result};
use crate::events::{ArrayEvent, DocUpdate, Listeners, MapEvent, TextEvent, UpdateOrigin};
use crate::item::{Content, Item};
use crate::state_vector::StateVector;
use crate::update::Update;
use collab_common::{ClientId, ItemId};
use std::collections::{HashMap, HashSet};

/// The container kind a name is bound to (§4.2 "Named types").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerKind {
    Text,
    Array,
    Map,
}

impl ContainerKind {
    fn as_str(self) -> &'static str {
        match self {
            ContainerKind::Text => "Text",
            ContainerKind::Array => "Array",
            ContainerKind::Map => "Map",
        }
    }
}

/// A convergent replicated document containing named Text/Array/Map types.
///
/// Single-threaded and synchronous by design (§5): a `Doc` is owned
/// exclusively by one caller, with no internal locking. Concurrency across
/// replicas is handled entirely by the integration rule, not by mutexes.
pub struct Doc {
    client_id: ClientId,
    clock: u64,
    items: HashMap<ItemId, Item>,
    /// Per named Text/Array container: every item id ever integrated, in
    /// final order, tombstones included (invariant 2: never reordered).
    sequences: HashMap<String, Vec<ItemId>>,
    /// Per (Map name, key): every item id ever written to that slot.
    map_slots: HashMap<(String, String), Vec<ItemId>>,
    kinds: HashMap<String, ContainerKind>,
    state_vector: StateVector,
    delete_set: DeleteSet,
    /// Items whose `origin`/`rightOrigin` hasn't arrived yet; carried across
    /// `apply_update` calls until the referent shows up (§4.2 "Remote apply").
    pending: Vec<Item>,
    update_listeners: Listeners<DocUpdate>,
    text_listeners: HashMap<String, Listeners<TextEvent>>,
    array_listeners: HashMap<String, Listeners<ArrayEvent>>,
    map_listeners: HashMap<String, Listeners<MapEvent>>,
}

impl Doc {
    #[must_use]
    pub fn new(client_id: ClientId) -> Self {
        Doc {
            client_id,
            clock: 0,
            items: HashMap::new(),
            sequences: HashMap::new(),
            map_slots: HashMap::new(),
            kinds: HashMap::new(),
            state_vector: StateVector::new(),
            delete_set: DeleteSet::new(),
            pending: Vec::new(),
            update_listeners: Listeners::new(),
            text_listeners: HashMap::new(),
            array_listeners: HashMap::new(),
            map_listeners: HashMap::new(),
        }
    }

    /// Number of items still waiting on a referent (diagnostic).
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Surface stuck items as an error, for a room facade to call
    /// periodically; ordinary reordering resolves on its own as later
    /// updates arrive, so this is a "has it been stuck too long" check, not
    /// part of `apply_update`'s own control flow.
    pub fn reject_if_stuck(&self) -> Result<()> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            tracing::warn!(pending = self.pending.len(), "items stuck waiting on an origin that never arrived");
            Err(CrdtError::UnsatisfiableOrigin(self.pending.len()))
        }
    }

    #[must_use]
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    #[must_use]
    pub fn state_vector(&self) -> &StateVector {
        &self.state_vector
    }

    #[must_use]
    pub fn delete_set(&self) -> &DeleteSet {
        &self.delete_set
    }

    pub fn on_update<F>(&self, handler: F) -> u64
    where
        F: Fn(&DocUpdate) + Send + Sync + 'static,
    {
        self.update_listeners.on(handler)
    }

    pub fn unsubscribe_update(&self, id: u64) {
        self.update_listeners.unsubscribe(id);
    }

    /// Bind `name` to `kind`, or confirm it already is. A mismatch is a
    /// programmer error (§7 "Configuration error") and throws synchronously.
    pub(crate) fn ensure_kind(&mut self, name: &str, kind: ContainerKind) -> Result<()> {
        match self.kinds.get(name) {
            Some(existing) if *existing != kind => Err(CrdtError::ContainerTypeMismatch {
                name: name.to_string(),
                expected: existing.as_str(),
                actual: kind.as_str(),
            }),
            Some(_) => Ok(()),
            None => {
                self.kinds.insert(name.to_string(), kind);
                Ok(())
            }
        }
    }

    fn next_id(&mut self) -> ItemId {
        let id = ItemId::new(self.client_id.clone(), self.clock);
        self.clock += 1;
        self.state_vector.advance(&self.client_id, self.clock);
        id
    }

    // ---- YATA integration --------------------------------------------

    /// Resolve the insertion rank of an origin id within `seq`: `-1` for
    /// "inserted at the start", else the id's current position.
    fn origin_rank(seq: &[ItemId], origin: &Option<ItemId>) -> isize {
        match origin {
            None => -1,
            Some(id) => seq
                .iter()
                .position(|x| x == id)
                .map_or(-1, |p| p as isize),
        }
    }

    /// Compute where `item` belongs in `seq` per the integration rule (§4.2).
    fn yata_position(seq: &[ItemId], items: &HashMap<ItemId, Item>, item: &Item) -> usize {
        let left_pos = match &item.origin {
            None => 0,
            Some(o) => seq.iter().position(|x| x == o).map_or(0, |p| p + 1),
        };
        let right_pos = match &item.right_origin {
            None => seq.len(),
            Some(r) => seq.iter().position(|x| x == r).unwrap_or(seq.len()),
        };
        let item_rank = Self::origin_rank(seq, &item.origin);

        let mut i = left_pos;
        while i < right_pos {
            let x = items
                .get(&seq[i])
                .expect("every id in `seq` names an already-integrated item");
            let x_rank = Self::origin_rank(seq, &x.origin);
            if x_rank < item_rank {
                i += 1;
            } else if x_rank == item_rank {
                if item.id.client < x.id.client {
                    break;
                }
                i += 1;
            } else {
                break;
            }
        }
        i
    }

    /// Insert `item` into the store, pre-marking it deleted if `pre_deleted`
    /// (used when a delete for this id arrived before the insert did, §4.2
    /// "Remote apply" step 3, and for causal-deferral replay).
    fn integrate_item(&mut self, mut item: Item, pre_deleted: bool) {
        if pre_deleted {
            item.deleted = true;
        }
        match item.parent_sub.clone() {
            None => {
                let seq = self.sequences.entry(item.parent.clone()).or_default();
                let pos = Self::yata_position(seq, &self.items, &item);
                seq.insert(pos, item.id.clone());
            }
            Some(key) => {
                self.map_slots
                    .entry((item.parent.clone(), key))
                    .or_default()
                    .push(item.id.clone());
            }
        }
        self.state_vector.advance(&item.id.client, item.id.clock + 1);
        self.items.insert(item.id.clone(), item);
    }

    // ---- Sequence (Text/Array) primitives -----------------------------

    /// Left/right neighbor ids for inserting at a visible `index`.
    pub(crate) fn neighbors_at(&self, name: &str, index: usize) -> (Option<ItemId>, Option<ItemId>) {
        let empty = Vec::new();
        let seq = self.sequences.get(name).unwrap_or(&empty);
        let mut visible = 0usize;
        let mut left = None;
        for id in seq {
            let deleted = self.items.get(id).is_some_and(|it| it.deleted);
            if deleted {
                continue;
            }
            if visible == index {
                return (left, Some(id.clone()));
            }
            left = Some(id.clone());
            visible += 1;
        }
        (left, None)
    }

    pub(crate) fn visible_len(&self, name: &str) -> usize {
        self.sequences
            .get(name)
            .map(|seq| {
                seq.iter()
                    .filter(|id| !self.items.get(id).is_some_and(|it| it.deleted))
                    .count()
            })
            .unwrap_or(0)
    }

    /// Insert a single sequence item (one char, or one array element).
    pub(crate) fn sequence_insert_one(&mut self, name: &str, origin: Option<ItemId>, right_origin: Option<ItemId>, content: Content) -> ItemId {
        let id = self.next_id();
        let item = Item::new(id.clone(), origin, right_origin, name, None, content);
        self.integrate_item(item.clone(), false);
        id
    }

    pub(crate) fn sequence_contents(&self, name: &str) -> Vec<(&ItemId, &Item)> {
        self.sequences
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(|id| self.items.get(id).map(|it| (id, it)))
            .filter(|(_, it)| !it.deleted)
            .collect()
    }

    /// Mark `count` consecutive visible items starting at `index` deleted.
    /// Returns the ids newly marked deleted, so callers can emit an `update`
    /// for the delta (§4.2 "mutations fire listeners with both a
    /// type-specific event ... and an `update`").
    pub(crate) fn sequence_delete(&mut self, name: &str, index: usize, count: usize) -> Result<Vec<ItemId>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let len = self.visible_len(name);
        if index + count > len {
            return Err(CrdtError::IndexOutOfBounds { index: index + count, length: len });
        }
        let seq = self.sequences.get(name).cloned().unwrap_or_default();
        let mut visible = 0usize;
        let mut remaining = count;
        let mut deleted_ids = Vec::with_capacity(count);
        for id in seq {
            if remaining == 0 {
                break;
            }
            let deleted = self.items.get(&id).is_some_and(|it| it.deleted);
            if deleted {
                continue;
            }
            if visible >= index {
                self.items.get_mut(&id).unwrap().deleted = true;
                self.delete_set.add(&id.client, id.clock);
                deleted_ids.push(id.clone());
                remaining -= 1;
            }
            visible += 1;
        }
        Ok(deleted_ids)
    }

    // ---- Map primitives -------------------------------------------------

    pub(crate) fn map_set_one(&mut self, name: &str, key: &str, value: serde_json::Value) -> ItemId {
        let id = self.next_id();
        let item = Item::new(id.clone(), None, None, name, Some(key.to_string()), Content::Value(value));
        self.integrate_item(item, false);
        id
    }

    pub(crate) fn map_get(&self, name: &str, key: &str) -> Option<serde_json::Value> {
        self.map_slots
            .get(&(name.to_string(), key.to_string()))?
            .iter()
            .filter(|id| !self.items.get(id).is_some_and(|it| it.deleted))
            .max()
            .and_then(|id| self.items.get(id))
            .map(|it| it.content.as_value())
    }

    pub(crate) fn map_has(&self, name: &str, key: &str) -> bool {
        self.map_get(name, key).is_some()
    }

    pub(crate) fn map_keys(&self, name: &str) -> Vec<String> {
        self.map_slots
            .keys()
            .filter(|(parent, _)| parent == name)
            .filter(|(parent, key)| self.map_has(parent, key))
            .map(|(_, key)| key.clone())
            .collect()
    }

    /// Mark every current item under `key` deleted. Returns the ids newly
    /// marked deleted, for the caller to fold into an `update` (§4.2).
    pub(crate) fn map_delete(&mut self, name: &str, key: &str) -> Vec<ItemId> {
        let mut deleted_ids = Vec::new();
        if let Some(ids) = self.map_slots.get(&(name.to_string(), key.to_string())).cloned() {
            for id in ids {
                if let Some(item) = self.items.get_mut(&id) {
                    if !item.deleted {
                        item.deleted = true;
                        self.delete_set.add(&id.client, id.clock);
                        deleted_ids.push(id);
                    }
                }
            }
        }
        deleted_ids
    }

    pub(crate) fn emit_update(&self, items: Vec<Item>, delete_set: DeleteSet, origin: UpdateOrigin) {
        if items.is_empty() && delete_set.is_empty() {
            return;
        }
        self.update_listeners.emit(&DocUpdate { items, delete_set, origin });
    }

    #[must_use]
    pub(crate) fn item_snapshot(&self, id: &ItemId) -> Option<Item> {
        self.items.get(id).cloned()
    }

    pub fn on_text<F>(&mut self, name: &str, handler: F) -> u64
    where
        F: Fn(&TextEvent) + Send + Sync + 'static,
    {
        self.text_listeners.entry(name.to_string()).or_default().on(handler)
    }

    pub fn on_array<F>(&mut self, name: &str, handler: F) -> u64
    where
        F: Fn(&ArrayEvent) + Send + Sync + 'static,
    {
        self.array_listeners.entry(name.to_string()).or_default().on(handler)
    }

    pub fn on_map<F>(&mut self, name: &str, handler: F) -> u64
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.map_listeners.entry(name.to_string()).or_default().on(handler)
    }

    pub(crate) fn emit_text_event(&self, name: &str, event: &TextEvent) {
        if let Some(listeners) = self.text_listeners.get(name) {
            listeners.emit(event);
        }
    }

    pub(crate) fn emit_array_event(&self, name: &str, event: &ArrayEvent) {
        if let Some(listeners) = self.array_listeners.get(name) {
            listeners.emit(event);
        }
    }

    pub(crate) fn emit_map_event(&self, name: &str, event: &MapEvent) {
        if let Some(listeners) = self.map_listeners.get(name) {
            listeners.emit(event);
        }
    }

    // ---- Wire protocol ----------------------------------------------------

    /// Every item beyond `target`'s frontier, plus the full delete set. With
    /// `target = None`, the full document state (first-connect catch-up).
    #[must_use]
    pub fn get_update(&self, target: Option<&StateVector>) -> Update {
        let mut items: Vec<Item> = self
            .items
            .values()
            .filter(|item| {
                let from = target.map_or(0, |sv| sv.get(&item.id.client));
                item.id.clock >= from
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Update::new(items, self.delete_set.clone())
    }

    /// Integrate a remote [`Update`] (§4.2 "Remote apply").
    ///
    /// Resolves the integration order in a dependency-closure pass before
    /// touching any mutable state. Items that still can't resolve (their
    /// origin hasn't arrived in this batch or any previous one) are queued
    /// in `pending` rather than rejected — see
    /// [`Doc::reject_if_stuck`] for surfacing a peer that never sends the
    /// referent at all.
    pub fn apply_update(&mut self, update: Update) -> Result<()> {
        let mut known: HashSet<ItemId> = self.items.keys().cloned().collect();
        let mut candidates: Vec<Item> = std::mem::take(&mut self.pending);
        candidates.extend(
            update
                .items
                .into_iter()
                .filter(|item| !self.state_vector.contains(&item.id.client, item.id.clock)),
        );
        let mut ordered: Vec<Item> = Vec::with_capacity(candidates.len());

        loop {
            let before = candidates.len();
            let mut next_round = Vec::new();
            for item in candidates {
                let origin_ok = item.origin.as_ref().map_or(true, |o| known.contains(o));
                let right_ok = item.right_origin.as_ref().map_or(true, |o| known.contains(o));
                if origin_ok && right_ok {
                    known.insert(item.id.clone());
                    ordered.push(item);
                } else {
                    next_round.push(item);
                }
            }
            candidates = next_round;
            if candidates.is_empty() || candidates.len() == before {
                break;
            }
        }
        self.pending = candidates;

        let mut newly_integrated = Vec::with_capacity(ordered.len());
        for item in ordered {
            let pre_deleted = self.delete_set.contains(&item.id.client, item.id.clock)
                || update.delete_set.contains(&item.id.client, item.id.clock);
            newly_integrated.push(item.clone());
            self.integrate_item(item, pre_deleted);
        }

        self.delete_set.merge(&update.delete_set);
        for (client, ranges) in update.delete_set.iter() {
            for range in ranges {
                for clock in range.start..(range.start + range.len) {
                    let id = ItemId::new(client.clone(), clock);
                    if let Some(item) = self.items.get_mut(&id) {
                        item.deleted = true;
                    }
                }
            }
        }

        self.emit_update(newly_integrated, update.delete_set, UpdateOrigin::Remote);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::Text;
    use std::sync::Arc;

    fn doc(id: &str) -> Doc {
        Doc::new(ClientId::from(id))
    }

    #[test]
    fn local_insert_and_materialize() {
        let mut d = doc("alice");
        Text::new(&mut d, "content").insert(0, "Hello").unwrap();
        assert_eq!(Text::new(&mut d, "content").content(), "Hello");
    }

    #[test]
    fn local_delete_fires_an_update_listener() {
        // A local delete must be observable through `on_update`, the only
        // hook a room facade forwards to the transport (§4.2, §4.6); a
        // delete that only fires `TextEvent` would never reach peers.
        let mut d = doc("alice");
        Text::new(&mut d, "content").insert(0, "Hello").unwrap();
        let updates = Arc::new(std::sync::Mutex::new(0usize));
        let counted = updates.clone();
        d.on_update(move |update| {
            if update.origin == UpdateOrigin::Local && !update.delete_set.is_empty() {
                *counted.lock().unwrap() += 1;
            }
        });
        Text::new(&mut d, "content").delete(0, 2).unwrap();
        assert_eq!(*updates.lock().unwrap(), 1);
        assert_eq!(Text::new(&mut d, "content").content(), "llo");
    }

    #[test]
    fn remote_replica_converges_after_delete() {
        let mut a = doc("alice");
        Text::new(&mut a, "content").insert(0, "Hello").unwrap();
        let mut b = doc("bob");
        b.apply_update(a.get_update(None)).unwrap();
        assert_eq!(Text::new(&mut b, "content").content(), "Hello");

        Text::new(&mut a, "content").delete(1, 3).unwrap();
        let mut target = StateVector::new();
        target.advance(&ClientId::from("alice"), 5);
        let delete_update = a.get_update(Some(&target));
        b.apply_update(delete_update).unwrap();
        assert_eq!(Text::new(&mut b, "content").content(), "Ho");
    }

    #[test]
    fn concurrent_inserts_converge_scenario_1() {
        // §8 scenario 1: A inserts "Hello" at 0, B inserts "World" at 0 of an
        // empty doc, both starting from the same empty state vector.
        let mut a = doc("alice");
        let mut b = doc("bob");
        Text::new(&mut a, "content").insert(0, "Hello").unwrap();
        Text::new(&mut b, "content").insert(0, "World").unwrap();

        let update_a = a.get_update(None);
        let update_b = b.get_update(None);
        a.apply_update(update_b).unwrap();
        b.apply_update(update_a).unwrap();

        let final_a = Text::new(&mut a, "content").content();
        let final_b = Text::new(&mut b, "content").content();
        assert_eq!(final_a, final_b);
        assert!(final_a == "HelloWorld" || final_a == "WorldHello");
    }

    #[test]
    fn idempotent_apply() {
        let mut a = doc("alice");
        let mut b = doc("bob");
        Text::new(&mut a, "content").insert(0, "Hi").unwrap();
        let update = a.get_update(None);
        b.apply_update(update.clone()).unwrap();
        let content_once = Text::new(&mut b, "content").content();
        b.apply_update(update).unwrap();
        assert_eq!(Text::new(&mut b, "content").content(), content_once);
    }

    #[test]
    fn causal_deferral_reorders_to_same_state() {
        // B references A's item as origin; applying B before A must still
        // converge once A arrives.
        let mut a = doc("alice");
        Text::new(&mut a, "content").insert(0, "A").unwrap();
        let update_a = a.get_update(None);

        let mut bob_doc = doc("bob");
        bob_doc.apply_update(update_a.clone()).unwrap();
        Text::new(&mut bob_doc, "content").insert(1, "B").unwrap();

        // Only B's own item, excluding the A item bob already had.
        let mut already_has_alice = StateVector::new();
        already_has_alice.advance(&ClientId::from("alice"), 1);
        let update_b = bob_doc.get_update(Some(&already_has_alice));

        // carol applies B's update before A's; B's item names A's item as
        // `origin`, which carol has not seen yet, so integration must defer.
        let mut carol = doc("carol");
        carol.apply_update(update_b).unwrap();
        carol.apply_update(update_a).unwrap();
        assert_eq!(Text::new(&mut carol, "content").content(), "AB");
    }

    #[test]
    fn type_mismatch_on_same_name_errors() {
        use crate::array::Array;
        let mut d = doc("alice");
        Text::new(&mut d, "shared").insert(0, "x").unwrap();
        let err = Array::new(&mut d, "shared").push(vec![serde_json::json!(1)]);
        assert!(err.is_err());
    }
}
