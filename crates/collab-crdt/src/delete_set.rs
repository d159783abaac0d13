//! Delete set: a per-client set of deleted clock ranges (§3).

use collab_common::{ClientId, Clock, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A contiguous, inclusive-start/exclusive-end clock range `[start, start+len)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockRange {
    pub start: Clock,
    pub len: Clock,
}

impl ClockRange {
    #[must_use]
    pub fn contains(&self, clock: Clock) -> bool {
        clock >= self.start && clock < self.start + self.len
    }

    #[must_use]
    fn end(&self) -> Clock {
        self.start + self.len
    }
}

/// Idempotent record of deleted items, keyed by client.
///
/// Deletes always win over concurrent insertions into the same clock range
/// (§3): applying the same range twice, or applying it before or after the
/// matching insert arrives, leaves the same final state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeleteSet(HashMap<ClientId, Vec<ClockRange>>);

impl DeleteSet {
    #[must_use]
    pub fn new() -> Self {
        DeleteSet::default()
    }

    /// Build a delete set naming exactly `ids`, for emitting the delta of a
    /// single local delete (§4.2 "mutations fire listeners with ... an
    /// `update`").
    #[must_use]
    pub fn from_ids(ids: &[ItemId]) -> Self {
        let mut set = DeleteSet::new();
        for id in ids {
            set.add(&id.client, id.clock);
        }
        set
    }

    /// Record that `clock` on `client` has been deleted, merging with an
    /// adjacent or overlapping range when possible so the set stays compact.
    pub fn add(&mut self, client: &ClientId, clock: Clock) {
        self.add_range(client, clock, 1);
    }

    pub fn add_range(&mut self, client: &ClientId, start: Clock, len: Clock) {
        if len == 0 {
            return;
        }
        let ranges = self.0.entry(client.clone()).or_default();
        ranges.push(ClockRange { start, len });
        ranges.sort_by_key(|r| r.start);
        merge_adjacent(ranges);
    }

    #[must_use]
    pub fn contains(&self, client: &ClientId, clock: Clock) -> bool {
        self.0
            .get(client)
            .is_some_and(|ranges| ranges.iter().any(|r| r.contains(clock)))
    }

    pub fn ranges_for(&self, client: &ClientId) -> &[ClockRange] {
        self.0.get(client).map_or(&[], Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ClientId, &Vec<ClockRange>)> {
        self.0.iter()
    }

    /// Merge another delete set into this one (used when applying a remote
    /// update, §4.2 step 3).
    pub fn merge(&mut self, other: &DeleteSet) {
        for (client, ranges) in &other.0 {
            for r in ranges {
                self.add_range(client, r.start, r.len);
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }
}

fn merge_adjacent(ranges: &mut Vec<ClockRange>) {
    let mut merged: Vec<ClockRange> = Vec::with_capacity(ranges.len());
    for r in ranges.drain(..) {
        if let Some(last) = merged.last_mut() {
            if r.start <= last.end() {
                let new_end = last.end().max(r.end());
                last.len = new_end - last.start;
                continue;
            }
        }
        merged.push(r);
    }
    *ranges = merged;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_overlapping_and_adjacent_ranges() {
        let mut ds = DeleteSet::new();
        let alice = ClientId::from("alice");
        ds.add_range(&alice, 0, 3); // [0,3)
        ds.add_range(&alice, 3, 2); // [3,5) adjacent -> merges to [0,5)
        ds.add_range(&alice, 10, 2); // disjoint
        assert_eq!(ds.ranges_for(&alice).len(), 2);
        assert!(ds.contains(&alice, 4));
        assert!(!ds.contains(&alice, 5));
        assert!(ds.contains(&alice, 10));
    }

    #[test]
    fn double_delete_is_idempotent() {
        let mut ds = DeleteSet::new();
        let alice = ClientId::from("alice");
        ds.add(&alice, 5);
        ds.add(&alice, 5);
        assert_eq!(ds.ranges_for(&alice).len(), 1);
        assert!(ds.contains(&alice, 5));
    }
}
