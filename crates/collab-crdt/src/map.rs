//! `Map`: a collaborative key/value handle scoped to one named container.
//!
//! Concurrent writes to the same key resolve by last-writer-wins, where
//! "last" means highest [`collab_common::ItemId`] (client, then clock) — the
//! same tie-break the sequence types use, so a single comparator covers both.

use crate::doc::{ContainerKind, Doc};
use crate::error::Result;
use crate::events::MapEvent;

pub struct Map<'a> {
    doc: &'a mut Doc,
    name: String,
}

impl<'a> Map<'a> {
    pub fn new(doc: &'a mut Doc, name: impl Into<String>) -> Self {
        let name = name.into();
        doc.ensure_kind(&name, ContainerKind::Map)
            .expect("container type mismatch is a caller bug; validate with `try_new`");
        Map { doc, name }
    }

    pub fn try_new(doc: &'a mut Doc, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        doc.ensure_kind(&name, ContainerKind::Map)?;
        Ok(Map { doc, name })
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.doc.map_get(&self.name, key)
    }

    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.doc.map_has(&self.name, key)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.doc.map_keys(&self.name)
    }

    pub fn set(&mut self, key: &str, value: serde_json::Value) {
        let id = self.doc.map_set_one(&self.name, key, value.clone());
        if let Some(item) = self.doc.item_snapshot(&id) {
            self.doc
                .emit_update(vec![item], crate::delete_set::DeleteSet::new(), crate::events::UpdateOrigin::Local);
        }
        self.doc.emit_map_event(&self.name, &MapEvent::Set { key: key.to_string(), value });
    }

    pub fn delete(&mut self, key: &str) {
        let deleted_ids = self.doc.map_delete(&self.name, key);
        self.doc.emit_map_event(&self.name, &MapEvent::Delete { key: key.to_string() });
        self.doc.emit_update(
            Vec::new(),
            crate::delete_set::DeleteSet::from_ids(&deleted_ids),
            crate::events::UpdateOrigin::Local,
        );
    }
}
