//! `Array`: a collaborative ordered-list handle scoped to one named container.

use crate::delete_set::DeleteSet;
use crate::doc::{ContainerKind, Doc};
use crate::error::Result;
use crate::events::{ArrayEvent, UpdateOrigin};
use crate::item::Content;

pub struct Array<'a> {
    doc: &'a mut Doc,
    name: String,
}

impl<'a> Array<'a> {
    pub fn new(doc: &'a mut Doc, name: impl Into<String>) -> Self {
        let name = name.into();
        doc.ensure_kind(&name, ContainerKind::Array)
            .expect("container type mismatch is a caller bug; validate with `try_new`");
        Array { doc, name }
    }

    pub fn try_new(doc: &'a mut Doc, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        doc.ensure_kind(&name, ContainerKind::Array)?;
        Ok(Array { doc, name })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.doc.visible_len(&self.name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<serde_json::Value> {
        self.doc
            .sequence_contents(&self.name)
            .into_iter()
            .map(|(_, item)| item.content.as_value())
            .collect()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<serde_json::Value> {
        self.to_vec().into_iter().nth(index)
    }

    pub fn push(&mut self, values: Vec<serde_json::Value>) -> Result<()> {
        let len = self.len();
        self.insert(len, values)
    }

    pub fn insert(&mut self, index: usize, values: Vec<serde_json::Value>) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        let (mut left, right) = self.doc.neighbors_at(&self.name, index);
        let mut inserted = Vec::new();
        for value in &values {
            let id = self.doc.sequence_insert_one(
                &self.name,
                left.clone(),
                right.clone(),
                Content::Value(value.clone()),
            );
            left = Some(id.clone());
            inserted.push(id);
        }
        let items = inserted
            .into_iter()
            .filter_map(|id| self.doc.item_snapshot(&id))
            .collect::<Vec<_>>();
        self.doc.emit_array_event(&self.name, &ArrayEvent::Insert { index, values });
        self.doc.emit_update(items, DeleteSet::new(), UpdateOrigin::Local);
        Ok(())
    }

    pub fn delete(&mut self, index: usize, count: usize) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let deleted_ids = self.doc.sequence_delete(&self.name, index, count)?;
        self.doc
            .emit_array_event(&self.name, &ArrayEvent::Delete { index, count });
        self.doc
            .emit_update(Vec::new(), DeleteSet::from_ids(&deleted_ids), UpdateOrigin::Local);
        Ok(())
    }
}
