//! `Text`: a collaborative string handle scoped to one named container.

use crate::delete_set::DeleteSet;
use crate::doc::{ContainerKind, Doc};
use crate::error::Result;
use crate::events::{DeltaOp, TextEvent, UpdateOrigin};
use crate::item::Content;

/// Handle returned by [`Doc::get_text`]-equivalent access, scoped to one
/// name for the lifetime of the borrow (§4.2 "Named types").
pub struct Text<'a> {
    doc: &'a mut Doc,
    name: String,
}

impl<'a> Text<'a> {
    /// Bind (or confirm the binding of) `name` as a Text container.
    pub fn new(doc: &'a mut Doc, name: impl Into<String>) -> Self {
        let name = name.into();
        doc.ensure_kind(&name, ContainerKind::Text)
            .expect("container type mismatch is a caller bug; validate with `try_new`");
        Text { doc, name }
    }

    /// Fallible variant of [`Text::new`] for callers that can't assume the
    /// binding is already consistent.
    pub fn try_new(doc: &'a mut Doc, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        doc.ensure_kind(&name, ContainerKind::Text)?;
        Ok(Text { doc, name })
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
    pub fn content(&self) -> String {
        self.doc
            .sequence_contents(&self.name)
            .into_iter()
            .filter_map(|(_, item)| item.content.as_char())
            .collect()
    }

    /// Insert `text` at `index`, one item per character (§9, Open Question
    /// 3: the reference doesn't coalesce adjacent same-client runs).
    pub fn insert(&mut self, index: usize, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let (mut left, right) = self.doc.neighbors_at(&self.name, index);
        let mut inserted = Vec::new();
        for ch in text.chars() {
            let id = self
                .doc
                .sequence_insert_one(&self.name, left.clone(), right.clone(), Content::Char(ch));
            left = Some(id.clone());
            inserted.push(id);
        }
        let items = inserted
            .into_iter()
            .filter_map(|id| self.doc.item_snapshot(&id))
            .collect::<Vec<_>>();
        self.emit_text(&TextEvent {
            delta: vec![DeltaOp::Insert {
                text: text.to_string(),
                attributes: None,
            }],
        });
        self.doc.emit_update(items, DeleteSet::new(), UpdateOrigin::Local);
        Ok(())
    }

    pub fn delete(&mut self, index: usize, length: usize) -> Result<()> {
        if length == 0 {
            return Ok(());
        }
        let deleted_ids = self.doc.sequence_delete(&self.name, index, length)?;
        self.emit_text(&TextEvent {
            delta: vec![DeltaOp::Delete { count: length }],
        });
        self.doc
            .emit_update(Vec::new(), DeleteSet::from_ids(&deleted_ids), UpdateOrigin::Local);
        Ok(())
    }

    /// Apply a Quill-style delta of insert/delete/retain ops (§3 "applyDelta").
    pub fn apply_delta(&mut self, ops: Vec<DeltaOp>) -> Result<()> {
        let mut cursor = 0usize;
        for op in ops {
            match op {
                DeltaOp::Retain { count, .. } => cursor += count,
                DeltaOp::Insert { text, attributes } => {
                    if let Some(attrs) = attributes {
                        let (mut left, right) = self.doc.neighbors_at(&self.name, cursor);
                        for ch in text.chars() {
                            let id = self.doc.sequence_insert_one(
                                &self.name,
                                left.clone(),
                                right.clone(),
                                Content::AttributedChar(ch, attrs.clone()),
                            );
                            left = Some(id);
                            cursor += 1;
                        }
                    } else {
                        let len = text.chars().count();
                        self.insert(cursor, &text)?;
                        cursor += len;
                    }
                }
                DeltaOp::Delete { count } => {
                    let deleted_ids = self.doc.sequence_delete(&self.name, cursor, count)?;
                    self.doc
                        .emit_update(Vec::new(), DeleteSet::from_ids(&deleted_ids), UpdateOrigin::Local);
                }
            }
        }
        Ok(())
    }

    fn emit_text(&self, event: &TextEvent) {
        self.doc.emit_text_event(&self.name, event);
    }
}
