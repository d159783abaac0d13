//! A single CRDT item (§3 "CRDT Item").

use collab_common::ItemId;
use serde::{Deserialize, Serialize};

/// The opaque payload an item carries.
///
/// Text and Array items hold one element each (length is always 1 for
/// both — see `Open Question 3`: the reference does not coalesce adjacent
/// same-client items, and this port preserves that rather than building a
/// rope). Map items hold one written value per `set` call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Char(char),
    /// A character inserted via `applyDelta` with an attribute map attached.
    /// The map is an opaque blob (§1 Non-goals: no rich-text attribute
    /// merging) carried alongside the character, not merged itself.
    AttributedChar(char, serde_json::Value),
    Value(serde_json::Value),
}

impl Content {
    #[must_use]
    pub fn as_char(&self) -> Option<char> {
        match self {
            Content::Char(c) | Content::AttributedChar(c, _) => Some(*c),
            Content::Value(serde_json::Value::String(s)) if s.chars().count() == 1 => {
                s.chars().next()
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn attributes(&self) -> Option<&serde_json::Value> {
        match self {
            Content::AttributedChar(_, attrs) => Some(attrs),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_value(&self) -> serde_json::Value {
        match self {
            Content::Char(c) | Content::AttributedChar(c, _) => serde_json::Value::String(c.to_string()),
            Content::Value(v) => v.clone(),
        }
    }
}

/// A CRDT item: an immutable insertion plus a mutable `deleted` flag (§3).
///
/// `origin`/`rightOrigin` name neighbors by [`ItemId`] value, never by
/// pointer, so the item store can stay a flat map (§9 "Cyclic references").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Left neighbor at insertion time, or `None` if inserted at the start.
    pub origin: Option<ItemId>,
    /// Right neighbor at insertion time, or `None` if inserted at the end.
    pub right_origin: Option<ItemId>,
    /// The named container this item belongs to.
    pub parent: String,
    /// Map key, or `None` for Text/Array items.
    pub parent_sub: Option<String>,
    pub content: Content,
    pub deleted: bool,
    /// Always 1 in this port; kept as a field so a coalescing
    /// implementation could widen it without changing the wire shape.
    pub length: u64,
}

impl Item {
    #[must_use]
    pub fn new(
        id: ItemId,
        origin: Option<ItemId>,
        right_origin: Option<ItemId>,
        parent: impl Into<String>,
        parent_sub: Option<String>,
        content: Content,
    ) -> Self {
        Item {
            id,
            origin,
            right_origin,
            parent: parent.into(),
            parent_sub,
            content,
            deleted: false,
            length: 1,
        }
    }
}
