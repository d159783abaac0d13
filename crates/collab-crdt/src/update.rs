//! Wire `Update`: a diff of items plus the delete set (§3, §6).

use crate::delete_set::DeleteSet;
use crate::item::Item;
use serde::{Deserialize, Serialize};

/// Serializable diff transmitted between replicas over `operation` messages.
///
/// A recipient applies it by integrating `items` then applying `delete_set`
/// (§3 "Update"). `getUpdate()` with no target state vector returns the full
/// document state, used for first-connect catch-up.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Update {
    pub items: Vec<Item>,
    pub delete_set: DeleteSet,
}

impl Update {
    #[must_use]
    pub fn new(items: Vec<Item>, delete_set: DeleteSet) -> Self {
        Update { items, delete_set }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.delete_set.is_empty()
    }
}
