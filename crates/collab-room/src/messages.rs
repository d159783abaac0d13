//! `sync` envelope payload shapes (§6).

use collab_awareness::AwarenessState;
use collab_crdt::Update;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SyncMessage {
    Request,
    State {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        doc: Option<Update>,
        #[serde(default)]
        awareness: Vec<AwarenessState>,
    },
}
