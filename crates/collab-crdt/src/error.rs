//! Error types for the CRDT document.

use thiserror::Error;

/// Result type for CRDT document operations.
pub type Result<T> = std::result::Result<T, CrdtError>;

/// Errors the document can raise.
///
/// Most operational failures (§7) surface as rejected updates rather than
/// panics; only programmer errors (wrong container type for a name) throw
/// synchronously, matching the "configuration error" kind in the spec.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CrdtError {
    /// A name was accessed with a container kind different from the one it
    /// was first bound to (§4.2 "a single name is bound to exactly one type").
    #[error("container '{name}' is bound to {expected:?}, not {actual:?}")]
    ContainerTypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Items are still waiting on a referent that never arrived. Items
    /// genuinely out of causal order (§4.2 "Items may arrive out of causal
    /// order") stay queued across calls to `apply_update` and are not an
    /// error by themselves; this is only raised by
    /// [`crate::Doc::reject_if_stuck`], which a room facade can poll to
    /// surface a truly corrupt peer (§7) rather than ordinary reordering.
    #[error("{0} item(s) still waiting on a referent that never arrived")]
    UnsatisfiableOrigin(usize),

    /// `index` is beyond the container's current materialized length.
    #[error("index {index} out of bounds (length {length})")]
    IndexOutOfBounds { index: usize, length: usize },

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
