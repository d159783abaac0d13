//! Deterministic per-client color assignment (§4.5).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Derive a stable `hsl(h, s%, l%)` string from a client id, so the same
/// client always renders the same hue across reconnects and sessions.
#[must_use]
pub fn hsl_from_client_id(client_id: &str) -> String {
    let mut hasher = DefaultHasher::new();
    client_id.hash(&mut hasher);
    let hash = hasher.finish();
    let hue = (hash % 360) as u32;
    format!("hsl({hue}, 65%, 55%)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_client_id_always_yields_same_color() {
        assert_eq!(hsl_from_client_id("alice"), hsl_from_client_id("alice"));
    }

    #[test]
    fn different_client_ids_usually_differ() {
        assert_ne!(hsl_from_client_id("alice"), hsl_from_client_id("bob"));
    }
}
