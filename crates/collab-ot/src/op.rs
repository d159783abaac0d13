//! Insert/delete/retain operations over a flat text buffer.

use crate::error::{OtError, Result};
use serde::{Deserialize, Serialize};

/// One operation in an OT op list. Positions and lengths are in chars, not
/// bytes, so a buffer is manipulated as a `Vec<char>` throughout this crate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Op {
    Insert { position: usize, text: String },
    Delete { position: usize, length: usize },
    Retain { count: usize },
}

/// Apply a single op to `text`, returning the resulting text.
pub fn apply_operation(text: &str, op: &Op) -> Result<String> {
    let mut chars: Vec<char> = text.chars().collect();
    match op {
        Op::Insert { position, text: insert } => {
            if *position > chars.len() {
                tracing::warn!(position, length = chars.len(), "insert position out of bounds");
                return Err(OtError::PositionOutOfBounds { position: *position, length: chars.len() });
            }
            chars.splice(*position..*position, insert.chars());
        }
        Op::Delete { position, length } => {
            let end = position + length;
            if end > chars.len() {
                tracing::warn!(position = end, length = chars.len(), "delete range out of bounds");
                return Err(OtError::PositionOutOfBounds { position: end, length: chars.len() });
            }
            chars.drain(*position..end);
        }
        Op::Retain { .. } => {}
    }
    Ok(chars.into_iter().collect())
}

/// Fold a list of ops over `text` in order.
pub fn apply_operations(text: &str, ops: &[Op]) -> Result<String> {
    let mut current = text.to_string();
    for op in ops {
        current = apply_operation(&current, op)?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_delete_compose() {
        let text = apply_operations(
            "abc",
            &[
                Op::Insert { position: 1, text: "X".into() },
                Op::Delete { position: 0, length: 1 },
            ],
        )
        .unwrap();
        assert_eq!(text, "Xbc");
    }

    #[test]
    fn out_of_bounds_insert_errors() {
        let err = apply_operation("abc", &Op::Insert { position: 10, text: "x".into() });
        assert!(err.is_err());
    }
}
