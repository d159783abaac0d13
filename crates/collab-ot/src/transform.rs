//! The `transform` function: reconciling two concurrent op lists (§4.3).

use crate::op::Op;

/// Tie-break used when two inserts land at the same position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Priority {
    Left,
    Right,
}

/// Return the version of `a` to apply *after* `b` has already been applied,
/// preserving the combined intent of both.
#[must_use]
pub fn transform(a: &Op, b: &Op, priority: Priority) -> Op {
    match (a, b) {
        (Op::Retain { .. }, _) | (_, Op::Retain { .. }) => a.clone(),

        (Op::Insert { position: a_pos, text: a_text }, Op::Insert { position: b_pos, text: b_text }) => {
            if *a_pos < *b_pos || (*a_pos == *b_pos && priority == Priority::Left) {
                a.clone()
            } else {
                Op::Insert { position: a_pos + b_text.chars().count(), text: a_text.clone() }
            }
        }

        (Op::Insert { position: a_pos, text: a_text }, Op::Delete { position: b_pos, length: b_len }) => {
            if *a_pos <= *b_pos {
                a.clone()
            } else if *a_pos >= b_pos + b_len {
                Op::Insert { position: a_pos - b_len, text: a_text.clone() }
            } else {
                Op::Insert { position: *b_pos, text: a_text.clone() }
            }
        }

        (Op::Delete { position: a_pos, length: a_len }, Op::Insert { position: b_pos, text: b_text }) => {
            let a_end = a_pos + a_len;
            if a_end <= *b_pos {
                a.clone()
            } else if a_pos >= b_pos {
                Op::Delete { position: a_pos + b_text.chars().count(), length: *a_len }
            } else {
                // The insert lands inside the deleted range. A fully correct
                // transform would split `a` around it (§9 Open Question 2);
                // the documented behavior leaves position and length as-is.
                a.clone()
            }
        }

        (Op::Delete { position: a_pos, length: a_len }, Op::Delete { position: b_pos, length: b_len }) => {
            let a_end = a_pos + a_len;
            let b_end = b_pos + b_len;
            if a_end <= *b_pos {
                // disjoint, a entirely left of b
                a.clone()
            } else if a_pos >= b_end {
                // disjoint, a entirely right of b
                Op::Delete { position: a_pos - b_len, length: *a_len }
            } else if a_pos >= b_pos && a_end <= b_end {
                // a fully inside b: already removed by b
                Op::Delete { position: *b_pos, length: 0 }
            } else if a_pos <= b_pos && a_end >= b_end {
                // b fully inside a: shorten a by b's length
                Op::Delete { position: *a_pos, length: a_len - b_len }
            } else if a_pos < b_pos {
                // overlap at a's end
                Op::Delete { position: *a_pos, length: b_pos - a_pos }
            } else {
                // overlap at a's start
                Op::Delete { position: *b_pos, length: a_end - b_end }
            }
        }
    }
}

/// Transform every op in `list_a` against every op in `list_b`, in order,
/// so the result can be applied to a buffer that already has `list_b`
/// applied without losing either side's intent.
#[must_use]
pub fn transform_operations(list_a: &[Op], list_b: &[Op], priority: Priority) -> Vec<Op> {
    let mut result = list_a.to_vec();
    for b in list_b {
        result = result.iter().map(|a| transform(a, b, priority)).collect();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::apply_operations;

    #[test]
    fn scenario_server_rebases_delete_past_insert() {
        // §8 scenario 6: insert(1, "X") then delete(0, 1) rebased against it.
        let insert = Op::Insert { position: 1, text: "X".into() };
        let delete = Op::Delete { position: 0, length: 1 };
        let rebased = transform(&delete, &insert, Priority::Right);
        assert_eq!(rebased, Op::Delete { position: 0, length: 1 });

        let after_insert = apply_operations("abc", std::slice::from_ref(&insert)).unwrap();
        let after_both = apply_operations(&after_insert, std::slice::from_ref(&rebased)).unwrap();
        assert_eq!(after_both, "Xbc");
    }

    #[test]
    fn fixpoint_property_holds_for_disjoint_inserts() {
        let a = Op::Insert { position: 0, text: "A".into() };
        let b = Op::Insert { position: 1, text: "B".into() };
        let text = "xy";

        let a_prime = transform(&a, &b, Priority::Left);
        let b_prime = transform(&b, &a, Priority::Right);

        let left = apply_operations(&apply_operations(text, &[b.clone()]).unwrap(), &[a_prime]).unwrap();
        let right = apply_operations(&apply_operations(text, &[a]).unwrap(), &[b_prime]).unwrap();
        assert_eq!(left, right);
    }
}
