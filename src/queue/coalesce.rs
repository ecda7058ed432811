//! Merging of a new operation into the one already pending for a target.
//!
//! The rules never under-index: a merged operation is at least as inclusive
//! as running the two originals in sequence. It may do more work (a full
//! reindex where a partial one would do), never less.

use crate::operation::{Attributes, OperationKind};

/// Combine the pending operation for a target (if any) with a new one.
///
/// Returns the operation to keep, or `None` when the entry should be
/// dropped entirely.
///
/// | existing   | incoming   | result            |
/// |------------|------------|-------------------|
/// | none       | any        | incoming          |
/// | Index      | Unindex    | none              |
/// | Index      | Index      | Index             |
/// | Index      | Reindex(A) | Index             |
/// | Unindex    | Index      | Reindex(All)      |
/// | Unindex    | Unindex    | Unindex           |
/// | Unindex    | Reindex(A) | Unindex           |
/// | Reindex(A) | Index      | Reindex(All)      |
/// | Reindex(A) | Unindex    | Unindex           |
/// | Reindex(A) | Reindex(B) | Reindex(A ∪ B)    |
pub fn combine(existing: Option<&OperationKind>, incoming: OperationKind) -> Option<OperationKind> {
    use OperationKind::*;

    let Some(existing) = existing else {
        return Some(incoming);
    };

    match (existing, incoming) {
        // Never visible in the index during this unit of work.
        (Index, Unindex) => None,
        // The eventual index call reads current attribute values.
        (Index, Index) | (Index, Reindex(_)) => Some(Index),
        // The object may still be in the engine from an earlier unit of work.
        (Unindex, Index) | (Reindex(_), Index) => Some(Reindex(Attributes::All)),
        (Unindex, Unindex) | (Unindex, Reindex(_)) => Some(Unindex),
        (Reindex(_), Unindex) => Some(Unindex),
        (Reindex(pending), Reindex(requested)) => Some(Reindex(pending.clone().union(requested))),
    }
}
