//! Eligibility filtering of mutation requests.
//!
//! Before a request reaches the queue, the gateway asks an
//! [`EligibilityFilter`] whether the object belongs in the index at all.
//! Objects that are still being constructed are not part of the persisted
//! tree yet and must never be indexed; their requests are dropped.

use std::fmt::Debug;

use crate::content::ContentObject;
use crate::operation::TargetId;

/// Whether the filter should insist on a usable object id.
///
/// Unindex requests skip the id check: an object that is being removed may
/// already have lost its place in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdCheck {
    Required,
    Skip,
}

/// Decides which mutation requests may enter the queue.
pub trait EligibilityFilter: Send + Sync + Debug {
    /// The identity to queue, or `None` to drop the request.
    fn admit(&self, object: &ContentObject, check: IdCheck) -> Option<TargetId>;
}

/// Rejects transient objects and, when the id check applies, objects
/// without an id.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransientContentFilter;

impl EligibilityFilter for TransientContentFilter {
    fn admit(&self, object: &ContentObject, check: IdCheck) -> Option<TargetId> {
        if object.transient {
            return None;
        }
        if check == IdCheck::Required && object.id.local_id().is_empty() {
            return None;
        }
        Some(object.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_objects_are_rejected() {
        let filter = TransientContentFilter;
        let object = ContentObject::new("/site/draft").transient();
        assert_eq!(filter.admit(&object, IdCheck::Required), None);
        assert_eq!(filter.admit(&object, IdCheck::Skip), None);
    }

    #[test]
    fn test_missing_id_only_matters_when_checked() {
        let filter = TransientContentFilter;
        let object = ContentObject::new("/site/");
        assert_eq!(filter.admit(&object, IdCheck::Required), None);
        assert_eq!(
            filter.admit(&object, IdCheck::Skip),
            Some(TargetId::from("/site/"))
        );
    }

    #[test]
    fn test_persisted_objects_pass() {
        let filter = TransientContentFilter;
        let object = ContentObject::new("/site/news");
        assert_eq!(
            filter.admit(&object, IdCheck::Required),
            Some(TargetId::from("/site/news"))
        );
    }
}
