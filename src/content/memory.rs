//! In-memory content store.

use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::content::{ContentObject, ContentStore};
use crate::error::{IndexQueueError, Result};
use crate::operation::TargetId;

/// Thread-safe content store keeping objects in insertion order.
///
/// Clones share the same underlying objects.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentStore {
    objects: Arc<RwLock<IndexMap<TargetId, ContentObject>>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object. Replacing keeps its container position.
    pub fn insert(&self, object: ContentObject) {
        self.objects.write().insert(object.id.clone(), object);
    }

    /// Remove an object, returning its last state.
    pub fn remove(&self, target: &TargetId) -> Option<ContentObject> {
        self.objects.write().shift_remove(target)
    }

    pub fn get(&self, target: &TargetId) -> Option<ContentObject> {
        self.objects.read().get(target).cloned()
    }

    /// Apply a change to a stored object in place.
    pub fn update<F>(&self, target: &TargetId, change: F) -> Result<ContentObject>
    where
        F: FnOnce(&mut ContentObject),
    {
        let mut objects = self.objects.write();
        let object = objects
            .get_mut(target)
            .ok_or_else(|| IndexQueueError::resolution(format!("no object at {target}")))?;
        change(object);
        Ok(object.clone())
    }

    /// Move a child to a new position among its siblings.
    pub fn move_to_position(&self, target: &TargetId, position: usize) -> Result<()> {
        let mut objects = self.objects.write();
        let from = objects
            .get_index_of(target)
            .ok_or_else(|| IndexQueueError::resolution(format!("no object at {target}")))?;
        let parent = target.parent();

        // Translate the sibling position into a position in the whole map.
        let siblings: Vec<usize> = objects
            .keys()
            .enumerate()
            .filter(|(_, id)| id.parent() == parent)
            .map(|(index, _)| index)
            .collect();
        let to = siblings
            .get(position)
            .copied()
            .or_else(|| siblings.last().copied())
            .unwrap_or(from);
        objects.move_index(from, to);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl ContentStore for MemoryContentStore {
    fn resolve(&self, target: &TargetId) -> Result<ContentObject> {
        self.get(target)
            .ok_or_else(|| IndexQueueError::resolution(format!("no object at {target}")))
    }

    fn children(&self, parent: &TargetId) -> Result<Vec<ContentObject>> {
        let objects = self.objects.read();
        Ok(objects
            .values()
            .filter(|object| object.id.parent().as_ref() == Some(parent))
            .cloned()
            .collect())
    }

    fn notify_modified(&self, target: &TargetId) -> Result<()> {
        self.update(target, |object| object.modified = Utc::now())
            .map(|_| ())
    }
}
