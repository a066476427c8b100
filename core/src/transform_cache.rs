use std::collections::{HashMap, HashSet};

use optrace_common::Transform;

use crate::element::ElementId;

/// Memoized frame-to-frame transforms keyed by `(from, to)` element ids.
///
/// `(id, SYSTEM_FRAME)` holds the global transform of `id` and
/// `(SYSTEM_FRAME, id)` its inverse. Missing keys are "not yet computed".
#[derive(Debug, Default)]
pub(crate) struct TransformCache {
    entries: HashMap<(ElementId, ElementId), Transform>,
}

impl TransformCache {
    pub(crate) fn get(&self, from: ElementId, to: ElementId) -> Option<Transform> {
        self.entries.get(&(from, to)).copied()
    }

    pub(crate) fn insert(&mut self, from: ElementId, to: ElementId, transform: Transform) {
        self.entries.insert((from, to), transform);
    }

    /// Drops every entry with `ids` on either end. Returns the number of entries dropped.
    pub(crate) fn flush(&mut self, ids: &HashSet<ElementId>) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|(from, to), _| !ids.contains(from) && !ids.contains(to));
        before - self.entries.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn test_flush_drops_both_directions() {
        let mut cache = TransformCache::default();
        let t = Transform::from_translation(Vector3::new(1.0, 0.0, 0.0));
        cache.insert(1, 0, t);
        cache.insert(0, 1, t.inverse());
        cache.insert(2, 1, t);
        cache.insert(2, 3, t);

        let dropped = cache.flush(&HashSet::from([1]));
        assert_eq!(dropped, 3);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(2, 3).is_some());
        assert!(cache.get(1, 0).is_none());
    }
}
