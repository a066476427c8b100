use crate::element::{Element, ElementId};
use crate::System;

/// Trait for implementing element tree traversal operations.
///
/// The visitor receives callbacks when entering and exiting elements.
pub trait ElementVisitor {
    /// Called when entering an element (before visiting group members).
    ///
    /// Returns true to continue traversing members, false to skip the subtree.
    fn enter_element(&mut self, id: ElementId, element: &Element) -> bool;

    /// Called when exiting an element (after visiting group members).
    fn exit_element(&mut self, _id: ElementId, _element: &Element) {}
}

/// Walks the element tree depth-first starting from a given element.
pub fn walk_tree<V: ElementVisitor>(system: &System, id: ElementId, visitor: &mut V) {
    let Some(element) = system.get_element(id) else {
        return;
    };

    if visitor.enter_element(id, element) {
        if let Some(group) = element.as_group() {
            for &member in group.members() {
                walk_tree(system, member, visitor);
            }
        }
    }

    visitor.exit_element(id, element);
}

/// Walks every element of the system in container insertion order.
pub fn walk_system<V: ElementVisitor>(system: &System, visitor: &mut V) {
    for &id in system.root_elements() {
        walk_tree(system, id, visitor);
    }
}

/// Which leaf elements a [`LeafCollector`] keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LeafFilter {
    Surfaces,
    Sources,
    Any,
}

/// Collects leaf ids in traversal order, optionally pruning disabled subtrees.
pub(crate) struct LeafCollector {
    filter: LeafFilter,
    enabled_only: bool,
    pub(crate) found: Vec<ElementId>,
}

impl LeafCollector {
    pub(crate) fn new(filter: LeafFilter, enabled_only: bool) -> Self {
        Self {
            filter,
            enabled_only,
            found: Vec::new(),
        }
    }
}

impl ElementVisitor for LeafCollector {
    fn enter_element(&mut self, id: ElementId, element: &Element) -> bool {
        if self.enabled_only && !element.is_enabled() {
            return false;
        }
        let keep = match self.filter {
            LeafFilter::Surfaces => element.as_surface().is_some(),
            LeafFilter::Sources => element.as_source().is_some(),
            LeafFilter::Any => element.as_group().is_none(),
        };
        if keep {
            self.found.push(id);
        }
        true
    }
}
