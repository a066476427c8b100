use cgmath::{EuclideanSpace, Point3};
use optrace_common::Transform;

use crate::source::Source;
use crate::surface::Surface;

/// Identifier of an element registered in a [`crate::System`].
///
/// Ids start at 1; 0 designates the system's own frame.
pub type ElementId = u32;

/// Frame id of the system root, used as "global" end of transform queries.
pub const SYSTEM_FRAME: ElementId = 0;

/// What an element is. Replaces runtime type inspection: callers match on
/// the kind or use the `as_*` accessors.
#[derive(Debug)]
pub enum ElementKind {
    Group(Group),
    Surface(Surface),
    Source(Source),
}

/// An ordered container of elements nested inside the system tree.
///
/// Before registration a group holds its members by value; once added to a
/// system the members are registered in order and the group keeps their ids.
#[derive(Debug, Default)]
pub struct Group {
    members: Vec<ElementId>,
    detached: Vec<Element>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a member that will be registered when the group is added to a system.
    pub fn with_member(mut self, element: Element) -> Self {
        self.detached.push(element);
        self
    }

    /// Ids of the registered members, in insertion order.
    pub fn members(&self) -> &[ElementId] {
        &self.members
    }

    /// Members still waiting for registration.
    pub fn detached(&self) -> &[Element] {
        &self.detached
    }

    pub(crate) fn push_member(&mut self, id: ElementId) {
        self.members.push(id);
    }

    pub(crate) fn remove_member(&mut self, id: ElementId) {
        self.members.retain(|&m| m != id);
    }

    pub(crate) fn take_members(&mut self) -> Vec<ElementId> {
        std::mem::take(&mut self.members)
    }

    pub(crate) fn take_detached(&mut self) -> Vec<Element> {
        std::mem::take(&mut self.detached)
    }

    pub(crate) fn push_detached(&mut self, element: Element) {
        self.detached.push(element);
    }
}

/// A positioned node of the optical system tree.
#[derive(Debug)]
pub struct Element {
    id: Option<ElementId>,
    name: Option<String>,

    // Pose relative to the parent container
    local: Transform,
    enabled: bool,
    version: u64,

    // Hierarchy (None = system root container)
    parent: Option<ElementId>,

    kind: ElementKind,
}

impl Element {
    /// Creates a detached element with an identity pose.
    pub fn new(kind: ElementKind) -> Self {
        Self {
            id: None,
            name: None,
            local: Transform::identity(),
            enabled: true,
            version: 0,
            parent: None,
            kind,
        }
    }

    pub fn group(group: Group) -> Self {
        Self::new(ElementKind::Group(group))
    }

    pub fn surface(surface: Surface) -> Self {
        Self::new(ElementKind::Surface(surface))
    }

    pub fn source(source: Source) -> Self {
        Self::new(ElementKind::Source(source))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.set_local_transform(transform);
        self
    }

    /// Places the element at `position` in its parent frame, keeping its orientation.
    pub fn with_position(self, position: Point3<f64>) -> Self {
        let transform = Transform::new(self.local.rotation, position.to_vec());
        self.with_transform(transform)
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Id within the owning system, or None while detached.
    pub fn id(&self) -> Option<ElementId> {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Pose relative to the parent container.
    pub fn local_transform(&self) -> &Transform {
        &self.local
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Incremented on every pose or enable change.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Parent group id, or None for members of the system root.
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn as_group(&self) -> Option<&Group> {
        match &self.kind {
            ElementKind::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_surface(&self) -> Option<&Surface> {
        match &self.kind {
            ElementKind::Surface(surface) => Some(surface),
            _ => None,
        }
    }

    pub fn as_surface_mut(&mut self) -> Option<&mut Surface> {
        match &mut self.kind {
            ElementKind::Surface(surface) => Some(surface),
            _ => None,
        }
    }

    pub fn as_source(&self) -> Option<&Source> {
        match &self.kind {
            ElementKind::Source(source) => Some(source),
            _ => None,
        }
    }

    pub fn as_source_mut(&mut self) -> Option<&mut Source> {
        match &mut self.kind {
            ElementKind::Source(source) => Some(source),
            _ => None,
        }
    }

    /// True for surfaces that send light back (mirrors).
    pub fn is_reflecting(&self) -> bool {
        self.as_surface().is_some_and(|s| s.is_reflecting())
    }

    pub(crate) fn group_mut(&mut self) -> Option<&mut Group> {
        match &mut self.kind {
            ElementKind::Group(group) => Some(group),
            _ => None,
        }
    }

    pub(crate) fn set_local_transform(&mut self, transform: Transform) {
        self.local = transform;
        self.version += 1;
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.version += 1;
    }

    pub(crate) fn register(&mut self, id: ElementId, parent: Option<ElementId>) {
        self.id = Some(id);
        self.parent = parent;
    }

    pub(crate) fn unregister(&mut self) {
        self.id = None;
        self.parent = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn test_detached_element_has_no_id() {
        let element = Element::group(Group::new()).with_name("lens");
        assert_eq!(element.id(), None);
        assert_eq!(element.parent(), None);
        assert_eq!(element.name(), Some("lens"));
        assert!(element.is_enabled());
    }

    #[test]
    fn test_pose_changes_bump_version() {
        let element = Element::group(Group::new())
            .with_position(Point3::new(0.0, 0.0, 5.0))
            .with_transform(Transform::from_translation(Vector3::new(1.0, 0.0, 0.0)));
        assert_eq!(element.version(), 2);
        assert_eq!(element.local_transform().translation, Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_group_collects_detached_members() {
        let group = Group::new()
            .with_member(Element::group(Group::new()))
            .with_member(Element::group(Group::new()));
        assert_eq!(group.detached().len(), 2);
        assert!(group.members().is_empty());
    }

    #[test]
    fn test_kind_accessors() {
        let element = Element::group(Group::new());
        assert!(element.as_group().is_some());
        assert!(element.as_surface().is_none());
        assert!(element.as_source().is_none());
        assert!(!element.is_reflecting());
    }
}
