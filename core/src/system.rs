use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use cgmath::{EuclideanSpace, Point3, Vector3};
use optrace_common::Transform;

use crate::element::{Element, ElementId, SYSTEM_FRAME};
use crate::error::TraceError;
use crate::material::{Material, Vacuum};
use crate::params::Params;
use crate::source::Source;
use crate::surface::Surface;
use crate::transform_cache::TransformCache;
use crate::tree::{walk_system, walk_tree, ElementVisitor, LeafCollector, LeafFilter};

/// Root container of an optical system.
///
/// The system owns every registered element in an id table, the environment
/// material surrounding them, the pupil designations, default trace
/// parameters and a cache of coordinate transforms between element frames.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use cgmath::Point3;
/// use optrace::{Disk, Element, Flat, Surface, System};
///
/// let mut system = System::new();
/// let image = Surface::image(Rc::new(Flat), Rc::new(Disk::new(20.0)));
/// let id = system.add(Element::surface(image).with_position(Point3::new(0.0, 0.0, 100.0)));
///
/// let global = system.get_global_transform(id).unwrap();
/// assert_eq!(global.position(), Point3::new(0.0, 0.0, 100.0));
/// ```
#[derive(Debug)]
pub struct System {
    elements: HashMap<ElementId, Element>,
    root_elements: Vec<ElementId>,

    environment: Rc<dyn Material>,
    entrance_pupil: Option<ElementId>,
    exit_pupil: Option<ElementId>,
    params: Params,

    next_element_id: ElementId,
    version: u64,

    // Keyed by (from, to); lazily filled by the transform queries
    transforms: RefCell<TransformCache>,
}

impl Default for System {
    fn default() -> Self {
        Self::new()
    }
}

impl System {
    /// Creates an empty system surrounded by vacuum.
    pub fn new() -> Self {
        Self::with_environment(Rc::new(Vacuum))
    }

    /// Creates an empty system surrounded by `environment`.
    pub fn with_environment(environment: Rc<dyn Material>) -> Self {
        Self {
            elements: HashMap::new(),
            root_elements: Vec::new(),
            environment,
            entrance_pupil: None,
            exit_pupil: None,
            params: Params::default(),
            next_element_id: 1,
            version: 0,
            transforms: RefCell::new(TransformCache::default()),
        }
    }

    // ========== Container API ==========

    /// Adds an element at the root of the system.
    ///
    /// Group members are registered recursively, in order, right after their group.
    ///
    /// # Returns
    /// The id assigned to the element
    pub fn add(&mut self, element: Element) -> ElementId {
        let id = self.register(element, None);
        self.root_elements.push(id);
        self.version += 1;
        id
    }

    /// Adds an element as the last member of a registered group.
    pub fn add_to(&mut self, group: ElementId, element: Element) -> Result<ElementId, TraceError> {
        let parent = self
            .elements
            .get(&group)
            .ok_or(TraceError::UnknownElement(group))?;
        if parent.as_group().is_none() {
            return Err(TraceError::configuration(format!(
                "element {group} is not a group and cannot contain other elements"
            )));
        }

        let id = self.register(element, Some(group));
        if let Some(parent) = self.elements.get_mut(&group).and_then(|e| e.group_mut()) {
            parent.push_member(id);
        }
        self.version += 1;
        Ok(id)
    }

    fn register(&mut self, mut element: Element, parent: Option<ElementId>) -> ElementId {
        let id = self.next_element_id;
        self.next_element_id += 1;

        let members = element
            .group_mut()
            .map(|group| group.take_detached())
            .unwrap_or_default();
        element.register(id, parent);
        log::debug!("Registered element {} ({:?})", id, element.name());
        self.elements.insert(id, element);

        for member in members {
            let member_id = self.register(member, Some(id));
            if let Some(group) = self.elements.get_mut(&id).and_then(|e| e.group_mut()) {
                group.push_member(member_id);
            }
        }
        id
    }

    /// Removes an element and its whole subtree from the system.
    ///
    /// The returned element is detached: it and its members have no id any
    /// more and can be added again, receiving fresh ids. Ids are never reused.
    pub fn remove(&mut self, id: ElementId) -> Result<Element, TraceError> {
        let parent = self
            .elements
            .get(&id)
            .ok_or(TraceError::UnknownElement(id))?
            .parent();

        match parent {
            Some(parent) => {
                if let Some(group) = self.elements.get_mut(&parent).and_then(|e| e.group_mut()) {
                    group.remove_member(id);
                }
            }
            None => self.root_elements.retain(|&r| r != id),
        }

        let subtree = self.subtree_ids(id);
        let flushed = self.transforms.borrow_mut().flush(&subtree);
        log::debug!(
            "Removing {} element(s) rooted at {}, flushed {} cached transform(s)",
            subtree.len(),
            id,
            flushed
        );

        if self.entrance_pupil.is_some_and(|p| subtree.contains(&p)) {
            self.entrance_pupil = None;
        }
        if self.exit_pupil.is_some_and(|p| subtree.contains(&p)) {
            self.exit_pupil = None;
        }
        for removed in &subtree {
            self.params.reset_distribution(*removed);
        }

        self.version += 1;
        self.detach(id).ok_or(TraceError::UnknownElement(id))
    }

    fn detach(&mut self, id: ElementId) -> Option<Element> {
        let mut element = self.elements.remove(&id)?;
        if let Some(group) = element.group_mut() {
            for member in group.take_members() {
                if let Some(child) = self.detach(member) {
                    group.push_detached(child);
                }
            }
        }
        element.unregister();
        Some(element)
    }

    /// Ids of `id` and all of its descendants.
    fn subtree_ids(&self, id: ElementId) -> HashSet<ElementId> {
        struct Collect(HashSet<ElementId>);

        impl ElementVisitor for Collect {
            fn enter_element(&mut self, id: ElementId, _element: &Element) -> bool {
                self.0.insert(id);
                true
            }
        }

        let mut collect = Collect(HashSet::new());
        walk_tree(self, id, &mut collect);
        collect.0
    }

    // ========== Element API ==========

    /// Gets a registered element by id.
    pub fn get_element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    /// Mutable access to a registered surface.
    ///
    /// Kind, pose and membership of an element only change through the
    /// system so the tree and the transform cache stay coherent.
    pub fn get_surface_mut(&mut self, id: ElementId) -> Option<&mut Surface> {
        let surface = self.elements.get_mut(&id)?.as_surface_mut()?;
        self.version += 1;
        Some(surface)
    }

    /// Mutable access to a registered source.
    pub fn get_source_mut(&mut self, id: ElementId) -> Option<&mut Source> {
        let source = self.elements.get_mut(&id)?.as_source_mut()?;
        self.version += 1;
        Some(source)
    }

    pub fn set_name(&mut self, id: ElementId, name: Option<String>) -> Result<(), TraceError> {
        self.elements
            .get_mut(&id)
            .ok_or(TraceError::UnknownElement(id))?
            .set_name(name);
        Ok(())
    }

    pub(crate) fn element(&self, id: ElementId) -> Result<&Element, TraceError> {
        self.elements.get(&id).ok_or(TraceError::UnknownElement(id))
    }

    /// Members of the root container, in insertion order.
    pub fn root_elements(&self) -> &[ElementId] {
        &self.root_elements
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    /// Number of registered elements, group members included.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Looks up an element by name.
    pub fn find(&self, name: &str) -> Option<ElementId> {
        struct Find<'a> {
            name: &'a str,
            found: Option<ElementId>,
        }

        impl ElementVisitor for Find<'_> {
            fn enter_element(&mut self, id: ElementId, element: &Element) -> bool {
                if self.found.is_none() && element.name() == Some(self.name) {
                    self.found = Some(id);
                }
                self.found.is_none()
            }
        }

        let mut find = Find { name, found: None };
        walk_system(self, &mut find);
        find.found
    }

    /// Surfaces in traversal order.
    pub fn surfaces(&self, enabled_only: bool) -> Vec<ElementId> {
        self.collect_leaves(LeafFilter::Surfaces, enabled_only)
    }

    /// Sources in traversal order.
    pub fn sources(&self, enabled_only: bool) -> Vec<ElementId> {
        self.collect_leaves(LeafFilter::Sources, enabled_only)
    }

    /// Surfaces and sources in traversal order.
    pub fn leaves(&self, enabled_only: bool) -> Vec<ElementId> {
        self.collect_leaves(LeafFilter::Any, enabled_only)
    }

    fn collect_leaves(&self, filter: LeafFilter, enabled_only: bool) -> Vec<ElementId> {
        let mut collector = LeafCollector::new(filter, enabled_only);
        walk_system(self, &mut collector);
        collector.found
    }

    /// Whether the element and all of its ancestors are enabled.
    pub fn is_enabled_in_tree(&self, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(id) = current {
            match self.elements.get(&id) {
                Some(element) if element.is_enabled() => current = element.parent(),
                _ => return false,
            }
        }
        true
    }

    // ========== Pose API ==========

    /// Replaces the pose of an element relative to its parent.
    ///
    /// Cached transforms involving the element or any of its descendants are flushed.
    pub fn set_local_transform(&mut self, id: ElementId, transform: Transform) -> Result<(), TraceError> {
        self.elements
            .get_mut(&id)
            .ok_or(TraceError::UnknownElement(id))?
            .set_local_transform(transform);
        self.pose_changed(id);
        Ok(())
    }

    /// Moves an element within its parent frame, keeping its orientation.
    pub fn set_local_position(&mut self, id: ElementId, position: Point3<f64>) -> Result<(), TraceError> {
        let rotation = self.element(id)?.local_transform().rotation;
        self.set_local_transform(id, Transform::new(rotation, position.to_vec()))
    }

    /// Orients an element so its local +Z axis points along `direction`, in the parent frame.
    pub fn set_local_direction(&mut self, id: ElementId, direction: Vector3<f64>) -> Result<(), TraceError> {
        let position = self.element(id)?.local_transform().position();
        let transform = Transform::looking_along(position, direction)
            .ok_or_else(|| TraceError::geometry(format!("element {id} cannot face a zero direction")))?;
        self.set_local_transform(id, transform)
    }

    pub fn set_enabled(&mut self, id: ElementId, enabled: bool) -> Result<(), TraceError> {
        self.elements
            .get_mut(&id)
            .ok_or(TraceError::UnknownElement(id))?
            .set_enabled(enabled);
        self.version += 1;
        Ok(())
    }

    fn pose_changed(&mut self, id: ElementId) {
        let subtree = self.subtree_ids(id);
        let flushed = self.transforms.borrow_mut().flush(&subtree);
        log::trace!("Pose of element {} changed, flushed {} cached transform(s)", id, flushed);
        self.version += 1;
    }

    // ========== Transform API ==========

    /// Transform from the element's local frame to the system frame.
    pub fn get_global_transform(&self, id: ElementId) -> Result<Transform, TraceError> {
        if id == SYSTEM_FRAME {
            return Ok(Transform::identity());
        }
        if let Some(cached) = self.transforms.borrow().get(id, SYSTEM_FRAME) {
            return Ok(cached);
        }

        let element = self.element(id)?;
        let parent_global = match element.parent() {
            Some(parent) => self.get_global_transform(parent)?,
            None => Transform::identity(),
        };
        let global = parent_global.compose(element.local_transform());
        self.transforms.borrow_mut().insert(id, SYSTEM_FRAME, global);
        Ok(global)
    }

    /// Transform from the system frame to the element's local frame.
    pub fn get_local_transform(&self, id: ElementId) -> Result<Transform, TraceError> {
        if id == SYSTEM_FRAME {
            return Ok(Transform::identity());
        }
        if let Some(cached) = self.transforms.borrow().get(SYSTEM_FRAME, id) {
            return Ok(cached);
        }

        let local = self.get_global_transform(id)?.inverse();
        self.transforms.borrow_mut().insert(SYSTEM_FRAME, id, local);
        Ok(local)
    }

    /// Transform from the local frame of `from` to the local frame of `to`.
    ///
    /// [`SYSTEM_FRAME`] designates the system frame on either side.
    pub fn get_transform(&self, from: ElementId, to: ElementId) -> Result<Transform, TraceError> {
        if from == to {
            self.check_frame(from)?;
            return Ok(Transform::identity());
        }
        if to == SYSTEM_FRAME {
            return self.get_global_transform(from);
        }
        if from == SYSTEM_FRAME {
            return self.get_local_transform(to);
        }
        if let Some(cached) = self.transforms.borrow().get(from, to) {
            return Ok(cached);
        }

        let transform = self
            .get_local_transform(to)?
            .compose(&self.get_global_transform(from)?);
        self.transforms.borrow_mut().insert(from, to, transform);
        Ok(transform)
    }

    fn check_frame(&self, id: ElementId) -> Result<(), TraceError> {
        if id == SYSTEM_FRAME || self.elements.contains_key(&id) {
            Ok(())
        } else {
            Err(TraceError::UnknownElement(id))
        }
    }

    /// Origin of the element's local frame, in system coordinates.
    pub fn global_position(&self, id: ElementId) -> Result<Point3<f64>, TraceError> {
        Ok(self.get_global_transform(id)?.position())
    }

    /// Number of transforms currently cached.
    pub fn transform_cache_len(&self) -> usize {
        self.transforms.borrow().len()
    }

    /// Drops every cached transform.
    pub fn flush_transform_cache(&self) {
        self.transforms.borrow_mut().clear();
    }

    // ========== Pupil API ==========

    /// Designates the surface that sources aim at when no explicit target is set.
    pub fn set_entrance_pupil(&mut self, id: ElementId) -> Result<(), TraceError> {
        self.check_pupil(id)?;
        self.entrance_pupil = Some(id);
        Ok(())
    }

    pub fn set_exit_pupil(&mut self, id: ElementId) -> Result<(), TraceError> {
        self.check_pupil(id)?;
        self.exit_pupil = Some(id);
        Ok(())
    }

    pub fn clear_entrance_pupil(&mut self) {
        self.entrance_pupil = None;
    }

    pub fn clear_exit_pupil(&mut self) {
        self.exit_pupil = None;
    }

    pub fn entrance_pupil(&self) -> Option<ElementId> {
        self.entrance_pupil
    }

    pub fn exit_pupil(&self) -> Option<ElementId> {
        self.exit_pupil
    }

    pub fn require_entrance_pupil(&self) -> Result<ElementId, TraceError> {
        self.entrance_pupil
            .ok_or_else(|| TraceError::configuration("no entrance pupil defined"))
    }

    pub fn require_exit_pupil(&self) -> Result<ElementId, TraceError> {
        self.exit_pupil
            .ok_or_else(|| TraceError::configuration("no exit pupil defined"))
    }

    fn check_pupil(&self, id: ElementId) -> Result<(), TraceError> {
        if self.element(id)?.as_surface().is_none() {
            return Err(TraceError::configuration(format!(
                "pupil must be a surface, element {id} is not"
            )));
        }
        Ok(())
    }

    // ========== Environment & parameters ==========

    /// Material filling the space between elements.
    pub fn environment(&self) -> &Rc<dyn Material> {
        &self.environment
    }

    pub fn set_environment(&mut self, environment: Rc<dyn Material>) {
        self.environment = environment;
        self.version += 1;
    }

    /// Parameters a new [`crate::Tracer`] starts from.
    pub fn default_params(&self) -> &Params {
        &self.params
    }

    pub fn default_params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    /// Incremented on every structural, pose or enable change.
    pub fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
#[path = "system_tests.rs"]
mod tests;
