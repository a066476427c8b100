use super::*;
use cgmath::{Deg, InnerSpace, Point3, Vector3};

use crate::curve::Flat;
use crate::element::Group;
use crate::shape::Disk;
use crate::surface::Surface;

const TOLERANCE: f64 = 1e-9;

fn image_at(z: f64) -> Element {
    Element::surface(Surface::image(Rc::new(Flat), Rc::new(Disk::new(10.0))))
        .with_position(Point3::new(0.0, 0.0, z))
}

// ========================================================================
// Registration
// ========================================================================

#[test]
fn test_ids_are_contiguous_from_one() {
    let mut system = System::new();
    let a = system.add(image_at(0.0));
    let group = system.add(
        Element::group(Group::new().with_member(image_at(1.0)).with_member(image_at(2.0)))
            .with_name("pair"),
    );
    let d = system.add(image_at(3.0));

    assert_eq!((a, group, d), (1, 2, 5));
    assert_eq!(system.len(), 5);
    assert_eq!(system.root_elements(), &[1, 2, 5]);
    assert_eq!(system.get_element(group).unwrap().as_group().unwrap().members(), &[3, 4]);

    for id in 1..=5 {
        let element = system.get_element(id).unwrap();
        assert_eq!(element.id(), Some(id));
    }
    assert_eq!(system.get_element(3).unwrap().parent(), Some(group));
    assert_eq!(system.find("pair"), Some(group));
}

#[test]
fn test_add_to_group() {
    let mut system = System::new();
    let group = system.add(Element::group(Group::new()));
    let leaf = system.add_to(group, image_at(1.0)).unwrap();
    assert_eq!(system.get_element(leaf).unwrap().parent(), Some(group));

    let err = system.add_to(leaf, image_at(2.0)).unwrap_err();
    assert!(matches!(err, TraceError::Configuration(_)));
    let err = system.add_to(42, image_at(2.0)).unwrap_err();
    assert!(matches!(err, TraceError::UnknownElement(42)));
    assert!(err.is_lookup());
}

#[test]
fn test_remove_detaches_subtree_and_retires_ids() {
    let mut system = System::new();
    let group = system.add(Element::group(Group::new().with_member(image_at(1.0))));
    let member = system.get_element(group).unwrap().as_group().unwrap().members()[0];
    system.set_entrance_pupil(member).unwrap();

    let removed = system.remove(group).unwrap();
    assert_eq!(removed.id(), None);
    assert_eq!(removed.as_group().unwrap().detached().len(), 1);
    assert!(removed.as_group().unwrap().detached()[0].id().is_none());
    assert!(system.is_empty());
    assert!(system.root_elements().is_empty());
    assert_eq!(system.entrance_pupil(), None);

    // Ids are not reused
    let again = system.add(removed);
    assert_eq!(again, 3);
    assert!(system.contains(4));
    assert!(matches!(system.remove(group), Err(TraceError::UnknownElement(_))));
}

#[test]
fn test_mutable_access_keeps_group_membership() {
    let mut system = System::new();
    let group = system.add(Element::group(Group::new().with_member(image_at(1.0))));
    let member = system.get_element(group).unwrap().as_group().unwrap().members()[0];

    assert!(system.get_surface_mut(group).is_none());
    assert!(system.get_source_mut(member).is_none());
    let version = system.version();
    system.get_surface_mut(member).unwrap().set_discard_intensity(0.5);
    assert!(system.version() > version);
    assert_eq!(system.get_element(member).unwrap().as_surface().unwrap().discard_intensity(), 0.5);

    system.set_name(group, Some("cell".into())).unwrap();
    assert_eq!(system.find("cell"), Some(group));
    assert!(system.set_name(42, None).unwrap_err().is_lookup());

    system.remove(group).unwrap();
    assert_eq!(system.len(), 0);
    assert!(!system.contains(member));
}

#[test]
fn test_pupil_must_be_surface() {
    let mut system = System::new();
    let group = system.add(Element::group(Group::new()));
    assert!(matches!(system.set_entrance_pupil(group), Err(TraceError::Configuration(_))));
    assert!(matches!(system.set_exit_pupil(9), Err(TraceError::UnknownElement(9))));
    assert!(matches!(system.require_exit_pupil(), Err(TraceError::Configuration(_))));
}

// ========================================================================
// Transforms
// ========================================================================

fn nested_system() -> (System, ElementId, ElementId, ElementId) {
    let mut system = System::new();
    let group = system.add(
        Element::group(Group::new().with_member(image_at(5.0)))
            .with_transform(Transform::from_translation(Vector3::new(0.0, 10.0, 20.0)).rotated(
                Deg(0.0),
                Deg(30.0),
                Deg(0.0),
            )),
    );
    let inner = system.get_element(group).unwrap().as_group().unwrap().members()[0];
    let other = system.add(
        image_at(50.0).with_transform(Transform::from_angle_x(Deg(10.0)).translated(Vector3::new(1.0, 2.0, 3.0))),
    );
    (system, group, inner, other)
}

#[test]
fn test_global_composed_with_local_is_identity() {
    let (system, group, inner, other) = nested_system();
    for id in [group, inner, other] {
        let global = system.get_global_transform(id).unwrap();
        let local = system.get_local_transform(id).unwrap();
        assert!(global.compose(&local).is_identity(TOLERANCE));
        assert!(local.compose(&global).is_identity(TOLERANCE));
    }
}

#[test]
fn test_nested_global_transform() {
    let (system, group, inner, _) = nested_system();
    let group_global = system.get_global_transform(group).unwrap();
    let inner_global = system.get_global_transform(inner).unwrap();
    let expected = group_global.apply_point(Point3::new(0.0, 0.0, 5.0));
    assert!((inner_global.position() - expected).magnitude() < TOLERANCE);
}

#[test]
fn test_get_transform_maps_between_frames() {
    let (system, _, inner, other) = nested_system();
    let p = Point3::new(1.0, -2.0, 0.5);

    let direct = system.get_transform(inner, other).unwrap().apply_point(p);
    let via_global = system
        .get_local_transform(other)
        .unwrap()
        .apply_point(system.get_global_transform(inner).unwrap().apply_point(p));
    assert!((direct - via_global).magnitude() < TOLERANCE);

    assert!(system.get_transform(inner, inner).unwrap().is_identity(TOLERANCE));
    assert!(matches!(system.get_transform(inner, 77), Err(TraceError::UnknownElement(77))));
}

#[test]
fn test_cache_survives_unrelated_pose_change() {
    let (mut system, _, inner, other) = nested_system();
    let unrelated = system.add(image_at(80.0));

    let cached = system.get_transform(inner, other).unwrap();
    assert!(system.transform_cache_len() > 0);

    system.set_local_position(unrelated, Point3::new(0.0, 0.0, 90.0)).unwrap();
    let after = system.get_transform(inner, other).unwrap();
    assert_eq!(cached, after);

    system.flush_transform_cache();
    let fresh = system.get_transform(inner, other).unwrap();
    assert!(fresh.approx_eq(&cached, TOLERANCE));
}

#[test]
fn test_cache_follows_own_and_parent_pose_changes() {
    let (mut system, group, inner, other) = nested_system();
    let before = system.get_transform(inner, other).unwrap();
    let version = system.version();

    // Moving the parent group moves the member
    system
        .set_local_transform(group, Transform::from_translation(Vector3::new(0.0, 0.0, 100.0)))
        .unwrap();
    assert!(system.version() > version);
    let moved = system.get_transform(inner, other).unwrap();
    assert!(!moved.approx_eq(&before, TOLERANCE));

    system.flush_transform_cache();
    let fresh = system.get_transform(inner, other).unwrap();
    assert!(fresh.approx_eq(&moved, TOLERANCE));

    // Changing the target end of the key
    system.set_local_position(other, Point3::new(0.0, 0.0, 0.0)).unwrap();
    let retargeted = system.get_transform(inner, other).unwrap();
    assert!(!retargeted.approx_eq(&moved, TOLERANCE));
    let expected = system
        .get_local_transform(other)
        .unwrap()
        .apply_point(Point3::new(0.0, 0.0, 105.0));
    assert!((retargeted.position() - expected).magnitude() < TOLERANCE);
}

#[test]
fn test_set_local_direction() {
    let mut system = System::new();
    let id = system.add(image_at(10.0));
    system.set_local_direction(id, Vector3::new(1.0, 0.0, 0.0)).unwrap();
    let global = system.get_global_transform(id).unwrap();
    assert!((global.z_axis() - Vector3::unit_x()).magnitude() < TOLERANCE);
    assert!((global.position() - Point3::new(0.0, 0.0, 10.0)).magnitude() < TOLERANCE);

    let err = system.set_local_direction(id, Vector3::new(0.0, 0.0, 0.0)).unwrap_err();
    assert!(matches!(err, TraceError::Geometry(_)));
}

#[test]
fn test_removal_flushes_cache_entries() {
    let (mut system, _, inner, other) = nested_system();
    system.get_transform(inner, other).unwrap();
    system.get_global_transform(other).unwrap();
    assert!(system.transform_cache_len() >= 4);

    system.remove(other).unwrap();
    // Only entries for the group and its member remain
    let remaining = system.transform_cache_len();
    system.get_global_transform(inner).unwrap();
    assert_eq!(system.transform_cache_len(), remaining);
    assert!(matches!(system.get_global_transform(other), Err(TraceError::UnknownElement(_))));
}

// ========================================================================
// Enumeration
// ========================================================================

#[test]
fn test_enabled_filtering() {
    let mut system = System::new();
    let a = system.add(image_at(0.0));
    let group = system.add(Element::group(Group::new().with_member(image_at(1.0))));
    let b = system.add(image_at(2.0));

    assert_eq!(system.surfaces(true), vec![a, 3, b]);
    system.set_enabled(group, false).unwrap();
    assert_eq!(system.surfaces(true), vec![a, b]);
    assert_eq!(system.surfaces(false), vec![a, 3, b]);
    assert!(!system.is_enabled_in_tree(3));
    assert!(system.sources(false).is_empty());
}
