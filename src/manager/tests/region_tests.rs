//! Box regions: outlines, frames and locking.

use glam::{DMat4, DVec3};
use slicemark_geom::TransformKind;

use super::support::{assert_close, axial_view, bound, camera_view, primary_enabled, primary_points};
use crate::manager::DisplayManager;
use crate::model::{AnnotationKind, AnnotationNode, NodeId, Scene, TransformNode};
use crate::widget::{Representation, Widget, WidgetRole};

fn primary<R>(manager: &DisplayManager, id: NodeId, f: impl FnOnce(&Widget) -> R) -> R {
    manager
        .with_widgets(id, |set| f(set.get(WidgetRole::Primary).unwrap()))
        .unwrap()
}

#[test]
fn test_slice_view_draws_cross_section() {
    let scene = Scene::with_default_state(false);
    let view = axial_view("Red");
    let manager = bound(AnnotationKind::Roi, &view, &scene);
    let id = scene.add_node(AnnotationNode::roi(DVec3::ZERO, DVec3::new(10.0, 5.0, 2.0)));

    assert!(primary_enabled(&manager, id));
    primary(&manager, id, |widget| {
        assert_eq!(widget.representation(), Representation::Outline);
        assert_eq!(widget.outline().len(), 4);
        for corner in widget.outline() {
            assert!(corner.z.abs() < 1e-9);
            assert!((corner.x.abs() - 10.0).abs() < 1e-9);
            assert!((corner.y.abs() - 5.0).abs() < 1e-9);
        }
        assert_eq!(widget.plane_equation(), Some([0.0, 0.0, 1.0, 0.0]));
    });
}

#[test]
fn test_handles_are_center_and_corner() {
    let scene = Scene::with_default_state(false);
    let view = axial_view("Red");
    let manager = bound(AnnotationKind::Roi, &view, &scene);
    let id = scene.add_node(AnnotationNode::roi(
        DVec3::new(1.0, 2.0, 0.0),
        DVec3::new(3.0, 4.0, 5.0),
    ));

    let handles = primary_points(&manager, id);
    assert_close(handles[0], DVec3::new(1.0, 2.0, 0.0));
    assert_close(handles[1], DVec3::new(4.0, 6.0, 5.0));
}

#[test]
fn test_region_missing_the_slice_is_hidden() {
    let scene = Scene::with_default_state(false);
    let view = axial_view("Red");
    let manager = bound(AnnotationKind::Roi, &view, &scene);
    let id = scene.add_node(AnnotationNode::roi(
        DVec3::new(0.0, 0.0, 20.0),
        DVec3::new(5.0, 5.0, 2.0),
    ));

    assert!(!primary_enabled(&manager, id));

    view.translate_slice(19.0);
    assert!(primary_enabled(&manager, id));
}

#[test]
fn test_three_d_view_draws_box() {
    let scene = Scene::with_default_state(false);
    let view = camera_view("3D");
    let manager = bound(AnnotationKind::Roi, &view, &scene);
    let id = scene.add_node(AnnotationNode::roi(DVec3::ZERO, DVec3::ONE));

    assert!(primary_enabled(&manager, id));
    primary(&manager, id, |widget| {
        assert_eq!(widget.representation(), Representation::Box);
        assert_eq!(widget.outline().len(), 8);
        assert_eq!(widget.plane_equation(), None);
    });
}

#[test]
fn test_locked_region_hides_handles() {
    let scene = Scene::with_default_state(false);
    let view = axial_view("Red");
    let manager = bound(AnnotationKind::Roi, &view, &scene);
    let id = scene.add_node(AnnotationNode::roi(DVec3::ZERO, DVec3::ONE));
    assert!(primary(&manager, id, |w| w.handles_visible()));

    scene.set_locked(id, true);

    assert!(!primary(&manager, id, |w| w.handles_visible()));
    assert!(!primary(&manager, id, |w| w.process_events()));
}

#[test]
fn test_cutting_plane_is_expressed_in_parent_frame() {
    let scene = Scene::with_default_state(false);
    let view = axial_view("Red");
    let manager = bound(AnnotationKind::Roi, &view, &scene);
    let id = scene.add_node(AnnotationNode::roi(DVec3::ZERO, DVec3::new(4.0, 4.0, 1.0)));
    let transform = scene.add_transform(TransformNode::new(TransformKind::Linear(
        DMat4::from_translation(DVec3::new(0.0, 0.0, 5.0)),
    )));

    scene.set_node_transform(id, Some(transform));

    let equation = primary(&manager, id, |w| w.plane_equation()).unwrap();
    let expected = [0.0, 0.0, 1.0, 5.0];
    for (a, b) in equation.iter().zip(expected) {
        assert!((a - b).abs() < 1e-9, "{equation:?}");
    }
    // The box itself stays where the world centre says.
    assert_close(primary_points(&manager, id)[0], DVec3::ZERO);
}

#[test]
fn test_non_linear_parent_falls_back_to_world_axes() {
    let scene = Scene::with_default_state(false);
    let view = axial_view("Red");
    let manager = bound(AnnotationKind::Roi, &view, &scene);
    let id = scene.add_node(AnnotationNode::roi(DVec3::ZERO, DVec3::new(4.0, 4.0, 1.0)));
    let transform = scene.add_transform(TransformNode::new(TransformKind::NonLinear {
        description: "displacement field".to_string(),
    }));

    scene.set_node_transform(id, Some(transform));

    assert!(primary_enabled(&manager, id));
    assert_eq!(
        primary(&manager, id, |w| w.plane_equation()),
        Some([0.0, 0.0, 1.0, 0.0])
    );
    assert_eq!(primary(&manager, id, |w| w.outline().len()), 4);
}
