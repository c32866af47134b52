//! Point annotations across slice, lightbox and 3D views.

use glam::DVec3;
use slicemark_geom::LightboxLayout;

use super::support::{
    assert_close, axial_view, bound, camera_view, lightbox_view, primary_enabled, primary_points,
};
use crate::config::SyncSettings;
use crate::manager::{DisplayManager, FiducialHandler, KindContext, KindHandler};
use crate::model::{AnnotationKind, AnnotationNode, DisplayNode, NodeChange, Scene};
use crate::widget::{Representation, WidgetLifecycleHelper, WidgetRole};

#[test]
fn test_propagating_twice_changes_nothing_the_second_time() {
    let scene = Scene::with_default_state(false);
    let view = axial_view("Red");
    let id = scene.add_node(AnnotationNode::fiducial(DVec3::new(3.0, 4.0, 0.0)));
    let node = scene.node(id).unwrap();
    let display = DisplayNode::for_kind(AnnotationKind::Fiducial);
    let settings = SyncSettings::default();
    let ctx = KindContext {
        view: &view,
        scene: &scene,
        settings: &settings,
    };
    let mut helper = WidgetLifecycleHelper::new(view.id());
    let handler = FiducialHandler;

    assert!(handler.create_widget(&ctx, &node, &mut helper).unwrap());
    assert!(handler
        .propagate_model_to_widget(&ctx, &node, &display, &mut helper)
        .unwrap());
    let revision = helper.get(id, WidgetRole::Primary).unwrap().revision();

    assert!(!handler.create_widget(&ctx, &node, &mut helper).unwrap());
    assert!(!handler
        .propagate_model_to_widget(&ctx, &node, &display, &mut helper)
        .unwrap());
    assert_eq!(helper.get(id, WidgetRole::Primary).unwrap().revision(), revision);
}

#[test]
fn test_unchanged_model_issues_no_render() {
    let scene = Scene::with_default_state(false);
    let view = axial_view("Red");
    let manager = bound(AnnotationKind::Fiducial, &view, &scene);
    let id = scene.add_node(AnnotationNode::fiducial(DVec3::ZERO));

    scene.set_control_points(id, vec![DVec3::new(1.0, 0.0, 0.0)]);
    let renders = view.render_count();

    manager.on_model_changed(id, NodeChange::Modified);
    manager.on_model_changed(id, NodeChange::Modified);

    assert_eq!(view.render_count(), renders);
    assert_close(primary_points(&manager, id)[0], DVec3::new(1.0, 0.0, 0.0));
}

#[test]
fn test_widget_display_position_matches_view() {
    let scene = Scene::with_default_state(false);
    let view = axial_view("Red");
    let manager = bound(AnnotationKind::Fiducial, &view, &scene);
    let id = scene.add_node(AnnotationNode::fiducial(DVec3::new(-20.0, 30.0, 0.25)));

    let display = manager
        .with_widgets(id, |set| set.get(WidgetRole::Primary).unwrap().display_points()[0])
        .unwrap();
    assert_close(display, DVec3::new(80.0, 130.0, 0.25));
    assert_close(view.display_to_world(display), DVec3::new(-20.0, 30.0, 0.25));
}

#[test]
fn test_points_off_the_slice_are_hidden() {
    let scene = Scene::with_default_state(false);
    let view = axial_view("Red");
    let manager = bound(AnnotationKind::Fiducial, &view, &scene);
    let near = scene.add_node(AnnotationNode::fiducial(DVec3::new(0.0, 0.0, 0.4)));
    let far = scene.add_node(AnnotationNode::fiducial(DVec3::new(0.0, 0.0, 0.6)));
    let outside = scene.add_node(AnnotationNode::fiducial(DVec3::new(150.0, 0.0, 0.0)));

    assert!(primary_enabled(&manager, near));
    assert!(!primary_enabled(&manager, far));
    assert!(!primary_enabled(&manager, outside));

    // Moving the slice brings the far point into view.
    view.translate_slice(1.0);
    assert!(!primary_enabled(&manager, near));
    assert!(primary_enabled(&manager, far));
}

#[test]
fn test_lightbox_window_widens_with_panes() {
    let scene = Scene::with_default_state(false);
    let view = lightbox_view("Lightbox");
    let manager = bound(AnnotationKind::Fiducial, &view, &scene);
    let inside = scene.add_node(AnnotationNode::fiducial(DVec3::new(10.0, 0.0, 5.5)));
    let beyond = scene.add_node(AnnotationNode::fiducial(DVec3::new(10.0, 0.0, 6.5)));
    let below = scene.add_node(AnnotationNode::fiducial(DVec3::new(10.0, 0.0, -0.5)));

    assert!(primary_enabled(&manager, inside));
    assert!(!primary_enabled(&manager, beyond));
    assert!(!primary_enabled(&manager, below));
}

#[test]
fn test_switching_to_lightbox_replaces_handle_once() {
    let scene = Scene::with_default_state(false);
    let view = axial_view("Red");
    let manager = bound(AnnotationKind::Fiducial, &view, &scene);
    let id = scene.add_node(AnnotationNode::fiducial(DVec3::ZERO));
    let representation = |m: &DisplayManager| {
        m.with_widgets(id, |set| set.get(WidgetRole::Primary).unwrap().representation())
            .unwrap()
    };
    assert_eq!(representation(&manager), Representation::Handle3D);

    view.set_layout(LightboxLayout::new(2, 2));

    assert_eq!(representation(&manager), Representation::Handle2D);
    assert_eq!(manager.helper_stats().created, 2);
    assert_eq!(manager.helper_stats().released, 1);
    assert!(primary_enabled(&manager, id));

    // Further resyncs keep the new widget.
    view.translate_slice(0.0);
    assert_eq!(manager.helper_stats().created, 2);
    assert_eq!(manager.widget_count(), 1);
}

#[test]
fn test_moving_between_panes_reassigns_renderer() {
    let scene = Scene::with_default_state(false);
    let view = lightbox_view("Lightbox");
    let manager = bound(AnnotationKind::Fiducial, &view, &scene);
    let id = scene.add_node(AnnotationNode::fiducial(DVec3::new(10.0, 0.0, 0.0)));
    let renderer = |m: &DisplayManager| {
        m.with_widgets(id, |set| set.get(WidgetRole::Primary).unwrap().renderer())
            .unwrap()
    };
    assert_eq!(renderer(&manager), Some(0));

    scene.set_control_points(id, vec![DVec3::new(10.0, 0.0, 4.0)]);

    assert_eq!(renderer(&manager), Some(2));
    assert_eq!(manager.renderer_reassignments(), 1);
    assert!(primary_enabled(&manager, id));

    scene.set_control_points(id, vec![DVec3::new(12.0, 0.0, 4.0)]);
    assert_eq!(manager.renderer_reassignments(), 1);
}

#[test]
fn test_view_list_limits_where_node_is_shown() {
    let scene = Scene::with_default_state(false);
    let red = axial_view("Red");
    let three_d = camera_view("3D");
    let in_red = bound(AnnotationKind::Fiducial, &red, &scene);
    let in_3d = bound(AnnotationKind::Fiducial, &three_d, &scene);

    let id = scene.add_node_with_display(
        AnnotationNode::fiducial(DVec3::ZERO),
        DisplayNode::for_kind(AnnotationKind::Fiducial).with_view_ids(vec!["3D".to_string()]),
    );

    assert!(!primary_enabled(&in_red, id));
    assert!(primary_enabled(&in_3d, id));
}

#[test]
fn test_hidden_node_disables_widget_everywhere() {
    let scene = Scene::with_default_state(false);
    let red = axial_view("Red");
    let three_d = camera_view("3D");
    let in_red = bound(AnnotationKind::Fiducial, &red, &scene);
    let in_3d = bound(AnnotationKind::Fiducial, &three_d, &scene);
    let id = scene.add_node(AnnotationNode::fiducial(DVec3::ZERO));

    scene.set_visible(id, false);
    assert!(!primary_enabled(&in_red, id));
    assert!(!primary_enabled(&in_3d, id));

    scene.set_visible(id, true);
    assert!(primary_enabled(&in_red, id));
    assert!(primary_enabled(&in_3d, id));
}

#[test]
fn test_model_change_reaches_every_view() {
    let scene = Scene::with_default_state(false);
    let red = axial_view("Red");
    let three_d = camera_view("3D");
    let in_red = bound(AnnotationKind::Fiducial, &red, &scene);
    let in_3d = bound(AnnotationKind::Fiducial, &three_d, &scene);
    let id = scene.add_node(AnnotationNode::fiducial(DVec3::ZERO));

    let target = DVec3::new(7.0, -3.0, 0.0);
    scene.set_control_points(id, vec![target]);

    assert_close(primary_points(&in_red, id)[0], target);
    assert_close(primary_points(&in_3d, id)[0], target);
}

#[test]
fn test_locked_node_stops_processing_events() {
    let scene = Scene::with_default_state(false);
    let view = axial_view("Red");
    let manager = bound(AnnotationKind::Fiducial, &view, &scene);
    let id = scene.add_node(AnnotationNode::fiducial(DVec3::ZERO));
    let processes = |m: &DisplayManager| {
        m.with_widgets(id, |set| set.get(WidgetRole::Primary).unwrap().process_events())
            .unwrap()
    };
    assert!(processes(&manager));

    scene.set_locked(id, true);
    assert!(!processes(&manager));

    scene.set_locked(id, false);
    assert!(processes(&manager));
}

#[test]
fn test_style_follows_display_node() {
    let scene = Scene::with_default_state(false);
    let view = axial_view("Red");
    let manager = bound(AnnotationKind::Fiducial, &view, &scene);
    let id = scene.add_node_with_display(
        AnnotationNode::fiducial(DVec3::ZERO),
        DisplayNode::for_kind(AnnotationKind::Fiducial),
    );
    let display_id = scene.primary_display(id).unwrap().id();

    scene.modify_display(display_id, |d| d.color = [1, 2, 3]);

    let color = manager
        .with_widgets(id, |set| set.get(WidgetRole::Primary).unwrap().style().color)
        .unwrap();
    assert_eq!(color, [1, 2, 3]);
}
