//! Scripted walkthrough of slicemark: four views, placement by key and click,
//! a drag, and the resulting widget state in every view.

use std::rc::Rc;

use glam::DVec3;
use slicemark::geom::{Camera3D, LightboxLayout, SliceView, Viewport};
use slicemark::{
    apply_session_action, AnnotationKind, AppConfig, DisplayManager, InteractionState, Key,
    Scene, SelectionState, ViewContext, WidgetInteraction,
};

fn main() {
    let config = AppConfig::load_from_default_path().unwrap_or_default();
    env_logger::Builder::new()
        .filter_level(config.preferences.log_level.to_level_filter())
        .parse_default_env()
        .init();

    if let Err(e) = run(&config) {
        eprintln!("slicemark-demo error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let settings = config.sync_settings();
    let scene = Scene::new();
    let interaction = InteractionState::new(config.preferences.persistent_placement);
    let selection = SelectionState::new();
    config.apply_placeables(&selection);
    scene.set_interaction_state(Some(interaction.clone()));
    scene.set_selection_state(Some(selection.clone()));

    let viewport = Viewport::new(256.0, 256.0);
    let views = vec![
        ViewContext::slice("Red", SliceView::axial(DVec3::ZERO, 1.0, viewport)?),
        ViewContext::slice("Yellow", SliceView::sagittal(DVec3::ZERO, 1.0, viewport)?),
        ViewContext::slice(
            "Green",
            SliceView::coronal(DVec3::ZERO, 1.0, viewport)?
                .with_layout(LightboxLayout::new(2, 2))
                .with_slice_spacing(2.0),
        ),
        ViewContext::three_d(
            "3D",
            Camera3D::new(DVec3::new(0.0, -400.0, 0.0), DVec3::ZERO, DVec3::Z, viewport)?,
        ),
    ];

    let managers: Vec<Rc<DisplayManager>> = views
        .iter()
        .flat_map(|view| {
            AnnotationKind::all()
                .iter()
                .map(move |kind| DisplayManager::new(*kind, view.clone(), settings))
        })
        .collect();
    for manager in &managers {
        manager.bind(Some(&scene));
    }

    let click = |view_id: &str, x: f64, y: f64| {
        managers
            .iter()
            .filter(|m| m.view().id() == view_id)
            .find_map(|m| m.on_click_in_view(x, y, Some("demo-volume")))
    };
    let press = |key: Key| {
        if let Some(action) = config.keybindings.action_for_key(key) {
            apply_session_action(action, &interaction, &selection);
        }
    };

    press(Key::Key1);
    let fiducial = click("Red", 128.0, 128.0);
    log::info!("Placed fiducial {:?}", fiducial);

    press(Key::Key2);
    click("Red", 100.0, 128.0);
    let ruler = click("Red", 160.0, 140.0);
    log::info!("Placed ruler {:?}", ruler);

    press(Key::Key3);
    click("Green", 20.0, 20.0);
    let region = click("Green", 80.0, 90.0);
    log::info!("Placed region {:?}", region);

    if let Some(id) = fiducial {
        let red = managers
            .iter()
            .find(|m| m.view().id() == "Red" && m.kind() == AnnotationKind::Fiducial);
        if let Some(red) = red {
            red.process_widget_interaction(id, WidgetInteraction::Start);
            red.process_widget_interaction(
                id,
                WidgetInteraction::Move {
                    handle: 0,
                    display: DVec3::new(140.0, 120.0, 0.0),
                },
            );
            red.process_widget_interaction(id, WidgetInteraction::End);
            log::info!(
                "Dragged {} to {:?}",
                id,
                scene.node(id).map(|n| n.control_points)
            );
        }
    }

    for manager in &managers {
        log::info!(
            "{:>6} {:<8} widgets={} created={} released={}",
            manager.view().id(),
            manager.kind().name(),
            manager.widget_count(),
            manager.helper_stats().created,
            manager.helper_stats().released
        );
    }
    for view in &views {
        log::info!("{} rendered {} times", view.id(), view.render_count());
    }
    Ok(())
}
