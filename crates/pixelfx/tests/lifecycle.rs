use std::f32::consts::PI;
use std::rc::Rc;
use std::time::Duration;

use futures::executor::block_on;
use hostsim::SimHost;
use pixelfx::{EffectController, EffectParams, LayoutMode, SceneBackground, ToggleOutcome};
use scheduler::FrameLoop;

const FRAME: Duration = Duration::from_millis(10);

fn setup(width: u32, height: u32) -> (SimHost, Rc<FrameLoop>, EffectController<SimHost, FrameLoop>) {
    let host = SimHost::with_scene("scenes/tavern.webp", width, height);
    let frames = Rc::new(FrameLoop::new());
    let controller = EffectController::new(Rc::new(host.clone()), Rc::clone(&frames));
    (host, frames, controller)
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

#[test]
fn single_layout_end_to_end() {
    let (host, frames, controller) = setup(1000, 1000);
    let params = EffectParams::default();

    let outcome = block_on(controller.toggle(&params));
    assert_eq!(outcome, ToggleOutcome::Started { drawables: 1 });

    let drawables = host.live_drawables();
    assert_eq!(drawables.len(), 1);
    assert_eq!(drawables[0].center, [500.0, 500.0]);
    assert!(approx(drawables[0].size[0], 1050.0));
    assert!(approx(drawables[0].size[1], 1050.0));
    assert!(drawables[0].in_root);

    let filters = host.live_filters();
    assert_eq!(filters.len(), 1);
    assert_eq!(filters[0].block_size, 3.0);
    assert_eq!(filters[0].texture_size, [1000.0, 1000.0]);
    assert_eq!(drawables[0].filter, Some(filters[0].id));

    host.drive(&frames, Duration::from_millis(2500), FRAME);
    let peak = host.live_filters()[0].block_size;
    assert!((peak - 3.02).abs() < 1e-4, "block size at half cycle was {peak}");

    assert_eq!(block_on(controller.toggle(&params)), ToggleOutcome::Stopped);
    assert!(host.live_drawables().is_empty());
    assert!(host.live_filters().is_empty());
    assert!(host.root_children().is_empty());
    assert!(frames.is_empty());
    assert!(!controller.is_active());
}

#[test]
fn grid_layout_places_four_quadrants() {
    let (host, _frames, controller) = setup(1600, 1200);
    let params = EffectParams::default().with_layout(LayoutMode::Grid);

    let outcome = block_on(controller.toggle(&params));
    assert_eq!(outcome, ToggleOutcome::Started { drawables: 4 });

    let drawables = host.live_drawables();
    let expected = [[400.0, 300.0], [1200.0, 300.0], [400.0, 900.0], [1200.0, 900.0]];
    for (drawable, center) in drawables.iter().zip(expected) {
        assert_eq!(drawable.center, center);
        assert!(approx(drawable.size[0], 840.0));
        assert!(approx(drawable.size[1], 630.0));
        let expected_rotation = if center[1] == 300.0 { PI } else { 0.0 };
        assert_eq!(drawable.rotation, expected_rotation);
    }

    // every quad shares the one filter
    let filter = host.live_filters()[0].id;
    assert!(drawables.iter().all(|drawable| drawable.filter == Some(filter)));

    // inserted at index 0 one after another, so the last one draws first
    let ids: Vec<u64> = drawables.iter().rev().map(|drawable| drawable.id).collect();
    assert_eq!(host.root_children(), ids);
}

#[test]
fn toggle_symmetry_restores_initial_shape() {
    for layout in [LayoutMode::Single, LayoutMode::Grid] {
        let (host, frames, controller) = setup(800, 600);
        let initial = controller.snapshot();
        assert!(initial.is_inactive());

        let params = EffectParams::default().with_layout(layout);
        assert!(matches!(
            block_on(controller.toggle(&params)),
            ToggleOutcome::Started { .. }
        ));
        assert_eq!(block_on(controller.toggle(&params)), ToggleOutcome::Stopped);

        assert_eq!(controller.snapshot(), initial);
        assert!(host.live_drawables().is_empty());
        assert!(frames.is_empty());
    }
}

#[test]
fn stop_when_inactive_is_a_no_op() {
    let (host, _frames, controller) = setup(800, 600);
    let before = controller.snapshot();
    assert_eq!(controller.stop(), ToggleOutcome::AlreadyInactive);
    assert_eq!(controller.stop(), ToggleOutcome::AlreadyInactive);
    assert_eq!(controller.snapshot(), before);
    assert_eq!(host.created_drawables(), 0);
}

#[test]
fn consecutive_starts_keep_one_generation() {
    let (host, frames, controller) = setup(800, 600);
    let params = EffectParams::default();

    assert!(matches!(
        block_on(controller.start(&params)),
        ToggleOutcome::Started { drawables: 1 }
    ));
    assert_eq!(block_on(controller.start(&params)), ToggleOutcome::AlreadyActive);

    assert_eq!(host.live_drawables().len(), 1);
    assert_eq!(host.live_filters().len(), 1);
    assert_eq!(frames.len(), 1);
}

#[test]
fn restart_creates_a_fresh_filter() {
    let (host, _frames, controller) = setup(800, 600);
    let params = EffectParams::default();
    block_on(controller.toggle(&params));
    let first = host.live_filters()[0].id;
    block_on(controller.toggle(&params));
    block_on(controller.toggle(&params));
    let second = host.live_filters()[0].id;
    assert_ne!(first, second);
    assert_eq!(host.created_filters(), 2);
}

#[test]
fn missing_scene_is_a_silent_no_op() {
    let (host, frames, controller) = setup(800, 600);
    host.set_scene(None);
    assert_eq!(
        block_on(controller.toggle(&EffectParams::default())),
        ToggleOutcome::NothingToRender
    );

    host.set_scene(Some(SceneBackground {
        image: "  ".into(),
        width: 800.0,
        height: 600.0,
    }));
    assert_eq!(
        block_on(controller.toggle(&EffectParams::default())),
        ToggleOutcome::NothingToRender
    );

    assert!(controller.snapshot().is_inactive());
    assert_eq!(host.created_drawables(), 0);
    assert!(frames.is_empty());
}

#[test]
fn missing_render_root_is_a_silent_no_op() {
    let (host, _frames, controller) = setup(800, 600);
    host.set_render_root(false);
    assert_eq!(
        block_on(controller.toggle(&EffectParams::default())),
        ToggleOutcome::NothingToRender
    );
    assert!(controller.snapshot().is_inactive());
}

#[test]
fn unknown_texture_aborts_start() {
    let (host, frames, controller) = setup(800, 600);
    host.set_scene(Some(SceneBackground {
        image: "scenes/missing.png".into(),
        width: 800.0,
        height: 600.0,
    }));
    assert_eq!(
        block_on(controller.toggle(&EffectParams::default())),
        ToggleOutcome::TextureUnavailable
    );
    assert!(controller.snapshot().is_inactive());
    assert_eq!(host.created_drawables(), 0);
    assert_eq!(host.created_filters(), 0);
    assert!(frames.is_empty());
}

#[test]
fn zero_sized_texture_is_floored() {
    let (host, _frames, controller) = setup(800, 600);
    host.add_texture("scenes/tavern.webp", 0, 0);
    block_on(controller.toggle(&EffectParams::default()));
    assert_eq!(host.live_filters()[0].texture_size, [1.0, 1.0]);
}

#[test]
fn pulse_returns_to_minimum_each_cycle() {
    let (host, frames, controller) = setup(800, 600);
    let params = EffectParams {
        layout: LayoutMode::Single,
        block_min: 4.0,
        block_max: 12.0,
        cycle: Duration::from_millis(1000),
    };
    block_on(controller.toggle(&params));

    let mut samples = Vec::new();
    for _ in 0..100 {
        host.drive(&frames, FRAME, FRAME);
        samples.push(host.live_filters()[0].block_size);
    }
    assert!(samples.iter().all(|value| (4.0..=12.0).contains(value)));
    // frame 50 lands on half a cycle, frame 100 on a full one
    assert!((samples[49] - 12.0).abs() < 1e-3);
    assert!((samples[99] - 4.0).abs() < 1e-3);
    assert_eq!(host.live_filters()[0].writes, 100);
}

#[test]
fn toggle_after_host_destroyed_the_filter_turns_the_effect_off() {
    let (host, frames, controller) = setup(800, 600);
    let params = EffectParams::default();
    block_on(controller.toggle(&params));
    host.destroy_filters_externally();

    assert_eq!(block_on(controller.toggle(&params)), ToggleOutcome::Stopped);
    assert!(!controller.is_active());
    assert!(controller.snapshot().is_inactive());
    assert!(host.live_drawables().is_empty());
    assert!(host.root_children().is_empty());
    assert!(frames.is_empty());
    assert_eq!(host.created_drawables(), 1);
}

#[test]
fn running_effect_is_released_when_the_controller_is_dropped() {
    let (host, frames, controller) = setup(800, 600);
    block_on(controller.toggle(&EffectParams::default().with_layout(LayoutMode::Grid)));
    let started_at = controller.snapshot().started_at;
    assert!(started_at.is_some());

    drop(controller);
    assert!(frames.is_empty());
    assert!(host.live_drawables().is_empty());
    assert!(host.live_filters().is_empty());
    assert!(host.root_children().is_empty());
}
