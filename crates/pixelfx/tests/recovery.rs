use std::rc::Rc;
use std::time::Duration;

use futures::executor::block_on;
use hostsim::{Faults, SimHost};
use pixelfx::{EffectController, EffectParams, LayoutMode, ToggleOutcome};
use scheduler::FrameLoop;

const FRAME: Duration = Duration::from_millis(16);

fn setup() -> (SimHost, Rc<FrameLoop>, EffectController<SimHost, FrameLoop>) {
    let host = SimHost::with_scene("scenes/crypt.png", 1200, 800);
    let frames = Rc::new(FrameLoop::new());
    let controller = EffectController::new(Rc::new(host.clone()), Rc::clone(&frames));
    (host, frames, controller)
}

fn grid() -> EffectParams {
    EffectParams::default().with_layout(LayoutMode::Grid)
}

#[test]
fn external_destruction_is_healed_on_next_toggle() {
    let (host, frames, controller) = setup();
    block_on(controller.toggle(&grid()));
    assert_eq!(host.destroy_drawables_externally(), 4);

    let summary = controller.heal();
    assert_eq!(summary.pruned, 4);
    assert!(summary.reset_active);
    assert!(controller.snapshot().is_inactive());
    // the orphaned registration and filter are disposed of as well
    assert!(frames.is_empty());
    assert!(host.live_filters().is_empty());

    // a toggle after the desync starts a fresh effect instead of "stopping"
    assert_eq!(
        block_on(controller.toggle(&grid())),
        ToggleOutcome::Started { drawables: 4 }
    );
}

#[test]
fn ticker_tears_down_when_drawables_vanish() {
    let (host, frames, controller) = setup();
    block_on(controller.toggle(&grid()));
    host.drive(&frames, FRAME * 3, FRAME);

    host.destroy_drawables_externally();
    host.drive(&frames, FRAME, FRAME);

    assert!(controller.snapshot().is_inactive());
    assert!(frames.is_empty());
    assert!(host.live_filters().is_empty());

    // later frames are harmless
    assert_eq!(host.drive(&frames, FRAME * 5, FRAME), 5);
}

#[test]
fn ticker_keeps_running_on_partial_destruction() {
    let (host, frames, controller) = setup();
    block_on(controller.toggle(&grid()));
    let doomed = host.live_drawables()[2].id;
    assert!(host.destroy_drawable_externally(doomed));

    let before = host.live_filters()[0].writes;
    host.drive(&frames, FRAME, FRAME);
    assert_eq!(host.live_filters()[0].writes, before + 1);
    let snapshot = controller.snapshot();
    assert!(snapshot.active);
    assert_eq!(snapshot.drawables, 3);
}

#[test]
fn uniform_failure_stops_the_effect() {
    let (host, frames, controller) = setup();
    block_on(controller.toggle(&EffectParams::default()));
    host.set_faults(Faults {
        uniform_write: true,
        ..Faults::default()
    });

    host.drive(&frames, FRAME, FRAME);
    assert!(controller.snapshot().is_inactive());
    assert!(frames.is_empty());
    assert!(host.live_drawables().is_empty());
}

#[test]
fn externally_destroyed_filter_triggers_teardown() {
    let (host, frames, controller) = setup();
    block_on(controller.toggle(&grid()));
    host.destroy_filters_externally();

    host.drive(&frames, FRAME, FRAME);
    assert!(controller.snapshot().is_inactive());
    assert!(host.live_drawables().is_empty());
    assert!(host.root_children().is_empty());
}

#[test]
fn lost_filter_leaves_an_idle_effect_until_stopped() {
    let (host, frames, controller) = setup();
    block_on(controller.toggle(&grid()));
    host.destroy_filters_externally();

    // the health pass forgets the filter but the quads keep the effect "on"
    let summary = controller.heal();
    assert!(summary.dropped_filter);
    assert!(!summary.reset_active);
    let snapshot = controller.snapshot();
    assert!(snapshot.active && !snapshot.filter && snapshot.ticker);
    assert_eq!(snapshot.drawables, 4);

    // frames are no-ops while the filter is missing
    assert_eq!(host.drive(&frames, FRAME * 3, FRAME), 3);
    assert!(controller.is_active());
    assert_eq!(frames.len(), 1);

    assert_eq!(controller.stop(), ToggleOutcome::Stopped);
    assert!(controller.snapshot().is_inactive());
    assert!(frames.is_empty());
    assert!(host.live_drawables().is_empty());
    assert!(host.root_children().is_empty());
}

#[test]
fn start_keeps_an_idle_effect_instead_of_doubling_it() {
    let (host, _frames, controller) = setup();
    block_on(controller.toggle(&grid()));
    host.destroy_filters_externally();

    assert_eq!(
        block_on(controller.start(&grid())),
        ToggleOutcome::AlreadyActive
    );
    assert_eq!(host.created_drawables(), 4);
    assert_eq!(host.created_filters(), 1);
}

#[test]
fn failed_inserts_and_attaches_do_not_abort_start() {
    let (host, _frames, controller) = setup();
    host.set_faults(Faults {
        insert: true,
        attach: true,
        ..Faults::default()
    });

    assert_eq!(
        block_on(controller.toggle(&grid())),
        ToggleOutcome::Started { drawables: 4 }
    );
    assert!(host.root_children().is_empty());

    host.set_faults(Faults::default());
    assert_eq!(block_on(controller.toggle(&grid())), ToggleOutcome::Stopped);
    assert!(host.live_drawables().is_empty());
}

#[test]
fn failed_drawable_creation_skips_that_cell() {
    let (host, _frames, controller) = setup();
    host.set_faults(Faults {
        drawable_create: 1,
        ..Faults::default()
    });
    assert_eq!(
        block_on(controller.toggle(&grid())),
        ToggleOutcome::Started { drawables: 3 }
    );
    assert_eq!(host.live_drawables().len(), 3);
}

#[test]
fn no_drawables_means_no_effect() {
    let (host, frames, controller) = setup();
    host.set_faults(Faults {
        drawable_create: 4,
        ..Faults::default()
    });
    assert_eq!(
        block_on(controller.toggle(&grid())),
        ToggleOutcome::NothingToRender
    );
    assert!(controller.snapshot().is_inactive());
    assert!(host.live_filters().is_empty());
    assert!(frames.is_empty());
}

#[test]
fn filter_failure_aborts_before_drawables() {
    let (host, _frames, controller) = setup();
    host.set_faults(Faults {
        filter_create: true,
        ..Faults::default()
    });
    assert_eq!(
        block_on(controller.toggle(&EffectParams::default())),
        ToggleOutcome::FilterUnavailable
    );
    assert_eq!(host.created_drawables(), 0);
    assert!(controller.snapshot().is_inactive());
}

#[test]
fn texture_failure_leaves_state_inactive() {
    let (host, frames, controller) = setup();
    host.set_faults(Faults {
        texture_load: true,
        ..Faults::default()
    });
    assert_eq!(
        block_on(controller.toggle(&EffectParams::default())),
        ToggleOutcome::TextureUnavailable
    );
    assert!(controller.snapshot().is_inactive());
    assert!(frames.is_empty());

    host.set_faults(Faults::default());
    assert!(matches!(
        block_on(controller.toggle(&EffectParams::default())),
        ToggleOutcome::Started { .. }
    ));
}

#[test]
fn teardown_survives_failing_host_calls() {
    let (host, frames, controller) = setup();
    block_on(controller.toggle(&grid()));
    host.set_faults(Faults {
        detach: true,
        destroy: true,
        ..Faults::default()
    });

    assert_eq!(block_on(controller.toggle(&grid())), ToggleOutcome::Stopped);
    assert!(controller.snapshot().is_inactive());
    assert!(frames.is_empty());

    // destroy failed, so each quad was at least hidden and stripped
    let stranded = host.live_drawables();
    assert_eq!(stranded.len(), 4);
    assert!(stranded
        .iter()
        .all(|d| !d.visible && d.filter.is_none() && !d.has_texture));
    assert!(host.live_filters().is_empty());
}

#[test]
fn scheduler_refusal_rolls_back_the_start() {
    let (host, frames, controller) = setup();
    frames.close();
    assert_eq!(
        block_on(controller.toggle(&grid())),
        ToggleOutcome::SchedulerUnavailable
    );
    assert!(controller.snapshot().is_inactive());
    assert!(host.live_drawables().is_empty());
    assert!(host.live_filters().is_empty());
}
