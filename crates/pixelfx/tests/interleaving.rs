//! Requests that land while a start is suspended on its texture load.

use std::rc::Rc;

use futures::executor::block_on;
use futures::join;
use hostsim::SimHost;
use pixelfx::{EffectController, EffectParams, LayoutMode, ToggleOutcome};
use scheduler::FrameLoop;

fn setup() -> (SimHost, Rc<FrameLoop>, EffectController<SimHost, FrameLoop>) {
    let host = SimHost::with_scene("scenes/harbor.jpg", 1024, 768);
    let frames = Rc::new(FrameLoop::new());
    let controller = EffectController::new(Rc::new(host.clone()), Rc::clone(&frames));
    (host, frames, controller)
}

#[test]
fn stop_during_load_prevents_orphaned_resources() {
    let (host, frames, controller) = setup();
    host.hold_texture_loads();
    let params = EffectParams::default();

    let (started, stopped) = block_on(async {
        join!(controller.toggle(&params), async {
            assert_eq!(host.pending_texture_loads(), 1);
            assert!(controller.snapshot().starting);
            let stopped = controller.stop();
            host.release_texture_loads();
            stopped
        })
    });

    assert_eq!(stopped, ToggleOutcome::PendingStartCancelled);
    assert_eq!(started, ToggleOutcome::Superseded);
    assert!(controller.snapshot().is_inactive());
    assert_eq!(host.created_drawables(), 0);
    assert_eq!(host.created_filters(), 0);
    assert!(frames.is_empty());
}

#[test]
fn second_toggle_during_load_cancels_the_first() {
    let (host, frames, controller) = setup();
    host.hold_texture_loads();
    let params = EffectParams::default().with_layout(LayoutMode::Grid);

    let (first, second) = block_on(async {
        join!(controller.toggle(&params), async {
            let outcome = controller.toggle(&params).await;
            host.release_texture_loads();
            outcome
        })
    });

    assert_eq!(second, ToggleOutcome::PendingStartCancelled);
    assert_eq!(first, ToggleOutcome::Superseded);
    assert!(host.live_drawables().is_empty());
    assert!(frames.is_empty());
}

#[test]
fn start_during_load_waits_for_the_pending_one() {
    let (host, frames, controller) = setup();
    host.hold_texture_loads();
    let params = EffectParams::default().with_layout(LayoutMode::Grid);

    let (first, second) = block_on(async {
        join!(controller.start(&params), async {
            let outcome = controller.start(&params).await;
            host.release_texture_loads();
            outcome
        })
    });

    assert_eq!(second, ToggleOutcome::StartPending);
    assert_eq!(first, ToggleOutcome::Started { drawables: 4 });
    assert_eq!(host.live_drawables().len(), 4);
    assert_eq!(host.live_filters().len(), 1);
    assert_eq!(frames.len(), 1);
}

#[test]
fn stale_start_never_doubles_a_newer_effect() {
    let (host, frames, controller) = setup();
    host.hold_texture_loads();
    let params = EffectParams::default().with_layout(LayoutMode::Grid);

    let (stale, fresh) = block_on(async {
        join!(controller.toggle(&params), async {
            controller.stop();
            host.release_texture_loads();
            // loads are no longer held, so this start runs straight through
            controller.toggle(&params).await
        })
    });

    assert_eq!(fresh, ToggleOutcome::Started { drawables: 4 });
    assert_eq!(stale, ToggleOutcome::Superseded);
    assert_eq!(host.live_drawables().len(), 4);
    assert_eq!(host.created_drawables(), 4);
    assert_eq!(frames.len(), 1);
    assert!(controller.is_active());
}
