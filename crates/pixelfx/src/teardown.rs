use std::cell::RefCell;

use scheduler::FrameScheduler;

use crate::guard::Attempts;
use crate::host::{Drawable, ShaderFilter};
use crate::state::EffectState;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TeardownReport {
    pub cancelled_ticker: bool,
    pub released: usize,
    pub filter_released: bool,
    pub failures: usize,
}

/// Stops the effect and releases everything it owns. Never fails; every host
/// call is isolated and the state always ends up inactive.
///
/// The ticker is cancelled before anything else, and the shared state is
/// reset before any resource is destroyed, so a callback firing in between
/// only ever sees the inactive state.
pub fn teardown<D, F, S>(state: &RefCell<EffectState<D, F>>, scheduler: &S) -> TeardownReport
where
    D: Drawable<Filter = F>,
    F: ShaderFilter,
    S: FrameScheduler + ?Sized,
{
    let mut attempts = Attempts::new();
    let mut report = TeardownReport::default();

    let ticker = state.borrow_mut().ticker.take();
    if let Some(token) = ticker {
        report.cancelled_ticker = attempts
            .run("cancel frame callback", || scheduler.cancel(token))
            .is_some();
    }

    let (drawables, filter) = state.borrow_mut().take_resources();

    for drawable in &drawables {
        release_drawable(drawable, &mut attempts);
    }
    report.released = drawables.len();

    if let Some(filter) = filter {
        release_filter(&filter, &mut attempts);
        report.filter_released = true;
    }

    report.failures = attempts.failures();
    if report.failures > 0 {
        tracing::debug!(failures = report.failures, "teardown completed with failed steps");
    }
    report
}

pub(crate) fn release_drawable<D: Drawable>(drawable: &D, attempts: &mut Attempts) {
    attempts.run("clear drawable filters", || drawable.clear_filters());
    attempts.run("detach drawable", || drawable.detach());
    attempts.run("release drawable texture", || drawable.release_texture());
    if attempts.run("destroy drawable", || drawable.destroy()).is_none() {
        attempts.run("hide drawable", || drawable.hide());
    }
}

pub(crate) fn release_filter<F: ShaderFilter>(filter: &F, attempts: &mut Attempts) {
    attempts.run("disable filter", || filter.disable());
    attempts.run("destroy filter", || filter.destroy());
}
