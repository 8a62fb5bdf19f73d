use scheduler::TickToken;

use crate::host::{Drawable, ShaderFilter};
use crate::state::EffectState;

/// What a health pass changed.
#[derive(Debug)]
pub struct HealReport<F> {
    pub pruned: usize,
    pub dropped_filter: bool,
    pub reset_active: bool,
    /// Registration left behind by a reset; the caller should cancel it.
    pub orphaned_ticker: Option<TickToken>,
    /// Live filter left behind by a reset; the caller should destroy it.
    pub orphaned_filter: Option<F>,
}

impl<F> HealReport<F> {
    pub fn changed(&self) -> bool {
        self.pruned > 0 || self.dropped_filter || self.reset_active
    }
}

/// Drops drawables the host no longer considers usable.
pub fn prune_drawables<D: Drawable>(drawables: &mut Vec<D>) -> usize {
    let before = drawables.len();
    drawables.retain(|drawable| drawable.is_usable());
    before - drawables.len()
}

/// Normalises `state` against what the host still considers alive.
///
/// Never creates anything. A filter the host destroyed is forgotten, leaving
/// an "active" state without a filter that frames ignore until the next stop.
/// Only an "active" state without any drawable is reset to inactive.
pub fn heal<D, F>(state: &mut EffectState<D, F>) -> HealReport<F>
where
    D: Drawable<Filter = F>,
    F: ShaderFilter,
{
    let pruned = prune_drawables(&mut state.drawables);

    let dropped_filter = match &state.filter {
        Some(filter) if filter.is_destroyed() => {
            state.filter = None;
            true
        }
        _ => false,
    };

    let mut report = HealReport {
        pruned,
        dropped_filter,
        reset_active: false,
        orphaned_ticker: None,
        orphaned_filter: None,
    };

    if state.active && state.drawables.is_empty() {
        state.active = false;
        state.started_at = None;
        report.reset_active = true;
        report.orphaned_ticker = state.ticker.take();
        report.orphaned_filter = state.filter.take();
    }

    report
}
