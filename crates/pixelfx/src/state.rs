use chrono::{DateTime, Local};
use scheduler::TickToken;

/// Authoritative record of what the controller owns.
///
/// While `active`, `drawables` is non-empty and `ticker` is set. `filter` is
/// set too unless the host destroyed it, in which case frames do nothing
/// until the next stop. `generation` moves on every start attempt and every
/// teardown; work bound to an older generation (a start resuming from its
/// texture load, a frame callback that outlived its registration) must not
/// touch the state.
pub struct EffectState<D, F> {
    pub(crate) active: bool,
    pub(crate) drawables: Vec<D>,
    pub(crate) ticker: Option<TickToken>,
    pub(crate) filter: Option<F>,
    pub(crate) generation: u64,
    pub(crate) pending_start: Option<u64>,
    pub(crate) started_at: Option<DateTime<Local>>,
}

/// Shape of an [`EffectState`] with the handles reduced to counts and flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    pub active: bool,
    pub drawables: usize,
    pub ticker: bool,
    pub filter: bool,
    pub starting: bool,
    /// Wall-clock time the running effect was brought up.
    pub started_at: Option<DateTime<Local>>,
}

impl StateSnapshot {
    /// True for the canonical "off" shape.
    pub fn is_inactive(&self) -> bool {
        *self == StateSnapshot::default()
    }
}

impl<D, F> EffectState<D, F> {
    pub fn new() -> Self {
        Self {
            active: false,
            drawables: Vec::new(),
            ticker: None,
            filter: None,
            generation: 0,
            pending_start: None,
            started_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            active: self.active,
            drawables: self.drawables.len(),
            ticker: self.ticker.is_some(),
            filter: self.filter.is_some(),
            starting: self.pending_start.is_some(),
            started_at: self.started_at,
        }
    }

    /// Resources still recorded although the effect is not running, typically
    /// left behind by a stop that did not complete.
    pub fn has_leftovers(&self) -> bool {
        !self.active && (!self.drawables.is_empty() || self.ticker.is_some() || self.filter.is_some())
    }

    /// Opens a new generation for a start that is about to suspend.
    pub(crate) fn begin_start(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.pending_start = Some(self.generation);
        self.generation
    }

    /// Closes the pending start of `generation`. Returns false when the start
    /// was cancelled or superseded while it was suspended.
    pub(crate) fn finish_start(&mut self, generation: u64) -> bool {
        if self.active || self.generation != generation || self.pending_start != Some(generation) {
            return false;
        }
        self.pending_start = None;
        true
    }

    pub(crate) fn activate(&mut self, drawables: Vec<D>, filter: F, ticker: TickToken) {
        self.active = true;
        self.drawables = drawables;
        self.filter = Some(filter);
        self.ticker = Some(ticker);
        self.started_at = Some(Local::now());
    }

    /// Resets to the inactive default, handing back whatever was owned.
    pub(crate) fn take_resources(&mut self) -> (Vec<D>, Option<F>) {
        self.active = false;
        self.ticker = None;
        self.pending_start = None;
        self.started_at = None;
        self.generation = self.generation.wrapping_add(1);
        (std::mem::take(&mut self.drawables), self.filter.take())
    }
}

impl<D, F> Default for EffectState<D, F> {
    fn default() -> Self {
        Self::new()
    }
}
