use std::cell::RefCell;
use std::f64::consts::{FRAC_PI_2, TAU};
use std::rc::Rc;
use std::time::{Duration, Instant};

use scheduler::{FrameCallback, FrameScheduler};

use crate::health::prune_drawables;
use crate::host::{Drawable, HostError, ShaderFilter};
use crate::state::EffectState;
use crate::teardown::teardown;

/// Inclusive block-size bounds the oscillation moves between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockRange {
    pub min: f32,
    pub max: f32,
}

impl BlockRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Maps an oscillation value in `[0, 1]` onto the range.
    pub fn at(&self, osc: f32) -> f32 {
        let value = self.min + osc.clamp(0.0, 1.0) * (self.max - self.min);
        value.clamp(self.min.min(self.max), self.max.max(self.min))
    }
}

/// Position within the current cycle, in `[0, 1)`. A zero period pins the
/// phase at 0.
pub fn phase(elapsed: Duration, period: Duration) -> f32 {
    let period_ns = period.as_nanos();
    if period_ns == 0 {
        return 0.0;
    }
    let ratio = (elapsed.as_nanos() % period_ns) as f64 / period_ns as f64;
    let phase = ratio as f32;
    if phase >= 1.0 {
        0.0
    } else {
        phase
    }
}

/// Sine wave remapped to `[0, 1]`, at its minimum for `p = 0` and its maximum
/// for `p = 0.5`.
pub fn oscillation(p: f32) -> f32 {
    let wave = (f64::from(p) * TAU - FRAC_PI_2).sin() * 0.5 + 0.5;
    (wave as f32).clamp(0.0, 1.0)
}

pub fn block_size_at(range: BlockRange, elapsed: Duration, period: Duration) -> f32 {
    range.at(oscillation(phase(elapsed, period)))
}

enum Frame {
    Idle,
    Applied(f32),
    Desync,
    Broken(HostError),
}

/// Frame callback driving the filter of one effect generation.
pub(crate) struct PulseTicker<D, F, S: ?Sized> {
    state: Rc<RefCell<EffectState<D, F>>>,
    scheduler: Rc<S>,
    generation: u64,
    started: Instant,
    range: BlockRange,
    cycle: Duration,
}

impl<D, F, S> PulseTicker<D, F, S>
where
    D: Drawable<Filter = F> + 'static,
    F: ShaderFilter + 'static,
    S: FrameScheduler + ?Sized + 'static,
{
    pub(crate) fn new(
        state: Rc<RefCell<EffectState<D, F>>>,
        scheduler: Rc<S>,
        generation: u64,
        started: Instant,
        range: BlockRange,
        cycle: Duration,
    ) -> Self {
        Self {
            state,
            scheduler,
            generation,
            started,
            range,
            cycle,
        }
    }

    pub(crate) fn into_callback(mut self) -> FrameCallback {
        Box::new(move |now| self.on_frame(now))
    }

    fn on_frame(&mut self, now: Instant) {
        match self.advance(now) {
            Frame::Idle => {}
            Frame::Applied(value) => {
                tracing::trace!(generation = self.generation, block_size = value, "pulse");
            }
            Frame::Desync => {
                tracing::debug!(
                    generation = self.generation,
                    "effect resources vanished underneath the ticker; tearing down"
                );
                teardown(&self.state, &*self.scheduler);
            }
            Frame::Broken(err) => {
                tracing::warn!(
                    generation = self.generation,
                    error = %err,
                    "filter rejected block size update; tearing down"
                );
                teardown(&self.state, &*self.scheduler);
            }
        }
    }

    fn advance(&self, now: Instant) -> Frame {
        let Ok(mut state) = self.state.try_borrow_mut() else {
            return Frame::Idle;
        };
        if !state.active || state.generation != self.generation {
            return Frame::Idle;
        }
        let filter_gone = match state.filter.as_ref() {
            None => return Frame::Idle,
            Some(filter) => filter.is_destroyed(),
        };

        let pruned = prune_drawables(&mut state.drawables);
        if pruned > 0 {
            tracing::debug!(pruned, "dropped drawables destroyed by the host");
        }
        if state.drawables.is_empty() || filter_gone {
            return Frame::Desync;
        }

        let value = block_size_at(
            self.range,
            now.saturating_duration_since(self.started),
            self.cycle,
        );
        match state.filter.as_ref().map(|filter| filter.set_block_size(value)) {
            Some(Err(err)) => Frame::Broken(err),
            _ => Frame::Applied(value),
        }
    }
}
