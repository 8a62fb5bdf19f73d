use std::cell::RefCell;
use std::rc::Rc;

use scheduler::FrameScheduler;

use crate::animation::PulseTicker;
use crate::filter::{FilterDescriptor, PixelUniforms};
use crate::guard::{attempt, Attempts};
use crate::health::heal;
use crate::host::{Drawable, Host, SceneBackground};
use crate::layout::placements;
use crate::state::{EffectState, StateSnapshot};
use crate::teardown::{release_drawable, release_filter, teardown, TeardownReport};
use crate::types::EffectParams;

/// Result of a lifecycle request. None of these are errors; they describe
/// which branch the request took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Started { drawables: usize },
    Stopped,
    AlreadyActive,
    AlreadyInactive,
    /// A start is suspended on its texture load.
    StartPending,
    PendingStartCancelled,
    /// No scene, no background image, no render root, or no drawable could be built.
    NothingToRender,
    TextureUnavailable,
    FilterUnavailable,
    SchedulerUnavailable,
    /// The state moved on while this start was loading its texture.
    Superseded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealSummary {
    pub pruned: usize,
    pub dropped_filter: bool,
    pub reset_active: bool,
}

/// Owns the single pixelation effect of a client session. Dropping the
/// controller tears down whatever it still owns.
pub struct EffectController<H: Host, S: FrameScheduler> {
    host: Rc<H>,
    scheduler: Rc<S>,
    state: Rc<RefCell<EffectState<H::Drawable, H::Filter>>>,
}

impl<H, S> EffectController<H, S>
where
    H: Host,
    H::Drawable: 'static,
    H::Filter: 'static,
    S: FrameScheduler + 'static,
{
    pub fn new(host: Rc<H>, scheduler: Rc<S>) -> Self {
        Self {
            host,
            scheduler,
            state: Rc::new(RefCell::new(EffectState::new())),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.state.borrow().snapshot()
    }

    pub fn is_active(&self) -> bool {
        self.state.borrow().is_active()
    }

    /// Stops a running effect, otherwise starts one with `params`.
    ///
    /// A toggle arriving while an earlier start is still loading its texture
    /// cancels that start.
    pub async fn toggle(&self, params: &EffectParams) -> ToggleOutcome {
        self.heal();
        let (active, pending) = {
            let state = self.state.borrow();
            (state.active, state.pending_start.is_some())
        };
        if active {
            self.teardown();
            return ToggleOutcome::Stopped;
        }
        if pending {
            self.teardown();
            return ToggleOutcome::PendingStartCancelled;
        }
        self.bring_up(params).await
    }

    /// Starts the effect unless it is already running or starting.
    pub async fn start(&self, params: &EffectParams) -> ToggleOutcome {
        self.heal();
        let (active, pending) = {
            let state = self.state.borrow();
            (state.active, state.pending_start.is_some())
        };
        if active {
            return ToggleOutcome::AlreadyActive;
        }
        if pending {
            return ToggleOutcome::StartPending;
        }
        self.bring_up(params).await
    }

    /// Stops the effect. Stopping an inactive effect changes nothing.
    pub fn stop(&self) -> ToggleOutcome {
        self.heal();
        let (active, pending, leftovers) = {
            let state = self.state.borrow();
            (state.active, state.pending_start.is_some(), state.has_leftovers())
        };
        if !active && !pending && !leftovers {
            return ToggleOutcome::AlreadyInactive;
        }
        self.teardown();
        if active || leftovers {
            ToggleOutcome::Stopped
        } else {
            ToggleOutcome::PendingStartCancelled
        }
    }

    /// Runs a health pass and disposes of anything it orphaned.
    pub fn heal(&self) -> HealSummary {
        let report = heal(&mut self.state.borrow_mut());
        if report.changed() {
            tracing::debug!(
                pruned = report.pruned,
                dropped_filter = report.dropped_filter,
                reset_active = report.reset_active,
                "healed effect state"
            );
        }

        let mut attempts = Attempts::new();
        if let Some(token) = report.orphaned_ticker {
            attempts.run("cancel orphaned frame callback", || self.scheduler.cancel(token));
        }
        if let Some(filter) = &report.orphaned_filter {
            release_filter(filter, &mut attempts);
        }

        HealSummary {
            pruned: report.pruned,
            dropped_filter: report.dropped_filter,
            reset_active: report.reset_active,
        }
    }

    fn teardown(&self) -> TeardownReport {
        let report = teardown(&self.state, &*self.scheduler);
        tracing::debug!(
            released = report.released,
            failures = report.failures,
            "pixelation effect stopped"
        );
        report
    }

    async fn bring_up(&self, params: &EffectParams) -> ToggleOutcome {
        if self.state.borrow().has_leftovers() {
            tracing::debug!("stale resources recorded while inactive; forcing cleanup");
            self.teardown();
        }

        let Some(scene) = self.resolve_scene() else {
            return ToggleOutcome::NothingToRender;
        };

        let generation = self.state.borrow_mut().begin_start();
        tracing::debug!(generation, image = %scene.image, "loading background texture");
        let loaded = self.host.load_texture(&scene.image).await;

        if !self.state.borrow_mut().finish_start(generation) {
            tracing::debug!(generation, "start superseded while loading texture");
            return ToggleOutcome::Superseded;
        }

        let texture = match loaded {
            Ok(texture) => texture,
            Err(err) => {
                tracing::warn!(error = %err, "failed loading texture; aborting start");
                return ToggleOutcome::TextureUnavailable;
            }
        };

        let dimensions = self.host.texture_dimensions(&texture);
        let descriptor = FilterDescriptor::pixelate(PixelUniforms::new(params.block_min, dimensions));
        let Some(filter) = attempt("create filter", || self.host.create_filter(&descriptor)) else {
            return ToggleOutcome::FilterUnavailable;
        };

        let mut drawables = Vec::new();
        for placement in placements(params.layout, scene.width, scene.height) {
            let Some(drawable) =
                attempt("create drawable", || self.host.create_drawable(&texture, &placement))
            else {
                continue;
            };
            attempt("attach filter", || drawable.attach_filter(&filter));
            attempt("insert drawable", || self.host.insert_child_at(&drawable, 0));
            drawables.push(drawable);
        }

        if drawables.is_empty() {
            tracing::warn!("no drawable could be created; aborting start");
            release_filter(&filter, &mut Attempts::new());
            return ToggleOutcome::NothingToRender;
        }

        let ticker = PulseTicker::new(
            Rc::clone(&self.state),
            Rc::clone(&self.scheduler),
            generation,
            self.host.now(),
            params.range(),
            params.cycle,
        );
        let token = match self.scheduler.start(ticker.into_callback(), None) {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!(error = %err, "failed registering frame callback; cleaning up");
                let mut attempts = Attempts::new();
                for drawable in &drawables {
                    release_drawable(drawable, &mut attempts);
                }
                release_filter(&filter, &mut attempts);
                return ToggleOutcome::SchedulerUnavailable;
            }
        };

        let count = drawables.len();
        self.state.borrow_mut().activate(drawables, filter, token);
        tracing::debug!(
            generation,
            layout = %params.layout,
            drawables = count,
            block_min = params.block_min,
            block_max = params.block_max,
            cycle_ms = params.cycle.as_millis() as u64,
            "pixelation effect started"
        );
        ToggleOutcome::Started { drawables: count }
    }

    fn resolve_scene(&self) -> Option<SceneBackground> {
        let scene = self
            .host
            .scene_background()
            .filter(|scene| !scene.image.trim().is_empty())?;
        if !self.host.has_render_root() {
            return None;
        }
        Some(scene)
    }
}

impl<H: Host, S: FrameScheduler> Drop for EffectController<H, S> {
    fn drop(&mut self) {
        let owns_anything = {
            let Ok(state) = self.state.try_borrow() else {
                return;
            };
            state.active || state.pending_start.is_some() || state.has_leftovers()
        };
        if owns_anything {
            let report = teardown(&self.state, &*self.scheduler);
            tracing::debug!(released = report.released, "effect controller dropped while running");
        }
    }
}
