//! Oscillating screen-space pixelation overlay.
//!
//! The crate owns the lifecycle of one pixelation effect layered underneath a
//! scene: a set of oversized textured quads sharing a single shader filter
//! whose block size pulses over time. The host (render tree, texture loader,
//! scene accessor) is abstracted behind [`Host`], and the per-frame driver
//! behind [`scheduler::FrameScheduler`].
//!
//! ```text
//!   toggle(params)
//!        │ heal() ── prune dead drawables, reset stale "active"
//!        ▼
//!   active? ──yes──▶ teardown() ──▶ inactive
//!        │ no
//!        ▼
//!   load_texture().await ──▶ generation still current?
//!        │                          │ no ──▶ Superseded
//!        ▼ yes
//!   placements() ─▶ create drawables ─▶ attach filter ─▶ insert at 0
//!        ▼
//!   FrameScheduler::start(PulseTicker) ──▶ block size = f(elapsed)
//! ```
//!
//! The host may destroy drawables or the filter at any time. Every frame and
//! every toggle re-validates what the controller thinks it owns, and any
//! inconsistency is resolved by tearing the effect down.

mod animation;
mod controller;
mod filter;
mod guard;
mod health;
mod host;
mod layout;
mod state;
mod teardown;
mod types;

pub use animation::{block_size_at, oscillation, phase, BlockRange};
pub use controller::{EffectController, HealSummary, ToggleOutcome};
pub use effectconfig::LayoutMode;
pub use filter::{FilterDescriptor, PixelUniforms, PIXELATE_FRAGMENT};
pub use guard::{attempt, Attempts};
pub use health::{heal, prune_drawables, HealReport};
pub use host::{Drawable, Host, HostError, SceneBackground, ShaderFilter};
pub use layout::{placements, Placement, GRID_TOP_ROW_ROTATION, OVERSIZE_FACTOR};
pub use state::{EffectState, StateSnapshot};
pub use teardown::{teardown, TeardownReport};
pub use types::EffectParams;
