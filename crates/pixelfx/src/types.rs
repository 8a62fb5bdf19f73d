use std::time::Duration;

use effectconfig::{LayoutMode, Preset, DEFAULT_BLOCK_MAX, DEFAULT_BLOCK_MIN, DEFAULT_CYCLE};

use crate::animation::BlockRange;

/// Parameters of one effect start. They are fixed for the lifetime of the
/// effect; changing them requires a stop and a new start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParams {
    pub layout: LayoutMode,
    pub block_min: f32,
    pub block_max: f32,
    pub cycle: Duration,
}

impl EffectParams {
    pub fn range(&self) -> BlockRange {
        BlockRange::new(self.block_min, self.block_max)
    }

    pub fn with_layout(mut self, layout: LayoutMode) -> Self {
        self.layout = layout;
        self
    }
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            layout: LayoutMode::Single,
            block_min: DEFAULT_BLOCK_MIN,
            block_max: DEFAULT_BLOCK_MAX,
            cycle: DEFAULT_CYCLE,
        }
    }
}

impl From<&Preset> for EffectParams {
    fn from(preset: &Preset) -> Self {
        Self {
            layout: preset.layout,
            block_min: preset.block_min,
            block_max: preset.block_max,
            cycle: preset.cycle,
        }
    }
}
