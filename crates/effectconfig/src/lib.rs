use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BLOCK_MIN: f32 = 3.0;
pub const DEFAULT_BLOCK_MAX: f32 = 3.02;
pub const DEFAULT_CYCLE: Duration = Duration::from_millis(5000);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// How the overlay covers the scene: one full quad, or four mirrored quadrants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Single,
    Grid,
}

impl LayoutMode {
    /// Interprets a loosely-typed "is table grid" flag. Only `true` (any case,
    /// no surrounding whitespace) selects the grid layout; everything else
    /// falls back to a single quad.
    pub fn from_grid_flag(flag: &str) -> Self {
        if flag.eq_ignore_ascii_case("true") {
            LayoutMode::Grid
        } else {
            LayoutMode::Single
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutMode::Single => f.write_str("single"),
            LayoutMode::Grid => f.write_str("grid"),
        }
    }
}

impl FromStr for LayoutMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "single" | "full" | "false" => Ok(LayoutMode::Single),
            "grid" | "table" | "true" => Ok(LayoutMode::Grid),
            other => Err(format!(
                "unknown layout mode '{other}'; expected single or grid"
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EffectConfig {
    pub version: u32,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub presets: BTreeMap<String, Preset>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Defaults {
    pub preset: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Preset {
    #[serde(default)]
    pub layout: LayoutMode,
    #[serde(default = "default_block_min")]
    pub block_min: f32,
    #[serde(default = "default_block_max")]
    pub block_max: f32,
    #[serde(default = "default_cycle", deserialize_with = "deserialize_duration")]
    pub cycle: Duration,
}

impl Default for Preset {
    fn default() -> Self {
        Self {
            layout: LayoutMode::default(),
            block_min: DEFAULT_BLOCK_MIN,
            block_max: DEFAULT_BLOCK_MAX,
            cycle: DEFAULT_CYCLE,
        }
    }
}

fn default_block_min() -> f32 {
    DEFAULT_BLOCK_MIN
}

fn default_block_max() -> f32 {
    DEFAULT_BLOCK_MAX
}

fn default_cycle() -> Duration {
    DEFAULT_CYCLE
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() || v.is_infinite() {
                return Err(E::custom("duration must be a finite non-negative number"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl EffectConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: EffectConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn preset(&self, name: &str) -> Option<&Preset> {
        self.presets.get(name)
    }

    /// The preset named by `defaults.preset`, or the first preset by name.
    pub fn default_preset(&self) -> Option<&Preset> {
        match self.defaults.preset.as_deref() {
            Some(name) => self.presets.get(name),
            None => self.presets.values().next(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.presets.is_empty() {
            return Err(ConfigError::Invalid(
                "config must define at least one preset".into(),
            ));
        }

        for (name, preset) in &self.presets {
            preset
                .validate()
                .map_err(|reason| ConfigError::Invalid(format!("preset '{name}' {reason}")))?;
        }

        if let Some(default_preset) = &self.defaults.preset {
            if !self.presets.contains_key(default_preset) {
                return Err(ConfigError::Invalid(format!(
                    "defaults.preset references unknown preset '{default_preset}'"
                )));
            }
        }

        Ok(())
    }
}

impl Preset {
    fn validate(&self) -> Result<(), String> {
        if !self.block_min.is_finite() || self.block_min <= 0.0 {
            return Err("block_min must be a positive number".into());
        }
        if !self.block_max.is_finite() || self.block_max < self.block_min {
            return Err(format!(
                "block_max ({}) must be >= block_min ({})",
                self.block_max, self.block_min
            ));
        }
        if self.cycle.is_zero() {
            return Err("cycle must be greater than zero".into());
        }
        Ok(())
    }
}
