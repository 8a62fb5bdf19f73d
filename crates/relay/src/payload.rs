use std::time::Duration;

use effectconfig::{LayoutMode, DEFAULT_BLOCK_MAX, DEFAULT_BLOCK_MIN, DEFAULT_CYCLE};
use pixelfx::EffectParams;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{RelayError, ACTION};

/// Message sent on the relay channel.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayPayload {
    #[serde(default)]
    pub action: String,
    /// Only string ids are honoured; anything else reads as absent.
    #[serde(default, deserialize_with = "string_only")]
    pub macro_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gm_context: Option<GmContext>,
}

impl RelayPayload {
    pub fn execute_macro(macro_id: impl Into<String>, context: GmContext) -> Self {
        Self {
            action: ACTION.to_string(),
            macro_id: Some(macro_id.into()),
            gm_context: Some(context),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, RelayError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, RelayError> {
        Ok(serde_json::to_string(self)?)
    }
}

fn string_only<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(id) => Some(id),
        _ => None,
    })
}

/// Effect arguments chosen by the game master.
///
/// Fields keep whatever JSON the sender put on the wire (strings, numbers,
/// booleans or null) and are interpreted leniently on the receiving side.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GmContext {
    #[serde(default)]
    pub is_table_grid_arg: Value,
    #[serde(default)]
    pub block_min: Value,
    #[serde(default)]
    pub block_max: Value,
    #[serde(default)]
    pub cycle_ms: Value,
}

impl GmContext {
    /// Builds the context from positional macro arguments. Falsy arguments
    /// are replaced by the defaults before sending.
    pub fn from_args(args: &[Value]) -> Self {
        let or_default = |index: usize, fallback: Value| {
            args.get(index)
                .filter(|value| truthy(value))
                .cloned()
                .unwrap_or(fallback)
        };
        Self {
            is_table_grid_arg: args.first().cloned().unwrap_or(Value::Null),
            block_min: or_default(1, Value::from(3)),
            block_max: or_default(2, Value::from(3.02)),
            cycle_ms: or_default(3, Value::from(DEFAULT_CYCLE.as_millis() as u64)),
        }
    }

    pub fn layout(&self) -> LayoutMode {
        match &self.is_table_grid_arg {
            Value::Bool(true) => LayoutMode::Grid,
            Value::String(flag) => LayoutMode::from_grid_flag(flag),
            _ => LayoutMode::Single,
        }
    }

    pub fn block_min(&self) -> f32 {
        block_size(&self.block_min).unwrap_or(DEFAULT_BLOCK_MIN)
    }

    pub fn block_max(&self) -> f32 {
        block_size(&self.block_max).unwrap_or(DEFAULT_BLOCK_MAX)
    }

    pub fn cycle(&self) -> Duration {
        positive(&self.cycle_ms)
            .map(|ms| Duration::from_micros((ms * 1000.0).round() as u64))
            .filter(|cycle| !cycle.is_zero())
            .unwrap_or(DEFAULT_CYCLE)
    }

    pub fn to_params(&self) -> EffectParams {
        EffectParams {
            layout: self.layout(),
            block_min: self.block_min(),
            block_max: self.block_max(),
            cycle: self.cycle(),
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Reads a number or numeric string. Zero, negative and non-numeric values
/// read as absent.
fn positive(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (number.is_finite() && number > 0.0).then_some(number)
}

/// A positive number that survives narrowing to `f32`.
fn block_size(value: &Value) -> Option<f32> {
    positive(value)
        .map(|number| number as f32)
        .filter(|size| size.is_finite() && *size > 0.0)
}
