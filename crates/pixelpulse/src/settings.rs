use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use effectconfig::{EffectConfig, LayoutMode};
use pixelfx::EffectParams;

use crate::cli::SimulateArgs;
use crate::paths::AppPaths;

/// Where the configuration came from, if anywhere.
#[derive(Debug)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub config: Option<EffectConfig>,
}

/// Loads the configuration file. An explicit path must exist; the default
/// location may be absent, in which case built-in defaults apply.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => (AppPaths::discover()?.config_file(), false),
    };

    if !path.exists() {
        if required {
            bail!("config file {} does not exist", path.display());
        }
        tracing::debug!(path = %path.display(), "no config file; using built-in defaults");
        return Ok(LoadedConfig { path, config: None });
    }

    let text = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config = EffectConfig::from_toml_str(&text)
        .with_context(|| format!("failed to load config file {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        presets = config.presets.len(),
        "loaded effect presets"
    );
    Ok(LoadedConfig {
        path,
        config: Some(config),
    })
}

/// Starts from the selected preset (or built-in defaults) and applies the
/// command-line overrides.
pub fn resolve_params(config: Option<&EffectConfig>, args: &SimulateArgs) -> Result<EffectParams> {
    let mut params = match (config, args.preset.as_deref()) {
        (Some(config), Some(name)) => config
            .preset(name)
            .map(EffectParams::from)
            .with_context(|| format!("unknown preset '{name}'"))?,
        (None, Some(name)) => bail!("preset '{name}' requested but no config file was found"),
        (Some(config), None) => config
            .default_preset()
            .map(EffectParams::from)
            .unwrap_or_default(),
        (None, None) => EffectParams::default(),
    };

    if args.grid {
        params.layout = LayoutMode::Grid;
    }
    if let Some(block_min) = args.block_min {
        params.block_min = block_min;
    }
    if let Some(block_max) = args.block_max {
        params.block_max = block_max;
    }
    if let Some(cycle_ms) = args.cycle_ms {
        params.cycle = Duration::from_millis(cycle_ms);
    }

    if !(params.block_min.is_finite() && params.block_min > 0.0) {
        bail!("block minimum must be a positive number");
    }
    if !params.block_max.is_finite() || params.block_max < params.block_min {
        bail!(
            "block maximum {} must not be below block minimum {}",
            params.block_max,
            params.block_min
        );
    }
    if params.cycle.is_zero() {
        bail!("cycle must be longer than zero");
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use clap::Parser;

    const CONFIG: &str = r#"
version = 1

[defaults]
preset = "storm"

[presets.subtle]

[presets.storm]
layout = "grid"
block_min = 4
block_max = 16
cycle = "2s"
"#;

    fn simulate(extra: &[&str]) -> SimulateArgs {
        let argv = ["pixelpulse", "simulate"].into_iter().chain(extra.iter().copied());
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Simulate(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn defaults_without_config() {
        let params = resolve_params(None, &simulate(&[])).unwrap();
        assert_eq!(params, EffectParams::default());
    }

    #[test]
    fn default_preset_then_overrides() {
        let config = EffectConfig::from_toml_str(CONFIG).unwrap();
        let params = resolve_params(Some(&config), &simulate(&[])).unwrap();
        assert_eq!(params.layout, LayoutMode::Grid);
        assert_eq!(params.block_max, 16.0);
        assert_eq!(params.cycle, Duration::from_secs(2));

        let params =
            resolve_params(Some(&config), &simulate(&["--preset", "subtle", "--cycle-ms", "750"]))
                .unwrap();
        assert_eq!(params.layout, LayoutMode::Single);
        assert_eq!(params.block_min, 3.0);
        assert_eq!(params.cycle, Duration::from_millis(750));
    }

    #[test]
    fn rejects_bad_overrides_and_unknown_presets() {
        let config = EffectConfig::from_toml_str(CONFIG).unwrap();
        assert!(resolve_params(Some(&config), &simulate(&["--preset", "calm"])).is_err());
        assert!(resolve_params(None, &simulate(&["--preset", "storm"])).is_err());
        assert!(resolve_params(None, &simulate(&["--block-min", "0"])).is_err());
        assert!(resolve_params(None, &simulate(&["--block-max", "1"])).is_err());
        assert!(resolve_params(None, &simulate(&["--cycle-ms", "0"])).is_err());
    }

    #[test]
    fn explicit_config_must_exist() {
        let root = tempfile::TempDir::new().unwrap();
        let missing = root.path().join("missing.toml");
        assert!(load_config(Some(&missing)).is_err());

        let present = root.path().join("fx.toml");
        fs::write(&present, CONFIG).unwrap();
        let loaded = load_config(Some(&present)).unwrap();
        assert_eq!(loaded.config.unwrap().presets.len(), 2);
    }
}
