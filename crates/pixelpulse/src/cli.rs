use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use relay::User;

#[derive(Parser, Debug)]
#[command(
    name = "pixelpulse",
    author,
    version,
    about = "Oscillating pixelation overlay driver",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Configuration file with effect presets; defaults to `config.toml` in the config directory.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Toggle the effect on a simulated scene and trace the block size.
    Simulate(SimulateArgs),
    /// Resolve a relay payload and run the macro it names on a simulated scene.
    Relay(RelayArgs),
    /// Build the relay message a game master would send to active users.
    Broadcast(BroadcastArgs),
    /// Print resolved configuration paths.
    Where,
}

#[derive(Args, Debug, Clone)]
pub struct SceneArgs {
    /// Scene background dimensions.
    #[arg(
        long,
        value_name = "WIDTHxHEIGHT",
        value_parser = parse_scene_size,
        default_value = "1000x1000"
    )]
    pub scene: (u32, u32),

    /// Emit a JSON report instead of text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub scene: SceneArgs,

    /// Preset from the configuration file.
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Cover the scene with four mirrored quadrants.
    #[arg(long)]
    pub grid: bool,

    #[arg(long, value_name = "PIXELS")]
    pub block_min: Option<f32>,

    #[arg(long, value_name = "PIXELS")]
    pub block_max: Option<f32>,

    /// Length of one oscillation.
    #[arg(long, value_name = "MILLISECONDS")]
    pub cycle_ms: Option<u64>,

    /// Simulated time to run after the effect starts.
    #[arg(long, value_name = "MILLISECONDS", default_value_t = 5000)]
    pub duration_ms: u64,

    /// Simulated frame interval.
    #[arg(long, value_name = "MILLISECONDS", default_value_t = 16)]
    pub frame_ms: u64,

    /// Print every Nth frame of the trace in text mode.
    #[arg(long, value_name = "N", default_value_t = 15)]
    pub every: usize,

    /// Leave the effect running at the end instead of toggling it off.
    #[arg(long)]
    pub keep_running: bool,
}

#[derive(Args, Debug)]
pub struct RelayArgs {
    #[command(flatten)]
    pub scene: SceneArgs,

    /// Relay payload JSON; read from stdin when omitted.
    #[arg(long, value_name = "JSON")]
    pub payload: Option<String>,
}

#[derive(Args, Debug)]
pub struct BroadcastArgs {
    /// Connected users as `ID:NAME`, suffixed with `:away` when inactive.
    #[arg(long = "user", value_name = "ID:NAME[:away]", value_parser = parse_user)]
    pub users: Vec<User>,

    /// Macro arguments: grid flag, block min, block max, cycle in ms. Each is
    /// read as JSON when possible, otherwise as a string.
    #[arg(value_name = "ARG")]
    pub args: Vec<String>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_scene_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid scene width '{}'", w.trim()))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid scene height '{}'", h.trim()))?;
    if width == 0 || height == 0 {
        return Err("scene dimensions must be greater than zero".into());
    }
    Ok((width, height))
}

pub fn parse_user(value: &str) -> Result<User, String> {
    let mut parts = value.trim().splitn(3, ':');
    let id = parts.next().unwrap_or_default().trim();
    if id.is_empty() {
        return Err("user id must not be empty".into());
    }
    let name = parts.next().map(str::trim).filter(|name| !name.is_empty()).unwrap_or(id);
    let active = match parts.next().map(|status| status.trim().to_ascii_lowercase()) {
        None => true,
        Some(status) if status == "away" => false,
        Some(status) if status == "active" => true,
        Some(other) => return Err(format!("unknown user status '{other}'; expected away or active")),
    };
    Ok(User::new(id, name, active))
}
