use std::io::{self, Read};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use hostsim::SimHost;
use pixelfx::{EffectController, EffectParams, ToggleOutcome};
use relay::{Broadcast, MacroBook, MacroEntry, PIXELATE_MACRO};
use scheduler::FrameLoop;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::cli::{BroadcastArgs, RelayArgs, SceneArgs, SimulateArgs};
use crate::paths::AppPaths;
use crate::report::{outcome_label, RelayReport, Sample, SimulationReport};
use crate::settings::{load_config, resolve_params};

const SCENE_IMAGE: &str = "scenes/simulated-background.webp";
const PIXELATE_MACRO_ID: &str = "pixelate-macro";

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

struct Simulation {
    controller: EffectController<SimHost, FrameLoop>,
}

impl Simulation {
    fn new(scene: &SceneArgs) -> Self {
        let (width, height) = scene.scene;
        let host = SimHost::with_scene(SCENE_IMAGE, width, height);
        let controller = EffectController::new(Rc::new(host), Rc::new(FrameLoop::new()));
        Self { controller }
    }

    fn toggle(&self, params: &EffectParams) -> ToggleOutcome {
        pollster::block_on(self.controller.toggle(params))
    }

    fn step(&self, frame: Duration) {
        self.controller
            .host()
            .drive(self.controller.scheduler(), frame, frame);
    }

    fn current_block_size(&self) -> Option<f32> {
        self.controller
            .host()
            .live_filters()
            .first()
            .map(|filter| filter.block_size)
    }
}

pub fn simulate(config_path: Option<&Path>, args: SimulateArgs) -> Result<()> {
    if args.frame_ms == 0 {
        bail!("frame interval must be at least one millisecond");
    }
    let loaded = load_config(config_path)?;
    let params = resolve_params(loaded.config.as_ref(), &args)?;
    let sim = Simulation::new(&args.scene);

    let started = sim.toggle(&params);
    tracing::info!(outcome = %outcome_label(&started), layout = %params.layout, "toggled effect");
    let ToggleOutcome::Started { drawables } = started else {
        bail!("effect did not start: {}", outcome_label(&started));
    };

    let step = Duration::from_millis(args.frame_ms);
    let total = Duration::from_millis(args.duration_ms);
    let mut elapsed = Duration::ZERO;
    let mut trace = Vec::new();
    while elapsed + step <= total {
        sim.step(step);
        elapsed += step;
        let Some(block_size) = sim.current_block_size() else {
            tracing::warn!(elapsed_ms = elapsed.as_millis() as u64, "effect went away mid-run");
            break;
        };
        trace.push(Sample {
            elapsed_ms: elapsed.as_millis() as u64,
            block_size,
        });
    }

    let final_running = sim.controller.snapshot();
    let stopped = if args.keep_running {
        None
    } else {
        let outcome = sim.controller.stop();
        tracing::info!(outcome = %outcome_label(&outcome), "toggled effect");
        Some(outcome_label(&outcome))
    };

    let report = SimulationReport {
        scene: [args.scene.scene.0, args.scene.scene.1],
        params: (&params).into(),
        started: outcome_label(&started),
        drawables,
        started_at: final_running.started_at.map(|at| at.to_rfc3339()),
        frames: sim.controller.scheduler().frames(),
        trace,
        stopped,
        final_state: sim.controller.snapshot().into(),
    };

    if args.scene.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Scene {}x{} layout={} block={}..{} cycle={}ms",
        report.scene[0],
        report.scene[1],
        report.params.layout,
        report.params.block_min,
        report.params.block_max,
        report.params.cycle_ms
    );
    println!(
        "Started: {} drawables at {}",
        report.drawables,
        report.started_at.as_deref().unwrap_or("-")
    );
    for sample in report.trace.iter().step_by(args.every.max(1)) {
        println!("  t={:>6}ms  block={:.4}", sample.elapsed_ms, sample.block_size);
    }
    if let Some(stopped) = &report.stopped {
        println!("Stop: {stopped}");
    }
    println!("Frames dispatched: {}", report.frames);
    println!(
        "Final state: active={} drawables={} ticker={} filter={}",
        report.final_state.active,
        report.final_state.drawables,
        report.final_state.ticker,
        report.final_state.filter
    );
    Ok(())
}

pub fn relay(args: RelayArgs) -> Result<()> {
    let text = match args.payload {
        Some(payload) => payload,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read relay payload from stdin")?;
            buffer
        }
    };

    let book = pixelate_book();
    let dispatch = book
        .receive_json(&text)
        .context("relay payload was not accepted")?;
    let params = dispatch.context.to_params();
    tracing::info!(
        macro_name = %dispatch.entry.name,
        layout = %params.layout,
        "running relayed macro"
    );

    let sim = Simulation::new(&args.scene);
    let outcome = sim.toggle(&params);
    let report = RelayReport {
        macro_id: dispatch.entry.id.clone(),
        macro_name: dispatch.entry.name.clone(),
        params: (&params).into(),
        outcome: outcome_label(&outcome),
        state: sim.controller.snapshot().into(),
    };

    if args.scene.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Macro: {} ({})", report.macro_name, report.macro_id);
        println!(
            "Params: layout={} block={}..{} cycle={}ms",
            report.params.layout,
            report.params.block_min,
            report.params.block_max,
            report.params.cycle_ms
        );
        println!("Outcome: {}", report.outcome);
    }
    Ok(())
}

pub fn broadcast(args: BroadcastArgs) -> Result<()> {
    let book = pixelate_book();
    let entry = book
        .find_by_name(PIXELATE_MACRO)
        .context("pixelate macro missing from the macro book")?;
    let values: Vec<Value> = args.args.iter().map(|arg| parse_arg(arg)).collect();
    let message = Broadcast::for_active_users(&args.users, entry, &values);
    println!("{}", message.to_json()?);
    Ok(())
}

pub fn where_(config_path: Option<&Path>) -> Result<()> {
    let paths = AppPaths::discover()?;
    println!("Configuration:");
    println!("  config dir:  {}", paths.config_dir().display());
    let loaded = load_config(config_path)?;
    let status = if loaded.config.is_some() {
        "loaded"
    } else {
        "missing (built-in defaults)"
    };
    println!("  config file: {} [{status}]", loaded.path.display());
    if let Some(config) = &loaded.config {
        for name in config.presets.keys() {
            let marker = if config.defaults.preset.as_deref() == Some(name.as_str()) {
                " (default)"
            } else {
                ""
            };
            println!("  preset:      {name}{marker}");
        }
    }
    Ok(())
}

fn pixelate_book() -> MacroBook {
    let mut book = MacroBook::new();
    book.insert(MacroEntry::script(
        PIXELATE_MACRO_ID,
        PIXELATE_MACRO,
        "await togglePixelEffect(gmContext)",
    ));
    book
}

fn parse_arg(arg: &str) -> Value {
    serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.to_string()))
}
