use pixelfx::{EffectParams, StateSnapshot, ToggleOutcome};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ParamsReport {
    pub layout: String,
    pub block_min: f32,
    pub block_max: f32,
    pub cycle_ms: u64,
}

impl From<&EffectParams> for ParamsReport {
    fn from(params: &EffectParams) -> Self {
        Self {
            layout: params.layout.to_string(),
            block_min: params.block_min,
            block_max: params.block_max,
            cycle_ms: params.cycle.as_millis() as u64,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StateReport {
    pub active: bool,
    pub drawables: usize,
    pub ticker: bool,
    pub filter: bool,
}

impl From<StateSnapshot> for StateReport {
    fn from(snapshot: StateSnapshot) -> Self {
        Self {
            active: snapshot.active,
            drawables: snapshot.drawables,
            ticker: snapshot.ticker,
            filter: snapshot.filter,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Sample {
    pub elapsed_ms: u64,
    pub block_size: f32,
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub scene: [u32; 2],
    pub params: ParamsReport,
    pub started: String,
    pub drawables: usize,
    pub started_at: Option<String>,
    pub frames: u64,
    pub trace: Vec<Sample>,
    pub stopped: Option<String>,
    pub final_state: StateReport,
}

#[derive(Debug, Serialize)]
pub struct RelayReport {
    pub macro_id: String,
    pub macro_name: String,
    pub params: ParamsReport,
    pub outcome: String,
    pub state: StateReport,
}

pub fn outcome_label(outcome: &ToggleOutcome) -> String {
    match outcome {
        ToggleOutcome::Started { drawables } => format!("started ({drawables} drawables)"),
        ToggleOutcome::Stopped => "stopped".into(),
        ToggleOutcome::AlreadyActive => "already active".into(),
        ToggleOutcome::AlreadyInactive => "already inactive".into(),
        ToggleOutcome::StartPending => "start pending".into(),
        ToggleOutcome::PendingStartCancelled => "pending start cancelled".into(),
        ToggleOutcome::NothingToRender => "nothing to render".into(),
        ToggleOutcome::TextureUnavailable => "texture unavailable".into(),
        ToggleOutcome::FilterUnavailable => "filter unavailable".into(),
        ToggleOutcome::SchedulerUnavailable => "scheduler unavailable".into(),
        ToggleOutcome::Superseded => "superseded".into(),
    }
}
