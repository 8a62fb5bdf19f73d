mod cli;
mod paths;
mod report;
mod run;
mod settings;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    let config = cli.config.as_deref();
    match cli.command {
        Command::Simulate(args) => run::simulate(config, args),
        Command::Relay(args) => run::relay(args),
        Command::Broadcast(args) => run::broadcast(args),
        Command::Where => run::where_(config),
    }
}
