//! Host fixture for the specfx engine: renders test signals through it,
//! prints level and distortion tables and runs the amplitude sanity sweep.

use std::error::Error;

use clap::Parser;
use specfx::{Context, EngineSettings};

mod cli;
mod commands;
mod signals;

use cli::{Cli, Command};

fn main() -> Result<(), Box<dyn Error>> {
    colog::init();
    let cli = Cli::parse();
    let context = Context::new(cli.sample_rate as f32);
    let settings = match &cli.settings {
        Some(path) => {
            log::info!("loading settings from {}", path.display());
            commands::load_settings(path)?
        }
        None => EngineSettings::default(),
    };
    match &cli.command {
        Command::Measure(args) => commands::measure(context, settings, args),
        Command::Levels(args) => commands::levels(context, settings, args),
        Command::Render(args) => commands::render(context, settings, args),
        Command::Defaults => commands::defaults(),
    }
}
