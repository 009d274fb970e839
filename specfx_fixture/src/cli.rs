//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use specfx::{Effect, HopSize};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "specfx-fixture")]
#[command(about = "Render and measure test signals through the specfx engine", long_about = None)]
pub struct Cli {
    /// Engine settings as JSON (see the `defaults` subcommand)
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Sample rate, in Hz
    #[arg(long, global = true, default_value_t = 48000)]
    pub sample_rate: u32,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print level and harmonic content of a tone through each effect
    Measure(MeasureArgs),
    /// Amplitude sanity sweep over every effect, mix and vibe
    Levels(LevelsArgs),
    /// Render a test signal through the engine to a WAV file
    Render(RenderArgs),
    /// Print the default engine settings as JSON
    Defaults,
}

#[derive(Args, Debug)]
pub struct MeasureArgs {
    /// Only measure this effect (default: all)
    #[arg(long, value_parser = parse_effect)]
    pub effect: Option<Effect>,

    /// Tone frequency, in Hz
    #[arg(long, default_value_t = 1000.0)]
    pub freq: f32,

    /// Tone amplitude
    #[arg(long, default_value_t = 0.2)]
    pub amp: f32,

    /// Length of the capture, in seconds
    #[arg(long, default_value_t = 2.0)]
    pub seconds: f32,

    /// Time control, in seconds
    #[arg(long, default_value_t = 1.0)]
    pub time: f32,

    /// Vibe control
    #[arg(long, default_value_t = 0.5)]
    pub vibe: f32,

    /// Hop size, in samples
    #[arg(long, default_value = "256", value_parser = parse_hop)]
    pub hop: HopSize,

    /// Number of harmonics to report, counting the fundamental
    #[arg(long, default_value_t = 5)]
    pub harmonics: usize,
}

#[derive(Args, Debug)]
pub struct LevelsArgs {
    /// Tone frequency, in Hz
    #[arg(long, default_value_t = 440.0)]
    pub freq: f32,

    /// Tone amplitude
    #[arg(long, default_value_t = 0.25)]
    pub amp: f32,

    /// Length of each run, in seconds
    #[arg(long, default_value_t = 3.0)]
    pub seconds: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Signal {
    /// A sine tone at `--freq`
    Sine,
    /// Uniform white noise
    Noise,
    /// Clicks at `--freq` per second
    Clicks,
    /// An exponential sine sweep from 20 Hz to 20 kHz
    Sweep,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Output WAV file
    #[arg(short, long, default_value = "specfx_render.wav")]
    pub output: PathBuf,

    /// Test signal
    #[arg(long, value_enum, default_value_t = Signal::Sine)]
    pub signal: Signal,

    /// Signal frequency, in Hz
    #[arg(long, default_value_t = 440.0)]
    pub freq: f32,

    /// Signal amplitude
    #[arg(long, default_value_t = 0.25)]
    pub amp: f32,

    /// Length, in seconds
    #[arg(long, default_value_t = 4.0)]
    pub seconds: f32,

    /// Override the effect from the settings
    #[arg(long, value_parser = parse_effect)]
    pub effect: Option<Effect>,

    /// Seed for the noise signal
    #[arg(long, default_value_t = 1)]
    pub seed: u64,
}

fn parse_effect(arg: &str) -> Result<Effect, String> {
    Effect::effects()
        .iter()
        .copied()
        .find(|e| e.to_str().eq_ignore_ascii_case(arg))
        .ok_or_else(|| {
            let names: Vec<&str> = Effect::effects().iter().map(|e| e.to_str()).collect();
            format!("unknown effect '{}', expected one of {}", arg, names.join(", "))
        })
}

fn parse_hop(arg: &str) -> Result<HopSize, String> {
    let samples: usize = arg.parse().map_err(|e| format!("{}", e))?;
    HopSize::try_from(samples).map_err(|e| e.to_string())
}
