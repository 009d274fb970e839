//! The fixture subcommands.

use std::error::Error;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use specfx::analysis::{measure_thd, rms, ThdResult};
use specfx::{Context, DualMonoEngine, Effect, EffectParams, EngineSettings, SpectralChannel};
use specfx::{WindowShape, FFT_SIZE};

use crate::cli::{LevelsArgs, MeasureArgs, RenderArgs, Signal};
use crate::signals;

const BLOCK_SIZE: usize = 48;
const PEAK_LIMIT: f32 = 0.95;
const MIN_PEAK: f32 = 0.001;
const MIN_RMS: f32 = 0.0005;
const LEVEL_MIX_VALUES: [f32; 3] = [0.0, 0.5, 1.0];
const LEVEL_VIBE_VALUES: [f32; 2] = [0.0, 0.8];

/// Run `input` through a fresh engine, duplicating it to both channels
pub fn run_engine(
    context: Context<f32>,
    settings: EngineSettings<f32>,
    input: &[f32],
) -> [Vec<f32>; 2] {
    let mut engine = Box::new(DualMonoEngine::new());
    engine.set_settings(settings);
    engine.init(context);
    let mut left = vec![0f32; input.len()];
    let mut right = vec![0f32; input.len()];
    for ((chunk, l), r) in input
        .chunks(BLOCK_SIZE)
        .zip(left.chunks_mut(BLOCK_SIZE))
        .zip(right.chunks_mut(BLOCK_SIZE))
    {
        engine.process_block([chunk, chunk], [l, r]);
    }
    [left, right]
}

/// Run a tone through one bare channel (no input or output conditioning) and
/// measure it after four frames of warm-up
pub fn measure_channel(
    context: Context<f32>,
    settings: &EngineSettings<f32>,
    effect: Effect,
    args: &MeasureArgs,
) -> ThdResult {
    let rate = context.sample_rate_hz();
    let warmup = 4 * FFT_SIZE;
    let capture = (args.seconds * rate as f32) as usize;
    let input = signals::sine(rate, args.freq, args.amp, warmup + capture);
    let mut channel = Box::new(SpectralChannel::new());
    channel.set_hop_size(args.hop);
    channel.set_settings(settings.channel);
    channel.init(context, &settings.window.build(settings.kaiser_beta));
    let params = EffectParams {
        time: args.time,
        vibe: args.vibe,
    };
    let mut output = vec![0f32; input.len()];
    channel.process_block(&input, &mut output, effect, &params);
    measure_thd(&output[warmup..], rate as f32, args.freq, args.harmonics)
}

pub fn measure(
    context: Context<f32>,
    settings: EngineSettings<f32>,
    args: &MeasureArgs,
) -> Result<(), Box<dyn Error>> {
    let effects: Vec<Effect> = match args.effect {
        Some(effect) => vec![effect],
        None => Effect::effects().to_vec(),
    };
    log::info!(
        "measuring {} Hz at {} through {} effect(s), hop {}",
        args.freq,
        args.amp,
        effects.len(),
        args.hop.samples()
    );
    println!(
        "{:<8} {:>8} {:>8} {:>8}  harmonics",
        "effect", "rms", "fund", "thd+n"
    );
    for effect in effects {
        let result = measure_channel(context, &settings, effect, args);
        let harmonics: Vec<String> = result.harmonics[1..]
            .iter()
            .map(|h| format!("{:.5}", h))
            .collect();
        println!(
            "{:<8} {:>8.5} {:>8.5} {:>8.5}  {}",
            effect.to_str(),
            result.rms,
            result.fund_rms,
            result.thdn,
            harmonics.join(" ")
        );
    }
    Ok(())
}

/// Peak and RMS of a level run, after warm-up
struct Levels {
    peak: f32,
    rms: f32,
    finite: bool,
}

fn level_run(
    context: Context<f32>,
    settings: EngineSettings<f32>,
    input: &[f32],
) -> Levels {
    let [left, right] = run_engine(context, settings, input);
    let sum: Vec<f32> = left
        .iter()
        .zip(right.iter())
        .skip(4 * FFT_SIZE)
        .map(|(l, r)| 0.5 * (l + r))
        .collect();
    Levels {
        peak: signals::peak(&sum),
        rms: rms(&sum),
        finite: sum.iter().all(|x| x.is_finite()),
    }
}

pub fn levels(
    context: Context<f32>,
    settings: EngineSettings<f32>,
    args: &LevelsArgs,
) -> Result<(), Box<dyn Error>> {
    let rate = context.sample_rate_hz();
    let input = signals::sine(rate, args.freq, args.amp, (args.seconds * rate as f32) as usize);
    let mut failures = 0;
    for effect in Effect::effects().iter().copied() {
        for mix in LEVEL_MIX_VALUES {
            for vibe in LEVEL_VIBE_VALUES {
                let run = EngineSettings {
                    effect,
                    mix,
                    vibe,
                    ..settings
                };
                let levels = level_run(context, run, &input);
                println!(
                    "{} mix={:.2} vibe={:.2} peak={:.4} rms={:.4}",
                    effect.to_str(),
                    mix,
                    vibe,
                    levels.peak,
                    levels.rms
                );
                let (mut min_peak, mut min_rms) = (MIN_PEAK, MIN_RMS);
                if effect == Effect::Fold && vibe < 0.1 {
                    (min_peak, min_rms) = (0.0, 0.0);
                }
                if mix < 0.01 {
                    (min_peak, min_rms) = (0.5 * MIN_PEAK, 0.5 * MIN_RMS);
                }
                if !levels.finite
                    || levels.peak > PEAK_LIMIT
                    || levels.peak < min_peak
                    || levels.rms < min_rms
                {
                    log::error!("{} mix={} vibe={} out of range", effect.to_str(), mix, vibe);
                    failures += 1;
                }
            }
        }
    }
    if failures > 0 {
        return Err(format!(
            "amplitude sanity check failed in {} run(s) (peak > {:.2}, too quiet or non-finite)",
            failures, PEAK_LIMIT
        )
        .into());
    }
    println!("Amplitude sanity check passed.");
    Ok(())
}

pub fn render(
    context: Context<f32>,
    mut settings: EngineSettings<f32>,
    args: &RenderArgs,
) -> Result<(), Box<dyn Error>> {
    let rate = context.sample_rate_hz();
    let len = (args.seconds * rate as f32) as usize;
    let input = match args.signal {
        Signal::Sine => signals::sine(rate, args.freq, args.amp, len),
        Signal::Noise => signals::noise(args.seed, args.amp, len),
        Signal::Clicks => signals::clicks(rate, args.freq, args.amp, len),
        Signal::Sweep => signals::sweep(rate, 20.0, 20000.0, args.amp, len),
    };
    if let Some(effect) = args.effect {
        settings.effect = effect;
    }
    log::info!(
        "rendering {:?} through {} ({} window) to {}",
        args.signal,
        settings.effect.to_str(),
        settings.window.to_str(),
        args.output.display()
    );
    let output = run_engine(context, settings, &input);
    write_wav(&args.output, rate, &output)?;
    println!(
        "wrote {} samples, peak {:.4} / {:.4}",
        len,
        signals::peak(&output[0]),
        signals::peak(&output[1])
    );
    Ok(())
}

pub fn defaults() -> Result<(), Box<dyn Error>> {
    let settings = EngineSettings::<f32>::default();
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

/// Load engine settings from a JSON file.  Missing fields take their default
/// values.
pub fn load_settings(path: &Path) -> Result<EngineSettings<f32>, Box<dyn Error>> {
    let text = std::fs::read_to_string(path)?;
    let settings: EngineSettings<f32> = serde_json::from_str(&text)?;
    if settings.window == WindowShape::Kaiser {
        log::debug!("kaiser beta {}", settings.kaiser_beta);
    }
    Ok(settings)
}

fn write_wav(path: &Path, sample_rate: u32, channels: &[Vec<f32>; 2]) -> Result<(), Box<dyn Error>> {
    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for (l, r) in channels[0].iter().zip(channels[1].iter()) {
        writer.write_sample(*l)?;
        writer.write_sample(*r)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use specfx::HopSize;

    fn measure_args(effect: Effect) -> MeasureArgs {
        MeasureArgs {
            effect: Some(effect),
            freq: 1000.0,
            amp: 0.2,
            seconds: 1.0,
            time: 1.0,
            vibe: 0.5,
            hop: HopSize::Samples256,
            harmonics: 5,
        }
    }

    #[test]
    fn thru_channel_measures_clean() {
        let settings = EngineSettings {
            channel: Default::default(),
            ..Default::default()
        };
        let result = measure_channel(
            Context::default(),
            &settings,
            Effect::Thru,
            &measure_args(Effect::Thru),
        );
        assert!((result.rms - 0.2 / 2f32.sqrt()).abs() < 1e-3);
        assert!(result.thdn < 0.01);
    }

    #[test]
    fn settings_json_round_trip() {
        let settings = EngineSettings::<f32> {
            effect: Effect::Comb,
            window: WindowShape::Kaiser,
            hop: HopSize::Samples512,
            ..Default::default()
        };
        let text = serde_json::to_string(&settings).unwrap();
        let back: EngineSettings<f32> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, settings);
        let partial: EngineSettings<f32> = serde_json::from_str(r#"{"mix": 0.25, "hop": 300}"#).unwrap();
        assert_eq!(partial.mix, 0.25);
        assert_eq!(partial.hop, HopSize::Samples256);
        assert_eq!(partial.effect, Effect::Smear);
    }

    #[test]
    fn wav_file_is_written() {
        let dir = std::env::temp_dir().join(format!("specfx-fixture-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("render.wav");
        let out = [vec![0.25f32; 100], vec![-0.25f32; 100]];
        write_wav(&path, 48000, &out).unwrap();
        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.len(), 200);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
