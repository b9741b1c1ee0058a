//! Stompbox CLI
//!
//! Command-line front end for the effects library: list the built-in
//! effects, apply one to an audio file (or a generated test tone), and
//! write the result.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::{error, info};

use stompbox::engine::{
    generate_stereo_test_tone, generate_test_tone, load_audio_file, save_audio_file,
    DEFAULT_BIT_DEPTH,
};
use stompbox::factory;

#[derive(Parser)]
#[command(name = "stompbox-cli", version, about = "Audio effects processor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in effects and their parameters
    List,
    /// Apply an effect to an audio file
    Apply(ApplyArgs),
    /// Generate a test tone WAV file
    Tone(ToneArgs),
}

#[derive(Args)]
struct ApplyArgs {
    /// Effect name (see `list`) or path to a plugin file with --plugin
    effect: String,

    /// Input audio file
    #[arg(short, long)]
    input: PathBuf,

    /// Output audio file
    #[arg(short, long)]
    output: PathBuf,

    /// Normalized parameter assignments, repeatable: --param 0=0.8
    #[arg(short, long = "param", value_parser = parse_param)]
    params: Vec<(usize, f32)>,

    /// Treat EFFECT as a plugin file path instead of a built-in name
    #[arg(long)]
    plugin: bool,
}

#[derive(Args)]
struct ToneArgs {
    /// Output WAV file
    #[arg(short, long)]
    output: PathBuf,

    /// Tone frequency in Hz
    #[arg(short, long, default_value_t = 440.0)]
    frequency: f32,

    /// Duration in seconds
    #[arg(short, long, default_value_t = 2.0)]
    duration: f32,

    /// Sample rate in Hz
    #[arg(short, long, default_value_t = 44100.0)]
    sample_rate: f64,

    /// Generate stereo (right channel one octave up)
    #[arg(long)]
    stereo: bool,
}

/// Parse an `index=value` parameter assignment
fn parse_param(arg: &str) -> std::result::Result<(usize, f32), String> {
    let (index, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected index=value, got {:?}", arg))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("bad parameter index {:?}: {}", index, e))?;
    let value = value
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("bad parameter value {:?}: {}", value, e))?;
    Ok((index, value))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::List => {
            list_effects();
            Ok(())
        }
        Commands::Apply(args) => apply(args),
        Commands::Tone(args) => tone(args),
    }
}

fn list_effects() {
    for name in factory::EFFECT_NAMES {
        let Some(effect) = factory::create_builtin(name) else {
            continue;
        };
        let params: Vec<String> = effect
            .params()
            .iter()
            .enumerate()
            .map(|(i, spec)| format!("{}:{}", i, spec.name))
            .collect();
        println!("{:<16} {}", name, params.join(" "));
    }
}

fn apply(args: ApplyArgs) -> anyhow::Result<()> {
    let mut processor = if args.plugin {
        factory::load_plugin_processor(Path::new(&args.effect))
            .with_context(|| format!("loading plugin {}", args.effect))?
    } else {
        factory::try_create_builtin_processor(&args.effect)?
    };

    let mut buffer = load_audio_file(&args.input)
        .with_context(|| format!("loading {}", args.input.display()))?;
    info!(
        "loaded {}: {} channels, {:.2}s at {} Hz",
        args.input.display(),
        buffer.num_channels(),
        buffer.duration_secs(),
        buffer.sample_rate
    );

    for &(index, value) in &args.params {
        processor.set_param(index, value);
        info!("set parameter {} = {}", index, processor.get_param(index));
    }

    let sample_rate = buffer.sample_rate;
    processor.process(&mut buffer.block_mut(), sample_rate);

    save_audio_file(&args.output, &buffer, DEFAULT_BIT_DEPTH)
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!("wrote {}", args.output.display());
    Ok(())
}

fn tone(args: ToneArgs) -> anyhow::Result<()> {
    let buffer = if args.stereo {
        generate_stereo_test_tone(
            args.frequency,
            args.frequency * 2.0,
            args.duration,
            args.sample_rate,
        )
    } else {
        generate_test_tone(args.frequency, args.duration, args.sample_rate)
    };

    save_audio_file(&args.output, &buffer, DEFAULT_BIT_DEPTH)
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!(
        "wrote {} ({:.2}s at {} Hz)",
        args.output.display(),
        buffer.duration_secs(),
        args.sample_rate
    );
    Ok(())
}
