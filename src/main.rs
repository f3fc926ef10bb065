//! Shiftwave: live bytebeat synthesizer.
//!
//! Start-up: load config, build the synth, install the first program, start
//! the audio stream, then read console commands from stdin until `q`, EOF or
//! Ctrl-C. Teardown stops the stream before dropping the program.

use std::error::Error;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use clap::{ArgAction, Parser};
use tracing::{info, Level};

use shiftwave::audio::{AudioOutput, OutputSettings};
use shiftwave::config::Config;
use shiftwave::console::Console;
use shiftwave::engine::Synth;

/// How often the console wakes to check the stop flag while idle.
const STDIN_POLL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "shiftwave", version)]
#[command(about = "Real-time bytebeat synthesizer with live-editable equations")]
struct Cli {
    /// Config file (default: ~/.shiftwave/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Preset to start on (1-based)
    #[arg(long)]
    preset: Option<usize>,

    /// Start on this equation instead of a preset
    #[arg(long, conflicts_with = "preset")]
    eq: Option<String>,

    /// Tempo multiplier (0.05..8.0)
    #[arg(long)]
    tempo: Option<f64>,

    /// Pitch offset in semitones
    #[arg(long, allow_negative_numbers = true)]
    pitch: Option<f64>,

    /// Output sample rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Print the preset list and exit
    #[arg(long)]
    list_presets: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

/// Lines from stdin, read on a helper thread so the console can notice
/// `running` going false without waiting for input.
fn stdin_lines(running: Arc<AtomicBool>) -> impl Iterator<Item = String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    std::iter::from_fn(move || loop {
        if !running.load(Ordering::Relaxed) {
            return None;
        }
        match rx.recv_timeout(STDIN_POLL) {
            Ok(line) => return Some(line),
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => return None,
        }
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // An explicit --config must load; the default location may be absent or broken.
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    let mut synth = Synth::with_macros(config.preset_bank(), config.macros);

    if cli.list_presets {
        for (i, preset) in synth.presets().iter().enumerate() {
            println!("{:2}. {:<18} {}", i + 1, preset.name, preset.source);
        }
        return Ok(());
    }

    synth.set_tempo(cli.tempo.unwrap_or(config.tempo));
    synth.set_pitch_semitones(cli.pitch.unwrap_or(config.pitch_semitones));

    match &cli.eq {
        Some(text) => {
            let canonical = synth.compile_and_install(text)?;
            println!("Program: {canonical}");
        }
        None => {
            let number = cli.preset.unwrap_or(config.start_preset);
            let preset = synth.select_preset(number)?;
            println!("Preset {number} selected: {}", preset.name);
        }
    }

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::Relaxed))?;
    }

    let settings = OutputSettings {
        sample_rate: cli.sample_rate.unwrap_or(config.sample_rate),
        buffer_frames: config.buffer_frames,
    };
    let output = AudioOutput::start(synth.renderer(), settings, Arc::clone(&running))?;
    info!(
        sample_rate = output.sample_rate(),
        channels = output.channels(),
        "audio started"
    );

    println!(
        "shiftwave v{} ({} Hz, {} ch)",
        env!("CARGO_PKG_VERSION"),
        output.sample_rate(),
        output.channels()
    );

    let result = {
        let mut console = Console::new(&mut synth, io::stdout().lock());
        console
            .print_help()
            .and_then(|()| console.run(stdin_lines(Arc::clone(&running)), &running))
    };

    running.store(false, Ordering::Relaxed);
    output.stop();
    synth.shutdown();

    result?;
    Ok(())
}
