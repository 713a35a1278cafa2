use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use spopt::chart::{collect_warnings, parse_chart, song_from_chart};
use spopt::engine::Engine;
use spopt::model::{Difficulty, Instrument};
use spopt::optimiser::optimise;
use spopt::processed::ProcessedSong;
use spopt::settings::{DrumSettings, SqueezeSettings};
use spopt::util::logging::init_logging;

#[derive(Parser)]
#[command(name = "spopt", version, about = "Star Power path optimiser for rhythm-game charts")]
struct Cli {
    /// Chart file to optimise (.chart).
    chart: PathBuf,

    /// Scoring engine.
    #[arg(long, value_enum, default_value = "ch")]
    engine: EngineArg,

    /// Instrument to optimise.
    #[arg(long, value_enum, default_value = "guitar")]
    instrument: InstrumentArg,

    /// Difficulty to optimise.
    #[arg(long, value_enum, default_value = "expert")]
    difficulty: DifficultyArg,

    /// Playback speed in percent.
    #[arg(long, default_value_t = 100)]
    speed: i32,

    /// JSON file with squeeze settings; defaults to an ideal player.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Ignore double-kick notes on drums.
    #[arg(long)]
    no_double_kick: bool,

    /// Ignore every kick note on drums.
    #[arg(long)]
    no_kick: bool,

    /// Directory to write log files to.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Show debug logs.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EngineArg {
    Ch,
    Rb,
}

impl From<EngineArg> for Engine {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Ch => Engine::Ch,
            EngineArg::Rb => Engine::Rb,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InstrumentArg {
    Guitar,
    GuitarCoop,
    Bass,
    Rhythm,
    Keys,
    GhlGuitar,
    GhlBass,
    Drums,
}

impl From<InstrumentArg> for Instrument {
    fn from(arg: InstrumentArg) -> Self {
        match arg {
            InstrumentArg::Guitar => Instrument::Guitar,
            InstrumentArg::GuitarCoop => Instrument::GuitarCoop,
            InstrumentArg::Bass => Instrument::Bass,
            InstrumentArg::Rhythm => Instrument::Rhythm,
            InstrumentArg::Keys => Instrument::Keys,
            InstrumentArg::GhlGuitar => Instrument::GhlGuitar,
            InstrumentArg::GhlBass => Instrument::GhlBass,
            InstrumentArg::Drums => Instrument::Drums,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DifficultyArg {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl From<DifficultyArg> for Difficulty {
    fn from(arg: DifficultyArg) -> Self {
        match arg {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Medium => Difficulty::Medium,
            DifficultyArg::Hard => Difficulty::Hard,
            DifficultyArg::Expert => Difficulty::Expert,
        }
    }
}

fn load_squeeze_settings(path: Option<&PathBuf>) -> Result<SqueezeSettings> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read settings file {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse settings file {}", path.display()))
        }
        None => Ok(SqueezeSettings::optimal()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_dir.as_deref(), cli.verbose)?;

    let text = fs::read_to_string(&cli.chart)
        .with_context(|| format!("failed to read chart {}", cli.chart.display()))?;
    let chart = parse_chart(&text).context("failed to parse chart")?;
    let song = song_from_chart(&chart).context("failed to interpret chart")?;
    for warning in collect_warnings(&song) {
        warn!("{warning}");
    }

    let squeeze = load_squeeze_settings(cli.settings.as_ref())?;
    let drums = DrumSettings {
        enable_double_kick: !cli.no_double_kick,
        disable_kick: cli.no_kick,
    };

    info!(
        name = song.global_data().name.as_str(),
        speed = cli.speed,
        "optimising"
    );
    let processed = ProcessedSong::build(
        &song,
        cli.instrument.into(),
        cli.difficulty.into(),
        cli.engine.into(),
        squeeze,
        drums,
        cli.speed,
    )
    .context("failed to process song")?;
    let path = optimise(&processed).context("path search failed")?;

    let base = processed.base_score()?;
    let solos = processed.solo_total()?;
    if path.activations.is_empty() {
        println!("No feasible activations.");
    }
    let points = processed.points().points();
    for (i, act) in path.activations.iter().enumerate() {
        println!(
            "Activation {}: ticks {}..{}, engage at beat {:.3}, SP out at beat {:.3}",
            i + 1,
            points[act.act_start].tick.0,
            points[act.act_end].tick.0,
            act.engage_beat.0,
            act.end_beat.0,
        );
    }
    println!("Base score:  {base}");
    println!("Solo bonus:  {solos}");
    println!("SP boost:    {}", path.score_boost);
    println!("Total score: {}", path.total_score);

    Ok(())
}
