//! Lasers and Bots entry point
//!
//! Runs levels headlessly from scripted input, and inspects the save store.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use lasers_and_bots::consts::*;
use lasers_and_bots::sim::{GameEvent, GamePhase, GameState, LevelMap};
use lasers_and_bots::{InputScript, KeyValueStore, LevelManager, Runner, Settings};

/// Frames to keep simulating after the script ends (countdown plus explosion)
const IDLE_FRAMES: u32 = 720;

#[derive(Parser, Debug)]
#[command(name = "lasers-and-bots")]
#[command(about = "Headless runner for Lasers and Bots levels")]
struct Cli {
    /// Level catalogue (maps are resolved relative to it)
    #[arg(long, default_value = "data/levels.json")]
    catalogue: PathBuf,
    /// Save store holding records and settings
    #[arg(long, default_value = "save.json")]
    save: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a level with a scripted input sequence
    Play {
        #[arg(long)]
        level: u16,
        #[arg(long)]
        script: PathBuf,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Rendered frame length in milliseconds
        #[arg(long, default_value_t = 1000.0 / 60.0)]
        frame_ms: f32,
        /// Start playing immediately instead of counting down
        #[arg(long)]
        skip_countdown: bool,
        /// Play even if the previous level has no stars yet
        #[arg(long)]
        unlocked: bool,
    },
    /// List levels with their stars and records
    Levels,
    /// Show or change settings
    Settings {
        #[arg(long)]
        music_volume: Option<f32>,
        #[arg(long)]
        effects_volume: Option<f32>,
        #[arg(long)]
        toggle_music: bool,
        #[arg(long)]
        toggle_effects: bool,
    },
}

fn load_levels(cli: &Cli) -> Result<LevelManager> {
    let store = KeyValueStore::load(&cli.save)
        .with_context(|| format!("failed to open save store: {}", cli.save.display()))?;
    LevelManager::load(&cli.catalogue, store)
        .with_context(|| format!("failed to load catalogue: {}", cli.catalogue.display()))
}

fn map_path(catalogue: &Path, map: &str) -> PathBuf {
    catalogue
        .parent()
        .map_or_else(|| PathBuf::from(map), |dir| dir.join(map))
}

fn format_record(time: f32) -> String {
    if time >= NO_TIME_RECORD {
        "-".to_string()
    } else {
        format!("{time:.2}s")
    }
}

fn play(
    cli: &Cli,
    level: u16,
    script: &Path,
    seed: u64,
    frame_ms: f32,
    skip_countdown: bool,
    unlocked: bool,
) -> Result<()> {
    let mut levels = load_levels(cli)?;
    if !unlocked && !levels.is_level_enabled(level) {
        bail!("level {level} is locked; finish level {} first", level - 1);
    }

    let info = levels.level(level)?.clone();
    let map_file = map_path(&cli.catalogue, &info.map);
    let map = LevelMap::load(&map_file)
        .with_context(|| format!("failed to load map: {}", map_file.display()))?;
    let script = InputScript::load(script)
        .with_context(|| format!("failed to load script: {}", script.display()))?;

    let settings = Settings::load(levels.store());
    log::info!(
        "Level {} \"{}\": music {} at volume {:.2}",
        level,
        info.name,
        info.music,
        settings.effective_music_volume()
    );

    let mut state = GameState::from_level(&map, info.time_limit, seed)?;
    if skip_countdown {
        state.start_now();
    }

    let mut runner = Runner::new(state);
    runner.play(&script, frame_ms / 1000.0, IDLE_FRAMES);

    for event in &runner.events {
        log::debug!("{event:?}");
    }

    match runner.state.phase {
        GamePhase::Completed { stars } => {
            let time = runner.state.total_time;
            let result = levels.set_level_completed(level, stars, time);
            levels.store().save().context("failed to write save store")?;
            println!("Level {level} completed");
            println!("  Time:    {time:.2}s (limit {}s)", info.time_limit);
            println!("  Stars:   {stars}");
            println!("  Shield:  {:.0}%", runner.state.robot.shield_percentage());
            println!("  Records: {result:?}");
            if level < levels.num_levels() {
                println!("  Next:    level {}", levels.next_level(level));
            }
        }
        GamePhase::GameOver => {
            println!("Game over: the robot was destroyed after {:.2}s", runner.state.total_time);
        }
        phase => {
            let lasers_hit = runner
                .events
                .iter()
                .filter(|e| matches!(e, GameEvent::LaserHit { .. }))
                .count();
            println!(
                "Script ended in {phase:?} after {:.2}s (shield {:.0}%, {lasers_hit} laser hits)",
                runner.state.total_time,
                runner.state.robot.shield_percentage()
            );
        }
    }
    Ok(())
}

fn list_levels(cli: &Cli) -> Result<()> {
    let levels = load_levels(cli)?;
    for level in 1..=levels.num_levels() {
        let info = levels.level(level)?;
        let lock = if levels.is_level_enabled(level) { " " } else { "L" };
        println!(
            "{lock} {level:>3}  {:<24} stars {}  best {:>9}  3-star best {:>9}",
            info.name,
            levels.level_stars(level),
            format_record(levels.level_time_record(level)),
            format_record(levels.level_3_stars_record(level)),
        );
    }
    Ok(())
}

fn update_settings(
    cli: &Cli,
    music_volume: Option<f32>,
    effects_volume: Option<f32>,
    toggle_music: bool,
    toggle_effects: bool,
) -> Result<()> {
    let mut store = KeyValueStore::load(&cli.save)
        .with_context(|| format!("failed to open save store: {}", cli.save.display()))?;
    let mut settings = Settings::load(&store);

    let changed = music_volume.is_some() || effects_volume.is_some() || toggle_music || toggle_effects;
    if let Some(volume) = music_volume {
        settings.set_music_volume(volume);
    }
    if let Some(volume) = effects_volume {
        settings.set_effects_volume(volume);
    }
    if toggle_music {
        settings.toggle_music();
    }
    if toggle_effects {
        settings.toggle_effects();
    }

    if changed {
        settings.save(&mut store);
        store.save().context("failed to write save store")?;
    }
    println!("{settings:#?}");
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Play {
            level,
            script,
            seed,
            frame_ms,
            skip_countdown,
            unlocked,
        } => play(
            &cli,
            *level,
            script,
            *seed,
            *frame_ms,
            *skip_countdown,
            *unlocked,
        ),
        Commands::Levels => list_levels(&cli),
        Commands::Settings {
            music_volume,
            effects_volume,
            toggle_music,
            toggle_effects,
        } => update_settings(&cli, *music_volume, *effects_volume, *toggle_music, *toggle_effects),
    }
}
