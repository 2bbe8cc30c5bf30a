use std::path::PathBuf;

use anyhow::{Result, anyhow};
use lasers_and_bots::consts::*;
use lasers_and_bots::sim::{GameEvent, GamePhase, GameState, LevelMap};
use lasers_and_bots::{CompletedResult, InputScript, KeyValueStore, LevelManager, Runner};

fn repo_path(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(path)
}

fn load_session(levels: &LevelManager, level: u16, seed: u64) -> Result<GameState> {
    let info = levels.level(level)?;
    let map = LevelMap::load(repo_path("data").join(&info.map))?;
    Ok(GameState::from_level(&map, info.time_limit, seed)?)
}

fn position(events: &[GameEvent], wanted: &GameEvent) -> Result<usize> {
    events
        .iter()
        .position(|e| e == wanted)
        .ok_or_else(|| anyhow!("missing event {wanted:?}"))
}

#[test]
fn switch_unlocks_door_and_level_completes() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let save = dir.path().join("save.json");
    let mut levels = LevelManager::load(
        repo_path("data/levels.json"),
        KeyValueStore::load(&save)?,
    )?;
    assert!(!levels.is_level_enabled(2));

    let state = load_session(&levels, 1, 42)?;
    let script = InputScript::load(repo_path("data/scripts/level_01.json"))?;
    let mut runner = Runner::new(state);
    runner.play(&script, SIM_DT, 0);

    let GamePhase::Completed { stars } = runner.state.phase else {
        return Err(anyhow!("level not completed: {:?}", runner.state.phase));
    };
    assert_eq!(stars, 3);

    let events = &runner.events;
    let switch_on = position(events, &GameEvent::SwitchOn { name: "lever".into() })?;
    let unlocked = position(events, &GameEvent::DoorUnlocked { name: "exit".into() })?;
    let opened = position(events, &GameEvent::DoorOpened { name: "exit".into() })?;
    let music = position(events, &GameEvent::MusicStart)?;
    assert!(music < switch_on);
    assert!(switch_on < unlocked && unlocked < opened);
    assert!(matches!(
        events.last(),
        Some(GameEvent::LevelCompleted { stars: 3, .. })
    ));

    // the laser sweeps the far end of the level and never reaches the robot
    assert!(!events.iter().any(|e| matches!(e, GameEvent::LaserHit { .. })));
    assert_eq!(runner.state.robot.shield_percentage(), 100.0);

    let time = runner.state.total_time;
    assert!(time > 2.0 && time < 3.0);
    assert_eq!(
        levels.set_level_completed(1, stars, time),
        CompletedResult::NewLevelRecordAnd3StarsRecord
    );
    levels.store().save()?;

    let reloaded = LevelManager::load(repo_path("data/levels.json"), KeyValueStore::load(&save)?)?;
    assert_eq!(reloaded.level_stars(1), 3);
    assert_eq!(reloaded.level_time_record(1), time);
    assert!(reloaded.is_level_enabled(2));
    Ok(())
}

#[test]
fn door_needs_the_switch_first() -> Result<()> {
    let levels = LevelManager::load(repo_path("data/levels.json"), KeyValueStore::in_memory())?;
    let mut state = load_session(&levels, 1, 1)?;
    state.start_now();

    // jump over the lever, then walk into the locked door
    let script = InputScript::from_json(
        r#"{ "segments": [
            { "frames": 2 },
            { "frames": 10, "right": true },
            { "frames": 1, "right": true, "jump": true },
            { "frames": 120, "right": true }
        ] }"#,
    )?;
    let mut runner = Runner::new(state);
    runner.play(&script, SIM_DT, 0);

    assert_eq!(runner.state.phase, GamePhase::Playing);
    assert!(!runner.events.iter().any(|e| matches!(e, GameEvent::SwitchOn { .. })));
    assert!(!runner.events.iter().any(|e| matches!(e, GameEvent::DoorOpened { .. })));
    Ok(())
}

#[test]
fn laser_destroys_idle_robot() -> Result<()> {
    let levels = LevelManager::load(repo_path("data/levels.json"), KeyValueStore::in_memory())?;
    let state = load_session(&levels, 2, 9)?;
    let script = InputScript::load(repo_path("data/scripts/idle.json"))?;

    let mut runner = Runner::new(state);
    runner.play(&script, SIM_DT, 600);

    assert_eq!(runner.state.phase, GamePhase::GameOver);
    let hits = runner
        .events
        .iter()
        .filter(|e| matches!(e, GameEvent::LaserHit { laser } if laser == "sentry"))
        .count();
    assert_eq!(hits, 20);

    let destroyed = position(&runner.events, &GameEvent::RobotDestroyed)?;
    let game_over = position(&runner.events, &GameEvent::GameOver)?;
    assert!(destroyed < game_over);
    assert_eq!(runner.state.fragments.len(), ROBOT_FRAGMENTS);
    assert!(runner.state.robot_body.is_none());
    Ok(())
}

#[test]
fn replay_is_deterministic() -> Result<()> {
    let levels = LevelManager::load(repo_path("data/levels.json"), KeyValueStore::in_memory())?;
    let script = InputScript::load(repo_path("data/scripts/level_01.json"))?;

    let mut a = Runner::new(load_session(&levels, 1, 5)?);
    let mut b = Runner::new(load_session(&levels, 1, 5)?);
    a.play(&script, 1.0 / 30.0, 0);
    b.play(&script, 1.0 / 30.0, 0);

    assert_eq!(a.events, b.events);
    assert_eq!(a.state.total_time, b.state.total_time);
    assert_eq!(a.state.robot.pos, b.state.robot.pos);
    Ok(())
}
