//! Headless session driver
//!
//! Feeds a scripted input sequence into a level session through a
//! fixed-timestep accumulator, the way a real frame loop would.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Error, Result};
use crate::sim::{GameEvent, GamePhase, GameState, TickInput, tick};

/// Inputs held for a number of frames
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSegment {
    pub frames: u32,
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
    #[serde(default)]
    pub jump: bool,
    /// Toggle pause on the first frame of the segment
    #[serde(default)]
    pub pause: bool,
}

impl InputSegment {
    fn input(&self) -> TickInput {
        TickInput {
            left: self.left,
            right: self.right,
            jump: self.jump,
            pause: self.pause,
        }
    }
}

/// A recorded or hand-written input sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputScript {
    pub segments: Vec<InputSegment>,
}

impl InputScript {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::json("input script", e))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&json)
    }

    pub fn total_frames(&self) -> u64 {
        self.segments.iter().map(|s| u64::from(s.frames)).sum()
    }
}

/// Level session plus frame-loop bookkeeping
#[derive(Debug)]
pub struct Runner {
    pub state: GameState,
    accumulator: f32,
    input: TickInput,
    /// Every event raised so far
    pub events: Vec<GameEvent>,
}

impl Runner {
    pub fn new(state: GameState) -> Self {
        Self {
            state,
            accumulator: 0.0,
            input: TickInput::default(),
            events: Vec::new(),
        }
    }

    /// Replace the held inputs. A pause toggle stays pending until a tick consumes it.
    pub fn set_input(&mut self, input: TickInput) {
        let pause = self.input.pause || input.pause;
        self.input = TickInput { pause, ..input };
    }

    /// Advance by one rendered frame of length `dt`
    pub fn update(&mut self, dt: f32) {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.state, &self.input, SIM_DT);
            self.events.append(&mut self.state.events);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.input.pause = false;
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.state.phase,
            GamePhase::Completed { .. } | GamePhase::GameOver
        )
    }

    /// Play a whole script at `frame_dt` per frame, then keep idling up to
    /// `idle_frames` more frames until the session ends
    pub fn play(&mut self, script: &InputScript, frame_dt: f32, idle_frames: u32) {
        for segment in &script.segments {
            for frame in 0..segment.frames {
                if self.is_finished() {
                    return;
                }
                let mut input = segment.input();
                input.pause = segment.pause && frame == 0;
                self.set_input(input);
                self.update(frame_dt);
            }
        }

        self.set_input(TickInput::default());
        for _ in 0..idle_frames {
            if self.is_finished() {
                return;
            }
            self.update(frame_dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::LevelMap;

    const FLAT: &str = r#"{
        "width": 3000, "height": 1500,
        "solids": [ { "x": 0, "y": 0, "width": 3000, "height": 64 } ],
        "objects": [ { "type": "robot", "x": 200, "y": 64, "shield": 100 } ]
    }"#;

    fn runner() -> Runner {
        let map = LevelMap::from_json(FLAT).unwrap();
        let mut state = GameState::from_level(&map, 60, 3).unwrap();
        state.start_now();
        Runner::new(state)
    }

    #[test]
    fn test_script_parsing() {
        let script = InputScript::from_json(
            r#"{ "segments": [ { "frames": 30, "right": true }, { "frames": 5, "jump": true } ] }"#,
        )
        .unwrap();
        assert_eq!(script.total_frames(), 35);
        assert!(script.segments[0].right);
        assert!(!script.segments[0].jump);
    }

    #[test]
    fn test_accumulator_substeps() {
        let mut runner = runner();
        // two sim steps per 30 Hz frame
        runner.update(1.0 / 30.0 + 1e-4);
        assert_eq!(runner.state.time_ticks, 2);

        // long stalls are capped
        runner.update(10.0);
        assert!(runner.state.time_ticks <= 2 + u64::from(MAX_SUBSTEPS));
    }

    #[test]
    fn test_pause_survives_frames_without_a_tick() {
        let mut runner = runner();
        let script = InputScript {
            segments: vec![InputSegment {
                frames: 10,
                pause: true,
                ..Default::default()
            }],
        };
        // 120 Hz frames: only every other frame runs a tick
        runner.play(&script, 1.0 / 120.0, 0);
        assert_eq!(runner.state.phase, GamePhase::Paused);
        assert_eq!(
            runner
                .events
                .iter()
                .filter(|e| **e == GameEvent::Paused)
                .count(),
            1
        );
    }

    #[test]
    fn test_pause_is_one_shot() {
        let mut runner = runner();
        let script = InputScript {
            segments: vec![InputSegment {
                frames: 10,
                pause: true,
                ..Default::default()
            }],
        };
        runner.play(&script, SIM_DT, 0);
        assert_eq!(runner.state.phase, GamePhase::Paused);
        assert_eq!(
            runner
                .events
                .iter()
                .filter(|e| **e == GameEvent::Paused)
                .count(),
            1
        );
    }
}
