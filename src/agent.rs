//! The embodied loop: world sensors -> counting network, radar -> wall-avoidance
//! reflex -> motors.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use critter_world::{MotorCommand, Senses, World, WorldConfig};

use crate::config::CritterConfig;
use crate::error::{CritterError, Result};
use crate::network::{Critter, SensoryInput};
use crate::probe::ProbeConfig;
use crate::symbols::Colour;

/// Turn away from side walls; slow down, and reverse when close, for the wall
/// straight ahead.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WallAvoidance {
    /// Forward distance at which speed crosses zero.
    pub stop_distance: f32,
}

impl Default for WallAvoidance {
    fn default() -> Self {
        Self { stop_distance: 0.5 }
    }
}

impl WallAvoidance {
    /// `proximity` is (left, ahead, right).
    pub fn command(&self, proximity: [f32; 3]) -> MotorCommand {
        let [left, ahead, right] = proximity;
        MotorCommand {
            speed: ahead - self.stop_distance,
            turn: right - left,
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimulationConfig {
    pub critter: CritterConfig,
    pub world: WorldConfig,
    pub controller: WallAvoidance,
    pub probe: ProbeConfig,
    pub duration_s: f32,
    /// Time the agent holds still after entering a cell of a new colour. The
    /// flags need about this long to switch; shorter visits are not counted.
    pub settle_s: f32,
    /// Print a status line every this many steps; 0 disables it.
    pub report_every: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            critter: CritterConfig::default(),
            world: WorldConfig::default(),
            controller: WallAvoidance::default(),
            probe: ProbeConfig::default(),
            duration_s: 10.0,
            settle_s: 0.3,
            report_every: 1000,
        }
    }
}

impl SimulationConfig {
    #[cfg(feature = "serde")]
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    #[cfg(feature = "serde")]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn total_steps(&self) -> u64 {
        (self.duration_s / self.critter.dt).round().max(0.0) as u64
    }
}

pub struct Agent {
    pub world: World,
    pub critter: Critter,
    controller: WallAvoidance,
    last_senses: Option<Senses>,
    last_command: MotorCommand,
    visits: Vec<Colour>,
    settle_steps: u64,
    settle_left: u64,
}

impl Agent {
    pub fn new(cfg: &SimulationConfig) -> Result<Self> {
        if !(cfg.settle_s.is_finite() && cfg.settle_s >= 0.0) {
            return Err(CritterError::config(format!(
                "settle_s must be finite and >= 0, got {}",
                cfg.settle_s
            )));
        }
        let world = World::new(&cfg.world)?;
        let critter = Critter::new(cfg.critter.clone())?;
        let first = Colour::from_index(world.current_cell_colour()).unwrap_or(Colour::Background);
        debug!(
            width = world.map.width(),
            height = world.map.height(),
            start = first.name(),
            "agent placed"
        );
        let settle_steps = (cfg.settle_s / critter.dt()).round() as u64;
        Ok(Self {
            world,
            critter,
            controller: cfg.controller,
            last_senses: None,
            last_command: MotorCommand::default(),
            visits: vec![first],
            settle_steps,
            settle_left: settle_steps,
        })
    }

    pub fn step(&mut self) {
        let senses = self.world.sense();
        self.critter.step(&SensoryInput {
            current: senses.current_colour,
            look_ahead: Some(senses.look_ahead),
        });

        let mut cmd = self.controller.command(senses.proximity);
        if self.settle_left > 0 {
            self.settle_left -= 1;
            cmd.speed = 0.0;
        }
        self.world.apply_motor(cmd, self.critter.dt());

        let here = Colour::from_index(self.world.current_cell_colour()).unwrap_or(Colour::Background);
        if self.visits.last() != Some(&here) {
            trace!(colour = here.name(), time = self.critter.time(), "entered cell");
            self.visits.push(here);
            self.settle_left = self.settle_steps;
        }
        self.last_senses = Some(senses);
        self.last_command = cmd;
    }

    pub fn last_senses(&self) -> Option<&Senses> {
        self.last_senses.as_ref()
    }

    pub fn last_command(&self) -> MotorCommand {
        self.last_command
    }

    /// Still holding position on a freshly entered colour.
    pub fn is_settling(&self) -> bool {
        self.settle_left > 0
    }

    /// Ground-truth cell colours in the order entered, consecutive repeats merged.
    pub fn visits(&self) -> &[Colour] {
        &self.visits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashMap;

    /// Pulses a perfect observer of `visits` would count: colour `c` after red
    /// then white, with any other colour in between resetting the sequence.
    fn red_white_tally(visits: &[Colour]) -> HashMap<Colour, u32> {
        let mut tally: HashMap<Colour, u32> = Colour::COUNTED.iter().map(|&c| (c, 0)).collect();
        let (mut seen_red, mut seen_white) = (false, false);
        for &c in visits {
            if c != Colour::Background && seen_red && seen_white {
                *tally.entry(c).or_default() += 1;
            }
            match c {
                Colour::Red => (seen_red, seen_white) = (true, false),
                Colour::Background => seen_white = true,
                _ => (seen_red, seen_white) = (false, false),
            }
        }
        tally
    }

    fn noiseless() -> SimulationConfig {
        let mut cfg = SimulationConfig::default();
        cfg.world.sensors.noise_val = 0.0;
        cfg
    }

    #[test]
    fn reflex_matches_radar() {
        let c = WallAvoidance::default();
        let cmd = c.command([1.0, 4.0, 2.5]);
        assert_eq!(cmd.speed, 3.5);
        assert_eq!(cmd.turn, 1.5);
        // Wall right in front: back off.
        assert!(c.command([1.0, 0.2, 1.0]).speed < 0.0);
    }

    #[test]
    fn agent_wanders_without_entering_walls() {
        let cfg = SimulationConfig::default();
        let mut agent = Agent::new(&cfg).unwrap();
        let start = (agent.world.body.x, agent.world.body.y);
        for _ in 0..2000 {
            agent.step();
            let (x, y) = agent.world.body.cell();
            assert!(!agent.world.map.is_wall(x, y), "entered wall at ({x}, {y})");
        }
        let end = (agent.world.body.x, agent.world.body.y);
        assert_ne!(start, end);
        assert_eq!(agent.critter.age_steps(), 2000);
        assert!(agent.last_senses().is_some());
        assert_eq!(agent.visits()[0], Colour::Red);
    }

    #[test]
    fn tally_follows_red_then_white() {
        use Colour::*;
        let t = red_white_tally(&[Red, Background, Green, Background, Red, Red, Background, Red]);
        assert_eq!(t[&Green], 1);
        assert_eq!(t[&Red], 1);
        let t = red_white_tally(&[Red, Blue, Background, Yellow]);
        assert!(t.values().all(|&n| n == 0));
    }

    #[test]
    fn pulses_match_the_visited_sequence() {
        let mut agent = Agent::new(&noiseless()).unwrap();
        for _ in 0..15_000 {
            agent.step();
        }
        // Let the last visit finish registering.
        while agent.is_settling() {
            agent.step();
        }
        let truth = red_white_tally(agent.visits());
        assert!(agent.visits().len() > 10, "{:?}", agent.visits());
        assert!(truth.values().sum::<u32>() >= 1, "{:?}", agent.visits());
        assert_eq!(agent.critter.pulse_counts(), truth, "{:?}", agent.visits());
    }

    #[test]
    fn agent_holds_still_on_a_new_colour() {
        let cfg = noiseless();
        let mut agent = Agent::new(&cfg).unwrap();
        let start = (agent.world.body.x, agent.world.body.y);
        for _ in 0..300 {
            agent.step();
        }
        assert_eq!((agent.world.body.x, agent.world.body.y), start);
        assert_eq!(agent.last_command().speed, 0.0);
        assert!(!agent.is_settling());

        let bad = SimulationConfig {
            settle_s: -1.0,
            ..noiseless()
        };
        assert!(matches!(
            Agent::new(&bad),
            Err(CritterError::Configuration { .. })
        ));
    }

    #[test]
    fn bad_map_is_an_error() {
        let cfg = SimulationConfig {
            world: WorldConfig {
                map: String::new(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(Agent::new(&cfg), Err(CritterError::World(_))));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_simulation_json_uses_defaults() {
        let cfg = SimulationConfig::from_json(
            r#"{ "duration_s": 2.5, "world": { "sensors": { "noise_val": 0.0 } } }"#,
        )
        .unwrap();
        assert_eq!(cfg.duration_s, 2.5);
        assert_eq!(cfg.world.sensors.noise_val, 0.0);
        assert_eq!(cfg.world.motor.max_speed, 20.0);
        assert_eq!(cfg.total_steps(), 2500);
        assert!(SimulationConfig::from_json("{ not json").is_err());
    }
}
