//! # critter_world
//!
//! The grid world the colour-counting critter lives in: an ASCII map of walls
//! and coloured cells, a continuously moving body, and the sensors that feed
//! the critter (cell colour, look-ahead colour, wall proximity).
//!
//! Nothing here knows about the counting network; the world only produces
//! noisy RGB samples and distances, and consumes a motor command.

pub mod body;
pub mod map;
pub mod sensors;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use body::{Body, DIRECTIONS};
pub use map::{Cell, GridMap, MapError, DEFAULT_MAP};
pub use sensors::{look_ahead_colour, Palette, Rgb, SensorConfig, Sensors};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MotorConfig {
    /// Cells per second at speed command 1.0.
    pub max_speed: f32,
    /// Heading units per second at turn command 1.0.
    pub max_rotate: f32,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            max_speed: 20.0,
            max_rotate: 10.0,
        }
    }
}

/// Forward speed and turn rate, both nominally in [-1, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotorCommand {
    pub speed: f32,
    pub turn: f32,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WorldConfig {
    pub map: String,
    pub start_x: i32,
    pub start_y: i32,
    pub start_dir: f32,
    pub sensors: SensorConfig,
    pub motor: MotorConfig,
    pub palette: Palette,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            map: DEFAULT_MAP.to_string(),
            start_x: 1,
            start_y: 2,
            start_dir: 2.0,
            sensors: SensorConfig::default(),
            motor: MotorConfig::default(),
            palette: Palette::default(),
        }
    }
}

/// Everything the world reports for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Senses {
    pub current_colour: Rgb,
    pub look_ahead: Rgb,
    pub proximity: [f32; 3],
}

#[derive(Debug, Clone)]
pub struct World {
    pub map: GridMap,
    pub body: Body,
    sensors: Sensors,
    motor: MotorConfig,
}

impl World {
    pub fn new(cfg: &WorldConfig) -> Result<Self, MapError> {
        let map = GridMap::parse(&cfg.map)?;
        if map.is_wall(cfg.start_x, cfg.start_y) {
            return Err(MapError::BlockedStart {
                x: cfg.start_x,
                y: cfg.start_y,
            });
        }
        Ok(Self {
            map,
            body: Body::at_cell(cfg.start_x, cfg.start_y, cfg.start_dir),
            sensors: Sensors::new(cfg.sensors, cfg.palette),
            motor: cfg.motor,
        })
    }

    pub fn sense(&mut self) -> Senses {
        Senses {
            current_colour: self.sensors.current_colour(&self.map, &self.body),
            look_ahead: self.sensors.look_ahead(&self.map, &self.body),
            proximity: self.sensors.proximity(&self.map, &self.body),
        }
    }

    /// Colour index of the cell under the body (ground truth, no noise).
    pub fn current_cell_colour(&self) -> u8 {
        let (x, y) = self.body.cell();
        self.map.colour_at(x, y)
    }

    pub fn apply_motor(&mut self, cmd: MotorCommand, dt: f32) {
        self.body.turn(cmd.turn * dt * self.motor.max_rotate);
        self.body
            .go_forward(cmd.speed * dt * self.motor.max_speed, &self.map);
    }
}
