#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::body::{Body, DIRECTIONS};
use crate::map::{neighbour_offset, GridMap, BACKGROUND};

pub type Rgb = [f32; 3];

/// RGB shown for each cell colour index.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Palette {
    pub colours: [Rgb; 6],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colours: [
                [0.9, 0.9, 0.9], // background
                [0.2, 0.8, 0.2], // green
                [0.8, 0.2, 0.2], // red
                [0.2, 0.2, 0.8], // blue
                [0.8, 0.2, 0.8], // magenta
                [0.8, 0.8, 0.2], // yellow
            ],
        }
    }
}

impl Palette {
    pub fn rgb(&self, colour: u8) -> Rgb {
        self.colours
            .get(colour as usize)
            .copied()
            .unwrap_or(self.colours[BACKGROUND as usize])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SensorConfig {
    /// Standard deviation of the per-channel colour noise.
    pub noise_val: f32,
    /// Proximity sensors report at most this distance (cells).
    pub max_distance: f32,
    pub seed: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            noise_val: 0.1,
            max_distance: 4.0,
            seed: 0x5EED,
        }
    }
}

/// Colour and proximity sensing with independent Gaussian colour noise.
#[derive(Debug, Clone)]
pub struct Sensors {
    cfg: SensorConfig,
    palette: Palette,
    rng_seed: u64,
}

impl Sensors {
    pub fn new(cfg: SensorConfig, palette: Palette) -> Self {
        Self {
            cfg,
            palette,
            rng_seed: cfg.seed,
        }
    }

    pub fn config(&self) -> &SensorConfig {
        &self.cfg
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Noisy RGB of the cell under the body.
    pub fn current_colour(&mut self, map: &GridMap, body: &Body) -> Rgb {
        let (x, y) = body.cell();
        let rgb = self.palette.rgb(map.colour_at(x, y));
        self.perturb(rgb)
    }

    /// Noisy RGB of the next coloured cell straight ahead (see [`look_ahead_colour`]).
    pub fn look_ahead(&mut self, map: &GridMap, body: &Body) -> Rgb {
        let rgb = self.palette.rgb(look_ahead_colour(map, body));
        self.perturb(rgb)
    }

    /// Wall distances to the front-left, front and front-right.
    pub fn proximity(&self, map: &GridMap, body: &Body) -> [f32; 3] {
        let mut out = [0.0; 3];
        for (i, offset) in [-0.5f32, 0.0, 0.5].iter().enumerate() {
            let dir = (offset + body.dir).rem_euclid(DIRECTIONS);
            out[i] = body.detect(dir, self.cfg.max_distance, map);
        }
        out
    }

    /// Add clipped per-channel noise to a colour.
    pub fn perturb(&mut self, rgb: Rgb) -> Rgb {
        if self.cfg.noise_val <= 0.0 {
            return rgb;
        }
        let mut out = rgb;
        for c in &mut out {
            *c = (*c + self.cfg.noise_val * self.sample_gaussian()).clamp(0.0, 1.0);
        }
        out
    }

    fn sample_gaussian(&mut self) -> f32 {
        // Box-Muller; u1 is kept away from zero so ln() stays finite.
        let u1 = self.rng_next_f32().max(1e-7);
        let u2 = self.rng_next_f32();
        (-2.0 * u1.ln()).sqrt() * (2.0 * core::f32::consts::PI * u2).cos()
    }

    fn rng_next_u32(&mut self) -> u32 {
        self.rng_seed = self
            .rng_seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1);
        (self.rng_seed >> 11) as u32
    }

    fn rng_next_f32(&mut self) -> f32 {
        let u = self.rng_next_u32();
        let mantissa = u >> 8; // 24 bits
        (mantissa as f32) / ((1u32 << 24) as f32)
    }
}

/// Colour index of the next non-background cell ahead of the body.
///
/// Walks cell by cell along the body's grid direction and never looks through
/// walls. If the first neighbour is already coloured it is returned; if no
/// coloured cell is found the last visited cell's colour is returned.
pub fn look_ahead_colour(map: &GridMap, body: &Body) -> u8 {
    let (dx, dy) = neighbour_offset(body.grid_dir());
    let (mut x, mut y) = body.cell();
    x += dx;
    y += dy;

    let mut colour = map.colour_at(x, y);
    while colour == BACKGROUND && !map.is_wall(x + dx, y + dy) {
        x += dx;
        y += dy;
        colour = map.colour_at(x, y);
    }
    colour
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noiseless_sample_is_reference_rgb() {
        let map = GridMap::parse("#####\n# R #\n#####").unwrap();
        let mut sensors = Sensors::new(
            SensorConfig {
                noise_val: 0.0,
                ..Default::default()
            },
            Palette::default(),
        );
        let body = Body::at_cell(2, 1, 0.0);
        assert_eq!(sensors.current_colour(&map, &body), [0.8, 0.2, 0.2]);
        let body = Body::at_cell(1, 1, 0.0);
        assert_eq!(sensors.current_colour(&map, &body), [0.9, 0.9, 0.9]);
    }

    #[test]
    fn noisy_samples_stay_in_unit_cube() {
        let map = GridMap::parse("###\n#Y#\n###").unwrap();
        let mut sensors = Sensors::new(
            SensorConfig {
                noise_val: 0.5,
                ..Default::default()
            },
            Palette::default(),
        );
        let body = Body::at_cell(1, 1, 0.0);
        let mut moved = false;
        for _ in 0..200 {
            let rgb = sensors.current_colour(&map, &body);
            assert!(rgb.iter().all(|c| (0.0..=1.0).contains(c)));
            moved |= rgb != [0.8, 0.8, 0.2];
        }
        assert!(moved);
    }

    #[test]
    fn look_ahead_skips_background_and_stops_at_walls() {
        let map = GridMap::parse("#######\n#   B #\n#######").unwrap();
        let east = Body::at_cell(1, 1, 1.0);
        assert_eq!(look_ahead_colour(&map, &east), 3);

        // Facing west from x=1 the neighbour is a wall.
        let west = Body::at_cell(1, 1, 3.0);
        assert_eq!(look_ahead_colour(&map, &west), BACKGROUND);

        // Past the blue cell there is only background before the wall.
        let beyond = Body::at_cell(4, 1, 1.0);
        assert_eq!(look_ahead_colour(&map, &beyond), BACKGROUND);
    }

    #[test]
    fn proximity_reports_three_headings() {
        let map = GridMap::parse("#######\n#     #\n#######").unwrap();
        let sensors = Sensors::new(SensorConfig::default(), Palette::default());
        let body = Body::at_cell(1, 1, 1.0);
        let [left, mid, right] = sensors.proximity(&map, &body);
        assert!(mid > left && mid > right, "{left} {mid} {right}");
        assert!(mid <= 4.0);
    }
}
