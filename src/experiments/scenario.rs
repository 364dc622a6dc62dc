//! Scripted colour sequences fed straight into a [`Critter`], bypassing the
//! world. Each segment holds one reference colour (plus optional per-channel
//! Gaussian noise) for a fixed time.

use hashbrown::HashMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::network::{Critter, Diagnostics, SensoryInput};
use crate::perception::{Rgb, REFERENCE_RGB};
use crate::prng::Prng;
use crate::symbols::Colour;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Segment {
    pub colour: Colour,
    pub seconds: f32,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColourScenario {
    pub segments: Vec<Segment>,
    pub noise_val: f32,
    pub seed: u64,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ScenarioReport {
    pub steps: u64,
    pub counts: HashMap<Colour, f32>,
    pub pulses: HashMap<Colour, u32>,
    pub diagnostics: Diagnostics,
}

impl ScenarioReport {
    pub fn count(&self, colour: Colour) -> f32 {
        self.counts.get(&colour).copied().unwrap_or(0.0)
    }

    pub fn pulses(&self, colour: Colour) -> u32 {
        self.pulses.get(&colour).copied().unwrap_or(0)
    }

    pub fn total_pulses(&self) -> u32 {
        self.pulses.values().sum()
    }
}

impl ColourScenario {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            noise_val: 0.0,
            seed: 1,
        }
    }

    /// Every colour held for the same time.
    pub fn from_colours(colours: &[Colour], seconds: f32) -> Self {
        Self::new(
            colours
                .iter()
                .map(|&colour| Segment { colour, seconds })
                .collect(),
        )
    }

    /// White, red, white, green, white, red, red; half a second each.
    pub fn red_white_green() -> Self {
        use Colour::*;
        Self::from_colours(&[Background, Red, Background, Green, Background, Red, Red], 0.5)
    }

    pub fn with_noise(mut self, noise_val: f32, seed: u64) -> Self {
        self.noise_val = noise_val;
        self.seed = seed;
        self
    }

    pub fn duration_s(&self) -> f32 {
        self.segments.iter().map(|s| s.seconds).sum()
    }

    pub fn run(&self, critter: &mut Critter) -> ScenarioReport {
        let mut rng = Prng::new(self.seed);
        let dt = critter.dt();
        for seg in &self.segments {
            let steps = (seg.seconds / dt).round() as usize;
            let reference = REFERENCE_RGB[seg.colour.index()];
            for _ in 0..steps {
                let sample = perturb(reference, self.noise_val, &mut rng);
                critter.step(&SensoryInput::current(sample));
            }
            debug!(colour = seg.colour.name(), time = critter.time(), "segment done");
        }
        ScenarioReport {
            steps: critter.age_steps(),
            counts: critter.counts(),
            pulses: critter.pulse_counts(),
            diagnostics: critter.diagnostics(),
        }
    }
}

fn perturb(rgb: Rgb, std: f32, rng: &mut Prng) -> Rgb {
    if std <= 0.0 {
        return rgb;
    }
    rgb.map(|v| (v + std * rng.next_gaussian()).clamp(0.0, 1.0))
}
