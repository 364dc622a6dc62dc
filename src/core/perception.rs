//! Perceptual encoder: noisy RGB sample -> nearest colour symbol.

use crate::symbols::Colour;

pub type Rgb = [f32; 3];

/// Reference RGB the critter knows for each colour, in [`Colour::ALL`] order.
pub const REFERENCE_RGB: [Rgb; 6] = [
    [0.9, 0.9, 0.9],
    [0.2, 0.8, 0.2],
    [0.8, 0.2, 0.2],
    [0.2, 0.2, 0.8],
    [0.8, 0.2, 0.8],
    [0.8, 0.8, 0.2],
];

/// Result of classifying one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Percept {
    pub colour: Colour,
    /// Euclidean distance to the winning reference.
    pub distance: f32,
    /// Distance gap to the runner-up; 0.0 on an exact tie.
    pub margin: f32,
}

impl Percept {
    /// 0.0 on a tie, rising linearly to 1.0 once the runner-up is at least
    /// `margin_floor` further away than the winner.
    pub fn confidence(&self, margin_floor: f32) -> f32 {
        if margin_floor <= 0.0 {
            return 1.0;
        }
        (self.margin / margin_floor).clamp(0.0, 1.0)
    }
}

/// Nearest-neighbour classifier over a fixed reference table.
///
/// Deterministic: the same sample always yields the same colour. Equidistant
/// references resolve to the one listed first in [`Colour::ALL`].
#[derive(Debug, Clone)]
pub struct PerceptualEncoder {
    references: [Rgb; 6],
}

impl Default for PerceptualEncoder {
    fn default() -> Self {
        Self::new(REFERENCE_RGB)
    }
}

impl PerceptualEncoder {
    pub fn new(references: [Rgb; 6]) -> Self {
        Self { references }
    }

    pub fn reference_rgb(&self, colour: Colour) -> Rgb {
        self.references[colour.index()]
    }

    pub fn classify(&self, sample: Rgb) -> Percept {
        let mut best = (Colour::Background, f32::INFINITY);
        let mut second = f32::INFINITY;
        for c in Colour::ALL {
            let d = distance_sq(sample, self.references[c.index()]);
            if d < best.1 {
                second = best.1;
                best = (c, d);
            } else if d < second {
                second = d;
            }
        }
        let distance = best.1.sqrt();
        Percept {
            colour: best.0,
            distance,
            margin: second.sqrt() - distance,
        }
    }
}

fn distance_sq(a: Rgb, b: Rgb) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}
