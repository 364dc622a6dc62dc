#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::counter::CounterConfig;
use crate::error::{CritterError, Result};
use crate::memory::CellTuning;
use crate::selection::{SelectionConfig, SelectionMode};
use crate::symbols::{Colour, VocabularyConfig};

/// Everything needed to build a [`crate::network::Critter`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CritterConfig {
    pub vocabulary: VocabularyConfig,

    // Cell dynamics, per role.
    pub colour_cell: CellTuning,
    pub flag_cell: CellTuning,
    pub increment_cell: CellTuning,

    /// Gain of the perceived colour's injection into the colour cell.
    pub input_gain: f32,

    /// Samples whose runner-up colour is less than this much further away (RGB
    /// distance) drive the colour cell proportionally less, down to nothing on
    /// an exact tie.
    pub percept_margin: f32,

    pub selection: SelectionConfig,

    /// One pipeline per counted colour, in [`Colour::COUNTED`] order.
    pub counters: Vec<CounterConfig>,

    /// Simulation step in seconds.
    pub dt: f32,

    /// Std of Gaussian noise added to every cell's drive each step.
    pub cell_noise: f32,

    /// Seed for cell noise. The vocabulary has its own seed.
    pub seed: u64,
}

impl Default for CritterConfig {
    fn default() -> Self {
        let counter = CounterConfig::default();
        Self {
            vocabulary: VocabularyConfig::default(),
            colour_cell: CellTuning {
                tau: 0.05,
                ..CellTuning::default()
            },
            flag_cell: CellTuning::default(),
            increment_cell: CellTuning {
                tau: 0.02,
                ..CellTuning::default()
            },
            input_gain: 2.0,
            percept_margin: 0.1,
            selection: SelectionConfig::default(),
            // The green pipeline has always run at a lower threshold than the rest.
            counters: vec![
                counter.with_threshold(0.6),
                counter,
                counter,
                counter,
                counter,
            ],
            dt: 0.001,
            cell_noise: 0.0,
            seed: 1,
        }
    }
}

impl CritterConfig {
    pub fn validate(&self) -> Result<()> {
        fn finite_pos(name: &str, v: f32) -> Result<()> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(CritterError::config(format!(
                    "{name} must be finite and > 0, got {v}"
                )))
            }
        }
        fn finite_non_neg(name: &str, v: f32) -> Result<()> {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(CritterError::config(format!(
                    "{name} must be finite and >= 0, got {v}"
                )))
            }
        }

        finite_pos("dt", self.dt)?;
        finite_pos("input_gain", self.input_gain)?;
        finite_non_neg("cell_noise", self.cell_noise)?;
        finite_non_neg("percept_margin", self.percept_margin)?;

        for (role, t) in [
            ("colour_cell", &self.colour_cell),
            ("flag_cell", &self.flag_cell),
            ("increment_cell", &self.increment_cell),
        ] {
            finite_pos(&format!("{role}.tau"), t.tau)?;
            finite_non_neg(&format!("{role}.cleanup_gain"), t.cleanup_gain)?;
            if !(t.confidence_floor.is_finite() && t.confidence_floor <= 1.0) {
                return Err(CritterError::config(format!(
                    "{role}.confidence_floor must be <= 1, got {}",
                    t.confidence_floor
                )));
            }
        }

        let s = &self.selection;
        if let SelectionMode::Soft { sharpness } = s.mode {
            finite_pos("selection.sharpness", sharpness)?;
        }
        finite_non_neg("selection.hysteresis", s.hysteresis)?;
        finite_non_neg("selection.blend_floor", s.blend_floor)?;
        finite_non_neg("selection.win_gain", s.win_gain)?;
        finite_non_neg("selection.suppress_gain", s.suppress_gain)?;
        if !s.flag_default_utility.is_finite() || !s.count_default_utility.is_finite() {
            return Err(CritterError::config("default utilities must be finite"));
        }

        if self.counters.len() != Colour::COUNTED.len() {
            return Err(CritterError::config(format!(
                "expected {} counter pipelines, got {}",
                Colour::COUNTED.len(),
                self.counters.len()
            )));
        }
        for (c, cfg) in Colour::COUNTED.iter().zip(&self.counters) {
            let name = c.name();
            finite_pos(&format!("counters.{name}.tau"), cfg.tau)?;
            finite_non_neg(&format!("counters.{name}.gain"), cfg.gain)?;
            if !cfg.threshold.is_finite() {
                return Err(CritterError::config(format!(
                    "counters.{name}.threshold must be finite"
                )));
            }
            if let Some(max) = cfg.ceiling {
                finite_pos(&format!("counters.{name}.ceiling"), max)?;
            }
        }
        Ok(())
    }

    /// Seed both the vocabulary and the cell noise.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.vocabulary.seed = seed;
        self.seed = seed;
        self
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.vocabulary.dimensions = dimensions;
        self
    }

    pub fn with_selection_mode(mut self, mode: SelectionMode) -> Self {
        self.selection.mode = mode;
        self
    }

    pub fn with_cell_noise(mut self, std: f32) -> Self {
        self.cell_noise = std;
        self
    }

    /// Override one pipeline's threshold; background has no pipeline.
    pub fn with_counter_threshold(mut self, colour: Colour, threshold: f32) -> Self {
        if let Some(cfg) = colour.counter_slot().and_then(|i| self.counters.get_mut(i)) {
            cfg.threshold = threshold;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = CritterConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.counters[0].threshold, 0.6);
        assert!(cfg.counters[1..].iter().all(|c| c.threshold == 0.8));
    }

    #[test]
    fn invalid_values_are_configuration_errors() {
        let mut cfg = CritterConfig::default();
        cfg.dt = 0.0;
        assert!(matches!(
            cfg.validate(),
            Err(CritterError::Configuration { .. })
        ));

        let mut cfg = CritterConfig::default();
        cfg.counters.pop();
        assert!(cfg.validate().is_err());

        let cfg = CritterConfig::default().with_selection_mode(SelectionMode::Soft { sharpness: -1.0 });
        assert!(cfg.validate().is_err());

        let mut cfg = CritterConfig::default();
        cfg.flag_cell.tau = f32::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = CritterConfig::default();
        cfg.percept_margin = -0.1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn builders_touch_only_their_fields() {
        let cfg = CritterConfig::default()
            .with_seed(9)
            .with_counter_threshold(Colour::Blue, 0.5)
            .with_counter_threshold(Colour::Background, 0.1);
        assert_eq!(cfg.vocabulary.seed, 9);
        assert_eq!(cfg.seed, 9);
        assert_eq!(cfg.counters[2].threshold, 0.5);
        assert_eq!(cfg.counters[0].threshold, 0.6);
        cfg.validate().unwrap();
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json_fills_defaults() {
        let cfg: CritterConfig =
            serde_json::from_str(r#"{ "vocabulary": { "dimensions": 96 }, "cell_noise": 0.05 }"#)
                .unwrap();
        assert_eq!(cfg.vocabulary.dimensions, 96);
        assert_eq!(cfg.vocabulary.max_similarity, 0.1);
        assert_eq!(cfg.cell_noise, 0.05);
        assert_eq!(cfg.counters.len(), 5);
    }
}
