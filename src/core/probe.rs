//! Sampled recording of a running [`Critter`], like an oscilloscope tap.
//!
//! Counter values can be low-pass filtered with a probe synapse before they are
//! stored, which smooths the step-to-step jitter of the integrators without
//! touching the network.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::network::{CellId, Critter};
use crate::symbols::{Colour, Symbol};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProbeConfig {
    /// Filter time constant for counter values in seconds; 0 disables it.
    pub synapse: f32,
    /// Keep one sample every this many recorded steps.
    pub sample_every: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            synapse: 0.01,
            sample_every: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellReading {
    pub cell: CellId,
    pub symbol: Symbol,
    pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProbeSample {
    pub step: u64,
    pub time: f32,
    pub cells: Vec<CellReading>,
    /// Filtered counter values in [`Colour::COUNTED`] order.
    pub counts: [f32; 5],
    /// Colours whose increment pulse is high.
    pub pulses: Vec<Colour>,
}

#[derive(Debug, Clone)]
pub struct Probe {
    cfg: ProbeConfig,
    retention: f32,
    filtered: [f32; 5],
    seen: usize,
    samples: Vec<ProbeSample>,
}

impl Probe {
    pub fn new(cfg: ProbeConfig, dt: f32) -> Self {
        let retention = if cfg.synapse > 0.0 {
            (-dt / cfg.synapse).exp()
        } else {
            0.0
        };
        Self {
            cfg,
            retention,
            filtered: [0.0; 5],
            seen: 0,
            samples: Vec::new(),
        }
    }

    /// Call once per step, after `Critter::step`.
    pub fn record(&mut self, critter: &Critter) {
        let r = self.retention;
        for (y, c) in self.filtered.iter_mut().zip(Colour::COUNTED) {
            *y = r * *y + (1.0 - r) * critter.count(c);
        }

        let keep = self.seen % self.cfg.sample_every.max(1) == 0;
        self.seen += 1;
        if !keep {
            return;
        }

        let cells = CellId::all()
            .filter_map(|cell| {
                let (symbol, similarity) = critter.read_cell(cell)?;
                Some(CellReading {
                    cell,
                    symbol,
                    similarity,
                })
            })
            .collect();

        self.samples.push(ProbeSample {
            step: critter.age_steps(),
            time: critter.time(),
            cells,
            counts: self.filtered,
            pulses: Colour::COUNTED
                .into_iter()
                .filter(|&c| critter.pulse_active(c))
                .collect(),
        });
    }

    pub fn samples(&self) -> &[ProbeSample] {
        &self.samples
    }

    pub fn latest(&self) -> Option<&ProbeSample> {
        self.samples.last()
    }

    /// One JSON object per line.
    #[cfg(feature = "serde")]
    pub fn write_jsonl<W: std::io::Write>(&self, mut out: W) -> crate::error::Result<()> {
        for s in &self.samples {
            out.write_all(serde_json::to_string(s)?.as_bytes())?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(())
    }
}
