//! Categorical memory cell with cleanup.
//!
//! A cell holds one continuous vector that is low-pass filtered toward its
//! drive every step:
//!
//! ```text
//! x[n+1] = r * x[n] + (1 - r) * drive[n],   r = exp(-dt / tau)
//! drive  = cleanup(x[n]) + sum of injections
//! ```
//!
//! Cleanup adds `cleanup_gain * e(winner)` when the nearest legal symbol is at
//! least `confidence_floor` similar, so a cell with no input holds its symbol
//! indefinitely. Below the floor there is no cleanup term and the state relaxes
//! toward zero. Injections compete additively with cleanup; a cell is "set" by
//! pushing hard enough, for long enough, that a different symbol becomes the
//! cleanup winner.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::prng::Prng;
use crate::symbols::{axpy, Alphabet, Symbol, Vocabulary};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CellTuning {
    /// Synaptic time constant in seconds.
    pub tau: f32,
    pub cleanup_gain: f32,
    /// Minimum winner similarity for cleanup to engage.
    pub confidence_floor: f32,
}

impl Default for CellTuning {
    fn default() -> Self {
        Self {
            tau: 0.1,
            cleanup_gain: 1.0,
            confidence_floor: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum CleanupOutcome {
    Locked { symbol: Symbol, similarity: f32 },
    Ambiguous { best: Symbol, similarity: f32 },
}

impl CleanupOutcome {
    pub fn symbol(&self) -> Option<Symbol> {
        match *self {
            CleanupOutcome::Locked { symbol, .. } => Some(symbol),
            CleanupOutcome::Ambiguous { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemoryCell {
    alphabet: Alphabet,
    tuning: CellTuning,
    retention: f32,
    state: Vec<f32>,
    drive: Vec<f32>,
    last_outcome: CleanupOutcome,
}

impl MemoryCell {
    /// A cell starting at the zero vector.
    pub fn new(alphabet: Alphabet, dimensions: usize, tuning: CellTuning, dt: f32) -> Self {
        Self {
            alphabet,
            tuning,
            retention: (-dt / tuning.tau).exp(),
            state: vec![0.0; dimensions],
            drive: vec![0.0; dimensions],
            last_outcome: CleanupOutcome::Ambiguous {
                best: alphabet.symbols()[0],
                similarity: 0.0,
            },
        }
    }

    /// Start the cell at the cleanup fixed point of `symbol`.
    pub fn with_symbol(mut self, vocab: &Vocabulary, symbol: Symbol) -> Self {
        self.state.fill(0.0);
        axpy(&mut self.state, self.tuning.cleanup_gain, vocab.encode(symbol));
        self.last_outcome = CleanupOutcome::Locked {
            symbol,
            similarity: 1.0,
        };
        self
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    pub fn state(&self) -> &[f32] {
        &self.state
    }

    pub fn similarity(&self, vocab: &Vocabulary, symbol: impl Into<Symbol>) -> f32 {
        vocab.similarity_to(&self.state, symbol)
    }

    /// Nearest legal symbol and its similarity.
    pub fn readout(&self, vocab: &Vocabulary) -> (Symbol, f32) {
        vocab.nearest(&self.state, self.alphabet)
    }

    pub fn last_outcome(&self) -> CleanupOutcome {
        self.last_outcome
    }

    /// Queue `gain * e(symbol)` for the next commit.
    pub fn inject(&mut self, vocab: &Vocabulary, symbol: Symbol, gain: f32) {
        axpy(&mut self.drive, gain, vocab.encode(symbol));
    }

    /// Advance one step using the queued injections, then clear them.
    ///
    /// `noise` adds `std * N(0, 1)` to every drive component.
    pub fn commit(&mut self, vocab: &Vocabulary, noise: Option<(&mut Prng, f32)>) -> CleanupOutcome {
        let (best, similarity) = self.readout(vocab);
        let outcome = if similarity >= self.tuning.confidence_floor {
            axpy(&mut self.drive, self.tuning.cleanup_gain, vocab.encode(best));
            CleanupOutcome::Locked {
                symbol: best,
                similarity,
            }
        } else {
            CleanupOutcome::Ambiguous { best, similarity }
        };

        if let Some((rng, std)) = noise {
            if std > 0.0 {
                for d in &mut self.drive {
                    *d += std * rng.next_gaussian();
                }
            }
        }

        let r = self.retention;
        for (x, d) in self.state.iter_mut().zip(self.drive.iter_mut()) {
            *x = r * *x + (1.0 - r) * *d;
            *d = 0.0;
        }

        self.last_outcome = outcome;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{norm, Colour, VocabularyConfig, NO, YES};

    const DT: f32 = 0.001;

    fn vocab() -> Vocabulary {
        Vocabulary::new(&VocabularyConfig::default()).unwrap()
    }

    fn colour_cell(v: &Vocabulary) -> MemoryCell {
        let tuning = CellTuning {
            tau: 0.05,
            ..Default::default()
        };
        MemoryCell::new(Alphabet::Colour, v.dimensions(), tuning, DT)
    }

    #[test]
    fn cleanup_round_trips_every_symbol() {
        let v = vocab();
        for alphabet in [Alphabet::Colour, Alphabet::Flag] {
            for &s in alphabet.symbols() {
                let mut cell = MemoryCell::new(alphabet, v.dimensions(), CellTuning::default(), DT)
                    .with_symbol(&v, s);
                let outcome = cell.commit(&v, None);
                assert_eq!(outcome.symbol(), Some(s));
                match outcome {
                    CleanupOutcome::Locked { similarity, .. } => assert!(similarity >= 0.3),
                    CleanupOutcome::Ambiguous { .. } => unreachable!(),
                }
            }
        }
    }

    #[test]
    fn unattended_cell_holds_its_symbol() {
        let v = vocab();
        let mut cell = colour_cell(&v).with_symbol(&v, Colour::Red.into());
        for _ in 0..5000 {
            cell.commit(&v, None);
        }
        let (sym, sim) = cell.readout(&v);
        assert_eq!(sym, Colour::Red.into());
        assert!(sim > 0.99, "sim={sim}");
    }

    #[test]
    fn ambiguous_state_decays_toward_zero() {
        let v = vocab();
        let mut cell = colour_cell(&v);
        // A flag vector is nearly orthogonal to every colour.
        cell.inject(&v, YES, 1.0);
        cell.commit(&v, None);
        let start = norm(cell.state());
        assert!(start > 0.0);

        let mut last = CleanupOutcome::Locked {
            symbol: NO,
            similarity: 1.0,
        };
        for _ in 0..100 {
            last = cell.commit(&v, None);
        }
        assert!(matches!(last, CleanupOutcome::Ambiguous { .. }));
        assert!(norm(cell.state()) < start * 0.2);
    }

    #[test]
    fn sustained_injection_overwrites() {
        let v = vocab();
        let mut cell = colour_cell(&v).with_symbol(&v, Colour::Background.into());
        let mut switched_at = None;
        for n in 0..1000 {
            cell.inject(&v, Colour::Green.into(), 2.0);
            cell.commit(&v, None);
            if switched_at.is_none() && cell.readout(&v).0 == Colour::Green.into() {
                switched_at = Some(n);
            }
        }
        let n = switched_at.expect("cell never switched");
        // The held symbol stays at 1 while green grows as 2(1 - r^n): they cross
        // at tau * ln 2, about 35 steps.
        assert!((20..60).contains(&n), "switched at {n}");
        assert!(cell.similarity(&v, Colour::Green) > 0.99);
    }

    #[test]
    fn noise_is_reproducible() {
        let v = vocab();
        let mut a = colour_cell(&v).with_symbol(&v, Colour::Blue.into());
        let mut b = a.clone();
        let mut ra = Prng::new(3);
        let mut rb = Prng::new(3);
        for _ in 0..50 {
            a.commit(&v, Some((&mut ra, 0.2)));
            b.commit(&v, Some((&mut rb, 0.2)));
        }
        assert_eq!(a.state(), b.state());
        assert_eq!(a.readout(&v).0, Colour::Blue.into());
    }
}
