//! Symbol space: the discrete categories the network reasons about, each
//! embedded as a near-orthogonal unit vector in one shared space.
//!
//! The [`Vocabulary`] is built once from a seed and never changes afterwards;
//! components hold it behind an `Arc` and only ever read it.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CritterError, Result};
use crate::prng::Prng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Colour {
    Background,
    Green,
    Red,
    Blue,
    Magenta,
    Yellow,
}

impl Colour {
    pub const ALL: [Colour; 6] = [
        Colour::Background,
        Colour::Green,
        Colour::Red,
        Colour::Blue,
        Colour::Magenta,
        Colour::Yellow,
    ];

    /// Colours that own a counter, in pipeline order.
    pub const COUNTED: [Colour; 5] = [
        Colour::Green,
        Colour::Red,
        Colour::Blue,
        Colour::Magenta,
        Colour::Yellow,
    ];

    /// Same numbering as the world's cell colour index.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Position in [`Colour::COUNTED`], or `None` for background.
    pub fn counter_slot(self) -> Option<usize> {
        self.index().checked_sub(1)
    }

    pub fn name(self) -> &'static str {
        match self {
            Colour::Background => "background",
            Colour::Green => "green",
            Colour::Red => "red",
            Colour::Blue => "blue",
            Colour::Magenta => "magenta",
            Colour::Yellow => "yellow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Flag {
    Yes,
    No,
}

impl Flag {
    pub fn name(self) -> &'static str {
        match self {
            Flag::Yes => "yes",
            Flag::No => "no",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Symbol {
    Colour(Colour),
    Flag(Flag),
}

impl Symbol {
    pub const COUNT: usize = 8;

    pub fn index(self) -> usize {
        match self {
            Symbol::Colour(c) => c.index(),
            Symbol::Flag(Flag::Yes) => 6,
            Symbol::Flag(Flag::No) => 7,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Symbol::Colour(c) => c.name(),
            Symbol::Flag(f) => f.name(),
        }
    }
}

impl From<Colour> for Symbol {
    fn from(c: Colour) -> Self {
        Symbol::Colour(c)
    }
}

impl From<Flag> for Symbol {
    fn from(f: Flag) -> Self {
        Symbol::Flag(f)
    }
}

pub const YES: Symbol = Symbol::Flag(Flag::Yes);
pub const NO: Symbol = Symbol::Flag(Flag::No);

const COLOUR_SYMBOLS: [Symbol; 6] = [
    Symbol::Colour(Colour::Background),
    Symbol::Colour(Colour::Green),
    Symbol::Colour(Colour::Red),
    Symbol::Colour(Colour::Blue),
    Symbol::Colour(Colour::Magenta),
    Symbol::Colour(Colour::Yellow),
];

const FLAG_SYMBOLS: [Symbol; 2] = [YES, NO];

const ALL_SYMBOLS: [Symbol; Symbol::COUNT] = [
    COLOUR_SYMBOLS[0],
    COLOUR_SYMBOLS[1],
    COLOUR_SYMBOLS[2],
    COLOUR_SYMBOLS[3],
    COLOUR_SYMBOLS[4],
    COLOUR_SYMBOLS[5],
    YES,
    NO,
];

/// The set of symbols a memory cell may legally hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Alphabet {
    Colour,
    Flag,
}

impl Alphabet {
    pub fn symbols(self) -> &'static [Symbol] {
        match self {
            Alphabet::Colour => &COLOUR_SYMBOLS,
            Alphabet::Flag => &FLAG_SYMBOLS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VocabularyConfig {
    /// Dimension D of the shared vector space.
    pub dimensions: usize,
    /// Upper bound on |similarity| between any two distinct symbols.
    pub max_similarity: f32,
    /// Random candidates tried per symbol before giving up.
    pub max_attempts: usize,
    pub seed: u64,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            dimensions: 64,
            max_similarity: 0.1,
            max_attempts: 1000,
            seed: 1,
        }
    }
}

/// Canonical unit vectors for every [`Symbol`].
#[derive(Debug, Clone)]
pub struct Vocabulary {
    dimensions: usize,
    max_similarity: f32,
    vectors: Vec<Vec<f32>>,
}

impl Vocabulary {
    pub fn new(cfg: &VocabularyConfig) -> Result<Self> {
        let d = cfg.dimensions;
        let b = cfg.max_similarity;
        let n = Symbol::COUNT;

        if d == 0 {
            return Err(CritterError::config("vocabulary dimension must be > 0"));
        }
        if !(0.0..1.0).contains(&b) {
            return Err(CritterError::config(format!(
                "max_similarity must be in [0, 1), got {b}"
            )));
        }
        // Relative bound: n unit vectors with pairwise |cos| <= b in D dimensions
        // need n <= D(1 - b^2) / (1 - D b^2) whenever D b^2 < 1.
        let db2 = d as f32 * b * b;
        if db2 < 1.0 {
            let capacity = d as f32 * (1.0 - b * b) / (1.0 - db2);
            if (n as f32) > capacity + 1e-4 {
                return Err(CritterError::config(format!(
                    "{n} symbols cannot have pairwise similarity <= {b} in {d} dimensions \
                     (at most {capacity:.2} fit)"
                )));
            }
        }

        let mut rng = Prng::new(cfg.seed);
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(n);
        let mut total_attempts = 0usize;

        for sym in ALL_SYMBOLS {
            let mut accepted = None;
            for _ in 0..cfg.max_attempts.max(1) {
                total_attempts += 1;
                let mut v: Vec<f32> = (0..d).map(|_| rng.next_gaussian()).collect();
                if normalize(&mut v) == 0.0 {
                    continue;
                }
                if vectors.iter().all(|u| dot(u, &v).abs() <= b) {
                    accepted = Some(v);
                    break;
                }
            }
            match accepted {
                Some(v) => vectors.push(v),
                None => {
                    return Err(CritterError::config(format!(
                        "no vector for '{}' within similarity {b} of {} earlier symbols \
                         after {} attempts (dimension {d} too small?)",
                        sym.name(),
                        vectors.len(),
                        cfg.max_attempts
                    )))
                }
            }
        }

        let vocab = Self {
            dimensions: d,
            max_similarity: b,
            vectors,
        };
        if total_attempts > n * cfg.max_attempts / 2 {
            warn!(
                total_attempts,
                dimensions = d,
                "vocabulary barely fits; consider a larger dimension"
            );
        }
        debug!(
            dimensions = d,
            worst = vocab.worst_pairwise_similarity(),
            total_attempts,
            "vocabulary built"
        );
        Ok(vocab)
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The bound requested at construction.
    pub fn max_similarity(&self) -> f32 {
        self.max_similarity
    }

    pub fn encode(&self, symbol: impl Into<Symbol>) -> &[f32] {
        &self.vectors[symbol.into().index()]
    }

    pub fn similarity_to(&self, v: &[f32], symbol: impl Into<Symbol>) -> f32 {
        similarity(v, self.encode(symbol))
    }

    /// Largest |similarity| between two distinct canonical vectors.
    pub fn worst_pairwise_similarity(&self) -> f32 {
        let mut worst = 0.0f32;
        for (i, a) in self.vectors.iter().enumerate() {
            for b in &self.vectors[i + 1..] {
                worst = worst.max(dot(a, b).abs());
            }
        }
        worst
    }

    /// Nearest legal symbol of `alphabet` to `v` and its similarity.
    ///
    /// Ties go to the symbol listed first in the alphabet.
    pub fn nearest(&self, v: &[f32], alphabet: Alphabet) -> (Symbol, f32) {
        let mut best = alphabet.symbols()[0];
        let mut best_sim = f32::NEG_INFINITY;
        for &s in alphabet.symbols() {
            let sim = self.similarity_to(v, s);
            if sim > best_sim {
                best = s;
                best_sim = sim;
            }
        }
        (best, best_sim)
    }
}

#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[inline]
pub fn norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

/// Normalised dot product; 0.0 if either vector is zero.
pub fn similarity(a: &[f32], b: &[f32]) -> f32 {
    let na = norm(a);
    let nb = norm(b);
    if na <= f32::EPSILON || nb <= f32::EPSILON {
        return 0.0;
    }
    dot(a, b) / (na * nb)
}

/// Scale `v` to unit length in place, returning its previous norm.
pub fn normalize(v: &mut [f32]) -> f32 {
    let n = norm(v);
    if n > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= n;
        }
    }
    n
}

/// `y += a * x`
#[inline]
pub fn axpy(y: &mut [f32], a: f32, x: &[f32]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += a * xi;
    }
}
