//! # critter
//!
//! A colour-counting critter built from vector-symbolic memory cells,
//! soft winner-take-all action selection, and leaky-integrator counters.
//!
//! The network keeps a "current colour" cell, two flags (`seen_red`,
//! `seen_white`), and five increment flags, each driving an analog counter.
//! Every step reads the previous step's state only, so a run is a pure
//! function of the configuration and the input samples.
//!
//! ## Quick Start
//!
//! ```
//! use critter::prelude::*;
//!
//! let mut critter = Critter::new(CritterConfig::default()).unwrap();
//! let report = ColourScenario::red_white_green().run(&mut critter);
//! assert_eq!(report.pulses(Colour::Green), 1);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): Serialization of configs, probe samples and warnings;
//!   required by the `critter` binary.
//!
//! ## Modules
//!
//! - [`symbols`]: Vocabulary of near-orthogonal symbol vectors
//! - [`perception`]: RGB sample to colour classification
//! - [`memory`]: Categorical memory cells with cleanup
//! - [`selection`]: Action-selection units
//! - [`counter`]: Increment detectors and leaky counters
//! - [`network`]: The wired-up counting network
//! - [`agent`]: Embodied loop in the grid world
//! - [`observer`]: Read-only observation adapters

#[path = "core/error.rs"]
pub mod error;

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/symbols.rs"]
pub mod symbols;

#[path = "core/perception.rs"]
pub mod perception;

#[path = "core/memory.rs"]
pub mod memory;

#[path = "core/selection.rs"]
pub mod selection;

#[path = "core/counter.rs"]
pub mod counter;

#[path = "core/config.rs"]
pub mod config;

#[path = "core/network.rs"]
pub mod network;

#[path = "core/probe.rs"]
pub mod probe;

#[path = "experiments/scenario.rs"]
pub mod scenario;

pub mod agent;

pub mod observer;

/// Prelude module for convenient imports.
///
/// ```
/// use critter::prelude::*;
/// ```
pub mod prelude {
    pub use crate::agent::{Agent, SimulationConfig, WallAvoidance};
    pub use crate::config::CritterConfig;
    pub use crate::counter::{switch_signal, CounterConfig, LeakyCounter};
    pub use crate::error::{CritterError, Warning};
    pub use crate::network::{CellId, Critter, Diagnostics, SensoryInput};
    pub use crate::observer::{CritterAdapter, CritterSnapshot};
    pub use crate::probe::{Probe, ProbeConfig};
    pub use crate::scenario::{ColourScenario, ScenarioReport, Segment};
    pub use crate::selection::{Selected, SelectionMode};
    pub use crate::symbols::{Colour, Symbol, Vocabulary, VocabularyConfig, NO, YES};
}
