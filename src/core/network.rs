//! The colour-counting network.
//!
//! Data flow per step, all reads against the previous step's cell states:
//!
//! ```text
//! sample -> encoder -> cc ----+--> seen_red unit ----> seen_red
//!                             +--> seen_white unit --> seen_white
//!                             +--> increment unit <--- seen_red, seen_white
//!                                        |
//!                                        v
//!                             increment[c] -> detector -> counter[c]
//! ```
//!
//! The increment unit fires for colour `c` when the current colour is `c`, red
//! has been seen, and white has been seen since; i.e. once per "red, white, c"
//! sequence. Its default rule pushes every increment flag back to NO.

use std::sync::Arc;

use hashbrown::HashMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::CritterConfig;
use crate::counter::CounterPipeline;
use crate::error::{Result, Warning};
use crate::memory::{CleanupOutcome, MemoryCell};
use crate::perception::{PerceptualEncoder, Rgb};
use crate::prng::Prng;
use crate::selection::{ActionSelector, CellReader, Condition, Effect, Rule, SelectionConfig};
use crate::symbols::{Alphabet, Colour, Symbol, Vocabulary, NO, YES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CellId {
    CurrentColour,
    SeenRed,
    SeenWhite,
    Increment(Colour),
}

impl CellId {
    pub fn all() -> impl Iterator<Item = CellId> {
        [CellId::CurrentColour, CellId::SeenRed, CellId::SeenWhite]
            .into_iter()
            .chain(Colour::COUNTED.into_iter().map(CellId::Increment))
    }

    fn slot(self) -> Option<usize> {
        match self {
            CellId::CurrentColour => Some(0),
            CellId::SeenRed => Some(1),
            CellId::SeenWhite => Some(2),
            CellId::Increment(c) => c.counter_slot().map(|i| 3 + i),
        }
    }

    pub fn name(self) -> String {
        match self {
            CellId::CurrentColour => "cc".to_string(),
            CellId::SeenRed => "seen_red".to_string(),
            CellId::SeenWhite => "seen_white".to_string(),
            CellId::Increment(c) => format!("inc_{}", c.name()),
        }
    }
}

/// External signals for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensoryInput {
    pub current: Rgb,
    pub look_ahead: Option<Rgb>,
}

impl SensoryInput {
    pub fn current(rgb: Rgb) -> Self {
        Self {
            current: rgb,
            look_ahead: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Diagnostics {
    pub steps: u64,
    /// Cell commits whose cleanup winner fell below the confidence floor.
    pub ambiguous_cells: u64,
    /// Colour samples too close to a second reference to drive at full gain.
    pub ambiguous_percepts: u64,
    /// Unit evaluations where the runner-up rule was active enough to blend.
    pub blended_selections: u64,
    pub last_percept: Option<Colour>,
    pub last_look_ahead: Option<Colour>,
}

#[derive(Debug, Default)]
struct Telemetry {
    enabled: bool,
    last_warnings: Vec<Warning>,
}

struct CellView<'a> {
    vocab: &'a Vocabulary,
    cells: &'a [MemoryCell],
}

impl CellReader for CellView<'_> {
    fn similarity(&self, cell: CellId, symbol: Symbol) -> f32 {
        cell.slot()
            .and_then(|i| self.cells.get(i))
            .map_or(0.0, |c| c.similarity(self.vocab, symbol))
    }
}

fn seen_red_unit(cfg: &SelectionConfig) -> ActionSelector {
    let others: Vec<Symbol> = [Colour::Green, Colour::Blue, Colour::Magenta, Colour::Yellow]
        .into_iter()
        .map(Symbol::from)
        .collect();
    ActionSelector::new("seen_red", cfg.flag_default_utility, cfg)
        .with_rule(Rule::new(
            "red",
            Condition::new().is(CellId::CurrentColour, Colour::Red, 1.0),
            vec![Effect::new(CellId::SeenRed, YES, cfg.win_gain)],
        ))
        .with_rule(Rule::new(
            "other_colour",
            Condition::new().any_of(CellId::CurrentColour, &others, 1.0),
            vec![Effect::new(CellId::SeenRed, NO, cfg.suppress_gain)],
        ))
}

fn seen_white_unit(cfg: &SelectionConfig) -> ActionSelector {
    let colours: Vec<Symbol> = Colour::COUNTED.into_iter().map(Symbol::from).collect();
    ActionSelector::new("seen_white", cfg.flag_default_utility, cfg)
        .with_rule(Rule::new(
            "white",
            Condition::new().is(CellId::CurrentColour, Colour::Background, 1.0),
            vec![Effect::new(CellId::SeenWhite, YES, cfg.win_gain)],
        ))
        .with_rule(Rule::new(
            "any_colour",
            Condition::new().any_of(CellId::CurrentColour, &colours, 1.0),
            vec![Effect::new(CellId::SeenWhite, NO, cfg.suppress_gain)],
        ))
}

fn increment_unit(cfg: &SelectionConfig) -> ActionSelector {
    const THIRD: f32 = 1.0 / 3.0;
    let mut unit = ActionSelector::new("increment", cfg.count_default_utility, cfg);
    for c in Colour::COUNTED {
        unit = unit.with_rule(Rule::new(
            c.name(),
            Condition::new()
                .is(CellId::CurrentColour, c, THIRD)
                .is(CellId::SeenRed, YES, THIRD)
                .is(CellId::SeenWhite, YES, THIRD),
            vec![Effect::new(CellId::Increment(c), YES, cfg.win_gain)],
        ));
    }
    unit.with_default_effects(
        Colour::COUNTED
            .into_iter()
            .map(|c| Effect::new(CellId::Increment(c), NO, cfg.suppress_gain))
            .collect(),
    )
}

pub struct Critter {
    cfg: CritterConfig,
    vocab: Arc<Vocabulary>,
    encoder: PerceptualEncoder,

    // Indexed by CellId::slot.
    cells: Vec<MemoryCell>,
    units: [ActionSelector; 3],
    counters: Vec<CounterPipeline>,

    rng: Prng,
    age_steps: u64,
    diagnostics: Diagnostics,
    telemetry: Telemetry,
    injections: Vec<Effect>,
}

impl Critter {
    pub fn new(cfg: CritterConfig) -> Result<Self> {
        let vocab = Arc::new(Vocabulary::new(&cfg.vocabulary)?);
        Self::with_vocabulary(cfg, vocab)
    }

    /// Build around an existing vocabulary, e.g. one shared by several critters.
    pub fn with_vocabulary(cfg: CritterConfig, vocab: Arc<Vocabulary>) -> Result<Self> {
        cfg.validate()?;
        let d = vocab.dimensions();
        let dt = cfg.dt;

        let mut cells = Vec::with_capacity(3 + Colour::COUNTED.len());
        cells.push(MemoryCell::new(Alphabet::Colour, d, cfg.colour_cell, dt));
        for _ in 0..2 {
            cells.push(MemoryCell::new(Alphabet::Flag, d, cfg.flag_cell, dt).with_symbol(&vocab, NO));
        }
        for _ in Colour::COUNTED {
            cells.push(
                MemoryCell::new(Alphabet::Flag, d, cfg.increment_cell, dt).with_symbol(&vocab, NO),
            );
        }

        let counters = Colour::COUNTED
            .iter()
            .zip(&cfg.counters)
            .map(|(&c, counter)| CounterPipeline::new(c, counter, dt))
            .collect();

        let units = [
            seen_red_unit(&cfg.selection),
            seen_white_unit(&cfg.selection),
            increment_unit(&cfg.selection),
        ];

        debug!(
            dimensions = d,
            mode = ?cfg.selection.mode,
            "critter network built"
        );

        Ok(Self {
            rng: Prng::new(cfg.seed),
            cfg,
            vocab,
            encoder: PerceptualEncoder::default(),
            cells,
            units,
            counters,
            age_steps: 0,
            diagnostics: Diagnostics::default(),
            telemetry: Telemetry::default(),
            injections: Vec::new(),
        })
    }

    pub fn config(&self) -> &CritterConfig {
        &self.cfg
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocab
    }

    pub fn age_steps(&self) -> u64 {
        self.age_steps
    }

    /// Simulated time in seconds.
    pub fn time(&self) -> f32 {
        self.age_steps as f32 * self.cfg.dt
    }

    pub fn dt(&self) -> f32 {
        self.cfg.dt
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    /// Capture per-step warnings for observers. Off by default.
    pub fn set_observer_telemetry(&mut self, enabled: bool) {
        self.telemetry.enabled = enabled;
        if !enabled {
            self.telemetry.last_warnings.clear();
        }
    }

    /// Warnings raised by the last step; empty unless telemetry is on.
    pub fn last_warnings(&self) -> &[Warning] {
        &self.telemetry.last_warnings
    }

    /// Nearest legal symbol held by `cell` and its similarity.
    pub fn read_cell(&self, cell: CellId) -> Option<(Symbol, f32)> {
        let c = self.cells.get(cell.slot()?)?;
        Some(c.readout(&self.vocab))
    }

    pub fn cell_similarity(&self, cell: CellId, symbol: impl Into<Symbol>) -> f32 {
        self.view().similarity(cell, symbol.into())
    }

    pub fn count(&self, colour: Colour) -> f32 {
        self.pipeline(colour).map_or(0.0, |p| p.value())
    }

    /// Exact number of increment pulses (rising edges) seen for `colour`.
    pub fn pulses(&self, colour: Colour) -> u32 {
        self.pipeline(colour).map_or(0, |p| p.rising_edges())
    }

    pub fn pulse_active(&self, colour: Colour) -> bool {
        self.pipeline(colour).is_some_and(|p| p.pulse())
    }

    /// Current analog value of every counter.
    pub fn counts(&self) -> HashMap<Colour, f32> {
        self.counters.iter().map(|p| (p.colour(), p.value())).collect()
    }

    pub fn pulse_counts(&self) -> HashMap<Colour, u32> {
        self.counters
            .iter()
            .map(|p| (p.colour(), p.rising_edges()))
            .collect()
    }

    fn pipeline(&self, colour: Colour) -> Option<&CounterPipeline> {
        self.counters.get(colour.counter_slot()?)
    }

    fn view(&self) -> CellView<'_> {
        CellView {
            vocab: &self.vocab,
            cells: &self.cells,
        }
    }

    /// Advance the whole network by one `dt`.
    pub fn step(&mut self, input: &SensoryInput) {
        let time = self.time();
        self.telemetry.last_warnings.clear();
        self.injections.clear();

        let percept = self.encoder.classify(input.current);
        self.diagnostics.last_percept = Some(percept.colour);
        self.diagnostics.last_look_ahead =
            input.look_ahead.map(|rgb| self.encoder.classify(rgb).colour);

        // Selection and detection read the previous step's cells only.
        let view = CellView {
            vocab: &self.vocab,
            cells: &self.cells,
        };
        for unit in self.units.iter_mut() {
            let selection = unit.evaluate(&view);
            if let Some((first, second, activations)) = unit.blend(&selection) {
                self.diagnostics.blended_selections += 1;
                let w = Warning::ImpossibleConditionState {
                    unit: unit.name(),
                    first,
                    second,
                    activations,
                };
                trace!(warning = ?w, time, "blended selection");
                if self.telemetry.enabled {
                    self.telemetry.last_warnings.push(w);
                }
            }
            self.injections.extend(unit.weighted_effects(&selection));
        }

        for p in self.counters.iter_mut() {
            let yes = view.similarity(CellId::Increment(p.colour()), YES);
            p.step(yes, time);
        }

        let confidence = percept.confidence(self.cfg.percept_margin);
        if confidence < 1.0 {
            self.diagnostics.ambiguous_percepts += 1;
            let w = Warning::AmbiguousPerception {
                cell: CellId::CurrentColour,
                best: percept.colour.into(),
                similarity: confidence,
            };
            trace!(warning = ?w, time, margin = percept.margin, "ambiguous percept");
            if self.telemetry.enabled {
                self.telemetry.last_warnings.push(w);
            }
        }
        if confidence > 0.0 {
            self.cells[0].inject(
                &self.vocab,
                percept.colour.into(),
                self.cfg.input_gain * confidence,
            );
        }
        for e in &self.injections {
            if let Some(cell) = e.cell.slot().and_then(|i| self.cells.get_mut(i)) {
                cell.inject(&self.vocab, e.symbol, e.gain);
            }
        }

        let std = self.cfg.cell_noise;
        for (id, cell) in CellId::all().zip(self.cells.iter_mut()) {
            let noise = (std > 0.0).then_some((&mut self.rng, std));
            if let CleanupOutcome::Ambiguous { best, similarity } = cell.commit(&self.vocab, noise) {
                self.diagnostics.ambiguous_cells += 1;
                let w = Warning::AmbiguousPerception {
                    cell: id,
                    best,
                    similarity,
                };
                trace!(warning = ?w, time, "ambiguous cell");
                if self.telemetry.enabled {
                    self.telemetry.last_warnings.push(w);
                }
            }
        }

        self.age_steps += 1;
        self.diagnostics.steps = self.age_steps;
    }
}
