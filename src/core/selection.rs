//! Action selection: a basal-ganglia/thalamus style arbiter over a fixed rule
//! set.
//!
//! Every step each rule's condition is scored from the previous step's cell
//! states, the scores compete, and every rule's effects are applied in
//! proportion to its activation. A flat-utility default rule is always present
//! so that "nothing matches" has a well-defined winner.
//!
//! The reported winner is a tagged [`Selected`] value. Ties go to the lowest
//! rule index (the default rule is last), and the previous winner gets a
//! `hysteresis` bonus so that near-equal scores do not flicker. Underneath, the
//! activations are either a softmax over the (biased) scores, which is the
//! mutual-inhibition approximation, or a one-hot vector in
//! [`SelectionMode::WinnerTakeAll`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::network::CellId;
use crate::symbols::Symbol;

/// Read access to the cell states a condition may test.
pub trait CellReader {
    fn similarity(&self, cell: CellId, symbol: Symbol) -> f32;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// `weight * similarity(cell, symbol)`
    Is {
        cell: CellId,
        symbol: Symbol,
        weight: f32,
    },
    /// `weight * max over symbols of similarity(cell, symbol)`
    AnyOf {
        cell: CellId,
        symbols: Vec<Symbol>,
        weight: f32,
    },
}

impl Term {
    fn score(&self, cells: &impl CellReader) -> f32 {
        match self {
            Term::Is {
                cell,
                symbol,
                weight,
            } => weight * cells.similarity(*cell, *symbol),
            Term::AnyOf {
                cell,
                symbols,
                weight,
            } => {
                let best = symbols
                    .iter()
                    .map(|&s| cells.similarity(*cell, s))
                    .fold(f32::NEG_INFINITY, f32::max);
                if best.is_finite() {
                    weight * best
                } else {
                    0.0
                }
            }
        }
    }
}

/// Weighted sum of similarity terms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    terms: Vec<Term>,
}

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is(mut self, cell: CellId, symbol: impl Into<Symbol>, weight: f32) -> Self {
        self.terms.push(Term::Is {
            cell,
            symbol: symbol.into(),
            weight,
        });
        self
    }

    pub fn any_of(mut self, cell: CellId, symbols: &[Symbol], weight: f32) -> Self {
        self.terms.push(Term::AnyOf {
            cell,
            symbols: symbols.to_vec(),
            weight,
        });
        self
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn score(&self, cells: &impl CellReader) -> f32 {
        self.terms.iter().map(|t| t.score(cells)).sum()
    }
}

/// Inject `gain * e(symbol)` into `cell`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Effect {
    pub cell: CellId,
    pub symbol: Symbol,
    pub gain: f32,
}

impl Effect {
    pub fn new(cell: CellId, symbol: impl Into<Symbol>, gain: f32) -> Self {
        Self {
            cell,
            symbol: symbol.into(),
            gain,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: &'static str,
    pub condition: Condition,
    pub effects: Vec<Effect>,
}

impl Rule {
    pub fn new(name: &'static str, condition: Condition, effects: Vec<Effect>) -> Self {
        Self {
            name,
            condition,
            effects,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Selected {
    Rule(usize),
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SelectionMode {
    /// Softmax over scores; larger sharpness approaches winner-take-all.
    Soft { sharpness: f32 },
    /// Deterministic one-hot selection.
    WinnerTakeAll,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SelectionConfig {
    pub mode: SelectionMode,
    /// Score bonus for the previous step's winner.
    pub hysteresis: f32,
    /// Runner-up activation at or above which a step counts as blended.
    pub blend_floor: f32,
    /// Default-rule utility of the seen_red / seen_white units.
    pub flag_default_utility: f32,
    /// Default-rule utility of the increment unit.
    pub count_default_utility: f32,
    /// Gain of a winning rule's YES injection.
    pub win_gain: f32,
    /// Gain of the NO injections that suppress a flag.
    pub suppress_gain: f32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            mode: SelectionMode::Soft { sharpness: 40.0 },
            hysteresis: 0.05,
            blend_floor: 0.3,
            flag_default_utility: 0.8,
            count_default_utility: 0.75,
            win_gain: 3.0,
            suppress_gain: 10.0,
        }
    }
}

/// Scores and activations of one evaluation. Index `rules.len()` is the
/// default rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub selected: Selected,
    pub scores: Vec<f32>,
    pub activations: Vec<f32>,
}

impl Selection {
    fn slot(&self, s: Selected) -> usize {
        match s {
            Selected::Rule(i) => i,
            Selected::Default => self.activations.len() - 1,
        }
    }

    fn tag(&self, slot: usize) -> Selected {
        if slot + 1 == self.activations.len() {
            Selected::Default
        } else {
            Selected::Rule(slot)
        }
    }

    pub fn activation(&self, s: Selected) -> f32 {
        self.activations[self.slot(s)]
    }

    /// Most active choice other than the winner.
    pub fn runner_up(&self) -> Option<(Selected, f32)> {
        let winner = self.slot(self.selected);
        self.activations
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != winner)
            .fold(None, |best: Option<(usize, f32)>, (i, &a)| match best {
                Some((_, b)) if b >= a => best,
                _ => Some((i, a)),
            })
            .map(|(i, a)| (self.tag(i), a))
    }
}

#[derive(Debug, Clone)]
pub struct ActionSelector {
    name: &'static str,
    rules: Vec<Rule>,
    default_utility: f32,
    default_effects: Vec<Effect>,
    mode: SelectionMode,
    hysteresis: f32,
    blend_floor: f32,
    incumbent: Option<usize>,
}

impl ActionSelector {
    pub fn new(name: &'static str, default_utility: f32, cfg: &SelectionConfig) -> Self {
        Self {
            name,
            rules: Vec::new(),
            default_utility,
            default_effects: Vec::new(),
            mode: cfg.mode,
            hysteresis: cfg.hysteresis,
            blend_floor: cfg.blend_floor,
            incumbent: None,
        }
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_default_effects(mut self, effects: Vec<Effect>) -> Self {
        self.default_effects = effects;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule_name(&self, s: Selected) -> &'static str {
        match s {
            Selected::Rule(i) => self.rules.get(i).map_or("?", |r| r.name),
            Selected::Default => "default",
        }
    }

    pub fn evaluate(&mut self, cells: &impl CellReader) -> Selection {
        let n = self.rules.len();
        let mut scores: Vec<f32> = self.rules.iter().map(|r| r.condition.score(cells)).collect();
        scores.push(self.default_utility);

        let mut biased = scores.clone();
        if let Some(i) = self.incumbent {
            biased[i] += self.hysteresis;
        }

        let mut winner = 0;
        for (i, &s) in biased.iter().enumerate() {
            if s > biased[winner] {
                winner = i;
            }
        }
        self.incumbent = Some(winner);

        let activations = match self.mode {
            SelectionMode::WinnerTakeAll => {
                let mut a = vec![0.0; n + 1];
                a[winner] = 1.0;
                a
            }
            SelectionMode::Soft { sharpness } => {
                let top = biased[winner];
                let mut a: Vec<f32> = biased
                    .iter()
                    .map(|&s| (sharpness * (s - top)).exp())
                    .collect();
                let total: f32 = a.iter().sum();
                for x in &mut a {
                    *x /= total;
                }
                a
            }
        };

        let selected = if winner == n {
            Selected::Default
        } else {
            Selected::Rule(winner)
        };

        Selection {
            selected,
            scores,
            activations,
        }
    }

    /// Every effect of every rule, with gain scaled by that rule's activation.
    pub fn weighted_effects<'a>(
        &'a self,
        selection: &'a Selection,
    ) -> impl Iterator<Item = Effect> + 'a {
        let rule_effects = self.rules.iter().enumerate().flat_map(move |(i, r)| {
            let a = selection.activations[i];
            r.effects.iter().map(move |e| (e, a))
        });
        let default_a = selection.activations[self.rules.len()];
        let default_effects = self.default_effects.iter().map(move |e| (e, default_a));

        rule_effects
            .chain(default_effects)
            .filter(|(_, a)| *a > 1e-6)
            .map(|(e, a)| Effect {
                gain: e.gain * a,
                ..*e
            })
    }

    /// The two strongest choices if the runner-up is active enough to blend.
    pub fn blend(&self, selection: &Selection) -> Option<(Selected, Selected, (f32, f32))> {
        let (second, a2) = selection.runner_up()?;
        if a2 < self.blend_floor {
            return None;
        }
        let first = selection.selected;
        Some((first, second, (selection.activation(first), a2)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{Colour, NO, YES};

    struct FakeCells(Vec<(CellId, Symbol, f32)>);

    impl CellReader for FakeCells {
        fn similarity(&self, cell: CellId, symbol: Symbol) -> f32 {
            self.0
                .iter()
                .find(|(c, s, _)| *c == cell && *s == symbol)
                .map_or(0.0, |(_, _, v)| *v)
        }
    }

    fn red_unit(cfg: &SelectionConfig) -> ActionSelector {
        ActionSelector::new("test", 0.5, cfg)
            .with_rule(Rule::new(
                "red",
                Condition::new().is(CellId::CurrentColour, Colour::Red, 1.0),
                vec![Effect::new(CellId::SeenRed, YES, 3.0)],
            ))
            .with_rule(Rule::new(
                "other",
                Condition::new().any_of(
                    CellId::CurrentColour,
                    &[Symbol::from(Colour::Green), Symbol::from(Colour::Blue)],
                    1.0,
                ),
                vec![Effect::new(CellId::SeenRed, NO, 10.0)],
            ))
    }

    fn cc(colour: Colour, sim: f32) -> FakeCells {
        FakeCells(vec![(CellId::CurrentColour, colour.into(), sim)])
    }

    #[test]
    fn condition_sums_weighted_terms() {
        let cells = FakeCells(vec![
            (CellId::CurrentColour, Colour::Green.into(), 0.9),
            (CellId::CurrentColour, Colour::Blue.into(), 0.2),
            (CellId::SeenRed, YES, 0.6),
        ]);
        let c = Condition::new()
            .any_of(
                CellId::CurrentColour,
                &[Symbol::from(Colour::Green), Symbol::from(Colour::Blue)],
                0.5,
            )
            .is(CellId::SeenRed, YES, 2.0);
        assert!((c.score(&cells) - (0.45 + 1.2)).abs() < 1e-6);
    }

    #[test]
    fn soft_selection_prefers_best_rule_and_normalises() {
        let mut unit = red_unit(&SelectionConfig::default());
        let sel = unit.evaluate(&cc(Colour::Red, 1.0));
        assert_eq!(sel.selected, Selected::Rule(0));
        let total: f32 = sel.activations.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert!(sel.activation(Selected::Rule(0)) > 0.99);
    }

    #[test]
    fn default_rule_wins_when_nothing_matches() {
        let mut unit = red_unit(&SelectionConfig::default());
        let sel = unit.evaluate(&cc(Colour::Background, 1.0));
        assert_eq!(sel.selected, Selected::Default);
        assert_eq!(unit.rule_name(sel.selected), "default");
    }

    #[test]
    fn wider_gap_sharpens_the_blend() {
        let mut unit = red_unit(&SelectionConfig::default());
        let close = unit.evaluate(&cc(Colour::Red, 0.52));
        let mut unit = red_unit(&SelectionConfig::default());
        let far = unit.evaluate(&cc(Colour::Red, 0.9));
        assert!(close.activation(Selected::Rule(0)) < far.activation(Selected::Rule(0)));
        assert!(close.activation(Selected::Default) > 0.1);
    }

    #[test]
    fn ties_go_to_lowest_index() {
        let cfg = SelectionConfig {
            mode: SelectionMode::WinnerTakeAll,
            hysteresis: 0.0,
            ..Default::default()
        };
        let mut unit = red_unit(&cfg);
        let cells = FakeCells(vec![
            (CellId::CurrentColour, Colour::Red.into(), 0.7),
            (CellId::CurrentColour, Colour::Green.into(), 0.7),
        ]);
        let sel = unit.evaluate(&cells);
        assert_eq!(sel.selected, Selected::Rule(0));
        assert_eq!(sel.activations, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn hysteresis_keeps_the_incumbent() {
        let cfg = SelectionConfig {
            mode: SelectionMode::WinnerTakeAll,
            hysteresis: 0.05,
            ..Default::default()
        };
        let mut unit = red_unit(&cfg);
        let first = unit.evaluate(&FakeCells(vec![
            (CellId::CurrentColour, Colour::Red.into(), 0.7),
            (CellId::CurrentColour, Colour::Green.into(), 0.65),
        ]));
        assert_eq!(first.selected, Selected::Rule(0));

        // Green now leads, but by less than the hysteresis bonus.
        let second = unit.evaluate(&FakeCells(vec![
            (CellId::CurrentColour, Colour::Red.into(), 0.68),
            (CellId::CurrentColour, Colour::Green.into(), 0.71),
        ]));
        assert_eq!(second.selected, Selected::Rule(0));

        let third = unit.evaluate(&FakeCells(vec![
            (CellId::CurrentColour, Colour::Red.into(), 0.5),
            (CellId::CurrentColour, Colour::Green.into(), 0.9),
        ]));
        assert_eq!(third.selected, Selected::Rule(1));
    }

    #[test]
    fn effects_are_weighted_by_activation() {
        let cfg = SelectionConfig {
            mode: SelectionMode::WinnerTakeAll,
            ..Default::default()
        };
        let mut unit = red_unit(&cfg).with_default_effects(vec![Effect::new(
            CellId::SeenRed,
            NO,
            1.0,
        )]);
        let sel = unit.evaluate(&cc(Colour::Green, 0.95));
        let effects: Vec<Effect> = unit.weighted_effects(&sel).collect();
        assert_eq!(effects, vec![Effect::new(CellId::SeenRed, NO, 10.0)]);
    }

    #[test]
    fn blend_is_reported_only_for_close_races() {
        let mut unit = red_unit(&SelectionConfig::default());
        let sel = unit.evaluate(&cc(Colour::Red, 0.5));
        let (first, second, (a1, a2)) = unit.blend(&sel).expect("expected a blend");
        assert_ne!(first, second);
        assert!(a1 >= a2 && a2 >= 0.3);

        let mut unit = red_unit(&SelectionConfig::default());
        let sel = unit.evaluate(&cc(Colour::Red, 1.0));
        assert!(unit.blend(&sel).is_none());
    }
}
