use hashbrown::HashMap;
#[cfg(feature = "serde")]
use serde::Serialize;

use crate::error::Warning;
use crate::network::{CellId, Critter, Diagnostics};
use crate::symbols::{Colour, Symbol};

/// The critter's state after its last step, copied out.
///
/// `cells` lists every memory cell in [`CellId::all`] order as
/// `(name, nearest symbol, similarity)`. `counts` and `pulses` always carry all
/// five counted colours. `last_warnings` is empty unless the critter was
/// stepped with observer telemetry on.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CritterSnapshot {
    pub age_steps: u64,
    pub time: f32,
    pub diagnostics: Diagnostics,

    pub cells: Vec<(String, Symbol, f32)>,
    pub counts: HashMap<Colour, f32>,
    pub pulses: HashMap<Colour, u32>,
    pub last_warnings: Vec<Warning>,
}

impl CritterSnapshot {
    /// Counted colours ordered by current counter value, largest first.
    pub fn ranking(&self) -> Vec<(Colour, f32)> {
        let mut v: Vec<(Colour, f32)> = self.counts.iter().map(|(&c, &x)| (c, x)).collect();
        v.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        v
    }
}

pub struct CritterAdapter<'a> {
    critter: &'a Critter,
}

impl<'a> CritterAdapter<'a> {
    pub fn new(critter: &'a Critter) -> Self {
        Self { critter }
    }

    pub fn snapshot(&self) -> CritterSnapshot {
        CritterSnapshot {
            age_steps: self.critter.age_steps(),
            time: self.critter.time(),
            diagnostics: self.critter.diagnostics(),

            cells: CellId::all()
                .filter_map(|id| {
                    let (sym, sim) = self.critter.read_cell(id)?;
                    Some((id.name(), sym, sim))
                })
                .collect(),
            counts: self.critter.counts(),
            pulses: self.critter.pulse_counts(),
            last_warnings: self.critter.last_warnings().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CritterConfig;
    use crate::network::SensoryInput;
    use crate::perception::REFERENCE_RGB;

    #[test]
    fn snapshot_reflects_state_without_mutating() {
        let mut c = Critter::new(CritterConfig::default()).unwrap();
        c.set_observer_telemetry(true);
        c.step(&SensoryInput::current(REFERENCE_RGB[Colour::Red.index()]));

        let a = CritterAdapter::new(&c).snapshot();
        let b = CritterAdapter::new(&c).snapshot();
        assert_eq!(a.age_steps, 1);
        assert_eq!(a.age_steps, b.age_steps);
        assert_eq!(a.cells.len(), 8);
        assert_eq!(a.cells[1].0, "seen_red");
        assert_eq!(a.counts.len(), 5);
        assert!(!a.last_warnings.is_empty());
        assert_eq!(a.ranking().len(), 5);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn snapshot_serializes_counts_by_colour() {
        let c = Critter::new(CritterConfig::default()).unwrap();
        let snap = CritterAdapter::new(&c).snapshot();
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["counts"]["Green"], 0.0);
        assert_eq!(json["age_steps"], 0);
    }
}
