//! Errors and recoverable warnings.
//!
//! The only hard failure of the counting network is a configuration that
//! cannot be built. Everything that goes wrong while the network runs is a
//! [`Warning`]: it is counted in diagnostics, logged, and corrected by the
//! dynamics themselves on later steps.

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::network::CellId;
use crate::selection::Selected;
use crate::symbols::Symbol;

#[derive(Debug, thiserror::Error)]
pub enum CritterError {
    /// The requested network cannot be constructed (vocabulary does not fit
    /// the dimension, invalid time constants, ...).
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    #[error(transparent)]
    World(#[from] critter_world::MapError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CritterError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        CritterError::Configuration {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CritterError>;

/// Non-fatal conditions observed during a step.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Warning {
    /// A cell's best cleanup match fell below the confidence floor, so the
    /// cell decayed instead of snapping to a symbol; or a colour sample sat
    /// too close to two references, so the colour cell was driven weakly.
    ///
    /// `similarity` is the cleanup similarity for a cell and the percept
    /// confidence in `[0, 1)` for a sample.
    AmbiguousPerception {
        cell: CellId,
        best: Symbol,
        similarity: f32,
    },
    /// Two rules of one action-selection unit were strongly active at once and
    /// their effects were blended.
    ImpossibleConditionState {
        unit: &'static str,
        first: Selected,
        second: Selected,
        activations: (f32, f32),
    },
}
