//! The reducer's action vocabulary

use serde::{Deserialize, Serialize};

use crate::core::types::SpeciesId;
use crate::hex::HexKey;
use crate::level::GameResult;

/// A proposed migration onto `target`, optionally from a neighboring `source`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationAttempt {
    pub source: Option<HexKey>,
    pub target: HexKey,
    pub species: SpeciesId,
}

impl PopulationAttempt {
    pub fn new(source: Option<HexKey>, target: HexKey, species: SpeciesId) -> Self {
        Self {
            source,
            target,
            species,
        }
    }

    /// The first attempt of a game has no source tile
    pub fn is_tutorial(&self) -> bool {
        self.source.is_none()
    }
}

/// Everything that can change the app state
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    StartPopulationAttempt(PopulationAttempt),
    PopulationAttemptSuccess {
        attempt: PopulationAttempt,
        result: GameResult,
    },
    GetGameResult(GameResult),
    GameResultDone,
    NextEpoch,
    /// Buy an offered gene with free mutation points
    AcquireGene {
        species: SpeciesId,
        gene: String,
    },
    /// Branch a new species off an existing one
    Speciate {
        parent: SpeciesId,
        name: String,
    },
    /// Defer the wrapped action until the running transition ends
    TransitionStart(Box<Action>),
    TransitionEnd,
}

/// Payload-free action tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    StartPopulationAttempt,
    PopulationAttemptSuccess,
    GetGameResult,
    GameResultDone,
    NextEpoch,
    AcquireGene,
    Speciate,
    TransitionStart,
    TransitionEnd,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::StartPopulationAttempt(_) => ActionKind::StartPopulationAttempt,
            Self::PopulationAttemptSuccess { .. } => ActionKind::PopulationAttemptSuccess,
            Self::GetGameResult(_) => ActionKind::GetGameResult,
            Self::GameResultDone => ActionKind::GameResultDone,
            Self::NextEpoch => ActionKind::NextEpoch,
            Self::AcquireGene { .. } => ActionKind::AcquireGene,
            Self::Speciate { .. } => ActionKind::Speciate,
            Self::TransitionStart(_) => ActionKind::TransitionStart,
            Self::TransitionEnd => ActionKind::TransitionEnd,
        }
    }

    pub fn is_transition(&self) -> bool {
        matches!(self, Self::TransitionStart(_) | Self::TransitionEnd)
    }
}
