//! Transition middleware
//!
//! `TransitionStart(action)` parks `action` in `AppState::transition` and asks
//! for a timer. When the timer fires the caller dispatches `TransitionEnd`,
//! which clears the slot and runs the parked action through the reducer.
//! A `TransitionEnd` with nothing parked does nothing, so a doubled timer is
//! harmless.

use crate::core::error::Result;
use crate::state::{Action, ActionKind, AppState, Draft, PendingTransition, Reducer};

/// Outcome of one dispatch through the middleware
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub state: AppState,
    /// Action that actually reached the core reducer, if any
    pub effective: Option<ActionKind>,
    /// Deadline (ms) at which a `TransitionEnd` should be dispatched
    pub timer: Option<u64>,
}

impl Dispatched {
    fn unchanged(state: &AppState) -> Self {
        Self {
            state: state.clone(),
            effective: None,
            timer: None,
        }
    }
}

pub fn apply_transition(
    reducer: &Reducer,
    state: &AppState,
    action: Action,
    now_ms: u64,
    duration_ms: u64,
) -> Result<Dispatched> {
    match action {
        Action::TransitionStart(inner) => {
            if inner.is_transition() {
                tracing::warn!(kind = ?inner.kind(), "cannot defer a transition action; ignoring");
                return Ok(Dispatched::unchanged(state));
            }
            if let Some(pending) = &state.transition {
                tracing::warn!(
                    replaced = ?pending.action.kind(),
                    "transition started while another is pending; replacing it"
                );
            }

            let deadline_ms = now_ms.saturating_add(duration_ms);
            tracing::debug!(kind = ?inner.kind(), deadline_ms, "transition started");

            let mut draft = Draft::new(state);
            draft.set_transition(Some(PendingTransition {
                action: inner,
                deadline_ms,
            }));
            Ok(Dispatched {
                state: draft.commit(),
                effective: None,
                timer: Some(deadline_ms),
            })
        }
        Action::TransitionEnd => {
            let Some(pending) = state.transition.clone() else {
                tracing::debug!("transition end with nothing pending");
                return Ok(Dispatched::unchanged(state));
            };
            // A replaced transition keeps running until its own deadline
            if now_ms < pending.deadline_ms {
                tracing::debug!(now_ms, deadline_ms = pending.deadline_ms, "transition end before its deadline");
                return Ok(Dispatched::unchanged(state));
            }

            let mut draft = Draft::new(state);
            draft.set_transition(None);
            let cleared = draft.commit();

            let action = *pending.action;
            let kind = action.kind();
            let next = reducer.reduce(&cleared, action)?;
            tracing::debug!(?kind, "transition finished");
            Ok(Dispatched {
                state: next,
                effective: Some(kind),
                timer: None,
            })
        }
        action => {
            let kind = action.kind();
            Ok(Dispatched {
                state: reducer.reduce(state, action)?,
                effective: Some(kind),
                timer: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GameConfig;
    use crate::core::types::TileId;
    use crate::hex::{HexCoordinate, HexKey, HexStore};
    use crate::level::LevelInfo;
    use crate::overworld::{HexTile, OverWorld};
    use crate::species::Lineage;

    fn state() -> AppState {
        let mut tiles = HexStore::new();
        tiles.set(0, 0, HexTile::new(TileId(0), HexCoordinate::new(0, 0), LevelInfo::new(0)));
        let world = OverWorld::new(tiles, HexKey::new(0, 0)).unwrap();
        AppState::new(world, Lineage::new("Protocell"), 7)
    }

    fn reducer() -> Reducer {
        Reducer::new(&GameConfig::default())
    }

    #[test]
    fn test_start_parks_action_without_applying_it() {
        let before = state();
        let out = apply_transition(
            &reducer(),
            &before,
            Action::TransitionStart(Box::new(Action::NextEpoch)),
            100,
            600,
        )
        .unwrap();

        assert_eq!(out.timer, Some(700));
        assert_eq!(out.effective, None);
        assert_eq!(out.state.epoch, 0);
        let pending = out.state.transition.as_ref().unwrap();
        assert_eq!(*pending.action, Action::NextEpoch);
        assert_eq!(pending.deadline_ms, 700);
    }

    #[test]
    fn test_end_replays_parked_action_once() {
        let r = reducer();
        let started = apply_transition(
            &r,
            &state(),
            Action::TransitionStart(Box::new(Action::NextEpoch)),
            0,
            600,
        )
        .unwrap();

        let ended = apply_transition(&r, &started.state, Action::TransitionEnd, 600, 600).unwrap();
        assert_eq!(ended.state.epoch, 1);
        assert!(ended.state.transition.is_none());
        assert_eq!(ended.effective, Some(ActionKind::NextEpoch));

        let again = apply_transition(&r, &ended.state, Action::TransitionEnd, 601, 600).unwrap();
        assert_eq!(again.state, ended.state);
        assert_eq!(again.effective, None);
    }

    #[test]
    fn test_second_start_replaces_first() {
        let r = reducer();
        let speciate = Action::Speciate {
            parent: crate::core::types::SpeciesId(1),
            name: "Offshoot".into(),
        };
        let first = apply_transition(&r, &state(), Action::TransitionStart(Box::new(Action::NextEpoch)), 0, 10)
            .unwrap();
        let second = apply_transition(&r, &first.state, Action::TransitionStart(Box::new(speciate)), 5, 10)
            .unwrap();
        assert_eq!(second.timer, Some(15));

        // The first timer fires while the replacement is still animating
        let early = apply_transition(&r, &second.state, Action::TransitionEnd, 10, 10).unwrap();
        assert_eq!(early.state, second.state);
        assert_eq!(early.effective, None);

        let ended = apply_transition(&r, &early.state, Action::TransitionEnd, 15, 10).unwrap();
        assert_eq!(ended.state.epoch, 0);
        assert_eq!(ended.state.lineage.len(), 2);
        assert!(ended.state.transition.is_none());

        let absorbed = apply_transition(&r, &ended.state, Action::TransitionEnd, 20, 10).unwrap();
        assert_eq!(absorbed.state, ended.state);
    }

    #[test]
    fn test_nested_transition_is_ignored() {
        let before = state();
        let out = apply_transition(
            &reducer(),
            &before,
            Action::TransitionStart(Box::new(Action::TransitionEnd)),
            0,
            10,
        )
        .unwrap();
        assert_eq!(out.state, before);
        assert_eq!(out.timer, None);
    }
}
