//! Session - owns the live state and wires the reducer to its surroundings
//!
//! Dispatch order: transition gate, transition middleware, core reducer,
//! then save-on-action for whitelisted effective actions.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::core::config::GameConfig;
use crate::core::error::Result;
use crate::session::clock::Clock;
use crate::session::persistence::{should_persist, PersistenceGateway};
use crate::session::storage::KeyValueStore;
use crate::session::transition::apply_transition;
use crate::state::{Action, AppState, Draft, Reducer};

pub struct Session<S: KeyValueStore, C: Clock> {
    state: AppState,
    reducer: Reducer,
    gateway: PersistenceGateway<S>,
    clock: C,
    config: GameConfig,
    /// Deadlines at which a `TransitionEnd` is owed
    timers: Vec<u64>,
    saves: Vec<JoinHandle<()>>,
}

impl<S: KeyValueStore, C: Clock> Session<S, C> {
    /// Load the saved game, or generate a new one if there is none
    pub async fn start(config: GameConfig, store: Arc<S>, clock: C) -> Result<Self> {
        config.validate()?;
        let reducer = Reducer::new(&config);
        Self::start_with_reducer(config, reducer, store, clock).await
    }

    pub async fn start_with_reducer(
        config: GameConfig,
        reducer: Reducer,
        store: Arc<S>,
        clock: C,
    ) -> Result<Self> {
        let gateway = PersistenceGateway::on_current_runtime(store, config.session.save_key.clone())?;
        let state = gateway.load_or_generate(&config).await?;
        Ok(Self {
            state,
            reducer,
            gateway,
            clock,
            config,
            timers: Vec::new(),
            saves: Vec::new(),
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn gateway(&self) -> &PersistenceGateway<S> {
        &self.gateway
    }

    pub fn dispatch(&mut self, action: Action) -> Result<&AppState> {
        if self.state.is_transitioning() && !action.is_transition() {
            tracing::warn!(kind = ?action.kind(), "rejected action: transition in progress");
            return Ok(&self.state);
        }

        let ends_transition = matches!(action, Action::TransitionEnd);
        let out = match apply_transition(
            &self.reducer,
            &self.state,
            action,
            self.clock.now_ms(),
            self.config.session.transition_ms,
        ) {
            Ok(out) => out,
            Err(e) => {
                // A replayed action that fails still consumes its transition
                if ends_transition && self.state.is_transitioning() {
                    let mut draft = Draft::new(&self.state);
                    draft.set_transition(None);
                    self.state = draft.commit();
                }
                return Err(e);
            }
        };
        self.state = out.state;

        if let Some(deadline) = out.timer {
            self.timers.push(deadline);
        }
        if out.effective.is_some_and(should_persist) {
            self.saves.retain(|h| !h.is_finished());
            if let Some(handle) = self.gateway.save(&self.state) {
                self.saves.push(handle);
            }
        }
        Ok(&self.state)
    }

    /// Fire every transition timer that is due; returns how many fired.
    ///
    /// All due timers fire even if one fails; the first failure is returned.
    pub fn poll_timers(&mut self) -> Result<usize> {
        let now = self.clock.now_ms();
        let (due, waiting): (Vec<u64>, Vec<u64>) =
            std::mem::take(&mut self.timers).into_iter().partition(|&t| t <= now);
        self.timers = waiting;

        let mut first_error = None;
        for _ in &due {
            if let Err(e) = self.dispatch(Action::TransitionEnd) {
                tracing::warn!(error = %e, "transitioned action failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(due.len()),
        }
    }

    /// Earliest outstanding timer deadline
    pub fn next_timer(&self) -> Option<u64> {
        self.timers.iter().copied().min()
    }

    /// Drop the save and start over with a freshly generated world
    pub async fn reset(&mut self) -> Result<&AppState> {
        self.flush().await;
        self.timers.clear();
        self.gateway.clear().await?;
        self.state = AppState::initial(&self.config)?;
        Ok(&self.state)
    }

    /// Wait for background saves to finish
    pub async fn flush(&mut self) {
        for handle in self.saves.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "save task failed");
            }
        }
    }
}
