//! App state, actions and the reducer that ties them together

pub mod action;
pub mod app_state;
pub mod draft;
pub mod reducer;

pub use action::{Action, ActionKind, PopulationAttempt};
pub use app_state::{AppState, PendingTransition, ROOT_SPECIES_NAME};
pub use draft::Draft;
pub use reducer::Reducer;
