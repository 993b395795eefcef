//! Session coordination: one shared auth state, throttled re-validation and
//! failure-triggered recovery.

mod coordinator;
mod state;

pub use coordinator::{SessionCoordinator, SessionSettings};
pub use state::{AuthState, AuthStateStore};
