//! Box and team registry.
//!
//! [`AddressRegistry`] is the single owner of per-box [`BoxState`] and
//! per-team [`Team`] data for one quiz session.

mod box_state;
#[allow(clippy::module_inception)]
mod registry;
mod roster;
mod team;

pub use box_state::{BoxState, ConnectionStatus, SignalLevel};
pub use registry::AddressRegistry;
pub use roster::{RosterEntry, RosterProvider};
pub use team::Team;
