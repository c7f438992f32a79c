//! Tournament domain types.
//!
//! Defines tournament/score/prize state, the error taxonomy and constants used by the execution
//! layer and the node.

mod config;
mod constants;
mod errors;
mod leaderboard;
pub mod prize;
mod state;

pub use config::*;
pub use constants::*;
pub use errors::*;
pub use leaderboard::*;
pub use prize::{PayoutCurve, PrizeAward, PrizeDistribution, PrizePreview, PrizeSettings};
pub use state::*;

/// Identifier allocated by the store when a tournament is created.
pub type TournamentId = u64;

/// Opaque participant identifier supplied by the caller.
pub type ParticipantId = String;

#[cfg(test)]
mod tests;
