//! Common types used throughout podium.
//!
//! Defines tournament, score, prize and event types plus the pure prize calculator used by the
//! execution layer and the node.

pub mod events;
pub mod tournament;

pub use events::Event;
pub use tournament::*;
