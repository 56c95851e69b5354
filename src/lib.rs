//! Barrage: resumable AA-fire and casualty resolution.
//!
//! Exposes the board model, the host bridge, the execution stack, the
//! combat core and the fire orchestrators for use by integration tests and
//! the scenario-runner binary.

pub mod board;
pub mod bridge;
pub mod combat;
pub mod config;
pub mod error;
pub mod fire;
pub mod scenario;
pub mod stack;
