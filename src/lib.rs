//! Pilot-side control for a small camera drone: arbitrates pilot input into
//! flight commands, polls video and telemetry on timers, and advises which
//! way to fly to centre the largest detected sign.

pub mod bridge;
pub mod config;
pub mod error;
pub mod guidance;
pub mod link;
pub mod sim;
pub mod state;
pub mod tasks;
