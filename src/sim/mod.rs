//! Local arena for running the controller without a game server

pub mod arena;

pub use arena::{Arena, ArenaAgent, ArenaConfig, RunStats};
