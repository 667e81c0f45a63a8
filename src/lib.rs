//! Grush Crusher - squad controller for a fog-of-war gold-mining grid game

pub mod agent;
pub mod ai;
pub mod core;
pub mod map;
pub mod pathing;
pub mod protocol;
pub mod sim;
