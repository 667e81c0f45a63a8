//! Board representation: generic grid storage and the fog-of-war world model

pub mod grid;
pub mod world_map;

pub use grid::Grid;
pub use world_map::WorldMap;
