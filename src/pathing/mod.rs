//! Route finding for agents that must turn before they move

pub mod pathfinding;

pub use pathfinding::{find_route, next_step, route_cost, Pose};
