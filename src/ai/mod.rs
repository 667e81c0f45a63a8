//! Squad decision making
//!
//! Architecture: Trait + Data hybrid
//! - SquadAI trait defines the per-tick interface the game loop drives
//! - BotConfig holds TOML-loaded weights and caps
//! - SquadCommander runs the ordered heuristic passes

pub mod camp;
pub mod commander;
pub mod routing;

pub use camp::{guard_locations, score_candidate, CampAssignment};
pub use commander::SquadCommander;
pub use routing::route;

use crate::agent::Agent;
use crate::core::config::BotConfig;
use crate::core::error::Result;
use crate::core::types::Command;

/// Trait for squad controller implementations
pub trait SquadAI {
    /// Ingest this tick's roster; call once per tick before `decide`
    fn update(&mut self, agents: Vec<Agent>);

    /// One command per agent, in roster order
    fn decide(&mut self) -> Result<Vec<Command>>;

    /// Get the active configuration
    fn config(&self) -> &BotConfig;
}
