pub mod config;
pub mod error;
pub mod types;

pub use config::{load_config, BotConfig, FallbackWeights, GoldAssignment};
pub use error::{BotError, Result};
pub use types::{Cell, Command, Facing, GameSetup, Tick, Tile};
