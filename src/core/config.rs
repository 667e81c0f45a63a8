//! Controller configuration with documented constants
//!
//! Every tunable heuristic constant lives here and is passed to the
//! commander at construction. Values load from TOML; missing keys fall
//! back to the defaults below.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{BotError, Result};

/// How the seek-gold pass pairs agents with deposits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoldAssignment {
    /// Each agent heads for the gold nearest to itself
    #[default]
    Nearest,
    /// Deposits closest to base each claim their nearest free agent
    ClosestToBase,
}

/// Weights of the default-fallback command distribution
///
/// Fire is never part of the fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackWeights {
    pub go: f64,
    pub left: f64,
    pub right: f64,
    pub back: f64,
    pub mine: f64,
}

impl Default for FallbackWeights {
    fn default() -> Self {
        Self {
            go: 0.5,
            left: 0.25,
            right: 0.25,
            back: 0.0,
            mine: 0.0,
        }
    }
}

impl FallbackWeights {
    pub fn as_array(&self) -> [f64; 5] {
        [self.go, self.left, self.right, self.back, self.mine]
    }
}

/// Configuration for the squad controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    // === EXPLORATION ===
    /// Exploration keeps running while
    /// `fog_fraction * explore_weight > 1 / player_count`.
    ///
    /// At 0.4 with two players exploration never starts on its own;
    /// with four players it runs until ~62% of the board is known.
    pub explore_weight: f32,

    // === MINING ===
    /// Maximum number of agents mining or carrying gold at once
    pub miner_cap: usize,

    /// Chance that a gold seeker picks a random known deposit instead of
    /// the nearest one. Spreads agents over deposits.
    pub random_gold_chance: f64,

    /// Upper bound on agents sent after gold in a single tick
    pub seek_gold_cap: Option<usize>,

    pub gold_assignment: GoldAssignment,

    /// Opt-in: forget a known deposit when an agent mined there last tick
    /// and came away empty-handed. Only safe against a server that always
    /// sends the `has_gold`/`on_gold` flags.
    pub clear_failed_deposits: bool,

    // === CAMPING ===
    /// Fraction of the squad allowed to hold guard positions
    pub camper_fraction: f32,

    /// Expansion rounds around a guarded deposit when collecting guard candidates
    pub guard_perimeter: usize,

    /// Ticks between guard placement runs
    pub camp_interval: u64,

    // === BASE ===
    /// Radius around the own base considered "crowded"
    pub leave_perimeter: usize,

    /// Push idle agents out of the base perimeter
    pub leave_base: bool,

    /// Chance an agent leaving base wanders randomly instead of routing
    pub leave_base_wander_chance: f64,

    // === FALLBACK ===
    pub fallback: FallbackWeights,

    /// Fixed RNG seed; random when absent
    pub seed: Option<u64>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            explore_weight: 0.4,
            miner_cap: 5,
            random_gold_chance: 0.2,
            seek_gold_cap: None,
            gold_assignment: GoldAssignment::Nearest,
            clear_failed_deposits: false,
            camper_fraction: 0.4,
            guard_perimeter: 4,
            camp_interval: 25,
            leave_perimeter: 7,
            leave_base: false,
            leave_base_wander_chance: 0.15,
            fallback: FallbackWeights::default(),
            seed: None,
        }
    }
}

impl BotConfig {
    /// Parse a config from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: BotConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if !(self.explore_weight >= 0.0) {
            return Err(BotError::Config(format!(
                "explore_weight ({}) must be non-negative",
                self.explore_weight
            )));
        }

        if !(0.0..=1.0).contains(&self.camper_fraction) {
            return Err(BotError::Config(format!(
                "camper_fraction ({}) must be within [0, 1]",
                self.camper_fraction
            )));
        }

        for (name, chance) in [
            ("random_gold_chance", self.random_gold_chance),
            ("leave_base_wander_chance", self.leave_base_wander_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(BotError::Config(format!(
                    "{} ({}) must be within [0, 1]",
                    name, chance
                )));
            }
        }

        let weights = self.fallback.as_array();
        if weights.iter().any(|w| !(*w >= 0.0)) {
            return Err(BotError::Config("fallback weights must be non-negative".into()));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(BotError::Config("fallback weights must not all be zero".into()));
        }

        Ok(())
    }
}

/// Load a config from a TOML file
pub fn load_config(path: &Path) -> Result<BotConfig> {
    let contents = fs::read_to_string(path)?;
    BotConfig::from_toml_str(&contents)
}
