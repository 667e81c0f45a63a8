//! Per-tick agent snapshot
//!
//! Agents have no identity across ticks: the roster is rebuilt from input
//! every tick and position in the roster is the only handle.

use serde::{Deserialize, Serialize};

use crate::core::error::{BotError, Result};
use crate::core::types::{Cell, Command, Facing, Tile};

/// What an agent sees at the far end of its ray
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vision {
    pub tile: Tile,
    pub distance: usize,
}

impl Vision {
    pub fn new(tile: Tile, distance: usize) -> Self {
        Self { tile, distance }
    }

    /// A ray that reports nothing
    pub fn blind() -> Self {
        Self::new(Tile::Empty, 0)
    }
}

/// One controlled agent as reported this tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub cell: Cell,
    pub facing: Facing,
    pub vision: Vision,
    pub has_gold: bool,
    pub on_gold: bool,
}

impl Agent {
    pub fn new(cell: Cell, facing: Facing, vision: Vision) -> Self {
        Self {
            cell,
            facing,
            vision,
            has_gold: false,
            on_gold: false,
        }
    }

    pub fn carrying(mut self, has_gold: bool) -> Self {
        self.has_gold = has_gold;
        self
    }

    pub fn standing_on_gold(mut self, on_gold: bool) -> Self {
        self.on_gold = on_gold;
        self
    }

    /// Rotation needed to face `target`, `None` if already facing it
    pub fn turn_towards(&self, target: Facing) -> Option<Command> {
        Command::turn(self.facing, target)
    }

    /// Facing required to step into the adjacent cell `step`
    pub fn facing_for_step(&self, step: Cell) -> Result<Facing> {
        Facing::toward(self.cell, step).ok_or(BotError::NonAdjacentStep {
            from: self.cell,
            step,
        })
    }
}
