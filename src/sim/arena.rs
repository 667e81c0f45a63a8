//! Single-squad skirmish arena
//!
//! A small stand-in for the game server: seeded terrain with walls and gold
//! deposits, ray vision, and the rules for moving, turning, mining and
//! delivering gold at base. No opponents walk the board.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::agent::{Agent, Vision};
use crate::ai::SquadAI;
use crate::core::error::{BotError, Result};
use crate::core::types::{Cell, Command, Facing, GameSetup, Tick, Tile};
use crate::map::grid::Grid;

/// Cells around base kept clear of walls and gold
const BASE_CLEARANCE: usize = 2;

/// Arena generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub size: usize,
    /// Announced player count; extra bases sit in the other corners
    pub players: usize,
    pub agents: usize,
    /// Chance for each cell outside base clearance to be a wall
    pub wall_density: f64,
    pub gold_deposits: usize,
    pub gold_per_deposit: u32,
    /// Vision range limit; rays stop at walls or the edge when absent
    pub vision_range: Option<usize>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            size: 16,
            players: 2,
            agents: 4,
            wall_density: 0.12,
            gold_deposits: 10,
            gold_per_deposit: 3,
            vision_range: None,
        }
    }
}

impl ArenaConfig {
    pub fn validate(&self) -> Result<()> {
        if self.size < 4 {
            return Err(BotError::Config(format!("arena size ({}) must be at least 4", self.size)));
        }
        if !(1..=4).contains(&self.players) {
            return Err(BotError::Config(format!(
                "arena players ({}) must be within 1..=4",
                self.players
            )));
        }
        if self.agents == 0 {
            return Err(BotError::Config("arena needs at least one agent".into()));
        }
        if !(0.0..1.0).contains(&self.wall_density) {
            return Err(BotError::Config(format!(
                "wall_density ({}) must be within [0, 1)",
                self.wall_density
            )));
        }
        if self.gold_per_deposit == 0 {
            return Err(BotError::Config("gold_per_deposit must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArenaAgent {
    pub cell: Cell,
    pub facing: Facing,
    pub has_gold: bool,
}

/// Summary of one controller run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub ticks: Tick,
    pub gold_delivered: u32,
    pub gold_remaining: u32,
    pub failed_ticks: u64,
    pub command_counts: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arena {
    config: ArenaConfig,
    terrain: Grid<Tile>,
    gold: Grid<u32>,
    base: Cell,
    enemy_bases: Vec<Cell>,
    agents: Vec<ArenaAgent>,
    delivered: u32,
    tick: Tick,
}

impl Arena {
    /// Generate a seeded arena; the own base is the top-left corner
    pub fn generate(config: ArenaConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let size = config.size;
        let last = size - 1;

        let base = Cell::new(0, 0);
        let enemy_bases: Vec<Cell> = [Cell::new(last, last), Cell::new(0, last), Cell::new(last, 0)]
            .into_iter()
            .take(config.players - 1)
            .collect();

        let mut terrain = Grid::new(size);
        terrain.fill(Tile::Empty);
        terrain.set(base, Tile::MyBase);
        for &enemy in &enemy_bases {
            terrain.set(enemy, Tile::EnemyBase);
        }

        let far_cells: Vec<Cell> = terrain
            .iter()
            .filter(|(cell, tile)| **tile == Tile::Empty && cell.distance(&base) > BASE_CLEARANCE)
            .map(|(cell, _)| cell)
            .collect();
        for &cell in &far_cells {
            if rng.gen_bool(config.wall_density) {
                terrain.set(cell, Tile::Wall);
            }
        }

        let mut open: Vec<Cell> = far_cells
            .into_iter()
            .filter(|cell| terrain.get(*cell) == Some(&Tile::Empty))
            .collect();
        open.shuffle(&mut rng);
        let mut gold = Grid::new(size);
        for &cell in open.iter().take(config.gold_deposits) {
            terrain.set(cell, Tile::Gold);
            gold.set(cell, config.gold_per_deposit);
        }

        let mut spawn: Vec<Cell> = terrain
            .iter()
            .filter(|(_, tile)| matches!(tile, Tile::Empty | Tile::MyBase))
            .map(|(cell, _)| cell)
            .collect();
        spawn.sort_by_key(|cell| (cell.distance(&base), *cell));
        if spawn.len() < config.agents {
            return Err(BotError::Config(format!(
                "only {} open cells for {} agents",
                spawn.len(),
                config.agents
            )));
        }
        let agents = spawn
            .into_iter()
            .take(config.agents)
            .map(|cell| ArenaAgent {
                cell,
                facing: Facing::ALL[rng.gen_range(0..Facing::ALL.len())],
                has_gold: false,
            })
            .collect();

        debug!("generated {}x{} arena from seed {}", size, size, seed);

        Ok(Self {
            config,
            terrain,
            gold,
            base,
            enemy_bases,
            agents,
            delivered: 0,
            tick: 0,
        })
    }

    /// Parameters as the server would announce them
    pub fn setup(&self, game_length: Tick) -> GameSetup {
        GameSetup::new(self.config.size, game_length, self.config.players, self.base)
            .with_enemy_bases(self.enemy_bases.clone())
    }

    pub fn base(&self) -> Cell {
        self.base
    }

    pub fn agents(&self) -> &[ArenaAgent] {
        &self.agents
    }

    pub fn tile(&self, cell: Cell) -> Option<Tile> {
        self.terrain.get(cell).copied()
    }

    pub fn delivered(&self) -> u32 {
        self.delivered
    }

    pub fn gold_remaining(&self) -> u32 {
        self.gold.iter().map(|(_, amount)| *amount).sum()
    }

    fn forward(&self, cell: Cell, facing: Facing) -> Option<Cell> {
        let next = match facing {
            Facing::Up => Cell::new(cell.row.checked_sub(1)?, cell.col),
            Facing::Right => Cell::new(cell.row, cell.col + 1),
            Facing::Down => Cell::new(cell.row + 1, cell.col),
            Facing::Left => Cell::new(cell.row, cell.col.checked_sub(1)?),
        };
        self.terrain.in_bounds(next).then_some(next)
    }

    fn agent_at(&self, cell: Cell) -> bool {
        self.agents.iter().any(|agent| agent.cell == cell)
    }

    /// What the agent at `index` sees down its facing
    ///
    /// The first non-empty cell ends the ray. An unobstructed ray reports
    /// the last cell before the edge as empty, or fog at the range limit.
    fn look(&self, index: usize) -> Vision {
        let agent = &self.agents[index];
        let range = self.config.vision_range.unwrap_or(usize::MAX);
        let mut current = agent.cell;
        let mut distance = 0;

        loop {
            if distance == range {
                return Vision::new(Tile::Fog, distance);
            }
            let Some(next) = self.forward(current, agent.facing) else {
                return Vision::new(Tile::Empty, distance);
            };
            distance += 1;

            if self.agent_at(next) {
                return Vision::new(Tile::Ally, distance);
            }
            match self.tile(next) {
                Some(Tile::Empty) | None => current = next,
                Some(tile) => return Vision::new(tile, distance),
            }
        }
    }

    /// This tick's roster as the controller receives it
    pub fn observe(&self) -> Vec<Agent> {
        self.agents
            .iter()
            .enumerate()
            .map(|(i, agent)| {
                Agent::new(agent.cell, agent.facing, self.look(i))
                    .carrying(agent.has_gold)
                    .standing_on_gold(self.tile(agent.cell) == Some(Tile::Gold))
            })
            .collect()
    }

    /// Resolve one command per agent, in roster order
    pub fn apply(&mut self, commands: &[Command]) -> Result<()> {
        if commands.len() != self.agents.len() {
            return Err(BotError::Protocol(format!(
                "expected {} commands, got {}",
                self.agents.len(),
                commands.len()
            )));
        }

        for (i, &command) in commands.iter().enumerate() {
            let agent = self.agents[i];
            match command {
                Command::Go => {
                    let target = self
                        .forward(agent.cell, agent.facing)
                        .filter(|cell| self.tile(*cell) != Some(Tile::Wall) && !self.agent_at(*cell));
                    if let Some(cell) = target {
                        self.agents[i].cell = cell;
                    }
                }
                Command::RotateLeft => self.agents[i].facing = agent.facing.rotated_left(),
                Command::RotateRight => self.agents[i].facing = agent.facing.rotated_right(),
                Command::RotateBack => self.agents[i].facing = agent.facing.opposite(),
                Command::Mine => {
                    if !agent.has_gold {
                        self.mine(i);
                    }
                }
                // nobody to hit
                Command::Fire => {}
            }

            let agent = &mut self.agents[i];
            if agent.has_gold && agent.cell == self.base {
                agent.has_gold = false;
                self.delivered += 1;
                debug!("tick {}: gold delivered, {} total", self.tick, self.delivered);
            }
        }

        self.tick += 1;
        Ok(())
    }

    fn mine(&mut self, index: usize) {
        let cell = self.agents[index].cell;
        let Some(amount) = self.gold.get_mut(cell) else {
            return;
        };
        if *amount == 0 {
            return;
        }

        *amount -= 1;
        if *amount == 0 {
            self.terrain.set(cell, Tile::Empty);
        }
        self.agents[index].has_gold = true;
    }

    /// Drive a controller for `ticks` ticks
    ///
    /// Failed decisions are logged and the tick passes with no moves.
    pub fn run<A: SquadAI>(&mut self, ai: &mut A, ticks: Tick) -> RunStats {
        let mut stats = RunStats::default();

        for _ in 0..ticks {
            ai.update(self.observe());
            let outcome = ai.decide().and_then(|commands| {
                for command in &commands {
                    *stats.command_counts.entry(command.name().to_string()).or_insert(0) += 1;
                }
                self.apply(&commands)
            });
            if let Err(e) = outcome {
                error!("tick {} failed: {}", self.tick, e);
                stats.failed_ticks += 1;
                self.tick += 1;
            }
            stats.ticks += 1;
        }

        stats.gold_delivered = self.delivered;
        stats.gold_remaining = self.gold_remaining();
        stats
    }
}
