//! Core type definitions used throughout the codebase

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{BotError, Result};

/// Game tick counter
pub type Tick = u64;

/// Board coordinate, row 0 is the top row
///
/// Ordering is row-major, which is also the scan order of every
/// full-board search.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Manhattan distance, the only metric the controller uses
    pub fn distance(&self, other: &Self) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Content of one board cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tile {
    #[default]
    Fog,
    Empty,
    Wall,
    Ally,
    Enemy,
    Gold,
    MyBase,
    EnemyBase,
    /// Occupancy grid only: claimed by a move planned this tick
    Reserved,
}

impl Tile {
    pub fn name(&self) -> &'static str {
        match self {
            Tile::Fog => "FOG",
            Tile::Empty => "EMPTY",
            Tile::Wall => "WALL",
            Tile::Ally => "ALLY",
            Tile::Enemy => "ENEMY",
            Tile::Gold => "GOLD",
            Tile::MyBase => "MY_BASE",
            Tile::EnemyBase => "ENEMY_BASE",
            Tile::Reserved => "RESERVED",
        }
    }

    /// Agents report each other at the end of a ray; these go to the
    /// occupancy grid rather than into terrain knowledge.
    pub fn is_agent(&self) -> bool {
        matches!(self, Tile::Ally | Tile::Enemy)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tile {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FOG" => Ok(Tile::Fog),
            "EMPTY" => Ok(Tile::Empty),
            "WALL" => Ok(Tile::Wall),
            "ALLY" => Ok(Tile::Ally),
            "ENEMY" => Ok(Tile::Enemy),
            "GOLD" => Ok(Tile::Gold),
            "MY_BASE" => Ok(Tile::MyBase),
            "ENEMY_BASE" => Ok(Tile::EnemyBase),
            "RESERVED" => Ok(Tile::Reserved),
            _ => Err(BotError::InvalidTile(s.to_string())),
        }
    }
}

/// Cardinal facing, cyclic in the order Up, Right, Down, Left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Facing {
    #[default]
    Up,
    Right,
    Down,
    Left,
}

impl Facing {
    pub const ALL: [Facing; 4] = [Facing::Up, Facing::Right, Facing::Down, Facing::Left];

    pub fn index(&self) -> usize {
        match self {
            Facing::Up => 0,
            Facing::Right => 1,
            Facing::Down => 2,
            Facing::Left => 3,
        }
    }

    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or_else(|| BotError::InvalidFacing(index.to_string()))
    }

    pub fn rotated_right(&self) -> Self {
        Self::ALL[(self.index() + 1) % 4]
    }

    pub fn rotated_left(&self) -> Self {
        Self::ALL[(self.index() + 3) % 4]
    }

    pub fn opposite(&self) -> Self {
        Self::ALL[(self.index() + 2) % 4]
    }

    /// Number of single rotations needed to turn from self to other (0..=2)
    pub fn turns_to(&self, other: Facing) -> usize {
        let diff = (other.index() + 4 - self.index()) % 4;
        diff.min(4 - diff) % 4
    }

    /// Facing that steps from `from` into the adjacent cell `to`
    pub fn toward(from: Cell, to: Cell) -> Option<Facing> {
        if to.col == from.col && to.row + 1 == from.row {
            Some(Facing::Up)
        } else if to.row == from.row && to.col == from.col + 1 {
            Some(Facing::Right)
        } else if to.col == from.col && to.row == from.row + 1 {
            Some(Facing::Down)
        } else if to.row == from.row && to.col + 1 == from.col {
            Some(Facing::Left)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Facing::Up => "U",
            Facing::Right => "R",
            Facing::Down => "D",
            Facing::Left => "L",
        }
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Facing {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "U" | "UP" => Ok(Facing::Up),
            "R" | "RIGHT" => Ok(Facing::Right),
            "D" | "DOWN" => Ok(Facing::Down),
            "L" | "LEFT" => Ok(Facing::Left),
            _ => Err(BotError::InvalidFacing(s.to_string())),
        }
    }
}

/// One order for one agent for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    Fire,
    Go,
    Mine,
    RotateLeft,
    RotateRight,
    RotateBack,
}

impl Command {
    /// Single rotation command turning `from` toward `to`
    ///
    /// `None` when no rotation is needed. `RotateBack` only for exactly 180°.
    pub fn turn(from: Facing, to: Facing) -> Option<Command> {
        match (to.index() + 4 - from.index()) % 4 {
            0 => None,
            1 => Some(Command::RotateRight),
            2 => Some(Command::RotateBack),
            _ => Some(Command::RotateLeft),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Fire => "FIRE",
            Command::Go => "GO",
            Command::Mine => "MINE",
            Command::RotateLeft => "LEFT",
            Command::RotateRight => "RIGHT",
            Command::RotateBack => "BACK",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Game parameters announced once before the first tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSetup {
    pub size: usize,
    /// Informational only
    pub game_length: u64,
    pub player_count: usize,
    pub my_base: Cell,
    pub enemy_bases: Vec<Cell>,
}

impl GameSetup {
    pub fn new(size: usize, game_length: u64, player_count: usize, my_base: Cell) -> Self {
        Self {
            size,
            game_length,
            player_count: player_count.max(1),
            my_base,
            enemy_bases: Vec::new(),
        }
    }

    pub fn with_enemy_bases(mut self, enemy_bases: Vec<Cell>) -> Self {
        self.enemy_bases = enemy_bases;
        self
    }
}
