//! Fog-of-war world model
//!
//! Two co-dimensioned grids: the world grid holds long-lived terrain
//! knowledge and is only ever overwritten by fresher ray observations;
//! the occupancy grid holds this tick's agent positions and move
//! reservations and is rebuilt from scratch every tick.

use tracing::trace;

use crate::agent::Agent;
use crate::core::types::{Cell, Facing, Tile};
use crate::map::grid::Grid;

#[derive(Debug, Clone)]
pub struct WorldMap {
    board: Grid<Tile>,
    occupancy: Grid<Tile>,
    my_base: Cell,
}

impl WorldMap {
    /// All fog, except the known base cells
    pub fn new(size: usize, my_base: Cell, enemy_bases: &[Cell]) -> Self {
        let mut board = Grid::new(size);
        board.set(my_base, Tile::MyBase);
        for &base in enemy_bases {
            board.set(base, Tile::EnemyBase);
        }

        let mut occupancy = Grid::new(size);
        occupancy.fill(Tile::Empty);

        Self {
            board,
            occupancy,
            my_base,
        }
    }

    pub fn size(&self) -> usize {
        self.board.size
    }

    pub fn my_base(&self) -> Cell {
        self.my_base
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        self.board.in_bounds(cell)
    }

    /// World-grid knowledge; `None` off the board
    pub fn tile(&self, cell: Cell) -> Option<Tile> {
        self.board.get(cell).copied()
    }

    pub fn set_tile(&mut self, cell: Cell, tile: Tile) {
        self.board.set(cell, tile);
    }

    /// Occupancy-grid content; `None` off the board
    pub fn occupant(&self, cell: Cell) -> Option<Tile> {
        self.occupancy.get(cell).copied()
    }

    pub fn set_occupant(&mut self, cell: Cell, tile: Tile) {
        self.occupancy.set(cell, tile);
    }

    /// Nobody stands on or has claimed this cell this tick
    pub fn is_free(&self, cell: Cell) -> bool {
        self.occupant(cell) == Some(Tile::Empty)
    }

    /// Claim a cell for a move planned this tick
    pub fn reserve(&mut self, cell: Cell) {
        self.occupancy.set(cell, Tile::Reserved);
    }

    /// Cells left before the board edge along `facing`
    pub fn edge_distance(&self, cell: Cell, facing: Facing) -> usize {
        let last = self.size().saturating_sub(1);
        match facing {
            Facing::Up => cell.row,
            Facing::Right => last.saturating_sub(cell.col),
            Facing::Down => last.saturating_sub(cell.row),
            Facing::Left => cell.col,
        }
    }

    pub fn forward_cell(&self, cell: Cell, facing: Facing) -> Option<Cell> {
        let next = match facing {
            Facing::Up => Cell::new(cell.row.checked_sub(1)?, cell.col),
            Facing::Right => Cell::new(cell.row, cell.col.checked_add(1)?),
            Facing::Down => Cell::new(cell.row.checked_add(1)?, cell.col),
            Facing::Left => Cell::new(cell.row, cell.col.checked_sub(1)?),
        };
        self.in_bounds(next).then_some(next)
    }

    /// Cells along a ray from `origin` (exclusive)
    ///
    /// Without `max_distance` the ray runs to the board edge. Longer
    /// requests are clipped to the edge. Empty from an off-board origin.
    pub fn ray_cast(&self, origin: Cell, facing: Facing, max_distance: Option<usize>) -> Vec<Cell> {
        if !self.in_bounds(origin) {
            return Vec::new();
        }
        let edge = self.edge_distance(origin, facing);
        let length = max_distance.map_or(edge, |d| d.min(edge));

        let mut cells = Vec::with_capacity(length);
        let mut current = origin;
        for _ in 0..length {
            match self.forward_cell(current, facing) {
                Some(next) => {
                    cells.push(next);
                    current = next;
                }
                None => break,
            }
        }
        cells
    }

    /// Ray cells paired with their world-grid tiles
    pub fn ray(&self, origin: Cell, facing: Facing, max_distance: Option<usize>) -> Vec<(Cell, Tile)> {
        self.ray_cast(origin, facing, max_distance)
            .into_iter()
            .map(|cell| (cell, self.tile(cell).unwrap_or(Tile::Wall)))
            .collect()
    }

    /// Fold one agent's ray report into the grids
    ///
    /// Everything short of the reported endpoint is taken as confirmed
    /// empty. Agent sightings at the endpoint go to the occupancy grid.
    pub fn ingest_observation(&mut self, agent: &Agent) {
        if self.tile(agent.cell) == Some(Tile::Fog) {
            self.board.set(agent.cell, Tile::Empty);
        }

        let line = self.ray_cast(agent.cell, agent.facing, Some(agent.vision.distance));
        let Some((&terminal, clear)) = line.split_last() else {
            return;
        };

        for &cell in clear {
            self.board.set(cell, Tile::Empty);
        }

        if agent.vision.tile.is_agent() {
            self.occupancy.set(terminal, agent.vision.tile);
            if self.tile(terminal) == Some(Tile::Fog) {
                self.board.set(terminal, Tile::Empty);
            }
        } else {
            self.board.set(terminal, agent.vision.tile);
        }

        trace!(
            "ingested ray from {} facing {}: {} clear, {} at {}",
            agent.cell,
            agent.facing,
            clear.len(),
            agent.vision.tile,
            terminal
        );
    }

    /// Reset occupancy to the current roster
    pub fn rebuild_occupancy(&mut self, agents: &[Agent]) {
        self.occupancy.fill(Tile::Empty);
        for agent in agents {
            self.occupancy.set(agent.cell, Tile::Ally);
        }
    }

    /// Per-tick ingestion of the whole roster
    pub fn update(&mut self, agents: &[Agent]) {
        self.rebuild_occupancy(agents);
        for agent in agents {
            self.ingest_observation(agent);
        }
    }

    /// Nearest world-grid match by Manhattan distance
    ///
    /// Ties resolve to the first match in row-major order. `None` when no
    /// cell holds `tile`.
    pub fn find_nearest(&self, origin: Cell, tile: Tile) -> Option<(Cell, usize)> {
        let mut best: Option<(Cell, usize)> = None;
        for (cell, &value) in self.board.iter() {
            if value != tile {
                continue;
            }
            let distance = origin.distance(&cell);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((cell, distance));
            }
        }
        best
    }

    /// Every world-grid cell holding `tile`, row-major
    pub fn find_all(&self, tile: Tile) -> Vec<Cell> {
        self.board
            .iter()
            .filter(|(_, &value)| value == tile)
            .map(|(cell, _)| cell)
            .collect()
    }

    pub fn count(&self, tile: Tile) -> usize {
        self.board.iter().filter(|(_, &value)| value == tile).count()
    }

    /// Share of the board still unknown
    pub fn fog_fraction(&self) -> f32 {
        let total = self.board.cell_count();
        if total == 0 {
            return 0.0;
        }
        self.count(Tile::Fog) as f32 / total as f32
    }

    /// Up to four neighbours, clipped to the board (up, down, left, right)
    pub fn adjacent_cells(&self, cell: Cell) -> Vec<Cell> {
        let mut adjacent = Vec::with_capacity(4);
        if !self.in_bounds(cell) {
            return adjacent;
        }
        if cell.row > 0 {
            adjacent.push(Cell::new(cell.row - 1, cell.col));
        }
        if cell.row < self.size().saturating_sub(1) {
            adjacent.push(Cell::new(cell.row + 1, cell.col));
        }
        if cell.col > 0 {
            adjacent.push(Cell::new(cell.row, cell.col - 1));
        }
        if cell.col < self.size().saturating_sub(1) {
            adjacent.push(Cell::new(cell.row, cell.col + 1));
        }
        adjacent
    }
}
