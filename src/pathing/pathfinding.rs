//! Breadth-first search over (cell, facing) poses
//!
//! An agent can only advance into the cell it faces, and turning costs a
//! tick just like moving. Searching poses instead of cells makes the
//! rotation cost part of the route length.

use std::collections::VecDeque;

use crate::core::error::{BotError, Result};
use crate::core::types::{Cell, Facing, Tile};
use crate::map::world_map::WorldMap;

/// Search state: where an agent stands and where it looks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pose {
    pub cell: Cell,
    pub facing: Facing,
}

impl Pose {
    pub fn new(cell: Cell, facing: Facing) -> Self {
        Self { cell, facing }
    }
}

/// The two unit-cost actions that connect poses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Advance,
    Rotate(Facing),
}

impl Edge {
    /// Advance first, then rotations in facing order
    fn outgoing(pose: Pose) -> impl Iterator<Item = Edge> {
        std::iter::once(Edge::Advance).chain(
            Facing::ALL
                .into_iter()
                .filter(move |f| *f != pose.facing)
                .map(Edge::Rotate),
        )
    }

    /// Pose reached by taking this edge, if the move is allowed
    fn follow(self, pose: Pose, map: &WorldMap, target: Cell) -> Option<Pose> {
        match self {
            Edge::Rotate(facing) => Some(Pose::new(pose.cell, facing)),
            Edge::Advance => {
                let next = map.forward_cell(pose.cell, pose.facing)?;
                if map.tile(next) == Some(Tile::Wall) {
                    return None;
                }
                if next != target && map.occupant(next) == Some(Tile::Ally) {
                    return None;
                }
                Some(Pose::new(next, pose.facing))
            }
        }
    }
}

fn state_index(map: &WorldMap, pose: Pose) -> usize {
    (pose.cell.row * map.size() + pose.cell.col) * 4 + pose.facing.index()
}

/// Shortest pose sequence from `start` to any pose on `target`
///
/// Returns `None` if start already stands on the target or the target is
/// unreachable. The sequence begins with `start`.
pub fn find_route(map: &WorldMap, start: Pose, target: Cell) -> Result<Option<Vec<Pose>>> {
    if start.cell == target || !map.in_bounds(start.cell) || !map.in_bounds(target) {
        return Ok(None);
    }

    let state_count = map.size() * map.size() * 4;
    let mut came_from: Vec<Option<Pose>> = vec![None; state_count];
    let mut visited = vec![false; state_count];
    let mut frontier = VecDeque::new();

    visited[state_index(map, start)] = true;
    frontier.push_back(start);

    while let Some(current) = frontier.pop_front() {
        if current.cell == target {
            return reconstruct_route(map, &came_from, start, current).map(Some);
        }

        for edge in Edge::outgoing(current) {
            let Some(next) = edge.follow(current, map, target) else {
                continue;
            };
            let index = state_index(map, next);
            if !visited[index] {
                visited[index] = true;
                came_from[index] = Some(current);
                frontier.push_back(next);
            }
        }
    }

    Ok(None)
}

/// Walk parent links from `end` back to `start`
fn reconstruct_route(
    map: &WorldMap,
    came_from: &[Option<Pose>],
    start: Pose,
    end: Pose,
) -> Result<Vec<Pose>> {
    let mut route = vec![end];
    let mut current = end;
    while current != start {
        match came_from[state_index(map, current)] {
            Some(prev) => {
                route.push(prev);
                current = prev;
            }
            None => {
                return Err(BotError::PathReconstruction {
                    start: start.cell,
                    target: end.cell,
                })
            }
        }
    }
    route.reverse();
    Ok(route)
}

/// First cell the agent must step into on a shortest route
pub fn next_step(map: &WorldMap, start: Pose, target: Cell) -> Result<Option<Cell>> {
    let Some(route) = find_route(map, start, target)? else {
        return Ok(None);
    };

    route
        .iter()
        .map(|pose| pose.cell)
        .find(|cell| *cell != start.cell)
        .map(Some)
        .ok_or(BotError::PathReconstruction {
            start: start.cell,
            target,
        })
}

/// Number of actions (advances and rotations) along a route
pub fn route_cost(route: &[Pose]) -> usize {
    route.len().saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_map(size: usize) -> WorldMap {
        let mut map = WorldMap::new(size, Cell::new(0, 0), &[]);
        for row in 0..size {
            for col in 0..size {
                map.set_tile(Cell::new(row, col), Tile::Empty);
            }
        }
        map
    }

    #[test]
    fn test_straight_line_when_facing() {
        let map = open_map(5);
        let start = Pose::new(Cell::new(0, 0), Facing::Right);
        let route = find_route(&map, start, Cell::new(0, 3)).unwrap().unwrap();

        assert_eq!(route.first(), Some(&start));
        assert_eq!(route.last().map(|p| p.cell), Some(Cell::new(0, 3)));
        assert_eq!(route_cost(&route), 3);
    }

    #[test]
    fn test_rotation_counts_toward_cost() {
        let map = open_map(5);
        let start = Pose::new(Cell::new(0, 0), Facing::Up);
        let route = find_route(&map, start, Cell::new(0, 3)).unwrap().unwrap();
        // one rotation then three advances
        assert_eq!(route_cost(&route), 4);
    }

    #[test]
    fn test_turn_around_costs_one_action() {
        let map = open_map(5);
        let start = Pose::new(Cell::new(2, 2), Facing::Up);
        let route = find_route(&map, start, Cell::new(3, 2)).unwrap().unwrap();
        assert_eq!(route_cost(&route), 2);
    }

    #[test]
    fn test_next_step_skips_rotations() {
        let map = open_map(5);
        let start = Pose::new(Cell::new(2, 2), Facing::Up);
        let step = next_step(&map, start, Cell::new(2, 4)).unwrap();
        assert_eq!(step, Some(Cell::new(2, 3)));
    }

    #[test]
    fn test_path_around_wall() {
        let mut map = open_map(5);
        map.set_tile(Cell::new(0, 1), Tile::Wall);
        map.set_tile(Cell::new(1, 1), Tile::Wall);

        let start = Pose::new(Cell::new(0, 0), Facing::Right);
        let route = find_route(&map, start, Cell::new(0, 2)).unwrap().unwrap();
        assert!(route.iter().all(|p| map.tile(p.cell) != Some(Tile::Wall)));
        assert_eq!(route.last().map(|p| p.cell), Some(Cell::new(0, 2)));
    }

    #[test]
    fn test_walled_off_target_has_no_route() {
        let mut map = open_map(5);
        let target = Cell::new(2, 2);
        for neighbour in map.adjacent_cells(target) {
            map.set_tile(neighbour, Tile::Wall);
        }
        let start = Pose::new(Cell::new(0, 0), Facing::Down);
        assert_eq!(find_route(&map, start, target).unwrap(), None);
        assert_eq!(next_step(&map, start, target).unwrap(), None);
    }

    #[test]
    fn test_same_start_and_target() {
        let map = open_map(5);
        let start = Pose::new(Cell::new(1, 1), Facing::Down);
        assert_eq!(find_route(&map, start, Cell::new(1, 1)).unwrap(), None);
    }

    #[test]
    fn test_fog_is_walkable() {
        let map = WorldMap::new(5, Cell::new(0, 0), &[]);
        let start = Pose::new(Cell::new(0, 0), Facing::Down);
        assert_eq!(next_step(&map, start, Cell::new(4, 0)).unwrap(), Some(Cell::new(1, 0)));
    }

    #[test]
    fn test_ally_blocks_unless_target() {
        let mut map = open_map(3);
        map.set_occupant(Cell::new(0, 1), Tile::Ally);
        let start = Pose::new(Cell::new(0, 0), Facing::Right);

        // ally in the way of a longer route forces a detour
        let step = next_step(&map, start, Cell::new(0, 2)).unwrap();
        assert_eq!(step, Some(Cell::new(1, 0)));

        // but the ally cell itself may be the target
        let step = next_step(&map, start, Cell::new(0, 1)).unwrap();
        assert_eq!(step, Some(Cell::new(0, 1)));
    }

    #[test]
    fn test_enemy_base_is_walkable() {
        let mut map = open_map(3);
        map.set_tile(Cell::new(0, 1), Tile::EnemyBase);
        let start = Pose::new(Cell::new(0, 0), Facing::Right);
        assert_eq!(next_step(&map, start, Cell::new(0, 2)).unwrap(), Some(Cell::new(0, 1)));
    }

    #[test]
    fn test_reconstruction_failure_is_reported() {
        let map = open_map(3);
        let start = Pose::new(Cell::new(0, 0), Facing::Right);
        let end = Pose::new(Cell::new(0, 2), Facing::Right);
        let came_from = vec![None; 3 * 3 * 4];
        let result = reconstruct_route(&map, &came_from, start, end);
        assert!(matches!(result, Err(BotError::PathReconstruction { .. })));
    }
}
