//! Guard placement around a contested deposit
//!
//! Scores candidate cells near a target by what they can see, how much
//! wall cover they have, and how far they sit from the target.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::types::{Cell, Facing, Tile};
use crate::map::world_map::WorldMap;

/// Weight of one wall-covered side relative to one cell of vision
pub const COVER_WEIGHT: i64 = 3;

/// A guard post: stand here, look this way
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampAssignment {
    pub cell: Cell,
    pub facing: Facing,
}

/// Facings pointing away from the own base's quadrant, toward the middle
pub fn preferred_facings(base: Cell, size: usize) -> [Facing; 2] {
    let vertical = if base.row < size / 2 { Facing::Down } else { Facing::Up };
    let horizontal = if base.col < size / 2 { Facing::Right } else { Facing::Left };
    [vertical, horizontal]
}

/// Known gold deposit furthest from `base`
pub fn camp_target(map: &WorldMap, base: Cell) -> Option<Cell> {
    let mut best: Option<(Cell, usize)> = None;
    for gold in map.find_all(Tile::Gold) {
        if gold == base {
            continue;
        }
        let distance = gold.distance(&base);
        if best.map_or(true, |(_, d)| distance > d) {
            best = Some((gold, distance));
        }
    }
    best.map(|(cell, _)| cell)
}

/// Cells watched along a ray: stops before a wall, stops after gold
pub fn vision_length(map: &WorldMap, cell: Cell, facing: Facing) -> usize {
    let mut vision = 0;
    for (_, tile) in map.ray(cell, facing, None) {
        if tile == Tile::Wall {
            break;
        }
        vision += 1;
        if tile == Tile::Gold {
            break;
        }
    }
    vision
}

/// Wall-adjacent sides of a cell
pub fn cover(map: &WorldMap, cell: Cell) -> usize {
    map.adjacent_cells(cell)
        .into_iter()
        .filter(|c| map.tile(*c) == Some(Tile::Wall))
        .count()
}

/// Guard score of `cell` looking along `facing`
///
/// A cell that sees nothing scores zero regardless of cover.
pub fn score_candidate(map: &WorldMap, cell: Cell, facing: Facing, target: Cell) -> i64 {
    let vision = vision_length(map, cell, facing) as i64;
    if vision == 0 {
        return 0;
    }
    vision + COVER_WEIGHT * cover(map, cell) as i64 - cell.distance(&target) as i64
}

/// Neighbourhood of `target` grown by `perimeter` rounds, target and
/// walls excluded
fn candidate_cells(map: &WorldMap, target: Cell, perimeter: usize) -> BTreeSet<Cell> {
    let mut considered = BTreeSet::from([target]);
    for _ in 0..perimeter {
        let frontier: Vec<Cell> = considered
            .iter()
            .flat_map(|cell| map.adjacent_cells(*cell))
            .collect();
        considered.extend(frontier);
    }
    considered.remove(&target);
    considered.retain(|cell| map.tile(*cell) != Some(Tile::Wall));
    considered
}

/// At most one guard post per facing around `target`
///
/// Each pick removes itself and every cell on its own ray from the pool,
/// so later facings do not watch the same line.
pub fn guard_locations(
    map: &WorldMap,
    target: Cell,
    facings: &[Facing],
    perimeter: usize,
) -> Vec<CampAssignment> {
    let mut pool = candidate_cells(map, target, perimeter);
    let mut result = Vec::with_capacity(facings.len());

    for &facing in facings {
        let mut best: Option<(Cell, i64)> = None;
        for &cell in &pool {
            let score = score_candidate(map, cell, facing, target);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((cell, score));
            }
        }

        let Some((cell, _)) = best else {
            continue;
        };
        result.push(CampAssignment { cell, facing });
        pool.remove(&cell);
        for watched in map.ray_cast(cell, facing, None) {
            pool.remove(&watched);
        }
    }

    result
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
    fn test_preferred_facings_by_quadrant() {
        assert_eq!(preferred_facings(Cell::new(0, 0), 10), [Facing::Down, Facing::Right]);
        assert_eq!(preferred_facings(Cell::new(9, 9), 10), [Facing::Up, Facing::Left]);
        assert_eq!(preferred_facings(Cell::new(2, 8), 10), [Facing::Down, Facing::Left]);
    }

    #[test]
    fn test_vision_stops_before_wall_and_after_gold() {
        let mut map = open_map(6);
        map.set_tile(Cell::new(0, 3), Tile::Wall);
        assert_eq!(vision_length(&map, Cell::new(0, 0), Facing::Right), 2);

        map.set_tile(Cell::new(2, 2), Tile::Gold);
        assert_eq!(vision_length(&map, Cell::new(2, 0), Facing::Right), 2);
        assert_eq!(vision_length(&map, Cell::new(5, 5), Facing::Down), 0);
    }

    #[test]
    fn test_cover_counts_wall_neighbours() {
        let mut map = open_map(5);
        map.set_tile(Cell::new(1, 2), Tile::Wall);
        map.set_tile(Cell::new(2, 1), Tile::Wall);
        assert_eq!(cover(&map, Cell::new(2, 2)), 2);
        assert_eq!(cover(&map, Cell::new(4, 4)), 0);
    }

    #[test]
    fn test_blind_candidate_scores_zero() {
        let mut map = open_map(5);
        map.set_tile(Cell::new(1, 2), Tile::Wall);
        map.set_tile(Cell::new(2, 1), Tile::Wall);
        // facing straight into a wall
        assert_eq!(score_candidate(&map, Cell::new(2, 2), Facing::Up, Cell::new(4, 4)), 0);
    }

    #[test]
    fn test_score_formula() {
        let mut map = open_map(6);
        map.set_tile(Cell::new(2, 1), Tile::Wall);
        // vision 3 to the right, one wall side, distance 2 from target
        let score = score_candidate(&map, Cell::new(2, 2), Facing::Right, Cell::new(3, 3));
        assert_eq!(score, 3 + COVER_WEIGHT - 2);
    }

    #[test]
    fn test_candidates_exclude_target() {
        let map = open_map(7);
        let pool = candidate_cells(&map, Cell::new(3, 3), 1);
        assert_eq!(pool.len(), 4);
        assert!(!pool.contains(&Cell::new(3, 3)));

        let pool = candidate_cells(&map, Cell::new(3, 3), 2);
        assert_eq!(pool.len(), 12);
    }

    #[test]
    fn test_guard_locations_one_per_facing() {
        let map = open_map(9);
        let camps = guard_locations(&map, Cell::new(4, 4), &[Facing::Down, Facing::Right], 2);
        assert_eq!(camps.len(), 2);
        assert_eq!(camps[0].facing, Facing::Down);
        assert_eq!(camps[1].facing, Facing::Right);
        assert_ne!(camps[0].cell, camps[1].cell);
    }

    #[test]
    fn test_second_pick_avoids_first_ray() {
        let map = open_map(9);
        let camps = guard_locations(&map, Cell::new(4, 4), &[Facing::Down, Facing::Down], 2);
        assert_eq!(camps.len(), 2);
        let first_ray = map.ray_cast(camps[0].cell, Facing::Down, None);
        assert!(!first_ray.contains(&camps[1].cell));
    }

    #[test]
    fn test_guard_prefers_cover() {
        let mut map = open_map(9);
        // a walled nook one step left of the target
        map.set_tile(Cell::new(3, 3), Tile::Wall);
        map.set_tile(Cell::new(4, 2), Tile::Wall);
        let camps = guard_locations(&map, Cell::new(4, 4), &[Facing::Down], 2);
        assert_eq!(camps[0].cell, Cell::new(4, 3));
    }

    #[test]
    fn test_camp_target_is_furthest_gold() {
        let mut map = open_map(8);
        map.set_tile(Cell::new(1, 1), Tile::Gold);
        map.set_tile(Cell::new(6, 5), Tile::Gold);
        map.set_tile(Cell::new(3, 3), Tile::Gold);
        assert_eq!(camp_target(&map, Cell::new(0, 0)), Some(Cell::new(6, 5)));
        assert_eq!(camp_target(&open_map(4), Cell::new(0, 0)), None);
    }
}
