//! Dense square grid addressed by `Cell`

use crate::core::types::Cell;

/// Square grid stored row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T: Clone + Default> {
    pub size: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            data: vec![T::default(); size * size],
        }
    }

    #[inline]
    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.row < self.size && cell.col < self.size
    }

    #[inline]
    pub fn index(&self, cell: Cell) -> Option<usize> {
        self.in_bounds(cell).then(|| cell.row * self.size + cell.col)
    }

    #[inline]
    pub fn get(&self, cell: Cell) -> Option<&T> {
        self.index(cell).map(|i| &self.data[i])
    }

    #[inline]
    pub fn get_mut(&mut self, cell: Cell) -> Option<&mut T> {
        let i = self.index(cell)?;
        Some(&mut self.data[i])
    }

    /// Out-of-bounds writes are ignored
    #[inline]
    pub fn set(&mut self, cell: Cell, value: T) {
        if let Some(slot) = self.get_mut(cell) {
            *slot = value;
        }
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// All cells with their values, row-major
    pub fn iter(&self) -> impl Iterator<Item = (Cell, &T)> + '_ {
        let size = self.size;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, value)| (Cell::new(i / size, i % size), value))
    }

    pub fn cell_count(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_get_set() {
        let mut grid: Grid<u8> = Grid::new(4);
        grid.set(Cell::new(1, 2), 7);
        assert_eq!(grid.get(Cell::new(1, 2)), Some(&7));
        assert_eq!(grid.get(Cell::new(2, 1)), Some(&0));
    }

    #[test]
    fn test_grid_out_of_bounds() {
        let mut grid: Grid<u8> = Grid::new(3);
        assert_eq!(grid.get(Cell::new(3, 0)), None);
        grid.set(Cell::new(0, 5), 1);
        assert!(grid.iter().all(|(_, v)| *v == 0));
    }

    #[test]
    fn test_grid_iter_row_major() {
        let grid: Grid<u8> = Grid::new(2);
        let cells: Vec<Cell> = grid.iter().map(|(c, _)| c).collect();
        assert_eq!(
            cells,
            vec![Cell::new(0, 0), Cell::new(0, 1), Cell::new(1, 0), Cell::new(1, 1)]
        );
    }
}
