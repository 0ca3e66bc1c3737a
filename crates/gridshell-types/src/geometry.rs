use serde::{Deserialize, Serialize};

/// 0-based row-major index into the desktop grid
pub type CellIndex = usize;

/// Widget footprint in grid cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSize {
    pub width: usize,
    pub height: usize,
}

impl CellSize {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

/// Logical grid dimensions. Cells are addressed 0..rows*cols, row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    pub rows: usize,
    pub cols: usize,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self { rows: 3, cols: 4 }
    }
}

impl GridSpec {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    pub fn row_of(&self, cell: CellIndex) -> usize {
        cell / self.cols
    }

    pub fn col_of(&self, cell: CellIndex) -> usize {
        cell % self.cols
    }

    pub fn cell_at(&self, row: usize, col: usize) -> CellIndex {
        row * self.cols + col
    }

    pub fn contains(&self, cell: CellIndex) -> bool {
        cell < self.cell_count()
    }
}

/// Occupied rectangle of a placed widget: anchor cell plus size.
///
/// Validity is judged on the full rectangle, never just the anchor: a 2x2
/// rect whose anchor sits in the last column crosses the row edge and is out
/// of bounds even though the anchor cell itself is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRect {
    pub cell: CellIndex,
    pub size: CellSize,
}

impl CellRect {
    pub fn new(cell: CellIndex, size: CellSize) -> Self {
        Self { cell, size }
    }

    /// Whether the whole rectangle lies inside `grid`, without row wrap.
    pub fn fits(&self, grid: &GridSpec) -> bool {
        if !grid.contains(self.cell) || self.size.width == 0 || self.size.height == 0 {
            return false;
        }
        let row = grid.row_of(self.cell);
        let col = grid.col_of(self.cell);
        col + self.size.width <= grid.cols && row + self.size.height <= grid.rows
    }

    /// Every cell index covered by the rectangle, row-major.
    ///
    /// Callers must check `fits` first; cells are computed relative to the
    /// anchor row and do not wrap.
    pub fn cells(&self, grid: &GridSpec) -> Vec<CellIndex> {
        let row = grid.row_of(self.cell);
        let col = grid.col_of(self.cell);
        let mut out = Vec::with_capacity(self.size.area());
        for r in row..row + self.size.height {
            for c in col..col + self.size.width {
                out.push(grid.cell_at(r, c));
            }
        }
        out
    }

    /// Full-rectangle intersection test against another placed rect.
    pub fn intersects(&self, other: &CellRect, grid: &GridSpec) -> bool {
        let (r1, c1) = (grid.row_of(self.cell), grid.col_of(self.cell));
        let (r2, c2) = (grid.row_of(other.cell), grid.col_of(other.cell));
        let rows_overlap = r1 < r2 + other.size.height && r2 < r1 + self.size.height;
        let cols_overlap = c1 < c2 + other.size.width && c2 < c1 + self.size.width;
        rows_overlap && cols_overlap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_is_twelve_cells() {
        let grid = GridSpec::default();
        assert_eq!(grid.cell_count(), 12);
        assert_eq!(grid.row_of(7), 1);
        assert_eq!(grid.col_of(7), 3);
        assert_eq!(grid.cell_at(1, 3), 7);
    }

    #[test]
    fn test_rect_fits_within_bounds() {
        let grid = GridSpec::default();
        assert!(CellRect::new(0, CellSize::new(1, 1)).fits(&grid));
        assert!(CellRect::new(0, CellSize::new(4, 3)).fits(&grid));
        assert!(CellRect::new(6, CellSize::new(2, 2)).fits(&grid));
    }

    #[test]
    fn test_rect_crossing_row_edge_is_rejected() {
        // Valid anchor, but the 2x2 footprint would wrap past column 2 of 3.
        let grid = GridSpec::new(4, 3);
        assert!(!CellRect::new(2, CellSize::new(2, 2)).fits(&grid));
    }

    #[test]
    fn test_rect_crossing_bottom_edge_is_rejected() {
        let grid = GridSpec::default();
        assert!(!CellRect::new(8, CellSize::new(1, 2)).fits(&grid));
    }

    #[test]
    fn test_zero_size_rect_never_fits() {
        let grid = GridSpec::default();
        assert!(!CellRect::new(0, CellSize::new(0, 1)).fits(&grid));
    }

    #[test]
    fn test_cells_enumerate_row_major() {
        let grid = GridSpec::default();
        let rect = CellRect::new(1, CellSize::new(2, 2));
        assert_eq!(rect.cells(&grid), vec![1, 2, 5, 6]);
    }

    #[test]
    fn test_intersection_is_rectangular() {
        let grid = GridSpec::default();
        let a = CellRect::new(0, CellSize::new(2, 2));
        let b = CellRect::new(5, CellSize::new(1, 1));
        let c = CellRect::new(2, CellSize::new(1, 1));
        assert!(a.intersects(&b, &grid));
        assert!(b.intersects(&a, &grid));
        assert!(!a.intersects(&c, &grid));
    }
}
