use log::debug;
use rand::seq::SliceRandom;
use rand::RngExt;

use super::Block;

/// Shapes as `(width, height)` in cells, grouped by size class.
pub const SMALL_SHAPES: [(usize, usize); 3] = [(1, 1), (1, 2), (2, 1)];
pub const MEDIUM_SHAPES: [(usize, usize); 3] = [(2, 2), (2, 3), (3, 2)];
pub const LARGE_SHAPES: [(usize, usize); 2] = [(3, 4), (4, 3)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShapeClass {
    Small,
    Medium,
    Large,
}

impl ShapeClass {
    fn shapes(self) -> &'static [(usize, usize)] {
        match self {
            ShapeClass::Small => &SMALL_SHAPES,
            ShapeClass::Medium => &MEDIUM_SHAPES,
            ShapeClass::Large => &LARGE_SHAPES,
        }
    }
}

/// Every shape the placer may emit.
pub fn allowed_shapes() -> impl Iterator<Item = (usize, usize)> {
    SMALL_SHAPES
        .into_iter()
        .chain(MEDIUM_SHAPES)
        .chain(LARGE_SHAPES)
}

/// Row-major `rows x cols` occupancy matrix, `true` meaning occupied.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl OccupancyGrid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![false; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_free(&self, col: usize, row: usize) -> bool {
        col < self.cols && row < self.rows && !self.cells[row * self.cols + col]
    }

    /// True when every cell of the footprint lies inside the grid and is free.
    pub fn fits(&self, col: usize, row: usize, w: usize, h: usize) -> bool {
        if col + w > self.cols || row + h > self.rows {
            return false;
        }
        (row..row + h).all(|r| (col..col + w).all(|c| !self.cells[r * self.cols + c]))
    }

    pub fn occupy(&mut self, col: usize, row: usize, w: usize, h: usize) {
        for r in row..row + h {
            for c in col..col + w {
                self.cells[r * self.cols + c] = true;
            }
        }
    }

}

/// Partitions a grid into blocks drawn from the allowed shape palette.
pub struct ShapePlacer;

impl ShapePlacer {
    /// Fill a `rows x cols` grid completely with non-overlapping blocks.
    ///
    /// Shape choice is randomized, shape legality is not: every emitted block
    /// comes from [`allowed_shapes`] and lies inside the grid.
    pub fn place<R: RngExt + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Vec<Block> {
        let mut grid = OccupancyGrid::new(rows, cols);
        let mut blocks = Vec::with_capacity(rows * cols);

        Self::variety_pass(&mut grid, &mut blocks, rng);
        Self::fill_pass(&mut grid, &mut blocks, rng);
        Self::completion_pass(&mut grid, &mut blocks);

        debug!(
            "Placed {} blocks on a {}x{} grid",
            blocks.len(),
            cols,
            rows
        );
        blocks
    }

    /// First scan: sprinkle larger shapes, leaving most cells for later.
    fn variety_pass<R: RngExt + ?Sized>(
        grid: &mut OccupancyGrid,
        blocks: &mut Vec<Block>,
        rng: &mut R,
    ) {
        for row in 0..grid.rows() {
            for col in 0..grid.cols() {
                if !grid.is_free(col, row) {
                    continue;
                }

                let roll: f64 = rng.random();
                let class = if roll < 0.25 {
                    ShapeClass::Large
                } else if roll < 0.60 {
                    ShapeClass::Medium
                } else {
                    continue;
                };

                Self::try_shapes(grid, blocks, col, row, class.shapes(), rng);
            }
        }
    }

    /// Second scan: every free cell gets a block, small shapes preferred.
    fn fill_pass<R: RngExt + ?Sized>(
        grid: &mut OccupancyGrid,
        blocks: &mut Vec<Block>,
        rng: &mut R,
    ) {
        for row in 0..grid.rows() {
            for col in 0..grid.cols() {
                if !grid.is_free(col, row) {
                    continue;
                }

                let roll: f64 = rng.random();
                let class = if roll < 0.65 {
                    ShapeClass::Small
                } else if roll < 0.90 {
                    ShapeClass::Medium
                } else {
                    ShapeClass::Large
                };

                if Self::try_shapes(grid, blocks, col, row, class.shapes(), rng) {
                    continue;
                }

                let everything: Vec<(usize, usize)> = allowed_shapes().collect();
                if Self::try_shapes(grid, blocks, col, row, &everything, rng) {
                    continue;
                }

                Self::emit(grid, blocks, col, row, 1, 1);
            }
        }
    }

    /// Third scan: anything still free becomes a 1x1 block.
    fn completion_pass(grid: &mut OccupancyGrid, blocks: &mut Vec<Block>) {
        for row in 0..grid.rows() {
            for col in 0..grid.cols() {
                if grid.is_free(col, row) {
                    Self::emit(grid, blocks, col, row, 1, 1);
                }
            }
        }
    }

    /// Try the given shapes in random order, placing the first that fits.
    fn try_shapes<R: RngExt + ?Sized>(
        grid: &mut OccupancyGrid,
        blocks: &mut Vec<Block>,
        col: usize,
        row: usize,
        shapes: &[(usize, usize)],
        rng: &mut R,
    ) -> bool {
        let mut candidates = shapes.to_vec();
        candidates.shuffle(rng);

        match candidates
            .into_iter()
            .find(|&(w, h)| grid.fits(col, row, w, h))
        {
            Some((w, h)) => {
                Self::emit(grid, blocks, col, row, w, h);
                true
            }
            None => false,
        }
    }

    fn emit(
        grid: &mut OccupancyGrid,
        blocks: &mut Vec<Block>,
        col: usize,
        row: usize,
        w: usize,
        h: usize,
    ) {
        grid.occupy(col, row, w, h);
        blocks.push(Block::new(col, row, w, h, blocks.len()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn assert_partition(rows: usize, cols: usize, blocks: &[Block]) {
        let mut coverage = vec![0u32; rows * cols];
        for block in blocks {
            assert!(block.x + block.w <= cols, "block {:?} exceeds cols", block);
            assert!(block.y + block.h <= rows, "block {:?} exceeds rows", block);
            for (col, row) in block.cells() {
                coverage[row * cols + col] += 1;
            }
        }
        assert!(
            coverage.iter().all(|&count| count == 1),
            "grid {}x{} not covered exactly once: {:?}",
            cols,
            rows,
            coverage
        );
    }

    #[test]
    fn test_grid_fits_respects_edges_and_occupancy() {
        let mut grid = OccupancyGrid::new(3, 3);
        assert!(grid.fits(0, 0, 3, 3));
        assert!(!grid.fits(1, 1, 3, 1));
        grid.occupy(1, 1, 1, 1);
        assert!(!grid.fits(0, 0, 2, 2));
        assert!(grid.fits(2, 0, 1, 3));
        assert!(!grid.is_free(1, 1));
        assert!(grid.is_free(0, 1));
    }

    #[test]
    fn test_place_covers_every_cell_exactly_once() {
        for seed in 0..25 {
            let mut rng = StdRng::seed_from_u64(seed);
            for rows in 1..=8 {
                for cols in 1..=8 {
                    let blocks = ShapePlacer::place(rows, cols, &mut rng);
                    assert_partition(rows, cols, &blocks);
                }
            }
        }
    }

    #[test]
    fn test_place_uses_only_palette_shapes() {
        let palette: Vec<_> = allowed_shapes().collect();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            for block in ShapePlacer::place(6, 6, &mut rng) {
                assert!(palette.contains(&(block.w, block.h)), "{:?}", block);
            }
        }
    }

    #[test]
    fn test_place_indices_are_sequential() {
        let mut rng = StdRng::seed_from_u64(3);
        let blocks = ShapePlacer::place(5, 4, &mut rng);
        for (i, block) in blocks.iter().enumerate() {
            assert_eq!(block.index, i);
        }
    }

    #[test]
    fn test_place_single_cell_grid() {
        let mut rng = StdRng::seed_from_u64(1);
        let blocks = ShapePlacer::place(1, 1, &mut rng);
        assert_eq!(blocks, vec![Block::new(0, 0, 1, 1, 0)]);
    }

    #[test]
    fn test_place_produces_varied_shapes_on_large_grids() {
        let mut rng = StdRng::seed_from_u64(11);
        let varied = (0..20).any(|_| {
            ShapePlacer::place(8, 8, &mut rng)
                .iter()
                .any(|block| block.area() > 1)
        });
        assert!(varied);
    }
}
