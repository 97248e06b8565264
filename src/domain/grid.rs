/// Grid model: a fixed-size block lattice over a static coordinate lattice.
///
/// ## Layout
///
/// ```text
///   row 0            open edge, regenerated on every rebase
///   row 1            generation stops here
///   ...
///   height-width     ┐
///   ...              │ visible window (bottom `width` rows)
///   height-1         ┘ character starts here
/// ```
///
/// `height = multiplier * width`. With the default multiplier of 3 two
/// thirds of the generated terrain sits above the visible window, so path
/// growth is never seen popping in.
///
/// Columns 0 and width-1 are sealed: generation never carves them.
///
/// ## Static lattice vs. blocks
///
///   - `Lattice`: `(height+1) x (width+1)` corner points. Never moves.
///   - `rows`: the blocks. A rebase pops the bottom row, shifts the rest
///             down one block length and pushes a fresh row at the top
///             whose corners are read back from the lattice.

use std::collections::VecDeque;

use super::cell::{Cell, CellId, Point, Side};
use crate::error::ConfigError;

pub const MIN_WIDTH: usize = 3;
pub const DEFAULT_HEIGHT_MULTIPLIER: usize = 3;
pub const MIN_HEIGHT_MULTIPLIER: usize = 2;

/// Immutable corner points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lattice {
    cols: usize,
    block: i32,
    points: Vec<Point>,
}

impl Lattice {
    pub fn new(width: usize, height: usize, block: i32) -> Self {
        let cols = width + 1;
        let mut points = Vec::with_capacity(cols * (height + 1));
        for r in 0..=height {
            for c in 0..=width {
                points.push(Point::new(c as i32 * block, r as i32 * block));
            }
        }
        Lattice { cols, block, points }
    }

    #[inline]
    pub fn point(&self, row: usize, col: usize) -> Point {
        self.points[row * self.cols + col]
    }

    /// Corners of the block at (row, col): TL, TR, BR, BL.
    pub fn corners(&self, row: usize, col: usize) -> [Point; 4] {
        [
            self.point(row, col),
            self.point(row, col + 1),
            self.point(row + 1, col + 1),
            self.point(row + 1, col),
        ]
    }

    pub fn block(&self) -> i32 {
        self.block
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: VecDeque<Vec<Cell>>,
    width: usize,
    height: usize,
    lattice: Lattice,
}

// ── Construction ──

impl Grid {
    /// Build `multiplier * width` rows of wall blocks and index adjacency.
    pub fn build(width: usize, multiplier: usize, block: i32) -> Result<Self, ConfigError> {
        if width < MIN_WIDTH {
            return Err(ConfigError::TooNarrow { width, min: MIN_WIDTH });
        }
        if multiplier < MIN_HEIGHT_MULTIPLIER {
            return Err(ConfigError::BadMultiplier { multiplier, min: MIN_HEIGHT_MULTIPLIER });
        }
        if block <= 0 {
            return Err(ConfigError::BadBlockSize(block));
        }

        let height = multiplier * width;
        // Every corner coordinate must fit in i32.
        let extent = width.max(height);
        let fits = i32::try_from(extent).ok().and_then(|e| e.checked_mul(block)).is_some();
        if !fits {
            return Err(ConfigError::BlockTooLarge { block, extent });
        }
        let lattice = Lattice::new(width, height, block);
        let rows = (0..height)
            .map(|r| fresh_row(&lattice, r, width))
            .collect();

        let mut grid = Grid { rows, width, height, lattice };
        grid.rebuild_adjacency();
        Ok(grid)
    }
}

fn fresh_row(lattice: &Lattice, row: usize, width: usize) -> Vec<Cell> {
    (0..width)
        .map(|c| Cell::new(CellId::new(row, c), lattice.corners(row, c)))
        .collect()
}

// ── Queries ──

impl Grid {
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[allow(dead_code)]
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    #[inline]
    pub fn cell(&self, id: CellId) -> &Cell {
        &self.rows[id.row][id.col]
    }

    #[inline]
    pub fn cell_mut(&mut self, id: CellId) -> &mut Cell {
        &mut self.rows[id.row][id.col]
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn contains(&self, id: CellId) -> bool {
        id.row < self.height && id.col < self.width
    }

    /// Signed offset → in-bounds id, or None.
    pub fn offset(&self, id: CellId, dr: isize, dc: isize) -> Option<CellId> {
        let r = id.row.checked_add_signed(dr)?;
        let c = id.col.checked_add_signed(dc)?;
        let next = CellId::new(r, c);
        self.contains(next).then_some(next)
    }

    /// Out of bounds counts as wall.
    #[inline]
    pub fn is_wall(&self, id: CellId) -> bool {
        self.get(id.row, id.col).map_or(true, |c| c.is_wall)
    }

    /// Strictly inside the sealed side columns.
    #[inline]
    pub fn is_interior_col(&self, col: usize) -> bool {
        col > 0 && col + 1 < self.width
    }

    pub fn floor_count(&self) -> usize {
        self.rows.iter().flatten().filter(|c| !c.is_wall).count()
    }
}

// ── Mutation ──

impl Grid {
    pub fn carve(&mut self, id: CellId) {
        self.cell_mut(id).is_wall = false;
    }

    /// Neighbor table from indices alone.
    ///
    /// up iff row > 0, right iff col < width-2, down iff row < height-3,
    /// left iff col > 0. The short right/down reach keeps the outer ring
    /// out of every neighbor scan that starts in the interior.
    pub fn rebuild_adjacency(&mut self) {
        let (w, h) = (self.width, self.height);
        for row in self.rows.iter_mut() {
            for cell in row.iter_mut() {
                let CellId { row: r, col: c } = cell.id;
                let mut n = [None; 4];
                if r > 0 {
                    n[Side::Up.slot()] = Some(CellId::new(r - 1, c));
                }
                if c + 2 < w {
                    n[Side::Right.slot()] = Some(CellId::new(r, c + 1));
                }
                if r + 3 < h {
                    n[Side::Down.slot()] = Some(CellId::new(r + 1, c));
                }
                if c > 0 {
                    n[Side::Left.slot()] = Some(CellId::new(r, c - 1));
                }
                cell.neighbors = n;
            }
        }
    }

    /// Recount and cache wall neighbors of `id`.
    pub fn refresh_wall_count(&mut self, id: CellId) -> u8 {
        let count = self.cell(id)
            .neighbor_ids()
            .filter(|n| self.cell(*n).is_wall)
            .count() as u8;
        self.cell_mut(id).adjacent_wall_count = count;
        count
    }

    /// Pop the bottom row with its neighbor links cleared.
    pub fn detach_bottom_row(&mut self) -> Vec<Cell> {
        let mut row = self.rows.pop_back().unwrap_or_default();
        for cell in row.iter_mut() {
            cell.detach();
        }
        row
    }

    /// Move every remaining row one block down (index +1, geometry +block).
    pub fn shift_rows_down(&mut self) {
        let dy = self.lattice.block();
        for cell in self.rows.iter_mut().flatten() {
            cell.shift_down(dy);
        }
    }

    /// Insert a fresh wall row at row 0.
    pub fn push_top_row(&mut self) {
        let row = fresh_row(&self.lattice, 0, self.width);
        self.rows.push_front(row);
    }
}
