/// Blocks: the atomic unit of the maze.
/// A block is either wall or floor. Geometry (corner points) comes from the
/// static lattice and only moves when the window shifts.
/// Blocks are addressed by `CellId` handles, never by reference, so a
/// rebase can invalidate handles explicitly.

/// Pixel coordinate.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    pub fn translated(self, dx: i32, dy: i32) -> Self {
        Point { x: self.x + dx, y: self.y + dy }
    }
}

/// Handle into the grid arena: (row, col).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CellId {
    pub row: usize,
    pub col: usize,
}

impl CellId {
    pub const fn new(row: usize, col: usize) -> Self {
        CellId { row, col }
    }

    /// Are `self` and `other` orthogonally adjacent on the grid?
    pub fn is_adjacent(self, other: CellId) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }
}

/// Neighbor slots, in the order they are stored.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Side {
    Up,
    Right,
    Down,
    Left,
}

impl Side {
    #[allow(dead_code)]
    pub const ALL: [Side; 4] = [Side::Up, Side::Right, Side::Down, Side::Left];

    #[inline]
    pub fn slot(self) -> usize {
        self as usize
    }

    #[allow(dead_code)]
    pub fn opposite(self) -> Side {
        match self {
            Side::Up => Side::Down,
            Side::Right => Side::Left,
            Side::Down => Side::Up,
            Side::Left => Side::Right,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub id: CellId,
    pub is_wall: bool,
    /// top-left, top-right, bottom-right, bottom-left
    pub corners: [Point; 4],
    /// Cached; only valid right after `Grid::refresh_wall_count`.
    pub adjacent_wall_count: u8,
    pub neighbors: [Option<CellId>; 4],
}

impl Cell {
    pub fn new(id: CellId, corners: [Point; 4]) -> Self {
        Cell {
            id,
            is_wall: true,
            corners,
            adjacent_wall_count: 0,
            neighbors: [None; 4],
        }
    }

    /// Mean of the four corners. Summed in i64: four corners near the
    /// lattice edge can exceed i32 together.
    pub fn center(&self) -> Point {
        let sx: i64 = self.corners.iter().map(|p| p.x as i64).sum();
        let sy: i64 = self.corners.iter().map(|p| p.y as i64).sum();
        Point::new((sx / 4) as i32, (sy / 4) as i32)
    }

    #[inline]
    #[allow(dead_code)]
    pub fn neighbor(&self, side: Side) -> Option<CellId> {
        self.neighbors[side.slot()]
    }

    pub fn neighbor_ids(&self) -> impl Iterator<Item = CellId> + '_ {
        self.neighbors.iter().flatten().copied()
    }

    /// Move the block down by `dy` pixels (one block length per rebase).
    pub fn shift_down(&mut self, dy: i32) {
        self.id.row += 1;
        for p in self.corners.iter_mut() {
            *p = p.translated(0, dy);
        }
    }

    /// Drop every neighbor link.
    pub fn detach(&mut self) {
        self.neighbors = [None; 4];
    }
}
