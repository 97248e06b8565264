/// Entities: the character and the directions it can be asked to move in.

use super::cell::CellId;

/// Movement direction requested by the input layer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Left,
    Right,
    Up,
    Down,
}

impl MoveDir {
    /// (drow, dcol). Up is toward row 0, the open edge.
    pub fn delta(self) -> (isize, isize) {
        match self {
            MoveDir::Up => (-1, 0),
            MoveDir::Down => (1, 0),
            MoveDir::Left => (0, -1),
            MoveDir::Right => (0, 1),
        }
    }

    /// Only moves toward the open edge can slide the window.
    pub fn advances(self) -> bool {
        self == MoveDir::Up
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Character {
    pub cell: CellId,
}

impl Character {
    pub fn new(cell: CellId) -> Self {
        Character { cell }
    }

    /// Follow a one-row window shift.
    pub fn shift_down(&mut self) {
        self.cell.row += 1;
    }
}
