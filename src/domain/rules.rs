/// Movement rules — truth-table driven.
///
/// Pure functions over the grid: they say what is legal without doing it.
/// The target block is found by index arithmetic, not through the cached
/// neighbor table, so a move that starts next to the sealed border is judged
/// the same way as any other.
///
/// ## Move Truth Table
///
/// ┌───────────────────────────────┬───────────┬──────────────────────┐
/// │ Condition                     │ Allow?    │ Notes                │
/// ├───────────────────────────────┼───────────┼──────────────────────┤
/// │ target out of bounds          │ DENY      │ grid edge            │
/// │ target is wall                │ DENY      │ includes border ring │
/// │ otherwise                     │ ALLOW     │                      │
/// └───────────────────────────────┴───────────┴──────────────────────┘
///
/// ## Rebase Truth Table
///
/// ┌───────────────────────────────┬───────────┐
/// │ Condition                     │ Rebase?   │
/// ├───────────────────────────────┼───────────┤
/// │ move denied                   │ NO        │
/// │ direction ≠ Up                │ NO        │
/// │ new row > threshold row       │ NO        │
/// │ otherwise                     │ YES       │
/// └───────────────────────────────┴───────────┘

use super::cell::CellId;
use super::entity::MoveDir;
use super::grid::Grid;

/// Block reached by stepping from `from` in `dir`, if it is in bounds.
pub fn target_of(grid: &Grid, from: CellId, dir: MoveDir) -> Option<CellId> {
    let (dr, dc) = dir.delta();
    grid.offset(from, dr, dc)
}

/// Target block if the move is legal.
pub fn can_move(grid: &Grid, from: CellId, dir: MoveDir) -> Option<CellId> {
    target_of(grid, from, dir).filter(|t| !grid.is_wall(*t))
}

/// Row whose crossing slides the window: 5/6 of the way up the visible
/// bottom `width` rows.
pub fn threshold_row(grid: &Grid) -> usize {
    let reach = (5 * grid.width()) / 6;
    grid.height() - 1 - reach
}

pub fn triggers_rebase(grid: &Grid, dir: MoveDir, landed: CellId) -> bool {
    dir.advances() && landed.row <= threshold_row(grid)
}
