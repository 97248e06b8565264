/// Error types for the maze engine.
///
/// Only configuration problems are recoverable errors. A rejected move is a
/// normal `MoveResult`, and a dead-end seed is handled by retiring the
/// branch. `InvariantViolation` describes an engine defect and is asserted
/// on in debug builds.

use thiserror::Error;

use crate::domain::cell::CellId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("blocks per side must be at least {min}, got {width}")]
    TooNarrow { width: usize, min: usize },

    #[error("height multiplier must be at least {min}, got {multiplier}")]
    BadMultiplier { multiplier: usize, min: usize },

    #[error("block size must be positive, got {0}")]
    BadBlockSize(i32),

    #[error("block size {block} is too large for a grid {extent} blocks across")]
    BlockTooLarge { block: i32, extent: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("grid has {rows} rows, expected {expected}")]
    RowCount { rows: usize, expected: usize },

    #[error("row {row} has {cols} cells, expected {expected}")]
    RowWidth { row: usize, cols: usize, expected: usize },

    #[error("cell stored at {at:?} reports id {id:?}")]
    StaleId { at: CellId, id: CellId },

    #[error("path {path} references {cell:?} outside the grid")]
    Dangling { path: usize, cell: CellId },

    #[error("path {path} runs through wall {cell:?}")]
    WallInPath { path: usize, cell: CellId },

    #[error("path {path} jumps from {from:?} to {to:?}")]
    Disconnected { path: usize, from: CellId, to: CellId },

    #[error("path {path} has {len} cells, cap is {cap}")]
    OverLength { path: usize, len: usize, cap: usize },

    #[error("main path has {0} cells")]
    MainTooShort(usize),

    #[error("character at {0:?} is outside the grid or on a wall")]
    Character(CellId),

    #[error("{0} seeds left queued after a pass")]
    StaleSeeds(usize),
}
