/// Events emitted during a simulation step.
/// The presentation layer consumes these for the message line.

use crate::domain::cell::CellId;
use crate::domain::entity::MoveDir;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MazeEvent {
    Moved { from: CellId, to: CellId },
    Blocked { dir: MoveDir },
    Rebased { rows_advanced: u64 },
    BranchesSpawned { count: usize },
    BranchesPruned { count: usize },
}
