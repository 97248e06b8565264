/// The step function: applies one move request to the world.
///
/// Processing order:
///   1. Resolve the target block (index arithmetic, see `domain::rules`)
///   2. Reject if out of bounds or wall; nothing changes
///   3. Move the character
///   4. Upward move at or past the threshold row → rebase (`sim::window`)
///
/// Each request runs to completion, rebase included, before the caller
/// gets control back.

use crate::domain::entity::MoveDir;
use crate::domain::rules;
use super::event::MazeEvent;
use super::window;
use super::world::WorldState;

/// Outcome of one move request, with the events that produced it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveResult {
    pub accepted: bool,
    pub rebased: bool,
    pub events: Vec<MazeEvent>,
}

impl MoveResult {
    pub fn from_events(events: Vec<MazeEvent>) -> Self {
        MoveResult {
            accepted: events.iter().any(|e| matches!(e, MazeEvent::Moved { .. })),
            rebased: events.iter().any(|e| matches!(e, MazeEvent::Rebased { .. })),
            events,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

fn step(world: &mut WorldState, dir: MoveDir) -> Vec<MazeEvent> {
    let mut events = Vec::new();
    let from = world.character.cell;

    let to = match rules::can_move(&world.grid, from, dir) {
        Some(t) => t,
        None => {
            events.push(MazeEvent::Blocked { dir });
            return events;
        }
    };

    world.character.cell = to;
    world.moves += 1;
    events.push(MazeEvent::Moved { from, to });

    if rules::triggers_rebase(&world.grid, dir, to) {
        let report = window::rebase(world);
        events.push(MazeEvent::Rebased { rows_advanced: world.rows_advanced });
        if report.spawned > 0 {
            events.push(MazeEvent::BranchesSpawned { count: report.spawned });
        }
        if report.pruned > 0 {
            events.push(MazeEvent::BranchesPruned { count: report.pruned });
        }
    }

    events
}

/// Apply one move request. The only entry point front ends use.
pub fn attempt_move(world: &mut WorldState, dir: MoveDir) -> MoveResult {
    MoveResult::from_events(step(world, dir))
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MazeSettings;
    use crate::domain::cell::CellId;
    use crate::domain::rules::threshold_row;

    fn seeded(width: usize, seed: u64) -> WorldState {
        let settings = MazeSettings { seed: Some(seed), ..MazeSettings::with_width(width) };
        WorldState::with_settings(&settings).expect("valid settings")
    }

    fn dir_between(from: CellId, to: CellId) -> MoveDir {
        if to.row < from.row {
            MoveDir::Up
        } else if to.row > from.row {
            MoveDir::Down
        } else if to.col < from.col {
            MoveDir::Left
        } else {
            MoveDir::Right
        }
    }

    /// Follow the main path one block.
    fn walk_main(world: &mut WorldState) -> MoveResult {
        let here = world.character.cell;
        let idx = world.main_path.sub_path.iter()
            .position(|c| *c == here)
            .expect("character on main path");
        let next = world.main_path.sub_path[idx + 1];
        attempt_move(world, dir_between(here, next))
    }

    fn fingerprint(w: &WorldState) -> (crate::domain::grid::Grid, Vec<crate::domain::path::Path>, CellId, u64) {
        (w.grid.clone(), w.paths().cloned().collect(), w.character.cell, w.moves)
    }

    // ── rejection ──

    #[test]
    fn move_off_bottom_is_rejected_without_change() {
        let mut w = seeded(10, 1);
        let before = fingerprint(&w);
        let events = step(&mut w, MoveDir::Down);
        assert_eq!(events, vec![MazeEvent::Blocked { dir: MoveDir::Down }]);
        assert_eq!(fingerprint(&w), before);
        assert!(w.seeds.is_empty());
    }

    #[test]
    fn move_into_wall_is_rejected_without_change() {
        let mut w = seeded(12, 2);
        // find a floor block with a wall on its left inside the grid
        let spot = w.grid.rows().flatten()
            .find(|c| !c.is_wall && c.id.col > 0 && w.grid.is_wall(CellId::new(c.id.row, c.id.col - 1)))
            .map(|c| c.id)
            .expect("some floor block borders a wall");
        w.character.cell = spot;
        let before = fingerprint(&w);
        let result = attempt_move(&mut w, MoveDir::Left);
        assert!(!result.accepted);
        assert!(!result.rebased);
        assert_eq!(result.events, vec![MazeEvent::Blocked { dir: MoveDir::Left }]);
        assert_eq!(fingerprint(&w), before);
    }

    #[test]
    fn border_columns_always_reject() {
        for seed in 0..10 {
            let mut w = seeded(10, seed);
            let edge_floors: Vec<CellId> = w.grid.rows().flatten()
                .filter(|c| !c.is_wall && (c.id.col == 1 || c.id.col == 8))
                .map(|c| c.id)
                .collect();
            for id in edge_floors {
                w.character.cell = id;
                let dir = if id.col == 1 { MoveDir::Left } else { MoveDir::Right };
                assert!(!attempt_move(&mut w, dir).accepted, "escaped through border at {:?}", id);
                assert_eq!(w.character.cell, id);
            }
        }
    }

    #[test]
    fn narrowest_maze_is_a_single_column() {
        let mut w = seeded(3, 0);
        assert!(!attempt_move(&mut w, MoveDir::Left).accepted);
        assert!(!attempt_move(&mut w, MoveDir::Right).accepted);
        assert!(attempt_move(&mut w, MoveDir::Up).accepted);
    }

    // ── acceptance ──

    #[test]
    fn first_step_along_main_path_is_accepted() {
        let mut w = seeded(10, 3);
        let next = w.main_path.sub_path[1];
        let r = walk_main(&mut w);
        assert!(r.accepted);
        assert!(!r.rebased);
        assert_eq!(w.character.cell, next);
        assert_eq!(w.moves, 1);
    }

    #[test]
    fn sideways_and_down_never_rebase() {
        let mut w = seeded(10, 4);
        let t = threshold_row(&w.grid);
        // stand on a main-path block right at the threshold and wiggle
        let spot = *w.main_path.sub_path.iter()
            .find(|c| c.row == t)
            .expect("main path crosses every row");
        w.character.cell = spot;
        for dir in [MoveDir::Left, MoveDir::Right, MoveDir::Down] {
            let r = attempt_move(&mut w, dir);
            assert!(!r.rebased);
            if r.accepted {
                w.character.cell = spot;
            }
        }
        assert_eq!(w.rows_advanced, 0);
    }

    #[test]
    fn crossing_threshold_rebases() {
        let mut w = seeded(10, 5);
        let t = threshold_row(&w.grid);
        let mut rebased_at = None;
        for i in 0..200 {
            let r = walk_main(&mut w);
            assert!(r.accepted);
            if r.rebased {
                rebased_at = Some(i);
                break;
            }
        }
        assert!(rebased_at.is_some());
        assert_eq!(w.rows_advanced, 1);
        // character was shifted with the grid, one row below the threshold
        assert_eq!(w.character.cell.row, t + 1);
    }

    #[test]
    fn long_walk_keeps_every_invariant() {
        for seed in 0..4 {
            let mut w = seeded(6, seed);
            let h = w.grid.height();
            let mut rebases = 0;
            for _ in 0..300 {
                let r = walk_main(&mut w);
                assert!(r.accepted);
                if r.rebased {
                    rebases += 1;
                }
                assert_eq!(w.grid.row_count(), 18);
                assert!(w.main_path.len() >= 2);
                assert!(w.paths().flat_map(|p| p.sub_path.iter()).all(|id| id.row < h));
                assert!(w.character.cell.row < h);
                assert_eq!(w.check_invariants(), Ok(()));
            }
            assert!(rebases > 0);
            assert_eq!(w.rows_advanced, rebases);
        }
    }

    #[test]
    fn rebase_events_are_reported() {
        let mut w = seeded(8, 6);
        loop {
            let here = w.character.cell;
            let idx = w.main_path.sub_path.iter().position(|c| *c == here).expect("on main path");
            let next = w.main_path.sub_path[idx + 1];
            let result = attempt_move(&mut w, dir_between(here, next));
            assert!(result.accepted);
            if result.rebased {
                assert!(matches!(result.events[0], MazeEvent::Moved { from, to } if from == here && to == next));
                assert!(result.events.contains(&MazeEvent::Rebased { rows_advanced: 1 }));
                break;
            }
        }
    }
}
