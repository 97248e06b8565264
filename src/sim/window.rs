/// Sliding window manager: one rebase per threshold crossing.
///
/// Processing order:
///   1. Detach the bottom row (neighbor links cleared)
///   2. Shift rows and every kept handle one row down; drop handles that
///      pointed into the detached row
///   3. Push a fresh wall row at row 0
///   4. Rebuild adjacency
///   5. Repair paths:
///        a. prune branches retired by the previous pass
///        b. extend the main path (seeds → primary)
///        c. extend every live branch (seeds → secondary)
///        d. spawn branches from primary, then secondary seeds
///        e. prune branches left empty; clear seed queues
///
/// Runs to completion inside one `attempt_move`; nothing observes the
/// world halfway through.

use crate::domain::path::{self, Rule};
use super::generate;
use super::world::WorldState;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RebaseReport {
    /// Path handles discarded with the bottom row.
    pub dropped_handles: usize,
    /// Branches removed (retired last pass, or emptied by the shift).
    pub pruned: usize,
    pub spawned: usize,
    pub retired: usize,
    /// Blocks the main path grew by, and the primary seeds it left.
    pub main_steps: usize,
    pub main_seeds: usize,
    /// Blocks live branches grew by, and the secondary seeds they left.
    pub extend_steps: usize,
    pub extend_seeds: usize,
}

pub fn rebase(world: &mut WorldState) -> RebaseReport {
    let mut report = RebaseReport::default();
    let height = world.grid.height();

    // 1–3. slide the grid
    world.grid.detach_bottom_row();
    world.grid.shift_rows_down();
    report.dropped_handles += world.main_path.shift_down(height);
    for branch in world.branches.iter_mut() {
        report.dropped_handles += branch.shift_down(height);
    }
    world.character.shift_down();
    world.grid.push_top_row();

    // 4.
    world.grid.rebuild_adjacency();

    // 5a.
    let before = world.branches.len();
    world.branches.retain(|b| !b.retired);
    report.pruned += before - world.branches.len();

    // 5b.
    let grown_from = world.main_path.len();
    let stop = path::extend(
        &mut world.main_path, &Rule::MAIN_EXTEND,
        &mut world.grid, &mut world.rng, &mut world.seeds,
    );
    world.main_path.settle(stop);
    report.main_steps = world.main_path.len() - grown_from;
    report.main_seeds = world.seeds.primary.len();

    // 5c.
    let queued = world.seeds.secondary.len();
    for branch in world.branches.iter_mut() {
        let grown_from = branch.len();
        let stop = path::extend(
            branch, &Rule::BRANCH_EXTEND,
            &mut world.grid, &mut world.rng, &mut world.seeds,
        );
        branch.settle(stop);
        report.extend_steps += branch.len() - grown_from;
        if branch.retired {
            report.retired += 1;
        }
    }
    report.extend_seeds = world.seeds.secondary.len() - queued;

    // 5d.
    let pass = generate::spawn_branches(world);
    report.spawned = pass.spawned;
    report.retired += pass.retired;

    // 5e.
    let before = world.branches.len();
    world.branches.retain(|b| !b.is_empty());
    report.pruned += before - world.branches.len();
    world.seeds.clear();

    // The character only sits on the bottom row when a rebase is forced
    // from there; put it back on the main path.
    if !world.grid.contains(world.character.cell) {
        if let Some(&first) = world.main_path.sub_path.first() {
            log::debug!("character fell off the window, moved to {:?}", first);
            world.character.cell = first;
        }
    }

    world.rows_advanced += 1;
    world.branches_pruned += report.pruned as u64;
    log::debug!(
        "rebase #{}: dropped {} handles, pruned {}, spawned {} ({} retired), {} branches live",
        world.rows_advanced, report.dropped_handles, report.pruned,
        report.spawned, report.retired, world.branches.len(),
    );
    log::trace!(
        "rebase #{}: main +{} ({} seeds), branches +{} ({} seeds)",
        world.rows_advanced, report.main_steps, report.main_seeds,
        report.extend_steps, report.extend_seeds,
    );
    world.debug_verify();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MazeSettings;
    use crate::domain::cell::CellId;
    use crate::domain::path::{Path, PathKind};

    fn seeded(width: usize, seed: u64) -> WorldState {
        let settings = MazeSettings { seed: Some(seed), ..MazeSettings::with_width(width) };
        WorldState::with_settings(&settings).expect("valid settings")
    }

    /// Put the character somewhere safe above the bottom row.
    fn lift_character(w: &mut WorldState) {
        w.character.cell = w.main_path.sub_path[w.main_path.len() / 2];
    }

    #[test]
    fn rebase_keeps_row_count() {
        let mut w = seeded(10, 1);
        lift_character(&mut w);
        rebase(&mut w);
        assert_eq!(w.grid.row_count(), 30);
        assert!(w.grid.rows().all(|r| r.len() == 10));
    }

    #[test]
    fn rebase_shifts_surviving_blocks_by_one_row() {
        let mut w = seeded(10, 2);
        lift_character(&mut w);
        let floors_before: Vec<CellId> = w.grid.rows().flatten()
            .filter(|c| !c.is_wall && c.id.row + 1 < w.grid.height())
            .map(|c| c.id)
            .collect();

        rebase(&mut w);

        for id in floors_before {
            let moved = CellId::new(id.row + 1, id.col);
            assert!(!w.grid.cell(moved).is_wall, "{:?} did not move to {:?}", id, moved);
            assert_eq!(w.grid.cell(moved).corners, w.grid.lattice().corners(moved.row, moved.col));
        }
        assert!(w.grid.rows().flatten().enumerate().all(|(i, c)| c.id == CellId::new(i / 10, i % 10)));
    }

    #[test]
    fn fresh_top_row_is_wall() {
        let mut w = seeded(12, 3);
        lift_character(&mut w);
        rebase(&mut w);
        let top: Vec<_> = w.snapshot().row(0).collect();
        assert_eq!(top.len(), 12);
        assert!(top.iter().all(|c| c.is_wall));
    }

    #[test]
    fn main_path_returns_to_edge() {
        let mut w = seeded(15, 4);
        lift_character(&mut w);
        for _ in 0..5 {
            rebase(&mut w);
            assert_eq!(w.main_path.frontier().map(|f| f.row), Some(1));
        }
    }

    #[test]
    fn no_handle_points_outside_after_rebase() {
        let mut w = seeded(8, 5);
        lift_character(&mut w);
        for _ in 0..40 {
            rebase(&mut w);
            let h = w.grid.height();
            for p in w.paths() {
                assert!(p.sub_path.iter().all(|id| id.row < h && id.col < 8));
            }
            assert!(w.character.cell.row < h);
            assert!(w.check_invariants().is_ok());
        }
        assert_eq!(w.rows_advanced, 40);
    }

    #[test]
    fn repeated_rebases_keep_main_path_long() {
        for seed in 0..5 {
            let mut w = seeded(6, seed);
            lift_character(&mut w);
            for _ in 0..100 {
                rebase(&mut w);
                assert!(w.main_path.len() >= 2);
                assert!(w.main_path.sub_path.iter().all(|id| id.row < 18));
            }
        }
    }

    #[test]
    fn retired_branches_pruned_next_pass() {
        let mut w = seeded(12, 6);
        lift_character(&mut w);
        let seed = w.main_path.sub_path[w.main_path.len() / 2];
        // cap far above anything a real branch gets, to find it again
        w.branches.push(Path {
            kind: PathKind::Branch,
            sub_path: vec![seed],
            target_length: 999,
            retired: true,
        });
        let marked = w.branches.iter().filter(|b| b.retired).count();
        let report = rebase(&mut w);
        assert!(report.pruned >= marked);
        assert!(w.branches.iter().all(|b| b.target_length != 999));
    }

    #[test]
    fn emptied_branch_is_pruned() {
        let mut w = seeded(12, 7);
        lift_character(&mut w);
        let h = w.grid.height();
        let bottom = w.main_path.sub_path[0];
        assert_eq!(bottom.row, h - 1);
        w.branches.push(Path {
            kind: PathKind::Branch,
            sub_path: vec![bottom],
            target_length: 5,
            retired: false,
        });
        let count = w.branches.len();
        let report = rebase(&mut w);
        assert!(report.dropped_handles >= 2);
        assert!(report.pruned >= 1);
        assert!(w.branches.iter().all(|b| !b.is_empty()));
        assert!(w.branches.len() < count + report.spawned);
    }

    #[test]
    fn character_dropped_with_bottom_row_lands_on_main_path() {
        let mut w = seeded(10, 8);
        assert_eq!(w.character.cell.row, w.grid.height() - 1);
        rebase(&mut w);
        assert_eq!(Some(&w.character.cell), w.main_path.sub_path.first());
        assert!(!w.grid.cell(w.character.cell).is_wall);
    }

    #[test]
    fn extensions_seed_at_their_own_rates() {
        let (mut main_steps, mut main_seeds) = (0usize, 0usize);
        let (mut ext_steps, mut ext_seeds) = (0usize, 0usize);
        let mut seed = 0;
        while (main_steps < 6000 || ext_steps < 6000) && seed < 400 {
            let mut w = seeded(16, seed);
            lift_character(&mut w);
            for _ in 0..150 {
                let r = rebase(&mut w);
                main_steps += r.main_steps;
                main_seeds += r.main_seeds;
                ext_steps += r.extend_steps;
                ext_seeds += r.extend_seeds;
            }
            seed += 1;
        }
        assert!(main_steps >= 3000, "only {} main steps", main_steps);
        assert!(ext_steps >= 3000, "only {} branch steps", ext_steps);

        let main_rate = main_seeds as f64 / main_steps as f64;
        assert!((main_rate - 1.0 / 7.0).abs() < 0.025, "main rate {}", main_rate);
        let ext_rate = ext_seeds as f64 / ext_steps as f64;
        assert!((ext_rate - 1.0 / 9.0).abs() < 0.025, "branch rate {}", ext_rate);
    }

    #[test]
    fn seeds_cleared_after_rebase() {
        let mut w = seeded(20, 9);
        lift_character(&mut w);
        for _ in 0..10 {
            rebase(&mut w);
            assert!(w.seeds.is_empty());
        }
    }
}
