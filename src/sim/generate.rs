/// Generation passes over the whole world.
///
/// A pass runs the corridor generator in a fixed order:
///   1. Main path (initial pass) or main-path extension (rebase)
///   2. Existing live branches (rebase only, see `sim::window`)
///   3. New branches from primary seeds → these seed the secondary queue
///   4. New branches from secondary seeds → these do not seed
///   5. Seed queues cleared
///
/// So each pass adds exactly one generation beyond the primary seeds.

use crate::domain::cell::CellId;
use crate::domain::path::{self, Path, Rule};
use super::world::WorldState;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    pub spawned: usize,
    /// Spawned branches that stopped short of the edge.
    pub retired: usize,
    /// Blocks carved by branches grown from primary seeds, and the
    /// secondary seeds they left.
    pub first_order_steps: usize,
    pub first_order_seeds: usize,
}

/// Initial pass on a freshly built world.
pub fn populate(world: &mut WorldState) -> PassReport {
    let stop = path::extend(
        &mut world.main_path, &Rule::MAIN,
        &mut world.grid, &mut world.rng, &mut world.seeds,
    );
    world.main_path.settle(stop);
    log::trace!("main path stopped: {:?} at {} blocks", stop, world.main_path.len());

    let report = spawn_branches(world);
    world.seeds.clear();
    report
}

/// Drain both seed queues into new branches. Primary first: its branches
/// may add secondary seeds, which are then drained in turn.
pub fn spawn_branches(world: &mut WorldState) -> PassReport {
    let mut report = PassReport::default();

    let primary = std::mem::take(&mut world.seeds.primary);
    for seed in primary {
        let queued = world.seeds.secondary.len();
        let carved = grow_branch(world, seed, &Rule::BRANCH, &mut report);
        report.first_order_steps += carved;
        report.first_order_seeds += world.seeds.secondary.len() - queued;
    }

    let secondary = std::mem::take(&mut world.seeds.secondary);
    for seed in secondary {
        grow_branch(world, seed, &Rule::SECOND_ORDER, &mut report);
    }

    world.branches_spawned += report.spawned as u64;
    log::trace!(
        "spawned {} branches; first order carved {} blocks, left {} seeds",
        report.spawned, report.first_order_steps, report.first_order_seeds,
    );
    report
}

/// Returns the number of blocks carved.
fn grow_branch(world: &mut WorldState, seed: CellId, rule: &Rule, report: &mut PassReport) -> usize {
    let mut branch = Path::branch(seed, world.grid.width(), &mut world.rng);
    let stop = path::extend(
        &mut branch, rule,
        &mut world.grid, &mut world.rng, &mut world.seeds,
    );
    branch.settle(stop);

    report.spawned += 1;
    if branch.retired {
        report.retired += 1;
    }
    let carved = branch.len() - 1;
    world.branches.push(branch);
    carved
}
