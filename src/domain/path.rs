/// Corridors and the extend-one-step generator.
///
/// Every corridor (main path, fresh branch, extension of either) grows with
/// the same loop; only the `Rule` differs:
///
/// ┌────────────────┬──────────────┬───────────────┬──────────────────────┐
/// │ Rule           │ Row policy   │ Seed chance   │ Seeds go to          │
/// ├────────────────┼──────────────┼───────────────┼──────────────────────┤
/// │ MAIN           │ never down   │ 4/21          │ primary              │
/// │ MAIN_EXTEND    │ never down   │ 1/7           │ primary              │
/// │ BRANCH         │ interior     │ 3/20          │ secondary            │
/// │ BRANCH_EXTEND  │ interior     │ 1/9           │ secondary            │
/// │ SECOND_ORDER   │ interior     │ —             │ —                    │
/// └────────────────┴──────────────┴───────────────┴──────────────────────┘
///
/// Candidate = neighbor of the frontier that is (a) in an interior column,
/// (b) still wall, (c) allowed by the row policy. Never-down candidates are
/// weighted by how deep in wall they sit; interior candidates must clear a
/// wall-count threshold instead, so branches rarely punch into an existing
/// corridor.

use rand::seq::SliceRandom;
use rand::Rng;

use super::cell::CellId;
use super::grid::Grid;

/// Generation stops once the frontier reaches this row.
pub const EDGE_ROW: usize = 1;
/// Shortest branch cap.
pub const MIN_BRANCH_LENGTH: usize = 3;

// ── Rule set ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RowPolicy {
    /// Up or sideways only.
    NeverDown,
    /// Anywhere in rows `EDGE_ROW..height-1`, subject to wall-count
    /// thresholds (`edge_min_walls` applies on `EDGE_ROW`).
    Interior { min_walls: u8, edge_min_walls: u8 },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SeedQueue {
    Primary,
    Secondary,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SeedPolicy {
    pub numerator: u32,
    pub denominator: u32,
    pub queue: SeedQueue,
}

impl SeedPolicy {
    pub const fn new(numerator: u32, denominator: u32, queue: SeedQueue) -> Self {
        SeedPolicy { numerator, denominator, queue }
    }

    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen_ratio(self.numerator, self.denominator)
    }

    #[allow(dead_code)]
    pub fn probability(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rule {
    pub policy: RowPolicy,
    pub seed: Option<SeedPolicy>,
}

const INTERIOR: RowPolicy = RowPolicy::Interior { min_walls: 3, edge_min_walls: 2 };

impl Rule {
    pub const MAIN: Rule = Rule {
        policy: RowPolicy::NeverDown,
        seed: Some(SeedPolicy::new(4, 21, SeedQueue::Primary)),
    };
    pub const MAIN_EXTEND: Rule = Rule {
        policy: RowPolicy::NeverDown,
        seed: Some(SeedPolicy::new(1, 7, SeedQueue::Primary)),
    };
    pub const BRANCH: Rule = Rule {
        policy: INTERIOR,
        seed: Some(SeedPolicy::new(3, 20, SeedQueue::Secondary)),
    };
    pub const BRANCH_EXTEND: Rule = Rule {
        policy: INTERIOR,
        seed: Some(SeedPolicy::new(1, 9, SeedQueue::Secondary)),
    };
    pub const SECOND_ORDER: Rule = Rule { policy: INTERIOR, seed: None };
}

// ── Seeds ──

/// Cells picked during a pass as future branch starts.
/// Must be empty between passes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Seeds {
    pub primary: Vec<CellId>,
    pub secondary: Vec<CellId>,
}

impl Seeds {
    pub fn push(&mut self, queue: SeedQueue, id: CellId) {
        match queue {
            SeedQueue::Primary => self.primary.push(id),
            SeedQueue::Secondary => self.secondary.push(id),
        }
    }

    pub fn len(&self) -> usize {
        self.primary.len() + self.secondary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.primary.clear();
        self.secondary.clear();
    }
}

// ── Path ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PathKind {
    Main,
    Branch,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StopReason {
    ReachedEdge,
    Exhausted,
    LengthCap,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    pub kind: PathKind,
    pub sub_path: Vec<CellId>,
    pub target_length: usize,
    /// Set when a branch stops short of the edge; pruned on the next pass.
    pub retired: bool,
}

impl Path {
    /// Main corridor starting at `start`. The cap is the grid's cell count,
    /// which a never-revisiting corridor cannot reach.
    pub fn main(start: CellId, grid: &Grid) -> Self {
        Path {
            kind: PathKind::Main,
            sub_path: vec![start],
            target_length: grid.width() * grid.height(),
            retired: false,
        }
    }

    /// Branch rooted at `seed` with a random cap in `[MIN_BRANCH_LENGTH, width]`.
    pub fn branch<R: Rng + ?Sized>(seed: CellId, width: usize, rng: &mut R) -> Self {
        let cap = rng.gen_range(MIN_BRANCH_LENGTH..=width.max(MIN_BRANCH_LENGTH));
        Path {
            kind: PathKind::Branch,
            sub_path: vec![seed],
            target_length: cap,
            retired: false,
        }
    }

    pub fn len(&self) -> usize {
        self.sub_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sub_path.is_empty()
    }

    pub fn frontier(&self) -> Option<CellId> {
        self.sub_path.last().copied()
    }

    #[allow(dead_code)]
    pub fn contains(&self, id: CellId) -> bool {
        self.sub_path.contains(&id)
    }

    /// Record why generation stopped. Branches that did not make it to the
    /// edge are retired; the main path never is.
    pub fn settle(&mut self, stop: StopReason) {
        if self.kind == PathKind::Branch && stop != StopReason::ReachedEdge {
            self.retired = true;
        }
    }

    /// Follow a one-row window shift: every handle moves down a row and
    /// handles that fell off the bottom are discarded together with
    /// everything before them, so what remains is still connected and
    /// still ends at the frontier. Returns the number of handles dropped.
    pub fn shift_down(&mut self, height: usize) -> usize {
        for id in self.sub_path.iter_mut() {
            id.row += 1;
        }
        match self.sub_path.iter().rposition(|id| id.row >= height) {
            Some(last) => {
                self.sub_path.drain(..=last);
                last + 1
            }
            None => 0,
        }
    }
}

// ── Extend-one-step ──

/// Grow `path` from its frontier until it reaches the edge, runs out of
/// candidates, or hits its cap.
pub fn extend<R: Rng + ?Sized>(
    path: &mut Path,
    rule: &Rule,
    grid: &mut Grid,
    rng: &mut R,
    seeds: &mut Seeds,
) -> StopReason {
    loop {
        let frontier = match path.frontier() {
            Some(f) => f,
            None => return StopReason::Exhausted,
        };
        if frontier.row <= EDGE_ROW {
            return StopReason::ReachedEdge;
        }
        if path.len() >= path.target_length {
            return StopReason::LengthCap;
        }

        let pool = candidates(grid, frontier, rule.policy);
        let next = match pool.choose(rng) {
            Some(&n) => n,
            None => return StopReason::Exhausted,
        };

        grid.carve(next);
        path.sub_path.push(next);

        if let Some(seed) = rule.seed {
            if seed.roll(rng) {
                seeds.push(seed.queue, next);
            }
        }
    }
}

/// Candidate pool for one step. May hold duplicates (weighting).
pub fn candidates(grid: &mut Grid, frontier: CellId, policy: RowPolicy) -> Vec<CellId> {
    let neighbors = grid.cell(frontier).neighbors;
    let height = grid.height();
    let mut pool = Vec::with_capacity(12);

    for n in neighbors.into_iter().flatten() {
        let walls = grid.refresh_wall_count(n);
        if !grid.is_interior_col(n.col) || !grid.cell(n).is_wall {
            continue;
        }
        match policy {
            RowPolicy::NeverDown => {
                if n.row < EDGE_ROW || n.row > frontier.row {
                    continue;
                }
                pool.push(n);
                if walls > 1 { pool.push(n); }
                if walls > 2 { pool.push(n); }
            }
            RowPolicy::Interior { min_walls, edge_min_walls } => {
                if n.row < EDGE_ROW || n.row + 1 >= height {
                    continue;
                }
                let need = if n.row == EDGE_ROW { edge_min_walls } else { min_walls };
                if walls >= need {
                    pool.push(n);
                }
            }
        }
    }
    pool
}
