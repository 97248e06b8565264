/// WorldState: the complete engine context of a running maze.
///
/// Everything the engine mutates lives here: the grid, the main path, the
/// live branches, the transient seed queues, the character and the RNG.
/// Nothing is process-wide; every operation takes `&mut WorldState`.
///
/// ## Handles
///
/// Paths, seeds and the character hold `CellId`s into `grid`. A rebase
/// (`sim::window`) shifts every handle it keeps and discards the ones that
/// pointed into the dropped row, so a handle is never silently stale.
///
/// ## Reading
///
/// Front ends read through `snapshot()`, which borrows the world
/// immutably. The renderer cannot mutate through it and cannot hold it
/// across a move.

use std::ops::Range;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::MazeSettings;
use crate::domain::cell::{Cell, CellId, Point};
use crate::domain::entity::Character;
use crate::domain::grid::Grid;
use crate::domain::path::{Path, Seeds};
use crate::error::{ConfigError, InvariantViolation};
use super::generate;

pub struct WorldState {
    pub grid: Grid,
    pub main_path: Path,
    pub branches: Vec<Path>,
    /// Empty between passes.
    pub seeds: Seeds,
    pub character: Character,
    pub rng: StdRng,
    pub settings: MazeSettings,

    // ── Tracking ──
    pub moves: u64,
    pub rows_advanced: u64,
    pub branches_spawned: u64,
    pub branches_pruned: u64,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
}

// ── Construction ──

impl WorldState {
    /// Default settings with `width` blocks per side.
    #[allow(dead_code)]
    pub fn initialize(width: usize) -> Result<Self, ConfigError> {
        Self::with_settings(&MazeSettings::with_width(width))
    }

    /// Build the grid, carve the main path from a random bottom-row block,
    /// grow the first two generations of branches and place the character.
    pub fn with_settings(settings: &MazeSettings) -> Result<Self, ConfigError> {
        let mut world = Self::blank(settings)?;
        let report = generate::populate(&mut world);
        log::debug!(
            "maze {}x{}: {} floor blocks, main path {}, {} branches ({} dead ends)",
            world.grid.width(), world.grid.height(), world.grid.floor_count(),
            world.main_path.len(), report.spawned, report.retired,
        );
        world.debug_verify();
        Ok(world)
    }

    /// Grid, start block and character only; no generation yet.
    pub(crate) fn blank(settings: &MazeSettings) -> Result<Self, ConfigError> {
        let mut grid = Grid::build(
            settings.blocks_per_side,
            settings.height_multiplier,
            settings.block_size,
        )?;
        let mut rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let start = CellId::new(grid.height() - 1, rng.gen_range(1..grid.width() - 1));
        grid.carve(start);
        let main_path = Path::main(start, &grid);

        Ok(WorldState {
            grid,
            main_path,
            branches: vec![],
            seeds: Seeds::default(),
            character: Character::new(start),
            rng,
            settings: settings.clone(),
            moves: 0,
            rows_advanced: 0,
            branches_spawned: 0,
            branches_pruned: 0,
            message: String::new(),
            message_timer: 0,
        })
    }

    /// Throw the maze away and build a new one with the same settings.
    /// The new seed is drawn from the current RNG so seeded runs stay
    /// reproducible.
    pub fn regenerate(&mut self) -> Result<(), ConfigError> {
        let mut settings = self.settings.clone();
        let next_seed: u64 = self.rng.gen();
        settings.seed = Some(next_seed);
        let mut fresh = Self::with_settings(&settings)?;
        fresh.settings.seed = self.settings.seed;
        *self = fresh;
        Ok(())
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 { self.message.clear(); }
        }
    }
}

// ── Queries ──

impl WorldState {
    /// Main path first, then branches.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(&self.main_path).chain(self.branches.iter())
    }

    /// Rows a front end should show: the bottom `width` rows.
    pub fn visible_rows(&self) -> Range<usize> {
        let h = self.grid.height();
        h.saturating_sub(self.grid.width())..h
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            grid: &self.grid,
            character: self.character.cell,
            main_path: &self.main_path,
            branches: &self.branches,
            window: self.visible_rows(),
            moves: self.moves,
            rows_advanced: self.rows_advanced,
        }
    }
}

// ── Invariants ──

impl WorldState {
    /// Structural checks that must hold between inputs.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let g = &self.grid;
        let expected = self.settings.height_multiplier * self.settings.blocks_per_side;
        if g.row_count() != expected {
            return Err(InvariantViolation::RowCount { rows: g.row_count(), expected });
        }
        for (r, row) in g.rows().enumerate() {
            if row.len() != g.width() {
                return Err(InvariantViolation::RowWidth { row: r, cols: row.len(), expected: g.width() });
            }
            for (c, cell) in row.iter().enumerate() {
                let at = CellId::new(r, c);
                if cell.id != at {
                    return Err(InvariantViolation::StaleId { at, id: cell.id });
                }
            }
        }

        for (i, path) in self.paths().enumerate() {
            for &id in &path.sub_path {
                if !g.contains(id) {
                    return Err(InvariantViolation::Dangling { path: i, cell: id });
                }
                if g.cell(id).is_wall {
                    return Err(InvariantViolation::WallInPath { path: i, cell: id });
                }
            }
            for pair in path.sub_path.windows(2) {
                if !pair[0].is_adjacent(pair[1]) {
                    return Err(InvariantViolation::Disconnected { path: i, from: pair[0], to: pair[1] });
                }
            }
            if path.len() > path.target_length {
                return Err(InvariantViolation::OverLength { path: i, len: path.len(), cap: path.target_length });
            }
        }
        if self.main_path.len() < 2 {
            return Err(InvariantViolation::MainTooShort(self.main_path.len()));
        }

        let ch = self.character.cell;
        if !g.contains(ch) || g.cell(ch).is_wall {
            return Err(InvariantViolation::Character(ch));
        }
        if !self.seeds.is_empty() {
            return Err(InvariantViolation::StaleSeeds(self.seeds.len()));
        }
        Ok(())
    }

    /// Panics on a broken invariant in debug builds.
    pub(crate) fn debug_verify(&self) {
        if !cfg!(debug_assertions) {
            return;
        }
        if let Err(e) = self.check_invariants() {
            panic!("maze invariant violated: {e}");
        }
    }
}

// ── Snapshot ──

/// Read-only view handed to front ends between inputs.
pub struct Snapshot<'a> {
    pub grid: &'a Grid,
    pub character: CellId,
    pub main_path: &'a Path,
    pub branches: &'a [Path],
    pub window: Range<usize>,
    pub moves: u64,
    pub rows_advanced: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellView {
    pub id: CellId,
    /// Pixel position, for front ends that draw geometry.
    #[allow(dead_code)]
    pub center: Point,
    pub is_wall: bool,
}

impl<'a> Snapshot<'a> {
    #[allow(dead_code)]
    pub fn cells(&self) -> impl Iterator<Item = CellView> + 'a {
        self.grid.rows().flatten().map(view_of)
    }

    /// One row, left to right. Empty when `row` is out of range.
    pub fn row(&self, row: usize) -> impl Iterator<Item = CellView> + 'a {
        let grid = self.grid;
        (0..grid.width()).filter_map(move |c| grid.get(row, c)).map(view_of)
    }

    pub fn active_paths(&self) -> impl Iterator<Item = &'a Path> {
        std::iter::once(self.main_path).chain(self.branches.iter())
    }

    pub fn live_branches(&self) -> usize {
        self.branches.iter().filter(|b| !b.retired).count()
    }
}

fn view_of(c: &Cell) -> CellView {
    CellView { id: c.id, center: c.center(), is_wall: c.is_wall }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(width: usize, seed: u64) -> WorldState {
        let settings = MazeSettings { seed: Some(seed), ..MazeSettings::with_width(width) };
        WorldState::with_settings(&settings).expect("valid settings")
    }

    #[test]
    fn initialize_rejects_narrow() {
        assert!(matches!(WorldState::initialize(2), Err(ConfigError::TooNarrow { width: 2, .. })));
        assert!(WorldState::initialize(0).is_err());
    }

    #[test]
    fn minimal_width_scenario() {
        for seed in 0..30 {
            let w = seeded(4, seed);
            let h = w.grid.height();
            assert_eq!(h, 12);
            let ch = w.character.cell;
            assert_eq!(ch.row, h - 1);
            assert!(!w.grid.cell(ch).is_wall);
            assert_eq!(w.main_path.sub_path[0], ch);
            assert!(w.main_path.len() >= 2);
            assert!(w.main_path.sub_path[1].row <= ch.row);
            assert!(w.check_invariants().is_ok());
        }
    }

    #[test]
    fn initial_main_path_spans_to_edge() {
        let w = seeded(30, 11);
        assert_eq!(w.main_path.frontier().map(|f| f.row), Some(1));
        assert!(w.main_path.len() >= w.grid.height() - 1);
    }

    #[test]
    fn initial_pass_leaves_no_seeds() {
        for seed in 0..10 {
            assert!(seeded(20, seed).seeds.is_empty());
        }
    }

    #[test]
    fn initial_pass_grows_branches() {
        let total: usize = (0..10).map(|s| seeded(30, s).branches.len()).sum();
        assert!(total > 0);
    }

    #[test]
    fn same_seed_same_maze() {
        let a = seeded(15, 99);
        let b = seeded(15, 99);
        assert_eq!(a.grid, b.grid);
        assert_eq!(a.main_path, b.main_path);
        assert_eq!(a.branches, b.branches);
    }

    #[test]
    fn regenerate_builds_a_valid_new_maze() {
        let mut w = seeded(15, 5);
        let before = w.grid.clone();
        w.regenerate().expect("regenerate");
        assert!(w.check_invariants().is_ok());
        assert_ne!(w.grid, before);
        assert_eq!(w.settings.seed, Some(5));
        assert_eq!(w.moves, 0);
    }

    #[test]
    fn snapshot_reflects_state() {
        let w = seeded(10, 3);
        let snap = w.snapshot();
        assert_eq!(snap.character, w.character.cell);
        assert_eq!(snap.cells().count(), 10 * 30);
        assert_eq!(snap.cells().filter(|c| !c.is_wall).count(), w.grid.floor_count());
        assert_eq!(snap.window, 20..30);
        assert_eq!(snap.active_paths().count(), 1 + w.branches.len());
        assert_eq!(snap.row(29).count(), 10);
        assert_eq!(snap.row(30).count(), 0);
    }

    #[test]
    fn invariant_check_catches_wall_in_path() {
        let mut w = seeded(8, 1);
        let id = w.main_path.sub_path[1];
        w.grid.cell_mut(id).is_wall = true;
        assert!(matches!(w.check_invariants(), Err(InvariantViolation::WallInPath { path: 0, .. })));
    }

    #[test]
    fn invariant_check_catches_stale_seeds() {
        let mut w = seeded(8, 1);
        w.seeds.primary.push(w.character.cell);
        assert_eq!(w.check_invariants(), Err(InvariantViolation::StaleSeeds(1)));
    }
}
