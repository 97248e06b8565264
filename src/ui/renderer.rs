/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Glyph)
///   2. Compare each glyph with `back` buffer (previous frame)
///   3. Only emit terminal commands for glyphs that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The maze is read through `WorldState::snapshot()` only.

use std::io::{self, BufWriter, Write};
use std::ops::Range;

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::cell::CellId;
use crate::domain::path::PathKind;
use crate::sim::world::{Snapshot, WorldState};

// ── Glyph: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Glyph {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Glyph {
    /// Explicit background for every terminal cell, so gaps between rows
    /// match the cells on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Glyph = Glyph { ch: ' ', fg: Color::White, bg: Glyph::BASE_BG };

    /// Differs from any real glyph, so every position gets diff'd.
    const INVALID: Glyph = Glyph { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Glyph { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Glyphs ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Glyph>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Glyph::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Glyph::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Glyph::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, g: Glyph) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = g;
        }
    }

    fn get(&self, x: usize, y: usize) -> Glyph {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Glyph::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Glyph::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Glyph::new(' ', Color::White, bg));
        }
    }
}

// ── Palette ──

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const WALL_FG: Color = Color::Rgb { r: 90, g: 90, b: 110 };
const WALL_BG: Color = Color::Rgb { r: 55, g: 55, b: 70 };
const FLOOR_BG: Color = Color::Rgb { r: 12, g: 12, b: 18 };
const MAIN_BG: Color = Color::Rgb { r: 20, g: 60, b: 30 };
const BRANCH_BG: Color = Color::Rgb { r: 20, g: 40, b: 70 };
const DEAD_END_BG: Color = Color::Rgb { r: 60, g: 25, b: 25 };
const CHAR_FG: Color = Color::Rgb { r: 255, g: 220, b: 80 };

/// Each maze block = 2 terminal columns.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// HUD + gap above the map, gap + message + gap + help below.
const RESERVED_ROWS: usize = MAP_ROW + 4;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Overlay {
    None,
    Main,
    Branch,
    DeadEnd,
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    /// Show every row instead of the bottom `width` rows.
    full_view: bool,
    show_paths: bool,
}

impl Renderer {
    pub fn new(full_view: bool, show_paths: bool) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            full_view,
            show_paths,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Glyph::BASE_BG),
            Clear(ClearType::All)
        )?;
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn toggle_view(&mut self) -> bool {
        self.full_view = !self.full_view;
        self.invalidate();
        self.full_view
    }

    pub fn toggle_paths(&mut self) -> bool {
        self.show_paths = !self.show_paths;
        self.show_paths
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
        }

        self.front.clear();
        let snap = world.snapshot();
        let rows = self.map_rows(&snap);
        self.compose_hud(&snap);
        self.compose_map(&snap, rows.clone());
        self.compose_footer(&world.message, rows.len());

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.invalidate();
    }

    /// Force a full repaint on the next frame.
    fn invalidate(&mut self) {
        self.back.cells.fill(Glyph::INVALID);
        // A failed clear only leaves stale glyphs until the repaint.
        let _ = queue!(self.writer, SetBackgroundColor(Glyph::BASE_BG), Clear(ClearType::All));
    }

    /// Grid rows that fit the terminal. The bottom is kept when clipping:
    /// that is where the character walks.
    fn map_rows(&self, snap: &Snapshot<'_>) -> Range<usize> {
        let wanted = if self.full_view { 0..snap.grid.height() } else { snap.window.clone() };
        let fit = self.term_h.saturating_sub(RESERVED_ROWS).max(1);
        wanted.end.saturating_sub(fit).max(wanted.start)..wanted.end
    }

    // ── Diff flush: only write changed glyphs ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Glyph::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Glyph::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let g = self.front.get(x, y);
                if g == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if g.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(g.fg))?;
                    last_fg = g.fg;
                }
                if g.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(g.bg))?;
                    last_bg = g.bg;
                }
                queue!(self.writer, Print(g.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_hud(&mut self, snap: &Snapshot<'_>) {
        let view = if self.full_view { "full" } else { "window" };
        let hud = format!(
            " Rows:{:<6}  Moves:{:<6}  Branches:{:<4}  View:{:<6}  Paths:{} ",
            snap.rows_advanced, snap.moves, snap.live_branches(),
            view, if self.show_paths { "on" } else { "off" },
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    fn compose_map(&mut self, snap: &Snapshot<'_>, rows: Range<usize>) {
        let overlay = if self.show_paths { overlay_of(snap) } else { Vec::new() };
        let width = snap.grid.width();

        for (screen_y, r) in rows.enumerate() {
            let y = MAP_ROW + screen_y;
            for view in snap.row(r) {
                let x = view.id.col * CELL_W;
                if x + 1 >= self.front.width { break; }

                let (ch, fg, bg) = if view.id == snap.character {
                    ('@', CHAR_FG, FLOOR_BG)
                } else if view.is_wall {
                    ('▒', WALL_FG, WALL_BG)
                } else {
                    let mark = overlay.get(r * width + view.id.col).copied().unwrap_or(Overlay::None);
                    (' ', Color::White, match mark {
                        Overlay::Main => MAIN_BG,
                        Overlay::Branch => BRANCH_BG,
                        Overlay::DeadEnd => DEAD_END_BG,
                        Overlay::None => FLOOR_BG,
                    })
                };
                self.front.set(x, y, Glyph::new(ch, fg, bg));
                self.front.set(x + 1, y, Glyph::new(if ch == '@' { ' ' } else { ch }, fg, bg));
            }
        }
    }

    fn compose_footer(&mut self, message: &str, map_h: usize) {
        let msg_row = MAP_ROW + map_h + 1;
        if !message.is_empty() && msg_row < self.front.height {
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(0, msg_row, &format!(" ◈ {} ", message), Color::Black, MSG_BG);
        }

        let help_row = MAP_ROW + map_h + 3;
        if help_row < self.front.height {
            let help = " ←↑→↓/WASD:Move  R:New maze  Tab:View  P:Paths  Esc/Q:Quit";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }
}

/// Per-block path membership, row-major. The main path wins over branches;
/// a live branch wins over a dead end.
fn overlay_of(snap: &Snapshot<'_>) -> Vec<Overlay> {
    let width = snap.grid.width();
    let mut marks = vec![Overlay::None; width * snap.grid.height()];
    let mut mark = |id: CellId, m: Overlay| {
        if let Some(slot) = marks.get_mut(id.row * width + id.col) {
            if rank(m) > rank(*slot) {
                *slot = m;
            }
        }
    };

    for p in snap.active_paths() {
        let m = match (p.kind, p.retired) {
            (PathKind::Main, _) => Overlay::Main,
            (PathKind::Branch, false) => Overlay::Branch,
            (PathKind::Branch, true) => Overlay::DeadEnd,
        };
        for &id in &p.sub_path {
            mark(id, m);
        }
    }
    marks
}

fn rank(m: Overlay) -> u8 {
    match m {
        Overlay::None => 0,
        Overlay::DeadEnd => 1,
        Overlay::Branch => 2,
        Overlay::Main => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MazeSettings;
    use crate::domain::path::Path;

    fn seeded(width: usize, seed: u64) -> WorldState {
        let settings = MazeSettings { seed: Some(seed), ..MazeSettings::with_width(width) };
        WorldState::with_settings(&settings).expect("valid settings")
    }

    #[test]
    fn overlay_marks_every_main_block() {
        let w = seeded(12, 1);
        let snap = w.snapshot();
        let marks = overlay_of(&snap);
        for id in &w.main_path.sub_path {
            assert_eq!(marks[id.row * 12 + id.col], Overlay::Main);
        }
        let walls = snap.cells().filter(|c| c.is_wall)
            .all(|c| marks[c.id.row * 12 + c.id.col] == Overlay::None);
        assert!(walls);
    }

    #[test]
    fn overlay_ranks_main_over_branches() {
        let mut w = seeded(12, 5);
        let shared = w.main_path.sub_path[3];
        let off_main = w.grid.rows().flatten()
            .find(|c| !c.is_wall && !w.main_path.contains(c.id))
            .map(|c| c.id);
        w.branches.push(Path {
            kind: PathKind::Branch,
            sub_path: vec![shared],
            target_length: 3,
            retired: true,
        });
        if let Some(id) = off_main {
            w.branches.push(Path {
                kind: PathKind::Branch,
                sub_path: vec![id],
                target_length: 3,
                retired: true,
            });
        }
        let marks = overlay_of(&w.snapshot());
        assert_eq!(marks[shared.row * 12 + shared.col], Overlay::Main);
        if let Some(id) = off_main {
            assert_ne!(marks[id.row * 12 + id.col], Overlay::None);
            assert_ne!(marks[id.row * 12 + id.col], Overlay::Main);
        }
    }

    #[test]
    fn map_rows_follow_view_mode() {
        let w = seeded(10, 2);
        let mut r = Renderer::new(false, false);
        r.term_h = 100;
        assert_eq!(r.map_rows(&w.snapshot()), 20..30);
        r.full_view = true;
        assert_eq!(r.map_rows(&w.snapshot()), 0..30);
    }

    #[test]
    fn map_rows_clip_to_terminal_keeping_bottom() {
        let w = seeded(10, 3);
        let mut r = Renderer::new(true, false);
        r.term_h = RESERVED_ROWS + 8;
        assert_eq!(r.map_rows(&w.snapshot()), 22..30);
    }

    #[test]
    fn compose_draws_character_and_hud() {
        let w = seeded(8, 4);
        let mut r = Renderer::new(false, true);
        r.term_w = 40;
        r.term_h = 40;
        r.front.resize(40, 40);
        let snap = w.snapshot();
        let rows = r.map_rows(&snap);
        r.compose_hud(&snap);
        r.compose_map(&snap, rows.clone());

        let ch = w.character.cell;
        let y = MAP_ROW + (ch.row - rows.start);
        assert_eq!(r.front.get(ch.col * CELL_W, y).ch, '@');
        assert_eq!(r.front.get(1, HUD_ROW).ch, 'R');
        // left border column is wall
        assert_eq!(r.front.get(0, MAP_ROW).ch, '▒');
    }
}
