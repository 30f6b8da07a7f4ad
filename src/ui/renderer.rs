/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// One 8×8 tile is drawn as two terminal columns on one row, so the
/// 128×128 pixel screen becomes a 32×16 character window.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{Facing, Hostile};
use crate::domain::tile::{TileGrid, TileKind, TILE_SIZE};
use crate::sim::world::{Phase, StageState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool,    // true = this char occupies 2 terminal columns
    cont: bool,    // true = continuation of previous wide char (skip render)
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    ///
    /// Using the same RGB for `Clear(ClearType::All)` and every cell keeps
    /// the inter-row gap on VTE terminals the same color as the cells.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: Cell = Cell {
        ch: [0; 4],
        ch_len: 0,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Sentinel that differs from any real cell; forces a full repaint.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn from_char_wide(c: char, fg: Color, bg: Color) -> Self {
        Cell { wide: true, ..Self::from_char(c, fg, bg) }
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or(" ")
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::from_char(ch, fg, bg));
        }
    }

    /// Two-column glyph for one game tile.
    fn put_tile(&mut self, col: usize, row: usize, glyph: Glyph) {
        self.set(col, row, Cell::from_char(glyph.0, glyph.2, glyph.3));
        self.set(col + 1, row, Cell::from_char(glyph.1, glyph.2, glyph.3));
    }
}

// ── Layout ──

/// Terminal columns per game tile.
const CELL_W: usize = 2;

/// Game tiles visible across and down (128 px / 8 px).
const VIEW_TILES: usize = 16;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const HELP_ROW: usize = MAP_ROW + VIEW_TILES + 1;
const BUF_W: usize = VIEW_TILES * CELL_W;
const BUF_H: usize = HELP_ROW + 1;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };

/// (left char, right char, fg, bg)
type Glyph = (char, char, Color, Color);

fn tile_glyph(kind: TileKind) -> Glyph {
    match kind {
        TileKind::Wall => ('▓', '▓', Color::Rgb { r: 150, g: 100, b: 60 }, Color::Rgb { r: 90, g: 55, b: 30 }),
        TileKind::Floor => ('▀', '▀', Color::Rgb { r: 90, g: 200, b: 90 }, Color::Reset),
        // Markers are spawned as entities; the tile itself draws as sky.
        TileKind::Spawn(_) | TileKind::GoalMarker | TileKind::Empty => (' ', ' ', Color::Reset, Color::Reset),
    }
}

/// Two-frame walk cycle, switching every 4 frames.
fn anim_step(frame: u64) -> bool {
    (frame / 4) % 2 == 0
}

fn player_glyph(facing: Facing, frame: u64) -> Glyph {
    let fg = Color::Rgb { r: 255, g: 220, b: 80 };
    let body = if anim_step(frame) { '@' } else { 'ö' };
    match facing {
        Facing::Left => ('<', body, fg, Color::Reset),
        Facing::Right => (body, '>', fg, Color::Reset),
    }
}

fn hostile_glyph(hostile: &Hostile, frame: u64) -> Glyph {
    let step = anim_step(frame);
    match hostile {
        Hostile::Enemy1(_) | Hostile::Enemy2(_) => {
            let fg = if matches!(hostile, Hostile::Enemy1(_)) {
                Color::Rgb { r: 255, g: 90, b: 90 }
            } else {
                Color::Rgb { r: 255, g: 150, b: 40 }
            };
            let feet = if step { 'm' } else { 'n' };
            match hostile.facing() {
                Some(Facing::Left) => ('<', feet, fg, Color::Reset),
                _ => (feet, '>', fg, Color::Reset),
            }
        }
        Hostile::Enemy3(_) => {
            let eye = if step { 'O' } else { 'o' };
            ('[', eye, Color::Rgb { r: 200, g: 120, b: 255 }, Color::Reset)
        }
        Hostile::Bullet(_) => ('•', ' ', Color::Rgb { r: 255, g: 255, b: 255 }, Color::Reset),
    }
}

/// Screen cell for an entity at pixel (x, y), relative to the first drawn
/// map column. None when it is outside the 16×16 window.
fn cell_of(x: f32, y: f32, first_col: i32) -> Option<(usize, usize)> {
    let tile = TILE_SIZE as f32;
    let cx = (x / tile).round() as i32 - first_col;
    let cy = (y / tile).round() as i32;
    let range = 0..VIEW_TILES as i32;
    (range.contains(&cx) && range.contains(&cy)).then_some((cx as usize, cy as usize))
}

fn hud_text(state: &StageState, tick_rate_ms: u64, voice_enabled: bool) -> String {
    let voice = if voice_enabled { state.last_intent.label() } else { "OFF" };
    format!(
        " STAGE:{}  TIME:{}  VOICE:{}",
        state.stage_index + 1,
        state.elapsed_secs(tick_rate_ms),
        voice,
    )
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    last_phase: Option<Phase>,
    tick_rate_ms: u64,
    voice_enabled: bool,
}

impl Renderer {
    pub fn new(tick_rate_ms: u64, voice_enabled: bool) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(8192, io::stdout()),
            front: FrameBuffer::new(BUF_W, BUF_H),
            back: FrameBuffer::new(BUF_W, BUF_H),
            last_phase: None,
            tick_rate_ms,
            voice_enabled,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        self.front.resize(BUF_W, BUF_H);
        self.back.resize(BUF_W, BUF_H);
        // Force full repaint on first frame.
        self.back.cells.fill(Cell::INVALID);
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

    pub fn render(&mut self, state: &StageState) -> io::Result<()> {
        // Phase change → clear for a clean transition
        if self.last_phase != Some(state.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(state.phase);
        }

        self.compose(state);
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the terminal's own default.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                if cell.cont {
                    if cell != prev { need_move = true; }
                    x += 1;
                    continue;
                }

                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;

                if cell.wide {
                    last_x = x + 1;
                    x += 2;
                } else {
                    last_x = x;
                    x += 1;
                }
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, state: &StageState) {
        self.front.clear();
        self.compose_hud(state);
        if state.phase != Phase::Loading {
            self.compose_stage(state);
        }
        match state.phase {
            Phase::Loading => self.compose_banner(&["LOADING"], Color::White),
            Phase::Playing => {}
            Phase::GameOver => self.compose_banner(
                &["GAME OVER", "", "Press SPACE to Restart"],
                Color::Rgb { r: 255, g: 60, b: 60 },
            ),
            Phase::Cleared => self.compose_banner(&["STAGE CLEAR!"], Color::Rgb { r: 80, g: 255, b: 80 }),
            Phase::Completed => self.compose_banner(
                &["ALL STAGES CLEAR!", "", "Press Q to Quit"],
                Color::Rgb { r: 255, g: 220, b: 50 },
            ),
        }
        let help = "←→ Move ↓ Stop SPC Jump R Voice";
        self.front.put_str(0, HELP_ROW, help, Color::DarkGrey, Color::Reset);
    }

    fn compose_hud(&mut self, state: &StageState) {
        for x in 0..self.front.width {
            self.front.set(x, HUD_ROW, Cell::from_char(' ', Color::White, HUD_BG));
        }
        let hud = hud_text(state, self.tick_rate_ms, self.voice_enabled);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    fn compose_stage(&mut self, state: &StageState) {
        let first_col = (state.camera.offset / TILE_SIZE as f32).floor() as i32;

        for vy in 0..VIEW_TILES {
            for vx in 0..VIEW_TILES {
                let kind = state.map.tile_at(first_col + vx as i32, vy as i32);
                self.front.put_tile(vx * CELL_W, MAP_ROW + vy, tile_glyph(kind));
            }
        }

        if let Some(goal) = state.goal {
            if let Some((cx, cy)) = cell_of(goal.x, goal.y, first_col) {
                let col = cx * CELL_W;
                self.front.set(col, MAP_ROW + cy, Cell::from_char_wide('🚩', Color::Reset, Color::Reset));
                self.front.set(col + 1, MAP_ROW + cy, Cell::WIDE_CONT);
            }
        }

        for hostile in &state.hostiles {
            let (x, y) = hostile.pos();
            if let Some((cx, cy)) = cell_of(x, y, first_col) {
                self.front.put_tile(cx * CELL_W, MAP_ROW + cy, hostile_glyph(hostile, state.frame));
            }
        }

        let p = &state.player;
        if let Some((cx, cy)) = cell_of(p.x, p.y, first_col) {
            // Frozen pose once the player stops moving horizontally.
            let frame = if p.dx == 0.0 { 0 } else { state.frame };
            self.front.put_tile(cx * CELL_W, MAP_ROW + cy, player_glyph(p.facing, frame));
        }
    }

    /// Centered message lines over the map area.
    fn compose_banner(&mut self, lines: &[&str], fg: Color) {
        let top = MAP_ROW + (VIEW_TILES - lines.len()) / 2;
        for (i, line) in lines.iter().enumerate() {
            let len = line.chars().count();
            let x = BUF_W.saturating_sub(len) / 2;
            self.front.put_str(x, top + i, line, fg, Color::Rgb { r: 40, g: 40, b: 40 });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{DirectionIntent, Goal, Shooter};
    use crate::domain::tile::TileMap;
    use crate::sim::camera::ScrollCamera;

    fn row_text(r: &Renderer, y: usize) -> String {
        (0..r.front.width)
            .map(|x| r.front.get(x, y))
            .filter(|c| !c.cont)
            .map(|c| c.as_str().to_string())
            .collect()
    }

    fn playing(rows: &[&str]) -> StageState {
        let mut s = StageState::new();
        s.map = TileMap::from_rows(rows);
        s.camera = ScrollCamera::for_level(s.map.pixel_width() as f32, 128.0);
        s.phase = Phase::Playing;
        s
    }

    // ── placement ──

    #[test]
    fn entity_cells_follow_scroll() {
        assert_eq!(cell_of(0.0, 0.0, 0), Some((0, 0)));
        assert_eq!(cell_of(83.0, 118.0, 0), Some((10, 15)));
        assert_eq!(cell_of(83.0, 118.0, 4), Some((6, 15)));
        assert_eq!(cell_of(20.0, 0.0, 4), None);
        assert_eq!(cell_of(0.0, 130.0, 0), None);
    }

    #[test]
    fn hud_shows_stage_time_and_voice() {
        let mut s = StageState::new();
        s.stage_index = 1;
        s.frame = 95;
        s.last_intent = DirectionIntent::Right;
        assert_eq!(hud_text(&s, 33, true), " STAGE:2  TIME:3  VOICE:RIGHT");
        assert_eq!(hud_text(&s, 33, false), " STAGE:2  TIME:3  VOICE:OFF");
    }

    // ── composition ──

    #[test]
    fn map_window_starts_at_camera_column() {
        let mut s = playing(&["", "", "", "", "", "", "", "", "", "", "", "", "", "", "", "#################=="]);
        s.player.y = 8.0;
        let mut r = Renderer::new(33, false);
        r.compose(&s);
        assert!(row_text(&r, MAP_ROW + 15).starts_with("▓▓"));

        s.camera.offset = 16.0;
        r.compose(&s);
        let bottom = row_text(&r, MAP_ROW + 15);
        assert_eq!(bottom.chars().count(), BUF_W);
        assert!(bottom.ends_with("▀▀"));
    }

    #[test]
    fn entities_are_drawn_over_tiles() {
        let mut s = playing(&["                "; 16]);
        s.goal = Some(Goal { x: 120.0, y: 0.0 });
        s.hostiles.push(Hostile::Enemy3(Shooter::new(8.0, 0.0)));
        let mut r = Renderer::new(33, false);
        r.compose(&s);
        let top = row_text(&r, MAP_ROW);
        assert!(top.starts_with("@>[O"));
        assert!(top.ends_with('🚩'));
    }

    #[test]
    fn game_over_overlay_prompts_restart() {
        let mut s = playing(&["    "; 16]);
        s.phase = Phase::GameOver;
        let mut r = Renderer::new(33, true);
        r.compose(&s);
        let text: Vec<String> = (0..BUF_H).map(|y| row_text(&r, y)).collect();
        assert!(text.iter().any(|l| l.contains("GAME OVER")));
        assert!(text.iter().any(|l| l.contains("Press SPACE to Restart")));
    }
}
