/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. The simulation drives a `Canvas` through the `Stage` trait
///   2. Each frame composites the canvas into the `front` buffer (array of Cell)
///   3. Compare each cell with `back` buffer (previous frame)
///   4. Only emit terminal commands for cells that changed
///   5. All commands are batched with `queue!`, flushed once at the end
///   6. Swap front/back

use std::collections::BTreeMap;
use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::tile::{Plane, Rgb};
use crate::sim::stage::{SpriteId, Stage};
use crate::sim::world::{WorldState, DEFAULT_FLOOR};

/// Ticks a flashed cell takes to fade back.
const FLASH_FRAMES: u8 = 20;

// ── Canvas: what the simulation has placed ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Sprite {
    plane: Plane,
    x: usize,
    y: usize,
    color: Rgb,
    alpha: u8,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Flash {
    x: usize,
    y: usize,
    frames_left: u8,
}

/// Grid-level visuals mirrored from the simulation: per-cell tint,
/// one-cell sprites and fading flashes.
#[derive(Default)]
pub struct Canvas {
    width: usize,
    height: usize,
    tints: Vec<Rgb>,
    sprites: BTreeMap<SpriteId, Sprite>,
    flashes: Vec<Flash>,
    next_id: u32,
}

impl Canvas {
    pub fn new() -> Self {
        Canvas::default()
    }

    /// Final color of every cell, row-major.
    pub fn composite(&self) -> Vec<Rgb> {
        let mut out = self.tints.clone();

        let mut layered: Vec<&Sprite> = self.sprites.values().collect();
        layered.sort_by_key(|s| s.plane.depth());
        for s in layered {
            if s.x < self.width && s.y < self.height {
                let idx = s.y * self.width + s.x;
                out[idx] = blend(out[idx], s.color, s.alpha);
            }
        }

        for f in &self.flashes {
            let idx = f.y * self.width + f.x;
            let alpha = (255 * f.frames_left as u32 / FLASH_FRAMES as u32) as u8;
            out[idx] = blend(out[idx], Rgb::WHITE, alpha);
        }
        out
    }

    /// Advance flash fades by one tick.
    pub fn fade(&mut self) {
        for f in &mut self.flashes {
            f.frames_left = f.frames_left.saturating_sub(1);
        }
        self.flashes.retain(|f| f.frames_left > 0);
    }

    fn in_grid(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }
}

impl Stage for Canvas {
    fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.tints = vec![DEFAULT_FLOOR; width * height];
        self.flashes.clear();
    }

    fn tint(&mut self, x: usize, y: usize, color: Rgb) {
        if self.in_grid(x, y) {
            self.tints[y * self.width + x] = color;
        }
    }

    fn spawn(&mut self, plane: Plane, x: usize, y: usize, color: Rgb, alpha: u8) -> SpriteId {
        let id = SpriteId(self.next_id);
        self.next_id += 1;
        self.sprites.insert(id, Sprite { plane, x, y, color, alpha });
        id
    }

    fn move_to(&mut self, sprite: SpriteId, x: usize, y: usize) {
        if let Some(s) = self.sprites.get_mut(&sprite) {
            s.x = x;
            s.y = y;
        }
    }

    fn remove(&mut self, sprite: SpriteId) {
        self.sprites.remove(&sprite);
    }

    fn flash(&mut self, x: usize, y: usize) {
        if !self.in_grid(x, y) {
            return;
        }
        self.flashes.retain(|f| (f.x, f.y) != (x, y));
        self.flashes.push(Flash { x, y, frames_left: FLASH_FRAMES });
    }
}

/// Alpha-composite `over` onto `base`.
fn blend(base: Rgb, over: Rgb, alpha: u8) -> Rgb {
    let mix = |b: u8, o: u8| -> u32 {
        (o as u32 * alpha as u32 + b as u32 * (255 - alpha as u32)) / 255
    };
    Rgb(mix(base.r(), over.r()) << 16 | mix(base.g(), over.g()) << 8 | mix(base.b(), over.b()))
}

fn term_color(c: Rgb) -> Color {
    Color::Rgb { r: c.r(), g: c.g(), b: c.b() }
}

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells. Using the
    /// same RGB for `Clear(ClearType::All)` and every cell keeps VTE
    /// terminals from showing gap lines between rows.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = fg;
        cell.bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        cell
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
        for (cx, ch) in (x..self.width).zip(s.chars()) {
            self.set(cx, y, Cell::from_char(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', Color::White, bg));
        }
    }
}

// ── Renderer ──

/// Each game cell = 2 terminal columns, which keeps cells roughly square.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const STATUS_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    pub canvas: Canvas,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            canvas: Canvas::new(),
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

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
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

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        self.compose(world);

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

        // Explicit base colors; ResetColor would fall back to the terminal's
        // own default and leave line artifacts.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
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
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, w: &WorldState) {
        // ── HUD row ──
        let hud = format!(
            " {:<12}  Eggs:{}/{}  {}",
            w.current_room.unwrap_or(""),
            w.progress.eggs, w.egg_total,
            if w.player.has_key { "Key" } else { "" },
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Map, centered horizontally ──
        let cells = self.canvas.composite();
        let map_w = self.canvas.width * CELL_W;
        let left = self.front.width.saturating_sub(map_w) / 2;
        for gy in 0..self.canvas.height {
            for gx in 0..self.canvas.width {
                let bg = term_color(cells[gy * self.canvas.width + gx]);
                let col = left + gx * CELL_W;
                for dx in 0..CELL_W {
                    self.front.set(col + dx, MAP_ROW + gy, Cell::from_char(' ', Color::White, bg));
                }
            }
        }

        // ── Status line ──
        let status_row = MAP_ROW + self.canvas.height + 1;
        let status = w.status.visible();
        if !status.is_empty() {
            self.front.fill_row(status_row, STATUS_BG);
            self.front.put_str(1, status_row, status, Color::Black, STATUS_BG);
        }

        // ── Help bar ──
        let help = " Arrows/WASD:Move  Esc:Quit";
        self.front.put_str(0, status_row + 2, help, Color::DarkGrey, Color::Reset);
    }
}

/// The renderer is the stage the simulation draws on.
impl Stage for Renderer {
    fn resize(&mut self, width: usize, height: usize) {
        self.canvas.resize(width, height);
        // Room change: old map cells must not linger outside the new grid.
        self.back.cells.fill(Cell::INVALID);
    }

    fn tint(&mut self, x: usize, y: usize, color: Rgb) {
        self.canvas.tint(x, y, color);
    }

    fn spawn(&mut self, plane: Plane, x: usize, y: usize, color: Rgb, alpha: u8) -> SpriteId {
        self.canvas.spawn(plane, x, y, color, alpha)
    }

    fn move_to(&mut self, sprite: SpriteId, x: usize, y: usize) {
        self.canvas.move_to(sprite, x, y);
    }

    fn remove(&mut self, sprite: SpriteId) {
        self.canvas.remove(sprite);
    }

    fn flash(&mut self, x: usize, y: usize) {
        self.canvas.flash(x, y);
    }
}
