/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// Build the frame into the front buffer, emit terminal commands only
/// for cells that differ from the previous frame, flush once, swap.
/// World rects map to cells at CELL_W × CELL_H world units per cell.
///
/// Mouse capture is enabled alongside the alternate screen so the
/// input layer sees pointer events.

use std::io::{self, BufWriter, Stdout, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::domain::entity::{bounds_of, Block, Entity, EntityKind, GoalKind, Handle, Tint};
use crate::domain::geometry::{Rect, Vec2};
use crate::sim::progress::Progress;
use crate::sim::world::{Mode, WorldState};
use crate::ui::{CELL_H, CELL_W};

// ── Palette ──

const BG: Color = Color::Rgb { r: 24, g: 24, b: 28 };
const WALL: Color = Color::Rgb { r: 155, g: 83, b: 19 };
const NO_DRAG: Color = Color::Rgb { r: 150, g: 0, b: 175 };
const NO_MOVE: Color = Color::Rgb { r: 0, g: 0, b: 245 };
const DOOR_LOCKED: Color = Color::Rgb { r: 60, g: 60, b: 60 };
const DOOR_OPEN: Color = Color::Rgb { r: 135, g: 135, b: 135 };
const SENSOR: Color = Color::Rgb { r: 0, g: 206, b: 209 };
const GOLD: Color = Color::Rgb { r: 255, g: 215, b: 0 };
const GREEN: Color = Color::Rgb { r: 0, g: 215, b: 0 };
const RED: Color = Color::Rgb { r: 245, g: 0, b: 0 };
const GHOST: Color = Color::Rgb { r: 90, g: 90, b: 110 };
const TEXT: Color = Color::Rgb { r: 230, g: 230, b: 230 };
const BAR_FILL: Color = Color::Rgb { r: 0, g: 191, b: 255 };
const BAR_EMPTY: Color = Color::Rgb { r: 60, g: 60, b: 60 };

// ── Cell / frame buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: TEXT, bg: BG };
}

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) -> bool {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
            return true;
        }
        false
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i, y, Cell { ch, fg, bg });
        }
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let x = (self.width.saturating_sub(s.chars().count())) / 2;
        self.put_str(x, y, s, fg, bg);
    }

    /// Fill the cell region covered by a world-space rect.
    fn fill_rect(&mut self, r: &Rect, ch: char, fg: Color, bg: Color) {
        let x0 = (r.x / CELL_W).floor().max(0.0) as usize;
        let y0 = (r.y / CELL_H).floor().max(0.0) as usize;
        let x1 = ((r.x + r.w) / CELL_W).ceil().max(0.0) as usize;
        let y1 = ((r.y + r.h) / CELL_H).ceil().max(0.0) as usize;
        for y in y0..y1.min(self.height) {
            for x in x0..x1.min(self.width) {
                self.set(x, y, Cell { ch, fg, bg });
            }
        }
    }
}

// ── Renderer ──

pub struct Renderer {
    out: BufWriter<Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    force_full: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            out: BufWriter::with_capacity(1 << 16, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            force_full: true,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(self.out, EnterAlternateScreen, EnableMouseCapture, Hide, Clear(ClearType::All))?;
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.out, DisableMouseCapture, LeaveAlternateScreen, Show, ResetColor)?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub fn render(&mut self, world: &WorldState, progress: &Progress) -> io::Result<()> {
        let (tw, th) = terminal::size()?;
        let (tw, th) = (tw as usize, th as usize);
        if self.front.resize(tw, th) {
            self.back.resize(tw, th);
            self.force_full = true;
        }
        self.front.clear();

        match world.mode() {
            Mode::LevelSelect => draw_level_select(&mut self.front, world, progress),
            mode => {
                draw_scene(&mut self.front, world);
                draw_overlay(&mut self.front, world, mode);
            }
        }

        self.flush_diff()
    }

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = None;
        let mut last_bg = None;
        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.cells[y * self.front.width + x];
                let prev = self.back.cells[y * self.back.width + x];
                if !self.force_full && cell == prev {
                    x += 1;
                    continue;
                }
                queue!(self.out, MoveTo(x as u16, y as u16))?;
                if last_fg != Some(cell.fg) {
                    queue!(self.out, SetForegroundColor(cell.fg))?;
                    last_fg = Some(cell.fg);
                }
                if last_bg != Some(cell.bg) {
                    queue!(self.out, SetBackgroundColor(cell.bg))?;
                    last_bg = Some(cell.bg);
                }
                queue!(self.out, Print(cell.ch))?;
                x += 1;
            }
        }
        self.out.flush()?;
        std::mem::swap(&mut self.front, &mut self.back);
        self.force_full = false;
        Ok(())
    }
}

// ── Scene ──

fn draw_scene(buf: &mut FrameBuffer, world: &WorldState) {
    let shift = world.shift.amount;

    let blocks = |buf: &mut FrameBuffer, list: &[Block], ch: char, bg: Color| {
        for b in list {
            buf.fill_rect(&b.rect(shift), ch, TEXT, bg);
        }
    };

    blocks(buf, &world.sensors, '=', SENSOR);
    blocks(buf, &world.walls, ' ', WALL);
    blocks(buf, &world.doors.locked, '#', DOOR_LOCKED);
    blocks(buf, &world.no_drag_zones, ' ', NO_DRAG);
    blocks(buf, &world.no_move_zones, ' ', NO_MOVE);
    blocks(buf, &world.doors.unlocked, '\'', DOOR_OPEN);

    for sign in &world.signs {
        buf.fill_rect(&sign.body.rect(shift), '?', BG, GOLD);
    }

    for (i, goal) in world.goals.iter().enumerate() {
        if world.drag.as_ref().map(|g| g.target) != Some(Handle::Goal(i)) {
            draw_entity(buf, goal, shift);
        }
    }
    for (i, enemy) in world.enemies.iter().enumerate() {
        if world.drag.as_ref().map(|g| g.target) != Some(Handle::Enemy(i)) {
            draw_entity(buf, enemy, shift);
        }
    }
    draw_entity(buf, &world.player, shift);

    // The dragged entity draws last, on top of everything.
    if let Some(gesture) = &world.drag {
        draw_entity(buf, world.entity(gesture.target), shift);
    }

    draw_hud(buf, world);
}

fn draw_entity(buf: &mut FrameBuffer, e: &Entity, shift: Vec2) {
    if let Some(ghost) = e.ghost {
        let r = Rect::new(ghost.x, ghost.y, e.size.x, e.size.y);
        buf.fill_rect(&r, glyph(e), GHOST, BG);
    }

    let r = bounds_of(e, shift);
    let fg = match (e.tint, e.kind) {
        (Some(Tint::Ready), _) => GREEN,
        (Some(Tint::Cooldown), _) | (Some(Tint::Obstructed), _) => RED,
        (None, EntityKind::Player) => GREEN,
        (None, EntityKind::Goal(_)) => GOLD,
        (None, _) => RED,
    };
    buf.fill_rect(&r, glyph(e), fg, BG);
}

fn glyph(e: &Entity) -> char {
    match e.kind {
        EntityKind::Player => '@',
        EntityKind::Guard => 'G',
        EntityKind::Spikes => '^',
        EntityKind::Boulder => 'O',
        EntityKind::Goal(GoalKind::Portable) => '*',
        EntityKind::Goal(GoalKind::Final) => '!',
        EntityKind::Goal(GoalKind::Stationary) => 'F',
    }
}

fn draw_hud(buf: &mut FrameBuffer, world: &WorldState) {
    let status = if world.message_timer > 0 {
        format!(" {}  |  {}", world.level_name, world.message)
    } else {
        format!(" {}", world.level_name)
    };
    buf.put_str(0, 0, &status, TEXT, BG);

    // Activated sign text, one line under the status row.
    for sign in &world.signs {
        if sign.activated {
            buf.put_str(1, 1, &sign.text, BG, GOLD);
            break;
        }
    }

    // Cooldown bar on the bottom row.
    if buf.height == 0 {
        return;
    }
    let row = buf.height - 1;
    let bar_w = (buf.width / 3).max(10);
    let x0 = (buf.width - bar_w) / 2;
    let filled = (world.ability.completion() * bar_w as f64) as usize;
    for i in 0..bar_w {
        let bg = if i < filled { BAR_FILL } else { BAR_EMPTY };
        buf.set(x0 + i, row, Cell { ch: ' ', fg: TEXT, bg });
    }
}

// ── Overlays ──

fn draw_overlay(buf: &mut FrameBuffer, world: &WorldState, mode: Mode) {
    let title = match mode {
        Mode::Paused => "PAUSED",
        Mode::LevelComplete => "LEVEL COMPLETE",
        Mode::GameOver { error: false } => "GAME OVER",
        Mode::GameOver { error: true } => "AN ERROR OCCURRED",
        Mode::GameComplete => "CONGRATULATIONS!!!",
        _ => return,
    };

    let mid = buf.height / 2;
    let top = mid.saturating_sub(4);
    buf.put_centered(top, title, TEXT, RED);
    if mode == (Mode::GameOver { error: true }) {
        buf.put_centered(top + 1, "Please contact your local developer who isn't local", TEXT, BG);
    }
    if mode == Mode::GameComplete {
        buf.put_centered(top + 1, "YOU FOUND THE ONE TRUE BAGEL!!!!!", GOLD, BG);
        buf.put_centered(top + 3, "[Enter] Level Select", TEXT, BG);
        return;
    }

    for (i, option) in mode.menu_options().iter().enumerate() {
        let selected = i == world.menu_cursor;
        let (fg, bg) = if selected { (BG, GREEN) } else { (TEXT, BG) };
        let label = if selected { format!("> {option} <") } else { option.to_string() };
        buf.put_centered(top + 2 + i * 2, &label, fg, bg);
    }
}

fn draw_level_select(buf: &mut FrameBuffer, world: &WorldState, progress: &Progress) {
    buf.put_centered(1, "DRAGFALL", GOLD, BG);
    buf.put_centered(2, "Select a level  ([Enter] play, [Ctrl-C] quit)", TEXT, BG);

    for (i, name) in world.level_names.iter().enumerate() {
        let unlocked = progress.is_unlocked(i);
        let marker = if progress.is_completed(i) {
            '*'
        } else if unlocked {
            ' '
        } else {
            '#'
        };
        let selected = i == world.select_cursor;
        let fg = if unlocked { TEXT } else { BAR_EMPTY };
        let (fg, bg) = if selected { (BG, if unlocked { GREEN } else { RED }) } else { (fg, BG) };
        let line = format!("{marker} {name}");
        buf.put_centered(4 + i, &line, fg, bg);
    }
}
