/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The renderer never reads the world directly. It draws the `DrawList`
/// a step produced: each sprite's sheet cell is shown as a small
/// stick-figure pose, mirrored when the sprite's x scale is negative.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::{ArchetypeConfig, GameConfig};
use crate::domain::entity::Role;
use crate::sim::draw::{DrawList, SpriteDraw, Tint, UiElement};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// gap between rows matches the cells on VTE-based terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color) -> Self {
        Cell { ch, fg, bg: Cell::BASE_BG }
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

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg));
        }
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color) {
        let x = self.width.saturating_sub(s.chars().count()) / 2;
        self.put_str(x, y, s, fg);
    }
}

// ── Poses ──

/// Rows of one pose, drawn facing right. Spaces are transparent.
type Pose = [&'static str; POSE_H];

const POSE_H: usize = 3;
const POSE_W: usize = 6;

const IDLE: [Pose; 2] = [
    ["  o   ", " /|\\_ ", " / \\  "],
    ["  o   ", " /|\\_ ", " | |  "],
];

const RUN: [Pose; 2] = [
    ["  o   ", " /|\\_ ", " /  > "],
    ["  o   ", " /|\\_ ", "  |\\  "],
];

const ATTACK: [Pose; 5] = [
    ["  o | ", " /|/  ", " / \\  "],
    ["  o / ", " /|/  ", " / \\  "],
    ["  o   ", " /|-- ", " / \\  "],
    ["  o   ", " /|---", " / \\  "],
    ["  o   ", " /|\\  ", " / \\_ "],
];

const CHARGE: [Pose; 2] = [
    ["  o   ", " <|== ", " / \\  "],
    [" *o*  ", " <|== ", " / \\  "],
];

const JUMP: Pose = [" \\o/  ", "  |   ", " / \\  "];
const FALL: Pose = ["  o   ", " /|\\  ", " | |  "];

const DEATH: [Pose; 4] = [
    ["  o   ", " /|\\  ", " / \\  "],
    ["      ", "  o/  ", " /|\\  "],
    ["      ", "      ", " o/_\\ "],
    ["      ", "      ", " o____"],
];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum PoseKind {
    Idle,
    Run,
    Attack,
    Charge,
    Jump,
    Fall,
    Death,
}

/// Recover which animation a sheet row belongs to.
fn pose_kind(arch: &ArchetypeConfig, row: u32) -> PoseKind {
    let c = &arch.clips;
    [
        (c.idle.row, PoseKind::Idle),
        (c.run.row, PoseKind::Run),
        (c.attack.row, PoseKind::Attack),
        (c.charge.row, PoseKind::Charge),
        (c.jump.row, PoseKind::Jump),
        (c.fall.row, PoseKind::Fall),
        (c.death.row, PoseKind::Death),
    ]
    .iter()
    .find(|(r, _)| *r == row)
    .map(|(_, k)| *k)
    .unwrap_or(PoseKind::Idle)
}

fn pose_for(kind: PoseKind, col: usize) -> &'static Pose {
    match kind {
        PoseKind::Idle => &IDLE[(col / 2) % IDLE.len()],
        PoseKind::Run => &RUN[col % RUN.len()],
        PoseKind::Attack => &ATTACK[col.min(ATTACK.len() - 1)],
        PoseKind::Charge => &CHARGE[col % CHARGE.len()],
        PoseKind::Jump => &JUMP,
        PoseKind::Fall => &FALL,
        PoseKind::Death => &DEATH[col.min(DEATH.len() - 1)],
    }
}

fn mirror_char(c: char) -> char {
    match c {
        '/' => '\\',
        '\\' => '/',
        '<' => '>',
        '>' => '<',
        '(' => ')',
        ')' => '(',
        other => other,
    }
}

/// One pose row as drawn, mirrored for left-facing sprites.
fn pose_row(row: &str, mirrored: bool) -> Vec<char> {
    if mirrored {
        row.chars().rev().map(mirror_char).collect()
    } else {
        row.chars().collect()
    }
}

// ── Colors ──

const PLAYER_FG: Color = Color::Rgb { r: 120, g: 200, b: 255 };
const ENEMY_FG: Color = Color::Rgb { r: 230, g: 180, b: 80 };
const FLASH_FG: Color = Color::Rgb { r: 255, g: 60, b: 60 };
const GROUND_FG: Color = Color::Rgb { r: 70, g: 70, b: 90 };
const BANNER_FG: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const HEART_FG: Color = Color::Rgb { r: 230, g: 40, b: 60 };

// ── Renderer ──

/// Rows reserved above the arena for instructions and hearts.
const HUD_ROWS: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_screen: Option<UiElement>,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_screen: None,
            enhanced_keys: false,
        }
    }

    /// Enter the alternate screen. Returns whether the terminal will
    /// report key releases.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            EnableMouseCapture,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        self.enhanced_keys = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if self.enhanced_keys {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        tracing::debug!(enhanced_keys = self.enhanced_keys, "terminal initialised");

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, draws: &DrawList, cfg: &GameConfig) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Screen change → clear for clean transition
        let screen = draws.ui.first().copied();
        if screen != self.last_screen {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_screen = screen;
        }

        self.front.clear();
        compose(&mut self.front, draws, cfg);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colors; ResetColor would fall back to the
        // terminal's own default and leave line artifacts.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}

// ── Compose: build front buffer content ──

/// Terminal row of the ground line.
fn ground_row(buf: &FrameBuffer) -> usize {
    buf.height.saturating_sub(3).max(HUD_ROWS + POSE_H)
}

fn compose(buf: &mut FrameBuffer, draws: &DrawList, cfg: &GameConfig) {
    let ground = ground_row(buf);
    for x in 0..buf.width {
        buf.set(x, ground, Cell::new('─', GROUND_FG));
    }

    for sprite in &draws.sprites {
        let arch = match sprite.sheet {
            Role::Player => &cfg.player,
            Role::Enemy => &cfg.enemy,
        };
        compose_sprite(buf, sprite, arch, cfg, ground);
    }

    let mid = ground.saturating_sub(POSE_H + 4) / 2 + HUD_ROWS;
    for el in &draws.ui {
        match *el {
            UiElement::Instructions => buf.put_centered(0, el.text(), Color::White),
            UiElement::Health { current, max, visible } => {
                if visible {
                    let hearts: String = (0..max).map(|i| if i < current { '♥' } else { '♡' }).collect();
                    buf.put_str(1, 1, &hearts, HEART_FG);
                }
            }
            UiElement::StartPrompt => buf.put_centered(mid, el.text(), Color::White),
            UiElement::WinBanner | UiElement::LoseBanner => buf.put_centered(mid, el.text(), BANNER_FG),
            UiElement::PlayAgainPrompt | UiElement::RespawnPrompt => {
                buf.put_centered(mid + 2, el.text(), Color::White)
            }
        }
    }
}

fn compose_sprite(
    buf: &mut FrameBuffer,
    sprite: &SpriteDraw,
    arch: &ArchetypeConfig,
    cfg: &GameConfig,
    ground: usize,
) {
    let arena = &cfg.arena;
    let row = sprite.source.y / arena.frame_height.max(1);
    let col = (sprite.source.x / arena.frame_width.max(1)) as usize;
    let pose = pose_for(pose_kind(arch, row), col);
    let mirrored = sprite.scale.x < 0.0;

    let (left, right) = sprite.world_span();
    let centre = (left + right) / 2.0;
    let cols = buf.width.max(1) as f32;
    let x0 = (centre / arena.width * cols) as isize - (POSE_W / 2) as isize;

    // Height above the ground in rows: one sprite height spans the pose.
    let world_per_row = (arena.scale * arena.frame_height as f32) / POSE_H as f32;
    let lift = ((arena.ground - sprite.position.y) / world_per_row).round().max(0.0) as usize;
    let bottom = ground.saturating_sub(1 + lift);

    let fg = if sprite.tint == Tint::HIT_FLASH {
        FLASH_FG
    } else {
        match sprite.sheet {
            Role::Player => PLAYER_FG,
            Role::Enemy => ENEMY_FG,
        }
    };

    for (i, line) in pose.iter().enumerate() {
        let y = match (bottom + i + 1).checked_sub(POSE_H) {
            Some(y) if y >= HUD_ROWS => y,
            _ => continue,
        };
        for (dx, ch) in pose_row(line, mirrored).into_iter().enumerate() {
            let x = x0 + dx as isize;
            if ch != ' ' && x >= 0 {
                buf.set(x as usize, y, Cell::new(ch, fg));
            }
        }
    }
}
