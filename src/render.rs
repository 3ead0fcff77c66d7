use crossterm::{
    cursor, queue,
    style::{self, Color as CColor},
};
use std::io::{self, Write};

use crate::config::GameConfig;
use crate::game::{Snapshot, State};

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

const BLACK: Rgb = Rgb(0, 0, 0);
const WHITE: Rgb = Rgb(255, 255, 255);
const PLAYER_COLOR: Rgb = Rgb(255, 0, 0);
const OBSTACLE_COLOR: Rgb = Rgb(0, 255, 0);

// ── Pixel buffer with half-block rendering ──────────────────────────────────

pub struct PixelBuf {
    w: usize,
    h: usize, // pixel height = terminal rows * 2
    px: Vec<Rgb>,
}

impl PixelBuf {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            px: vec![BLACK; w * h],
        }
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.px.resize(w * h, BLACK);
    }

    fn set(&mut self, x: i32, y: i32, c: Rgb) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.px[y as usize * self.w + x as usize] = c;
        }
    }

    fn get(&self, x: usize, y: usize) -> Rgb {
        self.px[y * self.w + x]
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, c: Rgb) {
        for dy in 0..h {
            for dx in 0..w {
                self.set(x + dx, y + dy, c);
            }
        }
    }

    fn clear(&mut self, c: Rgb) {
        self.px.fill(c);
    }

    fn dim(&mut self) {
        for c in &mut self.px {
            *c = Rgb(c.0 / 2, c.1 / 2, c.2 / 2);
        }
    }

    /// Flush to the terminal, two vertical pixels per cell via `▀`, emitting
    /// color escapes only when fg/bg actually change.
    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        queue!(out, cursor::MoveTo(0, 0))?;
        let rows = self.h / 2;
        let mut prev_fg = Rgb(0, 0, 0);
        let mut prev_bg = Rgb(0, 0, 0);
        let mut need_fg = true;
        let mut need_bg = true;

        for row in 0..rows {
            for col in 0..self.w {
                let top = self.get(col, row * 2);
                let bot = self.get(col, row * 2 + 1);

                if top == bot {
                    if need_bg || prev_bg != top {
                        queue!(
                            out,
                            style::SetBackgroundColor(CColor::Rgb {
                                r: top.0,
                                g: top.1,
                                b: top.2
                            })
                        )?;
                        prev_bg = top;
                        need_bg = false;
                    }
                    queue!(out, style::Print(' '))?;
                } else {
                    if need_fg || prev_fg != top {
                        queue!(
                            out,
                            style::SetForegroundColor(CColor::Rgb {
                                r: top.0,
                                g: top.1,
                                b: top.2
                            })
                        )?;
                        prev_fg = top;
                        need_fg = false;
                    }
                    if need_bg || prev_bg != bot {
                        queue!(
                            out,
                            style::SetBackgroundColor(CColor::Rgb {
                                r: bot.0,
                                g: bot.1,
                                b: bot.2
                            })
                        )?;
                        prev_bg = bot;
                        need_bg = false;
                    }
                    queue!(out, style::Print('\u{2580}'))?; // ▀
                }
            }
            if row < rows - 1 {
                queue!(out, style::ResetColor, style::Print("\r\n"))?;
                need_fg = true;
                need_bg = true;
            }
        }
        queue!(out, style::ResetColor)?;
        out.flush()
    }
}

// ── 3x5 bitmap digits ──────────────────────────────────────────────────────

#[rustfmt::skip]
const DIGITS: [[u8; 15]; 10] = [
    [1,1,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1], // 0
    [0,1,0, 1,1,0, 0,1,0, 0,1,0, 1,1,1], // 1
    [1,1,1, 0,0,1, 1,1,1, 1,0,0, 1,1,1], // 2
    [1,1,1, 0,0,1, 0,1,1, 0,0,1, 1,1,1], // 3
    [1,0,1, 1,0,1, 1,1,1, 0,0,1, 0,0,1], // 4
    [1,1,1, 1,0,0, 1,1,1, 0,0,1, 1,1,1], // 5
    [1,1,1, 1,0,0, 1,1,1, 1,0,1, 1,1,1], // 6
    [1,1,1, 0,0,1, 0,1,0, 0,1,0, 0,1,0], // 7
    [1,1,1, 1,0,1, 1,1,1, 1,0,1, 1,1,1], // 8
    [1,1,1, 1,0,1, 1,1,1, 0,0,1, 1,1,1], // 9
];

fn draw_digit(buf: &mut PixelBuf, x: i32, y: i32, d: u8, fg: Rgb) {
    let glyph = &DIGITS[d as usize];
    for row in 0..5 {
        for col in 0..3 {
            if glyph[row * 3 + col] == 1 {
                buf.set(x + col as i32, y + row as i32, fg);
            }
        }
    }
}

fn draw_number(buf: &mut PixelBuf, cx: i32, y: i32, n: u32, fg: Rgb) {
    let s = n.to_string();
    let total_w = s.len() as i32 * 4 - 1; // 3px per digit + 1px spacing
    let start_x = cx - total_w / 2;
    for (i, ch) in s.chars().enumerate() {
        let d = ch as u8 - b'0';
        draw_digit(buf, start_x + i as i32 * 4, y, d, fg);
    }
}

// ── Scene ───────────────────────────────────────────────────────────────────

/// Draws read-only snapshots onto a pixel surface of
/// `(grid_width * block_size) x (grid_height * block_size)`.
pub struct Renderer {
    buf: PixelBuf,
}

impl Renderer {
    pub fn new(cfg: &GameConfig) -> Self {
        let (w, h) = cfg.surface();
        Renderer {
            buf: PixelBuf::new(w, h),
        }
    }

    pub fn resize(&mut self, cfg: &GameConfig) {
        let (w, h) = cfg.surface();
        self.buf.resize(w, h);
    }

    pub fn draw(&mut self, snap: &Snapshot<'_>, cfg: &GameConfig) {
        let bs = cfg.block_size as f64;
        self.buf.clear(BLACK);

        // Obstacle columns above and below each gap band.
        let (_, surface_h) = cfg.surface();
        for ob in snap.obstacles {
            let x = (ob.x * bs) as i32;
            let w = (cfg.obstacle_width * bs) as i32;
            let gap = ob.gap_center as f64;
            let band_top = ((gap - cfg.gap_height) * bs) as i32;
            let band_bot = ((gap + cfg.gap_height) * bs) as i32;
            self.buf.fill_rect(x, 0, w, band_top, OBSTACLE_COLOR);
            self.buf
                .fill_rect(x, band_bot, w, surface_h as i32 - band_bot, OBSTACLE_COLOR);
        }

        // Player square.
        let size = (cfg.player_size * bs) as i32;
        self.buf.fill_rect(
            (cfg.player_x * bs) as i32,
            (snap.player.y * bs) as i32,
            size,
            size,
            PLAYER_COLOR,
        );

        draw_number(&mut self.buf, 10, 3, snap.score, WHITE);

        if snap.state == State::GameOver {
            self.draw_game_over(snap, cfg);
        }
    }

    fn draw_game_over(&mut self, snap: &Snapshot<'_>, cfg: &GameConfig) {
        self.buf.dim();

        let (w, h) = cfg.surface();
        let cx = w as i32 / 2;
        let cy = h as i32 / 2;

        draw_number(&mut self.buf, cx, cy - 8, snap.score, WHITE);

        // Restart hint: a row of blocks standing in for text.
        let msg = "PRESS SPACE";
        let msg_w = msg.len() as i32 * 4;
        let msg_x = cx - msg_w / 2;
        for (i, ch) in msg.chars().enumerate() {
            if ch == ' ' {
                continue;
            }
            self.buf.fill_rect(msg_x + i as i32 * 4, cy + 4, 3, 3, WHITE);
        }
    }

    pub fn present(&self, out: &mut impl Write) -> io::Result<()> {
        self.buf.render(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Game;

    #[test]
    fn draws_player_pixels_at_scaled_position() {
        let cfg = GameConfig::default();
        let game = Game::new(cfg.clone(), 1);
        let mut renderer = Renderer::new(&cfg);
        renderer.draw(&game.snapshot(), &cfg);

        let snap = game.snapshot();
        let px = (cfg.player_x * cfg.block_size as f64) as i32;
        let py = (snap.player.y * cfg.block_size as f64) as i32;
        assert!(renderer.buf.get(px as usize, py as usize) == PLAYER_COLOR);
    }

    #[test]
    fn gap_band_stays_clear_of_obstacle_color() {
        let cfg = GameConfig::default();
        let mut game = Game::new(cfg.clone(), 1);
        // Bring the first obstacle into view.
        for _ in 0..10 {
            game.tick(false);
        }
        let mut renderer = Renderer::new(&cfg);
        renderer.draw(&game.snapshot(), &cfg);

        let snap = game.snapshot();
        let ob = &snap.obstacles[0];
        let bs = cfg.block_size as f64;
        let x = (ob.x * bs) as usize;
        assert!(x < renderer.buf.w);
        let mid = (ob.gap_center as f64 * bs) as usize;
        assert!(renderer.buf.get(x, mid) != OBSTACLE_COLOR);
        assert!(renderer.buf.get(x, 0) == OBSTACLE_COLOR);
    }
}
