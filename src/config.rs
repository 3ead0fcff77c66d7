use std::time::Duration;

/// Immutable per-session configuration. Everything is in grid units except
/// `block_size` (pixels per grid unit) and `fps`.
#[derive(Clone, Debug)]
pub struct GameConfig {
    pub grid_width: f64,
    pub grid_height: f64,
    pub block_size: usize,
    pub player_x: f64,
    pub player_size: f64,
    pub gravity: f64,
    pub flap_strength: f64,
    /// Half-height of the gap band: the band is `gap_center ± gap_height`.
    pub gap_height: f64,
    pub obstacle_width: f64,
    pub obstacle_speed: f64,
    /// A new obstacle spawns once the tail obstacle is this far from the right edge.
    pub spawn_distance: f64,
    pub fps: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            grid_width: 256.0,
            grid_height: 128.0,
            block_size: 2,
            player_x: 30.0,
            player_size: 4.0,
            gravity: 0.5,
            flap_strength: -4.0,
            gap_height: 20.0,
            obstacle_width: 10.0,
            obstacle_speed: 3.0,
            spawn_distance: 100.0,
            fps: 30,
        }
    }
}

impl GameConfig {
    /// Config scaled to a terminal pixel surface of `cols` x `px_rows`
    /// (pixel rows, i.e. terminal rows * 2 with half-block rendering),
    /// preserving the canonical 256x128 ratios.
    pub fn fitted(cols: usize, px_rows: usize) -> Self {
        let base = GameConfig::default();
        let wx = cols as f64 / base.grid_width;
        let wy = px_rows as f64 / base.grid_height;

        GameConfig {
            grid_width: cols as f64,
            grid_height: px_rows as f64,
            block_size: 1,
            player_x: (base.player_x * wx).max(6.0),
            player_size: (base.player_size * wy).max(2.0),
            gravity: base.gravity * wy,
            flap_strength: base.flap_strength * wy,
            gap_height: (base.gap_height * wy).max(5.0),
            obstacle_width: (base.obstacle_width * wx).max(3.0),
            obstacle_speed: (base.obstacle_speed * wx).max(0.8),
            spawn_distance: (base.spawn_distance * wx).max(24.0),
            ..base
        }
    }

    pub fn floor_y(&self) -> f64 {
        self.grid_height - self.player_size
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }

    /// Pixel dimensions of the rendering surface.
    pub fn surface(&self) -> (usize, usize) {
        (
            self.grid_width as usize * self.block_size,
            self.grid_height as usize * self.block_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_surface_is_grid_times_block() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.surface(), (512, 256));
    }

    #[test]
    fn fitted_keeps_gap_wider_than_player() {
        let cfg = GameConfig::fitted(80, 48);
        assert!(cfg.gap_height * 2.0 > cfg.player_size);
        assert!(cfg.player_x < cfg.grid_width);
    }

    #[test]
    fn tick_interval_follows_fps() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.tick_interval(), Duration::from_secs_f64(1.0 / 30.0));
    }
}
