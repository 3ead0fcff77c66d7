use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::GameConfig;
use crate::decision::Observation;

pub struct Player {
    pub y: f64,
    pub velocity: f64,
}

impl Player {
    fn new(cfg: &GameConfig) -> Self {
        Player {
            y: cfg.grid_height / 2.0,
            velocity: 0.0,
        }
    }

    /// Fixed upward impulse, regardless of prior velocity.
    pub fn flap(&mut self, cfg: &GameConfig) {
        self.velocity = cfg.flap_strength;
    }

    pub fn update(&mut self, cfg: &GameConfig) {
        self.velocity += cfg.gravity;
        self.y += self.velocity;
        self.y = self.y.clamp(0.0, cfg.floor_y());

        // Resting on the floor kills all momentum.
        if self.y >= cfg.floor_y() {
            self.velocity = 0.0;
        }
    }
}

pub struct Obstacle {
    pub x: f64,
    pub gap_center: i32,
    pub passed: bool,
}

impl Obstacle {
    fn spawn(cfg: &GameConfig, rng: &mut StdRng) -> Self {
        let lo = cfg.gap_height as i32;
        let hi = (cfg.grid_height - cfg.gap_height) as i32;
        Obstacle {
            x: cfg.grid_width,
            gap_center: rng.random_range(lo..hi),
            passed: false,
        }
    }

    pub fn update(&mut self, cfg: &GameConfig) {
        self.x -= cfg.obstacle_speed;
    }

    /// Horizontal extents overlap and the player's vertical extent leaves the
    /// gap band `gap_center ± gap_height`.
    pub fn collides(&self, player: &Player, cfg: &GameConfig) -> bool {
        let overlap = cfg.player_x + cfg.player_size > self.x
            && cfg.player_x < self.x + cfg.obstacle_width;
        if !overlap {
            return false;
        }
        let gap = self.gap_center as f64;
        player.y < gap - cfg.gap_height || player.y + cfg.player_size > gap + cfg.gap_height
    }

    pub fn is_off_screen(&self, cfg: &GameConfig) -> bool {
        self.x < -cfg.obstacle_width
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Playing,
    GameOver,
}

#[derive(Clone, Copy, Debug)]
pub struct TickResult {
    pub collided: bool,
    pub score: u32,
    /// Obstacles that moved fully behind the player this tick.
    pub newly_passed: u32,
}

/// Read-only view handed to the renderer. The core never draws.
pub struct Snapshot<'a> {
    pub player: &'a Player,
    pub obstacles: &'a [Obstacle],
    pub score: u32,
    pub state: State,
}

/// One game session: player, oldest-first obstacle queue, score, state.
/// Pure state machine; the driver owns timing, input, and rendering.
pub struct Game {
    cfg: GameConfig,
    player: Player,
    obstacles: Vec<Obstacle>,
    score: u32,
    state: State,
    rng: StdRng,
}

impl Game {
    pub fn new(cfg: GameConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let player = Player::new(&cfg);
        let first = Obstacle::spawn(&cfg, &mut rng);
        Game {
            cfg,
            player,
            obstacles: vec![first],
            score: 0,
            state: State::Playing,
            rng,
        }
    }

    /// Fresh session; the RNG keeps rolling so restarts see new layouts.
    pub fn reset(&mut self) {
        self.player = Player::new(&self.cfg);
        self.obstacles = vec![Obstacle::spawn(&self.cfg, &mut self.rng)];
        self.score = 0;
        self.state = State::Playing;
    }

    pub fn config(&self) -> &GameConfig {
        &self.cfg
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            player: &self.player,
            obstacles: &self.obstacles,
            score: self.score,
            state: self.state,
        }
    }

    /// Observation for the decision source: vertical offset from the gap
    /// center, player velocity, and x of the first obstacle still ahead.
    pub fn observation(&self) -> Observation {
        for ob in &self.obstacles {
            if ob.x > self.cfg.player_x + self.cfg.player_size {
                return Observation {
                    gap_offset: (self.player.y - ob.gap_center as f64) as f32,
                    velocity: self.player.velocity as f32,
                    obstacle_x: ob.x as f32,
                };
            }
        }
        Observation::default()
    }

    /// Advance one tick: apply the decision, integrate physics, spawn and
    /// advance obstacles, detect collisions, retire off-screen obstacles,
    /// score. Scoring is +1 per tick survived; the collision tick does not
    /// score. Every obstacle is still advanced on the collision tick.
    pub fn tick(&mut self, flap: bool) -> TickResult {
        if self.state == State::GameOver {
            return TickResult {
                collided: true,
                score: self.score,
                newly_passed: 0,
            };
        }

        if flap {
            self.player.flap(&self.cfg);
        }
        self.player.update(&self.cfg);

        let should_spawn = self
            .obstacles
            .last()
            .is_none_or(|ob| ob.x < self.cfg.grid_width - self.cfg.spawn_distance);
        if should_spawn {
            let ob = Obstacle::spawn(&self.cfg, &mut self.rng);
            self.obstacles.push(ob);
        }

        let mut collided = false;
        let mut newly_passed = 0;
        for ob in &mut self.obstacles {
            ob.update(&self.cfg);
            if ob.collides(&self.player, &self.cfg) {
                collided = true;
            }
            if !ob.passed && ob.x + self.cfg.obstacle_width < self.cfg.player_x {
                ob.passed = true;
                newly_passed += 1;
            }
        }
        self.obstacles.retain(|ob| !ob.is_off_screen(&self.cfg));

        if collided {
            self.state = State::GameOver;
        } else {
            self.score += 1;
        }

        TickResult {
            collided,
            score: self.score,
            newly_passed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> GameConfig {
        GameConfig::default()
    }

    #[test]
    fn player_falls_monotonically_then_rests_on_floor() {
        let cfg = cfg();
        let mut player = Player::new(&cfg);
        let mut prev = player.y;
        for _ in 0..500 {
            player.update(&cfg);
            assert!(player.y >= prev);
            prev = player.y;
        }
        assert_eq!(player.y, cfg.floor_y());
        assert_eq!(player.velocity, 0.0);
        player.update(&cfg);
        assert_eq!(player.y, cfg.floor_y());
        assert_eq!(player.velocity, 0.0);
    }

    #[test]
    fn flap_sets_impulse_regardless_of_prior_velocity() {
        let cfg = cfg();
        let mut player = Player::new(&cfg);
        for v in [0.0, 12.5, -30.0] {
            player.velocity = v;
            player.flap(&cfg);
            assert_eq!(player.velocity, cfg.flap_strength);
        }
    }

    #[test]
    fn gap_center_stays_inside_legal_band() {
        let cfg = cfg();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let ob = Obstacle::spawn(&cfg, &mut rng);
            assert!(ob.gap_center >= cfg.gap_height as i32);
            assert!(ob.gap_center < (cfg.grid_height - cfg.gap_height) as i32);
            assert_eq!(ob.x, cfg.grid_width);
            assert!(!ob.passed);
        }
    }

    #[test]
    fn collision_requires_leaving_the_gap_band() {
        // Gap band is [20, 60); the player is 4 units tall.
        let cfg = cfg();
        let ob = Obstacle {
            x: cfg.player_x,
            gap_center: 40,
            passed: false,
        };
        let mut player = Player::new(&cfg);

        player.y = 50.0; // occupies [50, 54) -- inside the band
        assert!(!ob.collides(&player, &cfg));

        player.y = 65.0; // below the band
        assert!(ob.collides(&player, &cfg));

        player.y = 10.0; // above the band
        assert!(ob.collides(&player, &cfg));

        // Exactly filling up to the band edge still clears.
        player.y = 56.0; // occupies [56, 60)
        assert!(!ob.collides(&player, &cfg));
        player.y = 56.5; // spills past 60
        assert!(ob.collides(&player, &cfg));
    }

    #[test]
    fn no_collision_without_horizontal_overlap() {
        let cfg = cfg();
        let mut player = Player::new(&cfg);
        player.y = 0.0; // far outside any band
        let ob = Obstacle {
            x: cfg.player_x + cfg.player_size + 1.0,
            gap_center: 64,
            passed: false,
        };
        assert!(!ob.collides(&player, &cfg));
    }

    #[test]
    fn obstacle_retires_exactly_past_the_left_edge() {
        let cfg = cfg();
        let mut ob = Obstacle {
            x: -cfg.obstacle_width,
            gap_center: 64,
            passed: true,
        };
        assert!(!ob.is_off_screen(&cfg));
        ob.x -= 0.001;
        assert!(ob.is_off_screen(&cfg));
    }

    #[test]
    fn score_increments_once_per_surviving_tick() {
        let mut game = Game::new(cfg(), 42);
        for expected in 1..=10 {
            let result = game.tick(false);
            assert!(!result.collided);
            assert_eq!(result.score, expected);
        }
    }

    #[test]
    fn spawn_waits_for_the_spawn_distance() {
        let mut game = Game::new(cfg(), 42);
        assert_eq!(game.obstacles.len(), 1);
        // The spawn check runs before obstacles advance, so tick n sees the
        // tail at 256 - 3(n-1). That first drops below 156 on tick 35.
        for _ in 0..34 {
            game.tick(false);
            assert_eq!(game.obstacles.len(), 1);
        }
        game.tick(false);
        assert_eq!(game.obstacles.len(), 2);
    }

    #[test]
    fn collision_ends_the_game_and_freezes_the_score() {
        let cfg = cfg();
        let mut game = Game::new(cfg.clone(), 42);
        game.tick(false);
        let score = game.score();

        // Park an obstacle on the player with the gap far away.
        game.player.y = 100.0;
        game.obstacles.insert(
            0,
            Obstacle {
                x: cfg.player_x + cfg.obstacle_speed, // overlaps after this tick's advance
                gap_center: 30,
                passed: false,
            },
        );
        let result = game.tick(false);
        assert!(result.collided);
        assert_eq!(game.state(), State::GameOver);
        assert_eq!(result.score, score);

        // Ticks after game over are inert.
        let again = game.tick(true);
        assert!(again.collided);
        assert_eq!(again.score, score);
    }

    #[test]
    fn passing_an_obstacle_is_reported_once() {
        let cfg = cfg();
        let mut game = Game::new(cfg.clone(), 42);
        // One tick's advance away from being fully behind the player.
        game.obstacles.insert(
            0,
            Obstacle {
                x: cfg.player_x - cfg.obstacle_width + cfg.obstacle_speed - 0.5,
                gap_center: 64,
                passed: false,
            },
        );
        let result = game.tick(false);
        assert_eq!(result.newly_passed, 1);
        let result = game.tick(false);
        assert_eq!(result.newly_passed, 0);
    }

    #[test]
    fn reset_restores_a_fresh_session() {
        let mut game = Game::new(cfg(), 42);
        for _ in 0..5 {
            game.tick(false);
        }
        game.reset();
        assert_eq!(game.score(), 0);
        assert_eq!(game.state(), State::Playing);
        assert_eq!(game.obstacles.len(), 1);
        assert_eq!(game.snapshot().player.velocity, 0.0);
    }

    #[test]
    fn observation_targets_first_obstacle_ahead() {
        let cfg = cfg();
        let mut game = Game::new(cfg.clone(), 42);
        game.obstacles = vec![
            Obstacle {
                x: 5.0, // already behind the player
                gap_center: 50,
                passed: true,
            },
            Obstacle {
                x: 120.0,
                gap_center: 70,
                passed: false,
            },
        ];
        game.player.y = 64.0;
        game.player.velocity = -2.0;

        let obs = game.observation();
        assert_eq!(obs.obstacle_x, 120.0);
        assert_eq!(obs.gap_offset, -6.0);
        assert_eq!(obs.velocity, -2.0);
    }

    #[test]
    fn observation_defaults_to_zero_without_a_target() {
        let mut game = Game::new(cfg(), 42);
        game.obstacles.clear();
        let obs = game.observation();
        assert_eq!(obs.to_array(), [0.0, 0.0, 0.0]);
    }
}
