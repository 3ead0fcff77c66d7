use anyhow::Result;
use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode},
    execute, terminal,
};
use std::io::{self, stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use flappy_pilot::config::GameConfig;
use flappy_pilot::decision::{DecisionSource, KeyboardSource};
use flappy_pilot::game::{Game, State};
use flappy_pilot::pilot::NeuralPilot;
use flappy_pilot::render::Renderer;
use flappy_pilot::report::ScoreReport;
use flappy_pilot::sound::AudioKit;

#[derive(Parser, Debug)]
#[command(name = "flappy-pilot", about = "Flappy Bird in the terminal, flown by hand or by ONNX models")]
struct Args {
    /// Let the neural pilot fly instead of the keyboard
    #[arg(long, requires = "policy_model", requires = "action_model")]
    pilot: bool,

    /// Policy model (.onnx or base64 text)
    #[arg(long)]
    policy_model: Option<PathBuf>,

    /// Action model (.onnx or base64 text)
    #[arg(long)]
    action_model: Option<PathBuf>,

    /// Per-tick inference budget in milliseconds (default: one frame)
    #[arg(long)]
    decision_budget_ms: Option<u64>,

    /// Seed for obstacle layout (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Score-recording endpoint, e.g. http://localhost:8099/record
    #[arg(long)]
    report_url: Option<String>,

    #[arg(long, default_value = "msaiwk24-anon")]
    player_token: String,

    /// Training time metadata forwarded with the report
    #[arg(long, default_value_t = -1)]
    train_time: i64,

    /// Network architecture metadata forwarded with the report
    #[arg(long, default_value = "")]
    net_arch: String,
}

enum Controls {
    Human(KeyboardSource),
    Pilot(NeuralPilot),
}

impl Controls {
    fn press(&mut self) {
        if let Controls::Human(keyboard) = self {
            keyboard.press();
        }
    }

    fn method(&self) -> &'static str {
        match self {
            Controls::Human(_) => "human",
            Controls::Pilot(_) => "pilot",
        }
    }
}

impl DecisionSource for Controls {
    fn decide(&mut self, obs: flappy_pilot::Observation) -> bool {
        match self {
            Controls::Human(keyboard) => keyboard.decide(obs),
            Controls::Pilot(pilot) => pilot.decide(obs),
        }
    }
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout is the game surface.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut cfg = fitted_config(args.fps)?;
    let budget = args
        .decision_budget_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| cfg.tick_interval());
    let mut controls = match (args.pilot, &args.policy_model, &args.action_model) {
        (true, Some(policy), Some(action)) => {
            Controls::Pilot(NeuralPilot::load(policy.clone(), action.clone(), budget))
        }
        _ => Controls::Human(KeyboardSource::new()),
    };

    let mut game = Game::new(cfg.clone(), args.seed.unwrap_or_else(rand::random));
    let mut renderer = Renderer::new(&cfg);
    let audio = AudioKit::open();
    let mut reported = false;

    terminal::enable_raw_mode()?;
    let mut out = stdout();
    execute!(
        out,
        terminal::EnterAlternateScreen,
        cursor::Hide,
        terminal::DisableLineWrap,
    )?;

    let cleanup = |out: &mut io::Stdout| -> io::Result<()> {
        execute!(
            out,
            terminal::LeaveAlternateScreen,
            cursor::Show,
            terminal::EnableLineWrap,
        )?;
        terminal::disable_raw_mode()
    };

    let frame_dur = cfg.tick_interval();

    loop {
        let frame_start = Instant::now();

        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        cleanup(&mut out)?;
                        return Ok(());
                    }
                    KeyCode::Char(' ') | KeyCode::Up | KeyCode::Enter => {
                        if game.state() == State::GameOver {
                            game.reset();
                            reported = false;
                        } else {
                            controls.press();
                        }
                    }
                    _ => {}
                },
                Event::Resize(..) => {
                    cfg = fitted_config(args.fps)?;
                    renderer.resize(&cfg);
                    game = Game::new(cfg.clone(), args.seed.unwrap_or_else(rand::random));
                    reported = false;
                }
                _ => {}
            }
        }

        if game.state() == State::Playing {
            let flap = controls.decide(game.observation());
            if flap {
                audio.flap();
            }
            let result = game.tick(flap);
            if result.newly_passed > 0 {
                audio.score();
            }
            if result.collided {
                audio.death();
                if let Some(url) = &args.report_url {
                    if !reported {
                        reported = true;
                        ScoreReport {
                            url: url.clone(),
                            player_token: args.player_token.clone(),
                            method: controls.method().into(),
                            score: result.score,
                            train_time: args.train_time,
                            net_arch: args.net_arch.clone(),
                        }
                        .submit_in_background();
                    }
                }
            }
        }

        renderer.draw(&game.snapshot(), &cfg);
        renderer.present(&mut out)?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_dur {
            std::thread::sleep(frame_dur - elapsed);
        }
    }
}

fn fitted_config(fps: u32) -> Result<GameConfig> {
    let (cols, rows) = terminal::size()?;
    let mut cfg = GameConfig::fitted(cols as usize, rows as usize * 2);
    cfg.fps = fps;
    Ok(cfg)
}
