//! A grid Flappy Bird clone for the terminal. The core game is a pure state
//! machine (`game::Game::tick`); decisions come from the keyboard or from a
//! two-stage ONNX pilot, rendering is a half-block terminal adapter, and
//! final scores can be reported to the bundled `scored` endpoint.

pub mod config;
pub mod decision;
pub mod game;
pub mod pilot;
pub mod render;
pub mod report;
pub mod scoreboard;
pub mod sound;

pub use config::GameConfig;
pub use decision::{DecisionSource, KeyboardSource, Observation};
pub use game::{Game, State, TickResult};
pub use pilot::NeuralPilot;
