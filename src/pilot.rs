use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ndarray::Array2;
use ort::session::Session;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::decision::{DecisionSource, Observation};

#[derive(Debug, Error)]
pub enum PilotError {
    #[error("failed to read model file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode base64 model: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error(transparent)]
    Ort(#[from] ort::Error),
    #[error("bad observation shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("action model produced {0} logits, expected 2")]
    BadLogits(usize),
}

/// Model artifacts arrive either as raw `.onnx` protobufs or as
/// base64-encoded text dumps. Sniff by attempting the text route first.
fn decode_model_bytes(raw: Vec<u8>) -> Vec<u8> {
    if let Ok(text) = std::str::from_utf8(&raw) {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        if let Ok(decoded) = BASE64.decode(compact.as_bytes()) {
            return decoded;
        }
    }
    raw
}

/// Flap iff the second logit beats the first.
fn flap_from_logits(logits: &[f32]) -> Result<bool, PilotError> {
    if logits.len() < 2 {
        return Err(PilotError::BadLogits(logits.len()));
    }
    Ok(logits[1] > logits[0])
}

/// One ONNX session with its single named input and output.
struct ModelStage {
    session: Session,
    input: String,
    output: String,
}

impl ModelStage {
    fn load(path: &Path) -> Result<Self, PilotError> {
        let bytes = decode_model_bytes(std::fs::read(path)?);
        let session = Session::builder()?
            .with_execution_providers([
                ort::execution_providers::CPUExecutionProvider::default().build()
            ])?
            .with_intra_threads(1)?
            .commit_from_memory(&bytes)?;
        let input = session.inputs[0].name.clone();
        let output = session.outputs[0].name.clone();
        info!(model = %path.display(), %input, %output, "loaded model");
        Ok(ModelStage {
            session,
            input,
            output,
        })
    }

    fn run(&self, values: Vec<f32>) -> Result<Vec<f32>, PilotError> {
        let input = Array2::from_shape_vec((1, values.len()), values)?;
        let outputs = self
            .session
            .run(ort::inputs![self.input.as_str() => input.view()]?)?;
        let view = outputs[self.output.as_str()].try_extract_tensor::<f32>()?;
        Ok(view.iter().copied().collect())
    }
}

struct Worker {
    tx: Sender<[f32; 3]>,
    rx: Receiver<Result<bool, PilotError>>,
    in_flight: usize,
}

/// Two chained models decide flap/no-flap: the policy model maps the 3-value
/// observation to an intermediate vector, the action model maps that to a
/// 2-logit pair. Inference runs on a worker thread; each tick waits at most
/// `budget` and falls back to no-flap on timeout or failure. Failures go to
/// the log, never to the player.
pub struct NeuralPilot {
    worker: Option<Worker>,
    budget: Duration,
    warned_unavailable: bool,
}

impl NeuralPilot {
    pub fn load(policy_model: PathBuf, action_model: PathBuf, budget: Duration) -> Self {
        let worker = match Self::spawn_worker(policy_model, action_model) {
            Ok(worker) => Some(worker),
            Err(err) => {
                error!("pilot models not loaded, defaulting to no-flap: {err}");
                None
            }
        };
        NeuralPilot {
            worker,
            budget,
            warned_unavailable: false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.worker.is_some()
    }

    fn spawn_worker(policy_model: PathBuf, action_model: PathBuf) -> Result<Worker, PilotError> {
        let policy = ModelStage::load(&policy_model)?;
        let action = ModelStage::load(&action_model)?;

        let (obs_tx, obs_rx) = mpsc::channel::<[f32; 3]>();
        let (res_tx, res_rx) = mpsc::channel();
        thread::Builder::new()
            .name("pilot-inference".into())
            .spawn(move || {
                while let Ok(obs) = obs_rx.recv() {
                    let decision = policy
                        .run(obs.to_vec())
                        .and_then(|hidden| action.run(hidden))
                        .and_then(|logits| flap_from_logits(&logits));
                    if res_tx.send(decision).is_err() {
                        break;
                    }
                }
            })
            .map_err(PilotError::Io)?;

        Ok(Worker {
            tx: obs_tx,
            rx: res_rx,
            in_flight: 0,
        })
    }
}

impl DecisionSource for NeuralPilot {
    fn decide(&mut self, obs: Observation) -> bool {
        let Some(worker) = self.worker.as_mut() else {
            if !self.warned_unavailable {
                error!("pilot models are not loaded; flying without flaps");
                self.warned_unavailable = true;
            }
            return false;
        };

        let mut dead = false;
        let flap = decide_with(worker, self.budget, obs, &mut dead);
        if dead {
            self.worker = None;
        }
        flap
    }
}

fn decide_with(worker: &mut Worker, budget: Duration, obs: Observation, dead: &mut bool) -> bool {
    // Discard replies that belong to ticks which already timed out.
    while worker.in_flight > 0 {
        match worker.rx.try_recv() {
            Ok(_) => worker.in_flight -= 1,
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => {
                error!("inference worker exited");
                *dead = true;
                return false;
            }
        }
    }
    if worker.in_flight > 0 {
        // A previous inference is still running; don't stack another.
        warn!("inference still running from a previous tick, no flap");
        return false;
    }

    if worker.tx.send(obs.to_array()).is_err() {
        error!("inference worker exited");
        *dead = true;
        return false;
    }
    worker.in_flight += 1;

    match worker.rx.recv_timeout(budget) {
        Ok(result) => {
            worker.in_flight -= 1;
            match result {
                Ok(flap) => flap,
                Err(err) => {
                    error!("inference failed, no flap: {err}");
                    false
                }
            }
        }
        Err(RecvTimeoutError::Timeout) => {
            warn!("inference exceeded {budget:?}, no flap");
            false
        }
        Err(RecvTimeoutError::Disconnected) => {
            error!("inference worker exited");
            *dead = true;
            false
        }
    }
}
