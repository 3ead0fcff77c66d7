use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{error, info};

/// Form fields of a score report. Everything arrives as text; validation
/// happens in the handler so each failure gets its own response, not a 400.
#[derive(Debug, Deserialize)]
pub struct RecordForm {
    pub player_token: Option<String>,
    pub score: Option<String>,
    pub method: Option<String>,
    pub traintime: Option<String>,
    pub netarch: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: &str) -> Self {
        StatusResponse {
            status: "success".into(),
            message: message.into(),
        }
    }

    pub fn error(message: &str) -> Self {
        StatusResponse {
            status: "error".into(),
            message: message.into(),
        }
    }
}

/// One persisted score record.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreRow {
    pub datetime: DateTime<Utc>,
    pub name: String,
    pub score: i64,
    pub mode: String,
    pub ip: String,
    pub training_time: i64,
    pub arch: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to encode row: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write row: {0}")]
    Io(#[from] std::io::Error),
}

/// Append-only JSONL row store behind a lock. Database schema and connection
/// handling are out of scope; this keeps the one-row-per-accepted-report
/// contract with the simplest durable append.
pub struct JsonlStore {
    file: Mutex<File>,
}

impl JsonlStore {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(JsonlStore {
            file: Mutex::new(file),
        })
    }

    pub fn append(&self, row: &ScoreRow) -> Result<(), StoreError> {
        let line = serde_json::to_string(row)?;
        // A poisoned lock still holds a usable file; keep appending.
        let mut file = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        writeln!(file, "{line}")?;
        file.flush()?;
        Ok(())
    }
}

pub struct Scoreboard {
    pub store: JsonlStore,
    pub token_prefix: String,
}

pub async fn record(
    state: web::Data<Scoreboard>,
    req: HttpRequest,
    form: web::Form<RecordForm>,
) -> impl Responder {
    let form = form.into_inner();

    let token = match form.player_token {
        Some(token) if token.starts_with(&state.token_prefix) => token,
        _ => return HttpResponse::Ok().json(StatusResponse::error("Invalid player token")),
    };

    let score: i64 = match form.score.as_deref().map(str::parse) {
        Some(Ok(score)) => score,
        _ => return HttpResponse::Ok().json(StatusResponse::error("Invalid score or method")),
    };
    let method = match form.method {
        Some(method) if !method.is_empty() => method,
        _ => return HttpResponse::Ok().json(StatusResponse::error("Invalid score or method")),
    };

    let row = ScoreRow {
        datetime: Utc::now(),
        name: token,
        score,
        mode: method,
        ip: req
            .peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_default(),
        training_time: form
            .traintime
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or(-1),
        arch: form.netarch.unwrap_or_default(),
    };

    match state.store.append(&row) {
        Ok(()) => {
            info!(name = %row.name, score = row.score, mode = %row.mode, "recorded score");
            HttpResponse::Ok().json(StatusResponse::success("Score recorded successfully"))
        }
        Err(err) => {
            error!("failed to record score: {err}");
            HttpResponse::Ok().json(StatusResponse::error("Failed to record score"))
        }
    }
}

async fn method_not_allowed() -> impl Responder {
    HttpResponse::Ok().json(StatusResponse::error("Invalid request method"))
}

/// Routes shared by the `scored` binary and the tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/record", web::post().to(record))
        .default_service(web::route().to(method_not_allowed));
}
