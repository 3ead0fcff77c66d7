use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::scoreboard::StatusResponse;

/// One final-score submission to the recording endpoint.
#[derive(Clone, Debug)]
pub struct ScoreReport {
    pub url: String,
    pub player_token: String,
    pub method: String,
    pub score: u32,
    pub train_time: i64,
    pub net_arch: String,
}

impl ScoreReport {
    fn form_fields(&self) -> [(&'static str, String); 5] {
        [
            ("player_token", self.player_token.clone()),
            ("score", self.score.to_string()),
            ("method", self.method.clone()),
            ("traintime", self.train_time.to_string()),
            ("netarch", self.net_arch.clone()),
        ]
    }

    /// POST the report and parse the `{status, message}` reply. Callers treat
    /// any error as fail-soft; the game never stops over a lost report.
    pub fn submit(&self) -> Result<StatusResponse> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .context("failed to build HTTP client")?;

        let response: StatusResponse = client
            .post(&self.url)
            .form(&self.form_fields())
            .send()
            .context("score report request failed")?
            .json()
            .context("score endpoint returned malformed JSON")?;

        Ok(response)
    }

    /// Fire-and-forget submission off the game loop thread.
    pub fn submit_in_background(self) {
        std::thread::spawn(move || match self.submit() {
            Ok(resp) if resp.status == "success" => {
                info!(score = self.score, "score reported: {}", resp.message);
            }
            Ok(resp) => warn!("score endpoint rejected report: {}", resp.message),
            Err(err) => warn!("score report failed: {err:#}"),
        });
    }
}
