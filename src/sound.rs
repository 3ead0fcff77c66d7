use fundsp::prelude32::*;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::warn;

const SAMPLE_RATE: f32 = 44100.0;

/// One-shot effect player. Opening the output device can fail (headless CI,
/// no audio server); the game then runs silent.
pub struct AudioKit {
    stream: Option<OutputStream>,
}

impl AudioKit {
    pub fn open() -> Self {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(stream) => Some(stream),
            Err(err) => {
                warn!("no audio output, running silent: {err}");
                None
            }
        };
        AudioKit { stream }
    }

    #[cfg(test)]
    fn silent() -> Self {
        AudioKit { stream: None }
    }

    /// Short upward chirp.
    pub fn flap(&self) {
        let freq = lfo(|t: f32| lerp(300.0, 620.0, (t / 0.08).min(1.0)));
        let gain = lfo(|t: f32| lerp(0.12, 0.0, (t / 0.09).min(1.0)));
        self.play((freq >> square()) * gain, 0.09);
    }

    /// Two-tone ding on each passed milestone.
    pub fn score(&self) {
        let freq = lfo(|t: f32| if t < 0.07 { 660.0 } else { 990.0 });
        let gain = lfo(|t: f32| lerp(0.1, 0.0, (t / 0.16).min(1.0)));
        self.play((freq >> sine()) * gain, 0.16);
    }

    /// Descending saw sweep on collision.
    pub fn death(&self) {
        let freq = lfo(|t: f32| lerp(400.0, 70.0, (t / 0.45).min(1.0)));
        let gain = lfo(|t: f32| lerp(0.15, 0.0, (t / 0.5).min(1.0)));
        self.play((freq >> saw()) * gain, 0.5);
    }

    fn play(&self, unit: impl AudioUnit + 'static, dur: f32) {
        let Some(stream) = &self.stream else {
            return;
        };
        let sink = Sink::connect_new(stream.mixer());
        sink.append(render_mono(unit, dur));
        sink.detach(); // Play in background
    }
}

/// Step the graph sample by sample; rodio gets a plain buffer.
fn render_mono(mut unit: impl AudioUnit, dur: f32) -> SamplesBuffer {
    unit.set_sample_rate(SAMPLE_RATE as f64);
    let n = (SAMPLE_RATE * dur) as usize;
    let samples: Vec<f32> = (0..n).map(|_| unit.get_mono()).collect();
    SamplesBuffer::new(1, SAMPLE_RATE as u32, samples)
}
