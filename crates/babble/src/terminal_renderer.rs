//! Terminal waveform meter.
//!
//! Draws the published frame as a single self-overwriting line and prints
//! state changes and notices on lines of their own.

use crate::AppResult;

use std::io::{Stdout, Write};

use babble_core::{DEFAULT_FREQUENCY_SCALE, RecordingState, WaveformFrame, WaveformMode};

/// Columns used by the meter bar.
pub const DEFAULT_METER_WIDTH: usize = 40;

/// Largest byte the analyser produces; a full amplitude bar.
const FULL_SCALE: f32 = 255.0;

/// Renders frames and status lines to a writer.
pub struct TerminalRenderer<W: Write> {
    out: W,
    width: usize,
    frequency_scale: f32,
    meter_active: bool,
}

impl TerminalRenderer<Stdout> {
    /// Renderer on standard output.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout(), DEFAULT_METER_WIDTH)
    }
}

impl<W: Write> TerminalRenderer<W> {
    /// Renderer writing to `out` with a bar `width` columns wide.
    pub fn new(out: W, width: usize) -> Self {
        Self {
            out,
            width: width.max(1),
            frequency_scale: DEFAULT_FREQUENCY_SCALE,
            meter_active: false,
        }
    }

    /// Match the multiplier the recorder applies to frequency levels.
    pub fn with_frequency_scale(mut self, scale: f32) -> Self {
        self.frequency_scale = scale;
        self
    }

    /// Level drawn as a full bar in `mode`.
    ///
    /// Only the lower half of the frequency bins is ever filled, so the
    /// frequency average tops out at half of [`FULL_SCALE`] before scaling.
    pub fn full_scale(&self, mode: WaveformMode) -> f32 {
        match mode {
            WaveformMode::Amplitude => FULL_SCALE,
            WaveformMode::Frequency => FULL_SCALE / 2.0 * self.frequency_scale,
        }
    }

    /// Redraw the meter line. Frames are only drawn while recording.
    ///
    /// Returns `true` if the frame was drawn.
    pub fn frame(&mut self, frame: &WaveformFrame, state: RecordingState) -> AppResult<bool> {
        if !state.is_sampling() {
            return Ok(false);
        }
        let level = frame.level();
        write!(
            self.out,
            "\r[{}] {:>6.1} {:<9}",
            meter(level, self.full_scale(frame.mode), self.width),
            level,
            frame.mode
        )?;
        self.out.flush()?;
        self.meter_active = true;
        Ok(true)
    }

    /// Print the line describing `state`.
    pub fn state(&mut self, state: RecordingState) -> AppResult<()> {
        let text = match state {
            RecordingState::Idle => "Ready. Type 'start' to record.".to_string(),
            RecordingState::CountingDown(n) => format!("Recording in {}...", n),
            RecordingState::Recording => "Recording. 'done' pauses, 'stop' finishes.".to_string(),
            RecordingState::Paused => "Paused. 'pause' resumes, 'done' finishes.".to_string(),
            RecordingState::Stopped => "Stopped. 'download' saves, 'delete' discards.".to_string(),
        };
        self.line(&text)
    }

    /// Print a message on its own line, below the meter if one is showing.
    pub fn line(&mut self, text: &str) -> AppResult<()> {
        if self.meter_active {
            writeln!(self.out)?;
            self.meter_active = false;
        }
        writeln!(self.out, "{}", text)?;
        self.out.flush()?;
        Ok(())
    }

    /// Consume the renderer and return the writer.
    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Bar of `width` columns filled in proportion to `level` over `0..=full_scale`.
pub(crate) fn meter(level: f32, full_scale: f32, width: usize) -> String {
    let ratio = if level.is_finite() && full_scale.is_finite() && full_scale > 0.0 {
        (level / full_scale).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = ((ratio * width as f32).round() as usize).min(width);
    format!("{}{}", "#".repeat(filled), " ".repeat(width - filled))
}
