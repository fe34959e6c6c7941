//! Level sanitizer for charted fill-percentage series.
//!
//! Ultrasonic level sensors echo off the floor of a near-empty tank and
//! report a sudden near-full reading. The sanitizer holds the last accepted
//! value, rejects those spikes and any other implausible single-step jump,
//! and smooths the rest with a single-pole low-pass filter.

/// Below this percentage a tank is considered empty.
pub const EMPTY_LEVEL: f64 = 15.0;
/// A reading above this percentage right after an empty reading is a spike.
pub const SPIKE_LEVEL: f64 = 40.0;
/// Largest single-step change (percentage points) accepted as real.
pub const MAX_JUMP: f64 = 30.0;
/// Smoothing factor applied to accepted readings.
pub const ALPHA: f64 = 0.3;

/// One filter step.
///
/// With no previous value the reading is taken as-is. All thresholds are
/// strict, so a previous value of exactly 15 or a jump of exactly 30 falls
/// through to smoothing.
pub fn sanitize_level(current: f64, last: Option<f64>) -> f64 {
    let Some(last) = last else {
        return current;
    };

    if last < EMPTY_LEVEL && current > SPIKE_LEVEL {
        return last;
    }

    if (current - last).abs() > MAX_JUMP {
        return last;
    }

    last + ALPHA * (current - last)
}

/// Stateful wrapper for one series. Create a fresh one per series.
#[derive(Debug, Clone, Default)]
pub struct LevelSanitizer {
    last_valid: Option<f64>,
}

impl LevelSanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the next reading in chronological order and returns the value
    /// to display.
    pub fn push(&mut self, current: f64) -> f64 {
        let out = sanitize_level(current, self.last_valid);
        self.last_valid = Some(out);
        out
    }

    pub fn last_valid(&self) -> Option<f64> {
        self.last_valid
    }

    pub fn reset(&mut self) {
        self.last_valid = None;
    }
}

/// Sanitizes a whole chronologically-ordered series in one pass.
pub fn sanitize_series(values: &[f64]) -> Vec<f64> {
    let mut filter = LevelSanitizer::new();
    values.iter().map(|v| filter.push(*v)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
