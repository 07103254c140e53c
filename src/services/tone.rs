//! Synthesised two-tone completion beep as a rodio source

use std::{f32::consts::TAU, time::Duration};

use rodio::Source;

pub const SAMPLE_RATE: u32 = 22_050;

const SWEEP_LENGTH: Duration = Duration::from_millis(180);
/// Offset of the second sweep from the start of the first
const SECOND_SWEEP_OFFSET: Duration = Duration::from_millis(300);
const AMPLITUDE: f32 = 0.3;

/// Mono sine sweep from `from_hz` to `to_hz` with an exponential decay
#[derive(Debug, Clone)]
pub struct Sweep {
    from_hz: f32,
    to_hz: f32,
    length: Duration,
    len: usize,
    index: usize,
    phase: f32,
}

impl Sweep {
    pub fn new(from_hz: f32, to_hz: f32, length: Duration) -> Self {
        Self {
            from_hz,
            to_hz,
            length,
            len: samples_for(length),
            index: 0,
            phase: 0.0,
        }
    }
}

fn samples_for(length: Duration) -> usize {
    (SAMPLE_RATE as u128 * length.as_millis() / 1000) as usize
}

impl Iterator for Sweep {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.index >= self.len {
            return None;
        }
        let progress = self.index as f32 / self.len as f32;
        let freq = self.from_hz + (self.to_hz - self.from_hz) * progress;
        // decays to ~1% of the peak by the end of the sweep
        let envelope = (-4.6 * progress).exp();
        let sample = self.phase.sin() * envelope * AMPLITUDE;

        self.phase = (self.phase + TAU * freq / SAMPLE_RATE as f32) % TAU;
        self.index += 1;
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.len - self.index;
        (left, Some(left))
    }
}

impl Source for Sweep {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.len - self.index)
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(self.length)
    }
}

/// Two sweeps, the second starting 300ms after the first
pub fn two_tone_beep() -> impl Source<Item = f32> + Send + 'static {
    let first = Sweep::new(880.0, 660.0, SWEEP_LENGTH);
    let second = Sweep::new(1100.0, 880.0, SWEEP_LENGTH).delay(SECOND_SWEEP_OFFSET);
    first.mix(second)
}
