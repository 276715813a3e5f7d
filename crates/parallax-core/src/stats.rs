use std::collections::VecDeque;

use crate::constants::{FPS_HISTORY_LEN, FPS_WINDOW_MS};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FpsReading {
    pub current: u32,
    pub average: u32,
    pub min: u32,
    pub max: u32,
}

/// Frames-per-second meter, updated once per one-second window.
#[derive(Clone, Debug)]
pub struct FrameStats {
    window_start_ms: Option<f64>,
    frames: u32,
    history: VecDeque<u32>,
    reading: FpsReading,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self {
            window_start_ms: None,
            frames: 0,
            history: VecDeque::with_capacity(FPS_HISTORY_LEN),
            reading: FpsReading {
                current: 0,
                average: 0,
                min: u32::MAX,
                max: 0,
            },
        }
    }
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reading(&self) -> FpsReading {
        let mut r = self.reading;
        if r.min == u32::MAX {
            r.min = 0;
        }
        r
    }

    /// Count one frame at `now_ms`. Returns a fresh reading when a window closes.
    pub fn record(&mut self, now_ms: f64) -> Option<FpsReading> {
        let start = *self.window_start_ms.get_or_insert(now_ms);
        self.frames += 1;
        let elapsed = now_ms - start;
        if elapsed < FPS_WINDOW_MS {
            return None;
        }
        let fps = (self.frames as f64 * 1000.0 / elapsed).round() as u32;
        if self.history.len() == FPS_HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(fps);
        let sum: u32 = self.history.iter().sum();
        self.reading = FpsReading {
            current: fps,
            average: (sum as f64 / self.history.len() as f64).round() as u32,
            min: self.reading.min.min(fps),
            max: self.reading.max.max(fps),
        };
        self.frames = 0;
        self.window_start_ms = Some(now_ms);
        Some(self.reading())
    }
}
