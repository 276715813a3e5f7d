//! Left-to-right "decode" text reveal.

use rand::prelude::*;

use crate::constants::{SCRAMBLE_DURATION_MS, SCRAMBLE_FRAME_MS};

pub const DEFAULT_CHARSET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub struct TextScramble {
    text: Vec<char>,
    charset: Vec<char>,
    duration_ms: f64,
    started_at_ms: Option<f64>,
    last_frame_ms: f64,
    display: String,
    rng: StdRng,
    disabled: bool,
}

impl TextScramble {
    pub fn new(text: &str, seed: u64) -> Self {
        Self {
            text: text.chars().collect(),
            charset: DEFAULT_CHARSET.chars().collect(),
            duration_ms: SCRAMBLE_DURATION_MS,
            started_at_ms: None,
            last_frame_ms: f64::NEG_INFINITY,
            display: text.to_string(),
            rng: StdRng::seed_from_u64(seed),
            disabled: false,
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms.max(1.0);
        self
    }

    /// An empty set falls back to the default alphabet.
    pub fn with_charset(mut self, charset: &str) -> Self {
        if !charset.is_empty() {
            self.charset = charset.chars().collect();
        }
        self
    }

    /// A disabled scramble always shows the plain text and never starts.
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_animating(&self) -> bool {
        self.started_at_ms.is_some()
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    /// Begin the reveal. Ignored while one is already running.
    pub fn start(&mut self, now_ms: f64) -> bool {
        if self.disabled || self.is_animating() {
            return false;
        }
        self.started_at_ms = Some(now_ms);
        self.last_frame_ms = f64::NEG_INFINITY;
        true
    }

    /// Produce the next frame, throttled to ~60 fps. Returns `None` when idle
    /// or when called again within the same frame slot.
    pub fn frame(&mut self, now_ms: f64) -> Option<&str> {
        let started = self.started_at_ms?;
        if now_ms - self.last_frame_ms < SCRAMBLE_FRAME_MS {
            return None;
        }
        self.last_frame_ms = now_ms;
        let progress = ((now_ms - started) / self.duration_ms).clamp(0.0, 1.0);
        let revealed = progress * self.text.len() as f64;

        let mut out = String::with_capacity(self.text.len());
        for (i, &ch) in self.text.iter().enumerate() {
            if ch == ' ' || (i as f64) <= revealed {
                out.push(ch);
            } else {
                out.push(*self.charset.choose(&mut self.rng).unwrap_or(&ch));
            }
        }
        self.display = out;
        if progress >= 1.0 {
            self.started_at_ms = None;
        }
        Some(self.display.as_str())
    }
}
