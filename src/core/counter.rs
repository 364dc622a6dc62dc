//! Increment detector + leaky-integrator counter, one pipeline per colour.
//!
//! The detector thresholds `similarity(increment_flag, YES)` into a binary
//! pulse; the integrator accumulates pulses into a slowly decaying analog
//! magnitude:
//!
//! ```text
//! v[n+1] = v[n] * exp(-dt / tau) + gain * dt * pulse[n]
//! ```
//!
//! There is no reset and no ceiling unless one is configured. The pipeline also
//! tallies rising edges of the pulse, which is the exact event count the analog
//! value approximates.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::symbols::Colour;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CounterConfig {
    /// Pulse fires while the flag's YES similarity is strictly above this.
    pub threshold: f32,
    /// Integration rate while the pulse is high, in units per second.
    pub gain: f32,
    /// Decay time constant in seconds.
    pub tau: f32,
    pub ceiling: Option<f32>,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            gain: 20.0,
            tau: 10.0,
            ceiling: None,
        }
    }
}

impl CounterConfig {
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncrementDetector {
    threshold: f32,
}

impl IncrementDetector {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    #[inline]
    pub fn fires(&self, yes_similarity: f32) -> bool {
        yes_similarity > self.threshold
    }
}

#[derive(Debug, Clone)]
pub struct LeakyCounter {
    value: f32,
    retention: f32,
    step_gain: f32,
    ceiling: Option<f32>,
}

impl LeakyCounter {
    pub fn new(cfg: &CounterConfig, dt: f32) -> Self {
        Self {
            value: 0.0,
            retention: (-dt / cfg.tau).exp(),
            step_gain: cfg.gain * dt,
            ceiling: cfg.ceiling,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Advance one step with input `pulse` (nominally 0 or 1).
    pub fn step(&mut self, pulse: f32) -> f32 {
        let mut v = self.value * self.retention + self.step_gain * pulse;
        if let Some(max) = self.ceiling {
            v = v.min(max);
        }
        self.value = v;
        v
    }
}

#[derive(Debug, Clone)]
pub struct CounterPipeline {
    colour: Colour,
    detector: IncrementDetector,
    counter: LeakyCounter,
    pulse: bool,
    rising_edges: u32,
}

impl CounterPipeline {
    pub fn new(colour: Colour, cfg: &CounterConfig, dt: f32) -> Self {
        Self {
            colour,
            detector: IncrementDetector::new(cfg.threshold),
            counter: LeakyCounter::new(cfg, dt),
            pulse: false,
            rising_edges: 0,
        }
    }

    pub fn colour(&self) -> Colour {
        self.colour
    }

    pub fn detector(&self) -> &IncrementDetector {
        &self.detector
    }

    pub fn value(&self) -> f32 {
        self.counter.value()
    }

    pub fn pulse(&self) -> bool {
        self.pulse
    }

    pub fn rising_edges(&self) -> u32 {
        self.rising_edges
    }

    /// Feed this step's flag similarity. Returns true on a rising edge.
    pub fn step(&mut self, yes_similarity: f32, time: f32) -> bool {
        let pulse = self.detector.fires(yes_similarity);
        let rising = pulse && !self.pulse;
        self.pulse = pulse;
        self.counter.step(if pulse { 1.0 } else { 0.0 });
        if rising {
            self.rising_edges += 1;
            info!(
                colour = self.colour.name(),
                time,
                pulses = self.rising_edges,
                value = self.counter.value(),
                "increment pulse"
            );
        }
        rising
    }
}

/// Periodic switch: on for the first 0.1 s of every even second.
pub fn switch_signal(t: f32) -> f32 {
    if t >= 0.0 && t.rem_euclid(2.0) < 0.1 {
        1.0
    } else {
        0.0
    }
}
