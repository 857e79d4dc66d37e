//! Playback clock
//!
//! Maps wall-clock frame deltas onto session time. Owned by the consumer's
//! frame loop; it never reads the system clock itself.

use std::time::Duration;

use contracts::{PlaybackConfig, MAX_PLAYBACK_SPEED, MIN_PLAYBACK_SPEED};

/// Playback state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClockState {
    /// At the start, not advancing
    #[default]
    Stopped,
    /// Advancing on every tick
    Playing,
    /// Holding the current position
    Paused,
}

/// Session-time playback clock
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    state: ClockState,
    /// Current position (ms)
    position_ms: f64,
    /// Session length (ms)
    duration_ms: f64,
    /// Playback speed multiplier
    speed: f64,
    /// Restart from 0 at the end instead of pausing
    loop_playback: bool,
}

impl PlaybackClock {
    /// Create a stopped clock over `[0, duration_ms]`
    pub fn new(duration_ms: f64) -> Self {
        Self {
            state: ClockState::Stopped,
            position_ms: 0.0,
            duration_ms: sanitize_duration(duration_ms),
            speed: 1.0,
            loop_playback: false,
        }
    }

    /// Create a clock with speed and looping taken from configuration
    pub fn from_config(duration_ms: f64, config: &PlaybackConfig) -> Self {
        let mut clock = Self::new(duration_ms);
        clock.set_speed(config.speed);
        clock.loop_playback = config.loop_playback;
        clock
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == ClockState::Playing
    }

    pub fn position_ms(&self) -> f64 {
        self.position_ms
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Set the speed multiplier, clamped to the supported range
    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_nan() {
            return;
        }
        self.speed = speed.clamp(MIN_PLAYBACK_SPEED, MAX_PLAYBACK_SPEED);
    }

    pub fn loop_playback(&self) -> bool {
        self.loop_playback
    }

    pub fn set_loop_playback(&mut self, loop_enabled: bool) {
        self.loop_playback = loop_enabled;
    }

    /// Update the session length, e.g. after a live append
    pub fn set_duration(&mut self, duration_ms: f64) {
        self.duration_ms = sanitize_duration(duration_ms);
        self.position_ms = self.position_ms.min(self.duration_ms);
    }

    /// Playback progress (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.duration_ms <= 0.0 {
            return 0.0;
        }
        self.position_ms / self.duration_ms
    }

    /// Start or resume playback
    ///
    /// Playing from the very end restarts at 0.
    pub fn play(&mut self) {
        if self.position_ms >= self.duration_ms {
            self.position_ms = 0.0;
        }
        self.state = ClockState::Playing;
    }

    pub fn pause(&mut self) {
        if self.state == ClockState::Playing {
            self.state = ClockState::Paused;
        }
    }

    /// Stop playback and rewind to 0
    pub fn stop(&mut self) {
        self.position_ms = 0.0;
        self.state = ClockState::Stopped;
    }

    /// Jump to `position_ms`, forwards or backwards
    pub fn seek(&mut self, position_ms: f64) {
        self.position_ms = if position_ms.is_nan() {
            0.0
        } else {
            position_ms.clamp(0.0, self.duration_ms)
        };
    }

    /// Advance by one frame's wall-clock delta; returns the new position
    pub fn tick(&mut self, wall_delta: Duration) -> f64 {
        if self.state != ClockState::Playing {
            return self.position_ms;
        }

        self.position_ms += wall_delta.as_secs_f64() * 1000.0 * self.speed;

        if self.position_ms >= self.duration_ms {
            if self.loop_playback {
                self.position_ms = 0.0;
            } else {
                self.position_ms = self.duration_ms;
                self.state = ClockState::Paused;
            }
        }

        self.position_ms
    }
}

fn sanitize_duration(duration_ms: f64) -> f64 {
    if duration_ms.is_finite() {
        duration_ms.max(0.0)
    } else {
        0.0
    }
}
