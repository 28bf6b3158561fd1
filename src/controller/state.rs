//! Lifecycle and playback state owned by a single controller

use crate::capability::CapabilitySnapshot;
use serde::Serialize;

/// Mutually exclusive lifecycle of the intro video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    Idle,
    Loading,
    Buffering,
    Ready,
    Playing,
    Ended,
    Dissolving,
    Complete,
    Error,
}

impl Lifecycle {
    /// No automatic progress happens from a terminal state
    pub fn is_terminal(self) -> bool {
        matches!(self, Lifecycle::Complete | Lifecycle::Error)
    }

    pub fn can_transition_to(self, target: Lifecycle) -> bool {
        use Lifecycle::*;
        if target == Error {
            return !self.is_terminal();
        }
        matches!(
            (self, target),
            (Idle, Loading)
                | (Loading, Ready)
                | (Loading, Buffering)
                | (Ready, Buffering)
                | (Buffering, Ready)
                | (Ready, Playing)
                // a fulfilled play request means the media is actually playing
                | (Buffering, Playing)
                | (Playing, Ended)
                | (Ended, Dissolving)
                | (Dissolving, Complete)
                // explicit user retry
                | (Error, Loading)
        )
    }
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Lifecycle::Idle => "idle",
            Lifecycle::Loading => "loading",
            Lifecycle::Buffering => "buffering",
            Lifecycle::Ready => "ready",
            Lifecycle::Playing => "playing",
            Lifecycle::Ended => "ended",
            Lifecycle::Dissolving => "dissolving",
            Lifecycle::Complete => "complete",
            Lifecycle::Error => "error",
        };
        f.write_str(s)
    }
}

/// Playback state, mutated only by the controller's event handlers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackState {
    pub lifecycle: Lifecycle,
    /// Fraction of the asset loaded, in `[0, 1]`
    pub load_progress: f64,
    pub needs_user_gesture: bool,
    pub autoplay_attempted: bool,
    pub error_message: Option<String>,
}

impl PlaybackState {
    pub fn new(snapshot: &CapabilitySnapshot) -> Self {
        PlaybackState {
            lifecycle: Lifecycle::Idle,
            load_progress: 0.0,
            needs_user_gesture: snapshot.needs_user_gesture_for_autoplay,
            autoplay_attempted: false,
            error_message: None,
        }
    }

    /// Progress never moves backwards; out-of-range and NaN reports are ignored.
    pub(crate) fn record_progress(&mut self, fraction: f64) {
        if fraction.is_nan() {
            return;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        if fraction > self.load_progress {
            self.load_progress = fraction;
        }
    }

    pub(crate) fn reset_for_retry(&mut self) {
        self.load_progress = 0.0;
        self.error_message = None;
        self.autoplay_attempted = false;
    }
}
