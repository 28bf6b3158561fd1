//! Arche Forge intro video
//!
//! Playback orchestration for the landing page's intro overlay: detect what
//! the browser is likely to allow, autoplay the intro when possible, fall
//! back to a tap-to-play affordance when autoplay is blocked, and dissolve
//! into the hero content when the video ends.
//!
//! # Features
//!
//! - **Capability detection**: user-agent, secure-context and codec probing
//!   into an immutable [`CapabilitySnapshot`]
//! - **Playback controller**: one explicit state machine driven by a single
//!   dispatch function
//! - **Style adapter**: pure style maps consulted on every render
//! - **Runtime** (default feature `runtime`): a tokio-backed session driver
//!
//! # Example
//!
//! ```
//! use arche_intro::controller::{Event, Lifecycle, ManualScheduler, VideoController};
//! use arche_intro::platform::{SimulatedMedia, StaticEnvironment};
//! use arche_intro::IntroConfig;
//!
//! let snapshot = arche_intro::detect(&StaticEnvironment::default());
//! let media = SimulatedMedia::new().with_duration(4.0);
//! let mut controller = VideoController::new(
//!     IntroConfig::new("https://cdn.archeforge.com/intro.mp4"),
//!     snapshot,
//!     Box::new(media.clone()),
//!     Box::new(ManualScheduler::new()),
//! );
//!
//! controller.mount().unwrap();
//! controller.dispatch(Event::CanPlay);
//! assert_eq!(media.play_calls(), 1);
//! controller.dispatch(Event::PlayResolved(Ok(())));
//! assert_eq!(controller.lifecycle(), Lifecycle::Playing);
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

pub mod error;
pub use error::{Error, Result};

pub mod capability;
pub mod controller;
pub mod platform;
pub mod style;

// tokio session driver used by the CLI
#[cfg(feature = "runtime")]
pub mod runtime;

pub use capability::{detect, BrowserFamily, CapabilitySnapshot, DeviceClass, VideoFormat};
pub use controller::{Event, Lifecycle, PlaybackState, VideoController};

/// Configuration supplied by the host page
///
/// Deserialises from JSON with every field optional; `validate` is run at
/// mount.
///
/// # Examples
///
/// ```
/// let cfg = arche_intro::IntroConfig::default();
/// assert!(cfg.attempt_autoplay);
/// assert_eq!(cfg.dissolve_ms, 500);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IntroConfig {
    /// Primary video source
    pub source_url: String,
    /// Per-format sources used when the preferred format has one
    pub alternate_sources: BTreeMap<VideoFormat, String>,
    /// Whether to try playing without a gesture
    pub attempt_autoplay: bool,
    /// Whether the manual play affordance carries a visible label
    pub show_play_button: bool,
    pub loading_text: String,
    pub play_button_text: String,
    pub retry_text: String,
    /// Host-supplied reduced-motion preference
    pub reduced_motion: bool,
    /// Length of the fade after the video ends
    pub dissolve_ms: u64,
    /// How long to play when the element reports no usable duration
    pub duration_fallback_ms: u64,
}

impl IntroConfig {
    pub fn new(source_url: &str) -> Self {
        Self {
            source_url: source_url.to_string(),
            ..Default::default()
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.source_url.trim().is_empty() {
            return Err(Error::ConfigError("source_url must not be empty".to_string()));
        }
        if self.source_url.chars().any(char::is_whitespace) {
            return Err(Error::ConfigError(format!(
                "source_url contains whitespace: {:?}",
                self.source_url
            )));
        }
        if self.duration_fallback_ms == 0 {
            return Err(Error::ConfigError(
                "duration_fallback_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective dissolve length; reduced motion skips the fade.
    pub fn dissolve_duration(&self) -> Duration {
        if self.reduced_motion {
            Duration::ZERO
        } else {
            Duration::from_millis(self.dissolve_ms)
        }
    }

    pub fn duration_fallback(&self) -> Duration {
        Duration::from_millis(self.duration_fallback_ms)
    }
}

impl Default for IntroConfig {
    fn default() -> Self {
        Self {
            source_url: String::new(),
            alternate_sources: BTreeMap::new(),
            attempt_autoplay: true,
            show_play_button: true,
            loading_text: "Loading...".to_string(),
            play_button_text: "Tap to play".to_string(),
            retry_text: "Retry".to_string(),
            reduced_motion: false,
            dissolve_ms: 500,
            duration_fallback_ms: 8000,
        }
    }
}
