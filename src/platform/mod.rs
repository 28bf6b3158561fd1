//! Host surface: ambient browser properties and the media element
//!
//! The controller never touches a browser directly. Hosts expose the
//! environment through [`Environment`] and the `<video>` element through
//! [`MediaElement`]; the in-memory implementations here back the tests and
//! the CLI.

pub mod device;
pub mod media;
pub mod network;

pub use device::DeviceMetrics;
pub use media::{CanPlayType, MediaElement, Preload, SimulatedMedia};
pub use network::NetworkInfo;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read-only view of the ambient browser properties used for detection.
pub trait Environment {
    fn user_agent(&self) -> String;
    /// Full page location (`window.location.href`)
    fn location(&self) -> String;
    fn device_metrics(&self) -> DeviceMetrics;
    /// Codec probe; `mime` may carry a `codecs` parameter
    fn can_play_type(&self, mime: &str) -> CanPlayType;
    /// `None` when the network-information API is unavailable
    fn network_info(&self) -> Option<NetworkInfo>;
    fn prefers_reduced_motion(&self) -> bool;
    /// Whether `env(safe-area-inset-*)` is understood
    fn supports_safe_area_insets(&self) -> bool;
}

/// An environment described by plain values.
///
/// Deserialisable so the CLI can load one from JSON; any missing field
/// falls back to the desktop Chrome default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticEnvironment {
    pub user_agent: String,
    pub location: String,
    pub metrics: DeviceMetrics,
    /// Container MIME type (without parameters) to probe answer
    pub codecs: BTreeMap<String, CanPlayType>,
    pub network: Option<NetworkInfo>,
    pub reduced_motion: bool,
    pub safe_area_insets: bool,
}

impl StaticEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_agent(mut self, ua: &str) -> Self {
        self.user_agent = ua.to_string();
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = location.to_string();
        self
    }

    pub fn with_metrics(mut self, metrics: DeviceMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_network(mut self, network: Option<NetworkInfo>) -> Self {
        self.network = network;
        self
    }

    pub fn with_codec(mut self, container: &str, answer: CanPlayType) -> Self {
        self.codecs.insert(container.to_string(), answer);
        self
    }
}

impl Default for StaticEnvironment {
    fn default() -> Self {
        let mut codecs = BTreeMap::new();
        codecs.insert("video/mp4".to_string(), CanPlayType::Probably);
        codecs.insert("video/webm".to_string(), CanPlayType::Probably);
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            location: "https://archeforge.com/".to_string(),
            metrics: DeviceMetrics::desktop(),
            codecs,
            network: Some(NetworkInfo::default()),
            reduced_motion: false,
            safe_area_insets: true,
        }
    }
}

impl Environment for StaticEnvironment {
    fn user_agent(&self) -> String {
        self.user_agent.clone()
    }

    fn location(&self) -> String {
        self.location.clone()
    }

    fn device_metrics(&self) -> DeviceMetrics {
        self.metrics
    }

    fn can_play_type(&self, mime: &str) -> CanPlayType {
        let container = mime.split(';').next().unwrap_or("").trim();
        self.codecs.get(container).copied().unwrap_or_default()
    }

    fn network_info(&self) -> Option<NetworkInfo> {
        self.network.clone()
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    fn supports_safe_area_insets(&self) -> bool {
        self.safe_area_insets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_environment_is_secure_desktop_chrome() {
        let env = StaticEnvironment::new();
        assert!(env.user_agent().contains("Chrome/120"));
        assert!(env.location().starts_with("https://"));
        assert_eq!(env.device_metrics().width, 1280);
        assert!(!env.prefers_reduced_motion());
    }

    #[test]
    fn codec_probe_ignores_parameters() {
        let env = StaticEnvironment::new().with_codec("video/ogg", CanPlayType::Maybe);
        assert_eq!(
            env.can_play_type("video/mp4; codecs=\"avc1.42E01E\""),
            CanPlayType::Probably
        );
        assert_eq!(env.can_play_type("video/ogg; codecs=\"theora\""), CanPlayType::Maybe);
        assert_eq!(env.can_play_type("video/x-flv"), CanPlayType::No);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let env: StaticEnvironment =
            serde_json::from_str(r#"{"location":"http://localhost:3000/"}"#).unwrap();
        assert_eq!(env.location, "http://localhost:3000/");
        assert!(env.user_agent.contains("Chrome"));
        assert_eq!(env.metrics, DeviceMetrics::desktop());
    }
}
