//! Capability detection
//!
//! Builds an immutable [`CapabilitySnapshot`] from the ambient browser
//! properties. Detection never fails: anything it cannot recognise degrades
//! to the conservative "needs a user gesture" outcome, and the controller
//! treats the real `play()` outcome as authoritative over this prediction.

use crate::platform::{DeviceMetrics, Environment};
use log::debug;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use url::{Host, Url};

/// Lowest Chrome major version whose muted autoplay we trust without a gesture
pub const MIN_CHROME_AUTOPLAY_VERSION: u32 = 66;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserFamily {
    Chrome,
    Firefox,
    Safari,
    Edge,
    Ie,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

/// Container formats the intro asset can be served in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    Mp4,
    Webm,
    Ogg,
}

impl VideoFormat {
    pub const ALL: [VideoFormat; 3] = [VideoFormat::Mp4, VideoFormat::Webm, VideoFormat::Ogg];

    /// MIME type with codec parameters used for the `canPlayType` probe
    pub fn probe_mime(self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "video/mp4; codecs=\"avc1.42E01E, mp4a.40.2\"",
            VideoFormat::Webm => "video/webm; codecs=\"vp9, opus\"",
            VideoFormat::Ogg => "video/ogg; codecs=\"theora, vorbis\"",
        }
    }
}

/// What the controller knows about its runtime, computed once at mount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySnapshot {
    pub browser_family: BrowserFamily,
    /// Major version, when the user agent carried a parseable one
    pub browser_version: Option<u32>,
    pub device_class: DeviceClass,
    /// HTTPS, or a recognised local-development host
    pub is_secure_context: bool,
    pub needs_user_gesture_for_autoplay: bool,
    pub supported_formats: Vec<VideoFormat>,
    pub preferred_format: VideoFormat,
    /// Save-data or a 2g-class connection
    pub constrained_network: bool,
    /// Whether `env(safe-area-inset-*)` can be used for padding
    pub supports_safe_area_insets: bool,
}

impl CapabilitySnapshot {
    /// Build a snapshot from its primary fields, deriving the gesture
    /// prediction. Formats default to mp4 only.
    pub fn from_parts(
        browser_family: BrowserFamily,
        browser_version: Option<u32>,
        device_class: DeviceClass,
        is_secure_context: bool,
    ) -> Self {
        let mut snapshot = CapabilitySnapshot {
            browser_family,
            browser_version,
            device_class,
            is_secure_context,
            needs_user_gesture_for_autoplay: true,
            supported_formats: vec![VideoFormat::Mp4],
            preferred_format: VideoFormat::Mp4,
            constrained_network: false,
            supports_safe_area_insets: true,
        };
        snapshot.needs_user_gesture_for_autoplay = needs_user_gesture_for_autoplay(&snapshot);
        snapshot
    }

    pub fn is_mobile(&self) -> bool {
        self.device_class == DeviceClass::Mobile
    }
}

/// Inspect the environment and produce a snapshot.
pub fn detect(env: &dyn Environment) -> CapabilitySnapshot {
    let ua = env.user_agent();
    let (browser_family, browser_version) = parse_browser(&ua);
    let device_class = classify_device(&ua, &env.device_metrics());
    let is_secure_context = is_secure_context(&env.location());

    let supported_formats: Vec<VideoFormat> = VideoFormat::ALL
        .into_iter()
        .filter(|f| env.can_play_type(f.probe_mime()).is_playable())
        .collect();
    let preferred_format = preferred_format(&supported_formats);
    let constrained_network = env
        .network_info()
        .map(|n| n.is_constrained())
        .unwrap_or(false);

    let mut snapshot = CapabilitySnapshot {
        browser_family,
        browser_version,
        device_class,
        is_secure_context,
        needs_user_gesture_for_autoplay: true,
        supported_formats,
        preferred_format,
        constrained_network,
        supports_safe_area_insets: env.supports_safe_area_insets(),
    };
    snapshot.needs_user_gesture_for_autoplay = needs_user_gesture_for_autoplay(&snapshot);

    debug!(
        "capabilities: {:?} {:?} on {:?}, secure={}, gesture={}, format={:?}",
        snapshot.browser_family,
        snapshot.browser_version,
        snapshot.device_class,
        snapshot.is_secure_context,
        snapshot.needs_user_gesture_for_autoplay,
        snapshot.preferred_format
    );
    snapshot
}

/// Heuristic prediction of the autoplay policy.
pub fn needs_user_gesture_for_autoplay(snapshot: &CapabilitySnapshot) -> bool {
    if !snapshot.is_secure_context {
        return true;
    }
    if matches!(
        snapshot.browser_family,
        BrowserFamily::Safari | BrowserFamily::Unknown
    ) {
        return true;
    }
    if snapshot.device_class == DeviceClass::Mobile {
        return true;
    }
    if snapshot.browser_family == BrowserFamily::Chrome {
        return snapshot
            .browser_version
            .map_or(true, |v| v < MIN_CHROME_AUTOPLAY_VERSION);
    }
    false
}

/// Ordered user-agent matching.
///
/// Edge and Opera embed "Chrome/", and every Chromium UA embeds "Safari/",
/// so the more specific tokens are checked first.
pub fn parse_browser(ua: &str) -> (BrowserFamily, Option<u32>) {
    for token in ["Edg/", "EdgA/", "EdgiOS/", "Edge/"] {
        if ua.contains(token) {
            return (BrowserFamily::Edge, version_after(ua, token));
        }
    }
    if ua.contains("MSIE ") {
        return (BrowserFamily::Ie, version_after(ua, "MSIE "));
    }
    if ua.contains("Trident/") {
        return (BrowserFamily::Ie, version_after(ua, "rv:"));
    }
    for token in ["Firefox/", "FxiOS/"] {
        if ua.contains(token) {
            return (BrowserFamily::Firefox, version_after(ua, token));
        }
    }
    for token in ["CriOS/", "Chrome/", "Chromium/"] {
        if ua.contains(token) {
            return (BrowserFamily::Chrome, version_after(ua, token));
        }
    }
    if ua.contains("Safari/") && !ua.contains("Chrome") && !ua.contains("Android") {
        return (BrowserFamily::Safari, version_after(ua, "Version/"));
    }
    (BrowserFamily::Unknown, None)
}

fn version_after(ua: &str, token: &str) -> Option<u32> {
    let start = ua.find(token)? + token.len();
    let digits: String = ua[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

const MOBILE_MARKERS: [&str; 8] = [
    "Mobi",
    "Android",
    "iPhone",
    "iPad",
    "iPod",
    "Windows Phone",
    "webOS",
    "BlackBerry",
];

pub fn classify_device(ua: &str, metrics: &DeviceMetrics) -> DeviceClass {
    if MOBILE_MARKERS.iter().any(|m| ua.contains(m)) {
        return DeviceClass::Mobile;
    }
    // iPadOS reports a desktop Macintosh UA but still has touch input
    if ua.contains("Macintosh") && metrics.touch {
        return DeviceClass::Mobile;
    }
    if metrics.is_handheld() {
        return DeviceClass::Mobile;
    }
    DeviceClass::Desktop
}

/// HTTPS, or a loopback/private-network host kept usable for local
/// development. This is not a security boundary.
pub fn is_secure_context(location: &str) -> bool {
    let Ok(url) = Url::parse(location) else {
        return false;
    };
    if url.scheme() == "https" {
        return true;
    }
    match url.host() {
        Some(Host::Domain(d)) => d == "localhost" || d.ends_with(".localhost"),
        Some(Host::Ipv4(ip)) => is_local_ip(IpAddr::V4(ip)),
        Some(Host::Ipv6(ip)) => is_local_ip(IpAddr::V6(ip)),
        None => false,
    }
}

fn is_local_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_loopback() || v4.is_private() || v4.is_unspecified(),
        // fc00::/7 unique-local
        IpAddr::V6(v6) => v6.is_loopback() || (v6.segments()[0] & 0xfe00) == 0xfc00,
    }
}

/// The asset is hosted as mp4 first; other containers only when mp4 is not
/// playable.
pub fn preferred_format(supported: &[VideoFormat]) -> VideoFormat {
    VideoFormat::ALL
        .into_iter()
        .find(|f| supported.contains(f))
        .unwrap_or(VideoFormat::Mp4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{CanPlayType, NetworkInfo, StaticEnvironment};

    const CHROME_DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const CHROME_OLD: &str = "Mozilla/5.0 (Windows NT 6.1) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.36";
    const SAFARI_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1";
    const FIREFOX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
    const EDGE: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.2210.91";
    const IE11: &str = "Mozilla/5.0 (Windows NT 10.0; Trident/7.0; rv:11.0) like Gecko";
    const ANDROID_CHROME: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.6099.144 Mobile Safari/537.36";

    #[test]
    fn browser_families_are_told_apart() {
        assert_eq!(parse_browser(CHROME_DESKTOP), (BrowserFamily::Chrome, Some(120)));
        assert_eq!(parse_browser(SAFARI_MAC), (BrowserFamily::Safari, Some(17)));
        assert_eq!(parse_browser(FIREFOX), (BrowserFamily::Firefox, Some(121)));
        assert_eq!(parse_browser(EDGE), (BrowserFamily::Edge, Some(120)));
        assert_eq!(parse_browser(IE11), (BrowserFamily::Ie, Some(11)));
        assert_eq!(parse_browser("curl/8.4.0"), (BrowserFamily::Unknown, None));
        assert_eq!(parse_browser(""), (BrowserFamily::Unknown, None));
    }

    #[test]
    fn chrome_is_never_mistaken_for_safari() {
        assert_eq!(parse_browser(ANDROID_CHROME).0, BrowserFamily::Chrome);
        assert_eq!(parse_browser(CHROME_OLD).0, BrowserFamily::Chrome);
    }

    #[test]
    fn mobile_markers_and_touch_macs_are_mobile() {
        let desktop = DeviceMetrics::desktop();
        assert_eq!(classify_device(SAFARI_IPHONE, &desktop), DeviceClass::Mobile);
        assert_eq!(classify_device(ANDROID_CHROME, &desktop), DeviceClass::Mobile);
        assert_eq!(classify_device(CHROME_DESKTOP, &desktop), DeviceClass::Desktop);

        let touch_mac = DeviceMetrics {
            touch: true,
            ..DeviceMetrics::desktop()
        };
        assert_eq!(classify_device(SAFARI_MAC, &touch_mac), DeviceClass::Mobile);
        assert_eq!(
            classify_device(CHROME_DESKTOP, &DeviceMetrics::phone()),
            DeviceClass::Mobile
        );
    }

    #[test]
    fn secure_context_accepts_https_and_local_hosts() {
        assert!(is_secure_context("https://archeforge.com/"));
        assert!(is_secure_context("http://localhost:3000/"));
        assert!(is_secure_context("http://app.localhost/"));
        assert!(is_secure_context("http://127.0.0.1:8080/"));
        assert!(is_secure_context("http://192.168.1.20:5173/"));
        assert!(is_secure_context("http://10.0.0.5/"));
        assert!(is_secure_context("http://172.16.4.2/"));
        assert!(is_secure_context("http://[::1]:3000/"));
        assert!(is_secure_context("http://0.0.0.0:5173/"));
        assert!(is_secure_context("http://[fd12:3456:789a::1]:8080/"));
        assert!(is_secure_context("http://[fc00::2]/"));

        assert!(!is_secure_context("http://archeforge.com/"));
        assert!(!is_secure_context("http://172.32.0.1/"));
        assert!(!is_secure_context("http://8.8.8.8/"));
        assert!(!is_secure_context("http://[2001:db8::1]/"));
        assert!(!is_secure_context("http://[fe80::1]/"));
        assert!(!is_secure_context("file:///tmp/index.html"));
        assert!(!is_secure_context("not a url"));
    }

    #[test]
    fn insecure_context_always_needs_gesture() {
        let families = [
            BrowserFamily::Chrome,
            BrowserFamily::Firefox,
            BrowserFamily::Safari,
            BrowserFamily::Edge,
            BrowserFamily::Ie,
            BrowserFamily::Unknown,
        ];
        for family in families {
            for device in [DeviceClass::Mobile, DeviceClass::Desktop] {
                for version in [None, Some(1), Some(120)] {
                    let s = CapabilitySnapshot::from_parts(family, version, device, false);
                    assert!(
                        s.needs_user_gesture_for_autoplay,
                        "{:?} {:?} {:?}",
                        family, version, device
                    );
                }
            }
        }
    }

    #[test]
    fn gesture_heuristic_on_secure_contexts() {
        let desktop = DeviceClass::Desktop;
        let gesture = |f, v, d| CapabilitySnapshot::from_parts(f, v, d, true).needs_user_gesture_for_autoplay;

        assert!(!gesture(BrowserFamily::Chrome, Some(120), desktop));
        assert!(gesture(BrowserFamily::Chrome, Some(58), desktop));
        assert!(gesture(BrowserFamily::Chrome, None, desktop));
        assert!(!gesture(BrowserFamily::Firefox, Some(121), desktop));
        assert!(!gesture(BrowserFamily::Edge, Some(120), desktop));
        assert!(gesture(BrowserFamily::Safari, Some(17), desktop));
        assert!(gesture(BrowserFamily::Unknown, None, desktop));
        assert!(gesture(BrowserFamily::Chrome, Some(120), DeviceClass::Mobile));
    }

    #[test]
    fn detect_reads_environment() {
        let env = StaticEnvironment::new()
            .with_user_agent(SAFARI_IPHONE)
            .with_metrics(DeviceMetrics::phone())
            .with_codec("video/webm", CanPlayType::No)
            .with_network(Some(NetworkInfo {
                effective_type: "2g".into(),
                save_data: false,
                downlink_mbps: Some(0.2),
            }));
        let s = detect(&env);
        assert_eq!(s.browser_family, BrowserFamily::Safari);
        assert_eq!(s.device_class, DeviceClass::Mobile);
        assert!(s.is_secure_context);
        assert!(s.needs_user_gesture_for_autoplay);
        assert_eq!(s.supported_formats, vec![VideoFormat::Mp4]);
        assert_eq!(s.preferred_format, VideoFormat::Mp4);
        assert!(s.constrained_network);
    }

    #[test]
    fn preferred_format_falls_back_to_mp4() {
        assert_eq!(preferred_format(&[]), VideoFormat::Mp4);
        assert_eq!(
            preferred_format(&[VideoFormat::Ogg, VideoFormat::Webm]),
            VideoFormat::Webm
        );
        assert_eq!(
            preferred_format(&[VideoFormat::Webm, VideoFormat::Mp4]),
            VideoFormat::Mp4
        );
    }
}
