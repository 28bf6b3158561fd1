//! Style adapter: semantic style intents to concrete property maps
//!
//! Everything here is pure. Missing environment features produce empty
//! maps rather than errors so the overlay can always render.

use crate::capability::{BrowserFamily, CapabilitySnapshot};
use serde::Serialize;
use std::collections::BTreeMap;

/// An ordered CSS property map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StyleMap(BTreeMap<String, String>);

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, property: &str, value: impl Into<String>) {
        self.0.insert(property.to_string(), value.into());
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.0.get(property).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Merge `other` into `self`; `other` wins on conflicts.
    pub fn merge(mut self, other: StyleMap) -> Self {
        self.0.extend(other.0);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as an inline `style` attribute value
    pub fn to_inline(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}: {};", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn needs_webkit_prefix(snapshot: &CapabilitySnapshot) -> bool {
    snapshot.browser_family == BrowserFamily::Safari
}

/// Promote the overlay to its own compositor layer.
pub fn hardware_acceleration(snapshot: &CapabilitySnapshot) -> StyleMap {
    let mut s = StyleMap::new();
    s.set("transform", "translateZ(0)");
    s.set("backface-visibility", "hidden");
    s.set("will-change", "opacity, transform");
    if needs_webkit_prefix(snapshot) {
        s.set("-webkit-transform", "translateZ(0)");
        s.set("-webkit-backface-visibility", "hidden");
    }
    s
}

/// Make the video fill and crop to its container at any viewport size.
pub fn responsive_video(snapshot: &CapabilitySnapshot) -> StyleMap {
    let mut s = StyleMap::new();
    s.set("position", "absolute");
    s.set("top", "0");
    s.set("left", "0");
    s.set("width", "100%");
    s.set("height", "100%");
    s.set("object-fit", "cover");
    s.set("object-position", "center");
    if snapshot.is_mobile() {
        // dynamic viewport units track collapsing browser toolbars
        s.set("min-height", "100dvh");
    } else {
        s.set("min-height", "100vh");
    }
    s
}

/// Padding that keeps overlay controls clear of notches and home bars.
pub fn safe_area_padding(supported: bool) -> StyleMap {
    let mut s = StyleMap::new();
    if !supported {
        return s;
    }
    for side in ["top", "right", "bottom", "left"] {
        s.set(
            &format!("padding-{}", side),
            format!("env(safe-area-inset-{})", side),
        );
    }
    s
}

/// Opacity fade applied while the overlay dissolves.
///
/// With reduced motion the opacity still flips but no transition is set.
pub fn dissolve(duration_ms: u64, reduced_motion: bool, active: bool) -> StyleMap {
    let mut s = StyleMap::new();
    s.set("opacity", if active { "0" } else { "1" });
    if !reduced_motion && duration_ms > 0 {
        s.set("transition", format!("opacity {}ms linear", duration_ms));
    }
    if active {
        s.set("pointer-events", "none");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::DeviceClass;

    fn snapshot(family: BrowserFamily, device: DeviceClass) -> CapabilitySnapshot {
        CapabilitySnapshot::from_parts(family, Some(120), device, true)
    }

    #[test]
    fn safari_gets_prefixed_acceleration() {
        let chrome = hardware_acceleration(&snapshot(BrowserFamily::Chrome, DeviceClass::Desktop));
        let safari = hardware_acceleration(&snapshot(BrowserFamily::Safari, DeviceClass::Desktop));
        assert!(chrome.get("-webkit-transform").is_none());
        assert_eq!(safari.get("-webkit-transform"), Some("translateZ(0)"));
        assert_eq!(safari.get("transform"), chrome.get("transform"));
    }

    #[test]
    fn responsive_video_uses_dynamic_viewport_on_mobile() {
        let mobile = responsive_video(&snapshot(BrowserFamily::Chrome, DeviceClass::Mobile));
        let desktop = responsive_video(&snapshot(BrowserFamily::Chrome, DeviceClass::Desktop));
        assert_eq!(mobile.get("min-height"), Some("100dvh"));
        assert_eq!(desktop.get("min-height"), Some("100vh"));
        assert_eq!(desktop.get("object-fit"), Some("cover"));
    }

    #[test]
    fn safe_area_degrades_to_noop() {
        assert!(safe_area_padding(false).is_empty());
        let padded = safe_area_padding(true);
        assert_eq!(padded.len(), 4);
        assert_eq!(padded.get("padding-top"), Some("env(safe-area-inset-top)"));
    }

    #[test]
    fn dissolve_respects_reduced_motion() {
        let fading = dissolve(500, false, true);
        assert_eq!(fading.get("opacity"), Some("0"));
        assert_eq!(fading.get("transition"), Some("opacity 500ms linear"));

        let instant = dissolve(500, true, true);
        assert_eq!(instant.get("opacity"), Some("0"));
        assert!(instant.get("transition").is_none());

        assert_eq!(dissolve(500, false, false).get("opacity"), Some("1"));
    }

    #[test]
    fn merge_prefers_right_hand_side() {
        let mut a = StyleMap::new();
        a.set("opacity", "1");
        a.set("top", "0");
        let mut b = StyleMap::new();
        b.set("opacity", "0");
        let m = a.merge(b);
        assert_eq!(m.get("opacity"), Some("0"));
        assert_eq!(m.to_inline(), "opacity: 0; top: 0;");
    }
}
