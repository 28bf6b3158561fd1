//! Viewport and input metrics of the device rendering the intro

use serde::{Deserialize, Serialize};

/// Widest CSS viewport still treated as a handheld layout
pub const HANDHELD_MAX_WIDTH: u32 = 768;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceMetrics {
    pub width: u32,
    pub height: u32,
    pub dpr: f32,
    pub touch: bool,
}

impl DeviceMetrics {
    pub fn desktop() -> Self {
        DeviceMetrics {
            width: 1280,
            height: 720,
            dpr: 1.0,
            touch: false,
        }
    }

    pub fn phone() -> Self {
        DeviceMetrics {
            width: 390,
            height: 844,
            dpr: 3.0,
            touch: true,
        }
    }

    /// A narrow viewport that also reports touch input
    pub fn is_handheld(&self) -> bool {
        self.touch && self.width <= HANDHELD_MAX_WIDTH
    }
}

impl Default for DeviceMetrics {
    fn default() -> Self {
        Self::desktop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handheld_requires_touch_and_narrow_viewport() {
        assert!(DeviceMetrics::phone().is_handheld());
        assert!(!DeviceMetrics::desktop().is_handheld());

        let touch_laptop = DeviceMetrics {
            width: 1440,
            height: 900,
            dpr: 2.0,
            touch: true,
        };
        assert!(!touch_laptop.is_handheld());
    }
}
