//! Network information surface (`navigator.connection`)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkInfo {
    /// Effective connection type such as "4g", "3g", "2g" or "slow-2g"
    pub effective_type: String,
    /// Whether the user asked for reduced data usage
    #[serde(default)]
    pub save_data: bool,
    /// Estimated downlink bandwidth, if reported
    #[serde(default)]
    pub downlink_mbps: Option<f64>,
}

impl NetworkInfo {
    /// True when preloading the whole intro asset would be unkind to the
    /// connection.
    pub fn is_constrained(&self) -> bool {
        self.save_data || matches!(self.effective_type.as_str(), "slow-2g" | "2g")
    }
}

impl Default for NetworkInfo {
    fn default() -> Self {
        Self {
            effective_type: "4g".to_string(),
            save_data: false,
            downlink_mbps: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_data_or_2g_is_constrained() {
        assert!(!NetworkInfo::default().is_constrained());

        let saver = NetworkInfo {
            save_data: true,
            ..Default::default()
        };
        assert!(saver.is_constrained());

        let slow = NetworkInfo {
            effective_type: "slow-2g".into(),
            ..Default::default()
        };
        assert!(slow.is_constrained());

        let three_g = NetworkInfo {
            effective_type: "3g".into(),
            ..Default::default()
        };
        assert!(!three_g.is_constrained());
    }
}
