//! What the overlay renders for a given playback state

use crate::style::StyleMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverlayView {
    /// Loading indicator with progress in `[0, 1]`
    Loading { text: String, progress: f64 },
    Buffering { text: String },
    /// Manual play affordance; without a label the whole overlay is the target
    PlayPrompt { label: Option<String> },
    Playing,
    Dissolving,
    Error { message: String, retry_label: String },
    /// Nothing visible, though the controller stays mounted
    Hidden,
}

impl OverlayView {
    pub fn accepts_play(&self) -> bool {
        matches!(self, OverlayView::PlayPrompt { .. })
    }

    pub fn accepts_retry(&self) -> bool {
        matches!(self, OverlayView::Error { .. })
    }
}

/// One render pass: the view plus the styles consulted for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub view: OverlayView,
    pub container_style: StyleMap,
    pub video_style: StyleMap,
}
