//! Events fed into the controller's dispatch function
//!
//! Native media events, the deferred outcome of `play()`, user input and
//! timer expiry all arrive through the single [`Event`] type.

use super::timer::TimerId;
use serde::{Deserialize, Serialize};

/// `MediaError.code` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaErrorCode {
    Aborted,
    Network,
    Decode,
    SrcNotSupported,
    Unknown,
}

impl MediaErrorCode {
    pub fn from_dom(code: u16) -> Self {
        match code {
            1 => MediaErrorCode::Aborted,
            2 => MediaErrorCode::Network,
            3 => MediaErrorCode::Decode,
            4 => MediaErrorCode::SrcNotSupported,
            _ => MediaErrorCode::Unknown,
        }
    }
}

/// A native media failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFault {
    pub code: MediaErrorCode,
    /// Browser-provided detail, often empty
    #[serde(default)]
    pub message: String,
}

impl MediaFault {
    pub fn new(code: MediaErrorCode, message: &str) -> Self {
        MediaFault {
            code,
            message: message.to_string(),
        }
    }

    /// A non-empty, user-presentable description
    pub fn describe(&self) -> String {
        let base = match self.code {
            MediaErrorCode::Aborted => "Video loading was aborted",
            MediaErrorCode::Network => "A network error interrupted the video",
            MediaErrorCode::Decode => "The video could not be decoded",
            MediaErrorCode::SrcNotSupported => "The video format is not supported",
            MediaErrorCode::Unknown => "The video failed to load",
        };
        let detail = self.message.trim();
        if detail.is_empty() {
            base.to_string()
        } else {
            format!("{}: {}", base, detail)
        }
    }
}

/// Why a play request was rejected (the `DOMException` name)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionKind {
    /// Autoplay policy: a user gesture is required
    NotAllowed,
    /// Interrupted by a pause or a new load
    Aborted,
    /// No supported source; this is a media failure, not policy friction
    NotSupported,
    Other,
}

impl RejectionKind {
    pub fn from_dom_name(name: &str) -> Self {
        match name {
            "NotAllowedError" => RejectionKind::NotAllowed,
            "AbortError" => RejectionKind::Aborted,
            "NotSupportedError" => RejectionKind::NotSupported,
            _ => RejectionKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayRejection {
    pub kind: RejectionKind,
    #[serde(default)]
    pub message: String,
}

impl PlayRejection {
    pub fn new(kind: RejectionKind, message: &str) -> Self {
        PlayRejection {
            kind,
            message: message.to_string(),
        }
    }

    pub fn not_allowed() -> Self {
        Self::new(
            RejectionKind::NotAllowed,
            "play() failed because the user didn't interact with the document first",
        )
    }

    pub fn describe(&self) -> String {
        if self.message.trim().is_empty() {
            format!("Playback was rejected ({:?})", self.kind)
        } else {
            format!("Playback was rejected: {}", self.message.trim())
        }
    }
}

/// Everything the controller reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// `progress`: fraction of the asset buffered
    Progress(f64),
    /// `canplay` / `canplaythrough`
    CanPlay,
    /// `waiting` / `stalled`
    Waiting,
    /// `playing`: playback resumed after buffering
    Playing,
    /// `durationchange`: new raw duration in seconds
    DurationChange(f64),
    /// `ended`
    Ended,
    /// `error`
    Error(MediaFault),
    /// Settlement of the promise returned by `play()`
    PlayResolved(Result<(), PlayRejection>),
    /// Click or tap on the manual play affordance
    UserPlay,
    /// Click or tap on the retry affordance
    UserRetry,
    TimerFired(TimerId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_descriptions_are_never_empty() {
        for code in 0..6u16 {
            let f = MediaFault::new(MediaErrorCode::from_dom(code), "  ");
            assert!(!f.describe().is_empty());
        }
        let f = MediaFault::new(MediaErrorCode::Decode, "PIPELINE_ERROR_DECODE");
        assert_eq!(
            f.describe(),
            "The video could not be decoded: PIPELINE_ERROR_DECODE"
        );
    }

    #[test]
    fn rejection_names_map_to_kinds() {
        assert_eq!(RejectionKind::from_dom_name("NotAllowedError"), RejectionKind::NotAllowed);
        assert_eq!(RejectionKind::from_dom_name("AbortError"), RejectionKind::Aborted);
        assert_eq!(RejectionKind::from_dom_name("NotSupportedError"), RejectionKind::NotSupported);
        assert_eq!(RejectionKind::from_dom_name("TypeError"), RejectionKind::Other);
        assert!(PlayRejection::new(RejectionKind::Other, "").describe().contains("Other"));
    }
}
