//! Video playback controller
//!
//! Owns one media element and sequences it through
//! `idle → loading → (buffering ⇄ ready) → playing → ended → dissolving →
//! complete`, with `error` reachable from any non-terminal state. Every
//! native event, play outcome, user input and timer expiry goes through
//! [`VideoController::dispatch`], which runs synchronously on the host's
//! event loop.

pub mod event;
pub mod state;
pub mod timer;
pub mod view;

pub use event::{Event, MediaErrorCode, MediaFault, PlayRejection, RejectionKind};
pub use state::{Lifecycle, PlaybackState};
pub use timer::{usable_duration, ManualScheduler, Scheduler, TimerId};
pub use view::{Frame, OverlayView};

use crate::capability::CapabilitySnapshot;
use crate::platform::{MediaElement, Preload};
use crate::{style, Error, IntroConfig, Result};
use log::{debug, trace, warn};
use timer::TimerSlot;

type OnLoadedHandler = Box<dyn Fn()>;
type OnErrorHandler = Box<dyn Fn(&str)>;
type OnCompleteHandler = Box<dyn Fn()>;

pub struct VideoController {
    config: IntroConfig,
    snapshot: CapabilitySnapshot,
    element: Box<dyn MediaElement>,
    scheduler: Box<dyn Scheduler>,
    state: PlaybackState,
    history: Vec<Lifecycle>,

    mounted: bool,
    /// Cleared on unmount; every handler checks it before touching state
    live: bool,
    play_pending: bool,
    loaded_notified: bool,
    dissolve_timer: TimerSlot,
    fallback_timer: TimerSlot,

    on_video_loaded: Option<OnLoadedHandler>,
    on_video_error: Option<OnErrorHandler>,
    on_transition_complete: Option<OnCompleteHandler>,
}

impl VideoController {
    /// Create an unmounted controller. The snapshot is fixed for the
    /// controller's lifetime.
    pub fn new(
        config: IntroConfig,
        snapshot: CapabilitySnapshot,
        element: Box<dyn MediaElement>,
        scheduler: Box<dyn Scheduler>,
    ) -> Self {
        let state = PlaybackState::new(&snapshot);
        Self {
            config,
            snapshot,
            element,
            scheduler,
            state,
            history: vec![Lifecycle::Idle],
            mounted: false,
            live: false,
            play_pending: false,
            loaded_notified: false,
            dissolve_timer: TimerSlot::default(),
            fallback_timer: TimerSlot::default(),
            on_video_loaded: None,
            on_video_error: None,
            on_transition_complete: None,
        }
    }

    /// Register a callback fired at most once, when the video first becomes playable.
    pub fn on_video_loaded<F>(&mut self, cb: F)
    where
        F: Fn() + 'static,
    {
        self.on_video_loaded = Some(Box::new(cb));
    }

    pub fn clear_on_video_loaded(&mut self) {
        self.on_video_loaded = None;
    }

    /// Register a callback fired for every media failure with its description.
    pub fn on_video_error<F>(&mut self, cb: F)
    where
        F: Fn(&str) + 'static,
    {
        self.on_video_error = Some(Box::new(cb));
    }

    pub fn clear_on_video_error(&mut self) {
        self.on_video_error = None;
    }

    /// Register a callback fired once the dissolve has finished.
    pub fn on_transition_complete<F>(&mut self, cb: F)
    where
        F: Fn() + 'static,
    {
        self.on_transition_complete = Some(Box::new(cb));
    }

    pub fn clear_on_transition_complete(&mut self) {
        self.on_transition_complete = None;
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.state.lifecycle
    }

    pub fn snapshot(&self) -> &CapabilitySnapshot {
        &self.snapshot
    }

    pub fn config(&self) -> &IntroConfig {
        &self.config
    }

    /// Every lifecycle the controller has been in, in order
    pub fn history(&self) -> &[Lifecycle] {
        &self.history
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// The URL handed to the element: the per-format alternate when one
    /// exists for the preferred format, otherwise the primary source.
    pub fn source_url(&self) -> &str {
        self.config
            .alternate_sources
            .get(&self.snapshot.preferred_format)
            .map(|s| s.as_str())
            .unwrap_or(&self.config.source_url)
    }

    /// Attach listeners and start loading. A controller mounts once.
    pub fn mount(&mut self) -> Result<()> {
        if self.mounted {
            return Err(Error::InvalidState("controller already mounted".to_string()));
        }
        self.config.validate()?;
        self.mounted = true;
        self.live = true;

        self.element.attach_listeners();
        let preload = if self.snapshot.constrained_network {
            Preload::Metadata
        } else {
            Preload::Auto
        };
        self.element.set_preload(preload);
        debug!("mounting intro video {} (preload={})", self.source_url(), preload.as_str());

        self.transition(Lifecycle::Loading);
        self.begin_load();
        Ok(())
    }

    /// Cancel timers, pause any playback in flight and detach listeners.
    /// Anything dispatched afterwards is dropped without touching state.
    pub fn unmount(&mut self) {
        if !self.live {
            return;
        }
        self.live = false;
        self.dissolve_timer.cancel(self.scheduler.as_mut());
        self.fallback_timer.cancel(self.scheduler.as_mut());
        // stop whatever playback this controller started
        if self.play_pending
            || matches!(self.state.lifecycle, Lifecycle::Playing | Lifecycle::Ended)
        {
            self.element.pause();
        }
        self.play_pending = false;
        self.element.detach_listeners();
        debug!("unmounted at {}", self.state.lifecycle);
    }

    /// Apply one event. Returns the new lifecycle when it changed.
    pub fn dispatch(&mut self, event: Event) -> Option<Lifecycle> {
        if !self.live {
            trace!("dropping {:?}: controller is not live", event);
            return None;
        }
        let before = self.state.lifecycle;
        match event {
            Event::Progress(fraction) => self.handle_progress(fraction),
            Event::CanPlay => self.handle_can_play(),
            Event::Waiting => self.handle_waiting(),
            Event::Playing => self.handle_resumed(),
            Event::DurationChange(secs) => self.handle_duration_change(secs),
            Event::Ended => self.handle_ended(),
            Event::Error(fault) => self.fail(fault.describe()),
            Event::PlayResolved(outcome) => self.handle_play_outcome(outcome),
            Event::UserPlay => self.handle_user_play(),
            Event::UserRetry => self.handle_user_retry(),
            Event::TimerFired(id) => self.handle_timer(id),
        }
        let after = self.state.lifecycle;
        (after != before).then_some(after)
    }

    /// True while the manual play affordance should be offered
    pub fn awaiting_gesture(&self) -> bool {
        self.state.lifecycle == Lifecycle::Ready
            && !self.play_pending
            && (self.state.needs_user_gesture || !self.config.attempt_autoplay)
    }

    pub fn render(&self) -> Frame {
        let view = match self.state.lifecycle {
            Lifecycle::Idle | Lifecycle::Loading => OverlayView::Loading {
                text: self.config.loading_text.clone(),
                progress: self.state.load_progress,
            },
            Lifecycle::Buffering => OverlayView::Buffering {
                text: self.config.loading_text.clone(),
            },
            Lifecycle::Ready if self.awaiting_gesture() => OverlayView::PlayPrompt {
                label: self
                    .config
                    .show_play_button
                    .then(|| self.config.play_button_text.clone()),
            },
            Lifecycle::Ready => OverlayView::Loading {
                text: self.config.loading_text.clone(),
                progress: self.state.load_progress,
            },
            Lifecycle::Playing | Lifecycle::Ended => OverlayView::Playing,
            Lifecycle::Dissolving => OverlayView::Dissolving,
            Lifecycle::Complete => OverlayView::Hidden,
            Lifecycle::Error => OverlayView::Error {
                message: self.state.error_message.clone().unwrap_or_default(),
                retry_label: self.config.retry_text.clone(),
            },
        };

        let fading = matches!(
            self.state.lifecycle,
            Lifecycle::Dissolving | Lifecycle::Complete
        );
        let container_style = style::hardware_acceleration(&self.snapshot)
            .merge(style::safe_area_padding(self.snapshot.supports_safe_area_insets))
            .merge(style::dissolve(
                self.config.dissolve_ms,
                self.config.reduced_motion,
                fading,
            ));
        Frame {
            view,
            container_style,
            video_style: style::responsive_video(&self.snapshot),
        }
    }

    fn transition(&mut self, to: Lifecycle) -> bool {
        let from = self.state.lifecycle;
        if !from.can_transition_to(to) {
            warn!("ignoring invalid transition {} -> {}", from, to);
            return false;
        }
        self.state.lifecycle = to;
        self.history.push(to);
        debug!("{} -> {}", from, to);
        true
    }

    fn begin_load(&mut self) {
        let src = self.source_url().to_string();
        let res = self
            .element
            .set_src(&src)
            .and_then(|_| self.element.load());
        if let Err(e) = res {
            self.fail(e.to_string());
        }
    }

    fn handle_progress(&mut self, fraction: f64) {
        if matches!(self.state.lifecycle, Lifecycle::Loading | Lifecycle::Buffering) {
            self.state.record_progress(fraction);
        } else {
            trace!("progress {:.2} ignored in {}", fraction, self.state.lifecycle);
        }
    }

    fn handle_can_play(&mut self) {
        if matches!(self.state.lifecycle, Lifecycle::Loading | Lifecycle::Buffering) {
            self.become_ready();
        } else {
            trace!("canplay ignored in {}", self.state.lifecycle);
        }
    }

    fn handle_waiting(&mut self) {
        match self.state.lifecycle {
            Lifecycle::Loading | Lifecycle::Ready => {
                self.transition(Lifecycle::Buffering);
            }
            // stalls mid-playback are the browser's to recover from
            other => trace!("waiting ignored in {}", other),
        }
    }

    fn handle_resumed(&mut self) {
        if self.state.lifecycle == Lifecycle::Buffering {
            self.become_ready();
        } else {
            trace!("playing ignored in {}", self.state.lifecycle);
        }
    }

    fn become_ready(&mut self) {
        if !self.transition(Lifecycle::Ready) {
            return;
        }
        self.state.record_progress(1.0);
        if !self.loaded_notified {
            self.loaded_notified = true;
            if let Some(cb) = &self.on_video_loaded {
                cb();
            }
        }
        self.maybe_autoplay();
    }

    fn maybe_autoplay(&mut self) {
        if self.state.lifecycle != Lifecycle::Ready
            || self.play_pending
            || self.state.autoplay_attempted
        {
            return;
        }
        if !self.config.attempt_autoplay || self.state.needs_user_gesture {
            debug!("autoplay skipped; waiting for a user gesture");
            return;
        }
        self.state.autoplay_attempted = true;
        self.request_play();
    }

    fn request_play(&mut self) {
        self.play_pending = true;
        if let Err(e) = self.element.play() {
            self.play_pending = false;
            warn!("play() threw synchronously: {}", e);
            self.state.needs_user_gesture = true;
        }
    }

    fn handle_play_outcome(&mut self, outcome: std::result::Result<(), PlayRejection>) {
        if !self.play_pending {
            trace!("stale play outcome {:?}", outcome);
            return;
        }
        self.play_pending = false;
        match outcome {
            Ok(()) => {
                if !matches!(self.state.lifecycle, Lifecycle::Ready | Lifecycle::Buffering) {
                    trace!("play fulfilled in {}", self.state.lifecycle);
                    return;
                }
                self.state.needs_user_gesture = false;
                if self.transition(Lifecycle::Playing) {
                    self.arm_duration_fallback();
                }
            }
            Err(rejection) if rejection.kind == RejectionKind::NotSupported => {
                self.fail(rejection.describe());
            }
            Err(rejection) => {
                if matches!(self.state.lifecycle, Lifecycle::Ready | Lifecycle::Buffering) {
                    debug!("{}; offering manual play", rejection.describe());
                    self.state.needs_user_gesture = true;
                }
            }
        }
    }

    fn handle_user_play(&mut self) {
        if !self.awaiting_gesture() {
            trace!("user play ignored in {}", self.state.lifecycle);
            return;
        }
        self.state.autoplay_attempted = true;
        self.request_play();
    }

    fn handle_user_retry(&mut self) {
        if self.state.lifecycle != Lifecycle::Error {
            trace!("retry ignored in {}", self.state.lifecycle);
            return;
        }
        self.dissolve_timer.cancel(self.scheduler.as_mut());
        self.fallback_timer.cancel(self.scheduler.as_mut());
        self.play_pending = false;
        self.state.reset_for_retry();
        self.transition(Lifecycle::Loading);
        self.begin_load();
    }

    /// Arm the fixed fallback when the element cannot tell us how long it
    /// will play.
    fn arm_duration_fallback(&mut self) {
        let raw = self.element.duration();
        if usable_duration(raw).is_some() {
            return;
        }
        let delay = self.config.duration_fallback();
        warn!(
            "unusable video duration ({}); ending after {}ms",
            raw,
            delay.as_millis()
        );
        self.fallback_timer.arm(self.scheduler.as_mut(), delay);
    }

    fn handle_duration_change(&mut self, secs: f64) {
        if self.state.lifecycle == Lifecycle::Playing && usable_duration(secs).is_some() {
            self.fallback_timer.cancel(self.scheduler.as_mut());
        }
    }

    fn handle_ended(&mut self) {
        if self.state.lifecycle == Lifecycle::Playing {
            self.finish_playback();
        } else {
            trace!("ended ignored in {}", self.state.lifecycle);
        }
    }

    fn finish_playback(&mut self) {
        self.fallback_timer.cancel(self.scheduler.as_mut());
        if self.transition(Lifecycle::Ended) && self.transition(Lifecycle::Dissolving) {
            let delay = self.config.dissolve_duration();
            self.dissolve_timer.arm(self.scheduler.as_mut(), delay);
        }
    }

    fn handle_timer(&mut self, id: TimerId) {
        if self.dissolve_timer.take_if(id) {
            if self.transition(Lifecycle::Complete) {
                if let Some(cb) = &self.on_transition_complete {
                    cb();
                }
            }
        } else if self.fallback_timer.take_if(id) {
            if self.state.lifecycle == Lifecycle::Playing {
                self.finish_playback();
            }
        } else {
            trace!("stale timer {:?}", id);
        }
    }

    fn fail(&mut self, message: String) {
        if self.state.lifecycle.is_terminal() {
            trace!("error ignored in {}: {}", self.state.lifecycle, message);
            return;
        }
        self.dissolve_timer.cancel(self.scheduler.as_mut());
        self.fallback_timer.cancel(self.scheduler.as_mut());
        self.play_pending = false;
        warn!("intro video failed: {}", message);
        self.state.error_message = Some(message.clone());
        self.transition(Lifecycle::Error);
        if let Some(cb) = &self.on_video_error {
            cb(&message);
        }
    }
}

impl Drop for VideoController {
    fn drop(&mut self) {
        self.unmount();
    }
}
