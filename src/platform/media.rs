//! Media element surface driven by the playback controller

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Answer of `HTMLMediaElement.canPlayType`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanPlayType {
    #[default]
    No,
    Maybe,
    Probably,
}

impl CanPlayType {
    /// Parse the DOM string answer; anything unrecognised means "no".
    pub fn from_dom(s: &str) -> Self {
        match s.trim() {
            "probably" => CanPlayType::Probably,
            "maybe" => CanPlayType::Maybe,
            _ => CanPlayType::No,
        }
    }

    pub fn is_playable(self) -> bool {
        self != CanPlayType::No
    }
}

/// Preload hint applied to the element before loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preload {
    None,
    Metadata,
    #[default]
    Auto,
}

impl Preload {
    pub fn as_str(self) -> &'static str {
        match self {
            Preload::None => "none",
            Preload::Metadata => "metadata",
            Preload::Auto => "auto",
        }
    }
}

/// A `<video>`-like element exclusively owned by one controller.
///
/// `play` only issues the request. Hosts deliver the deferred outcome back
/// to the controller as `Event::PlayResolved`; an `Err` from `play` itself
/// models a synchronous throw.
pub trait MediaElement {
    fn set_src(&mut self, url: &str) -> Result<()>;
    fn set_preload(&mut self, preload: Preload);
    fn load(&mut self) -> Result<()>;
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self);
    /// Raw duration in seconds; `NaN` or infinite while unknown
    fn duration(&self) -> f64;
    fn attach_listeners(&mut self);
    fn detach_listeners(&mut self);
}

type PlayHook = Rc<dyn Fn()>;

#[derive(Default)]
struct SimulatedState {
    src: Option<String>,
    preload: Preload,
    duration: f64,
    listeners_attached: bool,
    attach_calls: u32,
    load_calls: u32,
    play_calls: u32,
    pause_calls: u32,
    play_throws: Option<String>,
    on_play: Option<PlayHook>,
}

/// In-memory element that records every call for tests and the CLI.
///
/// Clones share state, so a test can keep one handle while the controller
/// owns another.
#[derive(Clone)]
pub struct SimulatedMedia {
    state: Rc<RefCell<SimulatedState>>,
}

impl SimulatedMedia {
    pub fn new() -> Self {
        let state = SimulatedState {
            duration: f64::NAN,
            ..Default::default()
        };
        SimulatedMedia {
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn with_duration(self, seconds: f64) -> Self {
        self.set_duration(seconds);
        self
    }

    pub fn set_duration(&self, seconds: f64) {
        self.state.borrow_mut().duration = seconds;
    }

    /// Make the next `play` calls throw synchronously with `message`.
    pub fn set_play_throws(&self, message: Option<&str>) {
        self.state.borrow_mut().play_throws = message.map(|m| m.to_string());
    }

    /// Register a hook invoked after each accepted play request
    pub fn on_play<F>(&self, cb: F)
    where
        F: Fn() + 'static,
    {
        self.state.borrow_mut().on_play = Some(Rc::new(cb));
    }

    pub fn clear_on_play(&self) {
        self.state.borrow_mut().on_play = None;
    }

    pub fn src(&self) -> Option<String> {
        self.state.borrow().src.clone()
    }

    pub fn preload(&self) -> Preload {
        self.state.borrow().preload
    }

    pub fn listeners_attached(&self) -> bool {
        self.state.borrow().listeners_attached
    }

    pub fn attach_calls(&self) -> u32 {
        self.state.borrow().attach_calls
    }

    pub fn load_calls(&self) -> u32 {
        self.state.borrow().load_calls
    }

    pub fn play_calls(&self) -> u32 {
        self.state.borrow().play_calls
    }

    pub fn pause_calls(&self) -> u32 {
        self.state.borrow().pause_calls
    }
}

impl Default for SimulatedMedia {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaElement for SimulatedMedia {
    fn set_src(&mut self, url: &str) -> Result<()> {
        if url.trim().is_empty() {
            return Err(Error::MediaError("empty source URL".to_string()));
        }
        self.state.borrow_mut().src = Some(url.to_string());
        Ok(())
    }

    fn set_preload(&mut self, preload: Preload) {
        self.state.borrow_mut().preload = preload;
    }

    fn load(&mut self) -> Result<()> {
        let mut s = self.state.borrow_mut();
        if s.src.is_none() {
            return Err(Error::MediaError("load() without a source".to_string()));
        }
        s.load_calls += 1;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        // The hook may re-enter other handles, so release the borrow first.
        let hook = {
            let mut s = self.state.borrow_mut();
            s.play_calls += 1;
            if let Some(msg) = &s.play_throws {
                return Err(Error::MediaError(msg.clone()));
            }
            s.on_play.clone()
        };
        if let Some(cb) = hook {
            cb();
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.state.borrow_mut().pause_calls += 1;
    }

    fn duration(&self) -> f64 {
        self.state.borrow().duration
    }

    fn attach_listeners(&mut self) {
        let mut s = self.state.borrow_mut();
        s.listeners_attached = true;
        s.attach_calls += 1;
    }

    fn detach_listeners(&mut self) {
        self.state.borrow_mut().listeners_attached = false;
    }
}
