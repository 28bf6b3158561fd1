//! tokio-backed session driver
//!
//! Runs a [`VideoController`] on the current task: native-event sources post
//! into an unbounded channel, timers are tokio sleeps that post
//! `Event::TimerFired`, and the session drains the channel until the
//! lifecycle settles.

use crate::capability::CapabilitySnapshot;
use crate::controller::{Event, Lifecycle, Scheduler, TimerId, VideoController};
use crate::platform::MediaElement;
use crate::{Error, IntroConfig, Result};
use log::{debug, trace};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// Handle for posting events into a session
pub type EventSender = UnboundedSender<Event>;

/// [`Scheduler`] backed by tokio timers. Must be used inside a runtime.
pub struct TokioScheduler {
    tx: EventSender,
    next_id: u64,
    tasks: HashMap<TimerId, JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new(tx: EventSender) -> Self {
        Self {
            tx,
            next_id: 0,
            tasks: HashMap::new(),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.tasks.values().filter(|h| !h.is_finished()).count()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        self.tasks.retain(|_, h| !h.is_finished());
        self.next_id += 1;
        let id = TimerId(self.next_id);
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // the session may already be gone
            let _ = tx.send(Event::TimerFired(id));
        });
        self.tasks.insert(id, handle);
        trace!("timer {:?} armed for {}ms", id, delay.as_millis());
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(handle) = self.tasks.remove(&id) {
            handle.abort();
            trace!("timer {:?} cancelled", id);
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

/// A controller wired to a tokio event channel.
pub struct IntroSession {
    controller: VideoController,
    tx: EventSender,
    rx: UnboundedReceiver<Event>,
}

impl IntroSession {
    /// Build the session. Must be called inside a tokio runtime.
    pub fn new(
        config: IntroConfig,
        snapshot: CapabilitySnapshot,
        element: Box<dyn MediaElement>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = TokioScheduler::new(tx.clone());
        let controller = VideoController::new(config, snapshot, element, Box::new(scheduler));
        Self { controller, tx, rx }
    }

    pub fn sender(&self) -> EventSender {
        self.tx.clone()
    }

    pub fn controller(&self) -> &VideoController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut VideoController {
        &mut self.controller
    }

    pub fn mount(&mut self) -> Result<()> {
        self.controller.mount()
    }

    pub fn unmount(&mut self) {
        self.controller.unmount();
    }

    /// Dispatch queued events until the lifecycle is terminal.
    ///
    /// Returns the settled lifecycle, or `Error::Timeout` if it does not
    /// settle in time. After an `error` the caller may post
    /// `Event::UserRetry` and run again.
    pub async fn run(&mut self, timeout: Duration) -> Result<Lifecycle> {
        if !self.controller.is_live() {
            return Err(Error::InvalidState("session is not mounted".to_string()));
        }
        let controller = &mut self.controller;
        let rx = &mut self.rx;
        let drive = async {
            while controller.is_live() && !controller.lifecycle().is_terminal() {
                match rx.recv().await {
                    Some(event) => {
                        controller.dispatch(event);
                    }
                    None => break,
                }
            }
            controller.lifecycle()
        };
        let settled = tokio::time::timeout(timeout, drive)
            .await
            .map_err(|_| Error::Timeout(timeout.as_millis() as u64))?;
        debug!("session settled in {}", settled);
        Ok(settled)
    }
}
