//! Timer Service
//!
//! Single-shot, cancelable/restartable delay. Firing delivers exactly one
//! event onto the controller queue; after firing the timer is inert until
//! restarted. Used for the inactivity screensaver and for the disable
//! dialog's countdown, as separate instances.

use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::events::ControllerEvent;

pub struct Timer {
    tx: UnboundedSender<ControllerEvent>,
    event: ControllerEvent,
    handle: Option<JoinHandle<()>>,
}

impl Timer {
    /// A timer that sends `event` onto the controller queue when it fires
    pub fn new(tx: UnboundedSender<ControllerEvent>, event: ControllerEvent) -> Self {
        Self {
            tx,
            event,
            handle: None,
        }
    }

    /// Schedule a firing after `delay`. Any previous schedule is cancelled
    /// first; there is never more than one pending firing.
    pub fn start(&mut self, delay: Duration) {
        self.cancel();

        // Deadline is fixed here, not when the task first polls.
        let sleep = tokio::time::sleep(delay);
        let tx = self.tx.clone();
        let event = self.event.clone();
        self.handle = Some(tokio::spawn(async move {
            sleep.await;
            let _ = tx.send(event);
        }));
    }

    /// Drop any pending schedule
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Cancel and start again
    pub fn reset(&mut self, delay: Duration) {
        self.cancel();
        self.start(delay);
    }

    /// True while a firing is pending
    pub fn is_scheduled(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}
