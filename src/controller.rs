//! Alarm State Controller
//!
//! The state machine at the center of the panel. It runs as a single actor
//! draining one event queue; the bus listener, the timers and the renderer
//! only produce events onto that queue. Every mode transition and display
//! decision happens here, so no lock guards the alarm mode.

use std::sync::Arc;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::audit::AuditLog;
use crate::bus::CommandPublisher;
use crate::dispatch::{DialogCategory, DialogPayload, Dispatcher};
use crate::error::PanelResult;
use crate::events::{BusMessage, CodeCheck, ControllerEvent, StateToken, UserAction};
use crate::history::MessageStore;
use crate::state::{AlarmMode, StateStore};
use crate::timer::Timer;

/// Context carried while a disable countdown is live. Dropped when the
/// countdown is disarmed, cancelled or runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingContext {
    code: u32,
    beep: bool,
    seconds: u32,
}

pub struct Controller {
    store: StateStore,
    dispatcher: Dispatcher,
    history: MessageStore,
    audit: AuditLog,
    publisher: Arc<dyn CommandPublisher>,
    inactivity: Timer,
    pending: Option<PendingContext>,
}

impl Controller {
    pub fn new(
        store: StateStore,
        dispatcher: Dispatcher,
        history: MessageStore,
        audit: AuditLog,
        publisher: Arc<dyn CommandPublisher>,
        events: UnboundedSender<ControllerEvent>,
    ) -> Self {
        let inactivity = Timer::new(events, ControllerEvent::InactivityElapsed);
        Self {
            store,
            dispatcher,
            history,
            audit,
            publisher,
            inactivity,
            pending: None,
        }
    }

    /// Drain the event queue until shutdown, then tear the session down.
    pub async fn run(mut self, mut events: UnboundedReceiver<ControllerEvent>) {
        info!("🚨 Controller running, alarm mode {}", self.store.mode());
        self.dispatcher.note_mode(self.store.mode());
        self.inactivity.start(self.store.inactivity_time());

        while let Some(event) = events.recv().await {
            match event {
                ControllerEvent::Shutdown => break,
                event => {
                    if let Err(e) = self.handle(event).await {
                        warn!("⚠️ Event handling failed: {}", e);
                    }
                }
            }
        }

        self.teardown();
    }

    async fn handle(&mut self, event: ControllerEvent) -> PanelResult<()> {
        match event {
            ControllerEvent::Bus(message) => self.handle_bus(message)?,
            ControllerEvent::User(action) => self.handle_user(action).await?,
            ControllerEvent::InactivityElapsed => {
                debug!("💤 Inactivity timeout");
                self.sleep();
            }
            ControllerEvent::Connected => {
                self.dispatcher.hide(DialogCategory::Alert);
            }
            ControllerEvent::Disconnected(reason) => {
                warn!("⚠️ Bus connection lost: {}", reason);
                self.awaken();
                self.dispatcher.show(
                    DialogCategory::Alert,
                    Some(DialogPayload::Alert {
                        message: format!("Connection lost: {}", reason),
                    }),
                );
            }
            // The run loop intercepts Shutdown before it gets here
            ControllerEvent::Shutdown => {}
        }
        Ok(())
    }

    fn handle_bus(&mut self, message: BusMessage) -> PanelResult<()> {
        let token = match StateToken::parse(&message.payload) {
            Some(token) => token,
            None => {
                debug!(
                    "Ignoring unknown payload '{}' on {}",
                    message.payload, message.topic
                );
                return Ok(());
            }
        };
        self.history.insert(&message)?;
        self.handle_token(token)
    }

    fn handle_token(&mut self, token: StateToken) -> PanelResult<()> {
        match token {
            StateToken::Disarm => {
                self.pending = None;
                self.transition(AlarmMode::Disarmed, token.as_str())?;
                self.awaken();
                self.reset_inactivity();
                self.dispatcher.hide_triggered_view();
            }
            StateToken::ArmHome | StateToken::ArmAway => {
                let next = if token == StateToken::ArmHome {
                    AlarmMode::ArmedHome
                } else {
                    AlarmMode::ArmedAway
                };
                self.transition(next, token.as_str())?;
                // Armed remotely while the panel sleeps: light it back up
                self.touch();
                self.dispatcher.hide_dialogs();
                self.pending = None;
            }
            StateToken::Pending => {
                if self.store.mode().is_armed() {
                    self.transition(AlarmMode::TriggeredPending, token.as_str())?;
                    self.awaken();
                    let seconds = self.store.pending_time().as_secs() as u32;
                    if seconds > 0 {
                        self.show_disable_dialog(seconds);
                    }
                } else {
                    // Not armed by this panel: wake the display, nothing else
                    self.awaken();
                }
            }
            StateToken::Triggered => {
                // Never suppressed, whatever the prior mode
                self.transition(AlarmMode::Triggered, token.as_str())?;
                self.awaken();
                self.dispatcher.show_triggered_view(self.store.alarm_code());
            }
            StateToken::Error => {
                warn!("⚠️ Error reported on the state topic");
                self.dispatcher.notice("Alarm system reported an error");
            }
        }
        Ok(())
    }

    async fn handle_user(&mut self, action: UserAction) -> PanelResult<()> {
        // Every action except the countdown running out is a human touching
        // the panel
        if !matches!(action, UserAction::CountdownExpired) {
            self.touch();
        }

        match action {
            UserAction::RequestDisarm { code } => match self.check_code(code) {
                CodeCheck::Accepted => {
                    self.publisher.publish_disarmed().await?;
                    self.dispatcher.hide(DialogCategory::DisableCountdown);
                    self.pending = None;
                }
                CodeCheck::Rejected => {
                    warn!("🚫 Disarm code rejected");
                    self.dispatcher.notice("Code rejected, try again");
                }
            },
            UserAction::RequestArmHome => {
                self.publisher.publish_armed_home().await?;
                self.dispatcher.hide_dialogs();
                self.transition(AlarmMode::PendingHome, "arm_home_request")?;
            }
            UserAction::RequestArmAway => {
                self.publisher.publish_armed_away().await?;
                self.dispatcher.hide_dialogs();
                self.transition(AlarmMode::PendingAway, "arm_away_request")?;
            }
            UserAction::RequestArmDialog => {
                self.dispatcher.show(DialogCategory::ArmOptions, None);
            }
            UserAction::RequestSettings => {
                if self.store.first_time() {
                    self.store.clear_first_time()?;
                    self.dispatcher.open_settings();
                } else {
                    self.dispatcher.show(DialogCategory::SettingsCode, None);
                }
            }
            UserAction::SubmitSettingsCode { code } => match self.check_code(code) {
                CodeCheck::Accepted => {
                    self.dispatcher.hide(DialogCategory::SettingsCode);
                    self.dispatcher.open_settings();
                }
                CodeCheck::Rejected => {
                    self.dispatcher.notice("Code rejected, try again");
                }
            },
            UserAction::RequestSleep => self.sleep(),
            UserAction::CountdownExpired | UserAction::CountdownCancelled => {
                self.dispatcher.hide(DialogCategory::DisableCountdown);
                self.pending = None;
            }
            UserAction::AcknowledgeAlert => {
                self.dispatcher.hide(DialogCategory::Alert);
                // Recorded against the state topic for the history audit
                self.history.insert(&BusMessage {
                    topic: self.store.state_topic().to_string(),
                    payload: StateToken::Error.as_str().to_string(),
                    message_id: "0".to_string(),
                })?;
            }
        }
        Ok(())
    }

    fn show_disable_dialog(&mut self, seconds: u32) {
        let context = PendingContext {
            code: self.store.alarm_code(),
            beep: true,
            seconds,
        };
        let shown = self.dispatcher.show(
            DialogCategory::DisableCountdown,
            Some(DialogPayload::Disable {
                code: context.code,
                beep: context.beep,
                seconds: context.seconds,
            }),
        );
        if shown {
            self.pending = Some(context);
        }
    }

    /// Set, persist and report a mode change. A no-op when the mode already
    /// matches.
    fn transition(&mut self, next: AlarmMode, event: &str) -> PanelResult<()> {
        let previous = self.store.mode();
        if previous == next {
            return Ok(());
        }
        self.store.set_mode(next)?;
        self.dispatcher.note_mode(next);
        if let Err(e) = self.audit.log_transition(previous, event, next) {
            warn!("⚠️ Audit write failed: {}", e);
        }
        Ok(())
    }

    /// Exact integer comparison, no lockout or attempt limit
    fn check_code(&self, entered: u32) -> CodeCheck {
        if entered == self.store.alarm_code() {
            CodeCheck::Accepted
        } else {
            CodeCheck::Rejected
        }
    }

    /// Stop the inactivity countdown and close any screensaver
    fn awaken(&mut self) {
        self.inactivity.cancel();
        self.dispatcher.hide(DialogCategory::Screensaver);
    }

    fn reset_inactivity(&mut self) {
        self.inactivity.reset(self.store.inactivity_time());
    }

    /// Wake the display and push the screensaver deadline back
    fn touch(&mut self) {
        self.dispatcher.hide(DialogCategory::Screensaver);
        self.reset_inactivity();
    }

    fn sleep(&mut self) {
        // Never sleep through an active alarm
        if self.store.mode().is_triggered_mode() {
            return;
        }
        self.dispatcher.hide_dialogs();
        if self.dispatcher.show(DialogCategory::Screensaver, None) {
            self.inactivity.cancel();
        }
    }

    /// Unconditional session teardown
    fn teardown(&mut self) {
        info!("Controller stopping");
        self.inactivity.cancel();
        self.pending = None;
        self.dispatcher.hide_all();
    }
}
