//! Session notifications and the subscriber registry.
//!
//! Observers are told about every state change the manager commits. They get
//! shared references and cannot mutate the session. Delivery is synchronous
//! and in registration order.
use serde::Serialize;
use std::sync::mpsc;

use crate::data::EventDefinition;
use crate::economy::Stage;
use crate::state::{Ending, SessionState};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionNotification {
    StateUpdated { state: Box<SessionState> },
    SessionEnded { ending: Ending },
    StageAdvanced { stage: Stage },
    EventTriggered { event: Box<EventDefinition> },
}

impl SessionNotification {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::StateUpdated { .. } => "state_updated",
            Self::SessionEnded { .. } => "session_ended",
            Self::StageAdvanced { .. } => "stage_advanced",
            Self::EventTriggered { .. } => "event_triggered",
        }
    }
}

/// Subscriber to session changes. Override the hooks you care about, or
/// [`SessionObserver::on_notification`] to receive everything.
pub trait SessionObserver {
    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "observer"
    }

    fn on_state_updated(&self, _state: &SessionState) {}

    fn on_session_ended(&self, _ending: Ending) {}

    fn on_stage_advanced(&self, _stage: Stage) {}

    fn on_event_triggered(&self, _event: &EventDefinition) {}

    /// Dispatches to the specific hooks.
    fn on_notification(&self, notification: &SessionNotification) {
        match notification {
            SessionNotification::StateUpdated { state } => self.on_state_updated(state),
            SessionNotification::SessionEnded { ending } => self.on_session_ended(*ending),
            SessionNotification::StageAdvanced { stage } => self.on_stage_advanced(*stage),
            SessionNotification::EventTriggered { event } => self.on_event_triggered(event),
        }
    }
}

/// Forwards owned notifications over a channel. A dropped receiver is ignored.
impl SessionObserver for mpsc::Sender<SessionNotification> {
    fn name(&self) -> &str {
        "channel"
    }

    fn on_notification(&self, notification: &SessionNotification) {
        if self.send(notification.clone()).is_err() {
            log::debug!("dropping {} notification: receiver gone", notification.kind());
        }
    }
}

#[derive(Default)]
pub struct ObserverRegistry {
    observers: Vec<Box<dyn SessionObserver>>,
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.observers.iter().map(|o| o.name()))
            .finish()
    }
}

impl ObserverRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, observer: Box<dyn SessionObserver>) {
        log::info!("Registered observer: {}", observer.name());
        self.observers.push(observer);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn notify(&self, notification: &SessionNotification) {
        for observer in &self.observers {
            observer.on_notification(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FounderProfile, GameOverReason};
    use chrono::Utc;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct StageLog(Rc<RefCell<Vec<Stage>>>);

    impl SessionObserver for StageLog {
        fn on_stage_advanced(&self, stage: Stage) {
            self.0.borrow_mut().push(stage);
        }
    }

    #[test]
    fn registry_fans_out_to_every_subscriber() {
        let (tx, rx) = mpsc::channel();
        let stages = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ObserverRegistry::new();
        registry.register(Box::new(tx));
        registry.register(Box::new(StageLog(Rc::clone(&stages))));
        assert_eq!(registry.len(), 2);

        registry.notify(&SessionNotification::StageAdvanced {
            stage: Stage::PreSeed,
        });
        let state = SessionState::new(FounderProfile::default(), Utc::now());
        registry.notify(&SessionNotification::StateUpdated {
            state: Box::new(state),
        });

        let kinds: Vec<_> = rx.try_iter().map(|n| n.kind()).collect();
        assert_eq!(kinds, vec!["stage_advanced", "state_updated"]);
        assert_eq!(*stages.borrow(), vec![Stage::PreSeed]);
    }

    #[test]
    fn dropped_receiver_is_not_fatal() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let mut registry = ObserverRegistry::new();
        registry.register(Box::new(tx));
        registry.notify(&SessionNotification::SessionEnded {
            ending: Ending::GameOver {
                reason: GameOverReason::OutOfRunway,
            },
        });
    }

    #[test]
    fn notifications_serialize_with_kind_tag() {
        let json = serde_json::to_value(SessionNotification::StageAdvanced {
            stage: Stage::SeriesA,
        })
        .unwrap();
        assert_eq!(json["kind"], "stage_advanced");
        assert_eq!(json["stage"], "series_a");
    }
}
