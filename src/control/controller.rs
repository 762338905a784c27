//! Quiz control actor.

use std::time::Instant;

use tokio::sync::mpsc;

use crate::core::{BoxAddress, ScoreError};
use crate::link::RequestSender;
use crate::protocol::{ButtonEvent, Message, Request};
use crate::registry::AddressRegistry;
use crate::scoring::{QuestionType, RoundResults, ScoreEngine, SpeedResult};

use super::config::ControllerConfig;

/// Owns the registry and the scoring engine for one quiz session.
///
/// Not shared between tasks: run it on one task and feed it decoded
/// messages from a [`ChannelListener`](crate::link::ChannelListener).
#[derive(Debug)]
pub struct QuizController {
    config: ControllerConfig,
    registry: AddressRegistry,
    engine: ScoreEngine,
    sender: Option<RequestSender>,
    locked: bool,
    scheduled_reset: bool,
}

impl QuizController {
    /// Create a controller with no link attached.
    pub fn new(config: ControllerConfig, registry: AddressRegistry, engine: ScoreEngine) -> Self {
        Self {
            config,
            registry,
            engine,
            sender: None,
            locked: false,
            scheduled_reset: false,
        }
    }

    /// Route commands through `sender`.
    pub fn attach(&mut self, sender: RequestSender) {
        self.sender = Some(sender);
    }

    /// Stop sending commands.
    pub fn detach(&mut self) -> Option<RequestSender> {
        self.sender.take()
    }

    /// Controller configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Box and team registry.
    pub fn registry(&self) -> &AddressRegistry {
        &self.registry
    }

    /// Mutable registry.
    pub fn registry_mut(&mut self) -> &mut AddressRegistry {
        &mut self.registry
    }

    /// Scoring engine.
    pub fn engine(&self) -> &ScoreEngine {
        &self.engine
    }

    /// Mutable scoring engine.
    pub fn engine_mut(&mut self) -> &mut ScoreEngine {
        &mut self.engine
    }

    /// True while boxes are locked out.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    // =========================================================================
    // Inbound
    // =========================================================================

    /// Apply one decoded message.
    ///
    /// Returns the address of the box whose state changed, if any. Button
    /// input is ignored while locked; liveness and link quality are always
    /// recorded.
    pub fn handle_message(&mut self, message: &Message, now: Instant) -> Option<BoxAddress> {
        match message {
            Message::ButtonSelect(event) | Message::ButtonStatus(event) => {
                self.apply_button(event, now)
            }
            Message::LinkStatus {
                address,
                link_quality,
                second_link_quality,
                ..
            } => {
                let Some(state) = self.registry.box_state_mut(address) else {
                    tracing::warn!(address = %address, "link status from unknown box");
                    return None;
                };
                state.touch(now);
                match (*link_quality, *second_link_quality) {
                    (Some(first), Some(second)) => state.record_link_quality_pair(first, second),
                    (Some(first), None) => state.record_link_quality(first),
                    _ => {}
                }
                Some(address.clone())
            }
            Message::Version { version, info } => {
                tracing::info!(%version, %info, "base station version");
                None
            }
            Message::Mode { mode, link_quality } => {
                tracing::debug!(%mode, ?link_quality, "base station mode");
                None
            }
            Message::Info { info_type, payload } => {
                tracing::info!(%info_type, %payload, "base station info");
                None
            }
            Message::None | Message::Request(_) => None,
        }
    }

    fn apply_button(&mut self, event: &ButtonEvent, now: Instant) -> Option<BoxAddress> {
        let address = &event.address;
        if !address.is_valid() {
            return None;
        }
        let Some(state) = self.registry.box_state_mut(address) else {
            tracing::warn!(address = %address, "button message from unknown box");
            return None;
        };

        state.touch(now);
        if let Some(lq) = event.link_quality {
            state.record_link_quality(lq);
        }
        if self.locked {
            return Some(address.clone());
        }

        state.set_button(event.button);
        let placing = self.registry.update_place(address);
        tracing::debug!(
            address = %address,
            button = event.button.label(),
            placing,
            "button press"
        );

        if self.engine.question_type() == QuestionType::MultipleChoice {
            if let Err(err) =
                self.engine
                    .update_current_points(&mut self.registry, address, SpeedResult::None)
            {
                tracing::debug!(address = %address, error = %err, "box has no team, not scored");
            }
        }
        Some(address.clone())
    }

    /// Apply every message waiting on `rx`. Returns how many were applied.
    pub fn drain(&mut self, rx: &mut mpsc::UnboundedReceiver<Message>, now: Instant) -> usize {
        let mut applied = 0;
        while let Ok(message) = rx.try_recv() {
            self.handle_message(&message, now);
            applied += 1;
        }
        applied
    }

    // =========================================================================
    // Operator actions
    // =========================================================================

    fn send(&self, request: Request) {
        match &self.sender {
            Some(sender) => {
                sender.send_checked(&request);
            }
            None => tracing::debug!(request = %request, "no link attached, command skipped"),
        }
    }

    /// Lock or unlock the boxes, optionally clearing their displays.
    ///
    /// Returns the previous lock state.
    pub fn set_locked(&mut self, locked: bool, clear: bool) -> bool {
        let previous = self.locked;
        self.locked = locked;
        if locked {
            self.send(if clear {
                Request::lock_clear()
            } else {
                Request::lock()
            });
        } else {
            if clear {
                self.send(Request::clear());
            }
            self.send(Request::ready());
        }
        if previous != locked {
            tracing::debug!(locked, "lock state changed");
        }
        previous
    }

    /// Record the operator's judgement of a speed answer.
    pub fn mark_speed_result(
        &mut self,
        address: &BoxAddress,
        result: SpeedResult,
    ) -> Result<(), ScoreError> {
        self.engine
            .update_current_points(&mut self.registry, address, result)
    }

    /// Run a reset on the next [`refresh`](Self::refresh).
    pub fn schedule_reset(&mut self) {
        self.scheduled_reset = true;
        tracing::debug!("reset scheduled");
    }

    /// Take the scheduled-reset flag, clearing it.
    pub fn take_reset(&mut self) -> bool {
        std::mem::take(&mut self.scheduled_reset)
    }

    /// Clear the current round on the boxes and in the engine.
    ///
    /// Boxes are locked while results are cleared and unlocked again only if
    /// they were unlocked before.
    pub fn reset(&mut self) {
        self.with_boxes_locked(|this| this.engine.reset_results(&mut this.registry));
    }

    /// Move to the next question with a full round reset.
    pub fn next_question(&mut self) {
        self.with_boxes_locked(|this| this.engine.next_question_number(&mut this.registry));
    }

    fn with_boxes_locked(&mut self, f: impl FnOnce(&mut Self)) {
        let was_locked = self.set_locked(true, true);
        f(self);
        if !was_locked {
            self.set_locked(false, true);
        } else {
            self.send(Request::clear());
        }
    }

    /// Periodic tick: run any scheduled reset, then refresh every box's
    /// connection status with placing highlights.
    pub fn refresh(&mut self, now: Instant) {
        if self.take_reset() {
            if self.config.advance_on_clear {
                self.engine.advance_question_number();
            }
            self.reset();
        }
        self.registry
            .update_connection_status(now, self.config.connection_timeout);
    }

    /// Bank the round and return its record.
    pub fn record_results(&mut self) -> RoundResults {
        self.engine.record_results(&mut self.registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::link::{ConnectionSession, MemoryTransport, SessionConfig};
    use crate::protocol::Button;
    use crate::registry::{ConnectionStatus, RosterEntry};
    use crate::scoring::ScoringConfig;

    fn addr(n: u8) -> BoxAddress {
        BoxAddress::from_binary(&[0x10, 0x20, n])
    }

    fn controller() -> QuizController {
        let mut registry = AddressRegistry::new();
        let roster = vec![
            RosterEntry::new("a_102001", 1, "Alpha"),
            RosterEntry::new("b_102002", 2, "Bravo"),
        ];
        registry.load_roster(&roster).unwrap();
        let config = ScoringConfig::builder()
            .speed_correct(vec![1.0, 0.5])
            .speed_incorrect(vec![-0.5])
            .build()
            .unwrap();
        QuizController::new(ControllerConfig::default(), registry, ScoreEngine::new(config))
    }

    fn press(n: u8, button: Button) -> Message {
        let raw = match button {
            Button::A => 30,
            Button::B => 29,
            Button::C => 28,
            Button::None => 0,
        };
        Message::ButtonSelect(ButtonEvent {
            address: addr(n),
            raw_button: raw,
            button,
            link_quality: Some(180),
        })
    }

    #[test]
    fn test_button_press_places_and_records_lq() {
        let mut ctl = controller();
        let now = Instant::now();
        assert_eq!(ctl.handle_message(&press(2, Button::C), now), Some(addr(2)));
        ctl.handle_message(&press(1, Button::A), now);

        let state = ctl.registry().box_state(&addr(2)).unwrap();
        assert_eq!(state.button(), Button::C);
        assert_eq!(state.placing(), 1);
        assert_eq!(state.link_quality(), 180);
        assert_eq!(ctl.registry().box_state(&addr(1)).unwrap().placing(), 2);
    }

    #[test]
    fn test_locked_ignores_buttons_but_keeps_liveness() {
        let mut ctl = controller();
        ctl.set_locked(true, false);
        let now = Instant::now();
        ctl.handle_message(&press(1, Button::B), now);

        let state = ctl.registry().box_state(&addr(1)).unwrap();
        assert_eq!(state.button(), Button::None);
        assert_eq!(state.placing(), 0);
        assert_eq!(state.last_seen(), Some(now));
    }

    #[test]
    fn test_unknown_box_ignored() {
        let mut ctl = controller();
        assert_eq!(ctl.handle_message(&press(9, Button::A), Instant::now()), None);
        assert!(ctl.registry().box_state(&addr(9)).is_none());
    }

    #[test]
    fn test_multiple_choice_scored_on_press() {
        let mut ctl = controller();
        ctl.engine_mut()
            .set_question_type_with_points(QuestionType::MultipleChoice, 10, 0);
        ctl.engine_mut().set_answer(Button::B);
        let now = Instant::now();
        ctl.handle_message(&press(1, Button::B), now);
        ctl.handle_message(&press(2, Button::A), now);

        let results = ctl.record_results();
        assert_eq!(results.teams[0].total, 10.0);
        assert_eq!(results.teams[1].total, 0.0);
        assert_eq!(results.teams[0].standing, 1);
        assert_eq!(results.teams[1].standing, 2);
    }

    #[test]
    fn test_multiple_choice_press_from_box_without_team() {
        let mut ctl = controller();
        ctl.registry_mut().get_or_create(&addr(5), 5);
        ctl.engine_mut()
            .set_question_type_with_points(QuestionType::MultipleChoice, 10, 0);
        ctl.engine_mut().set_answer(Button::A);

        assert_eq!(ctl.handle_message(&press(5, Button::A), Instant::now()), Some(addr(5)));
        assert_eq!(ctl.registry().box_state(&addr(5)).unwrap().placing(), 1);
        assert!(ctl.registry().team(&addr(5)).is_none());
    }

    #[test]
    fn test_speed_judgement() {
        let mut ctl = controller();
        ctl.engine_mut()
            .set_question_type_with_points(QuestionType::Speed, 0, 20);
        let now = Instant::now();
        ctl.handle_message(&press(2, Button::A), now);
        ctl.handle_message(&press(1, Button::A), now);

        ctl.mark_speed_result(&addr(2), SpeedResult::Incorrect).unwrap();
        ctl.mark_speed_result(&addr(1), SpeedResult::Correct).unwrap();
        let bravo = ctl.registry().team(&addr(2)).unwrap();
        assert_eq!(bravo.normal_fraction(), -0.5);
        let alpha = ctl.registry().team(&addr(1)).unwrap();
        assert_eq!(alpha.normal_fraction(), 0.5);

        let err = ctl
            .mark_speed_result(&addr(7), SpeedResult::Correct)
            .unwrap_err();
        assert!(matches!(err, ScoreError::Registry(_)));
    }

    #[test]
    fn test_refresh_highlights_and_times_out() {
        let mut ctl = controller();
        let t0 = Instant::now();
        ctl.handle_message(&press(1, Button::A), t0);

        ctl.refresh(t0 + Duration::from_millis(10));
        let status = ctl.registry().connect_status(&addr(1));
        assert!(status.contains(ConnectionStatus::SELECTED_1ST));
        assert_eq!(
            ctl.registry().connect_status(&addr(2)),
            ConnectionStatus::NOT_CONNECTED
        );

        ctl.refresh(t0 + Duration::from_secs(10));
        assert_eq!(
            ctl.registry().connect_status(&addr(1)),
            ConnectionStatus::NOT_CONNECTED
        );
    }

    #[test]
    fn test_scheduled_reset_with_advance() {
        let mut ctl = QuizController::new(
            ControllerConfig::builder()
                .advance_on_clear(true)
                .build()
                .unwrap(),
            controller().registry,
            ScoreEngine::new(ScoringConfig::default()),
        );
        let start = ctl.engine().question_number();
        ctl.handle_message(&press(1, Button::C), Instant::now());

        ctl.schedule_reset();
        ctl.refresh(Instant::now());
        assert!(!ctl.take_reset());
        assert_eq!(ctl.engine().question_number(), start + 1);
        assert_eq!(ctl.registry().place_count(), 0);
        assert_eq!(
            ctl.registry().box_state(&addr(1)).unwrap().button(),
            Button::None
        );
        assert!(!ctl.is_locked());
    }

    #[tokio::test]
    async fn test_lock_commands_sent_through_link() {
        let (transport, device) = MemoryTransport::pair();
        let mut session =
            ConnectionSession::new(SessionConfig::builder().handshake(false).build().unwrap());
        session.open(transport).await.unwrap();

        let mut ctl = controller();
        ctl.attach(session.request_sender().unwrap());

        assert!(!ctl.set_locked(true, true));
        assert!(ctl.set_locked(false, false));
        ctl.reset();
        assert_eq!(
            device.take_commands(),
            vec![
                b"l".to_vec(),
                b"R".to_vec(),
                b"l".to_vec(),
                b"C".to_vec(),
                b"R".to_vec(),
            ]
        );

        ctl.set_locked(true, false);
        ctl.next_question();
        assert!(ctl.is_locked());
        assert_eq!(
            device.take_commands(),
            vec![b"L".to_vec(), b"l".to_vec(), b"C".to_vec()]
        );
        session.close().await;
    }
}
