use std::sync::Arc;
use std::time::{Duration, Instant};

use quizbox::control::{ControllerConfig, QuizController};
use quizbox::link::{ChannelListener, ConnectionSession, DeviceEndpoint, MemoryTransport, SessionConfig};
use quizbox::protocol::{Button, Message};
use quizbox::registry::{AddressRegistry, RosterEntry};
use quizbox::scoring::{QuestionType, ScoreEngine, ScoringConfig, SpeedResult};
use quizbox::BoxAddress;
use tokio::sync::mpsc::UnboundedReceiver;

const RED: [u8; 3] = [0x11, 0x22, 0x01];
const BLUE: [u8; 3] = [0x11, 0x22, 0x02];

/// Build a `#` button line body for a box.
fn button_line(address: [u8; 3], code: &[u8; 2], lq: u8) -> Vec<u8> {
    let mut line = vec![b'#'];
    line.extend_from_slice(&address);
    line.extend_from_slice(code);
    line.push(lq);
    line
}

/// Open a session over an in-memory device and wire a controller to it
async fn setup(
    scoring: ScoringConfig,
) -> (
    ConnectionSession,
    DeviceEndpoint,
    QuizController,
    UnboundedReceiver<Message>,
) {
    let (transport, device) = MemoryTransport::pair();
    device.send_line(b"^4.1:base-station");

    let config = SessionConfig::builder()
        .handshake_timeout(Duration::from_secs(2))
        .idle_poll(Duration::from_millis(5))
        .build()
        .unwrap();
    let mut session = ConnectionSession::new(config);
    let (listener, events) = ChannelListener::new();
    session.add_listener(Arc::new(listener));
    session.open(transport).await.unwrap();
    assert_eq!(
        session.connection_message(),
        "Connected: 4.1 [base-station]"
    );
    assert_eq!(device.take_commands(), vec![b"v".to_vec()]);

    let mut registry = AddressRegistry::new();
    let roster = vec![
        RosterEntry::new("red_112201", 1, "Red"),
        RosterEntry::new("blue_112202", 2, "Blue"),
    ];
    registry.load_roster(&roster).unwrap();

    let mut controller = QuizController::new(
        ControllerConfig::default(),
        registry,
        ScoreEngine::new(scoring),
    );
    controller.attach(session.request_sender().unwrap());
    (session, device, controller, events)
}

/// Wait for `count` events and apply them in order
async fn apply_events(
    controller: &mut QuizController,
    events: &mut UnboundedReceiver<Message>,
    count: usize,
) {
    for _ in 0..count {
        let message = tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .expect("event should arrive")
            .expect("channel open");
        controller.handle_message(&message, Instant::now());
    }
}

#[tokio::test]
async fn test_multiple_choice_round_over_link() {
    let (mut session, device, mut controller, mut events) = setup(ScoringConfig::default()).await;

    // the version reply was consumed by the listener too
    apply_events(&mut controller, &mut events, 1).await;

    controller
        .engine_mut()
        .set_question_type_with_points(QuestionType::MultipleChoice, 10, 0);
    controller.engine_mut().set_answer(Button::B);
    controller.set_locked(false, true);

    device.send_line(&button_line(RED, b"29", 150));
    device.send_line(&button_line(BLUE, b"30", 120));
    apply_events(&mut controller, &mut events, 2).await;

    let red = BoxAddress::from_binary(&RED);
    let blue = BoxAddress::from_binary(&BLUE);
    assert_eq!(controller.registry().button_label(&red), "B");
    assert_eq!(controller.registry().box_state(&blue).unwrap().placing(), 2);
    assert_eq!(controller.registry().link_quality(&red), 150);

    controller.set_locked(true, false);
    let results = controller.record_results();
    assert_eq!(results.teams[0].total, 10.0);
    assert_eq!(results.teams[1].total, 0.0);
    assert_eq!(results.teams[0].standing, 1);
    assert_eq!(results.teams[1].standing, 2);
    assert_eq!(
        results.result_lines()[0],
        "RESULTS, 0, 1, 0x112201, Red, 0, B, 1, 10.00, 0.00, 10.00, 0.00, 10.00, 1"
    );

    let json = serde_json::to_value(&results).unwrap();
    assert_eq!(json["teams"][1]["name"], "Blue");
    assert_eq!(json["points"], 10);

    assert_eq!(
        device.take_commands(),
        vec![b"C".to_vec(), b"R".to_vec(), b"L".to_vec()]
    );
    session.close().await;
}

#[tokio::test]
async fn test_speed_round_over_link() {
    let scoring = ScoringConfig::builder()
        .speed_correct(vec![1.0, 0.5])
        .speed_incorrect(vec![-0.5, -0.5])
        .quiz_out_count(1)
        .quiz_out_bonus_points(10)
        .starting_question_number(5)
        .build()
        .unwrap();
    let (mut session, device, mut controller, mut events) = setup(scoring).await;
    apply_events(&mut controller, &mut events, 1).await;

    controller
        .engine_mut()
        .set_question_type_with_points(QuestionType::Speed, 0, 20);

    // blue buzzes first
    device.send_line(&button_line(BLUE, b"28", 200));
    device.send_line(&button_line(RED, b"28", 200));
    apply_events(&mut controller, &mut events, 2).await;

    let red = BoxAddress::from_binary(&RED);
    let blue = BoxAddress::from_binary(&BLUE);
    controller
        .mark_speed_result(&blue, SpeedResult::Incorrect)
        .unwrap();
    controller
        .mark_speed_result(&red, SpeedResult::Correct)
        .unwrap();
    assert!(controller.engine().is_quiz_out(controller.registry(), &red, 1));

    let results = controller.record_results();
    assert_eq!(results.question_number, 5);
    let red_row = &results.teams[0];
    assert_eq!(red_row.placing, 2);
    assert_eq!(red_row.normal_points, 10.0);
    assert_eq!(red_row.bonus_points, 10.0);
    assert_eq!(red_row.total, 20.0);
    assert_eq!(red_row.correct_speed_count, 1);
    let blue_row = &results.teams[1];
    assert_eq!(blue_row.total, -10.0);
    assert_eq!(blue_row.standing, 2);

    controller.next_question();
    assert_eq!(controller.engine().question_number(), 6);
    assert_eq!(controller.registry().place_count(), 0);
    assert_eq!(controller.engine().question_type(), QuestionType::None);
    session.close().await;
}

#[tokio::test]
async fn test_noise_and_unknown_boxes_are_ignored() {
    let (mut session, device, mut controller, mut events) = setup(ScoringConfig::default()).await;
    apply_events(&mut controller, &mut events, 1).await;

    device.inject(b"garbage)");
    device.send_line(&button_line([0x33, 0x33, 0x33], b"30", 90));
    device.send_line(b"!D");
    apply_events(&mut controller, &mut events, 2).await;

    assert_eq!(controller.registry().box_count(), 2);
    assert_eq!(controller.registry().place_count(), 0);
    assert!(session.is_connected());
    session.close().await;
}
