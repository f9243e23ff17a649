mod util;

use std::time::Duration;
use std::time::Instant;

use xcomfort_engine::{Command, Engine, EngineConfig, MESSAGE_LOST_TIMEOUT};

#[test]
fn lost_telegram_is_retried_with_a_fresh_id_and_the_same_value() {
    let mut engine = Engine::new(EngineConfig::default());
    let t0 = Instant::now();

    engine.submit(3, Command::Dim(30));
    let first = engine.poll_transmit(t0).expect("first attempt");
    assert_eq!(util::value(&first), (30 << 8) | 0x40);
    assert_eq!(engine.messages_in_transit(), 1);

    // Just short of the deadline nothing happens.
    let almost = t0 + MESSAGE_LOST_TIMEOUT - Duration::from_millis(1);
    assert!(engine.poll_transmit(almost).is_none());

    // At the deadline the telegram counts as lost and is repeated.
    let t1 = t0 + MESSAGE_LOST_TIMEOUT;
    let second = engine.poll_transmit(t1).expect("retry");
    assert_ne!(second.message_id, first.message_id);
    assert_eq!(util::value(&second), util::value(&first));
    assert_eq!(
        engine.messages_in_transit(),
        1,
        "a retry reuses its window slot"
    );

    // And again, if the RF link stays dead.
    let t2 = t1 + MESSAGE_LOST_TIMEOUT;
    let third = engine.poll_transmit(t2).expect("second retry");
    assert_ne!(third.message_id, second.message_id);
    assert_eq!(engine.messages_in_transit(), 1);
}

#[test]
fn retry_carries_a_value_updated_while_waiting() {
    let mut engine = Engine::new(EngineConfig::default());
    let t0 = Instant::now();

    engine.submit(6, Command::Dim(10));
    let first = engine.poll_transmit(t0).expect("first attempt");

    engine.submit(6, Command::Dim(90));

    let t1 = t0 + MESSAGE_LOST_TIMEOUT;
    let retry = engine.poll_transmit(t1).expect("retry");
    assert_eq!(util::value(&retry), (90 << 8) | 0x40);
    assert_ne!(retry.message_id, first.message_id);
}

#[test]
fn late_ack_for_a_superseded_id_is_tolerated() {
    let mut engine = Engine::new(EngineConfig::default());
    let t0 = Instant::now();

    engine.submit(2, Command::Switch(true));
    let first = engine.poll_transmit(t0).expect("first attempt");

    let t1 = t0 + MESSAGE_LOST_TIMEOUT;
    let retry = engine.poll_transmit(t1).expect("retry");

    // The ack for the first attempt finally crawls in. Its id matches no
    // active entry any more; the retry's ack is the one that counts.
    engine.handle_ack(true, Some(first.message_id), t1);
    engine.handle_ack(true, Some(retry.message_id), t1);
    assert_eq!(engine.messages_in_transit(), 0);
}
