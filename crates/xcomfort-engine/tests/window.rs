mod util;

use std::time::Instant;

use xcomfort_engine::{
    Command, Engine, EngineConfig, MessageIdAllocator, MESSAGE_ID_MODULUS,
};

#[test]
fn default_window_keeps_a_single_telegram_in_flight() {
    let mut engine = Engine::new(EngineConfig::default());
    let t0 = Instant::now();

    engine.submit(1, Command::Switch(true));
    engine.submit(2, Command::Switch(true));

    let first = engine.poll_transmit(t0).expect("first datapoint");
    assert!(engine.poll_transmit(t0).is_none(), "window of one is full");
    assert_eq!(engine.messages_in_transit(), 1);

    engine.handle_ack(true, Some(first.message_id), t0);
    let second = engine.poll_transmit(t0).expect("second datapoint");
    assert_ne!(second.datapoint, first.datapoint);
}

#[test]
fn wider_window_allows_parallel_datapoints_up_to_the_bound() {
    let mut engine = Engine::new(EngineConfig { parallel_window: 4 });
    let t0 = Instant::now();

    for dp in 1..=5 {
        engine.submit(dp, Command::Switch(true));
    }

    let mut sent = Vec::new();
    while let Some(tx) = engine.poll_transmit(t0) {
        sent.push(tx);
    }
    assert_eq!(sent.len(), 4);
    assert_eq!(engine.messages_in_transit(), 4);

    // Freeing one slot admits the fifth datapoint.
    engine.handle_ack(true, Some(sent[0].message_id), t0);
    let fifth = engine.poll_transmit(t0).expect("fifth datapoint");
    assert_eq!(fifth.datapoint, 5);
}

#[test]
fn window_is_clamped_to_half_the_id_space() {
    let mut engine = Engine::new(EngineConfig {
        parallel_window: u8::MAX,
    });
    let t0 = Instant::now();

    for dp in 0..16 {
        engine.submit(dp, Command::Switch(true));
    }

    let mut sent = 0;
    while engine.poll_transmit(t0).is_some() {
        sent += 1;
    }
    assert_eq!(sent, usize::from(MESSAGE_ID_MODULUS / 2));
}

#[test]
fn message_ids_rotate_through_the_modulus() {
    let mut ids = MessageIdAllocator::default();
    for i in 0..40u16 {
        assert_eq!(u16::from(ids.allocate()), i % u16::from(MESSAGE_ID_MODULUS));
    }
}

#[test]
fn consecutive_transmissions_use_consecutive_ids() {
    let mut engine = Engine::new(EngineConfig { parallel_window: 8 });
    let t0 = Instant::now();

    for dp in 0..8 {
        engine.submit(dp, Command::Dim(i32::from(dp)));
    }

    let mut last: Option<u8> = None;
    while let Some(tx) = engine.poll_transmit(t0) {
        if let Some(prev) = last {
            assert_eq!(tx.message_id, (prev + 1) % MESSAGE_ID_MODULUS);
        }
        last = Some(tx.message_id);
    }
}
