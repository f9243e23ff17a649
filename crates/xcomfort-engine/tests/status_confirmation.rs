mod util;

use std::time::{Duration, Instant};

use xcomfort_engine::{
    Command, Engine, EngineConfig, MAX_STATUS_REQUESTS, STATUS_WAIT,
};

#[test]
fn acked_write_is_followed_by_a_status_request_after_the_grace_period() {
    let mut engine = Engine::new(EngineConfig::default());
    let t0 = Instant::now();

    engine.submit(12, Command::Dim(75));
    let write = engine.poll_transmit(t0).expect("dim telegram");
    assert_eq!(util::value(&write), 0x4b40);

    engine.handle_ack(true, Some(write.message_id), t0);

    // The datapoint gets a moment to report on its own.
    assert_eq!(engine.next_wakeup(t0), Some(STATUS_WAIT));
    assert!(engine.poll_transmit(t0 + STATUS_WAIT / 2).is_none());

    let req = engine.poll_transmit(t0 + STATUS_WAIT).expect("status request");
    assert_eq!(req.datapoint, 12);
    assert_eq!(util::event_code(&req), util::REQUEST);
}

#[test]
fn received_status_completes_the_entry() {
    let mut engine = Engine::new(EngineConfig::default());
    let t0 = Instant::now();

    engine.submit(12, Command::Dim(75));
    let write = engine.poll_transmit(t0).expect("dim telegram");
    engine.handle_ack(true, Some(write.message_id), t0);

    let t1 = t0 + STATUS_WAIT;
    let req = engine.poll_transmit(t1).expect("status request");

    // MSG_STATUS arrives while the request is still in flight.
    engine.confirm_status(12);
    engine.handle_ack(true, Some(req.message_id), t1);

    // Next scheduling visit drops the entry; no further telegrams.
    let t2 = t1 + STATUS_WAIT;
    assert!(engine.poll_transmit(t2).is_none());
    assert_eq!(engine.queued_datapoints().count(), 0);
}

#[test]
fn status_for_a_foreign_datapoint_does_not_touch_the_entry() {
    let mut engine = Engine::new(EngineConfig::default());
    let t0 = Instant::now();

    engine.submit(12, Command::Dim(75));
    let write = engine.poll_transmit(t0).expect("dim telegram");
    engine.handle_ack(true, Some(write.message_id), t0);

    engine.confirm_status(13);

    let req = engine.poll_transmit(t0 + STATUS_WAIT);
    assert!(req.is_some(), "unrelated status must not cancel confirmation");
}

#[test]
fn confirmation_gives_up_after_three_unanswered_requests() {
    let mut engine = Engine::new(EngineConfig::default());
    let mut now = Instant::now();

    engine.submit(5, Command::Switch(true));
    let write = engine.poll_transmit(now).expect("switch telegram");
    engine.handle_ack(true, Some(write.message_id), now);

    let mut requests = 0;
    for _ in 0..MAX_STATUS_REQUESTS {
        now += STATUS_WAIT;
        let req = engine.poll_transmit(now).expect("status request");
        assert_eq!(util::event_code(&req), util::REQUEST);
        requests += 1;
        engine.handle_ack(true, Some(req.message_id), now);
    }
    assert_eq!(requests, MAX_STATUS_REQUESTS as u32);

    // The budget is exhausted; after the last grace period the entry is
    // abandoned without any notification.
    now += STATUS_WAIT;
    assert!(engine.poll_transmit(now).is_none());
    assert_eq!(engine.queued_datapoints().count(), 0);

    // And it stays gone.
    now += Duration::from_secs(60);
    assert!(engine.poll_transmit(now).is_none());
}

#[test]
fn new_intent_during_confirmation_restarts_the_cycle() {
    let mut engine = Engine::new(EngineConfig::default());
    let t0 = Instant::now();

    engine.submit(5, Command::Switch(true));
    let write = engine.poll_transmit(t0).expect("switch telegram");
    engine.handle_ack(true, Some(write.message_id), t0);

    // A fresh value arrives while we were waiting for the status report.
    // The grace period keeps running, but what goes out afterwards is the
    // new write, not a status request.
    engine.submit(5, Command::Switch(false));
    assert!(engine.poll_transmit(t0).is_none());

    let next = engine
        .poll_transmit(t0 + STATUS_WAIT)
        .expect("the new value goes out");
    assert_eq!(util::event_code(&next), util::SWITCH);
    assert_eq!(util::value(&next), 0);
}
