mod util;

use std::time::Instant;

use xcomfort_engine::{Command, Engine, EngineConfig};
use xcomfort_wire::ShutterCommand;

#[test]
fn stop_supersedes_an_unlaunched_open() {
    let mut engine = Engine::new(EngineConfig::default());
    let t0 = Instant::now();

    engine.submit(9, Command::Shutter(ShutterCommand::Open));
    engine.submit(9, Command::Shutter(ShutterCommand::Stop));

    let tx = engine.poll_transmit(t0).expect("one telegram");
    assert_eq!(util::event_code(&tx), util::JALO);
    assert_eq!(util::value(&tx), i32::from(ShutterCommand::Stop.raw()));
    assert!(engine.poll_transmit(t0).is_none());
}

#[test]
fn stop_after_an_acked_open_goes_out_in_order() {
    let mut engine = Engine::new(EngineConfig::default());
    let t0 = Instant::now();

    engine.submit(9, Command::Shutter(ShutterCommand::Open));
    let open = engine.poll_transmit(t0).expect("open telegram");
    assert_eq!(util::value(&open), i32::from(ShutterCommand::Open.raw()));

    // The press was already in flight; the stop follows its ack.
    engine.submit(9, Command::Shutter(ShutterCommand::Stop));
    engine.handle_ack(true, Some(open.message_id), t0);

    let stop = engine.poll_transmit(t0).expect("stop telegram");
    assert_eq!(util::value(&stop), i32::from(ShutterCommand::Stop.raw()));
}
