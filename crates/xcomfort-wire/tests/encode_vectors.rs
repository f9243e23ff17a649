use xcomfort_wire::{config, dim, jalo, request, switch, ConfigType, ShutterCommand};

#[test]
fn switch_on_frame_layout() {
    let frame = switch(7, true, 3);
    assert_eq!(
        frame,
        [0x09, 0xb1, 7, 0x0a, 0x01, 0x00, 0x00, 0x00, 3 << 4]
    );
}

#[test]
fn switch_off_carries_zero_value() {
    let frame = switch(7, false, 0);
    assert_eq!(&frame[4..8], &[0, 0, 0, 0]);
    assert_eq!(frame[8], 0);
}

#[test]
fn dim_value_is_percent_shifted_over_the_tag_byte() {
    // 75% encodes as (75 << 8) | 0x40 = 0x4b40.
    let frame = dim(12, 75, 5);
    assert_eq!(frame[1], 0xb1);
    assert_eq!(frame[3], 0x0d);
    assert_eq!(&frame[4..8], &[0x40, 0x4b, 0x00, 0x00]);
    assert_eq!(frame[8], 5 << 4);
}

#[test]
fn jalo_writes_the_raw_command_byte_as_value() {
    let frame = jalo(9, ShutterCommand::Open, 1);
    assert_eq!(frame[3], 0x0e);
    assert_eq!(&frame[4..8], &[0x01, 0x00, 0x00, 0x00]);

    let frame = jalo(9, ShutterCommand::StepClose, 1);
    assert_eq!(&frame[4..8], &[0x10, 0x00, 0x00, 0x00]);
}

#[test]
fn request_frame_has_empty_value() {
    let frame = request(200, 15);
    assert_eq!(frame[0] as usize, frame.len());
    assert_eq!(frame[2], 200);
    assert_eq!(frame[3], 0x0b);
    assert_eq!(&frame[4..8], &[0, 0, 0, 0]);
    assert_eq!(frame[8], 0xf0);
}

#[test]
fn sequence_number_sits_in_the_upper_nibble_with_priority_zero() {
    for id in 0..16u8 {
        let frame = switch(1, true, id);
        assert_eq!(frame[8] >> 4, id);
        assert_eq!(frame[8] & 0x0f, 0, "priority must stay 0");
    }
}

#[test]
fn config_frame_layout() {
    assert_eq!(config(ConfigType::Release, 0), [0x04, 0xb2, 0x1b, 0x00]);
    assert_eq!(config(ConfigType::Led, 1), [0x04, 0xb2, 0x0f, 0x01]);
}
