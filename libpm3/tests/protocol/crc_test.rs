use libpm3::protocol::{check_crc16_a, crc16_a};
use libpm3::{bytes_to_hex, parse_hex};

fn crc_a_hex(input: &str) -> String {
    bytes_to_hex(&crc16_a(&parse_hex(input).unwrap()))
}

#[test]
fn crc_a_known_vectors() {
    let cases = [
        ("0000", "A01E"),
        ("1101035354909000431770033201003B", "CCAB"),
        ("3A16070A00000000001A0000", "254E"),
        ("5000", "57CD"),
        ("7461696368756E6D696E", "5B9E"),
    ];
    for (input, expected) in cases {
        assert_eq!(crc_a_hex(input), expected, "crc16_a({})", input);
    }
}

#[test]
fn halt_frame_with_crc_checks_out() {
    // HLTA as sent on the air
    let frame = parse_hex("500057CD").unwrap();
    assert!(check_crc16_a(&frame));
    assert!(!check_crc16_a(&frame[..3]));
}
