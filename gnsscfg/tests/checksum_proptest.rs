//! Property tests for the NMEA and UBX checksum paths.
//!
//! UBX frames are assembled here by hand with `byteorder`, independently of
//! [`gnsscfg::UbxFrame::new`], and fed to the validator.

use byteorder::{LittleEndian, WriteBytesExt};
use gnsscfg::{
    compile, compute_checksum, constants::{UBX_SYNC_CHAR_1, UBX_SYNC_CHAR_2}, render_hex,
    validate_ubx_frame, Error, FrameError, SentenceBody, UbxFrame,
};
use proptest::prelude::*;

/// Calculates the 8-bit Fletcher checksum used by UBX
fn calculate_checksum(data: &[u8]) -> (u8, u8) {
    let mut ck_a: u8 = 0;
    let mut ck_b: u8 = 0;
    for byte in data {
        ck_a = ck_a.wrapping_add(*byte);
        ck_b = ck_b.wrapping_add(ck_a);
    }
    (ck_a, ck_b)
}

fn build_frame(class: u8, id: u8, payload: &[u8]) -> Vec<u8> {
    let mut content = Vec::with_capacity(payload.len() + 4);
    content.write_u8(class).unwrap();
    content.write_u8(id).unwrap();
    content.write_u16::<LittleEndian>(payload.len() as u16).unwrap();
    content.extend_from_slice(payload);
    let (ck_a, ck_b) = calculate_checksum(&content);

    let mut frame = vec![UBX_SYNC_CHAR_1, UBX_SYNC_CHAR_2];
    frame.extend_from_slice(&content);
    frame.write_u8(ck_a).unwrap();
    frame.write_u8(ck_b).unwrap();
    frame
}

/// Bodies as the catalog produces them: `$`, printable fields, `*`
fn sentence_body_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[A-Z0-9.]{0,8}", 1..8)
        .prop_map(|fields| format!("${}*", fields.join(",")))
}

fn reference_checksum(body: &str) -> u8 {
    body.bytes()
        .skip(1)
        .take_while(|b| *b != b'*')
        .fold(0, |acc, b| acc ^ b)
}

proptest! {
    #[test]
    fn test_render_hex_is_two_uppercase_digits(checksum in any::<u8>()) {
        let hex = render_hex(checksum);
        prop_assert_eq!(hex.as_str().len(), 2);
        prop_assert!(hex.as_str().bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b)));
        prop_assert_eq!(u8::from_str_radix(hex.as_str(), 16).unwrap(), checksum);
    }

    #[test]
    fn test_checksum_is_xor_between_delimiters(body in sentence_body_strategy()) {
        prop_assert_eq!(compute_checksum(body.as_bytes()).unwrap(), reference_checksum(&body));
    }

    #[test]
    fn test_compiled_frame_layout(body in sentence_body_strategy()) {
        let body = SentenceBody::new(body).unwrap();
        let hex = render_hex(compute_checksum(body.as_bytes()).unwrap());
        let frame = compile(&body, hex.as_str(), "\r\n").unwrap();

        prop_assert_eq!(frame.len(), body.as_str().len() + 4);
        prop_assert!(frame.as_bytes().starts_with(body.as_bytes()));
        prop_assert!(frame.as_bytes().ends_with(b"\r\n"));
        prop_assert!(frame.verify());
    }

    #[test]
    fn test_handmade_ubx_frame_validates(
        class in any::<u8>(),
        id in any::<u8>(),
        payload in prop::collection::vec(any::<u8>(), 0..128),
    ) {
        let bytes = build_frame(class, id, &payload);
        let frame = validate_ubx_frame(&bytes).unwrap();
        prop_assert_eq!(frame.class(), class);
        prop_assert_eq!(frame.id(), id);
        prop_assert_eq!(frame.payload(), payload.as_slice());
        prop_assert_eq!(UbxFrame::new(class, id, &payload).unwrap(), frame);
    }

    #[test]
    fn test_truncated_ubx_frame_is_rejected(
        payload in prop::collection::vec(any::<u8>(), 1..64),
        cut in 1usize..8,
    ) {
        let bytes = build_frame(0x06, 0x00, &payload);
        let cut = cut.min(bytes.len() - 1);
        prop_assert!(validate_ubx_frame(&bytes[..bytes.len() - cut]).is_err());
    }

    #[test]
    fn test_corrupted_ubx_payload_is_rejected(
        payload in prop::collection::vec(any::<u8>(), 1..64),
        idx in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let mut bytes = build_frame(0x06, 0x09, &payload);
        let i = 6 + idx.index(payload.len());
        bytes[i] ^= flip;
        let rejected = matches!(
            validate_ubx_frame(&bytes),
            Err(Error::MalformedFrame(FrameError::ChecksumMismatch { .. }))
        );
        prop_assert!(rejected);
    }
}
