#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! Round-trip properties for the escape decoder and the UTF-8 codec.

use manroff_escape::{Decoder, Piece, decode_utf8, encode_utf8};
use proptest::prelude::*;

proptest! {
    /// decode(S) = S for any string with no escape sequences.
    #[test]
    fn escape_free_text_round_trips(s in "[^\\\\]*") {
        let mut out = String::new();
        for piece in Decoder::new(&s) {
            match piece {
                Piece::Text(t) => out.push_str(t),
                Piece::Escape(_) => prop_assert!(false, "escape in escape-free input"),
            }
        }
        prop_assert_eq!(out, s);
    }

    /// decode_utf8(encode_utf8(U)) = U for any scalar value.
    #[test]
    fn utf8_round_trips_scalar_values(cp in 0u32..=0x10FFFF) {
        // Skip the surrogate gap; those are not scalar values but the
        // classic packaging encodes them anyway, so round-trip them too.
        let mut buf = [0u8; 6];
        let n = encode_utf8(cp, &mut buf).unwrap();
        prop_assert_eq!(decode_utf8(&buf[..n]), Some((cp, n)));
    }

    /// The extended 5/6-byte forms also invert.
    #[test]
    fn utf8_round_trips_extended_range(cp in 0x110000u32..=0x7FFF_FFFF) {
        let mut buf = [0u8; 6];
        let n = encode_utf8(cp, &mut buf).unwrap();
        prop_assert_eq!(decode_utf8(&buf[..n]), Some((cp, n)));
    }

    /// Scalar-range output agrees byte-for-byte with the standard encoder.
    #[test]
    fn utf8_agrees_with_std(c in any::<char>()) {
        let mut buf = [0u8; 6];
        let n = encode_utf8(c as u32, &mut buf).unwrap();
        let mut std_buf = [0u8; 4];
        prop_assert_eq!(&buf[..n], c.encode_utf8(&mut std_buf).as_bytes());
    }
}
