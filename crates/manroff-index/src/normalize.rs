//! Keyword normalization: decode escapes, transcode to UTF-8.
//!
//! Strings extracted from a parsed tree still carry escape sequences and
//! the parser's in-band marker bytes. Everything entering the keyword
//! database, and every record field, passes through [`normalize`] so
//! that the on-disk form is plain UTF-8.

use manroff_escape::{
    ASCII_HYPH, ASCII_NBRSP, Decoder, EscapeClass, Piece, glyph_codepoint, predefined_string,
};

/// Decode one string to its plain UTF-8 form.
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for piece in Decoder::new(input) {
        match piece {
            Piece::Text(text) => {
                for ch in text.chars() {
                    match ch as u32 {
                        x if x == u32::from(ASCII_NBRSP) => out.push(' '),
                        x if x == u32::from(ASCII_HYPH) => out.push('-'),
                        _ if ch == '\t' => out.push(' '),
                        _ => out.push(ch),
                    }
                }
            }
            Piece::Escape(esc) => match esc {
                EscapeClass::Special(name) => {
                    if let Some(ch) = glyph_codepoint(name).and_then(char::from_u32) {
                        out.push(ch);
                    }
                }
                EscapeClass::Predefined(name) => {
                    if let Some(value) = predefined_string(name) {
                        out.push_str(value);
                    }
                }
                EscapeClass::Unicode(ch) => out.push(ch),
                EscapeClass::Numbered(cp) => {
                    if let Some(ch) = char::from_u32(cp) {
                        out.push(ch);
                    }
                }
                EscapeClass::Backslash => out.push('\\'),
                EscapeClass::Hyphen => out.push('-'),
                EscapeClass::NonBreakingSpace => out.push(' '),
                EscapeClass::NoSpace
                | EscapeClass::Break
                | EscapeClass::Font(_)
                | EscapeClass::Ignore
                | EscapeClass::Invalid => {}
            },
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_strings_pass_through() {
        assert_eq!(normalize("getline"), "getline");
    }

    #[test]
    fn glyphs_decode_to_utf8() {
        assert_eq!(normalize("a\\(emb"), "a\u{2014}b");
        assert_eq!(normalize("\\[bu] item"), "\u{2022} item");
    }

    #[test]
    fn markers_and_fonts_normalize() {
        let with_markers = format!("a{}b{}c", ASCII_NBRSP as char, ASCII_HYPH as char);
        assert_eq!(normalize(&with_markers), "a b-c");
        assert_eq!(normalize("\\fBbold\\fP rest"), "bold rest");
    }

    #[test]
    fn escaped_hyphen_becomes_plain() {
        assert_eq!(normalize("\\-\\-flag"), "--flag");
    }

    #[test]
    fn unknown_escapes_vanish() {
        assert_eq!(normalize("x\\(zzy"), "xy");
    }
}
