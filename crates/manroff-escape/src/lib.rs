//! Escape-sequence and character tables for manual-page source.
//!
//! Manual pages written in the roff-family macro languages carry escape
//! sequences (`\(em`, `\[bullet]`, `\*q`, `\fB`, …) that stand for
//! glyphs, string substitutions, font changes, and typographic hints.
//! This crate is the pure, allocation-free front line that every other
//! stage builds on:
//!
//! - [`escape`] classifies a single sequence positioned just after its
//!   backslash; [`Decoder`] iterates a whole line as alternating text
//!   runs and classified escapes.
//! - [`glyph_codepoint`] resolves predefined glyph names to Unicode code
//!   points; [`predefined_string`] resolves the `\*` preprocessor
//!   substitution table.
//! - [`encode_utf8`]/[`decode_utf8`] speak the classic 1–6-byte UTF-8
//!   packaging used by the on-disk keyword database.
//!
//! # In-band markers
//!
//! Two typographic classes survive parsing as single in-band bytes so
//! that word-splitting stages need no side channel: [`ASCII_NBRSP`]
//! (non-breaking space) and [`ASCII_HYPH`] (breakable hyphen). Consumers
//! normalize them back to ` ` and `-` at output time.
//!
//! # Example
//!
//! ```
//! use manroff_escape::{escape, glyph_codepoint, EscapeClass};
//!
//! let (class, len) = escape("(embody");
//! assert_eq!(class, EscapeClass::Special("em"));
//! assert_eq!(len, 3);
//! assert_eq!(glyph_codepoint("em"), Some(0x2014));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

mod decode;
mod glyphs;
mod utf8;

pub use decode::{Decoder, EscapeClass, FontEscape, Piece, escape};
pub use glyphs::{glyph_codepoint, predefined_string};
pub use utf8::{MAX_CODEPOINT, decode_utf8, encode_utf8};

/// In-band byte standing for a non-breaking space.
pub const ASCII_NBRSP: u8 = 31;

/// In-band byte standing for a breakable hyphen.
pub const ASCII_HYPH: u8 = 30;
