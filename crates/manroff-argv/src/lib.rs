//! Argument tokenization for macro lines.
//!
//! After the dispatcher recognizes a macro name, the rest of the line is
//! a sequence of arguments whose shape depends on the macro:
//!
//! - most macros take space-separated words with double-quote literals
//!   (doubled quotes collapse, `\ ` does not split);
//! - line-dominant macros ([`ArgsProfile::Delim`]) recognize a trailing
//!   run of closing/middle delimiters and hand it back unstyled;
//! - columnated list bodies ([`ArgsProfile::TabSep`]) split cells on
//!   tabs or space-surrounded `Ta` words.
//!
//! A macro line may additionally open with `-flag [value ...]` groups
//! drawn from that macro's closed vocabulary; [`parse_flags`] recognizes
//! them with per-flag value shapes ([`ArgShape`]) and leaves the first
//! non-flag word for the caller.
//!
//! # Example
//!
//! ```
//! use manroff_argv::{ArgCursor, ArgFlavor, ArgsProfile};
//! use manroff_diagnostics::MemorySink;
//!
//! let mut sink = MemorySink::new();
//! let mut cursor = ArgCursor::new("\"hello there\" world", 0, 1);
//! let tok = cursor.next_arg(ArgsProfile::None, &mut sink);
//! assert_eq!(tok.flavor, ArgFlavor::QuotedWord);
//! assert_eq!(tok.word, "hello there");
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

mod cursor;
mod delim;
mod flags;

pub use cursor::{ArgCursor, ArgFlavor, ArgToken, ArgsProfile};
pub use delim::{DelimClass, delim_class};
pub use flags::{ArgShape, args_profile, flag_shape, flag_vocabulary, parse_flags};
