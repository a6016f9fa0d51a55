//! Logical-line accumulation for manual-page source.
//!
//! Reads the source in I/O-sized blocks and assembles logical lines: a
//! newline preceded by an odd run of backslashes is a continuation, so
//! the final backslash is dropped, the line number advances, and
//! accumulation continues. An even run is literal backslash content and
//! the line terminates normally. Downstream stages therefore never see a
//! newline inside a line, which also pins the rule that a quoted macro
//! argument cannot span a physical line break.
//!
//! # Failure modes
//!
//! - an I/O error aborts the document with a `SysErr` diagnostic;
//! - a logical line longer than the configured maximum is a fatal
//!   `LineTooLong`;
//! - bytes that are not valid UTF-8 report `BadCharacter` and are
//!   replaced so parsing can continue.
//!
//! # Example
//!
//! ```
//! use manroff_lexer::LineReader;
//! use manroff_diagnostics::MemorySink;
//!
//! let src = b"first li\\\nne\nsecond\n";
//! let mut sink = MemorySink::new();
//! let lines: Vec<_> = LineReader::new(&src[..])
//!     .lines(&mut sink)
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(lines[0].text, "first line");
//! assert_eq!(lines[1].number, 3);
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

use std::io::Read;

use manroff_diagnostics::{Code, Diagnostic, DiagnosticSink};
use memchr::memchr;
use thiserror::Error;

/// Default block size when the source does not suggest one.
const DEFAULT_BLOCK: usize = 64 * 1024;

/// Default cap on a logical line.
pub const DEFAULT_MAX_LINE: usize = 64 * 1024;

/// Errors that abort line accumulation.
#[derive(Debug, Error)]
pub enum LexError {
    /// Underlying read failed.
    #[error("read failed at line {line}: {source}")]
    Io {
        /// Line being accumulated when the read failed.
        line: usize,
        /// The I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A logical line exceeded the configured maximum.
    #[error("line {line} longer than {max} bytes")]
    TooLong {
        /// The offending line.
        line: usize,
        /// The configured cap.
        max: usize,
    },
}

/// One logical line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// 1-based number of the line's first physical line.
    pub number: usize,
    /// Line content, continuations resolved, no trailing newline.
    pub text: String,
}

/// Block-buffered reader producing [`LogicalLine`]s.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    max_line: usize,
    block_size: usize,
}

impl<R: Read> LineReader<R> {
    /// Reader with default block size and line cap.
    pub fn new(inner: R) -> Self {
        LineReader { inner, max_line: DEFAULT_MAX_LINE, block_size: DEFAULT_BLOCK }
    }

    /// Override the logical-line cap.
    pub fn with_max_line(mut self, max_line: usize) -> Self {
        self.max_line = max_line;
        self
    }

    /// Override the read block size.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Iterate logical lines, reporting recoverable issues to `sink`.
    pub fn lines<'a, S: DiagnosticSink>(self, sink: &'a mut S) -> Lines<'a, R, S> {
        Lines {
            inner: self.inner,
            sink,
            block: vec![0; self.block_size],
            filled: 0,
            pos: 0,
            line: Vec::new(),
            number: 1,
            next_number: 1,
            max_line: self.max_line,
            done: false,
        }
    }
}

/// Iterator state for [`LineReader::lines`].
#[derive(Debug)]
pub struct Lines<'a, R, S> {
    inner: R,
    sink: &'a mut S,
    block: Vec<u8>,
    filled: usize,
    pos: usize,
    line: Vec<u8>,
    number: usize,
    next_number: usize,
    max_line: usize,
    done: bool,
}

impl<R: Read, S: DiagnosticSink> Lines<'_, R, S> {
    fn refill(&mut self) -> Result<bool, LexError> {
        self.pos = 0;
        self.filled = self
            .inner
            .read(&mut self.block)
            .map_err(|source| LexError::Io { line: self.number, source })?;
        Ok(self.filled > 0)
    }

    /// Count of trailing backslashes on the accumulated line.
    fn trailing_backslashes(&self) -> usize {
        self.line.iter().rev().take_while(|&&b| b == b'\\').count()
    }

    fn finish_line(&mut self) -> LogicalLine {
        let number = self.number;
        self.number = self.next_number;
        let text = match String::from_utf8(std::mem::take(&mut self.line)) {
            Ok(text) => text,
            Err(err) => {
                self.sink.report(Diagnostic::new(Code::BadCharacter, number, 0));
                String::from_utf8_lossy(err.as_bytes()).into_owned()
            }
        };
        LogicalLine { number, text }
    }
}

impl<R: Read, S: DiagnosticSink> Iterator for Lines<'_, R, S> {
    type Item = Result<LogicalLine, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if self.pos >= self.filled {
                match self.refill() {
                    Ok(true) => {}
                    Ok(false) => {
                        self.done = true;
                        if self.line.is_empty() {
                            return None;
                        }
                        // Final line without a trailing newline.
                        self.next_number += 1;
                        return Some(Ok(self.finish_line()));
                    }
                    Err(err) => {
                        self.done = true;
                        self.sink.report(Diagnostic::new(
                            Code::FileReadFailed,
                            self.number,
                            0,
                        ));
                        return Some(Err(err));
                    }
                }
            }

            let chunk = &self.block[self.pos..self.filled];
            match memchr(b'\n', chunk) {
                Some(nl) => {
                    self.line.extend_from_slice(&chunk[..nl]);
                    self.pos += nl + 1;
                    self.next_number += 1;

                    if self.line.len() > self.max_line {
                        self.done = true;
                        let err = LexError::TooLong { line: self.number, max: self.max_line };
                        self.sink.report(Diagnostic::new(Code::LineTooLong, self.number, 0));
                        return Some(Err(err));
                    }

                    // An odd backslash run escapes the newline: drop the
                    // final backslash and keep accumulating.
                    if self.trailing_backslashes() % 2 == 1 {
                        self.line.pop();
                        continue;
                    }
                    return Some(Ok(self.finish_line()));
                }
                None => {
                    self.line.extend_from_slice(chunk);
                    self.pos = self.filled;
                    if self.line.len() > self.max_line {
                        self.done = true;
                        let err = LexError::TooLong { line: self.number, max: self.max_line };
                        self.sink.report(Diagnostic::new(Code::LineTooLong, self.number, 0));
                        return Some(Err(err));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manroff_diagnostics::MemorySink;
    use pretty_assertions::assert_eq;

    fn collect(src: &[u8]) -> (Vec<LogicalLine>, MemorySink) {
        let mut sink = MemorySink::new();
        let lines = LineReader::new(src)
            .lines(&mut sink)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        (lines, sink)
    }

    #[test]
    fn plain_lines_keep_their_numbers() {
        let (lines, _) = collect(b"one\ntwo\n\nfour\n");
        let got: Vec<(usize, &str)> =
            lines.iter().map(|l| (l.number, l.text.as_str())).collect();
        assert_eq!(got, vec![(1, "one"), (2, "two"), (3, ""), (4, "four")]);
    }

    #[test]
    fn odd_backslash_run_continues_the_line() {
        let (lines, _) = collect(b"a\\\nb\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "ab");
        assert_eq!(lines[0].number, 1);
    }

    #[test]
    fn even_backslash_run_is_literal() {
        let (lines, _) = collect(b"a\\\\\nb\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "a\\\\");
        assert_eq!(lines[1].number, 2);
    }

    #[test]
    fn triple_backslash_continues_with_pair_kept() {
        let (lines, _) = collect(b"a\\\\\\\nb\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "a\\\\b");
    }

    #[test]
    fn numbering_skips_continuation_lines() {
        let (lines, _) = collect(b"a\\\nb\\\nc\nnext\n");
        assert_eq!(lines[0].text, "abc");
        assert_eq!(lines[0].number, 1);
        assert_eq!(lines[1].number, 4);
    }

    #[test]
    fn missing_final_newline_still_yields_line() {
        let (lines, _) = collect(b"tail");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "tail");
    }

    #[test]
    fn over_long_line_is_fatal() {
        let src = vec![b'x'; 100];
        let mut sink = MemorySink::new();
        let result: Result<Vec<_>, _> = LineReader::new(&src[..])
            .with_max_line(64)
            .lines(&mut sink)
            .collect();
        assert!(matches!(result, Err(LexError::TooLong { line: 1, max: 64 })));
        assert!(sink.has(Code::LineTooLong));
    }

    #[test]
    fn invalid_utf8_is_replaced_and_reported() {
        let (lines, sink) = collect(b"ab\xFFcd\n");
        assert_eq!(lines[0].text, "ab\u{FFFD}cd");
        assert!(sink.has(Code::BadCharacter));
    }

    #[test]
    fn small_blocks_split_lines_correctly() {
        let mut sink = MemorySink::new();
        let lines: Vec<_> = LineReader::new(&b"alpha\\\nbeta\ngamma\n"[..])
            .with_block_size(3)
            .lines(&mut sink)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(lines[0].text, "alphabeta");
        assert_eq!(lines[1].text, "gamma");
    }
}
