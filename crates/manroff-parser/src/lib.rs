//! Front-end parser for manual-page documents.
//!
//! The parser turns raw manual source into a validated [`Tree`] plus
//! document metadata and a diagnostic stream. Two macro dialects are
//! supported: the structured vocabulary (`Dd`/`Dt`/`Os`, `Sh`, `Nm`, …)
//! and the presentation vocabulary (`TH`, `SH`, `TP`, `B`, …), with
//! automatic detection from the first macro line.
//!
//! # Pipeline
//!
//! 1. `manroff_lexer` assembles logical lines (continuations resolved);
//! 2. each line is interpolated (`\*` strings) and escape-checked;
//! 3. macro lines dispatch through a per-dialect table to family
//!    handlers that build the tree over an explicit open-scope stack;
//! 4. after end of input, validation runs per-macro pre/post predicates
//!    that rewrite nodes, inject arguments, and finish the metadata.
//!
//! # Example
//!
//! ```
//! use manroff_diagnostics::{MemorySink, Severity};
//! use manroff_parser::{ParseConfig, Parser};
//!
//! let source = "\
//! .Dd January 1, 2020
//! .Dt TEST 1
//! .Os
//! .Sh NAME
//! .Nm test
//! .Nd a thing
//! ";
//! let mut sink = MemorySink::new();
//! let doc = Parser::new(ParseConfig::default())
//!     .parse_str("test.1", source, &mut sink)
//!     .unwrap();
//! assert_eq!(doc.tree.meta.title, "TEST");
//! assert_eq!(sink.worst(), Severity::Ok);
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

mod config;
mod date;
mod interp;
mod man;
mod mdoc;

use std::io::Read;

use manroff_ast::Tree;
use manroff_diagnostics::DiagnosticSink;
use manroff_lexer::{LexError, LineReader, LogicalLine};
use thiserror::Error;
use tracing::debug;

pub use config::{Dialect, ParseConfig};

/// Errors that abort a parse.
///
/// Every abort has already been reported through the diagnostic sink;
/// the error value only signals that no document was produced.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A diagnostic at or above the configured fatal level was raised,
    /// or the sink requested a halt.
    #[error("parsing aborted by a fatal diagnostic")]
    Aborted,
    /// Line accumulation failed.
    #[error(transparent)]
    Lex(#[from] LexError),
}

/// A successfully parsed and validated document.
#[derive(Debug)]
pub struct Document {
    /// Name the source was read from, for consumers' records.
    pub filename: String,
    /// The validated tree; metadata lives at `tree.meta`.
    pub tree: Tree,
    /// Dialect the document was parsed as.
    pub dialect: Dialect,
}

/// One parser instance; reusable across documents.
#[derive(Debug, Default)]
pub struct Parser {
    cfg: ParseConfig,
}

impl Parser {
    /// A parser with the given configuration.
    pub fn new(cfg: ParseConfig) -> Self {
        Parser { cfg }
    }

    /// The active configuration.
    pub fn config(&self) -> &ParseConfig {
        &self.cfg
    }

    /// Parse a complete in-memory source.
    pub fn parse_str<S: DiagnosticSink>(
        &self,
        filename: &str,
        source: &str,
        sink: &mut S,
    ) -> Result<Document, ParseError> {
        self.parse_reader(filename, source.as_bytes(), sink)
    }

    /// Parse from a byte stream.
    pub fn parse_reader<R: Read, S: DiagnosticSink>(
        &self,
        filename: &str,
        reader: R,
        sink: &mut S,
    ) -> Result<Document, ParseError> {
        let lines: Vec<LogicalLine> = LineReader::new(reader)
            .with_max_line(self.cfg.max_line_length)
            .lines(sink)
            .collect::<Result<_, _>>()?;

        let dialect = match self.cfg.dialect {
            Dialect::Auto => detect_dialect(&lines),
            fixed => fixed,
        };
        debug!(filename, ?dialect, lines = lines.len(), "parsing document");

        let tree = match dialect {
            Dialect::Man => man::parse_man(&self.cfg, &lines, sink)?,
            _ => mdoc::parse_mdoc(&self.cfg, &lines, sink)?,
        };
        Ok(Document { filename: filename.to_string(), tree, dialect })
    }
}

/// The first macro line decides the dialect.
fn detect_dialect(lines: &[LogicalLine]) -> Dialect {
    for line in lines {
        let text = line.text.as_str();
        let Some(rest) = text.strip_prefix('.').or_else(|| text.strip_prefix('\'')) else {
            continue;
        };
        let rest = rest.trim_start();
        if rest.starts_with("\\\"") {
            continue;
        }
        let name: String = rest.chars().take_while(|c| *c != ' ').collect();
        if name.is_empty() {
            continue;
        }
        return if name == "Dd" { Dialect::Mdoc } else { Dialect::Man };
    }
    Dialect::Man
}

pub use mdoc::table::{Family, MacroRow};
pub use mdoc::width::{macro_width, resolve_width};

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(src: &[&str]) -> Vec<LogicalLine> {
        src.iter()
            .enumerate()
            .map(|(i, text)| LogicalLine { number: i + 1, text: (*text).to_string() })
            .collect()
    }

    #[test]
    fn detects_structured_dialect() {
        let ls = lines(&[".\\\" comment", ".Dd January 1, 2020"]);
        assert_eq!(detect_dialect(&ls), Dialect::Mdoc);
    }

    #[test]
    fn detects_presentation_dialect() {
        let ls = lines(&["some preamble text", ".TH TEST 1"]);
        assert_eq!(detect_dialect(&ls), Dialect::Man);
    }

    #[test]
    fn empty_input_defaults_to_presentation() {
        assert_eq!(detect_dialect(&[]), Dialect::Man);
    }
}
