//! Stable diagnostic codes and severity levels for the manual-page
//! toolchain.
//!
//! This crate provides the canonical definitions of the diagnostics
//! emitted while parsing, validating, and indexing manual pages. The
//! codes are stable and can be referenced in documentation and error
//! messages.
//!
//! # Code Ranges
//!
//! | Range       | Category                         |
//! |-------------|----------------------------------|
//! | MW100-MW199 | Recoverable style warnings       |
//! | ME200-ME299 | Recoverable structural errors    |
//! | MF300-MF399 | Fatal structural errors          |
//! | MB400-MB499 | Caller-level argument errors     |
//! | MS500-MS599 | Operating-system level failures  |
//!
//! # Example
//!
//! ```
//! use manroff_diagnostics::{Code, Severity};
//!
//! let code = Code::SectionsOutOfOrder;
//! assert_eq!(code.as_str(), "MW102");
//! assert_eq!(code.severity(), Severity::Warning);
//! ```
//!
//! The [`DiagnosticSink`] trait decouples reporting from policy: a sink
//! may collect, stream, or abort. The parser consults
//! [`DiagnosticSink::should_halt`] after every report and unwinds when it
//! answers `true`.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

use std::fmt;

/// Severity of a diagnostic, least to most severe.
///
/// The ordinal doubles as the conventional process exit code, so the
/// worst severity reached during a run is also the run's exit level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Severity {
    /// Nothing to report.
    #[default]
    Ok = 0,
    /// Recoverable style issue.
    Warning = 1,
    /// Recoverable structural issue; affected input is dropped.
    Error = 2,
    /// Non-recoverable structural issue; the document is abandoned.
    Fatal = 3,
    /// Caller-level misuse (bad command-line argument or expression).
    BadArg = 4,
    /// Operating-system failure (I/O, rename, system call).
    SysErr = 5,
}

impl Severity {
    /// Conventional process exit code for this severity.
    pub fn exit_code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Ok => "ok",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
            Severity::BadArg => "usage",
            Severity::SysErr => "system error",
        };
        f.write_str(s)
    }
}

/// Stable diagnostic codes.
///
/// Each code belongs to exactly one severity range; the canonical
/// human-readable text comes from [`Code::message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Code {
    // Recoverable style warnings (MW100-MW199)
    /// Text should be uppercase
    TextShouldBeUppercase,
    /// Sections out of conventional order
    SectionsOutOfOrder,
    /// Section name repeats
    SectionNameRepeats,
    /// Out of order prologue
    PrologueOutOfOrder,
    /// Repeated prologue entry
    PrologueRepeated,
    /// List type must come first
    ListTypeMustComeFirst,
    /// Bad standard
    BadStandard,
    /// Bad library
    BadLibrary,
    /// Tab in non-literal context
    TabInNonLiteralContext,
    /// Bad escape sequence
    BadEscape,
    /// Unterminated quoted string
    UnterminatedQuote,
    /// Argument requires the width argument
    MissingWidthArg,
    /// Superfluous width argument
    SuperfluousWidthArg,
    /// Ignoring argument
    IgnoringArgument,
    /// Bad date argument
    BadDate,
    /// Bad width argument
    BadWidth,
    /// Unknown manual section
    UnknownManualSection,
    /// Section not in conventional manual section
    SectionInWrongManual,
    /// End of line whitespace
    EolnWhitespace,
    /// Blocks badly nested
    BadNesting,
    /// Parameter looks like an argument flag
    ArgLikeParameter,
    /// Deprecated macro
    DeprecatedMacro,
    /// Cannot determine default width
    CannotDetermineWidth,

    // Recoverable structural errors (ME200-ME299)
    /// NAME section must come first
    NameSectionFirst,
    /// Bad Boolean value
    BadBoolean,
    /// Child violates parent syntax
    ChildViolatesParent,
    /// Bad AT&T symbol
    BadAttSymbol,
    /// List type repeated
    ListTypeRepeated,
    /// Display type repeated
    DisplayTypeRepeated,
    /// Argument repeated
    ArgumentRepeated,
    /// Manual name not yet set
    NameNotYetSet,
    /// Obsolete macro ignored
    ObsoleteMacro,
    /// Empty macro ignored
    EmptyMacro,
    /// Macro not allowed in document body
    MacroNotAllowedInBody,
    /// Macro not allowed in prologue
    MacroNotAllowedInPrologue,
    /// Bad character
    BadCharacter,
    /// Bad NAME section contents
    BadNameSection,
    /// No blank lines allowed
    NoBlankLines,
    /// No text allowed in this context
    NoTextAllowed,
    /// Bad comment style
    BadCommentStyle,
    /// Unknown macro will be lost
    UnknownMacro,
    /// Line scope broken
    LineScopeBroken,
    /// Argument count wrong
    ArgCountWrong,
    /// No such block is open
    NoOpenScope,
    /// Scope already open
    ScopeAlreadyOpen,
    /// Macro requires line argument(s)
    MacroRequiresLineArg,
    /// Macro requires body argument(s)
    MacroRequiresBodyArg,
    /// Macro requires argument(s)
    MacroRequiresArg,
    /// No title in document
    NoTitle,
    /// Missing list type
    MissingListType,
    /// Missing display type
    MissingDisplayType,
    /// Missing font type
    MissingFontType,
    /// Line argument(s) will be lost
    LineArgsLost,
    /// Body argument(s) will be lost
    BodyLost,
    /// Paragraph macro ignored
    ParagraphIgnored,

    // Fatal structural errors (MF300-MF399)
    /// Column syntax is inconsistent
    InconsistentColumns,
    /// Displays may not be nested
    NestedDisplays,
    /// Unsupported display type
    UnsupportedDisplayType,
    /// Blocks badly nested, syntax violated
    FatalNesting,
    /// No scope to rewind: syntax violated
    NoScopeToRewind,
    /// Line scope broken, syntax violated
    FatalLineScope,
    /// Argument count wrong, violates syntax
    FatalArgCount,
    /// Child violates parent syntax, fatal
    FatalChild,
    /// Scope open on exit
    ScopeOpenOnExit,
    /// No document body
    NoDocumentBody,
    /// No document prologue
    NoDocumentPrologue,
    /// Input line longer than the configured maximum
    LineTooLong,
    /// Could not determine the running system's name
    UtsnameFailed,

    // Caller-level argument errors (MB400-MB499)
    /// Bad command-line argument
    BadCommandLineArg,
    /// Malformed search expression
    BadSearchExpression,

    // Operating-system failures (MS500-MS599)
    /// Failed to open a file
    FileOpenFailed,
    /// Failed to read from a file
    FileReadFailed,
    /// Failed to write to a file
    FileWriteFailed,
    /// Failed to atomically rename a database file
    RenameFailed,
}

impl Code {
    /// Stable string identifier (e.g. `"MW102"`).
    pub fn as_str(self) -> &'static str {
        use Code::*;
        match self {
            TextShouldBeUppercase => "MW101",
            SectionsOutOfOrder => "MW102",
            SectionNameRepeats => "MW103",
            PrologueOutOfOrder => "MW104",
            PrologueRepeated => "MW105",
            ListTypeMustComeFirst => "MW106",
            BadStandard => "MW107",
            BadLibrary => "MW108",
            TabInNonLiteralContext => "MW109",
            BadEscape => "MW110",
            UnterminatedQuote => "MW111",
            MissingWidthArg => "MW112",
            SuperfluousWidthArg => "MW113",
            IgnoringArgument => "MW114",
            BadDate => "MW115",
            BadWidth => "MW116",
            UnknownManualSection => "MW117",
            SectionInWrongManual => "MW118",
            EolnWhitespace => "MW119",
            BadNesting => "MW120",
            ArgLikeParameter => "MW121",
            DeprecatedMacro => "MW122",
            CannotDetermineWidth => "MW123",

            NameSectionFirst => "ME201",
            BadBoolean => "ME202",
            ChildViolatesParent => "ME203",
            BadAttSymbol => "ME204",
            ListTypeRepeated => "ME205",
            DisplayTypeRepeated => "ME206",
            ArgumentRepeated => "ME207",
            NameNotYetSet => "ME208",
            ObsoleteMacro => "ME209",
            EmptyMacro => "ME210",
            MacroNotAllowedInBody => "ME211",
            MacroNotAllowedInPrologue => "ME212",
            BadCharacter => "ME213",
            BadNameSection => "ME214",
            NoBlankLines => "ME215",
            NoTextAllowed => "ME216",
            BadCommentStyle => "ME217",
            UnknownMacro => "ME218",
            LineScopeBroken => "ME219",
            ArgCountWrong => "ME220",
            NoOpenScope => "ME221",
            ScopeAlreadyOpen => "ME222",
            MacroRequiresLineArg => "ME223",
            MacroRequiresBodyArg => "ME224",
            MacroRequiresArg => "ME225",
            NoTitle => "ME226",
            MissingListType => "ME227",
            MissingDisplayType => "ME228",
            MissingFontType => "ME229",
            LineArgsLost => "ME230",
            BodyLost => "ME231",
            ParagraphIgnored => "ME232",

            InconsistentColumns => "MF301",
            NestedDisplays => "MF302",
            UnsupportedDisplayType => "MF303",
            FatalNesting => "MF304",
            NoScopeToRewind => "MF305",
            FatalLineScope => "MF306",
            FatalArgCount => "MF307",
            FatalChild => "MF308",
            ScopeOpenOnExit => "MF309",
            NoDocumentBody => "MF310",
            NoDocumentPrologue => "MF311",
            LineTooLong => "MF312",
            UtsnameFailed => "MF313",

            BadCommandLineArg => "MB401",
            BadSearchExpression => "MB402",

            FileOpenFailed => "MS501",
            FileReadFailed => "MS502",
            FileWriteFailed => "MS503",
            RenameFailed => "MS504",
        }
    }

    /// Severity range this code belongs to.
    pub fn severity(self) -> Severity {
        match self.as_str().as_bytes()[1] {
            b'W' => Severity::Warning,
            b'E' => Severity::Error,
            b'F' => Severity::Fatal,
            b'B' => Severity::BadArg,
            _ => Severity::SysErr,
        }
    }

    /// Canonical human-readable message for this code.
    pub fn message(self) -> &'static str {
        use Code::*;
        match self {
            TextShouldBeUppercase => "text should be uppercase",
            SectionsOutOfOrder => "sections out of conventional order",
            SectionNameRepeats => "section name repeats",
            PrologueOutOfOrder => "out of order prologue",
            PrologueRepeated => "repeated prologue entry",
            ListTypeMustComeFirst => "list type must come first",
            BadStandard => "bad standard",
            BadLibrary => "bad library",
            TabInNonLiteralContext => "tab in non-literal context",
            BadEscape => "bad escape sequence",
            UnterminatedQuote => "unterminated quoted string",
            MissingWidthArg => "argument requires the width argument",
            SuperfluousWidthArg => "superfluous width argument",
            IgnoringArgument => "ignoring argument",
            BadDate => "bad date argument",
            BadWidth => "bad width argument",
            UnknownManualSection => "unknown manual section",
            SectionInWrongManual => "section not in conventional manual section",
            EolnWhitespace => "end of line whitespace",
            BadNesting => "blocks badly nested",
            ArgLikeParameter => "parameter looks like an argument",
            DeprecatedMacro => "deprecated macro",
            CannotDetermineWidth => "cannot determine default width",

            NameSectionFirst => "NAME section must come first",
            BadBoolean => "bad Boolean value",
            ChildViolatesParent => "child violates parent syntax",
            BadAttSymbol => "bad AT&T symbol",
            ListTypeRepeated => "list type repeated",
            DisplayTypeRepeated => "display type repeated",
            ArgumentRepeated => "argument repeated",
            NameNotYetSet => "manual name not yet set",
            ObsoleteMacro => "obsolete macro ignored",
            EmptyMacro => "empty macro ignored",
            MacroNotAllowedInBody => "macro not allowed in body",
            MacroNotAllowedInPrologue => "macro not allowed in prologue",
            BadCharacter => "bad character",
            BadNameSection => "bad NAME section contents",
            NoBlankLines => "no blank lines",
            NoTextAllowed => "no text in this context",
            BadCommentStyle => "bad comment style",
            UnknownMacro => "unknown macro will be lost",
            LineScopeBroken => "line scope broken",
            ArgCountWrong => "argument count wrong",
            NoOpenScope => "no such block is open",
            ScopeAlreadyOpen => "scope already open",
            MacroRequiresLineArg => "macro requires line argument(s)",
            MacroRequiresBodyArg => "macro requires body argument(s)",
            MacroRequiresArg => "macro requires argument(s)",
            NoTitle => "no title in document",
            MissingListType => "missing list type",
            MissingDisplayType => "missing display type",
            MissingFontType => "missing font type",
            LineArgsLost => "line argument(s) will be lost",
            BodyLost => "body argument(s) will be lost",
            ParagraphIgnored => "paragraph macro ignored",

            InconsistentColumns => "column syntax is inconsistent",
            NestedDisplays => "displays may not be nested",
            UnsupportedDisplayType => "unsupported display type",
            FatalNesting => "blocks badly nested, syntax violated",
            NoScopeToRewind => "no scope to rewind: syntax violated",
            FatalLineScope => "line scope broken, syntax violated",
            FatalArgCount => "argument count wrong, violates syntax",
            FatalChild => "child violates parent syntax, fatal",
            ScopeOpenOnExit => "scope open on exit",
            NoDocumentBody => "no document body",
            NoDocumentPrologue => "no document prologue",
            LineTooLong => "input line too long",
            UtsnameFailed => "utsname system call failed",

            BadCommandLineArg => "bad command line argument",
            BadSearchExpression => "malformed search expression",

            FileOpenFailed => "cannot open file",
            FileReadFailed => "cannot read file",
            FileWriteFailed => "cannot write file",
            RenameFailed => "cannot rename database file",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.as_str())
    }
}

/// One reported diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    /// Severity, always `code.severity()`.
    pub severity: Severity,
    /// 1-based source line, 0 when no position applies.
    pub line: usize,
    /// 0-based source column.
    pub column: usize,
    /// Stable code.
    pub code: Code,
    /// Optional free-text detail appended to the canonical message.
    pub detail: Option<String>,
}

impl Diagnostic {
    /// Build a diagnostic for `code` at the given position.
    pub fn new(code: Code, line: usize, column: usize) -> Self {
        Diagnostic { severity: code.severity(), line, column, code, detail: None }
    }

    /// Attach free-text detail.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}: {}", self.line, self.column, self.severity, self.code.message())?;
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

/// Where diagnostics go.
///
/// `report` receives every diagnostic in source order; `should_halt` is
/// consulted after each report, and answering `true` cancels the parse
/// (the open-scope stack is unwound and no partial output is committed).
pub trait DiagnosticSink {
    /// Record one diagnostic.
    fn report(&mut self, diagnostic: Diagnostic);

    /// Whether the producer should stop now.
    fn should_halt(&self) -> bool {
        false
    }
}

/// Collecting sink: remembers every diagnostic and the worst severity.
#[derive(Debug, Default)]
pub struct MemorySink {
    diagnostics: Vec<Diagnostic>,
    worst: Severity,
}

impl MemorySink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All diagnostics reported so far, in order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Worst severity reached; this is the parse's exit level.
    pub fn worst(&self) -> Severity {
        self.worst
    }

    /// Whether any diagnostic with `code` was reported.
    pub fn has(&self, code: Code) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.worst = self.worst.max(diagnostic.severity);
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_and_exits() {
        assert!(Severity::Ok < Severity::Warning);
        assert!(Severity::Fatal < Severity::SysErr);
        assert_eq!(Severity::Error.exit_code(), 2);
    }

    #[test]
    fn code_ids_match_their_range() {
        assert_eq!(Code::UnterminatedQuote.severity(), Severity::Warning);
        assert_eq!(Code::UnknownMacro.severity(), Severity::Error);
        assert_eq!(Code::NoDocumentBody.severity(), Severity::Fatal);
        assert_eq!(Code::BadSearchExpression.severity(), Severity::BadArg);
        assert_eq!(Code::RenameFailed.severity(), Severity::SysErr);
    }

    #[test]
    fn memory_sink_tracks_worst() {
        let mut sink = MemorySink::new();
        sink.report(Diagnostic::new(Code::EolnWhitespace, 3, 0));
        assert_eq!(sink.worst(), Severity::Warning);
        sink.report(Diagnostic::new(Code::NoDocumentBody, 9, 0));
        assert_eq!(sink.worst(), Severity::Fatal);
        sink.report(Diagnostic::new(Code::BadDate, 1, 0));
        assert_eq!(sink.worst(), Severity::Fatal);
        assert_eq!(sink.diagnostics().len(), 3);
        assert!(sink.has(Code::BadDate));
    }

    #[test]
    fn display_includes_position_and_detail() {
        let d = Diagnostic::new(Code::UnknownMacro, 12, 4).with_detail("Xz");
        assert_eq!(d.to_string(), "12:4: error: unknown macro will be lost: Xz");
    }
}
