//! Parser configuration.

use manroff_diagnostics::Severity;
use manroff_lexer::DEFAULT_MAX_LINE;

/// Which macro dialect to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dialect {
    /// Decide from the first macro line: `Dd` opens the structured
    /// dialect, anything else the presentation dialect.
    #[default]
    Auto,
    /// The structured (semantic) dialect.
    Mdoc,
    /// The presentation dialect.
    Man,
}

/// Options controlling one parser instance.
#[derive(Debug, Clone)]
pub struct ParseConfig {
    /// Dialect selection.
    pub dialect: Dialect,
    /// Severity at which parsing halts; diagnostics below it are
    /// reported and recovered from.
    pub fatal_level: Severity,
    /// Cap on a logical line, in bytes.
    pub max_line_length: usize,
    /// Demote unknown escape sequences from a warning to silence.
    pub ignore_unknown_escapes: bool,
    /// Demote unknown macros from an error to silence.
    pub ignore_unknown_macros: bool,
    /// Recover from scope violations instead of halting on them.
    pub ignore_scope_errors: bool,
    /// Operating-system string used when the document does not name one;
    /// falls back to the build target's OS name.
    pub default_os: Option<String>,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            dialect: Dialect::Auto,
            fatal_level: Severity::Fatal,
            max_line_length: DEFAULT_MAX_LINE,
            ignore_unknown_escapes: false,
            ignore_unknown_macros: false,
            ignore_scope_errors: false,
            default_os: None,
        }
    }
}
