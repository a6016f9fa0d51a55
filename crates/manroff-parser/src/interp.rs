//! Line-level escape checking and predefined-string interpolation.
//!
//! Before a line reaches the dispatcher, `\*` string references are
//! substituted from the preprocessor table and every other escape is
//! classified once so unknown sequences warn exactly once, at the point
//! of first sight. All other escapes pass through verbatim; decoding to
//! output text happens in the consumers.

use manroff_diagnostics::{Code, Diagnostic, DiagnosticSink};
use manroff_escape::{EscapeClass, escape, glyph_codepoint, predefined_string};

/// Substitute predefined strings and report bad escapes.
pub(crate) fn interpolate<S: DiagnosticSink>(
    raw: &str,
    line_no: usize,
    ignore_unknown: bool,
    sink: &mut S,
) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    while let Some(off) = raw[i..].find('\\') {
        let at = i + off;
        out.push_str(&raw[i..at]);
        let (class, len) = escape(&raw[at + 1..]);
        let consumed = at + 1 + len;
        match class {
            EscapeClass::Predefined(name) => match predefined_string(name) {
                Some(value) => out.push_str(value),
                None => {
                    if !ignore_unknown {
                        sink.report(
                            Diagnostic::new(Code::BadEscape, line_no, at)
                                .with_detail(format!("\\*{name}")),
                        );
                    }
                }
            },
            EscapeClass::Special(name) => {
                if glyph_codepoint(name).is_none() && !ignore_unknown {
                    sink.report(
                        Diagnostic::new(Code::BadEscape, line_no, at)
                            .with_detail(name.to_string()),
                    );
                }
                out.push_str(&raw[at..consumed]);
            }
            EscapeClass::Invalid => {
                if !ignore_unknown {
                    sink.report(Diagnostic::new(Code::BadEscape, line_no, at));
                }
                out.push_str(&raw[at..consumed.max(at + 1)]);
            }
            _ => out.push_str(&raw[at..consumed]),
        }
        i = consumed.max(at + 1);
    }
    out.push_str(&raw[i..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use manroff_diagnostics::MemorySink;
    use pretty_assertions::assert_eq;

    fn run(raw: &str) -> (String, MemorySink) {
        let mut sink = MemorySink::new();
        let out = interpolate(raw, 1, false, &mut sink);
        (out, sink)
    }

    #[test]
    fn plain_text_is_untouched() {
        let (out, sink) = run("no escapes at all");
        assert_eq!(out, "no escapes at all");
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn predefined_strings_substitute() {
        let (out, _) = run("a \\*q b \\*(Ba c");
        assert_eq!(out, "a \" b | c");
    }

    #[test]
    fn glyph_escapes_pass_through() {
        let (out, sink) = run("x\\(emy");
        assert_eq!(out, "x\\(emy");
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn unknown_glyph_warns_once() {
        let (out, sink) = run("x\\(zzy");
        assert_eq!(out, "x\\(zzy");
        assert!(sink.has(Code::BadEscape));
        assert_eq!(sink.diagnostics().len(), 1);
    }

    #[test]
    fn unknown_string_warns_and_drops() {
        let (out, sink) = run("a\\*Zb");
        assert_eq!(out, "ab");
        assert!(sink.has(Code::BadEscape));
    }

    #[test]
    fn ignore_flag_suppresses_warnings() {
        let mut sink = MemorySink::new();
        let out = interpolate("x\\(zzy", 1, true, &mut sink);
        assert_eq!(out, "x\\(zzy");
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn trailing_backslash_is_kept() {
        let (out, sink) = run("tail\\");
        assert_eq!(out, "tail\\");
        assert!(sink.has(Code::BadEscape));
    }
}
