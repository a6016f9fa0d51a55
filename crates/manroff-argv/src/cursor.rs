//! The per-line argument cursor.

use manroff_diagnostics::{Code, Diagnostic, DiagnosticSink};

use crate::delim::{DelimClass, delim_class};

/// Per-macro argument parsing mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArgsProfile {
    /// Space-separated words with quoting.
    #[default]
    None,
    /// Additionally recognize a trailing run of closing delimiters.
    Delim,
    /// Tab- or `Ta`-separated phrases (columnated list bodies).
    TabSep,
}

/// Flavour of one argument token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgFlavor {
    /// Plain word.
    Word,
    /// Word from a quoted literal; may be empty.
    QuotedWord,
    /// `Ta`-delimited phrase cell.
    Phrase,
    /// Tab-delimited phrase cell.
    PartialPhrase,
    /// Final phrase cell on the line.
    PhraseEnd,
    /// The remainder is solely closing/middle delimiters.
    Punct,
    /// Nothing left on the line.
    EndOfLine,
    /// Unrecoverable tokenizer state.
    Error,
}

/// One token produced by [`ArgCursor::next_arg`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgToken {
    /// Flavour.
    pub flavor: ArgFlavor,
    /// Decoded word or phrase; empty for `Punct` and `EndOfLine`.
    pub word: String,
    /// Column the token started at.
    pub pos: usize,
}

impl ArgToken {
    fn at(flavor: ArgFlavor, word: impl Into<String>, pos: usize) -> Self {
        ArgToken { flavor, word: word.into(), pos }
    }
}

/// Cursor over the argument portion of one logical line.
///
/// A quoted literal still open when a column-list phrase ends carries
/// over to the next phrase (`phrase_lit`); the caller marks phrase
/// context through [`ArgCursor::set_in_phrase`].
#[derive(Debug)]
pub struct ArgCursor<'a> {
    line: &'a str,
    /// Byte position of the cursor.
    pub pos: usize,
    line_no: usize,
    phrase_lit: bool,
    in_phrase: bool,
}

impl<'a> ArgCursor<'a> {
    /// Cursor over `line`, starting at byte `pos`.
    pub fn new(line: &'a str, pos: usize, line_no: usize) -> Self {
        ArgCursor { line, pos, line_no, phrase_lit: false, in_phrase: false }
    }

    /// Source line number used for diagnostics.
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    /// Remaining unread input.
    pub fn rest(&self) -> &'a str {
        &self.line[self.pos.min(self.line.len())..]
    }

    /// Mark that tokens are being pulled inside a column phrase.
    pub fn set_in_phrase(&mut self, in_phrase: bool) {
        self.in_phrase = in_phrase;
    }

    fn bytes(&self) -> &'a [u8] {
        self.line.as_bytes()
    }

    fn skip_spaces(&mut self) {
        while self.bytes().get(self.pos) == Some(&b' ') {
            self.pos += 1;
        }
    }

    /// Pull the next token under `profile`.
    pub fn next_arg<S: DiagnosticSink>(&mut self, profile: ArgsProfile, sink: &mut S) -> ArgToken {
        if profile != ArgsProfile::TabSep {
            self.skip_spaces();
        }
        let start = self.pos;
        if self.pos >= self.line.len() {
            if self.phrase_lit && !self.in_phrase {
                sink.report(Diagnostic::new(Code::UnterminatedQuote, self.line_no, start));
            }
            if !self.in_phrase {
                self.phrase_lit = false;
            }
            return ArgToken::at(ArgFlavor::EndOfLine, "", start);
        }

        if profile == ArgsProfile::Delim && self.remainder_is_punct() {
            return ArgToken::at(ArgFlavor::Punct, "", start);
        }

        if profile == ArgsProfile::TabSep {
            return self.next_phrase(sink);
        }

        if self.phrase_lit || self.bytes()[self.pos] == b'"' {
            return self.next_quoted(sink);
        }

        self.next_word(sink)
    }

    /// Plain word: terminated by a space not preceded by a backslash.
    fn next_word<S: DiagnosticSink>(&mut self, sink: &mut S) -> ArgToken {
        let start = self.pos;
        let bytes = self.bytes();
        while self.pos < bytes.len() {
            if bytes[self.pos] == b' ' && self.pos > start && bytes[self.pos - 1] != b'\\' {
                break;
            }
            self.pos += 1;
        }
        let word = &self.line[start..self.pos];
        self.skip_spaces();
        if self.pos >= self.line.len() && self.line.ends_with(' ') {
            sink.report(Diagnostic::new(Code::EolnWhitespace, self.line_no, self.pos));
        }
        ArgToken::at(ArgFlavor::Word, word, start)
    }

    /// Quoted literal: ends at a `"` not followed by another `"`;
    /// doubled quotes collapse to one.
    fn next_quoted<S: DiagnosticSink>(&mut self, sink: &mut S) -> ArgToken {
        let start = self.pos;
        if !self.phrase_lit {
            // Step past the opening quote.
            self.pos += 1;
        }
        if self.in_phrase {
            self.phrase_lit = true;
        }

        let bytes = self.bytes();
        let mut word = String::new();
        let mut closed = false;
        while self.pos < bytes.len() {
            if bytes[self.pos] != b'"' {
                let run_start = self.pos;
                while self.pos < bytes.len() && bytes[self.pos] != b'"' {
                    self.pos += 1;
                }
                word.push_str(&self.line[run_start..self.pos]);
                continue;
            }
            if bytes.get(self.pos + 1) == Some(&b'"') {
                word.push('"');
                self.pos += 2;
                continue;
            }
            self.pos += 1;
            closed = true;
            break;
        }

        if !closed {
            // Keep the literal open across column phrases; otherwise
            // warn and terminate at end of line.
            if self.in_phrase {
                return ArgToken::at(ArgFlavor::QuotedWord, word, start);
            }
            sink.report(Diagnostic::new(Code::UnterminatedQuote, self.line_no, self.pos));
            return ArgToken::at(ArgFlavor::QuotedWord, word, start);
        }

        self.phrase_lit = false;
        let before = self.pos;
        self.skip_spaces();
        if self.pos >= self.line.len() && self.pos > before {
            sink.report(Diagnostic::new(Code::EolnWhitespace, self.line_no, self.pos));
        }
        ArgToken::at(ArgFlavor::QuotedWord, word, start)
    }

    /// Columnated phrase: delimited by a tab or a space-surrounded `Ta`.
    fn next_phrase<S: DiagnosticSink>(&mut self, sink: &mut S) -> ArgToken {
        let start = self.pos;
        let rest = self.rest();

        let tab = rest.find('\t');
        let ta = if self.phrase_lit { None } else { find_ta(rest) };

        let (flavor, end, skip) = match (tab, ta) {
            (Some(t), Some(a)) if a < t => (ArgFlavor::Phrase, a, 2),
            (Some(t), Some(_)) => (ArgFlavor::PartialPhrase, t, 1),
            (Some(t), None) => (ArgFlavor::PartialPhrase, t, 1),
            (None, Some(a)) => (ArgFlavor::Phrase, a, 2),
            (None, None) => (ArgFlavor::PhraseEnd, rest.len(), 0),
        };

        let mut cell = &rest[..end];
        if flavor == ArgFlavor::PhraseEnd && cell.ends_with(' ') {
            sink.report(Diagnostic::new(Code::EolnWhitespace, self.line_no, start + end));
        }
        // Strip blanks around the delimiter.
        while cell.ends_with(' ') && !cell.ends_with("\\ ") {
            cell = &cell[..cell.len() - 1];
        }
        self.pos = start + end + skip;
        self.skip_spaces();
        ArgToken::at(flavor, cell, start)
    }

    /// Whether the remainder is solely space-separated closing and
    /// middle delimiters, the first being a closer.
    fn remainder_is_punct(&self) -> bool {
        let mut words = self.rest().split(' ').filter(|w| !w.is_empty());
        let Some(first) = words.next() else {
            return false;
        };
        if delim_class(first) != Some(DelimClass::Close) {
            return false;
        }
        words.all(|w| {
            matches!(delim_class(w), Some(DelimClass::Close | DelimClass::Middle))
        })
    }
}

/// Position of the first space-surrounded `Ta` in `rest`.
fn find_ta(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut at = 0;
    loop {
        let found = rest[at..].find("Ta")? + at;
        let before_ok = found == 0 || bytes[found - 1] == b' ';
        let after_ok = bytes.get(found + 2).is_none_or(|&c| c == b' ');
        if before_ok && after_ok {
            return Some(found);
        }
        at = found + 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manroff_diagnostics::MemorySink;
    use pretty_assertions::assert_eq;

    fn words(line: &str, profile: ArgsProfile) -> (Vec<ArgToken>, MemorySink) {
        let mut sink = MemorySink::new();
        let mut cursor = ArgCursor::new(line, 0, 1);
        let mut out = Vec::new();
        loop {
            let tok = cursor.next_arg(profile, &mut sink);
            let done = matches!(tok.flavor, ArgFlavor::EndOfLine | ArgFlavor::Punct);
            out.push(tok);
            if done {
                break;
            }
        }
        (out, sink)
    }

    #[test]
    fn splits_plain_words() {
        let (toks, _) = words("alpha beta", ArgsProfile::None);
        assert_eq!(toks[0], ArgToken::at(ArgFlavor::Word, "alpha", 0));
        assert_eq!(toks[1], ArgToken::at(ArgFlavor::Word, "beta", 6));
        assert_eq!(toks[2].flavor, ArgFlavor::EndOfLine);
    }

    #[test]
    fn escaped_space_does_not_split() {
        let (toks, _) = words("one\\ word next", ArgsProfile::None);
        assert_eq!(toks[0].word, "one\\ word");
        assert_eq!(toks[1].word, "next");
    }

    #[test]
    fn quoted_literal_with_doubled_quotes() {
        let (toks, _) = words("\"say \"\"hi\"\"\" tail", ArgsProfile::None);
        assert_eq!(toks[0], ArgToken::at(ArgFlavor::QuotedWord, "say \"hi\"", 0));
        assert_eq!(toks[1].word, "tail");
    }

    #[test]
    fn spaces_inside_quotes_are_kept() {
        let (toks, _) = words("\"two words\"", ArgsProfile::None);
        assert_eq!(toks[0].word, "two words");
    }

    #[test]
    fn unterminated_quote_warns_and_takes_rest() {
        let (toks, sink) = words("\"no close here", ArgsProfile::None);
        assert_eq!(toks[0], ArgToken::at(ArgFlavor::QuotedWord, "no close here", 0));
        assert!(sink.has(Code::UnterminatedQuote));
    }

    #[test]
    fn trailing_blank_after_word_warns() {
        let (_, sink) = words("word ", ArgsProfile::None);
        assert!(sink.has(Code::EolnWhitespace));
    }

    #[test]
    fn delim_profile_detects_trailing_punctuation() {
        let (toks, _) = words(") .", ArgsProfile::Delim);
        assert_eq!(toks[0].flavor, ArgFlavor::Punct);
    }

    #[test]
    fn delim_profile_rejects_leading_word() {
        let (toks, _) = words("word )", ArgsProfile::Delim);
        assert_eq!(toks[0].flavor, ArgFlavor::Word);
    }

    #[test]
    fn delim_profile_rejects_open_delimiter() {
        let (toks, _) = words("( )", ArgsProfile::Delim);
        assert_eq!(toks[0].flavor, ArgFlavor::Word);
    }

    #[test]
    fn tab_separated_phrases() {
        let (toks, _) = words("one\ttwo\tthree", ArgsProfile::TabSep);
        assert_eq!(toks[0], ArgToken::at(ArgFlavor::PartialPhrase, "one", 0));
        assert_eq!(toks[1], ArgToken::at(ArgFlavor::PartialPhrase, "two", 4));
        assert_eq!(toks[2], ArgToken::at(ArgFlavor::PhraseEnd, "three", 8));
    }

    #[test]
    fn ta_separated_phrases() {
        let (toks, _) = words("one Ta two", ArgsProfile::TabSep);
        assert_eq!(toks[0], ArgToken::at(ArgFlavor::Phrase, "one", 0));
        assert_eq!(toks[1], ArgToken::at(ArgFlavor::PhraseEnd, "two", 7));
    }

    #[test]
    fn ta_inside_word_is_not_a_separator() {
        let (toks, _) = words("DeltaTab\tx", ArgsProfile::TabSep);
        assert_eq!(toks[0].word, "DeltaTab");
    }

    #[test]
    fn phrase_trailing_blank_warns() {
        let (toks, sink) = words("one \ttwo ", ArgsProfile::TabSep);
        assert_eq!(toks[0].word, "one");
        assert!(sink.has(Code::EolnWhitespace));
    }
}
