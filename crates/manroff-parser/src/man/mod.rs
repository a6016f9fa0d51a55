//! The presentation-dialect parser.
//!
//! The presentation vocabulary is flat: sections and paragraphs rather
//! than semantic markup, with next-line scope for section headings,
//! tagged paragraphs, and bare font macros. The parser keeps explicit
//! handles to the open section, paragraph, and indent scopes instead of
//! a sticky cursor.

use manroff_argv::{ArgCursor, ArgFlavor, ArgsProfile};
use manroff_ast::{Mac, ManMacro, Msec, NodeFlags, NodeId, NodeKind, Relation, Section, Tree};
use manroff_diagnostics::{Code, Diagnostic, DiagnosticSink};
use manroff_lexer::LogicalLine;
use tracing::trace;

use crate::ParseError;
use crate::config::ParseConfig;
use crate::date::{now_epoch, parse_date};
use crate::interp::interpolate;

/// What the next text line completes.
#[derive(Debug, Clone, Copy)]
enum Pending {
    /// Next line is the head of this block (`SH`/`SS`/`TP`).
    Head { block: NodeId, head: NodeId },
    /// Next line is the argument of a bare font macro.
    Font(NodeId),
}

struct ManParser<'a, S: DiagnosticSink> {
    cfg: &'a ParseConfig,
    sink: &'a mut S,
    tree: Tree,
    sh: Option<NodeId>,
    ss: Option<NodeId>,
    par: Option<NodeId>,
    rs_stack: Vec<(NodeId, usize)>,
    pending: Option<Pending>,
    literal: bool,
    th_seen: bool,
    halted: bool,
}

/// Parse pre-read logical lines as a presentation-dialect document.
pub(crate) fn parse_man<S: DiagnosticSink>(
    cfg: &ParseConfig,
    lines: &[LogicalLine],
    sink: &mut S,
) -> Result<Tree, ParseError> {
    let mut parser = ManParser {
        cfg,
        sink,
        tree: Tree::new(),
        sh: None,
        ss: None,
        par: None,
        rs_stack: Vec::new(),
        pending: None,
        literal: false,
        th_seen: false,
        halted: false,
    };
    for line in lines {
        parser.line(line);
        if parser.halted {
            return Err(ParseError::Aborted);
        }
    }
    parser.finish()
}

impl<S: DiagnosticSink> ManParser<'_, S> {
    fn report(&mut self, code: Code, line: usize, col: usize, detail: Option<String>) {
        let mut d = Diagnostic::new(code, line, col);
        if let Some(detail) = detail {
            d = d.with_detail(detail);
        }
        let severity = d.severity;
        self.sink.report(d);
        if severity >= self.cfg.fatal_level || self.sink.should_halt() {
            self.halted = true;
        }
    }

    fn cur_sec(&self) -> Section {
        self.tree.meta.last_seen_any
    }

    // ------------------------------------------------------------------
    // Insertion targets
    // ------------------------------------------------------------------

    /// The body new content belongs to, opening an unnamed section if
    /// content arrives before any heading.
    fn current_body(&mut self, line: usize) -> NodeId {
        if let Some(par) = self.par {
            if let Some(body) = self.tree.body_of(par) {
                return body;
            }
        }
        if let Some(&(rs, _)) = self.rs_stack.last() {
            if let Some(body) = self.tree.body_of(rs) {
                return body;
            }
        }
        for block in [self.ss, self.sh].into_iter().flatten() {
            if let Some(body) = self.tree.body_of(block) {
                return body;
            }
        }
        // Content before the first heading: an unnamed section.
        let sec = Section::Custom;
        self.tree.set_cursor(self.tree.root());
        self.tree.set_relation(Relation::Child);
        let block = self.tree.push(NodeKind::Block, Mac::Man(ManMacro::Sh), line, 0, sec);
        self.tree.push(NodeKind::Head, Mac::Man(ManMacro::Sh), line, 0, sec);
        self.tree.set_cursor(block);
        let body = self.tree.push(NodeKind::Body, Mac::Man(ManMacro::Sh), line, 0, sec);
        self.sh = Some(block);
        self.ss = None;
        body
    }

    fn push_at(&mut self, body: NodeId) {
        self.tree.set_cursor(body);
        self.tree.set_relation(Relation::Child);
    }

    fn push_text_in(&mut self, body: NodeId, text: String, line: usize, col: usize) {
        debug_assert!(!text.is_empty());
        self.push_at(body);
        let sec = self.cur_sec();
        let id = self.tree.push_text(text, line, col, sec);
        if self.tree.node(id).text.as_ref().is_some_and(|t| t.ends_with(['.', '!', '?'])) {
            self.tree.node_mut(id).flags.set(NodeFlags::EOS);
        }
    }

    // ------------------------------------------------------------------
    // Line classification
    // ------------------------------------------------------------------

    fn line(&mut self, line: &LogicalLine) {
        let raw = line.text.as_str();
        if is_comment(raw) {
            return;
        }
        let text = interpolate(raw, line.number, self.cfg.ignore_unknown_escapes, self.sink);
        if self.sink.should_halt() {
            self.halted = true;
            return;
        }
        if text.starts_with('.') || text.starts_with('\'') {
            self.macro_line(line.number, &text);
        } else {
            self.text_line(line.number, &text);
        }
    }

    fn text_line(&mut self, number: usize, text: &str) {
        if !self.th_seen {
            self.report(Code::NoDocumentPrologue, number, 0, None);
            return;
        }
        if text.trim().is_empty() {
            if self.literal {
                let body = self.current_body(number);
                self.push_text_in(body, " ".to_string(), number, 0);
            } else {
                self.report(Code::NoBlankLines, number, 0, None);
            }
            return;
        }

        match self.pending.take() {
            Some(Pending::Head { block, head }) => {
                self.push_at(head);
                self.tree.push_text(text.to_string(), number, 0, self.cur_sec());
                self.complete_head(block, number);
            }
            Some(Pending::Font(elem)) => {
                self.push_at(elem);
                let sec = self.cur_sec();
                self.tree.push_text(text.to_string(), number, 0, sec);
            }
            None => {
                let body = self.current_body(number);
                self.push_text_in(body, text.to_string(), number, 0);
            }
        }
    }

    fn macro_line(&mut self, number: usize, text: &str) {
        let bytes = text.as_bytes();
        let mut pos = 1;
        while bytes.get(pos) == Some(&b' ') {
            pos += 1;
        }
        let start = pos;
        while pos < bytes.len() && bytes[pos] != b' ' {
            pos += 1;
        }
        let name = &text[start..pos];
        if name.is_empty() {
            return;
        }
        let Some(mac) = ManMacro::from_name(name) else {
            if !self.cfg.ignore_unknown_macros {
                self.report(Code::UnknownMacro, number, start, Some(name.to_string()));
            }
            return;
        };
        while bytes.get(pos) == Some(&b' ') {
            pos += 1;
        }
        trace!(line = number, mac = mac.name(), "dispatch");

        // A structural macro abandons a pending head or font line.
        if matches!(mac, ManMacro::Th | ManMacro::Sh | ManMacro::Ss) {
            match self.pending.take() {
                Some(Pending::Head { block, .. }) => self.complete_head(block, number),
                other => self.pending = other,
            }
        }

        if !self.th_seen && mac != ManMacro::Th {
            self.report(Code::NoDocumentPrologue, number, start, None);
            return;
        }

        let mut cursor = ArgCursor::new(text, pos, number);
        self.run_macro(mac, &mut cursor, start);
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    fn run_macro(&mut self, mac: ManMacro, cursor: &mut ArgCursor<'_>, col: usize) {
        use ManMacro::*;
        match mac {
            Th => self.title_heading(cursor, col),
            Sh | Ss => self.section(mac, cursor, col),
            Tp => self.tagged_paragraph(cursor, col),
            Ip => self.indented_paragraph(cursor, col),
            Hp => self.hanging_paragraph(cursor, col),
            Lp | Pp | P => self.plain_paragraph(mac, cursor, col),
            Rs => self.begin_indent(cursor, col),
            Re => self.end_indent(cursor, col),
            Sm | Sb | B | I | R | Ital | Rom => self.font(mac, cursor, col),
            Bi | Ib | Br | Rb | Ir | Ri => self.alternating(mac, cursor, col),
            Nf => {
                self.literal = true;
                self.marker(mac, cursor, col);
            }
            Fi => {
                self.literal = false;
                self.marker(mac, cursor, col);
            }
            Uc => self.version(cursor, uc_version),
            At => self.version(cursor, at_version),
            Break | Sp | Na | Dt | Pd | Indent => self.marker(mac, cursor, col),
        }
    }

    fn title_heading(&mut self, cursor: &mut ArgCursor<'_>, col: usize) {
        let line = cursor.line_no();
        if self.th_seen {
            self.report(Code::PrologueRepeated, line, col, None);
        }
        let mut next = |p: &mut Self| {
            let tok = cursor.next_arg(ArgsProfile::None, p.sink);
            match tok.flavor {
                ArgFlavor::Word | ArgFlavor::QuotedWord => Some((tok.word, tok.pos)),
                _ => None,
            }
        };
        match next(self) {
            Some((title, _)) => self.tree.meta.title = title,
            None => {
                self.report(Code::NoTitle, line, col, None);
                self.tree.meta.title = "UNTITLED".to_string();
            }
        }
        if let Some((msec, pos)) = next(self) {
            self.tree.meta.msec_raw = msec.clone();
            match Msec::from_token(&msec) {
                Some(m) => self.tree.meta.msec = m,
                None => self.report(Code::UnknownManualSection, line, pos, Some(msec)),
            }
        }
        if let Some((date, pos)) = next(self) {
            self.tree.meta.date = match parse_date(&date) {
                Some(epoch) => epoch,
                None => {
                    self.report(Code::BadDate, line, pos, Some(date));
                    now_epoch()
                }
            };
        } else {
            self.tree.meta.date = now_epoch();
        }
        if let Some((source, _)) = next(self) {
            self.tree.meta.os = source;
        }
        self.th_seen = true;
    }

    fn open_section(
        &mut self,
        mac: ManMacro,
        line: usize,
        col: usize,
        title: Option<&str>,
    ) -> NodeId {
        let sec = title.map_or(Section::Custom, Section::from_title);
        self.tree.meta.last_seen_any = sec;
        if sec.is_named() {
            self.tree.meta.last_seen_named = sec;
        }
        self.tree.set_cursor(self.tree.root());
        self.tree.set_relation(Relation::Child);
        let block = self.tree.push(NodeKind::Block, Mac::Man(mac), line, col, sec);
        let head = self.tree.push(NodeKind::Head, Mac::Man(mac), line, col, sec);
        if let Some(title) = title {
            self.tree.push_text(title.to_string(), line, col, sec);
        }
        self.tree.set_cursor(block);
        self.tree.set_relation(Relation::Child);
        if title.is_some() {
            self.tree.push(NodeKind::Body, Mac::Man(mac), line, col, sec);
        } else {
            self.pending = Some(Pending::Head { block, head });
        }
        if mac == ManMacro::Sh {
            self.sh = Some(block);
            self.ss = None;
        } else {
            self.ss = Some(block);
        }
        block
    }

    fn complete_head(&mut self, block: NodeId, line: usize) {
        let mac = self.tree.node(block).mac.unwrap_or(Mac::Man(ManMacro::Sh));
        let is_section = matches!(mac, Mac::Man(ManMacro::Sh) | Mac::Man(ManMacro::Ss));
        let sec = if is_section {
            let title =
                self.tree.head_of(block).map(|h| self.tree.collect_text(h)).unwrap_or_default();
            Section::from_title(title.trim())
        } else {
            self.cur_sec()
        };
        if is_section {
            self.tree.meta.last_seen_any = sec;
            if sec.is_named() {
                self.tree.meta.last_seen_named = sec;
            }
            self.tree.node_mut(block).sec = sec;
        }
        self.tree.set_cursor(block);
        self.tree.set_relation(Relation::Child);
        self.tree.push(NodeKind::Body, mac, line, 0, sec);
        match mac {
            Mac::Man(ManMacro::Tp) => self.par = Some(block),
            Mac::Man(ManMacro::Sh) => {
                self.sh = Some(block);
                self.ss = None;
            }
            Mac::Man(ManMacro::Ss) => self.ss = Some(block),
            _ => {}
        }
    }

    fn close_paragraph(&mut self) {
        if let Some(par) = self.par.take() {
            self.tree.node_mut(par).flags.set(NodeFlags::ENDED);
        }
    }

    fn close_indents(&mut self, line: usize) {
        let stack = std::mem::take(&mut self.rs_stack);
        for (block, opened) in stack.into_iter().rev() {
            self.report(
                Code::BadNesting,
                line,
                0,
                Some(format!("RS at line {opened} closed by section boundary")),
            );
            self.tree.node_mut(block).flags.set(NodeFlags::ENDED);
        }
    }

    fn section(&mut self, mac: ManMacro, cursor: &mut ArgCursor<'_>, col: usize) {
        let line = cursor.line_no();
        self.close_paragraph();
        self.close_indents(line);
        if self.halted {
            return;
        }
        if mac == ManMacro::Sh {
            if let Some(sh) = self.sh.take() {
                self.tree.node_mut(sh).flags.set(NodeFlags::ENDED);
            }
            if let Some(ss) = self.ss.take() {
                self.tree.node_mut(ss).flags.set(NodeFlags::ENDED);
            }
        } else if let Some(ss) = self.ss.take() {
            self.tree.node_mut(ss).flags.set(NodeFlags::ENDED);
        }

        let words = collect_words(cursor, self.sink);
        if words.is_empty() {
            self.open_section(mac, line, col, None);
        } else {
            self.open_section(mac, line, col, Some(&words.join(" ")));
        }
    }

    fn tagged_paragraph(&mut self, cursor: &mut ArgCursor<'_>, col: usize) {
        let line = cursor.line_no();
        self.close_paragraph();
        // An optional numeric argument sets the indent; the tag itself
        // is the next line.
        let tok = cursor.next_arg(ArgsProfile::None, self.sink);
        let body = self.current_body(line);
        self.push_at(body);
        let sec = self.cur_sec();
        let block = self.tree.push(NodeKind::Block, Mac::Man(ManMacro::Tp), line, col, sec);
        let head = self.tree.push(NodeKind::Head, Mac::Man(ManMacro::Tp), line, col, sec);
        if matches!(tok.flavor, ArgFlavor::Word) && !tok.word.is_empty() {
            // Indent argument, kept on the head for renderers.
            self.push_at(head);
            self.tree.push_text(tok.word, line, tok.pos, sec);
        }
        self.pending = Some(Pending::Head { block, head });
    }

    fn indented_paragraph(&mut self, cursor: &mut ArgCursor<'_>, col: usize) {
        let line = cursor.line_no();
        self.close_paragraph();
        let body = self.current_body(line);
        self.push_at(body);
        let sec = self.cur_sec();
        let block = self.tree.push(NodeKind::Block, Mac::Man(ManMacro::Ip), line, col, sec);
        self.tree.push(NodeKind::Head, Mac::Man(ManMacro::Ip), line, col, sec);
        let tag = cursor.next_arg(ArgsProfile::None, self.sink);
        if matches!(tag.flavor, ArgFlavor::Word | ArgFlavor::QuotedWord) && !tag.word.is_empty()
        {
            self.tree.push_text(tag.word, line, tag.pos, sec);
        }
        self.tree.set_cursor(block);
        self.tree.set_relation(Relation::Child);
        self.tree.push(NodeKind::Body, Mac::Man(ManMacro::Ip), line, col, sec);
        self.par = Some(block);
    }

    fn hanging_paragraph(&mut self, cursor: &mut ArgCursor<'_>, col: usize) {
        let line = cursor.line_no();
        self.close_paragraph();
        let body = self.current_body(line);
        self.push_at(body);
        let sec = self.cur_sec();
        let block = self.tree.push(NodeKind::Block, Mac::Man(ManMacro::Hp), line, col, sec);
        self.tree.push(NodeKind::Body, Mac::Man(ManMacro::Hp), line, col, sec);
        self.par = Some(block);
    }

    fn plain_paragraph(&mut self, mac: ManMacro, cursor: &mut ArgCursor<'_>, col: usize) {
        let line = cursor.line_no();
        self.close_paragraph();
        let tok = cursor.next_arg(ArgsProfile::None, self.sink);
        if matches!(tok.flavor, ArgFlavor::Word | ArgFlavor::QuotedWord) {
            self.report(Code::IgnoringArgument, line, tok.pos, Some(tok.word));
        }
        let body = self.current_body(line);
        self.push_at(body);
        self.tree.push(NodeKind::Elem, Mac::Man(mac), line, col, self.cur_sec());
    }

    fn begin_indent(&mut self, cursor: &mut ArgCursor<'_>, col: usize) {
        let line = cursor.line_no();
        let body = self.current_body(line);
        self.push_at(body);
        let sec = self.cur_sec();
        let block = self.tree.push(NodeKind::Block, Mac::Man(ManMacro::Rs), line, col, sec);
        let tok = cursor.next_arg(ArgsProfile::None, self.sink);
        if matches!(tok.flavor, ArgFlavor::Word) && !tok.word.is_empty() {
            self.tree.push(NodeKind::Head, Mac::Man(ManMacro::Rs), line, col, sec);
            self.tree.push_text(tok.word, line, tok.pos, sec);
            self.tree.set_cursor(block);
            self.tree.set_relation(Relation::Child);
        }
        self.tree.push(NodeKind::Body, Mac::Man(ManMacro::Rs), line, col, sec);
        self.rs_stack.push((block, line));
        // Paragraph scope does not survive into the indent.
        self.close_paragraph();
    }

    fn end_indent(&mut self, cursor: &mut ArgCursor<'_>, col: usize) {
        let line = cursor.line_no();
        self.close_paragraph();
        match self.rs_stack.pop() {
            Some((block, _)) => {
                self.tree.node_mut(block).flags.set(NodeFlags::ENDED);
            }
            None => {
                let code = Code::NoOpenScope;
                if self.cfg.ignore_scope_errors {
                    self.sink.report(
                        Diagnostic::new(code, line, col).with_detail("RE".to_string()),
                    );
                } else {
                    self.report(code, line, col, Some("RE".to_string()));
                }
            }
        }
    }

    fn font(&mut self, mac: ManMacro, cursor: &mut ArgCursor<'_>, col: usize) {
        let line = cursor.line_no();
        let words = collect_words(cursor, self.sink);
        let (target, pending_block) = match self.pending.take() {
            Some(Pending::Head { block, head }) => (head, Some(block)),
            other => {
                self.pending = other;
                (self.current_body(line), None)
            }
        };
        self.push_at(target);
        let sec = self.cur_sec();
        let elem = self.tree.push(NodeKind::Elem, Mac::Man(mac), line, col, sec);
        if words.is_empty() && pending_block.is_none() {
            // Bare font macro styles the following line.
            self.pending = Some(Pending::Font(elem));
        } else if !words.is_empty() {
            self.tree.push_text(words.join(" "), line, col, sec);
        }
        if let Some(block) = pending_block {
            self.complete_head(block, line);
        }
    }

    fn alternating(&mut self, mac: ManMacro, cursor: &mut ArgCursor<'_>, col: usize) {
        let line = cursor.line_no();
        let words = collect_words(cursor, self.sink);
        if words.is_empty() {
            self.report(Code::EmptyMacro, line, col, Some(mac.name().to_string()));
            return;
        }
        let (target, pending_block) = match self.pending.take() {
            Some(Pending::Head { block, head }) => (head, Some(block)),
            other => {
                self.pending = other;
                (self.current_body(line), None)
            }
        };
        self.push_at(target);
        let sec = self.cur_sec();
        let elem = self.tree.push(NodeKind::Elem, Mac::Man(mac), line, col, sec);
        // Alternation is per word; each word is its own child.
        for word in words {
            self.push_at(elem);
            self.tree.push_text(word, line, col, sec);
        }
        if let Some(block) = pending_block {
            self.complete_head(block, line);
        }
    }

    fn marker(&mut self, mac: ManMacro, cursor: &mut ArgCursor<'_>, col: usize) {
        let line = cursor.line_no();
        let body = self.current_body(line);
        self.push_at(body);
        let sec = self.cur_sec();
        let elem = self.tree.push(NodeKind::Elem, Mac::Man(mac), line, col, sec);
        let tok = cursor.next_arg(ArgsProfile::None, self.sink);
        if matches!(tok.flavor, ArgFlavor::Word) && !tok.word.is_empty() {
            self.push_at(elem);
            self.tree.push_text(tok.word, line, tok.pos, sec);
        }
    }

    fn version(&mut self, cursor: &mut ArgCursor<'_>, table: fn(Option<&str>) -> &'static str) {
        let tok = cursor.next_arg(ArgsProfile::None, self.sink);
        let arg = match tok.flavor {
            ArgFlavor::Word | ArgFlavor::QuotedWord => Some(tok.word),
            _ => None,
        };
        self.tree.meta.os = table(arg.as_deref()).to_string();
    }

    // ------------------------------------------------------------------
    // End of input
    // ------------------------------------------------------------------

    fn finish(mut self) -> Result<Tree, ParseError> {
        if let Some(Pending::Head { block, .. }) = self.pending.take() {
            self.complete_head(block, 0);
        }
        let open: Vec<usize> = self.rs_stack.iter().map(|&(_, line)| line).collect();
        for line in open {
            self.report(Code::ScopeOpenOnExit, line, 0, Some("RS".to_string()));
        }
        if self.halted {
            return Err(ParseError::Aborted);
        }
        if !self.th_seen || self.tree.node(self.tree.root()).nchild == 0 {
            self.report(Code::NoDocumentBody, 0, 0, None);
            return Err(ParseError::Aborted);
        }
        Ok(self.tree)
    }
}

fn collect_words<S: DiagnosticSink>(cursor: &mut ArgCursor<'_>, sink: &mut S) -> Vec<String> {
    let mut words = Vec::new();
    loop {
        let tok = cursor.next_arg(ArgsProfile::None, sink);
        match tok.flavor {
            ArgFlavor::Word | ArgFlavor::QuotedWord if !tok.word.is_empty() => {
                words.push(tok.word);
            }
            ArgFlavor::QuotedWord => {}
            _ => break,
        }
    }
    words
}

fn uc_version(arg: Option<&str>) -> &'static str {
    match arg {
        Some("3") => "3rd Berkeley Distribution",
        Some("4") => "4th Berkeley Distribution",
        Some("5") => "4.2 Berkeley Distribution",
        Some("6") => "4.3 Berkeley Distribution",
        Some("7") => "4.4 Berkeley Distribution",
        _ => "BSD",
    }
}

fn at_version(arg: Option<&str>) -> &'static str {
    match arg {
        Some("3") => "7th Edition",
        Some("4") => "System III",
        Some("5") => "System V",
        _ => "7th Edition",
    }
}

fn is_comment(line: &str) -> bool {
    let Some(rest) = line.strip_prefix('.').or_else(|| line.strip_prefix('\'')) else {
        return false;
    };
    rest.trim_start().starts_with("\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use manroff_diagnostics::MemorySink;

    fn lines(src: &[&str]) -> Vec<LogicalLine> {
        src.iter()
            .enumerate()
            .map(|(i, text)| LogicalLine { number: i + 1, text: (*text).to_string() })
            .collect()
    }

    fn parse(src: &[&str]) -> (Tree, MemorySink) {
        let mut sink = MemorySink::new();
        let cfg = ParseConfig::default();
        let tree = parse_man(&cfg, &lines(src), &mut sink).unwrap();
        (tree, sink)
    }

    #[test]
    fn title_heading_fills_metadata() {
        let (tree, _) =
            parse(&[".TH GREP 1 \"January 1, 2020\" \"util suite\"", ".SH NAME", "grep text"]);
        assert_eq!(tree.meta.title, "GREP");
        assert_eq!(tree.meta.msec, Msec::S1);
        assert_eq!(tree.meta.os, "util suite");
        tree.check_consistency().unwrap();
    }

    #[test]
    fn heading_on_next_line() {
        let (tree, _) = parse(&[".TH X 1", ".SH", "NAME", "x - a thing"]);
        let root = tree.root();
        let sh = tree.children(root).next().unwrap();
        let head = tree.head_of(sh).unwrap();
        assert_eq!(tree.collect_text(head), "NAME");
        assert_eq!(tree.node(sh).sec, Section::Name);
        tree.check_consistency().unwrap();
    }

    #[test]
    fn tagged_paragraph_takes_next_line_tag() {
        let (tree, _) = parse(&[
            ".TH X 1",
            ".SH DESCRIPTION",
            ".TP",
            "tag line",
            "body text here",
        ]);
        let root = tree.root();
        let sh = tree.children(root).next().unwrap();
        let body = tree.body_of(sh).unwrap();
        let tp = tree.children(body).next().unwrap();
        let head = tree.head_of(tp).unwrap();
        assert_eq!(tree.collect_text(head), "tag line");
        let tp_body = tree.body_of(tp).unwrap();
        assert_eq!(tree.collect_text(tp_body), "body text here");
        tree.check_consistency().unwrap();
    }

    #[test]
    fn re_without_rs_is_a_scope_error() {
        let mut sink = MemorySink::new();
        let cfg = ParseConfig::default();
        let result = parse_man(&cfg, &lines(&[".TH X 1", ".SH NAME", ".RE"]), &mut sink);
        assert!(result.is_err() || sink.has(Code::NoOpenScope));
        assert!(sink.has(Code::NoOpenScope));
    }

    #[test]
    fn unclosed_rs_is_fatal_at_eof() {
        let mut sink = MemorySink::new();
        let cfg = ParseConfig::default();
        let result =
            parse_man(&cfg, &lines(&[".TH X 1", ".SH NAME", ".RS", "indented"]), &mut sink);
        assert!(result.is_err());
        assert!(sink.has(Code::ScopeOpenOnExit));
    }

    #[test]
    fn no_title_heading_is_fatal() {
        let mut sink = MemorySink::new();
        let cfg = ParseConfig::default();
        let result = parse_man(&cfg, &lines(&["plain text"]), &mut sink);
        assert!(result.is_err());
        assert!(sink.has(Code::NoDocumentPrologue) || sink.has(Code::NoDocumentBody));
    }

    #[test]
    fn bare_font_macro_styles_next_line() {
        let (tree, _) = parse(&[".TH X 1", ".SH NAME", ".B", "bold words"]);
        let root = tree.root();
        let sh = tree.children(root).next().unwrap();
        let body = tree.body_of(sh).unwrap();
        let b = tree.children(body).next().unwrap();
        assert_eq!(tree.node(b).kind, NodeKind::Elem);
        assert_eq!(tree.collect_text(b), "bold words");
        tree.check_consistency().unwrap();
    }
}
