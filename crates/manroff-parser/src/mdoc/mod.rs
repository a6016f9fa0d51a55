//! The structured-dialect parser.
//!
//! One [`MdocParser`] instance consumes the logical lines of a single
//! document. Each macro line is classified through the dispatch table
//! (`table`), tokenized by `manroff_argv`, and handled by its family
//! handler; scope is an explicit stack of open blocks. After end of
//! input the validation pass (`validate`) runs pre/post predicates over
//! the finished tree and completes the document metadata.

pub(crate) mod table;
pub(crate) mod validate;
pub(crate) mod width;

use manroff_argv::{ArgCursor, ArgFlavor, ArgsProfile, args_profile, parse_flags};
use manroff_ast::{
    ArgFlag, Mac, MdocMacro, NodeFlags, NodeId, NodeKind, Relation, Section, Tree, Volume,
};
use manroff_diagnostics::{Code, Diagnostic, DiagnosticSink};
use manroff_lexer::LogicalLine;
use tracing::trace;

use crate::ParseError;
use crate::config::ParseConfig;
use crate::date::{now_epoch, parse_date};
use crate::interp::interpolate;
use table::{Family, attr, callable, lookup};

/// One open block scope.
#[derive(Debug, Clone, Copy)]
struct Scope {
    mac: MdocMacro,
    block: NodeId,
    line: usize,
}

#[derive(Debug, Default)]
struct Prologue {
    dd: bool,
    dt: bool,
    os: bool,
}

/// Parser state for one structured-dialect document.
pub(crate) struct MdocParser<'a, S: DiagnosticSink> {
    cfg: &'a ParseConfig,
    sink: &'a mut S,
    pub(crate) tree: Tree,
    scopes: Vec<Scope>,
    prologue: Prologue,
    halted: bool,
    /// `Sm` spacing toggle; tracked for handlers, rendering-only.
    spacing_on: bool,
}

/// Parse pre-read logical lines as a structured-dialect document.
pub(crate) fn parse_mdoc<S: DiagnosticSink>(
    cfg: &ParseConfig,
    lines: &[LogicalLine],
    sink: &mut S,
) -> Result<Tree, ParseError> {
    let mut parser = MdocParser {
        cfg,
        sink,
        tree: Tree::new(),
        scopes: Vec::new(),
        prologue: Prologue::default(),
        halted: false,
        spacing_on: true,
    };
    for line in lines {
        parser.line(line);
        if parser.halted {
            parser.unwind();
            return Err(ParseError::Aborted);
        }
    }
    parser.finish()
}

impl<S: DiagnosticSink> MdocParser<'_, S> {
    fn report(&mut self, code: Code, line: usize, col: usize) {
        self.report_detail(code, line, col, None);
    }

    fn report_detail(&mut self, code: Code, line: usize, col: usize, detail: Option<String>) {
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

    /// Scope violations honour `ignore_scope_errors`.
    fn report_scope(&mut self, code: Code, line: usize, col: usize, detail: Option<String>) {
        if self.cfg.ignore_scope_errors {
            let mut d = Diagnostic::new(code, line, col);
            if let Some(detail) = detail {
                d = d.with_detail(detail);
            }
            self.sink.report(d);
            if self.sink.should_halt() {
                self.halted = true;
            }
        } else {
            self.report_detail(code, line, col, detail);
        }
    }

    fn cur_sec(&self) -> Section {
        self.tree.meta.last_seen_any
    }

    /// Whether a literal display is open (blank lines and tabs allowed).
    fn in_literal(&self) -> bool {
        self.scopes.iter().any(|s| {
            s.mac == MdocMacro::Bd
                && self.tree.node(s.block).args.as_ref().is_some_and(|args| {
                    let args = args.borrow();
                    args.has(ArgFlag::Literal) || args.has(ArgFlag::Unfilled)
                })
        })
    }

    /// Innermost list scope, if any, with its column-ness.
    fn innermost_list(&self) -> Option<(usize, bool)> {
        self.scopes.iter().rposition(|s| s.mac == MdocMacro::Bl).map(|i| {
            let is_column = self.tree.node(self.scopes[i].block).args.as_ref().is_some_and(
                |args| args.borrow().has(ArgFlag::Column),
            );
            (i, is_column)
        })
    }

    // ------------------------------------------------------------------
    // Line classification
    // ------------------------------------------------------------------

    fn line(&mut self, line: &LogicalLine) {
        let raw = line.text.as_str();
        if is_comment(raw) {
            return;
        }
        let text = interpolate(
            raw,
            line.number,
            self.cfg.ignore_unknown_escapes,
            self.sink,
        );
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
        if !self.prologue.os {
            self.report(Code::NoDocumentPrologue, number, 0);
            return;
        }
        let literal = self.in_literal();
        if text.trim().is_empty() {
            if literal {
                // A blank line in a literal display is preserved.
                self.push_text(" ".to_string(), number, 0);
            } else {
                self.report(Code::NoBlankLines, number, 0);
            }
            return;
        }
        if text.contains('\t') && !literal {
            self.report(Code::TabInNonLiteralContext, number, 0);
        }
        self.push_text(text.to_string(), number, 0);
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
        let Some(mac) = MdocMacro::from_name(name) else {
            if !self.cfg.ignore_unknown_macros {
                self.report_detail(Code::UnknownMacro, number, start, Some(name.to_string()));
            }
            return;
        };
        while bytes.get(pos) == Some(&b' ') {
            pos += 1;
        }
        trace!(line = number, mac = mac.name(), "dispatch");
        let mut cursor = ArgCursor::new(text, pos, number);
        self.run_macro(mac, &mut cursor, start);
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    fn run_macro(&mut self, mac: MdocMacro, cursor: &mut ArgCursor<'_>, col: usize) {
        if self.halted {
            return;
        }
        let row = lookup(mac);
        let line = cursor.line_no();

        if !self.prologue.os && row.family != Family::Prologue {
            self.report(Code::NoDocumentPrologue, line, col);
            return;
        }
        if self.prologue.os && row.family == Family::Prologue {
            self.report_detail(
                Code::MacroNotAllowedInBody,
                line,
                col,
                Some(mac.name().to_string()),
            );
            return;
        }

        match row.family {
            Family::Prologue => self.prologue_line(mac, cursor, col),
            Family::Layout => match mac {
                MdocMacro::Sh | MdocMacro::Ss => self.begin_section(mac, cursor, col),
                MdocMacro::It => self.begin_item(cursor, col),
                _ => self.begin_block(mac, cursor, col),
            },
            Family::Close => self.close_explicit(mac, cursor, col),
            Family::Text => self.elem_line(mac, cursor, col),
            Family::Ordered => self.ordered_line(mac, cursor, col),
            Family::PartialLine => self.partial_line(mac, cursor, col),
            Family::PartialExplicit => self.partial_explicit(mac, cursor, col),
            Family::Special => self.special_line(mac, cursor, col),
        }
    }

    // ------------------------------------------------------------------
    // Prologue
    // ------------------------------------------------------------------

    fn prologue_line(&mut self, mac: MdocMacro, cursor: &mut ArgCursor<'_>, col: usize) {
        let line = cursor.line_no();
        match mac {
            MdocMacro::Dd => {
                if self.prologue.dd {
                    self.report(Code::PrologueRepeated, line, col);
                }
                if self.prologue.dt || self.prologue.os {
                    self.report(Code::PrologueOutOfOrder, line, col);
                }
                let rest = cursor.rest().trim().to_string();
                self.tree.meta.date = if rest.is_empty() {
                    now_epoch()
                } else {
                    match parse_date(&rest) {
                        Some(epoch) => epoch,
                        None => {
                            self.report_detail(Code::BadDate, line, col, Some(rest));
                            now_epoch()
                        }
                    }
                };
                self.prologue.dd = true;
            }
            MdocMacro::Dt => {
                if self.prologue.dt {
                    self.report(Code::PrologueRepeated, line, col);
                }
                if !self.prologue.dd || self.prologue.os {
                    self.report(Code::PrologueOutOfOrder, line, col);
                }
                self.title_line(cursor, col);
                self.prologue.dt = true;
            }
            MdocMacro::Os => {
                if self.prologue.os {
                    self.report(Code::PrologueRepeated, line, col);
                }
                if !self.prologue.dt {
                    self.report(Code::PrologueOutOfOrder, line, col);
                }
                let rest = cursor.rest().trim();
                self.tree.meta.os = if rest.is_empty() {
                    self.cfg
                        .default_os
                        .clone()
                        .unwrap_or_else(|| std::env::consts::OS.to_string())
                } else {
                    rest.to_string()
                };
                self.prologue.os = true;
            }
            _ => unreachable!("prologue family covers Dd/Dt/Os"),
        }
    }

    fn title_line(&mut self, cursor: &mut ArgCursor<'_>, col: usize) {
        let line = cursor.line_no();
        let title = cursor.next_arg(ArgsProfile::None, self.sink);
        match title.flavor {
            ArgFlavor::Word | ArgFlavor::QuotedWord if !title.word.is_empty() => {
                if title.word.chars().any(|c| c.is_ascii_lowercase()) {
                    self.report_detail(
                        Code::TextShouldBeUppercase,
                        line,
                        title.pos,
                        Some(title.word.clone()),
                    );
                }
                self.tree.meta.title = title.word;
            }
            _ => {
                self.report(Code::NoTitle, line, col);
                self.tree.meta.title = "UNTITLED".to_string();
                return;
            }
        }

        let msec = cursor.next_arg(ArgsProfile::None, self.sink);
        if matches!(msec.flavor, ArgFlavor::Word | ArgFlavor::QuotedWord) {
            self.tree.meta.msec_raw = msec.word.clone();
            match manroff_ast::Msec::from_token(&msec.word) {
                Some(m) => self.tree.meta.msec = m,
                None => self.report_detail(
                    Code::UnknownManualSection,
                    line,
                    msec.pos,
                    Some(msec.word),
                ),
            }
        }

        // Third slot: a volume keyword or an architecture name.
        let third = cursor.next_arg(ArgsProfile::None, self.sink);
        if matches!(third.flavor, ArgFlavor::Word | ArgFlavor::QuotedWord) {
            match Volume::from_token(&third.word) {
                Some(vol) => self.tree.meta.vol = vol,
                None => self.tree.meta.arch = Some(third.word),
            }
        }
    }

    // ------------------------------------------------------------------
    // Scope mechanics
    // ------------------------------------------------------------------

    /// Close `scopes[from..]`, leaving the cursor ready for a sibling of
    /// the outermost closed block. Purely mechanical: diagnostics are
    /// the caller's job.
    fn close_scopes_from(&mut self, from: usize) {
        if from >= self.scopes.len() {
            return;
        }
        let outer = self.scopes[from].block;
        for scope in self.scopes.split_off(from).into_iter().rev() {
            self.tree.node_mut(scope.block).flags.set(NodeFlags::ENDED);
            trace!(mac = scope.mac.name(), "close scope");
        }
        self.tree.set_cursor(outer);
        self.tree.set_relation(Relation::Sibling);
    }

    fn is_explicit_scope(mac: MdocMacro) -> bool {
        let row = lookup(mac);
        row.pair.is_some()
            && matches!(row.family, Family::Layout | Family::PartialExplicit)
    }

    fn begin_section(&mut self, mac: MdocMacro, cursor: &mut ArgCursor<'_>, col: usize) {
        let line = cursor.line_no();
        // Rewind: a section closes everything, a subsection everything
        // below the enclosing section.
        let from = if mac == MdocMacro::Sh {
            0
        } else {
            self.scopes
                .iter()
                .rposition(|s| s.mac == MdocMacro::Sh)
                .map_or(0, |i| i + 1)
        };
        let broken: Vec<MdocMacro> = self.scopes[from..]
            .iter()
            .map(|s| s.mac)
            .filter(|&m| Self::is_explicit_scope(m))
            .collect();
        for victim in broken {
            let detail = format!("{} broken by {}", victim.name(), mac.name());
            self.report_scope(Code::BadNesting, line, col, Some(detail));
        }
        if self.halted {
            return;
        }
        self.close_scopes_from(from);

        // The heading itself: collect plain words for the title.
        let mut words: Vec<String> = Vec::new();
        loop {
            let tok = cursor.next_arg(ArgsProfile::None, self.sink);
            match tok.flavor {
                ArgFlavor::Word | ArgFlavor::QuotedWord if !tok.word.is_empty() => {
                    words.push(tok.word);
                }
                ArgFlavor::EndOfLine => break,
                _ => break,
            }
        }
        if words.is_empty() {
            self.report_detail(
                Code::MacroRequiresLineArg,
                line,
                col,
                Some(mac.name().to_string()),
            );
            return;
        }
        let title = words.join(" ");

        let sec = if mac == MdocMacro::Sh {
            let sec = Section::from_title(&title);
            self.tree.meta.last_seen_any = sec;
            if sec.is_named() {
                self.tree.meta.last_seen_named = sec;
            }
            sec
        } else {
            self.cur_sec()
        };

        let block = self.tree.push(NodeKind::Block, Mac::Mdoc(mac), line, col, sec);
        self.tree.push(NodeKind::Head, Mac::Mdoc(mac), line, col, sec);
        self.push_text(title, line, col);
        self.tree.set_cursor(block);
        self.tree.set_relation(Relation::Child);
        self.tree.push(NodeKind::Body, Mac::Mdoc(mac), line, col, sec);
        self.scopes.push(Scope { mac, block, line });
    }

    fn begin_block(&mut self, mac: MdocMacro, cursor: &mut ArgCursor<'_>, col: usize) {
        let line = cursor.line_no();
        if mac == MdocMacro::Bd
            && self.scopes.iter().any(|s| s.mac == MdocMacro::Bd)
        {
            self.report(Code::NestedDisplays, line, col);
            return;
        }
        let args = parse_flags(mac, cursor, self.sink);
        let sec = self.cur_sec();
        let block = self.tree.push(NodeKind::Block, Mac::Mdoc(mac), line, col, sec);
        if let Some(args) = args {
            self.tree.set_args(block, args.into_bundle());
        }
        self.tree.push(NodeKind::Body, Mac::Mdoc(mac), line, col, sec);
        self.scopes.push(Scope { mac, block, line });

        // Anything left on the line is noise.
        loop {
            let tok = cursor.next_arg(ArgsProfile::None, self.sink);
            match tok.flavor {
                ArgFlavor::Word | ArgFlavor::QuotedWord => {
                    self.report_detail(
                        Code::IgnoringArgument,
                        line,
                        tok.pos,
                        Some(tok.word),
                    );
                }
                _ => break,
            }
        }
    }

    fn begin_item(&mut self, cursor: &mut ArgCursor<'_>, col: usize) {
        let line = cursor.line_no();
        // Shallow: close a prior item, never the list around it.
        let Some((bl_idx, is_column)) = ({
            // Close any item scope above the nearest list first.
            if let Some(item) = self
                .scopes
                .iter()
                .rposition(|s| s.mac == MdocMacro::It)
            {
                let crossed_list = self.scopes[item..].iter().any(|s| s.mac == MdocMacro::Bl);
                if !crossed_list {
                    let broken: Vec<MdocMacro> = self.scopes[item + 1..]
                        .iter()
                        .map(|s| s.mac)
                        .filter(|&m| Self::is_explicit_scope(m))
                        .collect();
                    for victim in broken {
                        let detail = format!("{} broken by It", victim.name());
                        self.report_scope(Code::BadNesting, line, col, Some(detail));
                    }
                    self.close_scopes_from(item);
                }
            }
            self.innermost_list()
        }) else {
            self.report_detail(
                Code::ChildViolatesParent,
                line,
                col,
                Some("It has no enclosing Bl".to_string()),
            );
            return;
        };
        if self.halted {
            return;
        }

        let list_block = self.scopes[bl_idx].block;
        let tagged = self.tree.node(list_block).args.as_ref().is_some_and(|args| {
            let args = args.borrow();
            [ArgFlag::Tag, ArgFlag::Diag, ArgFlag::Hang, ArgFlag::Ohang, ArgFlag::Inset]
                .iter()
                .any(|&f| args.has(f))
        });

        let sec = self.cur_sec();
        let mac = MdocMacro::It;
        let block = self.tree.push(NodeKind::Block, Mac::Mdoc(mac), line, col, sec);

        if is_column {
            self.tree.push(NodeKind::Body, Mac::Mdoc(mac), line, col, sec);
            self.column_cells(cursor);
        } else if tagged {
            self.tree.push(NodeKind::Head, Mac::Mdoc(mac), line, col, sec);
            self.parse_inline_rest(cursor, ArgsProfile::None);
            self.tree.set_cursor(block);
            self.tree.set_relation(Relation::Child);
            self.tree.push(NodeKind::Body, Mac::Mdoc(mac), line, col, sec);
        } else {
            self.tree.push(NodeKind::Body, Mac::Mdoc(mac), line, col, sec);
            self.parse_inline_rest(cursor, ArgsProfile::None);
        }
        self.scopes.push(Scope { mac, block, line });
    }

    /// Cells of a columnated item line; each phrase is re-scanned for a
    /// leading callable macro.
    fn column_cells(&mut self, cursor: &mut ArgCursor<'_>) {
        let line = cursor.line_no();
        cursor.set_in_phrase(true);
        loop {
            let tok = cursor.next_arg(ArgsProfile::TabSep, self.sink);
            match tok.flavor {
                ArgFlavor::Phrase | ArgFlavor::PartialPhrase | ArgFlavor::PhraseEnd => {
                    if !tok.word.is_empty() {
                        let cell = tok.word.clone();
                        let mut sub = ArgCursor::new(&cell, 0, line);
                        self.parse_inline_rest(&mut sub, ArgsProfile::None);
                    }
                    if tok.flavor == ArgFlavor::PhraseEnd {
                        break;
                    }
                }
                _ => break,
            }
        }
        cursor.set_in_phrase(false);
    }

    fn close_explicit(&mut self, closer: MdocMacro, cursor: &mut ArgCursor<'_>, col: usize) {
        let line = cursor.line_no();
        let row = lookup(closer);
        let opener = row.pair.unwrap_or(closer);
        let Some(idx) = self.scopes.iter().rposition(|s| s.mac == opener) else {
            self.report_scope(
                Code::NoOpenScope,
                line,
                col,
                Some(closer.name().to_string()),
            );
            return;
        };
        let broken: Vec<MdocMacro> = self.scopes[idx + 1..]
            .iter()
            .map(|s| s.mac)
            .filter(|&m| Self::is_explicit_scope(m))
            .collect();
        for victim in broken {
            let detail = format!("{} broken by {}", victim.name(), closer.name());
            self.report_scope(Code::BadNesting, line, col, Some(detail));
        }
        if self.halted {
            return;
        }
        self.close_scopes_from(idx);

        // Callable closers may carry trailing content and punctuation.
        if row.flags & attr::CALLABLE != 0 {
            self.parse_inline_rest(cursor, ArgsProfile::Delim);
        } else {
            let tok = cursor.next_arg(ArgsProfile::None, self.sink);
            if matches!(tok.flavor, ArgFlavor::Word | ArgFlavor::QuotedWord) {
                self.report_detail(Code::IgnoringArgument, line, tok.pos, Some(tok.word));
            }
        }
    }

    // ------------------------------------------------------------------
    // Inline families
    // ------------------------------------------------------------------

    fn elem_line(&mut self, mac: MdocMacro, cursor: &mut ArgCursor<'_>, col: usize) {
        let row = lookup(mac);
        let line = cursor.line_no();
        let profile = args_profile(mac);
        let args = parse_flags(mac, cursor, self.sink);

        let elem = self.tree.push(NodeKind::Elem, Mac::Mdoc(mac), line, col, self.cur_sec());
        if let Some(args) = args {
            self.tree.set_args(elem, args.into_bundle());
        }

        let mut nchild = 0usize;
        let mut run: Option<(String, usize)> = None;
        loop {
            let tok = cursor.next_arg(profile, self.sink);
            match tok.flavor {
                ArgFlavor::EndOfLine => break,
                ArgFlavor::Punct => {
                    self.run_flush(&mut run, line);
                    self.close_node(elem);
                    self.emit_punct(cursor);
                    return;
                }
                ArgFlavor::Word => {
                    if row.flags & attr::PARSED != 0 {
                        if let Some(sub) = callable(&tok.word) {
                            self.run_flush(&mut run, line);
                            self.close_node(elem);
                            self.run_macro(sub, cursor, tok.pos);
                            return;
                        }
                    }
                    run_add(&mut run, &tok.word, tok.pos);
                    nchild += 1;
                }
                ArgFlavor::QuotedWord => {
                    self.run_flush(&mut run, line);
                    if !tok.word.is_empty() {
                        self.push_text(tok.word, line, tok.pos);
                        nchild += 1;
                    }
                }
                _ => break,
            }
        }

        self.run_flush(&mut run, line);
        self.close_node(elem);
        if nchild == 0 && row.flags & attr::EMPTY_OK == 0 {
            self.report_detail(Code::EmptyMacro, line, col, Some(mac.name().to_string()));
            self.tree.free_subtree(elem);
        }
    }

    fn ordered_line(&mut self, mac: MdocMacro, cursor: &mut ArgCursor<'_>, col: usize) {
        let row = lookup(mac);
        let line = cursor.line_no();
        let args = parse_flags(mac, cursor, self.sink);

        if mac == MdocMacro::St {
            // `St` carries its standard as a flag; the validator injects
            // the citation text.
            let Some(args) = args else {
                let word = cursor.next_arg(ArgsProfile::None, self.sink);
                self.report_detail(Code::BadStandard, line, col, Some(word.word));
                return;
            };
            let elem =
                self.tree.push(NodeKind::Elem, Mac::Mdoc(mac), line, col, self.cur_sec());
            self.tree.set_args(elem, args.into_bundle());
            self.close_node(elem);
            self.parse_inline_rest(cursor, args_profile(mac));
            return;
        }

        let elem = self.tree.push(NodeKind::Elem, Mac::Mdoc(mac), line, col, self.cur_sec());
        if let Some(args) = args {
            self.tree.set_args(elem, args.into_bundle());
        }

        if mac == MdocMacro::Pf {
            // The prefix word itself, then back to the parent context.
            let tok = cursor.next_arg(ArgsProfile::None, self.sink);
            if matches!(tok.flavor, ArgFlavor::Word | ArgFlavor::QuotedWord) {
                self.push_text(tok.word, line, tok.pos);
            } else {
                self.report_detail(Code::MacroRequiresArg, line, col, Some("Pf".into()));
            }
            self.close_node(elem);
            self.parse_inline_rest(cursor, ArgsProfile::None);
            return;
        }

        let max = row.arity_max as usize;
        let mut nchild = 0usize;
        loop {
            let tok = cursor.next_arg(args_profile(mac), self.sink);
            match tok.flavor {
                ArgFlavor::EndOfLine => break,
                ArgFlavor::Punct => {
                    self.close_node(elem);
                    self.emit_punct(cursor);
                    return;
                }
                ArgFlavor::Word | ArgFlavor::QuotedWord => {
                    if nchild >= max {
                        self.report_detail(
                            Code::ArgCountWrong,
                            line,
                            tok.pos,
                            Some(format!("{} takes at most {max}", mac.name())),
                        );
                        continue;
                    }
                    if !tok.word.is_empty() {
                        self.push_text(tok.word, line, tok.pos);
                        nchild += 1;
                    }
                }
                _ => break,
            }
        }
        self.close_node(elem);
        if nchild < row.arity_min as usize && row.flags & attr::EMPTY_OK == 0 {
            self.report_detail(
                Code::MacroRequiresArg,
                line,
                col,
                Some(mac.name().to_string()),
            );
            self.tree.free_subtree(elem);
        }
    }

    fn partial_line(&mut self, mac: MdocMacro, cursor: &mut ArgCursor<'_>, col: usize) {
        let line = cursor.line_no();
        let sec = self.cur_sec();
        let profile = args_profile(mac);
        let block = self.tree.push(NodeKind::Block, Mac::Mdoc(mac), line, col, sec);
        self.tree.push(NodeKind::Body, Mac::Mdoc(mac), line, col, sec);

        let mut run: Option<(String, usize)> = None;
        loop {
            if self.halted {
                return;
            }
            let tok = cursor.next_arg(profile, self.sink);
            match tok.flavor {
                ArgFlavor::EndOfLine => break,
                ArgFlavor::Punct => {
                    // Trailing punctuation lands outside the enclosure.
                    self.run_flush(&mut run, line);
                    self.tree.node_mut(block).flags.set(NodeFlags::ENDED);
                    self.close_node(block);
                    self.emit_punct(cursor);
                    return;
                }
                ArgFlavor::Word => {
                    if let Some(sub) = callable(&tok.word) {
                        self.run_flush(&mut run, line);
                        self.run_macro(sub, cursor, tok.pos);
                        break;
                    }
                    run_add(&mut run, &tok.word, tok.pos);
                }
                ArgFlavor::QuotedWord => {
                    self.run_flush(&mut run, line);
                    if !tok.word.is_empty() {
                        self.push_text(tok.word, line, tok.pos);
                    }
                }
                _ => break,
            }
        }
        self.run_flush(&mut run, line);
        self.tree.node_mut(block).flags.set(NodeFlags::ENDED);
        self.close_node(block);
    }

    fn partial_explicit(&mut self, mac: MdocMacro, cursor: &mut ArgCursor<'_>, col: usize) {
        let line = cursor.line_no();
        let sec = self.cur_sec();
        let block = self.tree.push(NodeKind::Block, Mac::Mdoc(mac), line, col, sec);

        match mac {
            MdocMacro::Fo | MdocMacro::Eo => {
                // Head carries the name (or opening delimiter).
                self.tree.push(NodeKind::Head, Mac::Mdoc(mac), line, col, sec);
                let tok = cursor.next_arg(ArgsProfile::None, self.sink);
                if matches!(tok.flavor, ArgFlavor::Word | ArgFlavor::QuotedWord)
                    && !tok.word.is_empty()
                {
                    self.push_text(tok.word, line, tok.pos);
                } else if mac == MdocMacro::Fo {
                    self.report_detail(Code::MacroRequiresArg, line, col, Some("Fo".into()));
                }
                let extra = cursor.next_arg(ArgsProfile::None, self.sink);
                if matches!(extra.flavor, ArgFlavor::Word | ArgFlavor::QuotedWord) {
                    self.report_detail(
                        Code::IgnoringArgument,
                        line,
                        extra.pos,
                        Some(extra.word),
                    );
                }
                self.tree.set_cursor(block);
                self.tree.set_relation(Relation::Child);
                self.tree.push(NodeKind::Body, Mac::Mdoc(mac), line, col, sec);
            }
            MdocMacro::Bf => {
                let args = parse_flags(mac, cursor, self.sink);
                let mut has_font = args.is_some();
                if let Some(args) = args {
                    self.tree.set_args(block, args.into_bundle());
                }
                self.tree.push(NodeKind::Body, Mac::Mdoc(mac), line, col, sec);
                // The font may also be named as a word (Em, Li, Sy).
                let save = cursor.pos;
                let tok = cursor.next_arg(ArgsProfile::None, self.sink);
                if matches!(tok.flavor, ArgFlavor::Word)
                    && matches!(tok.word.as_str(), "Em" | "Li" | "Sy")
                {
                    self.push_text(tok.word, line, tok.pos);
                    has_font = true;
                } else {
                    cursor.pos = save;
                }
                if !has_font {
                    self.report(Code::MissingFontType, line, col);
                }
            }
            MdocMacro::Bk => {
                let args = parse_flags(mac, cursor, self.sink);
                if let Some(args) = args {
                    self.tree.set_args(block, args.into_bundle());
                }
                self.tree.push(NodeKind::Body, Mac::Mdoc(mac), line, col, sec);
            }
            _ => {
                self.tree.push(NodeKind::Body, Mac::Mdoc(mac), line, col, sec);
            }
        }

        self.scopes.push(Scope { mac, block, line });
        // Content on the opening line itself.
        self.parse_inline_rest(cursor, ArgsProfile::None);
    }

    fn special_line(&mut self, mac: MdocMacro, cursor: &mut ArgCursor<'_>, col: usize) {
        let line = cursor.line_no();
        let sec = self.cur_sec();
        match mac {
            MdocMacro::Pp | MdocMacro::Lp | MdocMacro::Br => {
                let elem =
                    self.tree.push(NodeKind::Elem, Mac::Mdoc(mac), line, col, sec);
                let tok = cursor.next_arg(ArgsProfile::None, self.sink);
                if matches!(tok.flavor, ArgFlavor::Word | ArgFlavor::QuotedWord) {
                    self.report_detail(Code::IgnoringArgument, line, tok.pos, Some(tok.word));
                }
                self.close_node(elem);
            }
            MdocMacro::Sp => {
                let elem =
                    self.tree.push(NodeKind::Elem, Mac::Mdoc(mac), line, col, sec);
                let tok = cursor.next_arg(ArgsProfile::None, self.sink);
                if matches!(tok.flavor, ArgFlavor::Word) && !tok.word.is_empty() {
                    self.push_text(tok.word, line, tok.pos);
                }
                self.close_node(elem);
            }
            MdocMacro::Ns | MdocMacro::Ap => {
                let elem =
                    self.tree.push(NodeKind::Elem, Mac::Mdoc(mac), line, col, sec);
                self.close_node(elem);
                self.parse_inline_rest(cursor, ArgsProfile::None);
            }
            MdocMacro::Sm | MdocMacro::Db => {
                let elem =
                    self.tree.push(NodeKind::Elem, Mac::Mdoc(mac), line, col, sec);
                let tok = cursor.next_arg(ArgsProfile::None, self.sink);
                if matches!(tok.flavor, ArgFlavor::Word | ArgFlavor::QuotedWord) {
                    match tok.word.as_str() {
                        "on" => {
                            if mac == MdocMacro::Sm {
                                self.spacing_on = true;
                            }
                            self.push_text(tok.word, line, tok.pos);
                        }
                        "off" => {
                            if mac == MdocMacro::Sm {
                                self.spacing_on = false;
                            }
                            self.push_text(tok.word, line, tok.pos);
                        }
                        _ => {
                            self.report_detail(
                                Code::BadBoolean,
                                line,
                                tok.pos,
                                Some(tok.word),
                            );
                        }
                    }
                } else if mac == MdocMacro::Sm {
                    // Bare `Sm` toggles.
                    self.spacing_on = !self.spacing_on;
                }
                self.close_node(elem);
            }
            MdocMacro::Bt | MdocMacro::Ud => {
                let elem =
                    self.tree.push(NodeKind::Elem, Mac::Mdoc(mac), line, col, sec);
                let text = if mac == MdocMacro::Bt {
                    "is currently in beta test."
                } else {
                    "currently under development."
                };
                self.push_text(text.to_string(), line, col);
                self.close_node(elem);
            }
            MdocMacro::Ta => {
                let in_column = self.innermost_list().is_some_and(|(_, c)| c);
                if in_column {
                    let elem =
                        self.tree.push(NodeKind::Elem, Mac::Mdoc(mac), line, col, sec);
                    self.close_node(elem);
                    self.parse_inline_rest(cursor, ArgsProfile::None);
                } else {
                    self.report_detail(
                        Code::ChildViolatesParent,
                        line,
                        col,
                        Some("Ta outside column list".to_string()),
                    );
                }
            }
            _ => unreachable!("special family is closed"),
        }
    }

    // ------------------------------------------------------------------
    // Shared helpers
    // ------------------------------------------------------------------

    /// Generic inline content loop: words become text runs, callables
    /// dispatch, a trailing delimiter run becomes unstyled siblings.
    fn parse_inline_rest(&mut self, cursor: &mut ArgCursor<'_>, profile: ArgsProfile) {
        let line = cursor.line_no();
        let mut run: Option<(String, usize)> = None;
        loop {
            if self.halted {
                return;
            }
            let tok = cursor.next_arg(profile, self.sink);
            match tok.flavor {
                ArgFlavor::EndOfLine => break,
                ArgFlavor::Punct => {
                    self.run_flush(&mut run, line);
                    self.emit_punct(cursor);
                    return;
                }
                ArgFlavor::Word => {
                    if let Some(sub) = callable(&tok.word) {
                        self.run_flush(&mut run, line);
                        self.run_macro(sub, cursor, tok.pos);
                        return;
                    }
                    run_add(&mut run, &tok.word, tok.pos);
                }
                ArgFlavor::QuotedWord => {
                    self.run_flush(&mut run, line);
                    if !tok.word.is_empty() {
                        self.push_text(tok.word, line, tok.pos);
                    }
                }
                _ => break,
            }
        }
        self.run_flush(&mut run, line);
    }

    /// Flush an accumulated word run into one text node.
    fn run_flush(&mut self, run: &mut Option<(String, usize)>, line: usize) {
        if let Some((buf, col)) = run.take() {
            self.push_text(buf, line, col);
        }
    }

    /// Emit the remaining delimiter words as plain text siblings.
    fn emit_punct(&mut self, cursor: &mut ArgCursor<'_>) {
        let line = cursor.line_no();
        loop {
            let tok = cursor.next_arg(ArgsProfile::None, self.sink);
            match tok.flavor {
                ArgFlavor::Word | ArgFlavor::QuotedWord if !tok.word.is_empty() => {
                    self.push_text(tok.word, line, tok.pos);
                }
                _ => return,
            }
        }
    }

    /// Push a text node at the cursor and step to sibling insertion.
    fn push_text(&mut self, text: String, line: usize, col: usize) {
        debug_assert!(!text.is_empty());
        let eos = text.len() > 1 && text.ends_with(['.', '!', '?']);
        let sec = self.cur_sec();
        let id = self.tree.push_text(text, line, col, sec);
        if eos {
            self.tree.node_mut(id).flags.set(NodeFlags::EOS);
        }
        self.tree.set_relation(Relation::Sibling);
    }

    /// Close an inline node: next insertion is its sibling.
    fn close_node(&mut self, id: NodeId) {
        self.tree.set_cursor(id);
        self.tree.set_relation(Relation::Sibling);
    }

    // ------------------------------------------------------------------
    // End of input
    // ------------------------------------------------------------------

    fn finish(mut self) -> Result<Tree, ParseError> {
        // Explicit scopes must have been closed by their pair.
        let open: Vec<(MdocMacro, usize)> = self
            .scopes
            .iter()
            .filter(|s| Self::is_explicit_scope(s.mac))
            .map(|s| (s.mac, s.line))
            .collect();
        for (mac, line) in open {
            self.report_detail(
                Code::ScopeOpenOnExit,
                line,
                0,
                Some(mac.name().to_string()),
            );
        }
        self.close_scopes_from(0);
        if self.halted {
            self.unwind();
            return Err(ParseError::Aborted);
        }

        if !self.prologue.os || self.tree.node(self.tree.root()).nchild == 0 {
            self.report(Code::NoDocumentBody, 0, 0);
            self.unwind();
            return Err(ParseError::Aborted);
        }

        validate::run(&mut self);
        if self.halted {
            self.unwind();
            return Err(ParseError::Aborted);
        }
        Ok(self.tree)
    }

    /// Abort: free open scopes in reverse-open order.
    fn unwind(&mut self) {
        let scopes = std::mem::take(&mut self.scopes);
        for scope in scopes.into_iter().rev() {
            self.tree.free_subtree(scope.block);
        }
    }

    pub(crate) fn sink_report(
        &mut self,
        code: Code,
        line: usize,
        col: usize,
        detail: Option<String>,
    ) {
        self.report_detail(code, line, col, detail);
    }
}

/// Append a word to an accumulating text run.
fn run_add(run: &mut Option<(String, usize)>, word: &str, col: usize) {
    match run {
        Some((buf, _)) => {
            buf.push(' ');
            buf.push_str(word);
        }
        None => *run = Some((word.to_string(), col)),
    }
}

/// A control line whose first word is the comment escape.
fn is_comment(line: &str) -> bool {
    let Some(rest) = line.strip_prefix('.').or_else(|| line.strip_prefix('\'')) else {
        return false;
    };
    rest.trim_start().starts_with("\\\"")
}
