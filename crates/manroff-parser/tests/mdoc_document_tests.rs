#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! End-to-end structured-dialect parsing scenarios.

use manroff_ast::{ArgFlag, Mac, MdocMacro, NodeId, NodeKind, Section, Tree};
use manroff_diagnostics::{Code, MemorySink, Severity};
use manroff_parser::{Dialect, ParseConfig, Parser};
use pretty_assertions::assert_eq;

const MINIMAL: &str = "\
.Dd Jan 1, 2020
.Dt TEST 1
.Os
.Sh NAME
.Nm test
.Nd a thing
";

fn parse(source: &str) -> (Tree, MemorySink) {
    let mut sink = MemorySink::new();
    let doc = Parser::new(ParseConfig::default())
        .parse_str("test.1", source, &mut sink)
        .unwrap_or_else(|e| panic!("parse failed: {e}: {:?}", sink.diagnostics()));
    (doc.tree, sink)
}

fn parse_err(source: &str) -> MemorySink {
    let mut sink = MemorySink::new();
    let result = Parser::new(ParseConfig::default()).parse_str("test.1", source, &mut sink);
    assert!(result.is_err(), "expected failure, diagnostics: {:?}", sink.diagnostics());
    sink
}

fn section_blocks(tree: &Tree) -> Vec<NodeId> {
    tree.children(tree.root())
        .filter(|&id| tree.node(id).mac == Some(Mac::Mdoc(MdocMacro::Sh)))
        .collect()
}

#[test]
fn minimal_document() {
    let (tree, sink) = parse(MINIMAL);
    assert_eq!(sink.worst(), Severity::Ok, "{:?}", sink.diagnostics());

    // Metadata: 2020-01-01, TEST, section 1.
    assert_eq!(tree.meta.date, 1_577_836_800);
    assert_eq!(tree.meta.title, "TEST");
    assert_eq!(tree.meta.msec, manroff_ast::Msec::S1);
    assert_eq!(tree.meta.name.as_deref(), Some("test"));

    // Root -> Block(Sh) with head "NAME" and two elems in the body.
    let sections = section_blocks(&tree);
    assert_eq!(sections.len(), 1);
    let sh = sections[0];
    assert_eq!(tree.node(sh).sec, Section::Name);
    let head = tree.head_of(sh).unwrap();
    assert_eq!(tree.collect_text(head), "NAME");

    let body = tree.body_of(sh).unwrap();
    let elems: Vec<_> = tree.children(body).collect();
    assert_eq!(elems.len(), 2);
    assert_eq!(tree.node(elems[0]).mac, Some(Mac::Mdoc(MdocMacro::Nm)));
    assert_eq!(tree.collect_text(elems[0]), "test");
    assert_eq!(tree.node(elems[1]).mac, Some(Mac::Mdoc(MdocMacro::Nd)));
    assert_eq!(tree.collect_text(elems[1]), "a thing");
    // The description is a single text leaf.
    assert_eq!(tree.node(elems[1]).nchild, 1);

    tree.check_consistency().unwrap();
}

#[test]
fn implicit_end_section() {
    let source = format!("{MINIMAL}.Sh DESCRIPTION\nbody text.\n");
    let (tree, sink) = parse(&source);
    assert_eq!(sink.worst(), Severity::Ok, "{:?}", sink.diagnostics());

    let sections = section_blocks(&tree);
    assert_eq!(sections.len(), 2);
    assert_eq!(tree.node(sections[0]).next, Some(sections[1]));
    assert_eq!(tree.node(sections[1]).sec, Section::Description);

    let body = tree.body_of(sections[1]).unwrap();
    assert_eq!(tree.collect_text(body), "body text.");
    tree.check_consistency().unwrap();
}

#[test]
fn explicit_end_list() {
    let source = format!("{MINIMAL}.Sh DESCRIPTION\n.Bl -bullet\n.It first\n.It second\n.El\n");
    let (tree, _) = parse(&source);

    let sections = section_blocks(&tree);
    let body = tree.body_of(sections[1]).unwrap();
    let bl = tree
        .children(body)
        .find(|&id| tree.node(id).mac == Some(Mac::Mdoc(MdocMacro::Bl)))
        .unwrap();
    let list_body = tree.body_of(bl).unwrap();
    let items: Vec<_> = tree.children(list_body).collect();
    assert_eq!(items.len(), 2);
    for item in &items {
        assert_eq!(tree.node(*item).kind, NodeKind::Block);
        assert_eq!(tree.node(*item).mac, Some(Mac::Mdoc(MdocMacro::It)));
    }
    assert_eq!(tree.collect_text(items[0]), "first");
    assert_eq!(tree.collect_text(items[1]), "second");
    tree.check_consistency().unwrap();
}

#[test]
fn unclosed_list_is_fatal() {
    let source = format!("{MINIMAL}.Sh DESCRIPTION\n.Bl -bullet\n.It first\n");
    let sink = parse_err(&source);
    assert!(sink.has(Code::ScopeOpenOnExit));
    assert_eq!(sink.worst(), Severity::Fatal);
}

#[test]
fn tagged_list_auto_injects_width() {
    let source = format!("{MINIMAL}.Sh DESCRIPTION\n.Bl -tag\n.It Fl flag\nexplanation.\n.El\n");
    let (tree, sink) = parse(&source);
    assert!(sink.has(Code::MissingWidthArg));

    let sections = section_blocks(&tree);
    let body = tree.body_of(sections[1]).unwrap();
    let bl = tree
        .children(body)
        .find(|&id| tree.node(id).mac == Some(Mac::Mdoc(MdocMacro::Bl)))
        .unwrap();
    let args = tree.node(bl).args.clone().unwrap();
    let args = args.borrow();
    let width = args.find(ArgFlag::Width).expect("width injected");
    // Computed from the canonical width of `Fl`.
    assert_eq!(width.values, vec!["10n".to_string()]);
    tree.check_consistency().unwrap();
}

#[test]
fn width_argument_is_normalized() {
    let source = format!("{MINIMAL}.Sh DESCRIPTION\n.Bl -tag -width Ds\n.It one\ntext.\n.El\n");
    let (tree, _) = parse(&source);
    let sections = section_blocks(&tree);
    let body = tree.body_of(sections[1]).unwrap();
    let bl = tree
        .children(body)
        .find(|&id| tree.node(id).mac == Some(Mac::Mdoc(MdocMacro::Bl)))
        .unwrap();
    let args = tree.node(bl).args.clone().unwrap();
    let args = args.borrow();
    // "Ds" is no macro; its measured length (2 + 1) is used.
    assert_eq!(args.find(ArgFlag::Width).unwrap().values, vec!["3n".to_string()]);
}

#[test]
fn item_outside_list_is_an_error() {
    let source = format!("{MINIMAL}.Sh DESCRIPTION\n.It stray\n");
    let (_, sink) = parse(&source);
    assert!(sink.has(Code::ChildViolatesParent));
    assert_eq!(sink.worst(), Severity::Error);
}

#[test]
fn empty_input_is_fatal() {
    let mut sink = MemorySink::new();
    let cfg = ParseConfig { dialect: Dialect::Mdoc, ..ParseConfig::default() };
    let result = Parser::new(cfg).parse_str("empty.1", "", &mut sink);
    assert!(result.is_err());
    assert!(sink.has(Code::NoDocumentBody));
}

#[test]
fn prologue_only_input_is_fatal() {
    let sink = parse_err(".Dd Jan 1, 2020\n.Dt TEST 1\n.Os\n");
    assert!(sink.has(Code::NoDocumentBody));
}

#[test]
fn prologue_nodes_do_not_remain_in_the_tree() {
    let (tree, _) = parse(MINIMAL);
    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        let mac = tree.node(id).mac;
        assert!(
            !matches!(
                mac,
                Some(Mac::Mdoc(MdocMacro::Dd | MdocMacro::Dt | MdocMacro::Os))
            ),
            "prologue node survived validation"
        );
        stack.extend(tree.children(id));
    }
}

#[test]
fn repeated_prologue_warns() {
    let source = ".Dd Jan 1, 2020\n.Dd Jan 2, 2020\n.Dt TEST 1\n.Os\n.Sh NAME\n.Nm t\n.Nd x\n";
    let (_, sink) = parse(source);
    assert!(sink.has(Code::PrologueRepeated));
}

#[test]
fn out_of_order_prologue_warns() {
    let source = ".Dt TEST 1\n.Dd Jan 1, 2020\n.Os\n.Sh NAME\n.Nm t\n.Nd x\n";
    let (_, sink) = parse(source);
    assert!(sink.has(Code::PrologueOutOfOrder));
}

#[test]
fn unterminated_quote_warns_and_recovers() {
    let source = format!("{MINIMAL}.Sh DESCRIPTION\n.Nm \"unterminated name\n");
    let (tree, sink) = parse(&source);
    assert!(sink.has(Code::UnterminatedQuote));
    let sections = section_blocks(&tree);
    let body = tree.body_of(sections[1]).unwrap();
    let nm = tree.children(body).next().unwrap();
    assert_eq!(tree.collect_text(nm), "unterminated name");
}

#[test]
fn over_long_macro_line_is_fatal() {
    let long = "x".repeat(200);
    let source = format!("{MINIMAL}.Sh DESCRIPTION\n{long}\n");
    let mut sink = MemorySink::new();
    let cfg = ParseConfig { max_line_length: 128, ..ParseConfig::default() };
    let result = Parser::new(cfg).parse_str("test.1", &source, &mut sink);
    assert!(result.is_err());
    assert!(sink.has(Code::LineTooLong));
}

#[test]
fn unknown_macro_is_an_error_and_is_consumed() {
    let source = format!("{MINIMAL}.Sh DESCRIPTION\n.Zz what\nreal text.\n");
    let (tree, sink) = parse(&source);
    assert!(sink.has(Code::UnknownMacro));
    let sections = section_blocks(&tree);
    let body = tree.body_of(sections[1]).unwrap();
    assert_eq!(tree.collect_text(body), "real text.");
}

#[test]
fn unknown_macro_can_be_ignored() {
    let source = format!("{MINIMAL}.Sh DESCRIPTION\n.Zz what\nreal text.\n");
    let mut sink = MemorySink::new();
    let cfg = ParseConfig { ignore_unknown_macros: true, ..ParseConfig::default() };
    Parser::new(cfg).parse_str("test.1", &source, &mut sink).unwrap();
    assert!(!sink.has(Code::UnknownMacro));
}

#[test]
fn nested_macros_become_siblings_inside_enclosure() {
    let source = format!("{MINIMAL}.Sh SYNOPSIS\n.Op Fl a Ar file\n");
    let (tree, _) = parse(&source);
    let sections = section_blocks(&tree);
    let body = tree.body_of(sections[1]).unwrap();
    let op = tree.children(body).next().unwrap();
    assert_eq!(tree.node(op).mac, Some(Mac::Mdoc(MdocMacro::Op)));
    assert_eq!(tree.node(op).kind, NodeKind::Block);

    let op_body = tree.body_of(op).unwrap();
    let inner: Vec<_> = tree.children(op_body).collect();
    assert_eq!(tree.node(inner[0]).mac, Some(Mac::Mdoc(MdocMacro::Fl)));
    assert_eq!(tree.collect_text(inner[0]), "a");
    assert_eq!(tree.node(inner[1]).mac, Some(Mac::Mdoc(MdocMacro::Ar)));
    assert_eq!(tree.collect_text(inner[1]), "file");
    tree.check_consistency().unwrap();
}

#[test]
fn trailing_punctuation_lands_outside_the_elem() {
    let source = format!("{MINIMAL}.Sh SEE ALSO\n.Xr cat 1 .\n");
    let (tree, sink) = parse(&source);
    assert_eq!(sink.worst(), Severity::Ok, "{:?}", sink.diagnostics());
    let sections = section_blocks(&tree);
    let body = tree.body_of(sections[1]).unwrap();
    let children: Vec<_> = tree.children(body).collect();
    assert_eq!(children.len(), 2);
    assert_eq!(tree.node(children[0]).mac, Some(Mac::Mdoc(MdocMacro::Xr)));
    assert_eq!(tree.collect_text(children[0]), "cat 1");
    assert_eq!(tree.node(children[1]).kind, NodeKind::Text);
    assert_eq!(tree.node(children[1]).text.as_deref(), Some("."));
}

#[test]
fn sections_out_of_order_warn_but_do_not_reject() {
    let source = format!(
        "{MINIMAL}.Sh SEE ALSO\n.Xr cat 1\n.Sh DESCRIPTION\ntext.\n"
    );
    let (tree, sink) = parse(&source);
    assert!(sink.has(Code::SectionsOutOfOrder));
    assert_eq!(section_blocks(&tree).len(), 3);
}

#[test]
fn return_values_in_wrong_manual_section_warns() {
    let source = format!("{MINIMAL}.Sh RETURN VALUES\ntext.\n");
    let (_, sink) = parse(&source);
    assert!(sink.has(Code::SectionInWrongManual));
}

#[test]
fn standard_citation_is_injected() {
    let source = format!("{MINIMAL}.Sh STANDARDS\n.St -p1003.1-88\n");
    let (tree, _) = parse(&source);
    let sections = section_blocks(&tree);
    let body = tree.body_of(sections[1]).unwrap();
    let st = tree.children(body).next().unwrap();
    assert!(tree.collect_text(st).contains("IEEE Std 1003.1-1988"));
}

#[test]
fn continuation_joins_quoted_arguments() {
    // A quoted argument never spans a physical newline: the lexer joins
    // the continuation before tokenization.
    let source = format!("{MINIMAL}.Sh DESCRIPTION\n.Nm \"split \\\nname\"\n");
    let (tree, sink) = parse(&source);
    assert!(!sink.has(Code::UnterminatedQuote));
    let sections = section_blocks(&tree);
    let body = tree.body_of(sections[1]).unwrap();
    let nm = tree.children(body).next().unwrap();
    assert_eq!(tree.collect_text(nm), "split name");
}

#[test]
fn auto_dialect_detects_mdoc() {
    let mut sink = MemorySink::new();
    let doc = Parser::new(ParseConfig::default())
        .parse_str("test.1", MINIMAL, &mut sink)
        .unwrap();
    assert_eq!(doc.dialect, Dialect::Mdoc);
}
