//! Post-parse validation of the structured-dialect tree.
//!
//! A pre-order predicate runs when a node is first entered, a post-order
//! predicate after its children finish; predicates rewrite nodes, inject
//! arguments, and emit diagnostics, each limited to its subtree and the
//! document metadata. A node that has been validated once is never
//! entered again.

use manroff_ast::{
    Arg, ArgFlag, Mac, MdocMacro, NodeFlags, NodeId, NodeKind, Relation, Section,
};
use manroff_diagnostics::{Code, DiagnosticSink};

use super::MdocParser;
use super::width::{DEFAULT_WIDTH, macro_width, resolve_width};

/// Walk state for document-order checks.
struct Validator {
    last_named: Section,
    seen: Vec<Section>,
    first_section: bool,
}

/// Run both validation passes over the finished tree.
pub(crate) fn run<S: DiagnosticSink>(p: &mut MdocParser<'_, S>) {
    let mut v = Validator { last_named: Section::None, seen: Vec::new(), first_section: true };
    let root = p.tree.root();
    walk(p, &mut v, root);
}

fn walk<S: DiagnosticSink>(p: &mut MdocParser<'_, S>, v: &mut Validator, id: NodeId) {
    if p.tree.node(id).flags.has(NodeFlags::VALID) {
        return;
    }
    pre(p, id);
    let children: Vec<NodeId> = p.tree.children(id).collect();
    for child in children {
        walk(p, v, child);
    }
    post(p, v, id);
    p.tree.node_mut(id).flags.set(NodeFlags::VALID);
}

fn mdoc_mac(p: &MdocParser<'_, impl DiagnosticSink>, id: NodeId) -> Option<MdocMacro> {
    match p.tree.node(id).mac {
        Some(Mac::Mdoc(mac)) => Some(mac),
        _ => None,
    }
}

fn pre<S: DiagnosticSink>(p: &mut MdocParser<'_, S>, id: NodeId) {
    let Some(mac) = mdoc_mac(p, id) else {
        return;
    };
    if p.tree.node(id).kind != NodeKind::Elem || !is_ref_entry(mac) {
        return;
    }
    // Reference entries only make sense inside an `Rs` block.
    let mut at = p.tree.node(id).parent;
    while let Some(cur) = at {
        if mdoc_mac(p, cur) == Some(MdocMacro::Rs) {
            return;
        }
        at = p.tree.node(cur).parent;
    }
    let (line, col) = (p.tree.node(id).line, p.tree.node(id).col);
    p.sink_report(
        Code::ChildViolatesParent,
        line,
        col,
        Some(format!("{} outside Rs", mac.name())),
    );
}

fn post<S: DiagnosticSink>(p: &mut MdocParser<'_, S>, v: &mut Validator, id: NodeId) {
    let Some(mac) = mdoc_mac(p, id) else {
        return;
    };
    let kind = p.tree.node(id).kind;
    match mac {
        MdocMacro::Sh if kind == NodeKind::Block => post_sh(p, v, id),
        MdocMacro::Bl if kind == NodeKind::Block => post_bl(p, id),
        MdocMacro::Bd if kind == NodeKind::Block => post_bd(p, id),
        MdocMacro::An if kind == NodeKind::Elem => post_an(p, id),
        MdocMacro::Ex | MdocMacro::Rv if kind == NodeKind::Elem => post_std(p, id, mac),
        MdocMacro::St if kind == NodeKind::Elem => post_st(p, id),
        MdocMacro::At if kind == NodeKind::Elem => post_at(p, id),
        MdocMacro::Nm if kind == NodeKind::Elem => post_nm(p, id),
        _ => {}
    }
}

fn is_ref_entry(mac: MdocMacro) -> bool {
    use MdocMacro::*;
    matches!(
        mac,
        PctA | PctB | PctC | PctD | PctI | PctJ | PctN | PctO | PctP | PctQ | PctR | PctT
            | PctU | PctV
    )
}

fn post_sh<S: DiagnosticSink>(p: &mut MdocParser<'_, S>, v: &mut Validator, block: NodeId) {
    let node = p.tree.node(block);
    let (sec, line, col) = (node.sec, node.line, node.col);
    let title = p.tree.head_of(block).map(|h| p.tree.collect_text(h)).unwrap_or_default();

    if v.first_section {
        v.first_section = false;
        if sec != Section::Name {
            p.sink_report(Code::NameSectionFirst, line, col, None);
        }
    }
    if title.to_uppercase() != title {
        p.sink_report(Code::TextShouldBeUppercase, line, col, Some(title.clone()));
    }
    if !sec.is_named() {
        return;
    }
    if v.seen.contains(&sec) {
        p.sink_report(Code::SectionNameRepeats, line, col, Some(title));
    } else {
        v.seen.push(sec);
    }
    if sec < v.last_named {
        p.sink_report(Code::SectionsOutOfOrder, line, col, None);
    } else {
        v.last_named = sec;
    }
    if matches!(sec, Section::ReturnValues | Section::Errors) && !p.tree.meta.msec.is_library()
    {
        p.sink_report(Code::SectionInWrongManual, line, col, None);
    }
}

const LIST_TYPES: [ArgFlag; 11] = [
    ArgFlag::Bullet,
    ArgFlag::Dash,
    ArgFlag::Hyphen,
    ArgFlag::Item,
    ArgFlag::Enum,
    ArgFlag::Tag,
    ArgFlag::Diag,
    ArgFlag::Hang,
    ArgFlag::Ohang,
    ArgFlag::Inset,
    ArgFlag::Column,
];

fn post_bl<S: DiagnosticSink>(p: &mut MdocParser<'_, S>, block: NodeId) {
    let node = p.tree.node(block);
    let (line, col) = (node.line, node.col);
    let Some(bundle) = node.args.clone() else {
        p.sink_report(Code::MissingListType, line, col, None);
        return;
    };

    let (primary, has_width, width_value) = {
        let list = bundle.borrow();
        let types: Vec<(usize, ArgFlag)> = list
            .args
            .iter()
            .enumerate()
            .filter(|(_, a)| LIST_TYPES.contains(&a.flag))
            .map(|(i, a)| (i, a.flag))
            .collect();
        let Some(&(first_idx, primary)) = types.first() else {
            drop(list);
            p.sink_report(Code::MissingListType, line, col, None);
            return;
        };
        for &(_, flag) in &types[1..] {
            p.sink_report(
                Code::ListTypeRepeated,
                line,
                col,
                Some(format!("-{}", flag.name())),
            );
        }
        if first_idx != 0 {
            p.sink_report(Code::ListTypeMustComeFirst, line, col, None);
        }
        let width = list.find(ArgFlag::Width);
        (primary, width.is_some(), width.and_then(|a| a.values.first().cloned()))
    };

    if primary == ArgFlag::Item && has_width {
        p.sink_report(Code::SuperfluousWidthArg, line, col, None);
    }

    if primary == ArgFlag::Tag && !has_width {
        // Intuit the width from the first body element of the first item.
        p.sink_report(Code::MissingWidthArg, line, col, None);
        let cells = first_item_width(p, block).unwrap_or_else(|| {
            p.sink_report(Code::CannotDetermineWidth, line, col, None);
            DEFAULT_WIDTH
        });
        bundle.borrow_mut().args.push(Arg {
            flag: ArgFlag::Width,
            line,
            pos: col,
            values: vec![format!("{cells}n")],
        });
    } else if let Some(value) = width_value {
        // Normalize the width to cells so renderers need not re-measure.
        match resolve_width(&value) {
            Some(cells) => {
                let mut list = bundle.borrow_mut();
                if let Some(arg) = list.args.iter_mut().find(|a| a.flag == ArgFlag::Width) {
                    arg.values[0] = format!("{cells}n");
                }
            }
            None => {
                // A free-form string is kept for renderers that measure.
                let cells = value.chars().count() + 1;
                let mut list = bundle.borrow_mut();
                if let Some(arg) = list.args.iter_mut().find(|a| a.flag == ArgFlag::Width) {
                    arg.values[0] = format!("{cells}n");
                }
            }
        }
    }
}

/// Width contributed by the first element of the first item of a list.
fn first_item_width<S: DiagnosticSink>(p: &MdocParser<'_, S>, block: NodeId) -> Option<usize> {
    let body = p.tree.body_of(block)?;
    let item = p
        .tree
        .children(body)
        .find(|&c| mdoc_mac(p, c) == Some(MdocMacro::It))?;
    let head = p.tree.head_of(item)?;
    let first = p.tree.node(head).first_child?;
    let node = p.tree.node(first);
    match node.kind {
        NodeKind::Elem => mdoc_mac(p, first).map(macro_width),
        NodeKind::Text => node.text.as_ref().map(|t| t.chars().count() + 1),
        _ => None,
    }
}

const DISPLAY_TYPES: [ArgFlag; 5] = [
    ArgFlag::Ragged,
    ArgFlag::Unfilled,
    ArgFlag::Filled,
    ArgFlag::Literal,
    ArgFlag::Centred,
];

fn post_bd<S: DiagnosticSink>(p: &mut MdocParser<'_, S>, block: NodeId) {
    let node = p.tree.node(block);
    let (line, col) = (node.line, node.col);
    let Some(bundle) = node.args.clone() else {
        p.sink_report(Code::MissingDisplayType, line, col, None);
        return;
    };
    let list = bundle.borrow();
    let mut types = list.args.iter().filter(|a| DISPLAY_TYPES.contains(&a.flag));
    if types.next().is_none() {
        p.sink_report(Code::MissingDisplayType, line, col, None);
    }
    for extra in types {
        p.sink_report(
            Code::DisplayTypeRepeated,
            line,
            col,
            Some(format!("-{}", extra.flag.name())),
        );
    }
}

fn post_an<S: DiagnosticSink>(p: &mut MdocParser<'_, S>, elem: NodeId) {
    let node = p.tree.node(elem);
    let (line, col) = (node.line, node.col);
    let Some(bundle) = node.args.clone() else {
        return;
    };
    let list = bundle.borrow();
    if list.has(ArgFlag::Split) && list.has(ArgFlag::Nosplit) {
        drop(list);
        p.sink_report(Code::ArgumentRepeated, line, col, Some("-split -nosplit".into()));
    }
}

fn post_std<S: DiagnosticSink>(p: &mut MdocParser<'_, S>, elem: NodeId, mac: MdocMacro) {
    let node = p.tree.node(elem);
    let (line, col) = (node.line, node.col);
    let has_std =
        node.args.as_ref().is_some_and(|args| args.borrow().has(ArgFlag::Std));
    if !has_std {
        p.sink_report(Code::MacroRequiresArg, line, col, Some(mac.name().to_string()));
    }
    if p.tree.meta.name.is_none() && p.tree.node(elem).nchild == 0 {
        p.sink_report(Code::NameNotYetSet, line, col, None);
    }
}

fn post_st<S: DiagnosticSink>(p: &mut MdocParser<'_, S>, elem: NodeId) {
    let node = p.tree.node(elem);
    let (line, col, sec) = (node.line, node.col, node.sec);
    if node.nchild > 0 {
        return;
    }
    let title = node.args.as_ref().and_then(|args| {
        args.borrow().args.iter().find_map(|a| a.flag.standard_title())
    });
    if let Some(title) = title {
        let point = p.tree.save_point();
        p.tree.set_cursor(elem);
        p.tree.set_relation(Relation::Child);
        p.tree.push_text(title.to_string(), line, col, sec);
        p.tree.restore_point(point);
    }
}

const ATT_SYMBOLS: [&str; 14] = [
    "v1", "v2", "v3", "v4", "v5", "v6", "v7", "32v", "III", "V", "V.1", "V.2", "V.3", "V.4",
];

fn post_at<S: DiagnosticSink>(p: &mut MdocParser<'_, S>, elem: NodeId) {
    let node = p.tree.node(elem);
    let (line, col) = (node.line, node.col);
    let Some(first) = node.first_child else {
        return;
    };
    let Some(text) = p.tree.node(first).text.clone() else {
        return;
    };
    if !ATT_SYMBOLS.contains(&text.as_str()) {
        p.sink_report(Code::BadAttSymbol, line, col, Some(text));
    }
}

fn post_nm<S: DiagnosticSink>(p: &mut MdocParser<'_, S>, elem: NodeId) {
    let node = p.tree.node(elem);
    let (line, col) = (node.line, node.col);
    if node.nchild > 0 {
        if p.tree.meta.name.is_none() {
            let name = p.tree.collect_text(elem);
            p.tree.meta.name = Some(name);
        }
    } else if p.tree.meta.name.is_none() {
        p.sink_report(Code::NameNotYetSet, line, col, None);
    }
}
