//! The keyword indexer: walks validated trees and stages database rows.

use std::path::{Path, PathBuf};

use manroff_ast::{Mac, MdocMacro, ManMacro, NodeId, NodeKind, Section, Tree};
use manroff_diagnostics::DiagnosticSink;
use manroff_parser::{Dialect, Document, Parser};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::classes::KeyMask;
use crate::db::{DbError, DbStage, Record};
use crate::normalize::normalize;

/// Builds the on-disk database for a directory of manuals.
///
/// Keywords are interned per document so a term appearing many times
/// under one class combination yields a single physical entry; masks for
/// the same keyword OR-merge.
#[derive(Debug)]
pub struct Indexer {
    dir: PathBuf,
    stage: DbStage,
}

/// Per-document extraction state.
struct DocKeys {
    interned: FxHashMap<String, KeyMask>,
    desc: Option<String>,
}

impl DocKeys {
    fn put(&mut self, key: &str, mask: KeyMask) {
        let key = normalize(key);
        if key.is_empty() {
            return;
        }
        let slot = self.interned.entry(key).or_default();
        *slot = slot.union(mask);
    }
}

impl Indexer {
    /// An indexer writing into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Indexer { dir: dir.into(), stage: DbStage::new() }
    }

    /// Number of manuals staged so far.
    pub fn staged(&self) -> usize {
        self.stage.record_count()
    }

    /// Parse one source and stage it; a failed parse is reported through
    /// the sink and skipped, and indexing continues.
    pub fn add_source<S: DiagnosticSink>(
        &mut self,
        filepath: &str,
        source: &str,
        parser: &Parser,
        sink: &mut S,
    ) -> bool {
        match parser.parse_str(filepath, source, sink) {
            Ok(doc) => {
                self.add(&doc);
                true
            }
            Err(err) => {
                warn!(filepath, %err, "parse failure, manual skipped");
                false
            }
        }
    }

    /// Stage one validated document.
    pub fn add(&mut self, doc: &Document) {
        let tree = &doc.tree;
        let mut keys =
            DocKeys { interned: FxHashMap::default(), desc: None };

        match doc.dialect {
            Dialect::Man => extract_man(tree, &mut keys),
            _ => extract_mdoc(tree, &mut keys),
        }

        let meta = &tree.meta;
        if let Some(arch) = &meta.arch {
            keys.put(arch, KeyMask::ARCH);
        }
        if !meta.msec_raw.is_empty() {
            let sec = normalize(&meta.msec_raw);
            if !sec.is_empty() {
                let slot = keys.interned.entry(sec).or_default();
                *slot = slot.union(KeyMask::SECTION);
            }
        }

        let rec = self.stage.push_record(Record {
            rec: 0,
            file: doc.filename.clone(),
            sec: normalize(&meta.msec_raw),
            title: normalize(&meta.title),
            arch: meta.arch.as_deref().map(normalize).unwrap_or_default(),
            desc: keys.desc.clone().unwrap_or_default(),
        });

        // Flush the interned keys in deterministic order.
        let mut entries: Vec<(String, KeyMask)> = keys.interned.into_iter().collect();
        entries.sort();
        for (key, mask) in entries {
            self.stage.push_keyword(&key, mask, rec);
        }
        debug!(file = %doc.filename, rec, "manual staged");
    }

    /// Publish the database pair atomically.
    pub fn commit(self) -> Result<(), DbError> {
        self.stage.commit(&self.dir)
    }

    /// The target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Walk every node of a structured-dialect tree.
fn extract_mdoc(tree: &Tree, keys: &mut DocKeys) {
    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        visit_mdoc(tree, id, keys);
        // Push in reverse so document order is preserved.
        let children: Vec<NodeId> = tree.children(id).collect();
        for child in children.into_iter().rev() {
            stack.push(child);
        }
    }
}

fn visit_mdoc(tree: &Tree, id: NodeId, keys: &mut DocKeys) {
    let node = tree.node(id);
    let Some(Mac::Mdoc(mac)) = node.mac else {
        return;
    };
    if node.kind != NodeKind::Elem && !(node.kind == NodeKind::Head && mac == MdocMacro::Fo) {
        return;
    }
    let sec = node.sec;

    match mac {
        MdocMacro::An if sec == Section::Authors => {
            keys.put(&tree.collect_text(id), KeyMask::AUTHOR);
        }
        MdocMacro::Cd if sec == Section::Synopsis => {
            keys.put(&tree.collect_text(id), KeyMask::CONFIG);
        }
        MdocMacro::Er if sec == Section::Errors => {
            keys.put(&tree.collect_text(id), KeyMask::ERR);
        }
        MdocMacro::Ev if sec == Section::Environment => {
            keys.put(&tree.collect_text(id), KeyMask::ENV);
        }
        MdocMacro::Pa if sec == Section::Files => {
            keys.put(&tree.collect_text(id), KeyMask::PATH);
        }
        MdocMacro::St if sec == Section::Standards => {
            keys.put(&tree.collect_text(id), KeyMask::STANDARD);
        }
        MdocMacro::Va | MdocMacro::Vt if sec == Section::Synopsis => {
            let text = tree.collect_text(id);
            let trimmed = text.trim_start_matches('*').trim_end_matches(';');
            keys.put(trimmed, KeyMask::VARIABLE);
        }
        MdocMacro::Fd if sec == Section::Synopsis => {
            // Only `#include` lines carry an indexable header name.
            let text = tree.collect_text(id);
            if let Some(rest) = text.strip_prefix("#include") {
                let header =
                    rest.trim().trim_start_matches(['<', '"']).trim_end_matches(['>', '"']);
                keys.put(header, KeyMask::INCLUDES);
            }
        }
        MdocMacro::In if sec == Section::Synopsis => {
            keys.put(&tree.collect_text(id), KeyMask::INCLUDES);
        }
        MdocMacro::Fn if sec == Section::Synopsis => {
            // `.Fn "struct type *fn" args` names the function last.
            if let Some(first) = tree.node(id).first_child {
                if let Some(text) = &tree.node(first).text {
                    let name = text.rsplit(' ').next().unwrap_or(text);
                    keys.put(name.trim_start_matches('*'), KeyMask::FUNCTION);
                }
            }
        }
        MdocMacro::Fo if sec == Section::Synopsis => {
            keys.put(&tree.collect_text(id), KeyMask::FUNCTION);
        }
        MdocMacro::Nd => {
            let text = normalize(&tree.collect_text(id));
            keys.put(&text, KeyMask::DESC);
            if keys.desc.is_none() && !text.is_empty() {
                keys.desc = Some(text);
            }
        }
        MdocMacro::Nm => {
            let text = tree.collect_text(id);
            let name = if text.is_empty() {
                tree.meta.name.clone().unwrap_or_default()
            } else {
                text
            };
            match sec {
                // The name in NAME is also the callable utility.
                Section::Name => keys.put(&name, KeyMask::NAME.union(KeyMask::UTILITY)),
                Section::Synopsis => keys.put(&name, KeyMask::UTILITY),
                _ => {}
            }
        }
        MdocMacro::Xr => {
            let mut parts = tree.children(id);
            let name = parts.next().and_then(|c| tree.node(c).text.clone());
            let sec = parts.next().and_then(|c| tree.node(c).text.clone());
            if let Some(name) = name {
                let xref = match sec {
                    Some(sec) => format!("{name}.{sec}"),
                    None => format!("{name}."),
                };
                keys.put(&xref, KeyMask::XREF);
            }
        }
        _ => {}
    }
}

/// The presentation dialect carries no semantic markup; puzzle the
/// names and description out of the NAME section's first text line.
fn extract_man(tree: &Tree, keys: &mut DocKeys) {
    let Some(body) = name_section_body(tree) else {
        return;
    };
    let Some(text) = tree
        .children(body)
        .find_map(|c| tree.node(c).text.clone())
        .or_else(|| {
            // The line may sit inside a font element.
            tree.children(body).find_map(|c| {
                let t = tree.collect_text(c);
                (!t.is_empty()).then_some(t)
            })
        })
    else {
        return;
    };

    // Conventionally: name[, name...] - description
    let (names, desc) = match split_name_line(&text) {
        Some(split) => split,
        None => {
            keys.put(&text, KeyMask::NAME);
            return;
        }
    };
    for name in names {
        keys.put(&name, KeyMask::NAME);
    }
    let desc = normalize(&desc);
    if !desc.is_empty() {
        keys.put(&desc, KeyMask::DESC);
        keys.desc = Some(desc);
    }
}

fn name_section_body(tree: &Tree) -> Option<NodeId> {
    tree.children(tree.root()).find_map(|block| {
        let node = tree.node(block);
        if !matches!(node.mac, Some(Mac::Man(ManMacro::Sh))) {
            return None;
        }
        let head = tree.head_of(block)?;
        if tree.collect_text(head).trim() != "NAME" {
            return None;
        }
        tree.body_of(block)
    })
}

/// Split `grep, egrep \- print matching lines` into names and
/// description.
fn split_name_line(text: &str) -> Option<(Vec<String>, String)> {
    let dashes = [" - ", " \\- ", " \\(en ", " \\(em "];
    let (at, dash_len) = dashes
        .iter()
        .find_map(|d| text.find(d).map(|i| (i, d.len())))?;
    let names = text[..at]
        .split(',')
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    let desc = text[at + dash_len..].trim().to_string();
    Some((names, desc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn name_line_splits_on_each_dash_form() {
        let (names, desc) = split_name_line("grep, egrep \\- print lines").unwrap();
        assert_eq!(names, vec!["grep".to_string(), "egrep".to_string()]);
        assert_eq!(desc, "print lines");

        let (names, desc) = split_name_line("cat - concatenate").unwrap();
        assert_eq!(names, vec!["cat".to_string()]);
        assert_eq!(desc, "concatenate");
    }

    #[test]
    fn name_line_without_dash_is_none() {
        assert!(split_name_line("just words here").is_none());
    }
}
