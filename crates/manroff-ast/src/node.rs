//! Node kinds, flags, named sections, and document metadata.

use std::fmt;

use crate::args::ArgBundle;
use crate::macros::Mac;

/// Structural role of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The document root; exactly one per tree, owns the metadata.
    Root,
    /// A scoped macro's outer frame.
    Block,
    /// Line-scoped prefix region of a block.
    Head,
    /// Multi-line content region of a block.
    Body,
    /// Optional closing-line region of a block.
    Tail,
    /// Line-scoped inline macro.
    Elem,
    /// Leaf carrying a decoded string.
    Text,
}

impl NodeKind {
    /// Lower-case name for dumps and messages.
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Block => "block",
            NodeKind::Head => "head",
            NodeKind::Body => "body",
            NodeKind::Tail => "tail",
            NodeKind::Elem => "elem",
            NodeKind::Text => "text",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-node flag set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeFlags(u8);

impl NodeFlags {
    /// Passed validation.
    pub const VALID: u8 = 1 << 0;
    /// Post-validation actions applied.
    pub const ACTED: u8 = 1 << 1;
    /// Ends a sentence; renderers double the following space.
    pub const EOS: u8 = 1 << 2;
    /// First node generated from its input line.
    pub const LINE: u8 = 1 << 3;
    /// Rendered in the synopsis style.
    pub const SYNPRETTY: u8 = 1 << 4;
    /// Scope closed; never cleared, never re-entered by validation.
    pub const ENDED: u8 = 1 << 5;

    /// Whether `flag` is set.
    pub fn has(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    /// Set `flag`.
    pub fn set(&mut self, flag: u8) {
        self.0 |= flag;
    }
}

/// Named manual sections in conventional order.
///
/// `Custom` compares greater than every conventional section, so the
/// ordering check can compare raw discriminants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Section {
    /// Before any section header.
    #[default]
    None,
    Name,
    Library,
    Synopsis,
    Description,
    Implementation,
    ReturnValues,
    Environment,
    Files,
    ExitStatus,
    Examples,
    Diagnostics,
    Compatibility,
    Errors,
    SeeAlso,
    Standards,
    History,
    Authors,
    Caveats,
    Bugs,
    Security,
    /// A heading outside the conventional vocabulary.
    Custom,
}

impl Section {
    /// Map a section title to its conventional identity.
    pub fn from_title(title: &str) -> Section {
        match title {
            "NAME" => Section::Name,
            "LIBRARY" => Section::Library,
            "SYNOPSIS" => Section::Synopsis,
            "DESCRIPTION" => Section::Description,
            "IMPLEMENTATION NOTES" => Section::Implementation,
            "RETURN VALUES" => Section::ReturnValues,
            "ENVIRONMENT" => Section::Environment,
            "FILES" => Section::Files,
            "EXIT STATUS" => Section::ExitStatus,
            "EXAMPLES" => Section::Examples,
            "DIAGNOSTICS" => Section::Diagnostics,
            "COMPATIBILITY" => Section::Compatibility,
            "ERRORS" => Section::Errors,
            "SEE ALSO" => Section::SeeAlso,
            "STANDARDS" => Section::Standards,
            "HISTORY" => Section::History,
            "AUTHORS" => Section::Authors,
            "CAVEATS" => Section::Caveats,
            "BUGS" => Section::Bugs,
            "SECURITY CONSIDERATIONS" => Section::Security,
            _ => Section::Custom,
        }
    }

    /// Whether this is a conventional (named) section.
    pub fn is_named(self) -> bool {
        !matches!(self, Section::None | Section::Custom)
    }
}

/// Manual section of the `Dt`/`TH` prologue line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Msec {
    /// Unset or unrecognized.
    #[default]
    Default,
    S1,
    S2,
    S3,
    S3f,
    S3p,
    S4,
    S5,
    S6,
    S7,
    S8,
    S9,
    X11,
    X11R6,
    Local,
    N,
    Unass,
    Draft,
    Paper,
}

impl Msec {
    /// Parse the section token of a prologue line.
    pub fn from_token(tok: &str) -> Option<Msec> {
        let m = match tok {
            "1" => Msec::S1,
            "2" => Msec::S2,
            "3" => Msec::S3,
            "3f" => Msec::S3f,
            "3p" => Msec::S3p,
            "4" => Msec::S4,
            "5" => Msec::S5,
            "6" => Msec::S6,
            "7" => Msec::S7,
            "8" => Msec::S8,
            "9" => Msec::S9,
            "X11" => Msec::X11,
            "X11R6" => Msec::X11R6,
            "local" => Msec::Local,
            "n" => Msec::N,
            "unass" => Msec::Unass,
            "draft" => Msec::Draft,
            "paper" => Msec::Paper,
            _ => return None,
        };
        Some(m)
    }

    /// Whether library-style sections (2, 3, 9) apply.
    pub fn is_library(self) -> bool {
        matches!(self, Msec::S2 | Msec::S3 | Msec::S3f | Msec::S3p | Msec::S9)
    }
}

/// Manual volume of the `Dt` prologue line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Volume {
    /// Derived from the manual section.
    #[default]
    Default,
    /// Ancestral manual documents.
    Amd,
    /// Indices.
    Ind,
    /// Kernel manual.
    Km,
    /// Local manual.
    Local,
    /// Programmer's reference manual.
    Prm,
    /// Programmer's supplementary documents.
    Ps1,
    /// System manager's manual.
    Smm,
    /// User's reference manual.
    Urm,
    /// User's supplementary documents.
    Usd,
}

impl Volume {
    /// Parse a volume token of the `Dt` line.
    pub fn from_token(tok: &str) -> Option<Volume> {
        let v = match tok {
            "AMD" => Volume::Amd,
            "IND" => Volume::Ind,
            "KM" => Volume::Km,
            "LOCAL" => Volume::Local,
            "PRM" => Volume::Prm,
            "PS1" => Volume::Ps1,
            "SMM" => Volume::Smm,
            "URM" => Volume::Urm,
            "USD" => Volume::Usd,
            _ => return None,
        };
        Some(v)
    }
}

/// Document metadata assembled from the prologue and validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Meta {
    /// Document date, seconds since the epoch.
    pub date: i64,
    /// Document title from `Dt`/`TH`.
    pub title: String,
    /// Manual section, recognized form.
    pub msec: Msec,
    /// Manual section exactly as written.
    pub msec_raw: String,
    /// Machine architecture, when the title line names one.
    pub arch: Option<String>,
    /// Manual volume.
    pub vol: Volume,
    /// Operating system from `Os`/`TH`.
    pub os: String,
    /// Program or function name fixed by the first named `Nm`.
    pub name: Option<String>,
    /// Most recent conventional section seen.
    pub last_seen_named: Section,
    /// Most recent section of any kind, `Custom` included.
    pub last_seen_any: Section,
}

/// Index of a node in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Arena slot, mostly for dumps.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One node of the document tree.
///
/// Links are arena indices; `parent` and `prev` are non-owning
/// back-pointers, ownership flows through `first_child` and `next`.
#[derive(Debug, Clone)]
pub struct Node {
    /// Structural role.
    pub kind: NodeKind,
    /// Macro identity; `None` for `Root` and `Text`.
    pub mac: Option<Mac>,
    /// Decoded string of a `Text` leaf.
    pub text: Option<String>,
    /// 1-based source line.
    pub line: usize,
    /// 0-based source column.
    pub col: usize,
    /// Enclosing node.
    pub parent: Option<NodeId>,
    /// First child in document order.
    pub first_child: Option<NodeId>,
    /// Last child in document order.
    pub last_child: Option<NodeId>,
    /// Next sibling.
    pub next: Option<NodeId>,
    /// Previous sibling.
    pub prev: Option<NodeId>,
    /// Number of children.
    pub nchild: usize,
    /// Flag set.
    pub flags: NodeFlags,
    /// Named section the node appears in.
    pub sec: Section,
    /// Argument bundle of a `Block` or `Elem`.
    pub args: Option<ArgBundle>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, mac: Option<Mac>, line: usize, col: usize) -> Self {
        Node {
            kind,
            mac,
            text: None,
            line,
            col,
            parent: None,
            first_child: None,
            last_child: None,
            next: None,
            prev: None,
            nchild: 0,
            flags: NodeFlags::default(),
            sec: Section::None,
            args: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_titles_resolve_in_order() {
        assert_eq!(Section::from_title("NAME"), Section::Name);
        assert_eq!(Section::from_title("SEE ALSO"), Section::SeeAlso);
        assert_eq!(Section::from_title("FROBNICATION"), Section::Custom);
        assert!(Section::Name < Section::Synopsis);
        assert!(Section::Bugs < Section::Custom);
    }

    #[test]
    fn msec_tokens() {
        assert_eq!(Msec::from_token("1"), Some(Msec::S1));
        assert_eq!(Msec::from_token("3p"), Some(Msec::S3p));
        assert_eq!(Msec::from_token("10"), None);
        assert!(Msec::S9.is_library());
        assert!(!Msec::S1.is_library());
    }

    #[test]
    fn flags_accumulate() {
        let mut flags = NodeFlags::default();
        assert!(!flags.has(NodeFlags::ENDED));
        flags.set(NodeFlags::ENDED);
        flags.set(NodeFlags::VALID);
        assert!(flags.has(NodeFlags::ENDED));
        assert!(flags.has(NodeFlags::VALID));
        assert!(!flags.has(NodeFlags::EOS));
    }
}
