//! Macro argument flags and bundles.
//!
//! A macro line may open with `-flag [value ...]` groups. The flag
//! vocabulary is closed: the structural flags steer lists, displays, and
//! fonts, and the standards identifiers name the specification a `St`
//! macro cites. Bundles are reference-counted because a block and its
//! reopened continuation share one bundle, and validation may inject
//! arguments after parsing.

use phf::phf_map;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Recognized argument flags, structural first, standards after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ArgFlag {
    /// `-split`: start a new output line per author.
    Split,
    /// `-nosplit`: keep authors on one line.
    Nosplit,
    /// `-ragged`: ragged-right display.
    Ragged,
    /// `-unfilled`: unfilled display.
    Unfilled,
    /// `-literal`: literal display.
    Literal,
    /// `-file`: display sourced from a file.
    File,
    /// `-offset`: block indentation.
    Offset,
    /// `-bullet`: bullet list.
    Bullet,
    /// `-dash`: dash list.
    Dash,
    /// `-hyphen`: hyphen list.
    Hyphen,
    /// `-item`: unadorned item list.
    Item,
    /// `-enum`: enumerated list.
    Enum,
    /// `-tag`: tagged list.
    Tag,
    /// `-diag`: diagnostics list.
    Diag,
    /// `-hang`: hanging-tag list.
    Hang,
    /// `-ohang`: overhanging-tag list.
    Ohang,
    /// `-inset`: inset-tag list.
    Inset,
    /// `-column`: columnated list; values are the column widths.
    Column,
    /// `-width`: tag column width.
    Width,
    /// `-compact`: suppress vertical spacing.
    Compact,
    /// `-std`: standard utility/function behaviour.
    Std,
    /// `-filled`: filled display.
    Filled,
    /// `-words`: keep words together.
    Words,
    /// `-emphasis`: emphasized font block.
    Emphasis,
    /// `-symbolic`: symbolic font block.
    Symbolic,
    /// `-nested`: nested list spacing.
    Nested,
    /// `-centred`: centred display.
    Centred,

    // Standards identifiers accepted by `St`.
    P1003_1_88, P1003_1_90, P1003_1_96, P1003_1_2001, P1003_1_2004,
    P1003_1, P1003_1b, P1003_1b_93, P1003_1c_95, P1003_1g_2000,
    P1003_2_92, P1387_2_95, P1003_2, P1387_2,
    IsoC90, IsoCAmd1, IsoCTcor1, IsoCTcor2, IsoC99,
    AnsiC, AnsiC89, AnsiC99, Ieee754, Iso8802_3,
    Xpg3, Xpg4, Xpg4_2, Xpg4_3, Xbd5, Xcu5, Xsh5, Xns5, Xns5_2d2_0,
    Xcurses4_2, Susv2, Susv3, Svid4,
}

static ARG_NAMES: phf::Map<&'static str, ArgFlag> = phf_map! {
    "split" => ArgFlag::Split, "nosplit" => ArgFlag::Nosplit,
    "ragged" => ArgFlag::Ragged, "unfilled" => ArgFlag::Unfilled,
    "literal" => ArgFlag::Literal, "file" => ArgFlag::File,
    "offset" => ArgFlag::Offset, "bullet" => ArgFlag::Bullet,
    "dash" => ArgFlag::Dash, "hyphen" => ArgFlag::Hyphen,
    "item" => ArgFlag::Item, "enum" => ArgFlag::Enum,
    "tag" => ArgFlag::Tag, "diag" => ArgFlag::Diag,
    "hang" => ArgFlag::Hang, "ohang" => ArgFlag::Ohang,
    "inset" => ArgFlag::Inset, "column" => ArgFlag::Column,
    "width" => ArgFlag::Width, "compact" => ArgFlag::Compact,
    "std" => ArgFlag::Std, "filled" => ArgFlag::Filled,
    "words" => ArgFlag::Words, "emphasis" => ArgFlag::Emphasis,
    "symbolic" => ArgFlag::Symbolic, "nested" => ArgFlag::Nested,
    "centred" => ArgFlag::Centred,
    "p1003.1-88" => ArgFlag::P1003_1_88, "p1003.1-90" => ArgFlag::P1003_1_90,
    "p1003.1-96" => ArgFlag::P1003_1_96, "p1003.1-2001" => ArgFlag::P1003_1_2001,
    "p1003.1-2004" => ArgFlag::P1003_1_2004, "p1003.1" => ArgFlag::P1003_1,
    "p1003.1b" => ArgFlag::P1003_1b, "p1003.1b-93" => ArgFlag::P1003_1b_93,
    "p1003.1c-95" => ArgFlag::P1003_1c_95, "p1003.1g-2000" => ArgFlag::P1003_1g_2000,
    "p1003.2-92" => ArgFlag::P1003_2_92, "p1387.2-95" => ArgFlag::P1387_2_95,
    "p1003.2" => ArgFlag::P1003_2, "p1387.2" => ArgFlag::P1387_2,
    "isoC-90" => ArgFlag::IsoC90, "isoC-amd1" => ArgFlag::IsoCAmd1,
    "isoC-tcor1" => ArgFlag::IsoCTcor1, "isoC-tcor2" => ArgFlag::IsoCTcor2,
    "isoC-99" => ArgFlag::IsoC99, "ansiC" => ArgFlag::AnsiC,
    "ansiC-89" => ArgFlag::AnsiC89, "ansiC-99" => ArgFlag::AnsiC99,
    "ieee754" => ArgFlag::Ieee754, "iso8802-3" => ArgFlag::Iso8802_3,
    "xpg3" => ArgFlag::Xpg3, "xpg4" => ArgFlag::Xpg4,
    "xpg4.2" => ArgFlag::Xpg4_2, "xpg4.3" => ArgFlag::Xpg4_3,
    "xbd5" => ArgFlag::Xbd5, "xcu5" => ArgFlag::Xcu5,
    "xsh5" => ArgFlag::Xsh5, "xns5" => ArgFlag::Xns5,
    "xns5.2d2.0" => ArgFlag::Xns5_2d2_0, "xcurses4.2" => ArgFlag::Xcurses4_2,
    "susv2" => ArgFlag::Susv2, "susv3" => ArgFlag::Susv3,
    "svid4" => ArgFlag::Svid4,
};

impl ArgFlag {
    /// Look a flag up by the word following the dash.
    pub fn from_name(name: &str) -> Option<Self> {
        ARG_NAMES.get(name).copied()
    }

    /// The word as written after the dash.
    pub fn name(self) -> &'static str {
        use ArgFlag::*;
        match self {
            Split => "split", Nosplit => "nosplit", Ragged => "ragged",
            Unfilled => "unfilled", Literal => "literal", File => "file",
            Offset => "offset", Bullet => "bullet", Dash => "dash",
            Hyphen => "hyphen", Item => "item", Enum => "enum",
            Tag => "tag", Diag => "diag", Hang => "hang", Ohang => "ohang",
            Inset => "inset", Column => "column", Width => "width",
            Compact => "compact", Std => "std", Filled => "filled",
            Words => "words", Emphasis => "emphasis", Symbolic => "symbolic",
            Nested => "nested", Centred => "centred",
            P1003_1_88 => "p1003.1-88", P1003_1_90 => "p1003.1-90",
            P1003_1_96 => "p1003.1-96", P1003_1_2001 => "p1003.1-2001",
            P1003_1_2004 => "p1003.1-2004", P1003_1 => "p1003.1",
            P1003_1b => "p1003.1b", P1003_1b_93 => "p1003.1b-93",
            P1003_1c_95 => "p1003.1c-95", P1003_1g_2000 => "p1003.1g-2000",
            P1003_2_92 => "p1003.2-92", P1387_2_95 => "p1387.2-95",
            P1003_2 => "p1003.2", P1387_2 => "p1387.2",
            IsoC90 => "isoC-90", IsoCAmd1 => "isoC-amd1",
            IsoCTcor1 => "isoC-tcor1", IsoCTcor2 => "isoC-tcor2",
            IsoC99 => "isoC-99", AnsiC => "ansiC", AnsiC89 => "ansiC-89",
            AnsiC99 => "ansiC-99", Ieee754 => "ieee754",
            Iso8802_3 => "iso8802-3", Xpg3 => "xpg3", Xpg4 => "xpg4",
            Xpg4_2 => "xpg4.2", Xpg4_3 => "xpg4.3", Xbd5 => "xbd5",
            Xcu5 => "xcu5", Xsh5 => "xsh5", Xns5 => "xns5",
            Xns5_2d2_0 => "xns5.2d2.0", Xcurses4_2 => "xcurses4.2",
            Susv2 => "susv2", Susv3 => "susv3", Svid4 => "svid4",
        }
    }

    /// Whether this flag names a standard (the `St` vocabulary).
    pub fn is_standard(self) -> bool {
        self as u8 >= ArgFlag::P1003_1_88 as u8
    }

    /// Full citation title for a standards flag.
    pub fn standard_title(self) -> Option<&'static str> {
        use ArgFlag::*;
        let title = match self {
            P1003_1_88 => "IEEE Std 1003.1-1988 (\u{201C}POSIX.1\u{201D})",
            P1003_1_90 => "IEEE Std 1003.1-1990 (\u{201C}POSIX.1\u{201D})",
            P1003_1_96 => "ISO/IEC 9945-1:1996 (\u{201C}POSIX.1\u{201D})",
            P1003_1_2001 => "IEEE Std 1003.1-2001 (\u{201C}POSIX.1\u{201D})",
            P1003_1_2004 => "IEEE Std 1003.1-2004 (\u{201C}POSIX.1\u{201D})",
            P1003_1 => "IEEE Std 1003.1 (\u{201C}POSIX.1\u{201D})",
            P1003_1b => "IEEE Std 1003.1b (\u{201C}POSIX.1b\u{201D})",
            P1003_1b_93 => "IEEE Std 1003.1b-1993 (\u{201C}POSIX.1b\u{201D})",
            P1003_1c_95 => "IEEE Std 1003.1c-1995 (\u{201C}POSIX.1c\u{201D})",
            P1003_1g_2000 => "IEEE Std 1003.1g-2000 (\u{201C}POSIX.1g\u{201D})",
            P1003_2_92 => "IEEE Std 1003.2-1992 (\u{201C}POSIX.2\u{201D})",
            P1387_2_95 => "IEEE Std 1387.2-1995 (\u{201C}POSIX.7.2\u{201D})",
            P1003_2 => "IEEE Std 1003.2 (\u{201C}POSIX.2\u{201D})",
            P1387_2 => "IEEE Std 1387.2 (\u{201C}POSIX.7.2\u{201D})",
            IsoC90 => "ISO/IEC 9899:1990 (\u{201C}ISO C90\u{201D})",
            IsoCAmd1 => "ISO/IEC 9899/AMD1:1995 (\u{201C}ISO C90, Amendment 1\u{201D})",
            IsoCTcor1 => "ISO/IEC 9899/TCOR1:1994 (\u{201C}ISO C90, Technical Corrigendum 1\u{201D})",
            IsoCTcor2 => "ISO/IEC 9899/TCOR2:1995 (\u{201C}ISO C90, Technical Corrigendum 2\u{201D})",
            IsoC99 => "ISO/IEC 9899:1999 (\u{201C}ISO C99\u{201D})",
            AnsiC => "ANSI X3.159-1989 (\u{201C}ANSI C89\u{201D})",
            AnsiC89 => "ANSI X3.159-1989 (\u{201C}ANSI C89\u{201D})",
            AnsiC99 => "ANSI/ISO/IEC 9899-1999 (\u{201C}ANSI C99\u{201D})",
            Ieee754 => "IEEE Std 754-1985",
            Iso8802_3 => "ISO 8802-3: 1989",
            Xpg3 => "X/Open Portability Guide Issue 3 (\u{201C}XPG3\u{201D})",
            Xpg4 => "X/Open Portability Guide Issue 4 (\u{201C}XPG4\u{201D})",
            Xpg4_2 => "X/Open Portability Guide Issue 4, Version 2 (\u{201C}XPG4.2\u{201D})",
            Xpg4_3 => "X/Open Portability Guide Issue 4, Version 3 (\u{201C}XPG4.3\u{201D})",
            Xbd5 => "X/Open Base Definitions Issue 5 (\u{201C}XBD5\u{201D})",
            Xcu5 => "X/Open Commands and Utilities Issue 5 (\u{201C}XCU5\u{201D})",
            Xsh5 => "X/Open System Interfaces and Headers Issue 5 (\u{201C}XSH5\u{201D})",
            Xns5 => "X/Open Networking Services Issue 5 (\u{201C}XNS5\u{201D})",
            Xns5_2d2_0 => "X/Open Networking Services Issue 5.2 Draft 2.0 (\u{201C}XNS5.2D2.0\u{201D})",
            Xcurses4_2 => "X/Open Curses Issue 4, Version 2 (\u{201C}XCURSES4.2\u{201D})",
            Susv2 => "Version 2 of the Single UNIX Specification (\u{201C}SUSv2\u{201D})",
            Susv3 => "Version 3 of the Single UNIX Specification (\u{201C}SUSv3\u{201D})",
            Svid4 => "System V Interface Definition, Fourth Edition (\u{201C}SVID4\u{201D})",
            _ => return None,
        };
        Some(title)
    }
}

impl fmt::Display for ArgFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "-{}", self.name())
    }
}

/// One parsed `-flag [value ...]` group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    /// The recognized flag.
    pub flag: ArgFlag,
    /// Source line of the flag word.
    pub line: usize,
    /// Source column of the flag word.
    pub pos: usize,
    /// Values following the flag, per its shape.
    pub values: Vec<String>,
}

/// Ordered bundle of parsed arguments for one macro invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgList {
    /// Arguments in source order.
    pub args: Vec<Arg>,
}

/// Shared handle to an argument bundle.
///
/// Shared between a block and its reopened continuation; validation
/// injects computed arguments through the same handle.
pub type ArgBundle = Rc<RefCell<ArgList>>;

impl ArgList {
    /// An empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap into a shared handle.
    pub fn into_bundle(self) -> ArgBundle {
        Rc::new(RefCell::new(self))
    }

    /// First argument with the given flag.
    pub fn find(&self, flag: ArgFlag) -> Option<&Arg> {
        self.args.iter().find(|a| a.flag == flag)
    }

    /// Whether the bundle carries the given flag.
    pub fn has(&self, flag: ArgFlag) -> bool {
        self.find(flag).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_and_standard_flags_resolve() {
        assert_eq!(ArgFlag::from_name("width"), Some(ArgFlag::Width));
        assert_eq!(ArgFlag::from_name("p1003.1-88"), Some(ArgFlag::P1003_1_88));
        assert_eq!(ArgFlag::from_name("gadget"), None);
    }

    #[test]
    fn standards_are_flagged_as_such() {
        assert!(!ArgFlag::Width.is_standard());
        assert!(ArgFlag::Susv2.is_standard());
        assert!(ArgFlag::Width.standard_title().is_none());
        assert!(ArgFlag::Susv2.standard_title().is_some());
    }

    #[test]
    fn name_round_trips_for_every_flag() {
        for (_, &flag) in ARG_NAMES.entries() {
            assert_eq!(ArgFlag::from_name(flag.name()), Some(flag));
        }
    }

    #[test]
    fn bundle_lookup() {
        let mut list = ArgList::new();
        list.args.push(Arg { flag: ArgFlag::Tag, line: 1, pos: 4, values: vec![] });
        list.args.push(Arg {
            flag: ArgFlag::Width,
            line: 1,
            pos: 9,
            values: vec!["10n".into()],
        });
        assert!(list.has(ArgFlag::Tag));
        assert_eq!(list.find(ArgFlag::Width).map(|a| a.values[0].as_str()), Some("10n"));
    }
}
