//! The structured-dialect dispatch table.
//!
//! One row per macro: handler family, attribute bits, the paired
//! closer/opener for explicit scopes, and declared argument arity.
//! The argument-parsing profile lives with the tokenizer
//! (`manroff_argv::args_profile`).

use manroff_ast::MdocMacro;

/// Handler family a macro dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Inline macro consuming words until end of line.
    Text,
    /// Positional-argument macro (cross-references, version markers).
    Ordered,
    /// Multi-line scoped block.
    Layout,
    /// Block scoped to its own line.
    PartialLine,
    /// Block opened here, closed by a paired macro.
    PartialExplicit,
    /// Closer of a `PartialExplicit` or explicit `Layout` block.
    Close,
    /// Document prologue entry.
    Prologue,
    /// Side-effecting handler (toggles, markers, fixed text).
    Special,
}

/// Attribute bits of a macro row.
pub mod attr {
    /// Content is re-scanned for nested callable macros.
    pub const PARSED: u16 = 1 << 0;
    /// May be called from inside a parsed macro's arguments.
    pub const CALLABLE: u16 = 1 << 1;
    /// Scope ends only at an explicit closer.
    pub const EXPLICIT: u16 = 1 << 2;
    /// Implicit-end block closing only at the nearest same-tag scope.
    pub const SHALLOW: u16 = 1 << 3;
    /// Meaningful with no arguments at all.
    pub const EMPTY_OK: u16 = 1 << 4;
}

/// Unbounded arity marker.
pub const ARITY_ANY: u8 = u8::MAX;

/// One dispatch-table row.
#[derive(Debug, Clone, Copy)]
pub struct MacroRow {
    /// Handler family.
    pub family: Family,
    /// Attribute bits from [`attr`].
    pub flags: u16,
    /// Paired macro: the closer for an explicit opener, the opener for
    /// a closer.
    pub pair: Option<MdocMacro>,
    /// Minimum argument count enforced by validation.
    pub arity_min: u8,
    /// Maximum argument count; [`ARITY_ANY`] for unbounded.
    pub arity_max: u8,
}

const fn row(family: Family, flags: u16, pair: Option<MdocMacro>, min: u8, max: u8) -> MacroRow {
    MacroRow { family, flags, pair, arity_min: min, arity_max: max }
}

/// Dispatch-table row for a macro.
pub fn lookup(mac: MdocMacro) -> MacroRow {
    use Family::*;
    use MdocMacro as M;
    use attr::*;

    match mac {
        // Prologue.
        M::Dd | M::Dt | M::Os => row(Prologue, EMPTY_OK, None, 0, ARITY_ANY),

        // Multi-line layout blocks.
        M::Sh | M::Ss => row(Layout, PARSED, None, 1, ARITY_ANY),
        M::Bd => row(Layout, EXPLICIT, Some(M::Ed), 0, ARITY_ANY),
        M::Bl => row(Layout, EXPLICIT, Some(M::El), 0, ARITY_ANY),
        M::It => row(Layout, PARSED | SHALLOW | EMPTY_OK, None, 0, ARITY_ANY),
        M::Rs => row(Layout, EXPLICIT | EMPTY_OK, Some(M::Re), 0, 0),

        // One-line displays and enclosures.
        M::D1 | M::Dl => row(PartialLine, PARSED, None, 1, ARITY_ANY),
        M::Aq | M::Bq | M::Brq | M::Dq | M::Op | M::Pq | M::Ql | M::Qq | M::Sq => {
            row(PartialLine, PARSED | CALLABLE | EMPTY_OK, None, 0, ARITY_ANY)
        }

        // Explicitly closed enclosures.
        M::Ao => row(PartialExplicit, PARSED | CALLABLE | EMPTY_OK, Some(M::Ac), 0, ARITY_ANY),
        M::Bo => row(PartialExplicit, PARSED | CALLABLE | EMPTY_OK, Some(M::Bc), 0, ARITY_ANY),
        M::Bro => row(PartialExplicit, PARSED | CALLABLE | EMPTY_OK, Some(M::Brc), 0, ARITY_ANY),
        M::Do => row(PartialExplicit, PARSED | CALLABLE | EMPTY_OK, Some(M::Dc), 0, ARITY_ANY),
        M::Eo => row(PartialExplicit, PARSED | CALLABLE | EMPTY_OK, Some(M::Ec), 0, ARITY_ANY),
        M::Fo => row(PartialExplicit, EMPTY_OK, Some(M::Fc), 1, 1),
        M::Oo => row(PartialExplicit, PARSED | CALLABLE | EMPTY_OK, Some(M::Oc), 0, ARITY_ANY),
        M::Po => row(PartialExplicit, PARSED | CALLABLE | EMPTY_OK, Some(M::Pc), 0, ARITY_ANY),
        M::Qo => row(PartialExplicit, PARSED | CALLABLE | EMPTY_OK, Some(M::Qc), 0, ARITY_ANY),
        M::So => row(PartialExplicit, PARSED | CALLABLE | EMPTY_OK, Some(M::Sc), 0, ARITY_ANY),
        M::Xo => row(PartialExplicit, PARSED | CALLABLE | EMPTY_OK, Some(M::Xc), 0, ARITY_ANY),
        M::Bf => row(PartialExplicit, EMPTY_OK, Some(M::Ef), 0, 1),
        M::Bk => row(PartialExplicit, EMPTY_OK, Some(M::Ek), 0, 0),

        // Closers.
        M::Ac => row(Close, CALLABLE, Some(M::Ao), 0, ARITY_ANY),
        M::Bc => row(Close, CALLABLE, Some(M::Bo), 0, ARITY_ANY),
        M::Brc => row(Close, CALLABLE, Some(M::Bro), 0, ARITY_ANY),
        M::Dc => row(Close, CALLABLE, Some(M::Do), 0, ARITY_ANY),
        M::Ec => row(Close, CALLABLE, Some(M::Eo), 0, ARITY_ANY),
        M::Fc => row(Close, CALLABLE, Some(M::Fo), 0, ARITY_ANY),
        M::Oc => row(Close, CALLABLE, Some(M::Oo), 0, ARITY_ANY),
        M::Pc => row(Close, CALLABLE, Some(M::Po), 0, ARITY_ANY),
        M::Qc => row(Close, CALLABLE, Some(M::Qo), 0, ARITY_ANY),
        M::Sc => row(Close, CALLABLE, Some(M::So), 0, ARITY_ANY),
        M::Xc => row(Close, CALLABLE, Some(M::Xo), 0, ARITY_ANY),
        M::Ef => row(Close, 0, Some(M::Bf), 0, 0),
        M::Ek => row(Close, 0, Some(M::Bk), 0, 0),
        M::Ed => row(Close, 0, Some(M::Bd), 0, 0),
        M::El => row(Close, 0, Some(M::Bl), 0, 0),
        M::Re => row(Close, 0, Some(M::Rs), 0, 0),

        // Inline text macros.
        M::Ad | M::An | M::Cd | M::Cm | M::Dv | M::Er | M::Ev | M::Fa | M::Ft | M::Ic
        | M::In | M::Li | M::Ms | M::Mt | M::Pa | M::Sx | M::Sy | M::Tn | M::Va | M::Vt
        | M::Em | M::No | M::Lk | M::En => row(Text, PARSED | CALLABLE, None, 1, ARITY_ANY),
        M::Ar | M::Fl | M::Nm => {
            row(Text, PARSED | CALLABLE | EMPTY_OK, None, 0, ARITY_ANY)
        }
        M::Fd | M::Nd => row(Text, 0, None, 1, ARITY_ANY),
        M::Ot => row(Text, PARSED | CALLABLE, None, 1, ARITY_ANY),
        M::Hf | M::Fr => row(Text, 0, None, 1, ARITY_ANY),

        // Reference entries, legal only inside `Rs`.
        M::PctA | M::PctB | M::PctC | M::PctD | M::PctI | M::PctJ | M::PctN | M::PctO
        | M::PctP | M::PctQ | M::PctR | M::PctT | M::PctU | M::PctV => {
            row(Text, 0, None, 1, ARITY_ANY)
        }

        // Positional macros.
        M::Fn => row(Ordered, PARSED | CALLABLE, None, 1, ARITY_ANY),
        M::Xr => row(Ordered, CALLABLE, None, 1, 2),
        M::Ex | M::Rv => row(Ordered, EMPTY_OK, None, 0, 0),
        M::St => row(Ordered, CALLABLE, None, 1, 1),
        M::At | M::Bsx | M::Bx | M::Dx | M::Fx | M::Nx | M::Ox | M::Ux => {
            row(Ordered, PARSED | CALLABLE | EMPTY_OK, None, 0, 2)
        }
        M::Pf => row(Ordered, CALLABLE, None, 1, ARITY_ANY),
        M::Lb => row(Ordered, CALLABLE, None, 1, 1),
        M::Es => row(Ordered, CALLABLE | EMPTY_OK, None, 0, 2),

        // Side-effect handlers.
        M::Pp | M::Lp | M::Br => row(Special, EMPTY_OK, None, 0, 0),
        M::Sp => row(Special, EMPTY_OK, None, 0, 1),
        M::Ns | M::Ap => row(Special, CALLABLE | EMPTY_OK, None, 0, 0),
        M::Sm | M::Db => row(Special, EMPTY_OK, None, 0, 1),
        M::Bt | M::Ud => row(Special, EMPTY_OK, None, 0, 0),
        M::Ta => row(Special, CALLABLE | EMPTY_OK, None, 0, 0),
    }
}

/// Whether `word` names a callable macro.
pub fn callable(word: &str) -> Option<MdocMacro> {
    let mac = MdocMacro::from_name(word)?;
    if lookup(mac).flags & attr::CALLABLE != 0 { Some(mac) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_pairs_are_symmetric() {
        for (open, close) in [
            (MdocMacro::Bd, MdocMacro::Ed),
            (MdocMacro::Bl, MdocMacro::El),
            (MdocMacro::Ao, MdocMacro::Ac),
            (MdocMacro::Fo, MdocMacro::Fc),
            (MdocMacro::Rs, MdocMacro::Re),
            (MdocMacro::Bf, MdocMacro::Ef),
        ] {
            assert_eq!(lookup(open).pair, Some(close));
            assert_eq!(lookup(close).pair, Some(open));
        }
    }

    #[test]
    fn callables_exclude_structure_macros() {
        assert!(callable("Fl").is_some());
        assert!(callable("Ar").is_some());
        assert!(callable("Sh").is_none());
        assert!(callable("Dd").is_none());
        assert!(callable("word").is_none());
    }

    #[test]
    fn xr_declares_two_positional_arguments() {
        let row = lookup(MdocMacro::Xr);
        assert_eq!((row.arity_min, row.arity_max), (1, 2));
    }
}
