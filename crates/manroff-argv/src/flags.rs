//! Flag parsing: the leading `-word` groups of a macro line.

use manroff_ast::{Arg, ArgFlag, ArgList, MdocMacro};
use manroff_diagnostics::{Code, Diagnostic, DiagnosticSink};

use crate::cursor::{ArgCursor, ArgFlavor, ArgsProfile};

/// How many value words a flag consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
    /// No value (`-split`).
    None,
    /// Exactly one following word (`-width xx`).
    Single,
    /// At most one following word (`-offset` with or without a value).
    OptionalSingle,
    /// A run of words ended by another `-flag` or end-of-line
    /// (`-column x y z`).
    Multi,
}

/// Value shape of each flag.
pub fn flag_shape(flag: ArgFlag) -> ArgShape {
    match flag {
        ArgFlag::File | ArgFlag::Width => ArgShape::Single,
        ArgFlag::Offset => ArgShape::OptionalSingle,
        ArgFlag::Column => ArgShape::Multi,
        _ => ArgShape::None,
    }
}

const VOCAB_AN: &[ArgFlag] = &[ArgFlag::Split, ArgFlag::Nosplit];

const VOCAB_BD: &[ArgFlag] = &[
    ArgFlag::Ragged,
    ArgFlag::Unfilled,
    ArgFlag::Filled,
    ArgFlag::Literal,
    ArgFlag::File,
    ArgFlag::Offset,
    ArgFlag::Compact,
    ArgFlag::Centred,
];

const VOCAB_BF: &[ArgFlag] = &[ArgFlag::Emphasis, ArgFlag::Literal, ArgFlag::Symbolic];

const VOCAB_BK: &[ArgFlag] = &[ArgFlag::Words];

const VOCAB_BL: &[ArgFlag] = &[
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
    ArgFlag::Width,
    ArgFlag::Offset,
    ArgFlag::Compact,
    ArgFlag::Nested,
];

const VOCAB_STD: &[ArgFlag] = &[ArgFlag::Std];

const VOCAB_ST: &[ArgFlag] = &[
    ArgFlag::P1003_1_88,
    ArgFlag::P1003_1_90,
    ArgFlag::P1003_1_96,
    ArgFlag::P1003_1_2001,
    ArgFlag::P1003_1_2004,
    ArgFlag::P1003_1,
    ArgFlag::P1003_1b,
    ArgFlag::P1003_1b_93,
    ArgFlag::P1003_1c_95,
    ArgFlag::P1003_1g_2000,
    ArgFlag::P1003_2_92,
    ArgFlag::P1387_2_95,
    ArgFlag::P1003_2,
    ArgFlag::P1387_2,
    ArgFlag::IsoC90,
    ArgFlag::IsoCAmd1,
    ArgFlag::IsoCTcor1,
    ArgFlag::IsoCTcor2,
    ArgFlag::IsoC99,
    ArgFlag::AnsiC,
    ArgFlag::AnsiC89,
    ArgFlag::AnsiC99,
    ArgFlag::Ieee754,
    ArgFlag::Iso8802_3,
    ArgFlag::Xpg3,
    ArgFlag::Xpg4,
    ArgFlag::Xpg4_2,
    ArgFlag::Xpg4_3,
    ArgFlag::Xbd5,
    ArgFlag::Xcu5,
    ArgFlag::Xsh5,
    ArgFlag::Xns5,
    ArgFlag::Xns5_2d2_0,
    ArgFlag::Xcurses4_2,
    ArgFlag::Susv2,
    ArgFlag::Susv3,
    ArgFlag::Svid4,
];

/// Flag vocabulary a macro accepts; empty for most macros.
pub fn flag_vocabulary(mac: MdocMacro) -> &'static [ArgFlag] {
    match mac {
        MdocMacro::An => VOCAB_AN,
        MdocMacro::Bd => VOCAB_BD,
        MdocMacro::Bf => VOCAB_BF,
        MdocMacro::Bk => VOCAB_BK,
        MdocMacro::Bl => VOCAB_BL,
        MdocMacro::Ex | MdocMacro::Rv => VOCAB_STD,
        MdocMacro::St => VOCAB_ST,
        _ => &[],
    }
}

/// Static argument parsing profile of a macro.
///
/// `It` inside a columnated list is promoted to `TabSep` dynamically by
/// the dispatcher; the static entry stays `None`.
pub fn args_profile(mac: MdocMacro) -> ArgsProfile {
    use MdocMacro::*;
    match mac {
        Ap | D1 | Dl | Ad | An | Ar | Cd | Cm | Dv | Er | Ev | Fa | Fl | Fn | Ft | Ic | In
        | Li | Nm | Op | Ot | Pa | St | Va | Vt | Xr | Ac | Aq | At | Bc | Bq | Bsx | Bx | Dc
        | Dq | Ec | Em | Fx | Ms | No | Ns | Nx | Ox | Pc | Pf | Pq | Qc | Ql | Qq | Sc | Sq
        | Sx | Sy | Tn | Ux | Xc | Fc | Oc | Fr | Lb | Lk | Mt | Brq | Brc | En | Dx => {
            ArgsProfile::Delim
        }
        _ => ArgsProfile::None,
    }
}

/// Parse the leading `-flag [value ...]` groups of a macro line.
///
/// Stops at the first word that is not a recognized flag; an
/// unrecognized `-`-prefixed word warns and is left for the caller to
/// consume as an ordinary argument. Returns `None` when no flag was
/// recognized.
pub fn parse_flags<S: DiagnosticSink>(
    mac: MdocMacro,
    cursor: &mut ArgCursor<'_>,
    sink: &mut S,
) -> Option<ArgList> {
    let vocab = flag_vocabulary(mac);
    if vocab.is_empty() {
        return None;
    }

    let mut list = ArgList::new();
    loop {
        let save = cursor.pos;
        if !cursor.rest().starts_with('-') {
            break;
        }
        cursor.pos += 1;
        let tok = cursor.next_arg(ArgsProfile::None, sink);
        if tok.flavor != ArgFlavor::Word {
            cursor.pos = save;
            break;
        }
        let Some(flag) = vocab.iter().copied().find(|f| f.name() == tok.word) else {
            sink.report(
                Diagnostic::new(Code::ArgLikeParameter, cursor.line_no(), save)
                    .with_detail(format!("-{}", tok.word)),
            );
            cursor.pos = save;
            break;
        };

        let mut arg = Arg { flag, line: cursor.line_no(), pos: save, values: Vec::new() };
        match flag_shape(flag) {
            ArgShape::None => {}
            ArgShape::Single => {
                let val = cursor.next_arg(ArgsProfile::None, sink);
                if matches!(val.flavor, ArgFlavor::Word | ArgFlavor::QuotedWord) {
                    arg.values.push(val.word);
                }
            }
            ArgShape::OptionalSingle => {
                if !cursor.rest().is_empty() && !cursor.rest().starts_with('-') {
                    let val = cursor.next_arg(ArgsProfile::None, sink);
                    if matches!(val.flavor, ArgFlavor::Word | ArgFlavor::QuotedWord) {
                        arg.values.push(val.word);
                    }
                }
            }
            ArgShape::Multi => {
                while !cursor.rest().is_empty() && !cursor.rest().starts_with('-') {
                    let val = cursor.next_arg(ArgsProfile::None, sink);
                    if !matches!(val.flavor, ArgFlavor::Word | ArgFlavor::QuotedWord) {
                        break;
                    }
                    arg.values.push(val.word);
                }
            }
        }
        list.args.push(arg);
    }

    if list.args.is_empty() { None } else { Some(list) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manroff_diagnostics::MemorySink;
    use pretty_assertions::assert_eq;

    fn parse(mac: MdocMacro, line: &str) -> (Option<ArgList>, MemorySink, String) {
        let mut sink = MemorySink::new();
        let mut cursor = ArgCursor::new(line, 0, 1);
        let list = parse_flags(mac, &mut cursor, &mut sink);
        (list, sink, cursor.rest().to_string())
    }

    #[test]
    fn bare_flags() {
        let (list, _, rest) = parse(MdocMacro::Bl, "-tag -compact");
        let list = list.unwrap();
        assert!(list.has(ArgFlag::Tag));
        assert!(list.has(ArgFlag::Compact));
        assert_eq!(rest, "");
    }

    #[test]
    fn single_shape_takes_one_value() {
        let (list, _, rest) = parse(MdocMacro::Bl, "-width 10n item");
        let list = list.unwrap();
        assert_eq!(list.find(ArgFlag::Width).unwrap().values, vec!["10n"]);
        assert_eq!(rest, "item");
    }

    #[test]
    fn single_shape_accepts_quoted_value() {
        let (list, _, _) = parse(MdocMacro::Bl, "-width \"two words\"");
        let list = list.unwrap();
        assert_eq!(list.find(ArgFlag::Width).unwrap().values, vec!["two words"]);
    }

    #[test]
    fn optional_single_without_value() {
        let (list, _, _) = parse(MdocMacro::Bd, "-literal -offset -compact");
        let list = list.unwrap();
        assert!(list.find(ArgFlag::Offset).unwrap().values.is_empty());
        assert!(list.has(ArgFlag::Compact));
    }

    #[test]
    fn optional_single_with_value() {
        let (list, _, _) = parse(MdocMacro::Bd, "-offset indent");
        let list = list.unwrap();
        assert_eq!(list.find(ArgFlag::Offset).unwrap().values, vec!["indent"]);
    }

    #[test]
    fn multi_shape_runs_to_next_flag() {
        let (list, _, _) = parse(MdocMacro::Bl, "-column one two three -compact");
        let list = list.unwrap();
        assert_eq!(list.find(ArgFlag::Column).unwrap().values, vec!["one", "two", "three"]);
        assert!(list.has(ArgFlag::Compact));
    }

    #[test]
    fn unknown_dash_word_warns_and_stops() {
        let (list, sink, rest) = parse(MdocMacro::Bl, "-tag -gadget x");
        assert!(list.unwrap().has(ArgFlag::Tag));
        assert!(sink.has(Code::ArgLikeParameter));
        assert_eq!(rest, "-gadget x");
    }

    #[test]
    fn macro_without_vocabulary_parses_nothing() {
        let (list, _, rest) = parse(MdocMacro::Sh, "-tag");
        assert!(list.is_none());
        assert_eq!(rest, "-tag");
    }

    #[test]
    fn standards_vocabulary() {
        let (list, _, _) = parse(MdocMacro::St, "-p1003.1-88");
        assert!(list.unwrap().has(ArgFlag::P1003_1_88));
    }
}
