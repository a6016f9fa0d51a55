//! Width-argument resolution for tagged lists.
//!
//! The `-width` value picks, in order: a numeric literal with a letter
//! unit (`n`/`m`) meaning character cells, the keywords `indent` /
//! `indent-two`, or a known macro name, which resolves to that macro's
//! canonical cell width.

use manroff_ast::MdocMacro;

/// Default width when nothing better can be determined.
pub const DEFAULT_WIDTH: usize = 10;

/// Canonical cell width of a macro used as a `-width` argument or as
/// the first element of a tagged-list item.
pub fn macro_width(mac: MdocMacro) -> usize {
    use MdocMacro::*;
    match mac {
        Ad | An | Ar | Cd | Dq | Dv | Fa | No | Pf | Po | Pq | Sq | Va | Vt => 12,
        Bsx | Ic | Ms | Sy => 6,
        Bx | Ft | St => 8,
        Cm | Do | Fl | Fx | Nm | Oo | Ta | Tn | Ux | Xr => 10,
        Em => 10,
        Er => 17,
        Ev => 15,
        Fn | Fo | Li | Ql => 16,
        Op => 14,
        Pa => 32,
        Qo | Qq => 12,
        Eo => 12,
        _ => DEFAULT_WIDTH,
    }
}

/// Resolve a `-width` argument string to cells.
///
/// Returns `None` for values that are neither a unit literal, a known
/// keyword, nor a known macro name; the caller warns and keeps the
/// string for renderers that measure it themselves.
pub fn resolve_width(value: &str) -> Option<usize> {
    if let Some(unit_pos) = value.find(|c: char| !c.is_ascii_digit()) {
        let (digits, unit) = value.split_at(unit_pos);
        if !digits.is_empty() && (unit == "n" || unit == "m") {
            return digits.parse().ok();
        }
    } else if !value.is_empty() {
        // A bare number counts cells directly.
        return value.parse().ok();
    }
    match value {
        "indent" => return Some(6),
        "indent-two" => return Some(12),
        _ => {}
    }
    MdocMacro::from_name(value).map(macro_width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_literals_with_units() {
        assert_eq!(resolve_width("10n"), Some(10));
        assert_eq!(resolve_width("4m"), Some(4));
        assert_eq!(resolve_width("7"), Some(7));
        assert_eq!(resolve_width("10x"), None);
    }

    #[test]
    fn indent_keywords() {
        assert_eq!(resolve_width("indent"), Some(6));
        assert_eq!(resolve_width("indent-two"), Some(12));
    }

    #[test]
    fn macro_names_use_canonical_widths() {
        assert_eq!(resolve_width("Fl"), Some(10));
        assert_eq!(resolve_width("Er"), Some(17));
        assert_eq!(resolve_width("gadget"), None);
    }
}
