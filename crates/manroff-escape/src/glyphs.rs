//! Predefined glyph names and preprocessor string substitutions.
//!
//! Two static vocabularies live here: the glyph-name table consulted by
//! `\(xx` and `\[name]` escapes, mapping each mnemonic to a Unicode code
//! point, and the much smaller predefined-string table consulted by `\*`
//! interpolation. Both are closed; lookups on unknown names return `None`
//! and the caller decides whether that is a warning or an abort.

use phf::phf_map;

/// Glyph mnemonic → Unicode code point.
///
/// Covers the special-character vocabulary used by the two supported
/// macro dialects: typographic punctuation, ligatures, accented Latin,
/// the Greek alphabet, mathematical operators, arrows, and a handful of
/// miscellaneous symbols.
static GLYPHS: phf::Map<&'static str, u32> = phf_map! {
    // Dashes, hyphens, quotes
    "em" => 0x2014, "en" => 0x2013, "hy" => 0x2010,
    "lq" => 0x201C, "rq" => 0x201D, "oq" => 0x2018, "cq" => 0x2019,
    "aq" => 0x0027, "dq" => 0x0022, "Bq" => 0x201E, "bq" => 0x201A,
    "Fo" => 0x00AB, "Fc" => 0x00BB, "fo" => 0x2039, "fc" => 0x203A,
    // Punctuation and signs
    "r!" => 0x00A1, "r?" => 0x00BF, "sc" => 0x00A7, "ps" => 0x00B6,
    "at" => 0x0040, "sh" => 0x0023, "mc" => 0x00B5, "de" => 0x00B0,
    "dg" => 0x2020, "dd" => 0x2021, "bu" => 0x2022, "co" => 0x00A9,
    "rg" => 0x00AE, "tm" => 0x2122, "fm" => 0x2032, "sd" => 0x2033,
    "%0" => 0x2030, "ci" => 0x25CB, "sq" => 0x25A1, "lz" => 0x25CA,
    "OK" => 0x2713, "CR" => 0x21B5,
    // Legal-size characters
    "rs" => 0x005C, "ti" => 0x007E, "ha" => 0x005E,
    "sl" => 0x002F, "ba" => 0x007C, "br" => 0x2502, "ul" => 0x005F,
    "rn" => 0x203E, "bb" => 0x00A6, "bv" => 0x23AA,
    // Mathematics
    "pl" => 0x002B, "mi" => 0x2212, "eq" => 0x003D,
    "lt" => 0x003C, "gt" => 0x003E, "<=" => 0x2264, ">=" => 0x2265,
    "!=" => 0x2260, "==" => 0x2261, "ne" => 0x2260,
    "ap" => 0x223C, "|=" => 0x2243, "~~" => 0x2248, "~=" => 0x2245,
    "pt" => 0x221D, "es" => 0x2205, "mo" => 0x2208, "nm" => 0x2209,
    "sb" => 0x2282, "sp" => 0x2283, "ib" => 0x2286, "ip" => 0x2287,
    "ca" => 0x2229, "cu" => 0x222A, "AN" => 0x2227, "OR" => 0x2228,
    "no" => 0x00AC, "te" => 0x2203, "fa" => 0x2200, "st" => 0x220B,
    "tf" => 0x2234, "3d" => 0x2234, "if" => 0x221E, "Ah" => 0x2135,
    "Im" => 0x2111, "Re" => 0x211C, "wp" => 0x2118, "pd" => 0x2202,
    "-h" => 0x210F, "12" => 0x00BD, "14" => 0x00BC, "34" => 0x00BE,
    "18" => 0x215B, "38" => 0x215C, "58" => 0x215D, "78" => 0x215E,
    "sr" => 0x221A, "is" => 0x222B, "+-" => 0x00B1, "di" => 0x00F7,
    "mu" => 0x00D7, "c*" => 0x2297, "c+" => 0x2295, "**" => 0x2217,
    "<<" => 0x226A, ">>" => 0x226B, "gr" => 0x2207,
    // Arrows
    "->" => 0x2192, "<-" => 0x2190, "ua" => 0x2191, "da" => 0x2193,
    "<>" => 0x2194, "va" => 0x2195,
    "lA" => 0x21D0, "rA" => 0x21D2, "uA" => 0x21D1, "dA" => 0x21D3,
    "hA" => 0x21D4, "vA" => 0x21D5,
    // Greek, lowercase
    "*a" => 0x03B1, "*b" => 0x03B2, "*g" => 0x03B3, "*d" => 0x03B4,
    "*e" => 0x03B5, "*z" => 0x03B6, "*y" => 0x03B7, "*h" => 0x03B8,
    "*i" => 0x03B9, "*k" => 0x03BA, "*l" => 0x03BB, "*m" => 0x03BC,
    "*n" => 0x03BD, "*c" => 0x03BE, "*o" => 0x03BF, "*p" => 0x03C0,
    "*r" => 0x03C1, "*s" => 0x03C3, "*t" => 0x03C4, "*u" => 0x03C5,
    "*f" => 0x03C6, "*x" => 0x03C7, "*q" => 0x03C8, "*w" => 0x03C9,
    "ts" => 0x03C2,
    // Greek, uppercase
    "*A" => 0x0391, "*B" => 0x0392, "*G" => 0x0393, "*D" => 0x0394,
    "*E" => 0x0395, "*Z" => 0x0396, "*Y" => 0x0397, "*H" => 0x0398,
    "*I" => 0x0399, "*K" => 0x039A, "*L" => 0x039B, "*M" => 0x039C,
    "*N" => 0x039D, "*C" => 0x039E, "*O" => 0x039F, "*P" => 0x03A0,
    "*R" => 0x03A1, "*S" => 0x03A3, "*T" => 0x03A4, "*U" => 0x03A5,
    "*F" => 0x03A6, "*X" => 0x03A7, "*Q" => 0x03A8, "*W" => 0x03A9,
    // Ligatures
    "ff" => 0xFB00, "fi" => 0xFB01, "fl" => 0xFB02,
    "Fi" => 0xFB03, "Fl" => 0xFB04,
    "AE" => 0x00C6, "ae" => 0x00E6, "OE" => 0x0152, "oe" => 0x0153,
    "ss" => 0x00DF, "IJ" => 0x0132, "ij" => 0x0133,
    // Accented Latin
    "'A" => 0x00C1, "'E" => 0x00C9, "'I" => 0x00CD, "'O" => 0x00D3,
    "'U" => 0x00DA, "'a" => 0x00E1, "'e" => 0x00E9, "'i" => 0x00ED,
    "'o" => 0x00F3, "'u" => 0x00FA,
    "`A" => 0x00C0, "`E" => 0x00C8, "`I" => 0x00CC, "`O" => 0x00D2,
    "`U" => 0x00D9, "`a" => 0x00E0, "`e" => 0x00E8, "`i" => 0x00EC,
    "`o" => 0x00F2, "`u" => 0x00F9,
    "^A" => 0x00C2, "^E" => 0x00CA, "^I" => 0x00CE, "^O" => 0x00D4,
    "^U" => 0x00DB, "^a" => 0x00E2, "^e" => 0x00EA, "^i" => 0x00EE,
    "^o" => 0x00F4, "^u" => 0x00FB,
    ":A" => 0x00C4, ":E" => 0x00CB, ":I" => 0x00CF, ":O" => 0x00D6,
    ":U" => 0x00DC, ":a" => 0x00E4, ":e" => 0x00EB, ":i" => 0x00EF,
    ":o" => 0x00F6, ":u" => 0x00FC, ":y" => 0x00FF,
    "~A" => 0x00C3, "~N" => 0x00D1, "~O" => 0x00D5, "~a" => 0x00E3,
    "~n" => 0x00F1, "~o" => 0x00F5,
    ",C" => 0x00C7, ",c" => 0x00E7, "/L" => 0x0141, "/l" => 0x0142,
    "/O" => 0x00D8, "/o" => 0x00F8, "oA" => 0x00C5, "oa" => 0x00E5,
    "-D" => 0x00D0, "Sd" => 0x00F0, "TP" => 0x00DE, "Tp" => 0x00FE,
    "'C" => 0x0106, "'c" => 0x0107,
    // Standalone accent marks
    "aa" => 0x00B4, "ga" => 0x0060, "a\"" => 0x02DD, "a-" => 0x00AF,
    "a." => 0x02D9, "a^" => 0x02C6, "ac" => 0x00B8, "ad" => 0x00A8,
    "ah" => 0x02C7, "ao" => 0x02DA, "a~" => 0x02DC, "ho" => 0x02DB,
    // Currency
    "Do" => 0x0024, "ct" => 0x00A2, "Eu" => 0x20AC, "eu" => 0x20AC,
    "Ye" => 0x00A5, "Po" => 0x00A3, "Cs" => 0x00A4, "Fn" => 0x0192,
    // Bracket pieces and pointers
    "lc" => 0x2308, "rc" => 0x2309, "lf" => 0x230A, "rf" => 0x230B,
    "lh" => 0x261C, "rh" => 0x261E,
    // Card suits
    "CL" => 0x2663, "SP" => 0x2660, "HE" => 0x2665, "DI" => 0x2666,
};

/// Preprocessor string substitutions for `\*` interpolation.
///
/// The subset of predefined strings the dialects rely on; user-defined
/// strings are out of scope.
static STRINGS: phf::Map<&'static str, &'static str> = phf_map! {
    "q" => "\"",
    "Am" => "&",
    "Ba" => "|",
    "Gt" => ">",
    "Lt" => "<",
    "Ge" => "\u{2265}",
    "Le" => "\u{2264}",
    "Ne" => "\u{2260}",
    "Pm" => "\u{00B1}",
    "If" => "infinity",
    "Pi" => "pi",
    "Na" => "NaN",
    "Lq" => "\u{201C}",
    "Rq" => "\u{201D}",
    "lp" => "(",
    "rp" => ")",
    "R" => "\u{00AE}",
    "Tm" => "(Tm)",
    "left-bracket" => "[",
    "right-bracket" => "]",
    "<=" => "\u{2264}",
    ">=" => "\u{2265}",
};

/// Resolve a glyph mnemonic to its Unicode code point.
pub fn glyph_codepoint(name: &str) -> Option<u32> {
    GLYPHS.get(name).copied()
}

/// Resolve a predefined-string name to its substitution text.
pub fn predefined_string(name: &str) -> Option<&'static str> {
    STRINGS.get(name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_letter_names_resolve() {
        assert_eq!(glyph_codepoint("em"), Some(0x2014));
        assert_eq!(glyph_codepoint("<="), Some(0x2264));
        assert_eq!(glyph_codepoint("*p"), Some(0x03C0));
    }

    #[test]
    fn unknown_name_is_none() {
        assert_eq!(glyph_codepoint("zz"), None);
        assert_eq!(predefined_string("nosuch"), None);
    }

    #[test]
    fn every_glyph_is_a_scalar_value() {
        for (name, &cp) in GLYPHS.entries() {
            assert!(char::from_u32(cp).is_some(), "glyph {name} maps outside scalar range");
        }
    }

    #[test]
    fn predefined_strings_resolve() {
        assert_eq!(predefined_string("Am"), Some("&"));
        assert_eq!(predefined_string("Lq"), Some("\u{201C}"));
    }
}
