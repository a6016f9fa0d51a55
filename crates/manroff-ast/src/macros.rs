//! The two closed macro vocabularies.
//!
//! [`MdocMacro`] is the structured (semantic) dialect describing
//! utilities, functions, and cross-references; [`ManMacro`] is the
//! presentation (paragraph-and-font) dialect. Name lookup goes through
//! `phf` tables; [`Mac`] is the tagged union stored on tree nodes.

use phf::phf_map;
use std::fmt;

/// Structured-dialect macros, in canonical table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum MdocMacro {
    Ap, Dd, Dt, Os, Sh, Ss, Pp, D1, Dl, Bd, Ed, Bl, El, It, Ad, An, Ar,
    Cd, Cm, Dv, Er, Ev, Ex, Fa, Fd, Fl, Fn, Ft, Ic, In, Li, Nd, Nm, Op,
    Ot, Pa, Rv, St, Va, Vt, Xr,
    /// `%A`: reference author.
    PctA,
    /// `%B`: reference book title.
    PctB,
    /// `%C`: reference place of publication.
    PctC,
    /// `%D`: reference date.
    PctD,
    /// `%I`: reference issuer.
    PctI,
    /// `%J`: reference journal.
    PctJ,
    /// `%N`: reference issue number.
    PctN,
    /// `%O`: reference optional information.
    PctO,
    /// `%P`: reference pages.
    PctP,
    /// `%Q`: reference corporate author.
    PctQ,
    /// `%R`: reference report title.
    PctR,
    /// `%T`: reference article title.
    PctT,
    /// `%U`: reference URI.
    PctU,
    /// `%V`: reference volume.
    PctV,
    Ac, Ao, Aq, At, Bc, Bf, Bo, Bq, Bsx, Bx, Db, Dc, Do, Dq, Ec, Ef, Em,
    Eo, Fx, Ms, No, Ns, Nx, Ox, Pc, Pf, Po, Pq, Qc, Ql, Qo, Qq, Re, Rs,
    Sc, So, Sq, Sm, Sx, Sy, Tn, Ux, Xc, Xo, Fo, Fc, Oo, Oc, Bk, Ek, Bt,
    Hf, Fr, Ud, Lb, Lp, Lk, Mt, Brq, Bro, Brc, Es, En, Dx,
    /// `br`: output line break request.
    Br,
    /// `sp`: vertical space request.
    Sp,
    /// `Ta`: table cell separator inside column lists.
    Ta,
}

static MDOC_NAMES: phf::Map<&'static str, MdocMacro> = phf_map! {
    "Ap" => MdocMacro::Ap, "Dd" => MdocMacro::Dd, "Dt" => MdocMacro::Dt,
    "Os" => MdocMacro::Os, "Sh" => MdocMacro::Sh, "Ss" => MdocMacro::Ss,
    "Pp" => MdocMacro::Pp, "D1" => MdocMacro::D1, "Dl" => MdocMacro::Dl,
    "Bd" => MdocMacro::Bd, "Ed" => MdocMacro::Ed, "Bl" => MdocMacro::Bl,
    "El" => MdocMacro::El, "It" => MdocMacro::It, "Ad" => MdocMacro::Ad,
    "An" => MdocMacro::An, "Ar" => MdocMacro::Ar, "Cd" => MdocMacro::Cd,
    "Cm" => MdocMacro::Cm, "Dv" => MdocMacro::Dv, "Er" => MdocMacro::Er,
    "Ev" => MdocMacro::Ev, "Ex" => MdocMacro::Ex, "Fa" => MdocMacro::Fa,
    "Fd" => MdocMacro::Fd, "Fl" => MdocMacro::Fl, "Fn" => MdocMacro::Fn,
    "Ft" => MdocMacro::Ft, "Ic" => MdocMacro::Ic, "In" => MdocMacro::In,
    "Li" => MdocMacro::Li, "Nd" => MdocMacro::Nd, "Nm" => MdocMacro::Nm,
    "Op" => MdocMacro::Op, "Ot" => MdocMacro::Ot, "Pa" => MdocMacro::Pa,
    "Rv" => MdocMacro::Rv, "St" => MdocMacro::St, "Va" => MdocMacro::Va,
    "Vt" => MdocMacro::Vt, "Xr" => MdocMacro::Xr,
    "%A" => MdocMacro::PctA, "%B" => MdocMacro::PctB, "%C" => MdocMacro::PctC,
    "%D" => MdocMacro::PctD, "%I" => MdocMacro::PctI, "%J" => MdocMacro::PctJ,
    "%N" => MdocMacro::PctN, "%O" => MdocMacro::PctO, "%P" => MdocMacro::PctP,
    "%Q" => MdocMacro::PctQ, "%R" => MdocMacro::PctR, "%T" => MdocMacro::PctT,
    "%U" => MdocMacro::PctU, "%V" => MdocMacro::PctV,
    "Ac" => MdocMacro::Ac, "Ao" => MdocMacro::Ao, "Aq" => MdocMacro::Aq,
    "At" => MdocMacro::At, "Bc" => MdocMacro::Bc, "Bf" => MdocMacro::Bf,
    "Bo" => MdocMacro::Bo, "Bq" => MdocMacro::Bq, "Bsx" => MdocMacro::Bsx,
    "Bx" => MdocMacro::Bx, "Db" => MdocMacro::Db, "Dc" => MdocMacro::Dc,
    "Do" => MdocMacro::Do, "Dq" => MdocMacro::Dq, "Ec" => MdocMacro::Ec,
    "Ef" => MdocMacro::Ef, "Em" => MdocMacro::Em, "Eo" => MdocMacro::Eo,
    "Fx" => MdocMacro::Fx, "Ms" => MdocMacro::Ms, "No" => MdocMacro::No,
    "Ns" => MdocMacro::Ns, "Nx" => MdocMacro::Nx, "Ox" => MdocMacro::Ox,
    "Pc" => MdocMacro::Pc, "Pf" => MdocMacro::Pf, "Po" => MdocMacro::Po,
    "Pq" => MdocMacro::Pq, "Qc" => MdocMacro::Qc, "Ql" => MdocMacro::Ql,
    "Qo" => MdocMacro::Qo, "Qq" => MdocMacro::Qq, "Re" => MdocMacro::Re,
    "Rs" => MdocMacro::Rs, "Sc" => MdocMacro::Sc, "So" => MdocMacro::So,
    "Sq" => MdocMacro::Sq, "Sm" => MdocMacro::Sm, "Sx" => MdocMacro::Sx,
    "Sy" => MdocMacro::Sy, "Tn" => MdocMacro::Tn, "Ux" => MdocMacro::Ux,
    "Xc" => MdocMacro::Xc, "Xo" => MdocMacro::Xo, "Fo" => MdocMacro::Fo,
    "Fc" => MdocMacro::Fc, "Oo" => MdocMacro::Oo, "Oc" => MdocMacro::Oc,
    "Bk" => MdocMacro::Bk, "Ek" => MdocMacro::Ek, "Bt" => MdocMacro::Bt,
    "Hf" => MdocMacro::Hf, "Fr" => MdocMacro::Fr, "Ud" => MdocMacro::Ud,
    "Lb" => MdocMacro::Lb, "Lp" => MdocMacro::Lp, "Lk" => MdocMacro::Lk,
    "Mt" => MdocMacro::Mt, "Brq" => MdocMacro::Brq, "Bro" => MdocMacro::Bro,
    "Brc" => MdocMacro::Brc, "Es" => MdocMacro::Es, "En" => MdocMacro::En,
    "Dx" => MdocMacro::Dx, "br" => MdocMacro::Br, "sp" => MdocMacro::Sp,
    "Ta" => MdocMacro::Ta,
};

impl MdocMacro {
    /// Look a macro up by its source spelling.
    pub fn from_name(name: &str) -> Option<Self> {
        MDOC_NAMES.get(name).copied()
    }

    /// Canonical source spelling.
    pub fn name(self) -> &'static str {
        use MdocMacro::*;
        match self {
            Ap => "Ap", Dd => "Dd", Dt => "Dt", Os => "Os", Sh => "Sh",
            Ss => "Ss", Pp => "Pp", D1 => "D1", Dl => "Dl", Bd => "Bd",
            Ed => "Ed", Bl => "Bl", El => "El", It => "It", Ad => "Ad",
            An => "An", Ar => "Ar", Cd => "Cd", Cm => "Cm", Dv => "Dv",
            Er => "Er", Ev => "Ev", Ex => "Ex", Fa => "Fa", Fd => "Fd",
            Fl => "Fl", Fn => "Fn", Ft => "Ft", Ic => "Ic", In => "In",
            Li => "Li", Nd => "Nd", Nm => "Nm", Op => "Op", Ot => "Ot",
            Pa => "Pa", Rv => "Rv", St => "St", Va => "Va", Vt => "Vt",
            Xr => "Xr",
            PctA => "%A", PctB => "%B", PctC => "%C", PctD => "%D",
            PctI => "%I", PctJ => "%J", PctN => "%N", PctO => "%O",
            PctP => "%P", PctQ => "%Q", PctR => "%R", PctT => "%T",
            PctU => "%U", PctV => "%V",
            Ac => "Ac", Ao => "Ao", Aq => "Aq", At => "At", Bc => "Bc",
            Bf => "Bf", Bo => "Bo", Bq => "Bq", Bsx => "Bsx", Bx => "Bx",
            Db => "Db", Dc => "Dc", Do => "Do", Dq => "Dq", Ec => "Ec",
            Ef => "Ef", Em => "Em", Eo => "Eo", Fx => "Fx", Ms => "Ms",
            No => "No", Ns => "Ns", Nx => "Nx", Ox => "Ox", Pc => "Pc",
            Pf => "Pf", Po => "Po", Pq => "Pq", Qc => "Qc", Ql => "Ql",
            Qo => "Qo", Qq => "Qq", Re => "Re", Rs => "Rs", Sc => "Sc",
            So => "So", Sq => "Sq", Sm => "Sm", Sx => "Sx", Sy => "Sy",
            Tn => "Tn", Ux => "Ux", Xc => "Xc", Xo => "Xo", Fo => "Fo",
            Fc => "Fc", Oo => "Oo", Oc => "Oc", Bk => "Bk", Ek => "Ek",
            Bt => "Bt", Hf => "Hf", Fr => "Fr", Ud => "Ud", Lb => "Lb",
            Lp => "Lp", Lk => "Lk", Mt => "Mt", Brq => "Brq", Bro => "Bro",
            Brc => "Brc", Es => "Es", En => "En", Dx => "Dx", Br => "br",
            Sp => "sp", Ta => "Ta",
        }
    }
}

impl fmt::Display for MdocMacro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Presentation-dialect macros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ManMacro {
    /// `br`: line break.
    Break,
    /// `TH`: title heading, the prologue.
    Th,
    /// `SH`: section heading.
    Sh,
    /// `SS`: subsection heading.
    Ss,
    /// `TP`: tagged paragraph; the tag is the next line.
    Tp,
    /// `LP`: plain paragraph.
    Lp,
    /// `PP`: plain paragraph.
    Pp,
    /// `P`: plain paragraph.
    P,
    /// `IP`: indented paragraph with an optional inline tag.
    Ip,
    /// `HP`: hanging paragraph.
    Hp,
    /// `SM`: small type.
    Sm,
    /// `SB`: small bold type.
    Sb,
    /// `BI`: alternate bold and italic.
    Bi,
    /// `IB`: alternate italic and bold.
    Ib,
    /// `BR`: alternate bold and roman.
    Br,
    /// `RB`: alternate roman and bold.
    Rb,
    /// `R`: roman.
    R,
    /// `B`: bold.
    B,
    /// `I`: italic.
    I,
    /// `IR`: alternate italic and roman.
    Ir,
    /// `RI`: alternate roman and italic.
    Ri,
    /// `na`: disable adjustment.
    Na,
    /// `i`: italic request form.
    Ital,
    /// `sp`: vertical space.
    Sp,
    /// `nf`: begin literal (no-fill) mode.
    Nf,
    /// `fi`: end literal mode.
    Fi,
    /// `r`: roman request form.
    Rom,
    /// `RE`: end relative indent.
    Re,
    /// `RS`: begin relative indent.
    Rs,
    /// `DT`: restore default tabs.
    Dt,
    /// `UC`: BSD version marker.
    Uc,
    /// `PD`: paragraph distance.
    Pd,
    /// `AT`: AT&T version marker.
    At,
    /// `in`: indent request form.
    Indent,
}

static MAN_NAMES: phf::Map<&'static str, ManMacro> = phf_map! {
    "br" => ManMacro::Break, "TH" => ManMacro::Th, "SH" => ManMacro::Sh,
    "SS" => ManMacro::Ss, "TP" => ManMacro::Tp, "LP" => ManMacro::Lp,
    "PP" => ManMacro::Pp, "P" => ManMacro::P, "IP" => ManMacro::Ip,
    "HP" => ManMacro::Hp, "SM" => ManMacro::Sm, "SB" => ManMacro::Sb,
    "BI" => ManMacro::Bi, "IB" => ManMacro::Ib, "BR" => ManMacro::Br,
    "RB" => ManMacro::Rb, "R" => ManMacro::R, "B" => ManMacro::B,
    "I" => ManMacro::I, "IR" => ManMacro::Ir, "RI" => ManMacro::Ri,
    "na" => ManMacro::Na, "i" => ManMacro::Ital, "sp" => ManMacro::Sp,
    "nf" => ManMacro::Nf, "fi" => ManMacro::Fi, "r" => ManMacro::Rom,
    "RE" => ManMacro::Re, "RS" => ManMacro::Rs, "DT" => ManMacro::Dt,
    "UC" => ManMacro::Uc, "PD" => ManMacro::Pd, "AT" => ManMacro::At,
    "in" => ManMacro::Indent,
    // Obsolete spellings accepted for compatibility.
    "Sp" => ManMacro::Sp, "Vb" => ManMacro::Nf, "Ve" => ManMacro::Fi,
};

impl ManMacro {
    /// Look a macro up by its source spelling (obsolete aliases included).
    pub fn from_name(name: &str) -> Option<Self> {
        MAN_NAMES.get(name).copied()
    }

    /// Canonical source spelling.
    pub fn name(self) -> &'static str {
        use ManMacro::*;
        match self {
            Break => "br", Th => "TH", Sh => "SH", Ss => "SS", Tp => "TP",
            Lp => "LP", Pp => "PP", P => "P", Ip => "IP", Hp => "HP",
            Sm => "SM", Sb => "SB", Bi => "BI", Ib => "IB", Br => "BR",
            Rb => "RB", R => "R", B => "B", I => "I", Ir => "IR",
            Ri => "RI", Na => "na", Ital => "i", Sp => "sp", Nf => "nf",
            Fi => "fi", Rom => "r", Re => "RE", Rs => "RS", Dt => "DT",
            Uc => "UC", Pd => "PD", At => "AT", Indent => "in",
        }
    }
}

impl fmt::Display for ManMacro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Macro identifier stored on a node, from either dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mac {
    /// A structured-dialect macro.
    Mdoc(MdocMacro),
    /// A presentation-dialect macro.
    Man(ManMacro),
}

impl Mac {
    /// Canonical source spelling.
    pub fn name(self) -> &'static str {
        match self {
            Mac::Mdoc(m) => m.name(),
            Mac::Man(m) => m.name(),
        }
    }
}

impl fmt::Display for Mac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mdoc_lookup_round_trips() {
        for (name, &mac) in MDOC_NAMES.entries() {
            // Aliases would break this; the mdoc table has none.
            assert_eq!(MdocMacro::from_name(mac.name()), Some(mac), "{name}");
        }
        assert_eq!(MdocMacro::from_name("Sh"), Some(MdocMacro::Sh));
        assert_eq!(MdocMacro::from_name("%A"), Some(MdocMacro::PctA));
        assert_eq!(MdocMacro::from_name("Zz"), None);
    }

    #[test]
    fn man_lookup_accepts_aliases() {
        assert_eq!(ManMacro::from_name("TH"), Some(ManMacro::Th));
        assert_eq!(ManMacro::from_name("Vb"), Some(ManMacro::Nf));
        assert_eq!(ManMacro::from_name("XX"), None);
    }

    #[test]
    fn names_are_case_sensitive() {
        assert_eq!(MdocMacro::from_name("sh"), None);
        assert_eq!(ManMacro::from_name("th"), None);
    }
}
