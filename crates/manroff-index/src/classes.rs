//! Keyword classes: the semantic role a word was indexed under.

use std::fmt;

/// Bitmask of keyword classes.
///
/// A keyword carries the union of every role it was seen in; masks for
/// the same keyword and record are OR-merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyMask(pub u32);

impl KeyMask {
    /// Name of the manual (`NAME` section).
    pub const NAME: KeyMask = KeyMask(0x0000_0001);
    /// Function name (`SYNOPSIS`).
    pub const FUNCTION: KeyMask = KeyMask(0x0000_0002);
    /// Utility name (`SYNOPSIS`).
    pub const UTILITY: KeyMask = KeyMask(0x0000_0004);
    /// Included header file.
    pub const INCLUDES: KeyMask = KeyMask(0x0000_0008);
    /// Variable or type name.
    pub const VARIABLE: KeyMask = KeyMask(0x0000_0010);
    /// Cited standard.
    pub const STANDARD: KeyMask = KeyMask(0x0000_0020);
    /// Author name.
    pub const AUTHOR: KeyMask = KeyMask(0x0000_0040);
    /// Kernel configuration declaration.
    pub const CONFIG: KeyMask = KeyMask(0x0000_0080);
    /// One-line description.
    pub const DESC: KeyMask = KeyMask(0x0000_0100);
    /// Cross-reference (`name.sec`).
    pub const XREF: KeyMask = KeyMask(0x0000_0200);
    /// File-system path (`FILES`).
    pub const PATH: KeyMask = KeyMask(0x0000_0400);
    /// Environment variable.
    pub const ENV: KeyMask = KeyMask(0x0000_0800);
    /// Error constant (`ERRORS`).
    pub const ERR: KeyMask = KeyMask(0x0000_1000);
    /// Machine architecture marker.
    pub const ARCH: KeyMask = KeyMask(0x0000_2000);
    /// Manual section marker.
    pub const SECTION: KeyMask = KeyMask(0x0000_4000);

    /// Every class at once.
    pub const ANY: KeyMask = KeyMask(u32::MAX);

    /// Default search mask: names and descriptions.
    pub const DEFAULT: KeyMask = KeyMask(Self::NAME.0 | Self::DESC.0);

    /// Whether the two masks share a class.
    pub fn intersects(self, other: KeyMask) -> bool {
        self.0 & other.0 != 0
    }

    /// Union of the two masks.
    #[must_use]
    pub fn union(self, other: KeyMask) -> KeyMask {
        KeyMask(self.0 | other.0)
    }

    /// Resolve a query type name.
    pub fn from_type_name(name: &str) -> Option<KeyMask> {
        let mask = match name {
            "name" => Self::NAME,
            "func" | "function" => Self::FUNCTION,
            "utility" => Self::UTILITY,
            "incl" | "include" => Self::INCLUDES,
            "var" | "variable" => Self::VARIABLE,
            "standard" => Self::STANDARD,
            "author" => Self::AUTHOR,
            "config" => Self::CONFIG,
            "desc" | "description" => Self::DESC,
            "xref" => Self::XREF,
            "path" => Self::PATH,
            "env" => Self::ENV,
            "err" => Self::ERR,
            "arch" => Self::ARCH,
            "sec" => Self::SECTION,
            "any" => Self::ANY,
            _ => return None,
        };
        Some(mask)
    }
}

impl fmt::Display for KeyMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_resolve() {
        assert_eq!(KeyMask::from_type_name("name"), Some(KeyMask::NAME));
        assert_eq!(KeyMask::from_type_name("function"), Some(KeyMask::FUNCTION));
        assert_eq!(KeyMask::from_type_name("any"), Some(KeyMask::ANY));
        assert_eq!(KeyMask::from_type_name("bogus"), None);
    }

    #[test]
    fn classes_are_disjoint_bits() {
        let all = [
            KeyMask::NAME,
            KeyMask::FUNCTION,
            KeyMask::UTILITY,
            KeyMask::INCLUDES,
            KeyMask::VARIABLE,
            KeyMask::STANDARD,
            KeyMask::AUTHOR,
            KeyMask::CONFIG,
            KeyMask::DESC,
            KeyMask::XREF,
            KeyMask::PATH,
            KeyMask::ENV,
            KeyMask::ERR,
            KeyMask::ARCH,
            KeyMask::SECTION,
        ];
        let mut seen = 0u32;
        for mask in all {
            assert_eq!(seen & mask.0, 0, "classes overlap");
            seen |= mask.0;
        }
    }

    #[test]
    fn default_mask_is_name_or_desc() {
        assert!(KeyMask::DEFAULT.intersects(KeyMask::NAME));
        assert!(KeyMask::DEFAULT.intersects(KeyMask::DESC));
        assert!(!KeyMask::DEFAULT.intersects(KeyMask::PATH));
    }
}
