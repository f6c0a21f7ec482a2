//! 4-state logic values with truth-table-based operators.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

/// A single 4-state logic value.
///
/// The four states represent:
/// - `Zero` — logic low (driven 0)
/// - `One` — logic high (driven 1)
/// - `X` — unknown or contended value
/// - `Z` — high-impedance (floating, not driven)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum Logic {
    /// Logic low (0).
    Zero = 0,
    /// Logic high (1).
    One = 1,
    /// Unknown or contended.
    X = 2,
    /// High-impedance (floating).
    Z = 3,
}

impl Logic {
    /// Converts a character to a [`Logic`] value.
    ///
    /// Accepts '0', '1', 'x'/'X', and 'z'/'Z'.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Logic::Zero),
            '1' => Some(Logic::One),
            'x' | 'X' => Some(Logic::X),
            'z' | 'Z' => Some(Logic::Z),
            _ => None,
        }
    }

    /// Returns the lowercase character form of this value.
    pub fn to_char(self) -> char {
        match self {
            Logic::Zero => '0',
            Logic::One => '1',
            Logic::X => 'x',
            Logic::Z => 'z',
        }
    }

    /// Converts a boolean to `Zero` or `One`.
    pub fn from_bool(value: bool) -> Self {
        if value {
            Logic::One
        } else {
            Logic::Zero
        }
    }

    /// Returns `true` if this value is driven (`Zero` or `One`).
    pub fn is_valid(self) -> bool {
        matches!(self, Logic::Zero | Logic::One)
    }

    /// Tri-state resolution of two drivers on the same net bit.
    ///
    /// `Z` is the identity, equal driven values pass through, a `0`-vs-`1`
    /// conflict produces `X`, and `X` absorbs everything.
    pub fn resolve(self, other: Self) -> Self {
        use Logic::*;
        match (self, other) {
            (Z, v) | (v, Z) => v,
            (X, _) | (_, X) => X,
            (a, b) if a == b => a,
            _ => X,
        }
    }
}

/// AND truth table:
/// ```text
///     0  1  X  Z
/// 0 | 0  0  0  0
/// 1 | 0  1  X  X
/// X | 0  X  X  X
/// Z | 0  X  X  X
/// ```
impl BitAnd for Logic {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        use Logic::*;
        match (self, rhs) {
            (Zero, _) | (_, Zero) => Zero,
            (One, One) => One,
            _ => X,
        }
    }
}

/// OR truth table:
/// ```text
///     0  1  X  Z
/// 0 | 0  1  X  X
/// 1 | 1  1  1  1
/// X | X  1  X  X
/// Z | X  1  X  X
/// ```
impl BitOr for Logic {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        use Logic::*;
        match (self, rhs) {
            (One, _) | (_, One) => One,
            (Zero, Zero) => Zero,
            _ => X,
        }
    }
}

/// XOR truth table: any `X`/`Z` operand produces `X`.
impl BitXor for Logic {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self {
        use Logic::*;
        match (self, rhs) {
            (Zero, Zero) | (One, One) => Zero,
            (Zero, One) | (One, Zero) => One,
            _ => X,
        }
    }
}

/// NOT: `!0 = 1`, `!1 = 0`, `!X = X`, `!Z = X`.
impl Not for Logic {
    type Output = Self;

    fn not(self) -> Self {
        use Logic::*;
        match self {
            Zero => One,
            One => Zero,
            X | Z => X,
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

#[cfg(test)]
mod tests {
    use super::Logic::{self, *};

    #[test]
    fn and_truth_table() {
        // Zero dominates
        assert_eq!(Zero & Zero, Zero);
        assert_eq!(Zero & One, Zero);
        assert_eq!(Zero & X, Zero);
        assert_eq!(Zero & Z, Zero);
        assert_eq!(X & Zero, Zero);
        assert_eq!(Z & Zero, Zero);
        // One & One
        assert_eq!(One & One, One);
        // Unknown cases
        assert_eq!(One & X, X);
        assert_eq!(One & Z, X);
        assert_eq!(X & Z, X);
        assert_eq!(Z & Z, X);
    }

    #[test]
    fn or_truth_table() {
        // One dominates
        assert_eq!(One | Zero, One);
        assert_eq!(One | X, One);
        assert_eq!(One | Z, One);
        assert_eq!(Z | One, One);
        // Zero | Zero
        assert_eq!(Zero | Zero, Zero);
        // Unknown cases
        assert_eq!(Zero | X, X);
        assert_eq!(Zero | Z, X);
        assert_eq!(X | X, X);
    }

    #[test]
    fn xor_truth_table() {
        assert_eq!(Zero ^ Zero, Zero);
        assert_eq!(Zero ^ One, One);
        assert_eq!(One ^ Zero, One);
        assert_eq!(One ^ One, Zero);
        assert_eq!(Zero ^ X, X);
        assert_eq!(One ^ Z, X);
        assert_eq!(X ^ X, X);
    }

    #[test]
    fn not_values() {
        assert_eq!(!Zero, One);
        assert_eq!(!One, Zero);
        assert_eq!(!X, X);
        assert_eq!(!Z, X);
    }

    #[test]
    fn resolve_identity_and_conflict() {
        // Z is the identity
        assert_eq!(Z.resolve(Zero), Zero);
        assert_eq!(Z.resolve(One), One);
        assert_eq!(One.resolve(Z), One);
        assert_eq!(Z.resolve(Z), Z);
        // Agreement passes through
        assert_eq!(Zero.resolve(Zero), Zero);
        assert_eq!(One.resolve(One), One);
        // Conflict
        assert_eq!(Zero.resolve(One), X);
        assert_eq!(One.resolve(Zero), X);
        // X absorbs
        assert_eq!(X.resolve(Zero), X);
        assert_eq!(X.resolve(Z), X);
        assert_eq!(One.resolve(X), X);
    }

    #[test]
    fn char_roundtrip() {
        for v in [Zero, One, X, Z] {
            assert_eq!(Logic::from_char(v.to_char()), Some(v));
        }
        assert_eq!(Logic::from_char('X'), Some(X));
        assert_eq!(Logic::from_char('Z'), Some(Z));
        assert_eq!(Logic::from_char('q'), None);
        assert_eq!(Logic::from_char('2'), None);
    }

    #[test]
    fn validity() {
        assert!(Zero.is_valid());
        assert!(One.is_valid());
        assert!(!X.is_valid());
        assert!(!Z.is_valid());
    }

    #[test]
    fn from_bool() {
        assert_eq!(Logic::from_bool(true), One);
        assert_eq!(Logic::from_bool(false), Zero);
    }
}
