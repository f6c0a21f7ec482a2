//! Arbitrary-width 4-state values with canonical storage representations.
//!
//! [`LogicValue`] is an immutable vector of [`Logic`] bits. Storage is chosen
//! canonically by width and content: all-identical bits collapse to a
//! [`Filled`](Repr::Filled) fill, vectors up to [`W_INT`] bits pack into a
//! pair of machine words, and wider vectors use big-integer planes. Every
//! constructor and operation routes through the canonicalizing factories so
//! equality stays cheap and memory stays bounded.

use crate::error::ValueError;
use crate::logic::Logic;
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero as _};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The packed-representation width limit: values at or below this width are
/// stored in a pair of machine words.
pub const W_INT: u32 = 64;

/// An immutable, arbitrary-width vector of 4-state [`Logic`] bits.
///
/// Bit 0 is the least-significant bit. All operations produce new values;
/// the two-plane encoding assigns bit `i` of `(value, invalid)` as:
///
/// | `value` | `invalid` | state |
/// |---|---|---|
/// | 0 | 0 | `0` |
/// | 1 | 0 | `1` |
/// | 0 | 1 | `X` |
/// | 1 | 1 | `Z` |
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicValue {
    width: u32,
    repr: Repr,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
enum Repr {
    /// Every bit is the same [`Logic`] value.
    Filled(Logic),
    /// Packed two-plane storage for widths up to [`W_INT`].
    Small { value: u64, invalid: u64 },
    /// Two-plane storage over big integers for widths above [`W_INT`].
    Big { value: BigUint, invalid: BigUint },
}

/// A `u64` with the low `width` bits set.
pub(crate) fn mask64(width: u32) -> u64 {
    debug_assert!(width <= W_INT);
    if width == 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// A `BigUint` with the low `width` bits set.
pub(crate) fn mask_big(width: u32) -> BigUint {
    (BigUint::from(1u8) << width) - 1u8
}

fn logic_from_planes(value: bool, invalid: bool) -> Logic {
    match (value, invalid) {
        (false, false) => Logic::Zero,
        (true, false) => Logic::One,
        (false, true) => Logic::X,
        (true, true) => Logic::Z,
    }
}

impl LogicValue {
    /// The canonical zero-width value.
    pub const EMPTY: LogicValue = LogicValue {
        width: 0,
        repr: Repr::Filled(Logic::Zero),
    };

    /// Creates a value of `width` copies of `bit`.
    pub fn filled(width: u32, bit: Logic) -> Self {
        if width == 0 {
            return Self::EMPTY;
        }
        Self {
            width,
            repr: Repr::Filled(bit),
        }
    }

    /// Creates a 1-bit value from a boolean.
    pub fn of_bool(value: bool) -> Self {
        Self::filled(1, Logic::from_bool(value))
    }

    /// Creates a 1-bit value from a single [`Logic`] bit.
    pub fn of_logic(bit: Logic) -> Self {
        Self::filled(1, bit)
    }

    /// Creates a value from an unsigned integer at the given width.
    ///
    /// Bits of `value` beyond `width` are dropped.
    pub fn of_u64(value: u64, width: u32) -> Self {
        if width <= W_INT {
            Self::from_small(width, value, 0)
        } else {
            Self::from_big_planes(width, BigUint::from(value), BigUint::zero())
        }
    }

    /// Creates a value from a signed integer at the given width, using
    /// two's-complement wrap-around for negative inputs.
    pub fn of_i64(value: i64, width: u32) -> Self {
        if width <= W_INT {
            Self::from_small(width, value as u64, 0)
        } else if value >= 0 {
            Self::from_big_planes(width, BigUint::from(value as u64), BigUint::zero())
        } else {
            let modulus = mask_big(width) + 1u8;
            let magnitude = BigUint::from(value.unsigned_abs());
            Self::from_big_planes(width, modulus - magnitude, BigUint::zero())
        }
    }

    /// Creates a value from a big unsigned integer at the given width.
    ///
    /// Bits of `value` beyond `width` are dropped.
    pub fn of_biguint(value: &BigUint, width: u32) -> Self {
        Self::from_big_planes(width, value.clone(), BigUint::zero())
    }

    /// Creates a width-N fill of a 1-bit seed value.
    ///
    /// Fails with [`ValueError::InvalidConstruction`] if the seed is not
    /// exactly one bit wide.
    pub fn fill_from(seed: &LogicValue, width: u32) -> Result<Self, ValueError> {
        if seed.width != 1 {
            return Err(ValueError::InvalidConstruction {
                reason: format!("fill requires a 1-bit seed, got width {}", seed.width),
            });
        }
        Ok(Self::filled(width, seed.get(0)))
    }

    /// Parses a string of `0 1 x z` characters, most-significant bit first.
    ///
    /// The empty string parses to [`LogicValue::EMPTY`].
    pub fn of_string(s: &str) -> Result<Self, ValueError> {
        let mut bits = Vec::with_capacity(s.len());
        for c in s.chars().rev() {
            match Logic::from_char(c) {
                Some(bit) => bits.push(bit),
                None => {
                    return Err(ValueError::InvalidConstruction {
                        reason: format!("invalid character {c:?} in value string {s:?}"),
                    });
                }
            }
        }
        Ok(Self::of_bits(&bits))
    }

    /// Parses a base-2 string, most-significant bit first, permitting
    /// underscore separators (`"01_10"`).
    pub fn bin(s: &str) -> Result<Self, ValueError> {
        let stripped: String = s.chars().filter(|&c| c != '_').collect();
        Self::of_string(&stripped)
    }

    /// Builds a value from individual bits, least-significant first.
    pub fn of_bits(bits: &[Logic]) -> Self {
        let mut w = BitWriter::new();
        for &bit in bits {
            w.push(bit);
        }
        w.finish()
    }

    /// Concatenates the given values, least-significant part first.
    ///
    /// The result width is the sum of the part widths; an empty slice
    /// produces [`LogicValue::EMPTY`].
    pub fn concat_lsb_first(parts: &[LogicValue]) -> Self {
        let mut w = BitWriter::new();
        for part in parts {
            w.push_value(part);
        }
        w.finish()
    }

    /// Concatenates the given values, most-significant part first.
    pub fn swizzle(parts: &[LogicValue]) -> Self {
        let mut w = BitWriter::new();
        for part in parts.iter().rev() {
            w.push_value(part);
        }
        w.finish()
    }

    /// Returns the number of bits in this value.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns `true` if this value has zero width.
    pub fn is_empty(&self) -> bool {
        self.width == 0
    }

    /// Gets the bit at the given index (0 = least significant).
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn get(&self, index: u32) -> Logic {
        assert!(
            index < self.width,
            "index {index} out of bounds for width {}",
            self.width
        );
        match &self.repr {
            Repr::Filled(bit) => *bit,
            Repr::Small { value, invalid } => {
                logic_from_planes((value >> index) & 1 != 0, (invalid >> index) & 1 != 0)
            }
            Repr::Big { value, invalid } => {
                logic_from_planes(value.bit(index as u64), invalid.bit(index as u64))
            }
        }
    }

    /// The most-significant bit.
    ///
    /// # Panics
    ///
    /// Panics if the value is empty.
    pub fn msb(&self) -> Logic {
        self.get(self.width - 1)
    }

    /// Iterates the bits, least-significant first.
    pub fn bits(&self) -> impl DoubleEndedIterator<Item = Logic> + '_ {
        (0..self.width).map(|i| self.get(i))
    }

    /// Returns `true` if every bit is driven (`0` or `1`).
    pub fn is_valid(&self) -> bool {
        match &self.repr {
            Repr::Filled(bit) => self.width == 0 || bit.is_valid(),
            Repr::Small { invalid, .. } => *invalid == 0,
            Repr::Big { invalid, .. } => invalid.is_zero(),
        }
    }

    /// Returns `true` if every bit is `Z`.
    pub fn is_floating(&self) -> bool {
        matches!(self.repr, Repr::Filled(Logic::Z))
    }

    /// Returns `true` if every bit is `Zero`.
    pub fn is_all_zero(&self) -> bool {
        self.width == 0 || matches!(self.repr, Repr::Filled(Logic::Zero))
    }

    /// Returns `true` if every bit is `One`.
    pub fn is_all_one(&self) -> bool {
        matches!(self.repr, Repr::Filled(Logic::One))
    }

    /// Converts to a `u64`.
    ///
    /// Fails with [`ValueError::InvalidOperation`] if any bit is `X`/`Z`,
    /// and with [`ValueError::InvalidTruncation`] if the width exceeds
    /// [`W_INT`].
    pub fn to_u64(&self) -> Result<u64, ValueError> {
        if !self.is_valid() {
            return Err(ValueError::InvalidOperation {
                value: self.to_string(),
            });
        }
        if self.width > W_INT {
            return Err(ValueError::InvalidTruncation {
                width: self.width,
                limit: W_INT,
            });
        }
        Ok(self.small_planes().0)
    }

    /// Converts to a [`BigUint`].
    ///
    /// Fails with [`ValueError::InvalidOperation`] if any bit is `X`/`Z`.
    pub fn to_biguint(&self) -> Result<BigUint, ValueError> {
        if !self.is_valid() {
            return Err(ValueError::InvalidOperation {
                value: self.to_string(),
            });
        }
        Ok(self.big_planes().0)
    }

    /// The raw bit string, most-significant bit first (no width prefix).
    ///
    /// `of_string(v.to_bit_string())` reproduces `v` exactly.
    pub fn to_bit_string(&self) -> String {
        self.bits().rev().map(Logic::to_char).collect()
    }

    // --- canonicalizing factories -------------------------------------------

    /// Canonicalizes packed planes into the most compact representation.
    ///
    /// Requires `width <= W_INT`; bits beyond `width` are dropped.
    pub(crate) fn from_small(width: u32, value: u64, invalid: u64) -> Self {
        debug_assert!(width <= W_INT, "from_small called with width {width}");
        if width == 0 {
            return Self::EMPTY;
        }
        let m = mask64(width);
        let value = value & m;
        let invalid = invalid & m;
        let repr = match (value, invalid) {
            (0, 0) => Repr::Filled(Logic::Zero),
            (v, 0) if v == m => Repr::Filled(Logic::One),
            (0, i) if i == m => Repr::Filled(Logic::X),
            (v, i) if v == m && i == m => Repr::Filled(Logic::Z),
            _ => Repr::Small { value, invalid },
        };
        let out = Self { width, repr };
        debug_assert!(out.is_canonical(), "inefficient representation chosen");
        out
    }

    /// Canonicalizes big-integer planes, downcasting to the packed or filled
    /// representation whenever the result is expressible there.
    pub(crate) fn from_big_planes(width: u32, value: BigUint, invalid: BigUint) -> Self {
        if width == 0 {
            return Self::EMPTY;
        }
        let m = mask_big(width);
        let value = value & &m;
        let invalid = invalid & &m;
        if width <= W_INT {
            // Masked planes always fit in a word here.
            return Self::from_small(
                width,
                value.to_u64().unwrap_or(0),
                invalid.to_u64().unwrap_or(0),
            );
        }
        let repr = if invalid.is_zero() && value.is_zero() {
            Repr::Filled(Logic::Zero)
        } else if invalid.is_zero() && value == m {
            Repr::Filled(Logic::One)
        } else if value.is_zero() && invalid == m {
            Repr::Filled(Logic::X)
        } else if value == m && invalid == m {
            Repr::Filled(Logic::Z)
        } else {
            Repr::Big { value, invalid }
        };
        let out = Self { width, repr };
        debug_assert!(out.is_canonical(), "inefficient representation chosen");
        out
    }

    /// The `(value, invalid)` planes as machine words.
    ///
    /// Only meaningful for widths up to [`W_INT`].
    pub(crate) fn small_planes(&self) -> (u64, u64) {
        debug_assert!(self.width <= W_INT);
        let m = mask64(self.width);
        match &self.repr {
            Repr::Filled(Logic::Zero) => (0, 0),
            Repr::Filled(Logic::One) => (m, 0),
            Repr::Filled(Logic::X) => (0, m),
            Repr::Filled(Logic::Z) => (m, m),
            Repr::Small { value, invalid } => (*value, *invalid),
            Repr::Big { .. } => unreachable!("big representation at width {}", self.width),
        }
    }

    /// The `(value, invalid)` planes as big integers, at any width.
    pub(crate) fn big_planes(&self) -> (BigUint, BigUint) {
        match &self.repr {
            Repr::Filled(Logic::Zero) => (BigUint::zero(), BigUint::zero()),
            Repr::Filled(Logic::One) => (mask_big(self.width), BigUint::zero()),
            Repr::Filled(Logic::X) => (BigUint::zero(), mask_big(self.width)),
            Repr::Filled(Logic::Z) => (mask_big(self.width), mask_big(self.width)),
            Repr::Small { value, invalid } => (BigUint::from(*value), BigUint::from(*invalid)),
            Repr::Big { value, invalid } => (value.clone(), invalid.clone()),
        }
    }

    /// Whether the stored representation is the canonical one for the
    /// content: all-identical bits as `Filled`, then `Small` up to [`W_INT`],
    /// then `Big`.
    pub(crate) fn is_canonical(&self) -> bool {
        match &self.repr {
            Repr::Filled(bit) => self.width > 0 || *bit == Logic::Zero,
            Repr::Small { value, invalid } => {
                if self.width == 0 || self.width > W_INT {
                    return false;
                }
                let m = mask64(self.width);
                if (value & !m) != 0 || (invalid & !m) != 0 {
                    return false;
                }
                // All-identical content must have collapsed to Filled.
                !((*value == 0 || *value == m) && (*invalid == 0 || *invalid == m))
            }
            Repr::Big { value, invalid } => {
                if self.width <= W_INT {
                    return false;
                }
                let m = mask_big(self.width);
                if value > &m || invalid > &m {
                    return false;
                }
                let value_uniform = value.is_zero() || *value == m;
                let invalid_uniform = invalid.is_zero() || *invalid == m;
                !(value_uniform && invalid_uniform)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn repr_class(&self) -> &'static str {
        match self.repr {
            Repr::Filled(_) => "filled",
            Repr::Small { .. } => "small",
            Repr::Big { .. } => "big",
        }
    }
}

impl fmt::Display for LogicValue {
    /// Formats as `<width>'h<hex>` when all bits are valid, otherwise as
    /// `<width>'b<bits>`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            let (value, _) = self.big_planes();
            write!(f, "{}'h{:x}", self.width, value)
        } else {
            write!(f, "{}'b{}", self.width, self.to_bit_string())
        }
    }
}

impl fmt::Debug for LogicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogicValue({self})")
    }
}

/// Incremental LSB-first builder used by structural operations.
pub(crate) struct BitWriter {
    width: u32,
    value: BigUint,
    invalid: BigUint,
}

impl BitWriter {
    pub(crate) fn new() -> Self {
        Self {
            width: 0,
            value: BigUint::zero(),
            invalid: BigUint::zero(),
        }
    }

    /// Appends one bit above the bits pushed so far.
    pub(crate) fn push(&mut self, bit: Logic) {
        let pos = self.width as u64;
        match bit {
            Logic::Zero => {}
            Logic::One => self.value.set_bit(pos, true),
            Logic::X => self.invalid.set_bit(pos, true),
            Logic::Z => {
                self.value.set_bit(pos, true);
                self.invalid.set_bit(pos, true);
            }
        }
        self.width += 1;
    }

    /// Appends every bit of `part`, least-significant first.
    pub(crate) fn push_value(&mut self, part: &LogicValue) {
        let (value, invalid) = part.big_planes();
        self.value |= value << self.width;
        self.invalid |= invalid << self.width;
        self.width += part.width();
    }

    pub(crate) fn finish(self) -> LogicValue {
        LogicValue::from_big_planes(self.width, self.value, self.invalid)
    }
}
