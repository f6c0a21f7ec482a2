//! Operator algebra for [`LogicValue`].
//!
//! Binary operations are width-strict. Each operation dispatches on the
//! operand width: packed machine-word planes up to [`W_INT`] bits, big-integer
//! planes beyond, always returning through the canonicalizing factories.
//!
//! Plane algebra: with `value`/`invalid` planes and `1`-bits `a1 = v & !i`,
//! `0`-bits `a0 = !v & !i`, the AND/OR results are driven where both operands
//! force the outcome and `X` elsewhere; XOR is `X` wherever either operand
//! has an invalid bit.

use crate::error::ValueError;
use crate::logic::Logic;
use crate::value::{mask64, mask_big, BitWriter, LogicValue, W_INT};
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero as _};
use std::ops::{BitAnd, BitOr, BitXor, Not};

impl LogicValue {
    fn require_same_width(&self, other: &Self) -> Result<(), ValueError> {
        if self.width() != other.width() {
            return Err(ValueError::WidthMismatch {
                left: self.width(),
                right: other.width(),
            });
        }
        Ok(())
    }

    // --- bitwise -----------------------------------------------------------

    /// Bitwise NOT; any `X`/`Z` bit becomes `X`.
    pub fn not_value(&self) -> Self {
        let w = self.width();
        if w <= W_INT {
            let (v, i) = self.small_planes();
            let m = mask64(w);
            Self::from_small(w, !v & !i & m, i)
        } else {
            let (v, i) = self.big_planes();
            let m = mask_big(w);
            let value = (&m ^ &v) & (&m ^ &i);
            Self::from_big_planes(w, value, i)
        }
    }

    /// Bitwise AND: `0` dominates, `1 & 1 = 1`, anything else is `X`.
    pub fn and(&self, other: &Self) -> Result<Self, ValueError> {
        self.require_same_width(other)?;
        let w = self.width();
        if w <= W_INT {
            let (av, ai) = self.small_planes();
            let (bv, bi) = other.small_planes();
            let m = mask64(w);
            let r1 = (av & !ai) & (bv & !bi);
            let r0 = (!av & !ai & m) | (!bv & !bi & m);
            Ok(Self::from_small(w, r1, !(r1 | r0) & m))
        } else {
            let (av, ai) = self.big_planes();
            let (bv, bi) = other.big_planes();
            let m = mask_big(w);
            let a1 = &av & &(&m ^ &ai);
            let b1 = &bv & &(&m ^ &bi);
            let a0 = &m ^ &(&av | &ai);
            let b0 = &m ^ &(&bv | &bi);
            let r1 = &a1 & &b1;
            let r0 = &a0 | &b0;
            let inv = &m ^ &(&r1 | &r0);
            Ok(Self::from_big_planes(w, r1, inv))
        }
    }

    /// Bitwise OR: `1` dominates, `0 | 0 = 0`, anything else is `X`.
    pub fn or(&self, other: &Self) -> Result<Self, ValueError> {
        self.require_same_width(other)?;
        let w = self.width();
        if w <= W_INT {
            let (av, ai) = self.small_planes();
            let (bv, bi) = other.small_planes();
            let m = mask64(w);
            let r1 = (av & !ai) | (bv & !bi);
            let r0 = (!av & !ai & m) & (!bv & !bi & m);
            Ok(Self::from_small(w, r1, !(r1 | r0) & m))
        } else {
            let (av, ai) = self.big_planes();
            let (bv, bi) = other.big_planes();
            let m = mask_big(w);
            let a1 = &av & &(&m ^ &ai);
            let b1 = &bv & &(&m ^ &bi);
            let a0 = &m ^ &(&av | &ai);
            let b0 = &m ^ &(&bv | &bi);
            let r1 = &a1 | &b1;
            let r0 = &a0 & &b0;
            let inv = &m ^ &(&r1 | &r0);
            Ok(Self::from_big_planes(w, r1, inv))
        }
    }

    /// Bitwise XOR: `X` wherever either operand bit is invalid.
    pub fn xor(&self, other: &Self) -> Result<Self, ValueError> {
        self.require_same_width(other)?;
        let w = self.width();
        if w <= W_INT {
            let (av, ai) = self.small_planes();
            let (bv, bi) = other.small_planes();
            let m = mask64(w);
            let inv = ai | bi;
            Ok(Self::from_small(w, (av ^ bv) & !inv & m, inv))
        } else {
            let (av, ai) = self.big_planes();
            let (bv, bi) = other.big_planes();
            let m = mask_big(w);
            let inv = &ai | &bi;
            let value = (&av ^ &bv) & (&m ^ &inv);
            Ok(Self::from_big_planes(w, value, inv))
        }
    }

    // --- reductions --------------------------------------------------------

    /// Folds AND across all bits into a 1-bit value.
    pub fn and_reduce(&self) -> Self {
        let w = self.width();
        if w <= W_INT {
            let (v, i) = self.small_planes();
            let m = mask64(w);
            if !v & !i & m != 0 {
                Self::of_logic(Logic::Zero)
            } else if i != 0 {
                Self::of_logic(Logic::X)
            } else {
                Self::of_logic(Logic::One)
            }
        } else {
            let (v, i) = self.big_planes();
            let m = mask_big(w);
            let zeros = &m ^ &(&v | &i);
            if !zeros.is_zero() {
                Self::of_logic(Logic::Zero)
            } else if !i.is_zero() {
                Self::of_logic(Logic::X)
            } else {
                Self::of_logic(Logic::One)
            }
        }
    }

    /// Folds OR across all bits into a 1-bit value.
    pub fn or_reduce(&self) -> Self {
        let (v, i) = self.big_planes();
        let m = mask_big(self.width());
        let ones = &v & &(&m ^ &i);
        if !ones.is_zero() {
            Self::of_logic(Logic::One)
        } else if !i.is_zero() {
            Self::of_logic(Logic::X)
        } else {
            Self::of_logic(Logic::Zero)
        }
    }

    /// Folds XOR across all bits; any invalid bit makes the result `X`.
    pub fn xor_reduce(&self) -> Self {
        let (v, i) = self.big_planes();
        if !i.is_zero() {
            Self::of_logic(Logic::X)
        } else {
            Self::of_bool(v.count_ones() % 2 == 1)
        }
    }

    // --- arithmetic --------------------------------------------------------

    /// Modular addition at the operand width; invalid operands give all-`X`.
    pub fn add(&self, other: &Self) -> Result<Self, ValueError> {
        self.require_same_width(other)?;
        if !self.is_valid() || !other.is_valid() {
            return Ok(Self::filled(self.width(), Logic::X));
        }
        let w = self.width();
        if w <= W_INT {
            let a = self.small_planes().0;
            let b = other.small_planes().0;
            Ok(Self::from_small(w, a.wrapping_add(b), 0))
        } else {
            let a = self.big_planes().0;
            let b = other.big_planes().0;
            Ok(Self::from_big_planes(w, a + b, BigUint::zero()))
        }
    }

    /// Modular subtraction at the operand width; invalid operands give all-`X`.
    pub fn sub(&self, other: &Self) -> Result<Self, ValueError> {
        self.require_same_width(other)?;
        if !self.is_valid() || !other.is_valid() {
            return Ok(Self::filled(self.width(), Logic::X));
        }
        let w = self.width();
        if w <= W_INT {
            let a = self.small_planes().0;
            let b = other.small_planes().0;
            Ok(Self::from_small(w, a.wrapping_sub(b), 0))
        } else {
            let a = self.big_planes().0;
            let b = other.big_planes().0;
            let modulus = mask_big(w) + 1u8;
            Ok(Self::from_big_planes(w, a + modulus - b, BigUint::zero()))
        }
    }

    /// Modular multiplication at the operand width; invalid operands give all-`X`.
    pub fn mul(&self, other: &Self) -> Result<Self, ValueError> {
        self.require_same_width(other)?;
        if !self.is_valid() || !other.is_valid() {
            return Ok(Self::filled(self.width(), Logic::X));
        }
        let w = self.width();
        if w <= W_INT {
            let a = self.small_planes().0;
            let b = other.small_planes().0;
            Ok(Self::from_small(w, a.wrapping_mul(b), 0))
        } else {
            let a = self.big_planes().0;
            let b = other.big_planes().0;
            Ok(Self::from_big_planes(w, a * b, BigUint::zero()))
        }
    }

    /// Unsigned division; invalid operands give all-`X`, a zero divisor fails.
    pub fn div(&self, other: &Self) -> Result<Self, ValueError> {
        self.require_same_width(other)?;
        if !self.is_valid() || !other.is_valid() {
            return Ok(Self::filled(self.width(), Logic::X));
        }
        let b = other.big_planes().0;
        if b.is_zero() {
            return Err(ValueError::DivisionByZero);
        }
        let a = self.big_planes().0;
        Ok(Self::from_big_planes(self.width(), a / b, BigUint::zero()))
    }

    /// Unsigned remainder; invalid operands give all-`X`, a zero divisor fails.
    pub fn rem(&self, other: &Self) -> Result<Self, ValueError> {
        self.require_same_width(other)?;
        if !self.is_valid() || !other.is_valid() {
            return Ok(Self::filled(self.width(), Logic::X));
        }
        let b = other.big_planes().0;
        if b.is_zero() {
            return Err(ValueError::DivisionByZero);
        }
        let a = self.big_planes().0;
        Ok(Self::from_big_planes(self.width(), a % b, BigUint::zero()))
    }

    /// Unsigned exponentiation modulo `2^width`; invalid inputs give all-`X`.
    ///
    /// The exponent may have any width.
    pub fn pow(&self, exp: &Self) -> Result<Self, ValueError> {
        let w = self.width();
        if !self.is_valid() || !exp.is_valid() {
            return Ok(Self::filled(w, Logic::X));
        }
        if w == 0 {
            return Ok(Self::EMPTY);
        }
        let base = self.big_planes().0;
        let e = exp.big_planes().0;
        let modulus = mask_big(w) + 1u8;
        Ok(Self::from_big_planes(w, base.modpow(&e, &modulus), BigUint::zero()))
    }

    // --- comparison --------------------------------------------------------

    fn compare(&self, other: &Self, f: impl Fn(&BigUint, &BigUint) -> bool) -> Result<Self, ValueError> {
        self.require_same_width(other)?;
        if !self.is_valid() || !other.is_valid() {
            return Ok(Self::of_logic(Logic::X));
        }
        let a = self.big_planes().0;
        let b = other.big_planes().0;
        Ok(Self::of_bool(f(&a, &b)))
    }

    /// 1-bit equality; `X` if either operand has an invalid bit.
    pub fn equals(&self, other: &Self) -> Result<Self, ValueError> {
        self.compare(other, |a, b| a == b)
    }

    /// 1-bit inequality; `X` if either operand has an invalid bit.
    pub fn not_equals(&self, other: &Self) -> Result<Self, ValueError> {
        self.compare(other, |a, b| a != b)
    }

    /// 1-bit unsigned less-than; `X` if either operand has an invalid bit.
    pub fn less_than(&self, other: &Self) -> Result<Self, ValueError> {
        self.compare(other, |a, b| a < b)
    }

    /// 1-bit unsigned less-or-equal; `X` if either operand has an invalid bit.
    pub fn less_or_equal(&self, other: &Self) -> Result<Self, ValueError> {
        self.compare(other, |a, b| a <= b)
    }

    /// 1-bit unsigned greater-than; `X` if either operand has an invalid bit.
    pub fn greater_than(&self, other: &Self) -> Result<Self, ValueError> {
        self.compare(other, |a, b| a > b)
    }

    /// 1-bit unsigned greater-or-equal; `X` if either operand has an invalid bit.
    pub fn greater_or_equal(&self, other: &Self) -> Result<Self, ValueError> {
        self.compare(other, |a, b| a >= b)
    }

    // --- shifts ------------------------------------------------------------

    /// Logical left shift, zero fill.
    pub fn shl(&self, n: u32) -> Self {
        let w = self.width();
        if n >= w {
            return Self::filled(w, Logic::Zero);
        }
        if w <= W_INT {
            let (v, i) = self.small_planes();
            Self::from_small(w, v << n, i << n)
        } else {
            let (v, i) = self.big_planes();
            Self::from_big_planes(w, v << n, i << n)
        }
    }

    /// Logical right shift, zero fill.
    pub fn srl(&self, n: u32) -> Self {
        let w = self.width();
        if n >= w {
            return Self::filled(w, Logic::Zero);
        }
        if w <= W_INT {
            let (v, i) = self.small_planes();
            Self::from_small(w, v >> n, i >> n)
        } else {
            let (v, i) = self.big_planes();
            Self::from_big_planes(w, v >> n, i >> n)
        }
    }

    /// Arithmetic right shift, MSB fill; an invalid MSB fills with `X`.
    pub fn sra(&self, n: u32) -> Self {
        let w = self.width();
        if w == 0 {
            return Self::EMPTY;
        }
        let msb = self.msb();
        let n = n.min(w);
        if w <= W_INT {
            let (v, i) = self.small_planes();
            let m = mask64(w);
            // Top n bits of the result.
            let high = if n == 0 {
                0
            } else if n >= w {
                m
            } else {
                !(m >> n) & m
            };
            let (mut rv, mut ri) = (if n == w { 0 } else { v >> n }, if n == w { 0 } else { i >> n });
            match msb {
                Logic::One => rv |= high,
                Logic::Zero => {}
                Logic::X | Logic::Z => ri |= high,
            }
            Self::from_small(w, rv, ri)
        } else {
            let (v, i) = self.big_planes();
            let m = mask_big(w);
            let high = if n == 0 {
                BigUint::zero()
            } else {
                &m ^ &(&m >> n)
            };
            let mut rv = &v >> n;
            let mut ri = &i >> n;
            match msb {
                Logic::One => rv |= &high,
                Logic::Zero => {}
                Logic::X | Logic::Z => ri |= &high,
            }
            Self::from_big_planes(w, rv, ri)
        }
    }

    fn shamt_to_u32(shamt: &Self) -> Result<u32, ValueError> {
        if !shamt.is_valid() {
            return Err(ValueError::InvalidShamt {
                reason: format!("shift amount {shamt} has invalid bits"),
            });
        }
        let big = shamt.big_planes().0;
        match big.to_u32() {
            Some(n) => Ok(n),
            None => Err(ValueError::InvalidShamt {
                reason: format!("shift amount {shamt} is too large"),
            }),
        }
    }

    /// Logical left shift by a value-typed amount.
    pub fn shl_by(&self, shamt: &Self) -> Result<Self, ValueError> {
        Ok(self.shl(Self::shamt_to_u32(shamt)?))
    }

    /// Logical right shift by a value-typed amount.
    pub fn srl_by(&self, shamt: &Self) -> Result<Self, ValueError> {
        Ok(self.srl(Self::shamt_to_u32(shamt)?))
    }

    /// Arithmetic right shift by a value-typed amount.
    pub fn sra_by(&self, shamt: &Self) -> Result<Self, ValueError> {
        Ok(self.sra(Self::shamt_to_u32(shamt)?))
    }

    // --- structural --------------------------------------------------------

    /// Concatenates `n` copies of this value; `n < 1` is rejected.
    pub fn replicate(&self, n: u32) -> Result<Self, ValueError> {
        if n < 1 {
            return Err(ValueError::InvalidMultiplier { count: n as i64 });
        }
        let mut w = BitWriter::new();
        for _ in 0..n {
            w.push_value(self);
        }
        Ok(w.finish())
    }

    /// Extends to `width` bits by prepending `fill` above the MSB.
    ///
    /// `width` below the current width is rejected as a width mismatch.
    pub fn extend(&self, width: u32, fill: Logic) -> Result<Self, ValueError> {
        if width < self.width() {
            return Err(ValueError::WidthMismatch {
                left: width,
                right: self.width(),
            });
        }
        let mut w = BitWriter::new();
        w.push_value(self);
        for _ in self.width()..width {
            w.push(fill);
        }
        Ok(w.finish())
    }

    /// Extends to `width` bits with zero fill.
    pub fn zero_extend(&self, width: u32) -> Result<Self, ValueError> {
        self.extend(width, Logic::Zero)
    }

    /// Extends to `width` bits by duplicating the MSB.
    pub fn sign_extend(&self, width: u32) -> Result<Self, ValueError> {
        if self.is_empty() {
            return Err(ValueError::InvalidConstruction {
                reason: "cannot sign-extend an empty value".into(),
            });
        }
        self.extend(width, self.msb())
    }

    /// Inclusive slice from bit `hi` down to bit `lo`.
    ///
    /// `hi < lo` produces the reversed bit order.
    pub fn slice(&self, hi: u32, lo: u32) -> Result<Self, ValueError> {
        let top = hi.max(lo);
        if top >= self.width() {
            return Err(ValueError::RangeOutOfBounds {
                start: hi.min(lo) as i64,
                end: top as i64 + 1,
                width: self.width(),
            });
        }
        let mut w = BitWriter::new();
        if hi >= lo {
            for i in lo..=hi {
                w.push(self.get(i));
            }
        } else {
            for i in (hi..=lo).rev() {
                w.push(self.get(i));
            }
        }
        Ok(w.finish())
    }

    /// Half-open range `[start, end)`; negative indices count from the end.
    pub fn get_range(&self, start: i64, end: i64) -> Result<Self, ValueError> {
        let w = self.width() as i64;
        let s = if start < 0 { start + w } else { start };
        let e = if end < 0 { end + w } else { end };
        if s < 0 || e < s || e > w {
            return Err(ValueError::RangeOutOfBounds {
                start: s,
                end: e,
                width: self.width(),
            });
        }
        if s == e {
            return Ok(Self::EMPTY);
        }
        self.slice(e as u32 - 1, s as u32)
    }

    /// Half-open range `[start, width)`; negative `start` counts from the end.
    pub fn get_range_from(&self, start: i64) -> Result<Self, ValueError> {
        self.get_range(start, self.width() as i64)
    }

    /// Returns a copy with bits `[start, start + update.width)` replaced.
    pub fn with_set(&self, start: u32, update: &Self) -> Result<Self, ValueError> {
        let end = start as u64 + update.width() as u64;
        if end > self.width() as u64 {
            return Err(ValueError::RangeOutOfBounds {
                start: start as i64,
                end: end as i64,
                width: self.width(),
            });
        }
        let mut w = BitWriter::new();
        for i in 0..start {
            w.push(self.get(i));
        }
        w.push_value(update);
        for i in end as u32..self.width() {
            w.push(self.get(i));
        }
        Ok(w.finish())
    }

    /// Returns a copy with the bit order reversed.
    pub fn reversed(&self) -> Self {
        let mut w = BitWriter::new();
        for bit in self.bits().rev() {
            w.push(bit);
        }
        w.finish()
    }

    // --- misc --------------------------------------------------------------

    /// Ceiling log2 at this value's own width.
    ///
    /// Any invalid bit gives all-`X`; a set MSB (negative under a signed
    /// reading) gives the width itself.
    pub fn clog2(&self) -> Self {
        let w = self.width();
        if w == 0 {
            return Self::EMPTY;
        }
        if !self.is_valid() {
            return Self::filled(w, Logic::X);
        }
        if self.msb() == Logic::One {
            return Self::of_u64(w as u64, w);
        }
        let v = self.big_planes().0;
        let result = if v <= BigUint::from(1u8) {
            0
        } else {
            (v - 1u8).bits()
        };
        Self::of_u64(result, w)
    }

    /// `true` when widths match and every mutually-valid bit pair is equal;
    /// `X`/`Z` on either side acts as a don't-care.
    pub fn equals_with_dont_care(&self, other: &Self) -> bool {
        if self.width() != other.width() {
            return false;
        }
        self.bits()
            .zip(other.bits())
            .all(|(a, b)| !a.is_valid() || !b.is_valid() || a == b)
    }

    /// Tri-state merge of two same-width drivers (see [`Logic::resolve`]).
    pub fn resolve(&self, other: &Self) -> Result<Self, ValueError> {
        self.require_same_width(other)?;
        let mut w = BitWriter::new();
        for (a, b) in self.bits().zip(other.bits()) {
            w.push(a.resolve(b));
        }
        Ok(w.finish())
    }
}

impl BitAnd for &LogicValue {
    type Output = LogicValue;

    /// # Panics
    ///
    /// Panics on width mismatch; use [`LogicValue::and`] for the fallible form.
    fn bitand(self, rhs: Self) -> LogicValue {
        assert_eq!(self.width(), rhs.width(), "LogicValue width mismatch in AND");
        self.and(rhs).expect("widths checked")
    }
}

impl BitOr for &LogicValue {
    type Output = LogicValue;

    /// # Panics
    ///
    /// Panics on width mismatch; use [`LogicValue::or`] for the fallible form.
    fn bitor(self, rhs: Self) -> LogicValue {
        assert_eq!(self.width(), rhs.width(), "LogicValue width mismatch in OR");
        self.or(rhs).expect("widths checked")
    }
}

impl BitXor for &LogicValue {
    type Output = LogicValue;

    /// # Panics
    ///
    /// Panics on width mismatch; use [`LogicValue::xor`] for the fallible form.
    fn bitxor(self, rhs: Self) -> LogicValue {
        assert_eq!(self.width(), rhs.width(), "LogicValue width mismatch in XOR");
        self.xor(rhs).expect("widths checked")
    }
}

impl Not for &LogicValue {
    type Output = LogicValue;

    fn not(self) -> LogicValue {
        self.not_value()
    }
}
