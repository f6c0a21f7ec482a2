//! Error types for 4-state value construction and arithmetic.

/// Errors raised by [`LogicValue`](crate::LogicValue) construction and operations.
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    /// A constructor received arguments it cannot represent.
    #[error("invalid value construction: {reason}")]
    InvalidConstruction {
        /// Description of what made the construction invalid.
        reason: String,
    },

    /// Two operands of a width-strict operation had different widths.
    #[error("width mismatch: {left} vs {right}")]
    WidthMismatch {
        /// Width of the left operand.
        left: u32,
        /// Width of the right operand.
        right: u32,
    },

    /// An operation requiring a fully valid value saw an `X` or `Z` bit.
    #[error("operation requires a fully valid value, found {value}")]
    InvalidOperation {
        /// Display form of the offending value.
        value: String,
    },

    /// A conversion to a machine integer was requested for a too-wide value.
    #[error("value of width {width} does not fit in a {limit}-bit integer")]
    InvalidTruncation {
        /// Width of the value being converted.
        width: u32,
        /// The machine integer width that was exceeded.
        limit: u32,
    },

    /// Division or remainder by a zero divisor.
    #[error("division by zero")]
    DivisionByZero,

    /// `replicate` was called with a count below one.
    #[error("replication count must be at least 1, got {count}")]
    InvalidMultiplier {
        /// The rejected count.
        count: i64,
    },

    /// A shift amount was invalid (not representable or not fully valid).
    #[error("invalid shift amount: {reason}")]
    InvalidShamt {
        /// Description of why the shift amount was rejected.
        reason: String,
    },

    /// A bit range fell outside the value's width.
    #[error("bit range [{start}, {end}) out of bounds for width {width}")]
    RangeOutOfBounds {
        /// Resolved start index (after negative-index translation).
        start: i64,
        /// Resolved end index (after negative-index translation).
        end: i64,
        /// The width of the value being indexed.
        width: u32,
    },
}
