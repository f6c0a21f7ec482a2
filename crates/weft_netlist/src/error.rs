//! Error types for circuit construction, elaboration, and propagation.

use weft_common::ValueError;

/// Errors raised while constructing, building, or propagating a circuit.
#[derive(Debug, thiserror::Error)]
pub enum NetlistError {
    /// A connection or port registration joined signals of different widths.
    #[error("width mismatch: {left} vs {right}")]
    WidthMismatch {
        /// Width on the driven/declared side.
        left: u32,
        /// Width on the driving side.
        right: u32,
    },

    /// The structural rules of the signal graph were violated.
    #[error("illegal topology: {reason}")]
    IllegalTopology {
        /// Description of the violation, naming the stray signal where known.
        reason: String,
    },

    /// Two signals with reserved naming collided on the same name.
    #[error("duplicate reserved name `{name}`")]
    DuplicateReservedName {
        /// The colliding name.
        name: String,
    },

    /// An interface instance was reused instead of instantiated afresh.
    #[error("interface not cloned: {reason}")]
    InterfaceNotCloned {
        /// Description of the reuse.
        reason: String,
    },

    /// An operation requiring an elaborated module saw an unbuilt one.
    #[error("module `{name}` has not been built")]
    ModuleNotBuilt {
        /// The module's instance name.
        name: String,
    },

    /// `build` was called twice on the same module.
    #[error("module `{name}` was already built")]
    ModuleBuiltTwice {
        /// The module's instance name.
        name: String,
    },

    /// Combinational propagation failed to reach a fixpoint within its bound.
    #[error("combinational loop detected near signal `{signal}`")]
    CombinationalLoop {
        /// A signal on the diverging path.
        signal: String,
    },

    /// A value-level operation failed during evaluation.
    #[error(transparent)]
    Value(#[from] ValueError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(
            NetlistError::WidthMismatch { left: 8, right: 4 }.to_string(),
            "width mismatch: 8 vs 4"
        );
        assert_eq!(
            NetlistError::DuplicateReservedName { name: "clk".into() }.to_string(),
            "duplicate reserved name `clk`"
        );
        assert_eq!(
            NetlistError::ModuleBuiltTwice { name: "top".into() }.to_string(),
            "module `top` was already built"
        );
    }

    #[test]
    fn value_error_wraps() {
        let e: NetlistError = ValueError::DivisionByZero.into();
        assert_eq!(e.to_string(), "division by zero");
    }
}
