//! Non-fatal diagnostic records collected during build and evaluation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Codes identifying each class of warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarnCode {
    /// A combinational block leaves a target unassigned on some control path.
    InferredLatch,
    /// A `unique` case matched zero or more than one item at runtime.
    UniqueCaseViolation,
}

impl fmt::Display for WarnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarnCode::InferredLatch => write!(f, "W0401"),
            WarnCode::UniqueCaseViolation => write!(f, "W0402"),
        }
    }
}

/// A non-fatal finding surfaced to the user alongside normal results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    /// The warning class.
    pub code: WarnCode,
    /// Human-readable description naming the affected entity.
    pub message: String,
}

impl Warning {
    /// Creates a new warning record.
    pub fn new(code: WarnCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "warning[{}]: {}", self.code, self.message)
    }
}
