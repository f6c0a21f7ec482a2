//! Signal records, change events, and operands.
//!
//! A [`Signal`] is a named wire of fixed width holding its current
//! [`LogicValue`]. Structural connection is recorded as a driver edge; nets
//! carry a driver list instead and are always computed by tri-state merge.

use crate::ids::{ModuleId, ProcessId, SignalId};
use serde::{Deserialize, Serialize};
use weft_common::{Ident, LogicValue};

pub use crate::naming::Naming;

/// The kind of a signal, determining its driving discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// A single-driver signal; mirrors its driver's value.
    Wire,
    /// A multi-driver signal resolved by tri-state merge.
    Net,
}

/// What drives a [`SignalKind::Wire`] signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverSource {
    /// Driven by another signal through a connect edge.
    Edge(SignalId),
    /// Written by a conditional-block process.
    Process(ProcessId),
    /// Computed by a primitive module.
    Prim(ModuleId),
}

/// A named wire or net in the circuit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// The signal name.
    pub name: Ident,
    /// How strongly the name is held (see [`Naming`]).
    pub naming: Naming,
    /// Bit width; the current value always has exactly this width.
    pub width: u32,
    /// Wire (single driver) or net (merged drivers).
    pub kind: SignalKind,
    /// The module this signal belongs to, if any.
    pub module: Option<ModuleId>,
    /// The current value.
    pub(crate) value: LogicValue,
    /// The single driver of a wire, set at most once.
    pub(crate) driver: Option<DriverSource>,
    /// Drivers contributing to a net's merge.
    pub(crate) net_drivers: Vec<SignalId>,
    /// Other nets bridged bidirectionally into this net's group.
    pub(crate) bridges: Vec<SignalId>,
}

impl Signal {
    pub(crate) fn new(name: Ident, width: u32, kind: SignalKind, naming: Naming) -> Self {
        Self {
            name,
            naming,
            width,
            kind,
            module: None,
            value: LogicValue::filled(width, weft_common::Logic::Z),
            driver: None,
            net_drivers: Vec::new(),
            bridges: Vec::new(),
        }
    }

    /// The signal's current value.
    pub fn value(&self) -> &LogicValue {
        &self.value
    }

    /// Whether this signal participates in net merging.
    pub fn is_net(&self) -> bool {
        self.kind == SignalKind::Net
    }

    /// Whether a wire already has its single driver recorded.
    pub fn is_driven(&self) -> bool {
        self.driver.is_some()
    }
}

/// A change event delivered to subscribers of a signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    /// The value before the change.
    pub previous: LogicValue,
    /// The value after the change.
    pub new: LogicValue,
}

/// A read operand in a conditional block: a signal or a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// Read the named signal's current value.
    Sig(SignalId),
    /// A constant value.
    Const(LogicValue),
}

impl Operand {
    /// The signal read by this operand, if it is one.
    pub fn signal(&self) -> Option<SignalId> {
        match self {
            Operand::Sig(id) => Some(*id),
            Operand::Const(_) => None,
        }
    }
}

impl From<SignalId> for Operand {
    fn from(id: SignalId) -> Self {
        Operand::Sig(id)
    }
}

impl From<LogicValue> for Operand {
    fn from(value: LogicValue) -> Self {
        Operand::Const(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EntityId;
    use weft_common::{Interner, Logic};

    #[test]
    fn new_signal_floats() {
        let interner = Interner::new();
        let s = Signal::new(
            interner.intern("bus"),
            4,
            SignalKind::Wire,
            Naming::Renameable,
        );
        assert_eq!(s.value().width(), 4);
        assert!(s.value().is_floating());
        assert!(!s.is_driven());
        assert!(!s.is_net());
    }

    #[test]
    fn operand_conversions() {
        let op: Operand = SignalId::from_index(3).into();
        assert_eq!(op.signal(), Some(SignalId::from_index(3)));
        let op: Operand = LogicValue::of_logic(Logic::One).into();
        assert_eq!(op.signal(), None);
    }
}
