//! Module records — the organizational unit of the circuit hierarchy.
//!
//! A [`Module`] declares its external interface as ports backed by internal
//! signals, owns child modules and conditional-block processes, and carries
//! a build flag frozen by elaboration. Leaf primitives additionally carry a
//! [`PrimKind`] body.

use crate::ids::{ModuleId, ProcessId, SignalId};
use crate::prim::PrimKind;
use serde::{Deserialize, Serialize};
use weft_common::Ident;

/// The direction of a port on a module boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Data flows into the module.
    Input,
    /// Data flows out of the module.
    Output,
    /// Bidirectional net port.
    InOut,
}

/// A port in a module's external interface.
///
/// The internal signal is what module logic reads or drives; for inputs and
/// inouts the external signal is the parent-side connection point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    /// The port name, preserved exactly by emitters.
    pub name: Ident,
    /// The direction of data flow.
    pub direction: PortDirection,
    /// The parent-side signal, absent for outputs.
    pub external: Option<SignalId>,
    /// The module-side signal returned by port registration.
    pub internal: SignalId,
    /// Bit width of the port.
    pub width: u32,
}

/// A hardware module: ports, children, processes, and an optional primitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    /// The instance name.
    pub name: Ident,
    /// The emitted type name.
    pub definition_name: Ident,
    /// Forbids uniquification of the instance name.
    pub reserve_name: bool,
    /// Forbids uniquification of the definition name.
    pub reserve_definition_name: bool,
    /// The enclosing module, if any.
    pub parent: Option<ModuleId>,
    /// Child modules in registration order.
    pub children: Vec<ModuleId>,
    /// Declared ports in registration order.
    pub ports: Vec<Port>,
    /// Conditional blocks registered on this module.
    pub processes: Vec<ProcessId>,
    /// The primitive operation for leaf primitives.
    pub prim: Option<PrimKind>,
    /// Primitive input signals in operand order.
    pub(crate) prim_inputs: Vec<SignalId>,
    /// Primitive output signal.
    pub(crate) prim_output: Option<SignalId>,
    /// Set once elaboration completes; the port set is frozen after.
    pub built: bool,
}

impl Module {
    pub(crate) fn new(name: Ident, definition_name: Ident, parent: Option<ModuleId>) -> Self {
        Self {
            name,
            definition_name,
            reserve_name: false,
            reserve_definition_name: false,
            parent,
            children: Vec::new(),
            ports: Vec::new(),
            processes: Vec::new(),
            prim: None,
            prim_inputs: Vec::new(),
            prim_output: None,
            built: false,
        }
    }

    /// Finds a port by name identifier.
    pub fn port(&self, name: Ident) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Iterates ports of the given direction.
    pub fn ports_in_direction(
        &self,
        direction: PortDirection,
    ) -> impl Iterator<Item = &Port> + '_ {
        self.ports.iter().filter(move |p| p.direction == direction)
    }

    /// Whether this module is a built-in primitive.
    pub fn is_primitive(&self) -> bool {
        self.prim.is_some()
    }
}
