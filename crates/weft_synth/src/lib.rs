//! Synthesis hooks: the pieces of the core that emitters consume.
//!
//! Emitters (HDL or schematic) walk a built circuit's module tree. This
//! crate supplies the two contracts they rely on: stable identifier
//! assignment honoring the [`Naming`](weft_netlist::Naming) policy, and
//! [`PrimitiveDescriptor`]s mapping built-in module classes to target cells.

#![warn(missing_docs)]

pub mod descriptor;
pub mod names;

pub use descriptor::{
    descriptor_for, sequential_mapping, PortDesc, PortPattern, PrimitiveDescriptor, SeqMapping,
};
pub use names::{legalized, NameRegistry, SynthError};
