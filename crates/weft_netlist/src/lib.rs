//! Signal graph, module elaboration, and conditional blocks.
//!
//! The [`Circuit`] owns every signal, module, and process in a design. Users
//! wire signals with [`Circuit::connect`], compose [`Module`]s with declared
//! ports, and describe behavior with [`Conditional`] blocks; the synchronous
//! propagation engine keeps signal values settled as the structure grows, and
//! [`Circuit::build`] finalizes connectivity with the elaboration checks.

#![warn(missing_docs)]

pub mod build;
pub mod circuit;
pub mod diag;
pub mod error;
mod eval;
pub mod fsm;
pub mod gates;
pub mod ids;
pub mod interface;
pub mod module;
pub mod naming;
pub mod pipeline;
pub mod prim;
pub mod seq;
pub mod signal;
pub mod stmt;
pub mod store;

pub use circuit::{Circuit, Monitor};
pub use diag::{WarnCode, Warning};
pub use error::NetlistError;
pub use fsm::{FsmState, StateMachine};
pub use ids::{ModuleId, MonitorId, ProcessId, SignalId};
pub use interface::{Interface, PortSpec, Role};
pub use module::{Module, Port, PortDirection};
pub use naming::Naming;
pub use pipeline::{ready_valid_pipeline, Pipeline, PipelineConfig, ReadyValid, Stage, StageFn};
pub use prim::PrimKind;
pub use seq::FlopConfig;
pub use signal::{Change, Operand, Signal, SignalKind};
pub use stmt::{CaseItem, CaseMode, Conditional, EdgeKind, IfArm, Process, ProcessKind, Trigger};
pub use store::{EntityId, Store};
