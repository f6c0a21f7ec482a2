//! Simulation error types.

use weft_netlist::NetlistError;

/// Errors raised while driving a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// `run` was called while the scheduler was already running.
    #[error("simulator re-entered while running")]
    SimulatorReentered,

    /// An awaited edge saw a transition with an invalid endpoint and the
    /// waiter did not opt into ignoring it.
    #[error("edge await observed an invalid transition on `{signal}`")]
    EdgeOnInvalid {
        /// The watched signal's name.
        signal: String,
    },

    /// A circuit-level failure during propagation or latching.
    #[error(transparent)]
    Netlist(#[from] NetlistError),
}
