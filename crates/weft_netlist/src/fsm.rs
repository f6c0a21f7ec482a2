//! The state-machine helper: a state register plus a next-state/output
//! block, built on the sequential and combinational primitives.

use crate::circuit::Circuit;
use crate::error::NetlistError;
use crate::ids::{ModuleId, SignalId};
use crate::stmt::{CaseItem, CaseMode, Conditional, Trigger};
use weft_common::LogicValue;

/// One state: its outgoing transitions and the outputs active within it.
pub struct FsmState {
    /// `(condition, next state index)` pairs; the first true condition wins,
    /// otherwise the machine stays put.
    pub transitions: Vec<(SignalId, usize)>,
    /// Output assignments evaluated while in this state.
    pub actions: Vec<Conditional>,
}

/// A built state machine.
pub struct StateMachine {
    /// The registered state, one-hot-free binary encoding by state index.
    pub state: SignalId,
    /// Width of the state encoding.
    pub width: u32,
}

fn encoding_width(states: usize) -> u32 {
    if states <= 1 {
        1
    } else {
        (usize::BITS - (states - 1).leading_zeros()).max(1)
    }
}

impl Circuit {
    /// Builds a state machine clocked on `clk` posedge with synchronous
    /// reset to state 0.
    ///
    /// `default_actions` run at the top of every combinational evaluation,
    /// so per-state actions override them; leave an output unassigned in
    /// them and the latch diagnostic applies as usual.
    pub fn state_machine(
        &mut self,
        m: ModuleId,
        clk: SignalId,
        reset: SignalId,
        default_actions: Vec<Conditional>,
        states: Vec<FsmState>,
    ) -> Result<StateMachine, NetlistError> {
        if states.is_empty() {
            return Err(NetlistError::IllegalTopology {
                reason: "state machine requires at least one state".into(),
            });
        }
        let width = encoding_width(states.len());
        let encode = |index: usize| LogicValue::of_u64(index as u64, width);
        let state = self.signal("fsm_state", width);
        let state_next = self.signal("fsm_state_next", width);

        let mut items = Vec::with_capacity(states.len());
        for (index, spec) in states.into_iter().enumerate() {
            let mut body = spec.actions;
            // First true transition wins; no transition means stay.
            let mut chain: Vec<Conditional> = Vec::new();
            for (cond, next) in spec.transitions.into_iter().rev() {
                chain = vec![Conditional::when(
                    cond,
                    vec![Conditional::assign(state_next, encode(next))],
                    chain,
                )];
            }
            body.extend(chain);
            items.push(CaseItem {
                pattern: encode(index).into(),
                body,
            });
        }

        let mut comb = default_actions;
        comb.push(Conditional::assign(state_next, state));
        comb.push(Conditional::case(
            state,
            items,
            // An unknown or stray encoding recovers to the reset state.
            vec![Conditional::assign(state_next, encode(0))],
            CaseMode::Priority,
        ));
        self.combinational(m, comb)?;

        self.sequential(
            m,
            vec![Trigger::posedge(clk)],
            vec![Conditional::when(
                reset,
                vec![Conditional::assign(state, encode(0))],
                vec![Conditional::assign(state, state_next)],
            )],
        )?;

        Ok(StateMachine { state, width })
    }
}
