//! Pipeline helpers: staged registers with stall/reset configuration and a
//! ready-valid variant with handshake back-pressure.

use std::collections::HashMap;

use crate::circuit::Circuit;
use crate::error::NetlistError;
use crate::ids::{ModuleId, SignalId};
use crate::seq::FlopConfig;
use crate::signal::Operand;
use weft_common::LogicValue;

/// Per-pipeline configuration.
#[derive(Default)]
pub struct PipelineConfig {
    /// Synchronous reset applied to every stage register.
    pub reset: Option<SignalId>,
    /// Per-stage stall signals; a high stall holds that stage's registers.
    /// Missing entries mean the stage never stalls.
    pub stalls: Vec<Option<SignalId>>,
    /// Reset values per tracked (original) signal; all-zero when absent.
    pub reset_values: Vec<(SignalId, LogicValue)>,
}

/// The handle a stage closure uses to address stage-local signal versions.
pub struct Stage<'p> {
    index: usize,
    current: &'p mut HashMap<SignalId, SignalId>,
    order: &'p mut Vec<SignalId>,
}

impl Stage<'_> {
    /// The stage number, starting at zero.
    pub fn index(&self) -> usize {
        self.index
    }

    /// This stage's version of a tracked signal.
    ///
    /// A signal first seen here enters the pipeline at this stage.
    pub fn get(&mut self, original: SignalId) -> SignalId {
        if let Some(&cur) = self.current.get(&original) {
            return cur;
        }
        self.current.insert(original, original);
        self.order.push(original);
        original
    }

    /// Replaces the value of `original` leaving this stage with `replacement`
    /// (combinational logic inserted by the stage closure).
    pub fn drive(&mut self, original: SignalId, replacement: SignalId) {
        if !self.current.contains_key(&original) {
            self.order.push(original);
        }
        self.current.insert(original, replacement);
    }
}

/// A stage body: combinational logic between two register banks.
pub type StageFn = Box<dyn FnOnce(&mut Circuit, &mut Stage) -> Result<(), NetlistError>>;

/// A built pipeline; query per-signal outputs at the final stage.
pub struct Pipeline {
    outputs: HashMap<SignalId, SignalId>,
    depth: usize,
}

impl Pipeline {
    /// Builds a pipeline: each stage closure runs in order, then every
    /// tracked signal is registered into the next stage on `clk` posedge.
    pub fn build(
        c: &mut Circuit,
        m: ModuleId,
        clk: SignalId,
        config: PipelineConfig,
        stages: Vec<StageFn>,
    ) -> Result<Pipeline, NetlistError> {
        let depth = stages.len();
        let mut current: HashMap<SignalId, SignalId> = HashMap::new();
        let mut order: Vec<SignalId> = Vec::new();
        let reset_values: HashMap<SignalId, LogicValue> =
            config.reset_values.into_iter().collect();

        for (index, stage_fn) in stages.into_iter().enumerate() {
            {
                let mut stage = Stage {
                    index,
                    current: &mut current,
                    order: &mut order,
                };
                stage_fn(c, &mut stage)?;
            }
            let stall = config.stalls.get(index).copied().flatten();
            let enable = match stall {
                Some(stall) => Some(c.not_gate(m, stall)?),
                None => None,
            };
            for original in order.clone() {
                let d = current[&original];
                let reset_value = reset_values
                    .get(&original)
                    .cloned()
                    .map(Operand::Const);
                let q = c.flop(
                    m,
                    clk,
                    d,
                    FlopConfig {
                        reset: config.reset,
                        reset_value,
                        en: enable,
                    },
                )?;
                current.insert(original, q);
            }
        }

        Ok(Pipeline {
            outputs: current,
            depth,
        })
    }

    /// The number of register stages.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The final-stage version of a tracked signal.
    pub fn output(&self, original: SignalId) -> Option<SignalId> {
        self.outputs.get(&original).copied()
    }
}

/// The boundary signals of a [`ready_valid_pipeline`].
pub struct ReadyValid {
    /// Valid accompanying the final-stage data.
    pub valid: SignalId,
    /// Final-stage data signals, in input order.
    pub data: Vec<SignalId>,
    /// Back-pressure to the producer: high when stage 0 can accept.
    pub ready: SignalId,
}

/// An elastic pipeline: each stage holds data until the stage after it can
/// accept, propagating readiness upstream (`ready_i = !valid_i | ready_i+1`).
pub fn ready_valid_pipeline(
    c: &mut Circuit,
    m: ModuleId,
    clk: SignalId,
    reset: SignalId,
    valid_in: SignalId,
    data_in: &[SignalId],
    ready_downstream: SignalId,
    depth: usize,
) -> Result<ReadyValid, NetlistError> {
    let mut valid = valid_in;
    let mut data: Vec<SignalId> = data_in.to_vec();
    let mut ready_wires: Vec<SignalId> = Vec::with_capacity(depth);
    let mut valid_regs: Vec<SignalId> = Vec::with_capacity(depth);

    for stage in 0..depth {
        let ready = c.signal(&format!("stage{stage}_ready"), 1);
        ready_wires.push(ready);
        let valid_reg = c.flop(
            m,
            clk,
            valid,
            FlopConfig {
                reset: Some(reset),
                reset_value: None,
                en: Some(ready),
            },
        )?;
        valid_regs.push(valid_reg);
        let mut next_data = Vec::with_capacity(data.len());
        for &d in &data {
            next_data.push(c.flop(
                m,
                clk,
                d,
                FlopConfig {
                    reset: None,
                    reset_value: None,
                    en: Some(ready),
                },
            )?);
        }
        valid = valid_reg;
        data = next_data;
    }

    // Readiness chains backward from the consumer.
    let mut downstream = ready_downstream;
    for stage in (0..depth).rev() {
        let empty = c.not_gate(m, valid_regs[stage])?;
        let can_accept = c.or2(m, empty, downstream)?;
        c.connect(ready_wires[stage], can_accept)?;
        downstream = ready_wires[stage];
    }

    Ok(ReadyValid {
        valid,
        data,
        ready: ready_wires.first().copied().unwrap_or(ready_downstream),
    })
}
