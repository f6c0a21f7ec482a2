//! Synchronous propagation engine.
//!
//! A value change enqueues a `(signal, previous, new)` transition; draining
//! the FIFO worklist wakes each dependent in registration order: drive
//! edges mirror values, nets re-merge, primitives and combinational blocks
//! re-evaluate, sequential blocks capture next-values on trigger edges, and
//! monitors buffer change events. The drain runs to fixpoint or fails with
//! [`NetlistError::CombinationalLoop`] once the evaluation bound is spent.

use std::collections::{HashSet, VecDeque};

use crate::circuit::{Circuit, Dependent};
use crate::diag::{WarnCode, Warning};
use crate::error::NetlistError;
use crate::ids::{ModuleId, ProcessId, SignalId};
use crate::prim::PrimKind;
use crate::signal::{Change, Operand};
use crate::stmt::{CaseMode, Conditional, EdgeKind, ProcessKind};
use weft_common::{Logic, LogicValue, ValueError};

/// One observed transition awaiting dependent wakeup.
pub(crate) struct Transition {
    sig: SignalId,
    prev: LogicValue,
    new: LogicValue,
}

/// Writes staged during one evaluation of a conditional block.
///
/// Later writes to the same target win. In a combinational evaluation,
/// reads observe earlier staged writes (imperative semantics); a sequential
/// evaluation reads only the pre-edge snapshot, so registers chained off one
/// another sample old values.
pub(crate) struct StagedWrites {
    order: Vec<SignalId>,
    map: std::collections::HashMap<SignalId, LogicValue>,
    warnings: Vec<Warning>,
    read_through: bool,
}

impl StagedWrites {
    fn imperative() -> Self {
        Self {
            order: Vec::new(),
            map: std::collections::HashMap::new(),
            warnings: Vec::new(),
            read_through: true,
        }
    }

    fn snapshot() -> Self {
        Self {
            read_through: false,
            ..Self::imperative()
        }
    }

    fn write(&mut self, sig: SignalId, value: LogicValue) {
        if !self.map.contains_key(&sig) {
            self.order.push(sig);
        }
        self.map.insert(sig, value);
    }

    fn read(&self, sig: SignalId) -> Option<&LogicValue> {
        if !self.read_through {
            return None;
        }
        self.map.get(&sig)
    }

    fn into_parts(mut self) -> (Vec<(SignalId, LogicValue)>, Vec<Warning>) {
        let entries = self
            .order
            .iter()
            .map(|sig| (*sig, self.map.remove(sig).expect("staged entry present")))
            .collect();
        (entries, self.warnings)
    }
}

fn edge_fired(edge: EdgeKind, prev: Logic, new: Logic) -> bool {
    let rose = prev == Logic::Zero && new == Logic::One;
    let fell = prev == Logic::One && new == Logic::Zero;
    match edge {
        EdgeKind::Posedge => rose,
        EdgeKind::Negedge => fell,
        EdgeKind::Either => rose || fell,
    }
}

/// True when a condition value selects the taken branch.
fn truthy(value: &LogicValue) -> bool {
    value.or_reduce() == LogicValue::of_bool(true)
}

/// Case-item match: exact 4-state equality, or `Z`-wildcard matching when
/// the block is a `case_z`.
fn case_matches(subject: &LogicValue, pattern: &LogicValue, wildcard_z: bool) -> bool {
    if !wildcard_z {
        return subject == pattern;
    }
    subject
        .bits()
        .zip(pattern.bits())
        .all(|(s, p)| p == Logic::Z || s == Logic::Z || s == p)
}

impl Circuit {
    /// Applies `value` to `sig` and drains the resulting wave to fixpoint.
    pub(crate) fn set_and_propagate(
        &mut self,
        sig: SignalId,
        value: LogicValue,
    ) -> Result<(), NetlistError> {
        let mut queue = VecDeque::new();
        self.apply_change(sig, value, &mut queue);
        self.drain(&mut queue)
    }

    /// Applies several writes before draining, so blocks reading more than
    /// one of the targets settle in a single re-evaluation.
    pub fn deposit_many(
        &mut self,
        writes: &[(SignalId, LogicValue)],
    ) -> Result<(), NetlistError> {
        for (sig, value) in writes {
            self.check_widths(self.signals[*sig].width, value.width())?;
        }
        let mut queue = VecDeque::new();
        for (sig, value) in writes {
            self.apply_change(*sig, value.clone(), &mut queue);
        }
        self.drain(&mut queue)
    }

    fn apply_change(
        &mut self,
        sig: SignalId,
        value: LogicValue,
        queue: &mut VecDeque<Transition>,
    ) {
        debug_assert_eq!(self.signals[sig].width, value.width());
        if self.signals[sig].value == value {
            return;
        }
        let prev = std::mem::replace(&mut self.signals[sig].value, value.clone());
        queue.push_back(Transition {
            sig,
            prev,
            new: value,
        });
    }

    pub(crate) fn drain(&mut self, queue: &mut VecDeque<Transition>) -> Result<(), NetlistError> {
        let budget = (10 * self.signals.len()).max(100);
        let mut steps = 0usize;
        while let Some(transition) = queue.pop_front() {
            steps += 1;
            if steps > budget {
                return Err(NetlistError::CombinationalLoop {
                    signal: self.name_of(transition.sig).to_string(),
                });
            }
            let deps = match self.dependents.get(&transition.sig) {
                Some(d) => d.clone(),
                None => continue,
            };
            for dep in deps {
                match dep {
                    Dependent::Drive(dst) => {
                        let value = self.signals[transition.sig].value.clone();
                        self.apply_change(dst, value, queue);
                    }
                    Dependent::Net(net) => {
                        let merged = self.merge_net(net)?;
                        self.apply_change(net, merged, queue);
                    }
                    Dependent::Prim(m) => self.evaluate_prim(m, queue)?,
                    Dependent::Comb(p) => self.evaluate_comb_into(p, queue)?,
                    Dependent::Seq(p) => {
                        self.maybe_trigger_sequential(p, transition.sig, &transition.prev, &transition.new)?;
                    }
                    Dependent::Monitor(mid) => {
                        self.monitors[mid].events.push(Change {
                            previous: transition.prev.clone(),
                            new: transition.new.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// The tri-state merge over every driver of the net's bridge group.
    pub(crate) fn merge_net(&self, net: SignalId) -> Result<LogicValue, NetlistError> {
        let width = self.signals[net].width;
        let mut group = vec![net];
        let mut visited: HashSet<SignalId> = group.iter().copied().collect();
        let mut cursor = 0;
        while cursor < group.len() {
            let member = group[cursor];
            cursor += 1;
            for &bridged in &self.signals[member].bridges {
                if visited.insert(bridged) {
                    group.push(bridged);
                }
            }
        }
        let mut merged = LogicValue::filled(width, Logic::Z);
        for member in group {
            for &driver in &self.signals[member].net_drivers {
                merged = merged.resolve(&self.signals[driver].value)?;
            }
        }
        Ok(merged)
    }

    /// Recomputes a net's merged value and propagates the result.
    pub(crate) fn refresh_net(&mut self, net: SignalId) -> Result<(), NetlistError> {
        let merged = self.merge_net(net)?;
        self.set_and_propagate(net, merged)
    }

    // --- primitive evaluation ----------------------------------------------

    fn evaluate_prim(
        &mut self,
        m: ModuleId,
        queue: &mut VecDeque<Transition>,
    ) -> Result<(), NetlistError> {
        let (kind, input_ids, output) = {
            let module = &self.modules[m];
            (
                module.prim.clone(),
                module.prim_inputs.clone(),
                module.prim_output,
            )
        };
        let (Some(kind), Some(output)) = (kind, output) else {
            return Ok(());
        };
        let inputs: Vec<LogicValue> = input_ids
            .iter()
            .map(|&s| self.signals[s].value.clone())
            .collect();
        let result = eval_prim_kind(&kind, &inputs)?;
        self.apply_change(output, result, queue);
        Ok(())
    }

    /// Re-evaluates a primitive outside a drain (used at construction).
    pub(crate) fn settle_prim(&mut self, m: ModuleId) -> Result<(), NetlistError> {
        let mut queue = VecDeque::new();
        self.evaluate_prim(m, &mut queue)?;
        self.drain(&mut queue)
    }

    // --- conditional-block evaluation --------------------------------------

    /// Evaluates a combinational block and drains the wave (used at
    /// registration and by the build-time settle).
    pub(crate) fn evaluate_combinational(&mut self, p: ProcessId) -> Result<(), NetlistError> {
        let mut queue = VecDeque::new();
        self.evaluate_comb_into(p, &mut queue)?;
        self.drain(&mut queue)
    }

    fn evaluate_comb_into(
        &mut self,
        p: ProcessId,
        queue: &mut VecDeque<Transition>,
    ) -> Result<(), NetlistError> {
        let body = self.processes[p].body.clone();
        let mut staged = StagedWrites::imperative();
        self.exec_block(&body, &mut staged)?;
        let (entries, warnings) = staged.into_parts();
        self.warnings.extend(warnings);
        for (sig, value) in entries {
            self.apply_change(sig, value, queue);
        }
        Ok(())
    }

    fn maybe_trigger_sequential(
        &mut self,
        p: ProcessId,
        sig: SignalId,
        prev: &LogicValue,
        new: &LogicValue,
    ) -> Result<(), NetlistError> {
        let fired = match &self.processes[p].kind {
            ProcessKind::Sequential { triggers } => triggers
                .iter()
                .any(|t| t.signal == sig && edge_fired(t.edge, prev.get(0), new.get(0))),
            ProcessKind::Combinational { .. } => false,
        };
        if !fired {
            return Ok(());
        }
        // Sample against the pre-edge snapshot: staged writes stay invisible
        // to later reads, so chained registers observe old values.
        let body = self.processes[p].body.clone();
        let mut staged = StagedWrites::snapshot();
        self.exec_block(&body, &mut staged)?;
        let (entries, warnings) = staged.into_parts();
        self.warnings.extend(warnings);
        self.processes[p].pending = entries;
        Ok(())
    }

    /// Whether any sequential block holds captured next-values.
    pub fn pending_sequential(&self) -> bool {
        self.processes.values().any(|p| !p.pending.is_empty())
    }

    /// Commits captured sequential next-values and settles the resulting
    /// combinational wave. The scheduler calls this at clk-stable.
    pub fn latch_sequential(&mut self) -> Result<(), NetlistError> {
        let mut queue = VecDeque::new();
        let pids: Vec<ProcessId> = self.processes.ids().collect();
        for pid in pids {
            let pending = std::mem::take(&mut self.processes[pid].pending);
            for (sig, value) in pending {
                self.apply_change(sig, value, &mut queue);
            }
        }
        self.drain(&mut queue)
    }

    // --- statement execution -----------------------------------------------

    fn read_operand(&self, op: &Operand, staged: &StagedWrites) -> LogicValue {
        match op {
            Operand::Sig(id) => staged
                .read(*id)
                .cloned()
                .unwrap_or_else(|| self.signals[*id].value.clone()),
            Operand::Const(v) => v.clone(),
        }
    }

    fn exec_block(
        &self,
        body: &[Conditional],
        staged: &mut StagedWrites,
    ) -> Result<(), NetlistError> {
        for stmt in body {
            self.exec_stmt(stmt, staged)?;
        }
        Ok(())
    }

    /// Stages `X` onto every signal the statement could write.
    fn drive_x_writes(&self, stmt: &Conditional, staged: &mut StagedWrites) {
        let mut writes = Vec::new();
        let mut seen = HashSet::new();
        stmt.collect_writes(&mut writes, &mut seen);
        for dst in writes {
            staged.write(dst, LogicValue::filled(self.signals[dst].width, Logic::X));
        }
    }

    fn exec_stmt(&self, stmt: &Conditional, staged: &mut StagedWrites) -> Result<(), NetlistError> {
        match stmt {
            Conditional::Assign { dst, src } => {
                let value = self.read_operand(src, staged);
                staged.write(*dst, value);
                Ok(())
            }
            Conditional::If { arms, or_else } => {
                for arm in arms {
                    let cond = self.read_operand(&arm.condition, staged);
                    if !cond.is_valid() {
                        self.drive_x_writes(stmt, staged);
                        return Ok(());
                    }
                    if truthy(&cond) {
                        return self.exec_block(&arm.body, staged);
                    }
                }
                self.exec_block(or_else, staged)
            }
            Conditional::Case {
                subject,
                items,
                default,
                mode,
                wildcard_z,
            } => {
                let subj = self.read_operand(subject, staged);
                let matching: Vec<usize> = items
                    .iter()
                    .enumerate()
                    .filter(|(_, item)| {
                        let pat = self.read_operand(&item.pattern, staged);
                        case_matches(&subj, &pat, *wildcard_z)
                    })
                    .map(|(i, _)| i)
                    .collect();
                match mode {
                    CaseMode::Unique => {
                        if matching.len() == 1 {
                            self.exec_block(&items[matching[0]].body, staged)
                        } else {
                            staged.warnings.push(Warning::new(
                                WarnCode::UniqueCaseViolation,
                                format!(
                                    "unique case over {subj} selected {} items, taking default",
                                    matching.len()
                                ),
                            ));
                            self.exec_block(default, staged)
                        }
                    }
                    CaseMode::Normal | CaseMode::Priority => match matching.first() {
                        Some(&i) => self.exec_block(&items[i].body, staged),
                        None => self.exec_block(default, staged),
                    },
                }
            }
            Conditional::Compound(stmts) => self.exec_block(stmts, staged),
        }
    }
}

/// Evaluates one primitive operation over its input values.
fn eval_prim_kind(kind: &PrimKind, inputs: &[LogicValue]) -> Result<LogicValue, NetlistError> {
    let shift = |r: Result<LogicValue, ValueError>, data: &LogicValue| match r {
        Ok(v) => Ok(v),
        // An undriven or unknown shift amount yields an unknown output
        // rather than aborting the wave.
        Err(ValueError::InvalidShamt { .. }) => Ok(LogicValue::filled(data.width(), Logic::X)),
        Err(e) => Err(NetlistError::from(e)),
    };
    let out = match kind {
        PrimKind::Not => inputs[0].not_value(),
        PrimKind::And2 => inputs[0].and(&inputs[1])?,
        PrimKind::Or2 => inputs[0].or(&inputs[1])?,
        PrimKind::Xor2 => inputs[0].xor(&inputs[1])?,
        PrimKind::RedAnd => inputs[0].and_reduce(),
        PrimKind::RedOr => inputs[0].or_reduce(),
        PrimKind::RedXor => inputs[0].xor_reduce(),
        PrimKind::Eq => inputs[0].equals(&inputs[1])?,
        PrimKind::Neq => inputs[0].not_equals(&inputs[1])?,
        PrimKind::Lt => inputs[0].less_than(&inputs[1])?,
        PrimKind::Lte => inputs[0].less_or_equal(&inputs[1])?,
        PrimKind::Gt => inputs[0].greater_than(&inputs[1])?,
        PrimKind::Gte => inputs[0].greater_or_equal(&inputs[1])?,
        PrimKind::Shl => shift(inputs[0].shl_by(&inputs[1]), &inputs[0])?,
        PrimKind::Srl => shift(inputs[0].srl_by(&inputs[1]), &inputs[0])?,
        PrimKind::Sra => shift(inputs[0].sra_by(&inputs[1]), &inputs[0])?,
        PrimKind::Add => inputs[0].add(&inputs[1])?,
        PrimKind::Sub => inputs[0].sub(&inputs[1])?,
        PrimKind::Mul => inputs[0].mul(&inputs[1])?,
        PrimKind::Mux => {
            let cond = &inputs[0];
            match cond.get(0) {
                Logic::One => inputs[1].clone(),
                Logic::Zero => inputs[2].clone(),
                Logic::X | Logic::Z => LogicValue::filled(inputs[1].width(), Logic::X),
            }
        }
        PrimKind::Slice { hi, lo } => inputs[0].slice(*hi, *lo)?,
        PrimKind::Concat => {
            LogicValue::concat_lsb_first(&[inputs[0].clone(), inputs[1].clone()])
        }
        PrimKind::Replicate { count } => inputs[0].replicate(*count)?,
        PrimKind::Const { value } => value.clone(),
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stmt::{CaseItem, Trigger};

    fn v(s: &str) -> LogicValue {
        LogicValue::of_string(s).unwrap()
    }

    #[test]
    fn truthy_rules() {
        assert!(truthy(&v("1")));
        assert!(truthy(&v("10")));
        assert!(!truthy(&v("0")));
        assert!(!truthy(&v("00")));
    }

    #[test]
    fn case_match_exact_and_wildcard() {
        assert!(case_matches(&v("10"), &v("10"), false));
        assert!(!case_matches(&v("10"), &v("1z"), false));
        assert!(case_matches(&v("10"), &v("1z"), true));
        assert!(case_matches(&v("1z"), &v("10"), true));
        assert!(!case_matches(&v("10"), &v("0z"), true));
        // x is not a wildcard even in case_z
        assert!(!case_matches(&v("10"), &v("1x"), true));
    }

    #[test]
    fn edge_detection() {
        assert!(edge_fired(EdgeKind::Posedge, Logic::Zero, Logic::One));
        assert!(!edge_fired(EdgeKind::Posedge, Logic::One, Logic::Zero));
        assert!(edge_fired(EdgeKind::Negedge, Logic::One, Logic::Zero));
        assert!(edge_fired(EdgeKind::Either, Logic::Zero, Logic::One));
        assert!(edge_fired(EdgeKind::Either, Logic::One, Logic::Zero));
        // invalid-flanked transitions are not edges
        assert!(!edge_fired(EdgeKind::Posedge, Logic::Z, Logic::One));
        assert!(!edge_fired(EdgeKind::Posedge, Logic::X, Logic::One));
        assert!(!edge_fired(EdgeKind::Either, Logic::Zero, Logic::X));
    }

    #[test]
    fn comb_block_follows_inputs() {
        let mut c = Circuit::new();
        let m = c.module("top", "Top");
        let a = c.signal("a", 1);
        let b = c.signal("b", 1);
        let y = c.signal("y", 1);
        // y = a, then overwritten by b: last write wins
        c.combinational(
            m,
            vec![
                Conditional::assign(y, a),
                Conditional::assign(y, b),
            ],
        )
        .unwrap();
        c.deposit(a, v("1")).unwrap();
        c.deposit(b, v("0")).unwrap();
        assert_eq!(*c.value(y), v("0"));
        c.deposit(b, v("1")).unwrap();
        assert_eq!(*c.value(y), v("1"));
    }

    #[test]
    fn comb_if_latches_prior_value() {
        let mut c = Circuit::new();
        let m = c.module("top", "Top");
        let en = c.signal("en", 1);
        let d = c.signal("d", 1);
        let q = c.signal("q", 1);
        c.combinational_with_latches(
            m,
            vec![Conditional::when(en, vec![Conditional::assign(q, d)], vec![])],
        )
        .unwrap();
        c.deposit(en, v("1")).unwrap();
        c.deposit(d, v("1")).unwrap();
        assert_eq!(*c.value(q), v("1"));
        c.deposit(en, v("0")).unwrap();
        c.deposit(d, v("0")).unwrap();
        // q retains its prior value with en low
        assert_eq!(*c.value(q), v("1"));
    }

    #[test]
    fn invalid_condition_drives_x() {
        let mut c = Circuit::new();
        let m = c.module("top", "Top");
        let en = c.signal("en", 1);
        let d = c.signal("d", 1);
        let q = c.signal("q", 1);
        c.combinational_with_latches(
            m,
            vec![Conditional::when(en, vec![Conditional::assign(q, d)], vec![])],
        )
        .unwrap();
        c.deposit(d, v("1")).unwrap();
        // en is floating (Z) → the branch cannot be resolved
        assert_eq!(*c.value(q), v("x"));
    }

    #[test]
    fn unique_case_violation_warns_and_takes_default() {
        let mut c = Circuit::new();
        let m = c.module("top", "Top");
        let sel = c.signal("sel", 2);
        let out = c.signal("out", 4);
        c.combinational(
            m,
            vec![Conditional::case(
                sel,
                vec![
                    CaseItem {
                        pattern: Operand::Const(v("1x")),
                        body: vec![Conditional::assign(out, v("0011"))],
                    },
                    CaseItem {
                        pattern: Operand::Const(v("x0")),
                        body: vec![Conditional::assign(out, v("0100"))],
                    },
                ],
                vec![Conditional::assign(out, v("0000"))],
                CaseMode::Unique,
            )],
        )
        .unwrap();
        c.take_warnings();
        c.deposit(sel, v("10")).unwrap();
        assert_eq!(*c.value(out), v("0000"));
        let warnings = c.take_warnings();
        assert!(warnings
            .iter()
            .any(|w| w.code == WarnCode::UniqueCaseViolation));
    }

    #[test]
    fn priority_case_takes_first_match() {
        let mut c = Circuit::new();
        let m = c.module("top", "Top");
        let sel = c.signal("sel", 2);
        let out = c.signal("out", 4);
        c.combinational(
            m,
            vec![Conditional::case(
                sel,
                vec![
                    CaseItem {
                        pattern: Operand::Const(v("01")),
                        body: vec![Conditional::assign(out, v("0001"))],
                    },
                    CaseItem {
                        pattern: Operand::Const(v("10")),
                        body: vec![Conditional::assign(out, v("0010"))],
                    },
                ],
                vec![Conditional::assign(out, v("0000"))],
                CaseMode::Priority,
            )],
        )
        .unwrap();
        c.deposit(sel, v("10")).unwrap();
        assert_eq!(*c.value(out), v("0010"));
        c.deposit(sel, v("01")).unwrap();
        assert_eq!(*c.value(out), v("0001"));
        c.deposit(sel, v("11")).unwrap();
        assert_eq!(*c.value(out), v("0000"));
    }

    #[test]
    fn case_z_wildcard_matching() {
        let mut c = Circuit::new();
        let m = c.module("top", "Top");
        let sel = c.signal("sel", 2);
        let out = c.signal("out", 1);
        c.combinational(
            m,
            vec![Conditional::case_z(
                sel,
                vec![CaseItem {
                    pattern: Operand::Const(v("1z")),
                    body: vec![Conditional::assign(out, v("1"))],
                }],
                vec![Conditional::assign(out, v("0"))],
                CaseMode::Normal,
            )],
        )
        .unwrap();
        c.deposit(sel, v("10")).unwrap();
        assert_eq!(*c.value(out), v("1"));
        c.deposit(sel, v("11")).unwrap();
        assert_eq!(*c.value(out), v("1"));
        c.deposit(sel, v("01")).unwrap();
        assert_eq!(*c.value(out), v("0"));
    }

    #[test]
    fn sequential_captures_and_latches() {
        let mut c = Circuit::new();
        let m = c.module("top", "Top");
        let clk = c.signal("clk", 1);
        let d = c.signal("d", 4);
        let q = c.signal("q", 4);
        c.sequential(
            m,
            vec![Trigger::posedge(clk)],
            vec![Conditional::assign(q, d)],
        )
        .unwrap();
        c.deposit(clk, v("0")).unwrap();
        c.deposit(d, v("1010")).unwrap();
        // No edge yet, q still floating
        assert!(c.value(q).is_floating());
        c.deposit(clk, v("1")).unwrap();
        // Edge captured but not yet committed
        assert!(c.value(q).is_floating());
        assert!(c.pending_sequential());
        c.latch_sequential().unwrap();
        assert_eq!(*c.value(q), v("1010"));
        assert!(!c.pending_sequential());
    }

    #[test]
    fn sequential_reads_pre_edge_values() {
        // q2 samples q1's OLD value on the same edge (classic shift register).
        let mut c = Circuit::new();
        let m = c.module("top", "Top");
        let clk = c.signal("clk", 1);
        let d = c.signal("d", 1);
        let q1 = c.signal("q1", 1);
        let q2 = c.signal("q2", 1);
        c.sequential(
            m,
            vec![Trigger::posedge(clk)],
            vec![Conditional::assign(q1, d), Conditional::assign(q2, q1)],
        )
        .unwrap();
        c.deposit(clk, v("0")).unwrap();
        c.deposit(d, v("1")).unwrap();
        c.deposit(clk, v("1")).unwrap();
        c.latch_sequential().unwrap();
        assert_eq!(*c.value(q1), v("1"));
        // q1 was floating before the edge
        assert!(c.value(q2).is_floating());
        c.deposit(clk, v("0")).unwrap();
        c.deposit(clk, v("1")).unwrap();
        c.latch_sequential().unwrap();
        assert_eq!(*c.value(q2), v("1"));
    }

    #[test]
    fn simultaneous_inputs_single_event() {
        let mut c = Circuit::new();
        let m = c.module("top", "Top");
        let a = c.signal("a", 1);
        let b = c.signal("b", 1);
        let y = c.signal("y", 1);
        // y = a ? b : 0
        c.combinational(
            m,
            vec![Conditional::when(
                a,
                vec![Conditional::assign(y, b)],
                vec![Conditional::assign(y, v("0"))],
            )],
        )
        .unwrap();
        c.deposit_many(&[(a, v("0")), (b, v("0"))]).unwrap();
        let mid = c.monitor(y);
        // Both inputs flip in the same batch: y settles with one event.
        c.deposit_many(&[(a, v("1")), (b, v("1"))]).unwrap();
        let events = c.take_changes(mid);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].new, v("1"));
    }

    #[test]
    fn combinational_loop_detected() {
        let mut c = Circuit::new();
        let m = c.module("top", "Top");
        let a = c.signal("a", 1);
        let b = c.signal("b", 1);
        // b = !a with a driven-valid default, then a wired back to b:
        // 0 → 1 → 0 → ... never settles.
        c.combinational(
            m,
            vec![Conditional::case(
                a,
                vec![
                    CaseItem {
                        pattern: Operand::Const(v("0")),
                        body: vec![Conditional::assign(b, v("1"))],
                    },
                    CaseItem {
                        pattern: Operand::Const(v("1")),
                        body: vec![Conditional::assign(b, v("0"))],
                    },
                ],
                vec![Conditional::assign(b, v("0"))],
                CaseMode::Normal,
            )],
        )
        .unwrap();
        assert!(matches!(
            c.connect(a, b),
            Err(NetlistError::CombinationalLoop { .. })
        ));
    }
}
