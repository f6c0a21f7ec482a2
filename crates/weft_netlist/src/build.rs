//! Module elaboration: the build lifecycle and its validation passes.
//!
//! Building a module recursively builds its children, then checks that
//! every output traces back only to registered sources, that combinational
//! paths are acyclic, that reserved names survive uniquification, and that
//! combinational blocks assign on every path (or were declared latching).
//! After a final settle the module is frozen.

use std::collections::{HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::circuit::Circuit;
use crate::diag::{WarnCode, Warning};
use crate::error::NetlistError;
use crate::ids::{ModuleId, SignalId};
use crate::module::PortDirection;
use crate::naming::uniquified;
use crate::signal::{DriverSource, SignalKind};
use crate::stmt::{always_assigned, ProcessKind};

impl Circuit {
    /// Elaborates a module: validates, uniquifies names, settles values, and
    /// freezes the hierarchy beneath it.
    ///
    /// Children are built recursively (already-built children are skipped);
    /// calling `build` again on the same module is an error.
    pub fn build(&mut self, m: ModuleId) -> Result<(), NetlistError> {
        if self.modules[m].built {
            return Err(NetlistError::ModuleBuiltTwice {
                name: self.module_name(m).to_string(),
            });
        }
        self.build_rec(m)?;
        self.check_combinational_cycles()
    }

    fn build_rec(&mut self, m: ModuleId) -> Result<(), NetlistError> {
        if self.modules[m].built {
            return Ok(());
        }
        for child in self.modules[m].children.clone() {
            self.build_rec(child)?;
        }
        self.validate_topology(m)?;
        self.latch_diagnostic(m);
        self.uniquify_names(m)?;
        self.settle_module(m)?;
        self.modules[m].built = true;
        Ok(())
    }

    // --- output-cone validation --------------------------------------------

    /// Backward trace from each output: only internal signals, registered
    /// input/inout internals of this module, and outputs of registered child
    /// modules may appear. Signals not yet owned by any module are adopted
    /// as internals of this one; a signal owned elsewhere is the stray node.
    fn validate_topology(&mut self, m: ModuleId) -> Result<(), NetlistError> {
        let mut visited = HashSet::new();
        let mut stack: Vec<SignalId> = self.modules[m]
            .ports_in_direction(PortDirection::Output)
            .map(|p| p.internal)
            .collect();

        while let Some(sig) = stack.pop() {
            if !visited.insert(sig) {
                continue;
            }
            for source in self.trace_sources(m, sig)? {
                stack.push(source);
            }
        }
        Ok(())
    }

    /// The backward expansion of one signal during output-cone validation.
    fn trace_sources(&mut self, m: ModuleId, sig: SignalId) -> Result<Vec<SignalId>, NetlistError> {
        match self.signals[sig].module {
            Some(owner) if owner == m => {
                // Registered input/inout internals are legal sources; the
                // trace stops there rather than escaping to the parent side.
                let is_boundary = self.modules[m].ports.iter().any(|p| {
                    p.internal == sig
                        && matches!(p.direction, PortDirection::Input | PortDirection::InOut)
                });
                if is_boundary {
                    return Ok(Vec::new());
                }
                Ok(self.driver_sources(sig))
            }
            Some(owner) => {
                let child = &self.modules[owner];
                let is_child_output = child.parent == Some(m)
                    && child
                        .ports_in_direction(PortDirection::Output)
                        .any(|p| p.internal == sig);
                if !is_child_output {
                    return Err(NetlistError::IllegalTopology {
                        reason: format!(
                            "output of `{}` reaches `{}` owned by module `{}`, which is not \
                             a registered part of `{}`",
                            self.module_name(m),
                            self.name_of(sig),
                            self.module_name(owner),
                            self.module_name(m)
                        ),
                    });
                }
                // Continue through the child's input side in this scope.
                Ok(child
                    .ports
                    .iter()
                    .filter(|p| matches!(p.direction, PortDirection::Input | PortDirection::InOut))
                    .filter_map(|p| p.external)
                    .collect())
            }
            None => {
                // First module to reach an unowned signal claims it.
                self.signals[sig].module = Some(m);
                Ok(self.driver_sources(sig))
            }
        }
    }

    /// What structurally feeds a signal, independent of module scoping.
    fn driver_sources(&self, sig: SignalId) -> Vec<SignalId> {
        let record = &self.signals[sig];
        if record.kind == SignalKind::Net {
            let mut sources = record.net_drivers.clone();
            sources.extend(record.bridges.iter().copied());
            return sources;
        }
        match record.driver {
            Some(DriverSource::Edge(src)) => vec![src],
            Some(DriverSource::Process(p)) => self.processes[p].reads.clone(),
            Some(DriverSource::Prim(pm)) => self.modules[pm].prim_inputs.clone(),
            None => Vec::new(),
        }
    }

    // --- combinational acyclicity ------------------------------------------

    /// Global structural check: every cycle in the value-flow graph must pass
    /// through a sequential stage. Bridged nets collapse to one node so a
    /// bridge is not itself a cycle.
    fn check_combinational_cycles(&self) -> Result<(), NetlistError> {
        let rep = self.net_group_reps();
        let mut graph: DiGraph<SignalId, ()> = DiGraph::new();
        let mut nodes: HashMap<SignalId, NodeIndex> = HashMap::new();
        let mut node = |graph: &mut DiGraph<SignalId, ()>, sig: SignalId| {
            let key = rep.get(&sig).copied().unwrap_or(sig);
            *nodes.entry(key).or_insert_with(|| graph.add_node(key))
        };

        let mut edges: Vec<(SignalId, SignalId)> = Vec::new();
        for (sig, record) in self.signals.entries() {
            match record.driver {
                Some(DriverSource::Edge(src)) => edges.push((src, sig)),
                Some(DriverSource::Process(p)) => {
                    if matches!(
                        self.processes[p].kind,
                        ProcessKind::Combinational { .. }
                    ) {
                        for &r in &self.processes[p].reads {
                            edges.push((r, sig));
                        }
                    }
                }
                Some(DriverSource::Prim(pm)) => {
                    for &input in &self.modules[pm].prim_inputs {
                        edges.push((input, sig));
                    }
                }
                None => {}
            }
            for &driver in &record.net_drivers {
                edges.push((driver, sig));
            }
        }

        for (from, to) in edges {
            let a = node(&mut graph, from);
            let b = node(&mut graph, to);
            if a != b {
                graph.add_edge(a, b, ());
            } else {
                graph.add_edge(a, a, ());
            }
        }

        for scc in tarjan_scc(&graph) {
            let cyclic = scc.len() > 1
                || (scc.len() == 1 && graph.contains_edge(scc[0], scc[0]));
            if cyclic {
                let sig = graph[scc[0]];
                return Err(NetlistError::IllegalTopology {
                    reason: format!(
                        "combinational cycle through signal `{}`; break it with a \
                         sequential stage",
                        self.name_of(sig)
                    ),
                });
            }
        }
        Ok(())
    }

    /// Maps each bridged net to a stable group representative.
    fn net_group_reps(&self) -> HashMap<SignalId, SignalId> {
        let mut rep = HashMap::new();
        let mut assigned: HashSet<SignalId> = HashSet::new();
        for (sig, record) in self.signals.entries() {
            if record.kind != SignalKind::Net || assigned.contains(&sig) {
                continue;
            }
            // BFS over the bridge group; the first-seen net is representative.
            let mut group = vec![sig];
            let mut cursor = 0;
            assigned.insert(sig);
            while cursor < group.len() {
                let member = group[cursor];
                cursor += 1;
                for &next in &self.signals[member].bridges {
                    if assigned.insert(next) {
                        group.push(next);
                    }
                }
            }
            for member in group {
                rep.insert(member, sig);
            }
        }
        rep
    }

    // --- diagnostics and naming --------------------------------------------

    /// Flags combinational targets that are not assigned on every control
    /// path, unless the block permits latches.
    fn latch_diagnostic(&mut self, m: ModuleId) {
        let mut found = Vec::new();
        for &pid in &self.modules[m].processes {
            let process = &self.processes[pid];
            let ProcessKind::Combinational { allow_latches } = process.kind else {
                continue;
            };
            if allow_latches {
                continue;
            }
            let covered = always_assigned(&process.body);
            for &w in &process.writes {
                if !covered.contains(&w) {
                    found.push(Warning::new(
                        WarnCode::InferredLatch,
                        format!(
                            "signal `{}` in module `{}` is not assigned on every path \
                             of a combinational block and will latch its prior value",
                            self.name_of(w),
                            self.module_name(m)
                        ),
                    ));
                }
            }
        }
        self.warnings.extend(found);
    }

    /// Uniquifies this module's internal signal names; reserved names must
    /// survive exactly and may not collide.
    fn uniquify_names(&mut self, m: ModuleId) -> Result<(), NetlistError> {
        let owned: Vec<SignalId> = self
            .signals
            .entries()
            .filter(|(_, s)| s.module == Some(m))
            .map(|(id, _)| id)
            .collect();

        let mut taken: HashSet<String> = HashSet::new();
        for &sig in &owned {
            if self.signals[sig].naming.is_renameable() {
                continue;
            }
            let name = self.name_of(sig).to_string();
            if !taken.insert(name.clone()) {
                return Err(NetlistError::DuplicateReservedName { name });
            }
        }
        for &sig in &owned {
            if !self.signals[sig].naming.is_renameable() {
                continue;
            }
            let name = self.name_of(sig).to_string();
            let unique = uniquified(&name, &taken);
            if unique != name {
                self.signals[sig].name = self.interner.intern(&unique);
            }
            taken.insert(unique);
        }
        Ok(())
    }

    /// Final settle of the module's own logic so initial values are
    /// deterministic after build.
    fn settle_module(&mut self, m: ModuleId) -> Result<(), NetlistError> {
        if self.modules[m].prim.is_some() {
            self.settle_prim(m)?;
        }
        for pid in self.modules[m].processes.clone() {
            if matches!(
                self.processes[pid].kind,
                ProcessKind::Combinational { .. }
            ) {
                self.evaluate_combinational(pid)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::Naming;
    use crate::stmt::Conditional;
    use weft_common::LogicValue;

    fn v(s: &str) -> LogicValue {
        LogicValue::of_string(s).unwrap()
    }

    #[test]
    fn build_marks_hierarchy_built() {
        let mut c = Circuit::new();
        let top = c.module("top", "Top");
        let a = c.signal("a", 1);
        let y = c.not_gate(top, a).unwrap();
        let out = c.add_output(top, "out", 1).unwrap();
        c.connect(out, y).unwrap();
        c.build(top).unwrap();
        assert!(c.module_info(top).built);
        let gate = c.module_info(top).children[0];
        assert!(c.module_info(gate).built);
    }

    #[test]
    fn build_twice_rejected() {
        let mut c = Circuit::new();
        let top = c.module("top", "Top");
        c.build(top).unwrap();
        assert!(matches!(
            c.build(top),
            Err(NetlistError::ModuleBuiltTwice { .. })
        ));
    }

    #[test]
    fn built_module_is_frozen() {
        let mut c = Circuit::new();
        let top = c.module("top", "Top");
        c.build(top).unwrap();
        assert!(matches!(
            c.add_output(top, "late", 1),
            Err(NetlistError::IllegalTopology { .. })
        ));
    }

    #[test]
    fn output_cone_must_stay_registered() {
        let mut c = Circuit::new();
        let m1 = c.module("m1", "M1");
        let m2 = c.module("m2", "M2");
        let ext = c.signal("ext", 1);
        // m1 registers `stray` as an input; m2's output then consumes m1's
        // internal directly, without a port of its own.
        let stray = c.add_input(m1, "stray", ext, 1).unwrap();
        let out = c.add_output(m2, "out", 1).unwrap();
        c.connect(out, stray).unwrap();
        let err = c.build(m2);
        match err {
            Err(NetlistError::IllegalTopology { reason }) => {
                assert!(reason.contains("stray"), "unexpected reason: {reason}");
            }
            other => panic!("expected IllegalTopology, got {other:?}"),
        }
    }

    #[test]
    fn free_signals_are_adopted_at_build() {
        let mut c = Circuit::new();
        let top = c.module("top", "Top");
        let mid = c.signal("mid", 1);
        let ext = c.signal("ext", 1);
        let a = c.add_input(top, "a", ext, 1).unwrap();
        c.connect(mid, a).unwrap();
        let out = c.add_output(top, "out", 1).unwrap();
        c.connect(out, mid).unwrap();
        c.build(top).unwrap();
        assert_eq!(c.signal_info(mid).module, Some(top));
    }

    #[test]
    fn registered_input_cone_is_legal() {
        let mut c = Circuit::new();
        let top = c.module("top", "Top");
        let ext = c.signal("ext", 1);
        let a = c.add_input(top, "a", ext, 1).unwrap();
        let y = c.not_gate(top, a).unwrap();
        let out = c.add_output(top, "out", 1).unwrap();
        c.connect(out, y).unwrap();
        c.build(top).unwrap();
    }

    #[test]
    fn duplicate_reserved_names_rejected() {
        let mut c = Circuit::new();
        let top = c.module("top", "Top");
        let a = c.signal_named("data", 1, Naming::Reserved);
        let b = c.signal_named("data", 1, Naming::Reserved);
        c.signals[a].module = Some(top);
        c.signals[b].module = Some(top);
        assert!(matches!(
            c.build(top),
            Err(NetlistError::DuplicateReservedName { name }) if name == "data"
        ));
    }

    #[test]
    fn renameable_collisions_uniquified() {
        let mut c = Circuit::new();
        let top = c.module("top", "Top");
        let a = c.signal("data", 1);
        let b = c.signal("data", 1);
        c.signals[a].module = Some(top);
        c.signals[b].module = Some(top);
        c.build(top).unwrap();
        let names = [c.name_of(a).to_string(), c.name_of(b).to_string()];
        assert!(names.contains(&"data".to_string()));
        assert!(names.contains(&"data_0".to_string()));
    }

    #[test]
    fn structural_comb_cycle_rejected() {
        let mut c = Circuit::new();
        let top = c.module("top", "Top");
        let s = c.signal("s", 1);
        let b = c.signal("b", 1);
        let y = c.and2(top, s, b).unwrap();
        // Feed the gate output back to its own input: converges at X in
        // value-space but is structurally a combinational cycle.
        c.connect(s, y).unwrap();
        assert!(matches!(
            c.build(top),
            Err(NetlistError::IllegalTopology { .. })
        ));
    }

    #[test]
    fn latch_warning_emitted_and_suppressed() {
        let mut c = Circuit::new();
        let top = c.module("top", "Top");
        let en = c.signal("en", 1);
        let d = c.signal("d", 1);
        let q = c.signal("q", 1);
        c.combinational(
            top,
            vec![Conditional::when(en, vec![Conditional::assign(q, d)], vec![])],
        )
        .unwrap();
        c.build(top).unwrap();
        assert!(c
            .warnings()
            .iter()
            .any(|w| w.code == WarnCode::InferredLatch));

        let mut c2 = Circuit::new();
        let top2 = c2.module("top", "Top");
        let en2 = c2.signal("en", 1);
        let d2 = c2.signal("d", 1);
        let q2 = c2.signal("q", 1);
        c2.combinational_with_latches(
            top2,
            vec![Conditional::when(
                en2,
                vec![Conditional::assign(q2, d2)],
                vec![],
            )],
        )
        .unwrap();
        c2.build(top2).unwrap();
        assert!(!c2
            .warnings()
            .iter()
            .any(|w| w.code == WarnCode::InferredLatch));
    }

    #[test]
    fn flop_cone_breaks_cycles() {
        // A counter: q = flop(clk, q + 1) is cyclic through the register,
        // which is legal.
        let mut c = Circuit::new();
        let top = c.module("top", "Top");
        let ext_clk = c.signal("ext_clk", 1);
        let clk = c.add_input(top, "clk", ext_clk, 1).unwrap();
        let q_loop = c.signal("q_loop", 4);
        let one = c.constant(top, v("0001")).unwrap();
        let next = c.adder(top, q_loop, one).unwrap();
        let q = c.flop(top, clk, next, crate::seq::FlopConfig::default()).unwrap();
        c.connect(q_loop, q).unwrap();
        let out = c.add_output(top, "count", 4).unwrap();
        c.connect(out, q).unwrap();
        c.build(top).unwrap();
    }
}
