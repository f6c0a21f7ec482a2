//! The circuit: store-owned signals, modules, processes, and subscriptions.
//!
//! All structural mutation goes through [`Circuit`] methods, which validate
//! widths and driver rules at connect time and keep values settled through
//! the propagation engine. Signal references are IDs into the owning
//! [`Store`]s, never pointers.

use std::collections::{HashMap, HashSet};

use crate::store::{EntityId, Store};
use crate::diag::Warning;
use crate::error::NetlistError;
use crate::ids::{ModuleId, MonitorId, ProcessId, SignalId};
use crate::module::{Module, Port, PortDirection};
use crate::naming::Naming;
use crate::signal::{Change, DriverSource, Operand, Signal, SignalKind};
use crate::stmt::{Conditional, Process, ProcessKind, Trigger};
use weft_common::{Ident, Interner, LogicValue};

/// A buffered subscription to one signal's change events.
#[derive(Debug)]
pub struct Monitor {
    /// The watched signal.
    pub signal: SignalId,
    /// Change events in delivery order, drained by the owner.
    pub(crate) events: Vec<Change>,
}

/// A propagation dependent of a signal, woken when the signal changes.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Dependent {
    /// A wire driven by this signal through a connect edge.
    Drive(SignalId),
    /// A net whose merge includes this signal.
    Net(SignalId),
    /// A primitive module reading this signal on an input port.
    Prim(ModuleId),
    /// A combinational block reading this signal.
    Comb(ProcessId),
    /// A sequential block triggered by this signal.
    Seq(ProcessId),
    /// A change-event subscription.
    Monitor(MonitorId),
}

/// The owner of a design under construction and simulation.
pub struct Circuit {
    pub(crate) interner: Interner,
    pub(crate) signals: Store<SignalId, Signal>,
    pub(crate) modules: Store<ModuleId, Module>,
    pub(crate) processes: Store<ProcessId, Process>,
    pub(crate) monitors: Store<MonitorId, Monitor>,
    pub(crate) dependents: HashMap<SignalId, Vec<Dependent>>,
    pub(crate) warnings: Vec<Warning>,
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

impl Circuit {
    /// Creates an empty circuit.
    pub fn new() -> Self {
        Self {
            interner: Interner::new(),
            signals: Store::new(),
            modules: Store::new(),
            processes: Store::new(),
            monitors: Store::new(),
            dependents: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    // --- signals -----------------------------------------------------------

    /// Creates a renameable single-driver signal.
    pub fn signal(&mut self, name: &str, width: u32) -> SignalId {
        self.signal_named(name, width, Naming::Renameable)
    }

    /// Creates a single-driver signal with an explicit naming policy.
    pub fn signal_named(&mut self, name: &str, width: u32, naming: Naming) -> SignalId {
        let ident = self.interner.intern(name);
        self.signals
            .insert(Signal::new(ident, width, SignalKind::Wire, naming))
    }

    /// Creates an anonymous signal; emitters may name it freely.
    pub fn unnamed_signal(&mut self, width: u32) -> SignalId {
        let name = format!("_s{}", self.signals.len());
        self.signal_named(&name, width, Naming::Unnamed)
    }

    /// Creates a multi-driver net resolved by tri-state merge.
    pub fn net(&mut self, name: &str, width: u32) -> SignalId {
        let ident = self.interner.intern(name);
        self.signals
            .insert(Signal::new(ident, width, SignalKind::Net, Naming::Renameable))
    }

    /// The current value of a signal.
    pub fn value(&self, sig: SignalId) -> &LogicValue {
        &self.signals[sig].value
    }

    /// The width of a signal.
    pub fn width_of(&self, sig: SignalId) -> u32 {
        self.signals[sig].width
    }

    /// The resolved name of a signal.
    pub fn name_of(&self, sig: SignalId) -> &str {
        self.interner.resolve(self.signals[sig].name)
    }

    /// Finds a signal by its current name.
    pub fn find_signal(&self, name: &str) -> Option<SignalId> {
        self.signals
            .entries()
            .find(|(_, s)| self.interner.resolve(s.name) == name)
            .map(|(id, _)| id)
    }

    /// Read access to a signal record.
    pub fn signal_info(&self, sig: SignalId) -> &Signal {
        &self.signals[sig]
    }

    pub(crate) fn check_widths(&self, left: u32, right: u32) -> Result<(), NetlistError> {
        if left != right {
            return Err(NetlistError::WidthMismatch { left, right });
        }
        Ok(())
    }

    fn add_dependent(&mut self, on: SignalId, dep: Dependent) {
        self.dependents.entry(on).or_default().push(dep);
    }

    // --- structural connection ---------------------------------------------

    /// Connects `dst <= src`: records the drive edge and immediately mirrors
    /// `src`'s current value onto `dst`.
    ///
    /// `dst` must be an undriven wire of matching width; connectivity is set
    /// once and never reassigned.
    pub fn connect(&mut self, dst: SignalId, src: SignalId) -> Result<(), NetlistError> {
        self.check_widths(self.signals[dst].width, self.signals[src].width)?;
        if self.signals[dst].kind != SignalKind::Wire {
            return Err(NetlistError::IllegalTopology {
                reason: format!(
                    "net `{}` cannot be point-driven; attach drivers instead",
                    self.name_of(dst)
                ),
            });
        }
        if self.signals[dst].driver.is_some() {
            return Err(NetlistError::IllegalTopology {
                reason: format!("signal `{}` already has a driver", self.name_of(dst)),
            });
        }
        self.signals[dst].driver = Some(DriverSource::Edge(src));
        self.add_dependent(src, Dependent::Drive(dst));
        let value = self.signals[src].value.clone();
        self.set_and_propagate(dst, value)
    }

    /// Adds a driver to a net; the net recomputes its tri-state merge.
    pub fn attach_net(&mut self, net: SignalId, driver: SignalId) -> Result<(), NetlistError> {
        if self.signals[net].kind != SignalKind::Net {
            return Err(NetlistError::IllegalTopology {
                reason: format!("signal `{}` is not a net", self.name_of(net)),
            });
        }
        self.check_widths(self.signals[net].width, self.signals[driver].width)?;
        self.signals[net].net_drivers.push(driver);
        self.add_dependent(driver, Dependent::Net(net));
        self.refresh_net(net)
    }

    /// Joins two nets bidirectionally; the merged group resolves together.
    pub fn bridge_nets(&mut self, a: SignalId, b: SignalId) -> Result<(), NetlistError> {
        for side in [a, b] {
            if self.signals[side].kind != SignalKind::Net {
                return Err(NetlistError::IllegalTopology {
                    reason: format!("signal `{}` is not a net", self.name_of(side)),
                });
            }
        }
        self.check_widths(self.signals[a].width, self.signals[b].width)?;
        self.signals[a].bridges.push(b);
        self.signals[b].bridges.push(a);
        self.add_dependent(a, Dependent::Net(b));
        self.add_dependent(b, Dependent::Net(a));
        self.refresh_net(a)?;
        self.refresh_net(b)
    }

    /// Deposits a value onto an undriven wire and propagates synchronously.
    ///
    /// This is the user-facing write used by testbenches and simulators.
    pub fn deposit(&mut self, sig: SignalId, value: LogicValue) -> Result<(), NetlistError> {
        self.check_widths(self.signals[sig].width, value.width())?;
        match self.signals[sig].kind {
            SignalKind::Net => {
                return Err(NetlistError::IllegalTopology {
                    reason: format!(
                        "net `{}` is computed by merge and cannot be deposited",
                        self.name_of(sig)
                    ),
                });
            }
            SignalKind::Wire => {
                if self.signals[sig].driver.is_some() {
                    return Err(NetlistError::IllegalTopology {
                        reason: format!(
                            "signal `{}` is driven and cannot be deposited",
                            self.name_of(sig)
                        ),
                    });
                }
            }
        }
        self.set_and_propagate(sig, value)
    }

    // --- subscriptions -----------------------------------------------------

    /// Subscribes to a signal's change events (the glitch stream).
    pub fn monitor(&mut self, sig: SignalId) -> MonitorId {
        let mid = self.monitors.insert(Monitor {
            signal: sig,
            events: Vec::new(),
        });
        self.add_dependent(sig, Dependent::Monitor(mid));
        mid
    }

    /// Drains the buffered change events of a monitor, in delivery order.
    pub fn take_changes(&mut self, monitor: MonitorId) -> Vec<Change> {
        std::mem::take(&mut self.monitors[monitor].events)
    }

    // --- modules -----------------------------------------------------------

    /// Creates a top-level module.
    pub fn module(&mut self, name: &str, definition_name: &str) -> ModuleId {
        let name = self.interner.intern(name);
        let def = self.interner.intern(definition_name);
        self.modules.insert(Module::new(name, def, None))
    }

    /// Creates a module nested under `parent`.
    pub fn child_module(
        &mut self,
        parent: ModuleId,
        name: &str,
        definition_name: &str,
    ) -> ModuleId {
        let name = self.interner.intern(name);
        let def = self.interner.intern(definition_name);
        let id = self.modules.insert(Module::new(name, def, Some(parent)));
        self.modules[parent].children.push(id);
        id
    }

    /// The resolved instance name of a module.
    pub fn module_name(&self, m: ModuleId) -> &str {
        self.interner.resolve(self.modules[m].name)
    }

    /// The resolved definition (type) name of a module.
    pub fn definition_name(&self, m: ModuleId) -> &str {
        self.interner.resolve(self.modules[m].definition_name)
    }

    /// Read access to a module record.
    pub fn module_info(&self, m: ModuleId) -> &Module {
        &self.modules[m]
    }

    /// Read access to a registered conditional block.
    pub fn process_info(&self, p: ProcessId) -> &Process {
        &self.processes[p]
    }

    /// Top-level modules (those without a parent), in creation order.
    pub fn top_modules(&self) -> Vec<ModuleId> {
        self.modules
            .entries()
            .filter(|(_, m)| m.parent.is_none())
            .map(|(id, _)| id)
            .collect()
    }

    /// Forbids uniquification of a module's instance name.
    pub fn reserve_name(&mut self, m: ModuleId) {
        self.modules[m].reserve_name = true;
    }

    /// Forbids uniquification of a module's definition name.
    pub fn reserve_definition_name(&mut self, m: ModuleId) {
        self.modules[m].reserve_definition_name = true;
    }

    fn ensure_unbuilt(&self, m: ModuleId) -> Result<(), NetlistError> {
        if self.modules[m].built {
            return Err(NetlistError::IllegalTopology {
                reason: format!(
                    "module `{}` is built; its ports and logic are frozen",
                    self.module_name(m)
                ),
            });
        }
        Ok(())
    }

    /// Fails unless the module has been built.
    pub fn ensure_built(&self, m: ModuleId) -> Result<(), NetlistError> {
        if !self.modules[m].built {
            return Err(NetlistError::ModuleNotBuilt {
                name: self.module_name(m).to_string(),
            });
        }
        Ok(())
    }

    // --- ports -------------------------------------------------------------

    /// Registers an input port driven by `driver` and returns the internal
    /// signal module logic must consume.
    pub fn add_input(
        &mut self,
        m: ModuleId,
        name: &str,
        driver: SignalId,
        width: u32,
    ) -> Result<SignalId, NetlistError> {
        self.ensure_unbuilt(m)?;
        self.check_widths(width, self.signals[driver].width)?;
        let internal = self.signal_named(name, width, Naming::Reserved);
        self.signals[internal].module = Some(m);
        self.connect(internal, driver)?;
        let ident = self.interner.intern(name);
        self.modules[m].ports.push(Port {
            name: ident,
            direction: PortDirection::Input,
            external: Some(driver),
            internal,
            width,
        });
        Ok(internal)
    }

    /// Registers an output port and returns the internal signal the module
    /// drives; the parent reads the same signal.
    pub fn add_output(
        &mut self,
        m: ModuleId,
        name: &str,
        width: u32,
    ) -> Result<SignalId, NetlistError> {
        self.ensure_unbuilt(m)?;
        let internal = self.signal_named(name, width, Naming::Reserved);
        self.signals[internal].module = Some(m);
        let ident = self.interner.intern(name);
        self.modules[m].ports.push(Port {
            name: ident,
            direction: PortDirection::Output,
            external: None,
            internal,
            width,
        });
        Ok(internal)
    }

    /// Registers a bidirectional net port bridged to the external net.
    pub fn add_inout(
        &mut self,
        m: ModuleId,
        name: &str,
        external: SignalId,
        width: u32,
    ) -> Result<SignalId, NetlistError> {
        self.ensure_unbuilt(m)?;
        if self.signals[external].kind != SignalKind::Net {
            return Err(NetlistError::IllegalTopology {
                reason: format!(
                    "inout port `{name}` requires a net driver, `{}` is a wire",
                    self.name_of(external)
                ),
            });
        }
        self.check_widths(width, self.signals[external].width)?;
        let ident = self.interner.intern(name);
        let internal = self
            .signals
            .insert(Signal::new(ident, width, SignalKind::Net, Naming::Reserved));
        self.signals[internal].module = Some(m);
        self.bridge_nets(internal, external)?;
        self.modules[m].ports.push(Port {
            name: ident,
            direction: PortDirection::InOut,
            external: Some(external),
            internal,
            width,
        });
        Ok(internal)
    }

    // --- conditional blocks ------------------------------------------------

    /// Registers a combinational block; re-evaluates whenever any signal it
    /// reads changes. Unassigned control paths are diagnosed at build.
    pub fn combinational(
        &mut self,
        m: ModuleId,
        body: Vec<Conditional>,
    ) -> Result<ProcessId, NetlistError> {
        self.add_process(m, ProcessKind::Combinational { allow_latches: false }, body)
    }

    /// Registers a combinational block that intentionally infers latches.
    pub fn combinational_with_latches(
        &mut self,
        m: ModuleId,
        body: Vec<Conditional>,
    ) -> Result<ProcessId, NetlistError> {
        self.add_process(m, ProcessKind::Combinational { allow_latches: true }, body)
    }

    /// Registers a sequential block fired by the given trigger edges.
    pub fn sequential(
        &mut self,
        m: ModuleId,
        triggers: Vec<Trigger>,
        body: Vec<Conditional>,
    ) -> Result<ProcessId, NetlistError> {
        self.add_process(m, ProcessKind::Sequential { triggers }, body)
    }

    fn add_process(
        &mut self,
        m: ModuleId,
        kind: ProcessKind,
        body: Vec<Conditional>,
    ) -> Result<ProcessId, NetlistError> {
        self.ensure_unbuilt(m)?;
        self.validate_body(&body)?;
        if let ProcessKind::Sequential { triggers } = &kind {
            for t in triggers {
                if self.signals[t.signal].width != 1 {
                    return Err(NetlistError::IllegalTopology {
                        reason: format!(
                            "trigger `{}` must be 1-bit, has width {}",
                            self.name_of(t.signal),
                            self.signals[t.signal].width
                        ),
                    });
                }
            }
        }

        let mut reads = Vec::new();
        let mut writes = Vec::new();
        let mut seen_r = HashSet::new();
        let mut seen_w = HashSet::new();
        for stmt in &body {
            stmt.collect_reads(&mut reads, &mut seen_r);
            stmt.collect_writes(&mut writes, &mut seen_w);
        }

        let pid = ProcessId::from_index(self.processes.len());
        for &dst in &writes {
            if self.signals[dst].kind == SignalKind::Net {
                return Err(NetlistError::IllegalTopology {
                    reason: format!(
                        "net `{}` cannot be written by a conditional block",
                        self.name_of(dst)
                    ),
                });
            }
            if self.signals[dst].driver.is_some() {
                return Err(NetlistError::IllegalTopology {
                    reason: format!("signal `{}` already has a driver", self.name_of(dst)),
                });
            }
            self.signals[dst].driver = Some(DriverSource::Process(pid));
        }

        let process = Process {
            module: m,
            kind: kind.clone(),
            body,
            reads: reads.clone(),
            writes,
            pending: Vec::new(),
        };
        let pid = self.processes.insert(process);
        self.modules[m].processes.push(pid);

        match kind {
            ProcessKind::Combinational { .. } => {
                for &r in &reads {
                    self.add_dependent(r, Dependent::Comb(pid));
                }
                // Initial evaluation so outputs are settled at construction.
                self.evaluate_combinational(pid)?;
            }
            ProcessKind::Sequential { triggers } => {
                for t in &triggers {
                    self.add_dependent(t.signal, Dependent::Seq(pid));
                }
            }
        }
        Ok(pid)
    }

    /// Registration-time width checks over a statement tree.
    fn validate_body(&self, body: &[Conditional]) -> Result<(), NetlistError> {
        for stmt in body {
            match stmt {
                Conditional::Assign { dst, src } => {
                    self.check_widths(self.signals[*dst].width, self.operand_width(src))?;
                }
                Conditional::If { arms, or_else } => {
                    for arm in arms {
                        if self.operand_width(&arm.condition) == 0 {
                            return Err(NetlistError::IllegalTopology {
                                reason: "if condition has zero width".into(),
                            });
                        }
                        self.validate_body(&arm.body)?;
                    }
                    self.validate_body(or_else)?;
                }
                Conditional::Case {
                    subject,
                    items,
                    default,
                    ..
                } => {
                    let sw = self.operand_width(subject);
                    for item in items {
                        self.check_widths(sw, self.operand_width(&item.pattern))?;
                        self.validate_body(&item.body)?;
                    }
                    self.validate_body(default)?;
                }
                Conditional::Compound(stmts) => self.validate_body(stmts)?,
            }
        }
        Ok(())
    }

    pub(crate) fn operand_width(&self, op: &Operand) -> u32 {
        match op {
            Operand::Sig(id) => self.signals[*id].width,
            Operand::Const(v) => v.width(),
        }
    }

    // --- diagnostics -------------------------------------------------------

    /// Warnings collected so far, in emission order.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Drains the collected warnings.
    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_common::Logic;

    #[test]
    fn connect_mirrors_value() {
        let mut c = Circuit::new();
        let a = c.signal("a", 4);
        let b = c.signal("b", 4);
        c.deposit(a, LogicValue::of_u64(9, 4)).unwrap();
        c.connect(b, a).unwrap();
        assert_eq!(*c.value(b), LogicValue::of_u64(9, 4));
        // Later deposits keep flowing.
        c.deposit(a, LogicValue::of_u64(3, 4)).unwrap();
        assert_eq!(*c.value(b), LogicValue::of_u64(3, 4));
    }

    #[test]
    fn connect_rejects_width_mismatch() {
        let mut c = Circuit::new();
        let a = c.signal("a", 4);
        let b = c.signal("b", 5);
        assert!(matches!(
            c.connect(b, a),
            Err(NetlistError::WidthMismatch { left: 5, right: 4 })
        ));
    }

    #[test]
    fn second_driver_rejected() {
        let mut c = Circuit::new();
        let a = c.signal("a", 1);
        let b = c.signal("b", 1);
        let dst = c.signal("dst", 1);
        c.connect(dst, a).unwrap();
        assert!(matches!(
            c.connect(dst, b),
            Err(NetlistError::IllegalTopology { .. })
        ));
    }

    #[test]
    fn deposit_on_driven_signal_rejected() {
        let mut c = Circuit::new();
        let a = c.signal("a", 1);
        let dst = c.signal("dst", 1);
        c.connect(dst, a).unwrap();
        assert!(matches!(
            c.deposit(dst, LogicValue::of_bool(true)),
            Err(NetlistError::IllegalTopology { .. })
        ));
    }

    #[test]
    fn signals_start_floating() {
        let mut c = Circuit::new();
        let a = c.signal("a", 8);
        assert!(c.value(a).is_floating());
    }

    #[test]
    fn monitor_sees_changes() {
        let mut c = Circuit::new();
        let a = c.signal("a", 2);
        let mid = c.monitor(a);
        c.deposit(a, LogicValue::of_u64(1, 2)).unwrap();
        c.deposit(a, LogicValue::of_u64(1, 2)).unwrap(); // no change, no event
        c.deposit(a, LogicValue::of_u64(2, 2)).unwrap();
        let events = c.take_changes(mid);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].new, LogicValue::of_u64(1, 2));
        assert_eq!(events[1].previous, LogicValue::of_u64(1, 2));
        assert_eq!(events[1].new, LogicValue::of_u64(2, 2));
        assert!(c.take_changes(mid).is_empty());
    }

    #[test]
    fn net_merge_basics() {
        let mut c = Circuit::new();
        let bus = c.net("bus", 1);
        let d0 = c.signal("d0", 1);
        let d1 = c.signal("d1", 1);
        c.attach_net(bus, d0).unwrap();
        c.attach_net(bus, d1).unwrap();
        // Both floating → Z
        assert!(c.value(bus).is_floating());
        c.deposit(d0, LogicValue::of_bool(true)).unwrap();
        assert_eq!(*c.value(bus), LogicValue::of_bool(true));
        c.deposit(d1, LogicValue::of_bool(false)).unwrap();
        assert_eq!(*c.value(bus), LogicValue::of_logic(Logic::X));
        c.deposit(d1, LogicValue::of_logic(Logic::Z)).unwrap();
        assert_eq!(*c.value(bus), LogicValue::of_bool(true));
    }

    #[test]
    fn deposit_on_net_rejected() {
        let mut c = Circuit::new();
        let bus = c.net("bus", 1);
        assert!(matches!(
            c.deposit(bus, LogicValue::of_bool(true)),
            Err(NetlistError::IllegalTopology { .. })
        ));
    }

    #[test]
    fn input_port_returns_internal() {
        let mut c = Circuit::new();
        let m = c.module("dut", "Dut");
        let ext = c.signal("clk_src", 1);
        let clk = c.add_input(m, "clk", ext, 1).unwrap();
        assert_ne!(clk, ext);
        assert_eq!(c.name_of(clk), "clk");
        c.deposit(ext, LogicValue::of_bool(true)).unwrap();
        assert_eq!(*c.value(clk), LogicValue::of_bool(true));
        assert_eq!(c.module_info(m).ports.len(), 1);
    }

    #[test]
    fn port_width_mismatch_rejected() {
        let mut c = Circuit::new();
        let m = c.module("dut", "Dut");
        let ext = c.signal("bus_src", 8);
        assert!(matches!(
            c.add_input(m, "bus", ext, 4),
            Err(NetlistError::WidthMismatch { left: 4, right: 8 })
        ));
    }

    #[test]
    fn unnamed_signals_get_placeholder_names() {
        let mut c = Circuit::new();
        let s = c.unnamed_signal(3);
        assert!(c.name_of(s).starts_with("_s"));
        assert_eq!(c.signal_info(s).naming, Naming::Unnamed);
    }

    #[test]
    fn find_signal_by_name() {
        let mut c = Circuit::new();
        let a = c.signal("needle", 1);
        assert_eq!(c.find_signal("needle"), Some(a));
        assert_eq!(c.find_signal("missing"), None);
    }
}
