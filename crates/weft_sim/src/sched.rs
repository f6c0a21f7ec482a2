//! The scheduler: time wheel, phased tick loop, and cooperative agents.
//!
//! Agents are closures resumed by the scheduler; each call returns a
//! [`Wake`] describing the next suspension point. Within a phase agents run
//! to completion, deposits propagate synchronously, and ordering is
//! insertion order throughout, so runs are deterministic given identical
//! registration sequences.

use std::collections::{BTreeMap, VecDeque};

use weft_common::LogicValue;
use weft_netlist::{Circuit, EdgeKind, SignalId};

use crate::error::SimError;

/// What an agent wants to happen after returning.
pub enum Wake {
    /// The agent is finished and is dropped.
    Done,
    /// Resume in the active phase `n` ticks from now (`0` = later this tick).
    Delay(u64),
    /// Resume in the active phase at an absolute time.
    At(u64),
    /// Resume in post-tick once the signal sees the given edge.
    WaitEdge {
        /// The 1-bit signal to watch.
        signal: SignalId,
        /// The edge to wait for.
        edge: EdgeKind,
        /// Suppress (rather than fail on) invalid-flanked transitions.
        ignore_invalid: bool,
    },
    /// Resume in post-tick once the signal's value changes at all.
    WaitChange(SignalId),
}

impl Wake {
    /// Waits for the next rising edge of a signal.
    pub fn next_posedge(signal: SignalId) -> Self {
        Wake::WaitEdge {
            signal,
            edge: EdgeKind::Posedge,
            ignore_invalid: false,
        }
    }

    /// Waits for the next falling edge of a signal.
    pub fn next_negedge(signal: SignalId) -> Self {
        Wake::WaitEdge {
            signal,
            edge: EdgeKind::Negedge,
            ignore_invalid: false,
        }
    }
}

/// A cooperative simulation agent.
pub type Action = Box<dyn FnMut(&mut SimCtx<'_>) -> Result<Wake, SimError>>;

/// The restricted view an agent gets of the running simulation.
pub struct SimCtx<'a> {
    circuit: &'a mut Circuit,
    time: u64,
    cancelled: bool,
    end_requested: bool,
    injected: Vec<Action>,
}

impl SimCtx<'_> {
    /// The current simulation time.
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Set when the awaited event was cancelled (end of simulation or max
    /// time) rather than fired; the agent must not assume the event happened.
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    /// The current value of a signal.
    pub fn value(&self, sig: SignalId) -> &LogicValue {
        self.circuit.value(sig)
    }

    /// Read access to the circuit.
    pub fn circuit(&self) -> &Circuit {
        self.circuit
    }

    /// Deposits a value; propagation through the graph happens before the
    /// call returns.
    pub fn deposit(&mut self, sig: SignalId, value: LogicValue) -> Result<(), SimError> {
        self.circuit.deposit(sig, value).map_err(SimError::from)
    }

    /// Deposits several values as one wave, so logic reading more than one
    /// of the targets settles once.
    pub fn deposit_many(&mut self, writes: &[(SignalId, LogicValue)]) -> Result<(), SimError> {
        self.circuit.deposit_many(writes).map_err(SimError::from)
    }

    /// Requests that the simulation stop at the end of the current tick.
    pub fn end_simulation(&mut self) {
        self.end_requested = true;
    }

    /// Submits an action to the inject phase: it runs before the main queue,
    /// within this tick if submitted before clk-stable.
    pub fn inject(
        &mut self,
        action: impl FnMut(&mut SimCtx<'_>) -> Result<Wake, SimError> + 'static,
    ) {
        self.injected.push(Box::new(action));
    }
}

struct EdgeWaiter {
    agent: usize,
    signal: SignalId,
    edge: EdgeKind,
    ignore_invalid: bool,
    base: LogicValue,
}

struct ChangeWaiter {
    agent: usize,
    signal: SignalId,
    base: LogicValue,
}

/// The discrete-event scheduler driving a built circuit.
pub struct Scheduler {
    circuit: Circuit,
    time: u64,
    running: bool,
    ended: bool,
    end_requested: bool,
    max_time: Option<u64>,
    agents: Vec<Option<Action>>,
    wheel: BTreeMap<u64, Vec<usize>>,
    inject_queue: VecDeque<usize>,
    requeue: Vec<usize>,
    edge_waiters: Vec<EdgeWaiter>,
    change_waiters: Vec<ChangeWaiter>,
    observers: Vec<usize>,
}

impl Scheduler {
    /// Takes ownership of a circuit whose top-level modules are all built.
    pub fn new(circuit: Circuit) -> Result<Self, SimError> {
        for m in circuit.top_modules() {
            circuit.ensure_built(m).map_err(SimError::from)?;
        }
        Ok(Self {
            circuit,
            time: 0,
            running: false,
            ended: false,
            end_requested: false,
            max_time: None,
            agents: Vec::new(),
            wheel: BTreeMap::new(),
            inject_queue: VecDeque::new(),
            requeue: Vec::new(),
            edge_waiters: Vec::new(),
            change_waiters: Vec::new(),
            observers: Vec::new(),
        })
    }

    /// The current simulation time.
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Read access to the owned circuit.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Mutable access to the owned circuit (between runs).
    pub fn circuit_mut(&mut self) -> &mut Circuit {
        &mut self.circuit
    }

    /// Releases the circuit.
    pub fn into_circuit(self) -> Circuit {
        self.circuit
    }

    /// Stops the simulation once the first phase at time `t >= limit` has run.
    pub fn set_max_sim_time(&mut self, limit: u64) {
        self.max_time = Some(limit);
    }

    /// Requests a stop at the end of the current tick.
    pub fn end_simulation(&mut self) {
        self.end_requested = true;
    }

    /// Whether the simulation has ended.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Clears queues, waiters, and time. Signal values are untouched;
    /// resetting them is the caller's responsibility.
    pub fn reset(&mut self) {
        self.time = 0;
        self.ended = false;
        self.end_requested = false;
        self.max_time = None;
        self.agents.clear();
        self.wheel.clear();
        self.inject_queue.clear();
        self.requeue.clear();
        self.edge_waiters.clear();
        self.change_waiters.clear();
        self.observers.clear();
    }

    fn register(&mut self, action: Action) -> usize {
        self.agents.push(Some(action));
        self.agents.len() - 1
    }

    /// Schedules an action to first run in the active phase at time `t`.
    pub fn at(
        &mut self,
        t: u64,
        action: impl FnMut(&mut SimCtx<'_>) -> Result<Wake, SimError> + 'static,
    ) {
        let id = self.register(Box::new(action));
        self.wheel.entry(t).or_default().push(id);
    }

    /// Submits an action to the next inject phase.
    pub fn inject(
        &mut self,
        action: impl FnMut(&mut SimCtx<'_>) -> Result<Wake, SimError> + 'static,
    ) {
        let id = self.register(Box::new(action));
        self.inject_queue.push_back(id);
    }

    /// Registers a post-tick observer, run at the end of every tick until it
    /// returns [`Wake::Done`].
    pub fn on_tick_end(
        &mut self,
        action: impl FnMut(&mut SimCtx<'_>) -> Result<Wake, SimError> + 'static,
    ) {
        let id = self.register(Box::new(action));
        self.observers.push(id);
    }

    /// Runs until no work remains, the end is requested, or max time is hit.
    pub fn run(&mut self) -> Result<(), SimError> {
        if self.running {
            return Err(SimError::SimulatorReentered);
        }
        self.running = true;
        let result = self.run_loop();
        self.running = false;
        result
    }

    fn run_loop(&mut self) -> Result<(), SimError> {
        while !self.ended {
            let next = if self.inject_queue.is_empty() {
                self.wheel.keys().next().copied()
            } else {
                Some(self.time)
            };
            let Some(t) = next else { break };
            if let Some(limit) = self.max_time {
                if t >= limit {
                    // Run only the inject phase at the boundary time.
                    self.time = t;
                    self.run_inject_phase()?;
                    break;
                }
            }
            self.time = t;
            self.run_tick(t)?;
            if self.end_requested {
                self.ended = true;
            }
        }
        self.cancel_waiters()
    }

    fn run_tick(&mut self, t: u64) -> Result<(), SimError> {
        // Phase 1: inject — FIFO, before the main queue.
        self.run_inject_phase()?;

        // Phase 2: active — actions scheduled at `t` in insertion order;
        // deposits propagate to fixpoint inside each call.
        let mut bucket = self.wheel.remove(&t).unwrap_or_default();
        let mut cursor = 0;
        while cursor < bucket.len() {
            let id = bucket[cursor];
            cursor += 1;
            self.call_agent(id, false)?;
            bucket.append(&mut self.requeue);
        }
        // Actions injected while this tick ran still belong to it.
        self.run_inject_phase()?;

        // Phase 3: clk-stable — commit sequential next-values, settle, and
        // observe edges across the phase boundary.
        self.circuit.latch_sequential().map_err(SimError::from)?;
        let fired = self.detect_edges()?;

        // Phase 4: post-tick — resumed waiters, then standing observers.
        for id in fired {
            self.call_agent(id, false)?;
        }
        self.run_observers()?;
        Ok(())
    }

    fn run_inject_phase(&mut self) -> Result<(), SimError> {
        while let Some(id) = self.inject_queue.pop_front() {
            self.call_agent(id, false)?;
            // Agents re-armed with Delay(0) during inject run in the active
            // phase of this tick.
            let again = std::mem::take(&mut self.requeue);
            self.wheel.entry(self.time).or_default().extend(again);
        }
        Ok(())
    }

    /// Runs one agent and applies its requested suspension.
    fn call_agent(&mut self, id: usize, cancelled: bool) -> Result<(), SimError> {
        let Some(mut action) = self.agents[id].take() else {
            return Ok(());
        };
        let mut ctx = SimCtx {
            circuit: &mut self.circuit,
            time: self.time,
            cancelled,
            end_requested: false,
            injected: Vec::new(),
        };
        let wake = action(&mut ctx)?;
        let SimCtx {
            end_requested,
            injected,
            ..
        } = ctx;
        if end_requested {
            self.end_requested = true;
        }
        for injected_action in injected {
            let new_id = self.register(injected_action);
            self.inject_queue.push_back(new_id);
        }
        if cancelled {
            // A cancelled waiter gets exactly one resumption.
            return Ok(());
        }
        match wake {
            Wake::Done => {}
            Wake::Delay(n) => {
                self.agents[id] = Some(action);
                if n == 0 {
                    self.requeue.push(id);
                } else {
                    self.wheel.entry(self.time + n).or_default().push(id);
                }
            }
            Wake::At(t) => {
                self.agents[id] = Some(action);
                if t <= self.time {
                    self.requeue.push(id);
                } else {
                    self.wheel.entry(t).or_default().push(id);
                }
            }
            Wake::WaitEdge {
                signal,
                edge,
                ignore_invalid,
            } => {
                self.agents[id] = Some(action);
                let base = self.circuit.value(signal).clone();
                self.edge_waiters.push(EdgeWaiter {
                    agent: id,
                    signal,
                    edge,
                    ignore_invalid,
                    base,
                });
            }
            Wake::WaitChange(signal) => {
                self.agents[id] = Some(action);
                let base = self.circuit.value(signal).clone();
                self.change_waiters.push(ChangeWaiter {
                    agent: id,
                    signal,
                    base,
                });
            }
        }
        Ok(())
    }

    /// Compares each waiter's base against the post-latch value; fired
    /// waiters resume in registration order, at most once per tick.
    fn detect_edges(&mut self) -> Result<Vec<usize>, SimError> {
        let mut fired = Vec::new();

        let mut kept = Vec::new();
        for mut waiter in std::mem::take(&mut self.edge_waiters) {
            let now = self.circuit.value(waiter.signal).clone();
            if now == waiter.base {
                kept.push(waiter);
                continue;
            }
            let prev_bit = waiter.base.get(0);
            let new_bit = now.get(0);
            if !prev_bit.is_valid() || !new_bit.is_valid() {
                if !waiter.ignore_invalid {
                    return Err(SimError::EdgeOnInvalid {
                        signal: self.circuit.name_of(waiter.signal).to_string(),
                    });
                }
                waiter.base = now;
                kept.push(waiter);
                continue;
            }
            let rose = prev_bit == weft_common::Logic::Zero && new_bit == weft_common::Logic::One;
            let fell = prev_bit == weft_common::Logic::One && new_bit == weft_common::Logic::Zero;
            let matched = match waiter.edge {
                EdgeKind::Posedge => rose,
                EdgeKind::Negedge => fell,
                EdgeKind::Either => rose || fell,
            };
            if matched {
                fired.push(waiter.agent);
            } else {
                waiter.base = now;
                kept.push(waiter);
            }
        }
        self.edge_waiters = kept;

        let mut kept = Vec::new();
        for waiter in std::mem::take(&mut self.change_waiters) {
            let now = self.circuit.value(waiter.signal).clone();
            if now != waiter.base {
                fired.push(waiter.agent);
            } else {
                kept.push(waiter);
            }
        }
        self.change_waiters = kept;

        Ok(fired)
    }

    fn run_observers(&mut self) -> Result<(), SimError> {
        let observers = self.observers.clone();
        let mut surviving = Vec::with_capacity(observers.len());
        for id in observers {
            let Some(mut action) = self.agents[id].take() else {
                continue;
            };
            let mut ctx = SimCtx {
                circuit: &mut self.circuit,
                time: self.time,
                cancelled: false,
                end_requested: false,
                injected: Vec::new(),
            };
            let wake = action(&mut ctx)?;
            let SimCtx {
                end_requested,
                injected,
                ..
            } = ctx;
            if end_requested {
                self.end_requested = true;
            }
            for injected_action in injected {
                let new_id = self.register(injected_action);
                self.inject_queue.push_back(new_id);
            }
            if !matches!(wake, Wake::Done) {
                self.agents[id] = Some(action);
                surviving.push(id);
            }
        }
        self.observers = surviving;
        Ok(())
    }

    /// Resumes pending waiters once with the cancellation indicator set.
    fn cancel_waiters(&mut self) -> Result<(), SimError> {
        let edge_agents: Vec<usize> =
            std::mem::take(&mut self.edge_waiters).into_iter().map(|w| w.agent).collect();
        let change_agents: Vec<usize> = std::mem::take(&mut self.change_waiters)
            .into_iter()
            .map(|w| w.agent)
            .collect();
        for id in edge_agents.into_iter().chain(change_agents) {
            self.call_agent(id, true)?;
        }
        Ok(())
    }
}
