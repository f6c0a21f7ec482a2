//! Periodic clock generation.

use weft_common::LogicValue;
use weft_netlist::SignalId;

use crate::sched::{Scheduler, Wake};

impl Scheduler {
    /// Drives `sig` as a free-running clock: deposits `0` at time zero, then
    /// toggles every `half_period` ticks.
    ///
    /// The clock never finishes on its own; bound the run with
    /// [`set_max_sim_time`](Scheduler::set_max_sim_time) or
    /// [`end_simulation`](crate::SimCtx::end_simulation).
    pub fn add_clock(&mut self, sig: SignalId, half_period: u64) {
        let mut level = false;
        self.at(0, move |ctx| {
            ctx.deposit(sig, LogicValue::of_bool(level))?;
            level = !level;
            Ok(Wake::Delay(half_period))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_netlist::Circuit;

    #[test]
    fn clock_toggles_every_half_period() {
        let mut c = Circuit::new();
        let clk = c.signal("clk", 1);
        let mid = c.monitor(clk);
        let mut sim = Scheduler::new(c).unwrap();
        sim.add_clock(clk, 5);
        sim.set_max_sim_time(21);
        sim.run().unwrap();
        let changes = sim.circuit_mut().take_changes(mid);
        // Z->0 at t=0, 0->1 at 5, 1->0 at 10, 0->1 at 15, 1->0 at 20.
        assert_eq!(changes.len(), 5);
        assert_eq!(changes[1].new, LogicValue::of_bool(true));
        assert_eq!(changes[2].new, LogicValue::of_bool(false));
    }
}
