//! The register helper: a `FlipFlop` primitive built on a sequential block.

use crate::circuit::Circuit;
use crate::error::NetlistError;
use crate::ids::{ModuleId, SignalId};
use crate::signal::Operand;
use crate::stmt::{Conditional, Trigger};
use weft_common::LogicValue;

/// Optional controls for [`Circuit::flop`].
#[derive(Default)]
pub struct FlopConfig {
    /// Synchronous reset; when high at the clock edge the register loads the
    /// reset value instead of `d`.
    pub reset: Option<SignalId>,
    /// Value loaded on reset; all-zero when unset.
    pub reset_value: Option<Operand>,
    /// Clock enable; when low at the clock edge the register holds.
    pub en: Option<SignalId>,
}

impl Circuit {
    /// A register sampling `d` on the rising edge of `clk`.
    ///
    /// Returns the `q` output. Reset is synchronous and takes priority over
    /// the enable.
    pub fn flop(
        &mut self,
        parent: ModuleId,
        clk: SignalId,
        d: SignalId,
        config: FlopConfig,
    ) -> Result<SignalId, NetlistError> {
        let width = self.width_of(d);
        let instance = format!("flipflop_{}", self.modules.len());
        let m = self.child_module(parent, &instance, "FlipFlop");

        let clk_i = self.add_input(m, "_trigger", clk, 1)?;
        let d_i = self.add_input(m, "_in", d, width)?;
        let q = self.add_output(m, "_out", width)?;

        let mut body = vec![Conditional::assign(q, d_i)];
        if let Some(en) = self.resolve_enable(m, config.en)? {
            body = vec![Conditional::when(en, body, vec![])];
        }
        if let Some(reset) = config.reset {
            let reset_i = self.add_input(m, "_reset", reset, 1)?;
            let reset_value = match config.reset_value {
                Some(Operand::Sig(rv)) => {
                    Operand::Sig(self.add_input(m, "_resetValue", rv, width)?)
                }
                Some(Operand::Const(v)) => {
                    self.check_widths(width, v.width())?;
                    Operand::Const(v)
                }
                None => Operand::Const(LogicValue::of_u64(0, width)),
            };
            body = vec![Conditional::when(
                reset_i,
                vec![Conditional::assign(q, reset_value)],
                body,
            )];
        }
        self.sequential(m, vec![Trigger::posedge(clk_i)], body)?;
        Ok(q)
    }

    fn resolve_enable(
        &mut self,
        m: ModuleId,
        en: Option<SignalId>,
    ) -> Result<Option<SignalId>, NetlistError> {
        match en {
            Some(en) => Ok(Some(self.add_input(m, "_en", en, 1)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> LogicValue {
        LogicValue::of_string(s).unwrap()
    }

    fn tick(c: &mut Circuit, clk: SignalId) {
        c.deposit(clk, v("0")).unwrap();
        c.deposit(clk, v("1")).unwrap();
        c.latch_sequential().unwrap();
    }

    #[test]
    fn flop_samples_on_posedge() {
        let mut c = Circuit::new();
        let top = c.module("top", "Top");
        let clk = c.signal("clk", 1);
        let d = c.signal("d", 4);
        let q = c.flop(top, clk, d, FlopConfig::default()).unwrap();
        c.deposit(d, v("1001")).unwrap();
        assert!(c.value(q).is_floating());
        tick(&mut c, clk);
        assert_eq!(*c.value(q), v("1001"));
        // Holds between edges
        c.deposit(d, v("0110")).unwrap();
        assert_eq!(*c.value(q), v("1001"));
        tick(&mut c, clk);
        assert_eq!(*c.value(q), v("0110"));
    }

    #[test]
    fn flop_sync_reset_takes_priority() {
        let mut c = Circuit::new();
        let top = c.module("top", "Top");
        let clk = c.signal("clk", 1);
        let d = c.signal("d", 8);
        let rst = c.signal("rst", 1);
        let en = c.signal("en", 1);
        let q = c
            .flop(
                top,
                clk,
                d,
                FlopConfig {
                    reset: Some(rst),
                    reset_value: None,
                    en: Some(en),
                },
            )
            .unwrap();
        c.deposit(d, LogicValue::of_u64(0xaa, 8)).unwrap();
        c.deposit(en, v("1")).unwrap();
        c.deposit(rst, v("1")).unwrap();
        tick(&mut c, clk);
        assert_eq!(*c.value(q), LogicValue::of_u64(0, 8));
        c.deposit(rst, v("0")).unwrap();
        tick(&mut c, clk);
        assert_eq!(*c.value(q), LogicValue::of_u64(0xaa, 8));
    }

    #[test]
    fn flop_enable_holds() {
        let mut c = Circuit::new();
        let top = c.module("top", "Top");
        let clk = c.signal("clk", 1);
        let d = c.signal("d", 2);
        let en = c.signal("en", 1);
        let q = c
            .flop(
                top,
                clk,
                d,
                FlopConfig {
                    reset: None,
                    reset_value: None,
                    en: Some(en),
                },
            )
            .unwrap();
        c.deposit(en, v("1")).unwrap();
        c.deposit(d, v("11")).unwrap();
        tick(&mut c, clk);
        assert_eq!(*c.value(q), v("11"));
        c.deposit(en, v("0")).unwrap();
        c.deposit(d, v("00")).unwrap();
        tick(&mut c, clk);
        assert_eq!(*c.value(q), v("11"));
    }

    #[test]
    fn flop_with_reset_value_operand() {
        let mut c = Circuit::new();
        let top = c.module("top", "Top");
        let clk = c.signal("clk", 1);
        let d = c.signal("d", 4);
        let rst = c.signal("rst", 1);
        let q = c
            .flop(
                top,
                clk,
                d,
                FlopConfig {
                    reset: Some(rst),
                    reset_value: Some(Operand::Const(v("0111"))),
                    en: None,
                },
            )
            .unwrap();
        c.deposit(rst, v("1")).unwrap();
        c.deposit(d, v("0000")).unwrap();
        tick(&mut c, clk);
        assert_eq!(*c.value(q), v("0111"));
    }
}
