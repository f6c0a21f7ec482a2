//! End-to-end scenarios: a counter, a reduction tree, a tri-state bus,
//! case selection, value algebra, and combinational settling.

use std::cell::RefCell;
use std::rc::Rc;

use weft_common::{Logic, LogicValue};
use weft_netlist::{
    CaseItem, CaseMode, Circuit, Conditional, FlopConfig, ModuleId, NetlistError, Operand,
    SignalId, WarnCode,
};
use weft_sim::{Scheduler, Wake};

fn v(s: &str) -> LogicValue {
    LogicValue::of_string(s).unwrap()
}

/// An 8-bit counter with synchronous reset and enable, clocked by pulses
/// with a rising edge every 5 ticks.
#[test]
fn counter_with_sync_reset_and_enable() {
    let mut c = Circuit::new();
    let top = c.module("counter", "Counter");
    let clk_src = c.signal("clk_src", 1);
    let rst_src = c.signal("rst_src", 1);
    let en_src = c.signal("en_src", 1);
    let clk = c.add_input(top, "clk", clk_src, 1).unwrap();
    let rst = c.add_input(top, "reset", rst_src, 1).unwrap();
    let en = c.add_input(top, "en", en_src, 1).unwrap();
    let val = c.add_output(top, "val", 8).unwrap();

    let one = c.constant(top, LogicValue::of_u64(1, 8)).unwrap();
    let val_loop = c.signal("val_loop", 8);
    let next = c.adder(top, val_loop, one).unwrap();
    let q = c
        .flop(
            top,
            clk,
            next,
            FlopConfig {
                reset: Some(rst),
                reset_value: None,
                en: Some(en),
            },
        )
        .unwrap();
    c.connect(val_loop, q).unwrap();
    c.connect(val, q).unwrap();
    c.build(top).unwrap();

    let mut sim = Scheduler::new(c).unwrap();
    sim.at(0, move |ctx| {
        ctx.deposit_many(&[
            (clk_src, v("0")),
            (rst_src, v("1")),
            (en_src, v("1")),
        ])?;
        Ok(Wake::Done)
    });
    // Rising edge every 5 ticks; reset deasserts at t=5 after the edge.
    for k in 1..=4u64 {
        sim.at(5 * k, move |ctx| {
            ctx.deposit(clk_src, v("1"))?;
            Ok(Wake::Done)
        });
        sim.at(5 * k + 2, move |ctx| {
            ctx.deposit(clk_src, v("0"))?;
            Ok(Wake::Done)
        });
    }
    sim.at(5, move |ctx| {
        ctx.deposit(rst_src, v("0"))?;
        Ok(Wake::Done)
    });

    let observed: Rc<RefCell<Vec<(u64, u64)>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&observed);
    sim.on_tick_end(move |ctx| {
        if ctx.time() % 5 == 0 && ctx.time() > 0 {
            if let Ok(value) = ctx.value(val).to_u64() {
                sink.borrow_mut().push((ctx.time(), value));
            }
        }
        Ok(Wake::Delay(0))
    });
    sim.run().unwrap();

    let observed = observed.borrow();
    let at = |t: u64| {
        observed
            .iter()
            .find(|(time, _)| *time == t)
            .map(|(_, value)| *value)
    };
    assert_eq!(at(5), Some(0));
    assert_eq!(at(10), Some(1));
    assert_eq!(at(15), Some(2));
    assert_eq!(at(20), Some(3));
}

/// Logarithmic max-reduction over four 8-bit values settles in one wave.
#[test]
fn max_tree_settles_combinationally() {
    fn max_tree(
        c: &mut Circuit,
        parent: ModuleId,
        values: &[SignalId],
    ) -> Result<SignalId, NetlistError> {
        match values {
            [only] => Ok(*only),
            _ => {
                let mid = values.len() / 2;
                let left = max_tree(c, parent, &values[..mid])?;
                let right = max_tree(c, parent, &values[mid..])?;
                let pick_left = c.greater_than(parent, left, right)?;
                c.mux(parent, pick_left, left, right)
            }
        }
    }

    let mut c = Circuit::new();
    let top = c.module("maxtree", "MaxTree");
    let sources: Vec<SignalId> = (0..4).map(|i| c.signal(&format!("src{i}"), 8)).collect();
    let inputs: Vec<SignalId> = sources
        .iter()
        .enumerate()
        .map(|(i, &src)| c.add_input(top, &format!("in{i}"), src, 8).unwrap())
        .collect();
    let reduced = max_tree(&mut c, top, &inputs).unwrap();
    let out = c.add_output(top, "max", 8).unwrap();
    c.connect(out, reduced).unwrap();
    c.build(top).unwrap();

    let mut sim = Scheduler::new(c).unwrap();
    let feed: Vec<(SignalId, LogicValue)> = sources
        .iter()
        .zip([3u64, 7, 1, 9])
        .map(|(&sig, value)| (sig, LogicValue::of_u64(value, 8)))
        .collect();
    sim.at(0, move |ctx| {
        ctx.deposit_many(&feed)?;
        Ok(Wake::Done)
    });
    sim.run().unwrap();
    assert_eq!(*sim.circuit().value(out), LogicValue::of_u64(9, 8));
}

/// A 1-bit bus with two enable-gated drivers resolves 1, X, and Z.
#[test]
fn tri_state_bus_resolution() {
    let mut c = Circuit::new();
    let top = c.module("bus", "Bus");
    let bus = c.net("shared", 1);
    let en_a = c.signal("en_a", 1);
    let en_b = c.signal("en_b", 1);
    let drive_a = c.signal("drive_a", 1);
    let drive_b = c.signal("drive_b", 1);
    let floating = c.constant(top, LogicValue::of_logic(Logic::Z)).unwrap();
    let a_out = c.mux(top, en_a, drive_a, floating).unwrap();
    let b_out = c.mux(top, en_b, drive_b, floating).unwrap();
    c.attach_net(bus, a_out).unwrap();
    c.attach_net(bus, b_out).unwrap();
    c.build(top).unwrap();

    let mut sim = Scheduler::new(c).unwrap();
    sim.at(1, move |ctx| {
        ctx.deposit_many(&[
            (en_a, v("1")),
            (en_b, v("0")),
            (drive_a, v("1")),
            (drive_b, v("0")),
        ])?;
        assert_eq!(*ctx.value(bus), v("1"));
        Ok(Wake::Done)
    });
    sim.at(2, move |ctx| {
        ctx.deposit(en_b, v("1"))?;
        assert_eq!(*ctx.value(bus), v("x"));
        Ok(Wake::Done)
    });
    sim.at(3, move |ctx| {
        ctx.deposit_many(&[(en_a, v("0")), (en_b, v("0"))])?;
        assert!(ctx.value(bus).is_floating());
        Ok(Wake::Done)
    });
    sim.run().unwrap();
}

/// Priority takes the first matching arm; unique warns on multi-match and
/// falls back to the default.
#[test]
fn case_priority_vs_unique() {
    let mut c = Circuit::new();
    let top = c.module("sel", "Sel");
    let selector = c.signal("selector", 2);
    let out_p = c.signal("out_p", 4);
    let out_u = c.signal("out_u", 4);
    c.combinational(
        top,
        vec![Conditional::case(
            selector,
            vec![
                CaseItem {
                    pattern: Operand::Const(v("01")),
                    body: vec![Conditional::assign(out_p, v("0001"))],
                },
                CaseItem {
                    pattern: Operand::Const(v("10")),
                    body: vec![Conditional::assign(out_p, v("0010"))],
                },
            ],
            vec![Conditional::assign(out_p, v("0000"))],
            CaseMode::Priority,
        )],
    )
    .unwrap();
    c.combinational(
        top,
        vec![Conditional::case(
            selector,
            vec![
                CaseItem {
                    pattern: Operand::Const(v("1x")),
                    body: vec![Conditional::assign(out_u, v("0011"))],
                },
                CaseItem {
                    pattern: Operand::Const(v("x0")),
                    body: vec![Conditional::assign(out_u, v("0100"))],
                },
            ],
            vec![Conditional::assign(out_u, v("0000"))],
            CaseMode::Unique,
        )],
    )
    .unwrap();
    c.build(top).unwrap();
    c.take_warnings();

    c.deposit(selector, v("10")).unwrap();
    assert_eq!(*c.value(out_p), v("0010"));
    assert_eq!(*c.value(out_u), v("0000"));
    assert!(c
        .take_warnings()
        .iter()
        .any(|w| w.code == WarnCode::UniqueCaseViolation));
}

/// Value algebra spot checks.
#[test]
fn value_algebra_samples() {
    // Invalid operand poisons multiplication across the full width.
    let a = v("0101xz01");
    let two = LogicValue::of_u64(2, 8);
    assert_eq!(a.mul(&two).unwrap(), LogicValue::filled(8, Logic::X));

    // Modular addition.
    let ff = LogicValue::of_u64(0xff, 8);
    let one = LogicValue::of_u64(1, 8);
    assert_eq!(ff.add(&one).unwrap(), LogicValue::of_u64(0, 8));

    // Sign extension duplicates the MSB.
    assert_eq!(v("1000").sign_extend(6).unwrap(), v("111000"));
}

/// Two inputs changing at the same instant produce one settled output event.
#[test]
fn combinational_settle_single_event() {
    let mut c = Circuit::new();
    let top = c.module("settle", "Settle");
    let a = c.signal("a", 1);
    let b = c.signal("b", 1);
    let y = c.and2(top, a, b).unwrap();
    let out = c.add_output(top, "y", 1).unwrap();
    c.connect(out, y).unwrap();
    c.build(top).unwrap();

    let monitor = c.monitor(out);
    let mut sim = Scheduler::new(c).unwrap();
    sim.at(0, move |ctx| {
        ctx.deposit_many(&[(a, v("0")), (b, v("0"))])?;
        Ok(Wake::Done)
    });
    sim.at(10, move |ctx| {
        ctx.deposit_many(&[(a, v("1")), (b, v("1"))])?;
        Ok(Wake::Done)
    });
    sim.run().unwrap();

    let changes = sim.circuit_mut().take_changes(monitor);
    // X -> 0 at t=0, then exactly one event for the simultaneous flip.
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[1].new, v("1"));
}
