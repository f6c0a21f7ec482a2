//! Gate helpers: one call per built-in primitive module class.
//!
//! Each helper instantiates a leaf primitive [`Module`](crate::module::Module)
//! under the given parent, registers its ports with the emitter-facing names
//! (`_in`/`_out` data ports, condition-bearing comparator outputs), and
//! returns the output signal, already settled to the current input values.

use crate::circuit::{Circuit, Dependent};
use crate::error::NetlistError;
use crate::ids::{ModuleId, SignalId};
use crate::prim::PrimKind;
use crate::signal::DriverSource;
use weft_common::LogicValue;

impl Circuit {
    /// Instantiates a primitive module and returns its output signal.
    fn prim_module(
        &mut self,
        parent: ModuleId,
        kind: PrimKind,
        inputs: &[(&str, SignalId)],
        out_width: u32,
    ) -> Result<SignalId, NetlistError> {
        let definition = kind.definition_name();
        let instance = format!("{}_{}", definition.to_ascii_lowercase(), self.modules.len());
        let m = self.child_module(parent, &instance, definition);
        let mut internals = Vec::with_capacity(inputs.len());
        for (port_name, external) in inputs {
            let width = self.width_of(*external);
            let internal = self.add_input(m, port_name, *external, width)?;
            internals.push(internal);
        }
        let out = self.add_output(m, kind.output_port_name(), out_width)?;
        {
            let module = &mut self.modules[m];
            module.prim = Some(kind);
            module.prim_inputs = internals.clone();
            module.prim_output = Some(out);
        }
        self.signals[out].driver = Some(DriverSource::Prim(m));
        for internal in internals {
            self.dependents
                .entry(internal)
                .or_default()
                .push(Dependent::Prim(m));
        }
        self.settle_prim(m)?;
        Ok(out)
    }

    fn same_width(&self, a: SignalId, b: SignalId) -> Result<u32, NetlistError> {
        let w = self.width_of(a);
        self.check_widths(w, self.width_of(b))?;
        Ok(w)
    }

    /// Bitwise NOT of `a`.
    pub fn not_gate(&mut self, parent: ModuleId, a: SignalId) -> Result<SignalId, NetlistError> {
        let w = self.width_of(a);
        self.prim_module(parent, PrimKind::Not, &[("_in", a)], w)
    }

    /// Bitwise AND of two same-width signals.
    pub fn and2(
        &mut self,
        parent: ModuleId,
        a: SignalId,
        b: SignalId,
    ) -> Result<SignalId, NetlistError> {
        let w = self.same_width(a, b)?;
        self.prim_module(parent, PrimKind::And2, &[("_in0", a), ("_in1", b)], w)
    }

    /// Bitwise OR of two same-width signals.
    pub fn or2(
        &mut self,
        parent: ModuleId,
        a: SignalId,
        b: SignalId,
    ) -> Result<SignalId, NetlistError> {
        let w = self.same_width(a, b)?;
        self.prim_module(parent, PrimKind::Or2, &[("_in0", a), ("_in1", b)], w)
    }

    /// Bitwise XOR of two same-width signals.
    pub fn xor2(
        &mut self,
        parent: ModuleId,
        a: SignalId,
        b: SignalId,
    ) -> Result<SignalId, NetlistError> {
        let w = self.same_width(a, b)?;
        self.prim_module(parent, PrimKind::Xor2, &[("_in0", a), ("_in1", b)], w)
    }

    /// Unary AND reduction to one bit.
    pub fn red_and(&mut self, parent: ModuleId, a: SignalId) -> Result<SignalId, NetlistError> {
        self.prim_module(parent, PrimKind::RedAnd, &[("_in", a)], 1)
    }

    /// Unary OR reduction to one bit.
    pub fn red_or(&mut self, parent: ModuleId, a: SignalId) -> Result<SignalId, NetlistError> {
        self.prim_module(parent, PrimKind::RedOr, &[("_in", a)], 1)
    }

    /// Unary XOR reduction to one bit.
    pub fn red_xor(&mut self, parent: ModuleId, a: SignalId) -> Result<SignalId, NetlistError> {
        self.prim_module(parent, PrimKind::RedXor, &[("_in", a)], 1)
    }

    /// 1-bit equality comparator.
    pub fn equal(
        &mut self,
        parent: ModuleId,
        a: SignalId,
        b: SignalId,
    ) -> Result<SignalId, NetlistError> {
        self.same_width(a, b)?;
        self.prim_module(parent, PrimKind::Eq, &[("_in0", a), ("_in1", b)], 1)
    }

    /// 1-bit inequality comparator.
    pub fn not_equal(
        &mut self,
        parent: ModuleId,
        a: SignalId,
        b: SignalId,
    ) -> Result<SignalId, NetlistError> {
        self.same_width(a, b)?;
        self.prim_module(parent, PrimKind::Neq, &[("_in0", a), ("_in1", b)], 1)
    }

    /// 1-bit unsigned less-than comparator.
    pub fn less_than(
        &mut self,
        parent: ModuleId,
        a: SignalId,
        b: SignalId,
    ) -> Result<SignalId, NetlistError> {
        self.same_width(a, b)?;
        self.prim_module(parent, PrimKind::Lt, &[("_in0", a), ("_in1", b)], 1)
    }

    /// 1-bit unsigned less-or-equal comparator.
    pub fn less_or_equal(
        &mut self,
        parent: ModuleId,
        a: SignalId,
        b: SignalId,
    ) -> Result<SignalId, NetlistError> {
        self.same_width(a, b)?;
        self.prim_module(parent, PrimKind::Lte, &[("_in0", a), ("_in1", b)], 1)
    }

    /// 1-bit unsigned greater-than comparator.
    pub fn greater_than(
        &mut self,
        parent: ModuleId,
        a: SignalId,
        b: SignalId,
    ) -> Result<SignalId, NetlistError> {
        self.same_width(a, b)?;
        self.prim_module(parent, PrimKind::Gt, &[("_in0", a), ("_in1", b)], 1)
    }

    /// 1-bit unsigned greater-or-equal comparator.
    pub fn greater_or_equal(
        &mut self,
        parent: ModuleId,
        a: SignalId,
        b: SignalId,
    ) -> Result<SignalId, NetlistError> {
        self.same_width(a, b)?;
        self.prim_module(parent, PrimKind::Gte, &[("_in0", a), ("_in1", b)], 1)
    }

    /// Logical left shift of `a` by `amount`.
    pub fn shift_left(
        &mut self,
        parent: ModuleId,
        a: SignalId,
        amount: SignalId,
    ) -> Result<SignalId, NetlistError> {
        let w = self.width_of(a);
        self.prim_module(parent, PrimKind::Shl, &[("_in", a), ("_shamt", amount)], w)
    }

    /// Logical right shift of `a` by `amount`.
    pub fn shift_right_logical(
        &mut self,
        parent: ModuleId,
        a: SignalId,
        amount: SignalId,
    ) -> Result<SignalId, NetlistError> {
        let w = self.width_of(a);
        self.prim_module(parent, PrimKind::Srl, &[("_in", a), ("_shamt", amount)], w)
    }

    /// Arithmetic right shift of `a` by `amount`.
    pub fn shift_right_arith(
        &mut self,
        parent: ModuleId,
        a: SignalId,
        amount: SignalId,
    ) -> Result<SignalId, NetlistError> {
        let w = self.width_of(a);
        self.prim_module(parent, PrimKind::Sra, &[("_in", a), ("_shamt", amount)], w)
    }

    /// Modular adder over two same-width signals.
    pub fn adder(
        &mut self,
        parent: ModuleId,
        a: SignalId,
        b: SignalId,
    ) -> Result<SignalId, NetlistError> {
        let w = self.same_width(a, b)?;
        self.prim_module(parent, PrimKind::Add, &[("_in0", a), ("_in1", b)], w)
    }

    /// Modular subtracter over two same-width signals.
    pub fn subtracter(
        &mut self,
        parent: ModuleId,
        a: SignalId,
        b: SignalId,
    ) -> Result<SignalId, NetlistError> {
        let w = self.same_width(a, b)?;
        self.prim_module(parent, PrimKind::Sub, &[("_in0", a), ("_in1", b)], w)
    }

    /// Modular multiplier over two same-width signals.
    pub fn multiplier(
        &mut self,
        parent: ModuleId,
        a: SignalId,
        b: SignalId,
    ) -> Result<SignalId, NetlistError> {
        let w = self.same_width(a, b)?;
        self.prim_module(parent, PrimKind::Mul, &[("_in0", a), ("_in1", b)], w)
    }

    /// Two-way mux: `cond ? when_true : when_false`.
    ///
    /// An unknown condition yields an all-`X` output.
    pub fn mux(
        &mut self,
        parent: ModuleId,
        cond: SignalId,
        when_true: SignalId,
        when_false: SignalId,
    ) -> Result<SignalId, NetlistError> {
        self.check_widths(1, self.width_of(cond))?;
        let w = self.same_width(when_true, when_false)?;
        self.prim_module(
            parent,
            PrimKind::Mux,
            &[("_cond", cond), ("_in1", when_true), ("_in0", when_false)],
            w,
        )
    }

    /// Inclusive slice `[hi:lo]` of `a`.
    pub fn slice_of(
        &mut self,
        parent: ModuleId,
        a: SignalId,
        hi: u32,
        lo: u32,
    ) -> Result<SignalId, NetlistError> {
        let width = hi.abs_diff(lo) + 1;
        self.prim_module(parent, PrimKind::Slice { hi, lo }, &[("_in", a)], width)
    }

    /// Concatenation `{high, low}`.
    pub fn concat2(
        &mut self,
        parent: ModuleId,
        high: SignalId,
        low: SignalId,
    ) -> Result<SignalId, NetlistError> {
        let width = self.width_of(high) + self.width_of(low);
        self.prim_module(
            parent,
            PrimKind::Concat,
            &[("_in0", low), ("_in1", high)],
            width,
        )
    }

    /// `count` copies of `a` concatenated.
    pub fn replicated(
        &mut self,
        parent: ModuleId,
        a: SignalId,
        count: u32,
    ) -> Result<SignalId, NetlistError> {
        if count < 1 {
            return Err(weft_common::ValueError::InvalidMultiplier {
                count: count as i64,
            }
            .into());
        }
        let width = self.width_of(a) * count;
        self.prim_module(parent, PrimKind::Replicate { count }, &[("_in", a)], width)
    }

    /// A constant-value source.
    pub fn constant(
        &mut self,
        parent: ModuleId,
        value: LogicValue,
    ) -> Result<SignalId, NetlistError> {
        let width = value.width();
        self.prim_module(parent, PrimKind::Const { value }, &[], width)
    }
}
