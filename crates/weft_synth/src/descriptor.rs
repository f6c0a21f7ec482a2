//! Primitive descriptors: how built-in module classes map to emitter cells.
//!
//! For each [`PrimKind`] the descriptor names the target primitive, maps
//! logical port names to primitive port names (by literal or by prefix
//! pattern), carries the port direction table, and derives parameters
//! (widths, offsets, counts) from the module's ports. Emitters look up by
//! module kind first, then fall back to matching the definition name.
//! Sequential blocks with one trigger, one data input, and one output map
//! to a `dff`; richer ones decompose into `mux`+`dff` with controls
//! detected by the standardized port-name conventions.

use serde::Serialize;
use weft_netlist::{Circuit, ModuleId, PortDirection, PrimKind, ProcessKind};

/// A pattern for matching logical port names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PortPattern {
    /// Matches the name exactly.
    Exact(&'static str),
    /// Matches any name starting with the prefix.
    Prefix(&'static str),
}

impl PortPattern {
    /// Whether a logical port name matches this pattern.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            PortPattern::Exact(s) => name == *s,
            PortPattern::Prefix(p) => name.starts_with(p),
        }
    }
}

/// One port of an emitted primitive cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortDesc {
    /// The logical port name on the module.
    pub logical: String,
    /// The primitive-side port name.
    pub primitive: &'static str,
    /// Direction of the port.
    pub direction: PortDirection,
    /// Port width in bits.
    pub width: u32,
}

/// A primitive cell an emitter can instantiate for a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimitiveDescriptor {
    /// The primitive name (e.g. `"and"`, `"dff"`).
    pub name: &'static str,
    /// Port mapping with directions.
    pub ports: Vec<PortDesc>,
    /// Parameters derived from the module's ports.
    pub params: Vec<(&'static str, u64)>,
}

/// The primitive cell name for a kind.
fn cell_name(kind: &PrimKind) -> &'static str {
    match kind {
        PrimKind::Not => "not",
        PrimKind::And2 => "and",
        PrimKind::Or2 => "or",
        PrimKind::Xor2 => "xor",
        PrimKind::RedAnd => "reduce_and",
        PrimKind::RedOr => "reduce_or",
        PrimKind::RedXor => "reduce_xor",
        PrimKind::Eq => "eq",
        PrimKind::Neq => "ne",
        PrimKind::Lt => "lt",
        PrimKind::Lte => "le",
        PrimKind::Gt => "gt",
        PrimKind::Gte => "ge",
        PrimKind::Shl => "shl",
        PrimKind::Srl => "shr",
        PrimKind::Sra => "sshr",
        PrimKind::Add => "add",
        PrimKind::Sub => "sub",
        PrimKind::Mul => "mul",
        PrimKind::Mux => "mux",
        PrimKind::Slice { .. } => "slice",
        PrimKind::Concat => "concat",
        PrimKind::Replicate { .. } => "replicate",
        PrimKind::Const { .. } => "const",
    }
}

/// The pattern table mapping logical port names onto primitive pins.
///
/// Shared across kinds: `_in0`/`_in1` are the `a`/`b` operands, a bare
/// `_in` is `a`, `_shamt` is `b`, `_cond` is the select, and every output
/// (including condition-bearing comparator names) is `y`.
const PORT_TABLE: &[(PortPattern, &str)] = &[
    (PortPattern::Exact("_in0"), "a"),
    (PortPattern::Exact("_in1"), "b"),
    (PortPattern::Exact("_shamt"), "b"),
    (PortPattern::Exact("_cond"), "s"),
    (PortPattern::Exact("_in"), "a"),
    (PortPattern::Exact("_out"), "y"),
    (PortPattern::Exact("equal"), "y"),
    (PortPattern::Exact("notEqual"), "y"),
    (PortPattern::Exact("lessThan"), "y"),
    (PortPattern::Exact("lessOrEqual"), "y"),
    (PortPattern::Exact("greaterThan"), "y"),
    (PortPattern::Exact("greaterOrEqual"), "y"),
    (PortPattern::Prefix("_in"), "a"),
];

fn primitive_pin(logical: &str) -> Option<&'static str> {
    PORT_TABLE
        .iter()
        .find(|(pattern, _)| pattern.matches(logical))
        .map(|(_, pin)| *pin)
}

/// The descriptor for a module, by primitive kind with a definition-name
/// fallback. Returns `None` for composite (non-primitive) modules; use
/// [`sequential_mapping`] for register-bearing ones.
pub fn descriptor_for(c: &Circuit, m: ModuleId) -> Option<PrimitiveDescriptor> {
    let module = c.module_info(m);
    let kind = match &module.prim {
        Some(kind) => kind.clone(),
        None => kind_from_definition(c.definition_name(m))?,
    };

    let mut ports = Vec::new();
    for port in &module.ports {
        let logical = c.name_of(port.internal).to_string();
        let Some(primitive) = primitive_pin(&logical) else {
            continue;
        };
        ports.push(PortDesc {
            logical,
            primitive,
            direction: port.direction,
            width: port.width,
        });
    }

    let mut params: Vec<(&'static str, u64)> = Vec::new();
    let out_width = module
        .ports
        .iter()
        .find(|p| p.direction == PortDirection::Output)
        .map(|p| p.width as u64)
        .unwrap_or(0);
    params.push(("WIDTH", out_width));
    match &kind {
        PrimKind::Slice { hi, lo } => {
            params.push(("OFFSET", *lo.min(hi) as u64));
        }
        PrimKind::Replicate { count } => {
            params.push(("COUNT", *count as u64));
        }
        _ => {}
    }

    Some(PrimitiveDescriptor {
        name: cell_name(&kind),
        ports,
        params,
    })
}

/// Definition-name fallback for parameterless primitive classes.
fn kind_from_definition(name: &str) -> Option<PrimKind> {
    Some(match name {
        "Not" => PrimKind::Not,
        "And2" => PrimKind::And2,
        "Or2" => PrimKind::Or2,
        "Xor2" => PrimKind::Xor2,
        "ReductionAnd" => PrimKind::RedAnd,
        "ReductionOr" => PrimKind::RedOr,
        "ReductionXor" => PrimKind::RedXor,
        "Equals" => PrimKind::Eq,
        "NotEquals" => PrimKind::Neq,
        "LessThan" => PrimKind::Lt,
        "LessOrEqual" => PrimKind::Lte,
        "GreaterThan" => PrimKind::Gt,
        "GreaterOrEqual" => PrimKind::Gte,
        "ShiftLeft" => PrimKind::Shl,
        "ShiftRightLogical" => PrimKind::Srl,
        "ShiftRightArith" => PrimKind::Sra,
        "Add" => PrimKind::Add,
        "Subtract" => PrimKind::Sub,
        "Multiply" => PrimKind::Mul,
        "Mux" => PrimKind::Mux,
        "Concat" => PrimKind::Concat,
        _ => return None,
    })
}

/// The standardized control-port names detected during decomposition.
const CONTROL_PORTS: &[&str] = &[
    "_reset",
    "_resetValue",
    "_en",
    "_cond",
    "greaterThan",
    "lessThan",
    "equal",
];

fn is_control_port(name: &str) -> bool {
    CONTROL_PORTS.contains(&name)
}

/// How a sequential module lowers to primitive cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeqMapping {
    /// Control ports steering data into the register, in port order.
    pub controls: Vec<String>,
    /// The emitted cells, data path first, `dff` last.
    pub cells: Vec<PrimitiveDescriptor>,
}

/// Maps a register-bearing module onto `dff` (plus `mux` per control).
///
/// Requires exactly one sequential block with one trigger, one data input
/// (`_in`), and one output (`_out`). Control inputs (`_reset`, `_en`, and
/// condition-bearing names) each contribute a `mux` in front of the `dff`.
pub fn sequential_mapping(c: &Circuit, m: ModuleId) -> Option<SeqMapping> {
    let module = c.module_info(m);
    if module.prim.is_some() || module.processes.len() != 1 {
        return None;
    }
    let process = c.process_info(module.processes[0]);
    let ProcessKind::Sequential { triggers } = &process.kind else {
        return None;
    };
    if triggers.len() != 1 {
        return None;
    }

    let mut trigger = None;
    let mut data_in = None;
    let mut data_out = None;
    let mut controls = Vec::new();
    for port in &module.ports {
        let name = c.name_of(port.internal).to_string();
        match name.as_str() {
            "_trigger" => trigger = Some((name, port.width)),
            "_in" => data_in = Some((name, port.width)),
            "_out" => data_out = Some((name, port.width)),
            other if is_control_port(other) => controls.push((name, port.width)),
            _ => return None,
        }
    }
    let (trigger, _) = trigger?;
    let (data_in, width) = data_in?;
    let (data_out, _) = data_out?;

    let mut cells = Vec::new();
    for (control, _) in &controls {
        if control == "_resetValue" {
            continue;
        }
        cells.push(PrimitiveDescriptor {
            name: "mux",
            ports: vec![
                PortDesc {
                    logical: control.clone(),
                    primitive: "s",
                    direction: PortDirection::Input,
                    width: 1,
                },
                PortDesc {
                    logical: data_in.clone(),
                    primitive: "a",
                    direction: PortDirection::Input,
                    width,
                },
                PortDesc {
                    logical: data_out.clone(),
                    primitive: "b",
                    direction: PortDirection::Input,
                    width,
                },
            ],
            params: vec![("WIDTH", width as u64)],
        });
    }
    cells.push(PrimitiveDescriptor {
        name: "dff",
        ports: vec![
            PortDesc {
                logical: trigger,
                primitive: "clk",
                direction: PortDirection::Input,
                width: 1,
            },
            PortDesc {
                logical: data_in,
                primitive: "d",
                direction: PortDirection::Input,
                width,
            },
            PortDesc {
                logical: data_out,
                primitive: "q",
                direction: PortDirection::Output,
                width,
            },
        ],
        params: vec![("WIDTH", width as u64)],
    });

    Some(SeqMapping {
        controls: controls.into_iter().map(|(name, _)| name).collect(),
        cells,
    })
}
