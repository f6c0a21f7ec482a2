//! Conditional statements for combinational and sequential blocks.
//!
//! A block's body is a tree of [`Conditional`] nodes evaluated imperatively
//! in listed order. The read and write sets of a body are static and are
//! collected at registration time for sensitivity wiring and build checks.

use crate::ids::{ModuleId, SignalId};
use crate::signal::Operand;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use weft_common::LogicValue;

/// A clock/trigger edge kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Rising edge (0→1).
    Posedge,
    /// Falling edge (1→0).
    Negedge,
    /// Either direction.
    Either,
}

/// A signal/edge pair firing a sequential block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    /// The 1-bit signal being watched.
    pub signal: SignalId,
    /// The edge to trigger on.
    pub edge: EdgeKind,
}

impl Trigger {
    /// A rising-edge trigger.
    pub fn posedge(signal: SignalId) -> Self {
        Self {
            signal,
            edge: EdgeKind::Posedge,
        }
    }

    /// A falling-edge trigger.
    pub fn negedge(signal: SignalId) -> Self {
        Self {
            signal,
            edge: EdgeKind::Negedge,
        }
    }
}

/// How a case statement selects among its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseMode {
    /// First match wins; no expectation on match count.
    Normal,
    /// Exactly one item must match; violations warn and take the default.
    Unique,
    /// First match wins, explicitly prioritized.
    Priority,
}

/// One arm of an if chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfArm {
    /// The arm's condition.
    pub condition: Operand,
    /// The body executed when the condition holds.
    pub body: Vec<Conditional>,
}

/// One item of a case statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseItem {
    /// The pattern compared against the subject.
    pub pattern: Operand,
    /// The body executed when the pattern matches.
    pub body: Vec<Conditional>,
}

/// A statement in a conditional block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Conditional {
    /// Assign the operand's value to the target signal.
    Assign {
        /// The signal being written.
        dst: SignalId,
        /// The value source.
        src: Operand,
    },
    /// An if/else-if/else chain; arms are tested in order.
    If {
        /// The prioritized condition arms.
        arms: Vec<IfArm>,
        /// The body executed when no arm's condition holds.
        or_else: Vec<Conditional>,
    },
    /// A case statement over a selector.
    Case {
        /// The selector.
        subject: Operand,
        /// The match items, in declaration order.
        items: Vec<CaseItem>,
        /// The body executed when no item is selected.
        default: Vec<Conditional>,
        /// The selection discipline.
        mode: CaseMode,
        /// When set, `Z` bits act as wildcards in pattern matching.
        wildcard_z: bool,
    },
    /// A grouped sequence of statements.
    Compound(Vec<Conditional>),
}

impl Conditional {
    /// An assignment statement.
    pub fn assign(dst: SignalId, src: impl Into<Operand>) -> Self {
        Conditional::Assign {
            dst,
            src: src.into(),
        }
    }

    /// A plain `if (cond) then else`.
    pub fn when(
        condition: impl Into<Operand>,
        then: Vec<Conditional>,
        or_else: Vec<Conditional>,
    ) -> Self {
        Conditional::If {
            arms: vec![IfArm {
                condition: condition.into(),
                body: then,
            }],
            or_else,
        }
    }

    /// An if/else-if chain built from `(condition, body)` pairs.
    pub fn if_block(arms: Vec<IfArm>, or_else: Vec<Conditional>) -> Self {
        Conditional::If { arms, or_else }
    }

    /// A case statement with exact pattern matching.
    pub fn case(
        subject: impl Into<Operand>,
        items: Vec<CaseItem>,
        default: Vec<Conditional>,
        mode: CaseMode,
    ) -> Self {
        Conditional::Case {
            subject: subject.into(),
            items,
            default,
            mode,
            wildcard_z: false,
        }
    }

    /// A case statement where `Z` pattern bits match anything.
    pub fn case_z(
        subject: impl Into<Operand>,
        items: Vec<CaseItem>,
        default: Vec<Conditional>,
        mode: CaseMode,
    ) -> Self {
        Conditional::Case {
            subject: subject.into(),
            items,
            default,
            mode,
            wildcard_z: true,
        }
    }

    fn collect_operand(op: &Operand, out: &mut Vec<SignalId>, seen: &mut HashSet<SignalId>) {
        if let Operand::Sig(id) = op {
            if seen.insert(*id) {
                out.push(*id);
            }
        }
    }

    /// Appends every signal read by this statement, in first-read order.
    pub fn collect_reads(&self, out: &mut Vec<SignalId>, seen: &mut HashSet<SignalId>) {
        match self {
            Conditional::Assign { src, .. } => Self::collect_operand(src, out, seen),
            Conditional::If { arms, or_else } => {
                for arm in arms {
                    Self::collect_operand(&arm.condition, out, seen);
                    for s in &arm.body {
                        s.collect_reads(out, seen);
                    }
                }
                for s in or_else {
                    s.collect_reads(out, seen);
                }
            }
            Conditional::Case {
                subject,
                items,
                default,
                ..
            } => {
                Self::collect_operand(subject, out, seen);
                for item in items {
                    Self::collect_operand(&item.pattern, out, seen);
                    for s in &item.body {
                        s.collect_reads(out, seen);
                    }
                }
                for s in default {
                    s.collect_reads(out, seen);
                }
            }
            Conditional::Compound(stmts) => {
                for s in stmts {
                    s.collect_reads(out, seen);
                }
            }
        }
    }

    /// Appends every signal written anywhere in this statement.
    pub fn collect_writes(&self, out: &mut Vec<SignalId>, seen: &mut HashSet<SignalId>) {
        match self {
            Conditional::Assign { dst, .. } => {
                if seen.insert(*dst) {
                    out.push(*dst);
                }
            }
            Conditional::If { arms, or_else } => {
                for arm in arms {
                    for s in &arm.body {
                        s.collect_writes(out, seen);
                    }
                }
                for s in or_else {
                    s.collect_writes(out, seen);
                }
            }
            Conditional::Case { items, default, .. } => {
                for item in items {
                    for s in &item.body {
                        s.collect_writes(out, seen);
                    }
                }
                for s in default {
                    s.collect_writes(out, seen);
                }
            }
            Conditional::Compound(stmts) => {
                for s in stmts {
                    s.collect_writes(out, seen);
                }
            }
        }
    }
}

/// Signals guaranteed to be written by `body` on every control path.
///
/// An `If` without an else arm and a `Case` without a default guarantee
/// nothing; otherwise a branch point guarantees the intersection of its
/// branches' guarantees.
pub fn always_assigned(body: &[Conditional]) -> HashSet<SignalId> {
    let mut assigned = HashSet::new();
    for stmt in body {
        match stmt {
            Conditional::Assign { dst, .. } => {
                assigned.insert(*dst);
            }
            Conditional::If { arms, or_else } => {
                let mut branches: Vec<HashSet<SignalId>> =
                    arms.iter().map(|arm| always_assigned(&arm.body)).collect();
                branches.push(always_assigned(or_else));
                // An absent else arm is an empty branch, so the intersection
                // is empty too.
                if let Some(first) = branches.first().cloned() {
                    let common = branches
                        .iter()
                        .skip(1)
                        .fold(first, |acc, b| acc.intersection(b).copied().collect());
                    assigned.extend(common);
                }
            }
            Conditional::Case { items, default, .. } => {
                let mut branches: Vec<HashSet<SignalId>> =
                    items.iter().map(|item| always_assigned(&item.body)).collect();
                branches.push(always_assigned(default));
                if let Some(first) = branches.first().cloned() {
                    let common = branches
                        .iter()
                        .skip(1)
                        .fold(first, |acc, b| acc.intersection(b).copied().collect());
                    assigned.extend(common);
                }
            }
            Conditional::Compound(stmts) => {
                assigned.extend(always_assigned(stmts));
            }
        }
    }
    assigned
}

/// The kind of a conditional block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProcessKind {
    /// Re-evaluates whenever any read signal changes.
    Combinational {
        /// Suppresses the inferred-latch diagnostic when set.
        allow_latches: bool,
    },
    /// Samples and stages writes on a trigger edge; commits at clk-stable.
    Sequential {
        /// The edges that fire the block.
        triggers: Vec<Trigger>,
    },
}

/// A registered conditional block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    /// The module the block belongs to.
    pub module: ModuleId,
    /// Combinational or sequential discipline.
    pub kind: ProcessKind,
    /// The statement tree, evaluated in listed order.
    pub body: Vec<Conditional>,
    /// Signals read anywhere in the body, in first-read order.
    pub(crate) reads: Vec<SignalId>,
    /// Signals written anywhere in the body, in first-write order.
    pub(crate) writes: Vec<SignalId>,
    /// Staged next-values of a sequential block awaiting clk-stable.
    pub(crate) pending: Vec<(SignalId, LogicValue)>,
}

impl Process {
    /// Signals read anywhere in the body.
    pub fn reads(&self) -> &[SignalId] {
        &self.reads
    }

    /// Signals written anywhere in the body.
    pub fn writes(&self) -> &[SignalId] {
        &self.writes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EntityId;

    fn sig(n: usize) -> SignalId {
        SignalId::from_index(n)
    }

    fn reads_of(body: &[Conditional]) -> Vec<SignalId> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for s in body {
            s.collect_reads(&mut out, &mut seen);
        }
        out
    }

    #[test]
    fn collect_reads_ordered_dedup() {
        let body = vec![
            Conditional::assign(sig(0), sig(1)),
            Conditional::when(
                sig(2),
                vec![Conditional::assign(sig(0), sig(1))],
                vec![Conditional::assign(sig(0), sig(3))],
            ),
        ];
        assert_eq!(reads_of(&body), vec![sig(1), sig(2), sig(3)]);
    }

    #[test]
    fn collect_writes_nested() {
        let body = vec![Conditional::case(
            sig(9),
            vec![CaseItem {
                pattern: Operand::Const(LogicValue::of_u64(1, 2)),
                body: vec![Conditional::assign(sig(4), sig(9))],
            }],
            vec![Conditional::assign(sig(5), sig(9))],
            CaseMode::Normal,
        )];
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for s in &body {
            s.collect_writes(&mut out, &mut seen);
        }
        assert_eq!(out, vec![sig(4), sig(5)]);
    }

    #[test]
    fn always_assigned_straight_line() {
        let body = vec![
            Conditional::assign(sig(0), sig(1)),
            Conditional::assign(sig(2), sig(1)),
        ];
        let a = always_assigned(&body);
        assert!(a.contains(&sig(0)));
        assert!(a.contains(&sig(2)));
    }

    #[test]
    fn always_assigned_requires_else() {
        // if without else guarantees nothing
        let body = vec![Conditional::when(
            sig(9),
            vec![Conditional::assign(sig(0), sig(1))],
            vec![],
        )];
        assert!(always_assigned(&body).is_empty());

        // both branches assign → guaranteed
        let body = vec![Conditional::when(
            sig(9),
            vec![Conditional::assign(sig(0), sig(1))],
            vec![Conditional::assign(sig(0), sig(2))],
        )];
        assert!(always_assigned(&body).contains(&sig(0)));
    }

    #[test]
    fn always_assigned_case_intersection() {
        let item = |pat: u64, dsts: &[u32]| CaseItem {
            pattern: Operand::Const(LogicValue::of_u64(pat, 2)),
            body: dsts
                .iter()
                .map(|&d| Conditional::assign(sig(d as usize), sig(9)))
                .collect(),
        };
        let body = vec![Conditional::case(
            sig(8),
            vec![item(0, &[0, 1]), item(1, &[0])],
            vec![Conditional::assign(sig(0), sig(9))],
            CaseMode::Priority,
        )];
        let a = always_assigned(&body);
        assert!(a.contains(&sig(0)));
        assert!(!a.contains(&sig(1)));
    }

    #[test]
    fn trigger_helpers() {
        let t = Trigger::posedge(sig(0));
        assert_eq!(t.edge, EdgeKind::Posedge);
        let t = Trigger::negedge(sig(1));
        assert_eq!(t.edge, EdgeKind::Negedge);
    }
}
