//! Grouped port bundles with role-based connection.
//!
//! An [`Interface`] maps user-defined direction tags to port descriptors,
//! optionally composed from named sub-interfaces registered through
//! factories (the reflection-free clone capability). A materialized parent
//! instance owns the parent-side signals; each module connects its own
//! [`instantiate`](Interface::instantiate)d copy against it, and reusing a
//! connected copy is rejected.

use std::collections::HashMap;
use std::rc::Rc;

use crate::circuit::Circuit;
use crate::error::NetlistError;
use crate::ids::{ModuleId, SignalId};
use serde::{Deserialize, Serialize};

/// One port of an interface bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    /// The port name within the bundle.
    pub name: String,
    /// Bit width.
    pub width: u32,
}

/// Which side of the interface a module plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The side that drives `from_provider` tags.
    Provider,
    /// The side that drives `to_provider` tags.
    Consumer,
}

impl Role {
    /// Splits tag groups into `(input_tags, output_tags)` for this role.
    pub fn io<'a, T>(self, to_provider: &'a [T], from_provider: &'a [T]) -> (&'a [T], &'a [T]) {
        match self {
            Role::Provider => (to_provider, from_provider),
            Role::Consumer => (from_provider, to_provider),
        }
    }
}

struct SubInterface<T> {
    name: String,
    factory: Rc<dyn Fn() -> Interface<T>>,
    instance: Interface<T>,
}

/// A tag-to-ports bundle with optional sub-interfaces.
pub struct Interface<T> {
    ports: Vec<(T, PortSpec)>,
    subs: Vec<SubInterface<T>>,
    /// Parent-side signals by flattened path, present once materialized.
    signals: HashMap<String, SignalId>,
    /// Module-side signals by flattened path, present once connected.
    internals: HashMap<String, SignalId>,
    connected: bool,
}

impl<T: Copy + PartialEq> Default for Interface<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + PartialEq> Interface<T> {
    /// An empty interface shape.
    pub fn new() -> Self {
        Self {
            ports: Vec::new(),
            subs: Vec::new(),
            signals: HashMap::new(),
            internals: HashMap::new(),
            connected: false,
        }
    }

    /// Adds a port under the given tag (builder style).
    pub fn port(mut self, tag: T, name: &str, width: u32) -> Self {
        self.ports.push((
            tag,
            PortSpec {
                name: name.to_string(),
                width,
            },
        ));
        self
    }

    /// Registers a named sub-interface through its factory.
    ///
    /// The factory is retained so [`instantiate`](Self::instantiate) can
    /// produce fresh same-shape copies of the whole tree.
    pub fn sub(mut self, name: &str, factory: impl Fn() -> Interface<T> + 'static) -> Self {
        let instance = factory();
        self.subs.push(SubInterface {
            name: name.to_string(),
            factory: Rc::new(factory),
            instance,
        });
        self
    }

    /// A fresh, unconnected interface with the same shape.
    pub fn instantiate(&self) -> Self {
        Self {
            ports: self.ports.clone(),
            subs: self
                .subs
                .iter()
                .map(|s| SubInterface {
                    name: s.name.clone(),
                    factory: Rc::clone(&s.factory),
                    instance: (s.factory)(),
                })
                .collect(),
            signals: HashMap::new(),
            internals: HashMap::new(),
            connected: false,
        }
    }

    /// All ports including sub-interfaces, with flattened path names.
    fn flat_ports(&self, prefix: &str, out: &mut Vec<(T, String, u32)>) {
        for (tag, spec) in &self.ports {
            out.push((*tag, format!("{prefix}{}", spec.name), spec.width));
        }
        for sub in &self.subs {
            sub.instance
                .flat_ports(&format!("{prefix}{}_", sub.name), out);
        }
    }

    /// Creates the parent-side signal for every port.
    pub fn materialize(&mut self, c: &mut Circuit) -> Result<(), NetlistError> {
        if !self.signals.is_empty() {
            return Err(NetlistError::InterfaceNotCloned {
                reason: "interface already materialized; instantiate a fresh copy".into(),
            });
        }
        let mut flat = Vec::new();
        self.flat_ports("", &mut flat);
        for (_, path, width) in flat {
            let sig = c.signal(&path, width);
            self.signals.insert(path, sig);
        }
        Ok(())
    }

    /// The parent-side signal of a port, by flattened path.
    pub fn signal(&self, path: &str) -> Option<SignalId> {
        self.signals.get(path).copied()
    }

    /// The module-side signal of a connected port, by flattened path.
    pub fn internal(&self, path: &str) -> Option<SignalId> {
        self.internals.get(path).copied()
    }

    /// Registers this copy's ports on a module against a materialized source.
    ///
    /// Ports under a tag in `input_tags` become inputs driven by the source
    /// signals; ports under `output_tags` become outputs driving them. A
    /// copy may connect once; reuse fails with
    /// [`NetlistError::InterfaceNotCloned`].
    pub fn connect(
        &mut self,
        c: &mut Circuit,
        m: ModuleId,
        source: &Interface<T>,
        input_tags: &[T],
        output_tags: &[T],
    ) -> Result<(), NetlistError> {
        if self.connected {
            return Err(NetlistError::InterfaceNotCloned {
                reason: "interface copy already connected; instantiate a fresh copy".into(),
            });
        }
        if source.signals.is_empty() {
            return Err(NetlistError::InterfaceNotCloned {
                reason: "source interface is not materialized".into(),
            });
        }
        let mut flat = Vec::new();
        self.flat_ports("", &mut flat);
        for (tag, path, width) in flat {
            let source_sig =
                source
                    .signal(&path)
                    .ok_or_else(|| NetlistError::IllegalTopology {
                        reason: format!("source interface has no port `{path}`"),
                    })?;
            if input_tags.contains(&tag) {
                let internal = c.add_input(m, &path, source_sig, width)?;
                self.internals.insert(path, internal);
            } else if output_tags.contains(&tag) {
                let internal = c.add_output(m, &path, width)?;
                c.connect(source_sig, internal)?;
                self.internals.insert(path, internal);
            }
        }
        self.connected = true;
        Ok(())
    }

    /// Role-based connection: `to_provider` tags feed the provider,
    /// `from_provider` tags feed the consumer.
    pub fn connect_role(
        &mut self,
        c: &mut Circuit,
        m: ModuleId,
        source: &Interface<T>,
        role: Role,
        to_provider: &[T],
        from_provider: &[T],
    ) -> Result<(), NetlistError> {
        let (inputs, outputs) = role.io(to_provider, from_provider);
        self.connect(c, m, source, inputs, outputs)
    }
}

impl Circuit {
    /// Registers an interface's ports on a module; equivalent to
    /// [`Interface::connect`] with the arguments flipped to match the other
    /// port-registration methods.
    pub fn add_interface_ports<T: Copy + PartialEq>(
        &mut self,
        m: ModuleId,
        intf: &mut Interface<T>,
        source: &Interface<T>,
        input_tags: &[T],
        output_tags: &[T],
    ) -> Result<(), NetlistError> {
        intf.connect(self, m, source, input_tags, output_tags)
    }
}
