//! Interned names for signals, ports, and modules.
//!
//! Every name in a circuit is stored once in an [`Interner`] and referred to
//! by a copyable [`Ident`], so renaming during uniquification re-points a
//! single handle and name equality never walks string bytes.

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Serialize};

/// A handle to an interned name.
///
/// Two idents from the same interner are equal exactly when their strings
/// are; comparing handles from different interners is meaningless.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Ident(Spur);

/// The name table for one circuit.
///
/// Thread-safe so build-time passes can resolve names without exclusive
/// access to the circuit.
pub struct Interner {
    names: ThreadedRodeo,
}

impl Interner {
    /// An empty name table.
    pub fn new() -> Self {
        Self {
            names: ThreadedRodeo::new(),
        }
    }

    /// Interns `name`, returning the existing handle when it was seen before.
    pub fn intern(&self, name: &str) -> Ident {
        Ident(self.names.get_or_intern(name))
    }

    /// The string behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle came from a different interner.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.names.resolve(&ident.0)
    }

    /// Whether `name` has been interned already, without interning it.
    pub fn contains(&self, name: &str) -> bool {
        self.names.get(name).is_some()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}
