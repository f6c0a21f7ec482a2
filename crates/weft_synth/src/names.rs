//! Emitter-facing identifier assignment.
//!
//! Port names are emitted verbatim. Internal names pass through
//! legalization and a registry that uniquifies renameable names while
//! preserving reserved ones exactly, reporting collisions.

use std::collections::HashSet;

use weft_netlist::naming::uniquified;
use weft_netlist::Naming;

/// Errors raised while assigning emitter identifiers.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// A reserved name collided with an already-assigned identifier.
    #[error("reserved name `{name}` collides with an existing identifier")]
    ReservedNameCollision {
        /// The colliding name.
        name: String,
    },
}

/// Rewrites a name into a valid target identifier.
///
/// Characters outside `[A-Za-z0-9_$]` become underscores and a leading
/// digit gains an underscore prefix; an empty name becomes `_sig`.
pub fn legalized(name: &str) -> String {
    if name.is_empty() {
        return "_sig".to_string();
    }
    let mut out: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Assigns unique identifiers within one emission scope.
#[derive(Default)]
pub struct NameRegistry {
    taken: HashSet<String>,
}

impl NameRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns an identifier for a signal with the given naming policy.
    ///
    /// Reserved names are taken exactly as-is (after no legalization at all:
    /// a reserved name that is not a valid identifier is the user's
    /// contract with the emitter) and collide rather than uniquify.
    pub fn assign(&mut self, name: &str, naming: Naming) -> Result<String, SynthError> {
        if naming == Naming::Reserved {
            if !self.taken.insert(name.to_string()) {
                return Err(SynthError::ReservedNameCollision {
                    name: name.to_string(),
                });
            }
            return Ok(name.to_string());
        }
        let unique = uniquified(&legalized(name), &self.taken);
        self.taken.insert(unique.clone());
        Ok(unique)
    }

    /// Assigns a module definition name; `reserved` forbids uniquification.
    pub fn assign_definition(
        &mut self,
        name: &str,
        reserved: bool,
    ) -> Result<String, SynthError> {
        self.assign(
            name,
            if reserved {
                Naming::Reserved
            } else {
                Naming::Renameable
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legalize_replaces_and_prefixes() {
        assert_eq!(legalized("a.b[3]"), "a_b_3_");
        assert_eq!(legalized("3state"), "_3state");
        assert_eq!(legalized(""), "_sig");
        assert_eq!(legalized("fine_name$"), "fine_name$");
    }

    #[test]
    fn renameable_names_uniquify() {
        let mut reg = NameRegistry::new();
        assert_eq!(reg.assign("data", Naming::Renameable).unwrap(), "data");
        assert_eq!(reg.assign("data", Naming::Renameable).unwrap(), "data_0");
        assert_eq!(reg.assign("data", Naming::Unnamed).unwrap(), "data_1");
    }

    #[test]
    fn reserved_names_survive_or_collide() {
        let mut reg = NameRegistry::new();
        assert_eq!(reg.assign("clk", Naming::Reserved).unwrap(), "clk");
        assert!(matches!(
            reg.assign("clk", Naming::Reserved),
            Err(SynthError::ReservedNameCollision { .. })
        ));
    }

    #[test]
    fn definition_names() {
        let mut reg = NameRegistry::new();
        assert_eq!(reg.assign_definition("Fifo", false).unwrap(), "Fifo");
        assert_eq!(reg.assign_definition("Fifo", false).unwrap(), "Fifo_0");
        assert!(reg.assign_definition("Fifo", true).is_err());
    }
}
