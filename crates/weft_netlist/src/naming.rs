//! Signal naming policy and per-module uniquification.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How strongly a signal holds on to its chosen name.
///
/// Emitters and the build-time uniquifier may rename anything except
/// [`Reserved`](Naming::Reserved) names, which must survive exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Naming {
    /// The name is fixed; a collision among reserved names is an error.
    Reserved,
    /// The name is preferred but may be uniquified.
    Renameable,
    /// The signal may be merged with an equivalent one and lose its name.
    Mergeable,
    /// The signal never had a meaningful name; emitters may pick any.
    Unnamed,
    /// A named signal that emitters should avoid surfacing when possible.
    Unpreferred,
}

impl Naming {
    /// Whether the uniquifier and emitters may change this name.
    pub fn is_renameable(self) -> bool {
        !matches!(self, Naming::Reserved)
    }
}

/// Produces a name not present in `taken`, starting from `base`.
///
/// Returns `base` itself when free, otherwise `base_0`, `base_1`, ...
pub fn uniquified(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut counter = 0usize;
    loop {
        let candidate = format!("{base}_{counter}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renameable_classes() {
        assert!(!Naming::Reserved.is_renameable());
        assert!(Naming::Renameable.is_renameable());
        assert!(Naming::Mergeable.is_renameable());
        assert!(Naming::Unnamed.is_renameable());
        assert!(Naming::Unpreferred.is_renameable());
    }

    #[test]
    fn uniquified_free_name() {
        let taken = HashSet::new();
        assert_eq!(uniquified("data", &taken), "data");
    }

    #[test]
    fn uniquified_suffixes() {
        let mut taken = HashSet::new();
        taken.insert("data".to_string());
        assert_eq!(uniquified("data", &taken), "data_0");
        taken.insert("data_0".to_string());
        assert_eq!(uniquified("data", &taken), "data_1");
    }
}
