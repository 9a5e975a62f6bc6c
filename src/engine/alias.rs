//! Alias table mapping local identifiers to fully-qualified origins.

use std::collections::HashMap;

/// Maps local names bound by imports (and one-hop assignments) to their
/// fully-qualified dotted origin, e.g. `sp` -> `subprocess` after
/// `import subprocess as sp`.
///
/// Rebuilt per scanned file; owned exclusively by the walker for the duration
/// of one traversal.
#[derive(Debug, Default)]
pub struct AliasTable {
    map: HashMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a local name to a fully-qualified origin.
    pub fn bind(&mut self, local: impl Into<String>, origin: impl Into<String>) {
        self.map.insert(local.into(), origin.into());
    }

    /// Resolve a local name. Unknown names pass through unchanged: they are
    /// assumed to already be fully qualified or builtin.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.map.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_names_pass_through() {
        let table = AliasTable::new();
        assert_eq!(table.resolve("os"), "os");
    }

    #[test]
    fn bound_names_resolve_to_origin() {
        let mut table = AliasTable::new();
        table.bind("sp", "subprocess");
        table.bind("system", "os.system");
        assert_eq!(table.resolve("sp"), "subprocess");
        assert_eq!(table.resolve("system"), "os.system");
    }

    #[test]
    fn rebinding_overwrites() {
        let mut table = AliasTable::new();
        table.bind("x", "os");
        table.bind("x", "sys");
        assert_eq!(table.resolve("x"), "sys");
    }
}
