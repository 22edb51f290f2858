//! Allow/block policy for discovered tools

use std::collections::HashSet;

/// Decides which discovered tools may enter the catalog
///
/// The block list always wins. A non-empty allow list restricts the catalog
/// to the listed names; an absent or empty allow list allows everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolPolicy {
    allow_list: Option<HashSet<String>>,
    block_list: Option<HashSet<String>>,
}

impl ToolPolicy {
    pub fn new(allow_list: Option<Vec<String>>, block_list: Option<Vec<String>>) -> Self {
        Self {
            allow_list: allow_list.map(|names| names.into_iter().collect()),
            block_list: block_list.map(|names| names.into_iter().collect()),
        }
    }

    /// Policy that allows every tool
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Only allow tools with these names
    pub fn with_allow_list(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.allow_list = Some(names.into_iter().collect());
        self
    }

    /// Never allow tools with these names
    pub fn with_block_list(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.block_list = Some(names.into_iter().collect());
        self
    }

    /// Check if a tool may be exposed
    pub fn is_allowed(&self, name: &str) -> bool {
        if let Some(ref blocked) = self.block_list {
            if blocked.contains(name) {
                return false;
            }
        }

        match self.allow_list {
            Some(ref allowed) if !allowed.is_empty() => allowed.contains(name),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_block_takes_precedence() {
        let policy = ToolPolicy::new(Some(names(&["x", "y"])), Some(names(&["x"])));
        assert!(!policy.is_allowed("x"));
        assert!(policy.is_allowed("y"));
        assert!(!policy.is_allowed("z"));
    }

    #[test]
    fn test_no_lists_allows_everything() {
        let policy = ToolPolicy::allow_all();
        assert!(policy.is_allowed("anything"));
        assert!(policy.is_allowed(""));
    }

    #[test]
    fn test_block_list_only() {
        let policy = ToolPolicy::allow_all().with_block_list(names(&["delete_file"]));
        assert!(!policy.is_allowed("delete_file"));
        assert!(policy.is_allowed("read_file"));
    }

    #[test]
    fn test_empty_allow_list_allows_everything() {
        let policy = ToolPolicy::new(Some(Vec::new()), None);
        assert!(policy.is_allowed("read_file"));
    }

    #[test]
    fn test_allow_list_only() {
        let policy = ToolPolicy::allow_all().with_allow_list(names(&["read_file"]));
        assert!(policy.is_allowed("read_file"));
        assert!(!policy.is_allowed("write_file"));
    }
}
