//! Case-insensitive prefix tree over medicine names.

use std::collections::BTreeMap;

/// Default cap on autocomplete results.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 10;

#[derive(Debug, Default, Clone)]
struct TrieNode {
    /// Ordered so traversal yields names lexicographically
    children: BTreeMap<char, TrieNode>,
    terminal: bool,
}

/// Prefix tree of lower-cased medicine names.
///
/// Deletion is not supported; rebuild from the catalog instead.
#[derive(Debug, Default, Clone)]
pub struct MedicineTrie {
    root: TrieNode,
    len: usize,
}

impl MedicineTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a trie from a whole catalog.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut trie = Self::new();
        for name in names {
            trie.insert(name.as_ref());
        }
        trie
    }

    /// Insert a name (lower-cased). Returns `false` if it was already present.
    pub fn insert(&mut self, name: &str) -> bool {
        let mut node = &mut self.root;
        for ch in name.to_lowercase().chars() {
            node = node.children.entry(ch).or_default();
        }
        if node.terminal {
            return false;
        }
        node.terminal = true;
        self.len += 1;
        true
    }

    /// Whether the exact name (case-insensitive) is indexed.
    pub fn contains(&self, name: &str) -> bool {
        self.find(&name.to_lowercase())
            .map_or(false, |node| node.terminal)
    }

    /// Up to `limit` names starting with `prefix`, in lexicographic order.
    ///
    /// An empty prefix matches every name.
    pub fn search_by_prefix(&self, prefix: &str, limit: usize) -> Vec<String> {
        let prefix = prefix.to_lowercase();
        let mut results = Vec::new();
        if limit == 0 {
            return results;
        }
        if let Some(node) = self.find(&prefix) {
            let mut buffer = prefix;
            collect(node, &mut buffer, &mut results, limit);
        }
        results
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn find(&self, lowered: &str) -> Option<&TrieNode> {
        let mut node = &self.root;
        for ch in lowered.chars() {
            node = node.children.get(&ch)?;
        }
        Some(node)
    }
}

fn collect(node: &TrieNode, buffer: &mut String, results: &mut Vec<String>, limit: usize) {
    if node.terminal {
        results.push(buffer.clone());
    }
    for (ch, child) in &node.children {
        if results.len() >= limit {
            return;
        }
        buffer.push(*ch);
        collect(child, buffer, results, limit);
        buffer.pop();
    }
}
