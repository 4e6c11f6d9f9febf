use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
struct Node {
    children: HashMap<char, Node>,
    // Every entry whose text runs through this node, with its cumulative weight.
    entry_weights: HashMap<String, u64>,
}

/// Character-keyed prefix index.
///
/// Each node keeps the weights of every entry passing through it, so a
/// lookup is a walk of the prefix and nothing more.
#[derive(Debug, Default, Clone)]
pub struct PrefixIndex {
    root: Node,
    // Cumulative weight per distinct entry. The root's own map stays empty,
    // so the empty prefix matches nothing.
    totals: HashMap<String, u64>,
    node_count: usize,
}

impl PrefixIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `weight` to `entry` at every node along its path.
    pub fn insert(&mut self, entry: &str, weight: u64) {
        let Self {
            root,
            totals,
            node_count,
        } = self;
        add_weight(totals, entry, weight);

        let mut node = root;
        for ch in entry.chars() {
            node = node.children.entry(ch).or_insert_with(|| {
                *node_count += 1;
                Node::default()
            });
            add_weight(&mut node.entry_weights, entry, weight);
        }
    }

    /// Entries that start with `prefix`, with their weights. Unknown and empty
    /// prefixes yield an empty map.
    pub fn lookup(&self, prefix: &str) -> &HashMap<String, u64> {
        static EMPTY: std::sync::OnceLock<HashMap<String, u64>> = std::sync::OnceLock::new();

        let mut node = &self.root;
        for ch in prefix.chars() {
            match node.children.get(&ch) {
                Some(child) => node = child,
                None => return EMPTY.get_or_init(HashMap::new),
            }
        }
        &node.entry_weights
    }

    pub fn weight(&self, entry: &str) -> Option<u64> {
        self.totals.get(entry).copied()
    }

    /// Number of distinct entries.
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Nodes below the root.
    pub fn node_count(&self) -> usize {
        self.node_count
    }
}

fn add_weight(weights: &mut HashMap<String, u64>, entry: &str, weight: u64) {
    match weights.get_mut(entry) {
        Some(total) => *total = total.saturating_add(weight),
        None => {
            weights.insert(entry.to_string(), weight);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_prefix_sees_the_entry() {
        let mut index = PrefixIndex::new();
        index.insert("island", 3);

        for end in 1..="island".len() {
            let matches = index.lookup(&"island"[..end]);
            assert_eq!(matches.get("island"), Some(&3), "prefix {}", &"island"[..end]);
        }
        assert_eq!(index.node_count(), 6);
    }

    #[test]
    fn unknown_prefix_is_empty() {
        let mut index = PrefixIndex::new();
        index.insert("ironman", 2);

        assert!(index.lookup("ix").is_empty());
        assert!(index.lookup("ironmen").is_empty());
        assert!(index.lookup("z").is_empty());
    }

    #[test]
    fn weights_accumulate_across_inserts() {
        let mut index = PrefixIndex::new();
        index.insert("i love you", 5);
        for _ in 0..4 {
            index.insert("i love you", 1);
        }

        assert_eq!(index.weight("i love you"), Some(9));
        assert_eq!(index.lookup("i lo").get("i love you"), Some(&9));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn shared_prefixes_share_nodes() {
        let mut index = PrefixIndex::new();
        index.insert("ab", 1);
        index.insert("ac", 1);

        assert_eq!(index.node_count(), 3);
        let under_a = index.lookup("a");
        assert_eq!(under_a.len(), 2);
        assert_eq!(index.lookup("ab").len(), 1);
    }

    #[test]
    fn entries_only_live_under_their_own_prefixes() {
        let mut index = PrefixIndex::new();
        index.insert("island", 3);
        index.insert("ironman", 2);

        assert!(index.lookup("is").keys().all(|entry| entry.starts_with("is")));
        assert!(!index.lookup("ir").contains_key("island"));
    }

    #[test]
    fn empty_entry_is_counted_but_never_matched() {
        let mut index = PrefixIndex::new();
        index.insert("", 1);
        index.insert("", 1);

        assert_eq!(index.weight(""), Some(2));
        assert_eq!(index.node_count(), 0);
        assert!(!index.is_empty());
        assert!(index.lookup("a").is_empty());
        assert!(index.lookup("").is_empty());
    }

    #[test]
    fn empty_prefix_matches_nothing() {
        let mut index = PrefixIndex::new();
        assert!(index.is_empty());
        index.insert("island", 3);
        index.insert("ironman", 2);

        assert!(index.lookup("").is_empty());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn weights_saturate() {
        let mut index = PrefixIndex::new();
        index.insert("max", u64::MAX);
        index.insert("max", 1);

        assert_eq!(index.weight("max"), Some(u64::MAX));
    }

    #[test]
    fn multibyte_characters_walk_by_char() {
        let mut index = PrefixIndex::new();
        index.insert("你好世界", 4);

        assert_eq!(index.lookup("你").get("你好世界"), Some(&4));
        assert_eq!(index.lookup("你好").len(), 1);
        assert_eq!(index.node_count(), 4);
    }
}
