use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredEntry {
    pub text: String,
    pub weight: u64,
}

// Ordered so that the better-ranked candidate compares as `Less`: higher
// weight first, then lexicographically smaller text.
#[derive(Debug, PartialEq, Eq)]
struct Candidate<'a> {
    weight: u64,
    text: &'a str,
}

impl Ord for Candidate<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .weight
            .cmp(&self.weight)
            .then_with(|| self.text.cmp(other.text))
    }
}

impl PartialOrd for Candidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Best `k` entries of `matches`, best first.
///
/// Keeps a max-heap of at most `k` candidates whose top is the worst one
/// retained, so each match costs O(log k).
pub fn top_k(matches: &HashMap<String, u64>, k: usize) -> Vec<ScoredEntry> {
    if k == 0 || matches.is_empty() {
        return Vec::new();
    }

    // `k` may come from a client, so never size the heap by it alone.
    let mut heap: BinaryHeap<Candidate<'_>> =
        BinaryHeap::with_capacity(k.min(matches.len()).saturating_add(1));
    for (text, &weight) in matches {
        let candidate = Candidate { weight, text };
        if heap.len() < k {
            heap.push(candidate);
        } else if heap.peek().is_some_and(|worst| candidate < *worst) {
            heap.pop();
            heap.push(candidate);
        }
    }

    heap.into_sorted_vec()
        .into_iter()
        .map(|c| ScoredEntry {
            text: c.text.to_string(),
            weight: c.weight,
        })
        .collect()
}
