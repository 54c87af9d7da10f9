//! Dedup-and-index service for graph-reachable scene items
//!
//! A collector walks a set of roots through an expansion function,
//! de-duplicates everything reached, and assigns each distinct item a dense
//! 0-based index that stays stable until the next commit. Bundles snapshot
//! the committed contents so a later pass can ask "did this set change?"
//! without keeping the items themselves alive.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

/// Opaque snapshot of a collector's committed contents.
///
/// Captures item identities in committed order; compared against the live
/// collector by [`Collector::needs_update`].
#[derive(Debug, Clone)]
pub struct Bundle<K> {
    items: Vec<K>,
}

/// Builds a dense index over the distinct items reachable from a set of
/// roots.
///
/// Items are identity handles (arena ids), not the entities themselves.
/// Iteration order after [`commit`](Collector::commit) is the order writers
/// serialize in, so indices and buffer positions always agree.
#[derive(Debug, Default)]
pub struct Collector<K> {
    working: BTreeSet<K>,
    committed: Vec<K>,
    indices: HashMap<K, u32>,
}

impl<K: Copy + Ord + Hash> Collector<K> {
    pub fn new() -> Self {
        Self {
            working: BTreeSet::new(),
            committed: Vec::new(),
            indices: HashMap::new(),
        }
    }

    /// Drop all working and committed state.
    pub fn clear(&mut self) {
        self.working.clear();
        self.committed.clear();
        self.indices.clear();
    }

    /// Expand each root into its reachable item set and accumulate the
    /// union into the working set.
    ///
    /// `expand` writes every item reachable from the root into the sink; it
    /// may walk secondary structures (e.g. transitive material
    /// dependencies). Repeated items are absorbed by the set.
    pub fn collect<R>(
        &mut self,
        roots: impl IntoIterator<Item = R>,
        mut expand: impl FnMut(R, &mut BTreeSet<K>),
    ) {
        for root in roots {
            expand(root, &mut self.working);
        }
    }

    /// Freeze the working set into an ordered sequence and assign each item
    /// a contiguous 0-based index, stable until the next commit.
    pub fn commit(&mut self) {
        self.committed = std::mem::take(&mut self.working).into_iter().collect();
        self.indices = self
            .committed
            .iter()
            .enumerate()
            .map(|(i, &k)| (k, i as u32))
            .collect();
    }

    /// Number of committed items.
    pub fn num_items(&self) -> usize {
        self.committed.len()
    }

    /// Iterate committed items in index order.
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.committed.iter().copied()
    }

    /// Dense index of a committed item, if present.
    pub fn index_of(&self, item: &K) -> Option<u32> {
        self.indices.get(item).copied()
    }

    /// Snapshot the committed contents for later change detection.
    pub fn create_bundle(&self) -> Bundle<K> {
        Bundle {
            items: self.committed.clone(),
        }
    }

    /// True iff the committed set differs from `bundle` in membership or
    /// order, or any current item reports dirty.
    pub fn needs_update(&self, bundle: &Bundle<K>, is_dirty: impl Fn(K) -> bool) -> bool {
        if bundle.items != self.committed {
            return true;
        }
        self.committed.iter().any(|&k| is_dirty(k))
    }

    /// Apply a side effect to every committed item (used to clear dirty
    /// bits after a successful pass).
    pub fn finalize(&self, mut f: impl FnMut(K)) {
        for &k in &self.committed {
            f(k);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn committed(items: &[u32]) -> Collector<u32> {
        let mut c = Collector::new();
        c.collect(items.iter().copied(), |item, out| {
            out.insert(item);
        });
        c.commit();
        c
    }

    #[test]
    fn test_collect_deduplicates_and_indexes() {
        let c = committed(&[5, 3, 5, 7, 3]);

        assert_eq!(c.num_items(), 3);
        assert_eq!(c.index_of(&3), Some(0));
        assert_eq!(c.index_of(&5), Some(1));
        assert_eq!(c.index_of(&7), Some(2));
        assert_eq!(c.index_of(&9), None);
    }

    #[test]
    fn test_iteration_matches_indices() {
        let c = committed(&[9, 1, 4]);

        for (pos, item) in c.iter().enumerate() {
            assert_eq!(c.index_of(&item), Some(pos as u32));
        }
    }

    #[test]
    fn test_expansion_accumulates_union() {
        let mut c = Collector::new();
        // Each root expands into itself plus a dependency.
        c.collect([10u32, 20].into_iter(), |root, out| {
            out.insert(root);
            out.insert(root + 1);
        });
        c.collect([20u32].into_iter(), |root, out| {
            out.insert(root);
        });
        c.commit();

        assert_eq!(c.num_items(), 4); // 10, 11, 20, 21
    }

    #[test]
    fn test_bundle_detects_membership_change() {
        let c = committed(&[1, 2]);
        let bundle = c.create_bundle();
        assert!(!c.needs_update(&bundle, |_| false));

        let grown = committed(&[1, 2, 3]);
        assert!(grown.needs_update(&bundle, |_| false));
    }

    #[test]
    fn test_bundle_detects_dirty_items() {
        let c = committed(&[1, 2]);
        let bundle = c.create_bundle();

        assert!(c.needs_update(&bundle, |k| k == 2));
        assert!(!c.needs_update(&bundle, |_| false));
    }

    #[test]
    fn test_clear_drops_state() {
        let mut c = committed(&[1, 2]);
        c.clear();
        assert_eq!(c.num_items(), 0);
        assert_eq!(c.index_of(&1), None);
    }

    #[test]
    fn test_finalize_visits_every_item() {
        let c = committed(&[4, 8, 15]);
        let mut seen = Vec::new();
        c.finalize(|k| seen.push(k));
        assert_eq!(seen, vec![4, 8, 15]);
    }
}
