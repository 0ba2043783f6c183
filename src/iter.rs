//! The merging iterator algebra used to combine bundle key iterators:
//! union, intersection, chain, plus the trivial list and nil iterators
//! (spec §4.7). Every combinator yields ascending [`Key`]s.

use crate::key::{Key, MAX_KEY};

/// An ordered cursor over [`Key`]s.
pub trait BundleIter {
    fn valid(&self) -> bool;
    fn key(&self) -> Key;
    fn next(&mut self);
    fn seek(&mut self, k: Key);
}

/// Iterates an explicit sorted key slice (a loaded primitive's `Keys()`).
pub struct ListIter {
    keys: Vec<Key>,
    index: usize,
}

impl ListIter {
    pub fn new(keys: Vec<Key>) -> Self {
        ListIter { keys, index: 0 }
    }
}

impl BundleIter for ListIter {
    fn valid(&self) -> bool {
        self.index < self.keys.len()
    }

    fn key(&self) -> Key {
        self.keys[self.index]
    }

    fn next(&mut self) {
        self.index += 1;
    }

    fn seek(&mut self, k: Key) {
        self.index = match self.keys.binary_search(&k) {
            Ok(i) => i,
            Err(i) => i,
        };
    }
}

/// Always invalid; the neutral element for an empty collection.
pub struct NilIter;

impl BundleIter for NilIter {
    fn valid(&self) -> bool {
        false
    }

    fn key(&self) -> Key {
        MAX_KEY
    }

    fn next(&mut self) {}

    fn seek(&mut self, _k: Key) {}
}

/// Yields `sort(keys(children) union)`: valid iff any child is valid, the
/// emitted key is the minimum live child key, `Next` advances every child
/// at or below the current key.
pub struct Union {
    children: Vec<Box<dyn BundleIter>>,
}

impl Union {
    pub fn new(children: Vec<Box<dyn BundleIter>>) -> Self {
        Union { children }
    }

    fn min_key(&self) -> Option<Key> {
        self.children
            .iter()
            .filter(|c| c.valid())
            .map(|c| c.key())
            .min()
    }
}

impl BundleIter for Union {
    fn valid(&self) -> bool {
        self.children.iter().any(|c| c.valid())
    }

    fn key(&self) -> Key {
        self.min_key().unwrap_or(MAX_KEY)
    }

    fn next(&mut self) {
        if let Some(current) = self.min_key() {
            for child in &mut self.children {
                if child.valid() && child.key() <= current {
                    child.next();
                }
            }
        }
    }

    fn seek(&mut self, k: Key) {
        for child in &mut self.children {
            child.seek(k);
        }
    }
}

/// Yields `sort(keys(children) intersect)`: `Seek(k)` loops lifting `k` to
/// the maximum of every child's landing key and restarting any child that
/// undershot, until all children agree or one goes invalid.
pub struct Intersect {
    children: Vec<Box<dyn BundleIter>>,
    valid: bool,
}

impl Intersect {
    pub fn new(children: Vec<Box<dyn BundleIter>>) -> Self {
        let mut it = Intersect {
            children,
            valid: false,
        };
        it.seek(Key::new(0));
        it
    }
}

impl BundleIter for Intersect {
    fn valid(&self) -> bool {
        self.valid
    }

    fn key(&self) -> Key {
        if self.valid {
            self.children[0].key()
        } else {
            MAX_KEY
        }
    }

    fn next(&mut self) {
        if self.valid {
            let current = self.key();
            self.seek(current.next());
        }
    }

    fn seek(&mut self, mut target: Key) {
        if self.children.is_empty() {
            self.valid = false;
            return;
        }
        loop {
            for child in &mut self.children {
                child.seek(target);
            }
            if self.children.iter().any(|c| !c.valid()) {
                self.valid = false;
                return;
            }
            let landed = self.children.iter().map(|c| c.key()).max().unwrap();
            if self.children.iter().all(|c| c.key() == landed) {
                self.valid = true;
                return;
            }
            target = landed;
        }
    }
}

/// Concatenates disjoint ascending children: advances through them as
/// each goes invalid, assuming `max(children[i]) < min(children[i+1])`.
/// Generic over the children's borrow lifetime so it can chain iterators
/// that borrow from a `Bundle` (e.g. a timeline's past-map iterator)
/// alongside owned ones.
pub struct Chain<'i> {
    children: Vec<Box<dyn BundleIter + 'i>>,
    index: usize,
}

impl<'i> Chain<'i> {
    pub fn new(children: Vec<Box<dyn BundleIter + 'i>>) -> Self {
        let mut it = Chain { children, index: 0 };
        it.skip_exhausted();
        it
    }

    fn skip_exhausted(&mut self) {
        while self.index < self.children.len() && !self.children[self.index].valid() {
            self.index += 1;
        }
    }
}

impl<'i> BundleIter for Chain<'i> {
    fn valid(&self) -> bool {
        self.index < self.children.len()
    }

    fn key(&self) -> Key {
        self.children[self.index].key()
    }

    fn next(&mut self) {
        if self.valid() {
            self.children[self.index].next();
            self.skip_exhausted();
        }
    }

    fn seek(&mut self, k: Key) {
        for child in &mut self.children {
            child.seek(k);
        }
        self.index = 0;
        self.skip_exhausted();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(keys: &[u64]) -> Box<dyn BundleIter> {
        Box::new(ListIter::new(keys.iter().map(|&k| Key::new(k)).collect()))
    }

    fn collect(mut it: Box<dyn BundleIter>) -> Vec<u64> {
        let mut out = Vec::new();
        while it.valid() {
            out.push(it.key().0);
            it.next();
        }
        out
    }

    #[test]
    fn union_merges_sorted() {
        let a = list(&[2, 4, 6]);
        let b = list(&[1, 4, 5]);
        let u = Box::new(Union::new(vec![a, b]));
        assert_eq!(collect(u), vec![1, 2, 4, 5, 6]);
    }

    #[test]
    fn union_of_three_maps_matches_scenario() {
        let a = list(&[2, 4, 6, 8, 10, 12, 14, 16, 18]);
        let b = list(&[10, 12, 14, 16, 18, 20, 22, 24, 26, 28]);
        let c = list(&[0]);
        let mut u = Union::new(vec![Box::new(ListIter::new(c_keys())), a, b]);
        u.seek(Key::new(0));
        let out = collect(Box::new(u));
        let expected: Vec<u64> = (0..=28).step_by(2).collect();
        assert_eq!(out, expected);
        assert_eq!(out.len(), 15);
    }

    fn c_keys() -> Vec<Key> {
        vec![Key::new(0)]
    }

    #[test]
    fn intersect_finds_common_keys() {
        let a = list(&[1, 2, 3, 4, 5]);
        let b = list(&[2, 4, 6]);
        let mut it = Intersect::new(vec![a, b]);
        let mut out = Vec::new();
        while it.valid() {
            out.push(it.key().0);
            it.next();
        }
        assert_eq!(out, vec![2, 4]);
    }

    #[test]
    fn chain_concatenates_disjoint_ranges() {
        let a = list(&[1, 2, 3]);
        let b = list(&[10, 11]);
        let c = Chain::new(vec![a, b]);
        assert_eq!(collect(Box::new(c)), vec![1, 2, 3, 10, 11]);
    }

    #[test]
    fn nil_iter_is_always_invalid() {
        let n = NilIter;
        assert!(!n.valid());
    }
}
