use std::collections::{HashSet, VecDeque};

/// Fixed-capacity pool of integer identifiers `0..capacity`.
///
/// Ids come back out in the order they were released, oldest first.
#[derive(Debug, Clone)]
pub struct IdPool {
    capacity: u32,
    available: VecDeque<u32>,
    held: HashSet<u32>,
}

impl IdPool {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            available: (0..capacity).collect(),
            held: HashSet::with_capacity(capacity as usize),
        }
    }

    /// Checks out a free id, or `None` when every id is held.
    pub fn acquire(&mut self) -> Option<u32> {
        let id = self.available.pop_front()?;
        self.held.insert(id);
        Some(id)
    }

    /// Ids outside the pool are never free.
    pub fn is_free(&self, id: u32) -> bool {
        id < self.capacity && !self.held.contains(&id)
    }

    /// Returns a held id to the pool. Releasing an id that is not held does nothing.
    pub fn release(&mut self, id: u32) {
        if self.held.remove(&id) {
            self.available.push_back(id);
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn in_use(&self) -> usize {
        self.held.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausts_at_capacity() {
        let mut pool = IdPool::new(3);
        assert_eq!(pool.acquire(), Some(0));
        assert_eq!(pool.acquire(), Some(1));
        assert_eq!(pool.acquire(), Some(2));
        assert_eq!(pool.acquire(), None);
        assert_eq!(pool.in_use(), 3);
    }

    #[test]
    fn release_makes_id_available_again() {
        let mut pool = IdPool::new(2);
        let a = pool.acquire().unwrap();
        let _b = pool.acquire().unwrap();
        assert!(!pool.is_free(a));

        pool.release(a);
        assert!(pool.is_free(a));
        assert_eq!(pool.acquire(), Some(a));
    }

    #[test]
    fn releasing_unheld_id_is_noop() {
        let mut pool = IdPool::new(2);
        pool.release(1);
        pool.release(7);

        assert_eq!(pool.acquire(), Some(0));
        assert_eq!(pool.acquire(), Some(1));
        assert_eq!(pool.acquire(), None);
    }

    #[test]
    fn double_release_does_not_duplicate() {
        let mut pool = IdPool::new(1);
        let id = pool.acquire().unwrap();
        pool.release(id);
        pool.release(id);

        assert_eq!(pool.acquire(), Some(id));
        assert_eq!(pool.acquire(), None);
    }

    #[test]
    fn never_hands_out_a_held_id() {
        let mut pool = IdPool::new(4);
        let mut seen = HashSet::new();
        while let Some(id) = pool.acquire() {
            assert!(seen.insert(id));
        }
        assert_eq!(seen.len(), 4);
        assert!(!pool.is_free(4));
    }

    #[test]
    fn empty_pool() {
        let mut pool = IdPool::new(0);
        assert_eq!(pool.acquire(), None);
        assert!(!pool.is_free(0));
    }
}
