//! Pending payloads waiting to be mined

use indexmap::IndexSet;

/// Insertion-ordered set of payloads that are not yet on the chain
#[derive(Debug, Default, Clone)]
pub struct Mempool {
    pending: IndexSet<Vec<u8>>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the payload was already pending
    pub fn insert(&mut self, data: Vec<u8>) -> bool {
        self.pending.insert(data)
    }

    pub fn remove(&mut self, data: &[u8]) -> bool {
        self.pending.shift_remove(data)
    }

    pub fn contains(&self, data: &[u8]) -> bool {
        self.pending.contains(data)
    }

    /// Oldest pending payload
    pub fn next(&self) -> Option<&Vec<u8>> {
        self.pending.first()
    }

    /// Keep only the payloads for which `keep` returns true
    pub fn retain(&mut self, mut keep: impl FnMut(&[u8]) -> bool) {
        self.pending.retain(|data| keep(data));
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec<u8>> {
        self.pending.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_and_dedup() {
        let mut pool = Mempool::new();
        assert!(pool.insert(b"first".to_vec()));
        assert!(pool.insert(b"second".to_vec()));
        assert!(!pool.insert(b"first".to_vec()));
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.next().map(Vec::as_slice), Some(b"first".as_slice()));

        assert!(pool.remove(b"first"));
        assert!(!pool.remove(b"first"));
        assert_eq!(pool.next().map(Vec::as_slice), Some(b"second".as_slice()));
        assert!(pool.contains(b"second"));
    }
}
