use std::collections::HashSet;
use std::sync::Mutex;
use url::Url;

/// The set of canonical URLs already accepted during one crawl run
///
/// The set only grows. It is the single serialization point that keeps a URL
/// from being crawled twice, so it lives for exactly one run and is never
/// shared between runs.
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically inserts a canonical URL
    ///
    /// Returns `true` only for the first caller to insert this URL; every later
    /// (or concurrent) caller gets `false`.
    pub fn mark_visited(&self, url: &Url) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        seen.insert(url.as_str().to_string())
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_first_insert_wins() {
        let visited = VisitedSet::new();
        let url = Url::parse("https://a.test/").unwrap();

        assert!(visited.mark_visited(&url));
        assert!(!visited.mark_visited(&url));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_concurrent_marks_single_winner() {
        let visited = Arc::new(VisitedSet::new());
        let winners = Arc::new(AtomicUsize::new(0));
        let url = Url::parse("https://a.test/contended").unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let visited = Arc::clone(&visited);
                let winners = Arc::clone(&winners);
                let url = url.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        if visited.mark_visited(&url) {
                            winners.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert_eq!(visited.len(), 1);
    }
}
