use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use lru::LruCache;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::FetchResult;
use crate::sources::{extract_paragraphs, PageFetcher};

/// Write-once slot; concurrent callers for the same URL wait on the first fill
type Slot = Arc<OnceLock<FetchResult>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Settled entries are bounded by the LRU; loads still running sit in
/// `in_flight` and take no capacity until their result is known.
struct Table {
    entries: LruCache<String, Slot>,
    in_flight: HashMap<String, Slot>,
}

enum Lookup {
    Cached(Slot),
    Pending(Slot),
}

/// Memoizes fetch + paragraph extraction per exact URL string, bounded by
/// capacity with least-recently-used eviction. Entries are never updated in
/// place; a URL is only fetched again after its entry has been evicted, or
/// after a failure when failures are not cached.
pub struct FetchCache<F: PageFetcher> {
    fetcher: F,
    table: Mutex<Table>,
    cache_failures: bool,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<F: PageFetcher> FetchCache<F> {
    pub fn new(fetcher: F, capacity: NonZeroUsize, cache_failures: bool) -> Self {
        Self {
            fetcher,
            table: Mutex::new(Table {
                entries: LruCache::new(capacity),
                in_flight: HashMap::new(),
            }),
            cache_failures,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Return the article text for `url`, fetching and extracting it on a miss
    pub fn get_or_fetch(&self, url: &str) -> FetchResult {
        match self.lookup(url) {
            Lookup::Cached(slot) => slot.get_or_init(|| self.load(url)).clone(),
            Lookup::Pending(slot) => {
                let result = slot.get_or_init(|| self.load(url)).clone();
                self.settle(url, &slot, &result);
                result
            }
        }
    }

    /// Whether `url` has a settled entry, without touching its recency
    pub fn contains(&self, url: &str) -> bool {
        self.lock().entries.contains(url)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.lock().entries.cap()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    fn lookup(&self, url: &str) -> Lookup {
        let mut table = self.lock();

        if let Some(slot) = table.entries.get(url) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(%url, "Cache hit");
            return Lookup::Cached(Arc::clone(slot));
        }

        if let Some(slot) = table.in_flight.get(url) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(%url, "Joining in-flight fetch");
            return Lookup::Pending(Arc::clone(slot));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let slot: Slot = Arc::new(OnceLock::new());
        table.in_flight.insert(url.to_string(), Arc::clone(&slot));
        Lookup::Pending(slot)
    }

    /// Move a finished load out of `in_flight`. The first caller to get here
    /// does the move; a failure is dropped unless failures are cached.
    fn settle(&self, url: &str, slot: &Slot, result: &FetchResult) {
        let mut table = self.lock();

        if !table
            .in_flight
            .get(url)
            .is_some_and(|pending| Arc::ptr_eq(pending, slot))
        {
            return;
        }
        table.in_flight.remove(url);

        if result.is_err() && !self.cache_failures {
            debug!(%url, "Failed fetch not cached");
            return;
        }

        if let Some((evicted, _)) = table.entries.push(url.to_string(), Arc::clone(slot)) {
            if evicted != url {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(%evicted, "Evicted least recently used entry");
            }
        }
    }

    fn load(&self, url: &str) -> FetchResult {
        let html = self.fetcher.fetch(url)?;
        let article = extract_paragraphs(&html);
        info!(%url, html_bytes = html.len(), article_bytes = article.len(), "Extracted article");
        Ok(article)
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        // A poisoned table is still structurally valid
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FetchFailure;
    use crate::sources::traits::MockPageFetcher;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn capacity(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_success_is_extracted_and_cached() {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|url: &str| url == "https://example.test/a")
            .times(1)
            .returning(|_| Ok("<p>A</p><p>B</p>".to_string()));

        let cache = FetchCache::new(fetcher, capacity(4), true);

        assert_eq!(cache.get_or_fetch("https://example.test/a"), Ok("AB".to_string()));
        assert_eq!(cache.get_or_fetch("https://example.test/a"), Ok("AB".to_string()));
        assert_eq!(
            cache.stats(),
            CacheStats {
                entries: 1,
                hits: 1,
                misses: 1,
                evictions: 0
            }
        );
    }

    #[test]
    fn test_failure_is_cached_like_success() {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Err(FetchFailure::HttpStatus(404)));

        let cache = FetchCache::new(fetcher, capacity(4), true);

        assert_eq!(
            cache.get_or_fetch("https://example.test/missing"),
            Err(FetchFailure::HttpStatus(404))
        );
        assert_eq!(
            cache.get_or_fetch("https://example.test/missing"),
            Err(FetchFailure::HttpStatus(404))
        );
    }

    #[test]
    fn test_failure_bypasses_cache_when_disabled() {
        let mut fetcher = MockPageFetcher::new();
        let mut seq = mockall::Sequence::new();
        fetcher
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(FetchFailure::Timeout));
        fetcher
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok("<p>Recovered</p>".to_string()));

        let cache = FetchCache::new(fetcher, capacity(4), false);

        assert_eq!(cache.get_or_fetch("https://example.test/flaky"), Err(FetchFailure::Timeout));
        assert!(!cache.contains("https://example.test/flaky"));
        assert_eq!(
            cache.get_or_fetch("https://example.test/flaky"),
            Ok("Recovered".to_string())
        );
        assert!(cache.contains("https://example.test/flaky"));
    }

    #[test]
    fn test_uncached_failure_does_not_evict_good_entries() {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|url: &str| url == "https://example.test/bad")
            .times(2)
            .returning(|_| Err(FetchFailure::HttpStatus(500)));
        fetcher
            .expect_fetch()
            .withf(|url: &str| url != "https://example.test/bad")
            .times(2)
            .returning(|url| Ok(format!("<p>{}</p>", url)));

        let cache = FetchCache::new(fetcher, capacity(2), false);

        assert!(cache.get_or_fetch("https://example.test/a").is_ok());
        assert!(cache.get_or_fetch("https://example.test/b").is_ok());
        for _ in 0..2 {
            assert_eq!(
                cache.get_or_fetch("https://example.test/bad"),
                Err(FetchFailure::HttpStatus(500))
            );
        }

        assert!(cache.contains("https://example.test/a"));
        assert!(cache.contains("https://example.test/b"));
        assert!(!cache.contains("https://example.test/bad"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_cached_failure_takes_a_slot() {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|url: &str| url == "https://example.test/bad")
            .times(1)
            .returning(|_| Err(FetchFailure::HttpStatus(500)));
        fetcher
            .expect_fetch()
            .withf(|url: &str| url != "https://example.test/bad")
            .times(2)
            .returning(|url| Ok(format!("<p>{}</p>", url)));

        let cache = FetchCache::new(fetcher, capacity(2), true);

        assert!(cache.get_or_fetch("https://example.test/a").is_ok());
        assert!(cache.get_or_fetch("https://example.test/b").is_ok());
        assert!(cache.get_or_fetch("https://example.test/bad").is_err());

        assert!(!cache.contains("https://example.test/a"));
        assert!(cache.contains("https://example.test/bad"));
        assert_eq!(cache.stats().evictions, 1);
    }

    struct PanicOnceFetcher {
        calls: AtomicUsize,
    }

    impl PageFetcher for PanicOnceFetcher {
        fn fetch(&self, _url: &str) -> FetchResult {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("connection handler blew up");
            }
            Ok("<p>second try</p>".to_string())
        }
    }

    #[test]
    fn test_panicking_load_is_retried_and_settled() {
        let cache = FetchCache::new(
            PanicOnceFetcher {
                calls: AtomicUsize::new(0),
            },
            capacity(2),
            true,
        );

        let first = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            cache.get_or_fetch("https://example.test/a")
        }));
        assert!(first.is_err());
        assert!(!cache.contains("https://example.test/a"));

        assert_eq!(
            cache.get_or_fetch("https://example.test/a"),
            Ok("second try".to_string())
        );
        assert!(cache.contains("https://example.test/a"));
        assert_eq!(cache.fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_least_recently_used_entry_is_evicted() {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|url: &str| url == "https://example.test/1")
            .times(1)
            .returning(|_| Ok("<p>1</p>".to_string()));
        fetcher
            .expect_fetch()
            .withf(|url: &str| url == "https://example.test/2")
            .times(2)
            .returning(|_| Ok("<p>2</p>".to_string()));
        fetcher
            .expect_fetch()
            .withf(|url: &str| url == "https://example.test/3")
            .times(1)
            .returning(|_| Ok("<p>3</p>".to_string()));

        let cache = FetchCache::new(fetcher, capacity(2), true);

        assert!(cache.get_or_fetch("https://example.test/1").is_ok());
        assert!(cache.get_or_fetch("https://example.test/2").is_ok());
        // Touch 1 so that 2 becomes the least recently used
        assert!(cache.get_or_fetch("https://example.test/1").is_ok());
        assert!(cache.get_or_fetch("https://example.test/3").is_ok());

        assert!(cache.contains("https://example.test/1"));
        assert!(!cache.contains("https://example.test/2"));
        assert!(cache.contains("https://example.test/3"));
        assert_eq!(cache.stats().evictions, 1);

        // Evicted URL is fetched again
        assert_eq!(cache.get_or_fetch("https://example.test/2"), Ok("2".to_string()));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_keys_are_not_normalized() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch().times(2).returning(|_| Ok("<p>x</p>".to_string()));

        let cache = FetchCache::new(fetcher, capacity(4), true);
        assert!(cache.get_or_fetch("https://example.test/a").is_ok());
        assert!(cache.get_or_fetch("https://example.test/a/").is_ok());

        assert_eq!(cache.len(), 2);
    }

    struct SlowCountingFetcher {
        calls: AtomicUsize,
    }

    impl PageFetcher for SlowCountingFetcher {
        fn fetch(&self, url: &str) -> FetchResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(50));
            Ok(format!("<p>{}</p>", url))
        }
    }

    #[test]
    fn test_concurrent_callers_share_one_fetch() {
        let cache = FetchCache::new(
            SlowCountingFetcher {
                calls: AtomicUsize::new(0),
            },
            capacity(8),
            true,
        );

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    assert_eq!(
                        cache.get_or_fetch("https://example.test/same"),
                        Ok("https://example.test/same".to_string())
                    );
                });
            }
        });

        assert_eq!(cache.fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_distinct_urls() {
        let cache = FetchCache::new(
            SlowCountingFetcher {
                calls: AtomicUsize::new(0),
            },
            capacity(4),
            true,
        );

        std::thread::scope(|s| {
            for i in 0..16 {
                let cache = &cache;
                s.spawn(move || {
                    let url = format!("https://example.test/{}", i);
                    assert_eq!(cache.get_or_fetch(&url), Ok(url.clone()));
                });
            }
        });

        assert_eq!(cache.len(), 4);
        assert_eq!(cache.fetcher.calls.load(Ordering::SeqCst), 16);
        assert_eq!(cache.stats().evictions, 12);
    }
}
