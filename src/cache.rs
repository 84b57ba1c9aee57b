//! Caches shared by the workers of a search.
//!
//! [`MemoryCache`] remembers values keyed by [`Tuple`], such as the entropies of the pairs that
//! many triples share. [`IoCache`] remembers the contents of small sample files, for datasets
//! that arrive in blocks.

use crate::{DataMatrix, Error, Order, Result, Tuple};
use linked_hash_map::LinkedHashMap;
use parking_lot::Mutex;
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// How a [`MemoryCache`] decides what to forget.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum CachePolicy {
    /// A fixed array of slots indexed by the key's hash. A new entry overwrites whatever shared
    /// its slot. Lookups never block each other unless they land in the same slot.
    #[default]
    Flat,
    /// Least-recently-used replacement behind a single lock.
    Replacing,
}

impl FromStr for CachePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "flat" => Ok(CachePolicy::Flat),
            "replacing" | "lru" => Ok(CachePolicy::Replacing),
            _ => Err(Error::config(format!("unknown cache policy {:?}", s))),
        }
    }
}

/// A snapshot of a cache's counters.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CacheStats {
    /// Lookups that found their key.
    pub hits: u64,
    /// Lookups that did not.
    pub misses: u64,
    /// Entries dropped to make room for others.
    pub evictions: u64,
    /// Entries currently stored.
    pub entries: usize,
}

impl CacheStats {
    /// The fraction of lookups that hit, or zero before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

enum Store<V> {
    Flat {
        slots: Vec<Mutex<Option<(Tuple, V)>>>,
        hasher: RandomState,
    },
    Replacing {
        entries: Mutex<LinkedHashMap<Tuple, V>>,
        capacity: usize,
    },
}

/// A bounded, thread-safe map from [`Tuple`]s to values.
///
/// ```
/// use mist::cache::{CachePolicy, MemoryCache};
/// use mist::Tuple;
///
/// let cache = MemoryCache::new(2, CachePolicy::Replacing).unwrap();
/// cache.insert(Tuple::new(&[0]), 1.0);
/// cache.insert(Tuple::new(&[1]), 2.0);
/// assert_eq!(cache.get(&Tuple::new(&[0])), Some(1.0));
///
/// // [1] is now the least recently used entry
/// cache.insert(Tuple::new(&[2]), 3.0);
/// assert_eq!(cache.get(&Tuple::new(&[1])), None);
/// assert_eq!(cache.stats().evictions, 1);
/// ```
pub struct MemoryCache<V> {
    store: Store<V>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<V> fmt::Debug for MemoryCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCache")
            .field("policy", &self.policy())
            .field("capacity", &self.capacity())
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}

impl<V: Clone> MemoryCache<V> {
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `capacity` is zero.
    pub fn new(capacity: usize, policy: CachePolicy) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::config("cache capacity must be positive"));
        }
        let store = match policy {
            CachePolicy::Flat => Store::Flat {
                slots: (0..capacity).map(|_| Mutex::new(None)).collect(),
                hasher: RandomState::new(),
            },
            CachePolicy::Replacing => Store::Replacing {
                entries: Mutex::new(LinkedHashMap::new()),
                capacity,
            },
        };
        Ok(MemoryCache {
            store,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        })
    }

    /// Looks up `key`. With [`CachePolicy::Replacing`], a hit also marks the entry as recently
    /// used.
    pub fn get(&self, key: &Tuple) -> Option<V> {
        let found = match &self.store {
            Store::Flat { slots, hasher } => match &*slots[slot(hasher, key, slots.len())].lock() {
                Some((stored, value)) if stored == key => Some(value.clone()),
                _ => None,
            },
            Store::Replacing { entries, .. } => entries.lock().get_refresh(key).map(|v| v.clone()),
        };
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Stores `value` under `key`, evicting another entry if the cache is full.
    pub fn insert(&self, key: Tuple, value: V) {
        let evicted = match &self.store {
            Store::Flat { slots, hasher } => {
                let mut slot = slots[slot(hasher, &key, slots.len())].lock();
                let evicted = matches!(&*slot, Some((stored, _)) if *stored != key);
                *slot = Some((key, value));
                evicted
            }
            Store::Replacing { entries, capacity } => {
                let mut entries = entries.lock();
                let replaced = entries.insert(key, value).is_some();
                if !replaced && entries.len() > *capacity {
                    entries.pop_front().is_some()
                } else {
                    false
                }
            }
        };
        if evicted {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl<V> MemoryCache<V> {
    /// The replacement policy.
    pub fn policy(&self) -> CachePolicy {
        match self.store {
            Store::Flat { .. } => CachePolicy::Flat,
            Store::Replacing { .. } => CachePolicy::Replacing,
        }
    }

    /// The most entries the cache will hold.
    pub fn capacity(&self) -> usize {
        match &self.store {
            Store::Flat { slots, .. } => slots.len(),
            Store::Replacing { capacity, .. } => *capacity,
        }
    }

    /// The number of entries currently stored.
    pub fn len(&self) -> usize {
        match &self.store {
            Store::Flat { slots, .. } => slots.iter().filter(|s| s.lock().is_some()).count(),
            Store::Replacing { entries, .. } => entries.lock().len(),
        }
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The current counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

fn slot(hasher: &RandomState, key: &Tuple, slots: usize) -> usize {
    (hasher.hash_one(key) % slots as u64) as usize
}

/// Entropies of sub-tuples, one cache per sub-tuple size, shared by the workers of one search.
#[derive(Debug, Default)]
pub struct EntropyCaches {
    levels: Vec<MemoryCache<f64>>,
}

impl EntropyCaches {
    /// No caching at all.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// One cache for each sub-tuple size from 1 up to `capacities.len()`, with the given
    /// capacities.
    pub fn new(policy: CachePolicy, capacities: &[usize]) -> Result<Self> {
        let levels = capacities
            .iter()
            .map(|&capacity| MemoryCache::new(capacity, policy))
            .collect::<Result<_>>()?;
        Ok(EntropyCaches { levels })
    }

    /// The cache for sub-tuples of `size` variables, if there is one.
    pub fn level(&self, size: usize) -> Option<&MemoryCache<f64>> {
        size.checked_sub(1).and_then(|i| self.levels.get(i))
    }

    /// Counters for each level, smallest sub-tuples first.
    pub fn stats(&self) -> Vec<CacheStats> {
        self.levels.iter().map(MemoryCache::stats).collect()
    }
}

/// Whether an [`IoCache`] keeps what it reads.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Temperature {
    /// Every read goes to disk.
    #[default]
    Cold,
    /// The first read of a file is kept and reused until the file is written through this cache.
    Hot,
}

/// A small block of samples, stored one sample per line.
pub type SampleBlock = DataMatrix<'static>;

/// Reads and writes sample blocks, optionally keeping them in memory.
///
/// Writes always go to disk, and a hot cache replaces its copy with what was written, so a read
/// after a write through the same cache sees the new contents.
#[derive(Debug, Default)]
pub struct IoCache {
    temperature: Temperature,
    blocks: Mutex<HashMap<PathBuf, Arc<SampleBlock>>>,
    reads: AtomicU64,
    hits: AtomicU64,
}

impl IoCache {
    /// Creates an empty cache.
    pub fn new(temperature: Temperature) -> Self {
        IoCache {
            temperature,
            ..Self::default()
        }
    }

    /// The caching mode.
    pub fn temperature(&self) -> Temperature {
        self.temperature
    }

    /// Loads the block stored at `path`.
    pub fn read<P: AsRef<Path>>(&self, path: P) -> Result<Arc<SampleBlock>> {
        let path = path.as_ref();
        if self.temperature == Temperature::Hot {
            if let Some(block) = self.blocks.lock().get(path) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Arc::clone(block));
            }
        }
        self.reads.fetch_add(1, Ordering::Relaxed);
        debug!(path = %path.display(), "reading sample block");
        let block = Arc::new(DataMatrix::from_file(path, Order::ColumnMajor)?);
        if self.temperature == Temperature::Hot {
            self.blocks
                .lock()
                .insert(path.to_path_buf(), Arc::clone(&block));
        }
        Ok(block)
    }

    /// Stores `block` at `path`, one sample per line.
    pub fn write<P: AsRef<Path>>(&self, path: P, block: &DataMatrix<'_>) -> Result<()> {
        let path = path.as_ref();
        let block = block.to_order(Order::ColumnMajor);
        block.write_file(path)?;
        let mut blocks = self.blocks.lock();
        if self.temperature == Temperature::Hot {
            blocks.insert(path.to_path_buf(), Arc::new(block));
        } else {
            blocks.remove(path);
        }
        Ok(())
    }

    /// How many reads went to disk.
    pub fn disk_reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// How many reads were answered from memory.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }
}
