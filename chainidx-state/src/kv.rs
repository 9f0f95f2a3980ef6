//! A thin ordered-byte-map adapter over a single [`sled::Tree`].
//!
//! This is the whole storage engine's contact surface with sled: every
//! other module in this crate only ever calls through [`Kv`].

use sled::Tree;

use crate::error::{Result, StorageError};

/// Multi-key operations above this many keys are fanned out across worker
/// threads rather than applied key-by-key on the calling thread.
const PARALLEL_BATCH_THRESHOLD: usize = 500;

/// The chunk size `get_multi` partitions its keys into per worker thread.
const GET_MULTI_CHUNK: usize = 128;

/// An ordered byte-keyed map backed by a sled tree.
#[derive(Clone)]
pub struct Kv {
    tree: Tree,
}

impl Kv {
    pub fn new(tree: Tree) -> Kv {
        Kv { tree }
    }

    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<Option<Vec<u8>>> {
        Ok(self.tree.get(key)?.map(|ivec| ivec.to_vec()))
    }

    pub fn put(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        self.tree.insert(key, value.as_ref())?;
        Ok(())
    }

    pub fn delete(&self, key: impl AsRef<[u8]>) -> Result<()> {
        self.tree.remove(key)?;
        Ok(())
    }

    /// Upserts every `(key, value)` pair. Large batches are partitioned into
    /// sub-batches and applied from a scoped thread pool; sled's tree
    /// structure tolerates concurrent writers without additional locking.
    pub fn put_multi(&self, entries: Vec<(Vec<u8>, Vec<u8>)>) -> Result<()> {
        if entries.len() < PARALLEL_BATCH_THRESHOLD {
            let mut batch = sled::Batch::default();
            for (key, value) in entries {
                batch.insert(key, value);
            }
            self.tree.apply_batch(batch)?;
            return Ok(());
        }

        let chunk_size = entries.len() / num_workers(entries.len());
        let errors: Vec<sled::Error> = std::thread::scope(|scope| {
            entries
                .chunks(chunk_size.max(1))
                .map(|chunk| {
                    let tree = &self.tree;
                    scope.spawn(move || {
                        let mut batch = sled::Batch::default();
                        for (key, value) in chunk {
                            batch.insert(key.as_slice(), value.as_slice());
                        }
                        tree.apply_batch(batch)
                    })
                })
                .collect::<Vec<_>>()
                .into_iter()
                .filter_map(|handle| handle.join().expect("writer thread panicked").err())
                .collect()
        });

        match errors.into_iter().next() {
            Some(e) => Err(StorageError::Io(e)),
            None => Ok(()),
        }
    }

    /// Fetches every key, preserving input order. Internally partitioned
    /// across worker threads in chunks of [`GET_MULTI_CHUNK`].
    pub fn get_multi(&self, keys: Vec<Vec<u8>>) -> Result<Vec<Option<Vec<u8>>>> {
        if keys.len() < GET_MULTI_CHUNK {
            return keys.iter().map(|k| self.get(k)).collect();
        }

        std::thread::scope(|scope| {
            let handles: Vec<_> = keys
                .chunks(GET_MULTI_CHUNK)
                .map(|chunk| {
                    let tree = &self.tree;
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|k| tree.get(k).map(|v| v.map(|ivec| ivec.to_vec())))
                            .collect::<std::result::Result<Vec<_>, sled::Error>>()
                    })
                })
                .collect();

            let mut out = Vec::with_capacity(keys.len());
            for handle in handles {
                out.extend(handle.join().expect("reader thread panicked")?);
            }
            Ok(out)
        })
    }

    /// Removes every key. Large batches are partitioned the same way as
    /// [`Kv::put_multi`].
    pub fn delete_multi(&self, keys: Vec<Vec<u8>>) -> Result<()> {
        if keys.len() < PARALLEL_BATCH_THRESHOLD {
            let mut batch = sled::Batch::default();
            for key in keys {
                batch.remove(key);
            }
            self.tree.apply_batch(batch)?;
            return Ok(());
        }

        let chunk_size = keys.len() / num_workers(keys.len());
        let errors: Vec<sled::Error> = std::thread::scope(|scope| {
            keys.chunks(chunk_size.max(1))
                .map(|chunk| {
                    let tree = &self.tree;
                    scope.spawn(move || {
                        let mut batch = sled::Batch::default();
                        for key in chunk {
                            batch.remove(key.as_slice());
                        }
                        tree.apply_batch(batch)
                    })
                })
                .collect::<Vec<_>>()
                .into_iter()
                .filter_map(|handle| handle.join().expect("writer thread panicked").err())
                .collect()
        });

        match errors.into_iter().next() {
            Some(e) => Err(StorageError::Io(e)),
            None => Ok(()),
        }
    }

    /// Visits every `(key, value)` pair whose key starts with `prefix`, in
    /// lexicographic order.
    pub fn scan_prefix(&self, prefix: impl AsRef<[u8]>) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        self.tree
            .scan_prefix(prefix)
            .map(|item| item.map(|(k, v)| (k.to_vec(), v.to_vec())))
            .collect::<std::result::Result<Vec<_>, sled::Error>>()
            .map_err(StorageError::Io)
    }
}

/// Caps worker fan-out at 8 threads; sled's write path is the bottleneck
/// well before thread count becomes one.
fn num_workers(len: usize) -> usize {
    (len / PARALLEL_BATCH_THRESHOLD).clamp(1, 8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_kv() -> Kv {
        let db = sled::Config::new().temporary(true).open().unwrap();
        Kv::new(db.open_tree(b"test").unwrap())
    }

    #[test]
    fn put_then_get_roundtrips() {
        let kv = test_kv();
        kv.put(b"hello", b"world").unwrap();
        assert_eq!(kv.get(b"hello").unwrap(), Some(b"world".to_vec()));
    }

    #[test]
    fn missing_key_is_not_an_error() {
        let kv = test_kv();
        assert_eq!(kv.get(b"missing").unwrap(), None);
    }

    #[test]
    fn delete_is_noop_when_absent() {
        let kv = test_kv();
        kv.delete(b"missing").unwrap();
    }

    #[test]
    fn put_multi_above_threshold_matches_serial_puts() {
        let kv = test_kv();
        let entries: Vec<_> = (0..600u32)
            .map(|i| (i.to_be_bytes().to_vec(), i.to_le_bytes().to_vec()))
            .collect();
        kv.put_multi(entries.clone()).unwrap();
        for (k, v) in entries {
            assert_eq!(kv.get(&k).unwrap(), Some(v));
        }
    }

    #[test]
    fn get_multi_preserves_order() {
        let kv = test_kv();
        let keys: Vec<Vec<u8>> = (0..300u32).map(|i| i.to_be_bytes().to_vec()).collect();
        for k in &keys {
            kv.put(k, k).unwrap();
        }
        let values = kv.get_multi(keys.clone()).unwrap();
        for (key, value) in keys.iter().zip(values) {
            assert_eq!(value.as_deref(), Some(key.as_slice()));
        }
    }

    #[test]
    fn scan_prefix_stops_at_boundary() {
        let kv = test_kv();
        kv.put(b"abc1", b"1").unwrap();
        kv.put(b"abc2", b"2").unwrap();
        kv.put(b"abd1", b"3").unwrap();
        let scanned = kv.scan_prefix(b"abc").unwrap();
        assert_eq!(scanned.len(), 2);
    }
}
