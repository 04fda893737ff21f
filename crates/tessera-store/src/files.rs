//! One-file-per-key storage engine shared by the directory-backed stores.
//!
//! Layout:
//! ```text
//! <directory>/
//!     <encoded key>      one regular file per stored key
//!     .tmp/              write staging (name configurable)
//! ```
//!
//! Every write is staged as a fresh file in the temp directory and then
//! renamed over the destination, so a value file is visible under its real
//! name only once it is complete. The in-memory key index is built once on
//! open and is authoritative afterwards: a key absent from the index is
//! absent, whatever the filesystem holds.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::hash::Hash;
use std::io::{self, BufReader, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tempfile::NamedTempFile;
use tessera_types::SerializeResult;
use tracing::{debug, info, warn};

use crate::config::{DirectoryStoreConfig, SyncMode};
use crate::error::{StoreError, StoreResult};
use crate::key::{validate_file_name, KeyCodec};

/// How a stored value maps to the bytes of its file.
pub(crate) trait ValueEncoding<V>: Send + Sync {
    /// Write the whole value. Returns the number of bytes written.
    fn write(&self, out: &mut dyn Write, value: &V) -> SerializeResult<usize>;

    /// Read a whole value from the start of a file.
    fn read(&self, input: &mut dyn BufRead) -> SerializeResult<V>;

    /// Stand-in reported when the value a put or remove supersedes cannot
    /// be read. `None` leaves the key out of the result.
    fn unreadable_previous(&self) -> Option<V>;

    fn name(&self) -> &'static str;
}

/// Key index plus lifecycle flag. Guarded by the store's read/write lock.
struct Index<K> {
    keys: HashSet<K>,
    closed: bool,
}

pub(crate) struct FileStore<K, V, C, E> {
    directory: PathBuf,
    temp_dir: PathBuf,
    config: DirectoryStoreConfig,
    codec: C,
    encoding: E,
    index: RwLock<Index<K>>,
    /// Read-through cache. Only touched while `index` is held (either side),
    /// so it can never run ahead of or behind a committed write.
    cache: Mutex<HashMap<K, V>>,
}

impl<K, V, C, E> FileStore<K, V, C, E> {
    pub(crate) fn directory(&self) -> &Path {
        &self.directory
    }

    pub(crate) fn temp_directory(&self) -> &Path {
        &self.temp_dir
    }

    pub(crate) fn config(&self) -> &DirectoryStoreConfig {
        &self.config
    }
}

impl<K, V, C, E> FileStore<K, V, C, E>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
    C: KeyCodec<K>,
    E: ValueEncoding<V>,
{
    /// Open a store over an existing directory and build the key index.
    pub(crate) fn open(
        directory: &Path,
        codec: C,
        encoding: E,
        config: DirectoryStoreConfig,
    ) -> StoreResult<Self> {
        if !directory.is_dir() {
            return Err(StoreError::NotADirectory(directory.to_path_buf()));
        }

        let temp_dir = prepare_temp_dir(directory, &config)?;
        if config.clean_stale_temp_files {
            clean_temp_dir(&temp_dir)?;
        }

        let keys = scan_keys(directory, &config.temp_dir, &codec)?;
        info!(
            directory = %directory.display(),
            keys = keys.len(),
            encoding = encoding.name(),
            "opened directory store"
        );

        Ok(Self {
            directory: directory.to_path_buf(),
            temp_dir,
            config,
            codec,
            encoding,
            index: RwLock::new(Index {
                keys,
                closed: false,
            }),
            cache: Mutex::new(HashMap::new()),
        })
    }

    // -----------------------------------------------------------------------
    // Reads (shared lock)
    // -----------------------------------------------------------------------

    pub(crate) fn get_all(&self, keys: &[K]) -> StoreResult<HashMap<K, V>> {
        let index = self.read_index()?;
        let names = self.file_names(keys)?;

        let mut found = HashMap::new();
        for (key, name) in keys.iter().zip(&names) {
            if !index.keys.contains(key) || found.contains_key(key) {
                continue;
            }
            let value = self.load(key, name)?;
            found.insert(key.clone(), value);
        }
        Ok(found)
    }

    pub(crate) fn contains_key(&self, key: &K) -> StoreResult<bool> {
        let index = self.read_index()?;
        self.file_name(key)?;
        Ok(index.keys.contains(key))
    }

    pub(crate) fn keys(&self) -> StoreResult<HashSet<K>> {
        Ok(self.read_index()?.keys.clone())
    }

    pub(crate) fn size(&self) -> StoreResult<usize> {
        Ok(self.read_index()?.keys.len())
    }

    // -----------------------------------------------------------------------
    // Writes (exclusive lock)
    // -----------------------------------------------------------------------

    pub(crate) fn put_all(&self, values: HashMap<K, V>) -> StoreResult<HashMap<K, V>> {
        let mut index = self.write_index()?;

        // Reject the whole batch up front if any key is unusable.
        let entries = values
            .into_iter()
            .map(|(key, value)| {
                let name = self.file_name(&key)?;
                Ok((key, name, value))
            })
            .collect::<StoreResult<Vec<_>>>()?;

        let mut replaced = HashMap::new();
        for (key, name, value) in entries {
            let previous = if index.keys.contains(&key) {
                self.previous(&key, &name)?
            } else {
                None
            };

            self.write_file(&name, &value)?;
            self.lock_cache()?.insert(key.clone(), value);
            index.keys.insert(key.clone());

            if let Some(previous) = previous {
                replaced.insert(key, previous);
            }
        }
        Ok(replaced)
    }

    pub(crate) fn remove_all(&self, keys: &[K]) -> StoreResult<HashMap<K, V>> {
        let mut index = self.write_index()?;
        let names = self.file_names(keys)?;

        let mut removed = HashMap::new();
        for (key, name) in keys.iter().zip(&names) {
            if !index.keys.contains(key) {
                continue;
            }

            let previous = self.previous(key, name)?;

            let path = self.directory.join(name);
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    warn!(file = %name, "value file already gone");
                }
                Err(e) => return Err(StoreError::io(path, e)),
            }
            self.lock_cache()?.remove(key);
            index.keys.remove(key);
            debug!(file = %name, "removed");

            if let Some(previous) = previous {
                removed.insert(key.clone(), previous);
            }
        }
        Ok(removed)
    }

    /// Drop the cache and the key index. Files are left in place.
    pub(crate) fn close(&self) -> StoreResult<()> {
        let mut index = self.write_index()?;
        if index.closed {
            return Ok(());
        }
        index.closed = true;
        index.keys.clear();
        self.lock_cache()?.clear();
        info!(directory = %self.directory.display(), "closed directory store");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn read_index(&self) -> StoreResult<RwLockReadGuard<'_, Index<K>>> {
        let index = self.index.read().map_err(|_| StoreError::Poisoned)?;
        if index.closed {
            return Err(StoreError::Closed);
        }
        Ok(index)
    }

    fn write_index(&self) -> StoreResult<RwLockWriteGuard<'_, Index<K>>> {
        let index = self.index.write().map_err(|_| StoreError::Poisoned)?;
        if index.closed {
            return Err(StoreError::Closed);
        }
        Ok(index)
    }

    fn lock_cache(&self) -> StoreResult<std::sync::MutexGuard<'_, HashMap<K, V>>> {
        self.cache.lock().map_err(|_| StoreError::Poisoned)
    }

    fn file_name(&self, key: &K) -> StoreResult<String> {
        let name = self.codec.encode(key);
        validate_file_name(&name, &self.config.temp_dir)?;
        Ok(name)
    }

    fn file_names(&self, keys: &[K]) -> StoreResult<Vec<String>> {
        keys.iter().map(|key| self.file_name(key)).collect()
    }

    /// Serve `key` from the cache, or read its file and populate the cache.
    ///
    /// Callers hold the index lock. The cache mutex is released during file
    /// I/O, so concurrent readers missing on the same key may both read it;
    /// they read the same committed bytes.
    fn load(&self, key: &K, name: &str) -> StoreResult<V> {
        if let Some(value) = self.lock_cache()?.get(key) {
            return Ok(value.clone());
        }

        let path = self.directory.join(name);
        let file = File::open(&path).map_err(|e| StoreError::io(&path, e))?;
        let mut reader = BufReader::new(file);
        let value = self
            .encoding
            .read(&mut reader)
            .map_err(|e| StoreError::serialization(&path, e))?;

        self.lock_cache()?.insert(key.clone(), value.clone());
        Ok(value)
    }

    /// Best-effort read of the committed value a put or remove supersedes.
    ///
    /// An unreadable file does not block the write; the encoding's stand-in
    /// is reported instead.
    fn previous(&self, key: &K, name: &str) -> StoreResult<Option<V>> {
        match self.load(key, name) {
            Ok(value) => Ok(Some(value)),
            Err(err @ (StoreError::Io { .. } | StoreError::Serialization { .. })) => {
                warn!(file = %name, error = %err, "previous value unreadable; superseding anyway");
                Ok(self.encoding.unreadable_previous())
            }
            Err(err) => Err(err),
        }
    }

    /// Stage `value` in the temp directory, then rename it over `name`.
    ///
    /// On any failure before the rename the staged file is dropped (and
    /// deleted) and the destination is untouched.
    fn write_file(&self, name: &str, value: &V) -> StoreResult<()> {
        let dest = self.directory.join(name);
        let mut staged =
            NamedTempFile::new_in(&self.temp_dir).map_err(|e| StoreError::io(&self.temp_dir, e))?;

        let written = {
            let mut writer = BufWriter::new(staged.as_file_mut());
            let written = self
                .encoding
                .write(&mut writer, value)
                .map_err(|e| StoreError::serialization(&dest, e))?;
            writer.flush().map_err(|e| StoreError::io(&dest, e))?;
            written
        };

        if self.config.sync_mode == SyncMode::EveryWrite {
            staged
                .as_file()
                .sync_all()
                .map_err(|e| StoreError::io(staged.path(), e))?;
        }

        staged
            .persist(&dest)
            .map_err(|e| StoreError::io(&dest, e.error))?;

        if self.config.sync_mode == SyncMode::EveryWrite {
            sync_directory(&self.directory)?;
        }

        debug!(file = %name, bytes = written, "committed");
        Ok(())
    }
}

fn prepare_temp_dir(directory: &Path, config: &DirectoryStoreConfig) -> StoreResult<PathBuf> {
    let temp_dir = directory.join(&config.temp_dir);
    let temp_err = |reason: String| StoreError::TempDir {
        path: temp_dir.clone(),
        reason,
    };

    if config.temp_dir.is_empty()
        || config.temp_dir == "."
        || config.temp_dir == ".."
        || config.temp_dir.contains(['/', '\\', std::path::MAIN_SEPARATOR])
    {
        return Err(temp_err("temp directory must be a plain file name".to_string()));
    }

    match fs::metadata(&temp_dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(temp_err("blocked by a non-directory file".to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir(&temp_dir).map_err(|e| temp_err(e.to_string()))?;
        }
        Err(e) => return Err(temp_err(e.to_string())),
    }
    Ok(temp_dir)
}

/// Remove leftovers of writes that never reached their rename.
fn clean_temp_dir(temp_dir: &Path) -> StoreResult<()> {
    let mut removed = 0usize;
    for entry in fs::read_dir(temp_dir).map_err(|e| StoreError::io(temp_dir, e))? {
        let entry = entry.map_err(|e| StoreError::io(temp_dir, e))?;
        let path = entry.path();
        if path.is_file() {
            fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
            removed += 1;
        }
    }
    if removed > 0 {
        warn!(
            temp_dir = %temp_dir.display(),
            removed,
            "removed stale staged files from interrupted writes"
        );
    }
    Ok(())
}

/// Build the key index from the regular files in `directory`.
fn scan_keys<K, C>(directory: &Path, temp_dir: &str, codec: &C) -> StoreResult<HashSet<K>>
where
    K: Eq + Hash,
    C: KeyCodec<K>,
{
    let mut keys = HashSet::new();
    for entry in fs::read_dir(directory).map_err(|e| StoreError::io(directory, e))? {
        let entry = entry.map_err(|e| StoreError::io(directory, e))?;
        let path = entry.path();
        let file_name = entry.file_name();

        if file_name.to_str() == Some(temp_dir) {
            continue;
        }
        if !path.is_file() {
            debug!(path = %path.display(), "skipping non-file entry");
            continue;
        }

        let name = file_name.to_str().ok_or_else(|| StoreError::KeyParse {
            file_name: file_name.to_string_lossy().into_owned(),
            reason: "file name is not valid UTF-8".to_string(),
        })?;
        let key = codec.decode(name).map_err(|reason| StoreError::KeyParse {
            file_name: name.to_string(),
            reason,
        })?;
        if codec.encode(&key) != name {
            return Err(StoreError::KeyParse {
                file_name: name.to_string(),
                reason: "decoded key does not encode back to the same file name".to_string(),
            });
        }
        keys.insert(key);
    }
    Ok(keys)
}

#[cfg(unix)]
fn sync_directory(directory: &Path) -> StoreResult<()> {
    File::open(directory)
        .and_then(|dir| dir.sync_all())
        .map_err(|e| StoreError::io(directory, e))
}

#[cfg(not(unix))]
fn sync_directory(_directory: &Path) -> StoreResult<()> {
    Ok(())
}
