//! Key <-> file name encoding for directory-backed stores.
//!
//! A [`KeyCodec`] must be a bijection between the keys a store actually uses
//! and valid file names. Stores check both directions: encoded keys are
//! validated before any filesystem effect, and file names found on open must
//! decode to a key that encodes back to the same name.

use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::error::{StoreError, StoreResult};

/// Caller-supplied pair of total functions mapping keys to file names.
pub trait KeyCodec<K>: Send + Sync {
    /// Encode a key as a file name.
    fn encode(&self, key: &K) -> String;

    /// Parse a file name back into a key.
    fn decode(&self, encoded: &str) -> Result<K, String>;
}

/// Identity codec for `String` keys.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringKeys;

impl KeyCodec<String> for StringKeys {
    fn encode(&self, key: &String) -> String {
        key.clone()
    }

    fn decode(&self, encoded: &str) -> Result<String, String> {
        Ok(encoded.to_string())
    }
}

/// Codec for any key type with matching `Display` and `FromStr` impls.
pub struct DisplayKeys<K> {
    _key: PhantomData<fn() -> K>,
}

impl<K> DisplayKeys<K> {
    pub fn new() -> Self {
        Self { _key: PhantomData }
    }
}

impl<K> Default for DisplayKeys<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Clone for DisplayKeys<K> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<K> std::fmt::Debug for DisplayKeys<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DisplayKeys")
    }
}

impl<K> KeyCodec<K> for DisplayKeys<K>
where
    K: Display + FromStr,
    K::Err: Display,
{
    fn encode(&self, key: &K) -> String {
        key.to_string()
    }

    fn decode(&self, encoded: &str) -> Result<K, String> {
        encoded.parse().map_err(|e: K::Err| e.to_string())
    }
}

type KeyBuilder<K> = Box<dyn Fn(&K) -> String + Send + Sync>;
type KeyParser<K> = Box<dyn Fn(&str) -> Result<K, String> + Send + Sync>;

/// Codec built from a closure pair.
pub struct FnKeys<K> {
    builder: KeyBuilder<K>,
    parser: KeyParser<K>,
}

impl<K> FnKeys<K> {
    pub fn new<B, P>(builder: B, parser: P) -> Self
    where
        B: Fn(&K) -> String + Send + Sync + 'static,
        P: Fn(&str) -> Result<K, String> + Send + Sync + 'static,
    {
        Self {
            builder: Box::new(builder),
            parser: Box::new(parser),
        }
    }
}

impl<K> KeyCodec<K> for FnKeys<K> {
    fn encode(&self, key: &K) -> String {
        (self.builder)(key)
    }

    fn decode(&self, encoded: &str) -> Result<K, String> {
        (self.parser)(encoded)
    }
}

/// Check that `name` can be used as a file directly inside the store
/// directory without colliding with the staging directory `reserved`.
pub fn validate_file_name(name: &str, reserved: &str) -> StoreResult<()> {
    let invalid = |reason: &str| StoreError::InvalidKey {
        key: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("encodes to an empty file name"));
    }
    if name == "." || name == ".." {
        return Err(invalid("encodes to a relative path component"));
    }
    if name == reserved {
        return Err(invalid("collides with the temp directory"));
    }
    if name.contains('/') || name.contains('\\') || name.contains(std::path::MAIN_SEPARATOR) {
        return Err(invalid("contains a path separator"));
    }
    if name.contains('\0') {
        return Err(invalid("contains a NUL byte"));
    }
    Ok(())
}
