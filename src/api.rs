//! File and in-memory entry points.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::de::Deserializer;
use crate::error::{Result, TreeBinError};
use crate::hash;
use crate::ser::Serializer;
use crate::transfer::Transfer;

/// Pretty-print width used for file text unless configured otherwise.
pub const DEFAULT_INDENT: usize = 2;

/// What to do when a file to be loaded does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// A missing file is a `FileAccess` error.
    #[default]
    Require,
    /// A missing file yields `T::default()`. Malformed files still fail.
    DefaultIfMissing,
}

/// Options for reading and writing documents.
///
/// ```rust
/// use treebin::{LoadPolicy, TreeBin, Transfer};
///
/// #[derive(Default, Debug, PartialEq, Transfer)]
/// struct Settings { volume: u8 }
///
/// let dir = tempfile::tempdir()?;
/// let path = dir.path().join("settings.tb");
///
/// let opts = TreeBin::builder().compact().load_policy(LoadPolicy::DefaultIfMissing);
/// let settings: Settings = opts.load(&path)?;
/// assert_eq!(settings, Settings::default());
///
/// opts.save(&path, &Settings { volume: 7 })?;
/// assert_eq!(opts.load::<Settings, _>(&path)?.volume, 7);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeBinOptions {
    indent: Option<usize>,
    load_policy: LoadPolicy,
}

impl Default for TreeBinOptions {
    fn default() -> Self {
        Self {
            indent: Some(DEFAULT_INDENT),
            load_policy: LoadPolicy::Require,
        }
    }
}

impl TreeBinOptions {
    /// Sets the pretty-print width of the text portion; `None` writes compact text.
    pub fn indent(mut self, indent: Option<usize>) -> Self {
        self.indent = indent;
        self
    }

    /// Shorthand for `indent(None)`.
    pub fn compact(self) -> Self {
        self.indent(None)
    }

    /// Sets the policy for missing files.
    pub fn load_policy(mut self, policy: LoadPolicy) -> Self {
        self.load_policy = policy;
        self
    }

    /// The configured indent.
    pub fn indent_width(&self) -> Option<usize> {
        self.indent
    }

    /// The configured missing-file policy.
    pub fn policy(&self) -> LoadPolicy {
        self.load_policy
    }

    /// Encodes `value` as a document in memory.
    pub fn to_bytes<T: Transfer + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        let mut ser = Serializer::new();
        ser.write_value(value)?;
        ser.into_document(self.indent)
    }

    /// Writes whatever `f` pushes into a fresh serializer to `path`, overwriting it.
    pub fn write_with<P, F>(&self, path: P, f: F) -> Result<()>
    where
        P: AsRef<Path>,
        F: FnOnce(&mut Serializer) -> Result<()>,
    {
        let path = path.as_ref();
        let mut ser = Serializer::new();
        f(&mut ser)?;
        let binary_len = ser.binary().len();
        let doc = ser.into_document(self.indent)?;
        fs::write(path, &doc).map_err(|e| TreeBinError::file_access(path, e))?;
        debug!(path = %path.display(), bytes = doc.len(), binary_len, "saved document");
        Ok(())
    }

    /// Writes `value` to `path`, overwriting it.
    pub fn save<T, P>(&self, path: P, value: &T) -> Result<()>
    where
        T: Transfer + ?Sized,
        P: AsRef<Path>,
    {
        self.write_with(path, |ser| ser.write_value(value))
    }

    /// Parses `path` and hands the deserializer to `f`.
    ///
    /// A missing file is always an error here, whatever the load policy.
    pub fn read_with<P, F, R>(&self, path: P, f: F) -> Result<R>
    where
        P: AsRef<Path>,
        F: FnOnce(&mut Deserializer) -> Result<R>,
    {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| TreeBinError::file_access(path, e))?;
        debug!(path = %path.display(), bytes = bytes.len(), "loaded document");
        let mut de = Deserializer::from_document(&bytes)?;
        f(&mut de)
    }

    /// Reads `path` into an existing value.
    pub fn load_into<T, P>(&self, path: P, value: &mut T) -> Result<()>
    where
        T: Transfer + ?Sized,
        P: AsRef<Path>,
    {
        self.read_with(path, |de| de.read_value(value))
    }

    /// Reads `path` into a default-constructed value, honoring the load policy.
    pub fn load<T, P>(&self, path: P) -> Result<T>
    where
        T: Transfer + Default,
        P: AsRef<Path>,
    {
        let mut value = T::default();
        match self.load_into(path.as_ref(), &mut value) {
            Ok(()) => Ok(value),
            Err(e) if e.is_not_found() && self.load_policy == LoadPolicy::DefaultIfMissing => {
                debug!(path = %path.as_ref().display(), "document missing, using default");
                Ok(T::default())
            }
            Err(e) => Err(e),
        }
    }
}

/// The main entry point.
///
/// All functions use [`TreeBinOptions::default`]: pretty text with two-space
/// indent and missing files reported as errors.
#[derive(Debug)]
pub struct TreeBin;

impl TreeBin {
    /// Starts an options builder.
    pub fn builder() -> TreeBinOptions {
        TreeBinOptions::default()
    }

    /// Writes `value` to `path`, overwriting it.
    pub fn save<T, P>(path: P, value: &T) -> Result<()>
    where
        T: Transfer + ?Sized,
        P: AsRef<Path>,
    {
        Self::builder().save(path, value)
    }

    /// Reads `path` into a default-constructed value.
    pub fn load<T, P>(path: P) -> Result<T>
    where
        T: Transfer + Default,
        P: AsRef<Path>,
    {
        Self::builder().load(path)
    }

    /// Reads `path` into an existing value.
    pub fn load_into<T, P>(path: P, value: &mut T) -> Result<()>
    where
        T: Transfer + ?Sized,
        P: AsRef<Path>,
    {
        Self::builder().load_into(path, value)
    }

    /// Reads `path`, or returns `T::default()` if the file does not exist.
    pub fn load_or_default<T, P>(path: P) -> Result<T>
    where
        T: Transfer + Default,
        P: AsRef<Path>,
    {
        Self::builder()
            .load_policy(LoadPolicy::DefaultIfMissing)
            .load(path)
    }

    /// Callback form of [`TreeBin::save`].
    pub fn write_with<P, F>(path: P, f: F) -> Result<()>
    where
        P: AsRef<Path>,
        F: FnOnce(&mut Serializer) -> Result<()>,
    {
        Self::builder().write_with(path, f)
    }

    /// Callback form of [`TreeBin::load_into`].
    pub fn read_with<P, F, R>(path: P, f: F) -> Result<R>
    where
        P: AsRef<Path>,
        F: FnOnce(&mut Deserializer) -> Result<R>,
    {
        Self::builder().read_with(path, f)
    }

    /// Encodes `value` as a document in memory.
    pub fn to_bytes<T: Transfer + ?Sized>(value: &T) -> Result<Vec<u8>> {
        Self::builder().to_bytes(value)
    }

    /// Decodes a document produced by [`TreeBin::to_bytes`].
    pub fn from_bytes<T: Transfer + Default>(bytes: &[u8]) -> Result<T> {
        let mut value = T::default();
        Deserializer::from_document(bytes)?.read_value(&mut value)?;
        Ok(value)
    }

    /// Content hash of `value`.
    pub fn hash<T: Transfer + ?Sized>(value: &T) -> Result<u64> {
        hash::hash(value)
    }

    /// Content hash of whatever `f` writes.
    pub fn hash_with<F>(f: F) -> Result<u64>
    where
        F: FnOnce(&mut Serializer) -> Result<()>,
    {
        hash::hash_with(f)
    }

    /// True if both values have the same content hash.
    pub fn equals<T: Transfer + ?Sized>(lhs: &T, rhs: &T) -> Result<bool> {
        hash::equals(lhs, rhs)
    }
}
