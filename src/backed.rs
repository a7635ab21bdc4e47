//! Values whose lifetime is tied to a file.
//!
//! A [`FileBacked`] loads its value when it is opened and writes it back when it is
//! released, either explicitly through [`FileBacked::close`] or implicitly on drop.
//!
//! ## Release rules
//!
//! - A failed load returns the error from `open` and no `FileBacked` exists, so no
//!   flush can overwrite the file with a partially read value.
//! - `close` flushes and propagates a flush failure.
//! - Drop flushes as well; since drop cannot return an error, a failure there is
//!   logged with `tracing::error!`.
//! - [`FileBacked::with`] scopes the value to a closure. When the closure fails, its
//!   error is returned and a flush failure during release is only logged.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::api::{LoadPolicy, TreeBinOptions};
use crate::error::Result;
use crate::transfer::Transfer;

/// A value loaded from `path` and written back to it on release.
///
/// ```rust
/// use treebin::{FileBacked, TreeBin, Transfer};
///
/// #[derive(Default, Transfer)]
/// struct Counter { hits: u64 }
///
/// let dir = tempfile::tempdir()?;
/// let path = dir.path().join("counter.tb");
/// TreeBin::save(&path, &Counter::default())?;
///
/// {
///     let mut counter = FileBacked::<Counter>::open(&path)?;
///     counter.hits += 1;
/// } // flushed here
///
/// assert_eq!(TreeBin::load::<Counter, _>(&path)?.hits, 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct FileBacked<T: Transfer> {
    path: PathBuf,
    value: T,
    options: TreeBinOptions,
    released: bool,
}

impl<T: Transfer + Default> FileBacked<T> {
    /// Loads `path`. A missing or malformed file is an error.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, TreeBinOptions::default())
    }

    /// Loads `path`, or starts from `T::default()` if the file does not exist.
    pub fn open_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(
            path,
            TreeBinOptions::default().load_policy(LoadPolicy::DefaultIfMissing),
        )
    }

    /// Loads `path` with explicit options. The same options are used for flushing.
    pub fn open_with<P: AsRef<Path>>(path: P, options: TreeBinOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let value = options.load(&path)?;
        debug!(path = %path.display(), "file-backed value acquired");
        Ok(Self {
            path,
            value,
            options,
            released: false,
        })
    }

    /// Opens `path`, runs `f` on the value, then releases it.
    ///
    /// The value is flushed on every exit path of `f`.
    pub fn with<P, F, R>(path: P, f: F) -> Result<R>
    where
        P: AsRef<Path>,
        F: FnOnce(&mut T) -> Result<R>,
    {
        let mut backed = Self::open(path)?;
        match f(&mut backed.value) {
            Ok(out) => {
                backed.close()?;
                Ok(out)
            }
            Err(err) => {
                if let Err(flush_err) = backed.close() {
                    error!(error = %flush_err, "flush after failed scope also failed");
                }
                Err(err)
            }
        }
    }
}

impl<T: Transfer> FileBacked<T> {
    /// Takes ownership of `value` for `path` without reading the file.
    ///
    /// The file is created or overwritten on release.
    pub fn from_value<P: AsRef<Path>>(path: P, value: T) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            value,
            options: TreeBinOptions::default(),
            released: false,
        }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the held value.
    pub fn set(&mut self, value: T) {
        self.value = value;
    }

    /// Serializes the current value and overwrites the file.
    pub fn flush(&self) -> Result<()> {
        self.options.save(&self.path, &self.value)
    }

    /// Releases the value, flushing it and returning any flush error.
    pub fn close(mut self) -> Result<()> {
        self.released = true;
        self.flush()
    }
}

impl<T: Transfer> Deref for FileBacked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: Transfer> DerefMut for FileBacked<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: Transfer> Drop for FileBacked<T> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self.flush() {
            error!(path = %self.path.display(), error = %err, "failed to flush file-backed value on drop");
        }
    }
}
