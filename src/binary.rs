//! The shared Binary Buffer and the regions that point into it.
//!
//! A single append-only buffer exists per pass. Writers receive a [`Region`] for
//! every append; regions never overlap because appends are sequential, and growing
//! the buffer never invalidates a region since regions are offsets, not pointers.

/// Field name holding a region's start offset.
pub const BEGIN_KEY: &str = "Begin";
/// Field name holding a region's end offset (exclusive).
pub const END_KEY: &str = "End";

/// A `[begin, end)` byte range relative to the start of the binary buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Region {
    /// First byte of the region.
    pub begin: u64,
    /// One past the last byte of the region.
    pub end: u64,
}

impl Region {
    /// Creates a region. No validation happens here; see [`BinaryBuffer::slice`].
    pub fn new(begin: u64, end: u64) -> Self {
        Self { begin, end }
    }

    /// Length in bytes, or `None` when `end < begin`.
    pub fn len(&self) -> Option<u64> {
        self.end.checked_sub(self.begin)
    }

    /// True for a well-formed region covering no bytes.
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }
}

/// Append-only byte storage shared by a whole pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinaryBuffer {
    bytes: Vec<u8>,
}

impl BinaryBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `data` and returns the region it now occupies.
    pub fn append(&mut self, data: &[u8]) -> Region {
        let begin = self.bytes.len() as u64;
        self.bytes.extend_from_slice(data);
        Region::new(begin, self.bytes.len() as u64)
    }

    /// Resolves `region`, or `None` if it is malformed or out of bounds.
    pub fn slice(&self, region: Region) -> Option<&[u8]> {
        if region.end < region.begin {
            return None;
        }
        let begin = usize::try_from(region.begin).ok()?;
        let end = usize::try_from(region.end).ok()?;
        self.bytes.get(begin..end)
    }

    /// Total number of bytes appended so far.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the buffer, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl From<Vec<u8>> for BinaryBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_produce_adjacent_regions() {
        let mut buf = BinaryBuffer::new();
        let a = buf.append(b"abc");
        let b = buf.append(b"");
        let c = buf.append(b"de");
        assert_eq!(a, Region::new(0, 3));
        assert_eq!(b, Region::new(3, 3));
        assert!(b.is_empty());
        assert_eq!(c, Region::new(3, 5));
        assert_eq!(buf.slice(c), Some(&b"de"[..]));
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn rejects_out_of_bounds_and_inverted_regions() {
        let buf = BinaryBuffer::from(vec![1, 2, 3]);
        assert_eq!(buf.slice(Region::new(0, 4)), None);
        assert_eq!(buf.slice(Region::new(2, 1)), None);
        assert_eq!(buf.slice(Region::new(4, 4)), None);
        assert_eq!(buf.slice(Region::new(3, 3)), Some(&[][..]));
        assert_eq!(Region::new(2, 1).len(), None);
    }
}
