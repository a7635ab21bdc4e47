//! Container adapters built on top of the push/consume primitives.
//!
//! Each adapter is an ordinary composite: it owns its elements and describes them
//! through `send`/`receive`, delegating every element back to [`Field`].
//!
//! | Adapter            | Tree shape                                        |
//! |--------------------|---------------------------------------------------|
//! | [`ByteBuffer`]     | `{"Data": {"Begin": b, "End": e}}`                |
//! | [`Sequence<T>`]    | `{"Size": n, "0": .., "1": .., ...}`              |
//! | [`FixedArray<T,N>`]| `{"Size": N, "0": .., ..., "N-1": ..}`            |
//! | [`Optional<T>`]    | `{}` or `{"ExistingOptional": ..}`                |

use std::ops::{Deref, DerefMut};

use crate::de::Deserializer;
use crate::error::Result;
use crate::scope::Scoped;
use crate::ser::Serializer;
use crate::transfer::{Field, Transfer};

/// Field holding a byte buffer's region.
pub const DATA_KEY: &str = "Data";
/// Field holding the element count of sequences and fixed arrays.
pub const SIZE_KEY: &str = "Size";
/// Field holding the value of a present optional.
pub const OPTIONAL_KEY: &str = "ExistingOptional";

fn element_label(index: usize, size: usize) -> String {
    format!("element {index} of {size}")
}

// --- ByteBuffer ---

/// Raw bytes stored in the shared binary buffer instead of the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteBuffer {
    /// The bytes.
    pub data: Vec<u8>,
}

impl ByteBuffer {
    /// Creates a buffer holding `data`.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// The contents as UTF-8 text.
    pub fn as_str(&self) -> std::result::Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.data)
    }

    /// The contents as text, replacing invalid UTF-8 sequences.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// Replaces the contents with the bytes of `text`.
    pub fn set_string(&mut self, text: &str) {
        self.data.clear();
        self.data.extend_from_slice(text.as_bytes());
    }

    /// Consumes the buffer, returning its bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl Deref for ByteBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }
}

impl From<&str> for ByteBuffer {
    fn from(text: &str) -> Self {
        Self::from(text.as_bytes())
    }
}

impl From<String> for ByteBuffer {
    fn from(text: String) -> Self {
        Self {
            data: text.into_bytes(),
        }
    }
}

impl Transfer for ByteBuffer {
    const TYPE_NAME: &'static str = "ByteBuffer";

    fn send(&self, ser: &mut Serializer) -> Result<()> {
        ser.push_bytes(DATA_KEY, &self.data)?;
        Ok(())
    }

    fn receive(&mut self, de: &mut Deserializer) -> Result<()> {
        de.consume_bytes(DATA_KEY, &mut self.data)
    }
}

impl Field for ByteBuffer {
    fn push_field(&self, name: &str, ser: &mut Serializer) -> Result<()> {
        ser.push_composite(name, self)
    }

    fn consume_field(name: &str, de: &mut Deserializer) -> Result<Self> {
        de.consume_composite(name)
    }
}

// --- Sequence ---

/// A growable, ordered list of elements.
///
/// Dereferences to `Vec<T>`, so it can be used like one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sequence<T> {
    items: Vec<T>,
}

impl<T> Sequence<T> {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Consumes the sequence, returning its elements.
    pub fn into_inner(self) -> Vec<T> {
        self.items
    }
}

impl<T> Default for Sequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for Sequence<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.items
    }
}

impl<T> DerefMut for Sequence<T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        &mut self.items
    }
}

impl<T> From<Vec<T>> for Sequence<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T> FromIterator<T> for Sequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for Sequence<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Sequence<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Field> Transfer for Sequence<T> {
    const TYPE_NAME: &'static str = "Sequence";

    fn send(&self, ser: &mut Serializer) -> Result<()> {
        ser.push(SIZE_KEY, &self.items.len())?;
        for (i, item) in self.items.iter().enumerate() {
            ser.push(&i.to_string(), item)?;
        }
        Ok(())
    }

    fn receive(&mut self, de: &mut Deserializer) -> Result<()> {
        let size: usize = de.consume(SIZE_KEY)?;
        let mut items = Vec::new();
        for i in 0..size {
            let item = de.labeled(element_label(i, size), |d| d.consume(&i.to_string()))?;
            items.push(item);
        }
        self.items = items;
        Ok(())
    }
}

impl<T: Field> Field for Sequence<T> {
    fn push_field(&self, name: &str, ser: &mut Serializer) -> Result<()> {
        ser.push_composite(name, self)
    }

    fn consume_field(name: &str, de: &mut Deserializer) -> Result<Self> {
        de.consume_composite(name)
    }
}

// --- FixedArray ---

/// Exactly `N` elements. The stored size is checked on read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FixedArray<T, const N: usize>(pub [T; N]);

impl<T, const N: usize> FixedArray<T, N> {
    /// Wraps an array.
    pub fn new(items: [T; N]) -> Self {
        Self(items)
    }

    /// Consumes the wrapper, returning the array.
    pub fn into_inner(self) -> [T; N] {
        self.0
    }
}

impl<T: Default, const N: usize> Default for FixedArray<T, N> {
    fn default() -> Self {
        Self(std::array::from_fn(|_| T::default()))
    }
}

impl<T, const N: usize> Deref for FixedArray<T, N> {
    type Target = [T; N];

    fn deref(&self) -> &[T; N] {
        &self.0
    }
}

impl<T, const N: usize> DerefMut for FixedArray<T, N> {
    fn deref_mut(&mut self) -> &mut [T; N] {
        &mut self.0
    }
}

impl<T, const N: usize> From<[T; N]> for FixedArray<T, N> {
    fn from(items: [T; N]) -> Self {
        Self(items)
    }
}

impl<T: Field, const N: usize> Transfer for FixedArray<T, N> {
    const TYPE_NAME: &'static str = "FixedArray";

    fn send(&self, ser: &mut Serializer) -> Result<()> {
        ser.push(SIZE_KEY, &N)?;
        for (i, item) in self.0.iter().enumerate() {
            ser.push(&i.to_string(), item)?;
        }
        Ok(())
    }

    fn receive(&mut self, de: &mut Deserializer) -> Result<()> {
        de.consume_checked(SIZE_KEY, &N)?;
        for (i, slot) in self.0.iter_mut().enumerate() {
            *slot = de.labeled(element_label(i, N), |d| d.consume(&i.to_string()))?;
        }
        Ok(())
    }
}

impl<T: Field + Default, const N: usize> Field for FixedArray<T, N> {
    fn push_field(&self, name: &str, ser: &mut Serializer) -> Result<()> {
        ser.push_composite(name, self)
    }

    fn consume_field(name: &str, de: &mut Deserializer) -> Result<Self> {
        de.consume_composite(name)
    }
}

// --- Optional ---

/// A value that may be absent. Absence writes no field at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Optional<T> {
    value: Option<T>,
}

impl<T> Optional<T> {
    /// An empty optional.
    pub fn none() -> Self {
        Self { value: None }
    }

    /// An optional holding `value`.
    pub fn some(value: T) -> Self {
        Self { value: Some(value) }
    }

    /// Replaces the held value.
    pub fn set(&mut self, value: T) {
        self.value = Some(value);
    }

    /// Takes the held value out, leaving the optional empty.
    pub fn take(&mut self) -> Option<T> {
        self.value.take()
    }

    /// The held value, if any.
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Mutable access to the held value, if any.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    /// True if a value is held.
    pub fn is_some(&self) -> bool {
        self.value.is_some()
    }

    /// True if no value is held.
    pub fn is_none(&self) -> bool {
        self.value.is_none()
    }

    /// Consumes the optional, returning the inner `Option`.
    pub fn into_inner(self) -> Option<T> {
        self.value
    }
}

impl<T> Default for Optional<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T> From<T> for Optional<T> {
    fn from(value: T) -> Self {
        Self::some(value)
    }
}

impl<T> From<Option<T>> for Optional<T> {
    fn from(value: Option<T>) -> Self {
        Self { value }
    }
}

impl<T: Field> Transfer for Optional<T> {
    const TYPE_NAME: &'static str = "Optional";

    fn send(&self, ser: &mut Serializer) -> Result<()> {
        match &self.value {
            Some(value) => ser.push(OPTIONAL_KEY, value),
            None => Ok(()),
        }
    }

    fn receive(&mut self, de: &mut Deserializer) -> Result<()> {
        self.value = if de.contains(OPTIONAL_KEY) {
            Some(de.consume(OPTIONAL_KEY)?)
        } else {
            None
        };
        Ok(())
    }
}

impl<T: Field> Field for Optional<T> {
    fn push_field(&self, name: &str, ser: &mut Serializer) -> Result<()> {
        ser.push_composite(name, self)
    }

    fn consume_field(name: &str, de: &mut Deserializer) -> Result<Self> {
        de.consume_composite(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::BinaryBuffer;
    use crate::error::TreeBinError;
    use crate::tree::Node;
    use serde_json::json;

    fn write<T: Field>(name: &str, value: &T) -> (Node, BinaryBuffer) {
        let mut ser = Serializer::new();
        ser.push(name, value).expect("push");
        ser.finish()
    }

    fn read<T: Field>(name: &str, (root, binary): (Node, BinaryBuffer)) -> Result<T> {
        Deserializer::new(root, binary).consume(name)
    }

    #[test]
    fn sequence_writes_size_then_indexed_elements() {
        let seq: Sequence<u16> = vec![10, 20, 30].into();
        let (root, binary) = write("seq", &seq);
        assert_eq!(
            root.get("seq"),
            Some(&json!({"Size": 3, "0": 10, "1": 20, "2": 30}))
        );
        let back: Sequence<u16> = read("seq", (root, binary)).expect("read");
        assert_eq!(back, seq);
    }

    #[test]
    fn empty_sequence_has_only_size() {
        let seq: Sequence<String> = Sequence::new();
        let doc = write("seq", &seq);
        assert_eq!(doc.0.get("seq"), Some(&json!({"Size": 0})));
        let back: Sequence<String> = read("seq", doc).expect("read");
        assert!(back.is_empty());
    }

    #[test]
    fn sequence_element_failure_names_the_element() {
        let mut root = Node::new();
        root.insert("seq".into(), json!({"Size": 2, "0": 1}));
        let err = read::<Sequence<i32>>("seq", (root, BinaryBuffer::new()))
            .expect_err("element 1 is missing");
        assert!(matches!(err, TreeBinError::MissingField { ref key, .. } if key == "1"));
        assert_eq!(err.scope_path(), Some("element 1 of 2 <- seq"));
    }

    #[test]
    fn fixed_array_checks_stored_size() {
        let mut root = Node::new();
        root.insert(
            "arr".into(),
            json!({"Size": 4, "0": 1, "1": 2, "2": 3, "3": 4}),
        );
        let err = read::<FixedArray<u8, 5>>("arr", (root, BinaryBuffer::new()))
            .expect_err("size 4 is not 5");
        assert!(matches!(err, TreeBinError::ValueMismatch { ref key, .. } if key == "Size"));
    }

    #[test]
    fn fixed_array_round_trips() {
        let arr = FixedArray::new([1.5f64, -2.0, 0.25]);
        let doc = write("arr", &arr);
        assert_eq!(doc.0.get("arr").and_then(|n| n.get("Size")), Some(&json!(3)));
        let back: FixedArray<f64, 3> = read("arr", doc).expect("read");
        assert_eq!(back, arr);
    }

    #[test]
    fn empty_optional_writes_nothing() {
        let opt: Optional<u32> = Optional::none();
        let doc = write("opt", &opt);
        assert_eq!(doc.0.get("opt"), Some(&json!({})));
        let back: Optional<u32> = read("opt", doc).expect("read");
        assert!(back.is_none());
    }

    #[test]
    fn present_optional_round_trips() {
        let opt = Optional::some("hi".to_string());
        let doc = write("opt", &opt);
        assert_eq!(doc.0.get("opt"), Some(&json!({"ExistingOptional": "hi"})));
        let back: Optional<String> = read("opt", doc).expect("read");
        assert_eq!(back.get().map(String::as_str), Some("hi"));
    }

    #[test]
    fn byte_buffer_lives_in_binary() {
        let buf = ByteBuffer::from("payload");
        let (root, binary) = write("buf", &buf);
        assert_eq!(
            root.get("buf"),
            Some(&json!({"Data": {"Begin": 0, "End": 7}}))
        );
        assert_eq!(binary.as_bytes(), b"payload");
        let back: ByteBuffer = read("buf", (root, binary)).expect("read");
        assert_eq!(back.as_str(), Ok("payload"));
    }

    #[test]
    fn nested_containers_share_one_buffer() {
        let blobs: Sequence<ByteBuffer> =
            vec![ByteBuffer::from("ab"), ByteBuffer::from(""), ByteBuffer::from("cde")].into();
        let (root, binary) = write("blobs", &blobs);
        assert_eq!(binary.as_bytes(), b"abcde");
        let back: Sequence<ByteBuffer> = read("blobs", (root, binary)).expect("read");
        assert_eq!(back, blobs);
    }
}
