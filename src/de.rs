//! The read side of a transfer pass.
//!
//! A [`Deserializer`] owns a parsed tree and its binary buffer. Every read removes
//! the field it consumed, so reading the same name twice reports a missing field.
//! Entering a composite scope detaches that child node from its parent and keeps it
//! on a stack until the scope is closed.

use std::fmt::Debug;

use tracing::trace;

use crate::binary::{BinaryBuffer, Region, BEGIN_KEY, END_KEY};
use crate::codec;
use crate::error::Result;
use crate::scope::{ScopeStack, Scoped};
use crate::transfer::{Field, Primitive, Transfer, TransferEnum};
use crate::tree::{self, Node, Tree};

/// Feeds a parsed tree + binary document into `receive` calls.
#[derive(Debug, Default)]
pub struct Deserializer {
    root: Node,
    open: Vec<Node>,
    binary: BinaryBuffer,
    scopes: ScopeStack,
}

impl Deserializer {
    /// Creates a deserializer over an already parsed tree and buffer.
    pub fn new(root: Node, binary: BinaryBuffer) -> Self {
        Self {
            root,
            open: Vec::new(),
            binary,
            scopes: ScopeStack::new(),
        }
    }

    /// Parses a full document (text, NUL, binary).
    pub fn from_document(bytes: &[u8]) -> Result<Self> {
        let (text, binary) = codec::decode(bytes)?;
        let root = tree::parse_text(text)?;
        Ok(Self::new(root, BinaryBuffer::from(binary.to_vec())))
    }

    /// Reads a whole top-level value into `value`, labelled with its type name.
    pub fn read_value<T: Transfer + ?Sized>(&mut self, value: &mut T) -> Result<()> {
        self.labeled(T::TYPE_NAME, |d| value.receive(d))
    }

    /// Consumes the field `name`, dispatching on the requested type's category.
    pub fn consume<T: Field>(&mut self, name: &str) -> Result<T> {
        T::consume_field(name, self)
    }

    /// Consumes `name` and fails with `ValueMismatch` unless it equals `expected`.
    pub fn consume_checked<T>(&mut self, name: &str, expected: &T) -> Result<()>
    where
        T: Field + PartialEq + Debug,
    {
        let found: T = self.consume(name)?;
        if &found != expected {
            return Err(self.scopes.value_mismatch(name, expected, &found));
        }
        Ok(())
    }

    /// Removes and returns the raw tree value stored under `name`.
    pub fn consume_value(&mut self, name: &str) -> Result<Tree> {
        match self.current().shift_remove(name) {
            Some(value) => Ok(value),
            None => Err(self.scopes.missing_field(name)),
        }
    }

    /// Consumes a leaf and converts it to `P`.
    pub fn consume_primitive<P: Primitive>(&mut self, name: &str) -> Result<P> {
        let value = self.consume_value(name)?;
        serde_json::from_value(value)
            .map_err(|e| self.scopes.type_mismatch(name, P::TYPE_NAME, e.to_string()))
    }

    /// Consumes an enum stored as its underlying integer.
    pub fn consume_enum<E: TransferEnum>(&mut self, name: &str) -> Result<E> {
        let raw: E::Repr = self.consume_primitive(name)?;
        match E::from_repr(raw) {
            Some(value) => Ok(value),
            None => Err(self.scopes.type_mismatch(
                name,
                E::TYPE_NAME,
                "discriminant does not match any variant",
            )),
        }
    }

    /// Enters the child node `name` and reads a default-constructed `T` from it.
    pub fn consume_composite<T: Transfer + Default>(&mut self, name: &str) -> Result<T> {
        self.scoped(name, |d| {
            let mut value = T::default();
            value.receive(d)?;
            Ok(value)
        })
    }

    /// Reads the binary region stored under `name` into `out`.
    ///
    /// `out` is overwritten on success and left untouched on failure. A region with
    /// `End < Begin` or either bound past the buffer is an `InvalidRange`. A bound
    /// that is not an unsigned integer at all fails earlier as a `TypeMismatch` on
    /// `Begin` or `End`.
    pub fn consume_bytes(&mut self, name: &str, out: &mut Vec<u8>) -> Result<()> {
        self.scoped(name, |d| {
            let begin: u64 = d.consume_primitive(BEGIN_KEY)?;
            let end: u64 = d.consume_primitive(END_KEY)?;
            let region = Region::new(begin, end);
            let bytes = d
                .binary
                .slice(region)
                .ok_or_else(|| d.scopes.invalid_range(region, d.binary.len()))?;
            out.clear();
            out.extend_from_slice(bytes);
            trace!(field = name, begin, end, "consumed binary region");
            Ok(())
        })
    }

    /// Structural probe: true if `name` is present in the current node.
    ///
    /// Nothing is consumed.
    pub fn contains(&self, name: &str) -> bool {
        self.open.last().unwrap_or(&self.root).contains_key(name)
    }

    /// Field names of the current node that have not been consumed yet, in
    /// document order.
    pub fn remaining(&self) -> Vec<&str> {
        self.open
            .last()
            .unwrap_or(&self.root)
            .keys()
            .map(String::as_str)
            .collect()
    }

    /// The binary buffer of this pass.
    pub fn binary(&self) -> &BinaryBuffer {
        &self.binary
    }

    fn current(&mut self) -> &mut Node {
        match self.open.last_mut() {
            Some(node) => node,
            None => &mut self.root,
        }
    }
}

impl Scoped for Deserializer {
    fn begin_scope(&mut self, name: &str) -> Result<()> {
        match self.consume_value(name)? {
            Tree::Object(node) => {
                self.scopes.enter(name);
                self.open.push(node);
                Ok(())
            }
            other => Err(self
                .scopes
                .type_mismatch(name, "object", format!("found {}", tree::kind_name(&other)))),
        }
    }

    fn end_scope(&mut self) {
        self.scopes.exit();
        self.open.pop();
    }

    fn scopes(&mut self) -> &mut ScopeStack {
        &mut self.scopes
    }
}
