//! The write side of a transfer pass.
//!
//! A [`Serializer`] builds one tree and one binary buffer for exactly one top-level
//! value. Open composite scopes are kept as a stack of owned nodes; closing a scope
//! attaches the finished node to its parent, so no reference into the tree is held
//! while nested values are written.

use tracing::trace;

use crate::binary::{BinaryBuffer, Region, BEGIN_KEY, END_KEY};
use crate::codec;
use crate::error::Result;
use crate::scope::{ScopeStack, Scoped};
use crate::transfer::{Field, Primitive, Transfer, TransferEnum};
use crate::tree::{self, Node, Tree};

/// Builds a tree + binary document from `send` calls.
#[derive(Debug, Default)]
pub struct Serializer {
    root: Node,
    open: Vec<(String, Node)>,
    binary: BinaryBuffer,
    scopes: ScopeStack,
}

impl Serializer {
    /// Creates a serializer with an empty tree and buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a whole top-level value, labelled with its type name.
    pub fn write_value<T: Transfer + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.labeled(T::TYPE_NAME, |s| value.send(s))
    }

    /// Stores `value` under `name`, dispatching on its category.
    pub fn push<T: Field>(&mut self, name: &str, value: &T) -> Result<()> {
        value.push_field(name, self)
    }

    /// Stores a leaf value. Fails with `DuplicateKey` if `name` is taken.
    ///
    /// Values the tree cannot represent, such as NaN or infinite floats, fail with
    /// `TypeMismatch` instead of being written as `null`.
    pub fn push_primitive<P: Primitive>(&mut self, name: &str, value: &P) -> Result<()> {
        let leaf = serde_json::to_value(value)
            .map_err(|e| self.scopes.type_mismatch(name, P::TYPE_NAME, e.to_string()))?;
        if leaf.is_null() {
            return Err(self.scopes.type_mismatch(
                name,
                P::TYPE_NAME,
                format!("{value:?} has no tree representation"),
            ));
        }
        self.insert_checked(name, leaf)
    }

    /// Stores an enum as its underlying integer.
    pub fn push_enum<E: TransferEnum>(&mut self, name: &str, value: &E) -> Result<()> {
        self.push_primitive(name, &value.to_repr())
    }

    /// Opens the child node `name` and lets `value` fill it.
    pub fn push_composite<T: Transfer + ?Sized>(&mut self, name: &str, value: &T) -> Result<()> {
        self.scoped(name, |s| value.send(s))
    }

    /// Appends `bytes` to the binary buffer and records its region under `name`.
    ///
    /// The region is stored as `name: { "Begin": b, "End": e }`. Nothing is appended
    /// if `name` is already taken.
    pub fn push_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<Region> {
        self.scoped(name, |s| {
            let region = s.binary.append(bytes);
            s.insert_checked(BEGIN_KEY, Tree::from(region.begin))?;
            s.insert_checked(END_KEY, Tree::from(region.end))?;
            trace!(field = name, begin = region.begin, end = region.end, "pushed binary region");
            Ok(region)
        })
    }

    /// The binary buffer accumulated so far.
    pub fn binary(&self) -> &BinaryBuffer {
        &self.binary
    }

    /// The root node. Scopes that are still open are not attached yet.
    pub fn tree(&self) -> &Node {
        &self.root
    }

    /// Renders the tree as text; `None` gives the compact form.
    pub fn dump(&self, indent: Option<usize>) -> Result<String> {
        tree::to_text(&self.root, indent)
    }

    /// Finishes the pass, returning the tree and the binary buffer.
    pub fn finish(self) -> (Node, BinaryBuffer) {
        (self.root, self.binary)
    }

    /// Finishes the pass and encodes the full document.
    pub fn into_document(self, indent: Option<usize>) -> Result<Vec<u8>> {
        let text = self.dump(indent)?;
        codec::encode(&text, self.binary.as_bytes())
    }

    fn current(&mut self) -> &mut Node {
        match self.open.last_mut() {
            Some((_, node)) => node,
            None => &mut self.root,
        }
    }

    fn insert_checked(&mut self, name: &str, value: Tree) -> Result<()> {
        if self.current().contains_key(name) {
            return Err(self.scopes.duplicate_key(name));
        }
        self.current().insert(name.to_string(), value);
        Ok(())
    }
}

impl Scoped for Serializer {
    fn begin_scope(&mut self, name: &str) -> Result<()> {
        if self.current().contains_key(name) {
            return Err(self.scopes.duplicate_key(name));
        }
        self.scopes.enter(name);
        self.open.push((name.to_string(), Node::new()));
        Ok(())
    }

    fn end_scope(&mut self) {
        self.scopes.exit();
        if let Some((name, node)) = self.open.pop() {
            self.current().insert(name, Tree::Object(node));
        }
    }

    fn scopes(&mut self) -> &mut ScopeStack {
        &mut self.scopes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TreeBinError;
    use serde_json::json;

    #[test]
    fn duplicate_primitive_is_rejected() {
        let mut ser = Serializer::new();
        ser.push("id", &7u32).expect("first push");
        let err = ser.push("id", &8u32).expect_err("second push must fail");
        assert!(matches!(err, TreeBinError::DuplicateKey { ref key, .. } if key == "id"));
        assert_eq!(ser.tree().get("id"), Some(&json!(7)));
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        let mut ser = Serializer::new();
        for (name, value) in [("nan", f64::NAN), ("inf", f64::INFINITY), ("ninf", f64::NEG_INFINITY)] {
            let err = ser.push(name, &value).expect_err("non-finite float");
            assert!(matches!(
                err,
                TreeBinError::TypeMismatch { ref key, expected: "f64", .. } if key == name
            ));
        }
        let err = ser.push("small", &f32::NAN).expect_err("non-finite f32");
        assert!(matches!(err, TreeBinError::TypeMismatch { expected: "f32", .. }));
        assert!(ser.tree().is_empty());
        ser.push("finite", &1.5f64).expect("finite float");
    }

    #[test]
    fn duplicate_scope_is_rejected_before_entering() {
        let mut ser = Serializer::new();
        ser.push_bytes("blob", b"abc").expect("first blob");
        let err = ser.push_bytes("blob", b"xyz").expect_err("second blob must fail");
        assert_eq!(err.scope_path(), Some("<root>"));
        assert_eq!(ser.binary().len(), 3);
    }

    #[test]
    fn bytes_are_recorded_as_nested_region() {
        let mut ser = Serializer::new();
        ser.push_bytes("a", b"hello").expect("push a");
        let region = ser.push_bytes("b", b"!").expect("push b");
        assert_eq!(region, Region::new(5, 6));
        let (root, binary) = ser.finish();
        assert_eq!(root.get("a"), Some(&json!({"Begin": 0, "End": 5})));
        assert_eq!(root.get("b"), Some(&json!({"Begin": 5, "End": 6})));
        assert_eq!(binary.as_bytes(), b"hello!");
    }

    #[test]
    fn scopes_nest_in_the_tree() {
        let mut ser = Serializer::new();
        ser.scoped("outer", |s| {
            s.push("x", &1i64)?;
            s.scoped("inner", |s| s.push("flag", &true))
        })
        .expect("nested scopes");
        ser.push("after", &"tail".to_string()).expect("push after");
        assert_eq!(
            ser.dump(None).expect("dump"),
            r#"{"outer":{"x":1,"inner":{"flag":true}},"after":"tail"}"#
        );
    }
}
