//! The Tree Value: the structural half of every document.
//!
//! Trees are JSON object models with insertion-ordered keys (`serde_json` with the
//! `preserve_order` feature). Key order follows the order fields were pushed, but
//! readers never depend on it.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer as JsonSerializer};

use crate::error::{Result, TreeBinError};

/// Any tree value: object, array, number, boolean, string or null.
pub type Tree = serde_json::Value;

/// One object level of the tree. Keys are unique per node.
pub type Node = serde_json::Map<String, Tree>;

/// Renders `node` as text.
///
/// `indent = None` produces compact text (used for hashing); `Some(n)` pretty-prints
/// with `n` spaces per level.
pub fn to_text(node: &Node, indent: Option<usize>) -> Result<String> {
    let bytes = match indent {
        None => serde_json::to_vec(node).map_err(|e| TreeBinError::Format(e.to_string()))?,
        Some(width) => {
            let pad = vec![b' '; width];
            let mut out = Vec::new();
            let mut ser =
                JsonSerializer::with_formatter(&mut out, PrettyFormatter::with_indent(&pad));
            node.serialize(&mut ser)
                .map_err(|e| TreeBinError::Format(e.to_string()))?;
            out
        }
    };
    String::from_utf8(bytes).map_err(|e| TreeBinError::Format(e.to_string()))
}

/// Compact text with the keys of every object sorted.
///
/// Two trees holding the same fields render identically here regardless of the
/// order in which the fields were pushed.
pub fn canonical_text(node: &Node) -> Result<String> {
    to_text(&sorted(node), None)
}

fn sorted(node: &Node) -> Node {
    let mut keys: Vec<&String> = node.keys().collect();
    keys.sort();
    let mut out = Node::new();
    for key in keys {
        if let Some(value) = node.get(key) {
            out.insert(key.clone(), sorted_value(value));
        }
    }
    out
}

fn sorted_value(value: &Tree) -> Tree {
    match value {
        Tree::Object(node) => Tree::Object(sorted(node)),
        Tree::Array(items) => Tree::Array(items.iter().map(sorted_value).collect()),
        other => other.clone(),
    }
}

/// Parses the text portion of a document. The top level must be an object.
pub fn parse_text(text: &str) -> Result<Node> {
    let value: Tree = serde_json::from_str(text)
        .map_err(|e| TreeBinError::Format(format!("invalid tree text: {e}")))?;
    match value {
        Tree::Object(node) => Ok(node),
        other => Err(TreeBinError::Format(format!(
            "top level of tree must be an object, found {}",
            kind_name(&other)
        ))),
    }
}

/// Short human-readable name of a value's kind, for diagnostics.
pub fn kind_name(value: &Tree) -> &'static str {
    match value {
        Tree::Null => "null",
        Tree::Bool(_) => "boolean",
        Tree::Number(_) => "number",
        Tree::String(_) => "string",
        Tree::Array(_) => "array",
        Tree::Object(_) => "object",
    }
}
