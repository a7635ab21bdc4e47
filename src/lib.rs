//! # treebin
//!
//! A bidirectional tree serialization framework. One type-driven protocol writes
//! structured values to a combined text + binary document and reads them back, with
//! scope-aware diagnostics and content hashing.
//!
//! ## Overview
//!
//! A composite type describes its shape once per direction: `send` pushes each field
//! into a [`Serializer`], `receive` consumes the same fields in the same order from a
//! [`Deserializer`]. `#[derive(Transfer)]` writes both from the struct definition.
//!
//! Values are sorted into three categories at compile time:
//!
//! *   **Primitives** (integers, floats, `bool`, `char`, `String`) become tree leaves.
//! *   **Enums** (fieldless, via the derive) are stored as their underlying integer.
//! *   **Composites** open a named child node and recurse.
//!
//! Raw bytes bypass the tree: [`Serializer::push_bytes`] appends them to one binary
//! buffer shared by the whole pass and records a `Begin`/`End` region in the tree.
//!
//! ## File Format
//!
//! ```text
//! [ tree text (UTF-8, insertion-ordered JSON) ] [ 0x00 ] [ binary buffer ]
//! ```
//!
//! Region offsets in the text are relative to the first byte after the NUL.
//!
//! ## Usage
//!
//! ```rust
//! use treebin::{ByteBuffer, Optional, Sequence, TreeBin, Transfer};
//!
//! #[derive(Default, Debug, Clone, Copy, PartialEq, Transfer)]
//! #[repr(u8)]
//! enum Role { #[default] User = 0, Assistant = 1 }
//!
//! #[derive(Default, Debug, Clone, PartialEq, Transfer)]
//! struct Message {
//!     role: Role,
//!     content: String,
//!     attachment: Optional<ByteBuffer>,
//! }
//!
//! #[derive(Default, Debug, Clone, PartialEq, Transfer)]
//! struct Conversation {
//!     title: String,
//!     messages: Sequence<Message>,
//! }
//!
//! let convo = Conversation {
//!     title: "demo".into(),
//!     messages: vec![Message {
//!         role: Role::Assistant,
//!         content: "hello".into(),
//!         attachment: ByteBuffer::from("raw bytes").into(),
//!     }]
//!     .into(),
//! };
//!
//! let bytes = TreeBin::to_bytes(&convo)?;
//! let back: Conversation = TreeBin::from_bytes(&bytes)?;
//! assert_eq!(back, convo);
//! assert!(TreeBin::equals(&back, &convo)?);
//! # Ok::<(), treebin::TreeBinError>(())
//! ```
//!
//! ## Errors
//!
//! Every failure is a [`TreeBinError`] carrying the scope path at the point of
//! detection. Nothing is retried or recovered internally; callers decide whether a
//! failed load falls back to a default.
//!
//! ## Concurrency
//!
//! A serializer or deserializer serves exactly one pass over one value. File I/O is
//! blocking. Two [`FileBacked`] values over the same path race; the last writer wins.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

// Lets the derive's `::treebin::` paths resolve inside this crate too.
extern crate self as treebin;

pub mod api;
pub mod backed;
pub mod binary;
pub mod codec;
pub mod containers;
pub mod de;
pub mod error;
pub mod hash;
pub mod scope;
pub mod ser;
pub mod transfer;
pub mod tree;

// --- RE-EXPORTS ---

pub use api::{LoadPolicy, TreeBin, TreeBinOptions};
pub use backed::FileBacked;
pub use binary::{BinaryBuffer, Region};
pub use containers::{ByteBuffer, FixedArray, Optional, Sequence};
pub use de::Deserializer;
pub use error::{Result, TreeBinError};
pub use scope::{ScopeStack, Scoped};
pub use ser::Serializer;
pub use transfer::{Field, Primitive, Transfer, TransferEnum};

// Re-export the derive macro so it is accessible as `treebin::Transfer`
pub use treebin_derive::Transfer;
