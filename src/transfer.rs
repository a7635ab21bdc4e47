//! The capability traits that describe how values cross a transfer pass.
//!
//! Three categories exist and each is resolved at compile time:
//!
//! - **Primitives** ([`Primitive`]): integers, floats, `bool`, `char` and `String`,
//!   stored directly as tree leaves.
//! - **Enums** ([`TransferEnum`]): fieldless enums, stored as their underlying
//!   integer.
//! - **Composites** ([`Transfer`]): types that describe their own field shape through
//!   a paired `send`/`receive`.
//!
//! [`Field`] is the common entry point used by [`Serializer::push`] and
//! [`Deserializer::consume`]; every category implements it by forwarding to the
//! matching per-category operation. `#[derive(Transfer)]` writes both impls for
//! structs and enums.

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::de::Deserializer;
use crate::error::Result;
use crate::ser::Serializer;

/// A composite value with a symmetric field shape.
///
/// `send` and `receive` must describe the identical fields in the identical order.
///
/// ```rust
/// use treebin::{Deserializer, Result, Serializer, Transfer};
///
/// #[derive(Default, Debug, PartialEq)]
/// struct Point { x: i32, y: i32 }
///
/// impl Transfer for Point {
///     const TYPE_NAME: &'static str = "Point";
///
///     fn send(&self, ser: &mut Serializer) -> Result<()> {
///         ser.push("x", &self.x)?;
///         ser.push("y", &self.y)
///     }
///
///     fn receive(&mut self, de: &mut Deserializer) -> Result<()> {
///         self.x = de.consume("x")?;
///         self.y = de.consume("y")?;
///         Ok(())
///     }
/// }
///
/// let bytes = treebin::TreeBin::to_bytes(&Point { x: 1, y: -2 })?;
/// let back: Point = treebin::TreeBin::from_bytes(&bytes)?;
/// assert_eq!(back, Point { x: 1, y: -2 });
/// # Ok::<(), treebin::TreeBinError>(())
/// ```
///
/// To nest a hand-written composite inside other composites it also needs a
/// [`Field`] impl forwarding to [`Serializer::push_composite`] and
/// [`Deserializer::consume_composite`]; the derive emits that automatically.
pub trait Transfer {
    /// Label of this type in diagnostic paths.
    const TYPE_NAME: &'static str;

    /// Pushes every field into `ser`.
    fn send(&self, ser: &mut Serializer) -> Result<()>;

    /// Consumes every field from `de`, overwriting `self`.
    fn receive(&mut self, de: &mut Deserializer) -> Result<()>;
}

/// A value that can be stored under a field name.
pub trait Field: Sized {
    /// Stores `self` under `name` in the current node of `ser`.
    fn push_field(&self, name: &str, ser: &mut Serializer) -> Result<()>;

    /// Removes the field `name` from the current node of `de` and converts it.
    fn consume_field(name: &str, de: &mut Deserializer) -> Result<Self>;
}

/// A leaf type stored directly in the tree.
pub trait Primitive: Serialize + DeserializeOwned + PartialEq + Debug {
    /// Label used in type mismatch reports.
    const TYPE_NAME: &'static str;
}

/// A fieldless enum stored as its underlying integer.
pub trait TransferEnum: Sized {
    /// The underlying integer type.
    type Repr: Primitive;

    /// Label used in type mismatch reports.
    const TYPE_NAME: &'static str;

    /// Discriminant of `self`.
    fn to_repr(&self) -> Self::Repr;

    /// Variant with discriminant `raw`, if any.
    fn from_repr(raw: Self::Repr) -> Option<Self>;
}

macro_rules! impl_primitive {
    ($($t:ty),*) => {
        $(
            impl Primitive for $t {
                const TYPE_NAME: &'static str = stringify!($t);
            }

            impl Field for $t {
                fn push_field(&self, name: &str, ser: &mut Serializer) -> Result<()> {
                    ser.push_primitive(name, self)
                }

                fn consume_field(name: &str, de: &mut Deserializer) -> Result<Self> {
                    de.consume_primitive(name)
                }
            }
        )*
    }
}

impl_primitive!(
    u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64, bool, char, String
);
