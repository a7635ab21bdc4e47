//! Diagnostic scope tracking.
//!
//! The [`ScopeStack`] records the names of the composite fields currently being
//! visited. It has no influence on the shape of the tree; it only feeds the `path`
//! of structural errors.

use crate::binary::Region;
use crate::error::{Result, TreeBinError};

/// Separator used when rendering a path, innermost scope first.
pub const PATH_SEPARATOR: &str = " <- ";

/// Ordered stack of scope names, innermost last.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScopeStack {
    names: Vec<String>,
}

impl ScopeStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `name` as the innermost scope.
    pub fn enter(&mut self, name: impl Into<String>) {
        self.names.push(name.into());
    }

    /// Removes the innermost scope.
    pub fn exit(&mut self) -> Option<String> {
        self.names.pop()
    }

    /// Number of open scopes.
    pub fn depth(&self) -> usize {
        self.names.len()
    }

    /// Renders the path innermost first, e.g. `street <- home <- Person`.
    ///
    /// An empty stack renders as `<root>`.
    pub fn render_path(&self) -> String {
        if self.names.is_empty() {
            return "<root>".to_string();
        }
        let mut out = String::new();
        for (i, name) in self.names.iter().rev().enumerate() {
            if i > 0 {
                out.push_str(PATH_SEPARATOR);
            }
            out.push_str(name);
        }
        out
    }

    /// Runs `f` inside a diagnostic scope named `name`.
    ///
    /// The scope is removed again on every exit path of `f`, including errors, so the
    /// stack always returns to the depth it had before the call.
    pub fn within<T, F>(&mut self, name: impl Into<String>, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.enter(name);
        let res = f(self);
        self.exit();
        res
    }

    pub(crate) fn duplicate_key(&self, key: &str) -> TreeBinError {
        TreeBinError::DuplicateKey {
            key: key.to_string(),
            path: self.render_path(),
        }
    }

    pub(crate) fn missing_field(&self, key: &str) -> TreeBinError {
        TreeBinError::MissingField {
            key: key.to_string(),
            path: self.render_path(),
        }
    }

    pub(crate) fn type_mismatch(
        &self,
        key: &str,
        expected: &'static str,
        detail: impl Into<String>,
    ) -> TreeBinError {
        TreeBinError::TypeMismatch {
            key: key.to_string(),
            expected,
            detail: detail.into(),
            path: self.render_path(),
        }
    }

    pub(crate) fn value_mismatch(
        &self,
        key: &str,
        expected: &dyn std::fmt::Debug,
        found: &dyn std::fmt::Debug,
    ) -> TreeBinError {
        TreeBinError::ValueMismatch {
            key: key.to_string(),
            expected: format!("{expected:?}"),
            found: format!("{found:?}"),
            path: self.render_path(),
        }
    }

    pub(crate) fn invalid_range(&self, region: Region, len: usize) -> TreeBinError {
        TreeBinError::InvalidRange {
            begin: region.begin,
            end: region.end,
            len: len as u64,
            path: self.render_path(),
        }
    }
}

/// Enter/exit hooks implemented once per direction.
///
/// The serializer opens a new child node on `begin_scope`; the deserializer
/// detaches an existing one. Both record the name on their [`ScopeStack`].
pub trait Scoped {
    /// Opens the composite scope `name`.
    fn begin_scope(&mut self, name: &str) -> Result<()>;

    /// Closes the innermost composite scope opened by `begin_scope`.
    fn end_scope(&mut self);

    /// The diagnostic stack of this pass.
    fn scopes(&mut self) -> &mut ScopeStack;

    /// Runs `f` between a matched `begin_scope`/`end_scope` pair.
    ///
    /// `end_scope` runs whether or not `f` fails. If `begin_scope` itself fails, no
    /// scope is left open.
    fn scoped<T, F>(&mut self, name: &str, f: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.begin_scope(name)?;
        let res = f(self);
        self.end_scope();
        res
    }

    /// Runs `f` inside a diagnostic-only scope that does not touch the tree.
    fn labeled<T, F>(&mut self, label: impl Into<String>, f: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.scopes().enter(label);
        let res = f(self);
        self.scopes().exit();
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_innermost_first() {
        let mut stack = ScopeStack::new();
        assert_eq!(stack.render_path(), "<root>");
        stack.enter("Person");
        stack.enter("home");
        stack.enter("street");
        assert_eq!(stack.render_path(), "street <- home <- Person");
        assert_eq!(stack.exit().as_deref(), Some("street"));
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn within_pops_on_error() {
        let mut stack = ScopeStack::new();
        stack.enter("outer");
        let res: Result<()> = stack.within("inner", |s| {
            Err(TreeBinError::MissingField {
                key: "x".into(),
                path: s.render_path(),
            })
        });
        let err = res.expect_err("inner scope should fail");
        assert_eq!(err.scope_path(), Some("inner <- outer"));
        assert_eq!(stack.depth(), 1);
    }
}
