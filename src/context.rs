//! # context.rs
//!
//! This module provides the [`Context`] struct, which carries the variable
//! bindings an expression tree is evaluated against.
//!
//! Bindings live outside the tree: the same built tree may be evaluated
//! repeatedly against different contexts without rebuilding, and evaluation
//! never writes to the tree itself. Evaluating a variable leaf whose name has
//! no binding fails with [`crate::ExprError::UnassignedVariable`].

use std::collections::HashMap;

/// A collection of named variable bindings for expression evaluation.
///
/// # Examples
///
/// ```
/// use treeform::{Context, Value};
///
/// let mut ctx = Context::default();
/// ctx.set("x", Value::real(2.0));
/// ctx.set("y", Value::complex(0.0, 1.0));
///
/// assert!(ctx.contains("x"));
/// assert_eq!(ctx.get("y"), Some(&Value::complex(0.0, 1.0)));
/// ```
#[derive(Debug, Clone)]
pub struct Context<T> {
    bindings: HashMap<String, T>,
}

impl<T: Clone> Context<T> {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Constructs a context from a slice of name/value pairs.
    ///
    /// # Examples
    ///
    /// ```
    /// use treeform::Context;
    ///
    /// let ctx = Context::from(&[("a", 1.0), ("b", 2.0)]);
    /// assert!(ctx.contains("a"));
    /// ```
    pub fn from(items: &[(&str, T)]) -> Self {
        let mut ctx = Self::new();
        for (name, value) in items {
            ctx.set(name, value.clone());
        }
        ctx
    }

    /// Binds `name` to `value`, replacing any previous binding.
    pub fn set(&mut self, name: &str, value: T) {
        self.bindings.insert(name.to_string(), value);
    }

    /// Returns the value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.bindings.get(name)
    }

    /// Checks whether `name` has a binding.
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Removes the binding for `name`, returning its value.
    pub fn unset(&mut self, name: &str) -> Option<T> {
        self.bindings.remove(name)
    }

    /// Removes all bindings.
    pub fn clear(&mut self) {
        self.bindings.clear();
    }
}

impl<T: Clone> Default for Context<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut ctx = Context::new();
        ctx.set("a", 1.0);
        ctx.set("b", 2.5);

        assert_eq!(ctx.get("a"), Some(&1.0));
        assert_eq!(ctx.get("b"), Some(&2.5));
        assert_eq!(ctx.get("c"), None);
    }

    #[test]
    fn test_rebinding_replaces() {
        let mut ctx = Context::new();
        ctx.set("x", 1.0);
        ctx.set("x", 3.0);
        assert_eq!(ctx.get("x"), Some(&3.0));
    }

    #[test]
    fn test_unset_and_clear() {
        let mut ctx = Context::from(&[("x", 1.0), ("y", 2.0)]);
        assert_eq!(ctx.unset("x"), Some(1.0));
        assert!(!ctx.contains("x"));

        ctx.clear();
        assert!(!ctx.contains("y"));
    }

    #[test]
    fn test_default_is_empty() {
        let ctx: Context<f64> = Context::default();
        assert!(!ctx.contains("anything"));
    }
}
