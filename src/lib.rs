//! # treeform
//!
//! `treeform` is a Rust library for parsing and evaluating mathematical
//! expressions over **complex numbers** and **complex matrices**.
//!
//! ## Overview
//! - Parse expressions with real and imaginary literals (`3.6`, `2i`,
//!   `1.5e-3j`) and brace-delimited matrix literals (`{{1, 2}, {3, 4}}`).
//! - Evaluate with built-in operators, constants, and mathematical
//!   functions, or register your own.
//! - Bind variables externally through a [`Context`], so one built tree can
//!   be re-evaluated against different bindings without rebuilding.
//! - Render any tree back to a canonical string with minimal parentheses.
//!
//! Internally, expressions are first tokenized into lexemes, then built
//! into an expression tree by precedence climbing; the tree evaluates with
//! an exhaustive match over its node kinds and renders itself from
//! per-operator precedence metadata.
//!
//! ## Feature Highlights
//! - **Complex scalars and matrices** using [`num_complex::Complex<f64>`]
//!   and [`nalgebra::DMatrix`]
//! - **Flyweight constants** shared by identity within a
//!   [`ConstantRegistry`]
//! - **Function metadata** (category, description, signatures, worked
//!   examples) carried by every [`FunctionRegistry`] entry
//! - **Partial builders** that declare a reduced operator surface and fail
//!   fast at build time
//!
//! ## Example
//! ```rust
//! use treeform::{parse, Context, Value};
//!
//! let tree = parse("sin(x + 2) - 3.6")?;
//!
//! let mut ctx = Context::new();
//! ctx.set("x", Value::real(-2.0));
//! assert_eq!(tree.eval(&ctx)?, Value::real(-3.6));
//!
//! // Same tree, new binding, no rebuild.
//! ctx.set("x", Value::complex(-2.0, 1.0));
//! let with_imaginary = tree.eval(&ctx)?;
//! # let _ = with_imaginary;
//! # Ok::<(), treeform::ExprError>(())
//! ```
//!
//! ## Example: Matrices
//! ```rust
//! use treeform::{parse, Context};
//!
//! let tree = parse("2 * {{1, 2}, {3, 4}} + {{i, 0}, {0, i}}")?;
//! println!("{}", tree.eval(&Context::new())?);
//! # Ok::<(), treeform::ExprError>(())
//! ```
//!
//! ## Example: Real-Valued Trees
//! ```rust
//! use treeform::{Context, TreeBuilder};
//!
//! let builder = TreeBuilder::real()?;
//! let tree = builder.build_tree(Some("4^2^3"))?;
//! assert_eq!(tree.eval(&Context::new())?, 65536.0);
//! # Ok::<(), treeform::ExprError>(())
//! ```

pub mod builder;
pub mod builtins;
pub mod context;
pub mod error;
pub mod expr;
pub mod registry;
pub mod token;
pub mod value;

pub use builder::{ComplexFactory, NodeFactory, RealFactory, TreeBuilder};
pub use context::Context;
pub use error::{ExprError, Result};
pub use expr::{BinaryOp, Expr, UnaryOp};
pub use registry::{
    ArgType, ConstantDef, ConstantRegistry, FunctionDef, FunctionRegistry, FunctionSpec, Usage,
};
pub use token::{Token, TokenKind, Tokenizer};
pub use value::{ExprValue, Value};

/// Parses `text` with the stock complex/matrix-capable builder.
///
/// Convenience for one-off use; callers that parse many expressions should
/// hold a [`TreeBuilder`] and reuse it, so constants keep their shared
/// identity across trees.
pub fn parse(text: &str) -> Result<Expr<Value>> {
    TreeBuilder::complex()?.build_tree(Some(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_convenience() {
        let tree = parse("abs(3+4i)").unwrap();
        assert_eq!(tree.eval(&Context::new()).unwrap(), Value::real(5.0));
    }

    #[test]
    fn test_parse_reports_builder_errors() {
        assert!(matches!(parse("3+"), Err(ExprError::Syntax { .. })));
    }
}
