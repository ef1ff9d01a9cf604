//! # builder.rs
//!
//! Precedence-climbing tree builder over the token stream, parameterized by
//! a [`NodeFactory`] that supplies the value-type-specific pieces: which
//! tokenizer to run, how to turn a raw scalar token into a leaf, and which
//! node kinds the builder may construct at all.
//!
//! Grammar, loosest to tightest binding:
//!
//! ```text
//! additive       := multiplicative (('+' | '-') multiplicative)*
//! multiplicative := power (('*' | '/') power)*
//! power          := unary ('^' power)?
//! unary          := '-' unary | primary
//! primary        := scalar | identifier | function '(' args ')'
//!                 | '(' additive ')' | matrix
//! matrix         := '{' row (',' row)* '}'    row := '{' args '}'
//! args           := additive (',' additive)*
//! ```
//!
//! `+ - * /` are left-associative, `^` is right-associative and negation
//! binds between `^` and its operand, so `-x^2` is `(-x)^2` and `4^2^3` is
//! `4^(2^3)`.
//!
//! A factory that declines a construction makes the builder fail fast at
//! build time with [`ExprError::UnsupportedConstruction`], before any
//! evaluation can run.

use crate::builtins;
use crate::error::{ExprError, Result};
use crate::expr::{BinaryOp, Expr, UnaryOp};
use crate::registry::{ConstantRegistry, FunctionRegistry};
use crate::token::{Token, TokenKind, Tokenizer, IMAGINARY_MARKER};
use crate::value::{ExprValue, Value};

/// Value-type-specific construction hooks for the tree builder.
///
/// The default method bodies give a full-capability factory; a partial
/// builder overrides [`supported_binary`](Self::supported_binary) or
/// [`supports_negation`](Self::supports_negation) to declare a smaller
/// surface and gets fail-fast build errors for everything outside it.
pub trait NodeFactory {
    type Value: ExprValue;

    /// Factory name used in [`ExprError::UnsupportedConstruction`].
    fn name(&self) -> &'static str;

    /// The tokenizer this builder runs over its input.
    fn tokenizer(&self) -> Tokenizer;

    /// Parses a raw scalar token into a leaf node.
    fn parse_scalar(&self, raw: &str) -> Result<Expr<Self::Value>>;

    /// The binary operators this factory constructs nodes for.
    fn supported_binary(&self) -> &[BinaryOp] {
        BinaryOp::ALL
    }

    /// Whether this factory constructs negation nodes.
    fn supports_negation(&self) -> bool {
        true
    }

    /// Constructs a binary node, or fails fast for an undeclared operator.
    fn binary(
        &self,
        op: BinaryOp,
        left: Expr<Self::Value>,
        right: Expr<Self::Value>,
    ) -> Result<Expr<Self::Value>> {
        if self.supported_binary().contains(&op) {
            Ok(Expr::binary(op, left, right))
        } else {
            Err(ExprError::UnsupportedConstruction {
                builder: self.name(),
                operator: op.symbol().to_string(),
            })
        }
    }

    /// Constructs a negation node, or fails fast.
    fn unary(&self, op: UnaryOp, operand: Expr<Self::Value>) -> Result<Expr<Self::Value>> {
        if self.supports_negation() {
            Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            })
        } else {
            Err(ExprError::UnsupportedConstruction {
                builder: self.name(),
                operator: op.symbol().to_string(),
            })
        }
    }

    /// Constructs a matrix-literal node. Factories over value types with no
    /// matrix representation keep this default and reject the construction.
    fn matrix(
        &self,
        _stride: usize,
        _elems: Vec<Expr<Self::Value>>,
    ) -> Result<Expr<Self::Value>> {
        Err(ExprError::UnsupportedConstruction {
            builder: self.name(),
            operator: "{".to_string(),
        })
    }
}

/// Read cursor over a token slice. The slice always ends with the end
/// marker, so `peek` is total.
struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Cursor { tokens, pos: 0 }
    }

    fn peek(&self) -> &'a Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn next(&mut self) -> &'a Token {
        let token = self.peek();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }
}

/// Builds expression trees from text, using a factory for construction and
/// a pair of registries for constant and function lookup.
pub struct TreeBuilder<F: NodeFactory> {
    factory: F,
    constants: ConstantRegistry<F::Value>,
    functions: FunctionRegistry<F::Value>,
}

impl<F: NodeFactory> TreeBuilder<F> {
    /// Builder over explicit registries.
    pub fn new(
        factory: F,
        constants: ConstantRegistry<F::Value>,
        functions: FunctionRegistry<F::Value>,
    ) -> Self {
        TreeBuilder {
            factory,
            constants,
            functions,
        }
    }

    /// The constant registry, for registering additional constants.
    pub fn constants_mut(&mut self) -> &mut ConstantRegistry<F::Value> {
        &mut self.constants
    }

    /// The function registry, for registering additional functions.
    pub fn functions_mut(&mut self) -> &mut FunctionRegistry<F::Value> {
        &mut self.functions
    }

    /// Builds the expression tree for `text`.
    ///
    /// # Errors
    ///
    /// * [`ExprError::AbsentInput`] when `text` is `None` — distinct from
    ///   any malformed-input failure.
    /// * [`ExprError::Syntax`] when the grammar is violated, naming the
    ///   unexpected token.
    /// * [`ExprError::UnsupportedConstruction`] when the factory declines a
    ///   node kind the text requires.
    ///
    /// # Examples
    ///
    /// ```
    /// use treeform::{Context, TreeBuilder};
    ///
    /// let builder = TreeBuilder::real()?;
    /// let tree = builder.build_tree(Some("3*5+16*-3"))?;
    /// assert_eq!(tree.eval(&Context::new())?, -33.0);
    /// # Ok::<(), treeform::ExprError>(())
    /// ```
    pub fn build_tree(&self, text: Option<&str>) -> Result<Expr<F::Value>> {
        let text = text.ok_or(ExprError::AbsentInput)?;
        let tokens = self.factory.tokenizer().tokens(text)?;
        let mut cursor = Cursor::new(&tokens);
        let tree = self.additive(&mut cursor)?;
        // A complete expression must consume everything up to the marker.
        match cursor.peek().kind() {
            TokenKind::End => Ok(tree),
            _ => Err(ExprError::Syntax {
                found: cursor.peek().value().to_string(),
            }),
        }
    }

    fn additive(&self, cursor: &mut Cursor) -> Result<Expr<F::Value>> {
        let mut node = self.multiplicative(cursor)?;
        loop {
            let op = if cursor.peek().is_operator("+") {
                BinaryOp::Add
            } else if cursor.peek().is_operator("-") {
                BinaryOp::Sub
            } else {
                return Ok(node);
            };
            cursor.next();
            let rhs = self.multiplicative(cursor)?;
            node = self.factory.binary(op, node, rhs)?;
        }
    }

    fn multiplicative(&self, cursor: &mut Cursor) -> Result<Expr<F::Value>> {
        let mut node = self.power(cursor)?;
        loop {
            let op = if cursor.peek().is_operator("*") {
                BinaryOp::Mul
            } else if cursor.peek().is_operator("/") {
                BinaryOp::Div
            } else {
                return Ok(node);
            };
            cursor.next();
            let rhs = self.power(cursor)?;
            node = self.factory.binary(op, node, rhs)?;
        }
    }

    // Right recursion gives `^` its right associativity.
    fn power(&self, cursor: &mut Cursor) -> Result<Expr<F::Value>> {
        let base = self.unary(cursor)?;
        if cursor.peek().is_operator("^") {
            cursor.next();
            let exponent = self.power(cursor)?;
            self.factory.binary(BinaryOp::Pow, base, exponent)
        } else {
            Ok(base)
        }
    }

    fn unary(&self, cursor: &mut Cursor) -> Result<Expr<F::Value>> {
        if cursor.peek().is_operator("-") {
            cursor.next();
            let operand = self.unary(cursor)?;
            self.factory.unary(UnaryOp::Neg, operand)
        } else {
            self.primary(cursor)
        }
    }

    fn primary(&self, cursor: &mut Cursor) -> Result<Expr<F::Value>> {
        let token = cursor.next();
        match token.kind() {
            TokenKind::Scalar => self.factory.parse_scalar(token.value()),
            // An identifier is a registered constant if the registry knows
            // it, otherwise a variable bound at evaluation time.
            TokenKind::Identifier => Ok(self
                .constants
                .get(token.value())
                .unwrap_or_else(|| Expr::variable(token.value()))),
            TokenKind::Function => {
                let name = token.value();
                self.expect(cursor, "(")?;
                let args = if cursor.peek().is_operator(")") {
                    Vec::new()
                } else {
                    self.argument_list(cursor)?
                };
                self.expect(cursor, ")")?;
                match self.functions.create_call(name, args)? {
                    Some(node) => Ok(node),
                    // Unknown function names are errors; unknown plain
                    // identifiers are variables.
                    None => Err(ExprError::Syntax {
                        found: name.to_string(),
                    }),
                }
            }
            TokenKind::Operator if token.value() == "(" => {
                let node = self.additive(cursor)?;
                self.expect(cursor, ")")?;
                Ok(node)
            }
            TokenKind::Operator if token.value() == "{" => self.matrix_literal(cursor),
            _ => Err(ExprError::Syntax {
                found: token.value().to_string(),
            }),
        }
    }

    fn argument_list(&self, cursor: &mut Cursor) -> Result<Vec<Expr<F::Value>>> {
        let mut args = vec![self.additive(cursor)?];
        while cursor.peek().is_operator(",") {
            cursor.next();
            args.push(self.additive(cursor)?);
        }
        Ok(args)
    }

    // Called with the opening `{` already consumed. Rows must all have the
    // same length; elements are flattened in row-major order.
    fn matrix_literal(&self, cursor: &mut Cursor) -> Result<Expr<F::Value>> {
        let mut elems = Vec::new();
        let mut stride = 0usize;
        loop {
            self.expect(cursor, "{")?;
            let row = self.argument_list(cursor)?;
            self.expect(cursor, "}")?;
            if stride == 0 {
                stride = row.len();
            } else if stride != row.len() {
                return Err(ExprError::Syntax {
                    found: format!("matrix row of length {}", row.len()),
                });
            }
            elems.extend(row);
            if cursor.peek().is_operator(",") {
                cursor.next();
            } else {
                break;
            }
        }
        self.expect(cursor, "}")?;
        self.factory.matrix(stride, elems)
    }

    fn expect(&self, cursor: &mut Cursor, symbol: &str) -> Result<()> {
        if cursor.peek().is_operator(symbol) {
            cursor.next();
            Ok(())
        } else {
            Err(ExprError::Syntax {
                found: cursor.peek().value().to_string(),
            })
        }
    }
}

/// Factory for plain real-valued trees. Scalar tokens are decimal literals;
/// matrix literals are not constructible.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFactory;

impl NodeFactory for RealFactory {
    type Value = f64;

    fn name(&self) -> &'static str {
        "real"
    }

    fn tokenizer(&self) -> Tokenizer {
        Tokenizer::plain()
    }

    fn parse_scalar(&self, raw: &str) -> Result<Expr<f64>> {
        raw.parse::<f64>()
            .map(Expr::Scalar)
            .map_err(|_| ExprError::Syntax {
                found: raw.to_string(),
            })
    }
}

/// Factory for complex/matrix-capable trees. Runs the imaginary-aware
/// tokenizer, so a scalar token is either a plain decimal (coerced to a
/// zero-imaginary complex) or the canonical imaginary marker.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComplexFactory;

impl NodeFactory for ComplexFactory {
    type Value = Value;

    fn name(&self) -> &'static str {
        "complex"
    }

    fn tokenizer(&self) -> Tokenizer {
        Tokenizer::imaginary()
    }

    fn parse_scalar(&self, raw: &str) -> Result<Expr<Value>> {
        if raw == IMAGINARY_MARKER {
            return Ok(Expr::Scalar(Value::i()));
        }
        raw.parse::<f64>()
            .map(|re| Expr::Scalar(Value::real(re)))
            .map_err(|_| ExprError::Syntax {
                found: raw.to_string(),
            })
    }

    fn matrix(&self, stride: usize, elems: Vec<Expr<Value>>) -> Result<Expr<Value>> {
        Ok(Expr::MatrixLiteral { stride, elems })
    }
}

impl TreeBuilder<RealFactory> {
    /// Real-valued builder with the stock constants and functions.
    pub fn real() -> Result<Self> {
        Ok(TreeBuilder::new(
            RealFactory,
            builtins::default_real_constants()?,
            builtins::default_real_functions()?,
        ))
    }
}

impl TreeBuilder<ComplexFactory> {
    /// Complex/matrix-capable builder with the stock constants and
    /// functions.
    pub fn complex() -> Result<Self> {
        Ok(TreeBuilder::new(
            ComplexFactory,
            builtins::default_complex_constants()?,
            builtins::default_complex_functions()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use approx::assert_abs_diff_eq;
    use num_complex::Complex;
    use std::rc::Rc;

    fn eval_real(text: &str) -> f64 {
        TreeBuilder::real()
            .unwrap()
            .build_tree(Some(text))
            .unwrap()
            .eval(&Context::new())
            .unwrap()
    }

    fn eval_complex(text: &str) -> Value {
        TreeBuilder::complex()
            .unwrap()
            .build_tree(Some(text))
            .unwrap()
            .eval(&Context::new())
            .unwrap()
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_abs_diff_eq!(eval_real("4^2^3"), 65536.0);
        assert_abs_diff_eq!(eval_real("(4^2)^3"), 4096.0);
    }

    #[test]
    fn test_precedence_and_unary_minus() {
        assert_abs_diff_eq!(eval_real("3*5+16*-3"), -33.0);
        assert_abs_diff_eq!(eval_real("-3^2"), 9.0);
        assert_abs_diff_eq!(eval_real("2--3"), 5.0);
    }

    #[test]
    fn test_division_left_associative() {
        assert_abs_diff_eq!(eval_real("3/5/2"), 0.3, epsilon = 1.0e-12);
    }

    #[test]
    fn test_absent_input_distinct_from_malformed() {
        let builder = TreeBuilder::real().unwrap();
        assert_eq!(builder.build_tree(None).unwrap_err(), ExprError::AbsentInput);
        assert!(matches!(
            builder.build_tree(Some("")).unwrap_err(),
            ExprError::Syntax { .. }
        ));
    }

    #[test]
    fn test_syntax_errors_name_unexpected_token() {
        let builder = TreeBuilder::real().unwrap();
        for text in ["3+", "3*(2+8", "3+5{", "(1,2)", "sin 3"] {
            assert!(
                matches!(
                    builder.build_tree(Some(text)).unwrap_err(),
                    ExprError::Syntax { .. }
                ),
                "expected syntax error for {text:?}"
            );
        }
    }

    #[test]
    fn test_function_call_with_variable() {
        let builder = TreeBuilder::real().unwrap();
        let tree = builder.build_tree(Some("sin(x + 2) - 3.6")).unwrap();
        let mut ctx = Context::new();
        ctx.set("x", -2.0);
        assert_abs_diff_eq!(tree.eval(&ctx).unwrap(), -3.6);

        let err = tree.eval(&Context::new()).unwrap_err();
        assert_eq!(err, ExprError::UnassignedVariable { name: "x".into() });
    }

    #[test]
    fn test_unknown_function_is_syntax_error() {
        let builder = TreeBuilder::real().unwrap();
        let err = builder.build_tree(Some("frob(3)")).unwrap_err();
        assert_eq!(err, ExprError::Syntax { found: "frob".into() });
    }

    #[test]
    fn test_wrong_arity_is_syntax_error() {
        let builder = TreeBuilder::real().unwrap();
        assert!(matches!(
            builder.build_tree(Some("sin(1, 2)")).unwrap_err(),
            ExprError::Syntax { .. }
        ));
    }

    #[test]
    fn test_constants_are_flyweights_within_a_builder() {
        let builder = TreeBuilder::complex().unwrap();
        let a = builder.build_tree(Some("pi")).unwrap();
        let b = builder.build_tree(Some("2*pi")).unwrap();

        let Expr::Constant(first) = a else {
            panic!("expected a constant leaf");
        };
        let Expr::Binary { right, .. } = b else {
            panic!("expected a binary node");
        };
        let Expr::Constant(second) = *right else {
            panic!("expected a constant leaf");
        };
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_imaginary_literal_rewrite() {
        // 2i lexes as 2*1i, and ^ binds tighter than the inserted *.
        let got = eval_complex("2i^2").as_complex("test").unwrap();
        assert_abs_diff_eq!(got.re, -2.0, epsilon = 1.0e-12);
        assert_abs_diff_eq!(got.im, 0.0, epsilon = 1.0e-12);

        // 1/2i is (1/2)*i under the rewrite.
        let got = eval_complex("1/2i").as_complex("test").unwrap();
        assert_abs_diff_eq!(got.re, 0.0);
        assert_abs_diff_eq!(got.im, 0.5);
    }

    #[test]
    fn test_imaginary_suffix_rejected_by_real_builder() {
        let builder = TreeBuilder::real().unwrap();
        assert!(matches!(
            builder.build_tree(Some("2i + 1")).unwrap_err(),
            ExprError::Syntax { .. }
        ));
    }

    #[test]
    fn test_matrix_literal_builds_and_evaluates() {
        let got = eval_complex("{{1, 2}, {3, 4}}");
        let m = got.as_matrix("test").unwrap();
        assert_eq!((m.nrows(), m.ncols()), (2, 2));
        assert_eq!(m[(0, 1)], Complex::new(2.0, 0.0));
        assert_eq!(m[(1, 0)], Complex::new(3.0, 0.0));
    }

    #[test]
    fn test_matrix_arithmetic_end_to_end() {
        let got = eval_complex("2 * {{1, 2}, {3, 4}} * {{1, 0}, {0, 1}}");
        let m = got.as_matrix("test").unwrap();
        assert_eq!(m[(1, 1)], Complex::new(8.0, 0.0));

        let got = eval_complex("{{1, 2i}} + {{1, 0}}");
        let m = got.as_matrix("test").unwrap();
        assert_eq!(m[(0, 0)], Complex::new(2.0, 0.0));
        assert_eq!(m[(0, 1)], Complex::new(0.0, 2.0));
    }

    #[test]
    fn test_ragged_matrix_rows_rejected() {
        let builder = TreeBuilder::complex().unwrap();
        assert!(matches!(
            builder.build_tree(Some("{{1, 2}, {3}}")).unwrap_err(),
            ExprError::Syntax { .. }
        ));
    }

    #[test]
    fn test_real_builder_declines_matrix_literals() {
        let builder = TreeBuilder::real().unwrap();
        let err = builder.build_tree(Some("{{1, 2}}")).unwrap_err();
        assert_eq!(
            err,
            ExprError::UnsupportedConstruction {
                builder: "real",
                operator: "{".into(),
            }
        );
    }

    #[test]
    fn test_partial_factory_fails_fast() {
        struct AdditiveOnly;

        impl NodeFactory for AdditiveOnly {
            type Value = f64;

            fn name(&self) -> &'static str {
                "additive-only"
            }

            fn tokenizer(&self) -> Tokenizer {
                Tokenizer::plain()
            }

            fn parse_scalar(&self, raw: &str) -> Result<Expr<f64>> {
                RealFactory.parse_scalar(raw)
            }

            fn supported_binary(&self) -> &[BinaryOp] {
                &[BinaryOp::Add, BinaryOp::Sub]
            }

            fn supports_negation(&self) -> bool {
                false
            }
        }

        let builder = TreeBuilder::new(
            AdditiveOnly,
            ConstantRegistry::new(),
            FunctionRegistry::new(),
        );
        assert_abs_diff_eq!(
            builder
                .build_tree(Some("1+2-3"))
                .unwrap()
                .eval(&Context::new())
                .unwrap(),
            0.0
        );
        assert_eq!(
            builder.build_tree(Some("2*3")).unwrap_err(),
            ExprError::UnsupportedConstruction {
                builder: "additive-only",
                operator: "*".into(),
            }
        );
        assert!(matches!(
            builder.build_tree(Some("-1")).unwrap_err(),
            ExprError::UnsupportedConstruction { .. }
        ));
    }

    #[test]
    fn test_render_rebuild_round_trip() {
        let builder = TreeBuilder::complex().unwrap();
        for text in [
            "3*(4+2)^2",
            "1-(2+3)",
            "(1+2i)*x",
            "sin(x + 2) - 3.6",
            "{{1, 2i}, {3, 4}}",
            "-(a+b)/c",
        ] {
            let tree = builder.build_tree(Some(text)).unwrap();
            let rendered = tree.to_string();
            let rebuilt = builder.build_tree(Some(&rendered)).unwrap();

            let mut ctx = Context::new();
            ctx.set("x", Value::real(0.25));
            ctx.set("a", Value::real(1.5));
            ctx.set("b", Value::complex(0.0, 2.0));
            ctx.set("c", Value::real(4.0));
            assert_eq!(
                tree.eval(&ctx).unwrap(),
                rebuilt.eval(&ctx).unwrap(),
                "round trip changed meaning for {text:?} (rendered {rendered:?})"
            );
        }
    }

    #[test]
    fn test_registering_custom_function() {
        use crate::registry::{ArgType, FunctionSpec, Usage};

        fn double(args: &[f64]) -> Result<f64> {
            Ok(args[0] * 2.0)
        }

        let mut builder = TreeBuilder::real().unwrap();
        builder
            .functions_mut()
            .register(FunctionSpec {
                name: "double",
                display: "double",
                category: "arithmetic",
                description: "Twice the argument.",
                signatures: &[&[ArgType::Real]],
                examples: &[Usage {
                    expression: "double(21)",
                    result: "42",
                }],
                eval: double,
            })
            .unwrap();
        let tree = builder.build_tree(Some("double(21)")).unwrap();
        assert_abs_diff_eq!(tree.eval(&Context::new()).unwrap(), 42.0);
    }
}
