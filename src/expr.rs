//! # expr.rs
//!
//! The expression tree: a sum type over every node kind the builders can
//! produce, with evaluation, variable lookup, child replacement and
//! canonical string rendering.
//!
//! The tree is generic over [`ExprValue`], so the same node hierarchy serves
//! the real-valued and the complex/matrix-capable builders. Evaluation is an
//! exhaustive match over the variants; it reads variable values from a
//! caller-supplied [`Context`] and never mutates the tree, so one built tree
//! can be re-evaluated against different bindings without rebuilding.
//!
//! Rendering reconstructs a minimal parenthesization from per-operator
//! precedence and associativity metadata: a child is wrapped only when its
//! own top-level operator binds too loosely to preserve the tree's meaning.
//! Re-tokenizing and re-building the rendered string reproduces an
//! evaluation-equivalent tree.

use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use crate::context::Context;
use crate::error::{ExprError, Result};
use crate::registry::{ConstantDef, FunctionDef};
use crate::value::{ExprValue, ATOM_PRECEDENCE};

/// Precedence of prefix negation: tighter than `^` on its operand.
pub(crate) const UNARY_PRECEDENCE: u8 = 4;

#[doc(hidden)]
/// Internal macro declaring the binary operators in one place: symbol,
/// precedence, associativity and the checked-arithmetic method each one
/// dispatches to.
macro_rules! binary_operators {
    ($($name:ident => {
        symbol: $symbol:expr,
        precedence: $prec:expr,
        left_assoc: $assoc:expr,
        apply: $apply:ident
    }),* $(,)?) => {
        /// A binary operator, with the precedence and associativity metadata
        /// that drives both parsing and canonical rendering.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum BinaryOp {
            $($name),*
        }

        impl BinaryOp {
            /// Every operator, in declaration order.
            pub const ALL: &'static [BinaryOp] = &[$(Self::$name),*];

            /// Converts an operator symbol to the corresponding operator.
            pub fn from_symbol(s: &str) -> Option<Self> {
                match s {
                    $($symbol => Some(Self::$name),)*
                    _ => None,
                }
            }

            /// The operator's source symbol.
            pub fn symbol(&self) -> &'static str {
                match self {
                    $(Self::$name => $symbol),*
                }
            }

            /// Operator precedence (higher binds tighter).
            pub fn precedence(&self) -> u8 {
                match self {
                    $(Self::$name => $prec),*
                }
            }

            /// Whether the operator is left-associative.
            pub fn is_left_assoc(&self) -> bool {
                match self {
                    $(Self::$name => $assoc),*
                }
            }

            /// Applies the operator via the value domain's checked arithmetic.
            pub fn apply<T: ExprValue>(&self, left: &T, right: &T) -> Result<T> {
                match self {
                    $(Self::$name => left.$apply(right)),*
                }
            }
        }

        impl fmt::Display for BinaryOp {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.symbol())
            }
        }
    };
}

binary_operators! {
    Add => { symbol: "+", precedence: 1, left_assoc: true,  apply: checked_add },
    Sub => { symbol: "-", precedence: 1, left_assoc: true,  apply: checked_sub },
    Mul => { symbol: "*", precedence: 2, left_assoc: true,  apply: checked_mul },
    Div => { symbol: "/", precedence: 2, left_assoc: true,  apply: checked_div },
    Pow => { symbol: "^", precedence: 3, left_assoc: false, apply: checked_pow },
}

/// A prefix unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Negation, `-x`.
    Neg,
}

impl UnaryOp {
    /// The operator's source symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
        }
    }

    /// Applies the operator via the value domain's checked arithmetic.
    pub fn apply<T: ExprValue>(&self, operand: &T) -> Result<T> {
        match self {
            UnaryOp::Neg => operand.checked_neg(),
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A node of the expression tree.
///
/// Leaves are scalars, flyweight constants and variables; interior nodes are
/// unary/binary operators, function calls, matrix literals and conditionals.
/// Constant leaves are shared by `Rc` — looked up in a registry, never
/// cloned into fresh allocations — so all uses of one constant within a
/// registry have the same identity.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<T: ExprValue> {
    /// Immutable literal value.
    Scalar(T),

    /// Named constant, shared flyweight per registry.
    Constant(Rc<ConstantDef<T>>),

    /// Named variable; its value comes from the evaluation [`Context`].
    Variable { name: String, display: String },

    /// Prefix operator applied to one child.
    Unary { op: UnaryOp, operand: Box<Expr<T>> },

    /// Binary operator applied to an ordered pair of children.
    Binary {
        op: BinaryOp,
        left: Box<Expr<T>>,
        right: Box<Expr<T>>,
    },

    /// Function call over an ordered argument list.
    Call {
        function: Rc<FunctionDef<T>>,
        args: Vec<Expr<T>>,
    },

    /// Flattened matrix literal: `stride` columns per row, elements in
    /// row-major source order. The element count is a multiple of `stride`
    /// for any literal produced by the builder; evaluation re-checks.
    MatrixLiteral { stride: usize, elems: Vec<Expr<T>> },

    /// Three-way conditional. Constructed programmatically; no surface
    /// grammar produces it.
    Conditional {
        condition: Box<Expr<T>>,
        if_true: Box<Expr<T>>,
        if_false: Box<Expr<T>>,
    },
}

impl<T: ExprValue> Expr<T> {
    /// Scalar leaf.
    pub fn scalar(value: T) -> Self {
        Expr::Scalar(value)
    }

    /// Variable leaf whose display name equals its lookup name.
    pub fn variable(name: impl Into<String>) -> Self {
        let name = name.into();
        let display = name.clone();
        Expr::Variable { name, display }
    }

    /// Binary node.
    pub fn binary(op: BinaryOp, left: Expr<T>, right: Expr<T>) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Negation node.
    pub fn neg(operand: Expr<T>) -> Self {
        Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(operand),
        }
    }

    /// Conditional node.
    pub fn conditional(condition: Expr<T>, if_true: Expr<T>, if_false: Expr<T>) -> Self {
        Expr::Conditional {
            condition: Box::new(condition),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        }
    }

    /// Evaluates the tree against the given variable bindings.
    ///
    /// # Errors
    ///
    /// * [`ExprError::UnassignedVariable`] for a variable leaf with no
    ///   binding in `ctx`.
    /// * [`ExprError::InvalidArgumentType`] when an operator or function
    ///   meets an operand combination it does not support.
    pub fn eval(&self, ctx: &Context<T>) -> Result<T> {
        match self {
            Expr::Scalar(value) => Ok(value.clone()),
            Expr::Constant(def) => Ok(def.value().clone()),
            Expr::Variable { name, .. } => ctx
                .get(name)
                .cloned()
                .ok_or_else(|| ExprError::UnassignedVariable { name: name.clone() }),
            Expr::Unary { op, operand } => op.apply(&operand.eval(ctx)?),
            Expr::Binary { op, left, right } => op.apply(&left.eval(ctx)?, &right.eval(ctx)?),
            Expr::Call { function, args } => {
                let mut values: SmallVec<[T; 4]> = SmallVec::with_capacity(args.len());
                for arg in args {
                    values.push(arg.eval(ctx)?);
                }
                function.call(&values)
            }
            Expr::MatrixLiteral { stride, elems } => {
                let mut values = Vec::with_capacity(elems.len());
                for elem in elems {
                    values.push(elem.eval(ctx)?);
                }
                T::from_rows(*stride, values)
            }
            Expr::Conditional {
                condition,
                if_true,
                if_false,
            } => {
                if condition.eval(ctx)?.is_truthy()? {
                    if_true.eval(ctx)
                } else {
                    if_false.eval(ctx)
                }
            }
        }
    }

    /// Finds the first variable leaf (preorder) with the given name.
    pub fn find_variable(&self, name: &str) -> Option<&Expr<T>> {
        match self {
            Expr::Variable { name: n, .. } if n == name => Some(self),
            Expr::Unary { operand, .. } => operand.find_variable(name),
            Expr::Binary { left, right, .. } => left
                .find_variable(name)
                .or_else(|| right.find_variable(name)),
            Expr::Call { args: children, .. }
            | Expr::MatrixLiteral {
                elems: children, ..
            } => children.iter().find_map(|c| c.find_variable(name)),
            Expr::Conditional {
                condition,
                if_true,
                if_false,
            } => condition
                .find_variable(name)
                .or_else(|| if_true.find_variable(name))
                .or_else(|| if_false.find_variable(name)),
            _ => None,
        }
    }

    /// Collects the distinct variable names reachable from this node.
    pub fn find_all_variables(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Expr::Variable { name, .. } => {
                names.insert(name.as_str());
            }
            Expr::Unary { operand, .. } => operand.collect_variables(names),
            Expr::Binary { left, right, .. } => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
            Expr::Call { args: children, .. }
            | Expr::MatrixLiteral {
                elems: children, ..
            } => {
                for child in children {
                    child.collect_variables(names);
                }
            }
            Expr::Conditional {
                condition,
                if_true,
                if_false,
            } => {
                condition.collect_variables(names);
                if_true.collect_variables(names);
                if_false.collect_variables(names);
            }
            Expr::Scalar(_) | Expr::Constant(_) => {}
        }
    }

    /// Replaces the first descendant (preorder) equal to `old` with a clone
    /// of `new`. Returns `false` when no descendant matches.
    pub fn replace_child(&mut self, old: &Expr<T>, new: &Expr<T>) -> bool {
        match self {
            Expr::Unary { operand, .. } => replace_slot(operand, old, new),
            Expr::Binary { left, right, .. } => {
                replace_slot(left, old, new) || replace_slot(right, old, new)
            }
            Expr::Call { args: children, .. }
            | Expr::MatrixLiteral {
                elems: children, ..
            } => children.iter_mut().any(|c| replace_expr(c, old, new)),
            Expr::Conditional {
                condition,
                if_true,
                if_false,
            } => {
                replace_slot(condition, old, new)
                    || replace_slot(if_true, old, new)
                    || replace_slot(if_false, old, new)
            }
            Expr::Scalar(_) | Expr::Constant(_) | Expr::Variable { .. } => false,
        }
    }

    /// Rendering precedence of this node's top-level form.
    fn precedence(&self) -> u8 {
        match self {
            Expr::Binary { op, .. } => op.precedence(),
            Expr::Unary { .. } => UNARY_PRECEDENCE,
            Expr::Scalar(value) => value.render_precedence(),
            _ => ATOM_PRECEDENCE,
        }
    }
}

fn replace_slot<T: ExprValue>(slot: &mut Box<Expr<T>>, old: &Expr<T>, new: &Expr<T>) -> bool {
    replace_expr(slot.as_mut(), old, new)
}

fn replace_expr<T: ExprValue>(expr: &mut Expr<T>, old: &Expr<T>, new: &Expr<T>) -> bool {
    if expr == old {
        *expr = new.clone();
        true
    } else {
        expr.replace_child(old, new)
    }
}

impl<T: ExprValue> fmt::Display for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Scalar(value) => write!(f, "{value}"),
            Expr::Constant(def) => write!(f, "{}", def.name()),
            Expr::Variable { display, .. } => write!(f, "{display}"),
            Expr::Unary { op, operand } => {
                write!(f, "{op}")?;
                write_child(f, operand, operand.precedence() < UNARY_PRECEDENCE)
            }
            Expr::Binary { op, left, right } => {
                let prec = op.precedence();
                // Left child: same precedence regroups freely under a
                // left-associative parent, so only strictly-lower wraps.
                let left_parens = if op.is_left_assoc() {
                    left.precedence() < prec
                } else {
                    left.precedence() <= prec
                };
                // Right child: under `-` and `/` equal precedence changes
                // meaning (`a-(b+c)`, `a/(b*c)`); under `+` and `*` it does
                // not.
                let right_parens = if op.is_left_assoc() {
                    right.precedence() < prec
                        || (right.precedence() == prec
                            && matches!(op, BinaryOp::Sub | BinaryOp::Div))
                } else {
                    right.precedence() < prec
                };
                write_child(f, left, left_parens)?;
                write!(f, "{op}")?;
                write_child(f, right, right_parens)
            }
            Expr::Call { function, args } => {
                write!(f, "{}(", function.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Expr::MatrixLiteral { stride, elems } => {
                write!(f, "{{")?;
                for (row, chunk) in elems.chunks(*stride).enumerate() {
                    if row > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{{")?;
                    for (col, elem) in chunk.iter().enumerate() {
                        if col > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{elem}")?;
                    }
                    write!(f, "}}")?;
                }
                write!(f, "}}")
            }
            Expr::Conditional {
                condition,
                if_true,
                if_false,
            } => write!(f, "if({condition}, {if_true}, {if_false})"),
        }
    }
}

fn write_child<T: ExprValue>(
    f: &mut fmt::Formatter<'_>,
    child: &Expr<T>,
    parens: bool,
) -> fmt::Result {
    if parens {
        write!(f, "({child})")
    } else {
        write!(f, "{child}")
    }
}
