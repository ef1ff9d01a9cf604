//! # value.rs
//!
//! Runtime value types the expression tree evaluates over.
//!
//! The tree is generic over [`ExprValue`], the capability seam between the
//! node hierarchy and the numeric domain. Two implementations ship with the
//! crate: plain `f64` for real-valued trees, and [`Value`] — a sum of a
//! complex scalar and a complex matrix — for the complex/matrix-capable
//! builder. The linear-algebra types themselves (`num_complex::Complex`,
//! `nalgebra::DMatrix`) are consumed as opaque collaborators; this module
//! only defines which operand combinations each operator supports and what
//! the typed error looks like when a combination is not supported.

use nalgebra::DMatrix;
use num_complex::Complex;
use num_traits::Zero;
use std::fmt;

use crate::error::{ExprError, Result};

/// Maximum precedence, used for rendering leaves that never need wrapping.
pub(crate) const ATOM_PRECEDENCE: u8 = u8::MAX;

/// Numeric domain an expression tree evaluates over.
///
/// All arithmetic is checked: an unsupported operand combination fails with
/// [`ExprError::InvalidArgumentType`] naming the operator and the offending
/// value kind rather than panicking.
pub trait ExprValue: Clone + PartialEq + fmt::Debug + fmt::Display + 'static {
    /// Short human name for this value's runtime kind, used in diagnostics.
    fn kind_name(&self) -> &'static str;

    fn checked_add(&self, rhs: &Self) -> Result<Self>;
    fn checked_sub(&self, rhs: &Self) -> Result<Self>;
    fn checked_mul(&self, rhs: &Self) -> Result<Self>;
    fn checked_div(&self, rhs: &Self) -> Result<Self>;
    fn checked_pow(&self, rhs: &Self) -> Result<Self>;
    fn checked_neg(&self) -> Result<Self>;

    /// Truth test used by conditional nodes: nonzero is true.
    fn is_truthy(&self) -> Result<bool>;

    /// Folds a flat, row-major list of scalar values into a matrix with
    /// `stride` columns per row. Scalar-only domains reject this.
    fn from_rows(stride: usize, elems: Vec<Self>) -> Result<Self>;

    /// Precedence of this value's canonical rendering, so composite scalars
    /// (e.g. `1+2i`) get parenthesized when embedded under an operator.
    fn render_precedence(&self) -> u8 {
        ATOM_PRECEDENCE
    }
}

impl ExprValue for f64 {
    fn kind_name(&self) -> &'static str {
        "real"
    }

    fn checked_add(&self, rhs: &Self) -> Result<Self> {
        Ok(self + rhs)
    }

    fn checked_sub(&self, rhs: &Self) -> Result<Self> {
        Ok(self - rhs)
    }

    fn checked_mul(&self, rhs: &Self) -> Result<Self> {
        Ok(self * rhs)
    }

    fn checked_div(&self, rhs: &Self) -> Result<Self> {
        Ok(self / rhs)
    }

    fn checked_pow(&self, rhs: &Self) -> Result<Self> {
        Ok(self.powf(*rhs))
    }

    fn checked_neg(&self) -> Result<Self> {
        Ok(-self)
    }

    fn is_truthy(&self) -> Result<bool> {
        Ok(!self.is_zero())
    }

    fn from_rows(_stride: usize, _elems: Vec<Self>) -> Result<Self> {
        Err(ExprError::bad_argument(
            "matrix literal",
            "complex elements",
            "real",
        ))
    }
}

/// A complex scalar or a complex matrix: the runtime value of the
/// complex/matrix-capable builder.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Complex(Complex<f64>),
    Matrix(DMatrix<Complex<f64>>),
}

impl Value {
    /// Complex scalar with zero imaginary part.
    pub fn real(re: f64) -> Self {
        Value::Complex(Complex::new(re, 0.0))
    }

    /// Complex scalar.
    pub fn complex(re: f64, im: f64) -> Self {
        Value::Complex(Complex::new(re, im))
    }

    /// The imaginary unit.
    pub fn i() -> Self {
        Value::Complex(Complex::i())
    }

    /// Extracts the complex scalar, or fails with a typed argument error
    /// naming `operation` when the value is a matrix.
    pub fn as_complex(&self, operation: &str) -> Result<Complex<f64>> {
        match self {
            Value::Complex(c) => Ok(*c),
            Value::Matrix(_) => Err(ExprError::bad_argument(
                operation,
                "complex",
                self.kind_name(),
            )),
        }
    }

    /// Returns the matrix, or fails with a typed argument error.
    pub fn as_matrix(&self, operation: &str) -> Result<&DMatrix<Complex<f64>>> {
        match self {
            Value::Matrix(m) => Ok(m),
            Value::Complex(_) => Err(ExprError::bad_argument(
                operation,
                "matrix",
                self.kind_name(),
            )),
        }
    }

    fn shape_name(m: &DMatrix<Complex<f64>>) -> String {
        format!("matrix {}x{}", m.nrows(), m.ncols())
    }
}

impl From<Complex<f64>> for Value {
    fn from(c: Complex<f64>) -> Self {
        Value::Complex(c)
    }
}

impl From<DMatrix<Complex<f64>>> for Value {
    fn from(m: DMatrix<Complex<f64>>) -> Self {
        Value::Matrix(m)
    }
}

impl ExprValue for Value {
    fn kind_name(&self) -> &'static str {
        match self {
            Value::Complex(_) => "complex",
            Value::Matrix(_) => "matrix",
        }
    }

    fn checked_add(&self, rhs: &Self) -> Result<Self> {
        match (self, rhs) {
            (Value::Complex(l), Value::Complex(r)) => Ok(Value::Complex(l + r)),
            (Value::Matrix(l), Value::Matrix(r)) => {
                if l.shape() != r.shape() {
                    return Err(ExprError::bad_argument(
                        "+",
                        "matrices of equal dimensions",
                        format!("{} vs {}", Self::shape_name(l), Self::shape_name(r)),
                    ));
                }
                Ok(Value::Matrix(l + r))
            }
            _ => Err(ExprError::bad_argument(
                "+",
                "two complex or two matrix operands",
                format!("{} and {}", self.kind_name(), rhs.kind_name()),
            )),
        }
    }

    fn checked_sub(&self, rhs: &Self) -> Result<Self> {
        match (self, rhs) {
            (Value::Complex(l), Value::Complex(r)) => Ok(Value::Complex(l - r)),
            (Value::Matrix(l), Value::Matrix(r)) => {
                if l.shape() != r.shape() {
                    return Err(ExprError::bad_argument(
                        "-",
                        "matrices of equal dimensions",
                        format!("{} vs {}", Self::shape_name(l), Self::shape_name(r)),
                    ));
                }
                Ok(Value::Matrix(l - r))
            }
            _ => Err(ExprError::bad_argument(
                "-",
                "two complex or two matrix operands",
                format!("{} and {}", self.kind_name(), rhs.kind_name()),
            )),
        }
    }

    fn checked_mul(&self, rhs: &Self) -> Result<Self> {
        match (self, rhs) {
            (Value::Complex(l), Value::Complex(r)) => Ok(Value::Complex(l * r)),
            (Value::Complex(l), Value::Matrix(r)) => Ok(Value::Matrix(r.map(|e| e * l))),
            (Value::Matrix(l), Value::Complex(r)) => Ok(Value::Matrix(l.map(|e| e * r))),
            (Value::Matrix(l), Value::Matrix(r)) => {
                if l.ncols() != r.nrows() {
                    return Err(ExprError::bad_argument(
                        "*",
                        "matrices with matching inner dimensions",
                        format!("{} vs {}", Self::shape_name(l), Self::shape_name(r)),
                    ));
                }
                Ok(Value::Matrix(l * r))
            }
        }
    }

    fn checked_div(&self, rhs: &Self) -> Result<Self> {
        match (self, rhs) {
            (Value::Complex(l), Value::Complex(r)) => Ok(Value::Complex(l / r)),
            (Value::Matrix(l), Value::Complex(r)) => Ok(Value::Matrix(l.map(|e| e / r))),
            _ => Err(ExprError::bad_argument(
                "/",
                "complex/complex or matrix/complex",
                format!("{} and {}", self.kind_name(), rhs.kind_name()),
            )),
        }
    }

    fn checked_pow(&self, rhs: &Self) -> Result<Self> {
        let base = self.as_complex("^")?;
        let exp = rhs.as_complex("^")?;
        Ok(Value::Complex(base.powc(exp)))
    }

    fn checked_neg(&self) -> Result<Self> {
        match self {
            Value::Complex(c) => Ok(Value::Complex(-c)),
            Value::Matrix(m) => Ok(Value::Matrix(-m)),
        }
    }

    fn is_truthy(&self) -> Result<bool> {
        match self {
            Value::Complex(c) => Ok(!c.is_zero()),
            Value::Matrix(_) => Err(ExprError::bad_argument(
                "condition",
                "complex",
                self.kind_name(),
            )),
        }
    }

    fn from_rows(stride: usize, elems: Vec<Self>) -> Result<Self> {
        if stride == 0 || elems.len() % stride != 0 {
            return Err(ExprError::bad_argument(
                "matrix literal",
                format!("an element count divisible by stride {stride}"),
                format!("{} elements", elems.len()),
            ));
        }
        let rows = elems.len() / stride;
        let mut scalars = Vec::with_capacity(elems.len());
        for elem in &elems {
            scalars.push(elem.as_complex("matrix literal")?);
        }
        Ok(Value::Matrix(DMatrix::from_row_iterator(
            rows,
            stride,
            scalars.into_iter(),
        )))
    }

    fn render_precedence(&self) -> u8 {
        match self {
            // `a+bi` renders as a sum, `bi` as a product; both must be
            // wrapped when embedded under a tighter-binding operator.
            Value::Complex(c) if c.re != 0.0 && c.im != 0.0 => 1,
            Value::Complex(c) if c.im != 0.0 && c.im < 0.0 => 1,
            Value::Complex(c) if c.im != 0.0 => 2,
            _ => ATOM_PRECEDENCE,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Complex(c) => write_complex(f, c),
            Value::Matrix(m) => {
                // Brace form, row-major, so the rendering re-tokenizes as a
                // matrix literal.
                write!(f, "{{")?;
                for r in 0..m.nrows() {
                    if r > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{{")?;
                    for c in 0..m.ncols() {
                        if c > 0 {
                            write!(f, ", ")?;
                        }
                        write_complex(f, &m[(r, c)])?;
                    }
                    write!(f, "}}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Canonical complex rendering: `3`, `2i`, `1+2i`, `1-2i`.
fn write_complex(f: &mut fmt::Formatter<'_>, c: &Complex<f64>) -> fmt::Result {
    if c.im == 0.0 {
        write!(f, "{}", c.re)
    } else if c.re == 0.0 {
        write!(f, "{}i", c.im)
    } else if c.im < 0.0 {
        write!(f, "{}-{}i", c.re, -c.im)
    } else {
        write!(f, "{}+{}i", c.re, c.im)
    }
}
