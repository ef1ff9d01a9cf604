//! # builtins.rs
//!
//! Default constant and function tables for the stock builders. The tables
//! are `static` phf maps; [`default_complex_constants`] and friends fold
//! them into freshly populated registries.

use num_complex::Complex;
use phf::phf_map;
use std::f64::consts::{E, PI, TAU};

use crate::error::{ExprError, Result};
use crate::registry::{ArgType, ConstantRegistry, FunctionRegistry, FunctionSpec, Usage};
use crate::value::Value;

/// name → (display, re, im)
static COMPLEX_CONSTANTS: phf::Map<&'static str, (&'static str, f64, f64)> = phf_map! {
    "pi" => ("π", PI, 0.0),
    "e" => ("e", E, 0.0),
    "tau" => ("τ", TAU, 0.0),
    "i" => ("i", 0.0, 1.0),
    "j" => ("j", 0.0, 1.0),
};

/// name → (display, value)
static REAL_CONSTANTS: phf::Map<&'static str, (&'static str, f64)> = phf_map! {
    "pi" => ("π", PI),
    "e" => ("e", E),
    "tau" => ("τ", TAU),
};

fn single_complex(args: &[Value], operation: &'static str) -> Result<Complex<f64>> {
    match args {
        [v] => v.as_complex(operation),
        _ => Err(ExprError::bad_argument(
            operation,
            "one argument",
            format!("{} arguments", args.len()),
        )),
    }
}

fn pair_complex(args: &[Value], operation: &'static str) -> Result<(Complex<f64>, Complex<f64>)> {
    match args {
        [a, b] => Ok((a.as_complex(operation)?, b.as_complex(operation)?)),
        _ => Err(ExprError::bad_argument(
            operation,
            "two arguments",
            format!("{} arguments", args.len()),
        )),
    }
}

macro_rules! complex_unary {
    ($($name:ident, |$z:ident| $body:expr;)*) => {
        $(
            fn $name(args: &[Value]) -> Result<Value> {
                let $z = single_complex(args, stringify!($name))?;
                Ok($body)
            }
        )*
    };
}

complex_unary! {
    sin, |z| Value::Complex(z.sin());
    cos, |z| Value::Complex(z.cos());
    tan, |z| Value::Complex(z.tan());
    asin, |z| Value::Complex(z.asin());
    acos, |z| Value::Complex(z.acos());
    atan, |z| Value::Complex(z.atan());
    sinh, |z| Value::Complex(z.sinh());
    cosh, |z| Value::Complex(z.cosh());
    tanh, |z| Value::Complex(z.tanh());
    exp, |z| Value::Complex(z.exp());
    ln, |z| Value::Complex(z.ln());
    log10, |z| Value::Complex(z.log10());
    sqrt, |z| Value::Complex(z.sqrt());
    abs, |z| Value::real(z.norm());
    conj, |z| Value::Complex(z.conj());
}

fn pow(args: &[Value]) -> Result<Value> {
    let (base, exponent) = pair_complex(args, "pow")?;
    Ok(Value::Complex(base.powc(exponent)))
}

macro_rules! cfun {
    ($name:literal, $eval:ident, $category:literal, $desc:literal,
     [$($ex:literal => $res:literal),+]) => {
        FunctionSpec {
            name: $name,
            display: $name,
            category: $category,
            description: $desc,
            signatures: &[&[ArgType::Complex]],
            examples: &[$(Usage { expression: $ex, result: $res }),+],
            eval: $eval,
        }
    };
}

static COMPLEX_FUNCTIONS: phf::Map<&'static str, FunctionSpec<Value>> = phf_map! {
    "sin" => cfun!("sin", sin, "trigonometry", "Sine of a complex scalar.",
        ["sin(0)" => "0"]),
    "cos" => cfun!("cos", cos, "trigonometry", "Cosine of a complex scalar.",
        ["cos(0)" => "1"]),
    "tan" => cfun!("tan", tan, "trigonometry", "Tangent of a complex scalar.",
        ["tan(0)" => "0"]),
    "asin" => cfun!("asin", asin, "trigonometry", "Inverse sine (principal branch).",
        ["asin(0)" => "0"]),
    "acos" => cfun!("acos", acos, "trigonometry", "Inverse cosine (principal branch).",
        ["acos(1)" => "0"]),
    "atan" => cfun!("atan", atan, "trigonometry", "Inverse tangent (principal branch).",
        ["atan(0)" => "0"]),
    "sinh" => cfun!("sinh", sinh, "hyperbolic", "Hyperbolic sine.",
        ["sinh(0)" => "0"]),
    "cosh" => cfun!("cosh", cosh, "hyperbolic", "Hyperbolic cosine.",
        ["cosh(0)" => "1"]),
    "tanh" => cfun!("tanh", tanh, "hyperbolic", "Hyperbolic tangent.",
        ["tanh(0)" => "0"]),
    "exp" => cfun!("exp", exp, "exponential", "e raised to the argument.",
        ["exp(0)" => "1"]),
    "ln" => cfun!("ln", ln, "exponential", "Natural logarithm (principal branch).",
        ["ln(e)" => "1"]),
    "log10" => cfun!("log10", log10, "exponential", "Base-10 logarithm (principal branch).",
        ["log10(100)" => "2"]),
    "sqrt" => cfun!("sqrt", sqrt, "elementary", "Principal square root.",
        ["sqrt(4)" => "2"]),
    "abs" => cfun!("abs", abs, "elementary", "Modulus of a complex scalar.",
        ["abs(3+4i)" => "5"]),
    "conj" => cfun!("conj", conj, "elementary", "Complex conjugate.",
        ["conj(1+2i)" => "1-2i"]),
    "pow" => FunctionSpec {
        name: "pow",
        display: "pow",
        category: "exponential",
        description: "Base raised to an arbitrary complex exponent.",
        signatures: &[&[ArgType::Complex, ArgType::Complex]],
        examples: &[Usage { expression: "pow(2, 10)", result: "1024" }],
        eval: pow,
    },
};

fn single_real(args: &[f64], operation: &'static str) -> Result<f64> {
    match args {
        [v] => Ok(*v),
        _ => Err(ExprError::bad_argument(
            operation,
            "one argument",
            format!("{} arguments", args.len()),
        )),
    }
}

macro_rules! real_unary {
    ($($name:ident, |$x:ident| $body:expr;)*) => {
        $(
            fn $name(args: &[f64]) -> Result<f64> {
                let $x = single_real(args, stringify!($name))?;
                Ok($body)
            }
        )*
    };
}

real_unary! {
    r_sin, |x| x.sin();
    r_cos, |x| x.cos();
    r_tan, |x| x.tan();
    r_exp, |x| x.exp();
    r_ln, |x| x.ln();
    r_log10, |x| x.log10();
    r_sqrt, |x| x.sqrt();
    r_abs, |x| x.abs();
}

fn r_pow(args: &[f64]) -> Result<f64> {
    match args {
        [base, exponent] => Ok(base.powf(*exponent)),
        _ => Err(ExprError::bad_argument(
            "pow",
            "two arguments",
            format!("{} arguments", args.len()),
        )),
    }
}

macro_rules! rfun {
    ($name:literal, $eval:ident, $category:literal, $desc:literal,
     [$($ex:literal => $res:literal),+]) => {
        FunctionSpec {
            name: $name,
            display: $name,
            category: $category,
            description: $desc,
            signatures: &[&[ArgType::Real]],
            examples: &[$(Usage { expression: $ex, result: $res }),+],
            eval: $eval,
        }
    };
}

static REAL_FUNCTIONS: phf::Map<&'static str, FunctionSpec<f64>> = phf_map! {
    "sin" => rfun!("sin", r_sin, "trigonometry", "Sine of a real scalar.",
        ["sin(0)" => "0"]),
    "cos" => rfun!("cos", r_cos, "trigonometry", "Cosine of a real scalar.",
        ["cos(0)" => "1"]),
    "tan" => rfun!("tan", r_tan, "trigonometry", "Tangent of a real scalar.",
        ["tan(0)" => "0"]),
    "exp" => rfun!("exp", r_exp, "exponential", "e raised to the argument.",
        ["exp(0)" => "1"]),
    "ln" => rfun!("ln", r_ln, "exponential", "Natural logarithm.",
        ["ln(e)" => "1"]),
    "log10" => rfun!("log10", r_log10, "exponential", "Base-10 logarithm.",
        ["log10(100)" => "2"]),
    "sqrt" => rfun!("sqrt", r_sqrt, "elementary", "Square root.",
        ["sqrt(4)" => "2"]),
    "abs" => rfun!("abs", r_abs, "elementary", "Absolute value.",
        ["abs(-3)" => "3"]),
    "pow" => FunctionSpec {
        name: "pow",
        display: "pow",
        category: "exponential",
        description: "Base raised to a real exponent.",
        signatures: &[&[ArgType::Real, ArgType::Real]],
        examples: &[Usage { expression: "pow(2, 10)", result: "1024" }],
        eval: r_pow,
    },
};

/// Registry with the stock complex constants: `pi`, `e`, `tau` and the
/// imaginary unit under both of its spellings `i` and `j`.
pub fn default_complex_constants() -> Result<ConstantRegistry<Value>> {
    let mut registry = ConstantRegistry::new();
    for (name, (display, re, im)) in COMPLEX_CONSTANTS.entries() {
        registry.register(*name, *display, Value::complex(*re, *im))?;
    }
    Ok(registry)
}

/// Registry with the stock real constants.
pub fn default_real_constants() -> Result<ConstantRegistry<f64>> {
    let mut registry = ConstantRegistry::new();
    for (name, (display, value)) in REAL_CONSTANTS.entries() {
        registry.register(*name, *display, *value)?;
    }
    Ok(registry)
}

/// Registry with the stock complex functions.
pub fn default_complex_functions() -> Result<FunctionRegistry<Value>> {
    let mut registry = FunctionRegistry::new();
    for spec in COMPLEX_FUNCTIONS.values() {
        registry.register(*spec)?;
    }
    Ok(registry)
}

/// Registry with the stock real functions.
pub fn default_real_functions() -> Result<FunctionRegistry<f64>> {
    let mut registry = FunctionRegistry::new();
    for spec in REAL_FUNCTIONS.values() {
        registry.register(*spec)?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ExprValue;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_default_tables_satisfy_registry_invariants() {
        default_complex_constants().unwrap();
        default_real_constants().unwrap();
        default_complex_functions().unwrap();
        default_real_functions().unwrap();
    }

    #[test]
    fn test_imaginary_unit_both_spellings() {
        let constants = default_complex_constants().unwrap();
        let i = constants.def("i").unwrap();
        let j = constants.def("j").unwrap();
        assert_eq!(i.value(), j.value());
        assert_eq!(*i.value(), Value::i());
    }

    #[test]
    fn test_complex_abs_returns_modulus() {
        let functions = default_complex_functions().unwrap();
        let abs = functions.def("abs").unwrap();
        let got = abs.call(&[Value::complex(3.0, 4.0)]).unwrap();
        assert_eq!(got, Value::real(5.0));
    }

    #[test]
    fn test_complex_sqrt_principal_branch() {
        let functions = default_complex_functions().unwrap();
        let sqrt = functions.def("sqrt").unwrap();
        let got = sqrt.call(&[Value::real(-4.0)]).unwrap();
        match got {
            Value::Complex(z) => {
                assert_abs_diff_eq!(z.re, 0.0, epsilon = 1.0e-12);
                assert_abs_diff_eq!(z.im, 2.0, epsilon = 1.0e-12);
            }
            other => panic!("expected a complex scalar, got {other:?}"),
        }
    }

    #[test]
    fn test_function_rejects_matrix_argument() {
        let functions = default_complex_functions().unwrap();
        let sin = functions.def("sin").unwrap();
        let m = Value::from_rows(1, vec![Value::real(1.0)]).unwrap();
        let err = sin.call(&[m]).unwrap_err();
        assert!(matches!(err, ExprError::InvalidArgumentType { .. }));
    }

    #[test]
    fn test_real_pow() {
        let functions = default_real_functions().unwrap();
        let pow = functions.def("pow").unwrap();
        assert_abs_diff_eq!(pow.call(&[2.0, 10.0]).unwrap(), 1024.0);
        let err = pow.call(&[2.0]).unwrap_err();
        assert!(matches!(err, ExprError::InvalidArgumentType { .. }));
    }
}
