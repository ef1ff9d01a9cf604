//! # registry.rs
//!
//! Constant and function registries. Both are populated once from explicit
//! registration calls at startup and are read-only afterwards.
//!
//! Constants are flyweights: the registry hands out one shared
//! [`ConstantDef`] per name, allocated lazily on first request and reused by
//! every later lookup, so all `pi` leaves in all trees built from one
//! registry share identity. Functions are not singletons — each call site
//! gets a fresh [`Expr::Call`] node closing over its own argument
//! sub-expressions — but the [`FunctionDef`] metadata behind those nodes is
//! shared.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{ExprError, Result};
use crate::expr::Expr;
use crate::value::ExprValue;

/// Argument type tag used in function signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    Integer,
    Real,
    Complex,
    RealMatrix,
    ComplexMatrix,
    RealVector,
    ComplexVector,
    Variable,
    Expression,
    Untyped,
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArgType::Integer => "integer",
            ArgType::Real => "real",
            ArgType::Complex => "complex",
            ArgType::RealMatrix => "real matrix",
            ArgType::ComplexMatrix => "complex matrix",
            ArgType::RealVector => "real vector",
            ArgType::ComplexVector => "complex vector",
            ArgType::Variable => "variable",
            ArgType::Expression => "expression",
            ArgType::Untyped => "<untyped>",
        };
        write!(f, "{name}")
    }
}

/// One worked example for a registered function: the expression a user
/// would type and the result it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub expression: &'static str,
    pub result: &'static str,
}

/// A shared, immutable named constant. Handed out by `Rc` from the
/// registry; never cloned into fresh allocations, never mutated.
#[derive(Debug, Clone)]
pub struct ConstantDef<T: ExprValue> {
    name: String,
    display: String,
    value: T,
}

impl<T: ExprValue> ConstantDef<T> {
    /// The lookup name, as it appears in source text.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-facing display name.
    pub fn display(&self) -> &str {
        &self.display
    }

    /// The constant's fixed value.
    pub fn value(&self) -> &T {
        &self.value
    }
}

// Two defs are the same constant when name and value agree; the display
// string is presentation only.
impl<T: ExprValue> PartialEq for ConstantDef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value == other.value
    }
}

struct ConstantEntry<T: ExprValue> {
    display: String,
    value: T,
    // Lazily-built flyweight; every lookup after the first clones this Rc.
    shared: OnceCell<Rc<ConstantDef<T>>>,
}

/// Registry of named constants.
pub struct ConstantRegistry<T: ExprValue> {
    entries: HashMap<String, ConstantEntry<T>>,
}

impl<T: ExprValue> Default for ConstantRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ExprValue> ConstantRegistry<T> {
    /// Empty registry.
    pub fn new() -> Self {
        ConstantRegistry {
            entries: HashMap::new(),
        }
    }

    /// Registers a constant under `name`.
    ///
    /// # Errors
    ///
    /// [`ExprError::Registration`] for an empty name or a name already
    /// registered.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        display: impl Into<String>,
        value: T,
    ) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(ExprError::Registration {
                name,
                reason: "constant name must not be empty".into(),
            });
        }
        if self.entries.contains_key(&name) {
            return Err(ExprError::Registration {
                name,
                reason: "constant is already registered".into(),
            });
        }
        self.entries.insert(
            name,
            ConstantEntry {
                display: display.into(),
                value,
                shared: OnceCell::new(),
            },
        );
        Ok(())
    }

    /// Looks up the shared definition for `name`. Absence is not an error:
    /// an unregistered name simply returns `None` and the builder treats the
    /// identifier as a variable.
    pub fn def(&self, name: &str) -> Option<Rc<ConstantDef<T>>> {
        let entry = self.entries.get(name)?;
        let shared = entry.shared.get_or_init(|| {
            Rc::new(ConstantDef {
                name: name.to_string(),
                display: entry.display.clone(),
                value: entry.value.clone(),
            })
        });
        Some(Rc::clone(shared))
    }

    /// Constant leaf node for `name`, sharing the registry's flyweight.
    pub fn get(&self, name: &str) -> Option<Expr<T>> {
        self.def(name).map(Expr::Constant)
    }
}

/// A registered function: evaluation entry point plus the descriptive
/// metadata every function must carry.
pub struct FunctionDef<T: ExprValue> {
    name: &'static str,
    display: &'static str,
    category: &'static str,
    description: &'static str,
    signatures: &'static [&'static [ArgType]],
    examples: &'static [Usage],
    eval: fn(&[T]) -> Result<T>,
}

impl<T: ExprValue> FunctionDef<T> {
    /// The lookup name, as it appears before `(` in source text.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Human-facing display name.
    pub fn display(&self) -> &'static str {
        self.display
    }

    /// Grouping category, e.g. "trigonometry".
    pub fn category(&self) -> &'static str {
        self.category
    }

    /// Human description of what the function computes.
    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Accepted call signatures, one argument type list per arity.
    pub fn signatures(&self) -> &'static [&'static [ArgType]] {
        self.signatures
    }

    /// Worked examples, at least one per signature.
    pub fn examples(&self) -> &'static [Usage] {
        self.examples
    }

    /// Whether the function accepts a call with `arity` arguments.
    pub fn accepts_arity(&self, arity: usize) -> bool {
        self.signatures.iter().any(|sig| sig.len() == arity)
    }

    /// Evaluates the function over already-evaluated arguments.
    pub fn call(&self, args: &[T]) -> Result<T> {
        (self.eval)(args)
    }
}

impl<T: ExprValue> fmt::Debug for FunctionDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDef")
            .field("name", &self.name)
            .field("signatures", &self.signatures)
            .finish()
    }
}

// Comparing the eval fn pointer would make equality depend on how the
// compiler unified function items, so identity is name plus signatures.
impl<T: ExprValue> PartialEq for FunctionDef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.signatures == other.signatures
    }
}

/// Registration input for a function: all metadata plus the evaluation
/// entry point, in one plain struct so builtin tables can be `static`.
pub struct FunctionSpec<T: ExprValue> {
    pub name: &'static str,
    pub display: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub signatures: &'static [&'static [ArgType]],
    pub examples: &'static [Usage],
    pub eval: fn(&[T]) -> Result<T>,
}

// All fields are `'static` references or fn pointers, so this is Copy for
// every T, Copy or not.
impl<T: ExprValue> Clone for FunctionSpec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ExprValue> Copy for FunctionSpec<T> {}

/// Registry of named functions.
pub struct FunctionRegistry<T: ExprValue> {
    entries: HashMap<&'static str, Rc<FunctionDef<T>>>,
}

impl<T: ExprValue> Default for FunctionRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ExprValue> FunctionRegistry<T> {
    /// Empty registry.
    pub fn new() -> Self {
        FunctionRegistry {
            entries: HashMap::new(),
        }
    }

    /// Registers a function from its spec, enforcing the population
    /// invariants: non-empty name, display, category and description; at
    /// least one signature; at least as many examples as signatures; no
    /// duplicate names.
    pub fn register(&mut self, spec: FunctionSpec<T>) -> Result<()> {
        let reject = |reason: &str| {
            Err(ExprError::Registration {
                name: spec.name.to_string(),
                reason: reason.to_string(),
            })
        };
        if spec.name.is_empty() {
            return reject("function name must not be empty");
        }
        if spec.display.is_empty() {
            return reject("display name must not be empty");
        }
        if spec.category.is_empty() {
            return reject("category must not be empty");
        }
        if spec.description.is_empty() {
            return reject("description must not be empty");
        }
        if spec.signatures.is_empty() {
            return reject("at least one call signature is required");
        }
        if spec.examples.len() < spec.signatures.len() {
            return reject("every call signature needs a usage example");
        }
        if self.entries.contains_key(spec.name) {
            return reject("function is already registered");
        }
        self.entries.insert(
            spec.name,
            Rc::new(FunctionDef {
                name: spec.name,
                display: spec.display,
                category: spec.category,
                description: spec.description,
                signatures: spec.signatures,
                examples: spec.examples,
                eval: spec.eval,
            }),
        );
        Ok(())
    }

    /// Looks up a function definition by name.
    pub fn def(&self, name: &str) -> Option<Rc<FunctionDef<T>>> {
        self.entries.get(name).cloned()
    }

    /// Iterates over every registered definition, for metadata listings.
    pub fn defs(&self) -> impl Iterator<Item = &Rc<FunctionDef<T>>> {
        self.entries.values()
    }

    /// Builds a fresh call node for `name` over `args`.
    ///
    /// Returns `Ok(None)` for an unregistered name so the caller can decide
    /// whether that is an error. A registered name called with an arity no
    /// signature accepts is a syntax error.
    pub fn create_call(&self, name: &str, args: Vec<Expr<T>>) -> Result<Option<Expr<T>>> {
        let Some(function) = self.def(name) else {
            return Ok(None);
        };
        if !function.accepts_arity(args.len()) {
            return Err(ExprError::Syntax {
                found: format!("{name} called with {} argument(s)", args.len()),
            });
        }
        Ok(Some(Expr::Call { function, args }))
    }
}
