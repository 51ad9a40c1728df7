/// Structural type terms and type variables.
///
/// A `TypeTerm` mirrors B's set-theoretic types: a base/named type, a power
/// set, a cartesian product, or a variable standing for a type that is not
/// known yet. Terms are deliberately never unfolded during generation —
/// decomposing an expression of unknown shape always goes through a fresh
/// `TypeVar` (see the memo layer in `infer`), which keeps every term small.
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// A type variable. Identity is the numeric id; the derived solver name
/// (`var_<id>`) is only used to talk to the backend and in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeVar(u32);

impl TypeVar {
    pub fn id(&self) -> u32 {
        self.0
    }

    /// The symbol under which the variable is declared to the solver.
    pub fn name(&self) -> String {
        format!("var_{}", self.0)
    }
}

impl fmt::Display for TypeVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "var_{}", self.0)
    }
}

/// Generates type variables with ids unique across the whole session.
///
/// The counter is shared (an `Arc<AtomicU32>`) rather than process-global so
/// that two independent sessions never interfere, while every Model produced
/// by one session can safely merge its variable sets with any other.
#[derive(Debug, Clone, Default)]
pub struct VarGen {
    next: Arc<AtomicU32>,
}

impl VarGen {
    pub fn new() -> Self {
        VarGen::default()
    }

    pub fn fresh(&self) -> TypeVar {
        TypeVar(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// A structural type: the closed term language of the `Type` datatype sort.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeTerm {
    Var(TypeVar),
    /// A base type (INTEGER, BOOL, REAL, FLOAT, STRING) or a user-declared
    /// abstract/enumerated set name.
    Named(String),
    Pow(Box<TypeTerm>),
    Product(Box<TypeTerm>, Box<TypeTerm>),
}

impl TypeTerm {
    pub fn named(name: impl Into<String>) -> Self {
        TypeTerm::Named(name.into())
    }

    pub fn integer() -> Self {
        TypeTerm::named("INTEGER")
    }

    pub fn boolean() -> Self {
        TypeTerm::named("BOOL")
    }

    pub fn real() -> Self {
        TypeTerm::named("REAL")
    }

    pub fn float() -> Self {
        TypeTerm::named("FLOAT")
    }

    pub fn string() -> Self {
        TypeTerm::named("STRING")
    }

    pub fn pow(inner: TypeTerm) -> Self {
        TypeTerm::Pow(Box::new(inner))
    }

    pub fn product(left: TypeTerm, right: TypeTerm) -> Self {
        TypeTerm::Product(Box::new(left), Box::new(right))
    }

    /// Left-associative n-ary product: `t1 x t2 x t3` is `(t1 x t2) x t3`.
    ///
    /// Panics on an empty slice; callers always have at least one operand
    /// (a one-element product is the element itself).
    pub fn product_of(terms: &[TypeTerm]) -> Self {
        let mut iter = terms.iter();
        let first = iter
            .next()
            .expect("product_of requires at least one operand")
            .clone();
        iter.fold(first, |acc, t| TypeTerm::product(acc, t.clone()))
    }

    /// SMT-LIB rendering, which is also the canonical output grammar:
    /// `Type ::= IDENT | "(POW " Type ")" | "(PRODUCT " Type " " Type ")"`.
    pub fn to_smt(&self) -> String {
        match self {
            TypeTerm::Var(v) => v.name(),
            TypeTerm::Named(name) => name.clone(),
            TypeTerm::Pow(inner) => format!("(POW {})", inner.to_smt()),
            TypeTerm::Product(a, b) => format!("(PRODUCT {} {})", a.to_smt(), b.to_smt()),
        }
    }

    /// Human-oriented rendering used for assertion identity: `POW(t)`,
    /// `a x b`.
    pub fn to_readable(&self) -> String {
        match self {
            TypeTerm::Var(v) => v.name(),
            TypeTerm::Named(name) => name.clone(),
            TypeTerm::Pow(inner) => format!("POW({})", inner.to_readable()),
            TypeTerm::Product(a, b) => format!("{} x {}", a.to_readable(), b.to_readable()),
        }
    }

    /// Collect every variable occurring in the term.
    pub fn variables(&self, out: &mut BTreeSet<TypeVar>) {
        match self {
            TypeTerm::Var(v) => {
                out.insert(*v);
            }
            TypeTerm::Named(_) => {}
            TypeTerm::Pow(inner) => inner.variables(out),
            TypeTerm::Product(a, b) => {
                a.variables(out);
                b.variables(out);
            }
        }
    }

    /// Collect every named type occurring in the term.
    pub fn named_types(&self, out: &mut BTreeSet<String>) {
        match self {
            TypeTerm::Var(_) => {}
            TypeTerm::Named(name) => {
                out.insert(name.clone());
            }
            TypeTerm::Pow(inner) => inner.named_types(out),
            TypeTerm::Product(a, b) => {
                a.named_types(out);
                b.named_types(out);
            }
        }
    }
}

impl From<TypeVar> for TypeTerm {
    fn from(var: TypeVar) -> Self {
        TypeTerm::Var(var)
    }
}
