//! Structural type inference for the B method.
//!
//! B expressions carry set-theoretic types: base types, power sets and
//! cartesian products. This crate walks untyped machine syntax, emits
//! structural equality constraints over those types, and decides them with
//! an SMT solver by encoding the type language as an algebraic datatype.
//! A satisfying assignment yields the inferred type of every expression;
//! an unsatisfiable core is turned into a readable conflict report.
//!
//! The crate is a library: reading project files, walking their XML trees
//! into the [`ast`] types and writing results back out are the caller's
//! concern.

pub mod arena;
pub mod ast;
pub mod infer;
pub mod position;
pub mod solver;
pub mod term;

pub use infer::{Context, Generator, InferError};
pub use position::Position;
pub use solver::{Constraint, Model, ModelSet, SolveError};
pub use term::{TypeTerm, TypeVar, VarGen};
