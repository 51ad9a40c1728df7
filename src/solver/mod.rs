//! Constraint models and the SMT backend.
//!
//! A [`Model`] collects the type variables, named types and assertions of
//! one unit; [`ModelSet`] fans a batch of models out over a thread pool.
//! Types are encoded as a closed algebraic datatype with `POW` and
//! `PRODUCT` constructors plus one nullary constructor per named type, so
//! satisfiability is decided by constructor injectivity alone.

mod constraint;
mod error;
mod model;
mod modelset;

pub use constraint::Constraint;
pub use error::SolveError;
pub use model::Model;
pub use modelset::ModelSet;
