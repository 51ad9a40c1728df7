use std::collections::BTreeSet;

use crate::term::{TypeTerm, TypeVar};

/// A constraint over type terms: either an equality or a negated equality.
///
/// Negated equalities only come from CASE instructions, which must rule out
/// set, product and string scrutinees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    Eq(TypeTerm, TypeTerm),
    Neq(TypeTerm, TypeTerm),
}

impl Constraint {
    /// Canonical readable rendering; two constraints with the same canonical
    /// form are the same assertion.
    pub fn canonical(&self) -> String {
        match self {
            Constraint::Eq(l, r) => format!("{} = {}", l.to_readable(), r.to_readable()),
            Constraint::Neq(l, r) => {
                format!("not ({} = {})", l.to_readable(), r.to_readable())
            }
        }
    }

    /// SMT-LIB body of the assertion (without the `assert` wrapper).
    pub fn to_smt(&self) -> String {
        match self {
            Constraint::Eq(l, r) => format!("(= {} {})", l.to_smt(), r.to_smt()),
            Constraint::Neq(l, r) => format!("(not (= {} {}))", l.to_smt(), r.to_smt()),
        }
    }

    /// The conflict line shown in unsat diagnostics.
    pub fn conflict_line(&self) -> String {
        match self {
            Constraint::Eq(l, r) => format!("{} = {}", l.to_smt(), r.to_smt()),
            Constraint::Neq(l, r) => format!("{} /= {}", l.to_smt(), r.to_smt()),
        }
    }

    pub fn variables(&self, out: &mut BTreeSet<TypeVar>) {
        let (l, r) = self.sides();
        l.variables(out);
        r.variables(out);
    }

    pub fn named_types(&self, out: &mut BTreeSet<String>) {
        let (l, r) = self.sides();
        l.named_types(out);
        r.named_types(out);
    }

    fn sides(&self) -> (&TypeTerm, &TypeTerm) {
        match self {
            Constraint::Eq(l, r) | Constraint::Neq(l, r) => (l, r),
        }
    }
}
