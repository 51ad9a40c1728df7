//! Predicate typing rules. Predicates have no type of their own; observing
//! one only constrains the expressions it compares.

use super::{Context, Generator, InferError};
use crate::ast::{CmpOp, Pred};
use crate::solver::Model;
use crate::term::TypeTerm;

impl Generator {
    pub fn observe_predicate(
        &mut self,
        pred: &Pred,
        ctx: &mut Context,
        model: &mut Model,
    ) -> Result<(), InferError> {
        match pred {
            Pred::Not(inner) => self.observe_predicate(inner, ctx, model),
            Pred::Nary { clauses, .. } => {
                for clause in clauses {
                    self.observe_predicate(clause, ctx, model)?;
                }
                Ok(())
            }
            Pred::Binary { left, right, .. } => {
                self.observe_predicate(left, ctx, model)?;
                self.observe_predicate(right, ctx, model)
            }
            Pred::Quantified { vars, body, .. } => {
                let mut scope = ctx.child();
                self.declare_bound(vars, &mut scope, model);
                self.observe_predicate(body, &mut scope, model)
            }
            Pred::Comparison { op, left, right } => {
                let l = self.observe_expression(left, ctx, model)?;
                let r = self.observe_expression(right, ctx, model)?;
                match op {
                    CmpOp::In | CmpOp::NotIn => {
                        model.assert_eq(self.node_term(r), TypeTerm::pow(self.node_term(l)));
                    }
                    CmpOp::Eq | CmpOp::NotEq => {
                        model.assert_eq(self.node_term(r), self.node_term(l));
                    }
                    CmpOp::IntLe | CmpOp::IntLt | CmpOp::IntGe | CmpOp::IntGt => {
                        model.assert_eq(self.node_term(l), TypeTerm::integer());
                        model.assert_eq(self.node_term(r), TypeTerm::integer());
                    }
                    CmpOp::RealLe | CmpOp::RealLt | CmpOp::RealGe | CmpOp::RealGt => {
                        model.assert_eq(self.node_term(l), TypeTerm::real());
                        model.assert_eq(self.node_term(r), TypeTerm::real());
                    }
                    CmpOp::Subset
                    | CmpOp::StrictSubset
                    | CmpOp::NotSubset
                    | CmpOp::NotStrictSubset => {
                        self.as_set(l, model);
                        self.as_set(r, model);
                        model.assert_eq(self.node_term(l), self.node_term(r));
                    }
                }
                Ok(())
            }
        }
    }
}
