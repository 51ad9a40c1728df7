//! Instruction (substitution) typing rules.

use super::{Context, Generator, InferError};
use crate::ast::Instr;
use crate::solver::Model;
use crate::term::TypeTerm;

impl Generator {
    pub fn observe_instruction(
        &mut self,
        instr: &Instr,
        ctx: &mut Context,
        model: &mut Model,
    ) -> Result<(), InferError> {
        match instr {
            Instr::Skip => Ok(()),
            Instr::Block(body) => self.observe_instruction(body, ctx, model),
            Instr::Nary(items) => {
                for item in items {
                    self.observe_instruction(item, ctx, model)?;
                }
                Ok(())
            }
            Instr::Assert { guard, body } => {
                self.observe_predicate(guard, ctx, model)?;
                self.observe_instruction(body, ctx, model)
            }
            Instr::If { cond, then, alt } => {
                self.observe_predicate(cond, ctx, model)?;
                self.observe_instruction(then, ctx, model)?;
                if let Some(alt) = alt {
                    self.observe_instruction(alt, ctx, model)?;
                }
                Ok(())
            }
            Instr::Select { branches, alt } => {
                for (guard, body) in branches {
                    self.observe_predicate(guard, ctx, model)?;
                    self.observe_instruction(body, ctx, model)?;
                }
                if let Some(alt) = alt {
                    self.observe_instruction(alt, ctx, model)?;
                }
                Ok(())
            }
            Instr::Case {
                value,
                branches,
                alt,
            } => {
                let scrutinee = self.observe_expression(value, ctx, model)?;
                // CASE only discriminates scalar values: rule out sets,
                // products and strings up front.
                let t = self.vars.fresh();
                model.declare_var(t);
                model.assert_neq(TypeTerm::pow(t.into()), self.node_term(scrutinee));
                let t1 = self.vars.fresh();
                let t2 = self.vars.fresh();
                model.declare_var(t1);
                model.declare_var(t2);
                model.assert_neq(
                    TypeTerm::product(t1.into(), t2.into()),
                    self.node_term(scrutinee),
                );
                model.assert_neq(TypeTerm::string(), self.node_term(scrutinee));
                for (choice, body) in branches {
                    let choice_node = self.observe_expression(choice, ctx, model)?;
                    model.assert_eq(self.node_term(choice_node), self.node_term(scrutinee));
                    self.observe_instruction(body, ctx, model)?;
                }
                if let Some(alt) = alt {
                    self.observe_instruction(alt, ctx, model)?;
                }
                Ok(())
            }
            Instr::Any { vars, pred, body } => {
                let mut scope = ctx.child();
                self.declare_bound(vars, &mut scope, model);
                self.observe_predicate(pred, &mut scope, model)?;
                self.observe_instruction(body, &mut scope, model)
            }
            Instr::Let { vars, values, body } => {
                let mut scope = ctx.child();
                self.declare_bound(vars, &mut scope, model);
                for value in values {
                    self.observe_expression(value, &mut scope, model)?;
                }
                self.observe_instruction(body, &mut scope, model)
            }
            Instr::BecomesIn { vars, set } => {
                let var_nodes = vars
                    .iter()
                    .map(|v| self.observe_expression(v, ctx, model))
                    .collect::<Result<Vec<_>, _>>()?;
                let set_node = self.observe_expression(set, ctx, model)?;
                if !var_nodes.is_empty() {
                    let terms: Vec<TypeTerm> =
                        var_nodes.iter().map(|&n| self.node_term(n)).collect();
                    model.assert_eq(
                        self.node_term(set_node),
                        TypeTerm::pow(TypeTerm::product_of(&terms)),
                    );
                }
                Ok(())
            }
            Instr::BecomesSuchThat { vars, pred } => {
                for var in vars {
                    self.observe_expression(var, ctx, model)?;
                }
                self.observe_predicate(pred, ctx, model)
            }
            Instr::VarIn { vars, body } => {
                let mut scope = ctx.child();
                self.declare_bound(vars, &mut scope, model);
                self.observe_instruction(body, &mut scope, model)
            }
            Instr::Assign { vars, values } => {
                for (var, value) in vars.iter().zip(values) {
                    let var_node = self.observe_expression(var, ctx, model)?;
                    let value_node = self.observe_expression(value, ctx, model)?;
                    model.assert_eq(self.node_term(var_node), self.node_term(value_node));
                }
                Ok(())
            }
            Instr::Call {
                name,
                pos,
                inputs,
                outputs,
            } => {
                let sig = self
                    .operations
                    .get(name)
                    .cloned()
                    .ok_or_else(|| InferError::UnknownOperation(name.clone()))?;
                if inputs.len() != sig.inputs.len() {
                    return Err(InferError::CallArity {
                        name: name.clone(),
                        dir: "input",
                        expected: sig.inputs.len(),
                        found: inputs.len(),
                    });
                }
                if outputs.len() != sig.outputs.len() {
                    return Err(InferError::CallArity {
                        name: name.clone(),
                        dir: "output",
                        expected: sig.outputs.len(),
                        found: outputs.len(),
                    });
                }
                let callee = self.observe_ident(name, *pos, true, ctx, model);
                model.declare_var(self.arena.var(sig.node));
                model.assert_eq(self.node_term(callee), self.node_term(sig.node));
                for (actual, formal) in inputs
                    .iter()
                    .zip(&sig.inputs)
                    .chain(outputs.iter().zip(&sig.outputs))
                {
                    let actual_node = self.observe_expression(actual, ctx, model)?;
                    model.declare_var(self.arena.var(*formal));
                    model.assert_eq(self.node_term(actual_node), self.node_term(*formal));
                }
                Ok(())
            }
            Instr::While {
                cond,
                body,
                invariant,
                variant,
            } => {
                self.observe_predicate(cond, ctx, model)?;
                self.observe_instruction(body, ctx, model)?;
                self.observe_predicate(invariant, ctx, model)?;
                let variant_node = self.observe_expression(variant, ctx, model)?;
                model.assert_eq(self.node_term(variant_node), TypeTerm::integer());
                Ok(())
            }
        }
    }
}
