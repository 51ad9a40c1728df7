//! The constraint generator.
//!
//! One [`Generator`] per session walks untyped syntax and emits structural
//! equality constraints into [`Model`]s. It owns the node arena, the
//! session-wide variable counter, the carrier-set registry and the operation
//! registry; per-scope identifier bindings live in [`Context`] values the
//! walker threads through.

mod context;
mod expr;
mod instr;
mod memo;
mod pred;


use std::collections::HashMap;

use thiserror::Error;

pub use context::{Context, Resolution};
use memo::Memo;

use crate::arena::{ExprArena, NodeId};
use crate::ast::{BoundVar, Instr, MachineKind, Pred, UnknownConstruct};
use crate::position::Position;
use crate::solver::Model;
use crate::term::{TypeTerm, VarGen};

/// A failure while generating constraints. All of these are programmer
/// errors in the analyzed machine (or an unsupported construct), fatal for
/// the current unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferError {
    #[error(transparent)]
    UnknownConstruct(#[from] UnknownConstruct),
    #[error("operation `{name}` refined with {found} parameters, expected {expected}")]
    RefinementArity {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("call to unknown operation `{0}`")]
    UnknownOperation(String),
    #[error("call to `{name}` passes {found} {dir} parameters, expected {expected}")]
    CallArity {
        name: String,
        dir: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("`{0}` is valuated but not bound in the enclosing scope")]
    UnboundIdentifier(String),
}

/// Signature of a declared operation: its own node plus the nodes of its
/// input and output parameters, used to unify refinements and call sites.
#[derive(Debug, Clone)]
pub struct OperationSig {
    node: NodeId,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
}

#[derive(Debug, Default)]
pub struct Generator {
    vars: VarGen,
    arena: ExprArena,
    global: Context,
    memo: Memo,
    operations: HashMap<String, OperationSig>,
}

impl Generator {
    pub fn new() -> Self {
        Generator::default()
    }

    /// A model pre-seeded with the named types every unit relies on.
    pub fn base_model(&self) -> Model {
        Model::base()
    }

    pub fn arena(&self) -> &ExprArena {
        &self.arena
    }

    /// Map from solver variable name to a `t(<source text>)` tag, for
    /// rewriting unsat diagnostics into source terms.
    pub fn readable_terms(&self) -> HashMap<String, String> {
        self.arena
            .iter()
            .map(|(_, node)| (node.var().name(), format!("t({})", node.render())))
            .collect()
    }

    /// Declare a `SETS` clause entry: an abstract set (no values) or an
    /// enumerated set. In implementation machines an unvaluated set is an
    /// integer set; everywhere else the set introduces its own named type.
    pub fn declare_set(
        &mut self,
        id: &BoundVar,
        values: &[BoundVar],
        machine: MachineKind,
        ctx: &mut Context,
        model: &mut Model,
    ) {
        let id_node = self.observe_ident(&id.name, id.pos, true, ctx, model);
        let value_nodes: Vec<NodeId> = values
            .iter()
            .map(|v| self.observe_ident(&v.name, v.pos, true, ctx, model))
            .collect();

        let render = if values.is_empty() {
            id.name.clone()
        } else {
            let names = values
                .iter()
                .map(|v| v.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{{}}}", names)
        };
        let set_var = self.vars.fresh();
        model.declare_var(set_var);
        self.arena.alloc(render, set_var);

        if values.is_empty() && machine == MachineKind::Implementation {
            model.assert_eq(TypeTerm::Var(set_var), TypeTerm::pow(TypeTerm::integer()));
        } else {
            model.declare_named(&id.name);
            self.global.add_set(&id.name);
            model.assert_eq(
                TypeTerm::Var(set_var),
                TypeTerm::pow(TypeTerm::named(&id.name)),
            );
            for value in &value_nodes {
                model.assert_eq(
                    self.node_term(id_node),
                    TypeTerm::pow(self.node_term(*value)),
                );
            }
        }
        model.assert_eq(self.node_term(id_node), TypeTerm::Var(set_var));
    }

    /// Declare a machine parameter. By B convention an all-uppercase name
    /// is a carrier set; anything else is a scalar parameter.
    pub fn declare_parameter(
        &mut self,
        param: &BoundVar,
        machine: MachineKind,
        ctx: &mut Context,
        model: &mut Model,
    ) {
        let is_set = !param.name.is_empty()
            && param
                .name
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
        if is_set {
            self.declare_set(param, &[], machine, ctx, model);
        } else {
            self.observe_ident(&param.name, param.pos, false, ctx, model);
        }
    }

    /// Declare an operation: binds its parameters in a child scope, types
    /// the optional precondition and body there, builds the signature node
    /// and records it. Re-declaring an operation (a refinement) unifies the
    /// parameter types pairwise; a different arity is fatal.
    #[allow(clippy::too_many_arguments)]
    pub fn declare_operation(
        &mut self,
        name: &str,
        pos: Option<Position>,
        inputs: &[BoundVar],
        outputs: &[BoundVar],
        precondition: Option<&Pred>,
        body: Option<&Instr>,
        ctx: &Context,
        model: &mut Model,
    ) -> Result<(), InferError> {
        let mut scope = ctx.child();
        let output_nodes: Vec<NodeId> = outputs
            .iter()
            .map(|v| self.observe_ident(&v.name, v.pos, false, &mut scope, model))
            .collect();
        let input_nodes: Vec<NodeId> = inputs
            .iter()
            .map(|v| self.observe_ident(&v.name, v.pos, false, &mut scope, model))
            .collect();
        if let Some(pred) = precondition {
            self.observe_predicate(pred, &mut scope, model)?;
        }
        if let Some(instr) = body {
            self.observe_instruction(instr, &mut scope, model)?;
        }

        let op_var = self.vars.fresh();
        model.declare_var(op_var);
        let op_node = self.arena.alloc(name.to_string(), op_var);
        if let Some(pos) = pos {
            self.arena.add_position(op_node, pos);
        }

        let args: Vec<NodeId> = input_nodes
            .iter()
            .chain(output_nodes.iter())
            .copied()
            .collect();
        match args.len() {
            0 => {}
            1 => model.assert_eq(TypeTerm::Var(op_var), self.node_term(args[0])),
            _ => {
                let terms: Vec<TypeTerm> = args.iter().map(|&n| self.node_term(n)).collect();
                model.assert_eq(
                    TypeTerm::Var(op_var),
                    TypeTerm::pow(TypeTerm::product_of(&terms)),
                );
            }
        }

        if let Some(prev) = self.operations.get(name).cloned() {
            if prev.inputs.len() != input_nodes.len() || prev.outputs.len() != output_nodes.len()
            {
                return Err(InferError::RefinementArity {
                    name: name.to_string(),
                    expected: prev.inputs.len() + prev.outputs.len(),
                    found: input_nodes.len() + output_nodes.len(),
                });
            }
            for (new, old) in input_nodes
                .iter()
                .zip(&prev.inputs)
                .chain(output_nodes.iter().zip(&prev.outputs))
            {
                model.declare_var(self.arena.var(*old));
                model.assert_eq(self.node_term(*new), self.node_term(*old));
            }
        }
        self.operations.insert(
            name.to_string(),
            OperationSig {
                node: op_node,
                inputs: input_nodes,
                outputs: output_nodes,
            },
        );
        Ok(())
    }

    /// Resolve an identifier against the scope and mark its use in the
    /// current model. `lookup` is false when the identifier is being bound
    /// (quantifiers, LET, ANY, operation headers), which shadows any outer
    /// binding of the same name.
    pub(crate) fn observe_ident(
        &mut self,
        name: &str,
        pos: Option<Position>,
        lookup: bool,
        ctx: &mut Context,
        model: &mut Model,
    ) -> NodeId {
        let node = match self.resolve(ctx, name, lookup) {
            Resolution::Local(node) => node,
            Resolution::GlobalSet => {
                let node = match self.global.get(name) {
                    Some(node) => node,
                    None => {
                        let var = self.vars.fresh();
                        let node = self.arena.alloc(name.to_string(), var);
                        self.global.bind(name, node);
                        node
                    }
                };
                let var = self.arena.var(node);
                model.declare_var(var);
                if matches!(name, "INT" | "NAT" | "NAT1" | "NATURAL" | "NATURAL1") {
                    model.assert_eq(TypeTerm::Var(var), TypeTerm::pow(TypeTerm::integer()));
                } else {
                    model.declare_named(name);
                    model.assert_eq(TypeTerm::Var(var), TypeTerm::pow(TypeTerm::named(name)));
                }
                node
            }
            Resolution::Fresh => {
                let var = self.vars.fresh();
                let node = self.arena.alloc(name.to_string(), var);
                ctx.bind(name, node);
                node
            }
        };
        model.declare_var(self.arena.var(node));
        if let Some(pos) = pos {
            self.arena.add_position(node, pos);
        }
        node
    }

    fn resolve(&self, ctx: &Context, name: &str, lookup: bool) -> Resolution {
        if lookup {
            if let Some(node) = ctx.get(name) {
                return Resolution::Local(node);
            }
        }
        if ctx.contains_set(name) || self.global.contains_set(name) {
            return Resolution::GlobalSet;
        }
        Resolution::Fresh
    }

    pub(crate) fn node_term(&self, node: NodeId) -> TypeTerm {
        TypeTerm::Var(self.arena.var(node))
    }

    pub(crate) fn declare_bound(
        &mut self,
        vars: &[BoundVar],
        scope: &mut Context,
        model: &mut Model,
    ) -> Vec<NodeId> {
        vars.iter()
            .map(|v| self.observe_ident(&v.name, v.pos, false, scope, model))
            .collect()
    }
}
