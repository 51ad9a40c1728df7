use std::collections::HashMap;

use super::Generator;
use crate::arena::NodeId;
use crate::solver::Model;
use crate::term::{TypeTerm, TypeVar};

/// Decomposition caches. Asking twice what a node contains must hand back
/// the same variable and add no second assertion, otherwise every `dom`/`ran`
/// pair would invent parallel element types for one expression.
///
/// The caches are cleared at each proof-obligation boundary so the fresh
/// decomposition variables land in the obligation's own model.
#[derive(Debug, Default)]
pub(crate) struct Memo {
    sets: HashMap<NodeId, TypeVar>,
    sequences: HashMap<NodeId, TypeVar>,
    relations: HashMap<NodeId, (TypeVar, TypeVar)>,
}

impl Generator {
    /// The element type of a node known to be a set: `type(node) = POW(t)`.
    pub(crate) fn as_set(&mut self, node: NodeId, model: &mut Model) -> TypeVar {
        if let Some(&t) = self.memo.sets.get(&node) {
            model.declare_var(t);
            return t;
        }
        let t = self.vars.fresh();
        model.declare_var(t);
        model.assert_eq(
            TypeTerm::Var(self.arena.var(node)),
            TypeTerm::pow(TypeTerm::Var(t)),
        );
        self.memo.sets.insert(node, t);
        t
    }

    /// The element type of a node known to be a sequence:
    /// `type(node) = POW(INTEGER x t)`.
    pub(crate) fn as_sequence(&mut self, node: NodeId, model: &mut Model) -> TypeVar {
        if let Some(&t) = self.memo.sequences.get(&node) {
            model.declare_var(t);
            return t;
        }
        let t = self.vars.fresh();
        model.declare_var(t);
        model.assert_eq(
            TypeTerm::Var(self.arena.var(node)),
            TypeTerm::pow(TypeTerm::product(TypeTerm::integer(), TypeTerm::Var(t))),
        );
        self.memo.sequences.insert(node, t);
        t
    }

    /// The domain and range element types of a node known to be a relation:
    /// `type(node) = POW(t x u)`.
    pub(crate) fn as_relation(&mut self, node: NodeId, model: &mut Model) -> (TypeVar, TypeVar) {
        if let Some(&(t, u)) = self.memo.relations.get(&node) {
            model.declare_var(t);
            model.declare_var(u);
            return (t, u);
        }
        let t = self.vars.fresh();
        let u = self.vars.fresh();
        model.declare_var(t);
        model.declare_var(u);
        model.assert_eq(
            TypeTerm::Var(self.arena.var(node)),
            TypeTerm::pow(TypeTerm::product(TypeTerm::Var(t), TypeTerm::Var(u))),
        );
        self.memo.relations.insert(node, (t, u));
        (t, u)
    }

    /// Forget every cached decomposition.
    pub fn reset_memo(&mut self) {
        self.memo = Memo::default();
    }
}
