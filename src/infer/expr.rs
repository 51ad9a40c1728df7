//! Expression typing rules.

use super::{Context, Generator, InferError};
use crate::arena::NodeId;
use crate::ast::{BinOp, Binder, Expr, ExprKind, NaryKind, UnOp};
use crate::solver::Model;
use crate::term::TypeTerm;

impl Generator {
    /// Type an expression: returns its node after asserting the constraints
    /// its operator imposes.
    pub fn observe_expression(
        &mut self,
        expr: &Expr,
        ctx: &mut Context,
        model: &mut Model,
    ) -> Result<NodeId, InferError> {
        self.observe_expression_with(expr, ctx, model, true)
    }

    pub(crate) fn observe_expression_with(
        &mut self,
        expr: &Expr,
        ctx: &mut Context,
        model: &mut Model,
        lookup: bool,
    ) -> Result<NodeId, InferError> {
        match &expr.kind {
            ExprKind::Ident(name) => Ok(self.observe_ident(name, expr.pos, lookup, ctx, model)),
            ExprKind::IntLit(_) => Ok(self.literal(expr, TypeTerm::integer(), model)),
            ExprKind::BoolLit(_) => Ok(self.literal(expr, TypeTerm::boolean(), model)),
            ExprKind::RealLit(_) => Ok(self.literal(expr, TypeTerm::real(), model)),
            ExprKind::StringLit(_) => Ok(self.literal(expr, TypeTerm::string(), model)),
            ExprKind::Binary { op, left, right } => {
                self.observe_binary(expr, *op, left, right, ctx, model)
            }
            ExprKind::Unary { op, arg } => self.observe_unary(expr, *op, arg, ctx, model),
            ExprKind::Boolean(pred) => {
                self.observe_predicate(pred, ctx, model)?;
                Ok(self.literal(expr, TypeTerm::boolean(), model))
            }
            ExprKind::Nary { kind, items } => {
                let nodes = items
                    .iter()
                    .map(|item| self.observe_expression(item, ctx, model))
                    .collect::<Result<Vec<_>, _>>()?;
                let node = self.alloc_node(expr, model);
                if let Some((&first, rest)) = nodes.split_first() {
                    for &item in rest {
                        model.assert_eq(self.node_term(item), self.node_term(first));
                    }
                    let element = self.node_term(first);
                    let content = match kind {
                        NaryKind::SetExtension => element,
                        NaryKind::SeqExtension => {
                            TypeTerm::product(TypeTerm::integer(), element)
                        }
                    };
                    model.assert_eq(self.node_term(node), TypeTerm::pow(content));
                }
                Ok(node)
            }
            // Empty collections stay unconstrained; the solver values their
            // element type as the generic A when nothing else pins it down.
            ExprKind::EmptySet | ExprKind::EmptySeq => Ok(self.alloc_node(expr, model)),
            ExprKind::Comprehension { vars, pred } => {
                let mut scope = ctx.child();
                let bound = self.declare_bound(vars, &mut scope, model);
                self.observe_predicate(pred, &mut scope, model)?;
                let node = self.alloc_node(expr, model);
                if !bound.is_empty() {
                    let terms: Vec<TypeTerm> = bound.iter().map(|&n| self.node_term(n)).collect();
                    model.assert_eq(
                        self.node_term(node),
                        TypeTerm::pow(TypeTerm::product_of(&terms)),
                    );
                }
                Ok(node)
            }
            ExprKind::Quantified {
                binder,
                vars,
                pred,
                body,
            } => {
                let mut scope = ctx.child();
                let bound = self.declare_bound(vars, &mut scope, model);
                self.observe_predicate(pred, &mut scope, model)?;
                let body_node = self.observe_expression(body, &mut scope, model)?;
                let node = self.alloc_node(expr, model);
                match binder {
                    Binder::IntSum | Binder::IntProd => {
                        model.assert_eq(self.node_term(node), TypeTerm::integer());
                        model.assert_eq(self.node_term(body_node), TypeTerm::integer());
                    }
                    Binder::RealSum | Binder::RealProd => {
                        model.assert_eq(self.node_term(node), TypeTerm::real());
                        model.assert_eq(self.node_term(body_node), TypeTerm::real());
                    }
                    Binder::Union | Binder::Inter => {
                        self.as_set(node, model);
                        model.assert_eq(self.node_term(node), self.node_term(body_node));
                    }
                    Binder::Lambda => {
                        let mut terms: Vec<TypeTerm> =
                            bound.iter().map(|&n| self.node_term(n)).collect();
                        terms.push(self.node_term(body_node));
                        model.assert_eq(
                            self.node_term(node),
                            TypeTerm::pow(TypeTerm::product_of(&terms)),
                        );
                    }
                }
                Ok(node)
            }
            ExprKind::Valuation { ident, value } => {
                let id_node = ctx
                    .get(ident)
                    .ok_or_else(|| InferError::UnboundIdentifier(ident.clone()))?;
                model.declare_var(self.arena.var(id_node));
                let value_node = self.observe_expression(value, ctx, model)?;
                let node = self.alloc_node(expr, model);
                model.assert_eq(self.node_term(node), self.node_term(value_node));
                model.assert_eq(self.node_term(node), self.node_term(id_node));
                Ok(node)
            }
        }
    }

    fn literal(&mut self, expr: &Expr, ty: TypeTerm, model: &mut Model) -> NodeId {
        let node = self.alloc_node(expr, model);
        model.assert_eq(self.node_term(node), ty);
        node
    }

    pub(crate) fn alloc_node(&mut self, expr: &Expr, model: &mut Model) -> NodeId {
        let var = self.vars.fresh();
        model.declare_var(var);
        let node = self.arena.alloc(expr.render(), var);
        if let Some(pos) = expr.pos {
            self.arena.add_position(node, pos);
        }
        node
    }

    fn observe_binary(
        &mut self,
        expr: &Expr,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        ctx: &mut Context,
        model: &mut Model,
    ) -> Result<NodeId, InferError> {
        let l = self.observe_expression(left, ctx, model)?;
        let r = self.observe_expression(right, ctx, model)?;
        let node = self.alloc_node(expr, model);
        let result = self.node_term(node);
        match op {
            BinOp::CartesianProduct => {
                let t1 = self.as_set(l, model);
                let t2 = self.as_set(r, model);
                model.assert_eq(
                    result,
                    TypeTerm::pow(TypeTerm::product(t1.into(), t2.into())),
                );
            }
            BinOp::Concat => {
                let t1 = self.as_sequence(l, model);
                let t2 = self.as_sequence(r, model);
                model.assert_eq(TypeTerm::Var(t1), TypeTerm::Var(t2));
                model.assert_eq(result, self.node_term(l));
            }
            BinOp::Prepend => {
                let t = self.as_sequence(r, model);
                model.assert_eq(self.node_term(l), TypeTerm::Var(t));
                model.assert_eq(result, self.node_term(r));
            }
            BinOp::Append => {
                let t = self.as_sequence(l, model);
                model.assert_eq(self.node_term(r), TypeTerm::Var(t));
                model.assert_eq(result, self.node_term(l));
            }
            BinOp::RestrictFront | BinOp::RestrictTail => {
                self.as_sequence(l, model);
                model.assert_eq(self.node_term(r), TypeTerm::integer());
                model.assert_eq(result, self.node_term(l));
            }
            BinOp::Interval => {
                model.assert_eq(self.node_term(l), TypeTerm::integer());
                model.assert_eq(self.node_term(r), TypeTerm::integer());
                model.assert_eq(result, TypeTerm::pow(TypeTerm::integer()));
            }
            BinOp::SetMinus | BinOp::Intersection | BinOp::Union => {
                self.as_set(l, model);
                self.as_set(r, model);
                model.assert_eq(self.node_term(l), self.node_term(r));
                model.assert_eq(result, self.node_term(l));
            }
            BinOp::IntMul
            | BinOp::IntPow
            | BinOp::IntAdd
            | BinOp::IntSub
            | BinOp::IntDiv
            | BinOp::IntMod => {
                self.arithmetic(l, r, node, TypeTerm::integer(), model);
            }
            BinOp::RealMul | BinOp::RealPow | BinOp::RealAdd | BinOp::RealSub | BinOp::RealDiv => {
                self.arithmetic(l, r, node, TypeTerm::real(), model);
            }
            BinOp::FloatMul | BinOp::FloatAdd | BinOp::FloatSub | BinOp::FloatDiv => {
                self.arithmetic(l, r, node, TypeTerm::float(), model);
            }
            BinOp::Maplet | BinOp::Pair => {
                model.assert_eq(
                    result,
                    TypeTerm::product(self.node_term(l), self.node_term(r)),
                );
            }
            BinOp::Relations => {
                let t = self.as_set(l, model);
                let u = self.as_set(r, model);
                model.assert_eq(
                    result,
                    TypeTerm::pow(TypeTerm::pow(TypeTerm::product(t.into(), u.into()))),
                );
            }
            BinOp::Prj1 | BinOp::Prj2 => {
                let t = self.as_set(l, model);
                let u = self.as_set(r, model);
                let third = if op == BinOp::Prj1 { t } else { u };
                model.assert_eq(
                    result,
                    TypeTerm::pow(TypeTerm::product_of(&[
                        t.into(),
                        u.into(),
                        third.into(),
                    ])),
                );
            }
            BinOp::Compose => {
                let (t, u1) = self.as_relation(l, model);
                let (u2, v) = self.as_relation(r, model);
                model.assert_eq(TypeTerm::Var(u1), TypeTerm::Var(u2));
                model.assert_eq(result, TypeTerm::pow(TypeTerm::product(t.into(), v.into())));
            }
            BinOp::DirectProduct => {
                let (t1, u) = self.as_relation(l, model);
                let (t2, v) = self.as_relation(r, model);
                model.assert_eq(TypeTerm::Var(t1), TypeTerm::Var(t2));
                model.assert_eq(
                    result,
                    TypeTerm::pow(TypeTerm::product(
                        t1.into(),
                        TypeTerm::product(u.into(), v.into()),
                    )),
                );
            }
            BinOp::Parallel => {
                let (t, u) = self.as_relation(l, model);
                let (v, w) = self.as_relation(r, model);
                model.assert_eq(
                    result,
                    TypeTerm::pow(TypeTerm::product(
                        TypeTerm::product(t.into(), v.into()),
                        TypeTerm::product(u.into(), w.into()),
                    )),
                );
            }
            BinOp::Iterate => {
                let (t, u) = self.as_relation(l, model);
                model.assert_eq(TypeTerm::Var(t), TypeTerm::Var(u));
                model.assert_eq(self.node_term(r), TypeTerm::integer());
                model.assert_eq(result, self.node_term(l));
            }
            BinOp::Image => {
                let (t1, u) = self.as_relation(l, model);
                let t2 = self.as_set(r, model);
                model.assert_eq(TypeTerm::Var(t1), TypeTerm::Var(t2));
                model.assert_eq(result, TypeTerm::pow(u.into()));
            }
            BinOp::DomRestrict | BinOp::DomSubtract => {
                let t1 = self.as_set(l, model);
                let (t2, _) = self.as_relation(r, model);
                model.assert_eq(TypeTerm::Var(t1), TypeTerm::Var(t2));
                model.assert_eq(result, self.node_term(r));
            }
            BinOp::RanRestrict | BinOp::RanSubtract => {
                let (_, u1) = self.as_relation(l, model);
                let u2 = self.as_set(r, model);
                model.assert_eq(TypeTerm::Var(u1), TypeTerm::Var(u2));
            }
            BinOp::Override => {
                let (t1, u1) = self.as_relation(l, model);
                let (t2, u2) = self.as_relation(r, model);
                model.assert_eq(TypeTerm::Var(t1), TypeTerm::Var(t2));
                model.assert_eq(TypeTerm::Var(u1), TypeTerm::Var(u2));
                model.assert_eq(result, self.node_term(l));
            }
            BinOp::TotalFn
            | BinOp::PartialFn
            | BinOp::PartialInj
            | BinOp::TotalInj
            | BinOp::PartialSurj
            | BinOp::TotalSurj
            | BinOp::TotalBij => {
                let t = self.as_set(l, model);
                let u = self.as_set(r, model);
                model.assert_eq(
                    result,
                    TypeTerm::pow(TypeTerm::pow(TypeTerm::product(t.into(), u.into()))),
                );
            }
            BinOp::Apply => {
                let (t, u) = self.as_relation(l, model);
                model.assert_eq(TypeTerm::Var(t), self.node_term(r));
                model.assert_eq(result, TypeTerm::Var(u));
            }
        }
        Ok(node)
    }

    fn arithmetic(
        &mut self,
        l: NodeId,
        r: NodeId,
        node: NodeId,
        ty: TypeTerm,
        model: &mut Model,
    ) {
        model.assert_eq(self.node_term(l), self.node_term(r));
        model.assert_eq(self.node_term(node), self.node_term(l));
        model.assert_eq(self.node_term(node), ty);
    }

    fn observe_unary(
        &mut self,
        expr: &Expr,
        op: UnOp,
        arg: &Expr,
        ctx: &mut Context,
        model: &mut Model,
    ) -> Result<NodeId, InferError> {
        let a = self.observe_expression(arg, ctx, model)?;
        let node = self.alloc_node(expr, model);
        let result = self.node_term(node);
        match op {
            UnOp::UMinus | UnOp::Succ | UnOp::Pred => {
                model.assert_eq(self.node_term(a), TypeTerm::integer());
                model.assert_eq(result, self.node_term(a));
            }
            UnOp::Real => {
                model.assert_eq(self.node_term(a), TypeTerm::integer());
                model.assert_eq(result, TypeTerm::real());
            }
            UnOp::Floor | UnOp::Ceiling => {
                model.assert_eq(self.node_term(a), TypeTerm::real());
                model.assert_eq(result, TypeTerm::integer());
            }
            UnOp::IMax | UnOp::IMin => {
                model.assert_eq(self.node_term(a), TypeTerm::pow(TypeTerm::integer()));
                model.assert_eq(result, TypeTerm::integer());
            }
            UnOp::RMax | UnOp::RMin => {
                model.assert_eq(self.node_term(a), TypeTerm::pow(TypeTerm::real()));
                model.assert_eq(result, TypeTerm::real());
            }
            UnOp::Card => {
                self.as_set(a, model);
                model.assert_eq(result, TypeTerm::integer());
            }
            UnOp::Pow | UnOp::Pow1 | UnOp::Fin | UnOp::Fin1 => {
                self.as_set(a, model);
                model.assert_eq(result, TypeTerm::pow(self.node_term(a)));
            }
            UnOp::Seq | UnOp::Seq1 | UnOp::ISeq | UnOp::ISeq1 | UnOp::Perm => {
                let t = self.vars.fresh();
                model.declare_var(t);
                model.assert_eq(self.node_term(a), TypeTerm::pow(t.into()));
                model.assert_eq(
                    result,
                    TypeTerm::pow(TypeTerm::pow(TypeTerm::product(
                        TypeTerm::integer(),
                        t.into(),
                    ))),
                );
            }
            UnOp::Size => {
                self.as_sequence(a, model);
                model.assert_eq(result, TypeTerm::integer());
            }
            UnOp::First | UnOp::Last => {
                let t = self.as_sequence(a, model);
                model.assert_eq(result, TypeTerm::Var(t));
            }
            UnOp::Front | UnOp::Tail | UnOp::Rev => {
                self.as_sequence(a, model);
                model.assert_eq(result, self.node_term(a));
            }
            UnOp::Conc => {
                let t = self.vars.fresh();
                model.declare_var(t);
                model.assert_eq(
                    self.node_term(a),
                    TypeTerm::pow(TypeTerm::product(
                        TypeTerm::integer(),
                        TypeTerm::pow(TypeTerm::product(TypeTerm::integer(), t.into())),
                    )),
                );
                model.assert_eq(
                    result,
                    TypeTerm::pow(TypeTerm::product(TypeTerm::integer(), t.into())),
                );
            }
            UnOp::GenUnion | UnOp::GenInter => {
                self.as_set(node, model);
                model.assert_eq(self.node_term(a), TypeTerm::pow(self.node_term(node)));
            }
            UnOp::Id => {
                let t = self.as_set(a, model);
                model.assert_eq(result, TypeTerm::pow(TypeTerm::product(t.into(), t.into())));
            }
            UnOp::Inverse => {
                let t = self.vars.fresh();
                let u = self.vars.fresh();
                model.declare_var(t);
                model.declare_var(u);
                model.assert_eq(
                    self.node_term(a),
                    TypeTerm::pow(TypeTerm::product(t.into(), u.into())),
                );
                model.assert_eq(result, TypeTerm::pow(TypeTerm::product(u.into(), t.into())));
            }
            UnOp::Closure | UnOp::Closure1 => {
                let (t1, t2) = self.as_relation(a, model);
                model.assert_eq(TypeTerm::Var(t1), TypeTerm::Var(t2));
                model.assert_eq(result, self.node_term(a));
            }
            UnOp::Dom => {
                let (t, _) = self.as_relation(a, model);
                model.assert_eq(result, TypeTerm::pow(t.into()));
            }
            UnOp::Ran => {
                let (_, u) = self.as_relation(a, model);
                model.assert_eq(result, TypeTerm::pow(u.into()));
            }
            UnOp::Fnc => {
                let (t, u) = self.as_relation(a, model);
                model.assert_eq(
                    result,
                    TypeTerm::pow(TypeTerm::product(t.into(), TypeTerm::pow(u.into()))),
                );
            }
            UnOp::Rel => {
                let (t, pow_u) = self.as_relation(a, model);
                let u = self.vars.fresh();
                model.declare_var(u);
                model.assert_eq(TypeTerm::Var(pow_u), TypeTerm::pow(u.into()));
                model.assert_eq(result, TypeTerm::pow(TypeTerm::product(t.into(), u.into())));
            }
        }
        Ok(node)
    }
}
