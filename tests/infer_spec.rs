use binfer::ast::{
    BinOp, BoundVar, CmpOp, Expr, ExprKind, Instr, MachineKind, NaryKind, Pred,
};
use binfer::{Context, Generator, Model, ModelSet, SolveError};

fn normalize(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn setup() -> (Generator, Context, Model) {
    let gen = Generator::new();
    let ctx = Context::with_default_sets();
    let model = gen.base_model();
    (gen, ctx, model)
}

#[test]
fn integer_addition_solves_to_integer() {
    let (mut gen, mut ctx, mut model) = setup();
    let expr = Expr::binary(BinOp::IntAdd, Expr::int_lit("3"), Expr::int_lit("4"));
    let node = gen
        .observe_expression(&expr, &mut ctx, &mut model)
        .expect("generation failed");
    let values = model.solve().expect("model must be satisfiable");
    assert_eq!(values[&gen.arena().var(node).name()], "INTEGER");
}

#[test]
fn membership_in_nat_makes_the_member_an_integer() {
    let (mut gen, mut ctx, mut model) = setup();
    let pred = Pred::comparison(CmpOp::In, Expr::ident("x"), Expr::ident("NAT"));
    gen.observe_predicate(&pred, &mut ctx, &mut model)
        .expect("generation failed");
    let x = ctx.get("x").unwrap();
    let values = model.solve().expect("model must be satisfiable");
    assert_eq!(values[&gen.arena().var(x).name()], "INTEGER");
}

#[test]
fn enumerated_set_elements_take_the_set_type() {
    let (mut gen, mut ctx, mut model) = setup();
    gen.declare_set(
        &BoundVar::new("COLOR"),
        &[BoundVar::new("red"), BoundVar::new("green")],
        MachineKind::Abstraction,
        &mut ctx,
        &mut model,
    );
    let red = ctx.get("red").unwrap();
    let color = ctx.get("COLOR").unwrap();
    let values = model.solve().expect("model must be satisfiable");
    assert_eq!(values[&gen.arena().var(red).name()], "COLOR");
    assert_eq!(
        normalize(&values[&gen.arena().var(color).name()]),
        "(POW COLOR)"
    );
}

#[test]
fn concatenation_unifies_sequence_element_types() {
    let (mut gen, mut ctx, mut model) = setup();
    let literal = Expr::new(ExprKind::Nary {
        kind: NaryKind::SeqExtension,
        items: vec![Expr::int_lit("1")],
    });
    let pin = Pred::comparison(CmpOp::Eq, Expr::ident("s"), literal);
    gen.observe_predicate(&pin, &mut ctx, &mut model)
        .expect("generation failed");
    let concat = Expr::binary(BinOp::Concat, Expr::ident("s"), Expr::ident("t"));
    gen.observe_expression(&concat, &mut ctx, &mut model)
        .expect("generation failed");
    let t = ctx.get("t").unwrap();
    let values = model.solve().expect("model must be satisfiable");
    assert_eq!(
        normalize(&values[&gen.arena().var(t).name()]),
        "(POW (PRODUCT INTEGER INTEGER))"
    );
}

#[test]
fn case_on_a_string_scrutinee_is_unsat() {
    let (mut gen, mut ctx, mut model) = setup();
    let case = Instr::Case {
        value: Expr::string_lit("\"mode\""),
        branches: vec![(Expr::int_lit("1"), Instr::Skip)],
        alt: None,
    };
    gen.observe_instruction(&case, &mut ctx, &mut model)
        .expect("generation failed");
    assert!(matches!(model.solve(), Err(SolveError::Unsat(_))));
}

#[test]
fn case_on_an_integer_scrutinee_is_sat() {
    let (mut gen, mut ctx, mut model) = setup();
    let pin = Pred::comparison(CmpOp::Eq, Expr::ident("v"), Expr::int_lit("0"));
    gen.observe_predicate(&pin, &mut ctx, &mut model)
        .expect("generation failed");
    let case = Instr::Case {
        value: Expr::ident("v"),
        branches: vec![(Expr::int_lit("1"), Instr::Skip)],
        alt: Some(Box::new(Instr::Skip)),
    };
    gen.observe_instruction(&case, &mut ctx, &mut model)
        .expect("generation failed");
    let v = ctx.get("v").unwrap();
    let values = model.solve().expect("model must be satisfiable");
    assert_eq!(values[&gen.arena().var(v).name()], "INTEGER");
}

#[test]
fn unsat_diagnostics_name_source_terms() {
    let (mut gen, mut ctx, mut model) = setup();
    let in_nat = Pred::comparison(CmpOp::In, Expr::ident("x"), Expr::ident("NAT"));
    let is_bool = Pred::comparison(CmpOp::Eq, Expr::ident("x"), Expr::bool_lit("TRUE"));
    gen.observe_predicate(&in_nat, &mut ctx, &mut model)
        .expect("generation failed");
    gen.observe_predicate(&is_bool, &mut ctx, &mut model)
        .expect("generation failed");
    let mut err = model.solve().expect_err("x cannot be INTEGER and BOOL");
    err.replace_terms(&gen.readable_terms());
    let SolveError::Unsat(lines) = err else {
        panic!("expected unsat");
    };
    assert!(
        lines.iter().any(|l| l.contains("t(x)")),
        "diagnostics do not name the source term: {:?}",
        lines
    );
}

#[test]
fn quantifier_scope_does_not_leak() {
    let (mut gen, mut ctx, mut model) = setup();
    let forall = Pred::Quantified {
        kind: binfer::ast::QuantKind::Forall,
        vars: vec![BoundVar::new("x")],
        body: Box::new(Pred::comparison(
            CmpOp::In,
            Expr::ident("x"),
            Expr::ident("NAT"),
        )),
    };
    gen.observe_predicate(&forall, &mut ctx, &mut model)
        .expect("generation failed");
    assert!(ctx.get("x").is_none(), "bound variable leaked");
    let outer = Pred::comparison(CmpOp::Eq, Expr::ident("x"), Expr::bool_lit("TRUE"));
    gen.observe_predicate(&outer, &mut ctx, &mut model)
        .expect("generation failed");
    // The quantified x was an integer, the outer x is a boolean; they are
    // different nodes, so both constraints hold at once.
    model.solve().expect("model must be satisfiable");
}

#[test]
fn obligations_solve_in_parallel_and_fail_fast() {
    let mut gen = Generator::new();
    let mut ctx = Context::with_default_sets();

    let mut sat = gen.base_model();
    let pin = Pred::comparison(CmpOp::In, Expr::ident("a"), Expr::ident("NAT"));
    gen.observe_predicate(&pin, &mut ctx, &mut sat)
        .expect("generation failed");
    gen.reset_memo();

    let mut unsat = gen.base_model();
    let clash = Pred::Nary {
        op: binfer::ast::NaryPredOp::And,
        clauses: vec![
            Pred::comparison(CmpOp::In, Expr::ident("b"), Expr::ident("NAT")),
            Pred::comparison(CmpOp::Eq, Expr::ident("b"), Expr::bool_lit("TRUE")),
        ],
    };
    gen.observe_predicate(&clash, &mut ctx, &mut unsat)
        .expect("generation failed");

    let mut set = ModelSet::new();
    set.push(sat);
    set.push(unsat);
    assert!(matches!(set.solve(), Err(SolveError::Unsat(_))));

    let mut sequential = ModelSet::sequential();
    let mut redo = gen.base_model();
    gen.reset_memo();
    let pin = Pred::comparison(CmpOp::In, Expr::ident("c"), Expr::ident("NAT"));
    gen.observe_predicate(&pin, &mut ctx, &mut redo)
        .expect("generation failed");
    let c = ctx.get("c").unwrap();
    sequential.push(redo);
    let values = sequential.solve().expect("model must be satisfiable");
    assert_eq!(values[&gen.arena().var(c).name()], "INTEGER");
}

#[test]
fn generation_is_deterministic() {
    let build = || {
        let (mut gen, mut ctx, mut model) = setup();
        gen.declare_set(
            &BoundVar::new("COLOR"),
            &[BoundVar::new("red")],
            MachineKind::Abstraction,
            &mut ctx,
            &mut model,
        );
        let pred = Pred::comparison(CmpOp::In, Expr::ident("x"), Expr::ident("COLOR"));
        gen.observe_predicate(&pred, &mut ctx, &mut model)
            .expect("generation failed");
        model.to_smt()
    };
    assert_eq!(build(), build());
}
