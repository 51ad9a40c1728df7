use std::collections::HashMap;

use binfer::{Model, ModelSet, SolveError, TypeTerm, VarGen};

fn normalize(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[test]
fn repeated_assertion_is_recorded_once() {
    let vars = VarGen::new();
    let a = vars.fresh();
    let mut model = Model::base();
    model.declare_var(a);
    model.assert_eq(TypeTerm::Var(a), TypeTerm::integer());
    model.assert_eq(TypeTerm::Var(a), TypeTerm::integer());
    assert_eq!(model.assertion_count(), 1);
}

#[test]
fn pow_injectivity_unifies_arguments() {
    let vars = VarGen::new();
    let a = vars.fresh();
    let b = vars.fresh();
    let mut model = Model::base();
    model.declare_var(a);
    model.declare_var(b);
    model.assert_eq(
        TypeTerm::pow(TypeTerm::Var(a)),
        TypeTerm::pow(TypeTerm::integer()),
    );
    model.assert_eq(TypeTerm::Var(b), TypeTerm::Var(a));
    let values = model.solve().expect("model must be satisfiable");
    assert_eq!(values[&a.name()], "INTEGER");
    assert_eq!(values[&b.name()], "INTEGER");
}

#[test]
fn compound_values_read_back_without_sharing() {
    let vars = VarGen::new();
    let a = vars.fresh();
    let mut model = Model::base();
    model.declare_var(a);
    model.assert_eq(
        TypeTerm::Var(a),
        TypeTerm::pow(TypeTerm::product(TypeTerm::integer(), TypeTerm::boolean())),
    );
    let values = model.solve().expect("model must be satisfiable");
    let value = &values[&a.name()];
    assert!(!value.contains("let"), "sharing not inlined: {}", value);
    assert_eq!(normalize(value), "(POW (PRODUCT INTEGER BOOL))");
}

#[test]
fn conflicting_constraints_report_an_unsat_core() {
    let vars = VarGen::new();
    let a = vars.fresh();
    let mut model = Model::base();
    model.declare_var(a);
    model.assert_eq(TypeTerm::Var(a), TypeTerm::integer());
    model.assert_eq(TypeTerm::Var(a), TypeTerm::boolean());
    match model.solve() {
        Err(SolveError::Unsat(lines)) => {
            assert!(!lines.is_empty());
            assert!(
                lines.iter().any(|l| l.contains("INTEGER"))
                    && lines.iter().any(|l| l.contains("BOOL")),
                "core misses a side of the conflict: {:?}",
                lines
            );
        }
        other => panic!("expected unsat, got {:?}", other),
    }
}

#[test]
fn conflict_lines_rewrite_to_source_terms() {
    let vars = VarGen::new();
    let a = vars.fresh();
    let mut model = Model::base();
    model.declare_var(a);
    model.assert_eq(TypeTerm::Var(a), TypeTerm::integer());
    model.assert_eq(TypeTerm::Var(a), TypeTerm::boolean());
    let mut err = model.solve().expect_err("model must be unsatisfiable");
    let mut map = HashMap::new();
    map.insert(a.name(), "t(x)".to_string());
    err.replace_terms(&map);
    let SolveError::Unsat(lines) = err else {
        panic!("expected unsat");
    };
    assert!(
        lines.iter().all(|l| l.contains("t(x)") && !l.contains(&a.name())),
        "rewrite missed a line: {:?}",
        lines
    );
}

#[test]
fn undeclared_named_type_is_a_typed_error() {
    let vars = VarGen::new();
    let a = vars.fresh();
    let mut model = Model::base();
    model.declare_var(a);
    model.assert_eq(TypeTerm::Var(a), TypeTerm::named("MYSTERY"));
    assert_eq!(
        model.solve(),
        Err(SolveError::UndeclaredType("MYSTERY".to_string()))
    );
}

#[test]
fn assertion_on_foreign_variable_is_skipped() {
    let vars = VarGen::new();
    let a = vars.fresh();
    let foreign = vars.fresh();
    let mut model = Model::base();
    model.declare_var(a);
    model.assert_eq(TypeTerm::Var(a), TypeTerm::boolean());
    // Constrains a variable another obligation owns; this model ignores it.
    model.assert_eq(TypeTerm::Var(foreign), TypeTerm::integer());
    let values = model.solve().expect("model must be satisfiable");
    assert_eq!(values[&a.name()], "BOOL");
    assert!(!values.contains_key(&foreign.name()));
}

#[test]
fn merge_unions_declarations_and_assertions() {
    let vars = VarGen::new();
    let a = vars.fresh();
    let b = vars.fresh();
    let mut left = Model::base();
    left.declare_var(a);
    left.assert_eq(TypeTerm::Var(a), TypeTerm::integer());
    let mut right = Model::base();
    right.declare_var(b);
    right.assert_eq(TypeTerm::Var(b), TypeTerm::boolean());
    left.merge(&right);
    let values = left.solve().expect("merged model must be satisfiable");
    assert_eq!(values[&a.name()], "INTEGER");
    assert_eq!(values[&b.name()], "BOOL");
}

#[test]
fn to_smt_renders_a_complete_script() {
    let vars = VarGen::new();
    let a = vars.fresh();
    let mut model = Model::base();
    model.declare_var(a);
    model.assert_eq(TypeTerm::Var(a), TypeTerm::pow(TypeTerm::integer()));
    let script = model.to_smt();
    assert!(script.contains("(set-option :produce-unsat-cores true)"));
    assert!(script.contains("(declare-datatypes ((Type 0))"));
    assert!(script.contains("(POW (t Type)) (PRODUCT (a Type) (b Type))"));
    assert!(script.contains(&format!("(declare-fun {} () Type)", a.name())));
    assert!(script.contains(":named c0"));
    assert!(script.contains("(check-sat)"));
    assert_eq!(script, model.to_smt(), "rendering must be deterministic");
}

#[test]
fn modelset_merges_every_obligation() {
    let vars = VarGen::new();
    let a = vars.fresh();
    let b = vars.fresh();
    let mut first = Model::base();
    first.declare_var(a);
    first.assert_eq(TypeTerm::Var(a), TypeTerm::integer());
    let mut second = Model::base();
    second.declare_var(b);
    second.assert_eq(TypeTerm::Var(b), TypeTerm::boolean());
    let mut set = ModelSet::new();
    set.push(first);
    set.push(second);
    let values = set.solve().expect("all models satisfiable");
    assert_eq!(values[&a.name()], "INTEGER");
    assert_eq!(values[&b.name()], "BOOL");
}

#[test]
fn modelset_fails_fast_on_any_unsat_member() {
    let vars = VarGen::new();
    let mut set = ModelSet::new();
    for _ in 0..2 {
        let v = vars.fresh();
        let mut model = Model::base();
        model.declare_var(v);
        model.assert_eq(TypeTerm::Var(v), TypeTerm::integer());
        set.push(model);
    }
    let bad = vars.fresh();
    let mut model = Model::base();
    model.declare_var(bad);
    model.assert_eq(TypeTerm::Var(bad), TypeTerm::integer());
    model.assert_eq(TypeTerm::Var(bad), TypeTerm::boolean());
    set.push(model);
    assert!(matches!(set.solve(), Err(SolveError::Unsat(_))));
}

#[test]
fn sequential_and_parallel_solving_agree() {
    let vars = VarGen::new();
    let a = vars.fresh();
    let build = |sequential: bool| {
        let mut model = Model::base();
        model.declare_var(a);
        model.assert_eq(TypeTerm::Var(a), TypeTerm::pow(TypeTerm::integer()));
        let mut set = if sequential {
            ModelSet::sequential()
        } else {
            ModelSet::new()
        };
        set.push(model);
        set.solve().expect("satisfiable")
    };
    assert_eq!(build(true), build(false));
}
