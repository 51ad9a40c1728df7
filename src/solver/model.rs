use std::collections::{BTreeMap, BTreeSet, HashMap};

use z3::ast::{Ast, Bool, Datatype, Dynamic};
use z3::{Config, Context, DatatypeAccessor, DatatypeBuilder, FuncDecl, SatResult, Solver};

use super::{Constraint, SolveError};
use crate::term::{TypeTerm, TypeVar};

/// A self-contained constraint problem: the variables and named types of one
/// proof obligation (or one machine-level unit) and the assertions over
/// them.
///
/// Assertions are keyed by their canonical rendering, so asserting the same
/// constraint twice is a no-op and iteration order is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Model {
    variables: BTreeSet<TypeVar>,
    named: Vec<String>,
    assertions: BTreeMap<String, Constraint>,
}

impl Model {
    pub fn new() -> Self {
        Model::default()
    }

    /// The named types every unit starts from. `A` is the element type of
    /// otherwise unconstrained empty collections.
    pub fn base() -> Self {
        let mut model = Model::new();
        for name in ["A", "FLOAT", "INTEGER", "BOOL", "REAL", "STRING"] {
            model.declare_named(name);
        }
        model
    }

    pub fn declare_var(&mut self, var: TypeVar) {
        self.variables.insert(var);
    }

    pub fn declare_named(&mut self, name: &str) {
        if !self.named.iter().any(|n| n == name) {
            self.named.push(name.to_string());
        }
    }

    pub fn assert(&mut self, constraint: Constraint) {
        self.assertions
            .entry(constraint.canonical())
            .or_insert(constraint);
    }

    pub fn assert_eq(&mut self, left: TypeTerm, right: TypeTerm) {
        self.assert(Constraint::Eq(left, right));
    }

    pub fn assert_neq(&mut self, left: TypeTerm, right: TypeTerm) {
        self.assert(Constraint::Neq(left, right));
    }

    /// Union the other model's declarations and assertions into this one.
    pub fn merge(&mut self, other: &Model) {
        self.variables.extend(other.variables.iter().copied());
        for name in &other.named {
            self.declare_named(name);
        }
        for constraint in other.assertions.values() {
            self.assert(constraint.clone());
        }
    }

    pub fn variables(&self) -> impl Iterator<Item = &TypeVar> {
        self.variables.iter()
    }

    pub fn named_types(&self) -> &[String] {
        &self.named
    }

    pub fn assertions(&self) -> impl Iterator<Item = &Constraint> {
        self.assertions.values()
    }

    pub fn assertion_count(&self) -> usize {
        self.assertions.len()
    }

    /// Render the whole model as an SMT-LIB 2 script. `solve` does not go
    /// through this text (it talks to the backend API directly); the script
    /// is for debugging and golden tests.
    pub fn to_smt(&self) -> String {
        let mut out = String::new();
        out.push_str("(set-option :produce-unsat-cores true)\n");
        out.push_str("(declare-datatypes ((Type 0)) ((");
        out.push_str("(POW (t Type)) (PRODUCT (a Type) (b Type))");
        for name in &self.named {
            out.push_str(&format!(" ({})", name));
        }
        out.push_str(")))\n");
        for var in &self.variables {
            out.push_str(&format!("(declare-fun {} () Type)\n", var.name()));
        }
        for (i, constraint) in self.assertions.values().enumerate() {
            out.push_str(&format!(
                "(assert (! {} :named c{}))\n",
                constraint.to_smt(),
                i
            ));
        }
        out.push_str("(check-sat)\n");
        if !self.variables.is_empty() {
            let vars = self
                .variables
                .iter()
                .map(TypeVar::name)
                .collect::<Vec<_>>()
                .join(" ");
            out.push_str(&format!("(get-value ({}))\n", vars));
        }
        out
    }

    /// Solve the model. On sat, returns the value of every declared
    /// variable, keyed by its solver name, with `let`-sharing fully
    /// inlined. On unsat, returns the conflicting assertions.
    ///
    /// The backend context lives entirely inside this call, so models can
    /// be solved concurrently without sharing solver state.
    pub fn solve(&self) -> Result<BTreeMap<String, String>, SolveError> {
        let cfg = Config::new();
        let ctx = Context::new(&cfg);

        let mut builder = DatatypeBuilder::new(&ctx, "Type")
            .variant("POW", vec![("t", DatatypeAccessor::Datatype("Type".into()))])
            .variant(
                "PRODUCT",
                vec![
                    ("a", DatatypeAccessor::Datatype("Type".into())),
                    ("b", DatatypeAccessor::Datatype("Type".into())),
                ],
            );
        for name in &self.named {
            builder = builder.variant(name, vec![]);
        }
        let datatype = builder.finish();

        let pow = &datatype.variants[0].constructor;
        let product = &datatype.variants[1].constructor;
        let named: HashMap<&str, &FuncDecl> = self
            .named
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), &datatype.variants[i + 2].constructor))
            .collect();

        let consts: HashMap<u32, Datatype> = self
            .variables
            .iter()
            .map(|v| (v.id(), Datatype::new_const(&ctx, v.name(), &datatype.sort)))
            .collect();

        let solver = Solver::new(&ctx);
        let mut labels: HashMap<String, &Constraint> = HashMap::new();
        for (i, constraint) in self.assertions.values().enumerate() {
            let mut vars = BTreeSet::new();
            constraint.variables(&mut vars);
            // An assertion over a variable this model never declared comes
            // from a node typed in another obligation's scope; it is not
            // part of this problem.
            if vars.iter().any(|v| !self.variables.contains(v)) {
                continue;
            }
            let (lhs, rhs, negate) = match constraint {
                Constraint::Eq(l, r) => (l, r, false),
                Constraint::Neq(l, r) => (l, r, true),
            };
            let lhs = encode(lhs, pow, product, &named, &consts)?;
            let rhs = encode(rhs, pow, product, &named, &consts)?;
            let eq = lhs._eq(&rhs);
            let body = if negate { eq.not() } else { eq };
            let label = format!("c{}", i);
            let tracker = Bool::new_const(&ctx, label.clone());
            solver.assert_and_track(&body, &tracker);
            labels.insert(label, constraint);
        }

        match solver.check() {
            SatResult::Sat => {
                let model = solver
                    .get_model()
                    .ok_or_else(|| SolveError::Backend("sat result without a model".into()))?;
                let mut values = BTreeMap::new();
                for var in &self.variables {
                    let value = model.eval(&consts[&var.id()], true).ok_or_else(|| {
                        SolveError::Backend(format!("no value for {}", var.name()))
                    })?;
                    values.insert(var.name(), inline_lets(value.to_string()));
                }
                Ok(values)
            }
            SatResult::Unsat => {
                let mut conflicts = Vec::new();
                for tracker in solver.get_unsat_core() {
                    let label = tracker.to_string();
                    if let Some(constraint) = labels.get(label.trim_matches('|')) {
                        conflicts.push(constraint.conflict_line());
                    }
                }
                Err(SolveError::Unsat(conflicts))
            }
            SatResult::Unknown => Err(SolveError::Backend(
                solver
                    .get_reason_unknown()
                    .unwrap_or_else(|| "unknown".to_string()),
            )),
        }
    }
}

fn encode<'ctx>(
    term: &TypeTerm,
    pow: &FuncDecl<'ctx>,
    product: &FuncDecl<'ctx>,
    named: &HashMap<&str, &FuncDecl<'ctx>>,
    consts: &HashMap<u32, Datatype<'ctx>>,
) -> Result<Dynamic<'ctx>, SolveError> {
    match term {
        TypeTerm::Var(v) => Ok(Dynamic::from_ast(&consts[&v.id()])),
        TypeTerm::Named(name) => named
            .get(name.as_str())
            .map(|decl| decl.apply(&[]))
            .ok_or_else(|| SolveError::UndeclaredType(name.clone())),
        TypeTerm::Pow(inner) => {
            let inner = encode(inner, pow, product, named, consts)?;
            Ok(pow.apply(&[&inner]))
        }
        TypeTerm::Product(a, b) => {
            let a = encode(a, pow, product, named, consts)?;
            let b = encode(b, pow, product, named, consts)?;
            Ok(product.apply(&[&a, &b]))
        }
    }
}

/// Expand the `let`-sharing Z3 uses when printing large values, repeatedly,
/// until the text is a plain constructor term.
pub(crate) fn inline_lets(mut text: String) -> String {
    while let Some(start) = text.find("(let ") {
        let end = matching_paren(text.as_bytes(), start);
        let reduced = reduce_let(&text[start..=end]);
        text.replace_range(start..=end, &reduced);
    }
    text
}

fn matching_paren(bytes: &[u8], open: usize) -> usize {
    let mut depth = 0usize;
    for (i, b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
    }
    bytes.len() - 1
}

/// Reduce one `(let ((n1 e1) ...) body)` form to its substituted body.
fn reduce_let(expr: &str) -> String {
    let bytes = expr.as_bytes();
    let mut i = "(let".len();
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    let bindings_end = matching_paren(bytes, i);
    let mut bindings = Vec::new();
    let mut j = i + 1;
    while j < bindings_end {
        while j < bindings_end && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j >= bindings_end {
            break;
        }
        let pair_end = matching_paren(bytes, j);
        let pair = &expr[j + 1..pair_end];
        let mut split = pair.splitn(2, char::is_whitespace);
        if let (Some(name), Some(value)) = (split.next(), split.next()) {
            bindings.push((name.to_string(), value.trim().to_string()));
        }
        j = pair_end + 1;
    }
    let body = expr[bindings_end + 1..expr.len() - 1].trim();
    let mut out = body.to_string();
    for (name, value) in &bindings {
        out = substitute_symbol(&out, name, value);
    }
    out
}

/// Replace whole-token occurrences of `name` by `value`. A token boundary is
/// the start/end of the text, a parenthesis, a space, or a newline.
fn substitute_symbol(text: &str, name: &str, value: &str) -> String {
    let bytes = text.as_bytes();
    let nbytes = name.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < bytes.len() {
        let before_ok = i == 0 || matches!(bytes[i - 1], b'(' | b' ' | b'\n');
        if before_ok && bytes[i..].starts_with(nbytes) {
            let after = i + nbytes.len();
            let after_ok =
                after == bytes.len() || matches!(bytes[after], b')' | b' ' | b'\n');
            if after_ok {
                out.push_str(value);
                i = after;
                continue;
            }
        }
        out.push(bytes[i] as char);
        i += 1;
    }
    out
}
