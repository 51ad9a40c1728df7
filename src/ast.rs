/// Untyped B abstract syntax, as handed over by the external file walker.
///
/// The walker resolves the XML tags and operator attributes of a bxml/pog
/// tree into this closed union before calling the constraint generator, so
/// every construct the generator can see is a compile-time-checked variant:
/// adding a B operator means adding a variant here and an arm in the
/// generator, and the compiler points at every place that must change.
///
/// `from_symbol`/`symbol` translate between the wire spelling of an operator
/// (`"+i"`, `"<->"`, ...) and its variant; an unrecognized spelling is the
/// walker-facing `UnknownConstruct` error.
use thiserror::Error;

use crate::position::Position;

/// An operator or construct spelling with no matching variant. This is a
/// programmer-facing condition (an unsupported B construct), fatal for the
/// current parse unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{0}` is not a recognized B construct")]
pub struct UnknownConstruct(pub String);

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

macro_rules! symbol_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $sym:literal,)* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)*
        }

        impl $name {
            pub fn symbol(&self) -> &'static str {
                match self {
                    $($name::$variant => $sym,)*
                }
            }

            pub fn from_symbol(symbol: &str) -> Result<Self, UnknownConstruct> {
                match symbol {
                    $($sym => Ok($name::$variant),)*
                    _ => Err(UnknownConstruct(symbol.to_string())),
                }
            }
        }
    };
}

symbol_enum! {
    /// Binary expression operators.
    BinOp {
        CartesianProduct => "*s",
        Concat => "^",
        Prepend => "->",
        Append => "<-",
        RestrictFront => "/|\\",
        RestrictTail => "\\|/",
        Interval => "..",
        SetMinus => "-s",
        Intersection => "/\\",
        Union => "\\/",
        IntMul => "*i",
        IntPow => "**i",
        IntAdd => "+i",
        IntSub => "-i",
        IntDiv => "/i",
        IntMod => "mod",
        RealMul => "*r",
        RealPow => "**r",
        RealAdd => "+r",
        RealSub => "-r",
        RealDiv => "/r",
        FloatMul => "*f",
        FloatAdd => "+f",
        FloatSub => "-f",
        FloatDiv => "/f",
        Maplet => "|->",
        Pair => ",",
        Relations => "<->",
        Prj1 => "prj1",
        Prj2 => "prj2",
        Compose => ";",
        DirectProduct => "><",
        Parallel => "||",
        Iterate => "iterate",
        Image => "[",
        DomRestrict => "<|",
        DomSubtract => "<<|",
        RanRestrict => "|>",
        RanSubtract => "|>>",
        Override => "<+",
        TotalFn => "-->",
        PartialFn => "+->",
        PartialInj => ">+>",
        TotalInj => ">->",
        PartialSurj => "+->>",
        TotalSurj => "-->>",
        TotalBij => ">->>",
        Apply => "(",
    }
}

symbol_enum! {
    /// Unary expression operators.
    UnOp {
        UMinus => "-i",
        Succ => "succ",
        Pred => "pred",
        Real => "real",
        Floor => "floor",
        Ceiling => "ceiling",
        IMax => "imax",
        IMin => "imin",
        RMax => "rmax",
        RMin => "rmin",
        Card => "card",
        Pow => "POW",
        Pow1 => "POW1",
        Fin => "FIN",
        Fin1 => "FIN1",
        Seq => "seq",
        Seq1 => "seq1",
        ISeq => "iseq",
        ISeq1 => "iseq1",
        Perm => "perm",
        Size => "size",
        First => "first",
        Last => "last",
        Front => "front",
        Tail => "tail",
        Rev => "rev",
        Conc => "conc",
        GenUnion => "union",
        GenInter => "inter",
        Id => "id",
        Inverse => "~",
        Closure => "closure",
        Closure1 => "closure1",
        Dom => "dom",
        Ran => "ran",
        Fnc => "fnc",
        Rel => "rel",
    }
}

symbol_enum! {
    /// Comparison operators between two expressions.
    CmpOp {
        In => ":",
        NotIn => "/:",
        Eq => "=",
        NotEq => "/=",
        IntLe => "<=i",
        IntLt => "<i",
        IntGe => ">=i",
        IntGt => ">i",
        RealLe => "<=r",
        RealLt => "<r",
        RealGe => ">=r",
        RealGt => ">r",
        Subset => "<:",
        StrictSubset => "<<:",
        NotSubset => "/<:",
        NotStrictSubset => "/<<:",
    }
}

symbol_enum! {
    /// Quantified-expression binders.
    Binder {
        IntSum => "iSIGMA",
        IntProd => "iPI",
        RealSum => "rSIGMA",
        RealProd => "rPI",
        Union => "UNION",
        Inter => "INTER",
        Lambda => "%",
    }
}

symbol_enum! {
    /// Quantified-predicate kinds.
    QuantKind {
        Forall => "!",
        Exists => "#",
    }
}

symbol_enum! {
    /// Binary predicate connectives.
    BinPredOp {
        Implies => "=>",
        Equiv => "<=>",
    }
}

symbol_enum! {
    /// N-ary predicate connectives.
    NaryPredOp {
        And => "&",
        Or => "or",
    }
}

/// Extension brackets for n-ary expressions: a set `{a, b}` or a sequence
/// `[a, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NaryKind {
    SetExtension,
    SeqExtension,
}

/// The flavour of the machine a parse unit comes from. Implementation
/// machines valuate their abstract sets as integer sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineKind {
    Abstraction,
    Implementation,
}

// ---------------------------------------------------------------------------
// Syntax
// ---------------------------------------------------------------------------

/// An identifier bound by a quantifier, LET, ANY, VAR ... IN or an operation
/// header. Always fresh in the construct's child scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundVar {
    pub name: String,
    pub pos: Option<Position>,
}

impl BoundVar {
    pub fn new(name: impl Into<String>) -> Self {
        BoundVar {
            name: name.into(),
            pos: None,
        }
    }

    pub fn at(name: impl Into<String>, pos: Position) -> Self {
        BoundVar {
            name: name.into(),
            pos: Some(pos),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub pos: Option<Position>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Ident(String),
    BoolLit(String),
    IntLit(String),
    RealLit(String),
    StringLit(String),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnOp,
        arg: Box<Expr>,
    },
    /// `bool(P)` — a predicate reified as a BOOL expression.
    Boolean(Box<Pred>),
    /// Set or sequence extension with explicit elements.
    Nary {
        kind: NaryKind,
        items: Vec<Expr>,
    },
    EmptySet,
    EmptySeq,
    /// Set comprehension `{x, y | P}`.
    Comprehension {
        vars: Vec<BoundVar>,
        pred: Box<Pred>,
    },
    /// `iSIGMA/iPI/rSIGMA/rPI/UNION/INTER/%` with bound variables, a guard
    /// predicate and a body expression.
    Quantified {
        binder: Binder,
        vars: Vec<BoundVar>,
        pred: Box<Pred>,
        body: Box<Expr>,
    },
    /// B0 valuation `ident = value` inside a VALUES or LET clause; `ident`
    /// must already be bound in the current scope.
    Valuation {
        ident: String,
        value: Box<Expr>,
    },
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Expr { kind, pos: None }
    }

    pub fn at(kind: ExprKind, pos: Position) -> Self {
        Expr {
            kind,
            pos: Some(pos),
        }
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Expr::new(ExprKind::Ident(name.into()))
    }

    pub fn int_lit(value: impl Into<String>) -> Self {
        Expr::new(ExprKind::IntLit(value.into()))
    }

    pub fn bool_lit(value: impl Into<String>) -> Self {
        Expr::new(ExprKind::BoolLit(value.into()))
    }

    pub fn real_lit(value: impl Into<String>) -> Self {
        Expr::new(ExprKind::RealLit(value.into()))
    }

    pub fn string_lit(value: impl Into<String>) -> Self {
        Expr::new(ExprKind::StringLit(value.into()))
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::new(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn unary(op: UnOp, arg: Expr) -> Self {
        Expr::new(ExprKind::Unary {
            op,
            arg: Box::new(arg),
        })
    }

    /// Canonical source rendering, used to intern identifiers and to tag
    /// diagnostics (`t(<source text>)`).
    pub fn render(&self) -> String {
        match &self.kind {
            ExprKind::Ident(name) => name.clone(),
            ExprKind::BoolLit(v)
            | ExprKind::IntLit(v)
            | ExprKind::RealLit(v)
            | ExprKind::StringLit(v) => v.clone(),
            ExprKind::Binary { op, left, right } => match op {
                BinOp::Apply => format!("{}({})", left.render(), right.render()),
                _ => format!("({}) {} ({})", left.render(), op.symbol(), right.render()),
            },
            ExprKind::Unary { op, arg } => match op {
                UnOp::Inverse => format!("({})~", arg.render()),
                _ => format!("{}({})", op.symbol(), arg.render()),
            },
            ExprKind::Boolean(pred) => format!("bool({})", pred.render()),
            ExprKind::Nary { kind, items } => {
                let inner = items
                    .iter()
                    .map(Expr::render)
                    .collect::<Vec<_>>()
                    .join(", ");
                match kind {
                    NaryKind::SetExtension => format!("{{{}}}", inner),
                    NaryKind::SeqExtension => format!("[{}]", inner),
                }
            }
            ExprKind::EmptySet => "{}".to_string(),
            ExprKind::EmptySeq => "[]".to_string(),
            ExprKind::Comprehension { vars, pred } => {
                format!("{{{} | {}}}", join_names(vars), pred.render())
            }
            ExprKind::Quantified {
                binder,
                vars,
                pred,
                body,
            } => format!(
                "{} ({}).({} | {})",
                binder.symbol(),
                join_names(vars),
                pred.render(),
                body.render()
            ),
            ExprKind::Valuation { ident, value } => {
                format!("{} = {}", ident, value.render())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pred {
    Not(Box<Pred>),
    Nary {
        op: NaryPredOp,
        clauses: Vec<Pred>,
    },
    Binary {
        op: BinPredOp,
        left: Box<Pred>,
        right: Box<Pred>,
    },
    Comparison {
        op: CmpOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Quantified {
        kind: QuantKind,
        vars: Vec<BoundVar>,
        body: Box<Pred>,
    },
}

impl Pred {
    pub fn comparison(op: CmpOp, left: Expr, right: Expr) -> Self {
        Pred::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn render(&self) -> String {
        match self {
            Pred::Not(inner) => format!("not({})", inner.render()),
            Pred::Nary { op, clauses } => clauses
                .iter()
                .map(|c| format!("({})", c.render()))
                .collect::<Vec<_>>()
                .join(&format!(" {} ", op.symbol())),
            Pred::Binary { op, left, right } => {
                format!("({}) {} ({})", left.render(), op.symbol(), right.render())
            }
            Pred::Comparison { op, left, right } => {
                format!("({}) {} ({})", left.render(), op.symbol(), right.render())
            }
            Pred::Quantified { kind, vars, body } => {
                format!("{}({}).({})", kind.symbol(), join_names(vars), body.render())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    Skip,
    Block(Box<Instr>),
    /// Sequencing / choice of substitutions.
    Nary(Vec<Instr>),
    Assert {
        guard: Pred,
        body: Box<Instr>,
    },
    If {
        cond: Pred,
        then: Box<Instr>,
        alt: Option<Box<Instr>>,
    },
    Select {
        branches: Vec<(Pred, Instr)>,
        alt: Option<Box<Instr>>,
    },
    Case {
        value: Expr,
        branches: Vec<(Expr, Instr)>,
        alt: Option<Box<Instr>>,
    },
    Any {
        vars: Vec<BoundVar>,
        pred: Pred,
        body: Box<Instr>,
    },
    Let {
        vars: Vec<BoundVar>,
        /// `Valuation` expressions giving the bound variables their values.
        values: Vec<Expr>,
        body: Box<Instr>,
    },
    /// `x :: S` — becomes-member-of.
    BecomesIn {
        vars: Vec<Expr>,
        set: Expr,
    },
    /// `x : (P)` — becomes-such-that.
    BecomesSuchThat {
        vars: Vec<Expr>,
        pred: Pred,
    },
    VarIn {
        vars: Vec<BoundVar>,
        body: Box<Instr>,
    },
    /// Simultaneous assignment `x1, ..., xn := e1, ..., en`.
    Assign {
        vars: Vec<Expr>,
        values: Vec<Expr>,
    },
    Call {
        name: String,
        pos: Option<Position>,
        inputs: Vec<Expr>,
        outputs: Vec<Expr>,
    },
    While {
        cond: Pred,
        body: Box<Instr>,
        invariant: Pred,
        variant: Expr,
    },
}

fn join_names(vars: &[BoundVar]) -> String {
    vars.iter()
        .map(|v| v.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
