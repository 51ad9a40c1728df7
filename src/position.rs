/// Source positions attached to expression nodes.
///
/// Positions come from the external file walker (a bxml `Pos` element or
/// equivalent) and are carried through inference untouched: the solver never
/// looks at them, but the output writer needs every position at which an
/// identifier occurred, so nodes accumulate them in a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    /// Length of the source span, when the walker knows it.
    pub span: Option<u32>,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Position {
            line,
            column,
            span: None,
        }
    }

    pub fn with_span(line: u32, column: u32, span: u32) -> Self {
        Position {
            line,
            column,
            span: Some(span),
        }
    }
}
