use std::collections::HashMap;

use thiserror::Error;

/// A failure while solving a model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    /// The constraints have no solution. Carries one line per assertion in
    /// the unsat core, in `lhs = rhs` form.
    #[error("model is unsatisfiable; conflicting constraints:\n{}", render_conflicts(.0))]
    Unsat(Vec<String>),
    /// A constraint mentions a named type the model never declared.
    #[error("named type `{0}` is used in a constraint but never declared")]
    UndeclaredType(String),
    /// The backend gave up or behaved unexpectedly.
    #[error("solver backend failure: {0}")]
    Backend(String),
}

impl SolveError {
    /// Rewrite solver variable names in unsat conflict lines to readable
    /// tags (`var_3` to `t(x +i 1)`). A name is only replaced as a whole
    /// token, so it must be followed by `)`, a space, or a newline; each
    /// line is newline-terminated during the pass so line-final names are
    /// covered too.
    pub fn replace_terms(&mut self, map: &HashMap<String, String>) {
        let SolveError::Unsat(lines) = self else {
            return;
        };
        for line in lines.iter_mut() {
            let mut text = format!("{}\n", line);
            for (name, tag) in map {
                for follow in [")", " ", "\n"] {
                    text = text.replace(
                        &format!("{}{}", name, follow),
                        &format!("{}{}", tag, follow),
                    );
                }
            }
            text.pop();
            *line = text;
        }
    }
}

fn render_conflicts(lines: &[String]) -> String {
    lines
        .iter()
        .map(|l| format!("  {}", l))
        .collect::<Vec<_>>()
        .join("\n")
}
