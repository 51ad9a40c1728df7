use std::collections::{HashMap, HashSet};

use crate::arena::NodeId;

/// A lexical scope: identifier bindings plus the names known to denote
/// carrier sets.
///
/// `child` is a plain clone; bindings made in the child never leak back to
/// the parent, which is exactly the shadowing B's quantifiers, LET, ANY and
/// operation headers need.
#[derive(Debug, Clone, Default)]
pub struct Context {
    identifiers: HashMap<String, NodeId>,
    sets: HashSet<String>,
}

/// Outcome of looking a name up, innermost tier first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Bound in the current scope.
    Local(NodeId),
    /// Not bound locally, but names a known carrier set.
    GlobalSet,
    /// Unknown; the caller introduces a fresh binding.
    Fresh,
}

impl Context {
    pub fn new() -> Self {
        Context::default()
    }

    /// A scope that already knows B's built-in carrier sets.
    pub fn with_default_sets() -> Self {
        let mut ctx = Context::new();
        for name in [
            "INTEGER", "INT", "NAT", "NAT1", "NATURAL", "NATURAL1", "BOOL", "FLOAT", "REAL",
            "STRING",
        ] {
            ctx.add_set(name);
        }
        ctx
    }

    pub fn bind(&mut self, name: &str, node: NodeId) {
        self.identifiers.insert(name.to_string(), node);
    }

    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.identifiers.get(name).copied()
    }

    pub fn add_set(&mut self, name: &str) {
        self.sets.insert(name.to_string());
    }

    pub fn contains_set(&self, name: &str) -> bool {
        self.sets.contains(name)
    }

    pub fn child(&self) -> Context {
        self.clone()
    }

    /// Union the other scope's bindings and set names into this one.
    pub fn merge(&mut self, other: &Context) {
        for (name, node) in &other.identifiers {
            self.identifiers.insert(name.clone(), *node);
        }
        for name in &other.sets {
            self.sets.insert(name.clone());
        }
    }

    /// Drop every identifier the reference scope also binds. Used to strip
    /// a shared prelude out of a per-definition scope.
    pub fn subtract(&mut self, reference: &Context) {
        self.identifiers
            .retain(|name, _| reference.get(name).is_none());
    }

    pub fn identifiers(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.identifiers.iter().map(|(n, id)| (n.as_str(), *id))
    }
}
