/// Arena of typed expression nodes.
///
/// Every expression the generator observes gets a node: one type variable,
/// the canonical source rendering, and the set of positions at which the
/// expression occurred. Nodes are owned by the arena and referenced by
/// `NodeId` handles, so contexts and memo caches can share nodes freely
/// without reference counting.
use std::collections::BTreeSet;

use crate::position::Position;
use crate::term::TypeVar;

/// Handle to an `ExprNode` inside an `ExprArena`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

#[derive(Debug, Clone)]
pub struct ExprNode {
    render: String,
    var: TypeVar,
    positions: BTreeSet<Position>,
}

impl ExprNode {
    pub fn render(&self) -> &str {
        &self.render
    }

    pub fn var(&self) -> TypeVar {
        self.var
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter()
    }
}

#[derive(Debug, Default)]
pub struct ExprArena {
    nodes: Vec<ExprNode>,
}

impl ExprArena {
    pub fn new() -> Self {
        ExprArena::default()
    }

    pub fn alloc(&mut self, render: String, var: TypeVar) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(ExprNode {
            render,
            var,
            positions: BTreeSet::new(),
        });
        id
    }

    pub fn add_position(&mut self, id: NodeId, pos: Position) {
        self.nodes[id.0 as usize].positions.insert(pos);
    }

    pub fn get(&self, id: NodeId) -> &ExprNode {
        &self.nodes[id.0 as usize]
    }

    pub fn var(&self, id: NodeId) -> TypeVar {
        self.nodes[id.0 as usize].var
    }

    pub fn render(&self, id: NodeId) -> &str {
        &self.nodes[id.0 as usize].render
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ExprNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
