//! Bottom-up traversal path.
//!
//! Synthesis only looks at the chain that starts at the root's first child and
//! keeps descending into first children. The chain is assumed to be a path;
//! when a node has several children only the first is followed.

use crate::tree::{NodeId, ParseNode, QuestionTree};

#[derive(Debug, Clone)]
pub struct ParseTreePath<'t> {
    tree: &'t QuestionTree,
    /// Deepest node first; the root is never included.
    nodes: Vec<NodeId>,
}

impl<'t> ParseTreePath<'t> {
    /// Extract the path of `tree`. Empty when the root has no children.
    pub fn extract(tree: &'t QuestionTree) -> Self {
        let mut nodes = Vec::new();
        let mut current = tree.first_child(tree.root());
        while let Some(id) = current {
            let children = tree.children(id);
            if children.len() > 1 {
                tracing::debug!(
                    node = %id,
                    tag = %tree[id].tag,
                    ignored = children.len() - 1,
                    "parse tree branches; following first child only"
                );
            }
            nodes.push(id);
            current = children.first().copied();
        }
        nodes.reverse();
        Self { tree, nodes }
    }

    pub fn tree(&self) -> &'t QuestionTree {
        self.tree
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&'t ParseNode> {
        let tree = self.tree;
        self.nodes.get(position).map(|id| &tree[*id])
    }

    pub fn iter(&self) -> impl Iterator<Item = &'t ParseNode> + '_ {
        let tree = self.tree;
        self.nodes.iter().map(move |id| &tree[*id])
    }
}
