//! Node arena for annotated question trees.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use thiserror::Error;

/// Index of a node inside its `QuestionTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseNode {
    pub id: NodeId,
    /// Part-of-speech tag (see [`crate::tag`]).
    pub tag: String,
    pub label: String,
    pub children: Vec<NodeId>,
    /// `None` only for the root.
    pub parent: Option<NodeId>,
    /// Candidate reference URIs from entity linking, in pipeline order,
    /// without duplicates.
    pub annotations: Vec<String>,
}

impl ParseNode {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn has_annotations(&self) -> bool {
        !self.annotations.is_empty()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
}

/// Owned, nested description of a node and its subtree.
///
/// This is the shape shared by the textual input formats; it is converted
/// into the arena with [`QuestionTree::from_spec`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSpec {
    pub tag: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub annotations: Vec<String>,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(tag: &str, label: &str) -> Self {
        Self {
            tag: tag.to_string(),
            label: label.to_string(),
            annotations: vec![],
            children: vec![],
        }
    }

    pub fn with_annotations<I, S>(mut self, annotations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.annotations
            .extend(annotations.into_iter().map(Into::into));
        self
    }

    pub fn with_child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }
}

/// A parse tree plus the question text it was parsed from.
///
/// The root is always `NodeId(0)`. The question text is carried only for
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionTree {
    question: String,
    nodes: Vec<ParseNode>,
}

impl QuestionTree {
    pub fn new(question: &str, root_tag: &str, root_label: &str) -> Self {
        Self {
            question: question.to_string(),
            nodes: vec![ParseNode {
                id: NodeId(0),
                tag: root_tag.to_string(),
                label: root_label.to_string(),
                children: vec![],
                parent: None,
                annotations: vec![],
            }],
        }
    }

    /// Build an arena from a nested node description.
    pub fn from_spec(question: &str, root: &NodeSpec) -> Self {
        let mut tree = Self::new(question, &root.tag, &root.label);
        let root_id = tree.root();
        for uri in &root.annotations {
            tree.push_annotation(root_id, uri);
        }

        // Depth-first, children in declaration order.
        let mut stack: Vec<(NodeId, &NodeSpec)> = root
            .children
            .iter()
            .rev()
            .map(|child| (root_id, child))
            .collect();
        while let Some((parent, spec)) = stack.pop() {
            let id = tree.push_node(parent, &spec.tag, &spec.label);
            for uri in &spec.annotations {
                tree.push_annotation(id, uri);
            }
            stack.extend(spec.children.iter().rev().map(|child| (id, child)));
        }
        tree
    }

    /// Inverse of [`QuestionTree::from_spec`].
    pub fn to_spec(&self) -> NodeSpec {
        self.spec_of(self.root())
    }

    fn spec_of(&self, id: NodeId) -> NodeSpec {
        let node = &self[id];
        NodeSpec {
            tag: node.tag.clone(),
            label: node.label.clone(),
            annotations: node.annotations.clone(),
            children: node.children.iter().map(|c| self.spec_of(*c)).collect(),
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root_node(&self) -> &ParseNode {
        &self.nodes[0]
    }

    pub fn node(&self, id: NodeId) -> Option<&ParseNode> {
        self.nodes.get(id.0)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ParseNode> {
        self.nodes.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// Number of edges between `id` and the root.
    pub fn depth(&self, id: NodeId) -> Option<usize> {
        let mut current = self.node(id)?;
        let mut depth = 0;
        while let Some(parent) = current.parent {
            current = &self.nodes[parent.0];
            depth += 1;
        }
        Some(depth)
    }

    pub fn add_child(&mut self, parent: NodeId, tag: &str, label: &str) -> Result<NodeId, TreeError> {
        self.check(parent)?;
        Ok(self.push_node(parent, tag, label))
    }

    /// Attach a candidate URI to `node`. Returns `false` if it was already present.
    pub fn annotate(&mut self, node: NodeId, uri: &str) -> Result<bool, TreeError> {
        self.check(node)?;
        Ok(self.push_annotation(node, uri))
    }

    fn check(&self, id: NodeId) -> Result<(), TreeError> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(TreeError::UnknownNode(id))
        }
    }

    fn push_node(&mut self, parent: NodeId, tag: &str, label: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ParseNode {
            id,
            tag: tag.to_string(),
            label: label.to_string(),
            children: vec![],
            parent: Some(parent),
            annotations: vec![],
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    fn push_annotation(&mut self, node: NodeId, uri: &str) -> bool {
        let annotations = &mut self.nodes[node.0].annotations;
        if annotations.iter().any(|a| a == uri) {
            return false;
        }
        annotations.push(uri.to_string());
        true
    }
}

impl Index<NodeId> for QuestionTree {
    type Output = ParseNode;

    fn index(&self, id: NodeId) -> &ParseNode {
        &self.nodes[id.0]
    }
}
