//! JSON tree documents.
//!
//! ```json
//! {
//!   "question": "Who founded Apple?",
//!   "root": {
//!     "tag": "ROOT",
//!     "children": [
//!       { "tag": "WP", "label": "Who", "annotations": ["http://dbpedia.org/ontology/Person"] }
//!     ]
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::tree::{NodeSpec, QuestionTree};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TreeDocument {
    #[serde(default)]
    pub question: String,
    pub root: NodeSpec,
}

impl TreeDocument {
    pub fn into_tree(self) -> QuestionTree {
        QuestionTree::from_spec(&self.question, &self.root)
    }
}

impl From<&QuestionTree> for TreeDocument {
    fn from(tree: &QuestionTree) -> Self {
        Self {
            question: tree.question().to_string(),
            root: tree.to_spec(),
        }
    }
}

pub fn parse_json_document(text: &str) -> Result<QuestionTree, serde_json::Error> {
    let doc: TreeDocument = serde_json::from_str(text)?;
    Ok(doc.into_tree())
}
