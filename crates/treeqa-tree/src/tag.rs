//! Part-of-speech tag vocabulary.
//!
//! Tags arrive as raw strings from the annotation pipeline. Besides the Penn
//! Treebank tags (`WRB`, `WP`, `NN*`, `VB*`, ...) the pipeline emits two
//! synthetic tags:
//!
//! - `CombinedNN`: several adjacent nouns fused into one group.
//! - `ADD`: a residual token that could not be resolved to a URI and is kept
//!   as a literal.
//!
//! Prefix tags (`NN*`, `VB*`) match the whole tag, so `NNS`/`NNP` are nouns
//! and `VBD`/`VBZ` are verbs, while `CombinedNN` is neither.

use serde::{Deserialize, Serialize};

pub const TAG_ROOT: &str = "ROOT";
pub const TAG_WRB: &str = "WRB";
pub const TAG_WP: &str = "WP";
pub const TAG_COMBINED_NN: &str = "CombinedNN";
pub const TAG_ADD: &str = "ADD";

const NOUN_PREFIX: &str = "NN";
const VERB_PREFIX: &str = "VB";

/// Coarse class of a tag, as far as query synthesis cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagClass {
    /// `WRB` / `WP`
    QuestionWord,
    /// `NN*`
    Noun,
    /// `VB*`
    Verb,
    /// `CombinedNN`
    CombinedNoun,
    /// `ADD`
    Residual,
    Other,
}

impl TagClass {
    pub fn of(tag: &str) -> Self {
        if tag == TAG_WRB || tag == TAG_WP {
            TagClass::QuestionWord
        } else if tag == TAG_COMBINED_NN {
            TagClass::CombinedNoun
        } else if tag == TAG_ADD {
            TagClass::Residual
        } else if tag.starts_with(NOUN_PREFIX) {
            TagClass::Noun
        } else if tag.starts_with(VERB_PREFIX) {
            TagClass::Verb
        } else {
            TagClass::Other
        }
    }
}

/// `WRB`, `WP` or any `NN*` tag.
pub fn is_question_word_or_noun(tag: &str) -> bool {
    matches!(TagClass::of(tag), TagClass::QuestionWord | TagClass::Noun)
}

/// Any `VB*` or `NN*` tag.
pub fn is_verb_or_noun(tag: &str) -> bool {
    matches!(TagClass::of(tag), TagClass::Verb | TagClass::Noun)
}

pub fn is_combined_noun(tag: &str) -> bool {
    tag == TAG_COMBINED_NN
}

pub fn is_residual(tag: &str) -> bool {
    tag == TAG_ADD
}
