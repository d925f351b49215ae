//! Bracketed tree text.
//!
//! A compact, human-editable notation for annotated trees:
//!
//! ```text
//! # question: Which rivers flow through Berlin?
//! (ROOT
//!   (CombinedNN rivers [<http://dbpedia.org/resource/Spree> <http://dbpedia.org/resource/Havel>]
//!     (VBP flow [http://dbpedia.org/ontology/city])))
//! ```
//!
//! - every node is `(TAG label? [annotations]? child*)`;
//! - a label is one or more bare words, or a double-quoted string;
//! - annotations are IRIs, with or without angle brackets;
//! - lines starting with `#` are comments; `# question: ...` sets the question.

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char as pchar, multispace0, multispace1},
    combinator::{all_consuming, map, opt},
    error::{Error as NomError, ErrorKind},
    multi::{many0, separated_list1},
    sequence::{delimited, preceded, terminated},
    IResult,
};
use thiserror::Error;

use crate::tree::{NodeSpec, QuestionTree};

const QUESTION_DIRECTIVE: &str = "# question:";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("bracketed tree parse error at byte {offset}: {message}")]
pub struct TreeParseError {
    pub offset: usize,
    pub message: String,
}

fn is_atom_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | '[' | ']' | '"')
}

fn atom(input: &str) -> IResult<&str, &str> {
    take_while1(is_atom_char)(input)
}

fn quoted(input: &str) -> IResult<&str, String> {
    let (mut rest, _) = pchar('"')(input)?;
    let mut out = String::new();
    loop {
        let mut chars = rest.chars();
        match chars.next() {
            None => return Err(nom::Err::Error(NomError::new(rest, ErrorKind::Char))),
            Some('"') => return Ok((chars.as_str(), out)),
            Some('\\') => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(c) => out.push(c),
                None => return Err(nom::Err::Error(NomError::new(rest, ErrorKind::Escaped))),
            },
            Some(c) => out.push(c),
        }
        rest = chars.as_str();
    }
}

fn label(input: &str) -> IResult<&str, String> {
    alt((
        quoted,
        map(separated_list1(multispace1, atom), |words| words.join(" ")),
    ))(input)
}

fn iri(input: &str) -> IResult<&str, String> {
    alt((
        map(
            delimited(pchar('<'), take_while1(|c: char| c != '>'), pchar('>')),
            str::to_string,
        ),
        map(
            take_while1(|c: char| !c.is_whitespace() && c != ']'),
            str::to_string,
        ),
    ))(input)
}

fn annotations(input: &str) -> IResult<&str, Vec<String>> {
    delimited(
        pchar('['),
        terminated(many0(preceded(multispace0, iri)), multispace0),
        pchar(']'),
    )(input)
}

fn node(input: &str) -> IResult<&str, NodeSpec> {
    let (input, _) = pchar('(')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, tag) = atom(input)?;
    let (input, label) = opt(preceded(multispace1, label))(input)?;
    let (input, annotations) = opt(preceded(multispace0, annotations))(input)?;
    let (input, children) = many0(preceded(multispace0, node))(input)?;
    let (input, _) = preceded(multispace0, pchar(')'))(input)?;

    Ok((
        input,
        NodeSpec {
            tag: tag.to_string(),
            label: label.unwrap_or_default(),
            annotations: annotations.unwrap_or_default(),
            children,
        },
    ))
}

/// Parse a single bracketed tree (no comment lines).
pub fn parse_bracketed_tree(question: &str, text: &str) -> Result<QuestionTree, TreeParseError> {
    match all_consuming(delimited(multispace0, node, multispace0))(text) {
        Ok((_, spec)) => Ok(QuestionTree::from_spec(question, &spec)),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let offset = text.len() - e.input.len();
            let near: String = e.input.chars().take(24).collect();
            Err(TreeParseError {
                offset,
                message: if near.is_empty() {
                    "unexpected end of input".to_string()
                } else {
                    format!("unexpected input near `{near}`")
                },
            })
        }
        Err(nom::Err::Incomplete(_)) => Err(TreeParseError {
            offset: text.len(),
            message: "incomplete input".to_string(),
        }),
    }
}

/// Parse a bracketed document: comment lines plus one tree.
///
/// Byte offsets in errors refer to the tree text with comment lines blanked
/// out, so they line up with the original document.
pub fn parse_bracketed_document(text: &str) -> Result<QuestionTree, TreeParseError> {
    let mut question = String::new();
    let mut body = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix(QUESTION_DIRECTIVE) {
            question = rest.trim().to_string();
        }
        if trimmed.starts_with('#') {
            body.extend(line.chars().map(|c| if c == '\n' { '\n' } else { ' ' }));
        } else {
            body.push_str(line);
        }
    }
    parse_bracketed_tree(&question, &body)
}

fn needs_quotes(label: &str) -> bool {
    label.is_empty() || !label.chars().all(is_atom_char)
}

fn quote(label: &str) -> String {
    let mut out = String::with_capacity(label.len() + 2);
    out.push('"');
    for c in label.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn render_node(spec: &NodeSpec, indent: usize, out: &mut String) {
    out.push_str(&"  ".repeat(indent));
    out.push('(');
    out.push_str(&spec.tag);
    if !spec.label.is_empty() {
        out.push(' ');
        if needs_quotes(&spec.label) {
            out.push_str(&quote(&spec.label));
        } else {
            out.push_str(&spec.label);
        }
    }
    if !spec.annotations.is_empty() {
        let uris = spec
            .annotations
            .iter()
            .map(|uri| format!("<{uri}>"))
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&format!(" [{uris}]"));
    }
    for child in &spec.children {
        out.push('\n');
        render_node(child, indent + 1, out);
    }
    out.push(')');
}

impl QuestionTree {
    /// Render as a bracketed document that [`parse_bracketed_document`] accepts.
    pub fn render_bracketed(&self) -> String {
        let mut out = String::new();
        if !self.question().is_empty() {
            out.push_str(QUESTION_DIRECTIVE);
            out.push(' ');
            out.push_str(self.question());
            out.push('\n');
        }
        render_node(&self.to_spec(), 0, &mut out);
        out.push('\n');
        out
    }
}
