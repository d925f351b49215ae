//! Splitting of oversized `FILTER(?proj IN (...))` clauses.
//!
//! Public endpoints reject (or time out on) queries with very long IN-lists,
//! so a candidate whose list exceeds the batch size is executed as several
//! queries, each carrying a contiguous slice of the original list. The
//! slices, concatenated in emission order, are exactly the original list.
//!
//! The clause is located with a regex and the value list is tokenized with
//! `nom`, so separators inside IRIs or string literals (`<http://x/a,b>`)
//! never split a value. Anything that does not have the expected
//! `IN ( v, v, ... ))` shape is reported as [`FilterBatchError`].

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char as pchar, multispace0},
    combinator::{opt, recognize},
    error::{Error as NomError, ErrorKind},
    multi::separated_list0,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;
use thiserror::Error;

use crate::PROJECTION_VAR;

pub const DEFAULT_FILTER_BATCH_SIZE: usize = 50;

const FILTER_KEYWORD: &str = "FILTER";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterBatchError {
    #[error("no `FILTER(?proj IN (...))` clause found")]
    MissingFilter,
    #[error("found {0} `FILTER(?proj IN (...))` clauses; at most one is supported")]
    MultipleFilters(usize),
    #[error("malformed IN-list at byte {offset}: {message}")]
    MalformedFilter { offset: usize, message: String },
    #[error("filter batch size must be at least 1")]
    ZeroBatchSize,
}

/// Cheap keyword check used to decide whether a query needs batching at all.
pub fn has_in_filter(query: &str) -> bool {
    query.contains(FILTER_KEYWORD)
}

fn filter_open_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(
            r"FILTER\s*\(\s*\?{}\s+IN\s*\(",
            regex::escape(PROJECTION_VAR)
        );
        Regex::new(&pattern).expect("IN-filter pattern is a valid regex")
    })
}

// ============================================================================
// Value tokens
// ============================================================================

fn iri_ref(input: &str) -> IResult<&str, &str> {
    recognize(delimited(
        pchar('<'),
        take_while(|c: char| c != '>' && c != '<' && !c.is_whitespace()),
        pchar('>'),
    ))(input)
}

fn quoted_string(input: &str) -> IResult<&str, &str> {
    let (body, _) = pchar('"')(input)?;
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => {
                let end = input.len() - body.len() + i + 1;
                return Ok((&input[end..], &input[..end]));
            }
            '\\' => {
                if chars.next().is_none() {
                    break;
                }
            }
            _ => {}
        }
    }
    Err(nom::Err::Error(NomError::new(input, ErrorKind::Char)))
}

fn literal(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        quoted_string,
        opt(alt((
            recognize(preceded(
                pchar('@'),
                take_while1(|c: char| c.is_ascii_alphanumeric() || c == '-'),
            )),
            recognize(preceded(tag("^^"), iri_ref)),
        ))),
    ))(input)
}

/// Prefixed names and numbers.
fn bare(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || matches!(c, ':' | '_' | '-' | '.' | '+'))(input)
}

fn value(input: &str) -> IResult<&str, &str> {
    alt((iri_ref, literal, bare))(input)
}

fn value_list(input: &str) -> IResult<&str, Vec<&str>> {
    separated_list0(delimited(multispace0, pchar(','), multispace0), value)(input)
}

fn closing(input: &str) -> IResult<&str, &str> {
    recognize(tuple((multispace0, pchar(')'), multispace0, pchar(')'))))(input)
}

// ============================================================================
// Batching
// ============================================================================

/// The IN-list of a query, with its byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InList<'q> {
    query: &'q str,
    /// Byte offset of the first value.
    start: usize,
    /// Byte offset just past the last value.
    end: usize,
    values: Vec<&'q str>,
}

impl<'q> InList<'q> {
    pub fn values(&self) -> &[&'q str] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The query text with its value list replaced by `values`.
    pub fn with_values(&self, values: &[&str]) -> String {
        let mut out = String::with_capacity(self.query.len());
        out.push_str(&self.query[..self.start]);
        out.push_str(&values.join(", "));
        out.push_str(&self.query[self.end..]);
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterBatcher {
    batch_size: usize,
}

impl Default for FilterBatcher {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_FILTER_BATCH_SIZE,
        }
    }
}

impl FilterBatcher {
    pub fn new(batch_size: usize) -> Result<Self, FilterBatchError> {
        if batch_size == 0 {
            return Err(FilterBatchError::ZeroBatchSize);
        }
        Ok(Self { batch_size })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Locate and tokenize the single IN-list of `query`.
    ///
    /// Clause openers that appear inside string literals are not clauses.
    pub fn extract<'q>(&self, query: &'q str) -> Result<InList<'q>, FilterBatchError> {
        let literals = literal_spans(query);
        let mut opens = filter_open_regex()
            .find_iter(query)
            .filter(|m| !literals.iter().any(|span| span.contains(&m.start())));
        let open = opens.next().ok_or(FilterBatchError::MissingFilter)?;
        let extra = opens.count();
        if extra > 0 {
            return Err(FilterBatchError::MultipleFilters(extra + 1));
        }

        let offset_of = |rest: &str| query.len() - rest.len();
        let list = query[open.end()..].trim_start();
        let start = offset_of(list);

        let (rest, values) = value_list(list).map_err(|e| malformed(query, e, "expected a value"))?;
        let end = offset_of(rest);
        closing(rest).map_err(|e| malformed(query, e, "expected `))` after the value list"))?;

        Ok(InList {
            query,
            start,
            end,
            values,
        })
    }

    /// Split `query` into batches of at most `batch_size` values.
    ///
    /// A list that already fits (including an empty one) yields the input
    /// unchanged as the only batch.
    pub fn split(&self, query: &str) -> Result<Vec<String>, FilterBatchError> {
        let list = self.extract(query)?;
        if list.len() <= self.batch_size {
            return Ok(vec![query.to_string()]);
        }

        let batches: Vec<String> = list
            .values()
            .chunks(self.batch_size)
            .map(|chunk| list.with_values(chunk))
            .collect();
        tracing::debug!(
            values = list.len(),
            batch_size = self.batch_size,
            batches = batches.len(),
            "split IN-filter into batches"
        );
        Ok(batches)
    }
}

/// Byte ranges of the double-quoted string literals in `query`, quotes
/// included. An unterminated literal runs to the end of the text.
fn literal_spans(query: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut chars = query.char_indices();
    while let Some((start, c)) = chars.next() {
        if c != '"' {
            continue;
        }
        let mut end = query.len();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    chars.next();
                }
                '"' => {
                    end = i + 1;
                    break;
                }
                _ => {}
            }
        }
        spans.push(start..end);
    }
    spans
}

fn malformed(query: &str, err: nom::Err<NomError<&str>>, message: &str) -> FilterBatchError {
    let offset = match &err {
        nom::Err::Error(e) | nom::Err::Failure(e) => query.len() - e.input.len(),
        nom::Err::Incomplete(_) => query.len(),
    };
    FilterBatchError::MalformedFilter {
        offset,
        message: message.to_string(),
    }
}
