//! Typed SPARQL IR for candidate queries.
//!
//! Candidates are small `SELECT` queries: one projection variable, a few
//! triple patterns and an optional `FILTER(?var IN (...))`. Building them as
//! values and rendering once keeps separators and escaping in one place.

use std::fmt;

/// A position in a triple pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternTerm {
    Var(String),
    Iri(String),
    Literal(String),
    /// The `a` keyword (`rdf:type`).
    RdfType,
}

impl PatternTerm {
    pub fn var(name: &str) -> Self {
        PatternTerm::Var(name.to_string())
    }

    pub fn iri(iri: &str) -> Self {
        PatternTerm::Iri(iri.to_string())
    }

    pub fn literal(lexical: &str) -> Self {
        PatternTerm::Literal(lexical.to_string())
    }

    pub fn render(&self) -> String {
        match self {
            PatternTerm::Var(name) => format!("?{name}"),
            PatternTerm::Iri(iri) => render_iri(iri),
            PatternTerm::Literal(lexical) => render_literal(lexical),
            PatternTerm::RdfType => "a".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TriplePattern {
    pub subject: PatternTerm,
    pub predicate: PatternTerm,
    pub object: PatternTerm,
}

impl TriplePattern {
    pub fn new(subject: PatternTerm, predicate: PatternTerm, object: PatternTerm) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    pub fn render(&self) -> String {
        format!(
            "{} {} {} .",
            self.subject.render(),
            self.predicate.render(),
            self.object.render()
        )
    }
}

/// `FILTER(?var IN (<v1>, <v2>, ...))` over IRIs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InFilter {
    pub var: String,
    pub values: Vec<String>,
}

impl InFilter {
    pub fn new<I, S>(var: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            var: var.to_string(),
            values: values.into_iter().map(|v| v.as_ref().to_string()).collect(),
        }
    }

    pub fn render(&self) -> String {
        let values = self
            .values
            .iter()
            .map(|v| render_iri(v))
            .collect::<Vec<_>>()
            .join(", ");
        format!("FILTER(?{} IN ({values}))", self.var)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectQuery {
    pub projection: String,
    pub patterns: Vec<TriplePattern>,
    pub filter: Option<InFilter>,
}

impl SelectQuery {
    pub fn new(projection: &str) -> Self {
        Self {
            projection: projection.to_string(),
            patterns: vec![],
            filter: None,
        }
    }

    pub fn pattern(mut self, subject: PatternTerm, predicate: PatternTerm, object: PatternTerm) -> Self {
        self.patterns
            .push(TriplePattern::new(subject, predicate, object));
        self
    }

    /// Restrict the projection variable to `values`.
    pub fn restrict_to<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filter = Some(InFilter::new(&self.projection, values));
        self
    }

    pub fn render(&self) -> String {
        let mut out = format!("SELECT ?{} WHERE {{\n", self.projection);
        for pattern in &self.patterns {
            out.push_str("  ");
            out.push_str(&pattern.render());
            out.push('\n');
        }
        if let Some(filter) = &self.filter {
            out.push_str("  ");
            out.push_str(&filter.render());
            out.push('\n');
        }
        out.push('}');
        out
    }
}

impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// `<iri>`, percent-encoding the characters SPARQL forbids inside IRIREF.
///
/// Any Unicode whitespace or control character is encoded too (as its UTF-8
/// bytes), so a rendered IRI never contains whitespace.
pub fn render_iri(iri: &str) -> String {
    let mut out = String::with_capacity(iri.len() + 2);
    out.push('<');
    for c in iri.chars() {
        match c {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => percent_encode(&mut out, c),
            c if (c as u32) <= 0x20 || c.is_whitespace() || c.is_control() => {
                percent_encode(&mut out, c)
            }
            c => out.push(c),
        }
    }
    out.push('>');
    out
}

fn percent_encode(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    for byte in c.encode_utf8(&mut buf).bytes() {
        out.push_str(&format!("%{byte:02X}"));
    }
}

/// Double-quoted SPARQL string literal.
pub fn render_literal(lexical: &str) -> String {
    let mut out = String::with_capacity(lexical.len() + 2);
    out.push('"');
    for c in lexical.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
