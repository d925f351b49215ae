//! Human-readable and JSON renderings for CLI output.

use colored::Colorize;
use serde_json::{json, Value};
use std::fmt::Write as _;
use treeqa_exec::AnswerMap;
use treeqa_sparql::Synthesis;
use treeqa_tree::{ParseTreePath, QuestionTree};

pub fn path_table(path: &ParseTreePath<'_>) -> String {
    let mut out = String::new();
    for (position, node) in path.iter().enumerate() {
        let annotations = if node.annotations.is_empty() {
            "-".dimmed().to_string()
        } else {
            node.annotations.join(" ")
        };
        let _ = writeln!(
            out,
            "{position:>3}  {:<10} {:<24} {annotations}",
            node.tag.bold(),
            node.label
        );
    }
    out
}

pub fn synthesis_json(tree: &QuestionTree, synthesis: &Synthesis) -> Value {
    json!({
        "question": tree.question(),
        "candidates": synthesis.candidates,
        "diagnostics": synthesis
            .diagnostics
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>(),
        "steps": synthesis.steps,
    })
}

pub fn synthesis_text(synthesis: &Synthesis) -> String {
    let mut out = String::new();
    for diagnostic in &synthesis.diagnostics {
        let _ = writeln!(out, "{} {diagnostic}", "skipped:".yellow().bold());
    }
    if synthesis.candidates.is_empty() {
        let _ = writeln!(out, "{}", "no candidate queries".red().bold());
        return out;
    }
    for (i, candidate) in synthesis.candidates.iter().enumerate() {
        let _ = writeln!(out, "{}", format!("# candidate {}", i + 1).dimmed());
        let _ = writeln!(out, "{candidate}");
    }
    out
}

pub fn answers_text(synthesis: &Synthesis, answers: &AnswerMap) -> String {
    let mut out = synthesis_text(synthesis);
    if answers.is_empty() {
        return out;
    }
    let _ = writeln!(
        out,
        "{} {} of {} candidates returned answers",
        "ok".green().bold(),
        answers.non_empty().count(),
        answers.len()
    );
    for (i, (_, terms)) in answers.iter().enumerate() {
        if terms.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{}", format!("# answers for candidate {}", i + 1).cyan());
        for term in terms {
            let _ = writeln!(out, "  {term}");
        }
    }
    out
}
