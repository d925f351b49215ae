use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::thread;
use std::time::Duration;

const TREE: &str = "\
# question: Which books did Frank Herbert write?
(ROOT
  (WP Which [<http://dbpedia.org/ontology/Book>]
    (VB write [<http://dbpedia.org/ontology/author>]
      (CombinedNN \"Frank Herbert\" [<http://dbpedia.org/resource/Frank_Herbert>]))))
";

fn treeqa_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_treeqa"))
}

fn run(args: &[&str]) -> Output {
    Command::new(treeqa_bin())
        .args(args)
        .env_remove("TREEQA_SPARQL_ENDPOINT")
        .env_remove("TREEQA_FILTER_BATCH_SIZE")
        .env("NO_COLOR", "1")
        .output()
        .expect("run treeqa")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "treeqa failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write input");
    path
}

#[test]
fn path_lists_nodes_bottom_up() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tree = write_file(dir.path(), "q.tree", TREE);

    let out = stdout(&run(&["path", tree.to_str().unwrap()]));
    let tags: Vec<&str> = out
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .collect();
    assert_eq!(tags, vec!["CombinedNN", "VB", "WP"]);
}

#[test]
fn candidates_json_reports_queries() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tree = write_file(dir.path(), "q.tree", TREE);

    let out = stdout(&run(&["candidates", tree.to_str().unwrap(), "--json"]));
    let value: serde_json::Value = serde_json::from_str(&out).expect("json output");
    assert_eq!(value["question"], "Which books did Frank Herbert write?");

    // Two predicate directions for the CombinedNN/VB pair, one type restriction.
    let candidates = value["candidates"].as_array().expect("candidates");
    assert_eq!(candidates.len(), 3);
    assert!(candidates
        .iter()
        .any(|c| c.as_str().unwrap_or_default().contains("<http://dbpedia.org/ontology/Book>")));
    assert!(value["diagnostics"].as_array().expect("diagnostics").is_empty());
}

#[test]
fn split_honours_batch_size() {
    let dir = tempfile::tempdir().expect("tempdir");
    let values: Vec<String> = (0..5).map(|i| format!("<http://example.org/r{i}>")).collect();
    let query = write_file(
        dir.path(),
        "q.rq",
        &format!("SELECT ?proj WHERE {{ ?proj ?p ?o . FILTER(?proj IN ({})) }}\n", values.join(", ")),
    );

    let out = stdout(&run(&["split", query.to_str().unwrap(), "--batch-size", "2"]));
    let batches: Vec<&str> = out.lines().filter(|l| l.starts_with("SELECT")).collect();
    assert_eq!(batches.len(), 3);
    assert!(batches[2].contains("IN (<http://example.org/r4>)"));
}

#[test]
fn split_rejects_malformed_filter() {
    let dir = tempfile::tempdir().expect("tempdir");
    let query = write_file(dir.path(), "bad.rq", "SELECT ?proj WHERE { FILTER(?proj IN (<a>, ) }");
    let output = run(&["split", query.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("malformed IN-list"));
}

#[test]
fn answer_queries_the_configured_endpoint() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        stream.set_read_timeout(Some(Duration::from_secs(5))).ok();
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).expect("read request");
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }
        let body = r#"{"head":{"vars":["proj"]},"results":{"bindings":[{"proj":{"type":"uri","value":"http://dbpedia.org/resource/Dune_(novel)"}}]}}"#;
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/sparql-results+json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).expect("write response");
    });

    let dir = tempfile::tempdir().expect("tempdir");
    let tree = write_file(
        dir.path(),
        "q.tree",
        "(ROOT (WP Which [<http://dbpedia.org/ontology/Book>]))",
    );
    let endpoint = format!("http://{addr}/sparql");
    let out = stdout(&run(&[
        "answer",
        tree.to_str().unwrap(),
        "--endpoint",
        &endpoint,
        "--timeout-secs",
        "5",
        "--json",
    ]));
    server.join().expect("server thread");

    let value: serde_json::Value = serde_json::from_str(&out).expect("json output");
    let (query, terms) = value
        .as_object()
        .and_then(|m| m.iter().next())
        .expect("one candidate");
    assert!(query.contains("<http://dbpedia.org/ontology/Book>"));
    assert_eq!(terms[0]["value"], "http://dbpedia.org/resource/Dune_(novel)");
}

#[test]
fn answer_rejects_invalid_endpoint() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tree = write_file(dir.path(), "q.json", r#"{"question": "q", "root": {"tag": "ROOT", "label": ""}}"#);
    let output = run(&["answer", tree.to_str().unwrap(), "--endpoint", "not a url"]);
    assert!(!output.status.success());
}
