//! Tree-walking dispatcher: parses one source text and invokes every
//! registered rule at each call expression.

use super::alias::AliasTable;
use super::callsite::CallSite;
use crate::rules::RuleRegistry;
use crate::types::Finding;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tree_sitter::{Node, Parser};

/// Snippets attached to findings are truncated to this many characters.
const SNIPPET_LIMIT: usize = 100;

/// Parse `source` as Python and run every rule in `registry` at each call
/// expression, in a single pre-order traversal.
///
/// Malformed source yields an empty finding list: parse errors are not
/// security findings. Callers that want to treat unparseable files as
/// suspicious can do so at a higher layer.
pub fn walk(source: &str, registry: &RuleRegistry) -> Vec<Finding> {
    let mut parser = Parser::new();
    if parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .is_err()
    {
        tracing::error!("failed to load Python grammar");
        return Vec::new();
    }

    let tree = match parser.parse(source, None) {
        Some(tree) => tree,
        None => return Vec::new(),
    };
    let root = tree.root_node();
    if root.has_error() {
        tracing::debug!("source failed to parse cleanly, skipping analysis");
        return Vec::new();
    }

    let mut visitor = Visitor {
        source,
        registry,
        aliases: AliasTable::new(),
        findings: Vec::new(),
    };
    visitor.visit(root);
    visitor.findings
}

struct Visitor<'a> {
    source: &'a str,
    registry: &'a RuleRegistry,
    aliases: AliasTable,
    findings: Vec<Finding>,
}

impl<'a> Visitor<'a> {
    fn visit(&mut self, node: Node<'a>) {
        match node.kind() {
            "import_statement" => self.visit_import(node),
            "import_from_statement" => self.visit_import_from(node),
            "assignment" => self.visit_assignment(node),
            "call" => self.visit_call(node),
            _ => {}
        }

        // Continue into all children regardless of whether a rule fired:
        // rules are not mutually exclusive and nested calls are call sites
        // of their own.
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child);
        }
    }

    /// `import x`, `import x.y`, `import x as y`.
    fn visit_import(&mut self, node: Node<'a>) {
        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            match name.kind() {
                "dotted_name" => {
                    if let Ok(text) = name.utf8_text(self.source.as_bytes()) {
                        self.aliases.bind(text, text);
                    }
                }
                "aliased_import" => {
                    let original = name
                        .child_by_field_name("name")
                        .and_then(|n| n.utf8_text(self.source.as_bytes()).ok());
                    let alias = name
                        .child_by_field_name("alias")
                        .and_then(|n| n.utf8_text(self.source.as_bytes()).ok());
                    if let (Some(original), Some(alias)) = (original, alias) {
                        self.aliases.bind(alias, original);
                    }
                }
                _ => {}
            }
        }
    }

    /// `from m import n`, `from m import n as y`.
    fn visit_import_from(&mut self, node: Node<'a>) {
        let module = node
            .child_by_field_name("module_name")
            .and_then(|n| n.utf8_text(self.source.as_bytes()).ok())
            .unwrap_or("");

        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            match name.kind() {
                "dotted_name" => {
                    if let Ok(text) = name.utf8_text(self.source.as_bytes()) {
                        self.aliases.bind(text, qualify(module, text));
                    }
                }
                "aliased_import" => {
                    let original = name
                        .child_by_field_name("name")
                        .and_then(|n| n.utf8_text(self.source.as_bytes()).ok());
                    let alias = name
                        .child_by_field_name("alias")
                        .and_then(|n| n.utf8_text(self.source.as_bytes()).ok());
                    if let (Some(original), Some(alias)) = (original, alias) {
                        self.aliases.bind(alias, qualify(module, original));
                    }
                }
                _ => {}
            }
        }
    }

    /// Propagate aliases one hop through `b = a` where `a` is a known alias.
    fn visit_assignment(&mut self, node: Node<'a>) {
        let left = node.child_by_field_name("left");
        let right = node.child_by_field_name("right");
        if let (Some(left), Some(right)) = (left, right) {
            if left.kind() == "identifier" && right.kind() == "identifier" {
                if let (Ok(target), Ok(value)) = (
                    left.utf8_text(self.source.as_bytes()),
                    right.utf8_text(self.source.as_bytes()),
                ) {
                    if self.aliases.contains(value) {
                        let origin = self.aliases.resolve(value).to_string();
                        self.aliases.bind(target, origin);
                    }
                }
            }
        }
    }

    fn visit_call(&mut self, node: Node<'a>) {
        let site = match CallSite::from_call(node, self.source, &self.aliases) {
            Some(site) => site,
            None => return,
        };

        for rule in self.registry.rules() {
            // A misbehaving rule must not abort the scan: isolate each
            // invocation and treat a panic as "no finding from this rule".
            let outcome = catch_unwind(AssertUnwindSafe(|| (rule.check)(&site)));
            let hit = match outcome {
                Ok(hit) => hit,
                Err(_) => {
                    tracing::warn!(rule = rule.id, line = site.line(), "rule panicked, skipped");
                    continue;
                }
            };

            if let Some(hit) = hit {
                self.findings.push(
                    Finding::new(rule.id, site.line(), site.column(), hit.message, hit.severity)
                        .with_snippet(truncate(site.text(), SNIPPET_LIMIT)),
                );
            }
        }
    }
}

fn qualify(module: &str, name: &str) -> String {
    if module.is_empty() {
        name.to_string()
    } else {
        format!("{module}.{name}")
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
