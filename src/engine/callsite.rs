//! Read-only view of one call expression, shared by every rule.
//!
//! This is the single resolver all rules consult: callee resolution through
//! the alias table, positional/keyword argument access, and Python
//! string-literal extraction live here instead of being re-implemented per
//! rule.

use super::alias::AliasTable;
use tree_sitter::Node;

/// Resolve the callee of a call expression to a best-effort fully-qualified
/// name.
///
/// Attribute chains resolve the left-most identifier through the alias table
/// and join the remaining attribute names with `.`; bare identifiers resolve
/// directly or pass through unchanged. Callees rooted in anything else
/// (subscripts, call results, lambdas) are not resolvable.
pub fn resolve_callee(func: Node, source: &str, aliases: &AliasTable) -> Option<String> {
    match func.kind() {
        "identifier" => {
            let name = func.utf8_text(source.as_bytes()).ok()?;
            Some(aliases.resolve(name).to_string())
        }
        "attribute" => {
            let mut attrs: Vec<&str> = Vec::new();
            let mut current = func;
            loop {
                match current.kind() {
                    "attribute" => {
                        let attr = current.child_by_field_name("attribute")?;
                        attrs.push(attr.utf8_text(source.as_bytes()).ok()?);
                        current = current.child_by_field_name("object")?;
                    }
                    "identifier" => {
                        let base = current.utf8_text(source.as_bytes()).ok()?;
                        let mut resolved = aliases.resolve(base).to_string();
                        for attr in attrs.iter().rev() {
                            resolved.push('.');
                            resolved.push_str(attr);
                        }
                        return Some(resolved);
                    }
                    _ => return None,
                }
            }
        }
        _ => None,
    }
}

/// Extract the value of a Python string literal node, handling quote styles
/// and `r`/`b`/`u`/`f` prefixes. Returns `None` for non-string nodes.
pub fn string_literal(node: Node, source: &str) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    let text = node.utf8_text(source.as_bytes()).ok()?;
    let trimmed =
        text.trim_start_matches(|c: char| matches!(c, 'r' | 'R' | 'b' | 'B' | 'u' | 'U' | 'f' | 'F'));
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if trimmed.len() >= 2 * quote.len()
            && trimmed.starts_with(quote)
            && trimmed.ends_with(quote)
        {
            return Some(trimmed[quote.len()..trimmed.len() - quote.len()].to_string());
        }
    }
    None
}

/// Whether a node is a literal constant (string, number, bool, None).
pub fn is_constant(node: Node) -> bool {
    matches!(
        node.kind(),
        "string" | "concatenated_string" | "integer" | "float" | "true" | "false" | "none"
    )
}

/// One call expression plus the alias context in effect when it was reached.
/// Rules see nothing outside this subtree.
pub struct CallSite<'a> {
    node: Node<'a>,
    source: &'a str,
    callee: Option<String>,
    args: Vec<Node<'a>>,
    kwargs: Vec<(String, Node<'a>)>,
    aliases: &'a AliasTable,
}

impl<'a> CallSite<'a> {
    /// Build the view for a `call` node. Returns `None` for nodes without a
    /// function child (malformed subtrees).
    pub fn from_call(node: Node<'a>, source: &'a str, aliases: &'a AliasTable) -> Option<Self> {
        let func = node.child_by_field_name("function")?;
        let callee = resolve_callee(func, source, aliases);

        let mut args = Vec::new();
        let mut kwargs = Vec::new();
        if let Some(arg_list) = node.child_by_field_name("arguments") {
            let mut cursor = arg_list.walk();
            for child in arg_list.named_children(&mut cursor) {
                if child.kind() == "keyword_argument" {
                    let name = child
                        .child_by_field_name("name")
                        .and_then(|n| n.utf8_text(source.as_bytes()).ok());
                    let value = child.child_by_field_name("value");
                    if let (Some(name), Some(value)) = (name, value) {
                        kwargs.push((name.to_string(), value));
                    }
                } else if child.kind() != "comment" {
                    args.push(child);
                }
            }
        }

        Some(Self {
            node,
            source,
            callee,
            args,
            kwargs,
            aliases,
        })
    }

    /// The resolved fully-qualified callee name, when the callee shape allows
    /// resolution.
    pub fn callee(&self) -> Option<&str> {
        self.callee.as_deref()
    }

    pub fn node(&self) -> Node<'a> {
        self.node
    }

    /// 1-based line of the call expression.
    pub fn line(&self) -> usize {
        self.node.start_position().row + 1
    }

    /// 0-based column of the call expression.
    pub fn column(&self) -> usize {
        self.node.start_position().column
    }

    /// Source text of the whole call expression.
    pub fn text(&self) -> &str {
        self.node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    pub fn args(&self) -> &[Node<'a>] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<Node<'a>> {
        self.args.get(index).copied()
    }

    /// String-literal value of the positional argument at `index`.
    pub fn arg_string(&self, index: usize) -> Option<String> {
        self.arg(index).and_then(|n| string_literal(n, self.source))
    }

    pub fn kwarg(&self, name: &str) -> Option<Node<'a>> {
        self.kwargs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| *v)
    }

    /// String-literal value of the keyword argument `name`.
    pub fn kwarg_string(&self, name: &str) -> Option<String> {
        self.kwarg(name).and_then(|n| string_literal(n, self.source))
    }

    /// Whether keyword argument `name` is the literal `True`.
    pub fn kwarg_is_true(&self, name: &str) -> bool {
        self.kwarg(name).map(|n| n.kind() == "true").unwrap_or(false)
    }

    /// Whether keyword argument `name` is the literal `False`.
    pub fn kwarg_is_false(&self, name: &str) -> bool {
        self.kwarg(name)
            .map(|n| n.kind() == "false")
            .unwrap_or(false)
    }

    /// Resolve a nested call's callee with the same alias context, e.g. the
    /// inner `base64.b64decode` in `exec(base64.b64decode(x))`.
    pub fn nested_callee(&self, node: Node<'a>) -> Option<String> {
        if node.kind() != "call" {
            return None;
        }
        let func = node.child_by_field_name("function")?;
        resolve_callee(func, self.source, self.aliases)
    }

    /// Every string literal appearing among positional and keyword arguments.
    pub fn string_args(&self) -> Vec<String> {
        let mut out = Vec::new();
        for node in &self.args {
            if let Some(s) = string_literal(*node, self.source) {
                out.push(s);
            }
        }
        for (_, node) in &self.kwargs {
            if let Some(s) = string_literal(*node, self.source) {
                out.push(s);
            }
        }
        out
    }

    /// Whether any node in the argument subtrees satisfies `pred`.
    /// Used for shape checks like "an argument mentions `os.environ`".
    pub fn any_arg_subtree(&self, pred: &dyn Fn(Node<'a>, &str) -> bool) -> bool {
        fn walk<'a>(node: Node<'a>, source: &str, pred: &dyn Fn(Node<'a>, &str) -> bool) -> bool {
            if pred(node, source) {
                return true;
            }
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if walk(child, source, pred) {
                    return true;
                }
            }
            false
        }

        for node in &self.args {
            if walk(*node, self.source, pred) {
                return true;
            }
        }
        for (_, node) in &self.kwargs {
            if walk(*node, self.source, pred) {
                return true;
            }
        }
        false
    }

    pub fn source(&self) -> &'a str {
        self.source
    }
}
