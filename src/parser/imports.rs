//! Import extraction via AST traversal.
//!
//! Recognized shapes:
//!   JS/TS   `import x from "m"`, `require("m")`
//!   Python  `import a.b`, `from .m import x`
//!   Java    `import a.b.C;`, `import a.b.*;`
//!   Go      `import "fmt"`, `import ( "a"; "b" )`
//!   Rust    `use a::b::{c, d};`
//!
//! Identifiers are returned raw, in source order, duplicates kept.

use tree_sitter::Node;

use super::language::SupportedLanguage;

/// Extract import identifiers from a parsed file.
pub fn extract_imports(root: &Node, source: &[u8], lang: SupportedLanguage) -> Vec<String> {
    let mut imports = Vec::new();
    walk(root, source, lang, &mut imports);
    imports
}

fn walk(node: &Node, source: &[u8], lang: SupportedLanguage, imports: &mut Vec<String>) {
    match lang {
        SupportedLanguage::JavaScript | SupportedLanguage::TypeScript | SupportedLanguage::Tsx => {
            js_import(node, source, imports)
        }
        SupportedLanguage::Python => python_import(node, source, imports),
        SupportedLanguage::Java => java_import(node, source, imports),
        SupportedLanguage::Go => go_import(node, source, imports),
        SupportedLanguage::Rust => rust_import(node, source, imports),
    }

    let count = node.child_count();
    for i in 0..count {
        if let Some(child) = node.child(i) {
            walk(&child, source, lang, imports);
        }
    }
}

fn js_import(node: &Node, source: &[u8], imports: &mut Vec<String>) {
    match node.kind() {
        "import_statement" => {
            if let Some(path) = node
                .child_by_field_name("source")
                .and_then(|s| text(&s, source))
            {
                imports.push(strip_quotes(path));
            }
        }
        "call_expression" => {
            let is_require = node
                .child_by_field_name("function")
                .and_then(|f| text(&f, source))
                .is_some_and(|name| name == "require");
            if !is_require {
                return;
            }
            let Some(args) = node.child_by_field_name("arguments") else {
                return;
            };
            if let Some(arg) = first_named_child(&args) {
                if matches!(arg.kind(), "string" | "template_string") {
                    if let Some(path) = text(&arg, source) {
                        imports.push(strip_quotes(path));
                    }
                }
            }
        }
        _ => {}
    }
}

fn python_import(node: &Node, source: &[u8], imports: &mut Vec<String>) {
    match node.kind() {
        "import_statement" => {
            let count = node.named_child_count();
            for i in 0..count {
                let Some(child) = node.named_child(i) else {
                    continue;
                };
                let name = match child.kind() {
                    "dotted_name" => text(&child, source),
                    "aliased_import" => child
                        .child_by_field_name("name")
                        .and_then(|n| text(&n, source)),
                    _ => None,
                };
                if let Some(name) = name {
                    imports.push(name.to_string());
                }
            }
        }
        "import_from_statement" => {
            if let Some(module) = node
                .child_by_field_name("module_name")
                .and_then(|m| text(&m, source))
            {
                imports.push(module.to_string());
            }
        }
        _ => {}
    }
}

fn java_import(node: &Node, source: &[u8], imports: &mut Vec<String>) {
    if node.kind() != "import_declaration" {
        return;
    }
    let mut path: Option<String> = None;
    let mut wildcard = false;
    let count = node.named_child_count();
    for i in 0..count {
        if let Some(child) = node.named_child(i) {
            match child.kind() {
                "scoped_identifier" | "identifier" => {
                    path = text(&child, source).map(String::from);
                }
                "asterisk" => wildcard = true,
                _ => {}
            }
        }
    }
    if let Some(mut path) = path {
        if wildcard {
            path.push_str(".*");
        }
        imports.push(path);
    }
}

fn go_import(node: &Node, source: &[u8], imports: &mut Vec<String>) {
    // Specs inside an import block are reached by the recursive walk.
    if node.kind() != "import_spec" {
        return;
    }
    if let Some(path) = node
        .child_by_field_name("path")
        .and_then(|p| text(&p, source))
    {
        imports.push(strip_quotes(path));
    }
}

fn rust_import(node: &Node, source: &[u8], imports: &mut Vec<String>) {
    if node.kind() != "use_declaration" {
        return;
    }
    if let Some(arg) = node
        .child_by_field_name("argument")
        .and_then(|a| text(&a, source))
    {
        imports.push(arg.to_string());
    }
}

fn first_named_child<'a>(node: &Node<'a>) -> Option<Node<'a>> {
    node.named_child(0)
}

fn text<'a>(node: &Node, source: &'a [u8]) -> Option<&'a str> {
    node.utf8_text(source).ok()
}

fn strip_quotes(s: &str) -> String {
    s.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string()
}
