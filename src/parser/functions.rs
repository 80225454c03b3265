//! Function and method declarations via AST traversal.

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use super::language::SupportedLanguage;

/// A function or method declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFunction {
    pub name: String,
    /// 1-based line of the name token.
    pub line: usize,
}

/// Extract function declarations from a parsed file, in source order.
pub fn extract_functions(
    root: &Node,
    source: &[u8],
    lang: SupportedLanguage,
) -> Vec<ExtractedFunction> {
    let mut functions = Vec::new();
    walk(root, source, lang, &mut functions);
    functions
}

fn walk(node: &Node, source: &[u8], lang: SupportedLanguage, out: &mut Vec<ExtractedFunction>) {
    if let Some(name_node) = declaration_name(node, lang) {
        if let Ok(name) = name_node.utf8_text(source) {
            out.push(ExtractedFunction {
                name: name.to_string(),
                line: name_node.start_position().row + 1,
            });
        }
    }

    let count = node.child_count();
    for i in 0..count {
        if let Some(child) = node.child(i) {
            walk(&child, source, lang, out);
        }
    }
}

/// The name node if `node` declares a function in `lang`.
fn declaration_name<'a>(node: &Node<'a>, lang: SupportedLanguage) -> Option<Node<'a>> {
    let kind = node.kind();
    let is_declaration = match lang {
        SupportedLanguage::JavaScript | SupportedLanguage::TypeScript | SupportedLanguage::Tsx => {
            match kind {
                "function_declaration" | "generator_function_declaration" | "method_definition" => {
                    true
                }
                // const handler = () => {} / const f = function () {}
                "variable_declarator" => node.child_by_field_name("value").is_some_and(|v| {
                    matches!(
                        v.kind(),
                        "arrow_function" | "function_expression" | "function"
                    )
                }),
                _ => false,
            }
        }
        SupportedLanguage::Python => kind == "function_definition",
        SupportedLanguage::Java => {
            matches!(kind, "method_declaration" | "constructor_declaration")
        }
        SupportedLanguage::Go => matches!(kind, "function_declaration" | "method_declaration"),
        SupportedLanguage::Rust => kind == "function_item",
    };

    if is_declaration {
        node.child_by_field_name("name")
    } else {
        None
    }
}
