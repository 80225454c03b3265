//! MCP tools: one per analysis, each taking an optional project `path`.

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::types::{ToolDefinition, ToolsCallResult};
use crate::analyzer::Analyzer;
use crate::error::Result;
use crate::metrics::SmellType;
use crate::parser::ParserRegistry;

/// State shared by every tool call: the default project root and the
/// parser cache.
#[derive(Debug, Clone)]
pub struct ToolContext {
    root: PathBuf,
    registry: Arc<ParserRegistry>,
}

impl ToolContext {
    pub fn new(root: impl Into<PathBuf>, registry: Arc<ParserRegistry>) -> Self {
        Self {
            root: root.into(),
            registry,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fresh analyzer for the `path` argument, or the default root.
    fn analyzer(&self, args: &Value) -> Analyzer {
        let root = match str_arg(args, "path") {
            Some(path) => {
                let path = PathBuf::from(path);
                if path.is_relative() {
                    self.root.join(path)
                } else {
                    path
                }
            }
            None => self.root.clone(),
        };
        Analyzer::with_registry(root, Arc::clone(&self.registry))
    }
}

fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str())
}

fn path_property() -> Value {
    json!({
        "type": "string",
        "description": "Project root to analyze (default: the server's root)"
    })
}

/// Return the list of all available tools with their JSON schemas.
pub fn list_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "analyze_structure".to_string(),
            description: "Scan the project tree: files and directories with size, extension \
                and language, plus per-language file statistics."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": path_property(),
                    "maxDepth": {
                        "type": "integer",
                        "description": "Directory depth to descend (0 = top-level entries only)"
                    },
                    "lineCounts": {
                        "type": "boolean",
                        "description": "Also count lines per language",
                        "default": false
                    }
                }
            }),
        },
        ToolDefinition {
            name: "analyze_dependencies".to_string(),
            description: "Build the import graph of the project (or one file) and report \
                circular dependencies."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": path_property(),
                    "file": {
                        "type": "string",
                        "description": "Optional: analyze only this file"
                    }
                }
            }),
        },
        ToolDefinition {
            name: "calculate_complexity".to_string(),
            description: "Cyclomatic complexity estimate for a file, or for one function in it."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": path_property(),
                    "file": {
                        "type": "string",
                        "description": "File to measure (relative to the project root or absolute)"
                    },
                    "function": {
                        "type": "string",
                        "description": "Optional: narrow the measurement to this function"
                    }
                },
                "required": ["file"]
            }),
        },
        ToolDefinition {
            name: "detect_code_smells".to_string(),
            description: "Find long methods, magic numbers, duplicated blocks and large files."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": path_property(),
                    "types": {
                        "type": "array",
                        "description": "Optional: smell types to report (default: all)",
                        "items": {
                            "type": "string",
                            "enum": SmellType::ALL.iter().map(SmellType::label).collect::<Vec<_>>()
                        }
                    }
                }
            }),
        },
        ToolDefinition {
            name: "detect_tech_stack".to_string(),
            description: "Detect languages, frameworks, package managers, build tools and test \
                frameworks from manifest files."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": { "path": path_property() }
            }),
        },
        ToolDefinition {
            name: "analyze_test_coverage".to_string(),
            description: "Match source files to test files by naming convention and list the \
                files without tests."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": { "path": path_property() }
            }),
        },
    ]
}

/// Dispatch a tool call to the appropriate handler.
pub async fn call_tool(ctx: &ToolContext, name: &str, arguments: &Value) -> ToolsCallResult {
    debug!(tool = name, "dispatching tool");
    match name {
        "analyze_structure" => handle_structure(ctx, arguments).await,
        "analyze_dependencies" => handle_dependencies(ctx, arguments).await,
        "calculate_complexity" => handle_complexity(ctx, arguments).await,
        "detect_code_smells" => handle_smells(ctx, arguments).await,
        "detect_tech_stack" => {
            ToolsCallResult::from_result(ctx.analyzer(arguments).tech_stack().await)
        }
        "analyze_test_coverage" => {
            ToolsCallResult::from_result(ctx.analyzer(arguments).test_coverage().await)
        }
        _ => ToolsCallResult::error(format!("Unknown tool: {}", name)),
    }
}

async fn handle_structure(ctx: &ToolContext, args: &Value) -> ToolsCallResult {
    let max_depth = args
        .get("maxDepth")
        .and_then(|v| v.as_u64())
        .map(|d| d as usize);
    let line_counts = args
        .get("lineCounts")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    ToolsCallResult::from_result(ctx.analyzer(args).structure(max_depth, line_counts).await)
}

async fn handle_dependencies(ctx: &ToolContext, args: &Value) -> ToolsCallResult {
    let file = str_arg(args, "file").map(Path::new);
    ToolsCallResult::from_result(ctx.analyzer(args).dependencies(file).await)
}

async fn handle_complexity(ctx: &ToolContext, args: &Value) -> ToolsCallResult {
    let file = match str_arg(args, "file") {
        Some(f) => f,
        None => return ToolsCallResult::error("Missing required parameter: file".to_string()),
    };
    let function = str_arg(args, "function");
    ToolsCallResult::from_result(
        ctx.analyzer(args)
            .complexity(Path::new(file), function)
            .await,
    )
}

fn smell_types(args: &Value) -> Result<Option<Vec<SmellType>>> {
    let Some(types) = args.get("types").and_then(|v| v.as_array()) else {
        return Ok(None);
    };
    types
        .iter()
        .filter_map(|v| v.as_str())
        .map(|s| s.parse::<SmellType>())
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

async fn handle_smells(ctx: &ToolContext, args: &Value) -> ToolsCallResult {
    let types = match smell_types(args) {
        Ok(types) => types,
        Err(e) => return ToolsCallResult::error(e.to_string()),
    };
    ToolsCallResult::from_result(ctx.analyzer(args).smells(types.as_deref()).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn context(root: &Path) -> ToolContext {
        ToolContext::new(root, Arc::new(ParserRegistry::new()))
    }

    fn payload(result: &ToolsCallResult) -> Value {
        serde_json::from_str(&result.content[0].text).unwrap()
    }

    #[test]
    fn test_list_tools() {
        let names: Vec<String> = list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "analyze_structure",
                "analyze_dependencies",
                "calculate_complexity",
                "detect_code_smells",
                "detect_tech_stack",
                "analyze_test_coverage",
            ]
        );
    }

    #[tokio::test]
    async fn test_structure_tool() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("main.rs"), "fn main() {}\n").unwrap();

        let result = call_tool(&context(dir.path()), "analyze_structure", &json!({})).await;
        assert!(!result.is_error());
        let value = payload(&result);
        assert_eq!(value["totalFiles"], 1);
        assert_eq!(value["languages"][0]["language"], "Rust");
    }

    #[tokio::test]
    async fn test_smell_filter_and_invalid_type() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.js"), "if (x > 1000) { go(); }\n").unwrap();
        let ctx = context(dir.path());

        let result = call_tool(
            &ctx,
            "detect_code_smells",
            &json!({ "types": ["Magic Number"] }),
        )
        .await;
        let smells = payload(&result);
        assert_eq!(smells.as_array().unwrap().len(), 1);
        assert_eq!(smells[0]["type"], "Magic Number");

        let result = call_tool(&ctx, "detect_code_smells", &json!({ "types": ["Nope"] })).await;
        assert!(result.is_error());
    }

    #[tokio::test]
    async fn test_complexity_tool_errors() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.js"), "function f() {\n  return 1;\n}\n").unwrap();
        let ctx = context(dir.path());

        let missing_arg = call_tool(&ctx, "calculate_complexity", &json!({})).await;
        assert!(missing_arg.is_error());

        let missing_fn = call_tool(
            &ctx,
            "calculate_complexity",
            &json!({ "file": "a.js", "function": "g" }),
        )
        .await;
        assert!(missing_fn.is_error());

        let ok = call_tool(
            &ctx,
            "calculate_complexity",
            &json!({ "file": "a.js", "function": "f" }),
        )
        .await;
        assert_eq!(payload(&ok)["level"], "low");
    }

    #[tokio::test]
    async fn test_path_argument_overrides_root() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("web")).unwrap();
        fs::write(
            dir.path().join("web/package.json"),
            r#"{"dependencies": {"vue": "3"}}"#,
        )
        .unwrap();

        let result = call_tool(
            &context(dir.path()),
            "detect_tech_stack",
            &json!({ "path": "web" }),
        )
        .await;
        assert_eq!(payload(&result)["frameworks"], json!(["Vue"]));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let dir = tempdir().unwrap();
        let result = call_tool(&context(dir.path()), "nope", &json!({})).await;
        assert!(result.is_error());
    }
}
