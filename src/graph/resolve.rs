//! Optional mapping from raw import identifiers to node keys.
//!
//! Off by default: the graph keeps raw identifiers and a cycle only closes
//! when an identifier equals another node's path. With resolution on, an
//! edge also records the node key its identifier points at and cycle
//! detection follows that key instead.

use std::collections::HashSet;
use std::path::Path;

use crate::parser::SupportedLanguage;

/// Resolve `import`, written in file `from`, against the set of node keys.
pub fn resolve_import(from: &str, import: &str, keys: &HashSet<String>) -> Option<String> {
    if keys.contains(import) {
        return Some(import.to_string());
    }
    let lang = SupportedLanguage::from_path(Path::new(from))?;
    let dir = parent_dir(from);

    let bases: Vec<String> = match lang {
        SupportedLanguage::JavaScript | SupportedLanguage::TypeScript | SupportedLanguage::Tsx => {
            if import.starts_with("./") || import.starts_with("../") {
                join(&dir, import).into_iter().collect()
            } else {
                Vec::new()
            }
        }
        SupportedLanguage::Python => python_bases(&dir, import),
        SupportedLanguage::Rust => rust_bases(&dir, import),
        SupportedLanguage::Java => {
            let rel = import.trim_end_matches(".*").replace('.', "/");
            return keys
                .iter()
                .filter(|k| k.ends_with(&format!("{rel}.java")))
                .min()
                .cloned();
        }
        SupportedLanguage::Go => Vec::new(),
    };

    for base in bases {
        for candidate in candidates(&base, lang) {
            if keys.contains(&candidate) && same_ecosystem(lang, &candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

/// A JS file may import TS and vice versa; otherwise languages must match.
fn same_ecosystem(lang: SupportedLanguage, key: &str) -> bool {
    SupportedLanguage::from_path(Path::new(key)).is_some_and(|other| lang.same_ecosystem(&other))
}

/// File names tried for a base path: itself, with an extension, then index files.
fn candidates(base: &str, lang: SupportedLanguage) -> Vec<String> {
    let mut out = vec![base.to_string()];
    for ext in lang.import_extensions() {
        out.push(format!("{base}.{ext}"));
    }
    let index_names: &[&str] = match lang {
        SupportedLanguage::Python => &["__init__"],
        SupportedLanguage::Rust => &["mod"],
        _ => &["index"],
    };
    for index in index_names {
        for ext in lang.import_extensions() {
            out.push(format!("{base}/{index}.{ext}"));
        }
    }
    out
}

fn python_bases(dir: &str, import: &str) -> Vec<String> {
    let dots = import.chars().take_while(|&c| c == '.').count();
    let module = import[dots..].replace('.', "/");
    if dots == 0 {
        // Absolute: from the project root or next to the importing file.
        let mut bases = vec![module.clone()];
        if !dir.is_empty() {
            bases.push(format!("{dir}/{module}"));
        }
        return bases;
    }
    let mut rel = String::from("./");
    for _ in 1..dots {
        rel.push_str("../");
    }
    rel.push_str(&module);
    join(dir, rel.trim_end_matches('/')).into_iter().collect()
}

fn rust_bases(dir: &str, import: &str) -> Vec<String> {
    let path = import.split('{').next().unwrap_or(import).trim_end_matches("::");
    let mut segments: Vec<&str> = path.split("::").collect();
    let prefix = match segments.first().copied() {
        Some("crate") => "src".to_string(),
        Some("self") => dir.to_string(),
        Some("super") => parent_dir(dir),
        _ => return Vec::new(),
    };
    segments.remove(0);

    // The last segments may name items rather than modules; try every prefix.
    let mut bases = Vec::new();
    for len in (1..=segments.len()).rev() {
        let rel = segments[..len].join("/");
        bases.push(if prefix.is_empty() {
            rel
        } else {
            format!("{prefix}/{rel}")
        });
    }
    bases
}

fn parent_dir(path: &str) -> String {
    match path.rfind('/') {
        Some(pos) => path[..pos].to_string(),
        None => String::new(),
    }
}

/// Join a relative specifier onto `dir`, normalizing `.` and `..`.
/// Returns `None` when the path escapes the project root.
fn join(dir: &str, rel: &str) -> Option<String> {
    let mut parts: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in rel.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}
