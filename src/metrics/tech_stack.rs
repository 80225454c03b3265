//! Tech-stack detection from marker files and manifest contents.
//!
//! Only files directly under the project root are consulted. Nothing is
//! fetched and no versions are resolved.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{Result, ScopeError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechStack {
    pub languages: BTreeSet<String>,
    pub frameworks: BTreeSet<String>,
    pub package_managers: BTreeSet<String>,
    pub build_tools: BTreeSet<String>,
    pub test_frameworks: BTreeSet<String>,
}

/// What the presence of a file implies.
struct Marker {
    file: &'static str,
    languages: &'static [&'static str],
    package_managers: &'static [&'static str],
    build_tools: &'static [&'static str],
    test_frameworks: &'static [&'static str],
}

const fn marker(file: &'static str) -> Marker {
    Marker {
        file,
        languages: &[],
        package_managers: &[],
        build_tools: &[],
        test_frameworks: &[],
    }
}

const MARKERS: &[Marker] = &[
    Marker { languages: &["JavaScript", "TypeScript"], ..marker("package.json") },
    Marker { package_managers: &["npm"], ..marker("package-lock.json") },
    Marker { package_managers: &["Yarn"], ..marker("yarn.lock") },
    Marker { package_managers: &["pnpm"], ..marker("pnpm-lock.yaml") },
    Marker { package_managers: &["Bun"], ..marker("bun.lockb") },
    Marker { languages: &["TypeScript"], ..marker("tsconfig.json") },
    Marker { languages: &["Python"], package_managers: &["pip"], ..marker("requirements.txt") },
    Marker { languages: &["Python"], build_tools: &["setuptools"], ..marker("setup.py") },
    Marker { languages: &["Python"], ..marker("pyproject.toml") },
    Marker { package_managers: &["Poetry"], ..marker("poetry.lock") },
    Marker { languages: &["Python"], package_managers: &["Pipenv"], ..marker("Pipfile") },
    Marker { languages: &["Rust"], package_managers: &["Cargo"], build_tools: &["Cargo"], ..marker("Cargo.toml") },
    Marker { languages: &["Go"], package_managers: &["Go Modules"], ..marker("go.mod") },
    Marker { languages: &["Java"], package_managers: &["Maven"], build_tools: &["Maven"], ..marker("pom.xml") },
    Marker { languages: &["Java"], package_managers: &["Gradle"], build_tools: &["Gradle"], ..marker("build.gradle") },
    Marker { languages: &["Kotlin"], package_managers: &["Gradle"], build_tools: &["Gradle"], ..marker("build.gradle.kts") },
    Marker { languages: &["Ruby"], package_managers: &["Bundler"], ..marker("Gemfile") },
    Marker { languages: &["PHP"], package_managers: &["Composer"], ..marker("composer.json") },
    Marker { build_tools: &["Make"], ..marker("Makefile") },
    Marker { languages: &["C++"], build_tools: &["CMake"], ..marker("CMakeLists.txt") },
    Marker { build_tools: &["Docker"], ..marker("Dockerfile") },
    Marker { build_tools: &["Docker Compose"], ..marker("docker-compose.yml") },
    Marker { build_tools: &["Docker Compose"], ..marker("docker-compose.yaml") },
    Marker { build_tools: &["Webpack"], ..marker("webpack.config.js") },
    Marker { build_tools: &["Vite"], ..marker("vite.config.js") },
    Marker { build_tools: &["Vite"], ..marker("vite.config.ts") },
    Marker { build_tools: &["Rollup"], ..marker("rollup.config.js") },
    Marker { test_frameworks: &["Jest"], ..marker("jest.config.js") },
    Marker { test_frameworks: &["Jest"], ..marker("jest.config.ts") },
    Marker { test_frameworks: &["Vitest"], ..marker("vitest.config.ts") },
    Marker { test_frameworks: &["Cypress"], ..marker("cypress.config.ts") },
    Marker { test_frameworks: &["Playwright"], ..marker("playwright.config.ts") },
    Marker { test_frameworks: &["pytest"], ..marker("pytest.ini") },
];

#[derive(Clone, Copy)]
enum Category {
    Framework,
    BuildTool,
    TestFramework,
}

/// npm package name -> (category, label). Matched against dependency keys.
const NPM_PACKAGES: &[(&str, Category, &str)] = &[
    ("react", Category::Framework, "React"),
    ("vue", Category::Framework, "Vue"),
    ("@angular/core", Category::Framework, "Angular"),
    ("next", Category::Framework, "Next.js"),
    ("nuxt", Category::Framework, "Nuxt"),
    ("svelte", Category::Framework, "Svelte"),
    ("express", Category::Framework, "Express"),
    ("@nestjs/core", Category::Framework, "NestJS"),
    ("fastify", Category::Framework, "Fastify"),
    ("koa", Category::Framework, "Koa"),
    ("electron", Category::Framework, "Electron"),
    ("webpack", Category::BuildTool, "Webpack"),
    ("vite", Category::BuildTool, "Vite"),
    ("rollup", Category::BuildTool, "Rollup"),
    ("esbuild", Category::BuildTool, "esbuild"),
    ("parcel", Category::BuildTool, "Parcel"),
    ("@babel/core", Category::BuildTool, "Babel"),
    ("jest", Category::TestFramework, "Jest"),
    ("mocha", Category::TestFramework, "Mocha"),
    ("vitest", Category::TestFramework, "Vitest"),
    ("jasmine", Category::TestFramework, "Jasmine"),
    ("cypress", Category::TestFramework, "Cypress"),
    ("@playwright/test", Category::TestFramework, "Playwright"),
];

/// Manifest file -> substrings searched in its (lowercased) contents.
const MANIFEST_SUBSTRINGS: &[(&str, &[(&str, Category, &str)])] = &[
    ("requirements.txt", PYTHON_PACKAGES),
    ("pyproject.toml", PYTHON_PACKAGES),
    ("Pipfile", PYTHON_PACKAGES),
    ("setup.py", PYTHON_PACKAGES),
    (
        "Cargo.toml",
        &[
            ("actix-web", Category::Framework, "Actix Web"),
            ("axum", Category::Framework, "Axum"),
            ("rocket", Category::Framework, "Rocket"),
            ("warp", Category::Framework, "Warp"),
        ],
    ),
    (
        "go.mod",
        &[
            ("github.com/gin-gonic/gin", Category::Framework, "Gin"),
            ("github.com/labstack/echo", Category::Framework, "Echo"),
            ("github.com/gofiber/fiber", Category::Framework, "Fiber"),
            ("github.com/stretchr/testify", Category::TestFramework, "Testify"),
        ],
    ),
    ("pom.xml", JVM_PACKAGES),
    ("build.gradle", JVM_PACKAGES),
    ("build.gradle.kts", JVM_PACKAGES),
    (
        "Gemfile",
        &[
            ("rails", Category::Framework, "Rails"),
            ("sinatra", Category::Framework, "Sinatra"),
            ("rspec", Category::TestFramework, "RSpec"),
        ],
    ),
    (
        "composer.json",
        &[
            ("laravel/framework", Category::Framework, "Laravel"),
            ("symfony/", Category::Framework, "Symfony"),
            ("phpunit", Category::TestFramework, "PHPUnit"),
        ],
    ),
];

const PYTHON_PACKAGES: &[(&str, Category, &str)] = &[
    ("django", Category::Framework, "Django"),
    ("flask", Category::Framework, "Flask"),
    ("fastapi", Category::Framework, "FastAPI"),
    ("pytest", Category::TestFramework, "pytest"),
];

const JVM_PACKAGES: &[(&str, Category, &str)] = &[
    ("spring-boot", Category::Framework, "Spring Boot"),
    ("junit", Category::TestFramework, "JUnit"),
    ("testng", Category::TestFramework, "TestNG"),
];

const LOCK_FILES: &[&str] = &["package-lock.json", "yarn.lock", "pnpm-lock.yaml", "bun.lockb"];

impl TechStack {
    fn add(&mut self, category: Category, label: &str) {
        let set = match category {
            Category::Framework => &mut self.frameworks,
            Category::BuildTool => &mut self.build_tools,
            Category::TestFramework => &mut self.test_frameworks,
        };
        set.insert(label.to_string());
    }

    fn apply(&mut self, marker: &Marker) {
        let extend = |set: &mut BTreeSet<String>, items: &[&str]| {
            set.extend(items.iter().map(|s| s.to_string()));
        };
        extend(&mut self.languages, marker.languages);
        extend(&mut self.package_managers, marker.package_managers);
        extend(&mut self.build_tools, marker.build_tools);
        extend(&mut self.test_frameworks, marker.test_frameworks);
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
            && self.frameworks.is_empty()
            && self.package_managers.is_empty()
            && self.build_tools.is_empty()
            && self.test_frameworks.is_empty()
    }
}

/// Dependency keys from `dependencies`, `devDependencies` and `peerDependencies`.
pub fn package_json_dependencies(manifest: &Value) -> BTreeSet<String> {
    ["dependencies", "devDependencies", "peerDependencies"]
        .iter()
        .filter_map(|section| manifest.get(section).and_then(Value::as_object))
        .flat_map(|deps| deps.keys().cloned())
        .collect()
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Detect languages, frameworks, package managers, build and test tools.
pub async fn detect_tech_stack(root: &Path) -> Result<TechStack> {
    if !exists(root).await {
        return Err(ScopeError::NotFound(root.to_path_buf()));
    }

    let mut stack = TechStack::default();
    for marker in MARKERS {
        if exists(&root.join(marker.file)).await {
            debug!(marker = marker.file, "marker file present");
            stack.apply(marker);
        }
    }

    let package_json = root.join("package.json");
    if exists(&package_json).await {
        let mut has_lock = false;
        for lock in LOCK_FILES {
            has_lock |= exists(&root.join(lock)).await;
        }
        if !has_lock {
            stack.package_managers.insert("npm".to_string());
        }

        match tokio::fs::read_to_string(&package_json).await {
            Ok(content) => match serde_json::from_str::<Value>(&content) {
                Ok(manifest) => {
                    let deps = package_json_dependencies(&manifest);
                    for (name, category, label) in NPM_PACKAGES {
                        if deps.contains(*name) {
                            stack.add(*category, label);
                        }
                    }
                }
                Err(e) => warn!(error = %e, "package.json is not valid JSON"),
            },
            Err(e) => warn!(error = %e, "failed to read package.json"),
        }
    }

    for (file, table) in MANIFEST_SUBSTRINGS {
        let path = root.join(file);
        if !exists(&path).await {
            continue;
        }
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content.to_lowercase(),
            Err(e) => {
                warn!(manifest = *file, error = %e, "failed to read manifest");
                continue;
            }
        };
        for (needle, category, label) in table.iter() {
            if content.contains(needle) {
                stack.add(*category, label);
            }
        }
    }

    info!(
        languages = stack.languages.len(),
        frameworks = stack.frameworks.len(),
        "tech stack detected"
    );
    Ok(stack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_react_package_json() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"name": "app", "dependencies": {"react": "^18.2.0"}}"#,
        )
        .unwrap();

        let stack = detect_tech_stack(dir.path()).await.unwrap();
        assert_eq!(stack.frameworks, set(&["React"]));
        assert!(stack.languages.contains("JavaScript"));
        assert!(stack.languages.contains("TypeScript"));
        assert_eq!(stack.package_managers, set(&["npm"]));
    }

    #[tokio::test]
    async fn test_node_tooling_from_dev_dependencies() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"devDependencies": {"vite": "5", "vitest": "1", "@babel/core": "7"}, "dependencies": {"express": "4"}}"#,
        )
        .unwrap();
        fs::write(dir.path().join("yarn.lock"), "").unwrap();

        let stack = detect_tech_stack(dir.path()).await.unwrap();
        assert_eq!(stack.frameworks, set(&["Express"]));
        assert_eq!(stack.build_tools, set(&["Babel", "Vite"]));
        assert_eq!(stack.test_frameworks, set(&["Vitest"]));
        assert_eq!(stack.package_managers, set(&["Yarn"]));
    }

    #[tokio::test]
    async fn test_python_and_rust_manifests() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("requirements.txt"), "Django==4.2\npytest\n").unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[dependencies]\naxum = \"0.7\"\n",
        )
        .unwrap();
        fs::write(dir.path().join("Dockerfile"), "FROM rust\n").unwrap();

        let stack = detect_tech_stack(dir.path()).await.unwrap();
        assert_eq!(stack.languages, set(&["Python", "Rust"]));
        assert_eq!(stack.frameworks, set(&["Axum", "Django"]));
        assert_eq!(stack.package_managers, set(&["Cargo", "pip"]));
        assert_eq!(stack.build_tools, set(&["Cargo", "Docker"]));
        assert_eq!(stack.test_frameworks, set(&["pytest"]));
    }

    #[tokio::test]
    async fn test_invalid_package_json_keeps_markers() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("package.json"), "{ not json").unwrap();

        let stack = detect_tech_stack(dir.path()).await.unwrap();
        assert!(stack.frameworks.is_empty());
        assert!(stack.languages.contains("JavaScript"));
    }

    #[tokio::test]
    async fn test_empty_project() {
        let dir = tempdir().unwrap();
        let stack = detect_tech_stack(dir.path()).await.unwrap();
        assert!(stack.is_empty());
    }

    #[tokio::test]
    async fn test_missing_root() {
        let result = detect_tech_stack(Path::new("/no/such/project")).await;
        assert!(matches!(result, Err(ScopeError::NotFound(_))));
    }
}
