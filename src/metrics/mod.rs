//! Code metrics: complexity, smells, tech stack and test coverage.

pub mod complexity;
pub mod coverage;
pub mod smells;
pub mod tech_stack;

pub use complexity::{calculate_complexity, project_complexity, CodeComplexity, ComplexityLevel};
pub use coverage::{analyze_test_coverage, FileCoverage, TestCoverage};
pub use smells::{detect_code_smells, CodeSmell, Severity, SmellOptions, SmellType};
pub use tech_stack::{detect_tech_stack, TechStack};
