//! Configuration for recast
//!
//! Configuration is plain data handed explicitly to the driver, visitors and
//! printer; the engine reads no global state. A project file is either
//! `recast.toml` or `recast.json`:
//!
//! ```toml
//! recipes = ["mockito-mock-utils-to-static", "remove-unused-local-variables"]
//!
//! [engine]
//! maxPasses = 8
//! preserveImports = ["com.example.Registrations"]
//! reportUnresolved = true
//!
//! [classpath]
//! types = ["org.mockito.internal.util.MockUtil"]
//!
//! [classpath.staticMembers]
//! "org.junit.jupiter.api.Assertions" = ["assertEquals", "assertNull"]
//!
//! [files]
//! include = ["src/**/*.java"]
//! exclude = ["**/generated/**"]
//! ```

pub mod loader;

pub use loader::ConfigLoader;

use crate::error::RecastError;
use crate::printer::PrinterOptions;
use crate::result::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Upper bound on fixpoint passes when nothing is configured
pub const DEFAULT_MAX_PASSES: usize = 8;

/// Settings for one engine instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Maximum number of full passes before giving up on a fixpoint
    pub max_passes: usize,
    /// Imports never removed, even without a textual reference
    pub preserve_imports: Vec<String>,
    /// Report call sites skipped for lack of type information
    pub report_unresolved: bool,
    pub printer: PrinterOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
            preserve_imports: Vec::new(),
            report_unresolved: false,
            printer: PrinterOptions::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    pub fn with_report_unresolved(mut self, report: bool) -> Self {
        self.report_unresolved = report;
        self
    }

    pub fn with_preserved_import(mut self, name: impl Into<String>) -> Self {
        self.preserve_imports.push(name.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_passes == 0 {
            return Err(RecastError::config_error("engine.maxPasses must be at least 1"));
        }
        Ok(())
    }
}

/// Types and static members known to exist, beyond what the file imports
///
/// Attribution trusts single-type imports as written; this catalog is what
/// lets it resolve names that arrive through on-demand imports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClasspathConfig {
    /// Fully qualified type names
    pub types: Vec<String>,
    /// Static methods and fields per fully qualified type
    pub static_members: BTreeMap<String, Vec<String>>,
}

impl ClasspathConfig {
    pub fn with_type(mut self, qualified_name: impl Into<String>) -> Self {
        self.types.push(qualified_name.into());
        self
    }

    pub fn with_static_members<I, S>(mut self, owner: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let owner = owner.into();
        if !self.types.contains(&owner) {
            self.types.push(owner.clone());
        }
        self.static_members
            .entry(owner)
            .or_default()
            .extend(members.into_iter().map(Into::into));
        self
    }

    pub fn contains_type(&self, qualified_name: &str) -> bool {
        self.types.iter().any(|t| t == qualified_name)
            || self.static_members.contains_key(qualified_name)
    }

    /// Types of `package` with the given simple name
    pub fn type_in_package(&self, package: &str, simple_name: &str) -> Option<String> {
        let candidate = format!("{package}.{simple_name}");
        self.contains_type(&candidate).then_some(candidate)
    }

    pub fn has_static_member(&self, owner: &str, member: &str) -> bool {
        self.static_members
            .get(owner)
            .is_some_and(|members| members.iter().any(|m| m == member))
    }

    /// Merge another catalog into this one
    pub fn extend(&mut self, other: ClasspathConfig) {
        for ty in other.types {
            if !self.types.contains(&ty) {
                self.types.push(ty);
            }
        }
        for (owner, members) in other.static_members {
            self.static_members.entry(owner).or_default().extend(members);
        }
    }
}

/// Which files the CLI picks up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilesConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            include: vec!["**/*.java".to_string()],
            exclude: vec!["**/target/**".to_string(), "**/build/**".to_string()],
        }
    }
}

/// Whole project configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecastConfig {
    /// Recipe names to run, in order
    pub recipes: Vec<String>,
    pub engine: EngineConfig,
    pub classpath: ClasspathConfig,
    pub files: FilesConfig,
}

impl RecastConfig {
    /// Load from a `.toml` or `.json` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| RecastError::io_error(path, e))?;
        let config: RecastConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)
                .map_err(|e| RecastError::config_error(e.to_string()))?,
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| RecastError::config_error(e.to_string()))?,
            _ => {
                return Err(RecastError::config_error(format!(
                    "Unsupported config file extension (expected .toml or .json): {}",
                    path.display()
                )));
            }
        };
        config.engine.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| RecastError::internal_error(e.to_string()))
    }

    /// Default configuration rendered as TOML, used by `recast config init`
    pub fn default_toml() -> Result<String> {
        RecastConfig::default().to_toml()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_passes, DEFAULT_MAX_PASSES);
        assert!(!config.report_unresolved);
        assert!(config.validate().is_ok());
        assert!(config.with_max_passes(0).validate().is_err());
    }

    #[test]
    fn test_parse_toml() {
        let config: RecastConfig = toml::from_str(
            r#"
recipes = ["junit-assert-equals-null-to-assert-null"]

[engine]
maxPasses = 3
reportUnresolved = true

[classpath.staticMembers]
"org.junit.jupiter.api.Assertions" = ["assertEquals", "assertNull"]
"#,
        )
        .unwrap();

        assert_eq!(config.engine.max_passes, 3);
        assert!(config.engine.report_unresolved);
        assert!(
            config
                .classpath
                .has_static_member("org.junit.jupiter.api.Assertions", "assertNull")
        );
        assert!(config.classpath.contains_type("org.junit.jupiter.api.Assertions"));
        assert_eq!(config.files, FilesConfig::default());
    }

    #[test]
    fn test_parse_json_camel_case() {
        let config: RecastConfig = serde_json::from_str(
            r#"{"engine": {"preserveImports": ["com.example.Hooks"]}, "classpath": {"types": ["java.util.List"]}}"#,
        )
        .unwrap();
        assert_eq!(config.engine.preserve_imports, vec!["com.example.Hooks"]);
        assert_eq!(
            config.classpath.type_in_package("java.util", "List").as_deref(),
            Some("java.util.List")
        );
    }

    #[test]
    fn test_default_toml_round_trips() {
        let text = RecastConfig::default_toml().unwrap();
        let parsed: RecastConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, RecastConfig::default());
    }
}
