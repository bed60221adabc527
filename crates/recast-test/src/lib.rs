//! Recast Test Framework
//!
//! Before/after harness for recipes. A test names its recipes, gives the
//! source before and after the migration, and the harness checks that:
//!
//! 1. the input parses without syntax errors and prints back unchanged;
//! 2. running the recipes produces exactly the expected text;
//! 3. running them again on that output changes nothing.
//!
//! Both texts go through [`trim_indent`] first, so they can be written as
//! indented raw strings.
//!
//! ```rust,ignore
//! use recast_test::RewriteTest;
//!
//! RewriteTest::new()
//!     .recipe(MyRecipe::new())
//!     .rewrite_run(
//!         r#"
//!         class A { void m() { old(); } }
//!         "#,
//!         r#"
//!         class A { void m() { new(); } }
//!         "#,
//!     );
//! ```

use recast_core::{ClasspathConfig, Engine, EngineConfig, Recipe, RunResult};
use recast_java::{JavaParser, SourceFile};
use similar::TextDiff;
use tracing::debug;

/// Recipes plus the environment they run in
pub struct RewriteTest {
    recipes: Vec<Box<dyn Recipe>>,
    classpath: ClasspathConfig,
    config: EngineConfig,
}

impl RewriteTest {
    pub fn new() -> Self {
        Self {
            recipes: Vec::new(),
            classpath: ClasspathConfig::default(),
            config: EngineConfig::default(),
        }
    }

    /// Append a recipe; recipes run in the order they were added
    pub fn recipe(mut self, recipe: impl Recipe + 'static) -> Self {
        self.recipes.push(Box::new(recipe));
        self
    }

    pub fn recipes(mut self, recipes: Vec<Box<dyn Recipe>>) -> Self {
        self.recipes.extend(recipes);
        self
    }

    pub fn classpath(mut self, classpath: ClasspathConfig) -> Self {
        self.classpath = classpath;
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Parse `source` as is and run the recipes over it
    pub fn run(&self, source: &str) -> RunResult {
        let file = self.parse(source);
        Engine::new(self.config.clone()).run(&self.recipes, &file.tree)
    }

    /// Assert that the recipes turn `before` into `after`, and that a
    /// second run leaves `after` alone
    pub fn rewrite_run(&self, before: &str, after: &str) -> RunResult {
        let before = trim_indent(before);
        let after = trim_indent(after);

        let result = self.run(&before);
        let actual = result.print();
        if actual != after {
            panic!(
                "recipe output differs from the expected source\n{}",
                unified_diff(&after, &actual)
            );
        }
        debug!(passes = result.passes, "first run matched");

        let second = self.run(&actual);
        if second.changed {
            panic!(
                "recipes are not idempotent, a second run changed the output\n{}",
                unified_diff(&actual, &second.print())
            );
        }
        result
    }

    /// Assert that the recipes leave `source` untouched
    pub fn assert_unchanged(&self, source: &str) -> RunResult {
        let source = trim_indent(source);
        let result = self.run(&source);
        let actual = result.print();
        if result.changed || actual != source {
            panic!(
                "expected no change, but the recipes rewrote the source\n{}",
                unified_diff(&source, &actual)
            );
        }
        result
    }

    fn parse(&self, source: &str) -> SourceFile {
        let parser = JavaParser::with_classpath(self.classpath.clone());
        let file = match parser.parse(source) {
            Ok(file) => file,
            Err(error) => panic!("{error}\n--- source ---\n{source}"),
        };
        if file.has_errors() {
            let messages: Vec<String> = file.errors.iter().map(ToString::to_string).collect();
            panic!(
                "test source has syntax errors:\n  {}\n--- source ---\n{source}",
                messages.join("\n  ")
            );
        }
        file
    }
}

impl Default for RewriteTest {
    fn default() -> Self {
        Self::new()
    }
}

/// Assert the parse/print baseline for `source`
pub fn assert_round_trip(source: &str) {
    match recast_java::parse(source) {
        Ok(file) => {
            let printed = recast_core::print(&file.tree);
            if printed != source {
                panic!("round trip changed the source\n{}", unified_diff(source, &printed));
            }
        }
        Err(error) => panic!("{error}"),
    }
}

/// Strip blank lines around `text` and the indentation common to all
/// non-blank lines; whitespace-only lines become empty
pub fn trim_indent(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let Some(start) = lines.iter().position(|l| !l.trim().is_empty()) else {
        return String::new();
    };
    let end = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map_or(start, |last| last + 1);
    let body = &lines[start..end];

    let indent = body
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    body.iter()
        .map(|l| if l.trim().is_empty() { "" } else { &l[indent..] })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Line diff from `expected` to `actual` in unified format
pub fn unified_diff(expected: &str, actual: &str) -> String {
    TextDiff::from_lines(expected, actual)
        .unified_diff()
        .context_radius(3)
        .header("expected", "actual")
        .to_string()
}
