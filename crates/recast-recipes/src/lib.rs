//! Recast Recipes
//!
//! Migrations built on the `recast-core` primitives. Each recipe holds its
//! match patterns and hands out a fresh visitor per traversal, so one
//! registry can serve every file of a run.
//!
//! | name | effect |
//! |------|--------|
//! | `mockito-mock-utils-to-static` | `new MockUtil().isMock(x)` to `MockUtil.isMock(x)` |
//! | `junit-assert-equals-null-to-assert-null` | `assertEquals(x, null)` to `assertNull(x)` |
//! | `remove-unused-local-variables` | drops side-effect free, unread locals |

pub mod cleanup;
pub mod junit;
pub mod mockito;

pub use cleanup::RemoveUnusedLocalVariables;
pub use junit::AssertEqualsNullToAssertNull;
pub use mockito::MockUtilsToStatic;

use recast_core::{RecastError, Recipe, Result};

/// Every built-in recipe, in the order they are listed
pub fn builtin_recipes() -> Vec<Box<dyn Recipe>> {
    vec![
        Box::new(MockUtilsToStatic::new()),
        Box::new(AssertEqualsNullToAssertNull::new()),
        Box::new(RemoveUnusedLocalVariables),
    ]
}

pub fn find_recipe(name: &str) -> Option<Box<dyn Recipe>> {
    builtin_recipes().into_iter().find(|r| r.name() == name)
}

/// Look up recipes by name, keeping the given order
pub fn resolve_recipes<S: AsRef<str>>(names: &[S]) -> Result<Vec<Box<dyn Recipe>>> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            find_recipe(name).ok_or_else(|| RecastError::recipe_error(name, "no such recipe"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use recast_core::ErrorKind;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let recipes = builtin_recipes();
        let names: HashSet<&str> = recipes.iter().map(|r| r.name()).collect();
        assert_eq!(names.len(), recipes.len());
        assert!(recipes.iter().all(|r| !r.description().is_empty()));
    }

    #[test]
    fn test_resolve_keeps_order() {
        let recipes = resolve_recipes(&[
            RemoveUnusedLocalVariables::NAME,
            MockUtilsToStatic::NAME,
        ])
        .unwrap();
        let names: Vec<&str> = recipes.iter().map(|r| r.name()).collect();
        assert_eq!(names, [RemoveUnusedLocalVariables::NAME, MockUtilsToStatic::NAME]);
    }

    #[test]
    fn test_unknown_recipe() {
        assert!(find_recipe("nope").is_none());
        let error = resolve_recipes(&["nope"]).err().unwrap();
        assert_eq!(error.kind(), ErrorKind::Recipe);
    }
}
