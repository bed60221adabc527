//! Before/after migrations through the full parse, rewrite and print cycle

use recast_core::{ClasspathConfig, DiagnosticKind, EngineConfig};
use recast_recipes::junit::ASSERTIONS;
use recast_recipes::{
    AssertEqualsNullToAssertNull, MockUtilsToStatic, RemoveUnusedLocalVariables, builtin_recipes,
};
use recast_test::RewriteTest;

fn mock_utils() -> RewriteTest {
    RewriteTest::new()
        .recipe(MockUtilsToStatic::new())
        .recipe(RemoveUnusedLocalVariables)
}

#[test]
fn test_instance_call_becomes_static() {
    let result = mock_utils().rewrite_run(
        r#"
        package mockito.example;

        import org.mockito.internal.util.MockUtil;

        public class MockitoMockUtils {
            public void isMockExample() {
                new MockUtil().isMock("I am a real String");
            }
        }
        "#,
        r#"
        package mockito.example;

        import org.mockito.internal.util.MockUtil;

        public class MockitoMockUtils {
            public void isMockExample() {
                MockUtil.isMock("I am a real String");
            }
        }
        "#,
    );
    assert!(result.imports_added.is_empty());
    assert!(result.imports_removed.is_empty());
}

#[test]
fn test_local_variable_receiver_is_dropped() {
    let result = mock_utils().rewrite_run(
        r#"
        package mockito.example;

        import org.mockito.internal.util.MockUtil;

        public class MockitoMockUtils {
            public void isMockExample() {
                MockUtil util = new MockUtil();
                util.isMock("I am a real String");
            }
        }
        "#,
        r#"
        package mockito.example;

        import org.mockito.internal.util.MockUtil;

        public class MockitoMockUtils {
            public void isMockExample() {
                MockUtil.isMock("I am a real String");
            }
        }
        "#,
    );
    assert!(result.stabilized);
    assert!(result.passes >= 2);
}

#[test]
fn test_recipe_order_does_not_change_the_outcome() {
    let before = r#"
        import org.mockito.internal.util.MockUtil;

        class A {
            void m() {
                MockUtil util = new MockUtil();
                util.isSpy(this);
            }
        }
        "#;
    let after = r#"
        import org.mockito.internal.util.MockUtil;

        class A {
            void m() {
                MockUtil.isSpy(this);
            }
        }
        "#;
    // the declaration can only go one pass after the call was rewritten
    let result = RewriteTest::new()
        .recipe(RemoveUnusedLocalVariables)
        .recipe(MockUtilsToStatic::new())
        .rewrite_run(before, after);
    assert_eq!(result.passes, 3);
    mock_utils().rewrite_run(before, after);
}

#[test]
fn test_field_receiver_is_dropped() {
    mock_utils().rewrite_run(
        r#"
        package mockito.example;

        import org.mockito.internal.util.MockUtil;

        public class MockitoMockUtils {
            MockUtil util = new MockUtil();
            public void isMockExample() {
                util.isMock("I am a real String");
            }
        }
        "#,
        r#"
        package mockito.example;

        import org.mockito.internal.util.MockUtil;

        public class MockitoMockUtils {
            public void isMockExample() {
                MockUtil.isMock("I am a real String");
            }
        }
        "#,
    );
}

#[test]
fn test_static_calls_are_left_alone() {
    mock_utils().assert_unchanged(
        r#"
        import org.mockito.internal.util.MockUtil;

        class A {
            boolean m(Object o) {
                return MockUtil.isMock(o);
            }
        }
        "#,
    );
}

#[test]
fn test_statically_imported_assert_equals() {
    let result = RewriteTest::new()
        .recipe(AssertEqualsNullToAssertNull::new())
        .rewrite_run(
            r#"
            import static org.junit.jupiter.api.Assertions.assertEquals;

            public class Test {
                void test() {
                    String s = null;
                    assertEquals(s, null);
                    assertEquals(null, s);
                }
            }
            "#,
            r#"
            import static org.junit.jupiter.api.Assertions.assertNull;

            public class Test {
                void test() {
                    String s = null;
                    assertNull(s);
                    assertNull(s);
                }
            }
            "#,
        );
    assert_eq!(result.imports_added, [format!("static {ASSERTIONS}.assertNull")]);
    assert_eq!(result.imports_removed, [format!("static {ASSERTIONS}.assertEquals")]);
}

#[test]
fn test_static_import_kept_while_still_used() {
    RewriteTest::new()
        .recipe(AssertEqualsNullToAssertNull::new())
        .rewrite_run(
            r#"
            import static org.junit.jupiter.api.Assertions.assertEquals;

            class Test {
                void test(String s, int n) {
                    assertEquals(s, null);
                    assertEquals(1, n);
                }
            }
            "#,
            r#"
            import static org.junit.jupiter.api.Assertions.assertEquals;
            import static org.junit.jupiter.api.Assertions.assertNull;

            class Test {
                void test(String s, int n) {
                    assertNull(s);
                    assertEquals(1, n);
                }
            }
            "#,
        );
}

#[test]
fn test_static_constant_in_initializers_keeps_its_import() {
    let result = RewriteTest::new()
        .recipe(AssertEqualsNullToAssertNull::new())
        .rewrite_run(
            r#"
            import static com.acme.Consts.DEFAULT;
            import static com.acme.Consts.MAX;
            import static org.junit.jupiter.api.Assertions.assertEquals;

            class Test {
                String d = DEFAULT;

                void test(String s) {
                    int m = MAX;
                    assertEquals(s, null);
                }
            }
            "#,
            r#"
            import static com.acme.Consts.DEFAULT;
            import static com.acme.Consts.MAX;
            import static org.junit.jupiter.api.Assertions.assertNull;

            class Test {
                String d = DEFAULT;

                void test(String s) {
                    int m = MAX;
                    assertNull(s);
                }
            }
            "#,
        );
    assert_eq!(result.imports_removed, [format!("static {ASSERTIONS}.assertEquals")]);
}

#[test]
fn test_unresolved_constant_keeps_on_demand_static_import() {
    let result = RewriteTest::new()
        .recipe(AssertEqualsNullToAssertNull::new())
        .rewrite_run(
            r#"
            import static com.acme.Consts.*;
            import static org.junit.jupiter.api.Assertions.assertEquals;

            class Test {
                String d = DEFAULT;

                void test(String s) {
                    int m = MAX;
                    assertEquals(s, null);
                }
            }
            "#,
            r#"
            import static com.acme.Consts.*;
            import static org.junit.jupiter.api.Assertions.assertNull;

            class Test {
                String d = DEFAULT;

                void test(String s) {
                    int m = MAX;
                    assertNull(s);
                }
            }
            "#,
        );
    assert_eq!(result.imports_removed, [format!("static {ASSERTIONS}.assertEquals")]);
}

#[test]
fn test_qualified_assert_equals_keeps_its_form() {
    RewriteTest::new()
        .recipe(AssertEqualsNullToAssertNull::new())
        .rewrite_run(
            r#"
            import org.junit.jupiter.api.Assertions;

            public class Test {
                void test() {
                    String s = null;
                    Assertions.assertEquals(s, null);
                    Assertions.assertEquals(null, s);
                }
            }
            "#,
            r#"
            import org.junit.jupiter.api.Assertions;

            public class Test {
                void test() {
                    String s = null;
                    Assertions.assertNull(s);
                    Assertions.assertNull(s);
                }
            }
            "#,
        );
}

#[test]
fn test_argument_text_is_kept_verbatim() {
    RewriteTest::new()
        .recipe(AssertEqualsNullToAssertNull::new())
        .rewrite_run(
            r#"
            import org.junit.jupiter.api.Assertions;

            class Test {
                void test(Object o) {
                    Assertions.assertEquals(null, o.toString( /* text */ ));
                }
            }
            "#,
            r#"
            import org.junit.jupiter.api.Assertions;

            class Test {
                void test(Object o) {
                    Assertions.assertNull(o.toString( /* text */ ));
                }
            }
            "#,
        );
}

#[test]
fn test_unresolved_owner_is_not_rewritten() {
    let source = r#"
        import org.junit.jupiter.api.*;

        class Test {
            void test(String s) {
                Assertions.assertEquals(s, null);
            }
        }
        "#;
    RewriteTest::new()
        .recipe(AssertEqualsNullToAssertNull::new())
        .assert_unchanged(source);

    let result = RewriteTest::new()
        .config(EngineConfig::default().with_report_unresolved(true))
        .recipe(AssertEqualsNullToAssertNull::new())
        .assert_unchanged(source);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].kind, DiagnosticKind::UnresolvedReference);
}

#[test]
fn test_classpath_resolves_on_demand_imports() {
    RewriteTest::new()
        .classpath(
            ClasspathConfig::default()
                .with_static_members(ASSERTIONS, ["assertEquals", "assertNull"]),
        )
        .recipe(AssertEqualsNullToAssertNull::new())
        .rewrite_run(
            r#"
            import static org.junit.jupiter.api.Assertions.*;

            class Test {
                void test(String s) {
                    assertEquals(s, null);
                }
            }
            "#,
            r#"
            import static org.junit.jupiter.api.Assertions.*;

            class Test {
                void test(String s) {
                    assertNull(s);
                }
            }
            "#,
        );
}

#[test]
fn test_all_builtin_recipes_together_are_deterministic() {
    let source = r#"
        import org.mockito.internal.util.MockUtil;

        import static org.junit.jupiter.api.Assertions.assertEquals;

        class MixedTest {
            void test(Object o) {
                MockUtil util = new MockUtil();
                String name = null;
                assertEquals(util.getMockName(o), null);
            }
        }
        "#;
    let expected = r#"
        import org.mockito.internal.util.MockUtil;

        import static org.junit.jupiter.api.Assertions.assertNull;

        class MixedTest {
            void test(Object o) {
                assertNull(MockUtil.getMockName(o));
            }
        }
        "#;
    let first = RewriteTest::new()
        .recipes(builtin_recipes())
        .rewrite_run(source, expected);
    let second = RewriteTest::new()
        .recipes(builtin_recipes())
        .rewrite_run(source, expected);
    assert_eq!(first.print(), second.print());
    assert_eq!(first.passes, second.passes);
}
