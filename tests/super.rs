mod common;

use common::{assert_stderr, assert_stdout};

#[test]
fn super_outside_a_class_is_a_resolve_error() {
    assert_stderr("super.foo();", "[line 1] Error at 'super': Cannot use 'super' outside of a class.\n");
}

#[test]
fn super_in_a_class_with_no_superclass_is_a_resolve_error() {
    assert_stderr(
        "class A { m() { super.m(); } }",
        "[line 1] Error at 'super': Cannot use 'super' in a class with no superclass.\n",
    );
}

#[test]
fn super_resolves_through_a_three_level_chain() {
    assert_stdout(
        "class A { greet() { print \"a\"; } } \
         class B < A { greet() { super.greet(); } } \
         class C < B { greet() { super.greet(); print \"c\"; } } \
         C().greet();",
        "a\nc\n",
    );
}
