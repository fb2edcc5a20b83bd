mod common;

use common::{assert_stderr, assert_stdout};

#[test]
fn assigning_returns_the_value() {
    assert_stdout("var a = 1; print a = 2;", "2\n");
}

#[test]
fn global_assignment_is_visible_through_a_function() {
    assert_stdout(
        "var a = \"before\"; fun show() { print a; } show(); a = \"after\"; show();",
        "before\nafter\n",
    );
}

#[test]
fn assigning_to_an_undefined_variable_is_a_runtime_error() {
    assert_stderr("x = 1;", "Undefined variable 'x'.\n[line 1]\n");
}

#[test]
fn assigning_to_a_non_variable_target_is_a_parse_error() {
    assert_stderr("1 + 2 = 3;", "[line 1] Error at '=': Invalid assignment target.\n");
}
