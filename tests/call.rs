mod common;

use common::assert_stderr;

#[test]
fn calling_a_number_is_a_runtime_error() {
    assert_stderr("var x = 1; x();", "Can only call functions and classes.\n[line 1]\n");
}

#[test]
fn wrong_argument_count_is_a_runtime_error() {
    assert_stderr(
        "fun f(a, b) { return a + b; } f(1);",
        "Expected 2 arguments but got 1.\n[line 1]\n",
    );
}
