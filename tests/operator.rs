mod common;

use common::{assert_stderr, assert_stdout};

#[test]
fn comparisons() {
    assert_stdout("print 1 < 2; print 2 <= 2; print 3 > 2; print 2 >= 3;", "true\ntrue\ntrue\nfalse\n");
}

#[test]
fn plus_concatenates_strings() {
    assert_stdout("print \"foo\" + \"bar\";", "foobar\n");
}

#[test]
fn adding_a_number_and_a_string_is_a_runtime_error() {
    assert_stderr("print 1 + \"a\";", "Operands must be two numbers or two strings.\n[line 1]\n");
}

#[test]
fn negating_a_string_is_a_runtime_error() {
    assert_stderr("print -\"a\";", "Operand must be a number.\n[line 1]\n");
}
