mod common;

use common::{assert_stderr, assert_stdout};

#[test]
fn equality_across_types_is_false() {
    assert_stdout("print true == 1; print nil == false;", "false\nfalse\n");
}

#[test]
fn negation() {
    assert_stdout("print !true; print !false; print !nil;", "false\ntrue\ntrue\n");
}

#[test]
fn comparing_booleans_is_a_runtime_error() {
    assert_stderr("true < false;", "Operands must be numbers.\n[line 1]\n");
}
