mod common;

use common::assert_stdout;

#[test]
fn and_short_circuits_on_a_falsy_left_operand() {
    assert_stdout("print false and 1; print true and 2;", "false\n2\n");
}

#[test]
fn or_short_circuits_on_a_truthy_left_operand() {
    assert_stdout("print false or 1; print true or 2;", "1\ntrue\n");
}
