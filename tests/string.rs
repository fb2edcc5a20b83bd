mod common;

use common::{assert_stderr, assert_stdout};

#[test]
fn string_literals_print_without_quotes() {
    assert_stdout("print \"hello\";", "hello\n");
}

#[test]
fn unterminated_string_is_a_scan_error() {
    assert_stderr("print \"oops;", "[line 1] Error : Unterminated string.\n");
}
