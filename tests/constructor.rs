mod common;

use common::{assert_stderr, assert_stdout};

#[test]
fn init_runs_on_construction() {
    assert_stdout("class Thing { init(x) { this.x = x; } } var t = Thing(5); print t.x;", "5\n");
}

#[test]
fn init_always_returns_this_even_with_a_bare_return() {
    assert_stdout(
        "class Thing { init() { this.ready = true; return; } } print Thing().ready;",
        "true\n",
    );
}

#[test]
fn returning_a_value_from_init_is_a_resolve_error() {
    assert_stderr(
        "class Thing { init() { return 1; } }",
        "[line 1] Error at 'return': Cannot return a value from an initializer.\n",
    );
}
