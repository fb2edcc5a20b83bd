mod common;

use common::{assert_stderr, assert_stdout};

#[test]
fn calling_a_method_binds_this() {
    assert_stdout(
        "class Box { init(v) { this.v = v; } get() { return this.v; } } print Box(5).get();",
        "5\n",
    );
}

#[test]
fn methods_can_be_stored_and_called_later() {
    assert_stdout(
        "class Box { init(v) { this.v = v; } get() { return this.v; } } \
         var box = Box(9); var m = box.get; print m();",
        "9\n",
    );
}

#[test]
fn calling_an_undefined_method_is_a_runtime_error() {
    assert_stderr("class Box {} Box().missing();", "Undefined property 'missing'.\n[line 1]\n");
}
