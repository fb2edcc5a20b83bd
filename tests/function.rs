mod common;

use common::assert_stdout;

#[test]
fn declaring_and_calling_a_function() {
    assert_stdout("fun add(a, b) { return a + b; } print add(1, 2);", "3\n");
}

#[test]
fn function_with_no_return_yields_nil() {
    assert_stdout("fun noop() {} print noop();", "nil\n");
}

#[test]
fn printing_a_function_shows_its_name() {
    assert_stdout("fun greet() {} print greet;", "<fn greet>\n");
}

#[test]
fn recursion() {
    assert_stdout(
        "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(8);",
        "21\n",
    );
}
