mod common;

use common::assert_stdout;

#[test]
fn closures_capture_their_declaring_environment_by_reference() {
    assert_stdout(
        "fun makeCounter() { var i = 0; fun counter() { i = i + 1; print i; } return counter; } \
         var counter = makeCounter(); counter(); counter();",
        "1\n2\n",
    );
}

#[test]
fn each_call_gets_its_own_closure() {
    assert_stdout(
        "fun makeAdder(x) { fun adder(y) { return x + y; } return adder; } \
         var add5 = makeAdder(5); var add10 = makeAdder(10); \
         print add5(1); print add10(1);",
        "6\n11\n",
    );
}
