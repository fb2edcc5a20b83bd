mod common;

use common::{assert_stderr, assert_stdout};

#[test]
fn fields_can_be_set_and_read() {
    assert_stdout("class Box {} var b = Box(); b.value = 10; print b.value;", "10\n");
}

#[test]
fn reading_an_undefined_field_is_a_runtime_error() {
    assert_stderr("class Box {} print Box().missing;", "Undefined property 'missing'.\n[line 1]\n");
}

#[test]
fn fields_shadow_methods_of_the_same_name() {
    assert_stdout(
        "class Box { value() { return \"method\"; } } \
         var b = Box(); b.value = \"field\"; print b.value;",
        "field\n",
    );
}
