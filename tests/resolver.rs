mod common;

#[test]
fn redeclaring_a_variable_in_the_same_scope_is_a_resolver_error() {
    let source = "fun bad() {
      var a = \"first\";
      var a = \"second\";
    }";

    let outcome = common::run(source);
    assert_eq!(outcome.resolve_errors.len(), 1);
    assert_eq!(
        outcome.resolve_errors[0].message,
        "Already a variable with this name in this scope."
    );
}

#[test]
fn returning_from_top_level_code_is_a_resolver_error() {
    let outcome = common::run("return 1;");
    assert_eq!(outcome.resolve_errors.len(), 1);
    assert_eq!(
        outcome.resolve_errors[0].message,
        "Cannot return from top-level code."
    );
}

#[test]
fn shadowing_a_global_in_a_block_is_not_an_error() {
    let outcome = common::run("var a = 1; { var a = 2; print a; }");
    assert!(outcome.resolve_errors.is_empty());
    assert!(outcome.runtime_error.is_none());
}
