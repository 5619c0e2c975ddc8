mod common;

#[test]
fn arithmetic_precedence() {
    let outcome = common::run("print 1 + 2 * 3;");
    assert!(outcome.parse_errors.is_empty());
    assert!(outcome.resolve_errors.is_empty());
    assert!(outcome.runtime_error.is_none());
    assert_eq!(outcome.stdout, "7\n");
}

#[test]
fn block_scoping_shadows_and_restores() {
    let outcome = common::run("var a = 1; { var a = 2; print a; } print a;");
    assert!(outcome.runtime_error.is_none());
    assert_eq!(outcome.stdout, "2\n1\n");
}

#[test]
fn closures_capture_lexical_scope() {
    let outcome =
        common::run("fun make(n) { fun inner() { return n; } return inner; } var f = make(42); print f();");
    assert!(outcome.runtime_error.is_none());
    assert_eq!(outcome.stdout, "42\n");
}

#[test]
fn class_methods_run_on_instances() {
    let outcome = common::run(
        r#"class Bacon { eat() { print "Crunch crunch crunch!"; } } Bacon().eat();"#,
    );
    assert!(outcome.runtime_error.is_none());
    assert_eq!(outcome.stdout, "Crunch crunch crunch!\n");
}

#[test]
fn initializer_binds_this_and_fields() {
    let outcome = common::run(
        r#"class Cake {
            init(flavor) { this.flavor = flavor; }
            taste() { print "The " + this.flavor + " cake is delicious."; }
        }
        var c = Cake("German chocolate");
        c.taste();"#,
    );
    assert!(outcome.runtime_error.is_none());
    assert_eq!(outcome.stdout, "The German chocolate cake is delicious.\n");
}

#[test]
fn for_loop_desugars_and_runs() {
    let outcome = common::run("for (var i = 0; i < 3; i = i + 1) print i;");
    assert!(outcome.runtime_error.is_none());
    assert_eq!(outcome.stdout, "0\n1\n2\n");
}

#[test]
fn subtracting_a_string_from_a_number_is_a_runtime_error() {
    let outcome = common::run("\"a\" - 1;");
    let err = outcome.runtime_error.expect("expected a runtime error");
    assert_eq!(format!("{err}"), "Operands must be numbers.\n[line 1]");
}

#[test]
fn top_level_return_is_a_resolver_error() {
    let outcome = common::run("return 1;");
    assert_eq!(outcome.resolve_errors.len(), 1);
    assert_eq!(
        outcome.resolve_errors[0].message,
        "Cannot return from top-level code."
    );
}

#[test]
fn parser_recovers_from_invalid_syntax_without_hanging() {
    let outcome = common::run("var; var a = 1;");
    assert!(!outcome.parse_errors.is_empty());
}

#[test]
fn nil_equals_only_nil() {
    let outcome = common::run("print nil == nil; print nil == false;");
    assert!(outcome.runtime_error.is_none());
    assert_eq!(outcome.stdout, "true\nfalse\n");
}
