//! End-to-end completions of calls mixing generic functions, overloaded
//! callable references and lambdas.

use tyfix_types::Ty;

use crate::completer::CompletionMode;
use crate::error::InferenceDiagnostic;
use crate::tests::mocks::{call, call_with, callback, lambda, reference, Fixture, LambdaBody};

#[test]
fn test_reference_overload_follows_target_type_through_nested_calls() {
    // id(id(::foo)) with target (Int) -> Unit
    let mut fixture = Fixture::build(
        call("id", vec![call("id", vec![reference("foo")])]),
        Some(callback(Ty::int())),
    );
    fixture.run(CompletionMode::Full).unwrap();

    assert_eq!(
        fixture.analyzer.resolved_references,
        vec![("foo".to_string(), callback(Ty::int()))]
    );
    assert_eq!(
        fixture.calls(),
        vec![
            ("id".to_string(), vec![callback(Ty::int())]),
            ("id".to_string(), vec![callback(Ty::int())]),
        ]
    );
    assert!(fixture.store.diagnostics().is_empty());
    assert!(fixture.sink.is_empty());
}

#[test]
fn test_shared_type_parameter_agrees_on_both_references() {
    // baz(id(::foo), id(id(::foo))) with target (String) -> Unit
    let mut fixture = Fixture::build(
        call(
            "baz",
            vec![
                call("id", vec![reference("foo")]),
                call("id", vec![call("id", vec![reference("foo")])]),
            ],
        ),
        Some(callback(Ty::string())),
    );
    fixture.run(CompletionMode::Full).unwrap();

    let string_callback = callback(Ty::string());
    assert_eq!(
        fixture.analyzer.resolved_references,
        vec![
            ("foo".to_string(), string_callback.clone()),
            ("foo".to_string(), string_callback.clone()),
        ]
    );
    for (callee, arguments) in fixture.calls() {
        assert_eq!(arguments, vec![string_callback.clone()], "type argument of {}", callee);
    }
    assert!(fixture.store.diagnostics().is_empty());
    assert!(fixture.sink.is_empty());
}

#[test]
fn test_explicit_type_argument_decides_without_target_type() {
    // baz<(Int) -> Unit>(id(::foo), id(id(::foo)))
    let mut fixture = Fixture::build(
        call_with(
            "baz",
            vec![callback(Ty::int())],
            vec![
                call("id", vec![reference("foo")]),
                call("id", vec![call("id", vec![reference("foo")])]),
            ],
        ),
        None,
    );
    fixture.run(CompletionMode::Full).unwrap();

    let int_callback = callback(Ty::int());
    assert_eq!(
        fixture.analyzer.resolved_references,
        vec![
            ("foo".to_string(), int_callback.clone()),
            ("foo".to_string(), int_callback.clone()),
        ]
    );
    assert_eq!(fixture.calls().len(), 4);
    for (_, arguments) in fixture.calls() {
        assert_eq!(arguments, vec![int_callback.clone()]);
    }
    assert!(fixture.store.diagnostics().is_empty());
}

#[test]
fn test_lambda_parameter_comes_from_sibling_lambda() {
    // baz(id { it.inv() }, id<(Int) -> Unit> {})
    let inv = LambdaBody {
        receiver: Some(Ty::int()),
        returns: Ty::int(),
    };
    let mut fixture = Fixture::build(
        call(
            "baz",
            vec![
                call("id", vec![lambda("{ it.inv() }", vec![None], inv)]),
                call_with("id", vec![callback(Ty::int())], vec![lambda("{}", vec![], LambdaBody::default())]),
            ],
        ),
        None,
    );
    fixture.run(CompletionMode::Full).unwrap();

    assert_eq!(
        fixture.analyzer.analyzed_lambdas,
        vec![
            ("{ it.inv() }".to_string(), vec![Ty::int()]),
            ("{}".to_string(), vec![Ty::int()]),
        ]
    );
    assert_eq!(
        fixture.calls(),
        vec![
            ("baz".to_string(), vec![callback(Ty::int())]),
            ("id".to_string(), vec![callback(Ty::int())]),
            ("id".to_string(), vec![callback(Ty::int())]),
        ]
    );
    assert!(fixture.sink.is_empty(), "lambda body errors: {:?}", fixture.sink);
    assert!(fixture.store.diagnostics().is_empty());
}

#[test]
fn test_declared_parameter_type_comes_along_with_recovered_shape() {
    // baz(id { x: Int -> }, id<(Int) -> Unit> {})
    let mut fixture = Fixture::build(
        call(
            "baz",
            vec![
                call("id", vec![lambda("{ x: Int -> }", vec![Some(Ty::int())], LambdaBody::default())]),
                call_with("id", vec![callback(Ty::int())], vec![lambda("{}", vec![], LambdaBody::default())]),
            ],
        ),
        None,
    );
    fixture.run(CompletionMode::Full).unwrap();

    assert_eq!(
        fixture.analyzer.analyzed_lambdas,
        vec![
            ("{ x: Int -> }".to_string(), vec![Ty::int()]),
            ("{}".to_string(), vec![Ty::int()]),
        ]
    );
    assert!(fixture.all_variables_fixed());
    assert!(fixture.store.diagnostics().is_empty());
    assert!(fixture.sink.is_empty());
}

#[test]
fn test_declared_parameter_type_is_not_overwritten_by_shape() {
    // id<(Int) -> Unit>({ x: String -> })
    let mut fixture = Fixture::build(
        call_with(
            "id",
            vec![callback(Ty::int())],
            vec![lambda("{ x: String -> }", vec![Some(Ty::string())], LambdaBody::default())],
        ),
        None,
    );
    fixture.run(CompletionMode::Full).unwrap();

    assert_eq!(
        fixture.analyzer.analyzed_lambdas,
        vec![("{ x: String -> }".to_string(), vec![Ty::string()])]
    );
    assert!(
        fixture.store.diagnostics().iter().any(|diagnostic| matches!(
            diagnostic,
            InferenceDiagnostic::TypeMismatch { lower, upper, .. } if *lower == Ty::int() && *upper == Ty::string()
        )),
        "diagnostics: {:?}",
        fixture.store.diagnostics()
    );
    assert_eq!(fixture.calls(), vec![("id".to_string(), vec![callback(Ty::int())])]);
}

#[test]
fn test_declared_arity_is_not_overwritten_by_shape() {
    // id<(Int) -> Unit>({ x: Int, y: Int -> })
    let mut fixture = Fixture::build(
        call_with(
            "id",
            vec![callback(Ty::int())],
            vec![lambda(
                "{ x: Int, y: Int -> }",
                vec![Some(Ty::int()), Some(Ty::int())],
                LambdaBody::default(),
            )],
        ),
        None,
    );
    fixture.run(CompletionMode::Full).unwrap();

    assert_eq!(
        fixture.analyzer.analyzed_lambdas,
        vec![("{ x: Int, y: Int -> }".to_string(), vec![Ty::int(), Ty::int()])]
    );
    assert!(
        fixture.store.diagnostics().iter().any(|diagnostic| matches!(
            diagnostic,
            InferenceDiagnostic::ArityMismatch {
                expected: 1,
                found: 2,
                ..
            }
        )),
        "diagnostics: {:?}",
        fixture.store.diagnostics()
    );
    assert!(fixture.all_variables_fixed());
}

#[test]
fn test_single_candidate_reference_is_forced_before_giving_up() {
    // id(::bar): nothing constrains K until the reference is resolved
    let mut fixture = Fixture::build(call("id", vec![reference("bar")]), None);
    fixture.run(CompletionMode::Full).unwrap();

    assert_eq!(
        fixture.analyzer.resolved_references,
        vec![("bar".to_string(), callback(Ty::string()))]
    );
    assert_eq!(fixture.calls(), vec![("id".to_string(), vec![callback(Ty::string())])]);
    assert!(fixture.store.diagnostics().is_empty());
}

#[test]
fn test_reference_without_applicable_candidate() {
    // id<(Bool) -> Unit>(::foo)
    let mut fixture = Fixture::build(call_with("id", vec![callback(Ty::bool())], vec![reference("foo")]), None);
    fixture.run(CompletionMode::Full).unwrap();

    assert!(fixture.analyzer.resolved_references.is_empty());
    assert_eq!(fixture.sink.len(), 1);
    assert_eq!(
        fixture.sink[0].to_string(),
        "no candidate of 'foo' matches the expected type (Bool) -> Unit"
    );
    assert_eq!(fixture.calls(), vec![("id".to_string(), vec![callback(Ty::bool())])]);
    assert!(fixture.all_variables_fixed());
}
